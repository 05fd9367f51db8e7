//! Deferred actions on two monotonic clocks
//!
//! The simulation is single-threaded; anything that "happens later"
//! (delayed volleys, wave starts, countdown steps, buff expiry) is a
//! [`Deferred`] value queued here. Each entry records the world epoch it was
//! scheduled in and is silently dropped if the epoch has moved on, so a
//! session reset can never be corrupted by a continuation from the previous
//! session.
//!
//! Flow steps (countdowns, resumes, wave starts) run on the session clock,
//! which keeps ticking through skill choices and the boss intro. Gameplay
//! timers run on the game clock, which only moves while play is live.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec2;

use super::modifiers::ModifierToken;
use super::skills::ChoiceReason;

/// Work to run at a later simulation time
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    /// Follow-up projectile volley along a fixed direction
    Volley { dir: Vec2 },
    /// Spawn the mobs of a non-boss wave
    SpawnWave { wave: u32 },
    /// One step of the boss intro (3, 2, 1, then 0 = name card)
    BossCountdown { wave: u32, step: u32 },
    /// Boss and escort enter the arena
    BossArrival { wave: u32 },
    /// Leave the skill-choice interstitial
    ResumePlay { reason: ChoiceReason },
    /// A timed buff runs out
    ExpireModifier { token: ModifierToken },
    /// Final wave cleared
    Victory,
}

/// Which clock an action is timed against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    /// Always advances while a session runs
    Session,
    /// Paused during skill choices and the boss intro
    Game,
}

impl Deferred {
    pub fn lane(&self) -> Lane {
        match self {
            Deferred::Volley { .. } | Deferred::ExpireModifier { .. } => Lane::Game,
            Deferred::SpawnWave { .. }
            | Deferred::BossCountdown { .. }
            | Deferred::BossArrival { .. }
            | Deferred::ResumePlay { .. }
            | Deferred::Victory => Lane::Session,
        }
    }
}

#[derive(Debug, Clone)]
struct Scheduled {
    at: f64,
    seq: u64,
    epoch: u64,
    action: Deferred,
}

// BinaryHeap is a max-heap: order reversed so the earliest (then first
// scheduled) entry is on top.
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .total_cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

/// One clock and the actions timed against it
#[derive(Debug, Clone, Default)]
struct Timeline {
    now: f64,
    queue: BinaryHeap<Scheduled>,
}

impl Timeline {
    fn advance(&mut self, dt: f32) {
        if dt > 0.0 && dt.is_finite() {
            self.now += dt as f64;
        }
    }

    fn pop_due(&mut self, epoch: u64) -> Option<Deferred> {
        while let Some(top) = self.queue.peek() {
            if top.at > self.now {
                return None;
            }
            let entry = self.queue.pop()?;
            if entry.epoch != epoch {
                log::debug!(
                    "discarding stale {:?} (epoch {} != {})",
                    entry.action,
                    entry.epoch,
                    epoch
                );
                continue;
            }
            return Some(entry.action);
        }
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    session: Timeline,
    game: Timeline,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn timeline(&self, lane: Lane) -> &Timeline {
        match lane {
            Lane::Session => &self.session,
            Lane::Game => &self.game,
        }
    }

    fn timeline_mut(&mut self, lane: Lane) -> &mut Timeline {
        match lane {
            Lane::Session => &mut self.session,
            Lane::Game => &mut self.game,
        }
    }

    /// Session clock (seconds since the scheduler was created, never reset)
    pub fn now(&self) -> f64 {
        self.session.now
    }

    /// Clock of `lane`
    pub fn now_on(&self, lane: Lane) -> f64 {
        self.timeline(lane).now
    }

    pub fn advance(&mut self, lane: Lane, dt: f32) {
        self.timeline_mut(lane).advance(dt);
    }

    /// Queue `action` `delay` seconds from now on its own lane's clock
    pub fn schedule(&mut self, delay: f32, epoch: u64, action: Deferred) {
        let delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        let seq = self.next_seq;
        self.next_seq += 1;
        let timeline = self.timeline_mut(action.lane());
        let at = timeline.now + delay as f64;
        timeline.queue.push(Scheduled { at, seq, epoch, action });
    }

    /// Pop the next action on `lane` that is due and belongs to `epoch`.
    ///
    /// Due entries from other epochs are discarded on the way.
    pub fn pop_due(&mut self, lane: Lane, epoch: u64) -> Option<Deferred> {
        self.timeline_mut(lane).pop_due(epoch)
    }

    pub fn pending(&self) -> usize {
        self.session.queue.len() + self.game.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_time_order() {
        let mut sched = Scheduler::new();
        sched.schedule(0.5, 1, Deferred::SpawnWave { wave: 2 });
        sched.schedule(0.2, 1, Deferred::SpawnWave { wave: 1 });
        sched.schedule(0.2, 1, Deferred::Victory);

        assert_eq!(sched.pop_due(Lane::Session, 1), None);
        sched.advance(Lane::Session, 0.3);
        assert_eq!(sched.pop_due(Lane::Session, 1), Some(Deferred::SpawnWave { wave: 1 }));
        // Same due time: insertion order
        assert_eq!(sched.pop_due(Lane::Session, 1), Some(Deferred::Victory));
        assert_eq!(sched.pop_due(Lane::Session, 1), None);
        sched.advance(Lane::Session, 0.3);
        assert_eq!(sched.pop_due(Lane::Session, 1), Some(Deferred::SpawnWave { wave: 2 }));
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_stale_epoch_is_discarded() {
        let mut sched = Scheduler::new();
        sched.schedule(0.1, 1, Deferred::SpawnWave { wave: 3 });
        sched.schedule(0.1, 2, Deferred::SpawnWave { wave: 1 });
        sched.advance(Lane::Session, 0.2);

        assert_eq!(sched.pop_due(Lane::Session, 2), Some(Deferred::SpawnWave { wave: 1 }));
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_clock_ignores_bad_deltas() {
        let mut sched = Scheduler::new();
        sched.advance(Lane::Session, -1.0);
        sched.advance(Lane::Session, f32::NAN);
        assert_eq!(sched.now(), 0.0);
        sched.schedule(f32::NAN, 0, Deferred::Victory);
        assert_eq!(sched.pop_due(Lane::Session, 0), Some(Deferred::Victory));
    }

    #[test]
    fn test_game_lane_waits_for_game_time() {
        let mut sched = Scheduler::new();
        sched.schedule(0.5, 1, Deferred::Volley { dir: Vec2::X });
        sched.schedule(0.5, 1, Deferred::SpawnWave { wave: 2 });

        sched.advance(Lane::Session, 2.0);
        assert_eq!(sched.pop_due(Lane::Game, 1), None);
        assert_eq!(sched.pop_due(Lane::Session, 1), Some(Deferred::SpawnWave { wave: 2 }));

        sched.advance(Lane::Game, 0.6);
        assert_eq!(sched.now_on(Lane::Game), 0.6f32 as f64);
        assert_eq!(sched.pop_due(Lane::Game, 1), Some(Deferred::Volley { dir: Vec2::X }));
        assert_eq!(sched.pending(), 0);
    }
}
