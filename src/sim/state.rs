//! World state
//!
//! The single owner of every entity and all meta-state. Operations take the
//! world explicitly; there are no globals. A session reset bumps `epoch`,
//! which invalidates every continuation scheduled before it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::arena::{self, ArenaState};
use super::entities::{
    EntityId, FloatText, Hostile, Particle, Pickup, PickupPayload, Player, Projectile,
};
use super::events::{GameEvent, RunResult};
use super::modifiers::ModifierKind;
use super::schedule::{Deferred, Scheduler};
use super::skills::PendingChoice;
use super::spatial::SpatialIndex;
use super::stage::{self, StageState};
use crate::consts::*;
use crate::data::{GameData, MobKind, PowerOrbKind};
use crate::polar_to_cartesian;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Endless, timer-driven spawning
    Stage,
    /// Numbered waves ending in a boss
    Arena,
}

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No session running
    Menu,
    Playing,
    /// Interstitial; only the choice input is processed
    SkillChoice,
    Victory,
    Defeat,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::Victory | GamePhase::Defeat)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("game data defines no roles")]
    NoRoles,
}

pub struct World {
    pub data: GameData,
    pub settings: Settings,
    /// Incremented on every session start
    pub epoch: u64,
    pub mode: GameMode,
    pub phase: GamePhase,
    pub role: String,
    pub rng: Pcg32,
    pub arena_radius: f32,
    pub player: Player,
    pub hostiles: Vec<Hostile>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    /// Visual only (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub texts: Vec<FloatText>,
    pub spatial: SpatialIndex,
    pub scheduler: Scheduler,
    events: Vec<GameEvent>,
    pub kills: u32,
    pub gold: u32,
    pub play_time: f32,
    /// Hit-stop: physics dt is forced to zero while positive
    pub freeze_timer: f32,
    pub screen_shake: f32,
    pub arena: ArenaState,
    pub stage: StageState,
    pub pending_choice: Option<PendingChoice>,
    /// Level-ups waiting for their own skill choice
    pub queued_level_ups: u32,
    pub result: Option<RunResult>,
    next_id: u32,
}

impl World {
    /// Create an idle world sitting in the menu
    pub fn new(settings: Settings, data: GameData) -> Result<Self, SessionError> {
        let role = data.default_role().ok_or(SessionError::NoRoles)?;
        let player = Player::new(role.stats.clone());
        let role = role.id.clone();
        let arena_radius = if settings.arena_radius.is_finite() && settings.arena_radius > PLAYER_RADIUS * 4.0 {
            settings.arena_radius
        } else {
            log::warn!(
                "arena radius {} is unusable, using {}",
                settings.arena_radius,
                DEFAULT_ARENA_RADIUS
            );
            DEFAULT_ARENA_RADIUS
        };

        Ok(Self {
            rng: Pcg32::seed_from_u64(settings.seed),
            data,
            settings,
            epoch: 0,
            mode: GameMode::Arena,
            phase: GamePhase::Menu,
            role,
            arena_radius,
            player,
            hostiles: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
            particles: Vec::new(),
            texts: Vec::new(),
            spatial: SpatialIndex::new(SPATIAL_CELL_SIZE),
            scheduler: Scheduler::new(),
            events: Vec::new(),
            kills: 0,
            gold: 0,
            play_time: 0.0,
            freeze_timer: 0.0,
            screen_shake: 0.0,
            arena: ArenaState::default(),
            stage: StageState::default(),
            pending_choice: None,
            queued_level_ups: 0,
            result: None,
            next_id: 1,
        })
    }

    /// Reset everything and start a new session.
    ///
    /// `role` overrides the last role stored in settings. An explicit unknown
    /// role is an error; a stale stored role falls back to the default.
    pub fn start_session(&mut self, mode: GameMode, role: Option<&str>) -> Result<(), SessionError> {
        let role_def = match role {
            Some(id) => self
                .data
                .role(id)
                .ok_or_else(|| SessionError::UnknownRole(id.to_string()))?,
            None => {
                let stored = self.settings.last_role.as_deref();
                match stored.and_then(|id| self.data.role(id)) {
                    Some(def) => def,
                    None => {
                        if let Some(id) = stored {
                            log::warn!("stored role '{}' no longer exists, using default", id);
                        }
                        self.data.default_role().ok_or(SessionError::NoRoles)?
                    }
                }
            }
        };
        let stats = role_def.stats.clone();
        self.role = role_def.id.clone();

        self.epoch += 1;
        self.rng = Pcg32::seed_from_u64(self.settings.seed.wrapping_add(self.epoch));
        self.mode = mode;
        self.phase = GamePhase::Playing;
        self.player = Player::new(stats);
        self.hostiles.clear();
        self.projectiles.clear();
        self.pickups.clear();
        self.particles.clear();
        self.texts.clear();
        self.spatial.clear();
        self.events.clear();
        self.kills = 0;
        self.gold = 0;
        self.play_time = 0.0;
        self.freeze_timer = 0.0;
        self.screen_shake = 0.0;
        self.arena = ArenaState::default();
        self.stage = StageState::default();
        self.pending_choice = None;
        self.queued_level_ups = 0;
        self.result = None;

        log::info!(
            "session {} started: {:?} mode as {} (seed {})",
            self.epoch,
            mode,
            self.role,
            self.settings.seed
        );
        self.emit(GameEvent::SessionStarted { role: self.role.clone() });

        match mode {
            GameMode::Arena => arena::begin_wave(self, 1),
            GameMode::Stage => stage::begin(self),
        }
        Ok(())
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Queue a continuation stamped with the current epoch
    pub fn schedule(&mut self, delay: f32, action: Deferred) {
        self.scheduler.schedule(delay, self.epoch, action);
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events raised since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn spawn_hostile(&mut self, kind: MobKind, pos: Vec2) -> Option<EntityId> {
        let Some(def) = self.data.mob(kind) else {
            log::debug!("no mob definition for {:?}, skipping spawn", kind);
            return None;
        };
        let hostile = Hostile::from_def(EntityId(self.next_id), def, pos);
        self.next_id += 1;
        let id = hostile.id;
        self.hostiles.push(hostile);
        Some(id)
    }

    pub fn spawn_elite(&mut self, kind: MobKind, pos: Vec2) -> Option<EntityId> {
        let Some(def) = self.data.mob(kind) else {
            log::debug!("no mob definition for elite {:?}, skipping spawn", kind);
            return None;
        };
        let hostile = Hostile::from_def(EntityId(self.next_id), def, pos).into_elite(&self.data.elite);
        self.next_id += 1;
        let id = hostile.id;
        log::debug!("elite {:?} spawned ({} hp)", kind, hostile.max_hp);
        self.hostiles.push(hostile);
        Some(id)
    }

    /// Drop a pickup with a small random scatter hop
    pub fn spawn_pickup(&mut self, pos: Vec2, payload: PickupPayload) -> EntityId {
        let id = self.next_entity_id();
        let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
        let speed = self.rng.random_range(40.0..120.0);
        let mut pickup = Pickup::new(id, pos, payload);
        pickup.vel = polar_to_cartesian(speed, angle);
        pickup.vz = self.rng.random_range(150.0..250.0);
        self.pickups.push(pickup);
        id
    }

    /// Power orbs sit still and expire
    pub fn spawn_power_orb(&mut self, pos: Vec2, kind: PowerOrbKind) -> EntityId {
        let id = self.next_entity_id();
        let mut pickup = Pickup::new(id, pos, PickupPayload::PowerOrb(kind));
        pickup.life = Some(POWER_ORB_LIFE);
        self.pickups.push(pickup);
        id
    }

    pub fn spawn_particles(&mut self, pos: Vec2, count: usize, color: [f32; 4]) {
        if !self.settings.particles {
            return;
        }
        for _ in 0..count {
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            let speed = self.rng.random_range(60.0..220.0);
            let life = self.rng.random_range(0.3..0.7);
            self.particles.push(Particle {
                pos,
                vel: polar_to_cartesian(speed, angle),
                color,
                life,
                max_life: life,
                size: self.rng.random_range(2.0..5.0),
            });
        }
    }

    pub fn spawn_text(&mut self, pos: Vec2, text: String, crit: bool) {
        if !self.settings.damage_numbers {
            return;
        }
        self.texts.push(FloatText { pos, text, crit, life: FloatText::LIFETIME });
    }

    /// List index of a live hostile
    pub fn hostile_index(&self, id: EntityId) -> Option<usize> {
        self.hostiles.iter().position(|h| h.id == id && !h.dead)
    }

    /// Apply a timed buff to the player; expiry goes through the scheduler
    pub fn grant_modifier(&mut self, kind: ModifierKind, value: f32, duration: f32) {
        if let Some(token) = self.player.modifiers.push(kind, value) {
            self.schedule(duration, Deferred::ExpireModifier { token });
        }
    }

    pub fn add_shake(&mut self, amount: f32) {
        if self.settings.screen_shake && !self.settings.reduced_motion {
            self.screen_shake = self.screen_shake.max(amount);
        }
    }

    pub fn hit_stop(&mut self, duration: f32) {
        self.freeze_timer = self.freeze_timer.max(duration);
    }

    /// Random point on the spawn ring around the player, inside the arena
    pub fn random_ring_point(&mut self) -> Vec2 {
        let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
        let dist = self.rng.random_range(SPAWN_RING_MIN..SPAWN_RING_MAX);
        let point = self.player.pos + polar_to_cartesian(dist, angle);
        let limit = self.arena_radius - PLAYER_RADIUS * 2.0;
        if point.length() > limit {
            point.normalize_or_zero() * limit
        } else {
            point
        }
    }

    pub fn run_result(&self, victory: bool) -> RunResult {
        let [three_stars, two_stars] = self.data.arena.star_thresholds;
        let stars = if !victory {
            0
        } else if self.play_time <= three_stars {
            3
        } else if self.play_time <= two_stars {
            2
        } else {
            1
        };
        let gold = if victory {
            self.gold
        } else {
            let kept = 1.0 - self.data.arena.defeat_gold_penalty;
            (self.gold as f32 * kept).floor() as u32
        };
        RunResult {
            victory,
            stars,
            gold,
            kills: self.kills,
            play_time: self.play_time,
            wave: self.arena.wave,
            level: self.player.level,
        }
    }

    /// Enter a terminal phase (once)
    pub fn finish(&mut self, victory: bool) {
        if self.phase.is_terminal() || self.phase == GamePhase::Menu {
            return;
        }
        let result = self.run_result(victory);
        log::info!(
            "session {} over: {} after {:.1}s, {} kills, {} gold",
            self.epoch,
            if victory { "victory" } else { "defeat" },
            result.play_time,
            result.kills,
            result.gold
        );
        self.phase = if victory { GamePhase::Victory } else { GamePhase::Defeat };
        self.result = Some(result.clone());
        self.emit(if victory {
            GameEvent::Victory { result }
        } else {
            GameEvent::Defeat { result }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(Settings::default(), GameData::builtin().unwrap()).unwrap()
    }

    #[test]
    fn test_new_world_sits_in_menu() {
        let world = world();
        assert_eq!(world.phase, GamePhase::Menu);
        assert_eq!(world.epoch, 0);
        assert!(world.hostiles.is_empty());
    }

    #[test]
    fn test_start_session_resets_and_bumps_epoch() {
        let mut world = world();
        world.start_session(GameMode::Stage, Some("mage")).unwrap();
        assert_eq!(world.epoch, 1);
        assert_eq!(world.role, "mage");
        world.kills = 12;
        world.gold = 40;

        world.start_session(GameMode::Arena, None).unwrap();
        assert_eq!(world.epoch, 2);
        assert_eq!(world.kills, 0);
        assert_eq!(world.gold, 0);
        assert_eq!(world.phase, GamePhase::Playing);
        assert_eq!(world.arena.wave, 1);
    }

    #[test]
    fn test_unknown_role_is_an_error() {
        let mut world = world();
        let err = world.start_session(GameMode::Arena, Some("bard")).unwrap_err();
        assert!(matches!(err, SessionError::UnknownRole(ref id) if id == "bard"));
        assert_eq!(world.phase, GamePhase::Menu);
    }

    #[test]
    fn test_last_role_read_at_session_start() {
        let settings = Settings { last_role: Some("ranger".into()), ..Settings::default() };
        let mut world = World::new(settings, GameData::builtin().unwrap()).unwrap();
        world.start_session(GameMode::Stage, None).unwrap();
        assert_eq!(world.role, "ranger");
        assert_eq!(world.player.stats.projectile_count, 2);

        // A stale stored role falls back to the default
        world.settings.last_role = Some("retired".into());
        world.start_session(GameMode::Stage, None).unwrap();
        assert_eq!(world.role, "knight");
    }

    #[test]
    fn test_victory_star_rating() {
        let mut world = world();
        world.start_session(GameMode::Arena, None).unwrap();
        let [three, two] = world.data.arena.star_thresholds;

        world.play_time = three - 1.0;
        assert_eq!(world.run_result(true).stars, 3);
        world.play_time = two - 1.0;
        assert_eq!(world.run_result(true).stars, 2);
        world.play_time = two + 1.0;
        assert_eq!(world.run_result(true).stars, 1);
        assert_eq!(world.run_result(false).stars, 0);
    }

    #[test]
    fn test_defeat_gold_penalty_applies_to_display_only() {
        let mut world = world();
        world.start_session(GameMode::Arena, None).unwrap();
        world.gold = 101;
        assert_eq!(world.run_result(true).gold, 101);
        assert_eq!(world.run_result(false).gold, 50);

        world.finish(false);
        assert_eq!(world.phase, GamePhase::Defeat);
        assert_eq!(world.gold, 101);
        assert_eq!(world.result.as_ref().map(|r| r.gold), Some(50));

        // Terminal phases are final
        world.finish(true);
        assert_eq!(world.phase, GamePhase::Defeat);
    }

    #[test]
    fn test_effect_toggles() {
        let settings = Settings {
            particles: false,
            damage_numbers: false,
            screen_shake: false,
            ..Settings::default()
        };
        let mut world = World::new(settings, GameData::builtin().unwrap()).unwrap();
        world.spawn_particles(Vec2::ZERO, 10, [1.0; 4]);
        world.spawn_text(Vec2::ZERO, "5".into(), false);
        world.add_shake(5.0);
        assert!(world.particles.is_empty());
        assert!(world.texts.is_empty());
        assert_eq!(world.screen_shake, 0.0);
    }

    #[test]
    fn test_ring_points_stay_inside_arena() {
        let mut world = world();
        world.player.pos = Vec2::new(world.arena_radius - 50.0, 0.0);
        for _ in 0..100 {
            let p = world.random_ring_point();
            assert!(p.length() <= world.arena_radius);
        }
    }
}
