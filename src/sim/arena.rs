//! Arena mode: numbered waves ending in a boss encounter
//!
//! Waves go `Spawning -> Active -> Cleared`, with a skill choice between
//! waves. The boss wave opens with a countdown that freezes the simulation,
//! then the boss cycles `Seeking -> Telegraph -> {Charge | AOE | Summon}`.
//! All timed steps are scheduler continuations, so a session reset drops
//! them.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::collision::{circles_overlap, confine_to_disc};
use super::combat::player_hit;
use super::entities::{Collider, EntityId, MovementMode};
use super::events::GameEvent;
use super::schedule::Deferred;
use super::skills::{self, ChoiceReason};
use super::state::{GameMode, World};
use crate::consts::*;
use crate::data::{MobKind, PowerOrbKind};
use crate::polar_to_cartesian;

const AOE_COLOR: [f32; 4] = [1.0, 0.3, 0.2, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BossAttack {
    Charge,
    Aoe,
    Summon,
}

impl BossAttack {
    pub const ALL: [BossAttack; 3] = [BossAttack::Charge, BossAttack::Aoe, BossAttack::Summon];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavePhase {
    #[default]
    Idle,
    /// Waiting for the spawn (or the boss intro)
    Spawning,
    Active,
    Cleared,
}

/// Warning circle that hits the player if still inside when the fuse ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AoeAttack {
    pub pos: Vec2,
    pub radius: f32,
    pub fuse: f32,
    pub damage: f32,
}

impl AoeAttack {
    /// 0 when just placed, 1 at detonation
    pub fn progress(&self) -> f32 {
        (1.0 - self.fuse / AOE_FUSE).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArenaState {
    /// 1-based wave number
    pub wave: u32,
    pub wave_phase: WavePhase,
    pub wave_cleared: bool,
    /// Countdown running; the simulation is frozen
    pub showing_boss_intro: bool,
    pub aoe_attacks: Vec<AoeAttack>,
    /// Weak reference, validated every frame
    pub boss: Option<EntityId>,
    pub summon_kind: Option<MobKind>,
    pub boss_skill_timer: f32,
    pub power_orb_timer: f32,
}

impl ArenaState {
    pub fn clear_boss(&mut self) {
        self.boss = None;
        self.summon_kind = None;
        self.boss_skill_timer = 0.0;
        self.power_orb_timer = 0.0;
        self.aoe_attacks.clear();
    }
}

/// Start wave `wave`, or schedule victory past the last one
pub fn begin_wave(world: &mut World, wave: u32) {
    world.arena.wave = wave;
    world.arena.wave_cleared = false;

    let Some(def) = world.data.wave(wave) else {
        log::info!("no wave {}, all waves cleared", wave);
        world.schedule(VICTORY_DELAY, Deferred::Victory);
        return;
    };
    let boss = def.boss.is_some();

    log::info!("wave {} starting{}", wave, if boss { " (boss)" } else { "" });
    world.arena.wave_phase = WavePhase::Spawning;
    world.emit(GameEvent::WaveStarted { wave, boss });

    if boss {
        world.arena.showing_boss_intro = true;
        for (i, step) in [3, 2, 1, 0].into_iter().enumerate() {
            world.schedule(BOSS_COUNTDOWN_STEP * i as f32, Deferred::BossCountdown { wave, step });
        }
        world.schedule(BOSS_COUNTDOWN_STEP * 4.0, Deferred::BossArrival { wave });
    } else {
        world.schedule(WAVE_START_DELAY, Deferred::SpawnWave { wave });
    }
}

fn is_current(world: &World, wave: u32) -> bool {
    world.mode == GameMode::Arena && world.arena.wave == wave && world.arena.wave_phase == WavePhase::Spawning
}

pub fn spawn_wave(world: &mut World, wave: u32) {
    if !is_current(world, wave) {
        log::debug!("ignoring spawn for wave {} (current {})", wave, world.arena.wave);
        return;
    }
    let groups = world.data.wave(wave).map(|w| w.mobs.clone()).unwrap_or_default();
    let mut spawned = 0;
    for group in groups {
        for _ in 0..group.count {
            let pos = world.random_ring_point();
            if world.spawn_hostile(group.kind, pos).is_some() {
                spawned += 1;
            }
        }
    }
    log::debug!("wave {}: {} hostiles spawned", wave, spawned);
    world.arena.wave_phase = WavePhase::Active;
}

pub fn boss_countdown(world: &mut World, wave: u32, step: u32) {
    if !is_current(world, wave) || !world.arena.showing_boss_intro {
        return;
    }
    let label = if step > 0 {
        step.to_string()
    } else {
        world
            .data
            .wave(wave)
            .and_then(|w| w.boss.as_ref())
            .and_then(|b| world.data.mob(b.kind))
            .map(|m| m.name.clone())
            .unwrap_or_default()
    };
    world.emit(GameEvent::BossCountdown { label });
}

pub fn boss_arrival(world: &mut World, wave: u32) {
    if !is_current(world, wave) || !world.arena.showing_boss_intro {
        return;
    }
    world.arena.showing_boss_intro = false;
    world.arena.wave_phase = WavePhase::Active;

    let Some(boss) = world.data.wave(wave).and_then(|w| w.boss.clone()) else {
        return;
    };

    let pos = world.random_ring_point();
    match world.spawn_hostile(boss.kind, pos) {
        Some(id) => {
            let max_hp = world.hostile_index(id).map(|i| world.hostiles[i].max_hp).unwrap_or_default();
            world.arena.boss = Some(id);
            world.arena.summon_kind = Some(boss.summon);
            world.arena.boss_skill_timer = 0.0;
            world.arena.power_orb_timer = 0.0;
            log::info!("boss {:?} arrived ({} hp)", boss.kind, max_hp);
            world.emit(GameEvent::BossSpawned { id, kind: boss.kind, max_hp });
            world.add_shake(8.0);
        }
        None => log::warn!("boss {:?} has no definition", boss.kind),
    }

    for group in boss.escort {
        for _ in 0..group.count {
            let pos = world.random_ring_point();
            world.spawn_hostile(group.kind, pos);
        }
    }
}

/// Per-frame arena meta-state: AOE fuses, boss behaviour, wave completion
pub fn update(world: &mut World, dt: f32) {
    update_aoe(world, dt);
    update_boss(world, dt);
    check_wave_clear(world);
}

fn update_aoe(world: &mut World, dt: f32) {
    let mut detonated = Vec::new();
    world.arena.aoe_attacks.retain_mut(|aoe| {
        aoe.fuse -= dt;
        if aoe.fuse <= 0.0 {
            detonated.push(*aoe);
            false
        } else {
            true
        }
    });

    for aoe in detonated {
        world.spawn_particles(aoe.pos, 24, AOE_COLOR);
        world.add_shake(5.0);
        let player = &world.player;
        if circles_overlap(player.pos, player.radius, aoe.pos, aoe.radius) {
            player_hit(world, aoe.damage, None);
        }
    }
}

fn update_boss(world: &mut World, dt: f32) {
    let Some(boss_id) = world.arena.boss else {
        return;
    };
    let Some(index) = world.hostile_index(boss_id) else {
        // Culled or otherwise gone without the kill pipeline
        log::debug!("boss {:?} no longer present", boss_id);
        world.arena.clear_boss();
        return;
    };

    if let MovementMode::Telegraph { attack, remaining } = world.hostiles[index].movement {
        if remaining <= 0.0 {
            execute_attack(world, index, attack);
        }
    }

    world.arena.boss_skill_timer += dt;
    if world.arena.boss_skill_timer >= BOSS_SKILL_INTERVAL {
        world.arena.boss_skill_timer = 0.0;
        if world.hostiles[index].movement == MovementMode::Seeking {
            let attack = BossAttack::ALL[world.rng.random_range(0..BossAttack::ALL.len())];
            world.hostiles[index].movement = MovementMode::Telegraph { attack, remaining: TELEGRAPH_DURATION };
            log::debug!("boss telegraphs {:?}", attack);
            world.add_shake(6.0);
            world.emit(GameEvent::BossAttack { attack });
        }
    }

    world.arena.power_orb_timer += dt;
    if world.arena.power_orb_timer >= POWER_ORB_INTERVAL {
        world.arena.power_orb_timer = 0.0;
        let kind = PowerOrbKind::ALL[world.rng.random_range(0..PowerOrbKind::ALL.len())];
        let angle = world.rng.random_range(0.0..std::f32::consts::TAU);
        let dist = world.rng.random_range(120.0..260.0);
        let pos = confine_to_disc(
            world.player.pos + polar_to_cartesian(dist, angle),
            PICKUP_RADIUS,
            world.arena_radius,
        );
        world.spawn_power_orb(pos, kind);
    }
}

/// Telegraph finished: carry out the attack
fn execute_attack(world: &mut World, index: usize, attack: BossAttack) {
    let boss = &world.hostiles[index];
    let boss_pos = boss.pos;
    let boss_radius = boss.radius();
    let damage = boss.damage;
    let player_pos = world.player.pos;

    match attack {
        BossAttack::Charge => {
            // Aimed at where the player is now; doesn't track afterwards
            let dir = (player_pos - boss_pos).normalize_or_zero();
            world.hostiles[index].movement = MovementMode::Charging {
                vel: dir * CHARGE_SPEED,
                remaining: CHARGE_DURATION,
            };
        }
        BossAttack::Aoe => {
            world.hostiles[index].movement = MovementMode::Seeking;
            world.arena.aoe_attacks.push(AoeAttack {
                pos: player_pos,
                radius: AOE_RADIUS,
                fuse: AOE_FUSE,
                damage: damage * AOE_DAMAGE_MULT,
            });
        }
        BossAttack::Summon => {
            world.hostiles[index].movement = MovementMode::Summoning { remaining: SUMMON_DURATION };
            if let Some(kind) = world.arena.summon_kind {
                for i in 0..SUMMON_COUNT {
                    let angle = std::f32::consts::TAU * i as f32 / SUMMON_COUNT as f32;
                    let pos = boss_pos + polar_to_cartesian(boss_radius + 30.0, angle);
                    world.spawn_hostile(kind, pos);
                }
            }
        }
    }
}

fn check_wave_clear(world: &mut World) {
    if world.arena.wave_phase != WavePhase::Active || world.arena.showing_boss_intro {
        return;
    }
    if !world.hostiles.is_empty() {
        return;
    }

    let wave = world.arena.wave;
    world.arena.wave_phase = WavePhase::Cleared;
    world.arena.wave_cleared = true;
    log::info!("wave {} cleared", wave);
    world.emit(GameEvent::WaveCleared { wave });

    if wave >= world.data.wave_count() {
        world.schedule(VICTORY_DELAY, Deferred::Victory);
    } else if !skills::offer(world, ChoiceReason::WaveCleared { next_wave: wave + 1 }) {
        begin_wave(world, wave + 1);
    }
}
