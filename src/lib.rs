//! Horde Arena - a real-time 2D horde/arena action game core
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (spatial index, entities, combat, waves, bosses)
//! - `data`: Static balance tables (mobs, roles, skills, waves, loot)
//! - `renderer`: Read-only draw-list builder for an external canvas/GPU backend
//! - `settings`: Player preferences and the last selected role

pub mod data;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use data::GameData;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal frame delta used by the headless driver (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest delta a single frame may integrate (tab stalls, debugger pauses)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// World disc radius when settings don't override it
    pub const DEFAULT_ARENA_RADIUS: f32 = 1200.0;
    /// Spatial hash cell edge
    pub const SPATIAL_CELL_SIZE: f32 = 64.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 16.0;
    pub const INVULNERABILITY_WINDOW: f32 = 0.3;
    pub const DASH_DURATION: f32 = 0.2;
    pub const DASH_COOLDOWN: f32 = 1.2;
    pub const DASH_SPEED_MULT: f32 = 2.8;
    pub const INVENTORY_SLOTS: usize = 3;
    /// Max damage reduction a build can stack
    pub const MAX_DAMAGE_REDUCTION: f32 = 0.75;

    /// Hostile motion
    /// Knockback impulse decay rate: -ln(0.9) * 60, i.e. 0.9 per frame at 60 Hz
    pub const KNOCKBACK_DECAY_RATE: f32 = 6.3216;
    pub const REPULSION_STRENGTH: f32 = 12.0;
    /// Strike radius as a fraction of the contact radius
    pub const STRIKE_RATIO: f32 = 0.85;
    /// Hostiles/projectiles further than this multiple of the arena radius are culled
    pub const OUT_OF_BOUNDS_FACTOR: f32 = 1.5;

    /// Combat
    pub const KNOCKBACK_BASE: f32 = 120.0;
    pub const KNOCKBACK_EARTH: f32 = 300.0;
    pub const HEAVY_KNOCKBACK_DAMP: f32 = 0.2;
    pub const HIT_FLASH_DURATION: f32 = 0.1;
    pub const DAMAGE_NUMBER_WINDOW: f32 = 0.2;
    pub const SLOW_DURATION: f32 = 2.0;
    pub const SLOW_FACTOR: f32 = 0.5;
    pub const STUN_DURATION: f32 = 0.25;
    pub const SPLASH_FRACTION: f32 = 0.5;
    pub const HIT_STOP_ELITE: f32 = 0.08;
    pub const HIT_STOP_BOSS: f32 = 0.25;
    pub const PROJECTILE_RADIUS: f32 = 6.0;
    pub const VOLLEY_SPREAD: f32 = 0.18; // radians between sibling projectiles
    pub const VOLLEY_INTERVAL: f32 = 0.12;

    /// Pickups
    pub const PICKUP_RADIUS: f32 = 8.0;
    pub const PICKUP_GRAVITY: f32 = 900.0;
    pub const PICKUP_FRICTION: f32 = 4.0;
    pub const ATTRACT_START_SPEED: f32 = 120.0;
    pub const ATTRACT_ACCEL: f32 = 1400.0;
    pub const COLLECT_RADIUS: f32 = 14.0;
    pub const POWER_ORB_LIFE: f32 = 6.0;
    /// Gold paid out for a card that doesn't fit in the inventory
    pub const CARD_GOLD_VALUE: u32 = 15;

    /// Items and power orbs
    pub const POTION_HEAL_FRACTION: f32 = 0.35;
    pub const CHEST_HEAL_FRACTION: f32 = 0.2;
    pub const BOMB_RADIUS: f32 = 260.0;
    pub const BOMB_DAMAGE: f32 = 80.0;
    pub const AEGIS_DURATION: f32 = 3.0;
    pub const FURY_MULT: f32 = 1.5;
    pub const FURY_DURATION: f32 = 6.0;
    pub const ORB_DAMAGE_MULT: f32 = 1.5;
    pub const ORB_SPEED_MULT: f32 = 1.3;
    pub const ORB_BOOST_DURATION: f32 = 5.0;
    pub const ORB_HEAL_FRACTION: f32 = 0.25;

    /// Soft caps (oldest evicted first)
    pub const MAX_PROJECTILES: usize = 400;
    pub const MAX_TEXTS: usize = 64;

    /// Arena waves and boss
    pub const WAVE_START_DELAY: f32 = 1.0;
    pub const BOSS_COUNTDOWN_STEP: f32 = 0.8;
    pub const BOSS_SKILL_INTERVAL: f32 = 5.0;
    pub const POWER_ORB_INTERVAL: f32 = 8.0;
    pub const TELEGRAPH_DURATION: f32 = 0.4;
    pub const AOE_FUSE: f32 = 1.5;
    pub const AOE_RADIUS: f32 = 110.0;
    pub const AOE_DAMAGE_MULT: f32 = 1.5;
    pub const CHARGE_DURATION: f32 = 0.5;
    pub const CHARGE_SPEED: f32 = 650.0;
    pub const SUMMON_DURATION: f32 = 0.6;
    pub const SUMMON_COUNT: usize = 3;
    pub const VICTORY_DELAY: f32 = 1.5;
    pub const SKILL_RESUME_DELAY: f32 = 0.3;
    pub const SKILL_CHOICE_COUNT: usize = 3;

    /// Spawn rings around the player
    pub const SPAWN_RING_MIN: f32 = 380.0;
    pub const SPAWN_RING_MAX: f32 = 520.0;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Frame-rate independent exponential decay factor for `rate` over `dt`
#[inline]
pub fn decay(rate: f32, dt: f32) -> f32 {
    (-rate * dt).exp()
}

/// Rotate a direction by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (s, c) = angle.sin_cos();
    Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}
