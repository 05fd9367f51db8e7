//! Frame-driven simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - Every operation takes the world explicitly (no globals)
//! - Seeded RNG only
//! - Deferred work goes through the epoch-guarded scheduler

pub mod arena;
pub mod collision;
pub mod combat;
pub mod entities;
pub mod events;
pub mod modifiers;
pub mod schedule;
pub mod skills;
pub mod spatial;
pub mod stage;
pub mod state;
pub mod tick;

pub use arena::{AoeAttack, ArenaState, BossAttack, WavePhase};
pub use combat::{DamageOutcome, Hit, player_hit, take_damage};
pub use entities::{
    Collider, DamageKind, Entity, EntityId, FloatText, Hostile, HostileCtx, MovementMode, Particle, Pickup,
    PickupPayload, PickupState, Player, PlayerStats, Projectile,
};
pub use events::{GameEvent, RunResult};
pub use modifiers::{ModifierKind, ModifierStack, ModifierToken};
pub use schedule::{Deferred, Lane, Scheduler};
pub use skills::{ChoiceReason, PendingChoice, SkillChoiceError};
pub use spatial::{EntityKind, SpatialEntry, SpatialIndex};
pub use stage::StageState;
pub use state::{GameMode, GamePhase, SessionError, World};
pub use tick::{TickInput, clamp_frame_dt, tick};
