//! Discrete notifications for the HUD and audio layers
//!
//! The world pushes events as things happen; the host drains them once per
//! frame with [`World::drain_events`](super::World::drain_events).

use glam::Vec2;
use serde::Serialize;

use super::arena::BossAttack;
use super::entities::EntityId;
use crate::data::{ItemKind, MobKind};

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    SessionStarted { role: String },
    WaveStarted { wave: u32, boss: bool },
    WaveCleared { wave: u32 },
    /// Boss intro step: "3", "2", "1", then the boss name
    BossCountdown { label: String },
    BossSpawned { id: EntityId, kind: MobKind, max_hp: f32 },
    /// Telegraph started; the attack lands when it ends
    BossAttack { attack: BossAttack },
    BossDefeated { kind: MobKind },
    HostileKilled { id: EntityId, kind: MobKind, pos: Vec2, elite: bool, boss: bool },
    PlayerDamaged { amount: f32, hp: f32 },
    LevelUp { level: u32 },
    SkillChoicesOffered { options: Vec<String> },
    SkillChosen { id: String },
    PickupCollected { pos: Vec2 },
    ItemUsed { item: ItemKind },
    StageAdvanced { stage: u32 },
    Victory { result: RunResult },
    Defeat { result: RunResult },
}

/// End-of-run summary shown on the result screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub victory: bool,
    /// 1..=3 on victory, 0 on defeat
    pub stars: u8,
    /// Gold as displayed (after the defeat penalty)
    pub gold: u32,
    pub kills: u32,
    pub play_time: f32,
    pub wave: u32,
    pub level: u32,
}
