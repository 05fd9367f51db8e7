//! Static balance tables
//!
//! Mob, role, skill, wave and loot definitions. Loaded once from JSON
//! (embedded by default) and validated before a session can use them; the
//! tables are immutable for the lifetime of a [`World`](crate::sim::World).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::entities::{DamageKind, PlayerStats};

const BUILTIN_JSON: &str = include_str!("../data/game_data.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobKind {
    Slime,
    Bat,
    Skeleton,
    Golem,
    Wraith,
    SlimeKing,
    BoneLord,
}

/// Consumable held in the player's inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Restores a fraction of max hp
    Potion,
    /// Damages every hostile in a radius around the player
    Bomb,
    /// Brief invincibility
    Aegis,
    /// Temporary damage boost
    Fury,
}

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [ItemKind::Potion, ItemKind::Bomb, ItemKind::Aegis, ItemKind::Fury];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerOrbKind {
    Damage,
    Speed,
    Heal,
}

impl PowerOrbKind {
    pub const ALL: [PowerOrbKind; 3] = [PowerOrbKind::Damage, PowerOrbKind::Speed, PowerOrbKind::Heal];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LootTable {
    /// Experience orb value (stage mode)
    #[serde(default)]
    pub exp: u32,
    #[serde(default)]
    pub gold_min: u32,
    #[serde(default)]
    pub gold_max: u32,
    /// Chance of an item card on death (arena mode)
    #[serde(default)]
    pub card_chance: f32,
    /// Guaranteed card count (bosses)
    #[serde(default)]
    pub boss_cards: u32,
}

fn default_scale() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobDef {
    pub kind: MobKind,
    pub name: String,
    pub hp: f32,
    pub damage: f32,
    pub speed: f32,
    pub radius: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub boss: bool,
    #[serde(default)]
    pub loot: LootTable,
}

/// What a skill does when picked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkillEffect {
    DamageMult { value: f32 },
    CooldownMult { value: f32 },
    ProjectileCount { value: u32 },
    Pierce { value: u32 },
    AreaRadius { value: f32 },
    TargetingRange { value: f32 },
    ProjectileSpeedMult { value: f32 },
    MaxHp { value: f32 },
    KnockbackMult { value: f32 },
    OnHitStun,
    DamageReduction { value: f32 },
    DamageReflect { value: f32 },
    MoveSpeedMult { value: f32 },
    Element { kind: DamageKind },
    ExtraVolley { value: u32 },
    PickupRadius { value: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: String,
    pub name: String,
    pub effect: SkillEffect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDef {
    pub id: String,
    pub name: String,
    pub stats: PlayerStats,
    /// Role-exclusive skill ids, offered alongside the common pool
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnGroup {
    pub kind: MobKind,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossWave {
    pub kind: MobKind,
    /// Minion summoned by the boss's summon attack
    pub summon: MobKind,
    #[serde(default)]
    pub escort: Vec<SpawnGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveDef {
    #[serde(default)]
    pub mobs: Vec<SpawnGroup>,
    #[serde(default)]
    pub boss: Option<BossWave>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliteDef {
    pub hp_mult: f32,
    pub damage_mult: f32,
    pub scale_mult: f32,
    /// Gold inside the chest an elite drops
    pub chest_gold: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDef {
    /// Seconds per stage index
    pub stage_length: f32,
    pub spawn_interval: f32,
    pub min_spawn_interval: f32,
    /// Interval reduction per stage
    pub spawn_interval_step: f32,
    pub batch_base: u32,
    /// Extra hostiles per batch per stage
    pub batch_growth: u32,
    pub max_hostiles: usize,
    pub elite_interval: f32,
    /// Mob pool per stage index; the last entry repeats
    pub pools: Vec<Vec<MobKind>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaDef {
    /// Play-time thresholds (seconds) for 3 and 2 stars
    pub star_thresholds: [f32; 2],
    /// Fraction of gold lost on defeat
    pub defeat_gold_penalty: f32,
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to parse game data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("game data has no {0}")]
    Empty(&'static str),
    #[error("{context} references unknown mob {kind:?}")]
    UnknownMob { context: String, kind: MobKind },
    #[error("{context} references unknown skill '{id}'")]
    UnknownSkill { context: String, id: String },
    #[error("duplicate {what} '{id}'")]
    Duplicate { what: &'static str, id: String },
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: f32 },
}

/// All static tables for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    pub mobs: Vec<MobDef>,
    pub roles: Vec<RoleDef>,
    pub skills: Vec<SkillDef>,
    /// Skill ids every role can be offered
    pub common_skills: Vec<String>,
    pub waves: Vec<WaveDef>,
    pub stage: StageDef,
    pub elite: EliteDef,
    pub arena: ArenaDef,
}

impl GameData {
    /// The tables shipped with the crate
    pub fn builtin() -> Result<Self, DataError> {
        Self::from_json(BUILTIN_JSON)
    }

    /// Parse and validate tables from a JSON document
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let data: GameData = serde_json::from_str(json)?;
        data.validate()?;
        log::debug!(
            "loaded game data: {} mobs, {} roles, {} skills, {} waves",
            data.mobs.len(),
            data.roles.len(),
            data.skills.len(),
            data.waves.len()
        );
        Ok(data)
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if self.mobs.is_empty() {
            return Err(DataError::Empty("mobs"));
        }
        if self.roles.is_empty() {
            return Err(DataError::Empty("roles"));
        }
        if self.waves.is_empty() {
            return Err(DataError::Empty("waves"));
        }
        if self.stage.pools.is_empty() || self.stage.pools.iter().any(Vec::is_empty) {
            return Err(DataError::Empty("stage spawn pools"));
        }

        for (i, mob) in self.mobs.iter().enumerate() {
            if self.mobs[..i].iter().any(|m| m.kind == mob.kind) {
                return Err(DataError::Duplicate { what: "mob", id: mob.name.clone() });
            }
            positive(&format!("{}.hp", mob.name), mob.hp)?;
            positive(&format!("{}.radius", mob.name), mob.radius)?;
            positive(&format!("{}.scale", mob.name), mob.scale)?;
            non_negative(&format!("{}.damage", mob.name), mob.damage)?;
            non_negative(&format!("{}.speed", mob.name), mob.speed)?;
            if mob.loot.gold_min > mob.loot.gold_max {
                return Err(DataError::InvalidValue {
                    field: format!("{}.loot.gold_min", mob.name),
                    value: mob.loot.gold_min as f32,
                });
            }
            unit(&format!("{}.loot.card_chance", mob.name), mob.loot.card_chance)?;
        }

        for (i, skill) in self.skills.iter().enumerate() {
            if self.skills[..i].iter().any(|s| s.id == skill.id) {
                return Err(DataError::Duplicate { what: "skill", id: skill.id.clone() });
            }
        }
        for id in &self.common_skills {
            self.require_skill("common skill pool", id)?;
        }

        for (i, role) in self.roles.iter().enumerate() {
            if self.roles[..i].iter().any(|r| r.id == role.id) {
                return Err(DataError::Duplicate { what: "role", id: role.id.clone() });
            }
            for id in &role.skills {
                self.require_skill(&format!("role {}", role.id), id)?;
            }
            let s = &role.stats;
            positive(&format!("{}.max_hp", role.id), s.max_hp)?;
            positive(&format!("{}.move_speed", role.id), s.move_speed)?;
            positive(&format!("{}.attack_cooldown", role.id), s.attack_cooldown)?;
            positive(&format!("{}.projectile_speed", role.id), s.projectile_speed)?;
            positive(&format!("{}.projectile_lifetime", role.id), s.projectile_lifetime)?;
            non_negative(&format!("{}.damage", role.id), s.damage)?;
            non_negative(&format!("{}.targeting_range", role.id), s.targeting_range)?;
            if s.projectile_count == 0 {
                return Err(DataError::InvalidValue {
                    field: format!("{}.projectile_count", role.id),
                    value: 0.0,
                });
            }
        }

        for (i, wave) in self.waves.iter().enumerate() {
            let context = format!("wave {}", i + 1);
            if wave.mobs.is_empty() && wave.boss.is_none() {
                return Err(DataError::Empty("mobs in a wave"));
            }
            for group in &wave.mobs {
                self.require_mob(&context, group.kind)?;
            }
            if let Some(boss) = &wave.boss {
                self.require_mob(&context, boss.kind)?;
                self.require_mob(&context, boss.summon)?;
                for group in &boss.escort {
                    self.require_mob(&context, group.kind)?;
                }
            }
        }

        for pool in &self.stage.pools {
            for &kind in pool {
                self.require_mob("stage pool", kind)?;
            }
        }
        positive("stage.stage_length", self.stage.stage_length)?;
        positive("stage.min_spawn_interval", self.stage.min_spawn_interval)?;
        positive("stage.spawn_interval", self.stage.spawn_interval)?;
        positive("stage.elite_interval", self.stage.elite_interval)?;
        non_negative("stage.spawn_interval_step", self.stage.spawn_interval_step)?;
        positive("elite.hp_mult", self.elite.hp_mult)?;
        positive("elite.scale_mult", self.elite.scale_mult)?;
        non_negative("elite.damage_mult", self.elite.damage_mult)?;
        unit("arena.defeat_gold_penalty", self.arena.defeat_gold_penalty)?;
        Ok(())
    }

    fn require_mob(&self, context: &str, kind: MobKind) -> Result<(), DataError> {
        if self.mob(kind).is_none() {
            return Err(DataError::UnknownMob { context: context.to_string(), kind });
        }
        Ok(())
    }

    fn require_skill(&self, context: &str, id: &str) -> Result<(), DataError> {
        if self.skill(id).is_none() {
            return Err(DataError::UnknownSkill {
                context: context.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn mob(&self, kind: MobKind) -> Option<&MobDef> {
        self.mobs.iter().find(|m| m.kind == kind)
    }

    pub fn role(&self, id: &str) -> Option<&RoleDef> {
        self.roles.iter().find(|r| r.id == id)
    }

    /// First role in the table (validation guarantees one exists)
    pub fn default_role(&self) -> Option<&RoleDef> {
        self.roles.first()
    }

    pub fn skill(&self, id: &str) -> Option<&SkillDef> {
        self.skills.iter().find(|s| s.id == id)
    }

    /// Common skills followed by the role's own, without duplicates
    pub fn skill_pool(&self, role: &str) -> Vec<&str> {
        let mut pool: Vec<&str> = self.common_skills.iter().map(String::as_str).collect();
        if let Some(role) = self.role(role) {
            for id in &role.skills {
                if !pool.contains(&id.as_str()) {
                    pool.push(id);
                }
            }
        }
        pool
    }

    /// Wave definition by 1-based number
    pub fn wave(&self, number: u32) -> Option<&WaveDef> {
        let index = (number as usize).checked_sub(1)?;
        self.waves.get(index)
    }

    pub fn wave_count(&self) -> u32 {
        self.waves.len() as u32
    }
}

fn positive(field: &str, value: f32) -> Result<(), DataError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(DataError::InvalidValue { field: field.to_string(), value })
    }
}

fn non_negative(field: &str, value: f32) -> Result<(), DataError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(DataError::InvalidValue { field: field.to_string(), value })
    }
}

fn unit(field: &str, value: f32) -> Result<(), DataError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DataError::InvalidValue { field: field.to_string(), value })
    }
}
