//! Entity model
//!
//! A closed set of kinds: the player, hostiles, projectiles, pickups, and
//! cosmetic particles/floating text. Every kind owns an `update` taking an
//! explicit context and exposes the shared [`Entity`] capability. Nothing
//! here sets another entity's `dead` flag; that only happens through combat
//! resolution.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::confine_to_disc;
use super::modifiers::{ModifierKind, ModifierStack};
use crate::consts::*;
use crate::data::{EliteDef, ItemKind, LootTable, MobDef, MobKind, PowerOrbKind};
use crate::decay;

/// Stable identity, never reused within a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Capability shared by every kind
pub trait Entity {
    fn pos(&self) -> Vec2;
    /// Tombstone; set once and removed at end-of-frame compaction
    fn is_dead(&self) -> bool;
}

/// Entities that take part in spatial queries
pub trait Collider: Entity {
    fn id(&self) -> EntityId;
    fn radius(&self) -> f32;
}

/// Drop tombstoned entries, preserving order. Returns how many were removed.
pub fn compact<E: Entity>(list: &mut Vec<E>) -> usize {
    let before = list.len();
    list.retain(|e| !e.is_dead());
    before - list.len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    Sword,
    Fire,
    Thunder,
    Earth,
    Water,
    Wind,
    /// Hostile touching the player
    Contact,
    /// Damage bounced back by the player's reflect stat
    Reflect,
    /// Bombs and boss AOE
    Blast,
}

impl DamageKind {
    pub const COUNT: usize = 9;

    pub fn index(self) -> usize {
        match self {
            DamageKind::Sword => 0,
            DamageKind::Fire => 1,
            DamageKind::Thunder => 2,
            DamageKind::Earth => 3,
            DamageKind::Water => 4,
            DamageKind::Wind => 5,
            DamageKind::Contact => 6,
            DamageKind::Reflect => 7,
            DamageKind::Blast => 8,
        }
    }

    pub fn knockback_base(self) -> f32 {
        match self {
            DamageKind::Earth => KNOCKBACK_EARTH,
            _ => KNOCKBACK_BASE,
        }
    }

    /// Kinds whose damage numbers get the critical presentation
    pub fn is_critical(self) -> bool {
        matches!(self, DamageKind::Fire | DamageKind::Thunder | DamageKind::Earth)
    }
}

/// Player stat bundle (role base values, grown by skills)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub max_hp: f32,
    pub move_speed: f32,
    pub damage: f32,
    /// Splash radius of each projectile hit (0 = single target)
    #[serde(default)]
    pub area_radius: f32,
    pub targeting_range: f32,
    pub projectile_count: u32,
    pub attack_cooldown: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub element: DamageKind,
    #[serde(default)]
    pub pierce: u32,
    #[serde(default = "one")]
    pub knockback_mult: f32,
    #[serde(default)]
    pub on_hit_stun: bool,
    #[serde(default)]
    pub damage_reduction: f32,
    #[serde(default)]
    pub damage_reflect: f32,
    #[serde(default)]
    pub extra_volleys: u32,
    pub pickup_radius: f32,
}

fn one() -> f32 {
    1.0
}

/// The player (exactly one per session)
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    /// Last frame's velocity, used for visual tilt only
    pub vel: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub level: u32,
    pub exp: u32,
    pub max_exp: u32,
    pub stats: PlayerStats,
    pub attack_timer: f32,
    pub dash_cooldown: f32,
    pub dash_timer: f32,
    pub dash_dir: Vec2,
    pub invulnerability: f32,
    pub modifiers: ModifierStack,
    pub inventory: [Option<ItemKind>; INVENTORY_SLOTS],
    pub facing: Vec2,
}

impl Player {
    pub fn new(stats: PlayerStats) -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: PLAYER_RADIUS,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            level: 1,
            exp: 0,
            max_exp: 10,
            attack_timer: stats.attack_cooldown,
            stats,
            dash_cooldown: 0.0,
            dash_timer: 0.0,
            dash_dir: Vec2::X,
            invulnerability: 0.0,
            modifiers: ModifierStack::new(),
            inventory: [None; INVENTORY_SLOTS],
            facing: Vec2::X,
        }
    }

    /// Damage is ignored while this holds
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerability > 0.0 || self.modifiers.has(ModifierKind::Invincible)
    }

    pub fn damage_multiplier(&self) -> f32 {
        self.modifiers.product(ModifierKind::DamageBoost)
    }

    pub fn is_dashing(&self) -> bool {
        self.dash_timer > 0.0
    }

    pub fn speed(&self) -> f32 {
        let dash = if self.is_dashing() { DASH_SPEED_MULT } else { 1.0 };
        self.stats.move_speed * self.modifiers.product(ModifierKind::SpeedBoost) * dash
    }

    pub fn tick_timers(&mut self, dt: f32) {
        self.attack_timer = (self.attack_timer - dt).max(0.0);
        self.dash_cooldown = (self.dash_cooldown - dt).max(0.0);
        self.dash_timer = (self.dash_timer - dt).max(0.0);
        self.invulnerability = (self.invulnerability - dt).max(0.0);
    }

    /// Start a dash along `dir` (or the facing direction). False while on cooldown.
    pub fn try_dash(&mut self, dir: Vec2) -> bool {
        if self.dash_cooldown > 0.0 {
            return false;
        }
        let dir = if dir.is_finite() { dir } else { Vec2::ZERO };
        self.dash_dir = dir.try_normalize().unwrap_or(self.facing);
        self.dash_timer = DASH_DURATION;
        self.dash_cooldown = DASH_COOLDOWN;
        true
    }

    /// Move by the polled input direction and stay inside the arena
    pub fn update(&mut self, dt: f32, move_dir: Vec2, arena_radius: f32) {
        let mut dir = if move_dir.is_finite() { move_dir } else { Vec2::ZERO };
        if dir.length_squared() > 1.0 {
            dir = dir.normalize();
        }
        if self.is_dashing() {
            dir = self.dash_dir;
        }

        self.vel = dir * self.speed();
        self.pos = confine_to_disc(self.pos + self.vel * dt, self.radius, arena_radius);
        if let Some(facing) = dir.try_normalize() {
            self.facing = facing;
        }
    }

    pub fn heal(&mut self, amount: f32) {
        if amount > 0.0 && amount.is_finite() {
            self.hp = (self.hp + amount).min(self.max_hp);
        }
    }

    /// Add experience, returning the number of levels gained
    pub fn gain_exp(&mut self, amount: u32) -> u32 {
        self.exp = self.exp.saturating_add(amount);
        let mut levels = 0;
        while self.max_exp > 0 && self.exp >= self.max_exp {
            self.exp -= self.max_exp;
            self.level += 1;
            self.max_exp = (self.max_exp as f32 * 1.25).ceil() as u32;
            levels += 1;
        }
        levels
    }

    /// Put an item in the first free slot; false when the inventory is full
    pub fn store_item(&mut self, item: ItemKind) -> bool {
        match self.inventory.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(item);
                true
            }
            None => false,
        }
    }

    pub fn take_item(&mut self, slot: usize) -> Option<ItemKind> {
        self.inventory.get_mut(slot)?.take()
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp > 0.0 {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Entity for Player {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}

/// Exactly one velocity source applies per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementMode {
    Seeking,
    /// Standing still while the attack warning plays
    Telegraph {
        attack: super::arena::BossAttack,
        remaining: f32,
    },
    /// Fixed velocity, ignores the player's movement
    Charging { vel: Vec2, remaining: f32 },
    Summoning { remaining: f32 },
}

/// What a hostile needs to know about the world each frame
#[derive(Debug, Clone, Copy)]
pub struct HostileCtx {
    pub player_pos: Vec2,
    pub player_radius: f32,
}

#[derive(Debug, Clone)]
pub struct Hostile {
    pub id: EntityId,
    pub kind: MobKind,
    pub pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub damage: f32,
    pub speed: f32,
    pub base_radius: f32,
    pub scale: f32,
    /// Knockback impulse, decays every frame
    pub push: Vec2,
    pub slow_timer: f32,
    pub stun_timer: f32,
    pub flash_timer: f32,
    /// Per damage kind: time until another damage number may show
    pub number_cooldowns: [f32; DamageKind::COUNT],
    pub is_elite: bool,
    pub is_boss: bool,
    pub loot: LootTable,
    pub movement: MovementMode,
    pub dead: bool,
}

impl Hostile {
    pub fn from_def(id: EntityId, def: &MobDef, pos: Vec2) -> Self {
        Self {
            id,
            kind: def.kind,
            pos,
            hp: def.hp,
            max_hp: def.hp,
            damage: def.damage,
            speed: def.speed,
            base_radius: def.radius,
            scale: def.scale,
            push: Vec2::ZERO,
            slow_timer: 0.0,
            stun_timer: 0.0,
            flash_timer: 0.0,
            number_cooldowns: [0.0; DamageKind::COUNT],
            is_elite: false,
            is_boss: def.boss,
            loot: def.loot.clone(),
            movement: MovementMode::Seeking,
            dead: false,
        }
    }

    pub fn into_elite(mut self, elite: &EliteDef) -> Self {
        self.is_elite = true;
        self.max_hp *= elite.hp_mult;
        self.hp = self.max_hp;
        self.damage *= elite.damage_mult;
        self.scale *= elite.scale_mult;
        self
    }

    /// Distance at which the hostile is considered touching the player
    pub fn contact_radius(&self, player_radius: f32) -> f32 {
        self.radius() + player_radius
    }

    /// Contact damage only lands inside this slightly smaller radius
    pub fn strike_radius(&self, player_radius: f32) -> f32 {
        self.contact_radius(player_radius) * STRIKE_RATIO
    }

    pub fn effective_speed(&self) -> f32 {
        if self.slow_timer > 0.0 {
            self.speed * SLOW_FACTOR
        } else {
            self.speed
        }
    }

    pub fn is_out_of_bounds(&self, arena_radius: f32) -> bool {
        !self.pos.is_finite() || self.pos.length() > arena_radius * OUT_OF_BOUNDS_FACTOR
    }

    /// Claim the damage-number slot for `kind`; false while throttled
    pub fn take_number_slot(&mut self, kind: DamageKind) -> bool {
        let slot = &mut self.number_cooldowns[kind.index()];
        if *slot > 0.0 {
            return false;
        }
        *slot = DAMAGE_NUMBER_WINDOW;
        true
    }

    pub fn update(&mut self, dt: f32, ctx: &HostileCtx) {
        self.slow_timer = (self.slow_timer - dt).max(0.0);
        self.stun_timer = (self.stun_timer - dt).max(0.0);
        self.flash_timer = (self.flash_timer - dt).max(0.0);
        for cooldown in &mut self.number_cooldowns {
            *cooldown = (*cooldown - dt).max(0.0);
        }

        let to_player = ctx.player_pos - self.pos;
        let seek = if self.stun_timer > 0.0 {
            Vec2::ZERO
        } else {
            to_player.normalize_or_zero() * self.effective_speed()
        };

        let (ai_vel, next_mode) = match self.movement {
            MovementMode::Seeking => (seek, None),
            MovementMode::Telegraph { attack, remaining } => (
                Vec2::ZERO,
                Some(MovementMode::Telegraph { attack, remaining: remaining - dt }),
            ),
            MovementMode::Charging { vel, remaining } => {
                let remaining = remaining - dt;
                let next = if remaining <= 0.0 {
                    MovementMode::Seeking
                } else {
                    MovementMode::Charging { vel, remaining }
                };
                (vel, Some(next))
            }
            MovementMode::Summoning { remaining } => {
                let remaining = remaining - dt;
                let next = if remaining <= 0.0 {
                    MovementMode::Seeking
                } else {
                    MovementMode::Summoning { remaining }
                };
                (Vec2::ZERO, Some(next))
            }
        };
        if let Some(mode) = next_mode {
            self.movement = mode;
        }

        // Repulsion keeps hostiles from stacking on top of the player
        let dist = to_player.length();
        if dist < self.contact_radius(ctx.player_radius) {
            let away = if dist > 1e-4 { -to_player / dist } else { Vec2::X };
            self.push += away * self.speed * REPULSION_STRENGTH * dt;
        }

        self.pos += (ai_vel + self.push) * dt;
        self.push *= decay(KNOCKBACK_DECAY_RATE, dt);
    }
}

impl Entity for Hostile {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn is_dead(&self) -> bool {
        self.dead
    }
}

impl Collider for Hostile {
    fn id(&self) -> EntityId {
        self.id
    }

    fn radius(&self) -> f32 {
        self.base_radius * self.scale
    }
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub radius: f32,
    pub damage: f32,
    pub kind: DamageKind,
    /// Additional hostiles this projectile may pass through
    pub pierce_left: u32,
    pub knockback_mult: f32,
    pub stun: bool,
    pub splash_radius: f32,
    pub hits: Vec<EntityId>,
    pub dead: bool,
}

impl Projectile {
    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.life -= dt;
        if self.life <= 0.0 {
            self.dead = true;
        }
    }

    pub fn already_hit(&self, id: EntityId) -> bool {
        self.hits.contains(&id)
    }

    /// Record a hit, consuming one pierce or the projectile itself
    pub fn register_hit(&mut self, id: EntityId) {
        self.hits.push(id);
        if self.pierce_left == 0 {
            self.dead = true;
        } else {
            self.pierce_left -= 1;
        }
    }

    pub fn is_out_of_bounds(&self, arena_radius: f32) -> bool {
        !self.pos.is_finite() || self.pos.length() > arena_radius * OUT_OF_BOUNDS_FACTOR
    }
}

impl Entity for Projectile {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn is_dead(&self) -> bool {
        self.dead
    }
}

impl Collider for Projectile {
    fn id(&self) -> EntityId {
        self.id
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PickupPayload {
    Exp(u32),
    Gold(u32),
    /// Elite drop: gold plus a small heal
    Chest { gold: u32 },
    Card(ItemKind),
    PowerOrb(PowerOrbKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickupState {
    /// Scattering or resting on the ground
    Free,
    /// Homing on the player
    Attracting { speed: f32 },
    Collected,
}

#[derive(Debug, Clone)]
pub struct Pickup {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Hop height above the ground (visual)
    pub height: f32,
    pub vz: f32,
    pub payload: PickupPayload,
    pub state: PickupState,
    /// Countdown for expiring pickups (power orbs)
    pub life: Option<f32>,
    pub dead: bool,
}

impl Pickup {
    pub fn new(id: EntityId, pos: Vec2, payload: PickupPayload) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            height: 0.0,
            vz: 0.0,
            payload,
            state: PickupState::Free,
            life: None,
            dead: false,
        }
    }

    /// Start homing on the player. Only a free pickup can be attracted.
    pub fn attract_to(&mut self) -> bool {
        if self.state != PickupState::Free || self.dead {
            return false;
        }
        self.state = PickupState::Attracting { speed: ATTRACT_START_SPEED };
        true
    }

    pub fn update(&mut self, dt: f32, target: Vec2) {
        if let Some(life) = self.life.as_mut() {
            *life -= dt;
            if *life <= 0.0 && self.state == PickupState::Free {
                self.dead = true;
                return;
            }
        }

        match self.state {
            PickupState::Free => {
                self.pos += self.vel * dt;
                self.vel *= decay(PICKUP_FRICTION, dt);
                self.vz -= PICKUP_GRAVITY * dt;
                self.height += self.vz * dt;
                if self.height <= 0.0 {
                    self.height = 0.0;
                    // Small bounce, settles after a couple of hops
                    self.vz = -self.vz * 0.4;
                    if self.vz < 30.0 {
                        self.vz = 0.0;
                    }
                }
            }
            PickupState::Attracting { speed } => {
                let speed = speed + ATTRACT_ACCEL * dt;
                self.state = PickupState::Attracting { speed };
                let to = target - self.pos;
                let dist = to.length();
                let step = speed * dt;
                if step >= dist {
                    self.pos = target;
                } else {
                    self.pos += to / dist * step;
                }
                self.height = (self.height - 200.0 * dt).max(0.0);
            }
            PickupState::Collected => {}
        }
    }

    pub fn in_collect_range(&self, target: Vec2) -> bool {
        self.pos.distance(target) <= COLLECT_RADIUS
    }

    /// Take the payload; only succeeds once
    pub fn collect(&mut self) -> Option<PickupPayload> {
        if self.dead || self.state == PickupState::Collected {
            return None;
        }
        self.state = PickupState::Collected;
        self.dead = true;
        Some(self.payload)
    }
}

impl Entity for Pickup {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn is_dead(&self) -> bool {
        self.dead
    }
}

impl Collider for Pickup {
    fn id(&self) -> EntityId {
        self.id
    }

    fn radius(&self) -> f32 {
        PICKUP_RADIUS
    }
}

/// Cosmetic particle, never read by gameplay
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: [f32; 4],
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
}

impl Particle {
    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.vel *= decay(3.0, dt);
        self.life -= dt;
    }

    /// Remaining life in 0..1, for fading
    pub fn fade(&self) -> f32 {
        if self.max_life > 0.0 {
            (self.life / self.max_life).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Entity for Particle {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn is_dead(&self) -> bool {
        self.life <= 0.0
    }
}

/// Floating damage number or label
#[derive(Debug, Clone)]
pub struct FloatText {
    pub pos: Vec2,
    pub text: String,
    pub crit: bool,
    pub life: f32,
}

impl FloatText {
    pub const LIFETIME: f32 = 0.8;
    const RISE_SPEED: f32 = 40.0;

    pub fn update(&mut self, dt: f32) {
        self.pos.y += Self::RISE_SPEED * dt;
        self.life -= dt;
    }
}

impl Entity for FloatText {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn is_dead(&self) -> bool {
        self.life <= 0.0
    }
}
