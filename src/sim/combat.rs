//! Combat resolution
//!
//! Damage, knockback, status effects, the single kill pipeline, loot rolls,
//! player damage, and the pickup/item effects that feed back into combat.
//! Every proximity check goes through the spatial index built for the
//! current frame; entries are re-validated by id before use.

use glam::Vec2;
use rand::Rng;

use super::collision::circles_overlap;
use super::entities::{Collider, DamageKind, EntityId, PickupPayload, Projectile};
use super::events::GameEvent;
use super::modifiers::ModifierKind;
use super::skills;
use super::spatial::EntityKind;
use super::state::{GameMode, GamePhase, World};
use crate::consts::*;
use crate::data::{ItemKind, LootTable, PowerOrbKind};
use crate::rotate;

const DEATH_COLOR: [f32; 4] = [0.9, 0.35, 0.3, 1.0];
const BOSS_DEATH_COLOR: [f32; 4] = [1.0, 0.8, 0.2, 1.0];
const BLAST_COLOR: [f32; 4] = [1.0, 0.55, 0.15, 1.0];

/// One application of damage to a hostile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub amount: f32,
    /// Knockback direction (need not be normalized; zero means none)
    pub dir: Vec2,
    pub kind: DamageKind,
    pub knockback_mult: f32,
}

impl Hit {
    pub fn new(amount: f32, dir: Vec2, kind: DamageKind) -> Self {
        Self { amount, dir, kind, knockback_mult: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Invalid amount, missing or already-dead target
    Ignored,
    Damaged,
    Killed,
}

/// Apply a hit to the hostile at `index`
pub fn take_damage(world: &mut World, index: usize, hit: Hit) -> DamageOutcome {
    if !(hit.amount > 0.0) || !hit.amount.is_finite() {
        log::trace!("ignoring invalid damage amount {}", hit.amount);
        return DamageOutcome::Ignored;
    }
    let Some(hostile) = world.hostiles.get_mut(index) else {
        return DamageOutcome::Ignored;
    };
    if hostile.dead {
        return DamageOutcome::Ignored;
    }

    hostile.hp -= hit.amount;

    let mut force = hit.kind.knockback_base() * hit.knockback_mult.max(0.0);
    if hostile.is_elite || hostile.is_boss {
        force *= HEAVY_KNOCKBACK_DAMP;
    }
    if let Some(dir) = hit.dir.try_normalize() {
        hostile.push += dir * force;
    }
    hostile.flash_timer = HIT_FLASH_DURATION;
    if hit.kind == DamageKind::Water {
        hostile.slow_timer = SLOW_DURATION;
    }

    let crit = hit.kind.is_critical();
    let show_number = crit || hostile.take_number_slot(hit.kind);
    let pos = hostile.pos;
    let killed = hostile.hp <= 0.0;

    if show_number {
        let label = format!("{}", hit.amount.round().max(1.0) as u32);
        world.spawn_text(pos, label, crit);
    }

    if killed {
        kill_hostile(world, index);
        DamageOutcome::Killed
    } else {
        DamageOutcome::Damaged
    }
}

/// The one place a hostile dies with rewards. Safe to call twice.
fn kill_hostile(world: &mut World, index: usize) {
    let Some(hostile) = world.hostiles.get_mut(index) else {
        return;
    };
    if hostile.dead {
        return;
    }
    hostile.dead = true;
    let id = hostile.id;
    let kind = hostile.kind;
    let pos = hostile.pos;
    let elite = hostile.is_elite;
    let boss = hostile.is_boss;
    let loot = hostile.loot.clone();

    world.kills += 1;
    roll_loot(world, pos, &loot, elite, boss);

    if boss {
        world.spawn_particles(pos, 40, BOSS_DEATH_COLOR);
        world.hit_stop(HIT_STOP_BOSS);
        world.add_shake(12.0);
        if world.arena.boss == Some(id) {
            world.arena.clear_boss();
        }
        log::info!("boss {:?} defeated", kind);
        world.emit(GameEvent::BossDefeated { kind });
    } else if elite {
        world.spawn_particles(pos, 20, DEATH_COLOR);
        world.hit_stop(HIT_STOP_ELITE);
        world.add_shake(4.0);
    } else {
        world.spawn_particles(pos, 8, DEATH_COLOR);
    }

    log::debug!("{:?} {:?} killed (total {})", kind, id, world.kills);
    world.emit(GameEvent::HostileKilled { id, kind, pos, elite, boss });
}

fn roll_gold(world: &mut World, loot: &LootTable) -> u32 {
    if loot.gold_max > loot.gold_min {
        world.rng.random_range(loot.gold_min..=loot.gold_max)
    } else {
        loot.gold_min
    }
}

fn random_item(world: &mut World) -> ItemKind {
    ItemKind::ALL[world.rng.random_range(0..ItemKind::ALL.len())]
}

fn roll_loot(world: &mut World, pos: Vec2, loot: &LootTable, elite: bool, boss: bool) {
    if boss {
        let gold = roll_gold(world, loot);
        world.spawn_pickup(pos, PickupPayload::Gold(gold));
        for _ in 0..loot.boss_cards {
            let item = random_item(world);
            world.spawn_pickup(pos, PickupPayload::Card(item));
        }
        return;
    }
    if elite {
        let gold = world.data.elite.chest_gold;
        world.spawn_pickup(pos, PickupPayload::Chest { gold });
        return;
    }

    match world.mode {
        GameMode::Stage => {
            world.spawn_pickup(pos, PickupPayload::Exp(loot.exp.max(1)));
        }
        GameMode::Arena => {
            let gold = roll_gold(world, loot);
            if gold > 0 {
                world.spawn_pickup(pos, PickupPayload::Gold(gold));
            }
            if loot.card_chance > 0.0 && world.rng.random::<f32>() < loot.card_chance {
                let item = random_item(world);
                world.spawn_pickup(pos, PickupPayload::Card(item));
            }
        }
    }
}

/// Damage the player. Returns false when the hit was ignored.
pub fn player_hit(world: &mut World, damage: f32, attacker: Option<EntityId>) -> bool {
    if !(damage > 0.0) || !damage.is_finite() {
        return false;
    }
    let player = &mut world.player;
    if player.is_invulnerable() {
        return false;
    }

    let reduction = player.stats.damage_reduction.clamp(0.0, MAX_DAMAGE_REDUCTION);
    let amount = damage * (1.0 - reduction);
    player.hp = (player.hp - amount).max(0.0);
    player.invulnerability = INVULNERABILITY_WINDOW;
    let hp = player.hp;
    let reflect = player.stats.damage_reflect;
    let player_pos = player.pos;

    world.emit(GameEvent::PlayerDamaged { amount, hp });
    world.add_shake(3.0);

    if reflect > 0.0 {
        if let Some(index) = attacker.and_then(|id| world.hostile_index(id)) {
            let dir = world.hostiles[index].pos - player_pos;
            take_damage(world, index, Hit::new(damage * reflect, dir, DamageKind::Reflect));
        }
    }
    true
}

/// Live hostile at a spatial entry, re-validated by id
fn live_hostile(world: &World, index: usize, id: EntityId) -> Option<(Vec2, f32)> {
    let hostile = world.hostiles.get(index)?;
    if hostile.dead || hostile.id != id {
        return None;
    }
    Some((hostile.pos, hostile.radius()))
}

pub fn resolve_projectile_hits(world: &mut World) {
    let pad = world.spatial.max_radius(EntityKind::Hostile);
    for pi in 0..world.projectiles.len() {
        let (pos, radius) = {
            let p = &world.projectiles[pi];
            if p.dead {
                continue;
            }
            (p.pos, p.radius)
        };

        for entry in world.spatial.query_kind(pos, radius + pad, EntityKind::Hostile) {
            let projectile = &world.projectiles[pi];
            if projectile.dead {
                break;
            }
            if projectile.already_hit(entry.id) {
                continue;
            }
            let Some((hpos, hradius)) = live_hostile(world, entry.index, entry.id) else {
                continue;
            };
            if !circles_overlap(projectile.pos, projectile.radius, hpos, hradius) {
                continue;
            }

            let projectile = &mut world.projectiles[pi];
            projectile.register_hit(entry.id);
            let hit = Hit {
                amount: projectile.damage,
                dir: projectile.vel,
                kind: projectile.kind,
                knockback_mult: projectile.knockback_mult,
            };
            let stun = projectile.stun;
            let splash = projectile.splash_radius;

            if stun {
                world.hostiles[entry.index].stun_timer = STUN_DURATION;
            }
            take_damage(world, entry.index, hit);
            if splash > 0.0 {
                splash_damage(world, hpos, splash, hit.amount * SPLASH_FRACTION, hit.kind, entry.id);
            }
        }
    }
}

fn splash_damage(world: &mut World, center: Vec2, radius: f32, amount: f32, kind: DamageKind, skip: EntityId) {
    let pad = world.spatial.max_radius(EntityKind::Hostile);
    for entry in world.spatial.query_kind(center, radius + pad, EntityKind::Hostile) {
        if entry.id == skip {
            continue;
        }
        let Some((hpos, hradius)) = live_hostile(world, entry.index, entry.id) else {
            continue;
        };
        if !circles_overlap(center, radius, hpos, hradius) {
            continue;
        }
        let hit = Hit { amount, dir: hpos - center, kind, knockback_mult: 0.5 };
        take_damage(world, entry.index, hit);
    }
}

/// Hostiles inside their strike radius hurt the player (gated by invulnerability)
pub fn resolve_contacts(world: &mut World) {
    let player_pos = world.player.pos;
    let player_radius = world.player.radius;
    let pad = world.spatial.max_radius(EntityKind::Hostile);
    for entry in world.spatial.query_kind(player_pos, player_radius + pad, EntityKind::Hostile) {
        let Some(hostile) = world.hostiles.get(entry.index) else {
            continue;
        };
        if hostile.dead || hostile.id != entry.id {
            continue;
        }
        if hostile.pos.distance(player_pos) > hostile.strike_radius(player_radius) {
            continue;
        }
        let damage = hostile.damage;
        player_hit(world, damage, Some(entry.id));
    }
}

/// Attract pickups inside the player's pickup radius, collect the ones that arrived
pub fn resolve_pickups(world: &mut World) {
    let player_pos = world.player.pos;
    let attract_radius = world.player.stats.pickup_radius.max(0.0);
    let reach = attract_radius.max(COLLECT_RADIUS) + PICKUP_RADIUS;

    for entry in world.spatial.query_kind(player_pos, reach, EntityKind::Pickup) {
        let Some(pickup) = world.pickups.get_mut(entry.index) else {
            continue;
        };
        if pickup.dead || pickup.id != entry.id {
            continue;
        }

        if pickup.in_collect_range(player_pos) {
            let pos = pickup.pos;
            if let Some(payload) = pickup.collect() {
                apply_payload(world, payload);
                world.emit(GameEvent::PickupCollected { pos });
            }
        } else if pickup.pos.distance(player_pos) <= attract_radius {
            pickup.attract_to();
        }
    }
}

pub fn apply_payload(world: &mut World, payload: PickupPayload) {
    match payload {
        PickupPayload::Exp(amount) => {
            let levels = world.player.gain_exp(amount);
            if levels > 0 {
                let level = world.player.level;
                log::debug!("level up to {}", level);
                world.emit(GameEvent::LevelUp { level });
                world.queued_level_ups += levels;
                if world.phase == GamePhase::Playing {
                    skills::offer_queued_level_up(world);
                }
            }
        }
        PickupPayload::Gold(amount) => world.gold += amount,
        PickupPayload::Chest { gold } => {
            world.gold += gold;
            let heal = world.player.max_hp * CHEST_HEAL_FRACTION;
            world.player.heal(heal);
        }
        PickupPayload::Card(item) => {
            if !world.player.store_item(item) {
                world.gold += CARD_GOLD_VALUE;
            }
        }
        PickupPayload::PowerOrb(kind) => apply_power_orb(world, kind),
    }
}

pub fn apply_power_orb(world: &mut World, kind: PowerOrbKind) {
    match kind {
        PowerOrbKind::Damage => {
            world.grant_modifier(ModifierKind::DamageBoost, ORB_DAMAGE_MULT, ORB_BOOST_DURATION)
        }
        PowerOrbKind::Speed => {
            world.grant_modifier(ModifierKind::SpeedBoost, ORB_SPEED_MULT, ORB_BOOST_DURATION)
        }
        PowerOrbKind::Heal => {
            let heal = world.player.max_hp * ORB_HEAL_FRACTION;
            world.player.heal(heal);
        }
    }
}

/// Use the item in inventory `slot`. False when the slot is empty or invalid.
pub fn use_item(world: &mut World, slot: usize) -> bool {
    let Some(item) = world.player.take_item(slot) else {
        return false;
    };

    match item {
        ItemKind::Potion => {
            let heal = world.player.max_hp * POTION_HEAL_FRACTION;
            world.player.heal(heal);
        }
        ItemKind::Bomb => {
            let center = world.player.pos;
            let pad = world.spatial.max_radius(EntityKind::Hostile);
            for entry in world.spatial.query_kind(center, BOMB_RADIUS + pad, EntityKind::Hostile) {
                let Some((hpos, hradius)) = live_hostile(world, entry.index, entry.id) else {
                    continue;
                };
                if !circles_overlap(center, BOMB_RADIUS, hpos, hradius) {
                    continue;
                }
                take_damage(world, entry.index, Hit::new(BOMB_DAMAGE, hpos - center, DamageKind::Blast));
            }
            world.spawn_particles(center, 30, BLAST_COLOR);
            world.add_shake(6.0);
        }
        ItemKind::Aegis => world.grant_modifier(ModifierKind::Invincible, 1.0, AEGIS_DURATION),
        ItemKind::Fury => world.grant_modifier(ModifierKind::DamageBoost, FURY_MULT, FURY_DURATION),
    }

    log::debug!("used {:?} from slot {}", item, slot);
    world.emit(GameEvent::ItemUsed { item });
    true
}

/// Fire one volley of the player's projectiles along `dir`
pub fn spawn_volley(world: &mut World, dir: Vec2) {
    let Some(base) = dir.try_normalize() else {
        return;
    };
    let stats = world.player.stats.clone();
    let damage = stats.damage * world.player.damage_multiplier();
    let origin = world.player.pos + base * world.player.radius;
    let count = stats.projectile_count.max(1);
    let center = (count - 1) as f32 / 2.0;

    for i in 0..count {
        let dir = rotate(base, (i as f32 - center) * VOLLEY_SPREAD);
        let id = world.next_entity_id();
        world.projectiles.push(Projectile {
            id,
            pos: origin,
            vel: dir * stats.projectile_speed,
            life: stats.projectile_lifetime,
            radius: PROJECTILE_RADIUS,
            damage,
            kind: stats.element,
            pierce_left: stats.pierce,
            knockback_mult: stats.knockback_mult,
            stun: stats.on_hit_stun,
            splash_radius: stats.area_radius,
            hits: Vec::new(),
            dead: false,
        });
    }
}

/// Auto-target the nearest hostile in range and fire, queueing extra volleys.
///
/// Returns true when a volley was fired.
pub fn fire_at_nearest(world: &mut World) -> bool {
    let origin = world.player.pos;
    let range = world.player.stats.targeting_range;
    let Some(target) = world.spatial.nearest_to(origin, range, EntityKind::Hostile) else {
        return false;
    };
    let dir = target.pos - origin;
    if dir.try_normalize().is_none() {
        return false;
    }

    spawn_volley(world, dir);
    for k in 1..=world.player.stats.extra_volleys {
        world.schedule(VOLLEY_INTERVAL * k as f32, super::schedule::Deferred::Volley { dir });
    }
    true
}
