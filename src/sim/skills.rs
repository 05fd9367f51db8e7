//! Skill-choice interstitials
//!
//! After a wave clear or a level-up the player is offered a few skills
//! sampled without replacement from the common pool plus the role's own.
//! Exactly one is applied, then play resumes after a short delay.

use thiserror::Error;

use super::arena;
use super::entities::Player;
use super::events::GameEvent;
use super::schedule::Deferred;
use super::state::{GamePhase, World};
use crate::consts::*;
use crate::data::SkillEffect;

/// Why the interstitial was raised (and where play goes afterwards)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceReason {
    LevelUp,
    WaveCleared { next_wave: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingChoice {
    pub options: Vec<String>,
    pub reason: ChoiceReason,
    /// Set once a skill was picked; play resumes shortly after
    pub resolved: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum SkillChoiceError {
    #[error("no skill choice is pending")]
    NotPending,
    #[error("choice {index} is out of range (0..{len})")]
    OutOfRange { index: usize, len: usize },
    #[error("unknown skill '{0}'")]
    UnknownSkill(String),
}

/// Raise a skill choice. Returns false when there is nothing to offer.
pub fn offer(world: &mut World, reason: ChoiceReason) -> bool {
    let pool: Vec<String> = world
        .data
        .skill_pool(&world.role)
        .into_iter()
        .map(String::from)
        .collect();
    if pool.is_empty() {
        log::debug!("skill pool for {} is empty, skipping choice", world.role);
        return false;
    }

    let count = SKILL_CHOICE_COUNT.min(pool.len());
    let options: Vec<String> = rand::seq::index::sample(&mut world.rng, pool.len(), count)
        .iter()
        .map(|i| pool[i].clone())
        .collect();

    log::debug!("offering skills {:?} ({:?})", options, reason);
    world.pending_choice = Some(PendingChoice { options: options.clone(), reason, resolved: false });
    world.phase = GamePhase::SkillChoice;
    world.emit(GameEvent::SkillChoicesOffered { options });
    true
}

/// Offer the next queued level-up choice, if any
pub fn offer_queued_level_up(world: &mut World) -> bool {
    if world.queued_level_ups == 0 {
        return false;
    }
    world.queued_level_ups -= 1;
    if offer(world, ChoiceReason::LevelUp) {
        true
    } else {
        world.queued_level_ups = 0;
        false
    }
}

/// Pick option `index` of the pending choice
pub fn choose(world: &mut World, index: usize) -> Result<String, SkillChoiceError> {
    if world.phase != GamePhase::SkillChoice {
        return Err(SkillChoiceError::NotPending);
    }
    let pending = world
        .pending_choice
        .as_mut()
        .filter(|p| !p.resolved)
        .ok_or(SkillChoiceError::NotPending)?;
    let len = pending.options.len();
    let id = pending
        .options
        .get(index)
        .cloned()
        .ok_or(SkillChoiceError::OutOfRange { index, len })?;
    let effect = world
        .data
        .skill(&id)
        .map(|s| s.effect.clone())
        .ok_or_else(|| SkillChoiceError::UnknownSkill(id.clone()))?;
    pending.resolved = true;
    let reason = pending.reason;

    apply_effect(&mut world.player, &effect);
    log::debug!("skill {} chosen", id);
    world.emit(GameEvent::SkillChosen { id: id.clone() });
    world.schedule(SKILL_RESUME_DELAY, Deferred::ResumePlay { reason });
    Ok(id)
}

/// Leave the interstitial (scheduled by [`choose`])
pub fn resume(world: &mut World, reason: ChoiceReason) {
    if world.phase != GamePhase::SkillChoice {
        log::debug!("resume ignored in {:?}", world.phase);
        return;
    }
    world.pending_choice = None;
    world.phase = GamePhase::Playing;

    // A queued level-up inherits the reason so a pending wave still starts after it
    if world.queued_level_ups > 0 {
        world.queued_level_ups -= 1;
        if offer(world, reason) {
            return;
        }
        world.queued_level_ups = 0;
    }
    if let ChoiceReason::WaveCleared { next_wave } = reason {
        arena::begin_wave(world, next_wave);
    }
}

pub fn apply_effect(player: &mut Player, effect: &SkillEffect) {
    let stats = &mut player.stats;
    match *effect {
        SkillEffect::DamageMult { value } => stats.damage *= value,
        SkillEffect::CooldownMult { value } => {
            stats.attack_cooldown = (stats.attack_cooldown * value).max(0.05)
        }
        SkillEffect::ProjectileCount { value } => stats.projectile_count += value,
        SkillEffect::Pierce { value } => stats.pierce += value,
        SkillEffect::AreaRadius { value } => stats.area_radius += value,
        SkillEffect::TargetingRange { value } => stats.targeting_range += value,
        SkillEffect::ProjectileSpeedMult { value } => stats.projectile_speed *= value,
        SkillEffect::MaxHp { value } => {
            stats.max_hp += value;
            player.max_hp += value;
            player.hp += value;
        }
        SkillEffect::KnockbackMult { value } => stats.knockback_mult *= value,
        SkillEffect::OnHitStun => stats.on_hit_stun = true,
        SkillEffect::DamageReduction { value } => {
            stats.damage_reduction = (stats.damage_reduction + value).min(MAX_DAMAGE_REDUCTION)
        }
        SkillEffect::DamageReflect { value } => stats.damage_reflect += value,
        SkillEffect::MoveSpeedMult { value } => stats.move_speed *= value,
        SkillEffect::Element { kind } => stats.element = kind,
        SkillEffect::ExtraVolley { value } => stats.extra_volleys += value,
        SkillEffect::PickupRadius { value } => stats.pickup_radius += value,
    }
}
