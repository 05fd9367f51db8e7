//! Per-frame simulation tick
//!
//! Core game loop shared by stage and arena mode. Data flows one way:
//! input -> spatial rebuild -> entity updates -> combat resolution ->
//! cleanup -> meta-state transitions. Rendering reads the result.

use glam::Vec2;

use super::arena;
use super::combat;
use super::entities::{HostileCtx, compact};
use super::schedule::{Deferred, Lane};
use super::skills;
use super::stage;
use super::state::{GameMode, GamePhase, World};
use crate::consts::*;
use crate::decay;

/// Screen shake falls off at this rate (per second)
const SHAKE_DECAY_RATE: f32 = 8.0;

/// Input polled once per frame
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Desired movement direction (clamped to unit length)
    pub move_dir: Vec2,
    pub dash: bool,
    /// Inventory slot to use this frame
    pub use_item: Option<usize>,
    /// Skill option picked during a skill choice
    pub skill_pick: Option<usize>,
}

/// Clamp a raw frame delta to something safe to integrate
pub fn clamp_frame_dt(raw_dt: f32) -> f32 {
    if raw_dt.is_nan() {
        return 0.0;
    }
    raw_dt.clamp(0.0, MAX_FRAME_DT)
}

/// Advance the world by one frame
pub fn tick(world: &mut World, input: &TickInput, raw_dt: f32) {
    if world.phase == GamePhase::Menu || world.phase.is_terminal() {
        return;
    }
    let dt = clamp_frame_dt(raw_dt);

    world.scheduler.advance(Lane::Session, dt);
    run_due(world, Lane::Session);
    if world.phase.is_terminal() {
        return;
    }

    world.screen_shake *= decay(SHAKE_DECAY_RATE, dt);
    if world.screen_shake < 0.01 {
        world.screen_shake = 0.0;
    }

    if world.phase == GamePhase::SkillChoice {
        if let Some(index) = input.skill_pick {
            if let Err(err) = skills::choose(world, index) {
                log::debug!("skill pick rejected: {}", err);
            }
        }
        return;
    }

    // Boss countdown freezes everything but the scheduler
    if world.arena.showing_boss_intro {
        return;
    }

    // Hit-stop
    let sim_dt = if world.freeze_timer > 0.0 {
        world.freeze_timer = (world.freeze_timer - dt).max(0.0);
        0.0
    } else {
        dt
    };
    world.play_time += dt;
    // Game-lane timers (buffs, follow-up volleys) only run while play is live
    world.scheduler.advance(Lane::Game, dt);
    run_due(world, Lane::Game);

    world.spatial.rebuild(&world.hostiles, &world.projectiles, &world.pickups);
    update_player(world, input, sim_dt);
    update_entities(world, sim_dt);

    world.spatial.rebuild(&world.hostiles, &world.projectiles, &world.pickups);
    combat::resolve_projectile_hits(world);
    combat::resolve_contacts(world);
    combat::resolve_pickups(world);

    cleanup(world);
    enforce_caps(world);

    if world.phase == GamePhase::Playing {
        match world.mode {
            GameMode::Stage => stage::update(world, sim_dt),
            GameMode::Arena => arena::update(world, sim_dt),
        }
    }

    if world.player.hp <= 0.0 {
        world.finish(false);
    }
}

fn run_due(world: &mut World, lane: Lane) {
    while let Some(action) = world.scheduler.pop_due(lane, world.epoch) {
        run_deferred(world, action);
    }
}

fn run_deferred(world: &mut World, action: Deferred) {
    match action {
        Deferred::Volley { dir } => combat::spawn_volley(world, dir),
        Deferred::SpawnWave { wave } => arena::spawn_wave(world, wave),
        Deferred::BossCountdown { wave, step } => arena::boss_countdown(world, wave, step),
        Deferred::BossArrival { wave } => arena::boss_arrival(world, wave),
        Deferred::ResumePlay { reason } => skills::resume(world, reason),
        Deferred::ExpireModifier { token } => {
            world.player.modifiers.remove(token);
        }
        Deferred::Victory => world.finish(true),
    }
}

fn update_player(world: &mut World, input: &TickInput, dt: f32) {
    if input.dash && world.player.try_dash(input.move_dir) {
        log::trace!("dash");
    }
    if let Some(slot) = input.use_item {
        combat::use_item(world, slot);
    }

    world.player.update(dt, input.move_dir, world.arena_radius);
    world.player.tick_timers(dt);

    if world.player.attack_timer <= 0.0 && combat::fire_at_nearest(world) {
        world.player.attack_timer = world.player.stats.attack_cooldown;
    }
}

fn update_entities(world: &mut World, dt: f32) {
    let ctx = HostileCtx {
        player_pos: world.player.pos,
        player_radius: world.player.radius,
    };
    for hostile in world.hostiles.iter_mut().filter(|h| !h.dead) {
        hostile.update(dt, &ctx);
    }
    for projectile in &mut world.projectiles {
        projectile.update(dt);
    }
    for pickup in &mut world.pickups {
        pickup.update(dt, ctx.player_pos);
    }
    for particle in &mut world.particles {
        particle.update(dt);
    }
    for text in &mut world.texts {
        text.update(dt);
    }
}

/// Tombstone out-of-bounds entities (no loot) and compact every list
fn cleanup(world: &mut World) {
    let arena_radius = world.arena_radius;
    for hostile in &mut world.hostiles {
        if !hostile.dead && hostile.is_out_of_bounds(arena_radius) {
            log::trace!("culling {:?} at {:?}", hostile.id, hostile.pos);
            hostile.dead = true;
        }
    }
    for projectile in &mut world.projectiles {
        if projectile.is_out_of_bounds(arena_radius) {
            projectile.dead = true;
        }
    }

    compact(&mut world.hostiles);
    compact(&mut world.projectiles);
    compact(&mut world.pickups);
    compact(&mut world.particles);
    compact(&mut world.texts);
}

fn trim_oldest<T>(list: &mut Vec<T>, cap: usize) {
    if list.len() > cap {
        let excess = list.len() - cap;
        list.drain(..excess);
    }
}

fn enforce_caps(world: &mut World) {
    let max_particles = world.settings.max_particles();
    trim_oldest(&mut world.particles, max_particles);
    trim_oldest(&mut world.projectiles, MAX_PROJECTILES);
    trim_oldest(&mut world.texts, MAX_TEXTS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GameData, MobKind};
    use crate::settings::Settings;
    use crate::sim::events::GameEvent;
    use crate::sim::modifiers::ModifierKind;

    fn world(mode: GameMode) -> World {
        let mut world = World::new(Settings::default(), GameData::builtin().unwrap()).unwrap();
        world.start_session(mode, Some("knight")).unwrap();
        world
    }

    fn run(world: &mut World, input: &TickInput, seconds: f32) {
        let frames = (seconds / SIM_DT).round() as usize;
        for _ in 0..frames {
            tick(world, input, SIM_DT);
        }
    }

    #[test]
    fn test_clamp_frame_dt() {
        assert_eq!(clamp_frame_dt(5.0), MAX_FRAME_DT);
        assert_eq!(clamp_frame_dt(-1.0), 0.0);
        assert_eq!(clamp_frame_dt(f32::NAN), 0.0);
        assert_eq!(clamp_frame_dt(f32::INFINITY), MAX_FRAME_DT);
        assert_eq!(clamp_frame_dt(SIM_DT), SIM_DT);
    }

    #[test]
    fn test_tick_menu_does_nothing() {
        let mut world = World::new(Settings::default(), GameData::builtin().unwrap()).unwrap();
        tick(&mut world, &TickInput::default(), SIM_DT);
        assert_eq!(world.play_time, 0.0);
        assert_eq!(world.scheduler.now(), 0.0);
    }

    #[test]
    fn test_tick_long_frame_is_clamped() {
        let mut world = world(GameMode::Stage);
        tick(&mut world, &TickInput::default(), 5.0);
        assert!((world.play_time - MAX_FRAME_DT).abs() < 1e-6);
        assert!((world.scheduler.now() - MAX_FRAME_DT as f64).abs() < 1e-6);
    }

    #[test]
    fn test_tick_moves_player() {
        let mut world = world(GameMode::Stage);
        let input = TickInput { move_dir: Vec2::X, ..Default::default() };
        tick(&mut world, &input, 0.1);
        assert!((world.player.pos.x - world.player.stats.move_speed * 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_wave_completion_raises_one_choice() {
        let mut world = world(GameMode::Arena);
        run(&mut world, &TickInput::default(), WAVE_START_DELAY + 0.1);
        assert_eq!(world.hostiles.len(), 8);

        for index in 0..world.hostiles.len() {
            combat::take_damage(&mut world, index, combat::Hit::new(1.0e6, Vec2::X, crate::sim::DamageKind::Sword));
        }
        run(&mut world, &TickInput::default(), 0.5);

        let offers = world
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::SkillChoicesOffered { .. }))
            .count();
        assert_eq!(offers, 1);
        assert_eq!(world.phase, GamePhase::SkillChoice);

        // Pick, wait for resume, and the next wave begins
        let pick = TickInput { skill_pick: Some(0), ..Default::default() };
        tick(&mut world, &pick, SIM_DT);
        run(&mut world, &TickInput::default(), SKILL_RESUME_DELAY + 0.1);
        assert_eq!(world.phase, GamePhase::Playing);
        assert_eq!(world.arena.wave, 2);
    }

    #[test]
    fn test_stale_continuations_are_dropped() {
        let mut world = world(GameMode::Arena);
        run(&mut world, &TickInput::default(), 0.5);
        world.start_session(GameMode::Arena, Some("knight")).unwrap();

        // The first session's spawn comes due here and must be discarded
        run(&mut world, &TickInput::default(), 0.6);
        assert!(world.hostiles.is_empty());

        run(&mut world, &TickInput::default(), 0.5);
        assert_eq!(world.hostiles.len(), 8);
    }

    #[test]
    fn test_boss_intro_freezes_simulation() {
        let mut world = world(GameMode::Arena);
        let last = world.data.wave_count();
        arena::begin_wave(&mut world, last);

        let input = TickInput { move_dir: Vec2::X, ..Default::default() };
        run(&mut world, &input, 1.0);
        assert!(world.arena.showing_boss_intro);
        assert_eq!(world.player.pos, Vec2::ZERO);
        assert_eq!(world.play_time, 0.0);

        run(&mut world, &input, BOSS_COUNTDOWN_STEP * 4.0);
        assert!(!world.arena.showing_boss_intro);
        assert!(world.arena.boss.is_some());
        assert!(world.player.pos.x > 0.0);
        let countdown = world
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::BossCountdown { .. }))
            .count();
        assert_eq!(countdown, 4);
    }

    #[test]
    fn test_hit_stop_freezes_physics() {
        let mut world = world(GameMode::Stage);
        world.spawn_hostile(MobKind::Slime, Vec2::new(300.0, 0.0)).unwrap();
        world.freeze_timer = 0.1;
        tick(&mut world, &TickInput { move_dir: Vec2::Y, ..Default::default() }, 0.05);
        assert_eq!(world.hostiles[0].pos, Vec2::new(300.0, 0.0));
        assert_eq!(world.player.pos, Vec2::ZERO);
        assert!((world.freeze_timer - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_boost_expires_through_scheduler() {
        let mut world = world(GameMode::Stage);
        world.grant_modifier(ModifierKind::DamageBoost, 2.0, 0.5);
        world.grant_modifier(ModifierKind::DamageBoost, 1.5, 1.0);
        assert!((world.player.damage_multiplier() - 3.0).abs() < 1e-5);
        run(&mut world, &TickInput::default(), 0.6);
        assert!((world.player.damage_multiplier() - 1.5).abs() < 1e-5);
        run(&mut world, &TickInput::default(), 0.5);
        assert_eq!(world.player.damage_multiplier(), 1.0);
    }

    #[test]
    fn test_boost_holds_during_skill_choice() {
        let mut world = world(GameMode::Stage);
        world.grant_modifier(ModifierKind::DamageBoost, 2.0, 1.0);
        assert!(skills::offer(&mut world, skills::ChoiceReason::LevelUp));

        run(&mut world, &TickInput::default(), 2.0);
        assert_eq!(world.phase, GamePhase::SkillChoice);
        assert_eq!(world.play_time, 0.0);
        assert!((world.player.damage_multiplier() - 2.0).abs() < 1e-5);

        let pick = TickInput { skill_pick: Some(0), ..Default::default() };
        tick(&mut world, &pick, SIM_DT);
        run(&mut world, &TickInput::default(), SKILL_RESUME_DELAY + 1.2);
        assert_eq!(world.phase, GamePhase::Playing);
        assert_eq!(world.player.damage_multiplier(), 1.0);
    }

    #[test]
    fn test_invincibility_holds_during_boss_intro() {
        let mut world = world(GameMode::Arena);
        world.grant_modifier(ModifierKind::Invincible, 1.0, 2.0);
        let last = world.data.wave_count();
        arena::begin_wave(&mut world, last);

        run(&mut world, &TickInput::default(), 2.5);
        assert!(world.arena.showing_boss_intro);
        assert_eq!(world.play_time, 0.0);
        assert!(world.player.modifiers.has(ModifierKind::Invincible));

        // Intro ends at 3.2s; the buff still has its full 2s of play left
        run(&mut world, &TickInput::default(), 1.0);
        assert!(!world.arena.showing_boss_intro);
        assert!(world.player.modifiers.has(ModifierKind::Invincible));

        run(&mut world, &TickInput::default(), 2.0);
        assert!(!world.player.modifiers.has(ModifierKind::Invincible));
    }

    #[test]
    fn test_follow_up_volley_waits_out_skill_choice() {
        let mut world = world(GameMode::Stage);
        world.schedule(0.1, Deferred::Volley { dir: Vec2::X });
        assert!(skills::offer(&mut world, skills::ChoiceReason::LevelUp));

        run(&mut world, &TickInput::default(), 1.0);
        assert!(world.projectiles.is_empty());

        let pick = TickInput { skill_pick: Some(0), ..Default::default() };
        tick(&mut world, &pick, SIM_DT);
        run(&mut world, &TickInput::default(), SKILL_RESUME_DELAY + 0.3);
        assert_eq!(world.phase, GamePhase::Playing);
        assert_eq!(world.projectiles.len() as u32, world.player.stats.projectile_count);
    }

    #[test]
    fn test_player_death_is_terminal() {
        let mut world = world(GameMode::Stage);
        world.player.hp = 5.0;
        combat::player_hit(&mut world, 50.0, None);
        tick(&mut world, &TickInput::default(), SIM_DT);
        assert_eq!(world.phase, GamePhase::Defeat);

        let time = world.play_time;
        tick(&mut world, &TickInput::default(), SIM_DT);
        assert_eq!(world.play_time, time);
    }

    #[test]
    fn test_out_of_bounds_hostiles_are_culled_without_loot() {
        let mut world = world(GameMode::Stage);
        let far = world.arena_radius * (OUT_OF_BOUNDS_FACTOR + 0.5);
        world.spawn_hostile(MobKind::Slime, Vec2::new(far, 0.0)).unwrap();
        tick(&mut world, &TickInput::default(), SIM_DT);
        assert!(world.hostiles.is_empty());
        assert!(world.pickups.is_empty());
        assert_eq!(world.kills, 0);
    }

    #[test]
    fn test_particle_cap_keeps_newest() {
        let mut world = world(GameMode::Stage);
        let cap = world.settings.max_particles();
        world.spawn_particles(Vec2::ZERO, cap + 50, [1.0; 4]);
        tick(&mut world, &TickInput::default(), SIM_DT);
        assert!(world.particles.len() <= cap);
    }

    #[test]
    fn test_auto_attack_kills_nearby_hostile() {
        let mut world = world(GameMode::Stage);
        world.spawn_hostile(MobKind::Bat, Vec2::new(150.0, 0.0)).unwrap();
        run(&mut world, &TickInput::default(), 2.0);
        assert!(world.kills >= 1);
    }

    #[test]
    fn test_determinism() {
        // Two worlds with the same seed and inputs stay identical
        let mut a = world(GameMode::Stage);
        let mut b = world(GameMode::Stage);
        let inputs = [
            TickInput { move_dir: Vec2::new(0.5, 0.2), ..Default::default() },
            TickInput { dash: true, move_dir: Vec2::Y, ..Default::default() },
            TickInput::default(),
        ];
        for frame in 0..600 {
            let input = &inputs[frame % inputs.len()];
            tick(&mut a, input, SIM_DT);
            tick(&mut b, input, SIM_DT);
        }
        assert_eq!(a.kills, b.kills);
        assert_eq!(a.hostiles.len(), b.hostiles.len());
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.player.hp, b.player.hp);
    }
}
