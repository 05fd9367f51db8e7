use glam::Vec2;
use horde_arena::consts::SIM_DT;
use horde_arena::renderer::{NoAssets, build_draw_list};
use horde_arena::sim::{GameEvent, GameMode, GamePhase, TickInput, World, tick};
use horde_arena::{GameData, Settings};

fn new_world(mode: GameMode) -> World {
    let mut world = World::new(Settings::default(), GameData::builtin().unwrap()).unwrap();
    world.start_session(mode, Some("knight")).unwrap();
    world
}

/// Make the player strong enough that every run ends in a clear
fn make_unbeatable(world: &mut World) {
    let player = &mut world.player;
    player.stats.damage = 1.0e5;
    player.stats.targeting_range = 600.0;
    player.stats.projectile_lifetime = 4.0;
    player.max_hp = 1.0e9;
    player.hp = 1.0e9;
}

/// Tick until the run ends or `max_frames` pass, collecting every event
fn run_to_end(world: &mut World, input: &TickInput, max_frames: usize) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..max_frames {
        tick(world, input, SIM_DT);
        events.extend(world.drain_events());
        if world.phase.is_terminal() {
            break;
        }
    }
    events
}

#[test]
fn test_full_arena_run_reaches_victory() {
    let mut world = new_world(GameMode::Arena);
    make_unbeatable(&mut world);
    let waves = world.data.wave_count();

    let input = TickInput { skill_pick: Some(0), ..Default::default() };
    let events = run_to_end(&mut world, &input, 60 * 60 * 10);

    assert_eq!(world.phase, GamePhase::Victory);
    for wave in 1..=waves {
        assert!(
            events.iter().any(|e| matches!(e, GameEvent::WaveStarted { wave: w, .. } if *w == wave)),
            "wave {} never started",
            wave
        );
    }
    let count = |f: fn(&GameEvent) -> bool| events.iter().filter(|e| f(e)).count();
    assert_eq!(count(|e| matches!(e, GameEvent::BossSpawned { .. })), 1);
    assert_eq!(count(|e| matches!(e, GameEvent::BossDefeated { .. })), 1);
    assert_eq!(count(|e| matches!(e, GameEvent::Victory { .. })), 1);
    // One choice per cleared wave except the last, plus any level-ups
    assert!(count(|e| matches!(e, GameEvent::SkillChosen { .. })) >= waves as usize - 1);

    let result = world.result.clone().unwrap();
    assert!(result.victory);
    assert!((1..=3).contains(&result.stars));
    assert_eq!(result.wave, waves);
    assert!(result.kills >= 8);
}

#[test]
fn test_helpless_player_is_defeated() {
    let mut world = new_world(GameMode::Stage);
    world.player.stats.damage = 0.0;
    world.player.hp = 1.0;

    let events = run_to_end(&mut world, &TickInput::default(), 60 * 60 * 2);
    assert_eq!(world.phase, GamePhase::Defeat);
    assert!(events.iter().any(|e| matches!(e, GameEvent::Defeat { .. })));
    let result = world.result.clone().unwrap();
    assert!(!result.victory);
    assert_eq!(result.stars, 0);

    // Terminal: further ticks change nothing
    let time = world.play_time;
    tick(&mut world, &TickInput { move_dir: Vec2::X, ..Default::default() }, SIM_DT);
    assert_eq!(world.play_time, time);
}

#[test]
fn test_same_seed_same_run() {
    let mut a = new_world(GameMode::Arena);
    let mut b = new_world(GameMode::Arena);
    let input = TickInput {
        move_dir: Vec2::new(0.3, -0.8),
        skill_pick: Some(1),
        ..Default::default()
    };
    let events_a = run_to_end(&mut a, &input, 1800);
    let events_b = run_to_end(&mut b, &input, 1800);
    assert_eq!(events_a, events_b);
    assert_eq!(a.player.pos, b.player.pos);
    assert_eq!(a.hostiles.len(), b.hostiles.len());
}

#[test]
fn test_draw_list_reads_a_live_world() {
    let mut world = new_world(GameMode::Stage);
    // Hold fire so the first batch is still alive
    world.player.stats.targeting_range = 0.0;
    run_to_end(&mut world, &TickInput::default(), 240);
    let hostiles = world.hostiles.len();
    assert!(hostiles > 0);

    let list = build_draw_list(&world, &NoAssets);
    assert!(list.sprites.is_empty());
    assert!(list.fallbacks >= hostiles + 1);
    assert_eq!(world.hostiles.len(), hostiles);
}
