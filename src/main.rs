//! Horde Arena headless driver
//!
//! Runs one scripted session at a fixed 60 Hz step with a simple autopilot,
//! logs the event stream and prints the run result as JSON.
//!
//! Usage: `horde-arena [stage|arena] [--role ID] [--settings PATH] [--data PATH] [--seconds N]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::error::Error;

    use glam::Vec2;
    use horde_arena::consts::*;
    use horde_arena::renderer::{NoAssets, build_draw_list};
    use horde_arena::sim::{GameEvent, GameMode, GamePhase, TickInput, World, tick};
    use horde_arena::{GameData, Settings};

    /// Distance at which the autopilot starts backing off
    const KITE_RANGE: f32 = 220.0;
    /// Distance at which it dashes away
    const PANIC_RANGE: f32 = 70.0;

    struct Args {
        mode: GameMode,
        role: Option<String>,
        settings: Option<String>,
        data: Option<String>,
        seconds: f32,
    }

    fn parse_args() -> Result<Args, Box<dyn Error>> {
        let mut args = Args {
            mode: GameMode::Arena,
            role: None,
            settings: None,
            data: None,
            seconds: 600.0,
        };
        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "stage" => args.mode = GameMode::Stage,
                "arena" => args.mode = GameMode::Arena,
                "--role" => args.role = iter.next(),
                "--settings" => args.settings = iter.next(),
                "--data" => args.data = iter.next(),
                "--seconds" => {
                    let value = iter.next().ok_or("--seconds needs a value")?;
                    args.seconds = value.parse()?;
                }
                other => return Err(format!("unknown argument '{}'", other).into()),
            }
        }
        Ok(args)
    }

    /// Back away from the closest hostile, drift home when near the wall
    fn autopilot(world: &World) -> TickInput {
        let player = &world.player;
        let mut input = TickInput {
            skill_pick: Some(0),
            ..Default::default()
        };

        let nearest = world
            .hostiles
            .iter()
            .filter(|h| !h.dead)
            .map(|h| (h.pos.distance(player.pos), h.pos))
            .min_by(|a, b| a.0.total_cmp(&b.0));

        let mut dir = Vec2::ZERO;
        if let Some((dist, pos)) = nearest {
            if dist < KITE_RANGE {
                dir = (player.pos - pos).normalize_or_zero();
                input.dash = dist < PANIC_RANGE;
            }
        }
        if player.pos.length() > world.arena_radius * 0.7 {
            dir = (dir - player.pos.normalize_or_zero()).normalize_or_zero();
        }
        input.move_dir = dir;

        if player.hp_ratio() < 0.4 {
            input.use_item = player.inventory.iter().position(Option::is_some);
        }
        input
    }

    fn log_event(event: &GameEvent) {
        match event {
            GameEvent::WaveStarted { .. }
            | GameEvent::WaveCleared { .. }
            | GameEvent::BossSpawned { .. }
            | GameEvent::BossDefeated { .. }
            | GameEvent::LevelUp { .. }
            | GameEvent::SkillChosen { .. }
            | GameEvent::StageAdvanced { .. }
            | GameEvent::Victory { .. }
            | GameEvent::Defeat { .. } => log::info!("{:?}", event),
            _ => log::debug!("{:?}", event),
        }
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        let args = parse_args()?;
        let settings = match &args.settings {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        let data = match &args.data {
            Some(path) => GameData::from_json(&std::fs::read_to_string(path)?)?,
            None => GameData::builtin()?,
        };

        let mut world = World::new(settings, data)?;
        world.start_session(args.mode, args.role.as_deref())?;

        let frames = (args.seconds / SIM_DT) as u64;
        let mut fallbacks = 0;
        for frame in 0..frames {
            let input = autopilot(&world);
            tick(&mut world, &input, SIM_DT);
            for event in world.drain_events() {
                log_event(&event);
            }
            if frame % 60 == 0 {
                fallbacks = build_draw_list(&world, &NoAssets).fallbacks;
            }
            if world.phase.is_terminal() {
                break;
            }
        }
        log::debug!("last draw list had {} procedural entities", fallbacks);

        let result = match world.phase {
            GamePhase::Victory | GamePhase::Defeat => world.result.clone(),
            _ => None,
        }
        .unwrap_or_else(|| world.run_result(false));
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Horde Arena (headless) starting...");
    if let Err(err) = native::run() {
        log::error!("{}", err);
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The host embeds the library directly on wasm
}
