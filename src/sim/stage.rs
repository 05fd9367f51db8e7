//! Stage mode: endless timer-driven spawning
//!
//! The stage index rises every `stage_length` seconds. Each stage shortens
//! the spawn interval, grows the batch size and widens the mob pool. An
//! elite joins on its own timer. The live hostile count is capped.

use rand::Rng;

use super::events::GameEvent;
use super::state::World;
use crate::consts::*;
use crate::data::{MobKind, StageDef};

#[derive(Debug, Clone, Default)]
pub struct StageState {
    /// 1-based stage index
    pub stage: u32,
    pub elapsed: f32,
    pub spawn_timer: f32,
    pub elite_timer: f32,
}

pub fn begin(world: &mut World) {
    world.stage = StageState {
        stage: 1,
        elapsed: 0.0,
        spawn_timer: WAVE_START_DELAY,
        elite_timer: 0.0,
    };
    world.emit(GameEvent::StageAdvanced { stage: 1 });
}

/// Seconds between spawn batches at `stage`
pub fn spawn_interval(def: &StageDef, stage: u32) -> f32 {
    let steps = stage.saturating_sub(1) as f32;
    (def.spawn_interval - def.spawn_interval_step * steps).max(def.min_spawn_interval)
}

pub fn batch_size(def: &StageDef, stage: u32) -> u32 {
    def.batch_base + def.batch_growth * stage.saturating_sub(1)
}

fn pool_for(def: &StageDef, stage: u32) -> Vec<MobKind> {
    let index = stage.saturating_sub(1) as usize;
    def.pools
        .get(index)
        .or_else(|| def.pools.last())
        .cloned()
        .unwrap_or_default()
}

fn random_kind(world: &mut World, pool: &[MobKind]) -> Option<MobKind> {
    if pool.is_empty() {
        return None;
    }
    Some(pool[world.rng.random_range(0..pool.len())])
}

pub fn update(world: &mut World, dt: f32) {
    world.stage.elapsed += dt;
    let stage_length = world.data.stage.stage_length.max(1.0);
    let stage = 1 + (world.stage.elapsed / stage_length) as u32;
    if stage > world.stage.stage {
        world.stage.stage = stage;
        log::info!("stage {} reached", stage);
        world.emit(GameEvent::StageAdvanced { stage });
    }

    world.stage.spawn_timer -= dt;
    if world.stage.spawn_timer <= 0.0 {
        world.stage.spawn_timer = spawn_interval(&world.data.stage, stage);
        spawn_batch(world, stage);
    }

    world.stage.elite_timer += dt;
    if world.stage.elite_timer >= world.data.stage.elite_interval {
        world.stage.elite_timer = 0.0;
        spawn_elite(world, stage);
    }
}

fn room(world: &World) -> usize {
    world.data.stage.max_hostiles.saturating_sub(world.hostiles.len())
}

fn spawn_batch(world: &mut World, stage: u32) {
    let free = room(world);
    if free == 0 {
        log::trace!("hostile cap reached, skipping batch");
        return;
    }
    let count = (batch_size(&world.data.stage, stage) as usize).min(free);
    let pool = pool_for(&world.data.stage, stage);
    for _ in 0..count {
        let Some(kind) = random_kind(world, &pool) else {
            return;
        };
        let pos = world.random_ring_point();
        world.spawn_hostile(kind, pos);
    }
}

fn spawn_elite(world: &mut World, stage: u32) {
    if room(world) == 0 {
        return;
    }
    let pool = pool_for(&world.data.stage, stage);
    if let Some(kind) = random_kind(world, &pool) {
        let pos = world.random_ring_point();
        world.spawn_elite(kind, pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GameData;
    use crate::settings::Settings;
    use crate::sim::state::GameMode;

    fn stage_world() -> World {
        let mut world = World::new(Settings::default(), GameData::builtin().unwrap()).unwrap();
        world.start_session(GameMode::Stage, None).unwrap();
        world
    }

    #[test]
    fn test_spawn_interval_ramps_to_minimum() {
        let data = GameData::builtin().unwrap();
        let def = &data.stage;
        assert_eq!(spawn_interval(def, 1), def.spawn_interval);
        assert!(spawn_interval(def, 3) < spawn_interval(def, 2));
        assert_eq!(spawn_interval(def, 100), def.min_spawn_interval);
        assert_eq!(batch_size(def, 3), def.batch_base + 2 * def.batch_growth);
    }

    #[test]
    fn test_pool_repeats_last_entry() {
        let data = GameData::builtin().unwrap();
        let last = data.stage.pools.last().unwrap().clone();
        assert_eq!(pool_for(&data.stage, 50), last);
        assert_eq!(pool_for(&data.stage, 1), data.stage.pools[0]);
    }

    #[test]
    fn test_first_batch_after_start_delay() {
        let mut world = stage_world();
        update(&mut world, WAVE_START_DELAY - 0.1);
        assert!(world.hostiles.is_empty());
        update(&mut world, 0.2);
        assert_eq!(world.hostiles.len() as u32, world.data.stage.batch_base);
    }

    #[test]
    fn test_stage_advances_with_time() {
        let mut world = stage_world();
        let length = world.data.stage.stage_length;
        update(&mut world, length + 0.5);
        assert_eq!(world.stage.stage, 2);
        assert!(world
            .events()
            .iter()
            .any(|e| matches!(e, GameEvent::StageAdvanced { stage: 2 })));
    }

    #[test]
    fn test_hostile_cap_respected() {
        let mut world = stage_world();
        world.data.stage.max_hostiles = 3;
        for _ in 0..20 {
            world.stage.spawn_timer = 0.0;
            update(&mut world, 0.01);
        }
        assert_eq!(world.hostiles.len(), 3);
    }

    #[test]
    fn test_elite_on_timer() {
        let mut world = stage_world();
        world.stage.elite_timer = world.data.stage.elite_interval - 0.05;
        world.stage.spawn_timer = 100.0;
        update(&mut world, 0.1);
        assert_eq!(world.hostiles.len(), 1);
        assert!(world.hostiles[0].is_elite);
        assert_eq!(world.stage.elite_timer, 0.0);
    }
}
