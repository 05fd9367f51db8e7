//! Uniform-grid spatial index
//!
//! Rebuilt from scratch every frame from the live hostile, projectile and
//! pickup lists. Cells are keyed by `floor(x / cell), floor(y / cell)` so the
//! world needs no fixed bounds.
//!
//! Entries are weak: they carry the list index of the entity they were built
//! from, which is only meaningful until the next compaction.
//!
//! # Performance
//!
//! - **Rebuild:** O(n), cell vectors are reused between frames
//! - **Query:** O(k) where k = entries in the cells overlapping the query box

use glam::Vec2;
use rustc_hash::FxHashMap;

use super::entities::{Collider, EntityId, Hostile, Pickup, Projectile};

/// Which list a spatial entry points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Hostile,
    Projectile,
    Pickup,
}

impl EntityKind {
    const COUNT: usize = 3;

    fn slot(self) -> usize {
        match self {
            EntityKind::Hostile => 0,
            EntityKind::Projectile => 1,
            EntityKind::Pickup => 2,
        }
    }
}

/// A weak reference to an entity, valid until the next compaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub kind: EntityKind,
    /// Index into the list named by `kind`
    pub index: usize,
    pub id: EntityId,
    /// Position at rebuild time
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    cells: FxHashMap<(i32, i32), Vec<SpatialEntry>>,
    /// Largest entity radius per kind, so callers can pad overlap queries
    max_radius: [f32; EntityKind::COUNT],
    len: usize,
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size >= 1.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: FxHashMap::default(),
            max_radius: [0.0; EntityKind::COUNT],
            len: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Largest radius among entries of `kind` inserted since the last clear
    pub fn max_radius(&self, kind: EntityKind) -> f32 {
        self.max_radius[kind.slot()]
    }

    /// Drop all entries, keeping cell allocations for reuse
    pub fn clear(&mut self) {
        // Cells that stayed empty for a whole frame are released so the map
        // doesn't accumulate keys along every path entities ever took.
        self.cells.retain(|_, cell| !cell.is_empty());
        for cell in self.cells.values_mut() {
            cell.clear();
        }
        self.max_radius = [0.0; EntityKind::COUNT];
        self.len = 0;
    }

    fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Insert a single entry; non-finite positions are ignored
    pub fn insert(&mut self, entry: SpatialEntry) {
        if !entry.pos.is_finite() {
            log::trace!("spatial: skipping non-finite {:?} {:?}", entry.kind, entry.id);
            return;
        }
        let slot = entry.kind.slot();
        if entry.radius > self.max_radius[slot] {
            self.max_radius[slot] = entry.radius;
        }
        let key = self.cell_of(entry.pos);
        self.cells.entry(key).or_default().push(entry);
        self.len += 1;
    }

    /// Reinsert every live hostile, projectile and pickup
    pub fn rebuild(&mut self, hostiles: &[Hostile], projectiles: &[Projectile], pickups: &[Pickup]) {
        self.clear();
        self.insert_all(EntityKind::Hostile, hostiles);
        self.insert_all(EntityKind::Projectile, projectiles);
        self.insert_all(EntityKind::Pickup, pickups);
    }

    fn insert_all<E: Collider>(&mut self, kind: EntityKind, list: &[E]) {
        for (index, entity) in list.iter().enumerate() {
            if entity.is_dead() {
                continue;
            }
            self.insert(SpatialEntry {
                kind,
                index,
                id: entity.id(),
                pos: entity.pos(),
                radius: entity.radius(),
            });
        }
    }

    /// Visit every entry whose cell overlaps the square of half-size `radius`
    fn for_each_near(&self, pos: Vec2, radius: f32, mut visit: impl FnMut(&SpatialEntry)) {
        if !pos.is_finite() || !(radius >= 0.0) {
            return;
        }
        // Slight pad so float rounding at a cell edge can't drop an entry
        let reach = Vec2::splat(radius * 1.0001 + 1e-3);
        let (min_x, min_y) = self.cell_of(pos - reach);
        let (max_x, max_y) = self.cell_of(pos + reach);

        let span = (max_x as i64 - min_x as i64 + 1) * (max_y as i64 - min_y as i64 + 1);
        if span > self.cells.len() as i64 {
            // Huge query: cheaper to walk the occupied cells than the box
            for (&(cx, cy), cell) in &self.cells {
                if cx >= min_x && cx <= max_x && cy >= min_y && cy <= max_y {
                    cell.iter().for_each(&mut visit);
                }
            }
            return;
        }

        for cy in min_y..=max_y {
            for cx in min_x..=max_x {
                if let Some(cell) = self.cells.get(&(cx, cy)) {
                    cell.iter().for_each(&mut visit);
                }
            }
        }
    }

    /// All entries in cells overlapping the query box.
    ///
    /// This is a superset of the entries within `radius`: callers filter by
    /// exact distance.
    pub fn query_near(&self, pos: Vec2, radius: f32) -> Vec<SpatialEntry> {
        let mut result = Vec::new();
        self.for_each_near(pos, radius, |entry| result.push(*entry));
        result
    }

    /// Like [`query_near`](Self::query_near), restricted to one kind
    pub fn query_kind(&self, pos: Vec2, radius: f32, kind: EntityKind) -> Vec<SpatialEntry> {
        let mut result = Vec::new();
        self.for_each_near(pos, radius, |entry| {
            if entry.kind == kind {
                result.push(*entry);
            }
        });
        result
    }

    /// Closest entry of `kind` within `max_radius` (exact distance)
    pub fn nearest_to(&self, pos: Vec2, max_radius: f32, kind: EntityKind) -> Option<SpatialEntry> {
        let mut best: Option<(f32, SpatialEntry)> = None;
        let max_sq = max_radius * max_radius;
        self.for_each_near(pos, max_radius, |entry| {
            if entry.kind != kind {
                return;
            }
            let d = entry.pos.distance_squared(pos);
            if d > max_sq {
                return;
            }
            if best.is_none_or(|(best_d, _)| d < best_d) {
                best = Some((d, *entry));
            }
        });
        best.map(|(_, entry)| entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(id: u32, x: f32, y: f32) -> SpatialEntry {
        SpatialEntry {
            kind: EntityKind::Hostile,
            index: id as usize,
            id: EntityId(id),
            pos: Vec2::new(x, y),
            radius: 10.0,
        }
    }

    #[test]
    fn test_query_near_finds_entities_within_range() {
        let mut index = SpatialIndex::new(10.0);
        index.insert(entry(1, 0.0, 0.0));
        index.insert(entry(2, 5.0, 0.0));
        index.insert(entry(3, 0.0, 5.0));
        index.insert(entry(4, 200.0, 200.0));

        let results = index.query_near(Vec2::ZERO, 10.0);
        assert_eq!(results.len(), 3);
        assert!(!results.iter().any(|e| e.id == EntityId(4)));
    }

    #[test]
    fn test_query_spans_negative_cells() {
        let mut index = SpatialIndex::new(64.0);
        index.insert(entry(1, -1.0, -1.0));
        index.insert(entry(2, 1.0, 1.0));

        // Straddles the origin: both sides of the floor() boundary
        let results = index.query_near(Vec2::new(0.5, 0.5), 3.0);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_nearest_to_respects_max_radius() {
        let mut index = SpatialIndex::new(32.0);
        index.insert(entry(1, 50.0, 0.0));
        index.insert(entry(2, 20.0, 0.0));

        let nearest = index.nearest_to(Vec2::ZERO, 100.0, EntityKind::Hostile);
        assert_eq!(nearest.map(|e| e.id), Some(EntityId(2)));

        assert!(index.nearest_to(Vec2::ZERO, 10.0, EntityKind::Hostile).is_none());
        assert!(index.nearest_to(Vec2::ZERO, 100.0, EntityKind::Pickup).is_none());
    }

    #[test]
    fn test_clear_empties_and_resets_radius() {
        let mut index = SpatialIndex::new(16.0);
        index.insert(entry(1, 0.0, 0.0));
        assert_eq!(index.max_radius(EntityKind::Hostile), 10.0);
        index.clear();
        assert!(index.is_empty());
        assert!(index.query_near(Vec2::ZERO, 100.0).is_empty());
        assert_eq!(index.max_radius(EntityKind::Hostile), 0.0);
    }

    #[test]
    fn test_non_finite_inputs_are_ignored() {
        let mut index = SpatialIndex::new(16.0);
        index.insert(entry(1, f32::NAN, 0.0));
        assert!(index.is_empty());
        index.insert(entry(2, 0.0, 0.0));
        assert!(index.query_near(Vec2::new(f32::NAN, 0.0), 10.0).is_empty());
        assert!(index.query_near(Vec2::ZERO, f32::NAN).is_empty());
    }

    #[test]
    fn test_huge_radius_walks_occupied_cells() {
        let mut index = SpatialIndex::new(8.0);
        index.insert(entry(1, -3000.0, 2000.0));
        index.insert(entry(2, 4000.0, -1000.0));
        let results = index.query_near(Vec2::ZERO, 1.0e6);
        assert_eq!(results.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_query_matches_brute_force(
            points in prop::collection::vec((-500.0f32..500.0, -500.0f32..500.0), 0..120),
            qx in -600.0f32..600.0,
            qy in -600.0f32..600.0,
            radius in 0.0f32..300.0,
            cell in 8.0f32..128.0,
        ) {
            let mut index = SpatialIndex::new(cell);
            for (i, &(x, y)) in points.iter().enumerate() {
                index.insert(entry(i as u32, x, y));
            }
            let q = Vec2::new(qx, qy);

            let candidates = index.query_near(q, radius);
            let mut exact: Vec<u32> = candidates
                .iter()
                .filter(|e| e.pos.distance(q) <= radius)
                .map(|e| e.id.0)
                .collect();
            exact.sort_unstable();

            let brute: Vec<u32> = points
                .iter()
                .enumerate()
                .filter(|(_, (x, y))| Vec2::new(*x, *y).distance(q) <= radius)
                .map(|(i, _)| i as u32)
                .collect();

            prop_assert_eq!(exact, brute);

            let nearest = index.nearest_to(q, radius, EntityKind::Hostile);
            let brute_best = points
                .iter()
                .map(|&(x, y)| Vec2::new(x, y).distance_squared(q))
                .filter(|d| *d <= radius * radius)
                .fold(None, |acc: Option<f32>, d| Some(acc.map_or(d, |a| a.min(d))));
            match (nearest, brute_best) {
                (Some(e), Some(d)) => prop_assert!((e.pos.distance_squared(q) - d).abs() < 1e-3),
                (None, None) => {}
                (a, b) => prop_assert!(false, "nearest mismatch: {:?} vs {:?}", a, b),
            }
        }
    }
}
