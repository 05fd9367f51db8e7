//! Collision helpers for circles inside the arena disc
//!
//! Everything in the world is a circle, and the world itself is a disc of
//! configurable radius centered on the origin.

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point (if hit)
    pub point: Vec2,
    /// Surface normal at contact (pointing back into the arena)
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Whether two circles overlap (touching counts)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) <= reach * reach
}

/// Check a circle against the arena wall
pub fn disc_wall_collision(pos: Vec2, radius: f32, arena_radius: f32) -> CollisionResult {
    let r = pos.length();
    if r + radius <= arena_radius {
        return CollisionResult::miss();
    }

    let outward = pos.normalize_or_zero();
    CollisionResult {
        hit: true,
        point: outward * arena_radius,
        normal: -outward,
        penetration: r + radius - arena_radius,
    }
}

/// Push a circle back inside the arena disc, returning the corrected position
pub fn confine_to_disc(pos: Vec2, radius: f32, arena_radius: f32) -> Vec2 {
    if !pos.is_finite() {
        return Vec2::ZERO;
    }
    let result = disc_wall_collision(pos, radius, arena_radius);
    if !result.hit {
        return pos;
    }
    let limit = (arena_radius - radius).max(0.0);
    pos.normalize_or_zero() * limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 10.0, Vec2::new(15.0, 0.0), 5.0));
        assert!(!circles_overlap(Vec2::ZERO, 10.0, Vec2::new(15.1, 0.0), 5.0));
    }

    #[test]
    fn test_disc_wall_collision() {
        let arena_radius = 400.0;

        // Inside - no collision
        let result = disc_wall_collision(Vec2::new(300.0, 0.0), 8.0, arena_radius);
        assert!(!result.hit);

        // Touching wall
        let result = disc_wall_collision(Vec2::new(395.0, 0.0), 8.0, arena_radius);
        assert!(result.hit);
        assert!((result.penetration - 3.0).abs() < 1e-4);
        // Normal points back toward the center
        assert!(result.normal.x < 0.0);
    }

    #[test]
    fn test_confine_to_disc() {
        let pos = confine_to_disc(Vec2::new(0.0, 900.0), 16.0, 500.0);
        assert!((pos.length() - 484.0).abs() < 1e-3);
        assert!(pos.y > 0.0);

        let inside = Vec2::new(10.0, -20.0);
        assert_eq!(confine_to_disc(inside, 16.0, 500.0), inside);
        assert_eq!(confine_to_disc(Vec2::new(f32::NAN, 0.0), 16.0, 500.0), Vec2::ZERO);
    }
}
