//! Procedural shapes used when no sprite is available
//!
//! Every function appends triangle-list vertices to `out`.

use glam::Vec2;
use std::f32::consts::TAU;

use super::vertex::Vertex;

/// Segment count for a circle of `radius`, coarser for small shapes
pub fn segments_for(radius: f32) -> u32 {
    ((radius * 0.75) as u32).clamp(8, 64)
}

fn point_on(center: Vec2, radius: f32, i: u32, segments: u32) -> Vec2 {
    let theta = i as f32 / segments as f32 * TAU;
    center + Vec2::new(theta.cos(), theta.sin()) * radius
}

fn triangle(out: &mut Vec<Vertex>, a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) {
    out.push(Vertex::new(a.x, a.y, color));
    out.push(Vertex::new(b.x, b.y, color));
    out.push(Vertex::new(c.x, c.y, color));
}

/// Filled circle as a triangle fan
pub fn circle(out: &mut Vec<Vertex>, center: Vec2, radius: f32, color: [f32; 4]) {
    let segments = segments_for(radius);
    out.reserve(segments as usize * 3);
    for i in 0..segments {
        let a = point_on(center, radius, i, segments);
        let b = point_on(center, radius, i + 1, segments);
        triangle(out, center, a, b, color);
    }
}

/// Hollow circle band between `inner` and `outer`
pub fn ring(out: &mut Vec<Vertex>, center: Vec2, inner: f32, outer: f32, color: [f32; 4]) {
    let segments = segments_for(outer);
    out.reserve(segments as usize * 6);
    for i in 0..segments {
        let i1 = point_on(center, inner, i, segments);
        let o1 = point_on(center, outer, i, segments);
        let i2 = point_on(center, inner, i + 1, segments);
        let o2 = point_on(center, outer, i + 1, segments);
        triangle(out, i1, o1, i2, color);
        triangle(out, i2, o1, o2, color);
    }
}

/// Axis-aligned rectangle from its lower-left corner
pub fn quad(out: &mut Vec<Vertex>, min: Vec2, size: Vec2, color: [f32; 4]) {
    let max = min + size;
    let tl = Vec2::new(min.x, max.y);
    let br = Vec2::new(max.x, min.y);
    triangle(out, min, br, max, color);
    triangle(out, min, max, tl, color);
}

/// Four-pointed gem, used for loot
pub fn diamond(out: &mut Vec<Vertex>, center: Vec2, radius: f32, color: [f32; 4]) {
    let up = center + Vec2::Y * radius;
    let down = center - Vec2::Y * radius;
    let left = center - Vec2::X * radius * 0.7;
    let right = center + Vec2::X * radius * 0.7;
    triangle(out, up, left, right, color);
    triangle(out, down, right, left, color);
}

/// Centered horizontal bar filled to `ratio`
pub fn bar(
    out: &mut Vec<Vertex>,
    center: Vec2,
    width: f32,
    height: f32,
    ratio: f32,
    back: [f32; 4],
    fill: [f32; 4],
) {
    let min = center - Vec2::new(width, height) * 0.5;
    quad(out, min, Vec2::new(width, height), back);
    let filled = width * ratio.clamp(0.0, 1.0);
    if filled > 0.0 {
        quad(out, min, Vec2::new(filled, height), fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_vertices_on_radius() {
        let mut out = Vec::new();
        circle(&mut out, Vec2::new(10.0, -5.0), 20.0, [1.0; 4]);
        assert_eq!(out.len(), segments_for(20.0) as usize * 3);
        for (i, v) in out.iter().enumerate() {
            let d = Vec2::from(v.position).distance(Vec2::new(10.0, -5.0));
            if i % 3 == 0 {
                assert!(d < 1e-4);
            } else {
                assert!((d - 20.0).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_ring_stays_in_band() {
        let mut out = Vec::new();
        ring(&mut out, Vec2::ZERO, 50.0, 60.0, [1.0; 4]);
        assert!(!out.is_empty());
        for v in &out {
            let d = Vec2::from(v.position).length();
            assert!((49.99..=60.01).contains(&d));
        }
    }

    #[test]
    fn test_bar_skips_empty_fill() {
        let mut out = Vec::new();
        bar(&mut out, Vec2::ZERO, 40.0, 4.0, 0.0, [0.0; 4], [1.0; 4]);
        assert_eq!(out.len(), 6);
        out.clear();
        bar(&mut out, Vec2::ZERO, 40.0, 4.0, 0.5, [0.0; 4], [1.0; 4]);
        assert_eq!(out.len(), 12);
        let max_x = out[6..].iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        assert!((max_x - 0.0).abs() < 1e-4);
    }
}
