//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    /// Byte stride of one vertex in an interleaved buffer
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();
    /// Byte offset of `color` inside a vertex
    pub const COLOR_OFFSET: usize = std::mem::size_of::<[f32; 2]>();

    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }
}

/// Replace the alpha channel of `color`
pub fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
    [color[0], color[1], color[2], alpha]
}

/// Colors for game elements
pub mod colors {
    pub const ARENA_WALL: [f32; 4] = [0.3, 0.3, 0.4, 1.0];
    pub const PLAYER: [f32; 4] = [0.3, 0.75, 1.0, 1.0];
    pub const PLAYER_DASH: [f32; 4] = [0.7, 0.9, 1.0, 0.8];
    pub const HOSTILE: [f32; 4] = [0.85, 0.3, 0.3, 1.0];
    pub const ELITE: [f32; 4] = [0.95, 0.6, 0.15, 1.0];
    pub const BOSS: [f32; 4] = [0.65, 0.15, 0.8, 1.0];
    pub const HIT_FLASH: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const STUNNED: [f32; 4] = [0.9, 0.9, 0.4, 1.0];
    pub const PROJECTILE: [f32; 4] = [1.0, 0.95, 0.6, 1.0];
    pub const EXP: [f32; 4] = [0.3, 0.9, 0.5, 1.0];
    pub const GOLD: [f32; 4] = [0.95, 0.8, 0.2, 1.0];
    pub const CARD: [f32; 4] = [0.5, 0.6, 1.0, 1.0];
    pub const POWER_ORB: [f32; 4] = [1.0, 0.4, 0.8, 1.0];
    pub const AOE_WARNING: [f32; 4] = [1.0, 0.2, 0.1, 0.35];
    pub const HP_BACK: [f32; 4] = [0.1, 0.1, 0.1, 0.8];
    pub const HP_FILL: [f32; 4] = [0.85, 0.15, 0.15, 1.0];
    pub const TEXT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const TEXT_CRIT: [f32; 4] = [1.0, 0.75, 0.2, 1.0];
    pub const BACKGROUND: [f32; 4] = [0.02, 0.02, 0.05, 1.0];
}
