//! Draw-list building
//!
//! Reads the world once per frame and produces a [`DrawList`]: sprite draws
//! for every key the host's [`AssetCatalog`] resolves, procedural vertices
//! for everything else. Building never mutates the world and never fails;
//! a missing asset only changes how an entity is drawn.

pub mod shapes;
pub mod vertex;

use glam::Vec2;

use crate::data::{ItemKind, MobKind, PowerOrbKind};
use crate::sim::{AoeAttack, FloatText, Hostile, Particle, Pickup, PickupPayload, Player, Projectile, World};
pub use vertex::{Vertex, colors};

/// Opaque texture handle owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteHandle(pub u32);

/// Host-side lookup from asset key to a loaded sprite
pub trait AssetCatalog {
    fn sprite(&self, key: &str) -> Option<SpriteHandle>;
}

/// Catalog with nothing loaded; everything draws procedurally
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetCatalog for NoAssets {
    fn sprite(&self, _key: &str) -> Option<SpriteHandle> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDraw {
    pub handle: SpriteHandle,
    pub pos: Vec2,
    /// Diameter in world units
    pub size: f32,
    pub tint: [f32; 4],
    /// Mirror horizontally (entity faces left)
    pub flip: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub pos: Vec2,
    pub text: String,
    pub color: [f32; 4],
    pub scale: f32,
}

/// Everything the host needs to present one frame
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    /// Procedural triangles, in draw order
    pub vertices: Vec<Vertex>,
    pub sprites: Vec<SpriteDraw>,
    pub labels: Vec<Label>,
    /// Camera offset from screen shake
    pub camera_offset: Vec2,
    /// Entities drawn procedurally because their key was unresolved
    pub fallbacks: usize,
}

impl DrawList {
    /// Vertex buffer contents ready for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Push a sprite when `key` resolves, otherwise run `fallback`
    fn sprite_or(
        &mut self,
        assets: &dyn AssetCatalog,
        key: &str,
        sprite: (Vec2, f32, [f32; 4], bool),
        fallback: impl FnOnce(&mut Vec<Vertex>),
    ) {
        let (pos, size, tint, flip) = sprite;
        match assets.sprite(key) {
            Some(handle) => self.sprites.push(SpriteDraw { handle, pos, size, tint, flip }),
            None => {
                log::trace!("no sprite for '{}', drawing shape", key);
                self.fallbacks += 1;
                fallback(&mut self.vertices);
            }
        }
    }
}

/// Read-only drawing; implementors cannot touch the world
pub trait Draw {
    fn draw(&self, list: &mut DrawList, assets: &dyn AssetCatalog);
}

pub fn mob_key(kind: MobKind) -> &'static str {
    match kind {
        MobKind::Slime => "mob/slime",
        MobKind::Bat => "mob/bat",
        MobKind::Skeleton => "mob/skeleton",
        MobKind::Golem => "mob/golem",
        MobKind::Wraith => "mob/wraith",
        MobKind::SlimeKing => "mob/slime_king",
        MobKind::BoneLord => "mob/bone_lord",
    }
}

pub fn pickup_key(payload: &PickupPayload) -> &'static str {
    match payload {
        PickupPayload::Exp(_) => "pickup/exp",
        PickupPayload::Gold(_) => "pickup/gold",
        PickupPayload::Chest { .. } => "pickup/chest",
        PickupPayload::Card(ItemKind::Potion) => "card/potion",
        PickupPayload::Card(ItemKind::Bomb) => "card/bomb",
        PickupPayload::Card(ItemKind::Aegis) => "card/aegis",
        PickupPayload::Card(ItemKind::Fury) => "card/fury",
        PickupPayload::PowerOrb(PowerOrbKind::Damage) => "orb/damage",
        PickupPayload::PowerOrb(PowerOrbKind::Speed) => "orb/speed",
        PickupPayload::PowerOrb(PowerOrbKind::Heal) => "orb/heal",
    }
}

fn pickup_color(payload: &PickupPayload) -> [f32; 4] {
    match payload {
        PickupPayload::Exp(_) => colors::EXP,
        PickupPayload::Gold(_) | PickupPayload::Chest { .. } => colors::GOLD,
        PickupPayload::Card(_) => colors::CARD,
        PickupPayload::PowerOrb(_) => colors::POWER_ORB,
    }
}

impl Draw for Player {
    fn draw(&self, list: &mut DrawList, assets: &dyn AssetCatalog) {
        let tint = if self.is_dashing() { colors::PLAYER_DASH } else { colors::TEXT };
        let sprite = (self.pos, self.radius * 2.0, tint, self.facing.x < 0.0);
        let (pos, radius) = (self.pos, self.radius);
        let dashing = self.is_dashing();
        list.sprite_or(assets, "player", sprite, |out| {
            let color = if dashing { colors::PLAYER_DASH } else { colors::PLAYER };
            shapes::circle(out, pos, radius, color);
        });
        if self.invulnerability > 0.0 {
            shapes::ring(&mut list.vertices, self.pos, self.radius + 2.0, self.radius + 4.0, colors::TEXT);
        }
    }
}

impl Draw for Hostile {
    fn draw(&self, list: &mut DrawList, assets: &dyn AssetCatalog) {
        use crate::sim::Collider;

        let radius = self.radius();
        let base = if self.is_boss {
            colors::BOSS
        } else if self.is_elite {
            colors::ELITE
        } else {
            colors::HOSTILE
        };
        let tint = if self.flash_timer > 0.0 {
            colors::HIT_FLASH
        } else if self.stun_timer > 0.0 {
            colors::STUNNED
        } else {
            colors::TEXT
        };
        let fill = if tint == colors::TEXT { base } else { tint };

        let sprite = (self.pos, radius * 2.0, tint, false);
        let pos = self.pos;
        list.sprite_or(assets, mob_key(self.kind), sprite, |out| {
            shapes::circle(out, pos, radius, fill);
        });

        if self.is_elite || self.is_boss {
            let ratio = if self.max_hp > 0.0 { self.hp / self.max_hp } else { 0.0 };
            let bar_pos = self.pos + Vec2::Y * (radius + 8.0);
            shapes::bar(&mut list.vertices, bar_pos, radius * 2.0, 4.0, ratio, colors::HP_BACK, colors::HP_FILL);
        }
    }
}

impl Draw for Projectile {
    fn draw(&self, list: &mut DrawList, assets: &dyn AssetCatalog) {
        let sprite = (self.pos, self.radius * 2.0, colors::TEXT, self.vel.x < 0.0);
        let (pos, radius) = (self.pos, self.radius);
        list.sprite_or(assets, "projectile", sprite, |out| {
            shapes::circle(out, pos, radius, colors::PROJECTILE);
        });
    }
}

impl Draw for Pickup {
    fn draw(&self, list: &mut DrawList, assets: &dyn AssetCatalog) {
        use crate::sim::Collider;

        // Hop height lifts the drawing, not the hitbox
        let pos = self.pos + Vec2::Y * self.height;
        let radius = self.radius();
        let color = pickup_color(&self.payload);
        let sprite = (pos, radius * 2.0, colors::TEXT, false);
        list.sprite_or(assets, pickup_key(&self.payload), sprite, |out| {
            shapes::diamond(out, pos, radius, color);
        });
    }
}

impl Draw for Particle {
    fn draw(&self, list: &mut DrawList, _assets: &dyn AssetCatalog) {
        let fade = self.fade();
        if fade > 0.0 {
            let color = vertex::with_alpha(self.color, self.color[3] * fade);
            shapes::quad(&mut list.vertices, self.pos - Vec2::splat(self.size * 0.5), Vec2::splat(self.size), color);
        }
    }
}

impl Draw for FloatText {
    fn draw(&self, list: &mut DrawList, _assets: &dyn AssetCatalog) {
        let alpha = (self.life / Self::LIFETIME).clamp(0.0, 1.0);
        let base = if self.crit { colors::TEXT_CRIT } else { colors::TEXT };
        list.labels.push(Label {
            pos: self.pos,
            text: self.text.clone(),
            color: vertex::with_alpha(base, alpha),
            scale: if self.crit { 1.4 } else { 1.0 },
        });
    }
}

impl Draw for AoeAttack {
    fn draw(&self, list: &mut DrawList, _assets: &dyn AssetCatalog) {
        // Fill grows toward the rim as the fuse burns
        let progress = self.progress();
        shapes::ring(&mut list.vertices, self.pos, self.radius - 3.0, self.radius, colors::AOE_WARNING);
        if progress > 0.0 {
            shapes::circle(&mut list.vertices, self.pos, self.radius * progress, colors::AOE_WARNING);
        }
    }
}

fn shake_offset(world: &World) -> Vec2 {
    if world.screen_shake <= 0.0 {
        return Vec2::ZERO;
    }
    let t = world.play_time;
    Vec2::new((t * 53.0).sin(), (t * 41.0).cos()) * world.screen_shake
}

/// Build this frame's draw list
pub fn build_draw_list(world: &World, assets: &dyn AssetCatalog) -> DrawList {
    let mut list = DrawList {
        camera_offset: shake_offset(world),
        ..DrawList::default()
    };

    shapes::ring(
        &mut list.vertices,
        Vec2::ZERO,
        world.arena_radius,
        world.arena_radius + 6.0,
        colors::ARENA_WALL,
    );

    for aoe in &world.arena.aoe_attacks {
        aoe.draw(&mut list, assets);
    }
    for pickup in world.pickups.iter().filter(|p| !p.dead) {
        pickup.draw(&mut list, assets);
    }
    for hostile in world.hostiles.iter().filter(|h| !h.dead) {
        hostile.draw(&mut list, assets);
    }
    for projectile in world.projectiles.iter().filter(|p| !p.dead) {
        projectile.draw(&mut list, assets);
    }
    world.player.draw(&mut list, assets);
    for particle in &world.particles {
        particle.draw(&mut list, assets);
    }
    for text in &world.texts {
        text.draw(&mut list, assets);
    }

    list
}
