/// Shared physics component for every moving actor.
///
/// ## Update order
///
///   1. Clear collision flags.
///   2. frame_movement = input movement + velocity.
///   3. X pass: move, then clamp against every overlapping solid near the
///      new position (right edge to obstacle left, or left edge to obstacle
///      right).
///   4. Y pass: same on Y with a fresh rect, so X is already resolved.
///   5. Facing follows the sign of the input; zero input keeps facing.
///   6. last_movement = input (unclamped).
///   7. Gravity: vel.y = min(5, vel.y + 0.1), zeroed on a vertical hit.
///   8. Animation tick.
///
/// Resolving one axis fully before the other keeps actors from snagging on
/// tile seams and from tunnelling through corners.

use std::sync::Arc;

use super::animation::Animation;
use super::assets::{Action, ActorAnimations, ActorKind};
use super::draw::Surface;
use super::geom::{Rect, Vec2};
use super::tile::TileQuery;

pub const GRAVITY: f32 = 0.1;
pub const TERMINAL_VELOCITY: f32 = 5.0;

/// Which sides hit a solid during the last update.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Collisions {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Collisions {
    pub fn side(&self) -> bool {
        self.left || self.right
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    pub collisions: Collisions,
    /// Facing left. Sprites are drawn mirrored when set.
    pub flip: bool,
    pub last_movement: Vec2,
    action: Action,
    anims: Arc<ActorAnimations>,
    animation: Animation,
}

impl Body {
    pub fn new(anims: Arc<ActorAnimations>, pos: Vec2, size: Vec2) -> Self {
        let (action, animation) = anims.initial();
        let animation = animation.starting_at(0);
        Body {
            pos,
            size,
            vel: Vec2::ZERO,
            collisions: Collisions::default(),
            flip: false,
            last_movement: Vec2::ZERO,
            action,
            anims,
            animation,
        }
    }

    pub fn kind(&self) -> ActorKind {
        self.anims.kind()
    }

    /// Always derived from `pos`.
    pub fn rect(&self) -> Rect {
        Rect::at(self.pos, self.size)
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    /// Switch to a new action, restarting its animation. Re-setting the
    /// current action keeps the cursor running. An action this kind has no
    /// animation for is ignored.
    pub fn set_action(&mut self, action: Action) {
        if action == self.action {
            return;
        }
        if let Some(template) = self.anims.get(action) {
            self.action = action;
            self.animation = template.starting_at(0);
        }
    }

    pub fn update(&mut self, tiles: &dyn TileQuery, movement: Vec2) {
        self.collisions = Collisions::default();
        let frame_movement = movement + self.vel;

        self.pos.x += frame_movement.x;
        let mut r = self.rect();
        for solid in tiles.physics_rects_around(self.pos) {
            if !r.overlaps(&solid) {
                continue;
            }
            if frame_movement.x > 0.0 {
                r.set_right(solid.left());
                self.collisions.right = true;
            }
            if frame_movement.x < 0.0 {
                r.set_left(solid.right());
                self.collisions.left = true;
            }
            self.pos.x = r.x;
        }

        self.pos.y += frame_movement.y;
        let mut r = self.rect();
        for solid in tiles.physics_rects_around(self.pos) {
            if !r.overlaps(&solid) {
                continue;
            }
            if frame_movement.y > 0.0 {
                r.set_bottom(solid.top());
                self.collisions.down = true;
            }
            if frame_movement.y < 0.0 {
                r.set_top(solid.bottom());
                self.collisions.up = true;
            }
            self.pos.y = r.y;
        }

        if movement.x > 0.0 {
            self.flip = false;
        }
        if movement.x < 0.0 {
            self.flip = true;
        }
        self.last_movement = movement;

        self.vel.y = (self.vel.y + GRAVITY).min(TERMINAL_VELOCITY);
        if self.collisions.down || self.collisions.up {
            self.vel.y = 0.0;
        }

        self.animation.update();
    }

    /// Top-left of the sprite in screen space.
    pub fn sprite_origin(&self, offset: Vec2) -> Vec2 {
        self.pos - offset + self.kind().render_offset()
    }

    pub fn render(&self, surface: &mut dyn Surface, offset: Vec2) {
        surface.blit(self.animation.image(), self.sprite_origin(offset), self.flip);
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::domain::assets::AssetTable;

    pub const ACTOR_SIZE: Vec2 = Vec2::new(8.0, 15.0);

    pub fn body_at(kind: ActorKind, x: f32, y: f32) -> Body {
        let table = AssetTable::builtin().unwrap();
        Body::new(table.actor(kind), Vec2::new(x, y), ACTOR_SIZE)
    }
}
