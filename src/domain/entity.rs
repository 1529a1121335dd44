/// Entities as the world sees them: the enemy variant, its fate after an
/// update, and the read-only player snapshot enemies react to.

use super::ai::{Dasher, Gunner};
use super::assets::AssetTable;
use super::context::Services;
use super::draw::Surface;
use super::geom::{Rect, Vec2};
use super::physics::Body;
use super::player::DASH_ACTIVE;

/// Player state copied out before enemies update.
#[derive(Clone, Copy, Debug)]
pub struct PlayerView {
    pub pos: Vec2,
    pub rect: Rect,
    pub dashing: i32,
}

impl PlayerView {
    /// Dash strong enough to kill enemies and dodge bullets.
    pub fn dash_active(&self) -> bool {
        self.dashing.abs() >= DASH_ACTIVE
    }
}

/// Whether the owner should keep the enemy after this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyFate {
    Alive,
    Killed,
}

#[derive(Clone, Debug)]
pub enum Enemy {
    Gunner(Gunner),
    Dasher(Dasher),
}

impl Enemy {
    pub fn update(&mut self, sv: &mut Services, player: &PlayerView) -> EnemyFate {
        match self {
            Enemy::Gunner(g) => g.update(sv, player),
            Enemy::Dasher(d) => d.update(sv, player),
        }
    }

    pub fn render(&self, surface: &mut dyn Surface, assets: &AssetTable, offset: Vec2) {
        match self {
            Enemy::Gunner(g) => g.render(surface, assets, offset),
            Enemy::Dasher(d) => d.render(surface, offset),
        }
    }

    pub fn body(&self) -> &Body {
        match self {
            Enemy::Gunner(g) => &g.body,
            Enemy::Dasher(d) => &d.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assets::ActorKind;
    use crate::domain::context::testing::Harness;
    use crate::domain::tile::testing::tiles_from;

    #[test]
    fn dash_window_boundary() {
        let mut v = PlayerView { pos: Vec2::ZERO, rect: Rect::default(), dashing: 50 };
        assert!(v.dash_active());
        v.dashing = -50;
        assert!(v.dash_active());
        v.dashing = 49;
        assert!(!v.dash_active());
    }

    #[test]
    fn variant_dispatch_reaches_both_brains() {
        let mut h = Harness::new(tiles_from(&["      ", "      ", "######"]));
        let anims = h.assets.actor(ActorKind::Enemy);
        let mut enemies = vec![
            Enemy::Gunner(Gunner::new(anims.clone(), Vec2::new(20.0, 17.0))),
            Enemy::Dasher(Dasher::new(anims, Vec2::new(60.0, 17.0))),
        ];
        let view = PlayerView {
            pos: Vec2::new(62.0, 17.0),
            rect: Rect::new(62.0, 17.0, 8.0, 15.0),
            dashing: 55,
        };
        let mut sv = h.services();
        let fates: Vec<EnemyFate> = enemies.iter_mut().map(|e| e.update(&mut sv, &view)).collect();
        assert_eq!(fates, vec![EnemyFate::Alive, EnemyFate::Killed]);
        assert_eq!(enemies[1].body().pos.y, 17.0);
    }
}
