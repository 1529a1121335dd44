/// WorldState: the complete snapshot of a running game.
///
/// ## Ownership
///
/// The world owns every collection: the player, the enemy list and the
/// `Effects` container (projectiles, particles, sparks, screenshake).
/// Actors never point back at the world. `step` lends them disjoint
/// fields through `domain::context::Services` each frame.
///
/// ## Camera
///
/// World coordinates are pixels. The camera keeps a float `scroll`
/// (top-left of the 320×240 view) that eases toward the player; all
/// drawing uses the floored `offset()`.
///
/// ## Counters owned by the loop
///
///   - `dead`       — 0 while alive, then counts frames of the death sequence
///   - `transition` — negative after a load (iris opening), positive once
///                    the level is cleared (iris closing)

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::assets::{ActorKind, AssetTable, Prop};
use crate::domain::draw::Surface;
use crate::domain::effects::Effects;
use crate::domain::entity::Enemy;
use crate::domain::geom::{Rect, Vec2};
use crate::domain::player::Player;
use crate::domain::score::ScoreTracker;
use crate::domain::tile::Tilemap;
use crate::sim::highscore::ScoreRecord;
use crate::sim::level::LevelDef;

pub const DISPLAY_W: f32 = 320.0;
pub const DISPLAY_H: f32 = 240.0;
const CAMERA_EASE: f32 = 30.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    GameOver,
    GameComplete,
}

/// Camera: eased scroll toward a target.
#[derive(Clone, Debug, Default)]
pub struct Camera {
    pub scroll: Vec2,
}

impl Camera {
    pub fn new() -> Self {
        Camera::default()
    }

    /// Move 1/30 of the way toward centering `target` in the view.
    pub fn follow(&mut self, target: Vec2) {
        self.scroll.x += (target.x - DISPLAY_W / 2.0 - self.scroll.x) / CAMERA_EASE;
        self.scroll.y += (target.y - DISPLAY_H / 2.0 - self.scroll.y) / CAMERA_EASE;
    }

    /// Integer scroll used for drawing.
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.scroll.x.floor(), self.scroll.y.floor())
    }
}

pub struct WorldState {
    // ── Level ──
    pub assets: AssetTable,
    pub tiles: Tilemap,
    /// Top-left corners of tree decorations.
    pub trees: Vec<Vec2>,
    pub leaf_spawners: Vec<Rect>,
    pub levels: Vec<LevelDef>,
    pub current_level: usize,
    pub level_name: String,

    // ── Entities ──
    pub player: Player,
    pub player_spawn: Vec2,
    pub enemies: Vec<Enemy>,
    pub fx: Effects,

    // ── Game tracking ──
    pub score: ScoreTracker,
    /// Best `(score, level)` seen so far, as stored.
    pub high_score: (u32, u32),
    /// Shown on the game-over screen.
    pub top_scores: Vec<ScoreRecord>,
    pub new_high_score: bool,
    pub dead: u32,
    pub transition: i32,

    // ── Meta ──
    pub phase: Phase,
    pub tick: u64,
    /// Game clock for the combo window; advances `tick_ms` per step.
    pub clock_ms: u64,
    pub tick_ms: u64,
    pub rng: StdRng,
    pub camera: Camera,
    pub paused: bool,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
}

// ── Construction ──

impl WorldState {
    pub fn new(assets: AssetTable, levels: Vec<LevelDef>, tick_ms: u64, seed: Option<u64>) -> Self {
        let player = Player::new(assets.actor(ActorKind::Player), Vec2::ZERO);
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        WorldState {
            assets,
            tiles: Tilemap::new(vec![]),
            trees: vec![],
            leaf_spawners: vec![],
            levels,
            current_level: 0,
            level_name: String::new(),
            player,
            player_spawn: Vec2::ZERO,
            enemies: vec![],
            fx: Effects::default(),
            score: ScoreTracker::new(),
            high_score: (0, 1),
            top_scores: vec![],
            new_high_score: false,
            dead: 0,
            transition: 0,
            phase: Phase::Title,
            tick: 0,
            clock_ms: 0,
            tick_ms,
            rng,
            camera: Camera::new(),
            paused: false,
            message: String::new(),
            message_timer: 0,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// 1-based level number for display and the score store.
    pub fn level_number(&self) -> u32 {
        self.current_level as u32 + 1
    }

    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }
}

// ── Drawing ──

impl WorldState {
    /// Draw the play field back to front at the given scroll offset.
    pub fn render(&self, surface: &mut dyn Surface, offset: Vec2) {
        let tree = self.assets.prop(Prop::Tree);
        for &pos in &self.trees {
            surface.blit(tree, pos - offset, false);
        }
        self.tiles.render(surface, &self.assets, offset);
        for enemy in &self.enemies {
            enemy.render(surface, &self.assets, offset);
        }
        if self.dead == 0 {
            self.player.render(surface, offset);
        }
        for p in &self.fx.projectiles {
            p.render(surface, &self.assets, offset);
        }
        for s in &self.fx.sparks {
            s.render(surface, offset);
        }
        for p in &self.fx.particles {
            p.render(surface, offset);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::draw::testing::Recorder;

    #[test]
    fn camera_eases_toward_target() {
        let mut cam = Camera::new();
        cam.follow(Vec2::new(190.0, 150.0));
        assert!((cam.scroll.x - 1.0).abs() < 1e-5);
        assert!((cam.scroll.y - 1.0).abs() < 1e-5);
        for _ in 0..1000 {
            cam.follow(Vec2::new(190.0, 150.0));
        }
        assert!((cam.scroll.x - 30.0).abs() < 0.01);
        assert!((cam.scroll.y - 30.0).abs() < 0.01);
    }

    #[test]
    fn camera_offset_floors() {
        let cam = Camera { scroll: Vec2::new(-3.5, 7.9) };
        assert_eq!(cam.offset(), Vec2::new(-4.0, 7.0));
    }

    #[test]
    fn dead_player_is_not_drawn() {
        let mut w = testing::world_from(&[
            "          ",
            "  P       ",
            "##########",
        ]);
        let mut rec = Recorder::new();
        w.render(&mut rec, Vec2::ZERO);
        let alive_calls = rec.calls.len();
        w.dead = 1;
        let mut rec = Recorder::new();
        w.render(&mut rec, Vec2::ZERO);
        assert_eq!(rec.calls.len(), alive_calls - 1);
    }

    #[test]
    fn level_number_is_one_based() {
        let mut w = testing::world_from(&["P", "#"]);
        assert_eq!(w.level_number(), 1);
        w.current_level = 2;
        assert_eq!(w.level_number(), 3);
    }
}
