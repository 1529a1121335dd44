/// The player: jump, wall slide and dash on top of the shared `Body`.
///
/// Action selection each tick, first match wins:
///   1. touching a side wall after more than 4 airborne ticks: wall_slide
///   2. more than 4 airborne ticks: jump
///   3. horizontal input: run
///   4. idle
///
/// ## Dash
///
/// `dashing` counts from ±60 toward 0 by one per tick. While |dashing| > 50
/// the body moves at ±8 px/tick (×0.1 on the tick it reaches 51), drops a
/// trail mote every tick and is not drawn. Enemies touching the player at
/// |dashing| >= 50 die. Pressing against the dash direction cancels the
/// timer but leaves the velocity alone, which throws the player backwards
/// out of the dash; that reversal is intended play.

use std::sync::Arc;

use super::assets::{Action, ActorAnimations};
use super::context::{Services, Sfx};
use super::draw::Surface;
use super::entity::PlayerView;
use super::geom::Vec2;
use super::physics::Body;

pub const PLAYER_SIZE: Vec2 = Vec2::new(8.0, 15.0);
pub const DASH_TICKS: i32 = 60;
/// |dashing| above this is the active, invisible part of the dash.
pub const DASH_ACTIVE: i32 = 50;
pub const DASH_SPEED: f32 = 8.0;
pub const FALL_DEATH_TICKS: u32 = 120;
const COYOTE_TICKS: u32 = 4;
const WALL_SLIDE_MAX_FALL: f32 = 0.5;
const DRAG: f32 = 0.1;

#[derive(Clone, Debug)]
pub struct Player {
    pub body: Body,
    pub air_time: u32,
    pub jumps: u32,
    pub wall_slide: bool,
    pub dashing: i32,
}

impl Player {
    pub fn new(anims: Arc<ActorAnimations>, pos: Vec2) -> Self {
        Player {
            body: Body::new(anims, pos, PLAYER_SIZE),
            air_time: 0,
            jumps: 1,
            wall_slide: false,
            dashing: 0,
        }
    }

    /// Put the player on a spawn point with no leftover motion.
    pub fn respawn(&mut self, pos: Vec2) {
        self.body.pos = pos;
        self.body.vel = Vec2::ZERO;
        self.dashing = 0;
        self.air_time = 0;
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            pos: self.body.pos,
            rect: self.body.rect(),
            dashing: self.dashing,
        }
    }

    pub fn update(&mut self, sv: &mut Services, movement: Vec2) {
        self.body.update(sv.tiles, movement);

        self.air_time += 1;
        if self.air_time > FALL_DEATH_TICKS {
            if *sv.dead == 0 {
                sv.fx.shake();
            }
            *sv.dead += 1;
        }

        if self.body.collisions.down {
            self.air_time = 0;
            self.jumps = 1;
        }

        self.wall_slide = false;
        if self.body.collisions.side() && self.air_time > COYOTE_TICKS {
            self.wall_slide = true;
            self.body.vel.y = self.body.vel.y.min(WALL_SLIDE_MAX_FALL);
            self.body.flip = !self.body.collisions.right;
            self.body.set_action(Action::WallSlide);
        }
        if !self.wall_slide {
            if self.air_time > COYOTE_TICKS {
                self.body.set_action(Action::Jump);
            } else if movement.x != 0.0 {
                self.body.set_action(Action::Run);
            } else {
                self.body.set_action(Action::Idle);
            }
        }

        if self.dashing != 0 && movement.x != 0.0 && movement.x.signum() as i32 != self.dashing.signum() {
            self.dashing = 0;
            self.body.flip = true;
        }

        let center = self.body.rect().center();
        if self.dashing.abs() == DASH_TICKS || self.dashing.abs() == DASH_ACTIVE {
            sv.fx.dash_ring(sv.assets, sv.rng, center, 20, 0.5, 0.5);
        }
        self.dashing -= self.dashing.signum();
        if self.dashing.abs() > DASH_ACTIVE {
            let dir = self.dashing.signum() as f32;
            self.body.vel.x = dir * DASH_SPEED;
            if self.dashing.abs() == DASH_ACTIVE + 1 {
                self.body.vel.x *= 0.1;
            }
            sv.fx.trail(sv.assets, sv.rng, center, dir, 3.0);
        }

        if self.body.vel.x > 0.0 {
            self.body.vel.x = (self.body.vel.x - DRAG).max(0.0);
        } else {
            self.body.vel.x = (self.body.vel.x + DRAG).min(0.0);
        }
    }

    /// Returns whether a jump happened, so the caller only plays a sound on
    /// success.
    pub fn jump(&mut self) -> bool {
        if self.wall_slide {
            let kick = if self.body.flip && self.body.last_movement.x < 0.0 {
                3.5
            } else if !self.body.flip && self.body.last_movement.x > 0.0 {
                -3.5
            } else {
                return false;
            };
            self.body.vel = Vec2::new(kick, -2.5);
            self.air_time = COYOTE_TICKS + 1;
            self.jumps = self.jumps.saturating_sub(1);
            return true;
        }
        if self.jumps > 0 {
            self.body.vel.y = -3.0;
            self.jumps -= 1;
            self.air_time = COYOTE_TICKS + 1;
            return true;
        }
        false
    }

    pub fn dash(&mut self, sounds: &mut Vec<Sfx>) {
        if self.dashing != 0 {
            return;
        }
        sounds.push(Sfx::Dash);
        self.dashing = if self.body.flip { -DASH_TICKS } else { DASH_TICKS };
    }

    pub fn render(&self, surface: &mut dyn Surface, offset: Vec2) {
        if self.dashing.abs() <= DASH_ACTIVE {
            self.body.render(surface, offset);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::player_at;
    use super::*;
    use crate::domain::context::testing::Harness;
    use crate::domain::draw::testing::Recorder;
    use crate::domain::tile::testing::tiles_from;

    fn open_air() -> Harness {
        Harness::new(tiles_from(&[" "]))
    }

    // ── Jump ──

    #[test]
    fn single_jump_then_refused() {
        let mut p = player_at(0.0, 0.0);
        assert!(p.jump());
        assert_eq!(p.body.vel.y, -3.0);
        assert_eq!(p.jumps, 0);
        assert_eq!(p.air_time, 5);
        assert!(!p.jump());
    }

    #[test]
    fn landing_restores_jump() {
        let mut h = Harness::new(tiles_from(&["   ", "   ", "###"]));
        let mut p = player_at(4.0, 10.0);
        p.jumps = 0;
        for _ in 0..40 {
            p.update(&mut h.services(), Vec2::ZERO);
            if p.body.collisions.down {
                break;
            }
        }
        assert!(p.body.collisions.down);
        assert_eq!(p.jumps, 1);
        assert_eq!(p.air_time, 0);
    }

    fn wall_sliding_player(h: &mut Harness, push: f32) -> Player {
        // Wall on the right, no floor: fall beside it while pushing in.
        let mut p = player_at(23.0, 0.0);
        p.air_time = 10;
        for _ in 0..3 {
            p.update(&mut h.services(), Vec2::new(push, 0.0));
        }
        p
    }

    #[test]
    fn wall_slide_caps_fall_and_faces_wall() {
        let mut h = Harness::new(tiles_from(&["  #", "  #", "  #", "  #"]));
        let p = wall_sliding_player(&mut h, 1.0);
        assert!(p.wall_slide);
        assert_eq!(p.body.action(), Action::WallSlide);
        assert!(!p.body.flip);
        assert!(p.body.vel.y <= 0.5);
    }

    #[test]
    fn wall_jump_kicks_away_when_pushing_in() {
        let mut h = Harness::new(tiles_from(&["  #", "  #", "  #", "  #"]));
        let mut p = wall_sliding_player(&mut h, 1.0);
        p.jumps = 0;
        assert!(p.jump());
        assert_eq!(p.body.vel, Vec2::new(-3.5, -2.5));
        assert_eq!(p.jumps, 0);
        assert_eq!(p.air_time, 5);
    }

    #[test]
    fn wall_jump_refused_without_push() {
        let mut h = Harness::new(tiles_from(&["  #", "  #", "  #", "  #"]));
        let mut p = wall_sliding_player(&mut h, 1.0);
        p.body.last_movement = Vec2::ZERO;
        assert!(!p.jump());
        assert_eq!(p.jumps, 1);
    }

    // ── Dash ──

    #[test]
    fn dash_direction_follows_facing_and_plays_sound() {
        let mut p = player_at(0.0, 0.0);
        let mut sounds = Vec::new();
        p.body.flip = true;
        p.dash(&mut sounds);
        assert_eq!(p.dashing, -DASH_TICKS);
        assert_eq!(sounds, vec![Sfx::Dash]);
        p.dash(&mut sounds);
        assert_eq!(sounds.len(), 1);
    }

    #[test]
    fn dash_timer_is_monotonic() {
        let mut h = open_air();
        let mut p = player_at(0.0, 0.0);
        p.dash(&mut Vec::new());
        let mut prev = p.dashing.abs();
        for _ in 0..80 {
            p.update(&mut h.services(), Vec2::ZERO);
            assert!(p.dashing.abs() <= prev);
            prev = p.dashing.abs();
        }
        assert_eq!(p.dashing, 0);
    }

    #[test]
    fn dash_velocity_window() {
        let mut h = open_air();
        let mut p = player_at(0.0, 0.0);
        p.dash(&mut Vec::new());
        p.update(&mut h.services(), Vec2::ZERO);
        assert_eq!(p.dashing, 59);
        assert!((p.body.vel.x - 7.9).abs() < 1e-5);
        for _ in 0..8 {
            p.update(&mut h.services(), Vec2::ZERO);
        }
        assert_eq!(p.dashing, 51);
        assert!((p.body.vel.x - 0.7).abs() < 1e-5);
        p.update(&mut h.services(), Vec2::ZERO);
        assert!((p.body.vel.x - 0.6).abs() < 1e-5);
    }

    #[test]
    fn dash_spawns_rings_and_trail() {
        let mut h = open_air();
        let mut p = player_at(0.0, 0.0);
        p.dash(&mut Vec::new());
        p.update(&mut h.services(), Vec2::ZERO);
        // ring of 20 at |60| plus one trail mote
        assert_eq!(h.fx.particles.len(), 21);
    }

    #[test]
    fn reversing_mid_dash_cancels_but_keeps_velocity() {
        let mut h = open_air();
        let mut p = player_at(0.0, 0.0);
        p.dash(&mut Vec::new());
        p.update(&mut h.services(), Vec2::ZERO);
        p.update(&mut h.services(), Vec2::ZERO);
        let vx = p.body.vel.x;
        p.update(&mut h.services(), Vec2::new(-1.0, 0.0));
        assert_eq!(p.dashing, 0);
        assert!(p.body.flip);
        assert!((p.body.vel.x - (vx - 0.1)).abs() < 1e-5);
    }

    #[test]
    fn same_direction_input_keeps_dash() {
        let mut h = open_air();
        let mut p = player_at(0.0, 0.0);
        p.dash(&mut Vec::new());
        p.update(&mut h.services(), Vec2::new(1.0, 0.0));
        assert_eq!(p.dashing, 59);
    }

    #[test]
    fn hidden_during_active_dash() {
        let mut p = player_at(0.0, 0.0);
        p.dashing = 55;
        let mut rec = Recorder::new();
        p.render(&mut rec, Vec2::ZERO);
        assert!(rec.calls.is_empty());
        p.dashing = 50;
        p.render(&mut rec, Vec2::ZERO);
        assert_eq!(rec.calls.len(), 1);
    }

    // ── Fall death ──

    #[test]
    fn long_fall_starts_death_once_and_keeps_counting() {
        let mut h = open_air();
        let mut p = player_at(0.0, 0.0);
        for _ in 0..FALL_DEATH_TICKS {
            p.update(&mut h.services(), Vec2::ZERO);
        }
        assert_eq!(h.dead, 0);
        p.update(&mut h.services(), Vec2::ZERO);
        assert_eq!(h.dead, 1);
        assert_eq!(h.fx.screenshake, 16);
        h.fx.screenshake = 0;
        p.update(&mut h.services(), Vec2::ZERO);
        assert_eq!(h.dead, 2);
        assert_eq!(h.fx.screenshake, 0);
    }

    #[test]
    fn respawn_clears_motion() {
        let mut p = player_at(0.0, 0.0);
        p.body.vel = Vec2::new(3.0, 2.0);
        p.dashing = 40;
        p.air_time = 30;
        p.respawn(Vec2::new(50.0, 60.0));
        assert_eq!(p.body.pos, Vec2::new(50.0, 60.0));
        assert_eq!(p.body.vel, Vec2::ZERO);
        assert_eq!((p.dashing, p.air_time), (0, 0));
    }
}
