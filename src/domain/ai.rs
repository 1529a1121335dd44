/// Enemy behaviour.
///
/// Two brains over the shared `Body`:
///   1. **Gunner**: random patrol bursts, shoots when a burst ends with the
///      player ahead, and takes potshots while the player is in range.
///   2. **Dasher**: same patrol, but remembers where it last saw the player
///      and charges at it on a cooldown.
///
/// Both die when the player's dash hits them. The Dasher's own dash hurts
/// the player instead of itself.

use std::f32::consts::PI;
use std::sync::Arc;

use rand::Rng;

use super::assets::{Action, ActorAnimations, AssetTable, Prop};
use super::context::{Services, Sfx};
use super::draw::{Rgb, Surface};
use super::effects::{Projectile, Spark, PROJECTILE_SPEED};
use super::entity::{EnemyFate, PlayerView};
use super::geom::{Rect, Vec2};
use super::physics::Body;
use super::score::ScoreKind;
use super::tile::TileQuery;

pub const ENEMY_SIZE: Vec2 = Vec2::new(8.0, 15.0);
const WALK_SPEED: f32 = 0.5;
const FOOTHOLD_AHEAD: f32 = 7.0;
const FOOTHOLD_BELOW: f32 = 23.0;
const MUZZLE_AHEAD: f32 = 7.0;

const GUNNER_WALK_CHANCE: f64 = 0.02;
const GUNNER_SHOT_CHANCE: f64 = 0.01;
const GUNNER_KILL_POINTS: u32 = 100;

pub const DASHER_RANGE: f32 = 80.0;
pub const DASHER_TICKS: i32 = 60;
const DASHER_ACTIVE: i32 = 50;
const DASHER_SPEED: f32 = 6.0;
pub const DASHER_COOLDOWN: u32 = 120;
pub const DASHER_HIT_COOLDOWN: u32 = 90;
pub const DASHER_WALL_COOLDOWN: u32 = 60;
const DASHER_WALK_CHANCE: f64 = 0.01;
const DASHER_KILL_POINTS: u32 = 150;
const DASHER_SIGHT_HEIGHT: f32 = 20.0;
const DASHER_DRAG: f32 = 0.1;

// ── Shared patrol ──

/// One patrol tick. Turns at walls and ledges, otherwise walks forward.
/// Reads the collision flags from the previous update.
fn patrol(body: &mut Body, tiles: &dyn TileQuery) -> Vec2 {
    let center = body.rect().center();
    let ahead = if body.flip { -FOOTHOLD_AHEAD } else { FOOTHOLD_AHEAD };
    let foothold = Vec2::new(center.x + ahead, body.pos.y + FOOTHOLD_BELOW);
    if tiles.solid_check(foothold) {
        if body.collisions.side() {
            body.flip = !body.flip;
            Vec2::ZERO
        } else {
            Vec2::new(if body.flip { -WALK_SPEED } else { WALK_SPEED }, 0.0)
        }
    } else {
        body.flip = !body.flip;
        Vec2::ZERO
    }
}

fn idle_or_run(body: &mut Body, movement: Vec2) {
    if movement.x != 0.0 {
        body.set_action(Action::Run);
    } else {
        body.set_action(Action::Idle);
    }
}

/// Death by player dash: effects, sound and score. The caller drops the
/// enemy on `Killed`.
fn die(body: &Body, sv: &mut Services, player: &PlayerView, points: u32) -> EnemyFate {
    let center = body.rect().center();
    sv.play(Sfx::Hit);
    sv.fx.death_burst(sv.assets, sv.rng, center);
    for angle in [0.0, PI] {
        let speed = 5.0 + sv.rng.gen::<f32>();
        sv.fx.sparks.push(Spark::new(center, angle, speed));
    }
    let award = sv.score.add_score(points, ScoreKind::Enemy, sv.now_ms, player.pos);
    tracing::debug!(points = award, x = center.x, y = center.y, "enemy killed");
    EnemyFate::Killed
}

// ═══════════════════════════════════════════════════════════════
// Gunner
// ═══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Gunner {
    pub body: Body,
    pub walking: u32,
}

impl Gunner {
    pub fn new(anims: Arc<ActorAnimations>, pos: Vec2) -> Self {
        Gunner { body: Body::new(anims, pos, ENEMY_SIZE), walking: 0 }
    }

    pub fn update(&mut self, sv: &mut Services, player: &PlayerView) -> EnemyFate {
        let mut movement = Vec2::ZERO;
        if self.walking > 0 {
            movement = patrol(&mut self.body, sv.tiles);
            self.walking -= 1;
            if self.walking == 0 {
                let dis = player.pos - self.body.pos;
                if dis.y.abs() < 16.0 {
                    self.fire_if_facing(sv, dis.x);
                }
            }
        } else if sv.rng.gen_bool(GUNNER_WALK_CHANCE) {
            self.walking = sv.rng.gen_range(30..=120);
        }

        self.body.update(sv.tiles, movement);
        idle_or_run(&mut self.body, movement);

        if player.dash_active() && self.body.rect().overlaps(&player.rect) {
            return die(&self.body, sv, player, GUNNER_KILL_POINTS);
        }

        let dis = player.pos - self.body.pos;
        if dis.y.abs() < 24.0 && dis.x.abs() < 200.0 && sv.rng.gen_bool(GUNNER_SHOT_CHANCE) {
            self.fire_if_facing(sv, dis.x);
        }
        EnemyFate::Alive
    }

    /// Shoot only if the player is on the side we face.
    fn fire_if_facing(&self, sv: &mut Services, dx: f32) {
        let facing_player = (self.body.flip && dx < 0.0) || (!self.body.flip && dx > 0.0);
        if !facing_player {
            return;
        }
        let center = self.body.rect().center();
        let (ahead, dir, spark_angle) = if self.body.flip {
            (-MUZZLE_AHEAD, -PROJECTILE_SPEED, PI)
        } else {
            (MUZZLE_AHEAD, PROJECTILE_SPEED, 0.0)
        };
        let muzzle = Vec2::new(center.x + ahead, center.y);
        sv.play(Sfx::Shoot);
        sv.fx.projectiles.push(Projectile::new(muzzle, dir));
        sv.fx.spark_fan(sv.rng, muzzle, 4, spark_angle);
    }

    pub fn render(&self, surface: &mut dyn Surface, assets: &AssetTable, offset: Vec2) {
        self.body.render(surface, offset);
        let gun = assets.prop(Prop::Gun);
        let center = self.body.rect().center();
        let x = if self.body.flip {
            center.x - 4.0 - gun.world_size().x
        } else {
            center.x + 4.0
        };
        surface.blit(gun, Vec2::new(x, center.y) - offset, self.body.flip);
    }
}

// ═══════════════════════════════════════════════════════════════
// Dasher
// ═══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Dasher {
    pub body: Body,
    pub walking: u32,
    pub dashing: i32,
    pub cooldown: u32,
    pub dash_range: f32,
    pub last_seen: Option<Vec2>,
}

impl Dasher {
    pub fn new(anims: Arc<ActorAnimations>, pos: Vec2) -> Self {
        Dasher {
            body: Body::new(anims, pos, ENEMY_SIZE),
            walking: 0,
            dashing: 0,
            cooldown: 0,
            dash_range: DASHER_RANGE,
            last_seen: None,
        }
    }

    fn dash_active(&self) -> bool {
        self.dashing.abs() >= DASHER_ACTIVE
    }

    /// Order per tick: remember the player, run an ongoing dash, tick the
    /// cooldown, maybe start a new dash, patrol if idle, move, then resolve
    /// contact (player dash kills us, our dash hits the player, our dash
    /// hits a wall).
    pub fn update(&mut self, sv: &mut Services, player: &PlayerView) -> EnemyFate {
        if (player.pos.y - self.body.pos.y).abs() < DASHER_SIGHT_HEIGHT {
            self.last_seen = Some(player.pos);
        }

        if self.dashing != 0 {
            self.dashing -= self.dashing.signum();
            if self.dashing.abs() > DASHER_ACTIVE {
                let dir = self.dashing.signum() as f32;
                self.body.vel.x = dir * DASHER_SPEED;
                if self.dashing.abs() == DASHER_ACTIVE + 1 {
                    self.body.vel.x *= 0.1;
                }
                sv.fx.trail(sv.assets, sv.rng, self.body.rect().center(), dir, 2.0);
            }
        }

        self.cooldown = self.cooldown.saturating_sub(1);

        if self.dashing == 0 && self.cooldown == 0 {
            if let Some(seen) = self.last_seen {
                let d = seen - self.body.pos;
                if d.x.abs() < self.dash_range && d.y.abs() < 16.0 {
                    self.dash_towards(sv, seen);
                }
            }
        }

        let mut movement = Vec2::ZERO;
        if self.dashing == 0 {
            if self.walking > 0 {
                movement = patrol(&mut self.body, sv.tiles);
                self.walking -= 1;
            } else if sv.rng.gen_bool(DASHER_WALK_CHANCE) {
                self.walking = sv.rng.gen_range(30..=120);
            }
        }

        self.body.update(sv.tiles, movement);
        if self.body.vel.x > 0.0 {
            self.body.vel.x = (self.body.vel.x - DASHER_DRAG).max(0.0);
        } else {
            self.body.vel.x = (self.body.vel.x + DASHER_DRAG).min(0.0);
        }
        if self.dashing != 0 {
            self.body.set_action(Action::Run);
        } else {
            idle_or_run(&mut self.body, movement);
        }

        let rect = self.body.rect();
        if player.dash_active() && rect.overlaps(&player.rect) {
            return die(&self.body, sv, player, DASHER_KILL_POINTS);
        }

        if self.dash_active() && rect.overlaps(&player.rect) {
            self.hit_player(sv, player);
        } else if self.dash_active() && self.body.collisions.side() {
            self.hit_wall(sv);
        }
        EnemyFate::Alive
    }

    fn dash_towards(&mut self, sv: &mut Services, target: Vec2) {
        if target.x > self.body.pos.x {
            self.dashing = DASHER_TICKS;
            self.body.flip = false;
        } else {
            self.dashing = -DASHER_TICKS;
            self.body.flip = true;
        }
        self.cooldown = DASHER_COOLDOWN;
        sv.play(Sfx::Dash);
        sv.fx.dash_ring(sv.assets, sv.rng, self.body.rect().center(), 10, 0.5, 0.8);
        tracing::debug!(x = self.body.pos.x, y = self.body.pos.y, dir = self.dashing.signum(), "dasher charging");
    }

    fn hit_player(&mut self, sv: &mut Services, player: &PlayerView) {
        sv.fx.shake();
        sv.play(Sfx::Hit);
        let player_center = player.rect.center();
        if sv.kill_player() {
            sv.fx.death_burst(sv.assets, sv.rng, player_center);
            tracing::debug!("player hit by dasher");
        }

        self.dashing = 0;
        self.body.vel.x *= 0.5;
        self.cooldown = DASHER_HIT_COOLDOWN;

        let impact = self.body.rect().center().midpoint(player_center);
        sv.fx.spark_ring(sv.rng, impact, 15, 2.0);
        sv.fx.dust_burst(sv.assets, sv.rng, impact, 15, 3.0, false);
    }

    fn hit_wall(&mut self, sv: &mut Services) {
        let away = if self.body.collisions.right { PI } else { 0.0 };
        self.dashing = 0;
        self.body.vel.x = 0.0;
        self.cooldown = DASHER_WALL_COOLDOWN;
        sv.fx.spark_fan(sv.rng, self.body.rect().center(), 15, away);
    }

    pub fn render(&self, surface: &mut dyn Surface, offset: Vec2) {
        if self.dashing.abs() > DASHER_ACTIVE {
            let back = if self.dashing > 0 { 3.0 } else { -3.0 };
            let ghost = self.body.sprite_origin(offset) - Vec2::new(back, 0.0);
            surface.blit(self.body.animation().image(), ghost, self.body.flip);
        }
        self.body.render(surface, offset);

        if self.cooldown > 0 {
            self.render_cooldown(surface, offset);
        }
    }

    fn render_cooldown(&self, surface: &mut dyn Surface, offset: Vec2) {
        const W: f32 = 12.0;
        const H: f32 = 3.0;
        let x = (self.body.pos.x - W / 2.0 - offset.x + self.body.size.x / 2.0).floor();
        let y = self.body.pos.y - 8.0 - offset.y;
        let view = surface.size();
        if !(0.0..=view.x).contains(&x) || !(0.0..=view.y).contains(&y) {
            return;
        }
        let ratio = self.cooldown as f32 / DASHER_COOLDOWN as f32;
        let fill = (W * (1.0 - ratio)).max(1.0);
        surface.fill_rect(Rect::new(x, y, W, H), Rgb::BAR_BG);
        surface.fill_rect(Rect::new(x, y, fill, H), Rgb::GREEN);
        surface.stroke_rect(Rect::new(x, y, W, H), Rgb::BAR_BORDER);
    }
}
