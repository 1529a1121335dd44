/// Transient, non-colliding visuals plus the projectile list.
///
/// All of these are plain values owned by `Effects`; nothing points at them.
/// Each `update` returns `true` when the entry should be removed, and the
/// owner sweeps after the whole pass (`retain_mut`), so no entry is skipped
/// or visited twice.

use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::Rng;

use super::animation::Animation;
use super::assets::{AssetTable, ParticleKind, Prop};
use super::draw::{Rgb, Surface};
use super::entity::PlayerView;
use super::geom::Vec2;
use super::tile::TileQuery;

pub const PROJECTILE_SPEED: f32 = 1.5;
pub const PROJECTILE_MAX_AGE: u32 = 360;
pub const SHAKE: u32 = 16;
const SPARK_DECAY: f32 = 0.1;
const LEAF_SWAY: f32 = 0.035;

// ── Projectile ──

#[derive(Clone, Debug)]
pub struct Projectile {
    pub pos: Vec2,
    pub dir: f32,
    pub age: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProjectileOutcome {
    Flying,
    Expired,
    HitWall,
    HitPlayer,
}

impl Projectile {
    pub fn new(pos: Vec2, dir: f32) -> Self {
        Projectile { pos, dir, age: 0 }
    }

    /// Move one tick. Expiry is decided before any collision test.
    pub fn advance(&mut self, tiles: &dyn TileQuery, player: &PlayerView) -> ProjectileOutcome {
        self.pos.x += self.dir;
        self.age += 1;
        if self.age > PROJECTILE_MAX_AGE {
            return ProjectileOutcome::Expired;
        }
        if tiles.solid_check(self.pos) {
            return ProjectileOutcome::HitWall;
        }
        if !player.dash_active() && player.rect.contains(self.pos) {
            return ProjectileOutcome::HitPlayer;
        }
        ProjectileOutcome::Flying
    }

    pub fn render(&self, surface: &mut dyn Surface, assets: &AssetTable, offset: Vec2) {
        let img = assets.prop(Prop::Projectile);
        surface.blit(img, self.pos - offset - img.world_size() * 0.5, false);
    }
}

// ── Particle ──

#[derive(Clone, Debug)]
pub struct Particle {
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub animation: Animation,
}

impl Particle {
    pub fn new(assets: &AssetTable, kind: ParticleKind, pos: Vec2, vel: Vec2, start_tick: u32) -> Self {
        Particle { kind, pos, vel, animation: assets.particle(kind, start_tick) }
    }

    /// Returns `true` once the one-shot animation has finished. The final
    /// frame still moves and draws for the tick it completes on.
    pub fn update(&mut self) -> bool {
        let kill = self.animation.is_done();
        self.pos += self.vel;
        self.animation.update();
        if self.kind == ParticleKind::Leaf {
            self.pos.x += (self.animation.elapsed() as f32 * LEAF_SWAY).sin() * 0.3;
        }
        kill
    }

    pub fn render(&self, surface: &mut dyn Surface, offset: Vec2) {
        let img = self.animation.image();
        surface.blit(img, self.pos - offset - img.world_size() * 0.5, false);
    }
}

// ── Spark ──

#[derive(Clone, Debug)]
pub struct Spark {
    pub pos: Vec2,
    pub angle: f32,
    pub speed: f32,
}

impl Spark {
    pub fn new(pos: Vec2, angle: f32, speed: f32) -> Self {
        Spark { pos, angle, speed }
    }

    pub fn update(&mut self) -> bool {
        self.pos += Vec2::from_angle(self.angle, self.speed);
        self.speed = (self.speed - SPARK_DECAY).max(0.0);
        self.speed <= 0.0
    }

    /// A streak along the direction of travel, longer while fast.
    pub fn render(&self, surface: &mut dyn Surface, offset: Vec2) {
        let tip = Vec2::from_angle(self.angle, self.speed * 3.0);
        let p = self.pos - offset;
        surface.plot(p, Rgb::WHITE);
        surface.plot(p + tip, Rgb::WHITE);
        surface.plot(p - tip, Rgb::WHITE);
    }
}

// ── Effects container ──

#[derive(Default)]
pub struct Effects {
    pub projectiles: Vec<Projectile>,
    pub particles: Vec<Particle>,
    pub sparks: Vec<Spark>,
    pub screenshake: u32,
}

impl Effects {
    pub fn clear(&mut self) {
        self.projectiles.clear();
        self.particles.clear();
        self.sparks.clear();
    }

    pub fn shake(&mut self) {
        self.screenshake = self.screenshake.max(SHAKE);
    }

    /// `count` sparks fanned within ±0.5 rad of `center_angle`.
    pub fn spark_fan(&mut self, rng: &mut StdRng, pos: Vec2, count: usize, center_angle: f32) {
        for _ in 0..count {
            let angle = center_angle + rng.gen::<f32>() - 0.5;
            self.sparks.push(Spark::new(pos, angle, 2.0 + rng.gen::<f32>()));
        }
    }

    /// `count` sparks in random directions at speed `base..base + 1`.
    pub fn spark_ring(&mut self, rng: &mut StdRng, pos: Vec2, count: usize, base: f32) {
        for _ in 0..count {
            let angle = rng.gen::<f32>() * PI * 2.0;
            self.sparks.push(Spark::new(pos, angle, base + rng.gen::<f32>()));
        }
    }

    /// Dust scattered from `pos`. With `inward` the dust travels opposite
    /// to its rolled angle.
    pub fn dust_burst(
        &mut self,
        assets: &AssetTable,
        rng: &mut StdRng,
        pos: Vec2,
        count: usize,
        max_speed: f32,
        inward: bool,
    ) {
        for _ in 0..count {
            let angle = rng.gen::<f32>() * PI * 2.0;
            let speed = rng.gen::<f32>() * max_speed;
            let dir = if inward { angle + PI } else { angle };
            let vel = Vec2::from_angle(dir, speed * 0.5);
            let start = rng.gen_range(0..=7);
            self.particles.push(Particle::new(assets, ParticleKind::Dust, pos, vel, start));
        }
    }

    /// Ring of dust used when the player's dash starts and ends.
    pub fn dash_ring(&mut self, assets: &AssetTable, rng: &mut StdRng, pos: Vec2, count: usize, min_speed: f32, spread: f32) {
        for _ in 0..count {
            let angle = rng.gen::<f32>() * PI * 2.0;
            let speed = rng.gen::<f32>() * spread + min_speed;
            let start = rng.gen_range(0..=7);
            let vel = Vec2::from_angle(angle, speed);
            self.particles.push(Particle::new(assets, ParticleKind::Dust, pos, vel, start));
        }
    }

    /// Single dust mote trailing behind a dashing actor.
    pub fn trail(&mut self, assets: &AssetTable, rng: &mut StdRng, pos: Vec2, dir: f32, max_speed: f32) {
        let vel = Vec2::new(dir * rng.gen::<f32>() * max_speed, 0.0);
        let start = rng.gen_range(0..=7);
        self.particles.push(Particle::new(assets, ParticleKind::Dust, pos, vel, start));
    }

    /// Sparks, dust and shake for something getting hit hard.
    pub fn death_burst(&mut self, assets: &AssetTable, rng: &mut StdRng, pos: Vec2) {
        self.shake();
        self.spark_ring(rng, pos, 30, 2.0);
        self.dust_burst(assets, rng, pos, 30, 5.0, true);
    }

    /// Tick sparks then particles; drop finished ones.
    pub fn update_visuals(&mut self) {
        self.sparks.retain_mut(|s| !s.update());
        self.particles.retain_mut(|p| !p.update());
    }

    pub fn spawn_leaf(&mut self, assets: &AssetTable, pos: Vec2, start_tick: u32) {
        self.particles.push(Particle::new(assets, ParticleKind::Leaf, pos, Vec2::new(-0.1, 0.3), start_tick));
    }
}
