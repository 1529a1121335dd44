/// The step function: advances the world by one frame.
///
/// Processing order:
///   1. Timers (combo, screenshake, popups, message)
///   2. Level flow (cleared level → transition → next level)
///   3. Death sequence (counter, transition nudge, run end)
///   4. Camera follow + leaf spawning
///   5. Player input (jump / dash), then player update
///   6. Enemy updates, then sweep killed enemies
///   7. Projectiles (expiry → wall → player)
///   8. Sparks and particles
///
/// Nothing here removes from a collection while iterating it: updates
/// report a fate and the owner sweeps afterwards.

use std::f32::consts::PI;

use rand::Rng;

use crate::domain::context::{Services, Sfx};
use crate::domain::effects::ProjectileOutcome;
use crate::domain::entity::EnemyFate;
use crate::domain::geom::Vec2;
use super::event::GameEvent;
use super::level::{load_level, TRANSITION_FRAMES};
use super::world::{Phase, WorldState};

/// Leaf chance per frame is `area / LEAF_RARITY` for each tree.
const LEAF_RARITY: f32 = 49999.0;
const LEAF_START_MAX: u32 = 20;
const DEATH_NUDGE_AT: u32 = 10;
const DEATH_FRAMES: u32 = 40;

/// Input sampled for one frame. `jump` and `dash` are edges.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    /// -1 left, 0 none, +1 right.
    pub movement_x: f32,
    pub jump: bool,
    pub dash: bool,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    if world.phase != Phase::Playing || world.paused { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    let mut sounds: Vec<Sfx> = Vec::new();
    world.tick += 1;
    world.clock_ms += world.tick_ms;

    resolve_timers(world);
    if resolve_level_flow(world, &mut events) { return events; }
    if resolve_death(world, &mut events) { return events; }

    world.camera.follow(world.player.body.rect().center());
    resolve_leaves(world);

    let was_alive = world.dead == 0;
    resolve_player(world, input, &mut sounds);
    resolve_enemies(world, &mut sounds);
    resolve_projectiles(world, &mut sounds);
    world.fx.update_visuals();

    if was_alive && world.dead != 0 {
        tracing::debug!(level = world.level_number(), "player killed");
        events.push(GameEvent::PlayerKilled);
    }
    events.extend(sounds.into_iter().map(GameEvent::Sound));
    events
}

// ══════════════════════════════════════════════════════════════
// Timers
// ══════════════════════════════════════════════════════════════

fn resolve_timers(world: &mut WorldState) {
    world.score.update_combo();
    world.fx.screenshake = world.fx.screenshake.saturating_sub(1);
    world.score.update_popups();

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }
}

// ══════════════════════════════════════════════════════════════
// Level flow
// ══════════════════════════════════════════════════════════════

/// Returns `true` when a new level (or the end screen) took over.
fn resolve_level_flow(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if world.enemies.is_empty() {
        world.transition += 1;
        if world.transition > TRANSITION_FRAMES {
            events.push(GameEvent::LevelCleared { level: world.current_level });
            let next = world.current_level + 1;
            if load_level(world, next) {
                events.push(GameEvent::LevelLoaded { level: next });
            } else {
                events.push(GameEvent::GameComplete { score: world.score.total });
            }
            return true;
        }
    }
    if world.transition < 0 {
        world.transition += 1;
    }
    false
}

// ══════════════════════════════════════════════════════════════
// Death sequence
// ══════════════════════════════════════════════════════════════

/// Returns `true` once the run is over.
fn resolve_death(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if world.dead == 0 { return false; }

    world.dead += 1;
    // Keeps a cleared-level transition from outrunning the death.
    if world.dead == DEATH_NUDGE_AT {
        world.transition = (world.transition + 1).min(TRANSITION_FRAMES);
    }
    if world.dead > DEATH_FRAMES {
        world.phase = Phase::GameOver;
        let (score, level) = (world.score.total, world.level_number());
        tracing::info!(score, level, "game over");
        events.push(GameEvent::RunEnded { score, level });
        return true;
    }
    false
}

// ══════════════════════════════════════════════════════════════
// Ambient leaves
// ══════════════════════════════════════════════════════════════

fn resolve_leaves(world: &mut WorldState) {
    for rect in &world.leaf_spawners {
        if world.rng.gen::<f32>() * LEAF_RARITY < rect.area() {
            let pos = Vec2::new(
                rect.x + world.rng.gen::<f32>() * rect.w,
                rect.y + world.rng.gen::<f32>() * rect.h,
            );
            let start = world.rng.gen_range(0..=LEAF_START_MAX);
            world.fx.spawn_leaf(&world.assets, pos, start);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player(world: &mut WorldState, input: FrameInput, sounds: &mut Vec<Sfx>) {
    if world.dead != 0 { return; }

    let player = &mut world.player;
    if input.jump && player.jump() {
        sounds.push(Sfx::Jump);
    }
    if input.dash {
        player.dash(sounds);
    }

    let mut sv = Services {
        tiles: &world.tiles,
        assets: &world.assets,
        fx: &mut world.fx,
        score: &mut world.score,
        sounds,
        rng: &mut world.rng,
        dead: &mut world.dead,
        now_ms: world.clock_ms,
    };
    player.update(&mut sv, Vec2::new(input.movement_x, 0.0));
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_enemies(world: &mut WorldState, sounds: &mut Vec<Sfx>) {
    let view = world.player.view();
    let mut sv = Services {
        tiles: &world.tiles,
        assets: &world.assets,
        fx: &mut world.fx,
        score: &mut world.score,
        sounds,
        rng: &mut world.rng,
        dead: &mut world.dead,
        now_ms: world.clock_ms,
    };

    let fates: Vec<EnemyFate> = world.enemies
        .iter_mut()
        .map(|e| e.update(&mut sv, &view))
        .collect();
    let mut fates = fates.into_iter();
    world.enemies.retain(|_| fates.next() == Some(EnemyFate::Alive));
}

// ══════════════════════════════════════════════════════════════
// Projectiles
// ══════════════════════════════════════════════════════════════

fn resolve_projectiles(world: &mut WorldState, sounds: &mut Vec<Sfx>) {
    let view = world.player.view();
    let mut wall_hits: Vec<(Vec2, f32)> = Vec::new();
    let mut player_hit = false;

    let tiles = &world.tiles;
    world.fx.projectiles.retain_mut(|p| match p.advance(tiles, &view) {
        ProjectileOutcome::Flying => true,
        ProjectileOutcome::Expired => false,
        ProjectileOutcome::HitWall => {
            wall_hits.push((p.pos, p.dir));
            false
        }
        ProjectileOutcome::HitPlayer => {
            player_hit = true;
            false
        }
    });

    for (pos, dir) in wall_hits {
        // Sparks fly back the way the shot came.
        let angle = if dir > 0.0 { PI } else { 0.0 };
        world.fx.spark_fan(&mut world.rng, pos, 4, angle);
    }

    if player_hit && world.dead == 0 {
        world.dead += 1;
        sounds.push(Sfx::Hit);
        let center = world.player.body.rect().center();
        world.fx.death_burst(&world.assets, &mut world.rng, center);
        tracing::debug!(x = center.x, y = center.y, "player shot");
    }
}

// ══════════════════════════════════════════════════════════════
// Run control (called by the loop outside of `step`)
// ══════════════════════════════════════════════════════════════

/// Fresh run from the first level.
pub fn start_game(world: &mut WorldState) {
    world.score.reset_run();
    world.score.popups.clear();
    world.new_high_score = false;
    world.phase = Phase::Playing;
    load_level(world, 0);
}

/// After the game-over screen: same level, score and combo wiped.
pub fn restart_level(world: &mut WorldState) {
    world.score.reset_run();
    world.score.popups.clear();
    world.new_high_score = false;
    world.phase = Phase::Playing;
    let current = world.current_level;
    load_level(world, current);
}
