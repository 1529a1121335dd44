/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by file name)
///   2. Built-in embedded levels
///
/// ## Level format (`.txt`):
///   Line 1: `# Level Name`
///   Lines:  map rows, one character per 16px tile
///
/// ## Tile legend:
///   '#' = Grass (solid)          '=' = Stone (solid)
///   'P' = Player spawn           'E' = Gunner spawn
///   'D' = Dasher spawn           'T' = Tree (drops leaves)
///   ' ' = Empty
///
/// Short rows are padded with empty tiles to the widest row.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::domain::ai::{Dasher, Gunner};
use crate::domain::assets::ActorKind;
use crate::domain::entity::Enemy;
use crate::domain::geom::{Rect, Vec2};
use crate::domain::tile::{Tile, Tilemap, TILE_SIZE};
use crate::sim::world::{Camera, Phase, WorldState};

const LEGEND: &str = "#= PEDT";
const TREE_HEIGHT: f32 = 24.0;
/// Canopy area, relative to the tree's top-left corner.
const LEAF_AREA: Rect = Rect::new(4.0, 4.0, 23.0, 13.0);
pub const TRANSITION_FRAMES: i32 = 30;

/// Runtime level data (owned strings, loaded from file or embedded).
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load a level into the world state. Keeps score and combo.
/// Past the last level the phase becomes `GameComplete` and `false` is
/// returned.
pub fn load_level(world: &mut WorldState, level_idx: usize) -> bool {
    let Some(def) = world.levels.get(level_idx) else {
        world.phase = Phase::GameComplete;
        tracing::info!(score = world.score.total, "all levels cleared");
        return false;
    };

    let mut tiles = vec![];
    let mut enemies = vec![];
    let mut trees = vec![];
    let mut spawn = None;
    let enemy_anims = world.assets.actor(ActorKind::Enemy);

    for (y, row) in def.rows.iter().enumerate() {
        let mut tile_row = Vec::with_capacity(row.len());
        for (x, ch) in row.chars().enumerate() {
            let cell = Vec2::new(x as f32 * TILE_SIZE, y as f32 * TILE_SIZE);
            tile_row.push(match ch {
                '#' => Tile::Grass,
                '=' => Tile::Stone,
                _ => Tile::Empty,
            });
            match ch {
                'P' => spawn = Some(cell),
                'E' => enemies.push(Enemy::Gunner(Gunner::new(enemy_anims.clone(), cell))),
                'D' => enemies.push(Enemy::Dasher(Dasher::new(enemy_anims.clone(), cell))),
                // Trees stand on the bottom of their cell.
                'T' => trees.push(Vec2::new(cell.x, cell.y + TILE_SIZE - TREE_HEIGHT)),
                _ => {}
            }
        }
        tiles.push(tile_row);
    }

    world.current_level = level_idx;
    world.level_name = def.name.clone();
    let name = def.name.clone();

    world.tiles = Tilemap::new(tiles);
    world.leaf_spawners = trees
        .iter()
        .map(|t| Rect::new(t.x + LEAF_AREA.x, t.y + LEAF_AREA.y, LEAF_AREA.w, LEAF_AREA.h))
        .collect();
    world.trees = trees;
    world.enemies = enemies;

    if let Some(pos) = spawn {
        world.player_spawn = pos;
    }
    world.player.respawn(world.player_spawn);

    world.fx.clear();
    world.camera = Camera::new();
    world.dead = 0;
    world.transition = -TRANSITION_FRAMES;
    world.set_message(&name, 120);

    tracing::info!(
        level = level_idx + 1,
        name = %name,
        enemies = world.enemies.len(),
        "level loaded"
    );
    true
}

/// Levels from `dir` if it holds any valid ones, else the built-in set.
pub fn load_levels(dir: &Path) -> Vec<LevelDef> {
    if dir.is_dir() {
        let mut levels = load_from_directory(dir);
        levels.sort_by(|a, b| a.0.cmp(&b.0));
        if !levels.is_empty() {
            tracing::info!(count = levels.len(), dir = %dir.display(), "using level files");
            return levels.into_iter().map(|(_, def)| def).collect();
        }
    }
    embedded_levels()
}

// ══════════════════════════════════════════════════════════════
// Single-level file parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
pub fn parse_level(content: &str) -> Result<LevelDef> {
    let mut name = String::new();
    let mut rows = vec![];

    for line in content.lines() {
        if line.starts_with('#') && name.is_empty() && rows.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else {
            rows.push(line.trim_end_matches('\r').to_string());
        }
    }

    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }

    if rows.is_empty() {
        bail!("level has no map rows");
    }
    if !rows.iter().any(|r| r.contains('P')) {
        bail!("level has no player spawn ('P')");
    }

    let max_width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    for row in &mut rows {
        let len = row.chars().count();
        if len < max_width {
            row.extend(std::iter::repeat(' ').take(max_width - len));
        }
    }

    if name.is_empty() {
        name = "Unnamed Level".to_string();
    }

    Ok(LevelDef { name, rows })
}

/// Distinguish `# Level Name` from a map row that starts with grass.
/// A name line has at least one character outside the tile legend.
fn is_name_line(line: &str) -> bool {
    line[1..].chars().any(|c| !LEGEND.contains(c))
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<(String, LevelDef)> {
    let mut results = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), "could not read levels dir: {e}");
            return results;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "txt") {
            let parsed = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))
                .and_then(|content| parse_level(&content));
            match parsed {
                Ok(def) => {
                    let filename = path.file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .to_string();
                    results.push((filename, def));
                }
                Err(e) => tracing::warn!(file = %path.display(), "skipping level: {e:#}"),
            }
        }
    }

    results
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("1 - Forest Edge", &[
            "                              ",
            "                              ",
            "                              ",
            "                              ",
            "          T           E       ",
            "       ######      #######    ",
            "                              ",
            "                              ",
            "  P            E         T    ",
            "##############################",
            "==============================",
        ]),
        make_embedded("2 - Twin Walls", &[
            "=                            =",
            "=                            =",
            "=        D          E        =",
            "=     #######    #######     =",
            "=                            =",
            "=  T                      D  =",
            "=  ####     ======     ####  =",
            "=                            =",
            "= P        E        D        =",
            "##############################",
            "==============================",
        ]),
        make_embedded("3 - Shaft", &[
            "=         =          =        =",
            "=   E     =    D     =    E   =",
            "=  ####   =  #####   =  ####  =",
            "=         =          =        =",
            "=         =    T     =        =",
            "=      ####  #####   ####     =",
            "=                             =",
            "=     D                  D    =",
            "=   #####   ======   #####    =",
            "=                             =",
            "= P       E       T       E   =",
            "===============================",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
    }
}
