/// Tile types and the tilemap query surface.
/// Tile properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use super::assets::{AssetTable, Prop};
use super::draw::Surface;
use super::geom::{Rect, Vec2};

/// Edge length of one tile in world pixels.
pub const TILE_SIZE: f32 = 16.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Grass,
    Stone,
}

impl Tile {
    /// Does this tile take part in collision?
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Grass | Tile::Stone)
    }

    fn prop(self) -> Option<Prop> {
        match self {
            Tile::Empty => None,
            Tile::Grass => Some(Prop::Grass),
            Tile::Stone => Some(Prop::Stone),
        }
    }
}

/// What actors need to know about the level geometry.
pub trait TileQuery {
    /// Is the tile under this world point solid?
    fn solid_check(&self, point: Vec2) -> bool;
    /// Solid tile rects in the 3x3 cell neighbourhood of `pos`.
    fn physics_rects_around(&self, pos: Vec2) -> Vec<Rect>;
}

const NEIGHBOR_OFFSETS: [(i32, i32); 9] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0), (0, 0), (1, 0),
    (-1, 1), (0, 1), (1, 1),
];

/// Grid of tiles. Cells outside the grid read as empty, so an actor that
/// leaves the map simply falls.
#[derive(Clone, Debug)]
pub struct Tilemap {
    tiles: Vec<Vec<Tile>>,
    width: usize,
    height: usize,
}

impl Tilemap {
    pub fn new(tiles: Vec<Vec<Tile>>) -> Self {
        let height = tiles.len();
        let width = tiles.iter().map(|r| r.len()).max().unwrap_or(0);
        Tilemap { tiles, width, height }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    pub fn get(&self, x: i32, y: i32) -> Tile {
        if x < 0 || y < 0 {
            return Tile::Empty;
        }
        self.tiles
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or_default()
    }

    fn cell_of(point: Vec2) -> (i32, i32) {
        ((point.x / TILE_SIZE).floor() as i32, (point.y / TILE_SIZE).floor() as i32)
    }

    fn cell_rect(x: i32, y: i32) -> Rect {
        Rect::new(x as f32 * TILE_SIZE, y as f32 * TILE_SIZE, TILE_SIZE, TILE_SIZE)
    }

    /// Draw the tiles that intersect the view.
    pub fn render(&self, surface: &mut dyn Surface, assets: &AssetTable, offset: Vec2) {
        let view = surface.size();
        let (x0, y0) = Self::cell_of(offset);
        let (x1, y1) = Self::cell_of(offset + view);
        for y in y0..=y1 {
            for x in x0..=x1 {
                if let Some(prop) = self.get(x, y).prop() {
                    let origin = Vec2::new(x as f32 * TILE_SIZE, y as f32 * TILE_SIZE);
                    surface.blit(assets.prop(prop), origin - offset, false);
                }
            }
        }
    }
}

impl TileQuery for Tilemap {
    fn solid_check(&self, point: Vec2) -> bool {
        let (x, y) = Self::cell_of(point);
        self.get(x, y).is_solid()
    }

    fn physics_rects_around(&self, pos: Vec2) -> Vec<Rect> {
        let (cx, cy) = Self::cell_of(pos);
        NEIGHBOR_OFFSETS
            .iter()
            .map(|(dx, dy)| (cx + dx, cy + dy))
            .filter(|&(x, y)| self.get(x, y).is_solid())
            .map(|(x, y)| Self::cell_rect(x, y))
            .collect()
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Build a tilemap from ASCII rows. `#` grass, `=` stone, anything else empty.
    pub fn tiles_from(rows: &[&str]) -> Tilemap {
        Tilemap::new(
            rows.iter()
                .map(|r| {
                    r.chars()
                        .map(|c| match c {
                            '#' => Tile::Grass,
                            '=' => Tile::Stone,
                            _ => Tile::Empty,
                        })
                        .collect()
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::tiles_from;
    use super::*;
    use crate::domain::draw::testing::Recorder;

    #[test]
    fn solid_check_uses_floor_division() {
        let map = tiles_from(&["  ", " #"]);
        assert!(map.solid_check(Vec2::new(16.0, 16.0)));
        assert!(map.solid_check(Vec2::new(31.9, 31.9)));
        assert!(!map.solid_check(Vec2::new(15.9, 16.0)));
        assert!(!map.solid_check(Vec2::new(-0.5, 20.0)));
    }

    #[test]
    fn out_of_bounds_is_empty() {
        let map = tiles_from(&["#"]);
        assert_eq!(map.get(5, 0), Tile::Empty);
        assert_eq!(map.get(0, -1), Tile::Empty);
        assert!(!map.solid_check(Vec2::new(0.0, 100.0)));
    }

    #[test]
    fn rects_around_only_neighbourhood() {
        let map = tiles_from(&[
            "#   #",
            "     ",
            " =#  ",
        ]);
        // pos in cell (1, 1): neighbourhood is x 0..=2, y 0..=2
        let rects = map.physics_rects_around(Vec2::new(20.0, 20.0));
        assert_eq!(rects.len(), 3);
        assert!(rects.contains(&Rect::new(0.0, 0.0, 16.0, 16.0)));
        assert!(rects.contains(&Rect::new(16.0, 32.0, 16.0, 16.0)));
        assert!(rects.contains(&Rect::new(32.0, 32.0, 16.0, 16.0)));
    }

    #[test]
    fn render_culls_to_view() {
        let assets = AssetTable::builtin().unwrap();
        let map = tiles_from(&["#".repeat(100).as_str()]);
        let mut rec = Recorder::new();
        map.render(&mut rec, &assets, Vec2::new(0.0, 0.0));
        // 320 px view spans cells 0..=20
        assert_eq!(rec.blits().len(), 21);
        assert_eq!(rec.blits()[1].0, Vec2::new(16.0, 0.0));
    }

    #[test]
    fn render_applies_offset() {
        let assets = AssetTable::builtin().unwrap();
        let map = tiles_from(&[" #"]);
        let mut rec = Recorder::new();
        map.render(&mut rec, &assets, Vec2::new(10.0, -5.0));
        assert_eq!(rec.blits(), vec![(Vec2::new(6.0, 5.0), false)]);
    }
}
