/// Drawing primitives shared by the game rules and the terminal canvas.
///
/// Entities never know about terminals: they draw onto a `Surface` in
/// screen-space world pixels (world position minus camera offset). Sprites
/// are coarse; one sprite pixel spans `SPRITE_PX` world pixels on each axis.

use anyhow::{bail, Result};

use super::geom::{Rect, Vec2};

/// World pixels covered by one sprite pixel.
pub const SPRITE_PX: f32 = 4.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
    pub const GREEN: Rgb = Rgb(0, 255, 0);
    pub const BAR_BG: Rgb = Rgb(50, 50, 50);
    pub const BAR_BORDER: Rgb = Rgb(200, 200, 200);
}

/// Immutable pixel grid. `None` is transparent.
#[derive(Clone, PartialEq, Debug)]
pub struct Sprite {
    width: usize,
    height: usize,
    pixels: Vec<Option<Rgb>>,
}

impl Sprite {
    /// Build a sprite from ASCII rows. `.` and space are transparent; every
    /// other char must appear in `palette`.
    pub fn from_rows(rows: &[&str], palette: &[(char, Rgb)]) -> Result<Sprite> {
        if rows.is_empty() {
            bail!("sprite has no rows");
        }
        let width = rows[0].chars().count();
        if width == 0 {
            bail!("sprite rows are empty");
        }
        let mut pixels = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                bail!("sprite row {} is {} wide, expected {}", y, row.chars().count(), width);
            }
            for ch in row.chars() {
                let px = match ch {
                    '.' | ' ' => None,
                    _ => match palette.iter().find(|(c, _)| *c == ch) {
                        Some((_, rgb)) => Some(*rgb),
                        None => bail!("sprite row {} uses '{}' which is not in the palette", y, ch),
                    },
                };
                pixels.push(px);
            }
        }
        Ok(Sprite { width, height: rows.len(), pixels })
    }

    /// Single opaque pixel.
    pub fn dot(color: Rgb) -> Sprite {
        Sprite { width: 1, height: 1, pixels: vec![Some(color)] }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    /// Footprint in world pixels.
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.width as f32 * SPRITE_PX, self.height as f32 * SPRITE_PX)
    }

    /// Pixel at (x, y), reading right-to-left when `flip` is set.
    pub fn pixel(&self, x: usize, y: usize, flip: bool) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let sx = if flip { self.width - 1 - x } else { x };
        self.pixels[y * self.width + sx]
    }
}

/// Render target. Coordinates are screen-space world pixels.
pub trait Surface {
    /// Visible area in world pixels.
    fn size(&self) -> Vec2;
    fn blit(&mut self, sprite: &Sprite, pos: Vec2, flip: bool);
    fn fill_rect(&mut self, rect: Rect, color: Rgb);
    fn stroke_rect(&mut self, rect: Rect, color: Rgb);
    fn plot(&mut self, pos: Vec2, color: Rgb);
}

#[cfg(test)]
pub mod testing {
    //! Recording surface used by render tests across the crate.

    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    pub enum DrawCall {
        Blit { pos: Vec2, flip: bool, size: Vec2 },
        Fill { rect: Rect, color: Rgb },
        Stroke { rect: Rect, color: Rgb },
        Plot { pos: Vec2, color: Rgb },
    }

    pub struct Recorder {
        pub calls: Vec<DrawCall>,
        pub size: Vec2,
    }

    impl Recorder {
        pub fn new() -> Self {
            Recorder { calls: Vec::new(), size: Vec2::new(320.0, 240.0) }
        }

        pub fn blits(&self) -> Vec<(Vec2, bool)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    DrawCall::Blit { pos, flip, .. } => Some((*pos, *flip)),
                    _ => None,
                })
                .collect()
        }
    }

    impl Surface for Recorder {
        fn size(&self) -> Vec2 { self.size }
        fn blit(&mut self, sprite: &Sprite, pos: Vec2, flip: bool) {
            self.calls.push(DrawCall::Blit { pos, flip, size: sprite.world_size() });
        }
        fn fill_rect(&mut self, rect: Rect, color: Rgb) {
            self.calls.push(DrawCall::Fill { rect, color });
        }
        fn stroke_rect(&mut self, rect: Rect, color: Rgb) {
            self.calls.push(DrawCall::Stroke { rect, color });
        }
        fn plot(&mut self, pos: Vec2, color: Rgb) {
            self.calls.push(DrawCall::Plot { pos, color });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAL: &[(char, Rgb)] = &[('r', Rgb(255, 0, 0)), ('w', Rgb::WHITE)];

    #[test]
    fn parses_rows_with_transparency() {
        let s = Sprite::from_rows(&["r.", ".w"], PAL).unwrap();
        assert_eq!((s.width(), s.height()), (2, 2));
        assert_eq!(s.pixel(0, 0, false), Some(Rgb(255, 0, 0)));
        assert_eq!(s.pixel(1, 0, false), None);
        assert_eq!(s.world_size(), Vec2::new(8.0, 8.0));
    }

    #[test]
    fn flip_mirrors_columns() {
        let s = Sprite::from_rows(&["rw"], PAL).unwrap();
        assert_eq!(s.pixel(0, 0, true), Some(Rgb::WHITE));
        assert_eq!(s.pixel(1, 0, true), Some(Rgb(255, 0, 0)));
    }

    #[test]
    fn rejects_ragged_rows() {
        assert!(Sprite::from_rows(&["rr", "r"], PAL).is_err());
    }

    #[test]
    fn rejects_unknown_palette_char() {
        let err = Sprite::from_rows(&["rz"], PAL).unwrap_err();
        assert!(err.to_string().contains("'z'"));
    }

    #[test]
    fn out_of_bounds_is_transparent() {
        let s = Sprite::dot(Rgb::WHITE);
        assert_eq!(s.pixel(1, 0, false), None);
        assert_eq!(s.pixel(0, 0, false), Some(Rgb::WHITE));
    }
}
