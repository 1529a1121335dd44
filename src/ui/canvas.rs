/// Pixel canvas: the terminal-side `Surface`.
///
/// The 320×240 world-pixel view is sampled at one canvas pixel per
/// `SPRITE_PX`×`SPRITE_PX` block, giving an 80×60 grid. The renderer packs
/// two canvas rows into one terminal cell with the upper-half-block glyph.

use crate::domain::draw::{Rgb, Sprite, Surface, SPRITE_PX};
use crate::domain::geom::{Rect, Vec2};

/// Canvas background; matches the renderer's terminal background.
pub const SKY: Rgb = Rgb(22, 22, 35);

pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

#[inline]
fn to_px(v: f32) -> i32 {
    (v / SPRITE_PX).floor() as i32
}

impl Canvas {
    /// Canvas covering `view` world pixels.
    pub fn new(view: Vec2) -> Self {
        let width = (view.x / SPRITE_PX).ceil() as usize;
        let height = (view.y / SPRITE_PX).ceil() as usize;
        Canvas { width, height, pixels: vec![SKY; width * height] }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    pub fn clear(&mut self) {
        self.pixels.fill(SKY);
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            SKY
        }
    }

    fn put(&mut self, x: i32, y: i32, color: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.pixels[y as usize * self.width + x as usize] = color;
        }
    }

    /// Paint everything farther than `radius` world pixels from `center`.
    pub fn mask_outside_circle(&mut self, center: Vec2, radius: f32, color: Rgb) {
        let r2 = radius * radius;
        for y in 0..self.height {
            for x in 0..self.width {
                // Sample at the pixel center.
                let dx = (x as f32 + 0.5) * SPRITE_PX - center.x;
                let dy = (y as f32 + 0.5) * SPRITE_PX - center.y;
                if dx * dx + dy * dy > r2 {
                    self.pixels[y * self.width + x] = color;
                }
            }
        }
    }
}

impl Surface for Canvas {
    fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32 * SPRITE_PX, self.height as f32 * SPRITE_PX)
    }

    fn blit(&mut self, sprite: &Sprite, pos: Vec2, flip: bool) {
        let ox = to_px(pos.x);
        let oy = to_px(pos.y);
        for sy in 0..sprite.height() {
            for sx in 0..sprite.width() {
                if let Some(c) = sprite.pixel(sx, sy, flip) {
                    self.put(ox + sx as i32, oy + sy as i32, c);
                }
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let (x0, y0) = (to_px(rect.left()), to_px(rect.top()));
        let x1 = (rect.right() / SPRITE_PX).ceil() as i32;
        let y1 = (rect.bottom() / SPRITE_PX).ceil() as i32;
        for y in y0..y1.max(y0 + 1) {
            for x in x0..x1.max(x0 + 1) {
                self.put(x, y, color);
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb) {
        let (x0, y0) = (to_px(rect.left()), to_px(rect.top()));
        let x1 = ((rect.right() / SPRITE_PX).ceil() as i32 - 1).max(x0);
        let y1 = ((rect.bottom() / SPRITE_PX).ceil() as i32 - 1).max(y0);
        for x in x0..=x1 {
            self.put(x, y0, color);
            self.put(x, y1, color);
        }
        for y in y0..=y1 {
            self.put(x0, y, color);
            self.put(x1, y, color);
        }
    }

    fn plot(&mut self, pos: Vec2, color: Rgb) {
        self.put(to_px(pos.x), to_px(pos.y), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb(255, 0, 0);

    fn canvas() -> Canvas {
        Canvas::new(Vec2::new(320.0, 240.0))
    }

    #[test]
    fn view_maps_to_80_by_60() {
        let c = canvas();
        assert_eq!((c.width(), c.height()), (80, 60));
        assert_eq!(c.size(), Vec2::new(320.0, 240.0));
    }

    #[test]
    fn blit_skips_transparent_and_flips() {
        let mut c = canvas();
        let s = Sprite::from_rows(&["r."], &[('r', RED)]).unwrap();
        c.blit(&s, Vec2::new(8.0, 4.0), false);
        assert_eq!(c.get(2, 1), RED);
        assert_eq!(c.get(3, 1), SKY);
        c.clear();
        c.blit(&s, Vec2::new(8.0, 4.0), true);
        assert_eq!(c.get(2, 1), SKY);
        assert_eq!(c.get(3, 1), RED);
    }

    #[test]
    fn offscreen_draws_are_clipped() {
        let mut c = canvas();
        let s = Sprite::from_rows(&["rr"], &[('r', RED)]).unwrap();
        c.blit(&s, Vec2::new(-4.0, -8.0), false);
        c.plot(Vec2::new(400.0, 10.0), RED);
        c.blit(&s, Vec2::new(316.0, 0.0), false);
        assert_eq!(c.get(79, 0), RED);
        assert_eq!(c.get(0, 0), SKY);
    }

    #[test]
    fn negative_positions_floor() {
        let mut c = canvas();
        c.plot(Vec2::new(-1.0, 3.0), RED);
        // -1 / 4 floors to -1, off the canvas
        assert_eq!(c.get(0, 0), SKY);
        c.plot(Vec2::new(7.9, 3.0), RED);
        assert_eq!(c.get(1, 0), RED);
    }

    #[test]
    fn fill_and_stroke_cover_partial_pixels() {
        let mut c = canvas();
        c.fill_rect(Rect::new(0.0, 0.0, 6.0, 2.0), RED);
        assert_eq!(c.get(0, 0), RED);
        assert_eq!(c.get(1, 0), RED);
        assert_eq!(c.get(2, 0), SKY);

        c.clear();
        c.stroke_rect(Rect::new(0.0, 0.0, 16.0, 16.0), RED);
        assert_eq!(c.get(0, 0), RED);
        assert_eq!(c.get(3, 3), RED);
        assert_eq!(c.get(1, 1), SKY);
    }

    #[test]
    fn iris_mask_keeps_center() {
        let mut c = canvas();
        c.mask_outside_circle(Vec2::new(160.0, 120.0), 20.0, Rgb::BLACK);
        assert_eq!(c.get(40, 30), SKY);
        assert_eq!(c.get(0, 0), Rgb::BLACK);
        c.clear();
        c.mask_outside_circle(Vec2::new(160.0, 120.0), 0.0, Rgb::BLACK);
        assert_eq!(c.get(40, 30), Rgb::BLACK);
    }
}
