/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. The play field is drawn onto an 80×60 pixel `Canvas`
///   2. Canvas rows are packed in pairs into `front` cells with '▀'
///      (foreground = upper pixel, background = lower pixel)
///   3. Text screens and the HUD are written straight into `front`
///   4. Only cells that differ from `back` (previous frame) are emitted,
///      batched with `queue!` and flushed once
///   5. Swap front/back
///
/// Terminal layout, centered horizontally:
///
///   row 0        HUD
///   rows 1..=30  play field (80 columns)
///   row 31       message bar
///   row 32       help bar

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::draw::{Rgb, SPRITE_PX};
use crate::domain::geom::Vec2;
use crate::sim::world::{Phase, WorldState, DISPLAY_H, DISPLAY_W};
use crate::ui::canvas::Canvas;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every "empty" cell, so the gaps between
    /// terminal rows match the cells and no horizontal lines show.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer. Never produced by a
    /// compose pass, so every position is diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    /// `Color::Reset` becomes `BASE_BG`; cells never use the terminal default.
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
    }

    /// Two stacked canvas pixels.
    fn half_block(top: Rgb, bottom: Rgb) -> Self {
        Cell { ch: '▀', fg: color(top), bg: color(bottom) }
    }
}

#[inline]
fn color(c: Rgb) -> Color {
    Color::Rgb { r: c.0, g: c.1, b: c.2 }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    /// Write a string keeping each cell's background; the glyph's
    /// foreground takes over. Used for text floating over the play field.
    fn overlay_str(&mut self, x: i32, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            let cx = x + i as i32;
            if cx < 0 {
                continue;
            }
            let cx = cx as usize;
            if cx >= self.width {
                break;
            }
            let under = self.get(cx, y);
            // A half block shows two colors; text sits on the lower one.
            self.set(cx, y, Cell { ch, fg, bg: under.bg });
        }
    }

    fn fill_row(&mut self, x: usize, y: usize, w: usize, bg: Color) {
        for cx in x..x + w {
            self.set(cx, y, Cell::from_char(' ', Color::White, bg));
        }
    }
}

// ── Layout ──

/// Terminal columns/rows covered by the play field.
const VIEW_COLS: usize = (DISPLAY_W / SPRITE_PX) as usize;
const VIEW_ROWS: usize = (DISPLAY_H / SPRITE_PX) as usize / 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;
const MSG_ROW: usize = MAP_ROW + VIEW_ROWS;
const HELP_ROW: usize = MSG_ROW + 1;

/// Iris radius shrinks this many world pixels per transition frame.
const IRIS_STEP: f32 = 8.0;
const IRIS_MAX: f32 = 300.0;

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const RED: Color = Color::Rgb { r: 255, g: 60, b: 60 };
const PAUSE_BG: Color = Color::Rgb { r: 40, g: 40, b: 40 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    canvas: Canvas,
    /// Screenshake jitter; kept apart from the world RNG so drawing never
    /// changes the simulation.
    shake_rng: StdRng,
    /// Frames drawn, drives blinking outside of play.
    frame: u64,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(32768, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            canvas: Canvas::new(Vec2::new(DISPLAY_W, DISPLAY_H)),
            shake_rng: StdRng::from_entropy(),
            frame: 0,
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.compose(world);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Build the whole next frame into `front`.
    fn compose(&mut self, world: &WorldState) {
        self.frame = self.frame.wrapping_add(1);
        self.front.clear();

        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::Playing => self.compose_game(world),
            Phase::GameOver => self.compose_game_over(world),
            Phase::GameComplete => self.compose_game_complete(world),
        }

        if world.paused {
            self.compose_pause_overlay();
        }
    }

    /// First column of the 80-column layout.
    fn left(&self) -> usize {
        self.front.width.saturating_sub(VIEW_COLS) / 2
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal
        // default, which may differ from BASE_BG.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        let left = self.left();
        let offset = w.camera.offset();

        // ── Play field ──
        let shake = w.fx.screenshake as f32;
        let jitter = if shake > 0.0 {
            Vec2::new(
                self.shake_rng.gen::<f32>() * shake - shake / 2.0,
                self.shake_rng.gen::<f32>() * shake - shake / 2.0,
            )
        } else {
            Vec2::ZERO
        };

        self.canvas.clear();
        w.render(&mut self.canvas, offset + jitter);

        if w.transition != 0 {
            let radius = (IRIS_MAX - w.transition.unsigned_abs() as f32 * IRIS_STEP).max(0.0);
            self.canvas.mask_outside_circle(
                Vec2::new(DISPLAY_W / 2.0, DISPLAY_H / 2.0),
                radius,
                Rgb::BLACK,
            );
        }

        for row in 0..self.canvas.height() / 2 {
            for col in 0..self.canvas.width() {
                let top = self.canvas.get(col, row * 2);
                let bottom = self.canvas.get(col, row * 2 + 1);
                self.front.set(left + col, MAP_ROW + row, Cell::half_block(top, bottom));
            }
        }

        // ── Score popups ──
        for popup in &w.score.popups {
            let screen = popup.pos - offset;
            let row = (screen.y / SPRITE_PX / 2.0).floor();
            if row < 0.0 || row as usize >= VIEW_ROWS {
                continue;
            }
            let col = (screen.x / SPRITE_PX).floor() as i32 - popup.text.len() as i32 / 2;
            self.front.overlay_str(left as i32 + col, MAP_ROW + row as usize, &popup.text, color(popup.color));
        }

        // ── HUD row ──
        self.front.fill_row(left, HUD_ROW, VIEW_COLS, HUD_BG);
        let hud = format!(
            " Score:{:<7} High:{:<7} Level {}/{}",
            w.score.total,
            w.high_score.0,
            w.level_number(),
            w.total_levels(),
        );
        self.front.put_str(left, HUD_ROW, &hud, Color::White, HUD_BG);
        if w.score.combo_count > 1 {
            let combo = format!("COMBO x{}! ", w.score.combo_count);
            let x = left + VIEW_COLS.saturating_sub(combo.len());
            self.front.put_str(x, HUD_ROW, &combo, GOLD, HUD_BG);
        }

        // ── Message bar ──
        if !w.message.is_empty() {
            let msg = format!(" ◈ {} ", w.message);
            self.front.fill_row(left, MSG_ROW, VIEW_COLS, MSG_BG);
            self.front.put_str(left, MSG_ROW, &msg, Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help = " ←→/AD:Run  ↑/W/Space:Jump  X/K:Dash  F1:Pause  Esc:Quit";
        self.front.put_str(left, HELP_ROW, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_title(&mut self, w: &WorldState) {
        let left = self.left();
        let title = [
            r" _  _  _         _         ___            _    ",
            r"| \| |(_) _ _   (_) __ _  |   \  __ _  __| |_  ",
            r"| .` || || ' \  | |/ _` | | |) |/ _` |(_-<| ' \ ",
            r"|_|\_||_||_||_|_/ |\__,_| |___/ \__,_|/__/|_||_|",
            r"              |__/                             ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(left + 4, 2 + i, line, GOLD, Color::Reset);
        }

        let blink = (self.frame / 30) % 2 == 0;
        if blink {
            self.front.put_str(left + 18, 9, "▸ Press ENTER to start ◂", GREEN, Color::Reset);
        }

        let best = format!("High Score: {}  (level {})", w.high_score.0, w.high_score.1);
        self.front.put_str(left + 18, 11, &best, Color::White, Color::Reset);
        let levels = format!("{} levels loaded", w.total_levels());
        self.front.put_str(left + 18, 12, &levels, Color::DarkGrey, Color::Reset);

        let help = [
            "Controls",
            "  ←→ / A D        Run",
            "  ↑ / W / Space   Jump, again in the air to double jump",
            "  X / K           Dash through enemies",
            "  F1 Pause        Esc Quit",
        ];
        for (i, line) in help.iter().enumerate() {
            let fg = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(left + 8, 15 + i, line, fg, Color::Reset);
        }
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let left = self.left();
        let box_art = [
            "╔══════════════════════════════╗",
            "║         GAME   OVER          ║",
            "╚══════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(left + 24, 3 + i, l, RED, Color::Reset);
        }

        let score = format!("◈ Score: {}", w.score.total);
        let level = format!("◈ Level: {}", w.level_number());
        self.front.put_str(left + 26, 7, &score, Color::White, Color::Reset);
        self.front.put_str(left + 26, 8, &level, Color::White, Color::Reset);

        if w.new_high_score {
            self.front.put_str(left + 26, 10, "★ NEW HIGH SCORE! ★", GOLD, Color::Reset);
        }

        self.front.put_str(left + 26, 12, "TOP SCORES", GOLD, Color::Reset);
        let current = (w.score.total, w.level_number());
        let mut marked = false;
        for (i, r) in w.top_scores.iter().enumerate() {
            let line = format!("{}. {:>7}  level {:<3} {}", i + 1, r.score, r.level, r.achieved_at.format("%Y-%m-%d"));
            // Only the first matching record is this run.
            let is_current = !marked && (r.score, r.level) == current;
            marked |= is_current;
            let fg = if is_current { GREEN } else { Color::White };
            self.front.put_str(left + 26, 13 + i, &line, fg, Color::Reset);
        }

        self.front.put_str(left + 26, 18, "▸ Press ENTER to continue", GREEN, Color::Reset);
        self.front.put_str(left + 26, 19, "▸ ESC: Quit", Color::DarkGrey, Color::Reset);
    }

    fn compose_game_complete(&mut self, w: &WorldState) {
        let left = self.left();
        let box_art = [
            "╔══════════════════════════════════╗",
            "║   ★ ALL LEVELS CLEARED!  ★       ║",
            "╚══════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(left + 22, 3 + i, l, GOLD, Color::Reset);
        }
        let score = format!("◈ Final Score: {}", w.score.total);
        let levels = format!("◈ All {} levels cleared", w.total_levels());
        self.front.put_str(left + 24, 8, &score, Color::White, Color::Reset);
        self.front.put_str(left + 24, 9, &levels, GREEN, Color::Reset);
        self.front.put_str(left + 24, 11, "▸ ENTER: Back to Title", GREEN, Color::Reset);
    }

    fn compose_pause_overlay(&mut self) {
        let left = self.left();
        let (box_w, box_h) = (30, 7);
        let x = left + (VIEW_COLS - box_w) / 2;
        let y = MAP_ROW + (VIEW_ROWS - box_h) / 2;
        for row in y..y + box_h {
            self.front.fill_row(x, row, box_w, PAUSE_BG);
        }

        let blink = (self.frame / 8) % 2 == 0;
        let label = if blink { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        self.front.put_str(x + 9, y + 1, label, GOLD, PAUSE_BG);
        self.front.put_str(x + 4, y + 3, "F1   Resume", Color::Rgb { r: 100, g: 200, b: 255 }, PAUSE_BG);
        self.front.put_str(x + 4, y + 4, "ESC  Quit", Color::Rgb { r: 100, g: 200, b: 255 }, PAUSE_BG);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::highscore::ScoreRecord;
    use crate::sim::world::testing::world_from;

    fn renderer() -> Renderer {
        let mut r = Renderer::new();
        r.resize(100, 40);
        r
    }

    fn row_text(r: &Renderer, y: usize) -> String {
        (0..r.front.width).map(|x| r.front.get(x, y).ch).collect()
    }

    fn screen_text(r: &Renderer) -> String {
        (0..r.front.height).map(|y| row_text(r, y)).collect::<Vec<_>>().join("\n")
    }

    fn arena() -> WorldState {
        world_from(&[
            "          ",
            "  P    E  ",
            "##########",
        ])
    }

    #[test]
    fn play_field_is_half_blocks() {
        let mut w = arena();
        w.transition = 0;
        let mut r = renderer();
        r.compose(&w);
        let left = r.left();
        assert_eq!(left, 10);
        for row in MAP_ROW..MAP_ROW + VIEW_ROWS {
            assert_eq!(r.front.get(left, row).ch, '▀');
            assert_eq!(r.front.get(left + VIEW_COLS - 1, row).ch, '▀');
        }
        assert_eq!(r.front.get(left - 1, MAP_ROW).ch, ' ');
    }

    #[test]
    fn hud_shows_score_and_combo() {
        let mut w = arena();
        w.score.total = 250;
        w.high_score = (900, 2);
        w.score.combo_count = 1;
        let mut r = renderer();
        r.compose(&w);
        let hud = row_text(&r, HUD_ROW);
        assert!(hud.contains("Score:250"));
        assert!(hud.contains("High:900"));
        assert!(!hud.contains("COMBO"));

        w.score.combo_count = 3;
        r.compose(&w);
        assert!(row_text(&r, HUD_ROW).contains("COMBO x3!"));
    }

    #[test]
    fn iris_masks_outside_the_circle() {
        let mut w = arena();
        w.transition = -30;
        let mut r = renderer();
        r.compose(&w);
        let black = color(Rgb::BLACK);
        let corner = r.front.get(r.left(), MAP_ROW);
        assert_eq!((corner.fg, corner.bg), (black, black));
        let center = r.front.get(r.left() + VIEW_COLS / 2, MAP_ROW + VIEW_ROWS / 2);
        assert_ne!(center.bg, black);

        w.transition = 0;
        r.compose(&w);
        assert_ne!(r.front.get(r.left(), MAP_ROW).bg, black);
    }

    #[test]
    fn popups_float_over_the_field() {
        let mut w = arena();
        w.score.add_score(100, crate::domain::score::ScoreKind::Enemy, 0, Vec2::new(160.0, 120.0));
        w.camera.scroll = Vec2::ZERO;
        let mut r = renderer();
        r.compose(&w);
        assert!(screen_text(&r).contains("+100"));
    }

    #[test]
    fn game_over_lists_top_scores() {
        let mut w = arena();
        w.phase = Phase::GameOver;
        w.score.total = 300;
        w.new_high_score = true;
        w.top_scores = vec![
            ScoreRecord { score: 300, level: 1, achieved_at: chrono::Local::now() },
            ScoreRecord { score: 120, level: 2, achieved_at: chrono::Local::now() },
        ];
        let mut r = renderer();
        r.compose(&w);
        let text = screen_text(&r);
        assert!(text.contains("GAME   OVER"));
        assert!(text.contains("NEW HIGH SCORE!"));
        assert!(text.contains("TOP SCORES"));
        assert!(text.contains("Press ENTER to continue"));

        let first = (0..r.front.height).find(|&y| row_text(&r, y).contains("1.     300")).unwrap();
        let second = (0..r.front.height).find(|&y| row_text(&r, y).contains("2.     120")).unwrap();
        let fg_at = |y: usize| {
            let x = row_text(&r, y).chars().position(|c| c == '.').unwrap();
            r.front.get(x, y).fg
        };
        assert_eq!(fg_at(first), GREEN);
        assert_eq!(fg_at(second), Color::White);
    }

    #[test]
    fn pause_overlay_drawn_on_top() {
        let mut w = arena();
        w.paused = true;
        let mut r = renderer();
        r.compose(&w);
        assert!(screen_text(&r).contains("PAUSED"));
    }

    #[test]
    fn small_terminal_clips_without_panic() {
        let w = arena();
        let mut r = Renderer::new();
        r.resize(20, 5);
        r.compose(&w);
        assert_eq!(r.left(), 0);
    }
}
