/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into the `front` buffer (grid of `Cell`)
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Emit terminal commands only for cells that changed, batched
///      with `queue!` and flushed once
///   4. Swap front/back
///
/// The field is sampled onto the terminal grid through a `Viewport`.
/// A terminal cell is about twice as tall as it is wide, so one row
/// covers twice the world units of one column.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::boundary::{Boundary, Field};
use crate::domain::enemy::Enemy;
use crate::domain::geometry::{self, Point};
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every "empty" cell, never the
    /// terminal default, so row gaps match the cell colour.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any real cell; forces a full repaint when placed in `back`.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { Cell::BASE_BG } else { bg };
        Cell { ch, fg, bg }
    }
}

// ── Palette ──

const OPEN_BG: Color = Color::Rgb { r: 14, g: 30, b: 70 };
const CLAIMED_BG: Color = Color::Rgb { r: 90, g: 40, b: 110 };
const CLAIMED_FG: Color = Color::Rgb { r: 150, g: 90, b: 170 };
const OUTLINE_FG: Color = Color::Rgb { r: 230, g: 230, b: 240 };
const PATH_FG: Color = Color::Rgb { r: 255, g: 210, b: 60 };
const PLAYER_FG: Color = Color::Rgb { r: 80, g: 255, b: 120 };
const WANDERER_FG: Color = Color::Rgb { r: 255, g: 90, b: 220 };
const CHASER_FG: Color = Color::Rgb { r: 255, g: 80, b: 60 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const TITLE_FG: Color = Color::Rgb { r: 255, g: 200, b: 50 };

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

    /// Write `s` at (x, y), one column per char; the background of the
    /// existing cells is kept when `bg` is `Color::Reset`.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            let cx = x + i;
            if cx >= self.width { break; }
            let under = self.get(cx, y).bg;
            let bg = if bg == Color::Reset { under } else { bg };
            self.set(cx, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Viewport: world units ↔ terminal cells ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Viewport {
    field: Field,
    /// Screen position of the field's top-left cell.
    col0: usize,
    row0: usize,
    /// World units per column; a row is `2 * unit`.
    unit: i32,
    cols: usize,
    rows: usize,
}

impl Viewport {
    /// Largest scale at which `field` fits in `avail_cols x avail_rows`.
    fn fit(field: Field, col0: usize, row0: usize, avail_cols: usize, avail_rows: usize) -> Self {
        let avail_cols = avail_cols.max(2) as i32;
        let avail_rows = avail_rows.max(2) as i32;
        let by_w = ceil_div(field.width(), avail_cols - 1);
        let by_h = ceil_div(field.height(), 2 * (avail_rows - 1));
        let unit = by_w.max(by_h).max(1);
        Viewport {
            field,
            col0,
            row0,
            unit,
            cols: (field.width() / unit) as usize + 1,
            rows: (field.height() / (2 * unit)) as usize + 1,
        }
    }

    /// Cell containing world point `p`, if it is inside the field.
    fn to_screen(&self, p: Point) -> Option<(usize, usize)> {
        let f = &self.field;
        if p.x < f.min_x || p.x > f.max_x || p.y < f.min_y || p.y > f.max_y {
            return None;
        }
        let col = ((p.x - f.min_x + self.unit / 2) / self.unit) as usize;
        let row = ((p.y - f.min_y + self.unit) / (2 * self.unit)) as usize;
        Some((self.col0 + col.min(self.cols - 1), self.row0 + row.min(self.rows - 1)))
    }

    /// World point sampled for cell (col, row) of the field area.
    fn to_world(&self, col: usize, row: usize) -> Point {
        let f = &self.field;
        Point::new(
            (f.min_x + col as i32 * self.unit).min(f.max_x),
            (f.min_y + row as i32 * 2 * self.unit).min(f.max_y),
        )
    }
}

fn ceil_div(a: i32, b: i32) -> i32 {
    if b <= 0 { return a.max(1); }
    (a + b - 1) / b
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the map, message + gap + help below it.
const RESERVED_ROWS: usize = MAP_ROW + 4;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    /// Terminal reports key release events.
    pub keyboard_enhanced: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            keyboard_enhanced: false,
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
        self.keyboard_enhanced = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if self.keyboard_enhanced {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Clean slate on phase change
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

    fn compose(&mut self, world: &WorldState) {
        self.front.clear();
        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::Playing => self.compose_game(world),
            Phase::LevelComplete => {
                self.compose_game(world);
                self.compose_banner(
                    &format!("LEVEL {} CLEARED", world.current_level + 1),
                    "ENTER: next level   ESC: title",
                    PLAYER_FG,
                );
            }
            Phase::GameOver => {
                self.compose_game(world);
                self.compose_banner("GAME OVER", "ENTER / R: retry   ESC: title", CHASER_FG);
            }
            Phase::GameComplete => self.compose_game_complete(world),
        }
        if world.paused {
            self.compose_banner("PAUSED", "F1: resume   R: restart   ESC: title", TITLE_FG);
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        // (x, y) the cursor sits at after the last Print, if known
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
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
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ══════════════════════════════════════════════════════════════
    // Playfield
    // ══════════════════════════════════════════════════════════════

    fn viewport(&self, field: Field) -> Viewport {
        let avail_rows = self.front.height.saturating_sub(RESERVED_ROWS);
        let avail_cols = self.front.width.saturating_sub(2);
        let vp = Viewport::fit(field, 0, MAP_ROW, avail_cols, avail_rows);
        // center horizontally
        let col0 = self.front.width.saturating_sub(vp.cols) / 2;
        Viewport { col0, ..vp }
    }

    fn compose_game(&mut self, w: &WorldState) {
        let vp = self.viewport(w.territory.field);

        self.compose_hud(w);
        self.compose_territory(w, &vp);

        let outline = w.territory.current_boundary();
        self.trace_loop(&vp, outline, '█', OUTLINE_FG);
        if let Some(path) = w.incursion_path() {
            self.trace_path(&vp, path, '▒', PATH_FG);
        }
        self.compose_actors(w, &vp);

        let msg_row = vp.row0 + vp.rows + 1;
        if !w.message.is_empty() && msg_row < self.front.height {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(1, msg_row, &w.message, Color::Black, MSG_BG);
        }
        let help_row = vp.row0 + vp.rows + 3;
        if help_row < self.front.height {
            let help = " ←→↑↓/WASD: Move  SPACE: Incursion  F1: Pause  R: Restart  ESC: Title";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_hud(&mut self, w: &WorldState) {
        let hearts: String = "♥".repeat(w.player.lives as usize);
        let hud = format!(
            " Level {}/{}  {}  Lives {:<5}  Claimed {:>3}% / {}% ",
            w.current_level + 1,
            w.total_levels.max(1),
            w.level_name,
            hearts,
            w.territory.captured_percent(),
            w.rules.capture_target_percent,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    /// Fill: open interior inside the active outline, claimed colour for
    /// every cell inside a captured loop.
    fn compose_territory(&mut self, w: &WorldState, vp: &Viewport) {
        let open = w.territory.current_boundary();
        let captured = w.territory.captured_regions();
        for row in 0..vp.rows {
            for col in 0..vp.cols {
                let p = vp.to_world(col, row);
                let cell = if captured.iter().any(|c| c.contains(p)) && !strictly_inside(open, p) {
                    Cell::new('░', CLAIMED_FG, CLAIMED_BG)
                } else if open.contains(p) {
                    Cell::new(' ', Color::White, OPEN_BG)
                } else {
                    Cell::new('░', CLAIMED_FG, CLAIMED_BG)
                };
                self.front.set(vp.col0 + col, vp.row0 + row, cell);
            }
        }
    }

    fn trace_loop(&mut self, vp: &Viewport, outline: &Boundary, ch: char, fg: Color) {
        for seg in outline.edges() {
            self.trace_segment(vp, seg.a, seg.b, ch, fg);
        }
    }

    fn trace_path(&mut self, vp: &Viewport, path: &[Point], ch: char, fg: Color) {
        for pair in path.windows(2) {
            self.trace_segment(vp, pair[0], pair[1], ch, fg);
        }
        if let [only] = path {
            self.plot(vp, *only, ch, fg);
        }
    }

    /// Walk `a → b` at sub-cell resolution and stamp every cell touched.
    fn trace_segment(&mut self, vp: &Viewport, a: Point, b: Point, ch: char, fg: Color) {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let steps = (dx.abs().max(dy.abs()) / vp.unit.max(1)).max(1) * 2;
        for i in 0..=steps {
            let p = Point::new(a.x + dx * i / steps, a.y + dy * i / steps);
            self.plot(vp, p, ch, fg);
        }
    }

    fn plot(&mut self, vp: &Viewport, p: Point, ch: char, fg: Color) {
        if let Some((x, y)) = vp.to_screen(p) {
            let bg = self.front.get(x, y).bg;
            self.front.set(x, y, Cell::new(ch, fg, bg));
        }
    }

    fn compose_actors(&mut self, w: &WorldState, vp: &Viewport) {
        for e in &w.enemies {
            let (ch, fg) = match e {
                Enemy::Wanderer(_) => ('✶', WANDERER_FG),
                Enemy::Chaser(_) => ('●', CHASER_FG),
            };
            self.plot(vp, e.pos(), ch, fg);
        }
        // blink while invulnerable
        let visible = w.player.hit_cooldown == 0 || (w.tick / 4) % 2 == 0;
        if visible {
            self.plot(vp, w.player.pos(), '◆', PLAYER_FG);
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Screens and overlays
    // ══════════════════════════════════════════════════════════════

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r"   ___  _       _ _            ",
            r"  / _ \(_)_  __| (_)_ __   ___ ",
            r" | | | | \ \/ /| | | '_ \ / _ \",
            r" | |_| | |>  < | | | | | |  __/",
            r"  \__\_\_/_/\_\|_|_|_| |_|\___|",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(4, 2 + i, line, TITLE_FG, Color::Reset);
        }
        self.front.put_str(6, 8, "Claim the field. Dodge the hunters.", PLAYER_FG, Color::Reset);

        let info = format!("{} level(s)   target {}%", w.total_levels.max(1), w.rules.capture_target_percent);
        self.front.put_str(8, 10, "ENTER   New Game", PLAYER_FG, Color::Reset);
        self.front.put_str(8, 11, "ESC     Quit", Color::White, Color::Reset);
        self.front.put_str(8, 13, &info, Color::DarkGrey, Color::Reset);

        let help = [
            "Controls",
            "  ←→↑↓ / WASD   Move along the outline / draw",
            "  SPACE         Start an incursion",
            "  F1 Pause   R Restart   ESC Title",
        ];
        for (i, line) in help.iter().enumerate() {
            let fg = if i == 0 { TITLE_FG } else { Color::White };
            self.front.put_str(8, 15 + i, line, fg, Color::Reset);
        }
    }

    fn compose_game_complete(&mut self, w: &WorldState) {
        self.front.put_str(6, 4, "★  ALL LEVELS CLEARED  ★", TITLE_FG, Color::Reset);
        let levels = format!("{} level(s) claimed with {} live(s) to spare", w.total_levels, w.player.lives);
        self.front.put_str(6, 6, &levels, PLAYER_FG, Color::Reset);
        self.front.put_str(6, 8, "ENTER / ESC: Back to Title", Color::DarkGrey, Color::Reset);
    }

    /// Boxed two-line banner centred on the screen.
    fn compose_banner(&mut self, title: &str, hint: &str, fg: Color) {
        let inner = title.chars().count().max(hint.chars().count()) + 4;
        let x0 = self.front.width.saturating_sub(inner + 2) / 2;
        let y0 = self.front.height.saturating_sub(5) / 2;
        let bg = Color::Rgb { r: 30, g: 30, b: 30 };

        let bar = "─".repeat(inner);
        self.front.put_str(x0, y0, &format!("┌{bar}┐"), fg, bg);
        for (dy, text) in [(1, title), (2, ""), (3, hint)] {
            let pad = inner - text.chars().count();
            let line = format!("│{}{}{}│", " ".repeat(pad / 2), text, " ".repeat(pad - pad / 2));
            self.front.put_str(x0, y0 + dy, &line, fg, bg);
        }
        self.front.put_str(x0, y0 + 4, &format!("└{bar}┘"), fg, bg);
    }
}

/// Inside the outline and not on it.
fn strictly_inside(outline: &Boundary, p: Point) -> bool {
    outline.contains(p) && !outline.edges().any(|e| geometry::point_on_segment(p, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn field() -> Field {
        Field::new(200, 200, 400, 400)
    }

    #[test]
    fn viewport_fits_field() {
        let vp = Viewport::fit(field(), 0, 2, 78, 20);
        // 200 wide over 77 columns -> 3 units, 200 tall over 2*19 -> 6 units
        assert_eq!(vp.unit, 6);
        assert!(vp.cols <= 78);
        assert!(vp.rows <= 20);
        assert_eq!(vp.to_screen(Point::new(200, 200)), Some((0, 2)));
        assert_eq!(vp.to_screen(Point::new(400, 400)), Some((vp.cols - 1, 2 + vp.rows - 1)));
        assert_eq!(vp.to_screen(Point::new(199, 300)), None);
    }

    #[test]
    fn viewport_round_trips_cell_samples() {
        let vp = Viewport::fit(field(), 3, 2, 60, 30);
        for (col, row) in [(0, 0), (5, 7), (vp.cols - 1, vp.rows - 1)] {
            let p = vp.to_world(col, row);
            assert_eq!(vp.to_screen(p), Some((3 + col, 2 + row)));
        }
    }

    #[test]
    fn game_frame_shows_outline_player_and_hud() {
        let cfg = GameConfig::from_toml_str("").expect("defaults");
        let mut w = WorldState::new(&cfg);
        w.phase = Phase::Playing;

        let mut r = Renderer::new();
        r.front.resize(80, 30);
        r.compose(&w);

        let vp = r.viewport(w.territory.field);
        let (px, py) = vp.to_screen(w.player.pos()).expect("player on screen");
        assert_eq!(r.front.get(px, py).ch, '◆');

        let (cx, cy) = vp.to_screen(Point::new(200, 200)).expect("corner on screen");
        assert_eq!(r.front.get(cx, cy).ch, '█');

        let (ix, iy) = vp.to_screen(Point::new(250, 250)).expect("interior on screen");
        assert_eq!(r.front.get(ix, iy).bg, OPEN_BG);

        let hud: String = (0..r.front.width).map(|x| r.front.get(x, HUD_ROW).ch).collect();
        assert!(hud.contains("Lives ♥♥♥"));
        assert!(hud.contains("Claimed   0% / 75%"));
    }

    #[test]
    fn paused_frame_draws_banner() {
        let cfg = GameConfig::from_toml_str("").expect("defaults");
        let mut w = WorldState::new(&cfg);
        w.phase = Phase::Playing;
        w.paused = true;

        let mut r = Renderer::new();
        r.front.resize(80, 30);
        r.compose(&w);
        let screen: String = r.front.cells.iter().map(|c| c.ch).collect();
        assert!(screen.contains("PAUSED"));
    }
}
