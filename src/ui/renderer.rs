/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into the `front` buffer
///   2. Compare each cell with `back` (the previous frame)
///   3. Emit terminal commands only for cells that changed, batched with `queue!`
///   4. Swap front/back
///
/// One level tile is drawn as 2 terminal columns × 1 row. The world camera
/// works in logical pixels, so each frame the renderer sizes the camera's
/// viewport from the terminal (`cols / 2 × 32` by `map rows × 32`).
///
/// The renderer only reads the world (apart from that viewport update).
/// Tick events it is handed leave short-lived cell flashes behind.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{CollectibleKind, EnemyKind, TILE_SIZE};
use crate::domain::tile::Tile;
use crate::sim::editor::EditorGrid;
use crate::sim::event::GameEvent;
use crate::sim::world::{Hud, Mode, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every "empty" cell, so the terminal
    /// default never shows through between rows.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 20, b: 16 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { Cell::BASE_BG } else { bg };
        Cell { ch, fg, bg }
    }
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

    /// One char per column; clipped at the right edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    fn put_pair(&mut self, col: usize, row: usize, g: Glyph) {
        self.set(col, row, Cell::new(g.0, g.2, g.3));
        self.set(col + 1, row, Cell::new(g.1, g.2, g.3));
    }
}

// ── Glyphs ──

/// Two characters plus colours for one tile.
type Glyph = (char, char, Color, Color);

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD, gap, message row and help row.
const RESERVED_ROWS: usize = MAP_ROW + 3;

/// Above this dose the HUD flashes a warning.
const HIGH_RADIATION: f32 = 90.0;

const HUD_BG: Color = Color::Rgb { r: 30, g: 40, b: 20 };
const ACCENT: Color = Color::Rgb { r: 120, g: 255, b: 80 };
const WARN: Color = Color::Rgb { r: 255, g: 60, b: 40 };

fn tile_glyph(tile: Tile, laser_on: bool) -> Glyph {
    match tile {
        Tile::Empty | Tile::Key | Tile::Plutonium => (' ', ' ', Color::Reset, Color::Reset),
        Tile::Floor => ('░', '░', Color::Rgb { r: 60, g: 64, b: 56 }, Color::Reset),
        Tile::Wall => ('█', '█', Color::Rgb { r: 110, g: 115, b: 105 }, Color::Rgb { r: 70, g: 72, b: 66 }),
        Tile::Door => ('▐', '▌', Color::Rgb { r: 200, g: 140, b: 60 }, Color::Rgb { r: 80, g: 50, b: 20 }),
        Tile::Container => ('[', ']', ACCENT, Color::Rgb { r: 20, g: 70, b: 20 }),
        Tile::Grass => ('"', '"', Color::Rgb { r: 70, g: 170, b: 60 }, Color::Reset),
        Tile::Laser if laser_on => ('≡', '≡', Color::Rgb { r: 255, g: 230, b: 230 }, Color::Rgb { r: 200, g: 20, b: 20 }),
        Tile::Laser => ('-', '-', Color::Rgb { r: 110, g: 30, b: 30 }, Color::Reset),
        Tile::BlockadeStation => ('B', 'S', Color::Rgb { r: 80, g: 220, b: 255 }, Color::Rgb { r: 20, g: 50, b: 70 }),
        Tile::Blockade => ('▓', '▓', Color::Rgb { r: 240, g: 200, b: 40 }, Color::Rgb { r: 90, g: 70, b: 10 }),
        Tile::Start => ('<', '>', Color::Rgb { r: 70, g: 90, b: 140 }, Color::Reset),
    }
}

fn enemy_glyph(kind: EnemyKind) -> Glyph {
    match kind {
        EnemyKind::Robot => ('◘', '◘', Color::Rgb { r: 230, g: 80, b: 230 }, Color::Reset),
        EnemyKind::Alien => ('∩', '∩', Color::Rgb { r: 160, g: 255, b: 120 }, Color::Reset),
        EnemyKind::Mine => ('*', '*', WARN, Color::Reset),
    }
}

fn collectible_glyph(kind: CollectibleKind) -> Glyph {
    match kind {
        CollectibleKind::Plutonium => ('◊', '◊', ACCENT, Color::Rgb { r: 20, g: 50, b: 20 }),
        CollectibleKind::Key => ('o', '-', Color::Rgb { r: 255, g: 220, b: 60 }, Color::Reset),
    }
}

/// Editor palette code → the glyph the same cell will have in play.
fn editor_glyph(code: &str) -> Glyph {
    match code {
        "1" => tile_glyph(Tile::Wall, false),
        "2" => tile_glyph(Tile::Floor, false),
        "3" => tile_glyph(Tile::Laser, true),
        "4" => tile_glyph(Tile::Door, false),
        "5" => collectible_glyph(CollectibleKind::Key),
        "6" => collectible_glyph(CollectibleKind::Plutonium),
        "7" => tile_glyph(Tile::Container, false),
        "9" => ('S', 'S', Color::Rgb { r: 120, g: 160, b: 255 }, Color::Reset),
        "11" => tile_glyph(Tile::Grass, false),
        "12" => tile_glyph(Tile::BlockadeStation, false),
        "R" => enemy_glyph(EnemyKind::Robot),
        "A" => enemy_glyph(EnemyKind::Alien),
        "M" => enemy_glyph(EnemyKind::Mine),
        _ => ('·', ' ', Color::Rgb { r: 50, g: 55, b: 45 }, Color::Reset),
    }
}

/// Cell under the centre of a 32px body at (x, y).
fn body_cell(x: f32, y: f32) -> (i32, i32) {
    (((x + 16.0) / TILE_SIZE).floor() as i32, ((y + 16.0) / TILE_SIZE).floor() as i32)
}

/// `[#####.....]` with `width` slots.
fn radiation_bar(radiation: f32, width: usize) -> String {
    let filled = ((radiation.clamp(0.0, 100.0) / 100.0) * width as f32).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

fn hud_line(hud: &Hud, level: usize, name: &str) -> String {
    format!(
        " ZONE {} {}  SCORE {:<6}  PU {}/{}  LIVES {}  RAD {} {:>3.0}%  KEYS {}  BLOCKS {}",
        level + 1, name, hud.score, hud.collected, hud.total, hud.lives,
        radiation_bar(hud.radiation, 10), hud.radiation, hud.keys, hud.blockades,
    )
}

/// First visible grid index so that `cursor` stays on screen.
fn scroll_origin(cursor: usize, size: usize, view: usize) -> usize {
    if size <= view { return 0; }
    cursor.saturating_sub(view / 2).min(size - view)
}

// ── Transient effects ──

/// How long a cell flash stays up, in world-clock ms.
const FLASH_MS: u64 = 250;

#[derive(Clone, Copy, PartialEq, Debug)]
struct Flash {
    cell: (i32, i32),
    glyph: Glyph,
    until_ms: u64,
}

/// The flash a tick event leaves on its cell, if any.
fn flash_for(event: &GameEvent, now_ms: u64) -> Option<Flash> {
    let (cell, glyph) = match *event {
        GameEvent::GrassCleared { x, y } => ((x, y), (',', '\'', Color::Rgb { r: 70, g: 170, b: 60 }, Color::Reset)),
        GameEvent::DoorOpened { x, y } => ((x, y), ('░', '░', Color::Rgb { r: 200, g: 140, b: 60 }, Color::Reset)),
        GameEvent::BlockadePlaced { x, y } => ((x, y), ('▓', '▓', Color::White, Color::Rgb { r: 90, g: 70, b: 10 })),
        GameEvent::BlockadeRecovered { x, y } => ((x, y), ('+', '+', Color::Rgb { r: 240, g: 200, b: 40 }, Color::Reset)),
        GameEvent::TrailEmitted { x, y } => {
            let cell = ((x / TILE_SIZE).floor() as i32, (y / TILE_SIZE).floor() as i32);
            (cell, ('°', ' ', ACCENT, Color::Reset))
        }
        _ => return None,
    };
    Some(Flash { cell, glyph, until_ms: now_ms + FLASH_MS })
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_mode: Option<Mode>,
    flashes: Vec<Flash>,
    /// Terminal reports key releases.
    keyboard_enhanced: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_mode: None,
            flashes: Vec::new(),
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

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.keyboard_enhanced = true;
        }
        log::debug!("keyboard enhancement: {}", self.keyboard_enhanced);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    /// Can input trust Release events?
    pub fn keyboard_enhanced(&self) -> bool {
        self.keyboard_enhanced
    }

    /// Pick up the cell effects of one tick's events.
    pub fn note_events(&mut self, events: &[GameEvent], now_ms: u64) {
        self.flashes.extend(events.iter().filter_map(|e| flash_for(e, now_ms)));
    }

    fn expire_flashes(&mut self, now_ms: u64) {
        self.flashes.retain(|f| f.until_ms > now_ms);
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Terminal size drives the logical viewport
        world.camera.view_w = (self.term_w / CELL_W).max(1) as f32 * TILE_SIZE;
        world.camera.view_h = self.term_h.saturating_sub(RESERVED_ROWS).max(1) as f32 * TILE_SIZE;

        if self.last_mode != Some(world.mode) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_mode = Some(world.mode);
            self.flashes.clear();
        }

        self.front.clear();
        match world.mode {
            Mode::Menu => self.compose_menu(world),
            Mode::Editor => self.compose_editor(&world.editor),
            Mode::LevelIntro | Mode::Playing => self.compose_game(world),
            Mode::GameOver => self.compose_game_over(world),
            Mode::Win => self.compose_win(world),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

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

    // ── Compose: playing ──

    fn compose_game(&mut self, w: &WorldState) {
        let hud = w.hud();
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud_line(&hud, w.level_index, &w.level_name), Color::White, HUD_BG);

        let view_cols = self.term_w / CELL_W;
        let view_rows = self.term_h.saturating_sub(RESERVED_ROWS);
        let cam_c = (w.camera.x / TILE_SIZE).floor() as i32;
        let cam_r = (w.camera.y / TILE_SIZE).floor() as i32;
        let on_screen = |(c, r): (i32, i32)| -> Option<(usize, usize)> {
            let (vx, vy) = (c - cam_c, r - cam_r);
            if vx < 0 || vy < 0 || vx as usize >= view_cols || vy as usize >= view_rows {
                return None;
            }
            Some((vx as usize * CELL_W, MAP_ROW + vy as usize))
        };

        // Tiles
        for vy in 0..view_rows.min(w.height) {
            for vx in 0..view_cols.min(w.width) {
                let (c, r) = (cam_c + vx as i32, cam_r + vy as i32);
                if c as usize >= w.width || r as usize >= w.height { continue; }
                self.front.put_pair(vx * CELL_W, MAP_ROW + vy, tile_glyph(w.tile_at(c, r), w.laser_on));
            }
        }

        // Trail, fading toward the oldest cell
        let n = w.player.trail.len().max(1);
        for (i, &cell) in w.player.trail.iter().enumerate() {
            if let Some((col, row)) = on_screen(cell) {
                let base = self.front.get(col, row);
                if base.ch != ' ' { continue; }
                let shade = 40 + (60 * (i + 1) / n) as u8;
                let fg = Color::Rgb { r: shade / 2, g: shade, b: shade / 2 };
                self.front.put_pair(col, row, ('·', ' ', fg, Color::Reset));
            }
        }

        self.expire_flashes(w.clock_ms);
        for i in 0..self.flashes.len() {
            let f = self.flashes[i];
            if let Some((col, row)) = on_screen(f.cell) {
                self.front.put_pair(col, row, f.glyph);
            }
        }

        for item in w.collectibles.iter().filter(|c| c.active) {
            if let Some((col, row)) = on_screen(body_cell(item.x, item.y)) {
                self.front.put_pair(col, row, collectible_glyph(item.kind));
            }
        }
        for e in &w.enemies {
            if let Some((col, row)) = on_screen(body_cell(e.x, e.y)) {
                self.front.put_pair(col, row, enemy_glyph(e.kind));
            }
        }
        if let Some((col, row)) = on_screen(w.player.center_cell()) {
            let fg = if w.player.carrying { ACCENT } else { Color::Rgb { r: 255, g: 240, b: 120 } };
            self.front.put_pair(col, row, ('◖', '◗', fg, Color::Reset));
        }

        let msg_row = MAP_ROW + view_rows;
        if w.revealing() {
            self.compose_banner(&format!("ZONE {}: {}", w.level_index + 1, w.level_name), view_cols, view_rows);
        } else if w.advancing() {
            self.compose_banner("ZONE CLEARED", view_cols, view_rows);
        } else if hud.radiation > HIGH_RADIATION {
            let blink = (w.clock_ms / 250) % 2 == 0;
            if blink {
                self.front.fill_row(msg_row, WARN);
                self.front.put_str(1, msg_row, "!! RADIATION CRITICAL: DEPOSIT NOW !!", Color::White, WARN);
            }
        } else if w.player.carrying {
            let msg = format!(" carrying {} unit(s) of plutonium", w.player.carrying_count);
            self.front.put_str(0, msg_row, &msg, ACCENT, Color::Reset);
        }

        let help = " WASD/Arrows: Move   Q/Space: Blockade   Esc: Menu";
        self.front.put_str(0, msg_row + 1, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_banner(&mut self, text: &str, view_cols: usize, view_rows: usize) {
        let inner = format!("  {text}  ");
        let width = inner.chars().count() + 2;
        let x = (view_cols * CELL_W).saturating_sub(width) / 2;
        let y = MAP_ROW + view_rows.saturating_sub(3) / 2;
        let bg = Color::Rgb { r: 10, g: 30, b: 10 };
        let bar = "═".repeat(width - 2);
        self.front.put_str(x, y, &format!("╔{bar}╗"), ACCENT, bg);
        self.front.put_str(x, y + 1, &format!("║{inner}║"), ACCENT, bg);
        self.front.put_str(x, y + 2, &format!("╚{bar}╝"), ACCENT, bg);
    }

    // ── Compose: editor ──

    fn compose_editor(&mut self, g: &EditorGrid) {
        let status = format!(
            " EDITOR  {}x{}  cursor ({},{})  tool: {}",
            g.width, g.height, g.cursor.0, g.cursor.1, g.tool_label(),
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &status, Color::White, HUD_BG);

        let view_cols = self.term_w / CELL_W;
        let view_rows = self.term_h.saturating_sub(RESERVED_ROWS);
        let ox = scroll_origin(g.cursor.0, g.width, view_cols);
        let oy = scroll_origin(g.cursor.1, g.height, view_rows);

        for vy in 0..view_rows.min(g.height - oy) {
            for vx in 0..view_cols.min(g.width - ox) {
                let (x, y) = (ox + vx, oy + vy);
                let mut glyph = editor_glyph(&g.cells[y][x]);
                if (x, y) == g.cursor {
                    glyph.3 = Color::Rgb { r: 90, g: 90, b: 30 };
                }
                self.front.put_pair(vx * CELL_W, MAP_ROW + vy, glyph);
            }
        }

        let help_row = MAP_ROW + view_rows;
        self.front.put_str(
            0, help_row,
            " Arrows: Move  [ ] or 0-9: Tool  Space/Enter: Paint  T: Test  Esc: Menu",
            Color::DarkGrey, Color::Reset,
        );
    }

    // ── Static screens ──

    fn compose_menu(&mut self, w: &WorldState) {
        let title = [
            r" _______  _____  _   _  ______ __   __",
            r"|___  / / ___ \| \ | ||  ____|\ \ / /",
            r"   / / | |   | |  \| || |__    \ V / ",
            r"  / /  | |   | | . ` ||  __|    > <  ",
            r" / /__ | |___| | |\  || |____  / . \ ",
            r"/_____| \_____/|_| \_||______|/_/ \_\",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(4, 2 + i, line, ACCENT, Color::Reset);
        }
        self.front.put_str(6, 9, "radioactive salvage", Color::Rgb { r: 180, g: 200, b: 120 }, Color::Reset);

        let levels = format!("{} zone(s) loaded", w.level_count());
        self.front.put_str(8, 12, "ENTER   Start", Color::White, Color::Reset);
        self.front.put_str(8, 13, "  E     Level Editor", Color::White, Color::Reset);
        self.front.put_str(8, 14, "  Q     Quit", Color::White, Color::Reset);
        self.front.put_str(8, 16, &levels, Color::DarkGrey, Color::Reset);

        let help = [
            "Carry plutonium to the containers.",
            "Carrying raises your dose; depositing lowers it.",
            "Lasers pulse on and off. Doors need keys.",
        ];
        for (i, line) in help.iter().enumerate() {
            self.front.put_str(8, 18 + i, line, Color::Rgb { r: 150, g: 150, b: 140 }, Color::Reset);
        }
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        self.front.put_str(6, 4, "╔══════════════════════════╗", WARN, Color::Reset);
        self.front.put_str(6, 5, "║  CONTAMINATED: GAME OVER ║", WARN, Color::Reset);
        self.front.put_str(6, 6, "╚══════════════════════════╝", WARN, Color::Reset);
        self.front.put_str(8, 9, &format!("Final score: {}", w.score), Color::White, Color::Reset);
        self.front.put_str(8, 10, &format!("Reached zone {}", w.level_index + 1), Color::White, Color::Reset);
        self.front.put_str(8, 12, "ENTER: Play again   Esc: Menu", ACCENT, Color::Reset);
    }

    fn compose_win(&mut self, w: &WorldState) {
        self.front.put_str(6, 4, "╔══════════════════════════╗", ACCENT, Color::Reset);
        self.front.put_str(6, 5, "║    ALL ZONES SECURED     ║", ACCENT, Color::Reset);
        self.front.put_str(6, 6, "╚══════════════════════════╝", ACCENT, Color::Reset);
        self.front.put_str(8, 9, &format!("Final score: {}", w.score), Color::White, Color::Reset);
        self.front.put_str(8, 12, "ENTER: Play again   Esc: Menu", ACCENT, Color::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lasers_are_lit_only_in_the_on_phase() {
        assert_ne!(tile_glyph(Tile::Laser, true), tile_glyph(Tile::Laser, false));
        assert_eq!(tile_glyph(Tile::Wall, true), tile_glyph(Tile::Wall, false));
    }

    #[test]
    fn radiation_bar_is_clamped() {
        assert_eq!(radiation_bar(0.0, 4), "[....]");
        assert_eq!(radiation_bar(50.0, 4), "[##..]");
        assert_eq!(radiation_bar(250.0, 4), "[####]");
        assert_eq!(radiation_bar(-5.0, 4), "[....]");
    }

    #[test]
    fn hud_shows_progress() {
        let hud = Hud { score: 1200, collected: 3, total: 7, lives: 2, radiation: 41.0, keys: 1, blockades: 3 };
        let line = hud_line(&hud, 0, "Zone 1-1");
        assert!(line.contains("ZONE 1 Zone 1-1"));
        assert!(line.contains("PU 3/7"));
        assert!(line.contains("LIVES 2"));
        assert!(line.contains(" 41%"));
    }

    #[test]
    fn scroll_keeps_cursor_visible() {
        assert_eq!(scroll_origin(5, 10, 20), 0);
        assert_eq!(scroll_origin(5, 40, 10), 0);
        assert_eq!(scroll_origin(20, 40, 10), 15);
        assert_eq!(scroll_origin(39, 40, 10), 30);
    }

    #[test]
    fn entities_map_to_the_cell_under_their_centre() {
        assert_eq!(body_cell(64.0, 32.0), (2, 1));
        assert_eq!(body_cell(79.0, 32.0), (2, 1));
        assert_eq!(body_cell(80.0, 32.0), (3, 1));
    }

    #[test]
    fn cell_events_leave_a_flash() {
        let f = flash_for(&GameEvent::DoorOpened { x: 3, y: 4 }, 100).unwrap();
        assert_eq!((f.cell, f.until_ms), ((3, 4), 350));
        let trail = flash_for(&GameEvent::TrailEmitted { x: 84.0, y: 52.0 }, 0).unwrap();
        assert_eq!(trail.cell, (2, 1));
        assert!(flash_for(&GameEvent::KeyPickup, 0).is_none());
        assert!(flash_for(&GameEvent::Deposit { count: 2 }, 0).is_none());
    }

    #[test]
    fn flashes_expire_with_the_world_clock() {
        let mut r = Renderer::new();
        r.note_events(&[
            GameEvent::Step,
            GameEvent::GrassCleared { x: 1, y: 1 },
            GameEvent::BlockadePlaced { x: 2, y: 1 },
        ], 1000);
        assert_eq!(r.flashes.len(), 2);
        r.expire_flashes(1249);
        assert_eq!(r.flashes.len(), 2);
        r.expire_flashes(1250);
        assert!(r.flashes.is_empty());
    }

    #[test]
    fn frame_buffer_clips_writes() {
        let mut fb = FrameBuffer::new(4, 2);
        fb.put_str(2, 0, "abcdef", Color::White, Color::Reset);
        assert_eq!(fb.get(3, 0).ch, 'b');
        fb.set(10, 10, Cell::INVALID);
        assert_eq!(fb.get(10, 10), Cell::BLANK);
    }
}
