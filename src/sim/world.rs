/// WorldState: the complete snapshot of a running game.
///
/// ## Tile Grid
///
/// `tiles` is the live grid for the current level, rebuilt wholesale on
/// every level load. All reads go through `tile_at()` (out of bounds reads
/// as `Wall`) and all writes through `set_tile()` (out of bounds is a no-op).
///
/// ## Camera / Viewport
///
/// The camera is in logical pixels:
///   - target = player centred in the viewport, clamped to the level
///   - each tick the camera closes 10% of the remaining distance
///   - levels smaller than the viewport pin the camera at 0
///
/// ## Scheduled Events
///
/// Delayed transitions (level reveal, level advance) are one-shot events
/// with a due time on the world clock. `flow::process_scheduled` fires them
/// at the top of each tick. Nothing ever cancels a pending event.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::{GameConfig, TimingConfig, ViewportConfig};
use crate::domain::entity::{Collectible, Enemy, Player, TILE_SIZE};
use crate::domain::rules::MapView;
use crate::domain::tile::Tile;
use super::editor::EditorGrid;
use super::level::LevelDef;

/// Top-level game mode. `Editor` never runs the simulation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Menu,
    Editor,
    /// Level decoded, banner up. Becomes `Playing` when `RevealLevel` fires.
    LevelIntro,
    Playing,
    GameOver,
    Win,
}

impl Mode {
    /// Does the tick loop run (clock, scheduled events, camera)?
    pub fn is_running(self) -> bool {
        matches!(self, Mode::LevelIntro | Mode::Playing)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScheduledKind {
    /// Level banner ends; the level becomes playable.
    RevealLevel,
    /// Level complete; load the next level (or return to the editor).
    AdvanceLevel,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScheduledEvent {
    pub due_ms: u64,
    pub kind: ScheduledKind,
}

/// Camera: top-left corner of the viewport in logical pixels.
#[derive(Clone, Debug)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub view_w: f32,
    pub view_h: f32,
}

/// Fraction of the remaining distance closed per tick.
const CAMERA_EASE: f32 = 0.1;

impl Camera {
    pub fn new(viewport: ViewportConfig) -> Self {
        Camera { x: 0.0, y: 0.0, view_w: viewport.width_px, view_h: viewport.height_px }
    }

    /// Where the camera wants to be for a player at `(px, py)`.
    pub fn target(&self, px: f32, py: f32, world_w: f32, world_h: f32) -> (f32, f32) {
        let tx = (px - self.view_w / 2.0).min(world_w - self.view_w).max(0.0);
        let ty = (py - self.view_h / 2.0).min(world_h - self.view_h).max(0.0);
        (tx, ty)
    }

    /// Ease toward the target. First-order lag: never overshoots.
    pub fn follow(&mut self, px: f32, py: f32, world_w: f32, world_h: f32) {
        let (tx, ty) = self.target(px, py, world_w, world_h);
        self.x += (tx - self.x) * CAMERA_EASE;
        self.y += (ty - self.y) * CAMERA_EASE;
    }
}

/// Read-only HUD projection, polled once per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hud {
    pub score: u32,
    pub collected: u32,
    pub total: u32,
    pub lives: u32,
    pub radiation: f32,
    pub keys: u32,
    pub blockades: u32,
}

/// Continuously sampled tuple for the Geiger ambience.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ambience {
    pub radiation: f32,
    pub carrying_count: u32,
    pub carrying: bool,
}

pub struct WorldState {
    // ── Tile grid ──
    pub tiles: Vec<Vec<Tile>>,
    pub width: usize,
    pub height: usize,

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub collectibles: Vec<Collectible>,
    /// Respawn cell (last `S` in the level).
    pub start_cell: (i32, i32),

    // ── Level progress ──
    pub plutonium_total: u32,
    pub plutonium_collected: u32,
    pub keys_held: u32,
    pub blockades_held: u32,
    pub radiation: f32,
    pub score: u32,
    pub lives: u32,

    // ── Meta ──
    pub mode: Mode,
    pub level_index: usize,
    pub level_name: String,
    pub levels: Vec<LevelDef>,
    /// Set while playing a level straight from the editor.
    pub test_level: Option<LevelDef>,
    /// Simulation ticks since the level was loaded.
    pub tick: u64,
    /// World clock, advanced by each tick's frame time.
    pub clock_ms: u64,

    // ── Hazard ──
    pub laser_timer_ms: u64,
    pub laser_on: bool,

    // ── Scheduling ──
    pub pending: Vec<ScheduledEvent>,

    // ── Config ──
    pub timing: TimingConfig,
    pub starting_lives: u32,

    pub camera: Camera,
    pub editor: EditorGrid,
    pub rng: Pcg32,
    /// Enemy ids keep counting across loads so every spawn is fresh.
    pub next_enemy_id: usize,
}

// ── Tile query / mutation API ──

impl WorldState {
    /// Tile at (col, row). Out of bounds = wall.
    #[inline]
    pub fn tile_at(&self, col: i32, row: i32) -> Tile {
        self.map().tile_at(col, row)
    }

    /// Set a tile. Writes outside the grid are ignored.
    #[inline]
    pub fn set_tile(&mut self, col: i32, row: i32, tile: Tile) {
        if col >= 0 && row >= 0 && (col as usize) < self.width && (row as usize) < self.height {
            self.tiles[row as usize][col as usize] = tile;
        }
    }

    /// Read-only view for the pure rule functions.
    pub fn map(&self) -> MapView<'_> {
        MapView { tiles: &self.tiles, width: self.width, height: self.height }
    }

    pub fn world_px(&self) -> (f32, f32) {
        (self.width as f32 * TILE_SIZE, self.height as f32 * TILE_SIZE)
    }
}

// ── Projections ──

impl WorldState {
    pub fn hud(&self) -> Hud {
        Hud {
            score: self.score,
            collected: self.plutonium_collected,
            total: self.plutonium_total,
            lives: self.lives,
            radiation: self.radiation,
            keys: self.keys_held,
            blockades: self.blockades_held,
        }
    }

    pub fn ambience(&self) -> Ambience {
        Ambience {
            radiation: self.radiation,
            carrying_count: self.player.carrying_count,
            carrying: self.player.carrying,
        }
    }

    /// A pending transition freezes movement, interactions and enemies.
    pub fn is_frozen(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Is the level banner up (reveal pending)?
    pub fn revealing(&self) -> bool {
        self.mode == Mode::LevelIntro
    }

    pub fn advancing(&self) -> bool {
        self.pending.iter().any(|e| e.kind == ScheduledKind::AdvanceLevel)
    }

    pub fn schedule(&mut self, kind: ScheduledKind, delay_ms: u64) {
        self.pending.push(ScheduledEvent { due_ms: self.clock_ms + delay_ms, kind });
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

// ── Construction ──

impl WorldState {
    pub fn new(config: &GameConfig, levels: Vec<LevelDef>, seed: u64) -> Self {
        WorldState {
            tiles: vec![],
            width: 0,
            height: 0,
            player: Player::new(0.0, 0.0),
            enemies: vec![],
            collectibles: vec![],
            start_cell: (0, 0),
            plutonium_total: 0,
            plutonium_collected: 0,
            keys_held: 0,
            blockades_held: 0,
            radiation: 0.0,
            score: 0,
            lives: config.gameplay.starting_lives,
            mode: Mode::Menu,
            level_index: 0,
            level_name: String::new(),
            levels,
            test_level: None,
            tick: 0,
            clock_ms: 0,
            laser_timer_ms: 0,
            laser_on: false,
            pending: vec![],
            timing: config.timing.clone(),
            starting_lives: config.gameplay.starting_lives,
            camera: Camera::new(config.viewport),
            editor: EditorGrid::default(),
            rng: Pcg32::seed_from_u64(seed),
            next_enemy_id: 0,
        }
    }
}
