/// Movement, blockade and scoring rules, truth-table driven.
///
/// Pure functions operating on a read-only map view, no side effects.
/// These encode "what is legal" and "what it is worth" without performing
/// the action; `sim::movement` and `sim::step` apply the verdicts.
///
/// ## Move Policy (destination tile of `tryMove`)
/// ┌───────────────────┬────────────────────┬──────────────────────────┐
/// │ Destination        │ Verdict            │ Side effect              │
/// ├───────────────────┼────────────────────┼──────────────────────────┤
/// │ Blockade           │ RecoverBlockade    │ tile → Empty, held += 1  │
/// │ Wall (or outside)  │ Refuse             │ stays Idle               │
/// │ Door, keys > 0     │ OpenDoor           │ tile → Empty, keys -= 1  │
/// │ Door, keys = 0     │ Refuse             │ stays Idle               │
/// │ anything else      │ Proceed            │                          │
/// └───────────────────┴────────────────────┴──────────────────────────┘
///
/// ## Blockade Placement
/// ┌──────────────────────────────┬─────────┐
/// │ Condition                     │ Place?  │
/// ├──────────────────────────────┼─────────┤
/// │ blockades held = 0            │ NO      │
/// │ cell behind is not Empty/Floor│ NO      │
/// │ otherwise                     │ YES     │
/// └──────────────────────────────┴─────────┘
/// "Behind" = rounded player cell minus the last committed direction.
///
/// ## Radiation (per tick)
/// ┌────────────────────┬──────────────────────┐
/// │ Carrying N > 0      │ += 0.05 × N          │
/// │ Not carrying        │ += 0.01              │
/// │ Deposit             │ −= 20, floored at 0  │
/// │ Death / level load  │ = 0                  │
/// │ ≥ 100               │ death                │
/// └────────────────────┴──────────────────────┘

use super::entity::MoveDir;
use super::tile::Tile;

pub const BLOCKADE_CAP: u32 = 3;
pub const RADIATION_LIMIT: f32 = 100.0;
pub const DEPOSIT_RELIEF: f32 = 20.0;
pub const KEY_SCORE: u32 = 50;
pub const DEPOSIT_SCORE: u32 = 100;
/// Material carried at death is delivered at half value.
pub const SALVAGE_SCORE: u32 = 50;
pub const LEVEL_CLEAR_BONUS: u32 = 1000;
/// Ticks between footstep signals while moving.
pub const STEP_SIGNAL_EVERY: u64 = 15;
/// Ticks between decorative trail emissions while moving.
pub const TRAIL_EMIT_EVERY: u64 = 5;

/// Immutable view of the tile map for rule queries.
pub struct MapView<'a> {
    pub tiles: &'a [Vec<Tile>],
    pub width: usize,
    pub height: usize,
}

impl<'a> MapView<'a> {
    pub fn tile_at(&self, col: i32, row: i32) -> Tile {
        if col < 0 || row < 0 || col as usize >= self.width || row as usize >= self.height {
            return Tile::Wall; // out of bounds = wall
        }
        self.tiles[row as usize][col as usize]
    }
}

/// Outcome of attempting to commit a move into a tile.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveVerdict {
    Proceed,
    Refuse,
    RecoverBlockade,
    OpenDoor,
}

impl MoveVerdict {
    pub fn proceeds(self) -> bool {
        self != MoveVerdict::Refuse
    }
}

/// Decide what happens when the player tries to enter `dest`. See table above.
pub fn move_verdict(dest: Tile, keys_held: u32) -> MoveVerdict {
    match dest {
        Tile::Blockade => MoveVerdict::RecoverBlockade,
        t if t.blocks_player() => MoveVerdict::Refuse,
        Tile::Door if keys_held > 0 => MoveVerdict::OpenDoor,
        Tile::Door => MoveVerdict::Refuse,
        _ => MoveVerdict::Proceed,
    }
}

/// The cell one step behind the player, opposite its last committed direction.
pub fn cell_behind(cell: (i32, i32), last_dir: MoveDir) -> (i32, i32) {
    let (dx, dy) = last_dir.delta();
    (cell.0 - dx, cell.1 - dy)
}

/// Where a blockade would go, if placement is legal right now.
pub fn blockade_target(
    map: &MapView, cell: (i32, i32), last_dir: MoveDir, blockades_held: u32,
) -> Option<(i32, i32)> {
    if blockades_held == 0 { return None; }
    let (c, r) = cell_behind(cell, last_dir);
    if map.tile_at(c, r).is_open() { Some((c, r)) } else { None }
}

/// Blockade count after standing on a station, or `None` if already full.
/// Refills to exactly the cap, never above it.
pub fn station_refill(held: u32) -> Option<u32> {
    if held < BLOCKADE_CAP { Some(BLOCKADE_CAP) } else { None }
}

/// Radiation gained this tick.
pub fn radiation_gain(carrying: bool, carrying_count: u32) -> f32 {
    if carrying {
        0.05 * carrying_count as f32
    } else {
        0.01
    }
}

/// Radiation left after a deposit.
pub fn radiation_after_deposit(radiation: f32) -> f32 {
    (radiation - DEPOSIT_RELIEF).max(0.0)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
