/// Player movement: the grid-locked Idle/Moving state machine.
///
///   Idle ──tryMove ok──▶ Moving(dir) ──4px/tick──▶ snap to cell
///    ▲                                               │
///    └────── no direction held ◀── tile effects ◀────┘
///                                      │ direction held
///                                      └──▶ tryMove (same tick)
///
/// One commit moves exactly one tile. While Idle the player always sits
/// at `cell × 32 + 4`.

use crate::domain::entity::{cell_to_player_pos, MoveDir, MoveState, PLAYER_SPEED, TILE_SIZE};
use crate::domain::rules::{self, MoveVerdict};
use crate::domain::tile::Tile;
use super::event::GameEvent;
use super::world::WorldState;

/// Try to commit a one-tile move. Applies the destination's side effects
/// (blockade recovery, door opening) when the move proceeds.
pub fn try_move(world: &mut WorldState, dir: MoveDir, events: &mut Vec<GameEvent>) -> bool {
    let (col, row) = world.player.grid_cell();
    let (dx, dy) = dir.delta();
    let (c, r) = (col + dx, row + dy);

    match rules::move_verdict(world.tile_at(c, r), world.keys_held) {
        MoveVerdict::Refuse => return false,
        MoveVerdict::RecoverBlockade => {
            world.set_tile(c, r, Tile::Empty);
            world.blockades_held += 1;
            events.push(GameEvent::BlockadeRecovered { x: c, y: r });
        }
        MoveVerdict::OpenDoor => {
            world.set_tile(c, r, Tile::Empty);
            world.keys_held -= 1;
            events.push(GameEvent::DoorOpened { x: c, y: r });
        }
        MoveVerdict::Proceed => {}
    }

    let p = &mut world.player;
    p.state = MoveState::Moving(dir);
    p.last_dir = dir;
    p.dist_moved = 0.0;
    true
}

/// Edge-triggered placement one tile behind the player.
pub fn place_blockade(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let cell = world.player.grid_cell();
    let target = rules::blockade_target(
        &world.map(), cell, world.player.last_dir, world.blockades_held,
    );
    if let Some((c, r)) = target {
        world.set_tile(c, r, Tile::Blockade);
        world.blockades_held -= 1;
        events.push(GameEvent::BlockadePlaced { x: c, y: r });
    }
}

/// Advance the player one tick.
pub fn resolve_player_movement(
    world: &mut WorldState, intent: Option<MoveDir>, events: &mut Vec<GameEvent>,
) {
    let dir = match world.player.state {
        MoveState::Idle => {
            if let Some(d) = intent {
                try_move(world, d, events);
            }
            return;
        }
        MoveState::Moving(d) => d,
    };

    let (dx, dy) = dir.delta();
    let p = &mut world.player;
    p.x += dx as f32 * PLAYER_SPEED;
    p.y += dy as f32 * PLAYER_SPEED;
    p.dist_moved += PLAYER_SPEED;

    if world.tick % rules::STEP_SIGNAL_EVERY == 0 {
        events.push(GameEvent::Step);
    }
    if world.tick % rules::TRAIL_EMIT_EVERY == 0 {
        let p = &world.player;
        events.push(GameEvent::TrailEmitted { x: p.x + 16.0, y: p.y + 16.0 });
    }

    if world.player.dist_moved >= TILE_SIZE {
        arrive(world, events);
        if let Some(d) = intent {
            try_move(world, d, events);
        }
    }
}

/// Snap onto the destination cell and fire its one-shot effects.
fn arrive(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let (col, row) = world.player.grid_cell();
    world.player.push_trail((col, row));

    if world.tile_at(col, row) == Tile::Grass {
        world.set_tile(col, row, Tile::Empty);
        events.push(GameEvent::GrassCleared { x: col, y: row });
    }
    if world.tile_at(col, row) == Tile::BlockadeStation {
        if let Some(n) = rules::station_refill(world.blockades_held) {
            world.blockades_held = n;
            events.push(GameEvent::BlockadeRefilled);
        }
    }

    let (x, y) = cell_to_player_pos(col, row);
    let p = &mut world.player;
    p.x = x;
    p.y = y;
    p.state = MoveState::Idle;
    p.dist_moved = 0.0;
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
