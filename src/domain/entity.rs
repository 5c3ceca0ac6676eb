/// Entities: Player, Enemy, Collectible (as entities, not tile mutation).
/// Positions are in logical pixels; one tile is `TILE_SIZE` pixels.

use std::collections::VecDeque;

/// Logical pixel size of one grid cell.
pub const TILE_SIZE: f32 = 32.0;
/// The player sits this many pixels inside its cell's origin.
pub const CELL_INSET: f32 = 4.0;
/// Player slide speed in pixels per tick while Moving.
pub const PLAYER_SPEED: f32 = 4.0;
/// Player, collectible and enemy bodies are all this wide and tall.
pub const BODY_SIZE: f32 = 32.0;
/// Visited cells remembered for the trail effect.
pub const TRAIL_LEN: usize = 10;

/// Movement direction (continuous while key held).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDir {
    /// Grid delta `(dx, dy)` for one step in this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
        }
    }
}

/// Frame input: separates movement from blockade placement so both can fire in one tick.
/// Movement = continuous (held key), placement = edge-triggered (fresh press).
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: Option<MoveDir>,
    pub place_blockade: bool,
}

/// Axis-aligned box. Overlap is strict: touching edges do not collide.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

/// Canonical pixel position of the player standing in cell `(col, row)`.
pub fn cell_to_player_pos(col: i32, row: i32) -> (f32, f32) {
    (col as f32 * TILE_SIZE + CELL_INSET, row as f32 * TILE_SIZE + CELL_INSET)
}

/// Player movement state machine.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveState {
    Idle,
    /// Committed to sliding one tile in this direction.
    Moving(MoveDir),
}

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub carrying: bool,
    pub carrying_count: u32,
    pub state: MoveState,
    /// Last committed direction; blockades go one tile behind it.
    pub last_dir: MoveDir,
    /// Pixels travelled since the current commit.
    pub dist_moved: f32,
    /// Most recent visited cells, oldest first.
    pub trail: VecDeque<(i32, i32)>,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player {
            x, y,
            carrying: false,
            carrying_count: 0,
            state: MoveState::Idle,
            last_dir: MoveDir::Right,
            dist_moved: 0.0,
            trail: VecDeque::with_capacity(TRAIL_LEN + 1),
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.state, MoveState::Moving(_))
    }

    pub fn body(&self) -> Rect {
        Rect::new(self.x, self.y, BODY_SIZE, BODY_SIZE)
    }

    /// Cell the player is anchored to: its position rounded to the grid.
    pub fn grid_cell(&self) -> (i32, i32) {
        (
            ((self.x - CELL_INSET) / TILE_SIZE).round() as i32,
            ((self.y - CELL_INSET) / TILE_SIZE).round() as i32,
        )
    }

    /// Cell under the centre of the player's body.
    pub fn center_cell(&self) -> (i32, i32) {
        (
            ((self.x + BODY_SIZE / 2.0) / TILE_SIZE).floor() as i32,
            ((self.y + BODY_SIZE / 2.0) / TILE_SIZE).floor() as i32,
        )
    }

    pub fn push_trail(&mut self, cell: (i32, i32)) {
        self.trail.push_back(cell);
        while self.trail.len() > TRAIL_LEN {
            self.trail.pop_front();
        }
    }

    /// Drop carried material. Returns how much was carried.
    pub fn take_carried(&mut self) -> u32 {
        let n = self.carrying_count;
        self.carrying_count = 0;
        self.carrying = false;
        n
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyKind {
    Robot,
    Alien,
    Mine,
}

impl EnemyKind {
    /// Nominal speed as declared by the level format.
    pub fn nominal_speed(self) -> f32 {
        match self {
            EnemyKind::Robot => 2.0,
            EnemyKind::Alien => 3.0,
            EnemyKind::Mine => 0.0,
        }
    }

    /// Aliens drift at half their nominal speed.
    pub fn speed_modifier(self) -> f32 {
        match self {
            EnemyKind::Alien => 0.5,
            _ => 1.0,
        }
    }

    /// Axis an enemy of this kind starts patrolling on.
    pub fn initial_axis(self) -> Option<Axis> {
        match self {
            EnemyKind::Robot => Some(Axis::X),
            EnemyKind::Alien => Some(Axis::Y),
            EnemyKind::Mine => None,
        }
    }

    /// `(inset, size)` of the lethal box inside the 32px body.
    /// Mines need tighter proximity than mobile enemies.
    fn contact_inset(self) -> (f32, f32) {
        match self {
            EnemyKind::Mine => (8.0, 16.0),
            _ => (4.0, 24.0),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn swapped(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: usize,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    /// `None` for mines, which never move.
    pub axis: Option<Axis>,
    /// -1, +1, or 0 for mines.
    pub dir: i32,
    pub speed: f32,
}

impl Enemy {
    pub fn new(id: usize, kind: EnemyKind, x: f32, y: f32) -> Self {
        Enemy {
            id, kind, x, y,
            axis: kind.initial_axis(),
            dir: if kind == EnemyKind::Mine { 0 } else { 1 },
            speed: kind.nominal_speed(),
        }
    }

    pub fn is_mobile(&self) -> bool {
        self.kind != EnemyKind::Mine
    }

    /// Effective displacement per tick along the current axis.
    pub fn step_len(&self) -> f32 {
        self.speed * self.kind.speed_modifier()
    }

    /// The shrunk box that kills the player on overlap.
    pub fn contact_box(&self) -> Rect {
        let (inset, size) = self.kind.contact_inset();
        Rect::new(self.x + inset, self.y + inset, size, size)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CollectibleKind {
    Key,
    Plutonium,
}

/// A pickup with its own active flag. Deactivated on pickup, never removed.
#[derive(Clone, Debug)]
pub struct Collectible {
    pub kind: CollectibleKind,
    pub x: f32,
    pub y: f32,
    pub active: bool,
}

impl Collectible {
    pub fn new(kind: CollectibleKind, x: f32, y: f32) -> Self {
        Collectible { kind, x, y, active: true }
    }

    pub fn body(&self) -> Rect {
        Rect::new(self.x, self.y, BODY_SIZE, BODY_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 32.0, 32.0);
        assert!(a.overlaps(&Rect::new(31.0, 31.0, 32.0, 32.0)));
        assert!(!a.overlaps(&Rect::new(32.0, 0.0, 32.0, 32.0))); // touching edge
        assert!(!a.overlaps(&Rect::new(0.0, 32.0, 32.0, 32.0)));
    }

    #[test]
    fn player_cells_round_and_floor() {
        let mut p = Player::new(36.0, 68.0); // cell (1, 2)
        assert_eq!(p.grid_cell(), (1, 2));
        assert_eq!(p.center_cell(), (1, 2));
        p.x += 16.0; // halfway to (2, 2)
        assert_eq!(p.grid_cell(), (2, 2)); // 1.5 rounds away from zero
        assert_eq!(p.center_cell(), (2, 2));
    }

    #[test]
    fn trail_keeps_last_ten() {
        let mut p = Player::new(4.0, 4.0);
        for i in 0..15 {
            p.push_trail((i, 0));
        }
        assert_eq!(p.trail.len(), TRAIL_LEN);
        assert_eq!(p.trail.front(), Some(&(5, 0)));
        assert_eq!(p.trail.back(), Some(&(14, 0)));
    }

    #[test]
    fn enemy_kinds_have_expected_motion() {
        let r = Enemy::new(0, EnemyKind::Robot, 0.0, 0.0);
        let a = Enemy::new(1, EnemyKind::Alien, 0.0, 0.0);
        let m = Enemy::new(2, EnemyKind::Mine, 0.0, 0.0);
        assert_eq!((r.axis, r.dir, r.step_len()), (Some(Axis::X), 1, 2.0));
        assert_eq!((a.axis, a.dir, a.step_len()), (Some(Axis::Y), 1, 1.5));
        assert_eq!((m.axis, m.dir, m.step_len()), (None, 0, 0.0));
        assert!(!m.is_mobile());
    }

    #[test]
    fn mine_contact_box_is_tighter() {
        let r = Enemy::new(0, EnemyKind::Robot, 100.0, 100.0);
        let m = Enemy::new(1, EnemyKind::Mine, 100.0, 100.0);
        // A player body grazing the enemy's corner region
        let p = Rect::new(100.0 - 26.0, 100.0, 32.0, 32.0);
        assert!(p.overlaps(&r.contact_box()));
        assert!(!p.overlaps(&m.contact_box()));
    }

    #[test]
    fn take_carried_empties_the_hands() {
        let mut p = Player::new(4.0, 4.0);
        p.carrying = true;
        p.carrying_count = 4;
        assert_eq!(p.take_carried(), 4);
        assert!(!p.carrying);
        assert_eq!(p.carrying_count, 0);
    }
}
