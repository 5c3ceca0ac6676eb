/// Enemy patrol AI: straight-line motion with bounce and random axis swap.
///
/// Each mobile enemy proposes one step along its axis. The step is rejected
/// when any of the four corners of the proposed 32×32 box lands on a tile
/// that is not open ground, or when another enemy's *current* position is
/// within 30px on both axes. A rejected enemy reverses and, on a coin flip,
/// swaps axis. Mines never move.
///
/// Enemies are stepped in list order, so later enemies see earlier ones at
/// their already-updated positions.

use rand::Rng;

use super::entity::{Axis, Enemy, TILE_SIZE};
use super::rules::MapView;

/// Enemies closer than this on both axes block each other.
pub const CROWD_DISTANCE: f32 = 30.0;
/// Far edge of a 32px box, inclusive.
const BOX_EXTENT: f32 = 31.0;

/// Where the enemy would be after one unobstructed step.
pub fn proposed_position(enemy: &Enemy) -> (f32, f32) {
    let d = enemy.step_len() * enemy.dir as f32;
    match enemy.axis {
        Some(Axis::X) => (enemy.x + d, enemy.y),
        Some(Axis::Y) => (enemy.x, enemy.y + d),
        None => (enemy.x, enemy.y),
    }
}

/// Would a 32×32 box at `(x, y)` touch any non-open tile?
pub fn hits_terrain(map: &MapView, x: f32, y: f32) -> bool {
    let c1 = (x / TILE_SIZE).floor() as i32;
    let c2 = ((x + BOX_EXTENT) / TILE_SIZE).floor() as i32;
    let r1 = (y / TILE_SIZE).floor() as i32;
    let r2 = ((y + BOX_EXTENT) / TILE_SIZE).floor() as i32;
    [c1, c2]
        .iter()
        .any(|&c| [r1, r2].iter().any(|&r| map.tile_at(c, r).blocks_enemy()))
}

/// Would enemy `idx` at `(x, y)` crowd any other enemy? Mines count.
pub fn crowds_other(enemies: &[Enemy], idx: usize, x: f32, y: f32) -> bool {
    enemies.iter().enumerate().any(|(i, other)| {
        i != idx && (other.x - x).abs() < CROWD_DISTANCE && (other.y - y).abs() < CROWD_DISTANCE
    })
}

/// Advance one enemy by one tick. Returns `true` if it moved.
pub fn step_enemy<R: Rng>(map: &MapView, enemies: &mut [Enemy], idx: usize, rng: &mut R) -> bool {
    if !enemies[idx].is_mobile() {
        return false;
    }
    let (nx, ny) = proposed_position(&enemies[idx]);
    let blocked = hits_terrain(map, nx, ny) || crowds_other(enemies, idx, nx, ny);

    let en = &mut enemies[idx];
    if blocked {
        en.dir = -en.dir;
        if rng.random_bool(0.5) {
            en.axis = en.axis.map(Axis::swapped);
        }
        false
    } else {
        en.x = nx;
        en.y = ny;
        true
    }
}

/// Advance every enemy in list order.
pub fn step_all<R: Rng>(map: &MapView, enemies: &mut [Enemy], rng: &mut R) {
    for i in 0..enemies.len() {
        step_enemy(map, enemies, i, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::EnemyKind;
    use crate::domain::tile::Tile;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// Open 6×3 corridor walled on every side.
    fn corridor() -> Vec<Vec<Tile>> {
        let mut t = vec![vec![Tile::Empty; 6]; 3];
        for x in 0..6 {
            t[0][x] = Tile::Wall;
            t[2][x] = Tile::Wall;
        }
        t[1][0] = Tile::Wall;
        t[1][5] = Tile::Wall;
        t
    }

    #[test]
    fn robot_walks_along_x() {
        let tiles = corridor();
        let map = MapView { tiles: &tiles, width: 6, height: 3 };
        let mut en = vec![Enemy::new(0, EnemyKind::Robot, 64.0, 32.0)];
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(step_enemy(&map, &mut en, 0, &mut rng));
        assert_eq!((en[0].x, en[0].y), (66.0, 32.0));
    }

    #[test]
    fn alien_moves_at_half_speed() {
        let tiles = vec![vec![Tile::Empty; 4]; 4];
        let map = MapView { tiles: &tiles, width: 4, height: 4 };
        let mut en = vec![Enemy::new(0, EnemyKind::Alien, 32.0, 32.0)];
        let mut rng = Pcg32::seed_from_u64(1);
        step_all(&map, &mut en, &mut rng);
        assert_eq!((en[0].x, en[0].y), (32.0, 33.5));
    }

    #[test]
    fn bounce_flips_direction_and_holds_position() {
        let tiles = corridor();
        let map = MapView { tiles: &tiles, width: 6, height: 3 };
        // Flush against the east wall: any step right enters column 5.
        let mut en = vec![Enemy::new(0, EnemyKind::Robot, 128.0, 32.0)];
        let mut rng = Pcg32::seed_from_u64(42);
        assert!(!step_enemy(&map, &mut en, 0, &mut rng));
        assert_eq!((en[0].x, en[0].y), (128.0, 32.0));
        assert_eq!(en[0].dir, -1);
    }

    #[test]
    fn axis_swap_happens_roughly_half_the_time() {
        let tiles = vec![vec![Tile::Wall; 3]; 3];
        let map = MapView { tiles: &tiles, width: 3, height: 3 };
        let mut rng = Pcg32::seed_from_u64(7);
        let mut swaps = 0;
        for _ in 0..1000 {
            let mut en = vec![Enemy::new(0, EnemyKind::Robot, 32.0, 32.0)];
            step_enemy(&map, &mut en, 0, &mut rng);
            if en[0].axis == Some(Axis::Y) {
                swaps += 1;
            }
        }
        assert!((350..650).contains(&swaps), "swaps = {swaps}");
    }

    #[test]
    fn enemies_block_each_other() {
        let tiles = vec![vec![Tile::Empty; 8]; 3];
        let map = MapView { tiles: &tiles, width: 8, height: 3 };
        let mut en = vec![
            Enemy::new(0, EnemyKind::Robot, 32.0, 32.0),
            Enemy::new(1, EnemyKind::Mine, 63.0, 32.0),
        ];
        let mut rng = Pcg32::seed_from_u64(3);
        // 34 → 63 is 29px apart: crowded
        assert!(!step_enemy(&map, &mut en, 0, &mut rng));
        assert_eq!(en[0].x, 32.0);
        assert_eq!(en[0].dir, -1);
    }

    #[test]
    fn every_non_open_tile_stops_enemies() {
        for t in [Tile::Door, Tile::Grass, Tile::Blockade, Tile::BlockadeStation,
                  Tile::Container, Tile::Laser, Tile::Start] {
            let mut tiles = vec![vec![Tile::Empty; 4]; 1];
            tiles[0][2] = t;
            let map = MapView { tiles: &tiles, width: 4, height: 1 };
            assert!(hits_terrain(&map, 34.0, 0.0), "{t:?}");
            assert!(!hits_terrain(&map, 32.0, 0.0), "{t:?}");
        }
    }

    #[test]
    fn mines_never_move() {
        let tiles = vec![vec![Tile::Empty; 4]; 4];
        let map = MapView { tiles: &tiles, width: 4, height: 4 };
        let mut en = vec![Enemy::new(0, EnemyKind::Mine, 32.0, 32.0)];
        let mut rng = Pcg32::seed_from_u64(0);
        for _ in 0..10 {
            step_all(&map, &mut en, &mut rng);
        }
        assert_eq!((en[0].x, en[0].y, en[0].dir), (32.0, 32.0, 0));
    }
}
