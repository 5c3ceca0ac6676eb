/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. World clock + hazard timer
///   2. Scheduled transitions (level reveal / advance)
///   3. Simulation body (skipped while a transition is pending)
///      a. Blockade placement (edge-triggered)
///      b. Player movement
///      c. Collectible pickup
///      d. Deposit (may complete the level)
///      e. Radiation accrual
///      f. Enemy AI
///      g. Enemy contact
///      h. Laser hazard
///   4. Camera
///
/// Completing the level ends step 3 for this tick. A death skips the
/// remaining lethal checks, but enemies still move.

use crate::domain::ai;
use crate::domain::entity::{CollectibleKind, FrameInput};
use crate::domain::rules::{self, MapView, DEPOSIT_SCORE, KEY_SCORE, RADIATION_LIMIT};
use crate::domain::tile::Tile;
use super::event::{DeathCause, GameEvent};
use super::flow;
use super::movement;
use super::world::{Mode, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput, dt_ms: u64) -> Vec<GameEvent> {
    if !world.mode.is_running() { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.clock_ms += dt_ms;
    resolve_hazard_timer(world, dt_ms);

    flow::process_scheduled(world, &mut events);
    if !world.mode.is_running() { return events; }

    if world.mode == Mode::Playing && !world.is_frozen() {
        world.tick += 1;
        resolve_body(world, input, &mut events);
    }

    if world.mode.is_running() {
        resolve_camera(world);
    }
    events
}

/// Movement and interactions. Level completion returns early; a death
/// only skips the lethal checks after it.
fn resolve_body(world: &mut WorldState, input: FrameInput, events: &mut Vec<GameEvent>) {
    if input.place_blockade {
        movement::place_blockade(world, events);
    }
    movement::resolve_player_movement(world, input.movement, events);

    resolve_pickups(world, events);
    if resolve_deposit(world, events) { return; }
    let irradiated = resolve_radiation(world, events);
    resolve_enemy_movement(world);
    if irradiated { return; }
    if resolve_enemy_contact(world, events) { return; }
    resolve_laser(world, events);
}

// ══════════════════════════════════════════════════════════════
// Hazard timer
// ══════════════════════════════════════════════════════════════

/// Square wave shared by every laser tile.
fn resolve_hazard_timer(world: &mut WorldState, dt_ms: u64) {
    world.laser_timer_ms += dt_ms;
    if world.laser_timer_ms > world.timing.laser_period_ms {
        world.laser_timer_ms = 0;
        world.laser_on = !world.laser_on;
    }
}

// ══════════════════════════════════════════════════════════════
// Interactions
// ══════════════════════════════════════════════════════════════

fn resolve_pickups(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let body = world.player.body();
    for item in world.collectibles.iter_mut().filter(|c| c.active) {
        if !body.overlaps(&item.body()) { continue; }
        item.active = false;
        match item.kind {
            CollectibleKind::Plutonium => {
                world.player.carrying_count += 1;
                world.player.carrying = true;
                events.push(GameEvent::PlutoniumPickup { count: world.player.carrying_count });
            }
            CollectibleKind::Key => {
                world.keys_held += 1;
                world.score += KEY_SCORE;
                events.push(GameEvent::KeyPickup);
            }
        }
    }
}

/// Returns `true` if the deposit completed the level.
fn resolve_deposit(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let (c, r) = world.player.center_cell();
    if world.tile_at(c, r) != Tile::Container || !world.player.carrying {
        return false;
    }

    let n = world.player.take_carried();
    world.plutonium_collected += n;
    world.score += n * DEPOSIT_SCORE;
    world.radiation = rules::radiation_after_deposit(world.radiation);
    events.push(GameEvent::Deposit { count: n });

    if world.plutonium_collected >= world.plutonium_total {
        flow::complete_level(world, events);
        return true;
    }
    false
}

/// Returns `true` if the dose was lethal.
fn resolve_radiation(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    world.radiation += rules::radiation_gain(world.player.carrying, world.player.carrying_count);
    if world.radiation >= RADIATION_LIMIT {
        flow::player_die(world, DeathCause::Radiation, events);
        return true;
    }
    false
}

fn resolve_enemy_movement(world: &mut WorldState) {
    let map = MapView { tiles: &world.tiles, width: world.width, height: world.height };
    ai::step_all(&map, &mut world.enemies, &mut world.rng);
}

/// Returns `true` if an enemy killed the player.
fn resolve_enemy_contact(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let body = world.player.body();
    if world.enemies.iter().any(|e| body.overlaps(&e.contact_box())) {
        flow::player_die(world, DeathCause::Enemy, events);
        return true;
    }
    false
}

fn resolve_laser(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.laser_on { return; }
    let (c, r) = world.player.center_cell();
    if world.tile_at(c, r) == Tile::Laser {
        flow::player_die(world, DeathCause::Laser, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Camera
// ══════════════════════════════════════════════════════════════

fn resolve_camera(world: &mut WorldState) {
    let (ww, wh) = world.world_px();
    let (px, py) = (world.player.x, world.player.y);
    world.camera.follow(px, py, ww, wh);
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Enemy, EnemyKind, MoveDir};
    use crate::sim::testutil::world_from;
    use proptest::prelude::*;

    const DT: u64 = 16;

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn hold(dir: MoveDir) -> FrameInput {
        FrameInput { movement: Some(dir), place_blockade: false }
    }

    fn run(world: &mut WorldState, input: FrameInput, ticks: usize) -> Vec<GameEvent> {
        let mut events = vec![];
        for _ in 0..ticks {
            events.extend(step(world, input, DT));
        }
        events
    }

    fn deaths(events: &[GameEvent]) -> usize {
        events.iter().filter(|e| matches!(e, GameEvent::Death { .. })).count()
    }

    #[test]
    fn deposit_converts_carried_material() {
        // Spare plutonium keeps the level from completing.
        let mut w = world_from(&["#########", "#SX ????#", "#########"]);
        w.player.carrying = true;
        w.player.carrying_count = 3;
        w.radiation = 15.0;
        let ev = run(&mut w, hold(MoveDir::Right), 1 + 8);
        assert_eq!(w.plutonium_collected, 3);
        assert_eq!(w.score, 300);
        assert!(!w.player.carrying);
        assert_eq!(w.player.carrying_count, 0);
        // Floored at 0 on the deposit tick, then background dose for 6 ticks
        assert!((w.radiation - 0.06).abs() < 1e-3);
        assert!(ev.contains(&GameEvent::Deposit { count: 3 }));
        assert!(!ev.contains(&GameEvent::LevelComplete));
    }

    #[test]
    fn deposit_without_carrying_does_nothing() {
        let mut w = world_from(&["#####", "#SX #", "#####"]);
        let ev = run(&mut w, hold(MoveDir::Right), 1 + 8);
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::Deposit { .. })));
        assert_eq!(w.plutonium_collected, 0);
    }

    #[test]
    fn plutonium_pickup_stacks_without_limit() {
        let mut w = world_from(&["#######", "#S????#", "#######"]);
        let ev = run(&mut w, hold(MoveDir::Right), 1 + 8 * 4);
        assert_eq!(w.player.carrying_count, 4);
        assert!(w.player.carrying);
        assert!(w.collectibles.iter().all(|c| !c.active));
        assert!(ev.contains(&GameEvent::PlutoniumPickup { count: 4 }));
    }

    #[test]
    fn key_pickup_scores_and_opens_a_door() {
        let mut w = world_from(&["######", "#SKD #", "######"]);
        let ev = run(&mut w, hold(MoveDir::Right), 1 + 8 + 8);
        assert_eq!(w.score, 50);
        assert_eq!(w.keys_held, 0);
        assert_eq!(w.tile_at(3, 1), Tile::Empty);
        assert!(ev.contains(&GameEvent::KeyPickup));
        assert!(ev.contains(&GameEvent::DoorOpened { x: 3, y: 1 }));
    }

    #[test]
    fn collectibles_never_reactivate() {
        let mut w = world_from(&["#####", "#S? #", "#####"]);
        run(&mut w, hold(MoveDir::Right), 1 + 8);
        run(&mut w, hold(MoveDir::Left), 1 + 8);
        let ev = run(&mut w, hold(MoveDir::Right), 1 + 8);
        assert_eq!(w.player.carrying_count, 1);
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::PlutoniumPickup { .. })));
    }

    #[test]
    fn last_delivery_completes_the_level_and_freezes() {
        let mut w = world_from(&["#####", "#S?X#", "#####"]);
        let ev = run(&mut w, hold(MoveDir::Right), 1 + 16);
        assert!(ev.contains(&GameEvent::LevelComplete));
        assert_eq!(w.score, 100 + 1000);
        assert!(w.is_frozen());
        // Frozen: holding a direction does nothing until the advance fires
        let before = (w.player.x, w.radiation);
        run(&mut w, hold(MoveDir::Left), 10);
        assert_eq!((w.player.x, w.radiation), before);
    }

    #[test]
    fn radiation_accrues_and_kills_at_the_limit() {
        let mut w = world_from(&["###", "#S#", "###"]);
        run(&mut w, idle(), 100);
        assert!((w.radiation - 1.0).abs() < 1e-3);

        w.player.carrying = true;
        w.player.carrying_count = 2;
        w.radiation = 99.95;
        let ev = run(&mut w, idle(), 1);
        assert_eq!(deaths(&ev), 1);
        assert_eq!(w.lives, 2);
        assert_eq!(w.radiation, 0.0);
        assert_eq!(w.plutonium_collected, 2); // salvaged on death
        assert_eq!(w.score, 100);
    }

    #[test]
    fn laser_kills_only_in_the_on_phase() {
        let mut w = world_from(&["#####", "#SL #", "#####"]);
        // Walk onto the laser cell while it is off
        run(&mut w, hold(MoveDir::Right), 1);
        run(&mut w, idle(), 8);
        assert_eq!(w.player.center_cell(), (2, 1));
        assert!(!w.laser_on);
        assert_eq!(w.lives, 3);

        // Off for just over 2000 ms, then on
        let ev = run(&mut w, idle(), 130);
        assert_eq!(deaths(&ev), 1);
        assert!(ev.contains(&GameEvent::Death { cause: DeathCause::Laser }));
        assert_eq!(w.lives, 2);
    }

    #[test]
    fn hazard_timer_toggles_with_the_clock() {
        let mut w = world_from(&["###", "#S#", "###"]);
        let mut flips = 0;
        let mut last = w.laser_on;
        for _ in 0..(6000 / DT) {
            step(&mut w, idle(), DT);
            if w.laser_on != last {
                flips += 1;
                last = w.laser_on;
            }
        }
        assert_eq!(flips, 2);
    }

    #[test]
    fn enemy_contact_kills() {
        let mut w = world_from(&["######", "#S   #", "######"]);
        w.enemies.push(Enemy::new(99, EnemyKind::Mine, 48.0, 32.0));
        let ev = run(&mut w, idle(), 1);
        assert_eq!(deaths(&ev), 1);
        assert!(ev.contains(&GameEvent::Death { cause: DeathCause::Enemy }));
    }

    #[test]
    fn mines_need_closer_contact_than_robots() {
        // Player body 36..68; mine lethal box starts at x + 8
        let mut w = world_from(&["#######", "#S    #", "#######"]);
        w.enemies.push(Enemy::new(99, EnemyKind::Mine, 62.0, 32.0));
        assert_eq!(deaths(&run(&mut w, idle(), 1)), 0);

        let mut w = world_from(&["#######", "#S    #", "#######"]);
        let mut robot = Enemy::new(99, EnemyKind::Robot, 62.0, 32.0);
        robot.speed = 0.0;
        w.enemies.push(robot);
        assert_eq!(deaths(&run(&mut w, idle(), 1)), 1);
    }

    #[test]
    fn one_death_per_tick_at_most() {
        let mut w = world_from(&["#####", "#SL #", "#####"]);
        w.radiation = 100.0;
        w.laser_on = true;
        w.enemies.push(Enemy::new(99, EnemyKind::Mine, 32.0, 32.0));
        let ev = run(&mut w, idle(), 1);
        assert_eq!(deaths(&ev), 1);
        assert_eq!(w.lives, 2);
    }

    #[test]
    fn nothing_runs_outside_playing() {
        let mut w = world_from(&["###", "#S#", "###"]);
        w.mode = Mode::GameOver;
        let ev = run(&mut w, hold(MoveDir::Up), 10);
        assert!(ev.is_empty());
        assert_eq!(w.clock_ms, 0);
    }

    #[test]
    fn level_banner_holds_the_world_still() {
        let mut w = world_from(&["#####", "#S  #", "#####"]);
        w.mode = Mode::LevelIntro;
        w.schedule(crate::sim::world::ScheduledKind::RevealLevel, 100);
        run(&mut w, hold(MoveDir::Right), 5);
        assert_eq!(w.mode, Mode::LevelIntro);
        assert_eq!(w.player.x, 36.0);
        assert_eq!(w.radiation, 0.0);
        assert_eq!(w.clock_ms, 80);
        run(&mut w, hold(MoveDir::Right), 5);
        assert_eq!(w.mode, Mode::Playing);
        assert!(w.player.x > 36.0);
    }

    #[test]
    fn enemies_keep_moving_on_a_radiation_death() {
        let mut w = world_from(&["#########", "#S      #", "#########"]);
        w.enemies.push(Enemy::new(99, EnemyKind::Robot, 160.0, 32.0));
        w.radiation = 99.995;
        let ev = run(&mut w, idle(), 1);
        assert!(ev.contains(&GameEvent::Death { cause: DeathCause::Radiation }));
        assert_eq!(deaths(&ev), 1);
        assert_eq!(w.enemies[0].x, 162.0);
    }

    #[test]
    fn blockade_can_be_placed_mid_slide() {
        let mut w = world_from(&["#########", "#S      #", "#########"]);
        w.blockades_held = 1;
        run(&mut w, hold(MoveDir::Right), 1 + 8 + 8); // chained on to (4,1)
        run(&mut w, idle(), 1);
        assert!(w.player.is_moving());
        assert_eq!(w.player.grid_cell(), (3, 1));

        let ev = run(&mut w, FrameInput { movement: None, place_blockade: true }, 1);
        assert!(w.player.is_moving());
        assert_eq!(ev, vec![GameEvent::BlockadePlaced { x: 2, y: 1 }]);
        assert_eq!(w.tile_at(2, 1), Tile::Blockade);
        assert_eq!(w.blockades_held, 0);
    }

    #[test]
    fn placing_and_recovering_a_blockade() {
        let mut w = world_from(&["######", "#S   #", "######"]);
        w.blockades_held = 1;
        run(&mut w, hold(MoveDir::Right), 1 + 8);
        run(&mut w, idle(), 8); // chained to (3,1)
        let ev = run(&mut w, FrameInput { movement: None, place_blockade: true }, 1);
        assert!(ev.contains(&GameEvent::BlockadePlaced { x: 2, y: 1 }));
        assert_eq!(w.blockades_held, 0);
        let ev = run(&mut w, hold(MoveDir::Left), 1);
        assert!(ev.contains(&GameEvent::BlockadeRecovered { x: 2, y: 1 }));
        assert_eq!(w.blockades_held, 1);
    }

    proptest! {
        #[test]
        fn deposit_arithmetic(n in 1u32..40, rad in 0.0f32..90.0) {
            let mut w = world_from(&["#####", "#SX #", "#####"]);
            w.plutonium_total = 1000;
            w.player.carrying = true;
            w.player.carrying_count = n;
            w.radiation = rad;
            run(&mut w, hold(MoveDir::Right), 1);
            // Commit tick: still on the start cell, dose accrues normally
            let rad_before = w.radiation;
            run(&mut w, hold(MoveDir::Right), 3);
            // Centre crosses into the container after 12px, on the third tick
            prop_assert_eq!(w.plutonium_collected, n);
            prop_assert_eq!(w.score, 100 * n);
            prop_assert!(!w.player.carrying);
            let expect = (rad_before + 0.05 * n as f32 * 2.0 - 20.0).max(0.0) + 0.01;
            prop_assert!((w.radiation - expect).abs() < 0.01);
        }

        #[test]
        fn collected_never_decreases_within_a_level(
            moves in prop::collection::vec(0u8..5, 1..150)
        ) {
            let mut w = world_from(&[
                "#######",
                "#S ? X#",
                "# ?  ?#",
                "#?  M #",
                "#######",
            ]);
            let mut last = 0;
            for m in moves {
                let movement = match m {
                    0 => Some(MoveDir::Up),
                    1 => Some(MoveDir::Down),
                    2 => Some(MoveDir::Left),
                    3 => Some(MoveDir::Right),
                    _ => None,
                };
                for _ in 0..4 {
                    step(&mut w, FrameInput { movement, place_blockade: false }, DT);
                }
                if w.mode != Mode::Playing || w.is_frozen() { break; }
                prop_assert!(w.plutonium_collected >= last);
                prop_assert_eq!(w.plutonium_total, 4);
                last = w.plutonium_collected;
            }
        }
    }
}
