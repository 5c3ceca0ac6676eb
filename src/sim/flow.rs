/// Game flow: starting, loading, dying, completing, and the scheduled
/// transitions between them.
///
/// ```text
///   Menu ──start_game──▶ LevelIntro ──RevealLevel──▶ Playing ──lives = 0──▶ GameOver
///                          ▲                            │
///                          │ AdvanceLevel (after delay) │ level clear
///                          └────────── next level ◀─────┘
///                                          │ no levels at all
///                                          ▼
///                                         Win
///
///   Editor ──start_test──▶ LevelIntro ─▶ Playing ──level clear──▶ Editor
///   GameOver ──restart──▶ same run kind (campaign or test level)
/// ```
///
/// Every load schedules a `RevealLevel`; until it fires the world is frozen
/// behind the level banner.

use log::{debug, info};

use crate::domain::entity::{cell_to_player_pos, MoveState, Player};
use crate::domain::rules::{LEVEL_CLEAR_BONUS, SALVAGE_SCORE};
use super::event::{DeathCause, GameEvent};
use super::level::{decode, LevelDef};
use super::world::{Mode, ScheduledKind, WorldState};

// ══════════════════════════════════════════════════════════════
// Starting
// ══════════════════════════════════════════════════════════════

/// New game from level `index`: score 0, full lives.
pub fn start_game(world: &mut WorldState, index: usize, events: &mut Vec<GameEvent>) {
    world.test_level = None;
    reset_run(world);
    load_level(world, index, events);
}

/// Play a single level straight from the editor. Clearing it returns to
/// the editor instead of advancing.
pub fn start_test(world: &mut WorldState, def: LevelDef, events: &mut Vec<GameEvent>) {
    world.test_level = Some(def);
    reset_run(world);
    load_level(world, 0, events);
}

/// Play again after a finished run. A test run restarts its own level.
pub fn restart(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    match world.test_level.clone() {
        Some(def) => start_test(world, def, events),
        None => start_game(world, 0, events),
    }
}

fn reset_run(world: &mut WorldState) {
    world.pending.clear();
    world.score = 0;
    world.lives = world.starting_lives;
}

/// External reset back to the title screen.
pub fn quit_to_menu(world: &mut WorldState) {
    world.pending.clear();
    world.test_level = None;
    world.mode = Mode::Menu;
    info!("back to menu");
}

pub fn open_editor(world: &mut WorldState) {
    world.pending.clear();
    world.mode = Mode::Editor;
    info!("editor opened");
}

// ══════════════════════════════════════════════════════════════
// Level load
// ══════════════════════════════════════════════════════════════

/// Decode and install a level, discarding the previous one entirely.
/// Past the last level this wraps to the first; with no levels at all
/// the game is won.
pub fn load_level(world: &mut WorldState, index: usize, events: &mut Vec<GameEvent>) {
    let (index, def) = match &world.test_level {
        Some(def) => (0, def.clone()),
        None => {
            let index = if index < world.levels.len() { index } else { 0 };
            match world.levels.get(index) {
                Some(def) => (index, def.clone()),
                None => {
                    info!("no levels left: win");
                    world.mode = Mode::Win;
                    return;
                }
            }
        }
    };

    let decoded = decode(&def.text, world.next_enemy_id);
    world.next_enemy_id += decoded.enemies.len();
    if decoded.start.is_none() {
        debug!("level '{}' has no start cell; spawning top-left", def.name);
    }

    let (sx, sy) = decoded.spawn_pos();
    world.player = Player::new(sx, sy);
    world.start_cell = decoded.start.unwrap_or((0, 0));
    world.tiles = decoded.tiles;
    world.width = decoded.width;
    world.height = decoded.height;
    world.enemies = decoded.enemies;
    world.collectibles = decoded.collectibles;
    world.plutonium_total = decoded.plutonium_total;

    world.plutonium_collected = 0;
    world.radiation = 0.0;
    world.keys_held = 0;
    world.blockades_held = 0;
    world.tick = 0;

    world.level_index = index;
    world.level_name = def.name.clone();
    world.mode = Mode::LevelIntro;
    info!(
        "loaded level {} '{}' ({}x{}, {} plutonium, {} enemies)",
        index + 1, def.name, world.width, world.height,
        world.plutonium_total, world.enemies.len(),
    );

    events.push(GameEvent::LevelStart { index });
    let delay = world.timing.level_start_delay_ms;
    world.schedule(ScheduledKind::RevealLevel, delay);
}

// ══════════════════════════════════════════════════════════════
// Death / completion
// ══════════════════════════════════════════════════════════════

/// Lose a life. Carried material is delivered at half value.
pub fn player_die(world: &mut WorldState, cause: DeathCause, events: &mut Vec<GameEvent>) {
    events.push(GameEvent::Death { cause });
    world.lives = world.lives.saturating_sub(1);

    let salvaged = world.player.take_carried();
    world.plutonium_collected += salvaged;
    world.score += salvaged * SALVAGE_SCORE;
    debug!("player died ({cause:?}), salvaged {salvaged}, {} lives left", world.lives);

    if world.lives == 0 {
        info!("game over with score {}", world.score);
        world.mode = Mode::GameOver;
        return;
    }

    world.radiation = 0.0;
    let (sx, sy) = cell_to_player_pos(world.start_cell.0, world.start_cell.1);
    let p = &mut world.player;
    p.x = sx;
    p.y = sy;
    p.state = MoveState::Idle;
    p.dist_moved = 0.0;
}

/// All plutonium delivered: bonus now, next level after the delay.
pub fn complete_level(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.score += LEVEL_CLEAR_BONUS;
    events.push(GameEvent::LevelComplete);
    info!("level {} complete, score {}", world.level_index + 1, world.score);
    let delay = world.timing.level_complete_delay_ms;
    world.schedule(ScheduledKind::AdvanceLevel, delay);
}

// ══════════════════════════════════════════════════════════════
// Scheduled transitions
// ══════════════════════════════════════════════════════════════

/// Fire every pending event whose due time has passed, in due order.
pub fn process_scheduled(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let now = world.clock_ms;
    let (mut due, rest): (Vec<_>, Vec<_>) =
        world.pending.drain(..).partition(|e| e.due_ms <= now);
    world.pending = rest;
    due.sort_by_key(|e| e.due_ms);

    for ev in due {
        match ev.kind {
            ScheduledKind::RevealLevel => {
                if world.mode == Mode::LevelIntro {
                    world.mode = Mode::Playing;
                }
                debug!("level {} revealed", world.level_index + 1);
            }
            ScheduledKind::AdvanceLevel => {
                if world.test_level.take().is_some() {
                    info!("test level cleared, back to editor");
                    world.mode = Mode::Editor;
                } else {
                    let next = world.level_index + 1;
                    load_level(world, next, events);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::level::compact_grid;
    use crate::sim::testutil::world_from;
    use proptest::prelude::*;

    fn def(name: &str, rows: &[&str]) -> LevelDef {
        LevelDef { name: name.into(), text: compact_grid(rows) }
    }

    fn two_level_world() -> WorldState {
        let levels = vec![
            def("one", &["####", "#S?X", "####"]),
            def("two", &["#####", "# S #", "#####"]),
        ];
        WorldState::new(&GameConfig::default(), levels, 3)
    }

    #[test]
    fn last_life_ends_the_game() {
        let mut w = world_from(&["###", "#S#", "###"]);
        w.lives = 1;
        let mut ev = vec![];
        player_die(&mut w, DeathCause::Radiation, &mut ev);
        assert_eq!(w.lives, 0);
        assert_eq!(w.mode, Mode::GameOver);
        assert_eq!(ev, vec![GameEvent::Death { cause: DeathCause::Radiation }]);
    }

    #[test]
    fn death_respawns_at_start_and_clears_radiation() {
        let mut w = world_from(&["#####", "#S  #", "#####"]);
        w.player.x = 100.0;
        w.radiation = 80.0;
        let mut ev = vec![];
        player_die(&mut w, DeathCause::Enemy, &mut ev);
        assert_eq!(w.lives, 2);
        assert_eq!(w.mode, Mode::Playing);
        assert_eq!((w.player.x, w.player.y), (36.0, 36.0));
        assert_eq!(w.radiation, 0.0);
    }

    #[test]
    fn start_game_resets_score_and_lives() {
        let mut w = two_level_world();
        w.score = 999;
        w.lives = 1;
        let mut ev = vec![];
        start_game(&mut w, 1, &mut ev);
        assert_eq!((w.score, w.lives, w.level_index), (0, 3, 1));
        assert_eq!(w.mode, Mode::LevelIntro);
        assert!(w.revealing());
        assert_eq!(ev, vec![GameEvent::LevelStart { index: 1 }]);
    }

    #[test]
    fn load_resets_level_counters() {
        let mut w = two_level_world();
        let mut ev = vec![];
        start_game(&mut w, 0, &mut ev);
        w.radiation = 50.0;
        w.keys_held = 2;
        w.blockades_held = 3;
        w.plutonium_collected = 4;
        w.player.carrying = true;
        w.player.carrying_count = 2;
        w.player.push_trail((1, 1));
        load_level(&mut w, 1, &mut ev);
        assert_eq!(w.radiation, 0.0);
        assert_eq!((w.keys_held, w.blockades_held, w.plutonium_collected), (0, 0, 0));
        assert!(!w.player.carrying && w.player.carrying_count == 0);
        assert!(w.player.trail.is_empty());
        assert_eq!(w.plutonium_total, 0);
        assert_eq!((w.player.x, w.player.y), (68.0, 36.0));
    }

    #[test]
    fn past_the_last_level_wraps_to_the_first() {
        let mut w = two_level_world();
        let mut ev = vec![];
        start_game(&mut w, 0, &mut ev);
        load_level(&mut w, 2, &mut ev);
        assert_eq!(w.level_index, 0);
        assert_eq!(w.level_name, "one");
    }

    #[test]
    fn no_levels_at_all_is_a_win() {
        let mut w = WorldState::new(&GameConfig::default(), vec![], 0);
        let mut ev = vec![];
        start_game(&mut w, 0, &mut ev);
        assert_eq!(w.mode, Mode::Win);
        assert!(ev.is_empty());
    }

    #[test]
    fn enemy_ids_are_fresh_across_loads() {
        let levels = vec![def("e", &["#####", "#SRA#", "#####"])];
        let mut w = WorldState::new(&GameConfig::default(), levels, 0);
        let mut ev = vec![];
        start_game(&mut w, 0, &mut ev);
        let first: Vec<usize> = w.enemies.iter().map(|e| e.id).collect();
        load_level(&mut w, 0, &mut ev);
        let second: Vec<usize> = w.enemies.iter().map(|e| e.id).collect();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|id| !second.contains(id)));
    }

    #[test]
    fn advance_fires_only_when_due() {
        let mut w = two_level_world();
        let mut ev = vec![];
        start_game(&mut w, 0, &mut ev);
        w.pending.clear();
        complete_level(&mut w, &mut ev);
        assert_eq!(w.score, 1000);

        w.clock_ms += 1999;
        process_scheduled(&mut w, &mut ev);
        assert_eq!(w.level_index, 0);

        w.clock_ms += 1;
        process_scheduled(&mut w, &mut ev);
        assert_eq!(w.level_index, 1);
        assert_eq!(w.score, 1000); // carried over
        assert!(w.revealing());
    }

    #[test]
    fn cleared_test_level_returns_to_editor() {
        let mut w = two_level_world();
        let mut ev = vec![];
        start_test(&mut w, def("t", &["###", "#S#", "###"]), &mut ev);
        assert_eq!(w.level_name, "t");
        w.pending.clear();
        complete_level(&mut w, &mut ev);
        w.clock_ms += 2000;
        process_scheduled(&mut w, &mut ev);
        assert_eq!(w.mode, Mode::Editor);
        assert!(w.test_level.is_none());
    }

    #[test]
    fn reveal_unfreezes_the_world() {
        let mut w = two_level_world();
        let mut ev = vec![];
        start_game(&mut w, 0, &mut ev);
        assert!(w.is_frozen());
        assert_eq!(w.mode, Mode::LevelIntro);
        w.clock_ms = 1999;
        process_scheduled(&mut w, &mut ev);
        assert_eq!(w.mode, Mode::LevelIntro);
        w.clock_ms = 2000;
        process_scheduled(&mut w, &mut ev);
        assert!(!w.is_frozen());
        assert!(!w.revealing());
        assert_eq!(w.mode, Mode::Playing);
    }

    #[test]
    fn restart_after_a_test_run_replays_the_test_level() {
        let mut w = two_level_world();
        let mut ev = vec![];
        start_test(&mut w, def("t", &["###", "#S#", "###"]), &mut ev);
        w.pending.clear();
        w.mode = Mode::Playing;
        for _ in 0..3 {
            player_die(&mut w, DeathCause::Enemy, &mut ev);
        }
        assert_eq!(w.mode, Mode::GameOver);

        restart(&mut w, &mut ev);
        assert_eq!(w.level_name, "t");
        assert!(w.test_level.is_some());
        assert_eq!((w.lives, w.score), (3, 0));
        assert_eq!(w.mode, Mode::LevelIntro);
    }

    #[test]
    fn restart_after_the_campaign_starts_from_the_first_level() {
        let mut w = two_level_world();
        let mut ev = vec![];
        start_game(&mut w, 1, &mut ev);
        w.mode = Mode::GameOver;
        restart(&mut w, &mut ev);
        assert_eq!((w.level_index, w.level_name.as_str()), (0, "one"));
        assert!(w.test_level.is_none());
    }

    proptest! {
        #[test]
        fn death_delivers_carried_material_at_half_value(n in 0u32..50, lives in 1u32..5) {
            let mut w = world_from(&["###", "#S#", "###"]);
            w.lives = lives;
            w.score = 10;
            w.plutonium_collected = 2;
            w.player.carrying = n > 0;
            w.player.carrying_count = n;
            let mut ev = vec![];
            player_die(&mut w, DeathCause::Laser, &mut ev);
            prop_assert_eq!(w.plutonium_collected, 2 + n);
            prop_assert_eq!(w.score, 10 + 50 * n);
            prop_assert_eq!(w.player.carrying_count, 0);
            prop_assert!(!w.player.carrying);
            prop_assert_eq!(w.lives, lives - 1);
        }
    }
}
