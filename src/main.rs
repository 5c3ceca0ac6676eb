/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossterm::event::KeyCode;
use log::{error, info, warn};

use config::GameConfig;
use domain::entity::{FrameInput, MoveDir};
use sim::event::GameEvent;
use sim::flow;
use sim::level::{self, LevelDef};
use sim::step;
use sim::world::{Mode, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    for w in &config.warnings {
        warn!("{w}");
    }

    let cli = match parse_args(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("usage: zonex [--test <level-file>]");
            std::process::exit(2);
        }
    };

    let levels = level::load_all(&config);
    info!("{} level(s) available", levels.len());
    let mut world = WorldState::new(&config, levels, seed());

    if let Some(path) = &cli.test_level {
        if let Err(e) = open_test_level(&mut world, path) {
            error!("{e}");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut sound = SoundEngine::new();
    if sound.is_none() {
        warn!("no audio output; running silent");
    }

    let result = game_loop(&mut world, &mut renderer, &mut sound, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing ZoneX!");
    println!("Final Score: {}", world.score);
}

/// File logger; falls back to stderr if the file can't be opened.
/// `RUST_LOG` overrides the default `info` filter.
fn init_logging(config: &GameConfig) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    );
    match std::fs::OpenOptions::new().create(true).append(true).open(&config.log_file) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("cannot open log file {}: {e}; logging to stderr", config.log_file.display());
        }
    }
    // Ignore a second init (tests, embedding)
    let _ = builder.try_init();
}

fn seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5eed)
}

// ── Command line ──

#[derive(Debug, Default, PartialEq)]
struct Cli {
    test_level: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Cli, String> {
    let mut cli = Cli::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--test" => {
                let path = args.next().ok_or("--test needs a level file")?;
                cli.test_level = Some(PathBuf::from(path));
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(cli)
}

/// Start test mode on a level file. JSON levels are also opened in the
/// editor, which is where test mode returns to.
fn open_test_level(world: &mut WorldState, path: &std::path::Path) -> Result<(), level::LevelError> {
    let def = level::load_level_file(path)?;
    if level::is_json(path) {
        let obj = level::read_level_object(path)?;
        if let Some(grid) = sim::editor::EditorGrid::from_level_object(&obj) {
            world.editor = grid;
        }
    }
    info!("test mode: {}", path.display());
    flow::start_test(world, def, &mut vec![]);
    Ok(())
}

// ── Frame loop ──

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: &mut Option<SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.keyboard_enhanced();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let tick_ms = config.timing.tick_rate_ms;
    let tick_rate = Duration::from_millis(tick_ms);
    let mut last_tick = Instant::now();

    // Fresh presses land between ticks; hold them for the next one
    let mut pending_blockade = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        let mut events = Vec::new();
        if handle_meta(world, &kb, &gp, &mut events) {
            break;
        }
        process_sound_events(sound.as_ref(), &events);
        renderer.note_events(&events, world.clock_ms);

        if world.mode == Mode::Playing
            && (kb.place_blockade_pressed() || gp.place_blockade_pressed())
        {
            pending_blockade = true;
        }

        if last_tick.elapsed() >= tick_rate {
            if world.mode.is_running() {
                let input = FrameInput {
                    movement: detect_movement(&kb, &gp),
                    place_blockade: std::mem::take(&mut pending_blockade),
                };
                let events = step::step(world, input, tick_ms);
                process_sound_events(sound.as_ref(), &events);
                renderer.note_events(&events, world.clock_ms);
                if let Some(sfx) = sound.as_mut() {
                    sfx.update_ambience(world.ambience(), Instant::now());
                }
            } else {
                pending_blockade = false;
            }
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::Step => sfx.play_step(),
            GameEvent::GrassCleared { .. } => sfx.play_grass(),
            GameEvent::DoorOpened { .. } => sfx.play_door(),
            GameEvent::KeyPickup => sfx.play_key(),
            GameEvent::PlutoniumPickup { count } => sfx.play_pickup(*count),
            GameEvent::Deposit { .. } => sfx.play_deposit(),
            GameEvent::BlockadePlaced { .. } => sfx.play_block_place(),
            GameEvent::BlockadeRecovered { .. } => sfx.play_block_recover(),
            GameEvent::BlockadeRefilled => sfx.play_block_refill(),
            GameEvent::Death { .. } => sfx.play_die(),
            GameEvent::LevelStart { .. } => sfx.play_level_start(),
            GameEvent::LevelComplete => sfx.play_level_clear(),
            // Drawn from the player's trail
            GameEvent::TrailEmitted { .. } => {}
        }
    }
}

// ── Key Constants ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_PAINT: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];

fn detect_movement(kb: &InputState, gp: &GamepadState) -> Option<MoveDir> {
    kb.movement().or_else(|| gp.held_dir())
}

/// Menu, editor and restart keys. Returns `true` to quit.
fn handle_meta(
    world: &mut WorldState,
    kb: &InputState,
    gp: &GamepadState,
    events: &mut Vec<GameEvent>,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();
    let ch = kb.pressed_char();

    match world.mode {
        Mode::Menu => {
            if confirm {
                flow::start_game(world, 0, events);
            } else if ch == Some('e') {
                flow::open_editor(world);
            } else if esc || ch == Some('q') {
                return true;
            }
        }
        Mode::Editor => {
            if esc {
                flow::quit_to_menu(world);
                return false;
            }
            let editor = &mut world.editor;
            if let Some(dir) = kb.pressed_dir().or_else(|| gp.pressed_dir()) {
                let (dx, dy) = dir.delta();
                editor.move_cursor(dx, dy);
            }
            match ch {
                Some('[') => editor.cycle_tool(-1),
                Some(']') => editor.cycle_tool(1),
                Some(c) if c.is_ascii_digit() => editor.select_tool(&c.to_string()),
                Some('t') => {
                    let def = LevelDef { name: "Custom".into(), text: editor.to_text() };
                    flow::start_test(world, def, events);
                    return false;
                }
                _ => {}
            }
            if kb.any_pressed(KEYS_PAINT) || gp.place_blockade_pressed() {
                editor.paint();
            }
        }
        Mode::LevelIntro | Mode::Playing => {
            if esc {
                flow::quit_to_menu(world);
            }
        }
        Mode::GameOver | Mode::Win => {
            if confirm {
                flow::restart(world, events);
            } else if esc {
                flow::quit_to_menu(world);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> impl Iterator<Item = String> {
        v.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn no_arguments_is_a_normal_start() {
        assert_eq!(parse_args(args(&[])), Ok(Cli::default()));
    }

    #[test]
    fn test_flag_takes_a_path() {
        let cli = parse_args(args(&["--test", "levels/mine.json"])).unwrap();
        assert_eq!(cli.test_level, Some(PathBuf::from("levels/mine.json")));
        assert!(parse_args(args(&["--test"])).is_err());
        assert!(parse_args(args(&["--fast"])).is_err());
    }

    #[test]
    fn game_over_in_a_test_run_replays_the_test_level() {
        let levels = vec![LevelDef { name: "Campaign".into(), text: "█,S".into() }];
        let mut w = WorldState::new(&GameConfig::default(), levels, 3);
        let mut ev = vec![];
        flow::start_test(&mut w, LevelDef { name: "Custom".into(), text: "S,X".into() }, &mut ev);
        w.mode = Mode::GameOver;

        let mut kb = InputState::new();
        kb.record(crossterm::event::KeyEvent::new(KeyCode::Enter, crossterm::event::KeyModifiers::NONE), Instant::now());
        assert!(!handle_meta(&mut w, &kb, &GamepadState::new(), &mut ev));
        assert_eq!(w.level_name, "Custom");
        assert!(w.test_level.is_some());
        assert_eq!(w.mode, Mode::LevelIntro);
    }

    #[test]
    fn test_level_from_json_also_fills_the_editor() {
        let path = std::env::temp_dir().join(format!("zonex-cli-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"name":"Mine","map":[["1","1","1"],["1","9","7"],["1","1","1"]]}"#).unwrap();
        let mut w = WorldState::new(&GameConfig::default(), vec![], 3);
        let res = open_test_level(&mut w, &path);
        std::fs::remove_file(&path).ok();

        assert!(res.is_ok());
        assert_eq!(w.mode, Mode::LevelIntro);
        assert_eq!(w.level_name, "Mine");
        assert_eq!((w.editor.width, w.editor.height), (3, 3));
        assert_eq!(w.editor.cells[1][2], "7");
    }
}
