/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Problems are collected as warnings and logged once the logger is up,
/// since the log file location itself comes from this config.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub gameplay: GameplayConfig,
    pub viewport: ViewportConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub log_file: PathBuf,
    /// Problems met while loading; logged by `main` after logger init.
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub laser_period_ms: u64,
    pub level_start_delay_ms: u64,
    pub level_complete_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GameplayConfig {
    pub starting_lives: u32,
}

/// Logical viewport in pixels, used for the camera clamp.
#[derive(Clone, Copy, Debug)]
pub struct ViewportConfig {
    pub width_px: f32,
    pub height_px: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub place_blockade: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gameplay: TomlGameplay,
    #[serde(default)]
    viewport: TomlViewport,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_laser_period")]
    laser_period_ms: u64,
    #[serde(default = "default_level_delay")]
    level_start_delay_ms: u64,
    #[serde(default = "default_level_delay")]
    level_complete_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGameplay {
    #[serde(default = "default_lives")]
    starting_lives: u32,
}

#[derive(Deserialize, Debug)]
struct TomlViewport {
    #[serde(default = "default_view_w")]
    width_px: u32,
    #[serde(default = "default_view_h")]
    height_px: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_place_blockade")]
    place_blockade: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }       // ~60 ticks per second
fn default_laser_period() -> u64 { 2000 }
fn default_level_delay() -> u64 { 2000 }
fn default_lives() -> u32 { 3 }
fn default_view_w() -> u32 { 800 }
fn default_view_h() -> u32 { 600 }

fn default_place_blockade() -> Vec<String> { vec!["A".into(), "X".into(), "R1".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_levels_dir() -> String { "levels".into() }
fn default_log_file() -> String { "zonex.log".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            laser_period_ms: default_laser_period(),
            level_start_delay_ms: default_level_delay(),
            level_complete_delay_ms: default_level_delay(),
        }
    }
}

impl Default for TomlGameplay {
    fn default() -> Self {
        TomlGameplay { starting_lives: default_lives() }
    }
}

impl Default for TomlViewport {
    fn default() -> Self {
        TomlViewport { width_px: default_view_w(), height_px: default_view_h() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            place_blockade: default_place_blockade(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            log_file: default_log_file(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let (toml_cfg, warnings) = load_toml(&search_dirs);
        let mut cfg = GameConfig::from_toml(toml_cfg, &search_dirs);
        cfg.warnings = warnings;
        cfg
    }

    /// Parse config text directly (no filesystem search).
    #[cfg(test)]
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(toml_cfg, &[]))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            timing: TimingConfig {
                tick_rate_ms: toml_cfg.timing.tick_rate_ms.max(1),
                laser_period_ms: toml_cfg.timing.laser_period_ms.max(1),
                level_start_delay_ms: toml_cfg.timing.level_start_delay_ms,
                level_complete_delay_ms: toml_cfg.timing.level_complete_delay_ms,
            },
            gameplay: GameplayConfig {
                starting_lives: toml_cfg.gameplay.starting_lives.max(1),
            },
            viewport: ViewportConfig {
                width_px: toml_cfg.viewport.width_px as f32,
                height_px: toml_cfg.viewport.height_px as f32,
            },
            gamepad: GamepadConfig {
                place_blockade: toml_cfg.gamepad.place_blockade,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
            levels_dir,
            log_file: PathBuf::from(toml_cfg.general.log_file),
            warnings: vec![],
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/zonex)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/zonex");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/zonex)
    let sys = PathBuf::from("/usr/share/zonex");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> (TomlConfig, Vec<String>) {
    let mut warnings = vec![];
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return (cfg, warnings),
                    Err(e) => {
                        warnings.push(format!("{}: parse error, using defaults: {e}", path.display()));
                        return (TomlConfig::default(), warnings);
                    }
                },
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    (TomlConfig::default(), warnings)
}
