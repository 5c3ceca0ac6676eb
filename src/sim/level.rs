/// Level decoder and level sources.
///
/// ## Sources (in play order):
///   1. Built-in embedded levels
///   2. `levels/` directory, sorted by file name:
///      - `.csv` / `.txt`: textual grid
///      - `.json`: structured level object
///
/// ## Textual grid
///   One row per line, cells separated by `,`. Each cell is matched by
///   substring against the rules below; the first matching rule wins, so
///   composite cells like `L/` are tolerated.
///
///   '█' = Wall        '▒' = Floor        'S' = Start (player spawn)
///   'K' = Key         '?' '(' = Plutonium
///   'X' = Container   'D' = Door         '"' = Grass
///   'B' = Blockade station               'L' 'l' = Laser
///   'R' 'r' = Robot   'A' = Alien        'M' = Mine
///   anything else = Empty
///
/// ## Structured level object (`.json`)
///   `{ "name": "...", "width": 40, "height": 30, "map": [["1","0",...], ...] }`
///   Cells use the editor's numeric codes; see `code_to_glyph`.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GameConfig;
use crate::domain::entity::{
    cell_to_player_pos, Collectible, CollectibleKind, Enemy, EnemyKind, TILE_SIZE,
};
use crate::domain::tile::Tile;

/// A playable level: display name plus its textual grid.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelDef {
    pub name: String,
    pub text: String,
}

/// Editor/JSON representation of a level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub width: usize,
    #[serde(default)]
    pub height: usize,
    pub map: Vec<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed level object in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} holds no level data", path.display())]
    Empty { path: PathBuf },
}

/// Everything a level load needs, produced from a textual grid.
#[derive(Clone, Debug)]
pub struct DecodedLevel {
    pub tiles: Vec<Vec<Tile>>,
    pub width: usize,
    pub height: usize,
    /// Last `S` cell, if any.
    pub start: Option<(i32, i32)>,
    pub collectibles: Vec<Collectible>,
    pub enemies: Vec<Enemy>,
    pub plutonium_total: u32,
}

// ══════════════════════════════════════════════════════════════
// Decoder
// ══════════════════════════════════════════════════════════════

/// What a single cell decodes to.
enum CellKind {
    Tile(Tile),
    Start,
    Item(CollectibleKind),
    Enemy(EnemyKind),
    Unknown,
}

/// First-match substring rules. Order matters.
fn classify(cell: &str) -> CellKind {
    let has = |c: char| cell.contains(c);
    if has('█') {
        CellKind::Tile(Tile::Wall)
    } else if has('▒') {
        CellKind::Tile(Tile::Floor)
    } else if has('S') {
        CellKind::Start
    } else if has('K') {
        CellKind::Item(CollectibleKind::Key)
    } else if has('?') || has('(') {
        CellKind::Item(CollectibleKind::Plutonium)
    } else if has('X') {
        CellKind::Tile(Tile::Container)
    } else if has('D') {
        CellKind::Tile(Tile::Door)
    } else if has('"') {
        CellKind::Tile(Tile::Grass)
    } else if has('B') {
        CellKind::Tile(Tile::BlockadeStation)
    } else if has('L') || has('l') {
        CellKind::Tile(Tile::Laser)
    } else if has('R') || has('r') {
        CellKind::Enemy(EnemyKind::Robot)
    } else if has('A') {
        CellKind::Enemy(EnemyKind::Alien)
    } else if has('M') {
        CellKind::Enemy(EnemyKind::Mine)
    } else if cell.trim().is_empty() || cell.trim() == "0" {
        CellKind::Tile(Tile::Empty)
    } else {
        CellKind::Unknown
    }
}

/// Decode a textual grid. Never fails: unknown cells become `Empty` and
/// short rows are padded. Enemy ids are assigned from `first_id` upward.
pub fn decode(text: &str, first_id: usize) -> DecodedLevel {
    let mut lines: Vec<&str> = text.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let rows: Vec<Vec<&str>> = lines.iter().map(|l| l.split(',').collect()).collect();

    let height = rows.len();
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    if rows.iter().any(|r| r.len() != width) {
        debug!("ragged level rows; padding to width {width}");
    }

    let mut out = DecodedLevel {
        tiles: vec![vec![Tile::Empty; width]; height],
        width,
        height,
        start: None,
        collectibles: vec![],
        enemies: vec![],
        plutonium_total: 0,
    };
    let mut next_id = first_id;
    let mut unknown = 0usize;

    for (y, row) in rows.iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let (cx, cy) = (x as f32 * TILE_SIZE, y as f32 * TILE_SIZE);
            match classify(cell) {
                CellKind::Tile(t) => out.tiles[y][x] = t,
                CellKind::Start => {
                    out.tiles[y][x] = Tile::Start;
                    out.start = Some((x as i32, y as i32));
                }
                CellKind::Item(kind) => {
                    if kind == CollectibleKind::Plutonium {
                        out.plutonium_total += 1;
                    }
                    out.collectibles.push(Collectible::new(kind, cx, cy));
                }
                CellKind::Enemy(kind) => {
                    out.enemies.push(Enemy::new(next_id, kind, cx, cy));
                    next_id += 1;
                }
                CellKind::Unknown => unknown += 1,
            }
        }
    }

    if unknown > 0 {
        debug!("{unknown} unrecognised level cells decoded as empty");
    }
    out
}

impl DecodedLevel {
    /// Player spawn position for this level. Without a Start cell the
    /// player spawns in the top-left cell.
    pub fn spawn_pos(&self) -> (f32, f32) {
        let (c, r) = self.start.unwrap_or((0, 0));
        cell_to_player_pos(c, r)
    }
}

// ══════════════════════════════════════════════════════════════
// Structured level objects
// ══════════════════════════════════════════════════════════════

/// Editor numeric code → textual glyph. Unknown codes become an empty cell.
pub fn code_to_glyph(code: &str) -> &'static str {
    match code {
        "1" => "█",
        "2" => "▒",
        "3" => "L/",
        "4" => "D",
        "5" => "K",
        "6" => "?",
        "7" => "X",
        "9" => "S",
        "R" => "R",
        "A" => "A",
        "M" => "M",
        "11" => "\"",
        "12" => "B",
        _ => "",
    }
}

impl LevelObject {
    /// Convert to the textual grid the decoder reads.
    pub fn to_text(&self) -> String {
        self.map
            .iter()
            .map(|row| row.iter().map(|c| code_to_glyph(c)).collect::<Vec<_>>().join(","))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ══════════════════════════════════════════════════════════════
// Level sources
// ══════════════════════════════════════════════════════════════

/// Built-in levels followed by everything in the configured levels dir.
pub fn load_all(config: &GameConfig) -> Vec<LevelDef> {
    let mut levels = embedded_levels();
    let extra = load_from_directory(&config.levels_dir);
    if !extra.is_empty() {
        info!("loaded {} level(s) from {}", extra.len(), config.levels_dir.display());
    }
    levels.extend(extra);
    levels
}

/// Load one level file. JSON files are structured objects; anything else
/// is a textual grid.
pub fn load_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    let stem = path.file_stem().unwrap_or_default().to_string_lossy().to_string();

    let def = if is_json(path) {
        let obj = parse_level_object(path, &content)?;
        LevelDef { name: obj.name.clone().unwrap_or(stem), text: obj.to_text() }
    } else {
        LevelDef { name: stem, text: content }
    };

    if def.text.trim().is_empty() {
        return Err(LevelError::Empty { path: path.to_path_buf() });
    }
    Ok(def)
}

/// Read a structured level object, for opening in the editor.
pub fn read_level_object(path: &Path) -> Result<LevelObject, LevelError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    parse_level_object(path, &content)
}

fn parse_level_object(path: &Path, content: &str) -> Result<LevelObject, LevelError> {
    serde_json::from_str(content)
        .map_err(|source| LevelError::Json { path: path.to_path_buf(), source })
}

pub fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "json")
}

/// All level files in `dir`, sorted by file name. Bad files are skipped.
pub fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .is_some_and(|e| e == "csv" || e == "txt" || e == "json")
        })
        .collect();
    paths.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));

    paths
        .iter()
        .filter_map(|p| match load_level_file(p) {
            Ok(def) => Some(def),
            Err(e) => {
                warn!("skipping level: {e}");
                None
            }
        })
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════
//
// Authored one character per cell: '#' = wall, ':' = floor,
// ' ' = empty; any other character is used as the cell symbol.

pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Zone 1-1", &[
            "####################",
            "#S   ?    #        #",
            "#         #   ?    #",
            "#  ####   D   ###  #",
            "#  #  #   #     #  #",
            "#  # ?#  K#  R  # X#",
            "#  #  #   ####  #  #",
            "#  ## #         #  #",
            "#     \"\"\"\"   B  ?  #",
            "#  ?        :::    #",
            "#      M        ?  #",
            "####################",
        ]),
        make_embedded("Zone 1-2", &[
            "##########################",
            "#S  :::::   #     ?   #  #",
            "#   :   :   #  A      #  #",
            "#   : ? :   L         D  #",
            "#   :   :   #     ?   #  #",
            "#   :::::   #######L###  #",
            "#        B              ?#",
            "###L#####   \"\"\"\"\"  R     #",
            "#   K   #   \"   \"     M  #",
            "#  ?    #   \" X \"        #",
            "#       L   \"   \"   ?    #",
            "##########################",
        ]),
        make_embedded("Zone 1-3", &[
            "########################################",
            "#S     #        ?          #          ?#",
            "#      #   R               #   A       #",
            "#  ?   #          ####     L           #",
            "#      D          #  #     #     ###   #",
            "####L###     M    #? #     #######?#   #",
            "#      #          #  #           # #   #",
            "#  K   #   \"\"\"\"\"\"\"#D##   B       #     #",
            "#      #                    R    #  ?  #",
            "#  B   ######L#######       ######     #",
            "#                    #    ?            #",
            "#   ?   R            #        ::::::   #",
            "#        :::::::     L        :  X :   #",
            "#   A    :     :     #        :    :   #",
            "#        :  ?  :     #   M    ::::::   #",
            "#        :::::::     #                ?#",
            "########################################",
        ]),
    ]
}

fn make_embedded(name: &str, rows: &[&str]) -> LevelDef {
    LevelDef { name: name.to_string(), text: compact_grid(rows) }
}

/// Expand one-character-per-cell rows into a textual grid.
pub fn compact_grid(rows: &[&str]) -> String {
    rows.iter()
        .map(|row| {
            row.chars()
                .map(|ch| match ch {
                    '#' => "█".to_string(),
                    ':' => "▒".to_string(),
                    ' ' => String::new(),
                    c => c.to_string(),
                })
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
