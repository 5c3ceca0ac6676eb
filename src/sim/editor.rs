/// Level editor model: a grid of numeric editor codes plus a cursor and
/// the selected tool. Painting never touches the running simulation;
/// "test level" hands the converted text to `flow::start_test`.

use super::level::LevelObject;

pub const DEFAULT_EDITOR_W: usize = 40;
pub const DEFAULT_EDITOR_H: usize = 30;

/// Paintable tools in palette order: (code, label).
pub const TOOLS: [(&str, &str); 14] = [
    ("0", "Empty"),
    ("1", "Wall"),
    ("2", "Floor"),
    ("9", "Start"),
    ("6", "Plutonium"),
    ("7", "Container"),
    ("5", "Key"),
    ("4", "Door"),
    ("11", "Grass"),
    ("12", "Station"),
    ("3", "Laser"),
    ("R", "Robot"),
    ("A", "Alien"),
    ("M", "Mine"),
];

#[derive(Clone, Debug, PartialEq)]
pub struct EditorGrid {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Vec<String>>,
    pub cursor: (usize, usize),
    pub tool: String,
}

impl Default for EditorGrid {
    fn default() -> Self {
        EditorGrid::new_bordered(DEFAULT_EDITOR_W, DEFAULT_EDITOR_H)
    }
}

impl EditorGrid {
    /// Solid border of walls around an empty interior.
    pub fn new_bordered(width: usize, height: usize) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let cells = (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| {
                        let edge = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                        (if edge { "1" } else { "0" }).to_string()
                    })
                    .collect()
            })
            .collect();
        EditorGrid { width, height, cells, cursor: (1usize.min(width - 1), 1usize.min(height - 1)), tool: "1".into() }
    }

    /// Move the cursor, clamped to the grid.
    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let x = (self.cursor.0 as i32 + dx).clamp(0, self.width as i32 - 1);
        let y = (self.cursor.1 as i32 + dy).clamp(0, self.height as i32 - 1);
        self.cursor = (x as usize, y as usize);
    }

    /// Select a palette tool by code. Codes not on the palette are ignored.
    pub fn select_tool(&mut self, code: &str) {
        if TOOLS.iter().any(|(c, _)| *c == code) {
            self.tool = code.to_string();
        }
    }

    /// Select the next (`step = 1`) or previous (`step = -1`) palette tool.
    pub fn cycle_tool(&mut self, step: i32) {
        let n = TOOLS.len() as i32;
        let cur = TOOLS.iter().position(|(c, _)| *c == self.tool).unwrap_or(0) as i32;
        let next = (cur + step).rem_euclid(n) as usize;
        self.tool = TOOLS[next].0.to_string();
    }

    pub fn tool_label(&self) -> &'static str {
        TOOLS.iter().find(|(c, _)| *c == self.tool).map_or("?", |(_, l)| *l)
    }

    /// Write the current tool at the cursor.
    pub fn paint(&mut self) {
        let (x, y) = self.cursor;
        if let Some(cell) = self.cells.get_mut(y).and_then(|r| r.get_mut(x)) {
            *cell = self.tool.clone();
        }
    }

    pub fn to_level_object(&self) -> LevelObject {
        LevelObject {
            name: Some("Custom".into()),
            width: self.width,
            height: self.height,
            map: self.cells.clone(),
        }
    }

    /// Adopt a loaded level object. Dimensions come from the map itself.
    /// Returns `None` for an empty map.
    pub fn from_level_object(obj: &LevelObject) -> Option<Self> {
        let height = obj.map.len();
        let width = obj.map.first()?.len();
        if width == 0 {
            return None;
        }
        let cells = obj
            .map
            .iter()
            .map(|row| {
                let mut r = row.clone();
                r.resize(width, "0".into());
                r
            })
            .collect();
        Some(EditorGrid { width, height, cells, cursor: (0, 0), tool: "1".into() })
    }

    /// Textual grid for a test run.
    pub fn to_text(&self) -> String {
        self.to_level_object().to_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::decode;
    use crate::domain::tile::Tile;

    #[test]
    fn default_grid_is_bordered_40_by_30() {
        let g = EditorGrid::default();
        assert_eq!((g.width, g.height), (40, 30));
        assert_eq!(g.cells[0][5], "1");
        assert_eq!(g.cells[29][5], "1");
        assert_eq!(g.cells[5][0], "1");
        assert_eq!(g.cells[5][39], "1");
        assert_eq!(g.cells[5][5], "0");
    }

    #[test]
    fn cursor_is_clamped() {
        let mut g = EditorGrid::new_bordered(5, 4);
        g.move_cursor(-10, -10);
        assert_eq!(g.cursor, (0, 0));
        g.move_cursor(100, 100);
        assert_eq!(g.cursor, (4, 3));
    }

    #[test]
    fn paint_then_test_decodes() {
        let mut g = EditorGrid::new_bordered(5, 5);
        g.cursor = (1, 1);
        g.select_tool("9");
        g.paint();
        g.move_cursor(1, 0);
        g.select_tool("6");
        g.paint();
        g.move_cursor(1, 1);
        g.select_tool("7");
        g.paint();
        let d = decode(&g.to_text(), 0);
        assert_eq!(d.start, Some((1, 1)));
        assert_eq!(d.plutonium_total, 1);
        assert_eq!(d.tiles[2][3], Tile::Container);
        assert_eq!(d.tiles[0][0], Tile::Wall);
        assert_eq!((d.width, d.height), (5, 5));
    }

    #[test]
    fn unknown_tool_codes_are_ignored() {
        let mut g = EditorGrid::default();
        g.select_tool("7");
        g.select_tool("8");
        assert_eq!(g.tool, "7");
        assert_eq!(g.tool_label(), "Container");
    }

    #[test]
    fn tool_cycle_wraps() {
        let mut g = EditorGrid::default();
        g.select_tool("0");
        g.cycle_tool(-1);
        assert_eq!(g.tool, "M");
        g.cycle_tool(1);
        assert_eq!(g.tool, "0");
        assert_eq!(g.tool_label(), "Empty");
    }

    #[test]
    fn level_object_round_trip_keeps_cells() {
        let mut g = EditorGrid::new_bordered(6, 3);
        g.cursor = (2, 1);
        g.select_tool("R");
        g.paint();
        let back = EditorGrid::from_level_object(&g.to_level_object()).unwrap();
        assert_eq!(back.cells, g.cells);
        assert!(EditorGrid::from_level_object(&LevelObject {
            name: None, width: 0, height: 0, map: vec![],
        }).is_none());
    }
}
