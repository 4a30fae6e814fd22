//! Tile grid world for the discrete variants
//!
//! The grid owns its tiles; the interpreter mutates it only through
//! `clear_tile`. Coordinates are (x, y) with y growing downward.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Integer grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, heading: Heading) -> Self {
        let (dx, dy) = heading.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heading {
    Up,
    Right,
    Down,
    Left,
}

impl Heading {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::Up => (0, -1),
            Heading::Right => (1, 0),
            Heading::Down => (0, 1),
            Heading::Left => (-1, 0),
        }
    }

    pub fn turn_right(self) -> Self {
        match self {
            Heading::Up => Heading::Right,
            Heading::Right => Heading::Down,
            Heading::Down => Heading::Left,
            Heading::Left => Heading::Up,
        }
    }

    pub fn turn_left(self) -> Self {
        match self {
            Heading::Up => Heading::Left,
            Heading::Left => Heading::Down,
            Heading::Down => Heading::Right,
            Heading::Right => Heading::Up,
        }
    }
}

/// What occupies a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Path,
    Wall,
    Switch,
    /// Closed until a switch is activated
    Gate,
    Collectible,
    Goal,
}

impl TileKind {
    pub fn name(&self) -> &'static str {
        match self {
            TileKind::Path => "path",
            TileKind::Wall => "wall",
            TileKind::Switch => "switch",
            TileKind::Gate => "gate",
            TileKind::Collectible => "collectible",
            TileKind::Goal => "goal",
        }
    }
}

/// Problems with a literal level description
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level has no rows")]
    Empty,
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged { row: usize, found: usize, expected: usize },
    #[error("unknown tile code {code} at {cell}")]
    UnknownCode { code: u8, cell: Cell },
    #[error("level needs exactly one start, found {0}")]
    StartCount(usize),
    #[error("no goal is reachable from the start")]
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<TileKind>,
    start: Cell,
    start_heading: Heading,
}

impl Grid {
    /// Grid filled with `fill`, start at `start`
    pub fn filled(width: i32, height: i32, fill: TileKind, start: Cell, start_heading: Heading) -> Self {
        Self {
            width,
            height,
            tiles: vec![fill; (width * height) as usize],
            start,
            start_heading,
        }
    }

    /// Parse maze codes: 0 path, 1 wall, 2 start, 3 goal, 4 collectible
    pub fn from_maze_codes(rows: &[&[u8]]) -> Result<Self, LevelError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.len()).ok_or(LevelError::Empty)?;
        if width == 0 {
            return Err(LevelError::Empty);
        }

        let mut tiles = Vec::with_capacity(width * height);
        let mut starts = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(LevelError::Ragged {
                    row: y,
                    found: row.len(),
                    expected: width,
                });
            }
            for (x, &code) in row.iter().enumerate() {
                let cell = Cell::new(x as i32, y as i32);
                let tile = match code {
                    0 => TileKind::Path,
                    1 => TileKind::Wall,
                    2 => {
                        starts.push(cell);
                        TileKind::Path
                    }
                    3 => TileKind::Goal,
                    4 => TileKind::Collectible,
                    _ => return Err(LevelError::UnknownCode { code, cell }),
                };
                tiles.push(tile);
            }
        }

        let start = match starts.as_slice() {
            [only] => *only,
            _ => return Err(LevelError::StartCount(starts.len())),
        };

        let grid = Self {
            width: width as i32,
            height: height as i32,
            tiles,
            start,
            start_heading: Heading::Right,
        };
        if !grid.goal_reachable() {
            return Err(LevelError::Unreachable);
        }
        Ok(grid)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn start_heading(&self) -> Heading {
        self.start_heading
    }

    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| (cell.y * self.width + cell.x) as usize)
    }

    /// Tile at `cell`, `None` outside the grid
    pub fn tile(&self, cell: Cell) -> Option<TileKind> {
        self.index(cell).map(|i| self.tiles[i])
    }

    pub(crate) fn set_tile(&mut self, cell: Cell, tile: TileKind) {
        if let Some(i) = self.index(cell) {
            self.tiles[i] = tile;
        }
    }

    /// Whether the avatar may enter `cell`
    pub fn is_passable(&self, cell: Cell, gate_open: bool) -> bool {
        match self.tile(cell) {
            None | Some(TileKind::Wall) => false,
            Some(TileKind::Gate) => gate_open,
            Some(_) => true,
        }
    }

    /// Clear a collectible; returns true only if one was actually removed
    pub fn clear_tile(&mut self, cell: Cell) -> bool {
        match self.index(cell) {
            Some(i) if self.tiles[i] == TileKind::Collectible => {
                self.tiles[i] = TileKind::Path;
                true
            }
            _ => false,
        }
    }

    /// Number of tiles of `kind`
    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|t| **t == kind).count()
    }

    /// Iterate cells row-major with their tiles
    pub fn cells(&self) -> impl Iterator<Item = (Cell, TileKind)> + '_ {
        self.tiles.iter().enumerate().map(move |(i, t)| {
            let i = i as i32;
            (Cell::new(i % self.width, i / self.width), *t)
        })
    }

    /// Breadth-first search from the start, treating gates as openable
    pub fn goal_reachable(&self) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([self.start]);
        seen.insert(self.start);
        while let Some(cell) = queue.pop_front() {
            if self.tile(cell) == Some(TileKind::Goal) {
                return true;
            }
            for heading in [Heading::Up, Heading::Right, Heading::Down, Heading::Left] {
                let next = cell.offset(heading);
                if self.is_passable(next, true) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORRIDOR: &[&[u8]] = &[
        &[1, 1, 1, 1, 1, 1, 1, 1],
        &[1, 2, 4, 0, 4, 3, 1, 1],
        &[1, 1, 1, 1, 1, 1, 1, 1],
    ];

    #[test]
    fn test_parse_corridor() {
        let grid = Grid::from_maze_codes(CORRIDOR).unwrap();
        assert_eq!(grid.width(), 8);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.start(), Cell::new(1, 1));
        assert_eq!(grid.tile(Cell::new(5, 1)), Some(TileKind::Goal));
        assert_eq!(grid.count(TileKind::Collectible), 2);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Grid::from_maze_codes(&[]), Err(LevelError::Empty));
        assert_eq!(
            Grid::from_maze_codes(&[&[2, 3], &[1]]),
            Err(LevelError::Ragged { row: 1, found: 1, expected: 2 })
        );
        assert_eq!(Grid::from_maze_codes(&[&[0, 3]]), Err(LevelError::StartCount(0)));
        assert_eq!(Grid::from_maze_codes(&[&[2, 2, 3]]), Err(LevelError::StartCount(2)));
        assert_eq!(Grid::from_maze_codes(&[&[2, 1, 3]]), Err(LevelError::Unreachable));
        assert!(matches!(
            Grid::from_maze_codes(&[&[2, 9, 3]]),
            Err(LevelError::UnknownCode { code: 9, .. })
        ));
    }

    #[test]
    fn test_passability() {
        let mut grid = Grid::filled(3, 1, TileKind::Path, Cell::new(0, 0), Heading::Right);
        grid.set_tile(Cell::new(1, 0), TileKind::Gate);
        grid.set_tile(Cell::new(2, 0), TileKind::Wall);
        assert!(!grid.is_passable(Cell::new(1, 0), false));
        assert!(grid.is_passable(Cell::new(1, 0), true));
        assert!(!grid.is_passable(Cell::new(2, 0), true));
        assert!(!grid.is_passable(Cell::new(-1, 0), true));
        assert!(!grid.is_passable(Cell::new(0, 1), true));
    }

    #[test]
    fn test_clear_tile_idempotent() {
        let mut grid = Grid::from_maze_codes(CORRIDOR).unwrap();
        let coin = Cell::new(2, 1);
        assert!(grid.clear_tile(coin));
        assert!(!grid.clear_tile(coin));
        assert_eq!(grid.tile(coin), Some(TileKind::Path));
        // Non-collectibles are never cleared
        assert!(!grid.clear_tile(Cell::new(5, 1)));
    }

    #[test]
    fn test_heading_turns() {
        let mut h = Heading::Up;
        for _ in 0..4 {
            h = h.turn_right();
        }
        assert_eq!(h, Heading::Up);
        assert_eq!(Heading::Right.turn_left(), Heading::Up);
        assert_eq!(Cell::new(2, 2).offset(Heading::Left), Cell::new(1, 2));
    }
}
