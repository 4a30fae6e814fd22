//! Level and world generation
//!
//! Fixed levels are literal grids. Random layouts go through `place_spread`,
//! which takes an explicit RNG so a seeded generator reproduces them exactly.

use glam::Vec2;
use rand::Rng;

use super::grid::{Cell, Grid, Heading, LevelError, TileKind};
use crate::catalog::BlockAction;
use crate::consts::*;

/// A fixed maze level
#[derive(Debug, Clone, Copy)]
pub struct MazeLevel {
    pub id: &'static str,
    pub name: &'static str,
    /// Reference solution as action names
    pub solution: &'static [&'static str],
    /// 0 path, 1 wall, 2 start, 3 goal, 4 collectible
    pub map: &'static [&'static [u8]],
}

impl MazeLevel {
    pub fn build(&self) -> Result<Grid, LevelError> {
        Grid::from_maze_codes(self.map)
    }

    /// Reference solution as actions (unknown names are skipped)
    pub fn solution_actions(&self) -> Vec<BlockAction> {
        self.solution
            .iter()
            .filter_map(|s| BlockAction::from_str(s))
            .collect()
    }
}

pub static MAZE_LEVELS: [MazeLevel; 5] = [
    MazeLevel {
        id: "lvl1",
        name: "Straight Flight",
        solution: &["MOVE_RIGHT", "MOVE_RIGHT", "MOVE_RIGHT", "MOVE_RIGHT"],
        map: &[
            &[1, 1, 1, 1, 1, 1, 1, 1],
            &[1, 2, 4, 0, 4, 3, 1, 1],
            &[1, 1, 1, 1, 1, 1, 1, 1],
        ],
    },
    MazeLevel {
        id: "lvl2",
        name: "The Corner",
        solution: &["MOVE_RIGHT", "MOVE_RIGHT", "MOVE_DOWN", "MOVE_DOWN", "MOVE_DOWN"],
        map: &[
            &[1, 1, 1, 1, 1, 1],
            &[1, 2, 0, 4, 1, 1],
            &[1, 1, 1, 0, 1, 1],
            &[1, 1, 1, 4, 1, 1],
            &[1, 1, 1, 3, 1, 1],
            &[1, 1, 1, 1, 1, 1],
        ],
    },
    MazeLevel {
        id: "lvl3",
        name: "U-Turn",
        solution: &["MOVE_DOWN", "MOVE_DOWN", "MOVE_RIGHT", "MOVE_RIGHT", "MOVE_UP", "MOVE_UP"],
        map: &[
            &[1, 1, 1, 1, 1, 1, 1],
            &[1, 2, 1, 3, 1, 1, 1],
            &[1, 0, 1, 0, 1, 1, 1],
            &[1, 0, 4, 0, 1, 1, 1],
            &[1, 0, 0, 4, 1, 1, 1],
            &[1, 1, 1, 1, 1, 1, 1],
        ],
    },
    MazeLevel {
        id: "lvl4",
        name: "Zig-Zag",
        solution: &[
            "MOVE_UP",
            "MOVE_RIGHT",
            "MOVE_RIGHT",
            "MOVE_UP",
            "MOVE_RIGHT",
            "MOVE_RIGHT",
        ],
        map: &[
            &[1, 1, 1, 1, 1, 1, 1, 1],
            &[1, 1, 1, 0, 4, 3, 1, 1],
            &[1, 4, 0, 0, 1, 1, 1, 1],
            &[1, 2, 1, 1, 1, 1, 1, 1],
            &[1, 1, 1, 1, 1, 1, 1, 1],
        ],
    },
    MazeLevel {
        id: "lvl5",
        name: "Hidden Orchard",
        solution: &[
            "MOVE_RIGHT",
            "MOVE_RIGHT",
            "MOVE_DOWN",
            "MOVE_DOWN",
            "MOVE_LEFT",
            "MOVE_DOWN",
            "MOVE_DOWN",
            "MOVE_RIGHT",
            "MOVE_RIGHT",
            "MOVE_RIGHT",
        ],
        map: &[
            &[1, 1, 1, 1, 1, 1, 1],
            &[1, 2, 0, 4, 1, 1, 1],
            &[1, 1, 1, 0, 1, 1, 1],
            &[1, 1, 0, 0, 1, 1, 1],
            &[1, 1, 4, 1, 1, 1, 1],
            &[1, 1, 0, 4, 4, 3, 1],
            &[1, 1, 1, 1, 1, 1, 1],
        ],
    },
];

/// Level by id, falling back to the first level
pub fn maze_level(id: &str) -> &'static MazeLevel {
    MAZE_LEVELS.iter().find(|l| l.id == id).unwrap_or_else(|| {
        log::warn!("Unknown level '{}', using {}", id, MAZE_LEVELS[0].id);
        &MAZE_LEVELS[0]
    })
}

/// Ruins side length
pub const RUINS_SIZE: i32 = 8;

/// The fixed 8x8 ruins: an S-shaped path with a switch, a gate and three crystals
pub fn ruins_level() -> Grid {
    const PATH: [(i32, i32); 15] = [
        (0, 7),
        (1, 7),
        (2, 7),
        (2, 6),
        (2, 5),
        (3, 5),
        (4, 5),
        (4, 4),
        (4, 3),
        (5, 3),
        (6, 3),
        (7, 3),
        (7, 2),
        (7, 1),
        (7, 0),
    ];

    let mut grid = Grid::filled(
        RUINS_SIZE,
        RUINS_SIZE,
        TileKind::Wall,
        Cell::new(0, 7),
        Heading::Right,
    );
    for (x, y) in PATH {
        grid.set_tile(Cell::new(x, y), TileKind::Path);
    }
    grid.set_tile(Cell::new(3, 5), TileKind::Switch);
    grid.set_tile(Cell::new(7, 3), TileKind::Gate);
    grid.set_tile(Cell::new(1, 7), TileKind::Collectible);
    grid.set_tile(Cell::new(4, 5), TileKind::Collectible);
    grid.set_tile(Cell::new(7, 1), TileKind::Collectible);
    grid.set_tile(Cell::new(7, 0), TileKind::Goal);
    grid
}

/// A winning ruins program
pub const RUINS_SOLUTION: &[&str] = &[
    "STEP", "COLLECT", "STEP", "TURN_L", "STEP", "STEP", "TURN_R", "STEP", "IF_SWITCH", "STEP",
    "COLLECT", "TURN_L", "STEP", "STEP", "TURN_R", "REPEAT_2", "STEP", "STEP", "TURN_L", "STEP",
    "STEP", "COLLECT", "STEP",
];

/// Mine side length
pub const MINE_SIZE: i32 = 6;
pub const MINE_GEMS: usize = 4;
pub const MINE_ASTEROIDS: usize = 5;

/// Random 6x6 mine: gems first, then asteroids, never on the start cell
pub fn generate_mine<R: Rng>(rng: &mut R) -> Grid {
    let start = Cell::new(0, 0);
    let mut grid = Grid::filled(MINE_SIZE, MINE_SIZE, TileKind::Path, start, Heading::Right);

    // Distance >= 1 between integer cells means no two share a cell
    let spacing = Spacing {
        min_distance: 1.0,
        attempts: 64,
    };
    let mut taken = vec![cell_point(start)];
    let sample = |rng: &mut R| {
        Vec2::new(
            rng.random_range(0..MINE_SIZE) as f32,
            rng.random_range(0..MINE_SIZE) as f32,
        )
    };

    for (kind, count) in [
        (TileKind::Collectible, MINE_GEMS),
        (TileKind::Wall, MINE_ASTEROIDS),
    ] {
        for placement in place_spread(rng, count, &mut taken, spacing, sample) {
            if !placement.spaced {
                log::warn!("Mine placement exhausted attempts; skipping {}", kind.name());
                continue;
            }
            let cell = Cell::new(placement.point.x as i32, placement.point.y as i32);
            grid.set_tile(cell, kind);
        }
    }
    grid
}

fn cell_point(cell: Cell) -> Vec2 {
    Vec2::new(cell.x as f32, cell.y as f32)
}

/// Minimum-distance placement policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub min_distance: f32,
    pub attempts: u32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            min_distance: MIN_SPAWN_DISTANCE,
            attempts: SPAWN_ATTEMPTS,
        }
    }
}

/// One placed point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub point: Vec2,
    /// False when attempts ran out and the best candidate was kept
    pub spaced: bool,
}

/// Place `count` points, each at least `spacing.min_distance` from every
/// point in `taken` (which grows as points are placed).
///
/// Each point gets `spacing.attempts` samples. If none satisfies the
/// constraint, the candidate farthest from its nearest neighbour is kept
/// and flagged `spaced: false`.
pub fn place_spread<R, F>(
    rng: &mut R,
    count: usize,
    taken: &mut Vec<Vec2>,
    spacing: Spacing,
    mut sample: F,
) -> Vec<Placement>
where
    R: Rng,
    F: FnMut(&mut R) -> Vec2,
{
    let mut placed = Vec::with_capacity(count);
    for _ in 0..count {
        placed.push(place_one(rng, taken, spacing, &mut sample));
    }
    placed
}

/// Place a single point; see `place_spread`
pub fn place_one<R, F>(rng: &mut R, taken: &mut Vec<Vec2>, spacing: Spacing, mut sample: F) -> Placement
where
    R: Rng,
    F: FnMut(&mut R) -> Vec2,
{
    let mut point = sample(rng);
    let mut best_clearance = clearance(taken, point);
    for _ in 1..spacing.attempts {
        if best_clearance >= spacing.min_distance {
            break;
        }
        let candidate = sample(rng);
        let c = clearance(taken, candidate);
        if c > best_clearance {
            point = candidate;
            best_clearance = c;
        }
    }
    taken.push(point);
    Placement {
        point,
        spaced: best_clearance >= spacing.min_distance,
    }
}

/// Distance from `point` to its nearest neighbour in `taken`
fn clearance(taken: &[Vec2], point: Vec2) -> f32 {
    taken
        .iter()
        .map(|p| p.distance(point))
        .fold(f32::INFINITY, f32::min)
}

/// Star and storm positions on the flight stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageLayout {
    pub goal: Vec2,
    pub hazards: Vec<Vec2>,
}

/// Roll a star and `HAZARD_COUNT` storms kept clear of `anchor` and each other
pub fn generate_sky<R: Rng>(rng: &mut R, anchor: Vec2) -> StageLayout {
    let spacing = Spacing::default();
    let mut taken = vec![anchor];

    let goal = place_one(rng, &mut taken, spacing, |rng: &mut R| {
        Vec2::new(20.0 + rng.random::<f32>() * 60.0, 20.0 + rng.random::<f32>() * 60.0)
    });

    let hazards = place_spread(rng, HAZARD_COUNT, &mut taken, spacing, |rng: &mut R| {
        Vec2::new(15.0 + rng.random::<f32>() * 70.0, 15.0 + rng.random::<f32>() * 70.0)
    });

    let fallbacks = hazards.iter().filter(|p| !p.spaced).count() + usize::from(!goal.spaced);
    if fallbacks > 0 {
        log::warn!("Sky layout kept {} crowded point(s)", fallbacks);
    }

    StageLayout {
        goal: goal.point,
        hazards: hazards.into_iter().map(|p| p.point).collect(),
    }
}
