//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Discrete steps for the grid variants, fixed frames for the stage variants
//! - Seeded RNG only
//! - Stable iteration order
//! - No timing or platform dependencies (scheduling lives in `driver`)

pub mod collision;
pub mod grid;
pub mod interpreter;
pub mod levels;
pub mod stage;
pub mod state;
pub mod tick;

pub use collision::{EdgeHit, edge_hit, first_contact, in_contact};
pub use grid::{Cell, Grid, Heading, LevelError, TileKind};
pub use interpreter::{GridRun, StepResult};
pub use levels::{
    MAZE_LEVELS, MazeLevel, RUINS_SOLUTION, StageLayout, generate_mine, generate_sky, maze_level, ruins_level,
};
pub use stage::{CatchBehaviors, CatchState, FlightBehaviors, FlightState, Fruit, FruitKind};
pub use state::{ExecutionContext, FailCause, GridRules, SimEvent, Verdict};
pub use tick::{tick_catch, tick_flight};
