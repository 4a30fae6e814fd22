//! Block Quest - block-coding sandbox engine
//!
//! Core modules:
//! - `catalog`: Static block vocabulary and per-variant palettes
//! - `program`: The learner's editable block sequence
//! - `sim`: Deterministic simulation (grid interpreter, stage tick, level generation)
//! - `driver`: Cancellable fixed-interval step scheduling
//! - `session`: Run state machine and progression callbacks
//! - `progress`: Reference progression record
//! - `settings`: Timing and seed configuration

pub mod catalog;
pub mod driver;
pub mod program;
pub mod progress;
pub mod session;
pub mod settings;
pub mod sim;

pub use catalog::{BlockAction, BlockCategory, BlockDef, Variant};
pub use driver::StepDriver;
pub use program::{BlockInstance, InstanceId, Program};
pub use progress::{ProgressRecord, Progression};
pub use session::{GameSession, SessionState};
pub use settings::Settings;

/// Engine constants
pub mod consts {
    /// Continuous stage spans 0..STAGE_SIZE on both axes
    pub const STAGE_SIZE: f32 = 100.0;
    /// Avatar must stay at least this far from every stage edge
    pub const EDGE_MARGIN: f32 = 10.0;
    /// Proximity radius for hazard and star contact
    pub const CONTACT_RADIUS: f32 = 10.0;

    /// Flight avatar defaults
    pub const FLIGHT_START: (f32, f32) = (50.0, 50.0);
    pub const FLIGHT_HEADING: (f32, f32) = (1.0, 0.5);
    pub const FLIGHT_START_SPEED: f32 = 0.7;
    /// Multiplicative speed decay per tick without FOREVER
    pub const SPEED_DECAY: f32 = 0.99;
    /// Below this speed the run stalls out
    pub const STALL_SPEED: f32 = 0.1;
    /// Stars needed to win a flight run
    pub const STARS_TO_WIN: u32 = 5;
    /// Storm hazards per layout
    pub const HAZARD_COUNT: usize = 3;

    /// Minimum spacing between special points on the stage
    pub const MIN_SPAWN_DISTANCE: f32 = 20.0;
    /// Placement attempts per point before falling back
    pub const SPAWN_ATTEMPTS: u32 = 15;

    /// Catch variant
    pub const CATCH_START_X: f32 = 50.0;
    pub const CATCH_MIN_X: f32 = 10.0;
    pub const CATCH_MAX_X: f32 = 90.0;
    pub const CATCH_DRIFT: f32 = 0.8;
    pub const FRUIT_FALL_SPEED: f32 = 0.8;
    pub const FRUIT_SPAWN_FRAMES: u64 = 60;
    pub const SCORE_TO_WIN: u32 = 10;

    /// Units passed to `on_collect` after a continuous-mode win
    pub const STAGE_REWARD: u32 = 50;
}

