//! Run state and core simulation types
//!
//! Everything an in-flight interpretation owns lives here.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::grid::{Cell, Grid, Heading, TileKind};

/// Terminal result of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    Win,
    Fail(FailCause),
}

/// Why a run failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FailCause {
    /// Move target outside the grid
    OffGrid { cell: Cell },
    /// Move target is a wall or a closed gate
    Blocked { cell: Cell, tile: TileKind },
    OutOfEnergy,
    /// Program ran out before the goal was reached
    Incomplete,
    /// Speed decayed below the stall threshold
    Stalled,
    /// Touched a stage edge without bounce behaviour
    HitEdge,
    /// Flew into a hazard
    Hazard { index: usize },
}

impl FailCause {
    /// Human-readable cause for the failure screen
    pub fn message(&self) -> String {
        match self {
            FailCause::OffGrid { .. } => "Oops! You flew off the map!".to_string(),
            FailCause::Blocked { tile: TileKind::Gate, cell } => {
                format!("The gate at {} is still locked!", cell)
            }
            FailCause::Blocked { cell, .. } => format!("Oops! You crashed into a tree at {}!", cell),
            FailCause::OutOfEnergy => "Out of energy!".to_string(),
            FailCause::Incomplete => "Mission incomplete!".to_string(),
            FailCause::Stalled => "Ran out of speed!".to_string(),
            FailCause::HitEdge => "Flew out of bounds!".to_string(),
            FailCause::Hazard { .. } => "Zapped by a storm cloud!".to_string(),
        }
    }
}

impl std::fmt::Display for FailCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Presentation events raised by the simulation (no gameplay effect)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Block at this program index started executing
    Executing { index: usize },
    Moved { to: Cell },
    Turned { heading: Heading },
    Collected { cell: Cell, total: usize },
    GateOpened,
    Scanned,
    Bounced { tint_hue: Option<f32> },
    StarCaught { total: u32 },
    FruitCaught { score: u32 },
    LayoutRerolled,
    Celebrating,
    Finished { verdict: Verdict },
}

/// Energy cost per action kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Costs {
    pub step: u32,
    pub turn: u32,
    /// IF_SWITCH and SCAN
    pub sense: u32,
    pub collect: u32,
}

/// How collectibles are picked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pickup {
    /// Entering the tile collects it
    OnEnter,
    /// Only the COLLECT block collects the tile underfoot
    OnCollect,
}

/// When a grid run is won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinRule {
    /// Stand on a goal tile holding at least `required` collectibles
    ReachGoal { required: usize },
    /// Hold at least `required` collectibles anywhere
    Collect { required: usize },
}

/// Amount passed to `on_collect` after a win
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reward {
    /// Number of collectibles picked up during the run
    Collected,
    Fixed(u32),
}

/// Rule set of a discrete variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRules {
    pub costs: Costs,
    pub start_energy: u32,
    pub pickup: Pickup,
    pub win: WinRule,
    pub reward: Reward,
    /// Hold a celebration before declaring the win
    pub celebrate: bool,
}

impl GridRules {
    pub fn maze() -> Self {
        Self {
            costs: Costs::default(),
            start_energy: 100,
            pickup: Pickup::OnEnter,
            win: WinRule::ReachGoal { required: 0 },
            reward: Reward::Collected,
            celebrate: true,
        }
    }

    pub fn ruins() -> Self {
        Self {
            costs: Costs {
                step: 4,
                turn: 2,
                sense: 5,
                collect: 5,
            },
            start_energy: 100,
            pickup: Pickup::OnCollect,
            win: WinRule::ReachGoal { required: 3 },
            reward: Reward::Fixed(100),
            celebrate: false,
        }
    }

    pub fn miner() -> Self {
        Self {
            costs: Costs {
                step: 8,
                turn: 3,
                sense: 5,
                collect: 5,
            },
            start_energy: 100,
            pickup: Pickup::OnCollect,
            win: WinRule::Collect { required: 3 },
            reward: Reward::Fixed(50),
            celebrate: false,
        }
    }
}

/// The interpreter's live state for one grid run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub pos: Cell,
    pub heading: Heading,
    /// Never negative; only ever decreases during a run
    pub energy: u32,
    pub collected: BTreeSet<Cell>,
    pub gate_open: bool,
}

impl ExecutionContext {
    /// Fresh context at the grid's declared start
    pub fn new(grid: &Grid, rules: &GridRules) -> Self {
        Self {
            pos: grid.start(),
            heading: grid.start_heading(),
            energy: rules.start_energy,
            collected: BTreeSet::new(),
            gate_open: false,
        }
    }

    /// Deduct `cost`, clamping at zero
    #[inline]
    pub fn spend(&mut self, cost: u32) {
        self.energy = self.energy.saturating_sub(cost);
    }
}

/// Trail point for avatar rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
}

/// Maximum number of trail points to store
pub const TRAIL_LENGTH: usize = 10;

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}
