//! Continuous stage state
//!
//! In the continuous variants the program is a static configuration: which
//! blocks are present matters, their order does not.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::levels::StageLayout;
use super::state::{TRAIL_LENGTH, TrailPoint};
use crate::catalog::BlockAction;
use crate::consts::*;
use crate::program::Program;

/// Flight behaviours enabled by block presence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlightBehaviors {
    /// Disables speed decay (and the heading overrides)
    pub forever: bool,
    pub if_edge: bool,
    pub bounce: bool,
    /// Re-tint on every bounce
    pub color: bool,
    pub up: bool,
    pub right: bool,
}

impl FlightBehaviors {
    pub fn from_program(program: &Program) -> Self {
        Self {
            forever: program.contains(BlockAction::Forever),
            if_edge: program.contains(BlockAction::IfEdge),
            bounce: program.contains(BlockAction::Bounce),
            color: program.contains(BlockAction::Color),
            up: program.contains(BlockAction::MoveUp),
            right: program.contains(BlockAction::MoveRight),
        }
    }

    /// Edge reflection needs both halves of the pair
    #[inline]
    pub fn bounces(&self) -> bool {
        self.if_edge && self.bounce
    }
}

/// The flight avatar and its stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightState {
    pub pos: Vec2,
    pub heading: Vec2,
    pub speed: f32,
    pub stars: u32,
    pub goal: Vec2,
    pub hazards: Vec<Vec2>,
    pub behaviors: FlightBehaviors,
    /// Cosmetic tint picked on bounces when COLOR is present
    pub tint_hue: Option<f32>,
    pub ticks: u64,
    /// Recent positions, newest first (not gameplay-affecting)
    #[serde(skip)]
    pub trail: Vec<TrailPoint>,
}

impl FlightState {
    /// Fresh avatar at the start position with the given layout
    pub fn new(layout: StageLayout, behaviors: FlightBehaviors) -> Self {
        let mut heading = Vec2::new(FLIGHT_HEADING.0, FLIGHT_HEADING.1);
        if !behaviors.forever {
            if behaviors.up {
                heading.y = -1.0;
            }
            if behaviors.right {
                heading.x = 1.0;
            }
        }
        Self {
            pos: Vec2::new(FLIGHT_START.0, FLIGHT_START.1),
            heading,
            speed: FLIGHT_START_SPEED,
            stars: 0,
            goal: layout.goal,
            hazards: layout.hazards,
            behaviors,
            tint_hue: None,
            ticks: 0,
            trail: Vec::with_capacity(TRAIL_LENGTH),
        }
    }

    pub fn set_layout(&mut self, layout: StageLayout) {
        self.goal = layout.goal;
        self.hazards = layout.hazards;
    }

    /// Record current position to trail
    pub fn record_trail(&mut self) {
        self.trail.insert(0, TrailPoint { pos: self.pos });
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.pop();
        }
    }
}

/// Fruit kinds (cosmetic)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FruitKind {
    Apple,
    Cherry,
    Banana,
}

/// A falling fruit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fruit {
    pub id: u32,
    pub pos: Vec2,
    pub kind: FruitKind,
}

/// Catch behaviours enabled by the program
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CatchBehaviors {
    /// Net horizontal drift per tick
    pub drift: f32,
    /// Catches only score with INC_SCORE present
    pub scoring: bool,
}

impl CatchBehaviors {
    pub fn from_program(program: &Program) -> Self {
        let rights = program.count(BlockAction::GoRight) as f32;
        let lefts = program.count(BlockAction::GoLeft) as f32;
        Self {
            drift: (rights - lefts) * CATCH_DRIFT,
            scoring: program.contains(BlockAction::IncScore),
        }
    }
}

/// The catcher and falling fruit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchState {
    pub player_x: f32,
    pub fruits: Vec<Fruit>,
    pub score: u32,
    pub frame: u64,
    pub behaviors: CatchBehaviors,
    next_id: u32,
}

impl CatchState {
    pub fn new(behaviors: CatchBehaviors) -> Self {
        Self {
            player_x: CATCH_START_X,
            fruits: Vec::new(),
            score: 0,
            frame: 0,
            behaviors,
            next_id: 1,
        }
    }

    /// Allocate a new fruit ID
    pub fn next_fruit_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::lookup;

    fn program(ids: &[&str]) -> Program {
        let mut p = Program::new();
        for id in ids {
            p.append(lookup(id).unwrap());
        }
        p
    }

    fn layout() -> StageLayout {
        StageLayout {
            goal: Vec2::new(20.0, 20.0),
            hazards: vec![],
        }
    }

    #[test]
    fn test_behaviors_ignore_order() {
        let a = FlightBehaviors::from_program(&program(&["c1", "c2", "c3"]));
        let b = FlightBehaviors::from_program(&program(&["c3", "c1", "c2"]));
        assert_eq!(a, b);
        assert!(a.bounces() && a.forever && !a.color);
    }

    #[test]
    fn test_heading_overrides() {
        let b = FlightBehaviors::from_program(&program(&["b3", "b1"]));
        let s = FlightState::new(layout(), b);
        assert_eq!(s.heading, Vec2::new(1.0, -1.0));

        // FOREVER keeps the default heading
        let b = FlightBehaviors::from_program(&program(&["b3", "c1"]));
        let s = FlightState::new(layout(), b);
        assert_eq!(s.heading, Vec2::new(1.0, 0.5));
    }

    #[test]
    fn test_trail_bounded() {
        let mut s = FlightState::new(layout(), FlightBehaviors::default());
        for i in 0..25 {
            s.pos.x = i as f32;
            s.record_trail();
        }
        assert_eq!(s.trail.len(), TRAIL_LENGTH);
        assert_eq!(s.trail[0].pos.x, 24.0);
    }

    #[test]
    fn test_catch_drift() {
        let b = CatchBehaviors::from_program(&program(&["v3", "v4", "v4", "v2"]));
        assert!((b.drift - CATCH_DRIFT).abs() < 1e-6);
        assert!(b.scoring);
    }
}
