//! Block catalog
//!
//! The closed vocabulary of blocks a learner can place, and which of them
//! each game variant accepts. Pure data; no side effects.

use serde::{Deserialize, Serialize};

/// Operation a block asks the interpreter to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    /// One cell forward along the current heading
    Step,
    TurnLeft,
    TurnRight,
    /// Opens the gate when executed on a switch tile
    IfSwitch,
    Collect,
    Scan,
    /// Runs the following block `n` times
    Repeat(u8),
    Forever,
    IfEdge,
    Bounce,
    Color,
    GoLeft,
    GoRight,
    IncScore,
    ResetScore,
}

impl BlockAction {
    /// Wire name used by level solutions and saved programs
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockAction::MoveUp => "MOVE_UP",
            BlockAction::MoveDown => "MOVE_DOWN",
            BlockAction::MoveLeft => "MOVE_LEFT",
            BlockAction::MoveRight => "MOVE_RIGHT",
            BlockAction::Step => "STEP",
            BlockAction::TurnLeft => "TURN_L",
            BlockAction::TurnRight => "TURN_R",
            BlockAction::IfSwitch => "IF_SWITCH",
            BlockAction::Collect => "COLLECT",
            BlockAction::Scan => "SCAN",
            BlockAction::Repeat(2) => "REPEAT_2",
            BlockAction::Repeat(4) => "REPEAT_4",
            BlockAction::Repeat(_) => "REPEAT_N",
            BlockAction::Forever => "FOREVER",
            BlockAction::IfEdge => "IF_EDGE",
            BlockAction::Bounce => "BOUNCE",
            BlockAction::Color => "COLOR",
            BlockAction::GoLeft => "GO_LEFT",
            BlockAction::GoRight => "GO_RIGHT",
            BlockAction::IncScore => "INC_SCORE",
            BlockAction::ResetScore => "SET_SCORE_0",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let action = match s {
            "MOVE_UP" => BlockAction::MoveUp,
            "MOVE_DOWN" => BlockAction::MoveDown,
            "MOVE_LEFT" => BlockAction::MoveLeft,
            "MOVE_RIGHT" => BlockAction::MoveRight,
            "STEP" => BlockAction::Step,
            "TURN_L" => BlockAction::TurnLeft,
            "TURN_R" => BlockAction::TurnRight,
            "IF_SWITCH" => BlockAction::IfSwitch,
            "COLLECT" => BlockAction::Collect,
            "SCAN" => BlockAction::Scan,
            "REPEAT_2" => BlockAction::Repeat(2),
            "REPEAT_4" => BlockAction::Repeat(4),
            "FOREVER" => BlockAction::Forever,
            "IF_EDGE" => BlockAction::IfEdge,
            "BOUNCE" => BlockAction::Bounce,
            "COLOR" => BlockAction::Color,
            "GO_LEFT" => BlockAction::GoLeft,
            "GO_RIGHT" => BlockAction::GoRight,
            "INC_SCORE" => BlockAction::IncScore,
            "SET_SCORE_0" => BlockAction::ResetScore,
            _ => return None,
        };
        Some(action)
    }
}

/// Palette grouping shown to the learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockCategory {
    Motion,
    Control,
    Sensor,
    Logic,
    Looks,
    Variable,
}

/// A catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDef {
    pub id: &'static str,
    pub action: BlockAction,
    pub label: &'static str,
    pub category: BlockCategory,
    pub icon: &'static str,
}

const fn def(
    id: &'static str,
    action: BlockAction,
    label: &'static str,
    category: BlockCategory,
    icon: &'static str,
) -> BlockDef {
    BlockDef {
        id,
        action,
        label,
        category,
        icon,
    }
}

/// Every block known to the engine
pub static CATALOG: &[BlockDef] = &[
    def("b1", BlockAction::MoveRight, "MOVE RIGHT", BlockCategory::Motion, "➡️"),
    def("b2", BlockAction::MoveLeft, "MOVE LEFT", BlockCategory::Motion, "⬅️"),
    def("b3", BlockAction::MoveUp, "MOVE UP", BlockCategory::Motion, "⬆️"),
    def("b4", BlockAction::MoveDown, "MOVE DOWN", BlockCategory::Motion, "⬇️"),
    def("l1", BlockAction::Step, "STEP", BlockCategory::Motion, "👣"),
    def("l2", BlockAction::TurnLeft, "TURN LEFT", BlockCategory::Motion, "↩️"),
    def("l3", BlockAction::TurnRight, "TURN RIGHT", BlockCategory::Motion, "↪️"),
    def("l4", BlockAction::IfSwitch, "IF SWITCH", BlockCategory::Logic, "🔑"),
    def("l5", BlockAction::Collect, "COLLECT", BlockCategory::Logic, "⭐"),
    def("l6", BlockAction::Repeat(2), "REPEAT 2", BlockCategory::Control, "🔁"),
    def("l7", BlockAction::Repeat(4), "REPEAT 4", BlockCategory::Control, "🔁"),
    def("sb1", BlockAction::Step, "STEP", BlockCategory::Motion, "🚀"),
    def("sb2", BlockAction::TurnRight, "TURN", BlockCategory::Motion, "↪️"),
    def("sb3", BlockAction::Scan, "SCAN", BlockCategory::Sensor, "📡"),
    def("sb4", BlockAction::Collect, "GEMS", BlockCategory::Logic, "💎"),
    def("c1", BlockAction::Forever, "FOREVER", BlockCategory::Control, "♾️"),
    def("c2", BlockAction::IfEdge, "IF EDGE", BlockCategory::Control, "🧱"),
    def("c3", BlockAction::Bounce, "BOUNCE", BlockCategory::Motion, "🏓"),
    def("c4", BlockAction::Color, "COLOR", BlockCategory::Looks, "🎨"),
    def("v1", BlockAction::ResetScore, "RESET SCORE", BlockCategory::Variable, "🔄"),
    def("v2", BlockAction::IncScore, "SCORE +1", BlockCategory::Variable, "➕"),
    def("v3", BlockAction::GoLeft, "GO LEFT", BlockCategory::Motion, "⬅️"),
    def("v4", BlockAction::GoRight, "GO RIGHT", BlockCategory::Motion, "➡️"),
];

/// Look up a block by catalog id
pub fn lookup(id: &str) -> Option<&'static BlockDef> {
    CATALOG.iter().find(|b| b.id == id)
}

/// Game variants sharing the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    /// Fixed-direction moves through a literal level
    Maze { level_id: String },
    /// Heading-based grid with switch, gate and crystals
    Ruins,
    /// Heading-based grid with random gems and asteroids
    Miner,
    /// Continuous flight around storms, collecting stars
    Flight,
    /// Continuous paddle catching falling fruit
    Catch,
}

impl Variant {
    pub fn maze(level_id: impl Into<String>) -> Self {
        Variant::Maze {
            level_id: level_id.into(),
        }
    }

    /// Catalog ids offered in this variant's toolbox, in display order
    fn palette_ids(&self) -> &'static [&'static str] {
        match self {
            Variant::Maze { .. } => &["b1", "b2", "b3", "b4"],
            Variant::Ruins => &["l1", "l2", "l3", "l4", "l5", "l6", "l7"],
            Variant::Miner => &["sb1", "sb2", "sb3", "sb4"],
            Variant::Flight => &["c1", "c2", "c3", "c4", "b3", "b1"],
            Variant::Catch => &["v1", "v2", "v3", "v4"],
        }
    }

    pub fn palette(&self) -> Vec<&'static BlockDef> {
        self.palette_ids().iter().filter_map(|id| lookup(id)).collect()
    }

    /// Palette block that produces `action`, if this variant offers one
    pub fn block_for(&self, action: BlockAction) -> Option<&'static BlockDef> {
        self.palette_ids()
            .iter()
            .filter_map(|id| lookup(id))
            .find(|b| b.action == action)
    }

    /// Whether the interpreter for this variant understands `action`
    pub fn supports(&self, action: BlockAction) -> bool {
        self.block_for(action).is_some()
    }

    /// Continuous variants tick every frame; discrete ones step per block
    pub fn is_continuous(&self) -> bool {
        matches!(self, Variant::Flight | Variant::Catch)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Maze { .. } => "maze",
            Variant::Ruins => "ruins",
            Variant::Miner => "miner",
            Variant::Flight => "flight",
            Variant::Catch => "catch",
        }
    }
}
