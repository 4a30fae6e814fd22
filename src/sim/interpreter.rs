//! Discrete step-through interpreter
//!
//! Executes a program one effective block per `step()`. A REPEAT block takes
//! the single block after it as its body; each repetition is its own step.
//!
//! Per-step order:
//!   1. Resolve the next action (cursor / pending repeat)
//!   2. Apply it (move + cost, turn, sense, collect)
//!   3. Win check (after pickups, so the threshold counts this step)
//!   4. Energy exhaustion check
//!   5. Program exhaustion check

use super::grid::{Cell, Grid, Heading, TileKind};
use super::state::{ExecutionContext, FailCause, GridRules, Pickup, SimEvent, Verdict, WinRule};
use crate::catalog::BlockAction;

/// Outcome of a single step
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    /// More steps remain
    Continue,
    /// The run ended on this step (or had already ended)
    Finished(Verdict),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRepeat {
    body: BlockAction,
    remaining: u8,
}

/// One in-flight grid run; owns its world copy and context exclusively
#[derive(Debug, Clone)]
pub struct GridRun {
    world: Grid,
    rules: GridRules,
    ctx: ExecutionContext,
    program: Vec<BlockAction>,
    cursor: usize,
    repeat: Option<PendingRepeat>,
    verdict: Option<Verdict>,
    /// Program index of the block currently executing
    executing: Option<usize>,
    /// Position after every step, starting with the start cell
    trace: Vec<Cell>,
}

impl GridRun {
    pub fn new(world: Grid, rules: GridRules, program: Vec<BlockAction>) -> Self {
        let ctx = ExecutionContext::new(&world, &rules);
        let trace = vec![ctx.pos];
        Self {
            world,
            rules,
            ctx,
            program,
            cursor: 0,
            repeat: None,
            verdict: None,
            executing: None,
            trace,
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    pub fn world(&self) -> &Grid {
        &self.world
    }

    pub fn rules(&self) -> &GridRules {
        &self.rules
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn executing_index(&self) -> Option<usize> {
        self.executing
    }

    pub fn trace(&self) -> &[Cell] {
        &self.trace
    }

    /// Action the next `step()` will execute, if any
    pub fn peek_action(&self) -> Option<BlockAction> {
        if self.verdict.is_some() {
            return None;
        }
        if let Some(rep) = self.repeat {
            return Some(rep.body);
        }
        let mut cursor = self.cursor;
        while let Some(&action) = self.program.get(cursor) {
            match action {
                BlockAction::Repeat(_) => match self.program.get(cursor + 1) {
                    Some(&body) => return Some(body),
                    None => cursor += 1,
                },
                other => return Some(other),
            }
        }
        None
    }

    /// Execute one effective block
    pub fn step(&mut self, events: &mut Vec<SimEvent>) -> StepResult {
        if let Some(verdict) = &self.verdict {
            return StepResult::Finished(verdict.clone());
        }

        let Some(action) = self.next_action() else {
            return self.finish(Verdict::Fail(FailCause::Incomplete), events);
        };
        if let Some(index) = self.executing {
            events.push(SimEvent::Executing { index });
        }
        log::debug!("step {:?} at {} energy={}", action, self.ctx.pos, self.ctx.energy);

        if let Err(cause) = self.apply(action, events) {
            return self.finish(Verdict::Fail(cause), events);
        }
        self.trace.push(self.ctx.pos);

        if self.is_won() {
            return self.finish(Verdict::Win, events);
        }
        if self.ctx.energy == 0 {
            return self.finish(Verdict::Fail(FailCause::OutOfEnergy), events);
        }
        if self.is_exhausted() {
            return self.finish(Verdict::Fail(FailCause::Incomplete), events);
        }
        StepResult::Continue
    }

    /// Step until a verdict is reached
    pub fn run_to_end(&mut self, events: &mut Vec<SimEvent>) -> Verdict {
        loop {
            if let StepResult::Finished(verdict) = self.step(events) {
                return verdict;
            }
        }
    }

    fn finish(&mut self, verdict: Verdict, events: &mut Vec<SimEvent>) -> StepResult {
        log::info!("Grid run finished: {:?} at {}", verdict, self.ctx.pos);
        events.push(SimEvent::Finished {
            verdict: verdict.clone(),
        });
        self.verdict = Some(verdict.clone());
        StepResult::Finished(verdict)
    }

    /// Advance the cursor and return the action to execute now
    fn next_action(&mut self) -> Option<BlockAction> {
        if let Some(rep) = self.repeat.as_mut() {
            let body = rep.body;
            rep.remaining -= 1;
            if rep.remaining == 0 {
                self.repeat = None;
                self.cursor += 2;
            }
            return Some(body);
        }

        while let Some(&action) = self.program.get(self.cursor) {
            self.executing = Some(self.cursor);
            match action {
                BlockAction::Repeat(n) => match self.program.get(self.cursor + 1) {
                    Some(&body) if n > 0 => {
                        if n == 1 {
                            self.cursor += 2;
                        } else {
                            self.repeat = Some(PendingRepeat {
                                body,
                                remaining: n - 1,
                            });
                        }
                        return Some(body);
                    }
                    Some(_) => self.cursor += 2,
                    // Trailing repeat with no body does nothing
                    None => self.cursor += 1,
                },
                other => {
                    self.cursor += 1;
                    return Some(other);
                }
            }
        }
        None
    }

    fn is_exhausted(&self) -> bool {
        self.peek_action().is_none()
    }

    fn is_won(&self) -> bool {
        let collected = self.ctx.collected.len();
        match self.rules.win {
            WinRule::ReachGoal { required } => {
                self.world.tile(self.ctx.pos) == Some(TileKind::Goal) && collected >= required
            }
            WinRule::Collect { required } => collected >= required,
        }
    }

    fn apply(&mut self, action: BlockAction, events: &mut Vec<SimEvent>) -> Result<(), FailCause> {
        let costs = self.rules.costs;
        match action {
            BlockAction::MoveUp => self.advance(Heading::Up, events)?,
            BlockAction::MoveDown => self.advance(Heading::Down, events)?,
            BlockAction::MoveLeft => self.advance(Heading::Left, events)?,
            BlockAction::MoveRight => self.advance(Heading::Right, events)?,
            BlockAction::Step => self.advance(self.ctx.heading, events)?,
            BlockAction::TurnLeft | BlockAction::TurnRight => {
                self.ctx.heading = if action == BlockAction::TurnLeft {
                    self.ctx.heading.turn_left()
                } else {
                    self.ctx.heading.turn_right()
                };
                self.ctx.spend(costs.turn);
                events.push(SimEvent::Turned {
                    heading: self.ctx.heading,
                });
            }
            BlockAction::IfSwitch => {
                if !self.ctx.gate_open && self.world.tile(self.ctx.pos) == Some(TileKind::Switch) {
                    self.ctx.gate_open = true;
                    events.push(SimEvent::GateOpened);
                }
                self.ctx.spend(costs.sense);
            }
            BlockAction::Scan => {
                self.ctx.spend(costs.sense);
                events.push(SimEvent::Scanned);
            }
            BlockAction::Collect => {
                if self.rules.pickup == Pickup::OnCollect {
                    self.pick_up(events);
                }
                self.ctx.spend(costs.collect);
            }
            // Nested repeat bodies and stage-only blocks have no grid effect
            BlockAction::Repeat(_)
            | BlockAction::Forever
            | BlockAction::IfEdge
            | BlockAction::Bounce
            | BlockAction::Color
            | BlockAction::GoLeft
            | BlockAction::GoRight
            | BlockAction::IncScore
            | BlockAction::ResetScore => {}
        }
        Ok(())
    }

    /// Move one cell along `heading`; rejected moves leave the context untouched
    fn advance(&mut self, heading: Heading, events: &mut Vec<SimEvent>) -> Result<(), FailCause> {
        let target = self.ctx.pos.offset(heading);
        match self.world.tile(target) {
            None => return Err(FailCause::OffGrid { cell: target }),
            Some(tile) if !self.world.is_passable(target, self.ctx.gate_open) => {
                return Err(FailCause::Blocked { cell: target, tile });
            }
            Some(_) => {}
        }

        self.ctx.pos = target;
        self.ctx.spend(self.rules.costs.step);
        events.push(SimEvent::Moved { to: target });

        if self.rules.pickup == Pickup::OnEnter {
            self.pick_up(events);
        }
        Ok(())
    }

    /// Collect the tile underfoot (no effect once cleared)
    fn pick_up(&mut self, events: &mut Vec<SimEvent>) {
        let cell = self.ctx.pos;
        if self.world.clear_tile(cell) && self.ctx.collected.insert(cell) {
            events.push(SimEvent::Collected {
                cell,
                total: self.ctx.collected.len(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::levels::{RUINS_SOLUTION, maze_level, ruins_level};

    use BlockAction::*;

    fn lvl1() -> Grid {
        maze_level("lvl1").build().unwrap()
    }

    fn corridor(len: i32) -> Grid {
        Grid::filled(len, 1, TileKind::Path, Cell::new(0, 0), Heading::Right)
    }

    #[test]
    fn test_straight_flight_wins_with_two_coins() {
        let mut run = GridRun::new(lvl1(), GridRules::maze(), vec![MoveRight; 4]);
        let mut events = Vec::new();
        assert_eq!(run.run_to_end(&mut events), Verdict::Win);
        assert_eq!(run.context().collected.len(), 2);
        assert_eq!(run.context().pos, Cell::new(5, 1));
        assert_eq!(
            run.trace(),
            &[
                Cell::new(1, 1),
                Cell::new(2, 1),
                Cell::new(3, 1),
                Cell::new(4, 1),
                Cell::new(5, 1)
            ]
        );
    }

    #[test]
    fn test_wall_freezes_position() {
        let mut run = GridRun::new(lvl1(), GridRules::maze(), vec![MoveRight, MoveDown]);
        let mut events = Vec::new();
        let verdict = run.run_to_end(&mut events);
        assert_eq!(
            verdict,
            Verdict::Fail(FailCause::Blocked {
                cell: Cell::new(2, 2),
                tile: TileKind::Wall
            })
        );
        assert_eq!(run.context().pos, Cell::new(2, 1));
    }

    #[test]
    fn test_program_exhausted_is_incomplete() {
        let mut run = GridRun::new(lvl1(), GridRules::maze(), vec![MoveRight, MoveRight]);
        let mut events = Vec::new();
        assert_eq!(run.step(&mut events), StepResult::Continue);
        // Last block: verdict arrives on the same step
        assert_eq!(
            run.step(&mut events),
            StepResult::Finished(Verdict::Fail(FailCause::Incomplete))
        );
    }

    #[test]
    fn test_empty_program_fails_incomplete() {
        let mut run = GridRun::new(lvl1(), GridRules::maze(), vec![]);
        let mut events = Vec::new();
        assert_eq!(run.run_to_end(&mut events), Verdict::Fail(FailCause::Incomplete));
    }

    #[test]
    fn test_repeat_four_steps() {
        let mut run = GridRun::new(corridor(8), GridRules::ruins(), vec![Repeat(4), Step]);
        let mut events = Vec::new();
        let mut steps = 0;
        while run.step(&mut events) == StepResult::Continue {
            steps += 1;
        }
        assert_eq!(steps + 1, 4);
        assert_eq!(run.context().pos, Cell::new(4, 0));
        assert_eq!(run.context().energy, 100 - 16);
        assert_eq!(run.verdict(), Some(&Verdict::Fail(FailCause::Incomplete)));
    }

    #[test]
    fn test_repeat_then_continue() {
        let program = vec![Repeat(2), Step, TurnRight, Repeat(2), TurnLeft];
        let mut run = GridRun::new(corridor(8), GridRules::ruins(), program);
        let mut events = Vec::new();
        run.run_to_end(&mut events);
        assert_eq!(run.context().pos, Cell::new(2, 0));
        // Right, then turn right (Down), then two left turns (Up)
        assert_eq!(run.context().heading, Heading::Up);
        assert_eq!(run.context().energy, 100 - 8 - 2 - 4);
    }

    #[test]
    fn test_trailing_repeat_is_skipped() {
        let mut run = GridRun::new(corridor(4), GridRules::ruins(), vec![Step, Repeat(2)]);
        let mut events = Vec::new();
        assert_eq!(
            run.step(&mut events),
            StepResult::Finished(Verdict::Fail(FailCause::Incomplete))
        );
        assert_eq!(run.context().pos, Cell::new(1, 0));
    }

    #[test]
    fn test_nested_repeat_body_is_inert() {
        let program = vec![Repeat(2), Repeat(4), Step];
        let mut run = GridRun::new(corridor(8), GridRules::ruins(), program);
        let mut events = Vec::new();
        run.run_to_end(&mut events);
        // Outer repeat ran the inner block twice as no-ops, then one Step
        assert_eq!(run.context().pos, Cell::new(1, 0));
        assert_eq!(run.trace().len(), 4);
    }

    #[test]
    fn test_gate_needs_switch() {
        let mut world = corridor(4);
        world.set_tile(Cell::new(1, 0), TileKind::Switch);
        world.set_tile(Cell::new(2, 0), TileKind::Gate);
        world.set_tile(Cell::new(3, 0), TileKind::Goal);
        let rules = GridRules {
            win: WinRule::ReachGoal { required: 0 },
            ..GridRules::ruins()
        };

        let mut locked = GridRun::new(world.clone(), rules, vec![Step, Step]);
        let mut events = Vec::new();
        assert!(matches!(
            locked.run_to_end(&mut events),
            Verdict::Fail(FailCause::Blocked { tile: TileKind::Gate, .. })
        ));

        let mut open = GridRun::new(world, rules, vec![Step, IfSwitch, Step, Step]);
        assert_eq!(open.run_to_end(&mut events), Verdict::Win);
        assert!(events.contains(&SimEvent::GateOpened));
    }

    #[test]
    fn test_goal_without_enough_crystals_passes_through() {
        let mut world = corridor(4);
        world.set_tile(Cell::new(1, 0), TileKind::Goal);
        let mut run = GridRun::new(world, GridRules::ruins(), vec![Step, Step]);
        let mut events = Vec::new();
        assert_eq!(run.step(&mut events), StepResult::Continue);
        assert_eq!(run.context().pos, Cell::new(1, 0));
        run.step(&mut events);
        assert_eq!(run.context().pos, Cell::new(2, 0));
    }

    #[test]
    fn test_collect_is_idempotent() {
        let mut world = corridor(3);
        world.set_tile(Cell::new(1, 0), TileKind::Collectible);
        let program = vec![Step, Collect, Collect, Collect];
        let mut run = GridRun::new(world, GridRules::ruins(), program);
        let mut events = Vec::new();
        run.run_to_end(&mut events);
        assert_eq!(run.context().collected.len(), 1);
        let pickups = events
            .iter()
            .filter(|e| matches!(e, SimEvent::Collected { .. }))
            .count();
        assert_eq!(pickups, 1);
        assert_eq!(run.world().tile(Cell::new(1, 0)), Some(TileKind::Path));
    }

    #[test]
    fn test_threshold_wins_on_same_step() {
        let mut world = corridor(6);
        for x in 1..=3 {
            world.set_tile(Cell::new(x, 0), TileKind::Collectible);
        }
        let program = vec![Step, Collect, Step, Collect, Step, Collect, Step, Step];
        let mut run = GridRun::new(world, GridRules::miner(), program);
        let mut events = Vec::new();
        assert_eq!(run.run_to_end(&mut events), Verdict::Win);
        // Remaining steps never ran
        assert_eq!(run.context().pos, Cell::new(3, 0));
        assert_eq!(run.executing_index(), Some(5));
    }

    #[test]
    fn test_energy_exhaustion() {
        let mut run = GridRun::new(corridor(40), GridRules::miner(), vec![Step; 20]);
        let mut events = Vec::new();
        assert_eq!(run.run_to_end(&mut events), Verdict::Fail(FailCause::OutOfEnergy));
        // 100 / 8 rounds up to 13 steps
        assert_eq!(run.context().pos, Cell::new(13, 0));
        assert_eq!(run.context().energy, 0);
    }

    #[test]
    fn test_ruins_solution() {
        let program: Vec<BlockAction> = RUINS_SOLUTION
            .iter()
            .filter_map(|s| BlockAction::from_str(s))
            .collect();
        assert_eq!(program.len(), RUINS_SOLUTION.len());
        let mut run = GridRun::new(ruins_level(), GridRules::ruins(), program);
        let mut events = Vec::new();
        assert_eq!(run.run_to_end(&mut events), Verdict::Win);
        assert_eq!(run.context().pos, Cell::new(7, 0));
        assert_eq!(run.context().collected.len(), 3);
    }

    #[test]
    fn test_off_grid() {
        let mut run = GridRun::new(corridor(2), GridRules::ruins(), vec![TurnLeft, Step]);
        let mut events = Vec::new();
        assert_eq!(
            run.run_to_end(&mut events),
            Verdict::Fail(FailCause::OffGrid {
                cell: Cell::new(0, -1)
            })
        );
        // The turn still cost energy; the failed move did not
        assert_eq!(run.context().energy, 98);
    }
}
