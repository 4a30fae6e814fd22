//! Game session controller
//!
//! Owns the run state machine:
//!
//! ```text
//! IDLE --run--> RUNNING --+--> CELEBRATING --dwell--> WIN
//!                         +--> WIN
//!                         +--> FAIL
//! any --reset--> IDLE
//! ```
//!
//! The session is the only caller of the progression callbacks. Each fires
//! at most once per winning run and never on FAIL.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::catalog::{BlockAction, Variant, lookup};
use crate::consts::*;
use crate::driver::StepDriver;
use crate::program::{BlockInstance, InstanceId, Program};
use crate::progress::Progression;
use crate::settings::Settings;
use crate::sim::state::{Reward, RngState};
use crate::sim::{
    CatchBehaviors, CatchState, FlightBehaviors, FlightState, Grid, GridRules, GridRun,
    LevelError, SimEvent, StageLayout, StepResult, Verdict, generate_mine, generate_sky,
    maze_level, ruins_level, tick_catch, tick_flight,
};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    /// Goal reached; holding the summary before WIN
    Celebrating,
    Win,
    Fail,
}

impl SessionState {
    /// A run is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Running | SessionState::Celebrating)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Win | SessionState::Fail)
    }
}

/// World a run starts from
#[derive(Debug, Clone)]
pub enum Template {
    Grid { grid: Grid, rules: GridRules },
    Sky(StageLayout),
    Orchard,
}

/// The run in flight
#[derive(Debug, Clone)]
pub enum ActiveRun {
    Grid(GridRun),
    Flight(FlightState),
    Catch(CatchState),
}

fn load_template(variant: &Variant, rng: &mut Pcg32) -> Result<Template, LevelError> {
    Ok(match variant {
        Variant::Maze { level_id } => Template::Grid {
            grid: maze_level(level_id).build()?,
            rules: GridRules::maze(),
        },
        Variant::Ruins => Template::Grid {
            grid: ruins_level(),
            rules: GridRules::ruins(),
        },
        Variant::Miner => Template::Grid {
            grid: generate_mine(rng),
            rules: GridRules::miner(),
        },
        Variant::Flight => {
            Template::Sky(generate_sky(rng, Vec2::new(FLIGHT_START.0, FLIGHT_START.1)))
        }
        Variant::Catch => Template::Orchard,
    })
}

/// One learner session for one variant
pub struct GameSession<P: Progression> {
    variant: Variant,
    settings: Settings,
    program: Program,
    state: SessionState,
    template: Template,
    run: Option<ActiveRun>,
    rng_state: RngState,
    rng: Pcg32,
    driver: StepDriver,
    verdict: Option<Verdict>,
    rewarded: bool,
    events: Vec<SimEvent>,
    progression: P,
}

impl<P: Progression> GameSession<P> {
    pub fn new(variant: Variant, settings: Settings, progression: P) -> Result<Self, LevelError> {
        let rng_state = RngState::new(settings.resolve_seed());
        let mut rng = rng_state.to_rng();
        let template = load_template(&variant, &mut rng)?;
        let driver = StepDriver::new(
            settings.interval_for(&variant),
            settings.max_steps_per_update,
        );
        log::info!("New {} session (seed {})", variant.name(), rng_state.seed);

        Ok(Self {
            variant,
            settings,
            program: Program::new(),
            state: SessionState::Idle,
            template,
            run: None,
            rng_state,
            rng,
            driver,
            verdict: None,
            rewarded: false,
            events: Vec::new(),
            progression,
        })
    }

    // === Accessors ===

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn active_run(&self) -> Option<&ActiveRun> {
        self.run.as_ref()
    }

    pub fn grid_run(&self) -> Option<&GridRun> {
        match &self.run {
            Some(ActiveRun::Grid(run)) => Some(run),
            _ => None,
        }
    }

    pub fn flight(&self) -> Option<&FlightState> {
        match &self.run {
            Some(ActiveRun::Flight(state)) => Some(state),
            _ => None,
        }
    }

    pub fn catch_state(&self) -> Option<&CatchState> {
        match &self.run {
            Some(ActiveRun::Catch(state)) => Some(state),
            _ => None,
        }
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    /// Learner-facing failure message
    pub fn fail_message(&self) -> Option<String> {
        match &self.verdict {
            Some(Verdict::Fail(cause)) => Some(cause.message()),
            _ => None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.rng_state.seed
    }

    /// Opaque skin id for the presentation layer
    pub fn active_skin(&self) -> &str {
        &self.settings.active_skin
    }

    pub fn progression(&self) -> &P {
        &self.progression
    }

    pub fn into_progression(self) -> P {
        self.progression
    }

    /// Take buffered presentation events
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    // === Editing ===

    /// Append a palette block by catalog id
    pub fn append(&mut self, block_id: &str) -> Option<InstanceId> {
        let Some(def) = lookup(block_id) else {
            log::warn!("Unknown block id {}", block_id);
            return None;
        };
        if !self.variant.supports(def.action) {
            log::warn!("Block {} is not offered in {}", block_id, self.variant.name());
            return None;
        }
        self.program.append(def)
    }

    pub fn remove_at(&mut self, index: usize) -> Option<BlockInstance> {
        self.program.remove_at(index)
    }

    pub fn clear_program(&mut self) {
        self.program.clear();
    }

    // === Lifecycle ===

    /// Start a run; only accepted from IDLE with a non-empty program
    pub fn run(&mut self) -> bool {
        if self.state != SessionState::Idle {
            log::debug!("Run ignored in state {:?}", self.state);
            return false;
        }
        if self.program.is_empty() {
            log::info!("Nothing to run");
            return false;
        }

        let run = match &self.template {
            Template::Grid { grid, rules } => {
                ActiveRun::Grid(GridRun::new(grid.clone(), *rules, self.program.actions()))
            }
            Template::Sky(layout) => ActiveRun::Flight(FlightState::new(
                layout.clone(),
                FlightBehaviors::from_program(&self.program),
            )),
            Template::Orchard => {
                ActiveRun::Catch(CatchState::new(CatchBehaviors::from_program(&self.program)))
            }
        };

        self.program.set_frozen(true);
        self.run = Some(run);
        self.verdict = None;
        self.rewarded = false;
        self.state = SessionState::Running;
        self.driver.start();
        log::info!(
            "Run started: {} with {} blocks",
            self.variant.name(),
            self.program.len()
        );
        true
    }

    /// Feed elapsed seconds; performs every step that has come due
    pub fn update(&mut self, dt: f32) {
        self.driver.advance(dt);
        while self.driver.next_due() {
            match self.state {
                SessionState::Running => self.step_once(),
                SessionState::Celebrating => self.enter_win(),
                _ => self.driver.cancel(),
            }
        }
    }

    /// Back to IDLE from any state, discarding the run
    pub fn reset(&mut self) {
        self.driver.cancel();
        self.run = None;
        self.verdict = None;
        self.rewarded = false;
        self.state = SessionState::Idle;
        self.program.set_frozen(false);

        if matches!(self.variant, Variant::Miner | Variant::Flight) {
            match load_template(&self.variant, &mut self.rng) {
                Ok(template) => self.template = template,
                Err(e) => log::warn!("Keeping previous world: {}", e),
            }
        }
        log::debug!("Session reset");
    }

    /// Switch to another variant or level; clears the program
    pub fn load(&mut self, variant: Variant) -> Result<(), LevelError> {
        let template = load_template(&variant, &mut self.rng)?;
        self.reset();
        self.program.clear();
        self.driver = StepDriver::new(
            self.settings.interval_for(&variant),
            self.settings.max_steps_per_update,
        );
        self.template = template;
        log::info!("Loaded {}", variant.name());
        self.variant = variant;
        Ok(())
    }

    fn step_once(&mut self) {
        let Some(run) = self.run.as_mut() else {
            self.driver.cancel();
            return;
        };

        let verdict = match run {
            ActiveRun::Grid(grid_run) => {
                let scanning = grid_run.peek_action() == Some(BlockAction::Scan);
                match grid_run.step(&mut self.events) {
                    StepResult::Continue => {
                        if scanning {
                            self.driver.delay_next(self.settings.scan_delay);
                        }
                        None
                    }
                    StepResult::Finished(verdict) => Some(verdict),
                }
            }
            ActiveRun::Flight(state) => tick_flight(state, &mut self.rng, &mut self.events),
            ActiveRun::Catch(state) => tick_catch(state, &mut self.rng, &mut self.events),
        };

        if let Some(verdict) = verdict {
            self.conclude(verdict);
        }
    }

    fn celebrates(&self) -> bool {
        matches!(&self.template, Template::Grid { rules, .. } if rules.celebrate)
    }

    fn conclude(&mut self, verdict: Verdict) {
        if !matches!(self.run, Some(ActiveRun::Grid(_))) {
            log::info!("Stage run finished: {:?}", verdict);
            self.events.push(SimEvent::Finished {
                verdict: verdict.clone(),
            });
        }

        match &verdict {
            Verdict::Win if self.celebrates() => {
                self.state = SessionState::Celebrating;
                self.events.push(SimEvent::Celebrating);
                let dwell = self.settings.celebrate_dwell - self.driver.interval();
                self.driver.delay_next(dwell.max(0.0));
            }
            Verdict::Win => self.enter_win(),
            Verdict::Fail(cause) => {
                log::info!("Run failed: {}", cause);
                self.state = SessionState::Fail;
                self.driver.cancel();
            }
        }
        self.verdict = Some(verdict);
    }

    fn reward(&self) -> u32 {
        match &self.run {
            Some(ActiveRun::Grid(run)) => match run.rules().reward {
                Reward::Collected => run.context().collected.len() as u32,
                Reward::Fixed(amount) => amount,
            },
            Some(_) => STAGE_REWARD,
            None => 0,
        }
    }

    fn enter_win(&mut self) {
        self.driver.cancel();
        self.state = SessionState::Win;
        if self.rewarded {
            return;
        }
        self.rewarded = true;

        let reward = self.reward();
        log::info!("Run won ({} reward)", reward);
        self.progression.on_win();
        if reward > 0 {
            self.progression.on_collect(reward);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Cell, FailCause};

    #[derive(Debug, Default)]
    struct Recorder {
        wins: u32,
        collects: Vec<u32>,
    }

    impl Progression for Recorder {
        fn on_win(&mut self) {
            self.wins += 1;
        }

        fn on_collect(&mut self, amount: u32) {
            self.collects.push(amount);
        }
    }

    fn session(variant: Variant) -> GameSession<Recorder> {
        let settings = Settings {
            seed: Some(42),
            ..Default::default()
        };
        GameSession::new(variant, settings, Recorder::default()).unwrap()
    }

    fn pump(s: &mut GameSession<Recorder>, seconds: f32) {
        let frames = (seconds / 0.05).ceil() as u32;
        for _ in 0..frames {
            s.update(0.05);
        }
    }

    #[test]
    fn test_maze_win_celebrates_then_rewards_once() {
        let mut s = session(Variant::maze("lvl1"));
        for _ in 0..4 {
            s.append("b1");
        }
        assert!(s.run());
        pump(&mut s, 2.7);
        assert_eq!(s.state(), SessionState::Celebrating);
        assert_eq!(s.progression().wins, 0);

        pump(&mut s, 3.0);
        assert_eq!(s.state(), SessionState::Win);
        assert_eq!(s.progression().wins, 1);
        assert_eq!(s.progression().collects, vec![2]);

        pump(&mut s, 5.0);
        assert_eq!(s.progression().wins, 1);
        assert_eq!(s.progression().collects.len(), 1);
    }

    #[test]
    fn test_wall_fails_without_callbacks() {
        let mut s = session(Variant::maze("lvl1"));
        s.append("b1");
        s.append("b4");
        assert!(s.run());
        pump(&mut s, 3.0);
        assert_eq!(s.state(), SessionState::Fail);
        assert!(matches!(
            s.verdict(),
            Some(Verdict::Fail(FailCause::Blocked { .. }))
        ));
        assert_eq!(s.grid_run().unwrap().context().pos, Cell::new(2, 1));
        assert!(s.fail_message().unwrap().contains("tree"));
        assert_eq!(s.progression().wins, 0);
        assert!(s.progression().collects.is_empty());
    }

    #[test]
    fn test_run_requires_idle_and_blocks() {
        let mut s = session(Variant::maze("lvl1"));
        assert!(!s.run());
        s.append("b1");
        assert!(s.run());
        assert!(!s.run());
    }

    #[test]
    fn test_edits_ignored_while_running() {
        let mut s = session(Variant::maze("lvl1"));
        s.append("b1");
        s.append("b1");
        s.run();
        assert!(s.append("b1").is_none());
        assert!(s.remove_at(0).is_none());
        s.clear_program();
        assert_eq!(s.program().len(), 2);

        s.reset();
        assert!(s.append("b1").is_some());
    }

    #[test]
    fn test_palette_is_enforced() {
        let mut s = session(Variant::Ruins);
        assert!(s.append("b1").is_none());
        assert!(s.append("zz").is_none());
        assert!(s.append("l1").is_some());
    }

    #[test]
    fn test_reset_from_every_state() {
        let mut s = session(Variant::maze("lvl1"));
        s.reset();
        assert_eq!(s.state(), SessionState::Idle);

        for _ in 0..4 {
            s.append("b1");
        }
        s.run();
        s.reset();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.grid_run().is_none());

        s.run();
        pump(&mut s, 2.7);
        assert_eq!(s.state(), SessionState::Celebrating);
        s.reset();
        assert_eq!(s.state(), SessionState::Idle);
        // A cancelled celebration never pays out
        pump(&mut s, 5.0);
        assert_eq!(s.progression().wins, 0);

        s.run();
        pump(&mut s, 6.0);
        assert_eq!(s.state(), SessionState::Win);
        s.reset();
        assert_eq!(s.state(), SessionState::Idle);

        s.clear_program();
        s.append("b4");
        s.run();
        pump(&mut s, 1.0);
        assert_eq!(s.state(), SessionState::Fail);
        s.reset();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.verdict().is_none());
    }

    #[test]
    fn test_cancelled_run_stops_stepping() {
        let mut s = session(Variant::Ruins);
        for _ in 0..3 {
            s.append("l1");
        }
        s.run();
        pump(&mut s, 0.45);
        let events = s.drain_events();
        assert!(events.iter().any(|e| matches!(e, SimEvent::Moved { .. })));
        s.reset();
        pump(&mut s, 5.0);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_reset_rerolls_random_worlds() {
        let mut s = session(Variant::Flight);
        let before = match s.template() {
            Template::Sky(layout) => layout.clone(),
            _ => unreachable!(),
        };
        s.reset();
        let Template::Sky(after) = s.template() else {
            unreachable!()
        };
        assert_ne!(&before, after);
    }

    #[test]
    fn test_flight_without_bounce_fails_at_edge() {
        let mut s = session(Variant::Flight);
        s.append("c1");
        s.run();
        pump(&mut s, 30.0);
        assert_eq!(s.state(), SessionState::Fail);
        assert!(s.drain_events().iter().any(|e| matches!(e, SimEvent::Finished { .. })));
    }

    #[test]
    fn test_scan_adds_delay() {
        let mut s = session(Variant::Miner);
        s.append("sb3");
        s.append("sb2");
        s.run();
        // SCAN at 0.8s, then TURN would be due at 1.6s without the extra pause
        pump(&mut s, 1.7);
        assert_eq!(s.grid_run().unwrap().trace().len(), 2);
        pump(&mut s, 0.8);
        assert_eq!(s.grid_run().unwrap().trace().len(), 3);
    }

    #[test]
    fn test_load_switches_level() {
        let mut s = session(Variant::maze("lvl1"));
        s.append("b1");
        s.load(Variant::maze("lvl2")).unwrap();
        assert!(s.program().is_empty());
        assert_eq!(s.variant(), &Variant::maze("lvl2"));
        assert_eq!(s.state(), SessionState::Idle);
    }
}
