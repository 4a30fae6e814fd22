//! Cancellable fixed-interval step driver
//!
//! Both execution models run through this: discrete mode with one step per
//! inter-step delay, continuous mode with one tick per frame interval. The
//! host feeds wall-clock time with `advance` and then pulls due steps with
//! `next_due`, which re-checks the running flag every time so a cancel
//! issued mid-burst stops the remaining steps.

/// Longest frame delta accepted in one `advance`
pub const MAX_FRAME_DT: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct StepDriver {
    interval: f32,
    accumulator: f32,
    running: bool,
    max_steps: u32,
    burst: u32,
}

impl StepDriver {
    /// Driver firing every `interval` seconds, at most `max_steps` per advance
    pub fn new(interval: f32, max_steps: u32) -> Self {
        Self {
            interval: interval.max(f32::EPSILON),
            accumulator: 0.0,
            running: false,
            max_steps: max_steps.max(1),
            burst: 0,
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Start firing; the first step is due one interval from now
    pub fn start(&mut self) {
        self.running = true;
        self.accumulator = 0.0;
        self.burst = 0;
    }

    /// Stop firing; nothing already accumulated will be delivered
    pub fn cancel(&mut self) {
        self.running = false;
        self.accumulator = 0.0;
        self.burst = 0;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Push the next step back by `extra` seconds
    pub fn delay_next(&mut self, extra: f32) {
        if self.running {
            self.accumulator -= extra.max(0.0);
        }
    }

    /// Feed elapsed wall-clock time
    pub fn advance(&mut self, dt: f32) {
        self.burst = 0;
        if !self.running {
            return;
        }
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);
    }

    /// Consume one due step, if any
    pub fn next_due(&mut self) -> bool {
        if !self.running || self.accumulator < self.interval {
            return false;
        }
        if self.burst >= self.max_steps {
            // Drop the backlog rather than spiral
            self.accumulator = self.accumulator.min(self.interval);
            return false;
        }
        self.accumulator -= self.interval;
        self.burst += 1;
        true
    }

    /// Feed time and count the due steps in one go
    pub fn drain(&mut self, dt: f32) -> u32 {
        self.advance(dt);
        let mut steps = 0;
        while self.next_due() {
            steps += 1;
        }
        steps
    }
}
