pub const GAME_DURATION_MS: u64 = 180_000;
pub const TICK_STEP_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick from a stopped countdown or a previous generation.
    Stale,
    Ticked(u64),
    /// The countdown just reached zero. Reported once per generation.
    Expired,
}

/// Countdown owned by a match session.
///
/// Each start or restart bumps the generation. Tick sources carry the
/// generation they were started with, so a tick that outlives its countdown
/// is recognised and dropped instead of being applied to the next one.
#[derive(Debug, Clone)]
pub struct Countdown {
    duration_ms: u64,
    remaining_ms: u64,
    step_ms: u64,
    generation: u64,
    running: bool,
}

impl Countdown {
    pub fn new(duration_ms: u64) -> Self {
        Self::with_step(duration_ms, TICK_STEP_MS)
    }

    pub fn with_step(duration_ms: u64, step_ms: u64) -> Self {
        Self {
            duration_ms,
            remaining_ms: duration_ms,
            step_ms: step_ms.max(1),
            generation: 0,
            running: false,
        }
    }

    /// Continues numbering after `generation`, so ticks tagged by an earlier
    /// countdown stay stale.
    pub fn after_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn step_ms(&self) -> u64 {
        self.step_ms
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts ticking from the current remaining time. Returns `None` when the
    /// countdown is already running or has nothing left.
    pub fn start(&mut self) -> Option<u64> {
        if self.running || self.remaining_ms == 0 {
            return None;
        }
        self.generation += 1;
        self.running = true;
        Some(self.generation)
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Back to the full duration under a fresh generation.
    pub fn restart(&mut self) -> u64 {
        self.remaining_ms = self.duration_ms;
        self.generation += 1;
        self.running = true;
        self.generation
    }

    pub fn on_tick(&mut self, generation: u64) -> TickOutcome {
        if !self.running || generation != self.generation {
            return TickOutcome::Stale;
        }

        self.remaining_ms = self.remaining_ms.saturating_sub(self.step_ms);
        if self.remaining_ms == 0 {
            self.running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Ticked(self.remaining_ms)
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(GAME_DURATION_MS)
    }
}
