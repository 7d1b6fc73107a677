//! Match session controller.
//!
//! Owns the guess grid, the active row, the countdown and the completion
//! status of one match. It performs no I/O: every operation returns the
//! [`SessionAction`]s the caller has to carry out, and results come back in
//! through the `on_*` handlers tagged with the ticket they were issued under.
//! Responses carrying an older ticket belong to a previous session and are
//! dropped.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::AttemptReply;
use crate::error::ApiError;
use crate::grid::{Grid, TOTAL_ATTEMPTS, WORD_LENGTH};
use crate::timer::{Countdown, TickOutcome, GAME_DURATION_MS, TICK_STEP_MS};

pub const REDIRECT_DELAY_MS: u64 = 3000;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub total_attempts: usize,
    pub word_length: usize,
    pub game_duration_ms: u64,
    pub tick_step_ms: u64,
    pub redirect_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_attempts: TOTAL_ATTEMPTS,
            word_length: WORD_LENGTH,
            game_duration_ms: GAME_DURATION_MS,
            tick_step_ms: TICK_STEP_MS,
            redirect_delay: Duration::from_millis(REDIRECT_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    InProgress,
    Completed,
    Abandoned,
}

/// Work the caller performs on behalf of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    CreateGame { ticket: u64 },
    SubmitAttempt { ticket: u64, row: usize, word: String },
    FinishGame { ticket: u64 },
    /// Replace any running tick source with one for `generation`.
    StartCountdown { generation: u64, step: Duration },
    StopCountdown,
    ClearToken,
    RedirectToLogin { after: Duration },
    ShowStats,
}

#[derive(Debug)]
pub struct MatchSession {
    config: SessionConfig,
    grid: Grid,
    active_row: usize,
    phase: Phase,
    completion_message: Option<String>,
    error: Option<String>,
    countdown: Countdown,
    ticket: u64,
    pending_attempt: Option<usize>,
    finish_owed: bool,
}

impl MatchSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            grid: Grid::new(config.total_attempts, config.word_length),
            countdown: Countdown::with_step(config.game_duration_ms, config.tick_step_ms),
            config,
            active_row: 0,
            phase: Phase::Idle,
            completion_message: None,
            error: None,
            ticket: 0,
            pending_attempt: None,
            finish_owed: false,
        }
    }

    /// A fresh session that keeps numbering tickets and countdown
    /// generations after `prev`, so late results and ticks from the
    /// previous match are recognised as stale.
    pub fn succeeding(config: SessionConfig, prev: &MatchSession) -> Self {
        let mut session = Self::new(config);
        session.ticket = prev.ticket;
        session.countdown = session
            .countdown
            .after_generation(prev.countdown.generation());
        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn active_row(&self) -> usize {
        self.active_row
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_in_progress(&self) -> bool {
        self.phase == Phase::InProgress
    }

    pub fn completion_message(&self) -> Option<&str> {
        self.completion_message.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn remaining_ms(&self) -> u64 {
        self.countdown.remaining_ms()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn is_awaiting_feedback(&self) -> bool {
        self.pending_attempt.is_some()
    }

    /// Only the active row accepts input, and only while the match runs.
    pub fn is_row_editable(&self, row: usize) -> bool {
        self.is_in_progress() && row == self.active_row && row < self.grid.total_attempts()
    }

    /// Requests a new game from the server. Only valid from `Idle`.
    pub fn initialize(&mut self) -> Vec<SessionAction> {
        if self.phase != Phase::Idle {
            warn!(phase = %self.phase, "initialize ignored outside idle");
            return vec![];
        }
        self.ticket += 1;
        self.error = None;
        self.finish_owed = true;
        info!(ticket = self.ticket, "requesting new game");
        vec![SessionAction::CreateGame {
            ticket: self.ticket,
        }]
    }

    pub fn on_game_created(
        &mut self,
        ticket: u64,
        result: Result<(), ApiError>,
    ) -> Vec<SessionAction> {
        if ticket != self.ticket {
            debug!(ticket, current = self.ticket, "dropping stale create-game result");
            return vec![];
        }

        match result {
            Ok(()) => {
                if self.phase != Phase::Idle {
                    // reset() already moved the session into play
                    return vec![];
                }
                self.grid.clear();
                self.active_row = 0;
                self.completion_message = None;
                self.phase = Phase::InProgress;
                let generation = self.countdown.restart();
                info!(ticket, generation, "game created");
                vec![self.start_countdown(generation)]
            }
            Err(ApiError::Unauthenticated) => self.expire(),
            Err(ApiError::GameAlreadyComplete(message)) => {
                info!(%message, "no game available");
                self.phase = Phase::Idle;
                self.finish_owed = false;
                self.countdown.stop();
                self.error = Some(message);
                vec![SessionAction::StopCountdown]
            }
            Err(e) => {
                warn!(error = %e, "create-game failed");
                self.error = Some(e.user_message());
                if self.phase != Phase::InProgress {
                    return vec![];
                }
                // reset() started play ahead of the server; no game exists
                self.phase = Phase::Idle;
                self.pending_attempt = None;
                self.finish_owed = false;
                self.countdown.stop();
                vec![SessionAction::StopCountdown]
            }
        }
    }

    /// Writes one cell of the active row and submits the row once it is full.
    pub fn set_letter(&mut self, row: usize, col: usize, letter: Option<char>) -> Vec<SessionAction> {
        if !self.is_row_editable(row) || self.pending_attempt.is_some() {
            debug!(row, col, "ignoring write to non-editable row");
            return vec![];
        }
        if !self.grid.set_letter(row, col, letter) {
            return vec![];
        }
        self.error = None;
        self.check_row_complete()
    }

    fn check_row_complete(&mut self) -> Vec<SessionAction> {
        let row = self.active_row;
        match self.grid.row_word(row) {
            Some(word) => {
                debug!(row, %word, "submitting attempt");
                self.pending_attempt = Some(row);
                vec![SessionAction::SubmitAttempt {
                    ticket: self.ticket,
                    row,
                    word,
                }]
            }
            None => vec![],
        }
    }

    pub fn on_attempt_scored(
        &mut self,
        ticket: u64,
        row: usize,
        result: Result<AttemptReply, ApiError>,
    ) -> Vec<SessionAction> {
        if ticket != self.ticket || self.pending_attempt != Some(row) {
            debug!(ticket, row, "dropping stale attempt result");
            return vec![];
        }
        self.pending_attempt = None;

        if !self.is_in_progress() {
            // the countdown or a leave won the race; the grid is frozen
            info!(row, phase = %self.phase, "attempt result arrived after the match ended");
            return vec![];
        }

        match result {
            Ok(reply) => self.apply_reply(row, reply),
            Err(ApiError::Unauthenticated) => self.expire(),
            Err(ApiError::Rejected(message)) => {
                debug!(row, %message, "word rejected");
                self.error = Some(message);
                vec![]
            }
            Err(e) => {
                warn!(error = %e, "attempt failed");
                self.error = Some(e.user_message());
                vec![]
            }
        }
    }

    fn apply_reply(&mut self, row: usize, reply: AttemptReply) -> Vec<SessionAction> {
        if let Some(feedback) = reply.feedback {
            match self.grid.apply_feedback(row, &feedback) {
                Ok(()) => {
                    self.active_row = (self.active_row + 1).min(self.grid.total_attempts());
                    debug!(active_row = self.active_row, "attempt resolved");
                }
                Err(e) => {
                    warn!(error = %e, "unusable feedback");
                    self.error = Some(ApiError::Decode(e.to_string()).user_message());
                }
            }
        }

        if let Some(message) = reply.completion {
            return self.complete(Some(message));
        }
        if self.active_row >= self.grid.total_attempts() {
            return self.complete(None);
        }
        vec![]
    }

    /// Advances the countdown. Ticks from an older generation are ignored.
    pub fn on_tick(&mut self, generation: u64) -> Vec<SessionAction> {
        if !self.is_in_progress() {
            return vec![];
        }
        match self.countdown.on_tick(generation) {
            TickOutcome::Stale => {
                debug!(generation, "stale countdown tick");
                vec![]
            }
            TickOutcome::Ticked(_) => vec![],
            TickOutcome::Expired => {
                info!("time is up");
                self.complete(None)
            }
        }
    }

    pub fn on_game_finished(
        &mut self,
        ticket: u64,
        result: Result<Option<String>, ApiError>,
    ) -> Vec<SessionAction> {
        if ticket != self.ticket {
            debug!(ticket, "finish result for a previous session");
            return vec![];
        }
        match result {
            Ok(Some(message)) => {
                if self.phase == Phase::Completed && self.completion_message.is_none() {
                    self.completion_message = Some(message);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "finish-game failed"),
        }
        vec![]
    }

    /// Fresh grid, row 0, full countdown, back in play.
    pub fn reset(&mut self) -> Vec<SessionAction> {
        self.grid.clear();
        self.active_row = 0;
        self.completion_message = None;
        self.error = None;
        self.pending_attempt = None;
        self.finish_owed = false;
        self.ticket += 1;
        self.phase = Phase::InProgress;
        let generation = self.countdown.restart();
        info!(ticket = self.ticket, generation, "session reset");
        vec![SessionAction::StopCountdown, self.start_countdown(generation)]
    }

    pub fn play_again(&mut self) -> Vec<SessionAction> {
        let mut actions = self.finish_if_owed();
        actions.extend(self.reset());
        self.finish_owed = true;
        actions.push(SessionAction::CreateGame {
            ticket: self.ticket,
        });
        actions
    }

    pub fn leave(&mut self) -> Vec<SessionAction> {
        let mut actions = self.finish_if_owed();
        if matches!(self.phase, Phase::Idle | Phase::InProgress) {
            self.phase = Phase::Abandoned;
        }
        self.pending_attempt = None;
        self.countdown.stop();
        info!(phase = %self.phase, "leaving match");
        actions.push(SessionAction::StopCountdown);
        actions.push(SessionAction::ShowStats);
        actions
    }

    /// Releases everything the session holds when the screen goes away
    /// without an explicit leave.
    pub fn teardown(&mut self) -> Vec<SessionAction> {
        let mut actions = self.finish_if_owed();
        self.countdown.stop();
        actions.push(SessionAction::StopCountdown);
        actions
    }

    fn complete(&mut self, message: Option<String>) -> Vec<SessionAction> {
        self.phase = Phase::Completed;
        self.completion_message = message;
        self.countdown.stop();
        let mut actions = vec![SessionAction::StopCountdown];
        actions.extend(self.finish_if_owed());
        actions
    }

    fn expire(&mut self) -> Vec<SessionAction> {
        warn!("session expired, redirecting to login");
        self.phase = Phase::Abandoned;
        self.error = Some(ApiError::Unauthenticated.user_message());
        self.pending_attempt = None;
        self.finish_owed = false;
        self.countdown.stop();
        vec![
            SessionAction::StopCountdown,
            SessionAction::ClearToken,
            SessionAction::RedirectToLogin {
                after: self.config.redirect_delay,
            },
        ]
    }

    fn finish_if_owed(&mut self) -> Vec<SessionAction> {
        if !self.finish_owed {
            return vec![];
        }
        self.finish_owed = false;
        vec![SessionAction::FinishGame {
            ticket: self.ticket,
        }]
    }

    fn start_countdown(&self, generation: u64) -> SessionAction {
        SessionAction::StartCountdown {
            generation,
            step: Duration::from_millis(self.countdown.step_ms()),
        }
    }
}

impl Default for MatchSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
