use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

use crate::auth::{forget_token, Form, TokenStore};
use crate::error::ApiError;
use crate::runtime::{AppEvent, Executor};
use crate::session::{MatchSession, SessionAction, SessionConfig};
use crate::stats::StatsBoard;

const SIGNED_UP_NOTICE: &str = "Account created. Please log in.";
const STATS_UNAUTHORIZED: &str = "Unauthorized access. Please log in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum AppState {
    Login,
    SignUp,
    Stats,
    Match,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Screens, forms and the current match, wired to the executor that performs
/// their remote calls.
pub struct App {
    pub state: AppState,
    pub login: Form,
    pub sign_up: Form,
    pub stats: StatsBoard,
    pub session: MatchSession,
    pub cursor_col: usize,
    pub notice: Option<String>,
    session_config: SessionConfig,
    tokens: Box<dyn TokenStore>,
    token: Option<String>,
    executor: Executor,
}

impl App {
    pub fn new(session_config: SessionConfig, tokens: Box<dyn TokenStore>, executor: Executor) -> Self {
        let token = tokens.load();
        let mut app = Self {
            state: AppState::Login,
            login: Form::login(),
            sign_up: Form::sign_up(),
            stats: StatsBoard::default(),
            session: MatchSession::new(session_config.clone()),
            cursor_col: 0,
            notice: None,
            session_config,
            tokens,
            token,
            executor,
        };
        if app.token.is_some() {
            app.show_stats();
        }
        app
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut Executor {
        &mut self.executor
    }

    pub fn handle(&mut self, event: AppEvent) -> Flow {
        match event {
            AppEvent::Key(key) => return self.on_key(key),
            AppEvent::Resize | AppEvent::Frame => {}
            AppEvent::CountdownTick { generation } => {
                if self.state == AppState::Match {
                    let actions = self.session.on_tick(generation);
                    self.apply(actions);
                }
            }
            AppEvent::RedirectToLogin => self.redirect_to_login(),
            AppEvent::GameCreated { ticket, result } => {
                let actions = self.session.on_game_created(ticket, result);
                self.apply(actions);
            }
            AppEvent::AttemptScored {
                ticket,
                row,
                result,
            } => {
                let before = self.session.active_row();
                let actions = self.session.on_attempt_scored(ticket, row, result);
                if self.session.active_row() != before {
                    self.cursor_col = 0;
                }
                self.apply(actions);
            }
            AppEvent::GameFinished { ticket, result } => {
                let actions = self.session.on_game_finished(ticket, result);
                self.apply(actions);
            }
            AppEvent::LoggedIn(result) => self.on_logged_in(result),
            AppEvent::SignedUp(result) => self.on_signed_up(result),
            AppEvent::StatsLoaded(result) => match result {
                Ok(snapshot) => self.stats.loaded(snapshot),
                Err(ApiError::Unauthenticated) => {
                    self.stats.failed(STATS_UNAUTHORIZED.to_string());
                    self.expire_token();
                }
                Err(e) => self.stats.failed(e.user_message()),
            },
        }
        Flow::Continue
    }

    /// Releases the match and waits for outstanding requests.
    pub fn shutdown(mut self) {
        if self.state == AppState::Match {
            let actions = self.session.teardown();
            self.apply(actions);
        }
        self.executor.shutdown();
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        match self.state {
            AppState::Login => self.on_login_key(key),
            AppState::SignUp => self.on_sign_up_key(key),
            AppState::Stats => self.on_stats_key(key),
            AppState::Match => {
                self.on_match_key(key);
                Flow::Continue
            }
        }
    }

    fn on_login_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.sign_up.clear();
                self.state = AppState::SignUp;
            }
            KeyCode::Enter => self.submit_login(),
            _ => edit_form(&mut self.login, key),
        }
        Flow::Continue
    }

    fn on_sign_up_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc => self.state = AppState::Login,
            KeyCode::Enter => self.submit_sign_up(),
            _ => edit_form(&mut self.sign_up, key),
        }
        Flow::Continue
    }

    fn on_stats_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Char('p') | KeyCode::Enter => self.start_match(),
            KeyCode::Char('r') => self.show_stats(),
            KeyCode::Char('l') => {
                info!("logging out");
                forget_token(self.tokens.as_ref());
                self.token = None;
                self.notice = None;
                self.login.clear();
                self.state = AppState::Login;
            }
            _ => {}
        }
        Flow::Continue
    }

    fn on_match_key(&mut self, key: KeyEvent) {
        let word_length = self.session.grid().word_length();
        let row = self.session.active_row();

        match key.code {
            KeyCode::Esc => {
                let actions = self.session.leave();
                self.apply(actions);
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.play_again()
            }
            KeyCode::Char('r') if !self.session.is_in_progress() => self.play_again(),
            KeyCode::Left => self.cursor_col = self.cursor_col.saturating_sub(1),
            KeyCode::Right => self.cursor_col = (self.cursor_col + 1).min(word_length - 1),
            KeyCode::Backspace => {
                if !self.session.is_row_editable(row) || self.session.is_awaiting_feedback() {
                    return;
                }
                let current_empty = self
                    .session
                    .grid()
                    .cell(row, self.cursor_col)
                    .is_some_and(|cell| cell.is_empty());
                if current_empty && self.cursor_col > 0 {
                    self.cursor_col -= 1;
                }
                let actions = self.session.set_letter(row, self.cursor_col, None);
                self.apply(actions);
            }
            KeyCode::Char(c) if c.is_alphabetic() => {
                if !self.session.is_row_editable(row) || self.session.is_awaiting_feedback() {
                    return;
                }
                let col = self.cursor_col;
                if col + 1 < word_length {
                    self.cursor_col += 1;
                }
                let actions = self.session.set_letter(row, col, Some(c));
                self.apply(actions);
            }
            _ => {}
        }
    }

    fn submit_login(&mut self) {
        if self.login.submitting || !self.login.validate() {
            return;
        }
        self.login.submitting = true;
        self.notice = None;
        let (email, password) = self.login.credentials();
        self.executor.log_in(email, password);
    }

    fn submit_sign_up(&mut self) {
        if self.sign_up.submitting || !self.sign_up.validate() {
            return;
        }
        self.sign_up.submitting = true;
        let account = self.sign_up.account();
        self.executor.sign_up(account);
    }

    fn on_logged_in(&mut self, result: Result<String, ApiError>) {
        self.login.submitting = false;
        match result {
            Ok(token) => {
                info!("logged in");
                if let Err(e) = self.tokens.save(&token) {
                    warn!(error = %e, "could not persist token");
                }
                self.token = Some(token);
                self.login.clear();
                self.notice = None;
                self.show_stats();
            }
            Err(e) => {
                debug!(error = %e, "login failed");
                self.login.error = Some(e.user_message());
            }
        }
    }

    fn on_signed_up(&mut self, result: Result<(), ApiError>) {
        self.sign_up.submitting = false;
        match result {
            Ok(()) => {
                info!("account created");
                self.sign_up.clear();
                self.notice = Some(SIGNED_UP_NOTICE.to_string());
                self.state = AppState::Login;
            }
            Err(e) => self.sign_up.error = Some(e.user_message()),
        }
    }

    fn show_stats(&mut self) {
        self.state = AppState::Stats;
        match self.token.clone() {
            Some(token) => {
                self.stats.begin_loading();
                self.executor.load_stats(token);
            }
            None => self.redirect_to_login(),
        }
    }

    fn start_match(&mut self) {
        if self.token.is_none() {
            self.redirect_to_login();
            return;
        }
        self.session = MatchSession::succeeding(self.session_config.clone(), &self.session);
        self.cursor_col = 0;
        self.state = AppState::Match;
        let actions = self.session.initialize();
        self.apply(actions);
    }

    fn play_again(&mut self) {
        self.cursor_col = 0;
        let actions = self.session.play_again();
        self.apply(actions);
    }

    fn expire_token(&mut self) {
        forget_token(self.tokens.as_ref());
        self.token = None;
        self.notice = Some(ApiError::Unauthenticated.user_message());
        let after = self.session_config.redirect_delay;
        self.executor.schedule(after, AppEvent::RedirectToLogin);
    }

    fn redirect_to_login(&mut self) {
        if self.state == AppState::Match {
            let actions = self.session.teardown();
            self.apply(actions);
        }
        self.login.submitting = false;
        self.login.error = self.notice.take();
        self.state = AppState::Login;
    }

    /// Carries out the session's requested work.
    fn apply(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::CreateGame { ticket } => match self.token.clone() {
                    Some(token) => self.executor.create_game(ticket, token),
                    None => self.redirect_to_login(),
                },
                SessionAction::SubmitAttempt { ticket, row, word } => {
                    match self.token.clone() {
                        Some(token) => self.executor.submit_attempt(ticket, row, word, token),
                        None => {
                            let actions = self.session.on_attempt_scored(
                                ticket,
                                row,
                                Err(ApiError::Unauthenticated),
                            );
                            self.apply(actions);
                        }
                    }
                }
                SessionAction::FinishGame { ticket } => {
                    if let Some(token) = self.token.clone() {
                        self.executor.finish_game(ticket, token);
                    }
                }
                SessionAction::StartCountdown { generation, step } => {
                    self.executor.start_countdown(generation, step)
                }
                SessionAction::StopCountdown => self.executor.stop_countdown(),
                SessionAction::ClearToken => {
                    forget_token(self.tokens.as_ref());
                    self.token = None;
                    self.notice = Some(ApiError::Unauthenticated.user_message());
                }
                SessionAction::RedirectToLogin { after } => {
                    self.executor.schedule(after, AppEvent::RedirectToLogin)
                }
                SessionAction::ShowStats => self.show_stats(),
            }
        }
    }
}

fn edit_form(form: &mut Form, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Backspace => form.pop(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => form.push(c),
        _ => {}
    }
}
