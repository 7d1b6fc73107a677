// Shared harness: a scripted game server and an app driven headlessly
// through the inline executor and a test event source.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use wordrush::api::{AttemptReply, GameApi, NewAccount};
use wordrush::app::App;
use wordrush::auth::MemoryTokenStore;
use wordrush::error::ApiError;
use wordrush::grid::{Feedback, LetterStatus};
use wordrush::runtime::{AppEvent, Executor, FixedTicker, Runner, TestEventSource};
use wordrush::session::SessionConfig;
use wordrush::stats::{MyStats, StatEntry};

/// Game server double. Unscripted calls succeed with empty payloads, except
/// attempts which fail as a network error.
#[derive(Default)]
pub struct ScriptedApi {
    calls: Mutex<Vec<String>>,
    creates: Mutex<VecDeque<Result<(), ApiError>>>,
    attempts: Mutex<VecDeque<Result<AttemptReply, ApiError>>>,
    finish_message: Mutex<Option<String>>,
    finish_delay: Mutex<Option<Duration>>,
    stats_error: Mutex<Option<ApiError>>,
}

impl ScriptedApi {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn push_create(&self, result: Result<(), ApiError>) {
        self.creates.lock().unwrap().push_back(result);
    }

    pub fn push_attempt(&self, result: Result<AttemptReply, ApiError>) {
        self.attempts.lock().unwrap().push_back(result);
    }

    pub fn set_finish_message(&self, message: &str) {
        *self.finish_message.lock().unwrap() = Some(message.to_string());
    }

    /// Makes finish-game slow, as a server under load would be.
    pub fn set_finish_delay(&self, delay: Duration) {
        *self.finish_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_stats(&self, error: ApiError) {
        *self.stats_error.lock().unwrap() = Some(error);
    }
}

impl GameApi for ScriptedApi {
    fn create_game(&self, _token: &str) -> Result<(), ApiError> {
        self.record("create_game");
        self.creates.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    fn submit_attempt(&self, _token: &str, word: &str) -> Result<AttemptReply, ApiError> {
        self.record(format!("submit_attempt:{word}"));
        self.attempts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("unscripted".into())))
    }

    fn finish_game(&self, _token: &str) -> Result<Option<String>, ApiError> {
        let delay = *self.finish_delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.record("finish_game");
        Ok(self.finish_message.lock().unwrap().clone())
    }

    fn log_in(&self, email: &str, _password: &str) -> Result<String, ApiError> {
        self.record(format!("log_in:{email}"));
        Ok("fresh-token".to_string())
    }

    fn sign_up(&self, account: &NewAccount) -> Result<(), ApiError> {
        self.record(format!("sign_up:{}", account.username));
        Ok(())
    }

    fn my_stats(&self, _token: &str) -> Result<MyStats, ApiError> {
        self.record("my_stats");
        match self.stats_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(MyStats {
                total_games: 2,
                total_victories: 1,
            }),
        }
    }

    fn top_words(&self, _token: &str) -> Result<Vec<StatEntry>, ApiError> {
        self.record("top_words");
        Ok(vec![StatEntry::Word {
            word: "CRANE".into(),
            total_guesses: 3,
        }])
    }

    fn top_players(&self, _token: &str) -> Result<Vec<StatEntry>, ApiError> {
        self.record("top_players");
        Ok(vec![])
    }
}

pub fn feedback(pattern: &str) -> Feedback {
    pattern
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let status = match c {
                'c' => LetterStatus::Correct,
                'p' => LetterStatus::Present,
                _ => LetterStatus::Absent,
            };
            (i, status)
        })
        .collect()
}

pub fn scored(pattern: &str) -> Result<AttemptReply, ApiError> {
    Ok(AttemptReply {
        feedback: Some(feedback(pattern)),
        completion: None,
    })
}

pub struct Harness {
    pub app: App,
    pub api: Arc<ScriptedApi>,
    pub tokens: Arc<MemoryTokenStore>,
    runner: Runner<TestEventSource, FixedTicker>,
}

impl Harness {
    pub fn new(config: SessionConfig, token: Option<&str>) -> Self {
        Self::with_api(config, token, ScriptedApi::default())
    }

    pub fn with_api(config: SessionConfig, token: Option<&str>, api: ScriptedApi) -> Self {
        let api = Arc::new(api);
        let tokens = Arc::new(match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::default(),
        });
        let (tx, rx) = mpsc::channel();
        let executor = Executor::inline(api.clone(), tx);
        let app = App::new(config, Box::new(tokens.clone()), executor);
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        let mut harness = Self {
            app,
            api,
            tokens,
            runner,
        };
        harness.drain();
        harness
    }

    /// Handles queued events until the channel is empty.
    pub fn drain(&mut self) {
        for _ in 0..1000 {
            match self.runner.step() {
                AppEvent::Frame => return,
                ev => {
                    self.app.handle(ev);
                }
            }
        }
        panic!("event loop did not settle");
    }

    pub fn send(&mut self, event: AppEvent) {
        self.app.handle(event);
        self.drain();
    }

    pub fn key(&mut self, code: KeyCode) {
        self.send(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    pub fn ctrl(&mut self, c: char) {
        self.send(AppEvent::Key(KeyEvent::new(
            KeyCode::Char(c),
            KeyModifiers::CONTROL,
        )));
    }

    pub fn type_word(&mut self, word: &str) {
        for c in word.chars() {
            self.key(KeyCode::Char(c));
        }
    }

    /// Delivers a countdown tick for the live countdown generation.
    pub fn tick(&mut self) {
        let generation = self
            .app
            .executor()
            .countdown_generation()
            .expect("countdown should be running");
        self.send(AppEvent::CountdownTick { generation });
    }

    pub fn start_match(&mut self) {
        self.key(KeyCode::Char('p'));
    }
}

pub fn short_match(duration_ms: u64) -> SessionConfig {
    SessionConfig {
        game_duration_ms: duration_ms,
        ..SessionConfig::default()
    }
}
