use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use tracing::{debug, warn};

use crate::api::{AttemptReply, GameApi, NewAccount};
use crate::error::ApiError;
use crate::stats::StatsSnapshot;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// No input within the frame interval; redraw.
    Frame,
    CountdownTick {
        generation: u64,
    },
    RedirectToLogin,
    GameCreated {
        ticket: u64,
        result: Result<(), ApiError>,
    },
    AttemptScored {
        ticket: u64,
        row: usize,
        result: Result<AttemptReply, ApiError>,
    },
    GameFinished {
        ticket: u64,
        result: Result<Option<String>, ApiError>,
    },
    LoggedIn(Result<String, ApiError>),
    SignedUp(Result<(), ApiError>),
    StatsLoaded(Result<StatsSnapshot, ApiError>),
}

/// Source of app events (keyboard, resize, API results, countdown ticks)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm. Background producers (API
/// workers, countdown tickers) post into the same channel via [`sender`].
///
/// [`sender`]: CrosstermEventSource::sender
pub struct CrosstermEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let key_tx = tx.clone();

        thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if key_tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if key_tx.send(AppEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to the frame interval and returns the next event, or Frame on timeout
    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Frame,
        }
    }
}

/// Background thread posting one `CountdownTick` per step until cancelled.
/// Dropping the handle cancels it.
#[derive(Debug)]
pub struct CountdownTicker {
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl CountdownTicker {
    pub fn spawn(generation: u64, step: Duration, tx: Sender<AppEvent>) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        thread::spawn(move || loop {
            thread::sleep(step);
            if flag.load(Ordering::Acquire) {
                break;
            }
            if tx.send(AppEvent::CountdownTick { generation }).is_err() {
                break;
            }
        });

        Self {
            generation,
            cancelled,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Holds at most one live countdown tick source.
#[derive(Debug, Default)]
pub struct TickSlot {
    generation: Option<u64>,
    ticker: Option<CountdownTicker>,
}

impl TickSlot {
    /// Cancels whatever is running, then records `generation` as the live
    /// one. A ticker thread is only spawned when `tx` is given.
    pub fn start(&mut self, generation: u64, step: Duration, tx: Option<Sender<AppEvent>>) {
        self.stop();
        debug!(generation, "countdown tick source started");
        self.generation = Some(generation);
        self.ticker = tx.map(|tx| CountdownTicker::spawn(generation, step, tx));
    }

    pub fn stop(&mut self) {
        if let Some(generation) = self.generation.take() {
            debug!(generation, "countdown tick source stopped");
        }
        self.ticker = None;
    }

    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.generation.is_some()
    }
}

type Job = Box<dyn FnOnce(&dyn GameApi) -> AppEvent + Send + 'static>;

/// Single worker thread running game calls one at a time, in submission
/// order. The server must see a finish-game before the next create-game.
struct GameLane {
    jobs: Sender<Job>,
    handle: JoinHandle<()>,
}

impl GameLane {
    fn spawn(api: Arc<dyn GameApi>, tx: Sender<AppEvent>) -> Self {
        let (jobs, queue) = mpsc::channel::<Job>();
        let handle = thread::spawn(move || {
            // keeps draining after the UI is gone so owed finish calls still go out
            for job in queue {
                let _ = tx.send(job(api.as_ref()));
            }
        });
        Self { jobs, handle }
    }

    /// Closes the queue and waits for the jobs already in it.
    fn close(self) {
        drop(self.jobs);
        if self.handle.join().is_err() {
            warn!("game worker panicked");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Game calls run in order on one worker thread; other requests get a
    /// thread each. Results arrive on the event channel.
    Threaded,
    /// Requests run on the caller's thread and no tick threads are spawned.
    /// Delayed events are held until [`Executor::fire_scheduled`].
    Inline,
}

/// Carries out remote calls and timers for the app, posting every result
/// back as an [`AppEvent`].
pub struct Executor {
    api: Arc<dyn GameApi>,
    tx: Sender<AppEvent>,
    dispatch: Dispatch,
    ticks: TickSlot,
    game_lane: Option<GameLane>,
    workers: Vec<JoinHandle<()>>,
    scheduled: Vec<(Duration, AppEvent)>,
}

impl Executor {
    pub fn threaded(api: Arc<dyn GameApi>, tx: Sender<AppEvent>) -> Self {
        Self::new(api, tx, Dispatch::Threaded)
    }

    pub fn inline(api: Arc<dyn GameApi>, tx: Sender<AppEvent>) -> Self {
        Self::new(api, tx, Dispatch::Inline)
    }

    fn new(api: Arc<dyn GameApi>, tx: Sender<AppEvent>, dispatch: Dispatch) -> Self {
        let game_lane = match dispatch {
            Dispatch::Threaded => Some(GameLane::spawn(Arc::clone(&api), tx.clone())),
            Dispatch::Inline => None,
        };
        Self {
            api,
            tx,
            dispatch,
            ticks: TickSlot::default(),
            game_lane,
            workers: Vec::new(),
            scheduled: Vec::new(),
        }
    }

    fn run<F>(&mut self, job: F)
    where
        F: FnOnce(&dyn GameApi) -> AppEvent + Send + 'static,
    {
        match self.dispatch {
            Dispatch::Threaded => {
                self.workers.retain(|h| !h.is_finished());
                let api = Arc::clone(&self.api);
                let tx = self.tx.clone();
                self.workers.push(thread::spawn(move || {
                    let _ = tx.send(job(api.as_ref()));
                }));
            }
            Dispatch::Inline => {
                let _ = self.tx.send(job(self.api.as_ref()));
            }
        }
    }

    /// Queues a game call behind every game call issued before it.
    fn run_in_order<F>(&mut self, job: F)
    where
        F: FnOnce(&dyn GameApi) -> AppEvent + Send + 'static,
    {
        match &self.game_lane {
            Some(lane) => {
                if let Err(mpsc::SendError(job)) = lane.jobs.send(Box::new(job)) {
                    warn!("game worker gone, running call inline");
                    let _ = self.tx.send(job(self.api.as_ref()));
                }
            }
            None => {
                let _ = self.tx.send(job(self.api.as_ref()));
            }
        }
    }

    pub fn create_game(&mut self, ticket: u64, token: String) {
        self.run_in_order(move |api| AppEvent::GameCreated {
            ticket,
            result: api.create_game(&token),
        });
    }

    pub fn submit_attempt(&mut self, ticket: u64, row: usize, word: String, token: String) {
        self.run_in_order(move |api| AppEvent::AttemptScored {
            ticket,
            row,
            result: api.submit_attempt(&token, &word),
        });
    }

    pub fn finish_game(&mut self, ticket: u64, token: String) {
        self.run_in_order(move |api| AppEvent::GameFinished {
            ticket,
            result: api.finish_game(&token),
        });
    }

    pub fn log_in(&mut self, email: String, password: String) {
        self.run(move |api| AppEvent::LoggedIn(api.log_in(&email, &password)));
    }

    pub fn sign_up(&mut self, account: NewAccount) {
        self.run(move |api| AppEvent::SignedUp(api.sign_up(&account)));
    }

    /// Fetches the three stats endpoints in order, stopping at the first
    /// failure.
    pub fn load_stats(&mut self, token: String) {
        self.run(move |api| {
            let result = api.my_stats(&token).and_then(|my_stats| {
                let top_words = api.top_words(&token)?;
                let top_players = api.top_players(&token)?;
                Ok(StatsSnapshot {
                    my_stats,
                    top_words,
                    top_players,
                })
            });
            AppEvent::StatsLoaded(result)
        });
    }

    pub fn start_countdown(&mut self, generation: u64, step: Duration) {
        let tx = match self.dispatch {
            Dispatch::Threaded => Some(self.tx.clone()),
            Dispatch::Inline => None,
        };
        self.ticks.start(generation, step, tx);
    }

    pub fn stop_countdown(&mut self) {
        self.ticks.stop();
    }

    pub fn countdown_generation(&self) -> Option<u64> {
        self.ticks.generation()
    }

    /// Posts `event` after `after` has elapsed.
    pub fn schedule(&mut self, after: Duration, event: AppEvent) {
        match self.dispatch {
            Dispatch::Threaded => {
                let tx = self.tx.clone();
                thread::spawn(move || {
                    thread::sleep(after);
                    let _ = tx.send(event);
                });
            }
            Dispatch::Inline => self.scheduled.push((after, event)),
        }
    }

    pub fn scheduled(&self) -> &[(Duration, AppEvent)] {
        &self.scheduled
    }

    /// Delivers held delayed events now. Only meaningful for inline dispatch.
    pub fn fire_scheduled(&mut self) {
        for (_, event) in self.scheduled.drain(..) {
            let _ = self.tx.send(event);
        }
    }

    /// Stops the countdown and waits for in-flight requests, so a pending
    /// finish-game call is not cut off at exit.
    pub fn shutdown(mut self) {
        self.ticks.stop();
        if let Some(lane) = self.game_lane.take() {
            lane.close();
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("api worker panicked");
            }
        }
    }
}
