// Game calls under the threaded executor: the server has to see the old
// game closed before the next one is created, however slow the close is.
mod common;

use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use common::ScriptedApi;
use wordrush::app::App;
use wordrush::auth::MemoryTokenStore;
use wordrush::runtime::{AppEvent, Executor};
use wordrush::session::SessionConfig;

fn threaded_app(api: &Arc<ScriptedApi>) -> (App, mpsc::Receiver<AppEvent>) {
    let (tx, rx) = mpsc::channel();
    let executor = Executor::threaded(api.clone(), tx);
    let app = App::new(
        SessionConfig::default(),
        Box::new(MemoryTokenStore::with_token("t")),
        executor,
    );
    (app, rx)
}

fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    app.handle(AppEvent::Key(KeyEvent::new(code, modifiers)));
}

/// Handles incoming events until `done` holds or two seconds pass.
fn pump_until(app: &mut App, rx: &mpsc::Receiver<AppEvent>, done: impl Fn(&App) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !done(&*app) {
        assert!(Instant::now() < deadline, "app did not reach expected state");
        if let Ok(ev) = rx.recv_timeout(Duration::from_millis(20)) {
            app.handle(ev);
        }
    }
}

fn game_calls(api: &ScriptedApi) -> Vec<String> {
    api.calls()
        .into_iter()
        .filter(|c| c == "create_game" || c == "finish_game")
        .collect()
}

#[test]
fn play_again_closes_old_game_before_creating_new_one() {
    let api = Arc::new(ScriptedApi::default());
    api.set_finish_delay(Duration::from_millis(80));
    let (mut app, rx) = threaded_app(&api);

    press(&mut app, KeyCode::Char('p'), KeyModifiers::NONE);
    pump_until(&mut app, &rx, |app| app.session.is_in_progress());

    press(&mut app, KeyCode::Char('r'), KeyModifiers::CONTROL);
    // teardown closes the replayed game too
    app.shutdown();

    assert_eq!(
        game_calls(&api),
        vec!["create_game", "finish_game", "create_game", "finish_game"]
    );
}

#[test]
fn leave_then_replay_closes_old_game_first() {
    let api = Arc::new(ScriptedApi::default());
    api.set_finish_delay(Duration::from_millis(80));
    let (mut app, rx) = threaded_app(&api);

    press(&mut app, KeyCode::Char('p'), KeyModifiers::NONE);
    pump_until(&mut app, &rx, |app| app.session.is_in_progress());

    press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
    press(&mut app, KeyCode::Char('p'), KeyModifiers::NONE);
    app.shutdown();

    assert_eq!(
        game_calls(&api),
        vec!["create_game", "finish_game", "create_game", "finish_game"]
    );
}
