use ratatui::Frame;

use crate::{
    app::{App, AppState},
    ui::{form_view::FormView, stats_view::render_stats, MatchView},
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

pub struct LoginScreen;

impl Screen for LoginScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let view = FormView {
            title: "Log In",
            form: &app.login,
            notice: app.notice.as_deref(),
            legend: "(enter) log in / (tab) next field / (ctrl+n) sign up / (esc) quit",
        };
        f.render_widget(view, f.area());
    }
}

pub struct SignUpScreen;

impl Screen for SignUpScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let view = FormView {
            title: "Create Account",
            form: &app.sign_up,
            notice: None,
            legend: "(enter) sign up / (tab) next field / (esc) back to log in",
        };
        f.render_widget(view, f.area());
    }
}

/// Stats screen - uses dedicated renderer
pub struct StatsScreen;

impl Screen for StatsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_stats(app, f);
    }
}

pub struct MatchScreen;

impl Screen for MatchScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(MatchView::new(&app.session, app.cursor_col), f.area());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Login => Box::new(LoginScreen),
        AppState::SignUp => Box::new(SignUpScreen),
        AppState::Stats => Box::new(StatsScreen),
        AppState::Match => Box::new(MatchScreen),
    }
}
