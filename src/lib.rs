// Library surface for the binary and for headless/integration tests.
pub mod api;
pub mod app;
pub mod app_dirs;
pub mod auth;
pub mod config;
pub mod error;
pub mod grid;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod timer;
pub mod ui;
pub mod util;
