pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod history;
pub mod import;
pub mod models;
pub mod roster;
pub mod state;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
