//! HTTP surface: request parsing, validation, and dispatch into the
//! workflow layer.

pub mod app;
pub mod error;
pub mod handlers;
pub mod state;

pub use app::build_app;
pub use state::AppState;
