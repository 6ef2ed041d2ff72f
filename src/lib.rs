pub mod bot;
pub mod config;
pub mod core;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telegram;

// Re-export commonly used items for convenience
pub use bot::Bot;
pub use config::ServerConfig;
pub use crate::core::*;
pub use errors::app_error::{AppError, AppResult};
pub use state::AppState;
