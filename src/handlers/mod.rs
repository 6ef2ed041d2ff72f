//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `translate` - Markup conversion REST API
//! - `webhook` - Telegram webhook updates

pub mod api;
pub mod translate;
pub mod webhook;
