pub mod webhook_secret;

pub use webhook_secret::{SECRET_TOKEN_HEADER, webhook_secret_middleware};
