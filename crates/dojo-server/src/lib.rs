pub mod config;
pub mod http;
pub mod service;
pub mod transport;

pub use config::{Args, ConfigError, FileConfig, ServerConfig, DEFAULT_SYSTEM_PROMPT};
pub use http::router;
pub use service::{ApiError, AppState};
