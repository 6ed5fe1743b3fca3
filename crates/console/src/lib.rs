//! Wiring of the polyadmin console: configuration, the HTTP gateway, the
//! live channel and the adapters view.

pub mod app;
pub mod config;

pub use app::{Console, ConsoleError};
pub use config::{ConfigError, ConsoleConfig};
