pub mod analyzer;
pub mod broadcaster;
pub mod candle;
pub mod candle_store;
pub mod command;
pub mod config;
pub mod engine;
pub mod fusion;
pub mod gatekeeper;
pub mod indicator;
pub mod message;
pub mod model;
pub mod profit;
pub mod registry;
pub mod source;

/// 설정 로더
pub mod config_loader;

pub use config_loader::{ConfigError, ConfigResult};
