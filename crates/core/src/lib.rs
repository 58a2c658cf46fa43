pub mod config;
pub mod error;
pub mod ports;
pub mod rules;
pub mod suggestion;
pub mod types;

pub use config::AppConfig;
pub use error::{EngineError, EngineResult};
