pub mod command;
pub mod config;
pub mod error;

pub use command::{ProbeCommand, PLAIN_PROTOCOL, TLS_PROTOCOL};
pub use config::ProbeConfig;
pub use error::{ConfigError, ConfigResult};
