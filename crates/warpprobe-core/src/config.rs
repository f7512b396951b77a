//! Probe command-file parser.
//!
//! Files ending in `.json` are read as JSON, everything else as TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::command::ProbeCommand;
use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Attempts per (port, command, protocol); zero or negative means default.
    #[serde(default)]
    pub retry_count: i32,
    /// Base backoff unit in seconds; zero means default.
    #[serde(default)]
    pub retry_wait: u64,
    /// Explicit host ports to probe, in order.
    #[serde(default)]
    pub target_ports: Vec<u16>,
    #[serde(default)]
    pub commands: Vec<ProbeCommand>,
}

impl ProbeConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: ProbeConfig = toml::from_str(content)?;
        config.normalize()
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: ProbeConfig = serde_json::from_str(content)?;
        config.normalize()
    }

    fn normalize(mut self) -> ConfigResult<Self> {
        self.commands = self
            .commands
            .into_iter()
            .map(ProbeCommand::normalize)
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(self)
    }

    /// Configured commands, or a single `GET /` on both protocols when none
    /// are configured.
    pub fn commands_or_default(&self) -> Vec<ProbeCommand> {
        if self.commands.is_empty() {
            vec![ProbeCommand::default()]
        } else {
            self.commands.clone()
        }
    }
}
