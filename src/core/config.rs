/// Engine configuration, loadable from RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::core::reveal::DEFAULT_CADENCE;
use crate::schema::state::ClampPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Tunables for a [`StoryEngine`](crate::core::engine::StoryEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Config", default)]
pub struct EngineConfig {
    /// Milliseconds between two revealed characters.
    pub reveal_cadence_ms: u64,
    pub clamp: ClampPolicy,
    /// Refuse choices until the node text has been fully revealed.
    pub strict_reveal_gate: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reveal_cadence_ms: DEFAULT_CADENCE.as_millis() as u64,
            clamp: ClampPolicy::Unclamped,
            strict_reveal_gate: false,
        }
    }
}

impl EngineConfig {
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<EngineConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    pub fn reveal_cadence(&self) -> Duration {
        Duration::from_millis(self.reveal_cadence_ms)
    }
}
