/*
[INPUT]:  YAML configuration text or file
[OUTPUT]: Parsed ParseConfig
[POS]:    Configuration layer - how payloads are turned into models
[UPDATE]: When adding new parse options
*/

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OtfError, Result};

/// What to do with payload keys no model field claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeyPolicy {
    Ignore,
    /// Drop the key and emit a debug event
    #[default]
    Log,
    /// Fail with `ParseError::UnknownField`
    Reject,
}

/// Options applied while parsing payloads into models
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParseConfig {
    #[serde(default)]
    pub unknown_keys: UnknownKeyPolicy,
    /// Telemetry items kept at each end of the list when serializing
    #[serde(default = "default_telemetry_preview")]
    pub telemetry_preview: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            unknown_keys: UnknownKeyPolicy::default(),
            telemetry_preview: default_telemetry_preview(),
        }
    }
}

impl ParseConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|err| OtfError::Config(err.to_string()))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|err| OtfError::Config(format!("{}: {err}", path.display())))?;
        Self::from_yaml_str(&raw)
    }
}

fn default_telemetry_preview() -> usize {
    5
}
