//! Run configuration loaded from `cellpower.toml`

use anyhow::{Context, Result};
use cellpower_liberty::Pvt;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of digits in power reports
pub const DEFAULT_DIGITS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub report: ReportConfig,

    /// Operating point handed to the table lookups; the library's nominal
    /// corner is used when absent
    pub corner: Option<Pvt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub digits: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            digits: DEFAULT_DIGITS,
        }
    }
}

impl Config {
    /// Load a configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        Self::from_str(&contents).with_context(|| format!("Invalid config {:?}", path))
    }

    /// Parse a configuration from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load `path` if given, otherwise fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }
}
