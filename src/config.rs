//! Resolved configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! command-line flags. Every key has a default, so an empty or missing file
//! is valid:
//!
//! ```toml
//! count_mode = "lines"        # or "characters"
//! ignore_blank_lines = false
//! max_file_size_kb = 2048
//!
//! [cache]
//! ttl_secs = 30
//! max_entries = 100
//!
//! [history]
//! timeout_secs = 5
//! max_output_bytes = 10485760
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cache::CacheSettings;
use crate::error::ConfigError;
use crate::git::HistoryLimits;
use crate::ownership::analyzer::CountMode;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = ".lineowner.toml";

/// Serde adapter for durations written as whole seconds.
pub(crate) mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

/// Per-request options for one attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    pub count_mode: CountMode,
    pub ignore_blank_lines: bool,
    pub max_file_size_kb: u64,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            count_mode: CountMode::Lines,
            ignore_blank_lines: false,
            max_file_size_kb: 2048,
        }
    }
}

impl AttributionConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_kb.saturating_mul(1024)
    }

    /// Distinguishes cached rankings computed under different options.
    pub(crate) fn cache_tag(&self) -> String {
        let blank = if self.ignore_blank_lines { "-blank" } else { "+blank" };
        format!("{}{blank}", self.count_mode.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub attribution: AttributionConfig,
    pub cache: CacheSettings,
    pub history: HistoryLimits,
}

impl Config {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load `explicit` if given, else [`DEFAULT_CONFIG_FILE`] in `dir` when
    /// it exists, else defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let candidate: PathBuf = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::from_file(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply command-line overrides. `ignore_blank_lines` can only be
    /// switched on from the command line.
    pub fn with_overrides(
        mut self,
        count_mode: Option<CountMode>,
        ignore_blank_lines: bool,
        max_file_size_kb: Option<u64>,
    ) -> Self {
        if let Some(mode) = count_mode {
            self.attribution.count_mode = mode;
        }
        if ignore_blank_lines {
            self.attribution.ignore_blank_lines = true;
        }
        if let Some(kb) = max_file_size_kb {
            self.attribution.max_file_size_kb = kb;
        }
        self
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
