//! Error types for history queries, attribution requests, and configuration.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Failures of the version-control capability.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// git is missing, inaccessible, or rejected the query.
    #[error("history unavailable: {0}")]
    Unavailable(String),

    /// The query did not finish within the configured bound.
    #[error("history query timed out after {0:?}")]
    Timeout(Duration),

    /// The query produced more output than the configured bound (bytes).
    #[error("history output exceeded {0} bytes")]
    OutputTooLarge(usize),
}

/// Errors surfaced by [`crate::session::Session::request_attribution`].
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Materializing the working-copy substitute failed.
    #[error("temporary copy: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
