//! Line ownership for a single file: who last touched each line, folded
//! into a ranked list of contributors.
//!
//! The pipeline is driven through [`session::Session`], which owns the
//! result cache and a [`git::HistoryClient`]. The `lo` binary wraps it in a
//! command-line interface and a JSON-lines server for editor hosts.

pub mod blame;
pub mod cache;
pub mod config;
pub mod error;
pub mod git;
pub mod logging;
pub mod ownership;
pub mod report_helpers;
pub mod serve;
pub mod session;
pub mod util;
