/// CLI argument definitions for the `lo` command.
///
/// Defines all subcommands, their arguments, and long help text
/// using the `clap` derive macros.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::cli_help;

/// Top-level CLI parser with a single subcommand selector.
#[derive(Parser)]
#[command(name = "lo", version, about = "Line ownership for a file, ranked by contributor")]
pub struct Cli {
    /// Log level filter for diagnostics on stderr (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// All available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Rank a file's contributors by lines or characters
    #[command(long_about = cli_help::SHOW)]
    Show {
        /// File to attribute
        file: PathBuf,

        /// Rank by: lines or characters (default: from config, else lines)
        #[arg(long, value_parser = ["lines", "characters"])]
        count_mode: Option<String>,

        /// Skip whitespace-only lines
        #[arg(long)]
        ignore_blank_lines: bool,

        /// Skip files larger than this many KB (default: 2048)
        #[arg(long)]
        max_file_size_kb: Option<u64>,

        /// Read the current content from stdin instead of the file on disk
        #[arg(long)]
        stdin: bool,

        /// Show only the top N contributors (default: 20)
        #[arg(long, default_value = "20")]
        top: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Config file (default: .lineowner.toml in the current directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the author of every line of a file
    #[command(long_about = cli_help::LINES)]
    Lines {
        /// File to attribute
        file: PathBuf,

        /// Show only lines attributed to this author
        #[arg(long)]
        author: Option<String>,

        /// Read the current content from stdin instead of the file on disk
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Config file (default: .lineowner.toml in the current directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Answer attribution requests as JSON lines on stdin/stdout
    #[command(long_about = cli_help::SERVE)]
    Serve {
        /// Config file (default: .lineowner.toml in the current directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print a shell completion script
    Completions {
        /// Target shell
        shell: Shell,
    },
}
