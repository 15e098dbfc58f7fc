//! Line ownership for one file: run attribution and render the result.
//!
//! `show` ranks contributors by lines or characters and prints the same
//! one-line summary an editor status bar would show, followed by the
//! ranked table. `lines` lists the per-line attribution behind it.

pub mod analyzer;
pub mod report;

use std::error::Error;
use std::path::Path;

use crate::config::Config;
use crate::git::{GitCli, HistoryClient};
use crate::session::{AttributionOutcome, Session};
use crate::util::read_content;

use analyzer::CountMode;
use report::{print_json, print_lines, print_lines_json, print_report};

/// Options for `lo show`, after argument parsing.
pub struct ShowOptions<'a> {
    pub config_path: Option<&'a Path>,
    pub count_mode: Option<CountMode>,
    pub ignore_blank_lines: bool,
    pub max_file_size_kb: Option<u64>,
    pub stdin: bool,
    pub top: usize,
    pub json: bool,
}

fn load_config(explicit: Option<&Path>) -> Result<Config, Box<dyn Error>> {
    let cwd = std::env::current_dir()?;
    Ok(Config::load(explicit, &cwd)?)
}

/// Attribute `path` and print the ranked contributors.
pub fn run(path: &Path, opts: &ShowOptions<'_>) -> Result<(), Box<dyn Error>> {
    let config = load_config(opts.config_path)?.with_overrides(
        opts.count_mode,
        opts.ignore_blank_lines,
        opts.max_file_size_kb,
    );
    let content = read_content(path, opts.stdin)?;

    let session = Session::new(GitCli::new(config.history), config.cache);
    let outcome = session.request_attribution(path, &content, &config.attribution)?;

    if opts.json {
        print_json(path, &outcome, config.attribution.count_mode, opts.top)
    } else {
        print_report(path, &outcome, config.attribution.count_mode, opts.top);
        Ok(())
    }
}

/// Print per-line attribution of `path`, optionally only `author`'s lines.
pub fn run_lines(
    path: &Path,
    config_path: Option<&Path>,
    author: Option<&str>,
    stdin: bool,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let config = load_config(config_path)?;
    let content = read_content(path, stdin)?;

    if let Some(too_large) = AttributionOutcome::check_size(&content, &config.attribution) {
        let mode = config.attribution.count_mode;
        return if json {
            print_json(path, &too_large, mode, 0)
        } else {
            print_report(path, &too_large, mode, 0);
            Ok(())
        };
    }

    let session = Session::new(GitCli::new(config.history), config.cache);
    if !session.history().is_inside_repository(path)? {
        return Err(format!("{}: not a git repository (or any parent)", path.display()).into());
    }

    let mut lines = session.attribute_lines(path, &content)?;
    if let Some(name) = author {
        lines.retain(|l| l.author == name);
    }

    if json {
        print_lines_json(&lines)
    } else {
        print_lines(&lines);
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
