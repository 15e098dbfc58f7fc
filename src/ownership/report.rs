use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use super::analyzer::{ContributorMetric, CountMode, status_text};
use crate::blame::LineAttribution;
use crate::report_helpers::{max_display_width, pad_right, print_json_stdout, separator};
use crate::session::AttributionOutcome;

/// Human-readable report for one attribution outcome.
pub fn render_report(
    path: &Path,
    outcome: &AttributionOutcome,
    mode: CountMode,
    top: usize,
) -> String {
    let mut out = String::new();
    let contributors = match outcome {
        AttributionOutcome::Ranked { contributors } => contributors,
        AttributionOutcome::FileTooLarge { size, limit } => {
            let _ = writeln!(
                out,
                "{}: file too large for attribution ({size} bytes, limit {limit} bytes)",
                path.display()
            );
            return out;
        }
        AttributionOutcome::NotInRepository => {
            let _ = writeln!(out, "{}: not in a git repository", path.display());
            return out;
        }
    };

    let _ = writeln!(out, "Line Ownership \u{2014} {}", path.display());
    let _ = writeln!(out, "{}", status_text(contributors, mode));
    if contributors.is_empty() {
        return out;
    }

    let shown = &contributors[..contributors.len().min(top)];
    let author_w = max_display_width(shown.iter().map(|m| m.author.as_str()), 6);
    // rank(3) + 2 + author + 1 + lines(7) + 1 + chars(9) + 1 + share(6) + 1
    let separator = separator((author_w + 31).max(40));

    let _ = writeln!(out, "{separator}");
    let _ = writeln!(
        out,
        " {:>3}  {} {:>7} {:>9} {:>6}",
        "#",
        pad_right("Author", author_w),
        "Lines",
        "Chars",
        "Share"
    );
    let _ = writeln!(out, "{separator}");
    for (i, m) in shown.iter().enumerate() {
        let _ = writeln!(
            out,
            " {:>3}  {} {:>7} {:>9} {:>5}%",
            i + 1,
            pad_right(&m.author, author_w),
            m.lines,
            m.characters,
            m.percentage
        );
    }
    let _ = writeln!(out, "{separator}");

    let hidden = contributors.len() - shown.len();
    if hidden > 0 {
        let _ = writeln!(out, " ... and {hidden} more");
    }
    let total_lines: usize = contributors.iter().map(|m| m.lines).sum();
    let _ = writeln!(
        out,
        " {} contributors, {total_lines} lines, ranked by {mode}",
        contributors.len()
    );
    out
}

pub fn print_report(path: &Path, outcome: &AttributionOutcome, mode: CountMode, top: usize) {
    print!("{}", render_report(path, outcome, mode, top));
}

#[derive(Serialize)]
struct JsonReport<'a> {
    path: String,
    count_mode: CountMode,
    summary: String,
    #[serde(flatten)]
    outcome: JsonOutcome<'a>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum JsonOutcome<'a> {
    Ranked { contributors: &'a [ContributorMetric] },
    FileTooLarge { size: u64, limit: u64 },
    NotInRepository,
}

fn json_report<'a>(
    path: &Path,
    outcome: &'a AttributionOutcome,
    mode: CountMode,
    top: usize,
) -> JsonReport<'a> {
    let (summary, outcome) = match outcome {
        AttributionOutcome::Ranked { contributors } => (
            status_text(contributors, mode),
            JsonOutcome::Ranked {
                contributors: &contributors[..contributors.len().min(top)],
            },
        ),
        AttributionOutcome::FileTooLarge { size, limit } => (
            "File too large".to_string(),
            JsonOutcome::FileTooLarge {
                size: *size,
                limit: *limit,
            },
        ),
        AttributionOutcome::NotInRepository => {
            ("Not in repository".to_string(), JsonOutcome::NotInRepository)
        }
    };
    JsonReport {
        path: path.display().to_string(),
        count_mode: mode,
        summary,
        outcome,
    }
}

pub fn print_json(
    path: &Path,
    outcome: &AttributionOutcome,
    mode: CountMode,
    top: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    print_json_stdout(&json_report(path, outcome, mode, top))
}

/// Per-line listing: line number, author, content.
pub fn render_lines(lines: &[LineAttribution]) -> String {
    let mut out = String::new();
    if lines.is_empty() {
        out.push_str("No attributed lines.\n");
        return out;
    }
    let num_w = lines
        .iter()
        .map(|l| l.line_number.to_string().len())
        .max()
        .unwrap_or(1);
    let author_w = max_display_width(lines.iter().map(|l| l.author.as_str()), 6);
    for l in lines {
        let _ = writeln!(
            out,
            "{:>nw$}  {} \u{2502} {}",
            l.line_number,
            pad_right(&l.author, author_w),
            l.content,
            nw = num_w
        );
    }
    out
}

pub fn print_lines(lines: &[LineAttribution]) {
    print!("{}", render_lines(lines));
}

pub fn print_lines_json(lines: &[LineAttribution]) -> Result<(), Box<dyn std::error::Error>> {
    print_json_stdout(&lines)
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
