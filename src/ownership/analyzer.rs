use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::blame::LineAttribution;

/// Which quantity ranks contributors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountMode {
    #[default]
    Lines,
    Characters,
}

impl CountMode {
    pub fn label(&self) -> &'static str {
        match self {
            CountMode::Lines => "lines",
            CountMode::Characters => "characters",
        }
    }

    fn value(&self, m: &ContributorMetric) -> usize {
        match self {
            CountMode::Lines => m.lines,
            CountMode::Characters => m.characters,
        }
    }
}

impl fmt::Display for CountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CountMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lines" => Ok(CountMode::Lines),
            "characters" => Ok(CountMode::Characters),
            other => Err(format!(
                "unknown count mode {other:?} (expected lines or characters)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorMetric {
    pub author: String,
    pub lines: usize,
    pub characters: usize,
    /// Share of the active count mode's total, rounded per entry.
    pub percentage: u8,
}

fn percentage(value: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (value as f64 * 100.0 / total as f64).round().min(100.0) as u8
}

/// Fold per-line attributions into ranked per-author totals.
///
/// Authors with equal counts keep the order in which they first appear
/// in `lines`.
pub fn aggregate(
    lines: &[LineAttribution],
    mode: CountMode,
    ignore_blank_lines: bool,
) -> Vec<ContributorMetric> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut metrics: Vec<ContributorMetric> = Vec::new();

    for line in lines {
        if ignore_blank_lines && line.content.trim().is_empty() {
            continue;
        }
        let slot = *index.entry(line.author.as_str()).or_insert_with(|| {
            metrics.push(ContributorMetric {
                author: line.author.clone(),
                lines: 0,
                characters: 0,
                percentage: 0,
            });
            metrics.len() - 1
        });
        let m = &mut metrics[slot];
        m.lines += 1;
        m.characters += line.content.chars().count();
    }

    let total: usize = metrics.iter().map(|m| mode.value(m)).sum();
    for m in &mut metrics {
        m.percentage = percentage(mode.value(m), total);
    }

    // sort_by is stable: ties stay in first-seen order
    metrics.sort_by(|a, b| mode.value(b).cmp(&mode.value(a)));
    metrics
}

/// The highest-ranked contributor, if any.
pub fn top_contributor(metrics: &[ContributorMetric]) -> Option<&ContributorMetric> {
    metrics.first()
}

/// One-line summary suitable for a status bar, e.g. `Alice 75% (3 lines)`.
pub fn status_text(metrics: &[ContributorMetric], mode: CountMode) -> String {
    match top_contributor(metrics) {
        Some(top) => {
            let value = mode.value(top);
            let unit = match (mode, value) {
                (CountMode::Lines, 1) => "line",
                (CountMode::Characters, 1) => "character",
                _ => mode.label(),
            };
            format!("{} {}% ({value} {unit})", top.author, top.percentage)
        }
        None => "No contributors".to_string(),
    }
}

#[cfg(test)]
#[path = "analyzer_test.rs"]
mod tests;
