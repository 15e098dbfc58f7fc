use super::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::blame::UNCOMMITTED_AUTHOR;
use crate::error::HistoryError;
use crate::ownership::analyzer::CountMode;

const REV_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1";
const REV_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb2";

/// Scripted history client that records how it was called.
#[derive(Default)]
struct FakeHistory {
    outside: bool,
    untracked: bool,
    modified: bool,
    fail_blame: bool,
    raw: String,
    queries: AtomicUsize,
    blames: AtomicUsize,
    /// (substitute path, its content at blame time)
    substitute: Mutex<Option<(PathBuf, String)>>,
}

impl FakeHistory {
    fn with_raw(raw: String) -> Self {
        Self {
            raw,
            ..Self::default()
        }
    }

    fn blames(&self) -> usize {
        self.blames.load(Ordering::SeqCst)
    }
}

impl HistoryClient for FakeHistory {
    fn is_under_version_control(&self, _: &Path) -> Result<bool, HistoryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(!self.untracked)
    }

    fn has_uncommitted_changes(&self, _: &Path) -> Result<bool, HistoryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.modified)
    }

    fn is_inside_repository(&self, _: &Path) -> Result<bool, HistoryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(!self.outside)
    }

    fn line_attribution(
        &self,
        _: &Path,
        substitute: Option<&Path>,
    ) -> Result<String, HistoryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.blames.fetch_add(1, Ordering::SeqCst);
        *self.substitute.lock() = substitute.map(|p| {
            let text = fs::read_to_string(p).unwrap_or_default();
            (p.to_path_buf(), text)
        });
        if self.fail_blame {
            return Err(HistoryError::Timeout(Duration::from_secs(5)));
        }
        Ok(self.raw.clone())
    }

    fn repository_root(&self, path: &Path) -> Result<PathBuf, HistoryError> {
        Ok(path.parent().unwrap_or(Path::new(".")).to_path_buf())
    }

    fn current_revision(&self, _: &Path) -> Result<Option<String>, HistoryError> {
        Ok(Some(REV_A.to_string()))
    }
}

fn blame_block(rev: &str, line: usize, author: &str, content: &str) -> String {
    format!("{rev} {line} {line} 1\nauthor {author}\n\t{content}\n")
}

/// Raw blame for `authors` in order, one line each, content "x".
fn raw_for(authors: &[&str]) -> String {
    authors
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let rev = if *a == "Alice" { REV_A } else { REV_B };
            blame_block(rev, i + 1, a, "x")
        })
        .collect()
}

/// A file on disk holding `content`, kept alive by the returned dir.
fn file_with(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("file.rs");
    fs::write(&path, content).unwrap();
    (dir, path)
}

fn session(history: FakeHistory) -> Session<FakeHistory> {
    Session::new(history, CacheSettings::default())
}

fn ranked(outcome: AttributionOutcome) -> Vec<ContributorMetric> {
    match outcome {
        AttributionOutcome::Ranked { contributors } => contributors.to_vec(),
        other => panic!("expected ranked outcome, got {other:?}"),
    }
}

#[test]
fn single_line_scenario() {
    let (_dir, path) = file_with("hello world");
    let s = session(FakeHistory::with_raw(blame_block(REV_A, 1, "Alice", "hello world")));

    let out = s
        .request_attribution(&path, "hello world", &AttributionConfig::default())
        .unwrap();
    assert_eq!(
        ranked(out),
        vec![ContributorMetric {
            author: "Alice".to_string(),
            lines: 1,
            characters: 11,
            percentage: 100,
        }]
    );
    assert!(
        s.history().substitute.lock().is_none(),
        "clean file matching disk needs no substitute"
    );
}

#[test]
fn three_to_one_scenario() {
    let content = "x\nx\nx\nx\n";
    let (_dir, path) = file_with(content);
    let s = session(FakeHistory::with_raw(raw_for(&["Alice", "Alice", "Alice", "Bob"])));

    let metrics = ranked(
        s.request_attribution(&path, content, &AttributionConfig::default())
            .unwrap(),
    );
    assert_eq!(metrics[0].author, "Alice");
    assert_eq!(metrics[0].percentage, 75);
    assert_eq!(metrics[1].author, "Bob");
    assert_eq!(metrics[1].percentage, 25);
}

#[test]
fn oversized_file_short_circuits() {
    let content = "a".repeat(3000 * 1024);
    let s = session(FakeHistory::default());
    let config = AttributionConfig {
        max_file_size_kb: 2048,
        ..AttributionConfig::default()
    };

    let out = s
        .request_attribution(Path::new("/nowhere/big.rs"), &content, &config)
        .unwrap();
    assert_eq!(
        out,
        AttributionOutcome::FileTooLarge {
            size: 3000 * 1024,
            limit: 2048 * 1024,
        }
    );
    assert_eq!(s.history().queries.load(Ordering::SeqCst), 0);
}

#[test]
fn file_at_limit_is_processed() {
    let content = "a".repeat(1024);
    let (_dir, path) = file_with(&content);
    let s = session(FakeHistory::with_raw(blame_block(REV_A, 1, "Alice", &content)));
    let config = AttributionConfig {
        max_file_size_kb: 1,
        ..AttributionConfig::default()
    };
    let out = s.request_attribution(&path, &content, &config).unwrap();
    assert!(out.contributors().is_some());
}

#[test]
fn check_size_boundary() {
    let config = AttributionConfig {
        max_file_size_kb: 1,
        ..AttributionConfig::default()
    };
    assert_eq!(AttributionOutcome::check_size(&"a".repeat(1024), &config), None);
    assert_eq!(
        AttributionOutcome::check_size(&"a".repeat(1025), &config),
        Some(AttributionOutcome::FileTooLarge {
            size: 1025,
            limit: 1024,
        })
    );
}

#[test]
fn outside_repository_short_circuits() {
    let (_dir, path) = file_with("x\n");
    let s = session(FakeHistory {
        outside: true,
        ..FakeHistory::default()
    });
    let out = s
        .request_attribution(&path, "x\n", &AttributionConfig::default())
        .unwrap();
    assert_eq!(out, AttributionOutcome::NotInRepository);
    assert_eq!(s.history().blames(), 0);
}

#[test]
fn second_request_hits_cache() {
    let content = "x\nx\n";
    let (_dir, path) = file_with(content);
    let s = session(FakeHistory::with_raw(raw_for(&["Alice", "Bob"])));
    let config = AttributionConfig::default();

    let first = s.request_attribution(&path, content, &config).unwrap();
    let second = s.request_attribution(&path, content, &config).unwrap();

    assert_eq!(first, second);
    assert_eq!(s.history().blames(), 1);
}

#[test]
fn notify_changed_forces_recompute() {
    let content = "x\n";
    let (_dir, path) = file_with(content);
    let s = session(FakeHistory::with_raw(raw_for(&["Alice"])));
    let config = AttributionConfig::default();

    s.request_attribution(&path, content, &config).unwrap();
    assert_eq!(s.notify_changed(&path), 1);
    s.request_attribution(&path, content, &config).unwrap();

    assert_eq!(s.history().blames(), 2);
}

#[test]
fn changed_content_misses_cache() {
    let (_dir, path) = file_with("x\n");
    let s = session(FakeHistory::with_raw(raw_for(&["Alice"])));
    let config = AttributionConfig::default();

    s.request_attribution(&path, "x\n", &config).unwrap();
    s.request_attribution(&path, "y\n", &config).unwrap();

    assert_eq!(s.history().blames(), 2);
}

#[test]
fn count_mode_is_part_of_the_cache_key() {
    let content = "a\na\na\nlong line by bob\n";
    let (_dir, path) = file_with(content);
    let raw = [
        blame_block(REV_A, 1, "Alice", "a"),
        blame_block(REV_A, 2, "Alice", "a"),
        blame_block(REV_A, 3, "Alice", "a"),
        blame_block(REV_B, 4, "Bob", "long line by bob"),
    ]
    .concat();
    let s = session(FakeHistory::with_raw(raw));

    let by_lines = ranked(
        s.request_attribution(&path, content, &AttributionConfig::default())
            .unwrap(),
    );
    let by_chars = ranked(
        s.request_attribution(
            &path,
            content,
            &AttributionConfig {
                count_mode: CountMode::Characters,
                ..AttributionConfig::default()
            },
        )
        .unwrap(),
    );

    assert_eq!(by_lines[0].author, "Alice");
    assert_eq!(by_chars[0].author, "Bob");
    assert_eq!(s.history().blames(), 2);
}

#[test]
fn untracked_file_uses_substitute_and_falls_back() {
    let content = "one\ntwo\n";
    let (_dir, path) = file_with(content);
    let s = session(FakeHistory {
        untracked: true,
        ..FakeHistory::default()
    });

    let metrics = ranked(
        s.request_attribution(&path, content, &AttributionConfig::default())
            .unwrap(),
    );
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].author, UNCOMMITTED_AUTHOR);
    assert_eq!(metrics[0].lines, 2);

    let (sub_path, sub_content) = s.history().substitute.lock().clone().unwrap();
    assert_eq!(sub_content, content);
    assert!(!sub_path.exists(), "substitute must be deleted after the request");
}

#[test]
fn modified_file_uses_substitute() {
    let content = "x\n";
    let (_dir, path) = file_with(content);
    let s = session(FakeHistory {
        modified: true,
        raw: raw_for(&["Alice"]),
        ..FakeHistory::default()
    });
    s.request_attribution(&path, content, &AttributionConfig::default())
        .unwrap();
    let (sub_path, sub_content) = s.history().substitute.lock().clone().unwrap();
    assert_eq!(sub_content, content);
    assert!(!sub_path.exists());
}

#[test]
fn unsaved_buffer_uses_substitute() {
    let (_dir, path) = file_with("saved\n");
    let s = session(FakeHistory::with_raw(raw_for(&["Alice"])));
    s.request_attribution(&path, "edited\n", &AttributionConfig::default())
        .unwrap();
    let (_, sub_content) = s.history().substitute.lock().clone().unwrap();
    assert_eq!(sub_content, "edited\n");
}

#[test]
fn history_failure_is_surfaced_and_cleans_up() {
    let content = "x\n";
    let (_dir, path) = file_with(content);
    let s = session(FakeHistory {
        untracked: true,
        fail_blame: true,
        ..FakeHistory::default()
    });

    let err = s
        .request_attribution(&path, content, &AttributionConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        RequestError::History(HistoryError::Timeout(_))
    ));

    let (sub_path, _) = s.history().substitute.lock().clone().unwrap();
    assert!(!sub_path.exists(), "substitute must be deleted on failure");
    assert!(s.cache().is_empty(), "failures are not cached");
}

#[test]
fn empty_file_yields_no_contributors() {
    let (_dir, path) = file_with("");
    let s = session(FakeHistory::default());
    let out = s
        .request_attribution(&path, "", &AttributionConfig::default())
        .unwrap();
    assert_eq!(out.contributors(), Some(&[][..]));
}

#[test]
fn ignore_blank_lines_drops_blank_contributions() {
    let content = "code\n\n";
    let (_dir, path) = file_with(content);
    let raw = [
        blame_block(REV_A, 1, "Alice", "code"),
        blame_block(REV_B, 2, "Bob", ""),
    ]
    .concat();
    let s = session(FakeHistory::with_raw(raw));
    let config = AttributionConfig {
        ignore_blank_lines: true,
        ..AttributionConfig::default()
    };
    let metrics = ranked(s.request_attribution(&path, content, &config).unwrap());
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].author, "Alice");
}

#[test]
fn attribute_lines_bypasses_cache() {
    let content = "x\nx\n";
    let (_dir, path) = file_with(content);
    let s = session(FakeHistory::with_raw(raw_for(&["Alice", "Bob"])));

    let lines = s.attribute_lines(&path, content).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1].author, "Bob");
    assert!(s.cache().is_empty());
}

#[test]
fn concurrent_requests_agree() {
    let content = "x\nx\nx\n";
    let (_dir, path) = file_with(content);
    let s = Arc::new(session(FakeHistory::with_raw(raw_for(&["Alice", "Bob", "Alice"]))));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let s = Arc::clone(&s);
            let path = path.clone();
            thread::spawn(move || {
                ranked(
                    s.request_attribution(&path, content, &AttributionConfig::default())
                        .unwrap(),
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(results[0][0].author, "Alice");
    assert!(s.history().blames() >= 1);
    assert_eq!(s.cache().len(), 1);
}

#[test]
fn sweep_and_clear() {
    let (_dir, path) = file_with("x\n");
    let s = Session::new(
        FakeHistory::with_raw(raw_for(&["Alice"])),
        CacheSettings {
            ttl: Duration::from_millis(1),
            max_entries: 10,
        },
    );
    s.request_attribution(&path, "x\n", &AttributionConfig::default())
        .unwrap();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(s.sweep(), 1);

    s.request_attribution(&path, "x\n", &AttributionConfig::default())
        .unwrap();
    s.clear_cache();
    assert!(s.cache().is_empty());
}
