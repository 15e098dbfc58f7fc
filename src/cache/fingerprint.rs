use std::fmt;
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};

const SHORT_HASH_LEN: usize = 16;

/// Cache key identifying one state of one file.
///
/// Shaped `path|mtime_ms|size|short_hash`, or `path|sha256:<hash>` when the
/// file's metadata cannot be read. The path is also kept on its own, so
/// ownership checks compare it exactly even when it contains `|`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    path: String,
    key: String,
}

fn content_hash(content: &str) -> String {
    Sha256::digest(content.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

impl Fingerprint {
    /// Fingerprint `path` holding `content`, using filesystem metadata when
    /// available.
    pub fn compute(path: &Path, content: &str) -> Self {
        let stamp = fs::metadata(path).ok().and_then(|meta| {
            let mtime = meta.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
            Some((mtime.as_millis(), meta.len()))
        });
        match stamp {
            Some((mtime_ms, size)) => Self::from_metadata(path, content, mtime_ms, size),
            None => Self::from_content(path, content),
        }
    }

    pub fn from_metadata(path: &Path, content: &str, mtime_ms: u128, size: u64) -> Self {
        let hash = content_hash(content);
        Self::with_stamp(path, &format!("{mtime_ms}|{size}|{}", &hash[..SHORT_HASH_LEN]))
    }

    pub fn from_content(path: &Path, content: &str) -> Self {
        Self::with_stamp(path, &format!("sha256:{}", content_hash(content)))
    }

    fn with_stamp(path: &Path, stamp: &str) -> Self {
        let path = path.display().to_string();
        let key = format!("{path}|{stamp}");
        Self { path, key }
    }

    /// Derive a key that also distinguishes `tag` (e.g. counting options).
    pub fn tagged(&self, tag: &str) -> Self {
        Self {
            path: self.path.clone(),
            key: format!("{}#{tag}", self.key),
        }
    }

    /// Whether this fingerprint identifies a state of exactly `path`.
    pub fn belongs_to(&self, path: &Path) -> bool {
        self.path == path.display().to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn metadata_form() {
        let fp = Fingerprint::from_metadata(Path::new("/r/a.rs"), "abc", 1234, 3);
        let s = fp.as_str();
        assert!(s.starts_with("/r/a.rs|1234|3|"), "got {s}");
        // sha256("abc") = ba7816bf...
        assert!(s.ends_with("ba7816bf8f01cfea"), "got {s}");
    }

    #[test]
    fn content_form_uses_full_hash() {
        let fp = Fingerprint::from_content(Path::new("/r/a.rs"), "abc");
        assert_eq!(
            fp.as_str(),
            "/r/a.rs|sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn any_change_changes_fingerprint() {
        let p = Path::new("a.rs");
        let base = Fingerprint::from_metadata(p, "x", 1, 1);
        assert_ne!(base, Fingerprint::from_metadata(p, "y", 1, 1));
        assert_ne!(base, Fingerprint::from_metadata(p, "x", 2, 1));
        assert_ne!(base, Fingerprint::from_metadata(p, "x", 1, 2));
        assert_eq!(base, Fingerprint::from_metadata(p, "x", 1, 1));
    }

    #[test]
    fn missing_file_falls_back_to_content_hash() {
        let dir = tempfile::tempdir().unwrap();
        let fp = Fingerprint::compute(&dir.path().join("gone.rs"), "abc");
        assert!(fp.as_str().contains("|sha256:"));
    }

    #[test]
    fn existing_file_uses_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.rs");
        fs::write(&path, "abc").unwrap();
        let fp = Fingerprint::compute(&path, "abc");
        assert!(!fp.as_str().contains("sha256:"));
        assert!(fp.as_str().contains("|3|"));
    }

    #[test]
    fn prefix_ownership_is_exact() {
        let fp = Fingerprint::from_content(Path::new("src/a.rs"), "x").tagged("lines");
        assert!(fp.belongs_to(Path::new("src/a.rs")));
        assert!(!fp.belongs_to(&PathBuf::from("src/a")));
        assert!(!fp.belongs_to(Path::new("src/a.rs.bak")));
    }

    #[test]
    fn ownership_ignores_separator_in_path() {
        let fp = Fingerprint::from_content(Path::new("a|b"), "x");
        assert!(fp.as_str().starts_with("a|b|sha256:"));
        assert!(fp.belongs_to(Path::new("a|b")));
        assert!(!fp.belongs_to(Path::new("a")));
    }
}
