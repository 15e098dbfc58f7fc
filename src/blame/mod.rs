//! Parser for `git blame --line-porcelain` output.
//!
//! Each attributed line arrives as one block:
//!
//! ```text
//! <revision> <orig-line> <final-line> [<count>]
//! author <name>
//! author-mail <<email>>
//! ...more metadata...
//! \t<line content>
//! ```
//!
//! Blocks are turned into [`LineAttribution`] records numbered by their
//! final line. Records that point outside the current content are dropped.

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

/// Author label for lines that exist only in the working copy.
pub const UNCOMMITTED_AUTHOR: &str = "Not Committed Yet";

/// Author label when a block names nobody.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineAttribution {
    pub author: String,
    /// 1-based line number in the current content.
    pub line_number: usize,
    pub content: String,
}

/// Revision ids are SHA-1 (40 hex) or SHA-256 (64 hex) object names.
fn is_revision(token: &str) -> bool {
    matches!(token.len(), 40 | 64) && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Parse a block header, returning (revision, final line number).
fn parse_header(line: &str) -> Option<(&str, usize)> {
    let mut parts = line.split(' ');
    let revision = parts.next().filter(|t| is_revision(t))?;
    let _original: usize = parts.next()?.parse().ok()?;
    let final_line = parts.next()?.parse().ok()?;
    Some((revision, final_line))
}

/// Trim, collapse inner whitespace, and map working-copy markers to
/// [`UNCOMMITTED_AUTHOR`].
pub fn normalize_author(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return UNKNOWN_AUTHOR.to_string();
    }
    let lower = collapsed.to_lowercase();
    if lower.contains("not committed yet") || lower.contains("external file") {
        return UNCOMMITTED_AUTHOR.to_string();
    }
    collapsed
}

fn bare_address(mail: &str) -> &str {
    let mail = mail.trim();
    let mail = mail.strip_prefix('<').unwrap_or(mail);
    mail.strip_suffix('>').unwrap_or(mail)
}

/// Per-block parser state. Reset after every content line.
#[derive(Default)]
struct Block<'a> {
    revision: Option<&'a str>,
    line_number: usize,
    author: Option<&'a str>,
    mail: Option<&'a str>,
}

impl Block<'_> {
    /// Resolve the block's author: `author`, else the `author-mail` address.
    /// `None` if the block carried neither field.
    fn author(&self) -> Option<String> {
        if self.author.is_none() && self.mail.is_none() {
            return None;
        }
        let name = self.author.map(str::trim).unwrap_or_default();
        if !name.is_empty() {
            return Some(normalize_author(name));
        }
        Some(normalize_author(self.mail.map(bare_address).unwrap_or_default()))
    }
}

/// Parse raw line-porcelain text against the current file `content`.
///
/// When the text yields no records but `content` is not blank, every line
/// of `content` is attributed to [`UNCOMMITTED_AUTHOR`].
pub fn parse_line_porcelain(raw: &str, content: &str) -> Vec<LineAttribution> {
    let total_lines = content.lines().count();
    let mut result = Vec::new();
    let mut block = Block::default();
    // Plain `--porcelain` only sends metadata with a revision's first block.
    let mut known_authors: HashMap<&str, String> = HashMap::new();

    for line in raw.lines() {
        if let Some(text) = line.strip_prefix('\t') {
            let author = block.author().or_else(|| {
                block
                    .revision
                    .and_then(|rev| known_authors.get(rev).cloned())
            });
            if let (Some(rev), Some(name)) = (block.revision, &author) {
                known_authors.insert(rev, name.clone());
            }

            match author {
                Some(author)
                    if !author.is_empty()
                        && block.line_number >= 1
                        && block.line_number <= total_lines =>
                {
                    result.push(LineAttribution {
                        author,
                        line_number: block.line_number,
                        content: text.to_string(),
                    });
                }
                _ => trace!(
                    line = block.line_number,
                    total_lines, "dropping unattributable blame record"
                ),
            }
            block = Block::default();
            continue;
        }

        if let Some((revision, final_line)) = parse_header(line) {
            block.revision = Some(revision);
            block.line_number = final_line;
            continue;
        }

        let (key, value) = line.split_once(' ').unwrap_or((line, ""));
        match key {
            "author" => block.author = Some(value),
            "author-mail" => block.mail = Some(value),
            _ => {}
        }
    }

    if result.is_empty() && !content.trim().is_empty() {
        return uncommitted_fallback(content);
    }
    result
}

fn uncommitted_fallback(content: &str) -> Vec<LineAttribution> {
    content
        .lines()
        .enumerate()
        .map(|(i, text)| LineAttribution {
            author: UNCOMMITTED_AUTHOR.to_string(),
            line_number: i + 1,
            content: text.to_string(),
        })
        .collect()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
