//! Long help text constants for CLI subcommands.

/// Ranked contributors for one file.
pub const SHOW: &str = "\
Show who owns the lines of a file, ranked by contributor.

Each line is attributed to the author of the commit that last touched it.
Lines that exist only in the working copy (unsaved or uncommitted edits,
untracked files) are attributed to \"Not Committed Yet\".

Contributors are ranked by the active count mode:
  lines       -- number of attributed lines (default)
  characters  -- number of characters on those lines

Percentages are each contributor's share of the total, rounded per entry,
so they may not add up to exactly 100.

Options are read from .lineowner.toml in the current directory (or the
file given with --config) and overridden by command-line flags.

Examples:
  lo show src/main.rs                          # rank by lines
  lo show src/main.rs --count-mode characters  # rank by characters
  lo show src/main.rs --ignore-blank-lines     # skip whitespace-only lines
  cat buffer | lo show src/main.rs --stdin     # attribute unsaved content
  lo show src/main.rs --json                   # machine-readable output";

/// Per-line attribution listing.
pub const LINES: &str = "\
List the author of every line of a file.

Use --author to keep only one contributor's lines, e.g. to jump to the
code a teammate last touched.

Examples:
  lo lines src/main.rs
  lo lines src/main.rs --author Alice
  lo lines src/main.rs --json";

/// Long-lived JSON-lines protocol for editor hosts.
pub const SERVE: &str = "\
Serve attribution requests as JSON lines on stdin/stdout.

Keeps the result cache alive between requests, so a host can ask again on
every focus or cursor change without re-running git.

Requests (one JSON object per line):
  {\"op\":\"attribute\",\"path\":\"src/a.rs\",\"content\":\"...\"}
      content, count_mode, ignore_blank_lines and max_file_size_kb are optional
  {\"op\":\"changed\",\"path\":\"src/a.rs\"}   drop cached results (file saved)
  {\"op\":\"sweep\"}                        drop expired cache entries
  {\"op\":\"clear\"}                        drop every cache entry

Responses carry a \"status\" field:
  ranked, file_too_large, not_in_repository,
  invalidated, swept, cleared, error

Malformed requests get an error response; serving continues.";
