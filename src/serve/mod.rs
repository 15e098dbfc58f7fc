//! JSON-lines protocol for editor hosts.
//!
//! One request per input line, one response per output line. A host keeps
//! the process running for its whole session so the result cache survives
//! between requests:
//!
//! ```text
//! → {"op":"attribute","path":"src/lib.rs","content":"..."}
//! ← {"status":"ranked","contributors":[{"author":"Alice",...}]}
//! → {"op":"changed","path":"src/lib.rs"}
//! ← {"status":"invalidated","removed":1}
//! ```
//!
//! `count_mode`, `ignore_blank_lines` and `max_file_size_kb` on an
//! `attribute` request override the configured values for that request.
//! Malformed requests and failed queries get an `error` response; the loop
//! only ends at end of input or when the output side goes away.

use std::error::Error;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{AttributionConfig, Config};
use crate::git::{GitCli, HistoryClient};
use crate::ownership::analyzer::CountMode;
use crate::session::{AttributionOutcome, Session};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    Attribute {
        path: PathBuf,
        /// Editor buffer; the file on disk is read when absent.
        content: Option<String>,
        count_mode: Option<CountMode>,
        ignore_blank_lines: Option<bool>,
        max_file_size_kb: Option<u64>,
    },
    Changed {
        path: PathBuf,
    },
    Sweep,
    Clear,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Status {
    Invalidated { removed: usize },
    Swept { removed: usize },
    Cleared,
    Error { message: String },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Response {
    Attribution(AttributionOutcome),
    Status(Status),
}

impl Response {
    fn error(message: impl Into<String>) -> Self {
        Response::Status(Status::Error {
            message: message.into(),
        })
    }
}

fn handle<H: HistoryClient>(
    session: &Session<H>,
    defaults: &AttributionConfig,
    request: Request,
) -> Response {
    match request {
        Request::Attribute {
            path,
            content,
            count_mode,
            ignore_blank_lines,
            max_file_size_kb,
        } => {
            let content = match content {
                Some(c) => c,
                None => match fs::read_to_string(&path) {
                    Ok(c) => c,
                    Err(e) => return Response::error(format!("{}: {e}", path.display())),
                },
            };
            let config = AttributionConfig {
                count_mode: count_mode.unwrap_or(defaults.count_mode),
                ignore_blank_lines: ignore_blank_lines.unwrap_or(defaults.ignore_blank_lines),
                max_file_size_kb: max_file_size_kb.unwrap_or(defaults.max_file_size_kb),
            };
            match session.request_attribution(&path, &content, &config) {
                Ok(outcome) => Response::Attribution(outcome),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "attribution failed");
                    Response::error(e.to_string())
                }
            }
        }
        Request::Changed { path } => Response::Status(Status::Invalidated {
            removed: session.notify_changed(&path),
        }),
        Request::Sweep => Response::Status(Status::Swept {
            removed: session.sweep(),
        }),
        Request::Clear => {
            session.clear_cache();
            Response::Status(Status::Cleared)
        }
    }
}

/// Answer requests from `input` until it is exhausted.
pub fn serve<H, R, W>(
    session: &Session<H>,
    defaults: &AttributionConfig,
    input: R,
    mut output: W,
) -> io::Result<()>
where
    H: HistoryClient,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle(session, defaults, request),
            Err(e) => Response::error(format!("invalid request: {e}")),
        };
        let text = serde_json::to_string(&response).map_err(io::Error::other)?;
        writeln!(output, "{text}")?;
        output.flush()?;
    }
    Ok(())
}

/// `lo serve`: run the protocol on stdin/stdout.
pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let cwd = std::env::current_dir()?;
    let config = Config::load(config_path, &cwd)?;
    let session = Session::new(GitCli::new(config.history), config.cache);

    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(&session, &config.attribution, stdin.lock(), stdout.lock())?;
    Ok(())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
