//! The "currently running activity" pointer, kept in a tiny token file next
//! to the database so a later invocation can answer "is something running"
//! without a query, and so sessions survive process restarts.

use std::{io::ErrorKind, path::PathBuf};

use tracing::warn;

use crate::error::{Result, TrackError};

/// The running activity as recorded in the token file.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub activity_id: i64,
    pub name: String,
    /// Unix seconds at which the activity started.
    pub started_at: i64,
}

pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Reads the token. A missing file or a token that does not parse is
    /// treated as "nothing running" rather than an error; corrupt state must
    /// never crash the tool.
    pub fn current(&self) -> Option<ActiveSession> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Could not read session token at {:?}: {e}", self.path);
                }
                return None;
            }
        };
        match parse_token(contents.trim()) {
            Some(session) => Some(session),
            None => {
                warn!("Ignoring malformed session token at {:?}", self.path);
                None
            }
        }
    }

    pub fn set(&self, activity_id: i64, name: &str, started_at: i64) -> Result<()> {
        std::fs::write(&self.path, format!("{activity_id}|{name}|{started_at}")).map_err(|e| {
            TrackError::TokenIo {
                path: self.path.clone(),
                source: e,
            }
        })
    }

    /// Removes the token. A token that is already gone is not an error.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TrackError::TokenIo {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

fn parse_token(token: &str) -> Option<ActiveSession> {
    let mut parts = token.splitn(3, '|');
    let activity_id = parts.next()?.parse().ok()?;
    let name = parts.next()?.to_string();
    // The original tool recorded fractional epoch seconds; accept both.
    let started_at = parts.next().map(str::trim)?;
    let started_at = started_at
        .parse::<i64>()
        .or_else(|_| started_at.parse::<f64>().map(|v| v as i64))
        .ok()?;
    Some(ActiveSession {
        activity_id,
        name,
        started_at,
    })
}
