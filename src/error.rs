use std::path::PathBuf;

/// All errors that can occur while tracking activities.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("activity '{name}' is already being tracked")]
    Conflict { name: String },

    #[error("category '{0}' was not found")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("oracle request failed after {attempts} attempts: {message}")]
    Oracle { attempts: u32, message: String },

    #[error("failed to access session token at {path}: {source}")]
    TokenIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TrackError>;
