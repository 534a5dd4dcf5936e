// src/error.rs

use thiserror::Error;

/// Failures of a scrape run, one variant per pipeline stage.
#[derive(Debug, Error)]
pub enum Error {
    #[error("fetching settlement page failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("settlement page has unexpected structure: {0}")]
    Parse(String),
    #[error("settlement store failed: {0}")]
    Store(#[from] rusqlite::Error),
}

impl Error {
    /// Stage label used in the run's failure log line.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Fetch(_) => "fetch",
            Error::Parse(_) => "parse",
            Error::Store(_) => "store",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
