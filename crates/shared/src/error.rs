//! Error types for the summary pipeline.
//!
//! The library reports failures through [`Error`]; the binaries wrap it with
//! `anyhow` for top-level context.

use std::path::PathBuf;

/// Every failure the pipeline can report.
///
/// `MissingField`, `Summary`, `InvalidRecord` and `CorruptRecord` concern a
/// single article and are logged and skipped by the callers; the rest abort
/// a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The feed could not be downloaded or parsed.
    #[error("failed to fetch feed: {0}")]
    Fetch(String),

    /// A feed item lacks a field every article needs.
    #[error("feed item {position} is missing {field}")]
    MissingField { position: usize, field: &'static str },

    /// The external summarizer failed for one thread.
    #[error("summarizer failed for {fragment}: {message}")]
    Summary { fragment: String, message: String },

    /// An article was refused by the store before anything was written.
    #[error("invalid record {thread_id:?}: {message}")]
    InvalidRecord { thread_id: String, message: String },

    /// A record or the record directory could not be written or listed.
    #[error("store error at {path:?}: {message}")]
    Store { path: PathBuf, message: String },

    /// A stored record could not be read back.
    #[error("corrupt record {path:?}: {message}")]
    CorruptRecord { path: PathBuf, message: String },

    /// A template was missing or an output file could not be written.
    #[error("render error: {0}")]
    Render(String),

    /// An environment setting could not be interpreted.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn summary(fragment: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Summary {
            fragment: fragment.into(),
            message: msg.into(),
        }
    }

    pub fn store(path: impl Into<PathBuf>, msg: impl ToString) -> Self {
        Self::Store {
            path: path.into(),
            message: msg.to_string(),
        }
    }

    pub fn invalid(thread_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidRecord {
            thread_id: thread_id.into(),
            message: msg.into(),
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, msg: impl ToString) -> Self {
        Self::CorruptRecord {
            path: path.into(),
            message: msg.to_string(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_names_the_path() {
        let err = Error::store("out", "permission denied");
        assert_eq!(err.to_string(), "store error at \"out\": permission denied");
    }

    #[test]
    fn test_display_names_the_fragment() {
        let err = Error::summary("hn:42", "exit status 2");
        assert_eq!(err.to_string(), "summarizer failed for hn:42: exit status 2");
    }
}
