use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run. Everything else is logged and skipped.
#[derive(Debug, Error)]
pub enum BriefError {
    #[error("repository path does not exist: {}", .0.display())]
    MissingRepo(PathBuf),

    #[error("not a git repository (no .git found): {}", .0.display())]
    NotAGitRepo(PathBuf),

    #[error("template file not found: {}", .0.display())]
    MissingTemplate(PathBuf),

    #[error("git history unavailable: {0}")]
    History(String),

    #[error("git log did not finish within {0}s")]
    Timeout(u64),

    #[error("config error: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl BriefError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        BriefError::Io { context: context.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, BriefError>;
