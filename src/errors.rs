// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Errors fall in two groups:
//! - session errors (hashing, config, server guard) abort the whole run,
//! - stage errors (`Extract`, `Contract`, `File`) only fail the scenario
//!   that hit them.
//!
//! See [`CacheError::is_fatal`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// An input to a fingerprint could not be read.
    #[error("cannot hash {path:?}: {reason}")]
    HashError { path: PathBuf, reason: String },

    #[error("extraction failed with exit code {code}:\n{log_tail}")]
    ExtractError { code: i32, log_tail: String },

    #[error("contraction failed with exit code {code}:\n{log_tail}")]
    ContractError { code: i32, log_tail: String },

    /// A rename/copy between cache locations failed after the stage's
    /// process exited successfully.
    #[error("cache file error at {path:?}: {reason}")]
    FileError { path: PathBuf, reason: String },

    #[error("a routing server is already running at {0}; stop it before running the pipeline")]
    AlreadyRunning(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CacheError {
    /// Whether this error aborts the whole session.
    ///
    /// Stage failures are scenario-local; everything upstream of path
    /// derivation means nothing downstream can be trusted.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            CacheError::ExtractError { .. }
                | CacheError::ContractError { .. }
                | CacheError::FileError { .. }
        )
    }

    pub(crate) fn file(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        CacheError::FileError {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CacheError>;
