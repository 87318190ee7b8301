//! Pipeline Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Almost nothing in a run is fatal. Per-file failures are wrapped in these
//! errors and reported through [`Outcome::Failed`](crate::Outcome::Failed)
//! rather than returned; only [`ErrorKind::Cancelled`] ever ends a run early.

use derive_more::{Display, Error};
use std::path::{Path, PathBuf};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a pipeline failure.
///
/// ### Per-file Errors
/// - [`ErrorKind::Io`]
/// - [`ErrorKind::Convert`]
///
/// ### Run Errors
/// - [`ErrorKind::Cancelled`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Reading, renaming or deleting a file failed.
    #[display("I/O error on {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// The external converter failed for this input.
    #[display("conversion failed for {}", _0.display())]
    Convert(#[error(not(source))] PathBuf),
    /// The run was cancelled before it could finish.
    #[display("run cancelled")]
    Cancelled,
}

impl ErrorKind {
    /// Wrap an I/O error, keeping it as a child in the error tree.
    #[track_caller]
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Error {
        exn::Exn::from(err).raise(ErrorKind::Io(path.to_path_buf()))
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // File locks on network shares clear up; nothing is persisted between
        // runs, so "retry" means "the next run will try again anyway".
        matches!(self, Self::Io(_))
    }
}
