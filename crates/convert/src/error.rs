//! Conversion Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A conversion error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("ghostscript not detected on your system")]
    GhostscriptNotFound,
    /// A configured executable path does not exist (or is not a file).
    #[display("executable not found: {}", _0.display())]
    ExecutableNotFound(#[error(not(source))] PathBuf),
    /// The file handed to the converter vanished before it could be converted.
    #[display("input file not found: {}", _0.display())]
    InputNotFound(#[error(not(source))] PathBuf),
    #[display("script not found: {}", _0.display())]
    ScriptNotFound(#[error(not(source))] PathBuf),
    /// The process could not be spawned at all.
    #[display("failed to launch {}", _0.display())]
    Launch(#[error(not(source))] PathBuf),
    /// The converter ran and exited with a non-zero exit code. Captured
    /// standard error is kept as the diagnostic payload.
    #[display("converter exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },
    /// The converter was killed (by signal) before it could report an exit code.
    #[display("converter terminated without exit code: {_0}")]
    Terminated(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A converter that was killed mid-flight might succeed next time; one
        // that rejected its input will reject it again.
        matches!(self, Self::Launch(_) | Self::Terminated(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::Failed { code: 1, stderr: "Unrecoverable error".to_string() }.to_string(),
            "converter exited with code 1: Unrecoverable error"
        );
        assert_eq!(
            ErrorKind::InputNotFound(PathBuf::from("/archive/job.ps")).to_string(),
            "input file not found: /archive/job.ps"
        );
    }

    #[rstest]
    #[case(ErrorKind::Failed { code: 1, stderr: String::new() }, false)]
    #[case(ErrorKind::GhostscriptNotFound, false)]
    #[case(ErrorKind::ScriptNotFound(PathBuf::from("run.bat")), false)]
    #[case(ErrorKind::Launch(PathBuf::from("gs")), true)]
    #[case(ErrorKind::Terminated("signal: 9".to_string()), true)]
    fn error_kind_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }
}
