//! Error types for texforge.
//!
//! Library crates use [`TexforgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all texforge operations.
#[derive(Debug, thiserror::Error)]
pub enum TexforgeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Malformed metadata descriptor (`metadata.json`).
    #[error("metadata error: {message}")]
    Metadata { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Precondition failure (missing paper directory, policy violation).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// External tool could not be spawned at all.
    #[error("failed to run `{tool}`: {message}")]
    Tool { tool: String, message: String },

    /// A typesetting pass exited non-zero. Carries the tail of the
    /// tool's output, since that is where LaTeX failures are diagnosed.
    #[error("{pass} failed:\n{log_tail}")]
    Pass { pass: String, log_tail: String },

    /// An external invocation exceeded its bounded wait.
    #[error("{pass} timed out after {secs}s")]
    Timeout { pass: String, secs: u64 },

    /// All passes reported success but the final artifact is missing.
    #[error("build completed but artifact {path:?} was not produced")]
    ArtifactMissing { path: PathBuf },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TexforgeError>;

impl TexforgeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a metadata error from any displayable message.
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TexforgeError::config("missing toolchain section");
        assert_eq!(err.to_string(), "config error: missing toolchain section");

        let err = TexforgeError::validation("paper directory does not exist");
        assert!(err.to_string().contains("paper directory"));
    }

    #[test]
    fn pass_error_carries_log_tail() {
        let err = TexforgeError::Pass {
            pass: "pdflatex (pass 1/3)".into(),
            log_tail: "! Undefined control sequence.".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("pdflatex (pass 1/3)"));
        assert!(msg.contains("Undefined control sequence"));
    }
}
