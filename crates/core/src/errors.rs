//! Error types for the gitavatar core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Identity errors
// ---------------------------------------------------------------------------

/// Errors from committer identity handling.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// A fingerprint was requested for an email that is empty once trimmed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from opening a working copy and reading its log.
#[derive(Debug, Error)]
pub enum GitError {
    /// The working copy directory does not exist.
    #[error("working copy directory does not exist: '{0}'")]
    DirectoryNotFound(PathBuf),

    /// The directory exists but has no `.git` directory.
    #[error("no git repository found at '{0}'")]
    RepositoryNotFound(PathBuf),

    /// The `git` binary was not found on `$PATH`.
    #[error("git binary not found: {0}")]
    BinaryNotFound(String),

    /// A `git` command exited with a non-zero status.
    #[error("git command failed (exit {exit_code}): {stderr}")]
    CommandFailed {
        exit_code: i32,
        stderr: String,
    },

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Fetch errors
// ---------------------------------------------------------------------------

/// Errors from retrieving and persisting a single avatar image.
///
/// These never abort a whole run; the orchestrator records them per committer.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP-level transport error (connect, TLS, body read, timeout).
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The image service answered with a status that is neither success nor 404.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus {
        status: u16,
        url: String,
    },

    /// Writing the image to disk failed.
    #[error("failed to write '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be prepared.
    #[error("output directory '{path}' is unusable: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure reported by a non-HTTP avatar source.
    #[error("avatar source error: {0}")]
    Source(String),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = IdentityError::InvalidArgument("email must not be empty".into());
        assert_eq!(err.to_string(), "invalid argument: email must not be empty");

        let err = GitError::RepositoryNotFound(PathBuf::from("/tmp/repo"));
        assert_eq!(err.to_string(), "no git repository found at '/tmp/repo'");

        let err = FetchError::UnexpectedStatus {
            status: 500,
            url: "https://www.gravatar.com/avatar/abc.png".into(),
        };
        assert!(err.to_string().contains("500"));

        let err = ConfigError::InvalidValue {
            field: "gravatar.size".into(),
            detail: "must be between 1 and 2048".into(),
        };
        assert!(err.to_string().contains("gravatar.size"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let git_err = GitError::BinaryNotFound("git".into());
        let core_err: CoreError = git_err.into();
        assert!(matches!(core_err, CoreError::Git(_)));

        let id_err = IdentityError::InvalidArgument("x".into());
        let core_err: CoreError = id_err.into();
        assert_eq!(core_err.to_string(), "invalid argument: x");
    }
}
