//! Error types for omnitrail_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using omnitrail_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a trail.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error not tied to a particular path.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// I/O error while reading or inspecting a path.
    #[error("I/O error at {path}: {source}")]
    PathIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A symlink resolves outside the allow list.
    #[error("Symlink {path} resolves to {target}, which is not in the allow list")]
    SymlinkNotAllowed { path: PathBuf, target: PathBuf },

    /// A reference handed to an aggregation node is not a valid gitoid.
    #[error("Invalid reference: {reason}")]
    InvalidReference { reason: String },

    /// Unsupported algorithm.
    #[error("Unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },
}

impl Error {
    /// Create a PathIo error.
    pub fn path_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::PathIo {
            path: path.into(),
            source,
        }
    }

    /// Create a SymlinkNotAllowed error.
    pub fn symlink_not_allowed(path: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Error::SymlinkNotAllowed {
            path: path.into(),
            target: target.into(),
        }
    }

    /// Create an InvalidReference error.
    pub fn invalid_reference(reason: impl Into<String>) -> Self {
        Error::InvalidReference {
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedAlgorithm error.
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Error::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }

    /// Whether this error is a symlink escaping the allow list.
    pub fn is_security_violation(&self) -> bool {
        matches!(self, Error::SymlinkNotAllowed { .. })
    }

    /// Whether this error means "the path is gone" rather than a real failure.
    pub(crate) fn is_not_found(&self) -> bool {
        match self {
            Error::Io { source } | Error::PathIo { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}

impl From<ignore::Error> for Error {
    fn from(err: ignore::Error) -> Self {
        // Walk errors wrap an io::Error, optionally with a path and depth attached.
        match err {
            ignore::Error::WithPath { path, err } => match *err {
                ignore::Error::Io(source) => Error::PathIo { path, source },
                other => Error::path_io(path, std::io::Error::other(other.to_string())),
            },
            ignore::Error::WithDepth { err, .. } => Error::from(*err),
            ignore::Error::Io(source) => Error::Io { source },
            other => match other.io_error() {
                Some(io_err) => Error::Io {
                    source: std::io::Error::new(io_err.kind(), io_err.to_string()),
                },
                None => Error::Io {
                    source: std::io::Error::other(other.to_string()),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_security_violation_classification() {
        let err = Error::symlink_not_allowed("/root/link", "/etc/passwd");
        assert!(err.is_security_violation());
        assert!(err.to_string().contains("/root/link"));

        let err = Error::path_io("/root/file", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(!err.is_security_violation());
    }

    #[test]
    fn test_not_found_classification() {
        let err = Error::path_io("/gone", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_not_found());

        let err = Error::path_io("/denied", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(!err.is_not_found());

        assert!(!Error::invalid_reference("bad").is_not_found());
    }

    #[test]
    fn test_ignore_error_keeps_path() {
        let err = ignore::Error::WithPath {
            path: PathBuf::from("/scan/dir"),
            err: Box::new(ignore::Error::Io(io::Error::from(
                io::ErrorKind::PermissionDenied,
            ))),
        };
        match Error::from(err) {
            Error::PathIo { path, source } => {
                assert_eq!(path, PathBuf::from("/scan/dir"));
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
