//! Error types for package assembly and verification.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for packaging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of packaging errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Package metadata is not acceptable to dpkg.
    Metadata,
    /// A payload file could not be read or the output not written.
    Io,
    /// Signing keys or signatures are unusable.
    Signing,
    /// A package on disk is not laid out as expected.
    Format,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Metadata => "Invalid package metadata",
            Self::Io => "Filesystem error",
            Self::Signing => "Signing failed",
            Self::Format => "Malformed package",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Metadata => "Check the [deb] and [project] settings",
            Self::Io => "Check that the payload exists and the output directory is writable",
            Self::Signing => "Check the key file: it must hold a base64 encoded 32 byte Ed25519 key",
            Self::Format => "Rebuild the package; it may be truncated or altered",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while building or verifying a package.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Package name rejected by Debian policy.
    #[error("invalid package name '{name}': {reason}")]
    InvalidName {
        /// Offending name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Package version rejected by Debian policy.
    #[error("invalid package version '{version}': {reason}")]
    InvalidVersion {
        /// Offending version.
        version: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A control field value cannot be written.
    #[error("invalid control field {field}: {reason}")]
    InvalidField {
        /// Field name.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Two entries map to the same path inside the package.
    #[error("duplicate package path {path}")]
    DuplicatePath {
        /// Path inside the package.
        path: String,
    },

    /// An entry destination is not an absolute, normal path.
    #[error("invalid package path '{path}': {reason}")]
    InvalidPath {
        /// Path inside the package.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Signing key could not be loaded.
    #[error("invalid signing key {}: {message}", .path.display())]
    Key {
        /// Key file.
        path: PathBuf,
        /// Reason.
        message: String,
    },

    /// A signature did not verify.
    #[error("signature {member} does not verify: {message}")]
    Signature {
        /// Signature member name.
        member: String,
        /// Reason.
        message: String,
    },

    /// The package carries no signature members.
    #[error("package {} is not signed", .path.display())]
    Unsigned {
        /// Package file.
        path: PathBuf,
    },

    /// The archive envelope is malformed.
    #[error("malformed package {}: {message}", .path.display())]
    Format {
        /// Package file.
        path: PathBuf,
        /// Reason.
        message: String,
    },

    /// IO error with path context.
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a format error.
    pub fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidName { .. }
            | Error::InvalidVersion { .. }
            | Error::InvalidField { .. }
            | Error::DuplicatePath { .. }
            | Error::InvalidPath { .. } => ErrorCategory::Metadata,
            Error::Key { .. } | Error::Signature { .. } | Error::Unsigned { .. } => {
                ErrorCategory::Signing
            }
            Error::Format { .. } => ErrorCategory::Format,
            Error::Io { .. } => ErrorCategory::Io,
        }
    }
}
