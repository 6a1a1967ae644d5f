//! Error types for configuration validation.
//!
//! Errors are categorized so the caller can tell a rejected configuration
//! (the user's input is wrong) from a broken environment (no JVM, unreadable
//! artifact) and print the right advice.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for validation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The runtime rejected the rendered configuration.
    Configuration,
    /// The artifact is unreadable or does not look like an application jar.
    Artifact,
    /// The declared framework version could not be understood.
    Version,
    /// No JVM, or the JVM could not be started.
    Environment,
    /// Filesystem error around the validation workspace.
    Io,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Configuration rejected",
            Self::Artifact => "Unusable application artifact",
            Self::Version => "Unrecognised framework version",
            Self::Environment => "Java runtime unavailable",
            Self::Io => "Filesystem error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Configuration => "Fix the configuration template or the values it is rendered with",
            Self::Artifact => "Make sure the artifact is the shaded application jar",
            Self::Version => "Check the version declared for dropwizard-core",
            Self::Environment => "Install a JRE or set JAVA_HOME, or disable validation",
            Self::Io => "Check permissions of the temporary directory",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The rendered configuration failed the framework's own checks.
    #[error(
        "configuration {} was rejected: {}",
        .config.display(),
        join_diagnostics(.message, .diagnostics)
    )]
    ConfigurationInvalid {
        /// The rendered configuration file.
        config: PathBuf,
        /// Headline reported by the runtime.
        message: String,
        /// Individual problems, one per offending field.
        diagnostics: Vec<String>,
    },

    /// The declared framework version is not a version.
    #[error("invalid framework version '{version}': {message}")]
    InvalidVersion {
        /// Raw version string.
        version: String,
        /// Parser message.
        message: String,
    },

    /// No adapter is registered at all.
    #[error("no adapter available for framework version {version}")]
    NoAdapter {
        /// Detected version.
        version: String,
    },

    /// The artifact could not be read as a jar.
    #[error("cannot read artifact {}: {message}", .path.display())]
    Artifact {
        /// Artifact path.
        path: PathBuf,
        /// Reason.
        message: String,
    },

    /// The artifact does not contain what the selected adapter needs.
    #[error("{family} entry point {entry} not found in {}", .artifact.display())]
    EntryPointNotFound {
        /// Adapter family.
        family: String,
        /// Missing class or manifest attribute.
        entry: String,
        /// Artifact path.
        artifact: PathBuf,
    },

    /// No `java` executable could be located.
    #[error("java executable not found (checked JAVA_HOME and PATH)")]
    JavaNotFound,

    /// The JVM could not be started.
    #[error("failed to launch JVM: {message}")]
    Launch {
        /// Reason.
        message: String,
    },

    /// IO error during workspace setup or teardown.
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

    /// Create an artifact error.
    pub fn artifact(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Artifact {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ConfigurationInvalid { .. } => ErrorCategory::Configuration,
            Error::InvalidVersion { .. } | Error::NoAdapter { .. } => ErrorCategory::Version,
            Error::Artifact { .. } | Error::EntryPointNotFound { .. } => ErrorCategory::Artifact,
            Error::JavaNotFound | Error::Launch { .. } => ErrorCategory::Environment,
            Error::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Per-field problems, empty unless the configuration was rejected.
    #[must_use]
    pub fn diagnostics(&self) -> &[String] {
        match self {
            Error::ConfigurationInvalid { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

fn join_diagnostics(message: &str, diagnostics: &[String]) -> String {
    if diagnostics.is_empty() {
        message.to_string()
    } else {
        format!("{message} ({})", diagnostics.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_invalid_display_lists_diagnostics() {
        let err = Error::ConfigurationInvalid {
            config: PathBuf::from("/etc/svc.yml"),
            message: "svc.yml has an error".to_string(),
            diagnostics: vec!["database may not be null".to_string()],
        };
        let display = err.to_string();
        assert!(display.contains("/etc/svc.yml"));
        assert!(display.contains("database may not be null"));
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.diagnostics().len(), 1);
    }

    #[test]
    fn test_categories() {
        assert_eq!(Error::JavaNotFound.category(), ErrorCategory::Environment);
        assert_eq!(
            Error::artifact("/a.jar", "bad zip").category(),
            ErrorCategory::Artifact
        );
        assert_eq!(
            Error::InvalidVersion {
                version: "x".to_string(),
                message: "nope".to_string()
            }
            .category(),
            ErrorCategory::Version
        );
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(Error::io("/tmp", io_err).category(), ErrorCategory::Io);
    }

    #[test]
    fn test_non_configuration_errors_have_no_diagnostics() {
        assert!(Error::JavaNotFound.diagnostics().is_empty());
    }

    #[test]
    fn test_category_advice_not_empty() {
        for category in [
            ErrorCategory::Configuration,
            ErrorCategory::Artifact,
            ErrorCategory::Version,
            ErrorCategory::Environment,
            ErrorCategory::Io,
        ] {
            assert!(!category.advice().is_empty());
            assert!(!category.to_string().is_empty());
        }
    }
}
