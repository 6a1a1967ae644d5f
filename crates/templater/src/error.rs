//! Error types for template rendering.

use std::fmt;
use std::io;

/// Result type alias for templater operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of rendering errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The template text is wrong or refers to unknown values.
    Template,
    /// A parameter value could not be represented.
    Parameter,
    /// The template could not be read.
    Io,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Template => "Template error",
            Self::Parameter => "Invalid template parameter",
            Self::Io => "Template unreadable",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Template => "Check the template syntax and that every referenced value is configured",
            Self::Parameter => "Check the values in the configuration file",
            Self::Io => "Check that the template file exists and is readable",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while rendering a template.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The template source could not be parsed (malformed block delimiters,
    /// unclosed tags, unknown block kinds).
    #[error("template '{name}' is malformed: {message}")]
    Syntax {
        /// Template name, used for diagnostics only.
        name: String,
        /// Parser message including the full cause chain.
        message: String,
    },

    /// The template parsed but could not be rendered, usually because it
    /// references a variable that is not in the parameter tree.
    #[error("failed to render template '{name}': {message}")]
    Render {
        /// Template name.
        name: String,
        /// Renderer message including the full cause chain.
        message: String,
    },

    /// A value could not be converted into the parameter tree.
    #[error("invalid parameter '{key}': {message}")]
    Parameter {
        /// Top-level key being inserted.
        key: String,
        /// Serialization message.
        message: String,
    },

    /// Reading the template stream failed.
    #[error("failed to read template '{name}': {source}")]
    Io {
        /// Template name.
        name: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Create an IO error for the named template.
    pub fn io(name: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            name: name.into(),
            source,
        }
    }

    pub(crate) fn syntax(name: &str, err: &tera::Error) -> Self {
        Self::Syntax {
            name: name.to_string(),
            message: describe(err),
        }
    }

    pub(crate) fn render(name: &str, err: &tera::Error) -> Self {
        Self::Render {
            name: name.to_string(),
            message: describe(err),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Syntax { .. } | Self::Render { .. } => ErrorCategory::Template,
            Self::Parameter { .. } => ErrorCategory::Parameter,
            Self::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Name of the template this error refers to, if any.
    #[must_use]
    pub fn template_name(&self) -> Option<&str> {
        match self {
            Self::Syntax { name, .. } | Self::Render { name, .. } | Self::Io { name, .. } => {
                Some(name)
            }
            Self::Parameter { .. } => None,
        }
    }
}

/// Flatten a tera error and its sources into one line.
///
/// Tera keeps the useful part (which variable, which line) in the source
/// chain, the top-level message only says which template failed.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_constructor() {
        let err = Error::io("config.yml", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.template_name(), Some("config.yml"));
        assert_eq!(err.category(), ErrorCategory::Io);
        assert!(err.to_string().contains("config.yml"));
    }

    #[test]
    fn test_parameter_has_no_template_name() {
        let err = Error::Parameter {
            key: "unix".to_string(),
            message: "bad".to_string(),
        };
        assert_eq!(err.template_name(), None);
        assert!(err.to_string().contains("unix"));
    }
}
