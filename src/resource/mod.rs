//! Resources that end up in the package
//!
//! A [`Resource`] names where a file comes from, where it is installed, who
//! owns it and whether it is rendered as a template first. The extractor
//! turns a list of resources into a staging tree of [`StagedEntry`]s that
//! the package builder consumes.

pub mod embedded;
pub mod extractor;

pub use extractor::{extract_resources, normalize_destination};

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Where a resource's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    /// A file on disk
    File(PathBuf),
    /// A file bundled into the binary, by identifier
    Embedded(&'static str),
}

impl fmt::Display for ResourceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceSource::File(path) => write!(f, "{}", path.display()),
            ResourceSource::Embedded(name) => write!(f, "<embedded {name}>"),
        }
    }
}

/// A file to install, with its target location and ownership
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub source: ResourceSource,
    /// Absolute path on the target system
    pub destination: String,
    pub is_template: bool,
    pub owner: String,
    pub group: String,
    pub mode: u32,
}

impl Resource {
    /// A resource read from `source`.
    pub fn file(
        source: impl Into<PathBuf>,
        destination: impl Into<String>,
        is_template: bool,
        owner: &str,
        group: &str,
        mode: u32,
    ) -> Self {
        Self {
            source: ResourceSource::File(source.into()),
            destination: destination.into(),
            is_template,
            owner: owner.to_string(),
            group: group.to_string(),
            mode,
        }
    }

    /// A bundled template.
    pub fn embedded(
        name: &'static str,
        destination: impl Into<String>,
        owner: &str,
        group: &str,
        mode: u32,
    ) -> Self {
        Self {
            source: ResourceSource::Embedded(name),
            destination: destination.into(),
            is_template: true,
            owner: owner.to_string(),
            group: group.to_string(),
            mode,
        }
    }
}

/// A file written to the staging tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEntry {
    /// Location inside the staging directory
    pub path: PathBuf,
    pub destination: String,
    pub owner: String,
    pub group: String,
    pub mode: u32,
}

impl From<&StagedEntry> for debkit::PackageEntry {
    fn from(entry: &StagedEntry) -> Self {
        debkit::PackageEntry {
            source: entry.path.clone(),
            destination: entry.destination.clone(),
            owner: entry.owner.clone(),
            group: entry.group.clone(),
            mode: entry.mode,
        }
    }
}

/// Broad kind of extraction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorCategory {
    /// A source file is missing or unreadable
    Source,
    /// A template failed to render
    Template,
    /// The resource list itself is inconsistent
    Declaration,
    /// Writing the staging tree failed
    Io,
}

impl ExtractionErrorCategory {
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Source => "Check the paths in dwpackage.toml and that the project has been built",
            Self::Template => "Check the template syntax and that every referenced variable is set",
            Self::Declaration => "Give every resource its own absolute destination path",
            Self::Io => "Check permissions and free space in the build directory",
        }
    }
}

/// Errors from staging resources
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Resource source not found: {}", .path.display())]
    MissingSource { path: PathBuf },

    #[error("No embedded resource named '{name}'")]
    UnknownEmbedded { name: String },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Render(#[from] templater::Error),

    #[error("Two resources are installed to {destination}")]
    DuplicateDestination { destination: String },

    #[error("Destination '{destination}' is not an absolute path inside the package")]
    InvalidDestination { destination: String },
}

impl ExtractionError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> ExtractionErrorCategory {
        match self {
            Self::MissingSource { .. } | Self::UnknownEmbedded { .. } => {
                ExtractionErrorCategory::Source
            }
            Self::Render(_) => ExtractionErrorCategory::Template,
            Self::DuplicateDestination { .. } | Self::InvalidDestination { .. } => {
                ExtractionErrorCategory::Declaration
            }
            Self::Io { .. } => ExtractionErrorCategory::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
