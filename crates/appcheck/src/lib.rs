//! # appcheck
//!
//! Validates a rendered Dropwizard configuration against the application
//! artifact it will ship with, before anything is packaged.
//!
//! The framework changed its configuration API several times, so the check
//! is driven by a [`VersionAdapter`] chosen from the declared framework
//! version. The adapter runs the application's own `check` command in a
//! separate JVM inside an [`IsolatedContext`], which is discarded afterwards.
//!
//! ```no_run
//! use appcheck::{ApplicationValidator, Outcome};
//! use std::path::Path;
//!
//! let validator = ApplicationValidator::new("target/service-1.0.jar");
//! let report = validator.validate(Some("2.1.4"), Path::new("staging/etc/service.yml"))?;
//! if let Outcome::Valid { family, .. } = &report.outcome {
//!     println!("validated with the {family} adapter");
//! }
//! # Ok::<(), appcheck::Error>(())
//! ```

#![warn(missing_docs)]

pub mod adapters;
pub mod artifact;
pub mod error;
pub mod isolation;
pub mod launcher;
pub mod version;

pub use adapters::{AdapterRegistry, EntryPoint, Fit, Selection, VersionAdapter};
pub use artifact::ArtifactIndex;
pub use error::{Error, ErrorCategory, Result};
pub use isolation::IsolatedContext;
pub use launcher::{Invocation, JvmLauncher, LaunchOutput, Launcher, MockLauncher};
pub use version::{MAX_SUPPORTED_SERIES, VersionRange, can_support_version};

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Coordinates of the framework core artifact, current and legacy.
pub const FRAMEWORK_COORDINATES: &[(&str, &str)] = &[
    ("io.dropwizard", "dropwizard-core"),
    ("com.yammer.dropwizard", "dropwizard-core"),
];

/// A declared dependency of the project being packaged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Maven group id.
    pub group_id: String,
    /// Maven artifact id.
    pub artifact_id: String,
    /// Declared version, if pinned.
    #[serde(default)]
    pub version: Option<String>,
}

/// Find the framework core among `dependencies`.
pub fn find_framework_dependency(dependencies: &[Dependency]) -> Option<&Dependency> {
    dependencies.iter().find(|d| {
        FRAMEWORK_COORDINATES
            .iter()
            .any(|(group, artifact)| d.group_id == *group && d.artifact_id == *artifact)
    })
}

/// Declared version of the framework core, if any.
pub fn framework_version(dependencies: &[Dependency]) -> Option<&str> {
    find_framework_dependency(dependencies).and_then(|d| d.version.as_deref())
}

/// Non-fatal findings of a validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// No framework dependency was declared; validation was skipped.
    MissingDependency,
    /// The declared version has no leading number; validation was skipped.
    UnreadableVersion {
        /// Version as declared.
        declared: String,
    },
    /// The version is newer than any adapter was written for.
    UnsupportedVersion {
        /// Detected version.
        detected: Version,
        /// Newest supported series, e.g. `4.0.x`.
        max: String,
    },
    /// The version predates every adapter.
    BelowSupportedRange {
        /// Detected version.
        detected: Version,
        /// Range of the adapter used instead.
        oldest: VersionRange,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingDependency => write!(
                f,
                "no dropwizard-core dependency declared, skipping configuration validation"
            ),
            Warning::UnreadableVersion { declared } => write!(
                f,
                "cannot read Dropwizard version '{declared}', skipping configuration validation"
            ),
            Warning::UnsupportedVersion { detected, max } => write!(
                f,
                "Dropwizard {detected} is newer than the newest supported version {max}; validation may be inaccurate"
            ),
            Warning::BelowSupportedRange { detected, oldest } => write!(
                f,
                "Dropwizard {detected} is older than the oldest supported range {oldest}; validation may be inaccurate"
            ),
        }
    }
}

/// What a validation run concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The runtime accepted the configuration.
    Valid {
        /// Detected framework version.
        version: Version,
        /// Family of the adapter that ran the check.
        family: &'static str,
    },
    /// Validation did not run.
    Skipped {
        /// Why.
        reason: String,
    },
}

/// Result of [`ApplicationValidator::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Verdict.
    pub outcome: Outcome,
    /// Warnings raised on the way, in order.
    pub warnings: Vec<Warning>,
}

impl ValidationReport {
    /// Whether the check was skipped.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped { .. })
    }
}

/// Validates configurations for one application artifact.
pub struct ApplicationValidator {
    artifact: PathBuf,
    launcher: Box<dyn Launcher>,
    registry: AdapterRegistry,
    workspace_root: Option<PathBuf>,
}

impl ApplicationValidator {
    /// Validator for `artifact` using a real JVM and the built-in adapters.
    pub fn new(artifact: impl Into<PathBuf>) -> Self {
        Self {
            artifact: artifact.into(),
            launcher: Box::new(JvmLauncher::new()),
            registry: AdapterRegistry::builtin(),
            workspace_root: None,
        }
    }

    /// Use a different launcher.
    pub fn with_launcher(mut self, launcher: Box<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Use a different adapter registry.
    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Create validation workspaces under `root` instead of the system temp dir.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// The artifact being validated against.
    #[must_use]
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Check `config` with the framework version the project declares.
    ///
    /// A missing or unreadable version skips validation. A version newer
    /// than the supported range produces one [`Warning::UnsupportedVersion`]
    /// and the check still runs with the nearest adapter.
    ///
    /// Warnings are returned in the report and only traced at debug level;
    /// showing them is up to the caller.
    pub fn validate(&self, declared_version: Option<&str>, config: &Path) -> Result<ValidationReport> {
        let Some(raw) = declared_version else {
            return Ok(skipped(Warning::MissingDependency));
        };

        let version = match version::parse(raw) {
            Ok(version) => version,
            Err(err) => {
                log::debug!("{err}");
                return Ok(skipped(Warning::UnreadableVersion {
                    declared: raw.trim().to_string(),
                }));
            }
        };
        log::info!("Detected Dropwizard {version}, validating {}", config.display());

        let mut warnings = Vec::new();
        if !can_support_version(&version) {
            let warning = Warning::UnsupportedVersion {
                detected: version.clone(),
                max: version::max_supported_display(),
            };
            log::debug!("{warning}");
            warnings.push(warning);
        }

        let selection = self
            .registry
            .select(&version)
            .ok_or_else(|| Error::NoAdapter {
                version: version.to_string(),
            })?;
        let adapter = selection.adapter;
        if selection.fit == Fit::Nearest && adapter.range().starts_after(&version) {
            let warning = Warning::BelowSupportedRange {
                detected: version.clone(),
                oldest: adapter.range(),
            };
            log::debug!("{warning}");
            warnings.push(warning);
        }
        log::debug!("Using {} adapter for {version}", adapter.family());

        let index = ArtifactIndex::open(&self.artifact)?;
        let entry = adapter.locate(&index)?;

        let context = IsolatedContext::open(self.workspace_root.as_deref(), &self.artifact, config)?;
        let verdict = self.check(adapter, &entry, &context, config);
        let closed = context.close();
        verdict?;
        closed?;

        Ok(ValidationReport {
            outcome: Outcome::Valid {
                version,
                family: adapter.family(),
            },
            warnings,
        })
    }

    fn check(
        &self,
        adapter: &dyn VersionAdapter,
        entry: &EntryPoint,
        context: &IsolatedContext,
        config: &Path,
    ) -> Result<()> {
        let invocation = adapter.invocation(entry, context);
        let output = self.launcher.launch(&invocation)?;
        adapter.interpret(config, &output)
    }
}

fn skipped(warning: Warning) -> ValidationReport {
    log::debug!("{warning}");
    ValidationReport {
        outcome: Outcome::Skipped {
            reason: warning.to_string(),
        },
        warnings: vec![warning],
    }
}
