//! Version adapters.
//!
//! Each adapter knows how one family of framework releases is driven: which
//! class proves the family is present in the artifact, how the `check`
//! command is invoked, and how its output is read. The [`AdapterRegistry`]
//! picks the adapter whose version range contains the detected version.

mod io_dropwizard;
mod yaml_factory;
mod yammer;

pub use io_dropwizard::IoDropwizardAdapter;
pub use yaml_factory::YamlFactoryAdapter;
pub use yammer::YammerAdapter;

use crate::artifact::ArtifactIndex;
use crate::error::{Error, Result};
use crate::isolation::IsolatedContext;
use crate::launcher::{Invocation, LaunchOutput};
use crate::version::VersionRange;
use semver::Version;
use std::fmt;
use std::path::Path;

/// The class the adapter will run, resolved from the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Fully qualified application class.
    pub main_class: String,
}

/// Drives configuration validation for one family of framework versions.
pub trait VersionAdapter: Send + Sync + fmt::Debug {
    /// Short family name used in logs and errors.
    fn family(&self) -> &'static str;

    /// Versions this adapter was written against.
    fn range(&self) -> VersionRange;

    /// Whether `version` belongs to this family.
    fn supports(&self, version: &Version) -> bool {
        self.range().contains(version)
    }

    /// A class only this family ships, used to confirm the artifact matches.
    fn marker_class(&self) -> &'static str;

    /// Find the entry point in the artifact.
    fn locate(&self, index: &ArtifactIndex) -> Result<EntryPoint> {
        if !index.contains(self.marker_class()) {
            return Err(Error::EntryPointNotFound {
                family: self.family().to_string(),
                entry: self.marker_class().to_string(),
                artifact: index.path().to_path_buf(),
            });
        }
        let main_class = index.main_class().ok_or_else(|| Error::EntryPointNotFound {
            family: self.family().to_string(),
            entry: "Main-Class".to_string(),
            artifact: index.path().to_path_buf(),
        })?;
        Ok(EntryPoint {
            main_class: main_class.to_string(),
        })
    }

    /// Build the invocation that checks the context's configuration.
    fn invocation(&self, entry: &EntryPoint, context: &IsolatedContext) -> Invocation {
        check_invocation(entry, context)
    }

    /// Turn the captured output into a verdict.
    fn interpret(&self, config: &Path, output: &LaunchOutput) -> Result<()>;
}

/// `<Main-Class> check <config>` run inside `context`.
pub fn check_invocation(entry: &EntryPoint, context: &IsolatedContext) -> Invocation {
    Invocation {
        classpath: vec![context.artifact().to_path_buf()],
        main_class: entry.main_class.clone(),
        args: vec![
            "check".to_string(),
            context.config().display().to_string(),
        ],
        system_properties: vec![("file.encoding".to_string(), "UTF-8".to_string())],
        working_dir: context.root().to_path_buf(),
        home_dir: context.home_dir(),
        temp_dir: context.temp_dir(),
    }
}

/// Build the rejection error for `config` from the runtime's output.
pub fn rejection(config: &Path, output: &LaunchOutput) -> Error {
    let (message, diagnostics) = parse_diagnostics(&output.combined());
    Error::ConfigurationInvalid {
        config: config.to_path_buf(),
        message,
        diagnostics,
    }
}

/// Split validation output into a headline and per-field problems.
///
/// The framework reports problems as `* field message` bullet lines under a
/// `<file> has an error:` heading.
pub fn parse_diagnostics(output: &str) -> (String, Vec<String>) {
    let diagnostics: Vec<String> = output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("* "))
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();

    let headline = output
        .lines()
        .map(str::trim)
        .find(|line| line.contains("has an error") || line.contains("has the following errors"))
        .or_else(|| output.lines().map(str::trim).find(|line| !line.is_empty()))
        .unwrap_or("validation failed without output")
        .trim_end_matches(':')
        .to_string();

    (headline, diagnostics)
}

/// How well the selected adapter matches the detected version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// The version is inside the adapter's range.
    Exact,
    /// No range contains the version; the nearest adapter was chosen.
    Nearest,
}

/// Result of [`AdapterRegistry::select`].
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    /// The chosen adapter.
    pub adapter: &'a dyn VersionAdapter,
    /// How it was chosen.
    pub fit: Fit,
}

/// Ordered collection of adapters.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn VersionAdapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the three built-in families, oldest first.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(YammerAdapter));
        registry.register(Box::new(IoDropwizardAdapter));
        registry.register(Box::new(YamlFactoryAdapter));
        registry
    }

    /// Add an adapter. Earlier registrations win on overlapping ranges.
    pub fn register(&mut self, adapter: Box<dyn VersionAdapter>) {
        self.adapters.push(adapter);
    }

    /// Registered adapters in registration order.
    pub fn adapters(&self) -> impl Iterator<Item = &dyn VersionAdapter> {
        self.adapters.iter().map(|a| &**a)
    }

    /// Pick the adapter for `version`.
    ///
    /// Versions newer than every range go to the adapter with the newest
    /// range, older ones to the oldest. `None` only for an empty registry.
    pub fn select(&self, version: &Version) -> Option<Selection<'_>> {
        if let Some(adapter) = self.adapters().find(|a| a.supports(version)) {
            return Some(Selection {
                adapter,
                fit: Fit::Exact,
            });
        }

        let newer = self
            .adapters()
            .filter(|a| a.range().ends_before(version))
            .max_by(|a, b| a.range().until.cmp(&b.range().until));
        let older = || {
            self.adapters()
                .filter(|a| a.range().starts_after(version))
                .min_by(|a, b| a.range().from.cmp(&b.range().from))
        };

        newer.or_else(older).map(|adapter| Selection {
            adapter,
            fit: Fit::Nearest,
        })
    }
}
