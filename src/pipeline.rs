//! The packaging pipeline: extract, validate, package
//!
//! Each step is a method on [`Pipeline`] so commands can run any prefix of
//! it. Steps run one after another on the calling thread; the first failure
//! aborts the build.

use crate::config::{PackagingConfig, Supervisor};
use crate::params;
use crate::resource::{self, Resource, StagedEntry, embedded};
use crate::scripts;
use anyhow::{Context, Result};
use appcheck::{ApplicationValidator, Launcher, ValidationReport};
use debkit::{PackageBuilder, PackageDescriptor, PackageEntry, PackageSigner};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use templater::{ParameterTree, TeraTemplater};
use walkdir::WalkDir;

/// Subdirectory of the working directory holding the package file tree
const STAGING_DIR: &str = "files";

/// One build of one configuration
pub struct Pipeline {
    config: PackagingConfig,
    parameters: ParameterTree,
    templater: TeraTemplater,
    launcher: Option<Arc<dyn Launcher>>,
}

impl Pipeline {
    pub fn new(config: PackagingConfig) -> Result<Self> {
        let parameters =
            params::parameters(&config).context("Failed to build template parameters")?;
        Ok(Self {
            config,
            parameters,
            templater: TeraTemplater::new(),
            launcher: None,
        })
    }

    /// Run validation through `launcher` instead of a local JVM.
    #[cfg(test)]
    pub fn with_launcher(mut self, launcher: Box<dyn Launcher>) -> Self {
        self.launcher = Some(Arc::from(launcher));
        self
    }

    pub fn config(&self) -> &PackagingConfig {
        &self.config
    }

    pub fn parameters(&self) -> &ParameterTree {
        &self.parameters
    }

    /// Directory the package file tree is staged in.
    pub fn staging_dir(&self) -> PathBuf {
        self.config.working_dir().join(STAGING_DIR)
    }

    /// Everything the package installs.
    pub fn resources(&self) -> Vec<Resource> {
        let config = &self.config;
        let user = config.unix.user.as_str();
        let group = config.unix.group.as_str();

        let service = match config.deb.supervisor {
            Supervisor::Upstart => {
                Resource::embedded(embedded::UPSTART, &config.path.upstart_file, "root", "root", 0o644)
            }
            Supervisor::Systemd => Resource::embedded(
                embedded::SYSTEMD,
                &config.path.systemd_file,
                "root",
                "root",
                0o644,
            ),
        };

        vec![
            Resource::file(
                &config.config_template,
                &config.path.config_file,
                true,
                user,
                group,
                0o600,
            ),
            service,
            Resource::embedded(
                embedded::JVM_CONFIG,
                &config.path.jvm_config_file,
                "root",
                "root",
                0o644,
            ),
            Resource::file(
                config.artifact_file(),
                &config.path.jar_file,
                false,
                user,
                group,
                0o644,
            ),
        ]
    }

    /// Stage every resource into a freshly cleared staging directory.
    pub fn extract(&self) -> Result<Vec<StagedEntry>> {
        let staging = self.staging_dir();
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .with_context(|| format!("Could not clear {}", staging.display()))?;
        }
        fs::create_dir_all(&staging)
            .with_context(|| format!("Could not create {}", staging.display()))?;

        let staged = resource::extract_resources(
            &self.templater,
            &self.parameters,
            &self.resources(),
            &staging,
        )?;
        log::info!("Staged {} files in {}", staged.len(), staging.display());
        Ok(staged)
    }

    /// Check the staged configuration against the application artifact.
    pub fn validate(&self, staged: &[StagedEntry]) -> Result<ValidationReport> {
        let config_file = resource::normalize_destination(&self.config.path.config_file)?;
        let rendered = staged
            .iter()
            .find(|entry| entry.destination == config_file)
            .map(|entry| entry.path.as_path())
            .context("The rendered configuration was not staged")?;

        let mut validator = ApplicationValidator::new(self.config.artifact_file());
        if let Some(launcher) = &self.launcher {
            validator = validator.with_launcher(Box::new(SharedLauncher(Arc::clone(launcher))));
        }

        let report = validator.validate(self.config.framework_version(), rendered)?;
        Ok(report)
    }

    /// Write the `.deb` for `staged` to the configured output file.
    pub fn create_package(&self, staged: &[StagedEntry]) -> Result<PathBuf> {
        let descriptor = self.descriptor()?;
        let signer = match &self.config.signing.key_file {
            Some(path) => Some(PackageSigner::from_file(path)?),
            None => None,
        };
        let entries: Vec<PackageEntry> = staged.iter().map(PackageEntry::from).collect();

        let output = PackageBuilder::new(descriptor)
            .with_signer(signer)
            .build(&entries, self.config.output_file())?;
        Ok(output)
    }

    /// Package metadata, with rendered maintainer scripts.
    pub fn descriptor(&self) -> Result<PackageDescriptor> {
        let deb = &self.config.deb;
        let mut descriptor = PackageDescriptor::new(&deb.name, &deb.version);
        descriptor.architecture = deb.architecture.clone();
        descriptor.maintainer = deb.maintainer.clone();
        descriptor.summary = deb.summary.clone();
        descriptor.description = non_empty(&deb.description);
        descriptor.section = deb.section.clone();
        descriptor.priority = deb.priority.clone();
        descriptor.homepage = non_empty(&deb.homepage);
        descriptor.depends = deb.depends.clone().unwrap_or_default();
        descriptor.scripts = scripts::lifecycle_scripts(&self.templater, &self.parameters)?;
        Ok(descriptor)
    }

    /// Extract, optionally validate, then package.
    pub fn run(&self, validate: bool) -> Result<BuildResult> {
        let staged = self.extract().context("Failed to extract resources")?;

        let report = if validate {
            Some(
                self.validate(&staged)
                    .context("Failed to validate configuration")?,
            )
        } else {
            log::info!("Configuration validation disabled");
            None
        };

        let package = self
            .create_package(&staged)
            .context("Failed to create Debian package")?;

        Ok(BuildResult {
            package,
            staged,
            report,
        })
    }
}

/// What a completed build produced
#[derive(Debug)]
pub struct BuildResult {
    pub package: PathBuf,
    pub staged: Vec<StagedEntry>,
    /// `None` when validation was disabled
    pub report: Option<ValidationReport>,
}

/// Hands the pipeline's launcher to a validator.
struct SharedLauncher(Arc<dyn Launcher>);

impl Launcher for SharedLauncher {
    fn launch(&self, invocation: &appcheck::Invocation) -> appcheck::Result<appcheck::LaunchOutput> {
        self.0.launch(invocation)
    }
}

/// Number of files and total bytes below `dir`.
pub fn tree_size(dir: &Path) -> (usize, u64) {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .fold((0, 0), |(files, bytes), meta| (files + 1, bytes + meta.len()))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
