//! Build configuration (`dwpackage.toml`).
//!
//! The file describes the project being packaged and how: which template
//! becomes the service configuration, where files go on the target system,
//! who owns them. Every section except `[project]` is optional; unset values
//! are derived from the project name when the file is loaded, so the rest of
//! the program only ever sees a complete configuration.
//!
//! ```toml
//! config_template = "src/main/resources/config.yml"
//!
//! [project]
//! name = "svc"
//! version = "1.4.0-SNAPSHOT"
//!
//! [[project.dependencies]]
//! group_id = "io.dropwizard"
//! artifact_id = "dropwizard-core"
//! version = "2.1.12"
//!
//! [unix]
//! user = "svcuser"
//!
//! [dropwizard]
//! http_port = 8080
//! ```

use crate::paths;
use anyhow::{Context, Result};
use appcheck::Dependency;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the staging directory inside the build directory.
pub const WORKING_DIRECTORY_NAME: &str = "dropwizard-deb-package";

/// Complete packaging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingConfig {
    /// Template rendered into [`PathConfig::config_file`].
    pub config_template: PathBuf,

    /// Application jar; defaults to `<build_dir>/<name>-<version>.jar`.
    #[serde(default)]
    pub artifact_file: Option<PathBuf>,

    /// Package file; defaults to `<build_dir>/<name>-<version>.deb`.
    #[serde(default)]
    pub output_file: Option<PathBuf>,

    /// Validate the rendered configuration before packaging.
    #[serde(default = "default_true")]
    pub validate: bool,

    /// The project being packaged.
    pub project: ProjectInfo,

    #[serde(default)]
    pub deb: DebConfig,

    #[serde(default)]
    pub jvm: JvmConfig,

    #[serde(default)]
    pub unix: UnixConfig,

    #[serde(default)]
    pub path: PathConfig,

    /// Free-form values for the configuration template, available as both
    /// `dw` and `dropwizard`.
    #[serde(default)]
    pub dropwizard: toml::Table,

    #[serde(default)]
    pub signing: SigningConfig,
}

/// Build metadata of the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Artifact id; also the default package, user and file name.
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    /// Where build outputs live, relative to the configuration file.
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
    /// Declared dependencies, used to detect the framework version.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

/// Service supervisor the package registers with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Supervisor {
    #[default]
    Upstart,
    Systemd,
}

/// `[deb]`: package metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebConfig {
    pub name: String,
    pub version: String,
    pub architecture: String,
    pub maintainer: String,
    pub summary: String,
    pub description: String,
    pub section: String,
    pub priority: String,
    pub homepage: String,
    pub depends: Option<Vec<String>>,
    pub supervisor: Supervisor,
}

/// `[jvm]`: how the service JVM is started.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JvmConfig {
    /// Heap size, used for both `-Xms` and `-Xmx`.
    pub memory: String,
    /// Pass `-server`.
    pub server: bool,
    /// Extra JVM options.
    pub options: Vec<String>,
    /// Java binary on the target system.
    pub java: String,
}

impl Default for JvmConfig {
    fn default() -> Self {
        Self {
            memory: "128m".to_string(),
            server: true,
            options: Vec::new(),
            java: "/usr/bin/java".to_string(),
        }
    }
}

/// `[unix]`: service account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnixConfig {
    pub user: String,
    pub group: String,
}

/// `[path]`: locations on the target system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub jar_file: String,
    pub config_file: String,
    pub upstart_file: String,
    pub systemd_file: String,
    pub jvm_config_file: String,
    pub log_directory: String,
}

/// `[signing]`: optional package signing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Base64 Ed25519 secret key; unset means unsigned packages.
    pub key_file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("target")
}

impl PackagingConfig {
    /// Load, resolve paths against the file's directory, and fill defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        config.resolve(base)
    }

    /// Make paths absolute against `base` and derive unset values.
    pub fn resolve(mut self, base: &Path) -> Result<Self> {
        if self.project.name.trim().is_empty() {
            anyhow::bail!("[project] name must not be empty");
        }
        if self.project.version.trim().is_empty() {
            anyhow::bail!("[project] version must not be empty");
        }

        let name = self.project.name.clone();
        let version = self.project.version.clone();

        self.project.build_dir = paths::resolve(base, &self.project.build_dir);
        self.config_template = paths::resolve(base, &self.config_template);
        let build_dir = self.project.build_dir.clone();
        self.artifact_file = Some(match self.artifact_file.take() {
            Some(file) => paths::resolve(base, &file),
            None => build_dir.join(format!("{name}-{version}.jar")),
        });
        self.output_file = Some(match self.output_file.take() {
            Some(file) => paths::resolve(base, &file),
            None => build_dir.join(format!("{name}-{version}.deb")),
        });
        self.signing.key_file = self
            .signing
            .key_file
            .take()
            .map(|file| paths::resolve(base, &file));

        let deb = &mut self.deb;
        fill(&mut deb.name, || name.clone());
        fill(&mut deb.version, || debkit::debian_version(&version));
        fill(&mut deb.architecture, || debkit::host_architecture().to_string());
        fill(&mut deb.maintainer, || "root <root@localhost>".to_string());
        let summary = if self.project.description.trim().is_empty() {
            name.clone()
        } else {
            self.project.description.trim().to_string()
        };
        fill(&mut deb.summary, || summary);
        fill(&mut deb.section, || "java".to_string());
        fill(&mut deb.priority, || "optional".to_string());
        fill(&mut deb.homepage, || self.project.url.clone());
        if deb.depends.is_none() {
            deb.depends = Some(vec![
                "adduser".to_string(),
                "default-jre-headless | java8-runtime-headless".to_string(),
            ]);
        }

        let unix = &mut self.unix;
        fill(&mut unix.user, || name.clone());
        let user = unix.user.clone();
        fill(&mut unix.group, || user);

        let path = &mut self.path;
        fill(&mut path.jar_file, || format!("/usr/share/java/{name}.jar"));
        fill(&mut path.config_file, || format!("/etc/{name}.yml"));
        fill(&mut path.upstart_file, || format!("/etc/init/{name}.conf"));
        fill(&mut path.systemd_file, || {
            format!("/lib/systemd/system/{name}.service")
        });
        fill(&mut path.jvm_config_file, || format!("/etc/{name}/jvm.conf"));
        fill(&mut path.log_directory, || format!("/var/log/{name}"));

        Ok(self)
    }

    /// Application jar after [`resolve`](Self::resolve).
    pub fn artifact_file(&self) -> &Path {
        self.artifact_file.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Package file after [`resolve`](Self::resolve).
    pub fn output_file(&self) -> &Path {
        self.output_file.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Staging directory for this build.
    pub fn working_dir(&self) -> PathBuf {
        self.project.build_dir.join(WORKING_DIRECTORY_NAME)
    }

    /// Declared framework version, if the project depends on the framework.
    pub fn framework_version(&self) -> Option<&str> {
        appcheck::framework_version(&self.project.dependencies)
    }
}

fn fill(value: &mut String, default: impl FnOnce() -> String) {
    if value.trim().is_empty() {
        *value = default();
    }
}
