//! Package metadata and the `control` file.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;

/// Maintainer scripts run by dpkg around install and removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleScripts {
    /// Runs before unpacking.
    pub preinst: Option<String>,
    /// Runs after unpacking.
    pub postinst: Option<String>,
    /// Runs before removal.
    pub prerm: Option<String>,
    /// Runs after removal or purge.
    pub postrm: Option<String>,
}

impl LifecycleScripts {
    /// Present scripts as `(control member name, body)`, in dpkg order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("preinst", &self.preinst),
            ("postinst", &self.postinst),
            ("prerm", &self.prerm),
            ("postrm", &self.postrm),
        ]
        .into_iter()
        .filter_map(|(name, body)| body.as_deref().map(|b| (name, b)))
    }
}

/// Everything written into the `control` member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// `Package`.
    pub name: String,
    /// `Version`, already in Debian form.
    pub version: String,
    /// `Architecture`.
    pub architecture: String,
    /// `Maintainer`.
    pub maintainer: String,
    /// Synopsis, the first line of `Description`.
    pub summary: String,
    /// Extended description, may span lines.
    pub description: Option<String>,
    /// `Section`.
    pub section: String,
    /// `Priority`.
    pub priority: String,
    /// `Homepage`.
    pub homepage: Option<String>,
    /// `Depends`, one relation per element.
    pub depends: Vec<String>,
    /// Maintainer scripts.
    pub scripts: LifecycleScripts,
}

impl PackageDescriptor {
    /// Descriptor with defaults for everything but name and version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            summary: name.clone(),
            name,
            version: version.into(),
            architecture: host_architecture().to_string(),
            maintainer: "root <root@localhost>".to_string(),
            description: None,
            section: "misc".to_string(),
            priority: "optional".to_string(),
            homepage: None,
            depends: Vec::new(),
            scripts: LifecycleScripts::default(),
        }
    }

    /// Check the fields dpkg is strict about.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_version(&self.version)?;
        for (field, value) in [
            ("Architecture", &self.architecture),
            ("Maintainer", &self.maintainer),
            ("Section", &self.section),
            ("Priority", &self.priority),
        ] {
            single_line(field, value)?;
            if value.trim().is_empty() {
                return Err(Error::InvalidField {
                    field: field.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        single_line("Description", &self.summary)?;
        if let Some(homepage) = &self.homepage {
            single_line("Homepage", homepage)?;
        }
        for dep in &self.depends {
            single_line("Depends", dep)?;
        }
        Ok(())
    }

    /// Render the `control` file.
    pub fn control(&self, installed_size_kib: u64) -> Result<String> {
        self.validate()?;

        let mut out = String::new();
        let _ = writeln!(out, "Package: {}", self.name);
        let _ = writeln!(out, "Version: {}", self.version);
        let _ = writeln!(out, "Architecture: {}", self.architecture);
        let _ = writeln!(out, "Maintainer: {}", self.maintainer);
        let _ = writeln!(out, "Installed-Size: {installed_size_kib}");
        if !self.depends.is_empty() {
            let _ = writeln!(out, "Depends: {}", self.depends.join(", "));
        }
        let _ = writeln!(out, "Section: {}", self.section);
        let _ = writeln!(out, "Priority: {}", self.priority);
        if let Some(homepage) = &self.homepage {
            let _ = writeln!(out, "Homepage: {homepage}");
        }
        let _ = writeln!(out, "Description: {}", self.summary.trim());
        if let Some(description) = &self.description {
            for line in description.trim().lines() {
                let line = line.trim_end();
                if line.is_empty() {
                    out.push_str(" .\n");
                } else {
                    let _ = writeln!(out, " {line}");
                }
            }
        }
        Ok(out)
    }
}

/// Debian architecture of the machine running the build.
#[must_use]
pub fn host_architecture() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "i386",
        "aarch64" => "arm64",
        "arm" => "armhf",
        "powerpc64" => "ppc64el",
        "riscv64" => "riscv64",
        "s390x" => "s390x",
        "loongarch64" => "loong64",
        _ => "all",
    }
}

/// Convert a Maven version to a Debian one.
///
/// `-SNAPSHOT` sorts after the release in Maven's eyes but before it in
/// dpkg's unless the hyphen becomes a tilde.
#[must_use]
pub fn debian_version(version: &str) -> String {
    match version.strip_suffix("-SNAPSHOT") {
        Some(base) => format!("{base}~SNAPSHOT"),
        None => version.to_string(),
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9+.\-]+$").expect("static pattern"))
}

fn upstream_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9][A-Za-z0-9.+~\-]*$").expect("static pattern"))
}

fn revision_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9+.~]+$").expect("static pattern"))
}

/// Check a package name: lowercase alphanumerics and `+ - .`, at least two
/// characters, starting with an alphanumeric.
pub fn validate_name(name: &str) -> Result<()> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidName {
            name: name.to_string(),
            reason: "use at least two characters from [a-z0-9+.-], starting with a letter or digit"
                .to_string(),
        })
    }
}

/// Check a version: `[epoch:]upstream[-revision]`.
pub fn validate_version(version: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidVersion {
        version: version.to_string(),
        reason: reason.to_string(),
    };

    let rest = match version.split_once(':') {
        Some((epoch, rest)) => {
            if epoch.is_empty() || !epoch.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid("epoch must be numeric"));
            }
            rest
        }
        None => version,
    };

    let upstream = match rest.rsplit_once('-') {
        Some((upstream, revision)) => {
            if !revision_pattern().is_match(revision) {
                return Err(invalid("revision may only contain [A-Za-z0-9+.~]"));
            }
            upstream
        }
        None => rest,
    };

    if upstream_pattern().is_match(upstream) {
        Ok(())
    } else {
        Err(invalid("upstream version must start with a digit and use [A-Za-z0-9.+~-]"))
    }
}

fn single_line(field: &str, value: &str) -> Result<()> {
    if value.contains('\n') {
        Err(Error::InvalidField {
            field: field.to_string(),
            reason: "must be a single line".to_string(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> PackageDescriptor {
        let mut d = PackageDescriptor::new("svc", "1.2.0");
        d.architecture = "all".to_string();
        d.maintainer = "Ops <ops@example.com>".to_string();
        d.summary = "Example service".to_string();
        d
    }

    #[test]
    fn test_control_field_order() {
        let mut d = descriptor();
        d.depends = vec!["openjdk-17-jre-headless | java17-runtime-headless".to_string()];
        d.homepage = Some("https://example.com".to_string());

        let control = d.control(1234).unwrap();
        let fields: Vec<&str> = control
            .lines()
            .filter_map(|l| l.split_once(':').map(|(k, _)| k))
            .collect();
        assert_eq!(
            fields,
            vec![
                "Package",
                "Version",
                "Architecture",
                "Maintainer",
                "Installed-Size",
                "Depends",
                "Section",
                "Priority",
                "Homepage",
                "Description"
            ]
        );
        assert!(control.contains("Installed-Size: 1234\n"));
        assert!(control.ends_with("Description: Example service\n"));
    }

    #[test]
    fn test_control_extended_description() {
        let mut d = descriptor();
        d.description = Some("First paragraph.\n\nSecond paragraph.".to_string());
        let control = d.control(1).unwrap();
        assert!(control.ends_with(
            "Description: Example service\n First paragraph.\n .\n Second paragraph.\n"
        ));
    }

    #[test]
    fn test_control_omits_empty_depends() {
        let control = descriptor().control(0).unwrap();
        assert!(!control.contains("Depends"));
    }

    #[test]
    fn test_debian_version() {
        assert_eq!(debian_version("1.4.0-SNAPSHOT"), "1.4.0~SNAPSHOT");
        assert_eq!(debian_version("1.4.0"), "1.4.0");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("svc").is_ok());
        assert!(validate_name("my-service2.0+x").is_ok());
        assert!(validate_name("s").is_err());
        assert!(validate_name("MyService").is_err());
        assert!(validate_name("-svc").is_err());
        assert!(validate_name("svc_api").is_err());
    }

    #[test]
    fn test_validate_version() {
        for ok in ["1.0", "1:2.3.4-1", "1.4.0~SNAPSHOT", "2.0.0-rc9", "0.6.2+git20240101"] {
            assert!(validate_version(ok).is_ok(), "{ok}");
        }
        for bad in ["", "v1.0", "a:1.0", "1.0-", "1.0_beta", "1.0-r_1"] {
            assert!(validate_version(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_multiline_fields_rejected() {
        let mut d = descriptor();
        d.summary = "two\nlines".to_string();
        assert!(matches!(d.control(0), Err(Error::InvalidField { .. })));
    }

    #[test]
    fn test_scripts_iter_skips_missing() {
        let scripts = LifecycleScripts {
            preinst: Some("#!/bin/sh\n".to_string()),
            postrm: Some("#!/bin/sh\n".to_string()),
            ..LifecycleScripts::default()
        };
        let names: Vec<&str> = scripts.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["preinst", "postrm"]);
    }
}
