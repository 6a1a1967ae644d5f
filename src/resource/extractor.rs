//! Staging resources into a directory tree

use super::{ExtractionError, Resource, ResourceSource, Result, StagedEntry, embedded};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path};
use templater::{ParameterTree, Templater};

/// Writes resources below a staging directory, rendering templates on the way
pub struct ResourceExtractor<'a> {
    templater: &'a dyn Templater,
    parameters: &'a ParameterTree,
}

impl<'a> ResourceExtractor<'a> {
    pub fn new(templater: &'a dyn Templater, parameters: &'a ParameterTree) -> Self {
        Self {
            templater,
            parameters,
        }
    }

    /// Stage every resource at `output_dir/<destination>`.
    ///
    /// Existing files outside the written paths are left alone. The whole
    /// list is checked before anything is written.
    pub fn extract(&self, resources: &[Resource], output_dir: &Path) -> Result<Vec<StagedEntry>> {
        let mut destinations = Vec::with_capacity(resources.len());
        let mut seen = HashSet::new();
        for resource in resources {
            let destination = normalize_destination(&resource.destination)?;
            if !seen.insert(destination.clone()) {
                return Err(ExtractionError::DuplicateDestination { destination });
            }
            destinations.push(destination);
        }

        resources
            .iter()
            .zip(destinations)
            .map(|(resource, destination)| self.extract_one(resource, destination, output_dir))
            .collect()
    }

    fn extract_one(
        &self,
        resource: &Resource,
        destination: String,
        output_dir: &Path,
    ) -> Result<StagedEntry> {
        let target = output_dir.join(destination.trim_start_matches('/'));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| ExtractionError::io(parent, e))?;
        }

        if resource.is_template {
            let mut input = open(&resource.source)?;
            let name = resource.source.to_string();
            let rendered = self
                .templater
                .render(input.as_mut(), &name, self.parameters)?;
            fs::write(&target, rendered).map_err(|e| ExtractionError::io(&target, e))?;
        } else {
            let mut input = open(&resource.source)?;
            let mut output = File::create(&target).map_err(|e| ExtractionError::io(&target, e))?;
            std::io::copy(&mut input, &mut output).map_err(|e| ExtractionError::io(&target, e))?;
        }

        set_mode(&target, resource.mode)?;
        log::debug!(
            "Staged {} -> {} ({}:{} {:o})",
            resource.source,
            destination,
            resource.owner,
            resource.group,
            resource.mode
        );

        Ok(StagedEntry {
            path: target,
            destination,
            owner: resource.owner.clone(),
            group: resource.group.clone(),
            mode: resource.mode,
        })
    }
}

/// Stage `resources` into `output_dir` with `templater`.
pub fn extract_resources(
    templater: &dyn Templater,
    parameters: &ParameterTree,
    resources: &[Resource],
    output_dir: &Path,
) -> Result<Vec<StagedEntry>> {
    ResourceExtractor::new(templater, parameters).extract(resources, output_dir)
}

fn open(source: &ResourceSource) -> Result<Box<dyn Read>> {
    match source {
        ResourceSource::File(path) => {
            if !path.is_file() {
                return Err(ExtractionError::MissingSource { path: path.clone() });
            }
            let file = File::open(path).map_err(|e| ExtractionError::io(path, e))?;
            Ok(Box::new(file))
        }
        ResourceSource::Embedded(name) => embedded::get(name)
            .map(|content| Box::new(content.as_bytes()) as Box<dyn Read>)
            .ok_or_else(|| ExtractionError::UnknownEmbedded {
                name: (*name).to_string(),
            }),
    }
}

/// Canonical form of an absolute install path.
///
/// Empty and `.` components are dropped, so `/etc//a` and `/etc/./a` are
/// both `/etc/a`. Relative paths, `..` and the root itself are rejected.
pub fn normalize_destination(destination: &str) -> Result<String> {
    let invalid = || ExtractionError::InvalidDestination {
        destination: destination.to_string(),
    };

    let path = Path::new(destination);
    if !path.is_absolute() {
        return Err(invalid());
    }

    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(invalid)?),
            Component::ParentDir | Component::Prefix(_) => return Err(invalid()),
        }
    }

    if parts.is_empty() {
        return Err(invalid());
    }
    Ok(format!("/{}", parts.join("/")))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|e| ExtractionError::io(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
