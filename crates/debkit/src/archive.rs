//! The `control.tar.gz` and `data.tar.gz` members.
//!
//! Both tarballs are built in memory: they are small next to the payload jar
//! and their bytes are needed again for signing.

use crate::descriptor::LifecycleScripts;
use crate::error::{Error, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Mode of every directory the archive creates.
pub const DIRECTORY_MODE: u32 = 0o755;

/// A payload file and where it goes inside the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    /// File on the build host.
    pub source: PathBuf,
    /// Absolute path on the target system, e.g. `/etc/svc/config.yml`.
    pub destination: String,
    /// Owning user name.
    pub owner: String,
    /// Owning group name.
    pub group: String,
    /// Permission bits; file type bits are ignored.
    pub mode: u32,
}

impl PackageEntry {
    /// Files under `/etc` are tracked by dpkg as configuration.
    #[must_use]
    pub fn is_conffile(&self) -> bool {
        self.destination.starts_with("/etc/")
    }
}

/// The data member plus what the control member needs to know about it.
#[derive(Debug, Clone)]
pub struct DataMember {
    /// Compressed tarball.
    pub bytes: Vec<u8>,
    /// `Installed-Size` in KiB.
    pub installed_size_kib: u64,
    /// Destinations to list in `conffiles`.
    pub conffiles: Vec<String>,
}

/// Build `data.tar.gz` from `entries`.
///
/// Parent directories are added as `root:root 0755`; file entries carry the
/// owner, group and mode of their entry.
pub fn data_tarball(entries: &[PackageEntry], mtime: u64) -> Result<DataMember> {
    let mut seen = BTreeSet::new();
    let mut directories = BTreeSet::new();
    for entry in entries {
        let relative = relative_destination(&entry.destination)?;
        if !seen.insert(relative.clone()) {
            return Err(Error::DuplicatePath {
                path: entry.destination.clone(),
            });
        }
        let mut parent = relative.parent();
        while let Some(dir) = parent.filter(|d| !d.as_os_str().is_empty()) {
            directories.insert(dir.to_path_buf());
            parent = dir.parent();
        }
    }

    let mut tar = tar::Builder::new(gzip(mtime));
    let mut installed_kib = 0u64;

    append_directory(&mut tar, Path::new("."), mtime)?;
    for dir in &directories {
        append_directory(&mut tar, dir, mtime)?;
        installed_kib += 1;
    }

    let mut ordered: Vec<&PackageEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| a.destination.cmp(&b.destination));
    for entry in ordered {
        let file = File::open(&entry.source).map_err(|e| Error::io(&entry.source, e))?;
        let size = file
            .metadata()
            .map_err(|e| Error::io(&entry.source, e))?
            .len();

        let mut header = file_header(size, entry.mode, mtime);
        header
            .set_username(&entry.owner)
            .map_err(|e| invalid_owner("owner", &entry.owner, &e))?;
        header
            .set_groupname(&entry.group)
            .map_err(|e| invalid_owner("group", &entry.group, &e))?;

        let path = relative_destination(&entry.destination)?;
        tar.append_data(&mut header, &path, file)
            .map_err(|e| Error::io(&entry.source, e))?;
        installed_kib += size.div_ceil(1024);
        log::debug!(
            "data: {} {}:{} {:o} ({size} bytes)",
            entry.destination,
            entry.owner,
            entry.group,
            entry.mode & 0o7777
        );
    }

    let conffiles = entries
        .iter()
        .filter(|e| e.is_conffile())
        .map(|e| e.destination.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    Ok(DataMember {
        bytes: finish(tar)?,
        installed_size_kib: installed_kib,
        conffiles,
    })
}

/// Build `control.tar.gz` from the control text, conffile list and scripts.
pub fn control_tarball(
    control: &str,
    conffiles: &[String],
    scripts: &LifecycleScripts,
    mtime: u64,
) -> Result<Vec<u8>> {
    let mut tar = tar::Builder::new(gzip(mtime));
    append_directory(&mut tar, Path::new("."), mtime)?;
    append_bytes(&mut tar, "control", control.as_bytes(), 0o644, mtime)?;
    if !conffiles.is_empty() {
        let mut text = conffiles.join("\n");
        text.push('\n');
        append_bytes(&mut tar, "conffiles", text.as_bytes(), 0o644, mtime)?;
    }
    for (name, body) in scripts.iter() {
        append_bytes(&mut tar, name, body.as_bytes(), 0o755, mtime)?;
    }
    finish(tar)
}

/// Destination as a relative path, rejecting anything that is not a plain
/// absolute path.
fn relative_destination(destination: &str) -> Result<PathBuf> {
    let invalid = |reason: &str| Error::InvalidPath {
        path: destination.to_string(),
        reason: reason.to_string(),
    };

    let path = Path::new(destination);
    if !path.is_absolute() {
        return Err(invalid("must be absolute"));
    }
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::RootDir => {}
            Component::Normal(part) => relative.push(part),
            _ => return Err(invalid("must not contain '.' or '..'")),
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(invalid("must name a file"));
    }
    Ok(relative)
}

fn gzip(mtime: u64) -> GzEncoder<Vec<u8>> {
    flate2::GzBuilder::new()
        .mtime(u32::try_from(mtime).unwrap_or(u32::MAX))
        .write(Vec::new(), Compression::default())
}

fn finish(tar: tar::Builder<GzEncoder<Vec<u8>>>) -> Result<Vec<u8>> {
    let encoder = tar
        .into_inner()
        .map_err(|e| Error::io("<archive>", e))?;
    encoder.finish().map_err(|e| Error::io("<archive>", e))
}

fn file_header(size: u64, mode: u32, mtime: u64) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(size);
    header.set_mode(mode & 0o7777);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(mtime);
    header
}

fn append_directory<W: Write>(tar: &mut tar::Builder<W>, path: &Path, mtime: u64) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Directory);
    header.set_size(0);
    header.set_mode(DIRECTORY_MODE);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(mtime);
    set_root_owner(&mut header)?;
    tar.append_data(&mut header, path, std::io::empty())
        .map_err(|e| Error::io(path, e))
}

fn append_bytes<W: Write>(
    tar: &mut tar::Builder<W>,
    path: &str,
    data: &[u8],
    mode: u32,
    mtime: u64,
) -> Result<()> {
    let mut header = file_header(data.len() as u64, mode, mtime);
    set_root_owner(&mut header)?;
    tar.append_data(&mut header, path, data)
        .map_err(|e| Error::io(path, e))
}

fn set_root_owner(header: &mut tar::Header) -> Result<()> {
    header
        .set_username("root")
        .map_err(|e| Error::io("<archive>", e))?;
    header
        .set_groupname("root")
        .map_err(|e| Error::io("<archive>", e))
}

fn invalid_owner(field: &str, value: &str, err: &std::io::Error) -> Error {
    Error::InvalidField {
        field: field.to_string(),
        reason: format!("'{value}': {err}"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    /// Entry name without any `./` prefix or trailing slash; `.` for the root.
    fn normalize(raw: &str) -> String {
        let trimmed = raw.trim_start_matches("./").trim_end_matches('/');
        if trimmed.is_empty() {
            ".".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// `(path, mode, username, groupname, contents)` of every tar entry.
    pub(crate) fn list(bytes: &[u8]) -> Vec<(String, u32, String, String, Vec<u8>)> {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let header = entry.header().clone();
                let mut data = Vec::new();
                entry.read_to_end(&mut data).unwrap();
                (
                    normalize(&entry.path().unwrap().to_string_lossy()),
                    header.mode().unwrap(),
                    header.username().unwrap().unwrap_or_default().to_string(),
                    header.groupname().unwrap().unwrap_or_default().to_string(),
                    data,
                )
            })
            .collect()
    }

    fn entry(dir: &Path, name: &str, contents: &[u8], destination: &str, mode: u32) -> PackageEntry {
        let source = dir.join(name);
        std::fs::write(&source, contents).unwrap();
        PackageEntry {
            source,
            destination: destination.to_string(),
            owner: "svcuser".to_string(),
            group: "svcuser".to_string(),
            mode,
        }
    }

    #[test]
    fn test_data_entries_carry_ownership() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![
            entry(dir.path(), "config.yml", b"user: svcuser\n", "/etc/svc/config.yml", 0o100600),
            entry(dir.path(), "svc.jar", b"PK", "/usr/share/java/svc.jar", 0o644),
        ];

        let data = data_tarball(&entries, 1_700_000_000).unwrap();
        let listed = list(&data.bytes);

        let config = listed
            .iter()
            .find(|(path, ..)| path == "etc/svc/config.yml")
            .unwrap();
        assert_eq!(config.1, 0o600);
        assert_eq!((config.2.as_str(), config.3.as_str()), ("svcuser", "svcuser"));
        assert_eq!(config.4, b"user: svcuser\n");

        let etc = listed.iter().find(|(path, ..)| path == "etc").unwrap();
        assert_eq!(etc.1, DIRECTORY_MODE);
        assert_eq!((etc.2.as_str(), etc.3.as_str()), ("root", "root"));

        assert_eq!(data.conffiles, vec!["/etc/svc/config.yml"]);
    }

    #[test]
    fn test_directories_precede_files() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![entry(dir.path(), "a", b"a", "/opt/svc/bin/a", 0o755)];
        let data = data_tarball(&entries, 0).unwrap();
        let paths: Vec<String> = list(&data.bytes).into_iter().map(|e| e.0).collect();
        assert_eq!(
            paths,
            vec![".", "opt", "opt/svc", "opt/svc/bin", "opt/svc/bin/a"]
        );
    }

    #[test]
    fn test_installed_size_rounds_up() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![
            entry(dir.path(), "a", &[0u8; 1025], "/a", 0o644),
            entry(dir.path(), "b", b"b", "/b", 0o644),
        ];
        let data = data_tarball(&entries, 0).unwrap();
        assert_eq!(data.installed_size_kib, 3);
    }

    #[test]
    fn test_duplicate_destination_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![
            entry(dir.path(), "a", b"a", "/etc/svc.yml", 0o644),
            entry(dir.path(), "b", b"b", "/etc/svc.yml", 0o644),
        ];
        assert!(matches!(
            data_tarball(&entries, 0),
            Err(Error::DuplicatePath { .. })
        ));
    }

    #[test]
    fn test_relative_or_escaping_destination_rejected() {
        for bad in ["etc/svc.yml", "/etc/../svc.yml", "/"] {
            assert!(
                matches!(relative_destination(bad), Err(Error::InvalidPath { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let entries = vec![PackageEntry {
            source: PathBuf::from("/nonexistent/svc.jar"),
            destination: "/usr/share/java/svc.jar".to_string(),
            owner: "root".to_string(),
            group: "root".to_string(),
            mode: 0o644,
        }];
        assert!(matches!(data_tarball(&entries, 0), Err(Error::Io { .. })));
    }

    #[test]
    fn test_control_tarball_members() {
        let scripts = LifecycleScripts {
            postinst: Some("#!/bin/sh\nexit 0\n".to_string()),
            ..LifecycleScripts::default()
        };
        let bytes = control_tarball(
            "Package: svc\n",
            &["/etc/svc/config.yml".to_string()],
            &scripts,
            0,
        )
        .unwrap();

        let listed = list(&bytes);
        let names: Vec<&str> = listed.iter().map(|e| e.0.as_str()).collect();
        assert_eq!(names, vec![".", "control", "conffiles", "postinst"]);
        assert_eq!(listed[2].4, b"/etc/svc/config.yml\n");
        assert_eq!(listed[3].1, 0o755);
    }

    #[test]
    fn test_tarballs_are_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![entry(dir.path(), "a", b"a", "/a", 0o644)];
        let first = data_tarball(&entries, 42).unwrap();
        let second = data_tarball(&entries, 42).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }
}
