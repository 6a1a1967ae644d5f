//! Assembling the `.deb` file.

use crate::archive::{self, PackageEntry};
use crate::descriptor::PackageDescriptor;
use crate::error::{Error, Result};
use crate::signing::{Member, PackageSigner, maybe_sign};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Contents of the `debian-binary` member.
pub const FORMAT_VERSION: &[u8] = b"2.0\n";

/// Names of the mandatory members, in the order dpkg requires.
pub const MEMBER_ORDER: [&str; 3] = ["debian-binary", "control.tar.gz", "data.tar.gz"];

/// Builds Debian binary packages for one descriptor.
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    descriptor: PackageDescriptor,
    signer: Option<PackageSigner>,
    mtime: Option<u64>,
}

impl PackageBuilder {
    /// Builder for `descriptor`, unsigned.
    #[must_use]
    pub fn new(descriptor: PackageDescriptor) -> Self {
        Self {
            descriptor,
            signer: None,
            mtime: None,
        }
    }

    /// Sign the package with `signer`, or leave it unsigned with `None`.
    pub fn with_signer(mut self, signer: Option<PackageSigner>) -> Self {
        self.signer = signer;
        self
    }

    /// Use a fixed timestamp for every member instead of
    /// `SOURCE_DATE_EPOCH` or the current time.
    pub fn with_mtime(mut self, mtime: u64) -> Self {
        self.mtime = Some(mtime);
        self
    }

    /// The descriptor being packaged.
    #[must_use]
    pub fn descriptor(&self) -> &PackageDescriptor {
        &self.descriptor
    }

    /// Write the package for `entries` to `output`.
    ///
    /// The file is assembled next to `output` and renamed into place only
    /// once complete, so a failed build never leaves a partial package.
    pub fn build(&self, entries: &[PackageEntry], output: &Path) -> Result<PathBuf> {
        let mtime = self.mtime.unwrap_or_else(source_date_epoch);
        self.descriptor.validate()?;

        let data = archive::data_tarball(entries, mtime)?;
        let control_text = self.descriptor.control(data.installed_size_kib)?;
        let control = archive::control_tarball(
            &control_text,
            &data.conffiles,
            &self.descriptor.scripts,
            mtime,
        )?;
        let signatures = maybe_sign(self.signer.as_ref(), &control, &data.bytes);

        let mut members = vec![
            Member::new(MEMBER_ORDER[0], FORMAT_VERSION.to_vec()),
            Member::new(MEMBER_ORDER[1], control),
            Member::new(MEMBER_ORDER[2], data.bytes),
        ];
        members.extend(signatures);

        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let mut staged = tempfile::Builder::new()
            .prefix(".dwpackage-")
            .suffix(".deb.partial")
            .tempfile_in(&dir)
            .map_err(|e| Error::io(&dir, e))?;
        write_members(staged.as_file_mut(), &members, mtime).map_err(|e| Error::io(output, e))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|e| Error::io(output, e))?;
        set_readable(staged.path())?;
        staged
            .persist(output)
            .map_err(|e| Error::io(output, e.error))?;

        log::info!(
            "Wrote {} {} ({} members{})",
            self.descriptor.name,
            self.descriptor.version,
            members.len(),
            if self.signer.is_some() { ", signed" } else { "" }
        );
        Ok(output.to_path_buf())
    }
}

/// Write `members` as an `ar` archive.
fn write_members<W: Write>(writer: W, members: &[Member], mtime: u64) -> std::io::Result<()> {
    let mut builder = ar::Builder::new(writer);
    for member in members {
        let mut header = ar::Header::new(member.name.as_bytes().to_vec(), member.data.len() as u64);
        header.set_mtime(mtime);
        header.set_uid(0);
        header.set_gid(0);
        header.set_mode(0o100_644);
        builder.append(&header, member.data.as_slice())?;
    }
    Ok(())
}

/// `SOURCE_DATE_EPOCH` if set and numeric, otherwise now.
#[must_use]
pub fn source_date_epoch() -> u64 {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64)
}

#[cfg(unix)]
fn set_readable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644)).map_err(|e| Error::io(path, e))
}

#[cfg(not(unix))]
fn set_readable(_path: &Path) -> Result<()> {
    Ok(())
}
