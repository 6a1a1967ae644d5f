//! Scoped, isolated execution context for a validation run.
//!
//! An [`IsolatedContext`] owns a fresh temporary workspace holding private
//! copies of the artifact and the configuration plus a private home and
//! temp directory. The workspace is removed when the context is closed or
//! dropped, whichever comes first, so every exit path cleans up.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of workspace directories, visible in `ps` and `/tmp`.
const WORKSPACE_PREFIX: &str = "dwpackage-validate-";

/// A temporary workspace the application is loaded into.
#[derive(Debug)]
pub struct IsolatedContext {
    workspace: TempDir,
    artifact: PathBuf,
    config: PathBuf,
}

impl IsolatedContext {
    /// Create a workspace under `root` (or the system temp dir) and copy the
    /// artifact and configuration into it.
    pub fn open(root: Option<&Path>, artifact: &Path, config: &Path) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let workspace = match root {
            Some(root) => builder.tempdir_in(root).map_err(|e| Error::io(root, e))?,
            None => builder
                .tempdir()
                .map_err(|e| Error::io(std::env::temp_dir(), e))?,
        };
        log::debug!("Opened validation workspace {}", workspace.path().display());

        for dir in ["lib", "conf", "home", "tmp"] {
            let path = workspace.path().join(dir);
            fs::create_dir(&path).map_err(|e| Error::io(&path, e))?;
        }

        let artifact = copy_into(artifact, &workspace.path().join("lib"))?;
        let config = copy_into(config, &workspace.path().join("conf"))?;

        Ok(Self {
            workspace,
            artifact,
            config,
        })
    }

    /// Root of the workspace; the process working directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.workspace.path()
    }

    /// Private copy of the artifact.
    #[must_use]
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Private copy of the configuration.
    #[must_use]
    pub fn config(&self) -> &Path {
        &self.config
    }

    /// Private home directory.
    #[must_use]
    pub fn home_dir(&self) -> PathBuf {
        self.root().join("home")
    }

    /// Private temporary directory.
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.root().join("tmp")
    }

    /// Remove the workspace, reporting failures that `Drop` would swallow.
    pub fn close(self) -> Result<()> {
        let path = self.workspace.path().to_path_buf();
        self.workspace.close().map_err(|e| Error::io(&path, e))?;
        log::debug!("Removed validation workspace {}", path.display());
        Ok(())
    }
}

/// Copy `source` into `dir`, keeping its file name.
fn copy_into(source: &Path, dir: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| Error::io(source, std::io::Error::other("path has no file name")))?;
    let target = dir.join(name);
    fs::copy(source, &target).map_err(|e| Error::io(source, e))?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(dir: &Path) -> (PathBuf, PathBuf) {
        let artifact = dir.join("app.jar");
        let config = dir.join("app.yml");
        fs::write(&artifact, b"jar").unwrap();
        fs::write(&config, b"server: {}").unwrap();
        (artifact, config)
    }

    #[test]
    fn test_open_copies_inputs() {
        let inputs = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let (artifact, config) = fixture(inputs.path());

        let ctx = IsolatedContext::open(Some(root.path()), &artifact, &config).unwrap();
        assert!(ctx.root().starts_with(root.path()));
        assert_eq!(fs::read(ctx.artifact()).unwrap(), b"jar");
        assert_eq!(fs::read(ctx.config()).unwrap(), b"server: {}");
        assert_eq!(ctx.config().file_name().unwrap(), "app.yml");
        assert!(ctx.home_dir().is_dir());
        assert!(ctx.temp_dir().is_dir());
    }

    #[test]
    fn test_close_removes_workspace() {
        let inputs = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let (artifact, config) = fixture(inputs.path());

        let ctx = IsolatedContext::open(Some(root.path()), &artifact, &config).unwrap();
        let path = ctx.root().to_path_buf();
        ctx.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_workspace() {
        let inputs = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let (artifact, config) = fixture(inputs.path());

        let path = {
            let ctx = IsolatedContext::open(Some(root.path()), &artifact, &config).unwrap();
            ctx.root().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_open_missing_config_leaves_nothing_behind() {
        let inputs = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let (artifact, _) = fixture(inputs.path());

        let result =
            IsolatedContext::open(Some(root.path()), &artifact, &inputs.path().join("missing.yml"));
        assert!(matches!(result, Err(Error::Io { .. })));
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
