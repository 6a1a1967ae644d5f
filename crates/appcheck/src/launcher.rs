//! Launching the application's own code.
//!
//! The [`Launcher`] trait is the seam between adapters, which decide *what*
//! to run, and the JVM, which runs it. [`JvmLauncher`] starts a real `java`
//! process; [`MockLauncher`] answers from a closure so adapters and the
//! validator can be tested without a JVM:
//!
//! ```
//! use appcheck::launcher::{Launcher, MockLauncher};
//!
//! let mock = MockLauncher::succeeding("INFO Configuration is OK");
//! # let inv = appcheck::launcher::Invocation::default();
//! let output = mock.launch(&inv).unwrap();
//! assert!(output.success);
//! assert_eq!(mock.calls().len(), 1);
//! ```

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};

/// Everything needed to run one entry point inside an isolated context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Classpath entries, the application artifact only.
    pub classpath: Vec<PathBuf>,
    /// Fully qualified class whose `main` is invoked.
    pub main_class: String,
    /// Program arguments.
    pub args: Vec<String>,
    /// `-D` system properties.
    pub system_properties: Vec<(String, String)>,
    /// Working directory of the process.
    pub working_dir: PathBuf,
    /// Private home directory.
    pub home_dir: PathBuf,
    /// Private temporary directory.
    pub temp_dir: PathBuf,
}

/// Captured result of a launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOutput {
    /// Whether the process exited with status 0.
    pub success: bool,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl LaunchOutput {
    /// Standard output followed by standard error.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }
}

/// Runs an [`Invocation`] and captures its output.
pub trait Launcher: Send + Sync {
    /// Run to completion. A non-zero exit is reported in the output, not as
    /// an error; errors mean the process could not be run at all.
    fn launch(&self, invocation: &Invocation) -> Result<LaunchOutput>;
}

/// Launches a separate JVM per invocation.
///
/// The child gets a cleared environment (only `PATH`, `LANG`, `HOME` and
/// `TMPDIR` are set) and a classpath containing just the artifact, so
/// neither side sees the other's classes or settings.
#[derive(Debug, Clone, Default)]
pub struct JvmLauncher {
    java: Option<PathBuf>,
}

impl JvmLauncher {
    /// Create a launcher that locates `java` on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a launcher that uses a specific `java` binary.
    #[must_use]
    pub fn with_java(java: impl Into<PathBuf>) -> Self {
        Self {
            java: Some(java.into()),
        }
    }

    /// Resolve the `java` executable: explicit path, then `JAVA_HOME`,
    /// then `PATH`.
    pub fn locate_java(&self) -> Result<PathBuf> {
        if let Some(java) = &self.java {
            return Ok(java.clone());
        }

        if let Ok(home) = std::env::var("JAVA_HOME") {
            let candidate = Path::new(&home).join("bin").join("java");
            if candidate.is_file() {
                log::debug!("Using java from JAVA_HOME: {}", candidate.display());
                return Ok(candidate);
            }
        }

        which::which("java").map_err(|_| Error::JavaNotFound)
    }
}

impl Launcher for JvmLauncher {
    fn launch(&self, invocation: &Invocation) -> Result<LaunchOutput> {
        let java = self.locate_java()?;
        let classpath = std::env::join_paths(&invocation.classpath).map_err(|e| Error::Launch {
            message: format!("invalid classpath: {e}"),
        })?;

        let mut cmd = Command::new(&java);
        cmd.env_clear()
            .env("HOME", &invocation.home_dir)
            .env("TMPDIR", &invocation.temp_dir)
            .env("LANG", "C.UTF-8");
        if let Some(path) = std::env::var_os("PATH") {
            cmd.env("PATH", path);
        }

        cmd.arg(format!("-Duser.home={}", invocation.home_dir.display()))
            .arg(format!("-Djava.io.tmpdir={}", invocation.temp_dir.display()));
        for (key, value) in &invocation.system_properties {
            cmd.arg(format!("-D{key}={value}"));
        }
        cmd.arg("-cp")
            .arg(classpath)
            .arg(&invocation.main_class)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null());

        log::debug!("Launching {:?}", cmd);
        let output = cmd.output().map_err(|e| Error::Launch {
            message: format!("failed to execute {}: {e}", java.display()),
        })?;

        Ok(LaunchOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

type Handler = dyn Fn(&Invocation) -> LaunchOutput + Send + Sync;

/// Launcher for tests: answers every invocation from a closure and records
/// what it was asked to run.
#[derive(Clone)]
pub struct MockLauncher {
    handler: Arc<Handler>,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl MockLauncher {
    /// Create a mock answering with `handler`.
    pub fn new(handler: impl Fn(&Invocation) -> LaunchOutput + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            calls: Arc::default(),
        }
    }

    /// A mock whose process always exits 0 with `stdout`.
    #[must_use]
    pub fn succeeding(stdout: &str) -> Self {
        let stdout = stdout.to_string();
        Self::new(move |_| LaunchOutput {
            success: true,
            stdout: stdout.clone(),
            stderr: String::new(),
        })
    }

    /// A mock whose process always exits 1 with `stderr`.
    #[must_use]
    pub fn failing(stderr: &str) -> Self {
        let stderr = stderr.to_string();
        Self::new(move |_| LaunchOutput {
            success: false,
            stdout: String::new(),
            stderr: stderr.clone(),
        })
    }

    /// Invocations seen so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl fmt::Debug for MockLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockLauncher")
            .field("calls", &self.calls().len())
            .finish_non_exhaustive()
    }
}

impl Launcher for MockLauncher {
    fn launch(&self, invocation: &Invocation) -> Result<LaunchOutput> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(invocation.clone());
        Ok((self.handler)(invocation))
    }
}
