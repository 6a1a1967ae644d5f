//! Path resolution for dwpackage
//!
//! # Environment Variables
//!
//! - `DWPACKAGE_CONFIG` - Build configuration to use when `--config` is not given
//!
//! # Configuration Resolution Priority
//!
//! 1. `--config` flag
//! 2. `DWPACKAGE_CONFIG` environment variable
//! 3. `dwpackage.toml` in the current directory

use std::path::{Path, PathBuf};

/// Environment variable for the configuration file override
pub const ENV_CONFIG: &str = "DWPACKAGE_CONFIG";

/// File name looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "dwpackage.toml";

/// Get the build configuration file path
///
/// Priority:
/// 1. `explicit` (the `--config` flag)
/// 2. `DWPACKAGE_CONFIG` env var
/// 3. `./dwpackage.toml`
pub fn config_file(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return expand(&path.to_string_lossy());
    }

    if let Ok(file) = std::env::var(ENV_CONFIG) {
        let path = expand(&file);
        log::debug!("Using config from {}: {}", ENV_CONFIG, path.display());
        return path;
    }

    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Expand ~ and environment variables in a path string.
///
/// # Examples
///
/// ```ignore
/// // Expands ~ to home directory
/// let home_path = paths::expand("~/keys/signing.key");
///
/// // Expands environment variables
/// let var_path = paths::expand("$HOME/keys/signing.key");
/// ```
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

/// Expand `path` and make it absolute against `base` if it is relative.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    let expanded = expand(&path.to_string_lossy());
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, PoisonError};

    /// Serializes tests that touch the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Helper to run a test with temporary env var
    ///
    /// # Safety
    /// This function uses unsafe env::set_var/remove_var which can cause issues
    /// if other threads read environment variables concurrently.
    /// Only use in single-threaded test contexts.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: Tests run in isolation
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    /// Helper to run a test with env var removed
    fn without_env_var<F, R>(key: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::remove_var(key) };
        let result = f();
        if let Some(v) = original {
            // SAFETY: Tests run in isolation
            unsafe { env::set_var(key, v) };
        }
        result
    }

    #[test]
    fn test_config_file_explicit_wins() {
        with_env_var(ENV_CONFIG, "/from/env.toml", || {
            let result = config_file(Some(Path::new("/from/flag.toml")));
            assert_eq!(result, PathBuf::from("/from/flag.toml"));
        });
    }

    #[test]
    fn test_config_file_env_override() {
        with_env_var(ENV_CONFIG, "/from/env.toml", || {
            assert_eq!(config_file(None), PathBuf::from("/from/env.toml"));
        });
    }

    #[test]
    fn test_config_file_default() {
        without_env_var(ENV_CONFIG, || {
            assert_eq!(config_file(None), PathBuf::from(DEFAULT_CONFIG_FILE));
        });
    }

    #[test]
    fn test_expand_absolute() {
        let result = expand("/absolute/path");
        assert_eq!(result, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_with_env_var() {
        with_env_var("DWPACKAGE_TEST_VAR", "test_value", || {
            let result = expand("/path/$DWPACKAGE_TEST_VAR/file");
            assert_eq!(result, PathBuf::from("/path/test_value/file"));
        });
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        // Unknown env vars are left as-is by shellexpand::full
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let base = Path::new("/project");
        assert_eq!(
            resolve(base, Path::new("target/app.jar")),
            PathBuf::from("/project/target/app.jar")
        );
        assert_eq!(
            resolve(base, Path::new("/abs/app.jar")),
            PathBuf::from("/abs/app.jar")
        );
    }
}
