//! 0.6.x releases, published under `com.yammer.dropwizard`.

use super::{VersionAdapter, rejection};
use crate::error::Result;
use crate::launcher::LaunchOutput;
use crate::version::VersionRange;
use std::path::Path;

/// Line the 0.6 `check` command logs when the configuration parses.
const OK_MARKER: &str = "Configuration is OK";

/// Adapter for the `com.yammer.dropwizard` family.
///
/// The check command logs through the logging setup of the configuration it
/// checks, so the OK line may be missing for a valid file. A clean exit or
/// the OK line both count as success.
#[derive(Debug, Clone, Copy, Default)]
pub struct YammerAdapter;

impl VersionAdapter for YammerAdapter {
    fn family(&self) -> &'static str {
        "yammer"
    }

    fn range(&self) -> VersionRange {
        VersionRange::series((0, 6), (0, 7))
    }

    fn marker_class(&self) -> &'static str {
        "com/yammer/dropwizard/cli/CheckCommand.class"
    }

    fn interpret(&self, config: &Path, output: &LaunchOutput) -> Result<()> {
        if output.success || output.combined().contains(OK_MARKER) {
            Ok(())
        } else {
            Err(rejection(config, output))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_ok_marker_wins_over_exit_status() {
        let output = LaunchOutput {
            success: false,
            stdout: "INFO  [2013-05-02] com.yammer.dropwizard.cli.CheckCommand: Configuration is OK"
                .to_string(),
            stderr: String::new(),
        };
        assert!(YammerAdapter.interpret(Path::new("app.yml"), &output).is_ok());
    }

    #[test]
    fn test_clean_exit_with_quiet_logging_is_ok() {
        let output = LaunchOutput {
            success: true,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(YammerAdapter.interpret(Path::new("app.yml"), &output).is_ok());
    }

    #[test]
    fn test_failed_exit_without_marker_is_rejection() {
        let output = LaunchOutput {
            success: false,
            stdout: String::new(),
            stderr: "app.yml has an error:\n  * http.port must be between 1 and 65535\n".to_string(),
        };
        let err = YammerAdapter
            .interpret(Path::new("app.yml"), &output)
            .unwrap_err();
        assert!(matches!(err, Error::ConfigurationInvalid { .. }));
        assert_eq!(err.diagnostics(), ["http.port must be between 1 and 65535"]);
    }
}
