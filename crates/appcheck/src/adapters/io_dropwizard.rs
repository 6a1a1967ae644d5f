//! 0.7 to 0.9 releases, the first under `io.dropwizard`.

use super::{VersionAdapter, rejection};
use crate::error::Result;
use crate::launcher::LaunchOutput;
use crate::version::VersionRange;
use std::path::Path;

/// Adapter for the pre-1.0 `io.dropwizard` family.
#[derive(Debug, Clone, Copy, Default)]
pub struct IoDropwizardAdapter;

impl VersionAdapter for IoDropwizardAdapter {
    fn family(&self) -> &'static str {
        "io-dropwizard"
    }

    fn range(&self) -> VersionRange {
        VersionRange::series((0, 7), (1, 0))
    }

    fn marker_class(&self) -> &'static str {
        "io/dropwizard/cli/CheckCommand.class"
    }

    fn interpret(&self, config: &Path, output: &LaunchOutput) -> Result<()> {
        if output.success {
            Ok(())
        } else {
            Err(rejection(config, output))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status_decides() {
        let ok = LaunchOutput {
            success: true,
            ..LaunchOutput::default()
        };
        assert!(IoDropwizardAdapter.interpret(Path::new("a.yml"), &ok).is_ok());

        let failed = LaunchOutput {
            success: false,
            stdout: String::new(),
            stderr: "a.yml has an error:\n  * logging.level is not a level\n".to_string(),
        };
        let err = IoDropwizardAdapter
            .interpret(Path::new("a.yml"), &failed)
            .unwrap_err();
        assert_eq!(err.diagnostics(), ["logging.level is not a level"]);
    }
}
