//! 1.0 and later, where configuration is bound by `YamlConfigurationFactory`.

use super::{VersionAdapter, rejection};
use crate::error::Result;
use crate::launcher::LaunchOutput;
use crate::version::VersionRange;
use std::path::Path;

/// Adapter for 1.x through 4.0.x.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFactoryAdapter;

impl VersionAdapter for YamlFactoryAdapter {
    fn family(&self) -> &'static str {
        "yaml-factory"
    }

    fn range(&self) -> VersionRange {
        VersionRange::series((1, 0), (4, 1))
    }

    fn marker_class(&self) -> &'static str {
        "io/dropwizard/configuration/YamlConfigurationFactory.class"
    }

    fn interpret(&self, config: &Path, output: &LaunchOutput) -> Result<()> {
        if output.success {
            Ok(())
        } else {
            Err(rejection(config, output))
        }
    }
}
