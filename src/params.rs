//! Template parameters for a build

use crate::config::PackagingConfig;
use templater::{ParameterTree, ParameterTreeBuilder};

/// Build the parameter tree templates are rendered against.
///
/// The `[dropwizard]` table is exposed twice, as `dw` and `dropwizard`.
pub fn parameters(config: &PackagingConfig) -> templater::Result<ParameterTree> {
    Ok(ParameterTreeBuilder::new()
        .with("project", &config.project)?
        .with("deb", &config.deb)?
        .with("jvm", &config.jvm)?
        .with("unix", &config.unix)?
        .with("dw", &config.dropwizard)?
        .with("dropwizard", &config.dropwizard)?
        .with("path", &config.path)?
        .build())
}
