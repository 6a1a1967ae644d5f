use anyhow::{Context as _, Result};
use std::path::PathBuf;

use crate::Context;
use crate::pipeline::Pipeline;
use crate::ui;

pub fn run(ctx: &Context, config: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config.as_deref())?;
    let pipeline = Pipeline::new(config)?;

    if !ctx.quiet {
        ui::step(1, 2, "Rendering resources");
    }
    let staged = pipeline
        .extract()
        .context("Failed to extract resources")?;

    if !ctx.quiet {
        ui::step(2, 2, "Validating configuration");
    }
    let report = pipeline
        .validate(&staged)
        .context("Failed to validate configuration")?;
    super::print_report(&report);
    Ok(())
}
