use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Context;
use crate::pipeline::{self, Pipeline};
use crate::ui;

pub fn run(
    ctx: &Context,
    config: Option<PathBuf>,
    no_validate: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut config = super::load_config(config.as_deref())?;
    if let Some(output) = output {
        config.output_file = Some(output);
    }
    let validate = config.validate && !no_validate;

    if !ctx.quiet {
        ui::header(&format!(
            "Packaging {} {}",
            config.deb.name, config.deb.version
        ));
    }

    let pipeline = Pipeline::new(config)?;
    let result = pipeline.run(validate)?;

    if let Some(report) = &result.report {
        super::print_report(report);
    }
    if ctx.quiet {
        return Ok(());
    }

    let (files, bytes) = pipeline::tree_size(&pipeline.staging_dir());
    ui::kv("Staged", &format!("{files} files, {}", ui::format_size(bytes)));
    if ctx.verbose > 0 {
        for entry in &result.staged {
            ui::dim(&format!(
                "{:o} {}:{} {}",
                entry.mode, entry.owner, entry.group, entry.destination
            ));
        }
    }
    let size = fs::metadata(&result.package).map(|m| m.len()).unwrap_or(0);
    ui::kv("Package", &result.package.display().to_string());
    ui::kv("Size", &ui::format_size(size));
    if pipeline.config().signing.key_file.is_some() {
        ui::kv("Signed", "yes");
    }
    println!();
    ui::success(&format!("Built {}", result.package.display()));
    Ok(())
}
