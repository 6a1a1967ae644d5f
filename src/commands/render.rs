use anyhow::{Context as _, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use templater::Templater;

use crate::Context;
use crate::pipeline::Pipeline;

pub fn run(
    _ctx: &Context,
    template: &Path,
    config: Option<PathBuf>,
    show_parameters: bool,
) -> Result<()> {
    let config = super::load_config(config.as_deref())?;
    let pipeline = Pipeline::new(config)?;

    let output = if show_parameters {
        let mut json = serde_json::to_string_pretty(pipeline.parameters())?;
        json.push('\n');
        json
    } else {
        let mut file = File::open(template)
            .with_context(|| format!("Could not open {}", template.display()))?;
        templater::default_templater().render(
            &mut file,
            &template.display().to_string(),
            pipeline.parameters(),
        )?
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
