use anyhow::Result;
use std::path::Path;

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, deb: &Path, public_key: &Path) -> Result<()> {
    let key = debkit::load_verifying_key(public_key)?;
    debkit::verify_package(deb, &key)?;

    if !ctx.quiet {
        ui::success(&format!("{}: signatures OK", deb.display()));
    }
    Ok(())
}
