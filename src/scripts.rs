//! Maintainer scripts

use crate::resource::embedded;
use debkit::LifecycleScripts;
use templater::{ParameterTree, Templater};

/// Render the bundled maintainer scripts.
///
/// `preinst` creates the service account, `postinst` registers and starts
/// the service, `prerm` stops it and `postrm` cleans up on purge.
pub fn lifecycle_scripts(
    templater: &dyn Templater,
    parameters: &ParameterTree,
) -> templater::Result<LifecycleScripts> {
    let render = |name: &str| -> templater::Result<Option<String>> {
        let text = embedded::get(&format!("scripts/{name}"));
        templater.render_str(text, name, parameters)
    };

    Ok(LifecycleScripts {
        preinst: render("preinst")?,
        postinst: render("postinst")?,
        prerm: render("prerm")?,
        postrm: render("postrm")?,
    })
}
