//! # templater
//!
//! Renders text templates against a [`ParameterTree`].
//!
//! The default implementation is backed by Tera and supports:
//!
//! - Variable substitution with dotted traversal: `{{ unix.user }}`
//! - Conditional blocks: `{% if deb.depends %}...{% endif %}`
//! - Sections over sequences: `{% for dep in deb.depends %}...{% endfor %}`
//!
//! Rendering is always strict: referencing a variable that is not in the
//! tree is an error. Conditionals treat missing, empty and `false` values as
//! false, so optional settings are guarded with `{% if %}`.
//!
//! ## Example
//!
//! ```
//! use templater::{ParameterTreeBuilder, Templater};
//! use serde_json::json;
//!
//! let params = ParameterTreeBuilder::new()
//!     .with("unix", &json!({ "user": "svcuser" }))
//!     .unwrap()
//!     .build();
//!
//! let out = templater::default_templater()
//!     .render_str(Some("user: {{unix.user}}"), "config.yml", &params)
//!     .unwrap();
//! assert_eq!(out.as_deref(), Some("user: svcuser"));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod params;

pub use error::{Error, ErrorCategory, Result};
pub use params::{ParameterTree, ParameterTreeBuilder, lookup};

use std::io::Read;
use tera::{Context, Tera};

/// Renders a template stream against a parameter tree.
///
/// Implementations must not keep state between calls: rendering the same
/// input twice gives the same output regardless of what was rendered in
/// between.
pub trait Templater: Send + Sync {
    /// Render the whole of `input`.
    ///
    /// `name` identifies the template in diagnostics.
    fn render(&self, input: &mut dyn Read, name: &str, parameters: &ParameterTree)
    -> Result<String>;

    /// Render a string. `None` in gives `None` out without rendering.
    fn render_str(
        &self,
        input: Option<&str>,
        name: &str,
        parameters: &ParameterTree,
    ) -> Result<Option<String>> {
        match input {
            None => Ok(None),
            Some(text) => {
                let mut reader = text.as_bytes();
                self.render(&mut reader, name, parameters).map(Some)
            }
        }
    }
}

/// Tera-backed templater.
///
/// Every call builds its own engine, so nothing registered while rendering
/// one template is visible to the next.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraTemplater;

impl TeraTemplater {
    /// Create a new templater.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Templater for TeraTemplater {
    fn render(
        &self,
        input: &mut dyn Read,
        name: &str,
        parameters: &ParameterTree,
    ) -> Result<String> {
        let mut source = String::new();
        input
            .read_to_string(&mut source)
            .map_err(|e| Error::io(name, e))?;

        let mut tera = Tera::default();
        // Configuration files are not HTML.
        tera.autoescape_on(vec![]);
        tera.add_raw_template(name, &source)
            .map_err(|e| Error::syntax(name, &e))?;

        let context = Context::from_serialize(parameters).map_err(|e| Error::render(name, &e))?;
        tera.render(name, &context)
            .map_err(|e| Error::render(name, &e))
    }
}

/// Get the default templater.
#[must_use]
pub fn default_templater() -> TeraTemplater {
    TeraTemplater::new()
}
