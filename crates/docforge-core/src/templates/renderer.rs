//! Handlebars-based renderer for markup snippets.
//!
//! Wraps the [`handlebars::Handlebars`] engine with **strict mode** enabled and an
//! XML escape function. Strict mode makes a `{{variable}}` missing from the data
//! context an error instead of an empty string; in markup a silently dropped value
//! produces an empty cell that nobody notices until the agreement is signed.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::templates::renderer::TemplateRenderer;
//!
//! let renderer = TemplateRenderer::new()?;
//! let data = serde_json::json!({ "text": "Sunrise & Co" });
//! let run = renderer.render("text_run", &data)?;
//! ```

use handlebars::Handlebars;
use serde_json::Value;

use crate::error::{DocforgeError, Result};
use crate::templates::embedded;

/// Renderer holding every embedded markup snippet.
pub struct TemplateRenderer {
    hbs: Handlebars<'static>,
}

impl TemplateRenderer {
    /// Create a renderer with strict mode, XML escaping and all snippets registered.
    pub fn new() -> Result<Self> {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_escape_fn(|s: &str| crate::markup::escape(s).into_owned());
        for &(name, source) in embedded::ALL {
            hbs.register_template_string(name, compact(source))
                .map_err(|e| DocforgeError::TemplateRender(format!("{name}: {e}")))?;
        }
        Ok(Self { hbs })
    }

    /// Render a registered snippet with the given data context.
    pub fn render(&self, name: &str, data: &Value) -> Result<String> {
        self.hbs
            .render(name, data)
            .map_err(|e| DocforgeError::TemplateRender(e.to_string()))
    }
}

/// Join the lines of a snippet with surrounding whitespace removed.
fn compact(source: &str) -> String {
    source.lines().map(str::trim).collect()
}
