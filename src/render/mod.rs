//! Template renderer.
//!
//! Templates are plain text blobs owned by the store; this module only turns
//! a template body plus a serializable record into HTML. Every render builds a
//! fresh Tera instance so edited templates take effect immediately.

pub mod filters;

use std::error::Error as _;

use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error("template '{name}' failed to compile: {message}")]
    Compile { name: String, message: String },
    #[error("template '{name}' failed to render: {message}")]
    Render { name: String, message: String },
    #[error("render record could not be serialized: {0}")]
    Context(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    fn engine() -> Tera {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);
        tera.register_filter("format_currency", filters::format_currency_filter);
        tera.register_filter("format_date", filters::format_date_filter);
        tera.register_filter("format_number", filters::format_number_filter);
        tera.register_filter("multiply", filters::multiply_filter);
        tera.register_filter("add", filters::add_filter);
        tera
    }

    // Registered under an ".html" name so autoescaping applies.
    fn compile(name: &str, source: &str) -> Result<Tera, RenderError> {
        let mut tera = Self::engine();
        tera.add_raw_template(&format!("{}.html", name), source)
            .map_err(|e| RenderError::Compile {
                name: name.to_string(),
                message: describe(&e),
            })?;
        Ok(tera)
    }

    /// Check that `source` parses, without rendering it.
    pub fn check(&self, name: &str, source: &str) -> Result<(), RenderError> {
        Self::compile(name, source).map(|_| ())
    }

    pub fn render<T: Serialize>(
        &self,
        name: &str,
        source: &str,
        record: &T,
    ) -> Result<String, RenderError> {
        let tera = Self::compile(name, source)?;
        let context =
            Context::from_serialize(record).map_err(|e| RenderError::Context(describe(&e)))?;
        tera.render(&format!("{}.html", name), &context)
            .map_err(|e| RenderError::Render {
                name: name.to_string(),
                message: describe(&e),
            })
    }
}

/// Tera nests the useful message in the error source chain.
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
