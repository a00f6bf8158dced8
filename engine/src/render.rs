//! Renderer boundary: turns instruction lists into output document bytes.
//!
//! The engine never draws pixels or writes document formats itself. A
//! [`DocumentRenderer`] receives the finished instructions and returns raw
//! bytes. [`JsonRenderer`] is the built-in implementation; it writes the
//! instructions grouped by page so another tool can apply them.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::overlay::PageInstruction;

/// Error returned by a [`DocumentRenderer`].
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    /// Failure reported by an external rendering backend.
    #[error("renderer failed: {0}")]
    Backend(String),
}

/// Produces a filled document from overlay instructions.
pub trait DocumentRenderer: Send + Sync {
    /// Extension for files written from this renderer's output.
    fn file_extension(&self) -> &'static str;

    /// Render `instructions` into document bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] when the output cannot be produced.
    fn render(&self, instructions: &[PageInstruction]) -> Result<Vec<u8>, RenderError>;
}

/// Writes instructions as JSON grouped by page.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer {
    pub pretty: bool,
}

#[derive(Serialize)]
struct RenderedPage<'a> {
    page_number: u32,
    instructions: Vec<&'a PageInstruction>,
}

#[derive(Serialize)]
struct RenderedDocument<'a> {
    pages: Vec<RenderedPage<'a>>,
}

impl DocumentRenderer for JsonRenderer {
    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, instructions: &[PageInstruction]) -> Result<Vec<u8>, RenderError> {
        let mut by_page: BTreeMap<u32, Vec<&PageInstruction>> = BTreeMap::new();
        for ins in instructions {
            by_page.entry(ins.page_number).or_default().push(ins);
        }
        let doc = RenderedDocument {
            pages: by_page
                .into_iter()
                .map(|(page_number, instructions)| RenderedPage { page_number, instructions })
                .collect(),
        };
        let bytes = if self.pretty { serde_json::to_vec_pretty(&doc)? } else { serde_json::to_vec(&doc)? };
        Ok(bytes)
    }
}
