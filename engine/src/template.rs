//! Persisted template schema.
//!
//! A template is the exported field layout for one document:
//! `{name, created_at, version, page_count, fields}`. Import only insists on
//! the `fields` array; the remaining metadata falls back to defaults so older
//! or hand-written files still load.

#[cfg(test)]
#[path = "template_test.rs"]
mod template_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::consts::TEMPLATE_VERSION;
use crate::registry::Field;

/// Name used when an imported template has none.
pub const DEFAULT_TEMPLATE_NAME: &str = "template";

/// Error returned by template import and export.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("invalid template JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("template has no `fields` array")]
    MissingFields,
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Exported field layout for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default = "default_name")]
    pub name: String,
    /// RFC 3339 export time. Empty when unknown.
    #[serde(default)]
    pub created_at: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub page_count: u32,
    pub fields: Vec<Field>,
}

fn default_name() -> String {
    DEFAULT_TEMPLATE_NAME.to_owned()
}

fn default_version() -> String {
    TEMPLATE_VERSION.to_owned()
}

impl Template {
    /// Snapshot `fields` for export, stamped with `created_at`.
    ///
    /// # Errors
    ///
    /// Returns `Timestamp` if `created_at` cannot be written as RFC 3339.
    pub fn from_fields(
        name: impl Into<String>,
        page_count: u32,
        fields: Vec<Field>,
        created_at: OffsetDateTime,
    ) -> Result<Self, TemplateError> {
        Ok(Self {
            name: name.into(),
            created_at: created_at.format(&Rfc3339)?,
            version: TEMPLATE_VERSION.to_owned(),
            page_count,
            fields,
        })
    }

    /// Pretty-printed JSON for export.
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, TemplateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// File name for a document filled from this template.
    #[must_use]
    pub fn output_file_name(&self, extension: &str) -> String {
        format!("{}_filled.{extension}", self.name)
    }
}

/// Parse an imported template.
///
/// A missing `page_count` is inferred from the highest field page.
///
/// # Errors
///
/// Returns `Json` for unparsable input or malformed fields, and
/// `MissingFields` when there is no `fields` array.
pub fn parse_template(text: &str) -> Result<Template, TemplateError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.get("fields").is_some_and(Value::is_array) {
        return Err(TemplateError::MissingFields);
    }
    let mut template: Template = serde_json::from_value(value)?;
    if template.page_count == 0 {
        template.page_count = template.fields.iter().map(|f| f.page_number).max().unwrap_or(0);
    }
    Ok(template)
}
