//! Overlay generation: turn fields plus a data record into page instructions.
//!
//! Generation is a pure function of its inputs. Fields whose value is blank,
//! or whose page has no known dimensions, produce nothing; neither case is an
//! error. Output order follows field order, which is also the draw order for
//! overlapping fields.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::{debug, trace};

use crate::consts::{LINE_HEIGHT_FACTOR, PADDING};
use crate::record::{GenerationRecord, display_value, is_checked};
use crate::registry::{Field, FieldKind};
use crate::transform::{DocRect, PageDimensions, to_document_points};

/// What a renderer should draw for one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionKind {
    /// Place `text`, wrapped within `max_width`.
    Text,
    /// Place a check mark.
    Mark,
}

/// One page-scoped drawing directive in document points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInstruction {
    pub page_number: u32,
    pub kind: InstructionKind,
    /// Left edge of the text origin.
    pub x: f64,
    /// Baseline-ish origin, measured up from the page bottom.
    pub y: f64,
    #[serde(rename = "maxWidth", default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(rename = "lineHeight", default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(rename = "fontSize")]
    pub font_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// The field's full box, for renderers that clip to it.
    pub bounds: DocRect,
}

/// How date field values are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// Write the value exactly as supplied.
    #[default]
    AsIs,
    /// Reformat ISO-8601 dates and timestamps as `MM/DD/YYYY`.
    Us,
}

/// Knobs for [`generate_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub date_format: DateFormat,
}

/// Build the instruction list for `fields` using default options.
#[must_use]
pub fn generate(
    fields: &[Field],
    page_dims: &HashMap<u32, PageDimensions>,
    record: &GenerationRecord,
) -> Vec<PageInstruction> {
    generate_with(fields, page_dims, record, GenerateOptions::default())
}

/// Build the instruction list for `fields`.
#[must_use]
pub fn generate_with(
    fields: &[Field],
    page_dims: &HashMap<u32, PageDimensions>,
    record: &GenerationRecord,
    options: GenerateOptions,
) -> Vec<PageInstruction> {
    let out: Vec<PageInstruction> = fields
        .iter()
        .filter_map(|field| instruction_for(field, page_dims, record, options))
        .collect();
    debug!(fields = fields.len(), instructions = out.len(), "overlay generated");
    out
}

fn instruction_for(
    field: &Field,
    page_dims: &HashMap<u32, PageDimensions>,
    record: &GenerationRecord,
    options: GenerateOptions,
) -> Option<PageInstruction> {
    let Some(value) = record.filled(&field.key) else {
        trace!(key = %field.key, "no value; skipped");
        return None;
    };
    let Some(dims) = page_dims.get(&field.page_number).copied() else {
        trace!(key = %field.key, page = field.page_number, "unknown page; skipped");
        return None;
    };

    let font_size = field.font_size_or_default().points();
    let x = field.rect.x * dims.width + PADDING;
    let y = dims.height - field.rect.y * dims.height - font_size - PADDING;
    let bounds = to_document_points(field.rect, dims);

    match field.kind {
        FieldKind::Checkbox => {
            if !is_checked(value) {
                trace!(key = %field.key, "checkbox not set; skipped");
                return None;
            }
            Some(PageInstruction {
                page_number: field.page_number,
                kind: InstructionKind::Mark,
                x,
                y,
                max_width: None,
                line_height: None,
                font_size,
                text: None,
                bounds,
            })
        }
        FieldKind::Text | FieldKind::Date => {
            let text = match (field.kind, options.date_format) {
                (FieldKind::Date, DateFormat::Us) => format_us_date(value),
                _ => display_value(value),
            };
            Some(PageInstruction {
                page_number: field.page_number,
                kind: InstructionKind::Text,
                x,
                y,
                max_width: Some(field.rect.w * dims.width - 2.0 * PADDING),
                line_height: Some(font_size * LINE_HEIGHT_FACTOR),
                font_size,
                text: Some(text),
                bounds,
            })
        }
    }
}

/// `MM/DD/YYYY` for ISO dates and RFC 3339 timestamps; anything else is
/// written unchanged.
fn format_us_date(value: &Value) -> String {
    let raw = display_value(value);
    let date = match Date::parse(&raw, format_description!("[year]-[month]-[day]")) {
        Ok(date) => date,
        Err(_) => match OffsetDateTime::parse(&raw, &Rfc3339) {
            Ok(stamp) => stamp.date(),
            Err(_) => return raw,
        },
    };
    match date.format(format_description!("[month]/[day]/[year]")) {
        Ok(formatted) => formatted,
        Err(_) => raw,
    }
}
