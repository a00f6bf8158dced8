//! Field model and the registry that owns it.
//!
//! This module defines the data that describes a template: `Field` and its
//! enums, a sparse-update type for incremental edits (`PartialField`), and the
//! `FieldRegistry`, which is the single owner of mutable session state: fields
//! in draw order, rendered page dimensions, the selection, and the transient
//! drawing gesture.
//!
//! The interaction state machine and the overlay generator never mutate a
//! `Field` in place; they go through the registry's operations.

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{FONT_LARGE_PT, FONT_MEDIUM_PT, FONT_SMALL_PT};
use crate::transform::{FieldRect, PageDimensions};

/// Stable, unique identifier for a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for FieldId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What kind of value a field renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text, wrapped inside the box.
    #[default]
    Text,
    /// A date, rendered as text.
    Date,
    /// A mark drawn when the value is true.
    Checkbox,
}

/// Font size bucket for text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    /// Size in document points.
    #[must_use]
    pub fn points(self) -> f64 {
        match self {
            Self::Small => FONT_SMALL_PT,
            Self::Medium => FONT_MEDIUM_PT,
            Self::Large => FONT_LARGE_PT,
        }
    }
}

/// A named, typed region on one page, bound to a data key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Unique identifier.
    pub id: FieldId,
    /// Data-binding name looked up in the generation record.
    pub key: String,
    /// Field type.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// 1-indexed page the field sits on.
    pub page_number: u32,
    /// Font size for text output. `None` means medium.
    #[serde(rename = "fontSize", default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<FontSize>,
    /// Position and size in normalized page space.
    pub rect: FieldRect,
}

impl Field {
    /// Create a text field with a fresh id.
    #[must_use]
    pub fn new(key: impl Into<String>, page_number: u32, rect: FieldRect) -> Self {
        Self {
            id: FieldId::generate(),
            key: key.into(),
            kind: FieldKind::Text,
            page_number,
            font_size: None,
            rect,
        }
    }

    /// Font size with the medium default applied.
    #[must_use]
    pub fn font_size_or_default(&self) -> FontSize {
        self.font_size.unwrap_or_default()
    }
}

/// Sparse update for a field. Only present values are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,
    #[serde(rename = "fontSize", skip_serializing_if = "Option::is_none")]
    pub font_size: Option<FontSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rect: Option<FieldRect>,
}

impl PartialField {
    /// An update that only replaces the rect.
    #[must_use]
    pub fn rect(rect: FieldRect) -> Self {
        Self { rect: Some(rect), ..Default::default() }
    }

    /// An update that only replaces the key.
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self { key: Some(key.into()), ..Default::default() }
    }

    /// Returns `true` if no value would be applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key.is_none() && self.kind.is_none() && self.font_size.is_none() && self.rect.is_none()
    }
}

/// Transient state for an in-progress create gesture, in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrawingState {
    pub active: bool,
    pub start_x: f64,
    pub start_y: f64,
    pub current_x: f64,
    pub current_y: f64,
    pub page_number: u32,
}

/// In-memory store of fields and the session state that references them.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    fields: Vec<Field>,
    page_dims: HashMap<u32, PageDimensions>,
    selected: Option<FieldId>,
    drawing: DrawingState,
}

impl FieldRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Fields ---

    /// Append a field. Id uniqueness is the caller's responsibility.
    pub fn add_field(&mut self, field: Field) {
        tracing::debug!(field_id = %field.id, key = %field.key, page = field.page_number, "field added");
        self.fields.push(field);
    }

    /// Merge `partial` into the field with `id`. Returns false if it doesn't exist.
    pub fn update_field(&mut self, id: &FieldId, partial: &PartialField) -> bool {
        let Some(field) = self.fields.iter_mut().find(|f| &f.id == id) else {
            return false;
        };
        if let Some(ref key) = partial.key {
            field.key.clone_from(key);
        }
        if let Some(kind) = partial.kind {
            field.kind = kind;
        }
        if let Some(font_size) = partial.font_size {
            field.font_size = Some(font_size);
        }
        if let Some(rect) = partial.rect {
            field.rect = rect;
        }
        true
    }

    /// Remove a field, clearing the selection if it pointed at it.
    pub fn remove_field(&mut self, id: &FieldId) -> Option<Field> {
        let index = self.fields.iter().position(|f| &f.id == id)?;
        let removed = self.fields.remove(index);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        tracing::debug!(field_id = %id, "field removed");
        Some(removed)
    }

    /// Replace every field. Drops a selection that no longer resolves.
    pub fn set_fields(&mut self, fields: Vec<Field>) {
        self.fields = fields;
        if let Some(id) = &self.selected {
            if !self.fields.iter().any(|f| &f.id == id) {
                self.selected = None;
            }
        }
        tracing::debug!(count = self.fields.len(), "fields replaced");
    }

    /// Look up a field by id.
    #[must_use]
    pub fn get(&self, id: &FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| &f.id == id)
    }

    /// All fields in insertion (draw) order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Fields on one page, in draw order.
    pub fn fields_on_page(&self, page_number: u32) -> impl DoubleEndedIterator<Item = &Field> {
        self.fields.iter().filter(move |f| f.page_number == page_number)
    }

    /// Whether any field already uses `key`.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // --- Page dimensions ---

    /// Record the rendered size of a page, replacing any earlier value.
    pub fn set_page_dimensions(&mut self, page_number: u32, dims: PageDimensions) {
        self.page_dims.insert(page_number, dims);
    }

    /// Rendered size of a page, if it has loaded.
    #[must_use]
    pub fn page_dimensions(&self, page_number: u32) -> Option<PageDimensions> {
        self.page_dims.get(&page_number).copied()
    }

    // --- Selection ---

    #[must_use]
    pub fn selected(&self) -> Option<&FieldId> {
        self.selected.as_ref()
    }

    /// Select a field, or clear the selection with `None`. Unknown ids clear it.
    pub fn set_selected(&mut self, id: Option<FieldId>) {
        self.selected = id.filter(|id| self.fields.iter().any(|f| &f.id == id));
    }

    /// The selected field, if any.
    #[must_use]
    pub fn selected_field(&self) -> Option<&Field> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    // --- Drawing ---

    #[must_use]
    pub fn drawing(&self) -> DrawingState {
        self.drawing
    }

    pub fn set_drawing(&mut self, drawing: DrawingState) {
        self.drawing = drawing;
    }

    /// Reset the drawing gesture to its inactive default.
    pub fn reset_drawing(&mut self) {
        self.drawing = DrawingState::default();
    }
}
