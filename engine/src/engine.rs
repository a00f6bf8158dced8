//! Interaction state machine: pointer and keyboard events in, registry
//! mutations and host [`Action`]s out.
//!
//! Pointer positions are page-local pixels of the rendered page image. Every
//! geometry change is clamped per axis and per drag mode in pixel space, then
//! converted to normalized space and written through
//! [`FieldRegistry::update_field`]. There is no preview layer: the registry is
//! the live state the host renders from.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use crate::consts::{DEFAULT_KEY_PREFIX, MIN_SIZE, MIN_SIZE_PX};
use crate::hit::{HitPart, hit_test};
use crate::input::{Button, DragMode, InputState, Key, SizeAxes};
use crate::registry::{DrawingState, Field, FieldId, FieldKind, FieldRegistry, PartialField};
use crate::transform::{
    FieldRect, PageDimensions, PixelRect, Point, is_viable_size, normalize_drag, to_normalized, to_pixels,
};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    FieldCreated(Field),
    FieldUpdated { id: FieldId, fields: PartialField },
    FieldDeleted { id: FieldId },
    SelectionChanged(Option<FieldId>),
    /// Open an inline editor for the field's key, seeded with `key`.
    EditKeyRequested { id: FieldId, key: String },
    SetCursor(String),
    RenderNeeded,
}

/// Editing session core: the field registry plus the active gesture.
#[derive(Debug, Default)]
pub struct Editor {
    pub registry: FieldRegistry,
    pub input: InputState,
}

impl Editor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Data inputs ---

    /// Record the rendered pixel size of a page (initial load or re-render at a new zoom).
    pub fn set_page_dimensions(&mut self, page_number: u32, dims: PageDimensions) {
        self.registry.set_page_dimensions(page_number, dims);
    }

    /// Replace all fields, e.g. from an imported template. Abandons any gesture.
    pub fn load_fields(&mut self, fields: Vec<Field>) {
        self.abandon_gesture();
        self.registry.set_fields(fields);
    }

    // --- Pointer input ---

    /// Pointer pressed on `page_number` at page-local pixel `pt`.
    pub fn on_pointer_down(&mut self, page_number: u32, pt: Point, button: Button) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }

        let mut actions = Vec::new();
        let hit = hit_test(pt, page_number, &self.registry);

        if let InputState::Editing { id, .. } = &self.input {
            if hit.as_ref().is_some_and(|h| &h.field_id == id) {
                return actions;
            }
            actions.extend(self.commit_edit());
        } else if !self.input.is_idle() {
            self.abandon_gesture();
        }

        let Some(page) = self.page_dims(page_number) else {
            return actions;
        };

        if let Some(hit) = hit {
            let Some(field) = self.registry.get(&hit.field_id) else {
                return actions;
            };
            let mode = match hit.part {
                HitPart::Body => DragMode::Move,
                HitPart::ResizeHandle(corner) => DragMode::resize(corner),
            };
            let orig = to_pixels(field.rect, page);
            actions.extend(self.select(Some(hit.field_id.clone())));
            actions.push(Action::SetCursor(mode.cursor().to_owned()));
            self.input = InputState::Dragging { id: hit.field_id, mode, origin: pt, orig, page };
        } else {
            actions.extend(self.select(None));
            let start = clamp_to_page(pt, page);
            self.registry.set_drawing(DrawingState {
                active: true,
                start_x: start.x,
                start_y: start.y,
                current_x: start.x,
                current_y: start.y,
                page_number,
            });
            actions.push(Action::SetCursor("crosshair".to_owned()));
            self.input = InputState::Drawing { page };
        }

        actions.push(Action::RenderNeeded);
        actions
    }

    /// Pointer moved to page-local pixel `pt` on the page the gesture started on.
    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        match &self.input {
            InputState::Drawing { page } => {
                let current = clamp_to_page(pt, *page);
                let mut drawing = self.registry.drawing();
                drawing.current_x = current.x;
                drawing.current_y = current.y;
                self.registry.set_drawing(drawing);
                vec![Action::RenderNeeded]
            }
            InputState::Dragging { id, mode, origin, orig, page } => {
                let rect = drag_rect(*mode, *orig, pt.x - origin.x, pt.y - origin.y, *page);
                let normalized = to_normalized(rect, *page);
                let id = id.clone();
                if self.registry.get(&id).is_some_and(|f| f.rect == normalized) {
                    return Vec::new();
                }
                let partial = PartialField::rect(normalized);
                if !self.registry.update_field(&id, &partial) {
                    return Vec::new();
                }
                vec![Action::FieldUpdated { id, fields: partial }, Action::RenderNeeded]
            }
            InputState::Idle | InputState::Editing { .. } => Vec::new(),
        }
    }

    /// Pointer released.
    pub fn on_pointer_up(&mut self, pt: Point) -> Vec<Action> {
        match self.input {
            InputState::Drawing { .. } => {
                let mut actions = self.on_pointer_move(pt);
                actions.extend(self.finish_drawing());
                actions
            }
            InputState::Dragging { .. } => {
                self.input = InputState::Idle;
                vec![Action::SetCursor("default".to_owned())]
            }
            InputState::Idle | InputState::Editing { .. } => Vec::new(),
        }
    }

    /// Pointer left the interaction surface. Drawing is discarded; a drag
    /// keeps whatever position it had reached.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        match self.input {
            InputState::Drawing { .. } | InputState::Dragging { .. } => {
                self.abandon_gesture();
                vec![Action::SetCursor("default".to_owned()), Action::RenderNeeded]
            }
            InputState::Idle | InputState::Editing { .. } => Vec::new(),
        }
    }

    /// Double-click opens the rename editor for the field under the pointer.
    pub fn on_double_click(&mut self, page_number: u32, pt: Point) -> Vec<Action> {
        match hit_test(pt, page_number, &self.registry) {
            Some(hit) => self.begin_rename(&hit.field_id),
            None => Vec::new(),
        }
    }

    // --- Keyboard input ---

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        let name = key.0.as_str();
        match &self.input {
            InputState::Editing { .. } => match name {
                "Enter" => self.commit_edit(),
                "Escape" => self.cancel_edit(),
                _ => Vec::new(),
            },
            InputState::Drawing { .. } if name == "Escape" => {
                self.abandon_gesture();
                vec![Action::RenderNeeded]
            }
            InputState::Dragging { id, orig, page, .. } if name == "Escape" => {
                let id = id.clone();
                let partial = PartialField::rect(to_normalized(*orig, *page));
                self.input = InputState::Idle;
                if !self.registry.update_field(&id, &partial) {
                    return Vec::new();
                }
                vec![Action::FieldUpdated { id, fields: partial }, Action::RenderNeeded]
            }
            InputState::Idle if matches!(name, "Delete" | "Backspace") => {
                match self.registry.selected().cloned() {
                    Some(id) => self.delete_field(&id),
                    None => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    // --- Renaming ---

    /// Open the rename editor for `id`. Ignored while that field is being
    /// dragged; an edit already open on another field is committed first.
    pub fn begin_rename(&mut self, id: &FieldId) -> Vec<Action> {
        let mut actions = Vec::new();
        match &self.input {
            InputState::Dragging { .. } | InputState::Drawing { .. } => return actions,
            InputState::Editing { id: current, .. } if current == id => return actions,
            InputState::Editing { .. } => actions.extend(self.commit_edit()),
            InputState::Idle => {}
        }

        let Some(field) = self.registry.get(id) else {
            return actions;
        };
        let key = field.key.clone();
        actions.extend(self.select(Some(id.clone())));
        self.input = InputState::Editing { id: id.clone(), original_key: key.clone(), draft: key.clone() };
        actions.push(Action::EditKeyRequested { id: id.clone(), key });
        actions
    }

    /// Replace the rename editor's contents.
    pub fn set_edit_draft(&mut self, text: impl Into<String>) {
        if let InputState::Editing { draft, .. } = &mut self.input {
            *draft = text.into();
        }
    }

    /// Confirm the rename. A blank draft leaves the key unchanged.
    pub fn commit_edit(&mut self) -> Vec<Action> {
        if !matches!(self.input, InputState::Editing { .. }) {
            return Vec::new();
        }
        let InputState::Editing { id, original_key, draft } = std::mem::take(&mut self.input) else {
            return Vec::new();
        };
        let key = draft.trim();
        if key.is_empty() || key == original_key {
            return vec![Action::RenderNeeded];
        }
        let partial = PartialField::key(key);
        if !self.registry.update_field(&id, &partial) {
            return Vec::new();
        }
        tracing::debug!(field_id = %id, from = %original_key, to = %key, "field renamed");
        vec![Action::FieldUpdated { id, fields: partial }, Action::RenderNeeded]
    }

    /// Discard the rename; the field keeps its original key.
    pub fn cancel_edit(&mut self) -> Vec<Action> {
        if !matches!(self.input, InputState::Editing { .. }) {
            return Vec::new();
        }
        self.input = InputState::Idle;
        vec![Action::RenderNeeded]
    }

    // --- Direct edits ---

    /// Edit key, type or font size from the properties panel. Rect changes go
    /// through pointer gestures and are ignored here, as is a blank key.
    pub fn set_field_props(&mut self, id: &FieldId, partial: PartialField) -> Vec<Action> {
        let key = partial
            .key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_owned);
        let partial = PartialField { key, rect: None, ..partial };
        if partial.is_empty() || !self.registry.update_field(id, &partial) {
            return Vec::new();
        }
        vec![Action::FieldUpdated { id: id.clone(), fields: partial }, Action::RenderNeeded]
    }

    /// Change the field type. Switching to checkbox keeps the stored font size.
    pub fn set_field_kind(&mut self, id: &FieldId, kind: FieldKind) -> Vec<Action> {
        self.set_field_props(id, PartialField { kind: Some(kind), ..Default::default() })
    }

    /// Delete a field, abandoning any gesture bound to it.
    pub fn delete_field(&mut self, id: &FieldId) -> Vec<Action> {
        if self.input.field_id() == Some(id) {
            self.input = InputState::Idle;
        }
        match self.registry.remove_field(id) {
            Some(_) => vec![Action::FieldDeleted { id: id.clone() }, Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    /// Copy the selected field's width and/or height onto every other field on
    /// its page. Positions are left as they are, even if the new size pushes a
    /// field past the page edge.
    pub fn apply_size_to_page(&mut self, axes: SizeAxes) -> Vec<Action> {
        let Some(source) = self.registry.selected_field() else {
            return Vec::new();
        };
        let source_id = source.id.clone();
        let page_number = source.page_number;
        let size = source.rect;

        let targets: Vec<(FieldId, FieldRect)> = self
            .registry
            .fields_on_page(page_number)
            .filter(|f| f.id != source_id)
            .map(|f| (f.id.clone(), f.rect))
            .collect();

        let mut actions = Vec::with_capacity(targets.len() + 1);
        for (id, mut rect) in targets {
            if axes.width() {
                rect.w = size.w;
            }
            if axes.height() {
                rect.h = size.h;
            }
            let partial = PartialField::rect(rect);
            if self.registry.update_field(&id, &partial) {
                actions.push(Action::FieldUpdated { id, fields: partial });
            }
        }
        tracing::debug!(page = page_number, updated = actions.len(), ?axes, "size applied to page");
        if !actions.is_empty() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Change the selection. Emits `SelectionChanged` only when it differs.
    pub fn select(&mut self, id: Option<FieldId>) -> Vec<Action> {
        let before = self.registry.selected().cloned();
        self.registry.set_selected(id);
        let after = self.registry.selected().cloned();
        if before == after {
            Vec::new()
        } else {
            vec![Action::SelectionChanged(after)]
        }
    }

    // --- Queries ---

    /// The currently selected field id, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&FieldId> {
        self.registry.selected()
    }

    /// Look up a field by id.
    #[must_use]
    pub fn field(&self, id: &FieldId) -> Option<&Field> {
        self.registry.get(id)
    }

    /// Rubber-band rect of the in-progress draw gesture, in page pixels.
    #[must_use]
    pub fn drawing_preview(&self) -> Option<(u32, PixelRect)> {
        let d = self.registry.drawing();
        d.active
            .then(|| (d.page_number, normalize_drag(d.start_x, d.start_y, d.current_x, d.current_y)))
    }

    /// First unused `field_N` key, counting from the number of fields plus one.
    #[must_use]
    pub fn next_default_key(&self) -> String {
        let mut n = self.registry.len() + 1;
        loop {
            let key = format!("{DEFAULT_KEY_PREFIX}{n}");
            if !self.registry.has_key(&key) {
                return key;
            }
            n += 1;
        }
    }

    // --- Internals ---

    fn page_dims(&self, page_number: u32) -> Option<PageDimensions> {
        self.registry
            .page_dimensions(page_number)
            .filter(|d| d.width > 0.0 && d.height > 0.0)
    }

    fn finish_drawing(&mut self) -> Vec<Action> {
        let InputState::Drawing { page } = self.input else {
            return Vec::new();
        };
        self.input = InputState::Idle;
        let d = self.registry.drawing();
        self.registry.reset_drawing();

        let rect = to_normalized(normalize_drag(d.start_x, d.start_y, d.current_x, d.current_y), page);
        let mut actions = vec![Action::SetCursor("default".to_owned())];
        if !is_viable_size(rect) {
            tracing::trace!(page = d.page_number, w = rect.w, h = rect.h, "draw gesture too small; discarded");
            actions.push(Action::RenderNeeded);
            return actions;
        }

        let field = Field::new(self.next_default_key(), d.page_number, rect);
        let id = field.id.clone();
        self.registry.add_field(field.clone());
        actions.push(Action::FieldCreated(field));
        actions.extend(self.select(Some(id)));
        actions.push(Action::RenderNeeded);
        actions
    }

    fn abandon_gesture(&mut self) {
        if matches!(self.input, InputState::Drawing { .. }) {
            self.registry.reset_drawing();
        }
        self.input = InputState::Idle;
    }
}

// =============================================================
// Drag geometry
// =============================================================

/// New pixel rect for a drag of `(dx, dy)` from `orig` in `mode`.
///
/// Each axis is clamped independently around the anchor the mode keeps fixed,
/// so a handle can never invert the rect or push it off the page.
#[must_use]
pub fn drag_rect(mode: DragMode, orig: PixelRect, dx: f64, dy: f64, page: PageDimensions) -> PixelRect {
    let (x, w) = match mode {
        DragMode::Move => (move_axis(orig.x, orig.w, dx, page.width), orig.w),
        DragMode::ResizeNw | DragMode::ResizeSw => resize_leading(orig.x, orig.w, dx, page.width),
        DragMode::ResizeNe | DragMode::ResizeSe => resize_trailing(orig.x, orig.w, dx, page.width),
    };
    let (y, h) = match mode {
        DragMode::Move => (move_axis(orig.y, orig.h, dy, page.height), orig.h),
        DragMode::ResizeNw | DragMode::ResizeNe => resize_leading(orig.y, orig.h, dy, page.height),
        DragMode::ResizeSw | DragMode::ResizeSe => resize_trailing(orig.y, orig.h, dy, page.height),
    };
    PixelRect::new(x, y, w, h)
}

/// Smallest size a resize may produce along an axis of length `dim`.
fn min_size_px(dim: f64) -> f64 {
    MIN_SIZE_PX.max(MIN_SIZE * dim).min(dim)
}

/// Translate within `[0, dim - size]`.
fn move_axis(pos: f64, size: f64, delta: f64, dim: f64) -> f64 {
    (pos + delta).min(dim - size).max(0.0)
}

/// Move the leading (left/top) edge; the trailing edge stays put.
fn resize_leading(pos: f64, size: f64, delta: f64, dim: f64) -> (f64, f64) {
    let fixed = (pos + size).min(dim);
    let new_pos = (pos + delta).min(fixed - min_size_px(dim)).max(0.0);
    (new_pos, fixed - new_pos)
}

/// Move the trailing (right/bottom) edge; the leading edge stays put.
fn resize_trailing(pos: f64, size: f64, delta: f64, dim: f64) -> (f64, f64) {
    let new_size = (size + delta).max(min_size_px(dim)).min(dim - pos).max(0.0);
    (pos, new_size)
}

fn clamp_to_page(pt: Point, page: PageDimensions) -> Point {
    Point::new(pt.x.max(0.0).min(page.width), pt.y.max(0.0).min(page.height))
}
