//! Input model: buttons, keys, drag modes, and the gesture state machine states.
//!
//! `InputState` is the active gesture tracked between pointer-down and
//! pointer-up (or the open rename editor). Each variant carries the context
//! needed to compute the next registry mutation. Only one variant can be live
//! at a time, which is what keeps drawing, dragging and renaming mutually
//! exclusive.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::registry::FieldId;
use crate::transform::{PageDimensions, PixelRect, Point};

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button.
    Middle,
    /// Right mouse button.
    Secondary,
}

/// A keyboard key, as named by the host (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// One of the four corner handles of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Corner {
    /// All corners, in handle hit-test order.
    pub const ALL: [Corner; 4] = [Corner::Nw, Corner::Ne, Corner::Sw, Corner::Se];

    /// Pixel position of this corner on `rect`.
    #[must_use]
    pub fn position(self, rect: PixelRect) -> Point {
        match self {
            Self::Nw => Point::new(rect.x, rect.y),
            Self::Ne => Point::new(rect.right(), rect.y),
            Self::Sw => Point::new(rect.x, rect.bottom()),
            Self::Se => Point::new(rect.right(), rect.bottom()),
        }
    }
}

/// What a pointer drag on an existing field does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Move,
    ResizeNw,
    ResizeNe,
    ResizeSw,
    ResizeSe,
}

impl DragMode {
    /// The resize mode driven by a corner handle.
    #[must_use]
    pub fn resize(corner: Corner) -> Self {
        match corner {
            Corner::Nw => Self::ResizeNw,
            Corner::Ne => Self::ResizeNe,
            Corner::Sw => Self::ResizeSw,
            Corner::Se => Self::ResizeSe,
        }
    }

    /// CSS cursor name for hover feedback.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::ResizeNw | Self::ResizeSe => "nwse-resize",
            Self::ResizeNe | Self::ResizeSw => "nesw-resize",
        }
    }
}

/// Which dimensions a bulk "apply to page" copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeAxes {
    Width,
    Height,
    Both,
}

impl SizeAxes {
    #[must_use]
    pub fn width(self) -> bool {
        matches!(self, Self::Width | Self::Both)
    }

    #[must_use]
    pub fn height(self) -> bool {
        matches!(self, Self::Height | Self::Both)
    }
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Drawing a new field; positions live in the registry's `DrawingState`.
    Drawing {
        /// Rendered size of the page being drawn on.
        page: PageDimensions,
    },
    /// Moving or resizing an existing field.
    Dragging {
        /// Id of the field being dragged.
        id: FieldId,
        /// Move or which corner.
        mode: DragMode,
        /// Pointer position at pointer-down, in page pixels.
        origin: Point,
        /// Field rect at pointer-down, in page pixels.
        orig: PixelRect,
        /// Rendered size of the field's page.
        page: PageDimensions,
    },
    /// Renaming a field's key.
    Editing {
        /// Id of the field being renamed.
        id: FieldId,
        /// Key before editing started; restored on cancel.
        original_key: String,
        /// Current contents of the editor.
        draft: String,
    },
}

impl InputState {
    /// Id of the field a drag or edit is bound to.
    #[must_use]
    pub fn field_id(&self) -> Option<&FieldId> {
        match self {
            Self::Dragging { id, .. } | Self::Editing { id, .. } => Some(id),
            Self::Idle | Self::Drawing { .. } => None,
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
