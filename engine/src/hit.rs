#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::HANDLE_RADIUS_PX;
use crate::input::Corner;
use crate::registry::{FieldId, FieldRegistry};
use crate::transform::{PixelRect, Point, contains_point, to_pixels};

/// Which part of a field was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(Corner),
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub field_id: FieldId,
    pub part: HitPart,
}

/// Test which field (if any) is under `pt` on `page_number`.
///
/// Handles of the selected field win over any body, so a handle that overlaps
/// a neighbouring field still resizes. Bodies are tested topmost-first, i.e.
/// in reverse draw order. Pages without known dimensions never hit.
#[must_use]
pub fn hit_test(pt: Point, page_number: u32, registry: &FieldRegistry) -> Option<Hit> {
    let dims = registry.page_dimensions(page_number)?;

    if let Some(selected) = registry.selected_field().filter(|f| f.page_number == page_number) {
        let rect = to_pixels(selected.rect, dims);
        if let Some(corner) = handle_at(rect, pt) {
            return Some(Hit { field_id: selected.id.clone(), part: HitPart::ResizeHandle(corner) });
        }
    }

    registry
        .fields_on_page(page_number)
        .rev()
        .find(|f| {
            let rect = to_pixels(f.rect, dims);
            contains_point(rect, pt.x, pt.y)
        })
        .map(|f| Hit { field_id: f.id.clone(), part: HitPart::Body })
}

/// The corner handle of `rect` within slop of `pt`, if any.
#[must_use]
pub fn handle_at(rect: PixelRect, pt: Point) -> Option<Corner> {
    Corner::ALL.into_iter().find(|corner| {
        let c = corner.position(rect);
        (pt.x - c.x).abs() <= HANDLE_RADIUS_PX && (pt.y - c.y).abs() <= HANDLE_RADIUS_PX
    })
}
