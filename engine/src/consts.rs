//! Shared numeric constants for the engine crate.

// ── Geometry ────────────────────────────────────────────────────

/// Minimum field width/height in normalized units (1% of the page dimension).
pub const MIN_SIZE: f64 = 0.01;

/// Floor applied to field sizes during resize, in screen pixels.
///
/// The effective floor on a page is the larger of this and `MIN_SIZE` of the
/// page dimension, so a resized field never drops below `MIN_SIZE`.
pub const MIN_SIZE_PX: f64 = 10.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for corner resize handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

// ── Overlay generation ──────────────────────────────────────────

/// Inset from the field box edges, in document points.
pub const PADDING: f64 = 2.0;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Font sizes in document points.
pub const FONT_SMALL_PT: f64 = 7.0;
pub const FONT_MEDIUM_PT: f64 = 9.0;
pub const FONT_LARGE_PT: f64 = 12.0;

// ── Template schema ─────────────────────────────────────────────

/// Schema version written on export.
pub const TEMPLATE_VERSION: &str = "1.0";

/// Prefix for auto-generated field keys (`field_1`, `field_2`, ...).
pub const DEFAULT_KEY_PREFIX: &str = "field_";
