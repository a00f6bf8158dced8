use super::*;
use crate::registry::Field;
use crate::transform::{FieldRect, PageDimensions};

fn registry_with_page() -> FieldRegistry {
    let mut reg = FieldRegistry::new();
    reg.set_page_dimensions(1, PageDimensions::new(600.0, 800.0));
    reg
}

fn add(reg: &mut FieldRegistry, page: u32, rect: FieldRect) -> FieldId {
    let field = Field::new("k", page, rect);
    let id = field.id.clone();
    reg.add_field(field);
    id
}

// =============================================================
// handle_at
// =============================================================

#[test]
fn handle_at_each_corner() {
    let rect = PixelRect::new(100.0, 100.0, 200.0, 100.0);
    assert_eq!(handle_at(rect, Point::new(101.0, 99.0)), Some(Corner::Nw));
    assert_eq!(handle_at(rect, Point::new(300.0, 105.0)), Some(Corner::Ne));
    assert_eq!(handle_at(rect, Point::new(95.0, 200.0)), Some(Corner::Sw));
    assert_eq!(handle_at(rect, Point::new(307.0, 207.0)), Some(Corner::Se));
}

#[test]
fn handle_at_center_is_none() {
    let rect = PixelRect::new(100.0, 100.0, 200.0, 100.0);
    assert_eq!(handle_at(rect, Point::new(200.0, 150.0)), None);
}

#[test]
fn handle_at_outside_slop_is_none() {
    let rect = PixelRect::new(100.0, 100.0, 200.0, 100.0);
    assert_eq!(handle_at(rect, Point::new(100.0 - HANDLE_RADIUS_PX - 0.5, 100.0)), None);
}

// =============================================================
// hit_test
// =============================================================

#[test]
fn hit_body() {
    let mut reg = registry_with_page();
    let id = add(&mut reg, 1, FieldRect::new(0.1, 0.1, 0.5, 0.1));
    let hit = hit_test(Point::new(200.0, 120.0), 1, &reg).unwrap();
    assert_eq!(hit, Hit { field_id: id, part: HitPart::Body });
}

#[test]
fn hit_empty_area() {
    let mut reg = registry_with_page();
    add(&mut reg, 1, FieldRect::new(0.1, 0.1, 0.1, 0.1));
    assert!(hit_test(Point::new(500.0, 700.0), 1, &reg).is_none());
}

#[test]
fn hit_ignores_other_pages() {
    let mut reg = registry_with_page();
    reg.set_page_dimensions(2, PageDimensions::new(600.0, 800.0));
    add(&mut reg, 2, FieldRect::new(0.0, 0.0, 1.0, 1.0));
    assert!(hit_test(Point::new(300.0, 300.0), 1, &reg).is_none());
}

#[test]
fn hit_without_page_dimensions() {
    let mut reg = FieldRegistry::new();
    add(&mut reg, 1, FieldRect::new(0.0, 0.0, 1.0, 1.0));
    assert!(hit_test(Point::new(1.0, 1.0), 1, &reg).is_none());
}

#[test]
fn hit_topmost_wins() {
    let mut reg = registry_with_page();
    add(&mut reg, 1, FieldRect::new(0.0, 0.0, 0.5, 0.5));
    let top = add(&mut reg, 1, FieldRect::new(0.1, 0.1, 0.5, 0.5));
    let hit = hit_test(Point::new(150.0, 150.0), 1, &reg).unwrap();
    assert_eq!(hit.field_id, top);
}

#[test]
fn handles_only_for_selected_field() {
    let mut reg = registry_with_page();
    let id = add(&mut reg, 1, FieldRect::new(0.1, 0.1, 0.5, 0.1));
    // Se corner of the field sits at (360, 160).
    let hit = hit_test(Point::new(360.0, 160.0), 1, &reg).unwrap();
    assert_eq!(hit.part, HitPart::Body);

    reg.set_selected(Some(id.clone()));
    let hit = hit_test(Point::new(360.0, 160.0), 1, &reg).unwrap();
    assert_eq!(hit, Hit { field_id: id, part: HitPart::ResizeHandle(Corner::Se) });
}

#[test]
fn selected_handle_beats_overlapping_body() {
    let mut reg = registry_with_page();
    let below = add(&mut reg, 1, FieldRect::new(0.1, 0.1, 0.2, 0.1));
    add(&mut reg, 1, FieldRect::new(0.25, 0.15, 0.3, 0.3));
    reg.set_selected(Some(below.clone()));
    // Se corner of `below` at (180, 160), inside the upper field.
    let hit = hit_test(Point::new(180.0, 160.0), 1, &reg).unwrap();
    assert_eq!(hit, Hit { field_id: below, part: HitPart::ResizeHandle(Corner::Se) });
}
