//! Field annotation engine for fillable document templates.
//!
//! The crate owns everything between a rendered page image and a list of
//! drawing instructions: mapping pointer input onto normalized field
//! rectangles, keeping the field registry for one editing session, and
//! turning fields plus a data record into page-scoped overlay instructions.
//! Decoding and rasterizing documents is left to the host; output is handed
//! to a [`render::DocumentRenderer`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Interaction state machine ([`engine::Editor`]) and [`engine::Action`]s |
//! | [`registry`] | Field types and the session's [`registry::FieldRegistry`] |
//! | [`transform`] | Pixel, normalized and document-point conversions |
//! | [`input`] | Input event types and gesture state |
//! | [`hit`] | Hit-testing fields and resize handles |
//! | [`record`] | Parsing generation data records |
//! | [`overlay`] | Overlay instruction generation |
//! | [`template`] | Persisted template schema |
//! | [`render`] | Renderer boundary trait and the JSON renderer |
//! | [`consts`] | Shared constants (minimum sizes, padding, font sizes) |

pub mod consts;
pub mod engine;
pub mod hit;
pub mod input;
pub mod overlay;
pub mod record;
pub mod registry;
pub mod render;
pub mod template;
pub mod transform;
