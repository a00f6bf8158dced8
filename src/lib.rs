//! Host-side pieces around the field engine: environment configuration, the
//! per-document editing session, and debounced preview rendering.

pub mod config;
pub mod preview;
pub mod session;
