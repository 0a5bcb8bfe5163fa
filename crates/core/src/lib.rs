//! # MRP Core
//!
//! Core logic of the Medical Report Portal, independent of the HTTP layer.
//!
//! Handles:
//! - The session-scoped Result Store (one analysis document per session,
//!   last write wins, evicted on inactivity)
//! - The typed results view-model (`Section`) and the rules that project an
//!   analysis document onto it
//! - HTML rendering with escaping applied at a single chokepoint
//! - The portal error taxonomy
//!
//! Used by `api-rest`; knows nothing about axum or the upstream service.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod render;
pub mod store;
pub mod view;

pub use error::PortalError;
pub use store::ResultStore;
pub use view::{build_sections, Section};
