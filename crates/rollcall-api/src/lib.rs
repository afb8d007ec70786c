//! Shared types for the rollcall API surface
//!
//! Types here cross crate boundaries: principals handed in by the identity
//! provider, projections handed out to report renderers, and rows handed in
//! by the CSV importer.

mod types;

pub use types::*;
