//! Shared utilities for rollcall
//!
//! This crate provides:
//! - ID types (UserId, CourseId, SessionId, ...)
//! - The academic calendar (session cutover, level derivation)
//! - Matriculation-number parsing
//! - Error types
//! - Default paths for config and data directories

mod calendar;
mod error;
mod ids;
mod matric;
mod paths;

pub use calendar::*;
pub use error::*;
pub use ids::*;
pub use matric::*;
pub use paths::*;
