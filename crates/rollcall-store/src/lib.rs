//! Persistence layer for rollcall
//!
//! Provides:
//! - The academic catalog (faculties, departments, courses, users)
//! - Enrollments (set-insert semantics, never duplicated)
//! - Attendance sessions and records
//! - Audit log (append-only)
//!
//! Uniqueness invariants live in the schema: unique enrollment pairs,
//! unique record pairs, and a partial unique index guaranteeing at most
//! one open session per course.

mod audit;
mod models;
mod sqlite;
mod traits;

pub use audit::*;
pub use models::*;
pub use sqlite::*;
pub use traits::*;

use rollcall_util::RollcallError;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<StoreError> for RollcallError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::AlreadyExists(what) => RollcallError::AlreadyExists(what),
            other => RollcallError::StoreError(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
