//! Error types for rollcall
//!
//! Every failure here is locally recoverable; the worst outcome is a
//! rejected single request.

use thiserror::Error;

use crate::{CourseId, SessionId, UserId};

/// Core error type for rollcall operations
#[derive(Debug, Error)]
pub enum RollcallError {
    #[error("Course not found: {0}")]
    CourseNotFound(CourseId),

    #[error("Attendance session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Attendance session is closed")]
    SessionClosed,

    #[error("Not enrolled in this course")]
    NotEnrolled,

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    StoreError(String),
}

impl RollcallError {
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RollcallError>;
