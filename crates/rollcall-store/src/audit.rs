//! Audit event types

use chrono::{DateTime, NaiveDate, Utc};
use rollcall_util::{CourseId, SessionId, UserId};
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Attendance session opened by its lecturer
    SessionOpened {
        session_id: SessionId,
        course_id: CourseId,
        date: NaiveDate,
        end_time: DateTime<Utc>,
    },

    /// An open session was retired because a new one opened for the course
    SessionPreempted {
        session_id: SessionId,
        course_id: CourseId,
    },

    /// Attendance session closed explicitly
    SessionClosed {
        session_id: SessionId,
        course_id: CourseId,
    },

    /// Student self-reported presence
    PresenceMarked {
        session_id: SessionId,
        student_id: UserId,
    },

    /// Enrollment derivation ran for one student
    EnrollmentsSynced { student_id: UserId, added: usize },

    /// Administrative sync over all students
    SyncAllCompleted { added: usize },

    /// Bulk student import finished
    ImportCompleted {
        added: usize,
        skipped: usize,
        errors: usize,
    },

    /// Course added to the catalog
    CourseAdded { course_id: CourseId, code: String },

    /// Student account removed (with enrollments and records)
    StudentRemoved { student_id: UserId },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID (assigned by the store)
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: Utc::now(),
            event,
        }
    }
}
