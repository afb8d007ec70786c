//! Attendance session engine

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rollcall_api::Principal;
use rollcall_store::{
    AttendanceSession, AuditEvent, AuditEventType, Course, OpenedSession, Store,
};
use rollcall_util::{CourseId, Result, RollcallError, SessionId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a mark-present request. Both variants are success: a
/// duplicate mark changes nothing and is reported as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Recorded,
    AlreadyMarked,
}

/// The attendance session engine
///
/// Owns the open/close/mark transitions. Session state lives entirely in
/// the store; the engine adds authorization, audit, and the preemption
/// rule (opening a session retires the course's previous open one).
pub struct AttendanceEngine {
    store: Arc<dyn Store>,
}

impl AttendanceEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Open an attendance window for a course.
    ///
    /// Only the lecturer assigned to the course may open one. If the course
    /// already has an open session it is closed first; both steps run in a
    /// single store transaction, so at no point are two sessions open.
    pub fn open_session(
        &self,
        who: &Principal,
        course_id: CourseId,
        date: NaiveDate,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<OpenedSession> {
        let course = self.owned_course(who, course_id)?;

        let opened = self
            .store
            .open_session(course.id, date, now, now + duration)?;

        if let Some(preempted) = opened.preempted {
            warn!(
                course_id = %course.id,
                session_id = %preempted,
                "Open session preempted by a new one"
            );
            let _ = self
                .store
                .append_audit(AuditEvent::new(AuditEventType::SessionPreempted {
                    session_id: preempted,
                    course_id: course.id,
                }));
        }

        info!(
            course_id = %course.id,
            session_id = %opened.session.id,
            %date,
            "Attendance session opened"
        );
        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::SessionOpened {
                session_id: opened.session.id,
                course_id: course.id,
                date,
                end_time: opened.session.end_time,
            }));

        Ok(opened)
    }

    /// Close an attendance session. Idempotent: closing an already-closed
    /// session is a no-op.
    pub fn close_session(&self, who: &Principal, session_id: SessionId) -> Result<()> {
        let session = self.session(session_id)?;
        self.owned_course(who, session.course_id)?;

        if !session.is_open {
            debug!(session_id = %session_id, "Close requested for a closed session");
            return Ok(());
        }

        self.store.close_session(session_id)?;

        info!(session_id = %session_id, course_id = %session.course_id, "Attendance session closed");
        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::SessionClosed {
                session_id,
                course_id: session.course_id,
            }));

        Ok(())
    }

    /// Record the caller as present in an open session.
    ///
    /// The caller must be a student enrolled in the session's course, and
    /// the session must still be open. A second mark for the same session
    /// succeeds without changing anything.
    pub fn mark_present(
        &self,
        who: &Principal,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<MarkOutcome> {
        if !who.role.can_mark_present() {
            return Err(RollcallError::permission(
                "only students mark themselves present",
            ));
        }

        let session = self.session(session_id)?;
        if !session.is_open {
            return Err(RollcallError::SessionClosed);
        }

        if !self.store.is_enrolled(who.id, session.course_id)? {
            return Err(RollcallError::NotEnrolled);
        }

        let inserted = self.store.insert_record(session_id, who.id, now)?;
        if !inserted {
            debug!(session_id = %session_id, student_id = %who.id, "Duplicate presence mark");
            return Ok(MarkOutcome::AlreadyMarked);
        }

        info!(session_id = %session_id, student_id = %who.id, "Presence marked");
        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::PresenceMarked {
                session_id,
                student_id: who.id,
            }));

        Ok(MarkOutcome::Recorded)
    }

    fn session(&self, session_id: SessionId) -> Result<AttendanceSession> {
        self.store
            .session(session_id)?
            .ok_or(RollcallError::SessionNotFound(session_id))
    }

    /// Fetch a course and check the caller is its assigned lecturer.
    fn owned_course(&self, who: &Principal, course_id: CourseId) -> Result<Course> {
        if !who.role.can_run_sessions() {
            return Err(RollcallError::permission(
                "only lecturers manage attendance sessions",
            ));
        }

        let course = self
            .store
            .course(course_id)?
            .ok_or(RollcallError::CourseNotFound(course_id))?;

        if course.lecturer_id != who.id {
            return Err(RollcallError::permission(
                "course is assigned to another lecturer",
            ));
        }

        Ok(course)
    }
}
