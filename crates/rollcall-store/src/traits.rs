//! Store trait definitions

use chrono::{DateTime, NaiveDate, Utc};
use rollcall_util::{CourseId, DepartmentId, FacultyId, SessionId, UserId};

use crate::{
    AttendanceSession, AuditEvent, Course, Department, Faculty, NewCourse, NewUser, StoreResult,
    User,
};

/// Result of the open-session transaction: the new open session, plus the
/// id of the session it retired, if one was open.
#[derive(Debug, Clone)]
pub struct OpenedSession {
    pub session: AttendanceSession,
    pub preempted: Option<SessionId>,
}

/// Main store trait
pub trait Store: Send + Sync {
    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Catalog: faculties and departments

    /// Insert a faculty; name is unique
    fn insert_faculty(&self, name: &str) -> StoreResult<FacultyId>;

    /// All faculties
    fn faculties(&self) -> StoreResult<Vec<Faculty>>;

    /// Delete a faculty row (precondition checks happen in the catalog)
    fn delete_faculty(&self, id: FacultyId) -> StoreResult<()>;

    /// Insert a department; (name, faculty) is unique
    fn insert_department(&self, name: &str, faculty_id: FacultyId, levels: i32)
        -> StoreResult<DepartmentId>;

    /// Departments belonging to a faculty
    fn departments_for_faculty(&self, faculty_id: FacultyId) -> StoreResult<Vec<Department>>;

    /// Look up a department by id
    fn department(&self, id: DepartmentId) -> StoreResult<Option<Department>>;

    /// Look up a department by name (used by matric resolution and import)
    fn department_by_name(&self, name: &str) -> StoreResult<Option<Department>>;

    /// Delete a department row
    fn delete_department(&self, id: DepartmentId) -> StoreResult<()>;

    // Catalog: courses

    /// Insert a course; (code, department, level) is unique
    fn insert_course(&self, course: &NewCourse) -> StoreResult<CourseId>;

    /// Look up a course by id
    fn course(&self, id: CourseId) -> StoreResult<Option<Course>>;

    /// Courses offered by a department at a level
    fn courses_for_level(&self, department_id: DepartmentId, level: i32)
        -> StoreResult<Vec<Course>>;

    /// Courses assigned to a lecturer
    fn courses_for_lecturer(&self, lecturer_id: UserId) -> StoreResult<Vec<Course>>;

    /// All courses offered by a department, any level
    fn courses_for_department(&self, department_id: DepartmentId) -> StoreResult<Vec<Course>>;

    /// Delete a course row along with its enrollments
    fn delete_course(&self, id: CourseId) -> StoreResult<()>;

    // Users

    /// Insert a user; matric number and username are unique when present
    fn insert_user(&self, user: &NewUser) -> StoreResult<UserId>;

    /// Look up a user by id
    fn user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Look up a user by matric number
    fn user_by_matric(&self, matric: &str) -> StoreResult<Option<User>>;

    /// All students
    fn students(&self) -> StoreResult<Vec<User>>;

    /// Set a student's resolved (department, level)
    fn set_student_placement(
        &self,
        student_id: UserId,
        department_id: DepartmentId,
        level: i32,
    ) -> StoreResult<()>;

    /// Delete a staff user row
    fn delete_user(&self, id: UserId) -> StoreResult<()>;

    /// Delete a student along with their enrollments and attendance
    /// records, in one transaction
    fn delete_student_cascade(&self, student_id: UserId) -> StoreResult<()>;

    // Enrollment

    /// Insert-if-absent enrollments for one student across the given
    /// courses, in one transaction. Returns how many were actually added.
    fn enroll_in_courses(&self, student_id: UserId, courses: &[CourseId]) -> StoreResult<usize>;

    /// Whether the student holds an enrollment for the course
    fn is_enrolled(&self, student_id: UserId, course_id: CourseId) -> StoreResult<bool>;

    /// Enrolled students of a course, ordered by name ascending
    fn enrolled_students(&self, course_id: CourseId) -> StoreResult<Vec<User>>;

    /// Courses a student is enrolled in
    fn enrolled_courses(&self, student_id: UserId) -> StoreResult<Vec<Course>>;

    // Attendance sessions

    /// Close any open session for the course and insert a new open one,
    /// atomically.
    fn open_session(
        &self,
        course_id: CourseId,
        date: NaiveDate,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> StoreResult<OpenedSession>;

    /// Mark a session closed. Idempotent.
    fn close_session(&self, session_id: SessionId) -> StoreResult<()>;

    /// Look up a session by id
    fn session(&self, id: SessionId) -> StoreResult<Option<AttendanceSession>>;

    /// The currently open session for a course, if any
    fn open_session_for_course(&self, course_id: CourseId)
        -> StoreResult<Option<AttendanceSession>>;

    /// All sessions of a course, ordered by (date, id) ascending
    fn sessions_for_course(&self, course_id: CourseId) -> StoreResult<Vec<AttendanceSession>>;

    // Attendance records

    /// Insert a presence record if absent. Returns true when a row was
    /// actually inserted, false when the pair already existed.
    fn insert_record(
        &self,
        session_id: SessionId,
        student_id: UserId,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Whether a record exists for (session, student)
    fn has_record(&self, session_id: SessionId, student_id: UserId) -> StoreResult<bool>;

    /// Number of sessions of the course in which the student was present
    fn present_count(&self, student_id: UserId, course_id: CourseId) -> StoreResult<usize>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
