//! Row types for the rollcall schema

use chrono::{DateTime, NaiveDate, Utc};
use rollcall_api::Role;
use rollcall_util::{CourseId, DepartmentId, FacultyId, RecordId, SessionId, UserId};
use serde::{Deserialize, Serialize};

/// A faculty; owns departments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faculty {
    pub id: FacultyId,
    pub name: String,
}

/// A department within a faculty. `levels` is the program length in years.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub faculty_id: FacultyId,
    pub levels: i32,
}

/// A user of any role. Students carry a matric number; staff a username.
/// `department_id` and `current_level` stay unresolved until first-login
/// resolution or manual assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub matric_number: Option<String>,
    pub username: Option<String>,
    pub name: String,
    pub role: Role,
    pub department_id: Option<DepartmentId>,
    pub current_level: Option<i32>,
}

impl User {
    /// A student whose (department, level) is fully resolved.
    pub fn placement(&self) -> Option<(DepartmentId, i32)> {
        match (self.department_id, self.current_level) {
            (Some(dept), Some(level)) => Some((dept, level)),
            _ => None,
        }
    }
}

/// Fields for inserting a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub matric_number: Option<String>,
    pub username: Option<String>,
    pub name: String,
    pub role: Role,
    pub department_id: Option<DepartmentId>,
    pub current_level: Option<i32>,
}

/// A course: unique per (code, department, level), one assigned lecturer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub title: String,
    pub department_id: DepartmentId,
    pub level: i32,
    pub lecturer_id: UserId,
}

/// Fields for inserting a new course.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub code: String,
    pub title: String,
    pub department_id: DepartmentId,
    pub level: i32,
    pub lecturer_id: UserId,
}

/// An attendance window for one course session.
///
/// `end_time` is advisory display metadata; the authoritative open/closed
/// state is `is_open`. Sessions never auto-expire by wall clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub id: SessionId,
    pub course_id: CourseId,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_open: bool,
}

/// Proof that a student self-reported presence in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: RecordId,
    pub session_id: SessionId,
    pub student_id: UserId,
    pub timestamp: DateTime<Utc>,
}
