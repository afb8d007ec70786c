//! Shared types for rollcall

use chrono::NaiveDate;
use rollcall_util::{CourseId, UserId};
use serde::{Deserialize, Serialize};

/// Role supplied by the external identity provider.
///
/// The core trusts this role for every authorization check; authentication
/// itself happens outside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Lecturer,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Lecturer => "lecturer",
            Role::Student => "student",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "lecturer" => Some(Role::Lecturer),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    pub fn can_manage_catalog(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_run_sessions(&self) -> bool {
        matches!(self, Role::Lecturer)
    }

    pub fn can_mark_present(&self) -> bool {
        matches!(self, Role::Student)
    }
}

/// An authenticated principal: who is acting, and as what.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}

/// Per-(student, course) attendance statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourseStats {
    pub present_count: usize,
    pub total_sessions: usize,
    /// Percentage present, rounded to one decimal place. 0 when no sessions.
    pub percentage: f64,
}

impl CourseStats {
    pub fn from_counts(present_count: usize, total_sessions: usize) -> Self {
        let percentage = if total_sessions > 0 {
            round1(present_count as f64 / total_sessions as f64 * 100.0)
        } else {
            0.0
        };

        Self {
            present_count,
            total_sessions,
            percentage,
        }
    }
}

/// Round to one decimal place.
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Presence determination for one (student, session) cell.
///
/// Presence is the existence of an attendance record; absence is the lack
/// of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Presence::Present => "Present",
            Presence::Absent => "Absent",
        }
    }
}

/// One roster row: a student's presence across every session of a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterRow {
    pub student_id: UserId,
    pub student_name: String,
    pub matric_number: Option<String>,
    /// One cell per session, in the report's session order
    pub cells: Vec<Presence>,
    pub present_count: usize,
    pub percentage: f64,
}

/// Per-course roster projection, CSV-ready.
///
/// Columns are sessions in creation-date ascending order; rows are enrolled
/// students in name ascending order. Rendering is the caller's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterReport {
    pub course_id: CourseId,
    pub course_code: String,
    pub course_title: String,
    pub session_dates: Vec<NaiveDate>,
    pub rows: Vec<RosterRow>,
}

/// One row of a bulk student import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRow {
    pub name: String,
    pub matric_number: String,
    pub entry_year: i32,
    pub department: String,
    #[serde(default)]
    pub transfer: bool,
}

/// Outcome of a bulk import: per-row failures are isolated, never fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub added: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}
