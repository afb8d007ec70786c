//! Reporting aggregator
//!
//! Pure reads over the store: per-(student, course) stats, per-student
//! dashboards, and the per-course roster projection. Nothing here mutates
//! state, and presence is always derived from record existence at read
//! time, never cached.

use rollcall_api::{CourseStats, Presence, RosterReport, RosterRow};
use rollcall_store::{Course, Store};
use rollcall_util::{CourseId, Result, RollcallError, UserId};
use std::sync::Arc;

/// Read-side aggregation over attendance data.
pub struct Reporter {
    store: Arc<dyn Store>,
}

impl Reporter {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Attendance statistics for one student in one course.
    pub fn course_stats(&self, student_id: UserId, course_id: CourseId) -> Result<CourseStats> {
        let total = self.store.sessions_for_course(course_id)?.len();
        let present = self.store.present_count(student_id, course_id)?;
        Ok(CourseStats::from_counts(present, total))
    }

    /// A student's stats across every course they are enrolled in.
    pub fn student_summary(&self, student_id: UserId) -> Result<Vec<(Course, CourseStats)>> {
        let mut summary = Vec::new();
        for course in self.store.enrolled_courses(student_id)? {
            let stats = self.course_stats(student_id, course.id)?;
            summary.push((course, stats));
        }
        Ok(summary)
    }

    /// The full roster projection for a course.
    ///
    /// Columns are sessions in (date, id) ascending order; rows are
    /// enrolled students in name ascending order. Rendering (CSV or
    /// otherwise) is the caller's job.
    pub fn roster(&self, course_id: CourseId) -> Result<RosterReport> {
        let course = self
            .store
            .course(course_id)?
            .ok_or(RollcallError::CourseNotFound(course_id))?;

        let sessions = self.store.sessions_for_course(course_id)?;
        let students = self.store.enrolled_students(course_id)?;

        let mut rows = Vec::with_capacity(students.len());
        for student in students {
            let mut cells = Vec::with_capacity(sessions.len());
            for session in &sessions {
                let present = self.store.has_record(session.id, student.id)?;
                cells.push(if present {
                    Presence::Present
                } else {
                    Presence::Absent
                });
            }

            let present_count = cells.iter().filter(|c| **c == Presence::Present).count();
            let stats = CourseStats::from_counts(present_count, sessions.len());

            rows.push(RosterRow {
                student_id: student.id,
                student_name: student.name,
                matric_number: student.matric_number,
                cells,
                present_count,
                percentage: stats.percentage,
            });
        }

        Ok(RosterReport {
            course_id: course.id,
            course_code: course.code,
            course_title: course.title,
            session_dates: sessions.iter().map(|s| s.date).collect(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;
    use chrono::NaiveDate;
    use rollcall_store::SqliteStore;
    use rollcall_util::SessionId;

    struct Fixture {
        store: Arc<SqliteStore>,
        reporter: Reporter,
        course: CourseId,
        ada: UserId,
        zed: UserId,
    }

    fn fixture() -> Fixture {
        let store = crate::testutil::store();
        let dept = seed_department(store.as_ref(), "Computer Science");
        let lecturer = seed_lecturer(store.as_ref(), "jdoe");
        let course = seed_course(store.as_ref(), "CSC101", dept, 1, lecturer);
        let ada = seed_student(store.as_ref(), "UNI/CSC/21/0001", "Ada");
        let zed = seed_student(store.as_ref(), "UNI/CSC/21/0002", "Zed");
        store.enroll_in_courses(ada, &[course]).unwrap();
        store.enroll_in_courses(zed, &[course]).unwrap();

        Fixture {
            reporter: Reporter::new(store.clone()),
            store,
            course,
            ada,
            zed,
        }
    }

    fn held_session(f: &Fixture, day_of_month: u32) -> SessionId {
        let date = NaiveDate::from_ymd_opt(2024, 11, day_of_month).unwrap();
        let opened = f.store.open_session(f.course, date, ts(9), ts(10)).unwrap();
        f.store.close_session(opened.session.id).unwrap();
        opened.session.id
    }

    #[test]
    fn stats_two_of_three_sessions() {
        let f = fixture();
        let s1 = held_session(&f, 4);
        held_session(&f, 5);
        let s3 = held_session(&f, 6);

        f.store.insert_record(s1, f.ada, ts(9)).unwrap();
        f.store.insert_record(s3, f.ada, ts(9)).unwrap();

        let stats = f.reporter.course_stats(f.ada, f.course).unwrap();
        assert_eq!(stats.present_count, 2);
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.percentage, 66.7);
    }

    #[test]
    fn stats_with_no_sessions_is_zero() {
        let f = fixture();

        let stats = f.reporter.course_stats(f.ada, f.course).unwrap();
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.percentage, 0.0);
    }

    #[test]
    fn student_summary_lists_each_enrolled_course() {
        let f = fixture();
        held_session(&f, 4);

        let summary = f.reporter.student_summary(f.ada).unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].0.id, f.course);
        assert_eq!(summary[0].1.total_sessions, 1);
    }

    #[test]
    fn roster_orders_dates_and_names_ascending() {
        let f = fixture();
        // Held out of calendar order; the roster sorts by date
        held_session(&f, 6);
        let s1 = held_session(&f, 4);
        held_session(&f, 5);

        f.store.insert_record(s1, f.zed, ts(9)).unwrap();

        let roster = f.reporter.roster(f.course).unwrap();
        assert_eq!(roster.course_code, "CSC101");
        assert_eq!(
            roster.session_dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 11, 4).unwrap(),
                NaiveDate::from_ymd_opt(2024, 11, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 11, 6).unwrap(),
            ]
        );

        let names: Vec<&str> = roster.rows.iter().map(|r| r.student_name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Zed"]);

        // Zed was present in the first (earliest) session only
        let zed = &roster.rows[1];
        assert_eq!(
            zed.cells,
            vec![Presence::Present, Presence::Absent, Presence::Absent]
        );
        assert_eq!(zed.present_count, 1);
        assert_eq!(zed.percentage, 33.3);

        let ada = &roster.rows[0];
        assert_eq!(ada.present_count, 0);
        assert_eq!(ada.percentage, 0.0);
    }

    #[test]
    fn roster_for_unknown_course_rejected() {
        let f = fixture();

        let result = f.reporter.roster(CourseId::new(404));
        assert!(matches!(result, Err(RollcallError::CourseNotFound(_))));
    }
}
