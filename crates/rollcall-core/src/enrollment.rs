//! Enrollment derivation
//!
//! Enrollments are derived, not chosen: a student placed at (department,
//! level) is enrolled in every course the department offers at that level.
//! Derivation only ever adds rows. A course added mid-session reaches
//! existing students on their next sync; dropping a course never removes
//! an enrollment.

use chrono::NaiveDate;
use rollcall_api::{ImportRow, ImportSummary};
use rollcall_store::{AuditEvent, AuditEventType, NewUser, Store, User};
use rollcall_util::{AcademicCalendar, MatricCodeTable, Result, RollcallError, UserId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Derives and maintains enrollments from student placement.
pub struct EnrollmentSync {
    store: Arc<dyn Store>,
    calendar: AcademicCalendar,
    codes: MatricCodeTable,
}

impl EnrollmentSync {
    pub fn new(store: Arc<dyn Store>, calendar: AcademicCalendar, codes: MatricCodeTable) -> Self {
        Self {
            store,
            calendar,
            codes,
        }
    }

    /// Bring one student's enrollments up to date with their placement.
    ///
    /// Students without a resolved (department, level) are skipped silently;
    /// an unresolved placement is a normal state, not an error. Returns the
    /// number of enrollments added (0 when already in sync).
    pub fn sync_student(&self, student_id: UserId) -> Result<usize> {
        let student = self.student(student_id)?;

        let Some((department_id, level)) = student.placement() else {
            debug!(student_id = %student_id, "Placement unresolved, skipping derivation");
            return Ok(0);
        };

        let courses = self.store.courses_for_level(department_id, level)?;
        let course_ids: Vec<_> = courses.iter().map(|c| c.id).collect();
        let added = self.store.enroll_in_courses(student_id, &course_ids)?;

        if added > 0 {
            info!(student_id = %student_id, added, "Enrollments derived");
            let _ = self
                .store
                .append_audit(AuditEvent::new(AuditEventType::EnrollmentsSynced {
                    student_id,
                    added,
                }));
        }

        Ok(added)
    }

    /// Login-time funnel: resolve placement from the matric number if still
    /// unresolved, then sync. Called on every student login, so placement
    /// and enrollments converge without administrative action.
    pub fn resolve_and_sync(&self, student_id: UserId, as_of: NaiveDate) -> Result<usize> {
        let student = self.student(student_id)?;

        if student.placement().is_none() {
            if let Some(matric) = &student.matric_number {
                let parsed = self.codes.parse(matric);
                match (parsed.department.as_deref(), parsed.entry_year) {
                    (Some(dept_name), Some(entry_year)) => {
                        if let Some(dept) = self.store.department_by_name(dept_name)? {
                            let level = self.calendar.level_for(entry_year, false, as_of);
                            self.store.set_student_placement(student_id, dept.id, level)?;
                            info!(
                                student_id = %student_id,
                                department = dept_name,
                                level,
                                "Placement resolved from matric number"
                            );
                        } else {
                            debug!(
                                student_id = %student_id,
                                department = dept_name,
                                "Matric department not in catalog"
                            );
                        }
                    }
                    _ => {
                        debug!(student_id = %student_id, "Matric number did not resolve");
                    }
                }
            }
        }

        self.sync_student(student_id)
    }

    /// Administrative sweep: sync every student. Returns the total number
    /// of enrollments added.
    pub fn sync_all(&self) -> Result<usize> {
        let mut added = 0;
        for student in self.store.students()? {
            added += self.sync_student(student.id)?;
        }

        info!(added, "Bulk enrollment sync finished");
        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::SyncAllCompleted { added }));

        Ok(added)
    }

    /// Bulk student import.
    ///
    /// Each row is handled independently; a bad row lands in the error list
    /// and the rest proceed. A matric number already on file counts as
    /// skipped, but its placement is refreshed and its enrollments synced,
    /// so re-importing a roster is safe.
    pub fn import(&self, rows: &[ImportRow], as_of: NaiveDate) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for row in rows {
            match self.import_row(row, as_of) {
                Ok(true) => summary.added += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    warn!(matric = %row.matric_number, error = %e, "Import row failed");
                    summary.errors.push(format!("{}: {e}", row.matric_number));
                }
            }
        }

        info!(
            added = summary.added,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "Import finished"
        );
        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::ImportCompleted {
                added: summary.added,
                skipped: summary.skipped,
                errors: summary.errors.len(),
            }));

        Ok(summary)
    }

    /// Returns true when a new student was inserted, false when the matric
    /// number already existed.
    fn import_row(&self, row: &ImportRow, as_of: NaiveDate) -> Result<bool> {
        let department = self
            .store
            .department_by_name(&row.department)?
            .ok_or_else(|| {
                RollcallError::validation(format!("unknown department: {}", row.department))
            })?;

        let level = self.calendar.level_for(row.entry_year, row.transfer, as_of);

        if let Some(existing) = self.store.user_by_matric(&row.matric_number)? {
            self.store
                .set_student_placement(existing.id, department.id, level)?;
            self.sync_student(existing.id)?;
            return Ok(false);
        }

        let student_id = self.store.insert_user(&NewUser {
            matric_number: Some(row.matric_number.clone()),
            username: None,
            name: row.name.clone(),
            role: rollcall_api::Role::Student,
            department_id: Some(department.id),
            current_level: Some(level),
        })?;
        self.sync_student(student_id)?;

        Ok(true)
    }

    fn student(&self, student_id: UserId) -> Result<User> {
        self.store
            .user(student_id)?
            .ok_or(RollcallError::UserNotFound(student_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    fn sync(store: Arc<rollcall_store::SqliteStore>) -> EnrollmentSync {
        EnrollmentSync::new(store, AcademicCalendar::default(), MatricCodeTable::builtin())
    }

    #[test]
    fn derivation_is_monotonic_and_idempotent() {
        let store = crate::testutil::store();
        let dept = seed_department(store.as_ref(), "Computer Science");
        let lecturer = seed_lecturer(store.as_ref(), "jdoe");
        seed_course(store.as_ref(), "CSC101", dept, 1, lecturer);
        seed_course(store.as_ref(), "CSC102", dept, 1, lecturer);
        seed_course(store.as_ref(), "CSC201", dept, 2, lecturer);
        let student = seed_placed_student(store.as_ref(), "UNI/CSC/24/0001", "Ada", dept, 1);

        let sync = sync(store.clone());
        assert_eq!(sync.sync_student(student).unwrap(), 2);
        assert_eq!(sync.sync_student(student).unwrap(), 0);

        // A course added later is picked up on the next sync; nothing is removed
        seed_course(store.as_ref(), "CSC103", dept, 1, lecturer);
        assert_eq!(sync.sync_student(student).unwrap(), 1);
        assert_eq!(store.enrolled_courses(student).unwrap().len(), 3);
    }

    #[test]
    fn unresolved_placement_skips_silently() {
        let store = crate::testutil::store();
        let student = seed_student(store.as_ref(), "UNI/CSC/24/0001", "Ada");

        let sync = sync(store.clone());
        assert_eq!(sync.sync_student(student).unwrap(), 0);
        assert!(store.enrolled_courses(student).unwrap().is_empty());
    }

    #[test]
    fn login_funnel_resolves_placement_from_matric() {
        let store = crate::testutil::store();
        let dept = seed_department(store.as_ref(), "Computer Science");
        let lecturer = seed_lecturer(store.as_ref(), "jdoe");
        seed_course(store.as_ref(), "CSC401", dept, 4, lecturer);
        let student = seed_student(store.as_ref(), "UNI/CSC/21/0001", "Ada");

        let sync = sync(store.clone());
        // November 2024, entry 2021: level 4
        assert_eq!(sync.resolve_and_sync(student, day()).unwrap(), 1);

        let placed = store.user(student).unwrap().unwrap();
        assert_eq!(placed.placement(), Some((dept, 4)));
    }

    #[test]
    fn login_funnel_tolerates_unparseable_matric() {
        let store = crate::testutil::store();
        let student = seed_student(store.as_ref(), "not-a-matric", "Ada");

        let sync = sync(store.clone());
        assert_eq!(sync.resolve_and_sync(student, day()).unwrap(), 0);
        assert!(store.user(student).unwrap().unwrap().placement().is_none());
    }

    #[test]
    fn sync_all_covers_every_student() {
        let store = crate::testutil::store();
        let dept = seed_department(store.as_ref(), "Computer Science");
        let lecturer = seed_lecturer(store.as_ref(), "jdoe");
        seed_course(store.as_ref(), "CSC101", dept, 1, lecturer);
        seed_placed_student(store.as_ref(), "UNI/CSC/24/0001", "Ada", dept, 1);
        seed_placed_student(store.as_ref(), "UNI/CSC/24/0002", "Grace", dept, 1);
        seed_student(store.as_ref(), "UNI/CSC/24/0003", "Unplaced");

        let sync = sync(store);
        assert_eq!(sync.sync_all().unwrap(), 2);
        assert_eq!(sync.sync_all().unwrap(), 0);
    }

    #[test]
    fn import_isolates_bad_rows() {
        let store = crate::testutil::store();
        let dept = seed_department(store.as_ref(), "Computer Science");
        let lecturer = seed_lecturer(store.as_ref(), "jdoe");
        let course = seed_course(store.as_ref(), "CSC401", dept, 4, lecturer);

        let rows = vec![
            ImportRow {
                name: "Ada".into(),
                matric_number: "UNI/CSC/21/0001".into(),
                entry_year: 2021,
                department: "Computer Science".into(),
                transfer: false,
            },
            ImportRow {
                name: "Bad".into(),
                matric_number: "UNI/XXX/21/0002".into(),
                entry_year: 2021,
                department: "Underwater Basketry".into(),
                transfer: false,
            },
        ];

        let sync = sync(store.clone());
        let summary = sync.import(&rows, day()).unwrap();
        assert_eq!(summary.added, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.errors.len(), 1);

        let ada = store.user_by_matric("UNI/CSC/21/0001").unwrap().unwrap();
        assert_eq!(ada.placement(), Some((dept, 4)));
        assert!(store.is_enrolled(ada.id, course).unwrap());
    }

    #[test]
    fn import_refreshes_existing_students() {
        let store = crate::testutil::store();
        let dept = seed_department(store.as_ref(), "Computer Science");
        seed_placed_student(store.as_ref(), "UNI/CSC/21/0001", "Ada", dept, 1);

        let rows = vec![ImportRow {
            name: "Ada".into(),
            matric_number: "UNI/CSC/21/0001".into(),
            entry_year: 2021,
            department: "Computer Science".into(),
            transfer: false,
        }];

        let sync = sync(store.clone());
        let summary = sync.import(&rows, day()).unwrap();
        assert_eq!(summary.added, 0);
        assert_eq!(summary.skipped, 1);

        // Placement recomputed for the current session
        let ada = store.user_by_matric("UNI/CSC/21/0001").unwrap().unwrap();
        assert_eq!(ada.placement(), Some((dept, 4)));
    }

    #[test]
    fn import_applies_transfer_credit() {
        let store = crate::testutil::store();
        seed_department(store.as_ref(), "Computer Science");

        let rows = vec![ImportRow {
            name: "Grace".into(),
            matric_number: "UNI/CSC/21/0002".into(),
            entry_year: 2021,
            department: "Computer Science".into(),
            transfer: true,
        }];

        let sync = sync(store.clone());
        sync.import(&rows, day()).unwrap();

        let grace = store.user_by_matric("UNI/CSC/21/0002").unwrap().unwrap();
        // One year of standing credit on top of level 4
        assert_eq!(grace.current_level, Some(5));
    }
}
