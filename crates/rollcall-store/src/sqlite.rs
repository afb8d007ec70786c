//! SQLite-based store implementation

use chrono::{DateTime, NaiveDate, Utc};
use rollcall_api::Role;
use rollcall_util::{CourseId, DepartmentId, FacultyId, SessionId, UserId};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    AttendanceSession, AuditEvent, Course, Department, Faculty, NewCourse, NewUser, OpenedSession,
    Store, StoreError, StoreResult, User,
};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS faculties (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS departments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                faculty_id INTEGER NOT NULL REFERENCES faculties(id),
                levels INTEGER NOT NULL DEFAULT 4,
                UNIQUE (name, faculty_id)
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                matric_number TEXT UNIQUE,
                username TEXT UNIQUE,
                name TEXT NOT NULL,
                role TEXT NOT NULL,
                department_id INTEGER REFERENCES departments(id),
                current_level INTEGER
            );

            CREATE TABLE IF NOT EXISTS courses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                title TEXT NOT NULL,
                department_id INTEGER NOT NULL REFERENCES departments(id),
                level INTEGER NOT NULL,
                lecturer_id INTEGER NOT NULL REFERENCES users(id),
                UNIQUE (code, department_id, level)
            );

            CREATE TABLE IF NOT EXISTS enrollments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id INTEGER NOT NULL REFERENCES users(id),
                course_id INTEGER NOT NULL REFERENCES courses(id),
                UNIQUE (student_id, course_id)
            );

            CREATE TABLE IF NOT EXISTS attendance_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                course_id INTEGER NOT NULL REFERENCES courses(id),
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                is_open INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS attendance_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL REFERENCES attendance_sessions(id),
                student_id INTEGER NOT NULL REFERENCES users(id),
                timestamp TEXT NOT NULL,
                UNIQUE (session_id, student_id)
            );

            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- At most one open session per course, enforced by the storage layer
            CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_one_open
                ON attendance_sessions(course_id) WHERE is_open = 1;

            CREATE INDEX IF NOT EXISTS idx_enrollments_course ON enrollments(course_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_course ON attendance_sessions(course_id);
            CREATE INDEX IF NOT EXISTS idx_records_student ON attendance_records(student_id);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

/// Map a constraint violation to `AlreadyExists`, everything else through.
fn unique_or(e: rusqlite::Error, what: &str) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::AlreadyExists(what.to_string())
        }
        _ => StoreError::from(e),
    }
}

fn parse_utc(idx: usize, s: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_date(idx: usize, s: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_role(idx: usize, s: String) -> rusqlite::Result<Role> {
    Role::parse(&s).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown role: {s}").into(),
        )
    })
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::new(row.get(0)?),
        matric_number: row.get(1)?,
        username: row.get(2)?,
        name: row.get(3)?,
        role: parse_role(4, row.get(4)?)?,
        department_id: row.get::<_, Option<i64>>(5)?.map(DepartmentId::new),
        current_level: row.get(6)?,
    })
}

fn row_to_course(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: CourseId::new(row.get(0)?),
        code: row.get(1)?,
        title: row.get(2)?,
        department_id: DepartmentId::new(row.get(3)?),
        level: row.get(4)?,
        lecturer_id: UserId::new(row.get(5)?),
    })
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<AttendanceSession> {
    Ok(AttendanceSession {
        id: SessionId::new(row.get(0)?),
        course_id: CourseId::new(row.get(1)?),
        date: parse_date(2, row.get(2)?)?,
        start_time: parse_utc(3, row.get(3)?)?,
        end_time: parse_utc(4, row.get(4)?)?,
        is_open: row.get(5)?,
    })
}

fn row_to_department(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: DepartmentId::new(row.get(0)?),
        name: row.get(1)?,
        faculty_id: FacultyId::new(row.get(2)?),
        levels: row.get(3)?,
    })
}

const USER_COLS: &str = "id, matric_number, username, name, role, department_id, current_level";
const COURSE_COLS: &str = "id, code, title, department_id, level, lecturer_id";
const SESSION_COLS: &str = "id, course_id, date, start_time, end_time, is_open";

impl Store for SqliteStore {
    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());
            let event: crate::AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn insert_faculty(&self, name: &str) -> StoreResult<FacultyId> {
        let conn = self.conn.lock().unwrap();
        conn.execute("INSERT INTO faculties (name) VALUES (?)", [name])
            .map_err(|e| unique_or(e, name))?;
        Ok(FacultyId::new(conn.last_insert_rowid()))
    }

    fn faculties(&self) -> StoreResult<Vec<Faculty>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, name FROM faculties ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Faculty {
                id: FacultyId::new(row.get(0)?),
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn delete_faculty(&self, id: FacultyId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM faculties WHERE id = ?", [id.as_i64()])?;
        Ok(())
    }

    fn insert_department(
        &self,
        name: &str,
        faculty_id: FacultyId,
        levels: i32,
    ) -> StoreResult<DepartmentId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO departments (name, faculty_id, levels) VALUES (?, ?, ?)",
            params![name, faculty_id.as_i64(), levels],
        )
        .map_err(|e| unique_or(e, name))?;
        Ok(DepartmentId::new(conn.last_insert_rowid()))
    }

    fn departments_for_faculty(&self, faculty_id: FacultyId) -> StoreResult<Vec<Department>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, faculty_id, levels FROM departments WHERE faculty_id = ? ORDER BY name",
        )?;
        let rows = stmt.query_map([faculty_id.as_i64()], row_to_department)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn department(&self, id: DepartmentId) -> StoreResult<Option<Department>> {
        let conn = self.conn.lock().unwrap();
        let dept = conn
            .query_row(
                "SELECT id, name, faculty_id, levels FROM departments WHERE id = ?",
                [id.as_i64()],
                row_to_department,
            )
            .optional()?;
        Ok(dept)
    }

    fn department_by_name(&self, name: &str) -> StoreResult<Option<Department>> {
        let conn = self.conn.lock().unwrap();
        let dept = conn
            .query_row(
                "SELECT id, name, faculty_id, levels FROM departments WHERE name = ?",
                [name],
                row_to_department,
            )
            .optional()?;
        Ok(dept)
    }

    fn delete_department(&self, id: DepartmentId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM departments WHERE id = ?", [id.as_i64()])?;
        Ok(())
    }

    fn insert_course(&self, course: &NewCourse) -> StoreResult<CourseId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO courses (code, title, department_id, level, lecturer_id)
             VALUES (?, ?, ?, ?, ?)",
            params![
                course.code,
                course.title,
                course.department_id.as_i64(),
                course.level,
                course.lecturer_id.as_i64(),
            ],
        )
        .map_err(|e| unique_or(e, &course.code))?;
        Ok(CourseId::new(conn.last_insert_rowid()))
    }

    fn course(&self, id: CourseId) -> StoreResult<Option<Course>> {
        let conn = self.conn.lock().unwrap();
        let course = conn
            .query_row(
                &format!("SELECT {COURSE_COLS} FROM courses WHERE id = ?"),
                [id.as_i64()],
                row_to_course,
            )
            .optional()?;
        Ok(course)
    }

    fn courses_for_level(
        &self,
        department_id: DepartmentId,
        level: i32,
    ) -> StoreResult<Vec<Course>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COURSE_COLS} FROM courses WHERE department_id = ? AND level = ? ORDER BY code"
        ))?;
        let rows = stmt.query_map(params![department_id.as_i64(), level], row_to_course)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn courses_for_lecturer(&self, lecturer_id: UserId) -> StoreResult<Vec<Course>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COURSE_COLS} FROM courses WHERE lecturer_id = ? ORDER BY code"
        ))?;
        let rows = stmt.query_map([lecturer_id.as_i64()], row_to_course)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn courses_for_department(&self, department_id: DepartmentId) -> StoreResult<Vec<Course>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COURSE_COLS} FROM courses WHERE department_id = ? ORDER BY level, code"
        ))?;
        let rows = stmt.query_map([department_id.as_i64()], row_to_course)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn delete_course(&self, id: CourseId) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM enrollments WHERE course_id = ?", [id.as_i64()])?;
        tx.execute("DELETE FROM courses WHERE id = ?", [id.as_i64()])?;
        tx.commit()?;
        Ok(())
    }

    fn insert_user(&self, user: &NewUser) -> StoreResult<UserId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (matric_number, username, name, role, department_id, current_level)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                user.matric_number,
                user.username,
                user.name,
                user.role.as_str(),
                user.department_id.map(|d| d.as_i64()),
                user.current_level,
            ],
        )
        .map_err(|e| unique_or(e, &user.name))?;
        Ok(UserId::new(conn.last_insert_rowid()))
    }

    fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLS} FROM users WHERE id = ?"),
                [id.as_i64()],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    fn user_by_matric(&self, matric: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLS} FROM users WHERE matric_number = ?"),
                [matric],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    fn students(&self) -> StoreResult<Vec<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLS} FROM users WHERE role = 'student' ORDER BY name"
        ))?;
        let rows = stmt.query_map([], row_to_user)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn set_student_placement(
        &self,
        student_id: UserId,
        department_id: DepartmentId,
        level: i32,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET department_id = ?, current_level = ? WHERE id = ?",
            params![department_id.as_i64(), level, student_id.as_i64()],
        )?;
        debug!(student_id = %student_id, department_id = %department_id, level, "Placement set");
        Ok(())
    }

    fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM users WHERE id = ?", [id.as_i64()])?;
        Ok(())
    }

    fn delete_student_cascade(&self, student_id: UserId) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM attendance_records WHERE student_id = ?",
            [student_id.as_i64()],
        )?;
        tx.execute(
            "DELETE FROM enrollments WHERE student_id = ?",
            [student_id.as_i64()],
        )?;
        tx.execute("DELETE FROM users WHERE id = ?", [student_id.as_i64()])?;
        tx.commit()?;
        Ok(())
    }

    fn enroll_in_courses(&self, student_id: UserId, courses: &[CourseId]) -> StoreResult<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut added = 0;
        for course_id in courses {
            added += tx.execute(
                "INSERT INTO enrollments (student_id, course_id) VALUES (?, ?)
                 ON CONFLICT (student_id, course_id) DO NOTHING",
                params![student_id.as_i64(), course_id.as_i64()],
            )?;
        }
        tx.commit()?;

        if added > 0 {
            debug!(student_id = %student_id, added, "Enrollments added");
        }
        Ok(added)
    }

    fn is_enrolled(&self, student_id: UserId, course_id: CourseId) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM enrollments WHERE student_id = ? AND course_id = ?",
                params![student_id.as_i64(), course_id.as_i64()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn enrolled_students(&self, course_id: CourseId) -> StoreResult<Vec<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.matric_number, u.username, u.name, u.role, u.department_id, u.current_level
             FROM users u
             JOIN enrollments e ON e.student_id = u.id
             WHERE e.course_id = ?
             ORDER BY u.name",
        )?;
        let rows = stmt.query_map([course_id.as_i64()], row_to_user)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn enrolled_courses(&self, student_id: UserId) -> StoreResult<Vec<Course>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT c.id, c.code, c.title, c.department_id, c.level, c.lecturer_id
             FROM courses c
             JOIN enrollments e ON e.course_id = c.id
             WHERE e.student_id = ?
             ORDER BY c.code",
        )?;
        let rows = stmt.query_map([student_id.as_i64()], row_to_course)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn open_session(
        &self,
        course_id: CourseId,
        date: NaiveDate,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> StoreResult<OpenedSession> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        // Close-then-insert runs in one transaction so two concurrent opens
        // cannot both leave a session open; the partial unique index is the
        // backstop.
        let preempted: Option<i64> = tx
            .query_row(
                "SELECT id FROM attendance_sessions WHERE course_id = ? AND is_open = 1",
                [course_id.as_i64()],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = preempted {
            tx.execute(
                "UPDATE attendance_sessions SET is_open = 0 WHERE id = ?",
                [id],
            )?;
        }

        tx.execute(
            "INSERT INTO attendance_sessions (course_id, date, start_time, end_time, is_open)
             VALUES (?, ?, ?, ?, 1)",
            params![
                course_id.as_i64(),
                date.format("%Y-%m-%d").to_string(),
                start_time.to_rfc3339(),
                end_time.to_rfc3339(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(OpenedSession {
            session: AttendanceSession {
                id: SessionId::new(id),
                course_id,
                date,
                start_time,
                end_time,
                is_open: true,
            },
            preempted: preempted.map(SessionId::new),
        })
    }

    fn close_session(&self, session_id: SessionId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE attendance_sessions SET is_open = 0 WHERE id = ?",
            [session_id.as_i64()],
        )?;
        Ok(())
    }

    fn session(&self, id: SessionId) -> StoreResult<Option<AttendanceSession>> {
        let conn = self.conn.lock().unwrap();
        let session = conn
            .query_row(
                &format!("SELECT {SESSION_COLS} FROM attendance_sessions WHERE id = ?"),
                [id.as_i64()],
                row_to_session,
            )
            .optional()?;
        Ok(session)
    }

    fn open_session_for_course(
        &self,
        course_id: CourseId,
    ) -> StoreResult<Option<AttendanceSession>> {
        let conn = self.conn.lock().unwrap();
        let session = conn
            .query_row(
                &format!(
                    "SELECT {SESSION_COLS} FROM attendance_sessions
                     WHERE course_id = ? AND is_open = 1"
                ),
                [course_id.as_i64()],
                row_to_session,
            )
            .optional()?;
        Ok(session)
    }

    fn sessions_for_course(&self, course_id: CourseId) -> StoreResult<Vec<AttendanceSession>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLS} FROM attendance_sessions
             WHERE course_id = ? ORDER BY date, id"
        ))?;
        let rows = stmt.query_map([course_id.as_i64()], row_to_session)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn insert_record(
        &self,
        session_id: SessionId,
        student_id: UserId,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT INTO attendance_records (session_id, student_id, timestamp)
             VALUES (?, ?, ?)
             ON CONFLICT (session_id, student_id) DO NOTHING",
            params![
                session_id.as_i64(),
                student_id.as_i64(),
                timestamp.to_rfc3339(),
            ],
        )?;
        Ok(inserted == 1)
    }

    fn has_record(&self, session_id: SessionId, student_id: UserId) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM attendance_records WHERE session_id = ? AND student_id = ?",
                params![session_id.as_i64(), student_id.as_i64()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn present_count(&self, student_id: UserId, course_id: CourseId) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*)
             FROM attendance_records r
             JOIN attendance_sessions s ON r.session_id = s.id
             WHERE r.student_id = ? AND s.course_id = ?",
            params![student_id.as_i64(), course_id.as_i64()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuditEventType;
    use chrono::TimeZone;

    fn test_store() -> SqliteStore {
        SqliteStore::in_memory().unwrap()
    }

    fn seed_department(store: &SqliteStore) -> DepartmentId {
        let faculty = store.insert_faculty("Science").unwrap();
        store.insert_department("Computer Science", faculty, 4).unwrap()
    }

    fn seed_lecturer(store: &SqliteStore) -> UserId {
        store
            .insert_user(&NewUser {
                matric_number: None,
                username: Some("jdoe".into()),
                name: "J. Doe".into(),
                role: Role::Lecturer,
                department_id: None,
                current_level: None,
            })
            .unwrap()
    }

    fn seed_student(store: &SqliteStore, matric: &str, name: &str) -> UserId {
        store
            .insert_user(&NewUser {
                matric_number: Some(matric.into()),
                username: None,
                name: name.into(),
                role: Role::Student,
                department_id: None,
                current_level: None,
            })
            .unwrap()
    }

    fn seed_course(store: &SqliteStore, code: &str) -> CourseId {
        let dept = seed_department(store);
        let lecturer = seed_lecturer(store);
        store
            .insert_course(&NewCourse {
                code: code.into(),
                title: "Intro".into(),
                department_id: dept,
                level: 1,
                lecturer_id: lecturer,
            })
            .unwrap()
    }

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 4, h, 0, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 4).unwrap()
    }

    #[test]
    fn test_in_memory_store() {
        let store = test_store();
        assert!(store.is_healthy());
    }

    #[test]
    fn test_audit_log() {
        let store = test_store();

        store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStarted))
            .unwrap();

        let events = store.recent_audits(10).unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].event, AuditEventType::ServiceStarted));
    }

    #[test]
    fn duplicate_faculty_name_rejected() {
        let store = test_store();
        store.insert_faculty("Science").unwrap();

        let result = store.insert_faculty("Science");
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
    }

    #[test]
    fn duplicate_course_triple_rejected() {
        let store = test_store();
        let dept = seed_department(&store);
        let lecturer = seed_lecturer(&store);
        let new_course = NewCourse {
            code: "CSC101".into(),
            title: "Intro".into(),
            department_id: dept,
            level: 1,
            lecturer_id: lecturer,
        };

        store.insert_course(&new_course).unwrap();
        assert!(matches!(
            store.insert_course(&new_course),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn enroll_in_courses_is_idempotent() {
        let store = test_store();
        let course = seed_course(&store, "CSC101");
        let student = seed_student(&store, "uni/csc/21/0001", "Ada");

        let added = store.enroll_in_courses(student, &[course]).unwrap();
        assert_eq!(added, 1);

        let added = store.enroll_in_courses(student, &[course]).unwrap();
        assert_eq!(added, 0);

        assert!(store.is_enrolled(student, course).unwrap());
        assert_eq!(store.enrolled_students(course).unwrap().len(), 1);
    }

    #[test]
    fn enrolled_students_ordered_by_name() {
        let store = test_store();
        let course = seed_course(&store, "CSC101");
        let zed = seed_student(&store, "uni/csc/21/0002", "Zed");
        let ada = seed_student(&store, "uni/csc/21/0001", "Ada");
        store.enroll_in_courses(zed, &[course]).unwrap();
        store.enroll_in_courses(ada, &[course]).unwrap();

        let names: Vec<String> = store
            .enrolled_students(course)
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["Ada", "Zed"]);
    }

    #[test]
    fn open_session_preempts_existing_open() {
        let store = test_store();
        let course = seed_course(&store, "CSC101");

        let first = store.open_session(course, day(), ts(9), ts(10)).unwrap();
        assert!(first.preempted.is_none());

        let second = store.open_session(course, day(), ts(11), ts(12)).unwrap();
        assert_eq!(second.preempted, Some(first.session.id));

        // Exactly one open session remains, and it is the new one
        let open = store.open_session_for_course(course).unwrap().unwrap();
        assert_eq!(open.id, second.session.id);

        let first_reloaded = store.session(first.session.id).unwrap().unwrap();
        assert!(!first_reloaded.is_open);
    }

    #[test]
    fn close_session_is_idempotent() {
        let store = test_store();
        let course = seed_course(&store, "CSC101");
        let opened = store.open_session(course, day(), ts(9), ts(10)).unwrap();

        store.close_session(opened.session.id).unwrap();
        store.close_session(opened.session.id).unwrap();

        assert!(store.open_session_for_course(course).unwrap().is_none());
    }

    #[test]
    fn insert_record_deduplicates() {
        let store = test_store();
        let course = seed_course(&store, "CSC101");
        let student = seed_student(&store, "uni/csc/21/0001", "Ada");
        let opened = store.open_session(course, day(), ts(9), ts(10)).unwrap();

        assert!(store.insert_record(opened.session.id, student, ts(9)).unwrap());
        assert!(!store.insert_record(opened.session.id, student, ts(9)).unwrap());

        assert!(store.has_record(opened.session.id, student).unwrap());
        assert_eq!(store.present_count(student, course).unwrap(), 1);
    }

    #[test]
    fn present_count_spans_sessions() {
        let store = test_store();
        let course = seed_course(&store, "CSC101");
        let student = seed_student(&store, "uni/csc/21/0001", "Ada");

        let s1 = store.open_session(course, day(), ts(9), ts(10)).unwrap();
        let s2 = store.open_session(course, day(), ts(11), ts(12)).unwrap();
        let s3 = store.open_session(course, day(), ts(13), ts(14)).unwrap();

        store.insert_record(s1.session.id, student, ts(9)).unwrap();
        store.insert_record(s3.session.id, student, ts(13)).unwrap();
        let _ = s2;

        assert_eq!(store.present_count(student, course).unwrap(), 2);
        assert_eq!(store.sessions_for_course(course).unwrap().len(), 3);
    }

    #[test]
    fn delete_student_cascade_removes_traces() {
        let store = test_store();
        let course = seed_course(&store, "CSC101");
        let student = seed_student(&store, "uni/csc/21/0001", "Ada");
        store.enroll_in_courses(student, &[course]).unwrap();
        let opened = store.open_session(course, day(), ts(9), ts(10)).unwrap();
        store.insert_record(opened.session.id, student, ts(9)).unwrap();

        store.delete_student_cascade(student).unwrap();

        assert!(store.user(student).unwrap().is_none());
        assert!(store.enrolled_students(course).unwrap().is_empty());
        assert!(!store.has_record(opened.session.id, student).unwrap());
    }

    #[test]
    fn store_persists_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollcall.db");

        let course;
        {
            let store = SqliteStore::open(&path).unwrap();
            course = seed_course(&store, "CSC101");
            store.open_session(course, day(), ts(9), ts(10)).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.sessions_for_course(course).unwrap().len(), 1);
    }
}
