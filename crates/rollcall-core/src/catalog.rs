//! Catalog administration
//!
//! Admin-only mutations of the academic catalog. Deletions check
//! referential preconditions and reject with a descriptive error rather
//! than cascading, except student removal, which deliberately takes the
//! student's enrollments and attendance records with it.

use rollcall_api::{Principal, Role};
use rollcall_store::{
    AuditEvent, AuditEventType, Course, Department, Faculty, NewCourse, NewUser, Store, User,
};
use rollcall_util::{CourseId, DepartmentId, FacultyId, Result, RollcallError, UserId};
use std::sync::Arc;
use tracing::info;

/// Administrative operations on faculties, departments, courses and people.
pub struct Catalog {
    store: Arc<dyn Store>,
}

impl Catalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn faculties(&self) -> Result<Vec<Faculty>> {
        Ok(self.store.faculties()?)
    }

    pub fn departments(&self, faculty_id: FacultyId) -> Result<Vec<Department>> {
        Ok(self.store.departments_for_faculty(faculty_id)?)
    }

    pub fn add_faculty(&self, who: &Principal, name: &str) -> Result<FacultyId> {
        require_admin(who)?;
        let name = non_empty(name, "faculty name")?;

        let id = self.store.insert_faculty(name)?;
        info!(faculty_id = %id, name, "Faculty added");
        Ok(id)
    }

    /// Remove a faculty. Rejected while it still has departments.
    pub fn remove_faculty(&self, who: &Principal, id: FacultyId) -> Result<()> {
        require_admin(who)?;

        if !self.store.departments_for_faculty(id)?.is_empty() {
            return Err(RollcallError::precondition(
                "faculty still has departments",
            ));
        }

        self.store.delete_faculty(id)?;
        info!(faculty_id = %id, "Faculty removed");
        Ok(())
    }

    pub fn add_department(
        &self,
        who: &Principal,
        name: &str,
        faculty_id: FacultyId,
        levels: i32,
    ) -> Result<DepartmentId> {
        require_admin(who)?;
        let name = non_empty(name, "department name")?;
        if levels < 1 {
            return Err(RollcallError::validation("program length must be >= 1"));
        }

        let id = self.store.insert_department(name, faculty_id, levels)?;
        info!(department_id = %id, name, levels, "Department added");
        Ok(id)
    }

    /// Remove a department. Rejected while it still offers courses.
    pub fn remove_department(&self, who: &Principal, id: DepartmentId) -> Result<()> {
        require_admin(who)?;

        if !self.store.courses_for_department(id)?.is_empty() {
            return Err(RollcallError::precondition(
                "department still offers courses",
            ));
        }

        self.store.delete_department(id)?;
        info!(department_id = %id, "Department removed");
        Ok(())
    }

    pub fn add_course(&self, who: &Principal, course: NewCourse) -> Result<CourseId> {
        require_admin(who)?;
        non_empty(&course.code, "course code")?;
        non_empty(&course.title, "course title")?;

        let department = self
            .store
            .department(course.department_id)?
            .ok_or_else(|| RollcallError::validation("unknown department"))?;
        if course.level < 1 || course.level > department.levels {
            return Err(RollcallError::validation(format!(
                "level must be within 1..={}",
                department.levels
            )));
        }

        let lecturer = self.lecturer(course.lecturer_id)?;

        let id = self.store.insert_course(&course)?;
        info!(course_id = %id, code = %course.code, lecturer = %lecturer.name, "Course added");
        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::CourseAdded {
                course_id: id,
                code: course.code.clone(),
            }));

        Ok(id)
    }

    /// Remove a course and its enrollments. Rejected once attendance
    /// sessions have been held, so history stays intact.
    pub fn remove_course(&self, who: &Principal, id: CourseId) -> Result<()> {
        require_admin(who)?;

        if !self.store.sessions_for_course(id)?.is_empty() {
            return Err(RollcallError::precondition(
                "course has recorded attendance sessions",
            ));
        }

        self.store.delete_course(id)?;
        info!(course_id = %id, "Course removed");
        Ok(())
    }

    pub fn add_lecturer(&self, who: &Principal, username: &str, name: &str) -> Result<UserId> {
        require_admin(who)?;
        let username = non_empty(username, "username")?;
        let name = non_empty(name, "name")?;

        let id = self.store.insert_user(&NewUser {
            matric_number: None,
            username: Some(username.to_string()),
            name: name.to_string(),
            role: Role::Lecturer,
            department_id: None,
            current_level: None,
        })?;
        info!(user_id = %id, username, "Lecturer added");
        Ok(id)
    }

    /// Remove a lecturer. Rejected while they still have assigned courses.
    pub fn remove_lecturer(&self, who: &Principal, id: UserId) -> Result<()> {
        require_admin(who)?;
        self.lecturer(id)?;

        if !self.store.courses_for_lecturer(id)?.is_empty() {
            return Err(RollcallError::precondition(
                "lecturer still has assigned courses",
            ));
        }

        self.store.delete_user(id)?;
        info!(user_id = %id, "Lecturer removed");
        Ok(())
    }

    pub fn add_student(&self, who: &Principal, name: &str, matric_number: &str) -> Result<UserId> {
        require_admin(who)?;
        let name = non_empty(name, "name")?;
        let matric_number = non_empty(matric_number, "matric number")?;

        let id = self.store.insert_user(&NewUser {
            matric_number: Some(matric_number.to_string()),
            username: None,
            name: name.to_string(),
            role: Role::Student,
            department_id: None,
            current_level: None,
        })?;
        info!(user_id = %id, matric_number, "Student added");
        Ok(id)
    }

    /// Remove a student together with their enrollments and attendance
    /// records, in one store transaction.
    pub fn remove_student(&self, who: &Principal, id: UserId) -> Result<()> {
        require_admin(who)?;

        let student = self
            .store
            .user(id)?
            .ok_or(RollcallError::UserNotFound(id))?;
        if student.role != Role::Student {
            return Err(RollcallError::validation("user is not a student"));
        }

        self.store.delete_student_cascade(id)?;
        info!(user_id = %id, "Student removed");
        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::StudentRemoved {
                student_id: id,
            }));

        Ok(())
    }

    pub fn courses_for_lecturer(&self, lecturer_id: UserId) -> Result<Vec<Course>> {
        Ok(self.store.courses_for_lecturer(lecturer_id)?)
    }

    fn lecturer(&self, id: UserId) -> Result<User> {
        let user = self
            .store
            .user(id)?
            .ok_or(RollcallError::UserNotFound(id))?;
        if user.role != Role::Lecturer {
            return Err(RollcallError::validation("user is not a lecturer"));
        }
        Ok(user)
    }
}

fn require_admin(who: &Principal) -> Result<()> {
    if !who.role.can_manage_catalog() {
        return Err(RollcallError::permission(
            "catalog changes require the admin role",
        ));
    }
    Ok(())
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RollcallError::validation(format!("{what} must not be empty")));
    }
    Ok(trimmed)
}
