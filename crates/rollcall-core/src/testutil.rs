//! Shared fixtures for core tests

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rollcall_api::{Principal, Role};
use rollcall_store::{NewCourse, NewUser, SqliteStore, Store};
use rollcall_util::{CourseId, DepartmentId, UserId};
use std::sync::Arc;

pub fn store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::in_memory().unwrap())
}

pub fn seed_department(store: &dyn Store, name: &str) -> DepartmentId {
    let faculty = store.insert_faculty(&format!("Faculty of {name}")).unwrap();
    store.insert_department(name, faculty, 4).unwrap()
}

pub fn seed_lecturer(store: &dyn Store, username: &str) -> UserId {
    store
        .insert_user(&NewUser {
            matric_number: None,
            username: Some(username.into()),
            name: username.to_string(),
            role: Role::Lecturer,
            department_id: None,
            current_level: None,
        })
        .unwrap()
}

pub fn seed_student(store: &dyn Store, matric: &str, name: &str) -> UserId {
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

pub fn seed_placed_student(
    store: &dyn Store,
    matric: &str,
    name: &str,
    department: DepartmentId,
    level: i32,
) -> UserId {
    let id = seed_student(store, matric, name);
    store.set_student_placement(id, department, level).unwrap();
    id
}

pub fn seed_course(
    store: &dyn Store,
    code: &str,
    department: DepartmentId,
    level: i32,
    lecturer: UserId,
) -> CourseId {
    store
        .insert_course(&NewCourse {
            code: code.into(),
            title: format!("{code} title"),
            department_id: department,
            level,
            lecturer_id: lecturer,
        })
        .unwrap()
}

pub fn admin() -> Principal {
    Principal::new(UserId::new(999), Role::Admin)
}

pub fn as_lecturer(id: UserId) -> Principal {
    Principal::new(id, Role::Lecturer)
}

pub fn as_student(id: UserId) -> Principal {
    Principal::new(id, Role::Student)
}

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, 4).unwrap()
}

pub fn ts(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 4, hour, 0, 0).unwrap()
}
