//! Strongly-typed identifiers for rollcall
//!
//! Every id wraps the database rowid of its table. Keeping them as distinct
//! types prevents a student id from being handed to a course lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! rowid_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

rowid_type!(
    /// Identifies a user of any role (admin, lecturer, student)
    UserId
);
rowid_type!(
    /// Identifies a faculty
    FacultyId
);
rowid_type!(
    /// Identifies a department within a faculty
    DepartmentId
);
rowid_type!(
    /// Identifies a course
    CourseId
);
rowid_type!(
    /// Identifies an enrollment (student, course) pair
    EnrollmentId
);
rowid_type!(
    /// Identifies an attendance session
    SessionId
);
rowid_type!(
    /// Identifies an attendance record (session, student) pair
    RecordId
);
