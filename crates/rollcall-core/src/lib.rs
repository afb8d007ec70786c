//! Core engines for rollcall
//!
//! This crate is the heart of the system, containing:
//! - The attendance session state machine (open -> marked -> closed)
//! - Enrollment derivation from (department, level) placement
//! - Catalog administration (faculties, departments, courses, people)
//! - Reporting aggregation (per-course stats, student summaries, rosters)
//!
//! Authentication happens outside; every operation takes a `Principal`
//! from the caller and trusts its role.

mod catalog;
mod engine;
mod enrollment;
mod report;

pub use catalog::*;
pub use engine::*;
pub use enrollment::*;
pub use report::*;

#[cfg(test)]
pub(crate) mod testutil;
