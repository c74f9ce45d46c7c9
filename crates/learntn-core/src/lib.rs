//! # LearnTn Core
//!
//! Domain records and pure rules for the LearnTn identity & progression engine.
//!
//! ## Key Concepts
//!
//! - **Identity**: a learner, instructor or administrator with cumulative XP,
//!   a derived level and a single refresh-credential slot
//! - **Enrollment**: a student's registration in a course
//! - **Progress**: a student's completion record for one lesson
//! - **Level**: a tier derived deterministically from cumulative XP
//!
//! ## Invariants
//!
//! 1. An identity's level is always `level_for(xp)`
//! 2. At most one progress row exists per (student, lesson), and it moves from
//!    started to completed at most once
//! 3. Role gates (operation-level) and ownership checks (resource-level) are
//!    separate predicates

pub mod error;
pub mod level;
pub mod rbac;
pub mod types;

pub use error::{CoreError, Result};
pub use level::{level_for, xp_threshold, XpAward, XP_PER_LEVEL};
pub use rbac::{check_owner, check_role, Operation};
pub use types::{
    leaderboard_order, CourseFact, Enrollment, EnrollmentStatus, Identity, IdentitySummary,
    LessonFact, Progress, ProgressState, Role,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
