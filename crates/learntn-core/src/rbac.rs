//! Role capabilities and ownership
//!
//! Two separate predicates:
//!
//! - **Role gate** (operation-level): the caller's role must be a member of the
//!   operation's allowed set. Administrators pass only where the set names them.
//! - **Ownership** (resource-level): the caller's id must equal the resource
//!   owner's id. There is no administrator override.

use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::Role;

const LEARNER: &[Role] = &[Role::Learner];
const STAFF: &[Role] = &[Role::Instructor, Role::Administrator];
const ANY: &[Role] = &[Role::Learner, Role::Instructor, Role::Administrator];

/// Gated operations exposed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    StartLesson,
    CompleteLesson,
    ViewCourseProgress,
    ViewLeaderboard,
    ViewProfile,
    Logout,
    Enroll,
    DropCourse,
    ListEnrollments,
    ViewRoster,
    SummarizeLesson,
}

impl Operation {
    /// Roles allowed to perform this operation
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Operation::StartLesson
            | Operation::CompleteLesson
            | Operation::ViewCourseProgress
            | Operation::Enroll
            | Operation::DropCourse
            | Operation::ListEnrollments => LEARNER,
            Operation::ViewRoster => STAFF,
            Operation::ViewLeaderboard
            | Operation::ViewProfile
            | Operation::Logout
            | Operation::SummarizeLesson => ANY,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::StartLesson => "start_lesson",
            Operation::CompleteLesson => "complete_lesson",
            Operation::ViewCourseProgress => "view_course_progress",
            Operation::ViewLeaderboard => "view_leaderboard",
            Operation::ViewProfile => "view_profile",
            Operation::Logout => "logout",
            Operation::Enroll => "enroll",
            Operation::DropCourse => "drop_course",
            Operation::ListEnrollments => "list_enrollments",
            Operation::ViewRoster => "view_roster",
            Operation::SummarizeLesson => "summarize_lesson",
        };
        f.write_str(name)
    }
}

/// Role-set membership check
pub fn check_role(role: Role, allowed: &[Role]) -> Result<(), CoreError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(CoreError::RoleDenied {
            role,
            allowed: allowed.to_vec(),
        })
    }
}

/// Resource ownership check
pub fn check_owner(actor: Uuid, owner: Uuid) -> Result<(), CoreError> {
    if actor == owner {
        Ok(())
    } else {
        Err(CoreError::NotOwner { actor, owner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_operations_are_learner_only() {
        for op in [Operation::StartLesson, Operation::CompleteLesson, Operation::ViewCourseProgress] {
            assert!(check_role(Role::Learner, op.allowed_roles()).is_ok());
            assert!(check_role(Role::Instructor, op.allowed_roles()).is_err());
            assert!(check_role(Role::Administrator, op.allowed_roles()).is_err());
        }
    }

    #[test]
    fn test_leaderboard_open_to_every_role() {
        for role in [Role::Learner, Role::Instructor, Role::Administrator] {
            assert!(check_role(role, Operation::ViewLeaderboard.allowed_roles()).is_ok());
        }
    }

    #[test]
    fn test_roster_gate_names_administrator() {
        assert!(check_role(Role::Administrator, Operation::ViewRoster.allowed_roles()).is_ok());
        assert!(check_role(Role::Instructor, Operation::ViewRoster.allowed_roles()).is_ok());
        assert!(check_role(Role::Learner, Operation::ViewRoster.allowed_roles()).is_err());
    }

    #[test]
    fn test_role_denied_reports_allowed_set() {
        let err = check_role(Role::Learner, STAFF).unwrap_err();
        assert_eq!(
            err,
            CoreError::RoleDenied {
                role: Role::Learner,
                allowed: vec![Role::Instructor, Role::Administrator],
            }
        );
    }

    #[test]
    fn test_ownership_has_no_override() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert!(check_owner(owner, owner).is_ok());
        assert!(matches!(check_owner(other, owner), Err(CoreError::NotOwner { .. })));
    }
}
