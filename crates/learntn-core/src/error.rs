//! Error types for the LearnTn domain layer

use thiserror::Error;
use uuid::Uuid;

use crate::types::Role;

/// Result type alias using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by pure domain rules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Role name outside the closed enumeration
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Enrollment status name outside the closed enumeration
    #[error("Unknown enrollment status: {0}")]
    UnknownStatus(String),

    /// Role is not a member of the allowed set for an operation
    #[error("Role '{role}' is not permitted (allowed: {allowed:?})")]
    RoleDenied { role: Role, allowed: Vec<Role> },

    /// Actor does not own the resource
    #[error("Identity {actor} does not own this resource")]
    NotOwner { actor: Uuid, owner: Uuid },
}
