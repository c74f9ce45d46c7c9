//! Records shared by the credential and progression layers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;
use crate::level::level_for;

/// Closed set of identity roles
///
/// The legacy names (`student`, `teacher`, `admin`) are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Takes courses, earns XP
    #[serde(alias = "student")]
    Learner,
    /// Authors and owns courses
    #[serde(alias = "teacher")]
    Instructor,
    /// Platform operator
    #[serde(alias = "admin")]
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Learner => "learner",
            Role::Instructor => "instructor",
            Role::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "learner" | "student" => Ok(Role::Learner),
            "instructor" | "teacher" => Ok(Role::Instructor),
            "administrator" | "admin" => Ok(Role::Administrator),
            _ => Err(CoreError::UnknownRole(s.to_string())),
        }
    }
}

/// A registered identity
///
/// `level` is kept equal to `level_for(xp)` by every writer; the refresh slot
/// holds the only refresh token currently honored for this identity.
#[derive(Clone)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub xp: u64,
    pub level: u64,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Create a fresh identity with zero XP
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            xp: 0,
            level: level_for(0),
            refresh_token: None,
            created_at,
        }
    }

    /// Public projection, without credentials
    pub fn summary(&self) -> IdentitySummary {
        IdentitySummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            xp: self.xp,
            level: self.level,
        }
    }
}

/// Leaderboard ordering: XP descending, then earlier registration, then id
pub fn leaderboard_order(a: &Identity, b: &Identity) -> Ordering {
    b.xp.cmp(&a.xp)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("xp", &self.xp)
            .field("level", &self.level)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// Identity fields safe to hand to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub xp: u64,
    pub level: u64,
}

/// Enrollment lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Dropped,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Dropped => "dropped",
        }
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EnrollmentStatus::Active),
            "completed" => Ok(EnrollmentStatus::Completed),
            "dropped" => Ok(EnrollmentStatus::Dropped),
            _ => Err(CoreError::UnknownStatus(s.to_string())),
        }
    }
}

/// A student's registration in a course, unique per (student, course)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    /// Create an active enrollment
    pub fn new(student_id: Uuid, course_id: Uuid, enrolled_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            course_id,
            status: EnrollmentStatus::Active,
            enrolled_at,
        }
    }

    /// Whether lesson completions are accepted under this enrollment
    ///
    /// A completed enrollment still counts: the student remains enrolled and
    /// re-completions must reach the idempotent path.
    pub fn permits_progress(&self) -> bool {
        self.status != EnrollmentStatus::Dropped
    }
}

/// Progress state machine: absent -> started -> completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressState {
    Started,
    Completed,
}

/// A student's record for one lesson, unique per (student, lesson)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub id: Uuid,
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub is_completed: bool,
    pub xp_earned: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Progress {
    /// A row in the `started` state
    pub fn started(student_id: Uuid, lesson_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            lesson_id,
            is_completed: false,
            xp_earned: 0,
            started_at: Some(now),
            completed_at: None,
        }
    }

    /// A row created directly in the `completed` state
    pub fn completed(student_id: Uuid, lesson_id: Uuid, xp_reward: u64, now: DateTime<Utc>) -> Self {
        let mut progress = Self::started(student_id, lesson_id, now);
        progress.mark_completed(xp_reward, now);
        progress
    }

    pub fn state(&self) -> ProgressState {
        if self.is_completed {
            ProgressState::Completed
        } else {
            ProgressState::Started
        }
    }

    /// Transition to completed. Returns false (and changes nothing) when the
    /// row is already completed.
    pub fn mark_completed(&mut self, xp_reward: u64, now: DateTime<Utc>) -> bool {
        if self.is_completed {
            return false;
        }
        self.is_completed = true;
        self.xp_earned = xp_reward;
        self.completed_at = Some(now);
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        true
    }
}

/// Catalog facts about a lesson, read-only to this engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonFact {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub xp_reward: u64,
    pub position: i32,
}

/// Catalog facts about a course, read-only to this engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFact {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
}
