//! API request handlers

pub mod auth;
pub mod enrollment;
pub mod lessons;
pub mod progress;

pub use auth::{login, logout, profile, refresh, register, AuthResponse, LoginRequest, RefreshRequest, RegisterRequest};
pub use enrollment::{course_roster, drop_course, enroll, my_enrollments, EnrollRequest};
pub use lessons::summarize_lesson;
pub use progress::{complete_lesson, course_progress, leaderboard, start_lesson, LessonRequest};
