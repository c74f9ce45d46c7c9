//! Progression engine tests
//!
//! These tests drive the engine over the in-memory store:
//! - Completion is idempotent and awards XP exactly once, even under races
//! - Course completion flips the enrollment and self-heals on read
//! - Leaderboard ordering is deterministic
//! - Summary cache only calls the summarizer on a miss

use async_trait::async_trait;
use chrono::{Duration, Utc};
use learntn_core::{CourseFact, EnrollmentStatus, Identity, LessonFact, Role};
use learntn_server::catalog::SummaryError;
use learntn_server::{
    Catalog, LearningStore, MemoryCatalog, MemoryStore, ProgressEngine, ProgressError, Summarizer,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

// =============================================================================
// Test Helpers
// =============================================================================

struct Fixture {
    engine: ProgressEngine,
    store: Arc<MemoryStore>,
    catalog: Arc<MemoryCatalog>,
    course: CourseFact,
    lessons: Vec<LessonFact>,
}

/// One course owned by a fresh instructor, with lessons worth `rewards`
fn fixture(rewards: &[u64]) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let catalog = Arc::new(MemoryCatalog::new());

    let course = CourseFact {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        title: "Intro to Rust".into(),
    };
    catalog.add_course(course.clone()).unwrap();

    let lessons: Vec<LessonFact> = rewards
        .iter()
        .enumerate()
        .map(|(idx, reward)| LessonFact {
            id: Uuid::new_v4(),
            course_id: course.id,
            title: format!("Lesson {}", idx + 1),
            xp_reward: *reward,
            position: idx as i32 + 1,
        })
        .collect();
    for lesson in &lessons {
        catalog
            .add_lesson(lesson.clone(), format!("{} covers one idea. It has a second sentence.", lesson.title))
            .unwrap();
    }

    let engine = ProgressEngine::new(store.clone(), catalog.clone());
    Fixture {
        engine,
        store,
        catalog,
        course,
        lessons,
    }
}

async fn learner(store: &MemoryStore, name: &str) -> Identity {
    store
        .create_identity(Identity::new(
            name,
            format!("{}@example.com", name.to_lowercase()),
            "hash",
            Role::Learner,
            Utc::now(),
        ))
        .await
        .unwrap()
}

async fn enrolled_learner(fx: &Fixture, name: &str) -> Identity {
    let student = learner(&fx.store, name).await;
    fx.engine.enroll(student.id, fx.course.id).await.unwrap();
    student
}

async fn enrollment_status(fx: &Fixture, student: Uuid) -> EnrollmentStatus {
    fx.store
        .get_enrollment(student, fx.course.id)
        .await
        .unwrap()
        .unwrap()
        .status
}

// =============================================================================
// Completion
// =============================================================================

#[tokio::test]
async fn test_second_completion_awards_nothing() {
    let fx = fixture(&[50, 50]);
    let student = enrolled_learner(&fx, "Amal").await;
    let lesson = fx.lessons[0].id;

    let first = fx.engine.complete(student.id, lesson).await.unwrap();
    assert!(!first.already_completed);
    assert_eq!(first.xp_earned, 50);
    assert_eq!(first.total_xp, 50);

    let second = fx.engine.complete(student.id, lesson).await.unwrap();
    assert!(second.already_completed);
    assert_eq!(second.xp_earned, 0);
    assert_eq!(second.total_xp, 50);
    assert!(!second.leveled_up);

    let stored = fx.store.get_identity(student.id).await.unwrap().unwrap();
    assert_eq!(stored.xp, 50);
}

#[tokio::test]
async fn test_single_large_award_levels_up() {
    let fx = fixture(&[250, 10]);
    let student = enrolled_learner(&fx, "Amal").await;

    let outcome = fx.engine.complete(student.id, fx.lessons[0].id).await.unwrap();
    assert_eq!(outcome.total_xp, 250);
    assert_eq!(outcome.level, 2);
    assert!(outcome.leveled_up);
    assert_eq!(outcome.completed_lessons, 1);
    assert_eq!(outcome.total_lessons, 2);
    assert!(!outcome.course_completed);

    let stored = fx.store.get_identity(student.id).await.unwrap().unwrap();
    assert_eq!((stored.xp, stored.level), (250, 2));
}

#[tokio::test]
async fn test_completion_after_start_keeps_start_time() {
    let fx = fixture(&[20]);
    let student = enrolled_learner(&fx, "Amal").await;
    let lesson = fx.lessons[0].id;

    let started = fx.engine.start(student.id, lesson).await.unwrap();
    assert!(!started.is_completed);
    let again = fx.engine.start(student.id, lesson).await.unwrap();
    assert_eq!(again.id, started.id);

    fx.engine.complete(student.id, lesson).await.unwrap();
    let row = fx.store.get_progress(student.id, lesson).await.unwrap().unwrap();
    assert!(row.is_completed);
    assert_eq!(row.id, started.id);
    assert_eq!(row.started_at, started.started_at);
    assert_eq!(row.xp_earned, 20);
}

#[tokio::test]
async fn test_completion_requires_enrollment() {
    let fx = fixture(&[20]);
    let student = learner(&fx.store, "Amal").await;

    let result = fx.engine.complete(student.id, fx.lessons[0].id).await;
    assert!(matches!(result, Err(ProgressError::Forbidden(_))));

    fx.engine.enroll(student.id, fx.course.id).await.unwrap();
    fx.engine.drop_course(student.id, fx.course.id).await.unwrap();
    let result = fx.engine.complete(student.id, fx.lessons[0].id).await;
    assert!(matches!(result, Err(ProgressError::Forbidden(_))));

    let stored = fx.store.get_identity(student.id).await.unwrap().unwrap();
    assert_eq!(stored.xp, 0);
}

#[tokio::test]
async fn test_unknown_lesson_is_not_found() {
    let fx = fixture(&[20]);
    let student = enrolled_learner(&fx, "Amal").await;

    assert!(matches!(
        fx.engine.complete(student.id, Uuid::new_v4()).await,
        Err(ProgressError::NotFound(_))
    ));
    assert!(matches!(
        fx.engine.start(student.id, Uuid::new_v4()).await,
        Err(ProgressError::NotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_completions_award_once() {
    let fx = fixture(&[75, 10]);
    let student = enrolled_learner(&fx, "Amal").await;
    let lesson = fx.lessons[0].id;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = fx.engine.clone();
        handles.push(tokio::spawn(async move { engine.complete(student.id, lesson).await }));
    }

    let mut awarded = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        if !outcome.already_completed {
            awarded += 1;
            assert_eq!(outcome.xp_earned, 75);
        } else {
            assert_eq!(outcome.xp_earned, 0);
        }
    }
    assert_eq!(awarded, 1);

    let stored = fx.store.get_identity(student.id).await.unwrap().unwrap();
    assert_eq!(stored.xp, 75);
}

// =============================================================================
// Course Completion
// =============================================================================

#[tokio::test]
async fn test_last_lesson_completes_enrollment() {
    let fx = fixture(&[10, 10, 10]);
    let student = enrolled_learner(&fx, "Amal").await;

    for lesson in &fx.lessons[..2] {
        let outcome = fx.engine.complete(student.id, lesson.id).await.unwrap();
        assert!(!outcome.course_completed);
        assert_eq!(enrollment_status(&fx, student.id).await, EnrollmentStatus::Active);
    }

    let last = fx.engine.complete(student.id, fx.lessons[2].id).await.unwrap();
    assert!(last.course_completed);
    assert_eq!(last.completed_lessons, 3);
    assert_eq!(last.total_lessons, 3);
    assert_eq!(enrollment_status(&fx, student.id).await, EnrollmentStatus::Completed);

    // Repeats still reach the idempotent path on a completed enrollment
    let repeat = fx.engine.complete(student.id, fx.lessons[0].id).await.unwrap();
    assert!(repeat.already_completed);
    assert!(repeat.course_completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_last_two_lessons_complete_course() {
    for _ in 0..20 {
        let fx = fixture(&[10, 10, 10]);
        let student = enrolled_learner(&fx, "Amal").await;
        fx.engine.complete(student.id, fx.lessons[0].id).await.unwrap();

        let a = {
            let engine = fx.engine.clone();
            let lesson = fx.lessons[1].id;
            tokio::spawn(async move { engine.complete(student.id, lesson).await })
        };
        let b = {
            let engine = fx.engine.clone();
            let lesson = fx.lessons[2].id;
            tokio::spawn(async move { engine.complete(student.id, lesson).await })
        };
        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());

        assert!(a.course_completed || b.course_completed);
        assert_eq!(enrollment_status(&fx, student.id).await, EnrollmentStatus::Completed);
    }
}

#[tokio::test]
async fn test_course_progress_repairs_missed_flip() {
    let fx = fixture(&[10, 20]);
    let student = enrolled_learner(&fx, "Amal").await;
    for lesson in &fx.lessons {
        fx.engine.complete(student.id, lesson.id).await.unwrap();
    }

    // Simulate a flip lost between commit and status update
    fx.store
        .set_enrollment_status(student.id, fx.course.id, EnrollmentStatus::Active)
        .await
        .unwrap();

    let progress = fx.engine.course_progress(student.id, fx.course.id).await.unwrap();
    assert_eq!(progress.summary.completed_count, 2);
    assert_eq!(enrollment_status(&fx, student.id).await, EnrollmentStatus::Completed);
}

#[tokio::test]
async fn test_course_progress_projection() {
    let fx = fixture(&[10, 20, 30]);
    let student = enrolled_learner(&fx, "Amal").await;
    fx.engine.complete(student.id, fx.lessons[1].id).await.unwrap();
    fx.engine.start(student.id, fx.lessons[2].id).await.unwrap();

    let progress = fx.engine.course_progress(student.id, fx.course.id).await.unwrap();
    let ids: Vec<Uuid> = progress.progress.iter().map(|p| p.lesson_id).collect();
    assert_eq!(ids, fx.lessons.iter().map(|l| l.id).collect::<Vec<_>>());

    let first = &progress.progress[0];
    assert!(!first.is_completed);
    assert_eq!(first.xp_earned, 0);
    assert!(first.started_at.is_none());
    assert!(first.completed_at.is_none());

    assert!(progress.progress[1].is_completed);
    assert!(progress.progress[2].started_at.is_some());
    assert!(!progress.progress[2].is_completed);

    assert_eq!(progress.summary.total_lessons, 3);
    assert_eq!(progress.summary.completed_count, 1);
    assert_eq!(progress.summary.total_xp, 20);
    assert_eq!(progress.summary.percent_complete, 33);
    assert_eq!(enrollment_status(&fx, student.id).await, EnrollmentStatus::Active);
}

#[tokio::test]
async fn test_empty_course_progress() {
    let fx = fixture(&[]);
    let student = enrolled_learner(&fx, "Amal").await;

    let progress = fx.engine.course_progress(student.id, fx.course.id).await.unwrap();
    assert!(progress.progress.is_empty());
    assert_eq!(progress.summary.percent_complete, 0);
    assert_eq!(enrollment_status(&fx, student.id).await, EnrollmentStatus::Active);
}

// =============================================================================
// Enrollment
// =============================================================================

#[tokio::test]
async fn test_enrollment_lifecycle() {
    let fx = fixture(&[10]);
    let student = learner(&fx.store, "Amal").await;

    assert!(matches!(
        fx.engine.enroll(student.id, Uuid::new_v4()).await,
        Err(ProgressError::NotFound(_))
    ));

    let enrollment = fx.engine.enroll(student.id, fx.course.id).await.unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
    assert!(matches!(
        fx.engine.enroll(student.id, fx.course.id).await,
        Err(ProgressError::Conflict(_))
    ));

    let mine = fx.engine.my_enrollments(student.id).await.unwrap();
    assert_eq!(mine.len(), 1);

    assert!(matches!(
        fx.engine.drop_course(student.id, Uuid::new_v4()).await,
        Err(ProgressError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_reenroll_after_drop() {
    let fx = fixture(&[40, 60]);
    let student = enrolled_learner(&fx, "Amal").await;
    fx.engine.complete(student.id, fx.lessons[0].id).await.unwrap();

    fx.engine.drop_course(student.id, fx.course.id).await.unwrap();
    assert!(matches!(
        fx.engine.complete(student.id, fx.lessons[1].id).await,
        Err(ProgressError::Forbidden(_))
    ));

    let enrollment = fx.engine.enroll(student.id, fx.course.id).await.unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
    assert!(matches!(
        fx.engine.enroll(student.id, fx.course.id).await,
        Err(ProgressError::Conflict(_))
    ));

    // Earlier progress survives the drop and is not awarded again
    let repeat = fx.engine.complete(student.id, fx.lessons[0].id).await.unwrap();
    assert!(repeat.already_completed);
    let last = fx.engine.complete(student.id, fx.lessons[1].id).await.unwrap();
    assert_eq!(last.xp_earned, 60);
    assert!(last.course_completed);

    let stored = fx.store.get_identity(student.id).await.unwrap().unwrap();
    assert_eq!(stored.xp, 100);
    assert_eq!(enrollment_status(&fx, student.id).await, EnrollmentStatus::Completed);
    assert!(matches!(
        fx.engine.enroll(student.id, fx.course.id).await,
        Err(ProgressError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_roster_requires_ownership() {
    let fx = fixture(&[10]);
    enrolled_learner(&fx, "Amal").await;
    enrolled_learner(&fx, "Badr").await;

    let roster = fx.engine.roster(fx.course.owner_id, fx.course.id).await.unwrap();
    assert_eq!(roster.len(), 2);
    let amal = roster
        .iter()
        .find(|entry| entry.student.as_ref().map(|s| s.name.as_str()) == Some("Amal"))
        .unwrap();
    assert_eq!(amal.enrollment.status, EnrollmentStatus::Active);
    let student = amal.student.as_ref().unwrap();
    assert_eq!(student.email, "amal@example.com");
    assert_eq!((student.xp, student.level), (0, 1));

    assert!(matches!(
        fx.engine.roster(Uuid::new_v4(), fx.course.id).await,
        Err(ProgressError::Forbidden(_))
    ));
}

// =============================================================================
// Leaderboard
// =============================================================================

#[tokio::test]
async fn test_leaderboard_ties_are_deterministic() {
    let fx = fixture(&[10]);
    let t0 = Utc::now();

    let mut ids = Vec::new();
    for (offset, (name, xp)) in [("First", 500), ("Second", 500), ("Third", 300)].iter().enumerate() {
        let mut identity = Identity::new(
            *name,
            format!("{}@example.com", name.to_lowercase()),
            "hash",
            Role::Learner,
            t0 + Duration::seconds(offset as i64),
        );
        identity.xp = *xp;
        identity.level = learntn_core::level_for(*xp);
        ids.push(fx.store.create_identity(identity).await.unwrap().id);
    }
    let mut staff = Identity::new("Prof", "prof@example.com", "hash", Role::Instructor, t0);
    staff.xp = 9_000;
    fx.store.create_identity(staff).await.unwrap();

    for _ in 0..3 {
        let board = fx.engine.leaderboard(ids[1], 20).await.unwrap();
        let ranked: Vec<(usize, Uuid)> = board.iter().map(|e| (e.rank, e.id)).collect();
        assert_eq!(ranked, vec![(1, ids[0]), (2, ids[1]), (3, ids[2])]);
        assert_eq!(board.iter().filter(|e| e.is_self).count(), 1);
        assert!(board[1].is_self);
        assert_eq!(board[0].level, 5);
    }

    let top = fx.engine.leaderboard(ids[2], 2).await.unwrap();
    assert_eq!(top.len(), 2);
    assert!(top.iter().all(|e| !e.is_self));
}

// =============================================================================
// Summary Cache
// =============================================================================

#[derive(Default)]
struct CountingSummarizer {
    calls: AtomicUsize,
}

#[async_trait]
impl Summarizer for CountingSummarizer {
    async fn summarize(&self, content: &str) -> Result<String, SummaryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("summary of {} chars", content.len()))
    }
}

struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(&self, _content: &str) -> Result<String, SummaryError> {
        Err(SummaryError::Unavailable("offline".into()))
    }
}

#[tokio::test]
async fn test_summary_generated_once() {
    let fx = fixture(&[10]);
    let summarizer = CountingSummarizer::default();
    let lesson = fx.lessons[0].id;

    let first = fx.engine.summarize(lesson, &summarizer).await.unwrap();
    assert!(!first.cached);
    let second = fx.engine.summarize(lesson, &summarizer).await.unwrap();
    assert!(second.cached);
    assert_eq!(first.summary, second.summary);
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);

    assert_eq!(fx.catalog.cached_summary(lesson).await.unwrap(), Some(first.summary));
}

#[tokio::test]
async fn test_summary_failures() {
    let fx = fixture(&[10]);

    assert!(matches!(
        fx.engine.summarize(Uuid::new_v4(), &FailingSummarizer).await,
        Err(ProgressError::NotFound(_))
    ));
    assert!(matches!(
        fx.engine.summarize(fx.lessons[0].id, &FailingSummarizer).await,
        Err(ProgressError::Summary(_))
    ));
    assert_eq!(fx.catalog.cached_summary(fx.lessons[0].id).await.unwrap(), None);
}
