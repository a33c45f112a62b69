/// Progress Store - SQLite Learner State
///
/// **Core Responsibility:**
/// Persist which lessons and exercises a learner has completed, plus an
/// audit trail of code submissions.
///
/// Completion rows are append-only; aggregate queries use DISTINCT so
/// repeating a lesson never inflates the counts. The "current" lesson is
/// derived, not stored: it is the lesson after the most recently completed
/// one in catalogue order, or the first lesson when nothing is completed yet.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::{ContentError, Result};
use crate::model::LessonSummary;

/// Overall progress across the lesson catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub total: usize,
    pub completed: usize,
    /// Next lesson to work on; `None` once the final lesson is done.
    pub current_lesson_id: Option<String>,
    pub percentage: f64,
}

/// Progress within a single lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: String,
    pub passed_exercises: i64,
}

#[derive(Clone)]
pub struct ProgressStore {
    pool: SqlitePool,
}

impl ProgressStore {
    /// Opens (creating if necessary) the SQLite database at `path` and
    /// ensures the schema exists.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| ContentError::Io {
                    path: parent.display().to_string(),
                    source: err,
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!(path = %path.display(), "Progress database ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                lesson_id TEXT NOT NULL,
                exercise_id TEXT,
                completed BOOLEAN DEFAULT FALSE,
                last_code TEXT,
                test_passed BOOLEAN DEFAULT FALSE,
                completed_at TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS code_submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                exercise_id TEXT NOT NULL,
                lesson_id TEXT NOT NULL,
                code TEXT NOT NULL,
                output TEXT,
                success BOOLEAN,
                submitted_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_lesson_complete(&self, lesson_id: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_progress (lesson_id, completed, completed_at) VALUES (?, TRUE, ?)",
        )
        .bind(lesson_id)
        .bind(now_stamp())
        .execute(&self.pool)
        .await?;
        debug!(lesson_id, "Lesson marked complete");
        Ok(())
    }

    pub async fn mark_exercise_complete(&self, lesson_id: &str, exercise_id: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_progress (lesson_id, exercise_id, test_passed, completed_at) \
             VALUES (?, ?, TRUE, ?)",
        )
        .bind(lesson_id)
        .bind(exercise_id)
        .bind(now_stamp())
        .execute(&self.pool)
        .await?;
        debug!(lesson_id, exercise_id, "Exercise marked complete");
        Ok(())
    }

    /// Records one submission for the audit trail.
    pub async fn save_submission(
        &self,
        lesson_id: &str,
        exercise_id: &str,
        code: &str,
        output: &str,
        success: bool,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO code_submissions (lesson_id, exercise_id, code, output, success) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(lesson_id)
        .bind(exercise_id)
        .bind(code)
        .bind(output)
        .bind(success)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Computes the overall summary against the given lesson catalogue.
    ///
    /// The catalogue is passed in (already sorted by order) rather than read
    /// here, so the store stays independent of where lessons live.
    pub async fn overview(&self, lessons: &[LessonSummary]) -> Result<ProgressSummary> {
        let total = lessons.len();

        let completed: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT lesson_id) FROM user_progress WHERE completed = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;
        let completed = completed as usize;

        let last_completed: Option<String> = sqlx::query_scalar(
            "SELECT lesson_id FROM user_progress WHERE completed = TRUE \
             ORDER BY completed_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let current_lesson_id = match last_completed {
            Some(last_id) => lessons
                .iter()
                .position(|lesson| lesson.id == last_id)
                .and_then(|idx| lessons.get(idx + 1))
                .map(|lesson| lesson.id.clone()),
            None => lessons.first().map(|lesson| lesson.id.clone()),
        };

        let percentage = if total > 0 {
            completed as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Ok(ProgressSummary {
            total,
            completed,
            current_lesson_id,
            percentage,
        })
    }

    /// Counts passed exercises within one lesson.
    pub async fn lesson_progress(&self, lesson_id: &str) -> Result<LessonProgress> {
        let passed_exercises: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_progress WHERE lesson_id = ? AND test_passed = TRUE",
        )
        .bind(lesson_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(LessonProgress {
            lesson_id: lesson_id.to_string(),
            passed_exercises,
        })
    }
}

/// Timestamps are stored as RFC 3339 UTC text with fixed precision so
/// lexicographic ORDER BY matches chronological order.
fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
