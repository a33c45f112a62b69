//! Error types for lesson and progress storage.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("lesson '{0}' was not found")]
    LessonNotFound(String),

    #[error("exercise '{exercise}' was not found in lesson '{lesson}'")]
    ExerciseNotFound { lesson: String, exercise: String },

    #[error("invalid lesson id '{0}'")]
    InvalidId(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lesson file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, ContentError>;
