//! Lesson content and learner progress for the courseware backend.
//!
//! [`lessons::LessonStore`] serves lesson JSON files from a directory;
//! [`progress::ProgressStore`] keeps completion state and submissions in
//! SQLite. Both are shared-nothing with the execution pipeline apart from
//! the test-case shape they exchange with it.

pub mod error;
pub mod lessons;
pub mod model;
pub mod progress;

pub use error::{ContentError, Result};
pub use lessons::LessonStore;
pub use model::{Example, Exercise, Lesson, LessonSummary, Section};
pub use progress::{LessonProgress, ProgressStore, ProgressSummary};
