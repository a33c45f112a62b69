/// Lesson Store - JSON Lesson Files On Disk
///
/// **Core Responsibility:** Load lesson content from a directory of JSON
/// files, one file per lesson, named `<lesson_id>.json`.
///
/// Listing tolerates broken files: a lesson that fails to parse is logged and
/// skipped so one bad file cannot take the whole catalogue down. Direct
/// fetches by id surface the parse error instead, since the caller asked for
/// that specific lesson.
///
/// Lesson ids double as file names, so they are sanitized before any path is
/// built from them.
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ContentError, Result};
use crate::model::{Exercise, Lesson, LessonSummary};

#[derive(Debug, Clone)]
pub struct LessonStore {
    dir: PathBuf,
}

impl LessonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists all lessons as summaries, sorted by `order` then id.
    ///
    /// A missing directory is an empty catalogue, not an error.
    pub fn list(&self) -> Result<Vec<LessonSummary>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(ContentError::Io {
                    path: self.dir.display().to_string(),
                    source: err,
                })
            }
        };

        let mut summaries = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| ContentError::Io {
                path: self.dir.display().to_string(),
                source: err,
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match load_lesson(&path) {
                Ok(lesson) => summaries.push(lesson.summary()),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Skipping unreadable lesson file");
                }
            }
        }

        summaries.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        debug!(count = summaries.len(), "Listed lessons");
        Ok(summaries)
    }

    /// Loads the full lesson for `lesson_id`.
    pub fn get(&self, lesson_id: &str) -> Result<Lesson> {
        let id = sanitize_id(lesson_id)?;
        let path = self.dir.join(format!("{id}.json"));
        if !path.is_file() {
            return Err(ContentError::LessonNotFound(lesson_id.to_string()));
        }
        load_lesson(&path)
    }

    /// Looks up one exercise inside a lesson.
    pub fn exercise(&self, lesson_id: &str, exercise_id: &str) -> Result<Exercise> {
        let lesson = self.get(lesson_id)?;
        lesson
            .exercise(exercise_id)
            .cloned()
            .ok_or_else(|| ContentError::ExerciseNotFound {
                lesson: lesson_id.to_string(),
                exercise: exercise_id.to_string(),
            })
    }
}

fn load_lesson(path: &Path) -> Result<Lesson> {
    let raw = fs::read_to_string(path).map_err(|err| ContentError::Io {
        path: path.display().to_string(),
        source: err,
    })?;
    serde_json::from_str(&raw).map_err(|err| ContentError::Parse {
        path: path.display().to_string(),
        source: err,
    })
}

/// Rejects any id that could escape the lessons directory.
///
/// Ids become file names verbatim, so only ASCII alphanumerics, `_` and `-`
/// are allowed.
fn sanitize_id(id: &str) -> Result<&str> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(id)
    } else {
        Err(ContentError::InvalidId(id.to_string()))
    }
}
