//! Lesson file schema.
//!
//! Lessons are authored as standalone JSON files. A lesson is a sequence of
//! sections: theory sections carry prose and worked examples, practice
//! sections carry one exercise with its test cases. The test-case shape is
//! shared with the execution pipeline so lesson files feed the runner
//! directly.

use praxis_engine::TestCase;
use serde::{Deserialize, Serialize};

/// A full lesson as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub week: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// One lesson section, discriminated by its `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Section {
    Theory {
        title: String,
        content: String,
        #[serde(default)]
        examples: Vec<Example>,
    },
    Practice {
        title: String,
        exercise: Exercise,
    },
}

/// A worked example inside a theory section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub title: String,
    #[serde(default)]
    pub explanation: String,
    pub code: String,
    #[serde(default)]
    pub output: String,
}

/// A practice exercise with its verification cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub instructions: String,
    #[serde(default)]
    pub starter_code: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub hints: Vec<String>,
}

/// Listing view of a lesson without its sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonSummary {
    pub id: String,
    pub title: String,
    pub order: u32,
    pub week: u32,
    pub description: String,
}

impl Lesson {
    pub fn summary(&self) -> LessonSummary {
        LessonSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            order: self.order,
            week: self.week,
            description: self.description.clone(),
        }
    }

    /// Finds an exercise by id across all practice sections.
    pub fn exercise(&self, exercise_id: &str) -> Option<&Exercise> {
        self.sections.iter().find_map(|section| match section {
            Section::Practice { exercise, .. } if exercise.id == exercise_id => Some(exercise),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LESSON_JSON: &str = r#"{
        "id": "02_variables",
        "title": "Variables",
        "order": 2,
        "week": 1,
        "description": "Naming values",
        "sections": [
            {
                "type": "theory",
                "title": "What is a variable",
                "content": "A variable names a value.",
                "examples": [
                    {
                        "title": "Assignment",
                        "explanation": "Bind and print:",
                        "code": "var x = 3\nprint(x)",
                        "output": "3"
                    }
                ]
            },
            {
                "type": "practice",
                "title": "Try it",
                "exercise": {
                    "id": "assign_print",
                    "instructions": "Assign 5 to x and print it",
                    "starter_code": "var x = ",
                    "test_cases": [{"input": "", "expected_output": "5"}],
                    "hints": ["Use print"]
                }
            }
        ]
    }"#;

    #[test]
    fn parses_full_lesson() {
        let lesson: Lesson = serde_json::from_str(LESSON_JSON).unwrap();
        assert_eq!(lesson.id, "02_variables");
        assert_eq!(lesson.sections.len(), 2);
        match &lesson.sections[0] {
            Section::Theory { examples, .. } => assert_eq!(examples.len(), 1),
            other => panic!("expected theory section, got {other:?}"),
        }
    }

    #[test]
    fn finds_exercise_by_id() {
        let lesson: Lesson = serde_json::from_str(LESSON_JSON).unwrap();
        let exercise = lesson.exercise("assign_print").unwrap();
        assert_eq!(exercise.test_cases.len(), 1);
        assert_eq!(exercise.test_cases[0].expected_output, "5");
        assert!(lesson.exercise("missing").is_none());
    }

    #[test]
    fn summary_drops_sections() {
        let lesson: Lesson = serde_json::from_str(LESSON_JSON).unwrap();
        let summary = lesson.summary();
        assert_eq!(summary.order, 2);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("sections").is_none());
    }

    #[test]
    fn missing_optional_fields_default() {
        let lesson: Lesson =
            serde_json::from_str(r#"{"id": "x", "title": "X"}"#).unwrap();
        assert_eq!(lesson.order, 0);
        assert_eq!(lesson.week, 0);
        assert!(lesson.sections.is_empty());
    }

    #[test]
    fn test_case_input_may_be_newline_joined() {
        let exercise: Exercise = serde_json::from_str(
            r#"{
                "id": "sum",
                "instructions": "Read two numbers",
                "test_cases": [{"input": "5\n3", "expected_output": "8"}]
            }"#,
        )
        .unwrap();
        assert_eq!(exercise.test_cases[0].input.len(), 2);
    }
}
