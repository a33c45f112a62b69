//! Shared result and request types for the execution pipeline.

use serde::{Deserialize, Deserializer, Serialize};

/// Scripted stand-in for interactive input.
///
/// Holds the ordered queue of values that `input()` hands to the running
/// script. Lesson files store this either as a list of strings or as a single
/// newline-joined string; both deserialize to the same queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SimulatedInput(Vec<String>);

impl SimulatedInput {
    pub fn from_values(values: Vec<String>) -> Self {
        Self(values)
    }

    /// Splits a newline-joined block into individual input values.
    ///
    /// An empty block means no inputs at all, not one empty input. A single
    /// trailing newline is not a value either.
    pub fn from_joined(joined: &str) -> Self {
        if joined.is_empty() {
            return Self::default();
        }
        let trimmed = joined.strip_suffix('\n').unwrap_or(joined);
        Self(
            trimmed
                .split('\n')
                .map(|value| value.trim_end_matches('\r').to_string())
                .collect(),
        )
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn into_values(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for SimulatedInput {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl<'de> Deserialize<'de> for SimulatedInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Many(Vec<String>),
            One(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Many(values) => SimulatedInput(values),
            Repr::One(joined) => SimulatedInput::from_joined(&joined),
        })
    }
}

/// Outcome of a single sandboxed execution.
///
/// `execute` never fails at the API level; infrastructure problems are folded
/// into a failed result so callers always get output, diagnostic and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Captured output, capped to the configured maximum.
    pub output: String,
    /// Diagnostic text; empty on success.
    pub error: String,
    pub duration_ms: u64,
    /// Set when the deadline expired before the script finished.
    #[serde(default)]
    pub timed_out: bool,
    /// Set when static validation refused the code before any execution.
    #[serde(default)]
    pub rejected: bool,
}

impl ExecutionResult {
    pub fn completed(output: String, duration_ms: u64) -> Self {
        Self {
            success: true,
            output,
            error: String::new(),
            duration_ms,
            timed_out: false,
            rejected: false,
        }
    }

    pub fn fault(output: String, error: String, duration_ms: u64) -> Self {
        Self {
            success: false,
            output,
            error,
            duration_ms,
            timed_out: false,
            rejected: false,
        }
    }

    pub fn timeout(output: String, timeout_ms: u64, duration_ms: u64) -> Self {
        Self {
            success: false,
            output,
            error: format!("execution timed out after {timeout_ms}ms"),
            duration_ms,
            timed_out: true,
            rejected: false,
        }
    }

    pub fn rejected(reason: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: reason,
            duration_ms: 0,
            timed_out: false,
            rejected: true,
        }
    }
}

/// How a test case's expected output is matched against the captured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Trimmed expected must be a substring of trimmed actual.
    Loose,
    /// Trimmed expected must equal trimmed actual.
    Strict,
}

impl Default for MatchMode {
    fn default() -> Self {
        MatchMode::Loose
    }
}

/// One exercise test case: scripted inputs plus the output to check for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default, alias = "inputs")]
    pub input: SimulatedInput,
    #[serde(default)]
    pub expected_output: String,
    /// When set, the trimmed output must match exactly instead of by
    /// substring.
    #[serde(default)]
    pub strict: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Per-case verdict inside a [`TestSuiteResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub passed: bool,
    pub expected: String,
    /// Captured output as produced, untrimmed.
    pub actual: String,
    /// Execution diagnostic, kept even when the case passed.
    pub error: String,
}

/// Aggregate verdict over an exercise's test cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    /// True when every case passed. An empty suite is trivially successful.
    pub success: bool,
    pub passed: usize,
    pub total: usize,
    pub results: Vec<CaseResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_input_from_list() {
        let parsed: SimulatedInput = serde_json::from_str(r#"["5", "3"]"#).unwrap();
        assert_eq!(parsed.values(), ["5".to_string(), "3".to_string()]);
    }

    #[test]
    fn simulated_input_from_joined_string() {
        let parsed: SimulatedInput = serde_json::from_str(r#""5\n3""#).unwrap();
        assert_eq!(parsed.values(), ["5".to_string(), "3".to_string()]);
    }

    #[test]
    fn simulated_input_empty_string_means_no_inputs() {
        let parsed: SimulatedInput = serde_json::from_str(r#""""#).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn simulated_input_ignores_single_trailing_newline() {
        let parsed = SimulatedInput::from_joined("Ada\n");
        assert_eq!(parsed.values(), ["Ada".to_string()]);
    }

    #[test]
    fn simulated_input_serializes_as_list() {
        let input = SimulatedInput::from_values(vec!["a".into(), "b".into()]);
        assert_eq!(serde_json::to_string(&input).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_case_accepts_both_input_keys() {
        let single: TestCase =
            serde_json::from_str(r#"{"input": "Ada", "expected_output": "Ada"}"#).unwrap();
        assert_eq!(single.input.values(), ["Ada".to_string()]);
        assert!(!single.strict);

        let listed: TestCase =
            serde_json::from_str(r#"{"inputs": ["1", "2"], "expected_output": "3"}"#).unwrap();
        assert_eq!(listed.input.len(), 2);
    }

    #[test]
    fn test_case_defaults_to_no_input() {
        let case: TestCase = serde_json::from_str(r#"{"expected_output": "ok"}"#).unwrap();
        assert!(case.input.is_empty());
    }

    #[test]
    fn rejected_result_never_carries_output() {
        let result = ExecutionResult::rejected("dynamic code execution is not allowed: eval".into());
        assert!(!result.success);
        assert!(result.rejected);
        assert!(result.output.is_empty());
        assert_eq!(result.duration_ms, 0);
    }

    #[test]
    fn timeout_result_names_the_deadline() {
        let result = ExecutionResult::timeout("partial".into(), 5000, 5012);
        assert!(result.timed_out);
        assert!(result.error.contains("5000ms"));
        assert_eq!(result.output, "partial");
    }
}
