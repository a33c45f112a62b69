/// Test Runner - Exercise Verification
///
/// **Core Responsibility:** Runs a submission against an exercise's test
/// cases and aggregates a suite verdict. Every case gets a fresh sandbox
/// with its own scripted inputs; cases run sequentially, in order, and no
/// case is skipped on failure, so the learner always sees the full picture.
///
/// A case passes when the comparison between captured and expected output
/// holds. The execution diagnostic is retained in the case result even on a
/// pass: a script may print the expected prompt and then fault on exhausted
/// input, and that is still a passing case worth debugging.
use tracing::{debug, info};

use crate::engine::Engine;
use crate::types::{CaseResult, MatchMode, TestCase, TestSuiteResult};

/// Trims surrounding whitespace before any comparison.
fn normalize(output: &str) -> &str {
    output.trim()
}

/// Loose mode checks that the trimmed expected output appears anywhere in
/// the trimmed actual output; strict mode requires trimmed equality.
pub fn outputs_match(actual: &str, expected: &str, mode: MatchMode) -> bool {
    let actual = normalize(actual);
    let expected = normalize(expected);
    match mode {
        MatchMode::Loose => actual.contains(expected),
        MatchMode::Strict => actual == expected,
    }
}

fn case_mode(case: &TestCase) -> MatchMode {
    if case.strict {
        MatchMode::Strict
    } else {
        MatchMode::Loose
    }
}

/// Runs every test case against `code`, sequentially, each in a fresh
/// sandbox.
pub async fn run_suite(engine: &Engine, code: &str, cases: &[TestCase]) -> TestSuiteResult {
    let total = cases.len();
    let mut results = Vec::with_capacity(total);
    let mut passed = 0usize;

    for (index, case) in cases.iter().enumerate() {
        let execution = engine
            .execute_with_inputs(code, case.input.clone())
            .await;
        let case_passed = outputs_match(&execution.output, &case.expected_output, case_mode(case));
        if case_passed {
            passed += 1;
        }
        debug!(
            case = index,
            passed = case_passed,
            duration_ms = execution.duration_ms,
            "Test case evaluated"
        );
        results.push(CaseResult {
            passed: case_passed,
            expected: case.expected_output.clone(),
            actual: execution.output,
            error: execution.error,
        });
    }

    info!(passed, total, "Test suite finished");
    TestSuiteResult {
        success: passed == total,
        passed,
        total,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendKind, EngineConfig};
    use crate::types::SimulatedInput;

    fn make_engine() -> Engine {
        Engine::new(EngineConfig::default().with_backend(BackendKind::Inline))
    }

    fn make_case(inputs: &[&str], expected: &str) -> TestCase {
        TestCase {
            input: SimulatedInput::from_values(inputs.iter().map(|s| s.to_string()).collect()),
            expected_output: expected.to_string(),
            strict: false,
            description: None,
        }
    }

    fn make_strict_case(expected: &str) -> TestCase {
        TestCase {
            strict: true,
            ..make_case(&[], expected)
        }
    }

    #[test]
    fn loose_match_accepts_substrings() {
        assert!(outputs_match("Result: 5\n", "5", MatchMode::Loose));
        assert!(outputs_match("  5  ", "5", MatchMode::Loose));
        assert!(!outputs_match("Result: 6\n", "5", MatchMode::Loose));
    }

    #[test]
    fn strict_match_requires_trimmed_equality() {
        assert!(outputs_match("5\n", "5", MatchMode::Strict));
        assert!(!outputs_match("5\n5\n", "5", MatchMode::Strict));
        assert!(!outputs_match("Result: 5", "5", MatchMode::Strict));
    }

    #[test]
    fn empty_expected_output_matches_anything_loosely() {
        assert!(outputs_match("whatever", "", MatchMode::Loose));
        assert!(outputs_match("", "", MatchMode::Strict));
    }

    #[tokio::test]
    async fn suite_counts_passes_and_failures() {
        let engine = make_engine();
        let cases = vec![make_case(&[], "5"), make_case(&[], "not there")];
        let suite = run_suite(&engine, "print(5)", &cases).await;
        assert!(!suite.success);
        assert_eq!(suite.passed, 1);
        assert_eq!(suite.total, 2);
        assert_eq!(suite.results.len(), 2);
        assert!(suite.results[0].passed);
        assert!(!suite.results[1].passed);
    }

    #[tokio::test]
    async fn all_cases_run_even_after_a_failure() {
        let engine = make_engine();
        let cases = vec![
            make_case(&[], "missing"),
            make_case(&[], "42"),
        ];
        let suite = run_suite(&engine, "print(42)", &cases).await;
        assert_eq!(suite.results.len(), 2);
        assert!(suite.results[1].passed);
    }

    #[tokio::test]
    async fn strict_case_rejects_extra_output() {
        let engine = make_engine();
        let suite = run_suite(
            &engine,
            "print(5);\nprint(5);",
            &[make_strict_case("5")],
        )
        .await;
        assert!(!suite.success);
        assert_eq!(suite.results[0].actual, "5\n5\n");
    }

    #[tokio::test]
    async fn loose_case_accepts_labelled_output() {
        let engine = make_engine();
        let suite = run_suite(&engine, "print('Result:', 5)", &[make_case(&[], "5")]).await;
        assert!(suite.success);
        assert_eq!(suite.passed, 1);
    }

    #[tokio::test]
    async fn case_can_pass_while_retaining_a_diagnostic() {
        // The prompt is printed before the input queue runs dry; the case
        // passes on output while the EOF diagnostic stays available.
        let engine = make_engine();
        let suite = run_suite(
            &engine,
            "var name = input('Your name: ');",
            &[make_case(&[], "Your name:")],
        )
        .await;
        assert!(suite.success);
        assert!(suite.results[0].passed);
        assert!(suite.results[0].error.contains("EOFError"));
    }

    #[tokio::test]
    async fn cases_get_fresh_input_queues() {
        let engine = make_engine();
        let code = "print('Got', input());";
        let cases = vec![make_case(&["first"], "Got first"), make_case(&["second"], "Got second")];
        let suite = run_suite(&engine, code, &cases).await;
        assert!(suite.success, "results: {:?}", suite.results);
    }

    #[tokio::test]
    async fn rejected_code_fails_every_case_with_the_reason() {
        let engine = make_engine();
        let cases = vec![make_case(&[], "1"), make_case(&[], "2")];
        let suite = run_suite(&engine, "eval('1')", &cases).await;
        assert!(!suite.success);
        assert_eq!(suite.passed, 0);
        for result in &suite.results {
            assert!(result.error.contains("eval"));
            assert!(result.actual.is_empty());
        }
    }

    #[tokio::test]
    async fn empty_suite_is_trivially_successful() {
        let engine = make_engine();
        let suite = run_suite(&engine, "print(1)", &[]).await;
        assert!(suite.success);
        assert_eq!(suite.passed, 0);
        assert_eq!(suite.total, 0);
        assert!(suite.results.is_empty());
    }
}
