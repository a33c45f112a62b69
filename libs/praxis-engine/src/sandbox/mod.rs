/// Sandbox Builder - Restricted Execution Namespace
///
/// **Core Responsibility:** Builds the namespace a lesson script runs in.
/// The capability table below is the single source of truth for what a
/// script can see: the courseware builtins plus a fixed set of language
/// intrinsics. Before any user code runs, a prologue strips every other
/// global from the global object and freezes the core prototypes so one
/// script cannot redefine them for a later one.
///
/// A sandbox is built fresh from the static table for every execution;
/// nothing a script does survives into another run.
mod builtins;
mod io;

pub use io::OutputSink;

use boa_engine::{Context, Source};
use lazy_static::lazy_static;

/// Language intrinsics retained inside the sandbox alongside the courseware
/// builtins. Deliberately excludes `Function` (dynamic code), `Date` and
/// `Math.random` (nondeterminism), and every host-facing global.
pub const RETAINED_INTRINSICS: &[&str] = &[
    "Object",
    "Array",
    "String",
    "Number",
    "Boolean",
    "Math",
    "JSON",
    "Error",
    "TypeError",
    "RangeError",
    "ReferenceError",
    "SyntaxError",
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
    "undefined",
    "NaN",
    "Infinity",
];

lazy_static! {
    /// Prologue derived from the capability table: deletes every global not
    /// on the list, removes `Math.random`, and freezes the core prototypes.
    /// Built once and shared by all sessions.
    static ref RESTRICTION_PRELUDE: String = build_restriction_prelude();
}

fn build_restriction_prelude() -> String {
    let keep: Vec<String> = RETAINED_INTRINSICS
        .iter()
        .copied()
        .chain(builtins::names())
        .map(|name| format!("\"{name}\""))
        .collect();
    format!(
        r#"(function () {{
  var keep = [{keep}];
  var g = (typeof globalThis !== 'undefined') ? globalThis : this;
  var fnConstructor = g.Function;
  var names = Object.getOwnPropertyNames(g);
  for (var i = 0; i < names.length; i = i + 1) {{
    if (keep.indexOf(names[i]) === -1) {{
      try {{ delete g[names[i]]; }} catch (e) {{ g[names[i]] = undefined; }}
    }}
  }}
  try {{ delete g.Math.random; }} catch (e) {{}}
  Object.freeze(g.Math);
  Object.freeze(Object.prototype);
  Object.freeze(Array.prototype);
  Object.freeze(String.prototype);
  Object.freeze(Number.prototype);
  Object.freeze(Boolean.prototype);
  if (typeof fnConstructor === 'function') {{ Object.freeze(fnConstructor.prototype); }}
}})();"#,
        keep = keep.join(", ")
    )
}

/// Everything needed to build one sandbox session.
#[derive(Debug, Clone)]
pub struct SandboxSpec {
    /// Scripted values for `input()`, consumed in order.
    pub inputs: Vec<String>,
    /// Interpreter recursion limit.
    pub recursion_limit: usize,
    /// Optional loop-iteration bound. Set by the inline backend so an
    /// abandoned session cannot spin forever; unset in the cell, where the
    /// parent's kill enforces the deadline.
    pub loop_budget: Option<u64>,
}

impl SandboxSpec {
    pub fn new(inputs: Vec<String>) -> Self {
        Self {
            inputs,
            recursion_limit: crate::config::DEFAULT_RECURSION_LIMIT,
            loop_budget: None,
        }
    }
}

/// Runs one script in a freshly built sandbox on the current thread.
///
/// Output streams through `sink` as it is produced, so partial output is
/// already delivered if the script faults or the host is killed mid-run.
/// Returns the diagnostic text when the script faults.
pub fn run_session(code: &str, spec: &SandboxSpec, sink: OutputSink) -> Result<(), String> {
    io::begin_session(spec.inputs.clone(), sink);
    let result = eval_in_fresh_context(code, spec);
    io::end_session();
    result
}

fn eval_in_fresh_context(code: &str, spec: &SandboxSpec) -> Result<(), String> {
    let mut context = Context::default();
    context
        .runtime_limits_mut()
        .set_recursion_limit(spec.recursion_limit);
    if let Some(budget) = spec.loop_budget {
        context.runtime_limits_mut().set_loop_iteration_limit(budget);
    }

    builtins::register_all(&mut context)
        .map_err(|e| format!("failed to build sandbox namespace: {e}"))?;
    context
        .eval(Source::from_bytes(RESTRICTION_PRELUDE.as_str()))
        .map_err(|e| format!("failed to restrict sandbox namespace: {e}"))?;

    match context.eval(Source::from_bytes(code)) {
        Ok(_) => Ok(()),
        Err(err) => Err(format_js_error(err, &mut context)),
    }
}

fn format_js_error(error: boa_engine::JsError, context: &mut Context) -> String {
    match error.try_native(context) {
        Ok(native) => native.to_string(),
        Err(_) => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn run_collect(code: &str, inputs: &[&str]) -> (Result<(), String>, String) {
        let buffer = Arc::new(Mutex::new(String::new()));
        let writer = Arc::clone(&buffer);
        let sink: OutputSink = Box::new(move |chunk: &str| {
            if let Ok(mut buf) = writer.lock() {
                buf.push_str(chunk);
            }
        });
        let spec = SandboxSpec::new(inputs.iter().map(|s| s.to_string()).collect());
        let result = run_session(code, &spec, sink);
        let output = buffer.lock().map(|b| b.clone()).unwrap_or_default();
        (result, output)
    }

    fn output_of(code: &str) -> String {
        let (result, output) = run_collect(code, &[]);
        assert!(result.is_ok(), "script faulted: {result:?}");
        output
    }

    #[test]
    fn print_renders_arithmetic() {
        assert_eq!(output_of("print(1 + 1)"), "2\n");
    }

    #[test]
    fn print_joins_arguments_with_spaces() {
        assert_eq!(output_of("print('Sum:', 3)"), "Sum: 3\n");
    }

    #[test]
    fn print_shows_strings_verbatim() {
        assert_eq!(output_of("print('Hello World')"), "Hello World\n");
    }

    #[test]
    fn print_renders_lists_with_quoted_strings() {
        assert_eq!(output_of("print([1, 'a', true])"), "[1, 'a', true]\n");
    }

    #[test]
    fn print_without_arguments_emits_a_blank_line() {
        assert_eq!(output_of("print()"), "\n");
    }

    #[test]
    fn input_echoes_prompt_and_value() {
        let (result, output) = run_collect(
            "var name = input('Name: ');\nprint('Hi', name);",
            &["Ada"],
        );
        assert!(result.is_ok());
        assert_eq!(output, "Name: Ada\nHi Ada\n");
    }

    #[test]
    fn input_values_are_consumed_in_order() {
        let (result, output) = run_collect(
            "var a = input();\nvar b = input();\nprint(a + b);",
            &["foo", "bar"],
        );
        assert!(result.is_ok());
        assert_eq!(output, "foo\nbar\nfoobar\n");
    }

    #[test]
    fn exhausted_input_faults_with_eof() {
        let (result, _output) = run_collect("input()", &[]);
        let diag = result.unwrap_err();
        assert!(diag.contains("EOFError"), "unexpected diagnostic: {diag}");
        assert!(diag.contains("(0 provided)"));
    }

    #[test]
    fn partial_output_survives_a_fault() {
        let (result, output) = run_collect("print('before');\nmissing();", &[]);
        let diag = result.unwrap_err();
        assert_eq!(output, "before\n");
        assert!(diag.contains("missing"), "unexpected diagnostic: {diag}");
    }

    #[test]
    fn unknown_globals_fail_as_undefined_names() {
        let (result, _output) = run_collect("open('file.txt')", &[]);
        let diag = result.unwrap_err();
        assert!(diag.contains("open"), "unexpected diagnostic: {diag}");
    }

    #[test]
    fn host_globals_are_stripped() {
        assert_eq!(output_of("print(typeof Date)"), "undefined\n");
    }

    #[test]
    fn math_random_is_removed_but_math_survives() {
        assert_eq!(output_of("print(typeof Math.random)"), "undefined\n");
        assert_eq!(output_of("print(Math.floor(3.7))"), "3\n");
    }

    #[test]
    fn len_measures_strings_and_lists() {
        assert_eq!(output_of("print(len('hello'), len([1, 2, 3]))"), "5 3\n");
    }

    #[test]
    fn len_rejects_numbers() {
        let (result, _) = run_collect("len(5)", &[]);
        assert!(result.unwrap_err().contains("len()"));
    }

    #[test]
    fn range_supports_all_three_forms() {
        assert_eq!(output_of("print(range(3))"), "[0, 1, 2]\n");
        assert_eq!(output_of("print(range(1, 4))"), "[1, 2, 3]\n");
        assert_eq!(output_of("print(range(5, 0, -2))"), "[5, 3, 1]\n");
    }

    #[test]
    fn range_rejects_zero_step() {
        let (result, _) = run_collect("range(0, 5, 0)", &[]);
        assert!(result.unwrap_err().contains("step"));
    }

    #[test]
    fn sum_adds_a_list_with_optional_start() {
        assert_eq!(output_of("print(sum([1, 2, 3]))"), "6\n");
        assert_eq!(output_of("print(sum([1, 2, 3], 10))"), "16\n");
    }

    #[test]
    fn min_max_accept_lists_and_variadic_arguments() {
        assert_eq!(output_of("print(min([4, 2, 9]), max(4, 2, 9))"), "2 9\n");
        assert_eq!(output_of("print(min('pear', 'apple'))"), "apple\n");
    }

    #[test]
    fn min_of_empty_list_faults() {
        let (result, _) = run_collect("min([])", &[]);
        assert!(result.unwrap_err().contains("empty"));
    }

    #[test]
    fn round_goes_half_away_from_zero() {
        assert_eq!(output_of("print(round(2.5), round(-2.5))"), "3 -3\n");
        assert_eq!(output_of("print(round(1.25, 1))"), "1.3\n");
    }

    #[test]
    fn int_parses_strings_and_truncates() {
        assert_eq!(output_of("print(int(' 42 '), int(3.9), int(true))"), "42 3 1\n");
    }

    #[test]
    fn int_rejects_bad_literals() {
        let (result, _) = run_collect("int('abc')", &[]);
        assert!(result.unwrap_err().contains("invalid literal"));
    }

    #[test]
    fn float_and_str_convert() {
        assert_eq!(output_of("print(float('2.5') + 0.5)"), "3\n");
        assert_eq!(output_of("print(str(42) + '!')"), "42!\n");
    }

    #[test]
    fn bool_follows_truthiness() {
        assert_eq!(output_of("print(bool(0), bool(''), bool('x'))"), "false false true\n");
    }

    #[test]
    fn enumerate_pairs_indexes_with_values() {
        assert_eq!(
            output_of("print(enumerate(['a', 'b']))"),
            "[[0, 'a'], [1, 'b']]\n"
        );
    }

    #[test]
    fn zip_stops_at_the_shortest_list() {
        assert_eq!(
            output_of("print(zip([1, 2, 3], ['a', 'b']))"),
            "[[1, 'a'], [2, 'b']]\n"
        );
    }

    #[test]
    fn sorted_orders_numbers_numerically() {
        assert_eq!(output_of("print(sorted([10, 2, 33]))"), "[2, 10, 33]\n");
        assert_eq!(output_of("print(sorted(['pear', 'apple']))"), "['apple', 'pear']\n");
    }

    #[test]
    fn reversed_handles_lists_and_strings() {
        assert_eq!(output_of("print(reversed([1, 2, 3]))"), "[3, 2, 1]\n");
        assert_eq!(output_of("print(reversed('abc'))"), "cba\n");
    }

    #[test]
    fn any_and_all_check_truthiness() {
        assert_eq!(output_of("print(any([0, 0, 1]), all([1, 2, 0]))"), "true false\n");
    }

    #[test]
    fn filter_and_map_call_user_functions() {
        assert_eq!(
            output_of("function even(n) { return n % 2 === 0; }\nprint(filter(even, [1, 2, 3, 4]));"),
            "[2, 4]\n"
        );
        assert_eq!(
            output_of("function double(n) { return n * 2; }\nprint(map(double, [1, 2, 3]));"),
            "[2, 4, 6]\n"
        );
    }

    #[test]
    fn type_classifies_courseware_values() {
        assert_eq!(
            output_of("print(type(3), type(2.5), type('x'), type([]))"),
            "int float str list\n"
        );
    }

    #[test]
    fn isinstance_matches_builtin_type_names() {
        assert_eq!(
            output_of("print(isinstance(3, int), isinstance('a', str), isinstance([1], list))"),
            "true true true\n"
        );
        assert_eq!(output_of("print(isinstance('a', int))"), "false\n");
    }

    #[test]
    fn user_defined_functions_work() {
        assert_eq!(
            output_of("function greet(name) { return 'Hello ' + name; }\nprint(greet('Ada'));"),
            "Hello Ada\n"
        );
    }

    #[test]
    fn runaway_recursion_faults_instead_of_crashing() {
        let (result, _) = run_collect("function f() { return f(); }\nf();", &[]);
        assert!(result.is_err());
    }

    #[test]
    fn sessions_do_not_share_globals() {
        assert_eq!(output_of("var leak = 1; print(leak);"), "1\n");
        assert_eq!(output_of("print(typeof leak)"), "undefined\n");
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let code = "for (var i = 0; i < 3; i = i + 1) { print(i, i * i); }";
        assert_eq!(output_of(code), output_of(code));
        assert_eq!(output_of(code), "0 0\n1 1\n2 4\n");
    }
}
