// CLI commands for running scripts and checking exercises locally
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use praxis_content::LessonStore;
use praxis_engine::{run_suite, BackendKind, Engine, EngineConfig, SimulatedInput};

/// Sample lessons embedded at build time from the repo's data/lessons.
const SAMPLE_LESSONS: &[(&str, &str)] = &[
    (
        "01_print.json",
        include_str!("../../../data/lessons/01_print.json"),
    ),
    (
        "02_input.json",
        include_str!("../../../data/lessons/02_input.json"),
    ),
    (
        "03_loops.json",
        include_str!("../../../data/lessons/03_loops.json"),
    ),
];

/// Execute a local script and print the outcome.
pub async fn run_script(
    file: &str,
    inputs: Vec<String>,
    timeout_ms: Option<u64>,
    max_output: Option<usize>,
    inline: bool,
    json: bool,
) -> Result<bool> {
    let code = fs::read_to_string(file).with_context(|| format!("failed to read {file}"))?;

    let mut config = EngineConfig::from_env();
    if let Some(timeout_ms) = timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    if let Some(max_output) = max_output {
        config = config.with_max_output_chars(max_output);
    }
    if inline {
        config = config.with_backend(BackendKind::Inline);
    }
    let engine = Engine::new(config);

    let result = engine
        .execute_with_inputs(&code, SimulatedInput::from_values(inputs))
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(result.success);
    }

    if !result.output.is_empty() {
        print!("{}", result.output);
        if !result.output.ends_with('\n') {
            println!();
        }
    }

    if result.success {
        println!("✅ Completed in {}ms", result.duration_ms);
    } else if result.rejected {
        println!("❌ Rejected: {}", result.error);
    } else {
        println!("❌ {}", result.error);
    }

    Ok(result.success)
}

/// Run an exercise's test cases against a local script.
pub async fn check_exercise(
    file: &str,
    lesson_id: &str,
    exercise_id: &str,
    lessons_dir: &str,
    strict: bool,
) -> Result<bool> {
    let code = fs::read_to_string(file).with_context(|| format!("failed to read {file}"))?;

    let store = LessonStore::new(lessons_dir);
    let exercise = store.exercise(lesson_id, exercise_id).with_context(|| {
        format!("failed to load exercise '{exercise_id}' from lesson '{lesson_id}'")
    })?;

    let mut cases = exercise.test_cases;
    if strict {
        for case in &mut cases {
            case.strict = true;
        }
    }
    if cases.is_empty() {
        println!("⚠️  Exercise '{}' has no test cases", exercise_id);
        return Ok(true);
    }

    println!(
        "🧪 Running {} test case(s) for exercise '{}'\n",
        cases.len(),
        exercise_id
    );

    let engine = Engine::new(EngineConfig::from_env());
    let suite = run_suite(&engine, &code, &cases).await;

    for (idx, case) in suite.results.iter().enumerate() {
        if case.passed {
            println!("  ✅ Case {} passed", idx + 1);
        } else {
            println!("  ❌ Case {} failed", idx + 1);
            println!("     Expected: {}", case.expected.trim());
            println!("     Got:      {}", case.actual.trim());
            if !case.error.is_empty() {
                println!("     Error:    {}", case.error);
            }
        }
    }

    println!(
        "\n{} {}/{} tests passed",
        if suite.success { "✅" } else { "❌" },
        suite.passed,
        suite.total
    );

    Ok(suite.success)
}

/// Scaffold a lessons directory with the bundled sample lessons.
pub fn init_lessons(dir: &str) -> Result<()> {
    println!("🚀 Initializing lessons directory at: {}", dir);

    let target = PathBuf::from(dir);
    fs::create_dir_all(&target)
        .with_context(|| format!("failed to create {}", target.display()))?;

    for (name, body) in SAMPLE_LESSONS {
        let path = target.join(name);
        if path.exists() {
            println!("  ⚠️  Skipped (already exists): {}", name);
            continue;
        }
        fs::write(&path, body)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("  ✅ Created: {}", name);
    }

    println!("✅ Lessons directory ready!");
    println!("\n📋 Next steps:");
    println!("  1. Check a solution: praxis check solution.js --lesson 01_print --exercise hello_world");
    println!("  2. Start the API: praxis-api");

    Ok(())
}
