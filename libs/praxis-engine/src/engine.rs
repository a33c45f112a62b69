/// Execution Engine - Sandboxed Script Runs
///
/// **Core Responsibility:** Turns a raw submission into an
/// [`ExecutionResult`] with exactly three shapes: completed, runtime fault,
/// or timeout. The submission is validated first; rejected code never
/// executes. Accepted code runs in a sandbox hosted by one of two backends:
///
/// - **process** (default): a dedicated `praxis-cell` child per execution.
///   The deadline is enforced by killing the child, so even a tight infinite
///   loop is preempted, and output frames received before the kill are kept.
/// - **inline**: the sandbox runs on a blocking thread in this process.
///   Cheaper and handy for tests, but a timed-out script is only abandoned
///   (bounded by the sandbox loop budget), not killed.
///
/// Infrastructure failures (spawn errors, broken pipes) are folded into a
/// failed result so `execute` stays total for callers.
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cell::{CellRequest, Frame};
use crate::config::{BackendKind, EngineConfig};
use crate::error::{EngineError, Result};
use crate::sandbox::{run_session, OutputSink, SandboxSpec};
use crate::types::{ExecutionResult, SimulatedInput};
use crate::validate;

/// Appended in place of everything beyond the output cap.
pub const TRUNCATION_MARKER: &str = "\n... (output truncated)";

pub struct Engine {
    config: EngineConfig,
    backend: Box<dyn ExecutionBackend>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let backend: Box<dyn ExecutionBackend> = match config.backend {
            BackendKind::Process => Box::new(ProcessBackend::new(&config)),
            BackendKind::Inline => Box::new(InlineBackend::new(&config)),
        };
        Self { config, backend }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs a script with no scripted inputs.
    pub async fn execute(&self, code: &str) -> ExecutionResult {
        self.execute_with_inputs(code, SimulatedInput::default())
            .await
    }

    /// Validates and runs a script, returning a result in every case.
    pub async fn execute_with_inputs(
        &self,
        code: &str,
        inputs: SimulatedInput,
    ) -> ExecutionResult {
        let execution_id = Uuid::new_v4();
        let started = Instant::now();

        if code.len() > self.config.max_source_bytes {
            warn!(
                execution_id = %execution_id,
                source_bytes = code.len(),
                limit = self.config.max_source_bytes,
                "Submission exceeds source size limit"
            );
            return ExecutionResult::rejected(format!(
                "source exceeds the maximum size of {} bytes",
                self.config.max_source_bytes
            ));
        }

        let verdict = validate::check(code);
        if !verdict.ok {
            let reason = verdict
                .reason
                .unwrap_or_else(|| "code was rejected by validation".to_string());
            info!(execution_id = %execution_id, reason = %reason, "Submission rejected by validation");
            return ExecutionResult::rejected(reason);
        }

        let spec = SandboxSpec {
            inputs: inputs.into_values(),
            recursion_limit: self.config.recursion_limit,
            loop_budget: None,
        };
        let deadline = Duration::from_millis(self.config.timeout_ms);

        match self.backend.run(code, spec, deadline).await {
            Ok(outcome) => self.finish(execution_id, started, outcome),
            Err(err) => {
                error!(
                    execution_id = %execution_id,
                    backend = self.backend.name(),
                    error = %err,
                    "Execution backend failed"
                );
                ExecutionResult::fault(
                    String::new(),
                    format!("execution backend error: {err}"),
                    started.elapsed().as_millis() as u64,
                )
            }
        }
    }

    fn finish(
        &self,
        execution_id: Uuid,
        started: Instant,
        outcome: BackendOutcome,
    ) -> ExecutionResult {
        let mut output = outcome.output;
        let truncated = cap_output(&mut output, self.config.max_output_chars);
        let duration_ms = started.elapsed().as_millis() as u64;

        if outcome.timed_out {
            warn!(
                execution_id = %execution_id,
                timeout_ms = self.config.timeout_ms,
                duration_ms,
                "Execution timed out"
            );
            return ExecutionResult::timeout(output, self.config.timeout_ms, duration_ms);
        }
        if outcome.ok {
            debug!(execution_id = %execution_id, duration_ms, truncated, "Execution completed");
            ExecutionResult::completed(output, duration_ms)
        } else {
            debug!(
                execution_id = %execution_id,
                duration_ms,
                error = %outcome.error,
                "Execution raised a runtime fault"
            );
            ExecutionResult::fault(output, outcome.error, duration_ms)
        }
    }
}

/// Truncates `output` to `max_chars` characters, appending the marker when
/// anything was cut. Applied after capture, independent of fault status.
fn cap_output(output: &mut String, max_chars: usize) -> bool {
    match output.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            output.truncate(byte_index);
            output.push_str(TRUNCATION_MARKER);
            true
        }
        None => false,
    }
}

struct BackendOutcome {
    ok: bool,
    output: String,
    error: String,
    timed_out: bool,
}

impl BackendOutcome {
    fn completed(output: String) -> Self {
        Self {
            ok: true,
            output,
            error: String::new(),
            timed_out: false,
        }
    }

    fn fault(output: String, error: String) -> Self {
        Self {
            ok: false,
            output,
            error,
            timed_out: false,
        }
    }

    fn timeout(output: String) -> Self {
        Self {
            ok: false,
            output,
            error: String::new(),
            timed_out: true,
        }
    }
}

#[async_trait]
trait ExecutionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        code: &str,
        spec: SandboxSpec,
        deadline: Duration,
    ) -> Result<BackendOutcome>;
}

/// Runs each session in a dedicated `praxis-cell` child process.
struct ProcessBackend {
    cell_path: PathBuf,
    capture_budget: usize,
}

impl ProcessBackend {
    fn new(config: &EngineConfig) -> Self {
        Self {
            cell_path: resolve_cell_path(config),
            capture_budget: config.max_output_chars,
        }
    }
}

fn resolve_cell_path(config: &EngineConfig) -> PathBuf {
    if let Some(path) = &config.cell_path {
        return path.clone();
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join(format!("praxis-cell{}", std::env::consts::EXE_SUFFIX));
            if sibling.exists() {
                return sibling;
            }
        }
    }
    // Fall back to PATH lookup.
    PathBuf::from("praxis-cell")
}

#[async_trait]
impl ExecutionBackend for ProcessBackend {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn run(
        &self,
        code: &str,
        spec: SandboxSpec,
        deadline: Duration,
    ) -> Result<BackendOutcome> {
        let request = CellRequest {
            code: code.to_string(),
            inputs: spec.inputs,
            recursion_limit: spec.recursion_limit,
        };
        let payload = serde_json::to_string(&request)?;

        let mut child = Command::new(&self.cell_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: self.cell_path.clone(),
                source,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or(EngineError::Pipe("cell stdin"))?;
        stdin.write_all(payload.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        drop(stdin);

        let stdout = child
            .stdout
            .take()
            .ok_or(EngineError::Pipe("cell stdout"))?;
        let mut lines = BufReader::new(stdout).lines();

        let mut output = String::new();
        let mut captured_chars = 0usize;
        let timeout = tokio::time::sleep(deadline);
        tokio::pin!(timeout);

        loop {
            tokio::select! {
                _ = &mut timeout => {
                    if let Err(err) = child.start_kill() {
                        warn!(error = %err, "Failed to kill timed-out cell");
                    }
                    let _ = child.wait().await;
                    return Ok(BackendOutcome::timeout(output));
                }
                line = lines.next_line() => match line? {
                    Some(text) => match serde_json::from_str::<Frame>(&text) {
                        Ok(Frame::Out { chunk }) => {
                            // Keep at least one character past the cap so the
                            // engine can truncate exactly, then stop growing.
                            if captured_chars <= self.capture_budget {
                                captured_chars += chunk.chars().count();
                                output.push_str(&chunk);
                            }
                        }
                        Ok(Frame::Done { ok, error }) => {
                            let _ = child.wait().await;
                            return Ok(if ok {
                                BackendOutcome::completed(output)
                            } else {
                                BackendOutcome::fault(output, error)
                            });
                        }
                        Err(err) => {
                            debug!(error = %err, "Skipping malformed cell frame");
                        }
                    },
                    None => {
                        let status = child.wait().await?;
                        return Ok(BackendOutcome::fault(
                            output,
                            format!("execution worker exited unexpectedly ({status})"),
                        ));
                    }
                }
            }
        }
    }
}

/// Hosts sessions on blocking threads inside this process.
struct InlineBackend {
    loop_budget: u64,
    capture_budget: usize,
}

impl InlineBackend {
    fn new(config: &EngineConfig) -> Self {
        Self {
            loop_budget: config.inline_loop_budget,
            capture_budget: config.max_output_chars,
        }
    }
}

#[async_trait]
impl ExecutionBackend for InlineBackend {
    fn name(&self) -> &'static str {
        "inline"
    }

    async fn run(
        &self,
        code: &str,
        spec: SandboxSpec,
        deadline: Duration,
    ) -> Result<BackendOutcome> {
        let buffer = Arc::new(Mutex::new(String::new()));
        let writer = Arc::clone(&buffer);
        let budget = self.capture_budget;
        let mut captured_chars = 0usize;
        let sink: OutputSink = Box::new(move |chunk: &str| {
            if captured_chars <= budget {
                captured_chars += chunk.chars().count();
                if let Ok(mut buf) = writer.lock() {
                    buf.push_str(chunk);
                }
            }
        });

        let session_spec = SandboxSpec {
            loop_budget: Some(self.loop_budget),
            ..spec
        };
        let code = code.to_string();
        let mut task = tokio::task::spawn_blocking(move || run_session(&code, &session_spec, sink));

        tokio::select! {
            joined = &mut task => match joined {
                Ok(Ok(())) => Ok(BackendOutcome::completed(snapshot(&buffer))),
                Ok(Err(diag)) => Ok(BackendOutcome::fault(snapshot(&buffer), diag)),
                Err(err) => Err(EngineError::Join(err.to_string())),
            },
            _ = tokio::time::sleep(deadline) => {
                // The blocking session cannot be preempted; dropping the
                // handle abandons it and the loop budget bounds how much
                // longer it can run.
                Ok(BackendOutcome::timeout(snapshot(&buffer)))
            }
        }
    }
}

fn snapshot(buffer: &Arc<Mutex<String>>) -> String {
    buffer.lock().map(|buf| buf.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline_engine() -> Engine {
        Engine::new(EngineConfig::default().with_backend(BackendKind::Inline))
    }

    #[test]
    fn cap_output_is_exact_and_marks_truncation() {
        let mut output = "x".repeat(120);
        assert!(cap_output(&mut output, 50));
        assert_eq!(output, format!("{}{}", "x".repeat(50), TRUNCATION_MARKER));
    }

    #[test]
    fn cap_output_leaves_short_output_alone() {
        let mut output = String::from("short");
        assert!(!cap_output(&mut output, 50));
        assert_eq!(output, "short");
    }

    #[test]
    fn cap_output_counts_characters_not_bytes() {
        let mut output = "é".repeat(10);
        assert!(cap_output(&mut output, 4));
        assert_eq!(output, format!("{}{}", "é".repeat(4), TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn completed_execution_carries_output() {
        let engine = inline_engine();
        let result = engine.execute("print(1 + 1)").await;
        assert!(result.success, "unexpected failure: {}", result.error);
        assert_eq!(result.output, "2\n");
        assert!(result.error.is_empty());
        assert!(!result.timed_out);
        assert!(!result.rejected);
    }

    #[tokio::test]
    async fn rejected_code_never_executes() {
        let engine = inline_engine();
        let result = engine.execute("print('marker');\nrequire('fs');").await;
        assert!(!result.success);
        assert!(result.rejected);
        assert!(result.output.is_empty(), "side effects ran: {}", result.output);
        assert!(result.error.contains("require"));
    }

    #[tokio::test]
    async fn runtime_fault_keeps_partial_output() {
        let engine = inline_engine();
        let result = engine.execute("print('before');\nboom();").await;
        assert!(!result.success);
        assert!(!result.rejected);
        assert_eq!(result.output, "before\n");
        assert!(result.error.contains("boom"));
    }

    #[tokio::test]
    async fn exhausted_inputs_fault_with_eof() {
        let engine = inline_engine();
        let result = engine
            .execute_with_inputs(
                "var a = input('A: ');\nvar b = input('B: ');",
                SimulatedInput::from_values(vec!["only".into()]),
            )
            .await;
        assert!(!result.success);
        assert!(result.error.contains("EOFError"));
        assert!(result.error.contains("(1 provided)"));
        assert!(result.output.contains("A: only\n"));
    }

    #[tokio::test]
    async fn output_is_capped_with_marker() {
        let config = EngineConfig::default()
            .with_backend(BackendKind::Inline)
            .with_max_output_chars(50);
        let engine = Engine::new(config);
        let result = engine.execute("print('x'.repeat(119))").await;
        assert!(result.success);
        assert_eq!(
            result.output,
            format!("{}{}", "x".repeat(50), TRUNCATION_MARKER)
        );
    }

    #[tokio::test]
    async fn inline_timeout_is_reported_within_the_deadline() {
        let config = EngineConfig::default()
            .with_backend(BackendKind::Inline)
            .with_timeout_ms(200);
        let engine = Engine::new(config);
        let started = Instant::now();
        let result = engine.execute("print('start');\nwhile (true) {}").await;
        assert!(!result.success);
        assert!(result.timed_out);
        assert!(result.error.contains("timed out after 200ms"));
        assert!(result.output.contains("start"));
        assert!(started.elapsed() < Duration::from_millis(2_000));
    }

    #[tokio::test]
    async fn oversized_source_is_refused_before_validation() {
        let engine = inline_engine();
        let huge = format!("print('{}')", "a".repeat(2 * 1024 * 1024));
        let result = engine.execute(&huge).await;
        assert!(!result.success);
        assert!(result.rejected);
        assert!(result.error.contains("maximum size"));
    }

    #[tokio::test]
    async fn executions_are_deterministic() {
        let engine = inline_engine();
        let code = "for (var i = 0; i < 5; i = i + 1) { print(i * 3); }";
        let first = engine.execute(code).await;
        let second = engine.execute(code).await;
        assert_eq!(first.output, second.output);
        assert!(first.success && second.success);
    }
}
