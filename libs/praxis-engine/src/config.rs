//! Engine configuration.
//!
//! Defaults are safe for lesson-sized scripts; everything can be overridden
//! through `PRAXIS_*` environment variables or the builder methods.

use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_OUTPUT_CHARS: usize = 10_000;
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 1024 * 1024;
pub const DEFAULT_RECURSION_LIMIT: usize = 512;
pub const DEFAULT_INLINE_LOOP_BUDGET: u64 = 5_000_000;

/// Which execution backend runs sandbox sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Dedicated child process per execution; timeouts are enforced by
    /// killing the child, so runaway scripts are truly preempted.
    Process,
    /// Sandbox hosted on a blocking thread inside this process. Cheaper, but
    /// a timed-out script can only be abandoned, not killed; intended for
    /// tests and local development.
    Inline,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "process" => Ok(BackendKind::Process),
            "inline" => Ok(BackendKind::Inline),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Wall-clock deadline for a single execution.
    pub timeout_ms: u64,
    /// Output cap in characters; excess is truncated with a marker.
    pub max_output_chars: usize,
    /// Submissions larger than this are refused before validation.
    pub max_source_bytes: usize,
    pub backend: BackendKind,
    /// Explicit path to the `praxis-cell` binary. When unset the engine looks
    /// next to the current executable, then falls back to `PATH`.
    pub cell_path: Option<PathBuf>,
    /// Interpreter recursion limit inside the sandbox.
    pub recursion_limit: usize,
    /// Loop-iteration bound for the inline backend; keeps an abandoned
    /// session from spinning forever after its deadline.
    pub inline_loop_budget: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            backend: BackendKind::Process,
            cell_path: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            inline_loop_budget: DEFAULT_INLINE_LOOP_BUDGET,
        }
    }
}

impl EngineConfig {
    /// Builds a config from `PRAXIS_*` environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout_ms: env_parse("PRAXIS_TIMEOUT_MS", defaults.timeout_ms),
            max_output_chars: env_parse("PRAXIS_MAX_OUTPUT_CHARS", defaults.max_output_chars),
            max_source_bytes: env_parse("PRAXIS_MAX_SOURCE_BYTES", defaults.max_source_bytes),
            backend: env_parse("PRAXIS_BACKEND", defaults.backend),
            cell_path: std::env::var("PRAXIS_CELL_PATH").ok().map(PathBuf::from),
            recursion_limit: env_parse("PRAXIS_RECURSION_LIMIT", defaults.recursion_limit),
            inline_loop_budget: defaults.inline_loop_budget,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_output_chars(mut self, max_output_chars: usize) -> Self {
        self.max_output_chars = max_output_chars;
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_cell_path(mut self, path: PathBuf) -> Self {
        self.cell_path = Some(path);
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
