//! Sandboxed execution and verification for courseware scripts.
//!
//! The pipeline has three stages: [`validate`] refuses anything that could
//! reach dynamic evaluation, module loading or the host; [`sandbox`] builds
//! the restricted namespace a script runs in; [`engine::Engine`] hosts the
//! run on a killable child process (or an inline thread) and produces an
//! [`types::ExecutionResult`]. [`runner`] drives the engine across an
//! exercise's test cases.

pub mod cell;
pub mod config;
pub mod engine;
pub mod error;
pub mod runner;
pub mod sandbox;
pub mod types;
pub mod validate;

pub use config::{BackendKind, EngineConfig};
pub use engine::{Engine, TRUNCATION_MARKER};
pub use error::{EngineError, Result};
pub use runner::{outputs_match, run_suite};
pub use types::{
    CaseResult, ExecutionResult, MatchMode, SimulatedInput, TestCase, TestSuiteResult,
};
pub use validate::ValidationResult;
