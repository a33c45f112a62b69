// HTTP route handlers for the Praxis API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use praxis_content::{ContentError, ProgressSummary};
use praxis_engine::{run_suite, MatchMode, SimulatedInput, TestCase};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::metrics;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
    #[serde(default)]
    pub inputs: SimulatedInput,
    #[serde(default)]
    pub lesson_id: Option<String>,
    #[serde(default)]
    pub exercise_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub output: String,
    pub error: String,
    /// Elapsed wall-clock time in seconds.
    pub execution_time: f64,
}

#[derive(Debug, Deserialize)]
pub struct TestRequest {
    pub code: String,
    pub test_cases: Vec<TestCase>,
    /// Suite-wide override: `strict` forces exact matching for every case.
    #[serde(default)]
    pub mode: Option<MatchMode>,
    #[serde(default)]
    pub lesson_id: Option<String>,
}

/// GET / - Service banner
pub async fn home() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "message": "Praxis Learning Platform API",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// GET /api/health - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "praxis-api",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// POST /api/execute - Run a submission through the sandbox pipeline
pub async fn execute_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExecuteRequest>,
) -> impl IntoResponse {
    let ExecuteRequest {
        code,
        inputs,
        lesson_id,
        exercise_id,
    } = payload;
    let request_id = Uuid::new_v4();
    metrics::EXECUTIONS_TOTAL.inc();

    let result = state.engine.execute_with_inputs(&code, inputs).await;

    if result.rejected {
        metrics::REJECTIONS_TOTAL.inc();
    }
    if result.timed_out {
        metrics::TIMEOUTS_TOTAL.inc();
    }

    info!(
        request_id = %request_id,
        success = result.success,
        rejected = result.rejected,
        timed_out = result.timed_out,
        duration_ms = result.duration_ms,
        "Execution handled"
    );

    if let (Some(lesson_id), Some(exercise_id)) = (&lesson_id, &exercise_id) {
        // The run already happened; a failed audit write is logged, not
        // surfaced to the learner.
        if let Err(err) = state
            .progress
            .save_submission(lesson_id, exercise_id, &code, &result.output, result.success)
            .await
        {
            error!(request_id = %request_id, error = %err, "Failed to record submission");
        }
    }

    (
        StatusCode::OK,
        Json(ExecuteResponse {
            success: result.success,
            output: result.output,
            error: result.error,
            execution_time: result.duration_ms as f64 / 1000.0,
        }),
    )
}

/// POST /api/exercises/{exercise_id}/test - Verify a submission against test cases
pub async fn test_exercise(
    State(state): State<Arc<AppState>>,
    Path(exercise_id): Path<String>,
    Json(payload): Json<TestRequest>,
) -> impl IntoResponse {
    let TestRequest {
        code,
        mut test_cases,
        mode,
        lesson_id,
    } = payload;
    let request_id = Uuid::new_v4();
    metrics::TEST_SUITES_TOTAL.inc();

    if let Some(MatchMode::Strict) = mode {
        for case in &mut test_cases {
            case.strict = true;
        }
    }

    let suite = run_suite(&state.engine, &code, &test_cases).await;

    info!(
        request_id = %request_id,
        exercise_id = %exercise_id,
        passed = suite.passed,
        total = suite.total,
        success = suite.success,
        "Test suite handled"
    );

    if let Some(lesson_id) = &lesson_id {
        let summary = format!("{}/{} tests passed", suite.passed, suite.total);
        if let Err(err) = state
            .progress
            .save_submission(lesson_id, &exercise_id, &code, &summary, suite.success)
            .await
        {
            error!(request_id = %request_id, error = %err, "Failed to record submission");
        }
        if suite.success {
            if let Err(err) = state
                .progress
                .mark_exercise_complete(lesson_id, &exercise_id)
                .await
            {
                error!(request_id = %request_id, error = %err, "Failed to mark exercise complete");
            }
        }
    }

    (StatusCode::OK, Json(suite))
}

/// GET /api/lessons - Lesson catalogue summaries
pub async fn list_lessons(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.lessons.list() {
        Ok(summaries) => (StatusCode::OK, Json(summaries)).into_response(),
        Err(err) => content_error(err),
    }
}

/// GET /api/lessons/{lesson_id} - Full lesson content
pub async fn get_lesson(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
) -> impl IntoResponse {
    match state.lessons.get(&lesson_id) {
        Ok(lesson) => (StatusCode::OK, Json(lesson)).into_response(),
        Err(err) => content_error(err),
    }
}

/// POST /api/lessons/{lesson_id}/complete - Mark a lesson finished
pub async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
) -> impl IntoResponse {
    // Only lessons that exist in the catalogue can be completed.
    if let Err(err) = state.lessons.get(&lesson_id) {
        return content_error(err);
    }
    if let Err(err) = state.progress.mark_lesson_complete(&lesson_id).await {
        return content_error(err);
    }
    info!(lesson_id = %lesson_id, "Lesson marked complete");

    match overview(&state).await {
        Ok(progress) => (
            StatusCode::OK,
            Json(json!({ "success": true, "progress": progress })),
        )
            .into_response(),
        Err(err) => content_error(err),
    }
}

/// GET /api/lessons/{lesson_id}/progress - Passed-exercise count for one lesson
pub async fn lesson_progress(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
) -> impl IntoResponse {
    match state.progress.lesson_progress(&lesson_id).await {
        Ok(progress) => (StatusCode::OK, Json(progress)).into_response(),
        Err(err) => content_error(err),
    }
}

/// GET /api/progress - Overall progress summary
pub async fn get_progress(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match overview(&state).await {
        Ok(progress) => (StatusCode::OK, Json(progress)).into_response(),
        Err(err) => content_error(err),
    }
}

/// GET /metrics - Prometheus exposition
pub async fn export_metrics() -> impl IntoResponse {
    (StatusCode::OK, metrics::render())
}

async fn overview(state: &AppState) -> Result<ProgressSummary, ContentError> {
    let summaries = state.lessons.list()?;
    state.progress.overview(&summaries).await
}

fn content_error(err: ContentError) -> Response {
    let status = match &err {
        ContentError::LessonNotFound(_) | ContentError::ExerciseNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        ContentError::InvalidId(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, "Content operation failed");
    }
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
