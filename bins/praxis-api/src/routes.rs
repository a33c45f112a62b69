// Route table for the Praxis API.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::home))
        .route("/api/health", get(handlers::health_check))
        .route("/api/execute", post(handlers::execute_code))
        .route(
            "/api/exercises/:exercise_id/test",
            post(handlers::test_exercise),
        )
        .route("/api/lessons", get(handlers::list_lessons))
        .route("/api/lessons/:lesson_id", get(handlers::get_lesson))
        .route(
            "/api/lessons/:lesson_id/complete",
            post(handlers::complete_lesson),
        )
        .route(
            "/api/lessons/:lesson_id/progress",
            get(handlers::lesson_progress),
        )
        .route("/api/progress", get(handlers::get_progress))
        .route("/metrics", get(handlers::export_metrics))
}
