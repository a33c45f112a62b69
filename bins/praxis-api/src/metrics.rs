// Prometheus counters for the API surface.

use lazy_static::lazy_static;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};
use tracing::error;

lazy_static! {
    pub static ref EXECUTIONS_TOTAL: IntCounter = register_int_counter!(
        "praxis_executions_total",
        "Script executions requested through the API"
    )
    .expect("metric can be registered");
    pub static ref REJECTIONS_TOTAL: IntCounter = register_int_counter!(
        "praxis_rejections_total",
        "Submissions refused by static validation"
    )
    .expect("metric can be registered");
    pub static ref TIMEOUTS_TOTAL: IntCounter = register_int_counter!(
        "praxis_timeouts_total",
        "Executions killed at the deadline"
    )
    .expect("metric can be registered");
    pub static ref TEST_SUITES_TOTAL: IntCounter = register_int_counter!(
        "praxis_test_suites_total",
        "Exercise test suites run through the API"
    )
    .expect("metric can be registered");
}

/// Renders the registry in the Prometheus text exposition format.
pub fn render() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(err) = encoder.encode(&prometheus::gather(), &mut buffer) {
        error!(error = %err, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
