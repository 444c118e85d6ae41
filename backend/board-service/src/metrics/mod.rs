/// Prometheus metrics for board-service.
///
/// Exposes command, interpreter and chart collectors plus the `/metrics` handler.
use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Commands handled, by operation and outcome (ok, rejected, failed).
    pub static ref COMMANDS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "board_commands_total",
        "Board commands handled segmented by operation and outcome",
        &["operation", "outcome"]
    )
    .expect("failed to register board_commands_total");

    /// Interpretations by strategy and outcome (answered, fallback, invalid).
    pub static ref INTERPRETER_TOTAL: IntCounterVec = register_int_counter_vec!(
        "board_interpreter_total",
        "Command interpretations segmented by strategy and outcome",
        &["strategy", "outcome"]
    )
    .expect("failed to register board_interpreter_total");

    pub static ref REMOTE_CALL_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "board_remote_call_duration_seconds",
        "Remote interpretation latency segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register board_remote_call_duration_seconds");

    /// Data points rendered per chart.
    pub static ref CHART_POINTS: Histogram = register_histogram!(
        "board_chart_points",
        "Number of data points per generated chart",
        vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]
    )
    .expect("failed to register board_chart_points");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "board_http_request_duration_seconds",
        "HTTP request latency segmented by method and status",
        &["method", "status"]
    )
    .expect("failed to register board_http_request_duration_seconds");
}

pub fn record_command(operation: &str, outcome: &str) {
    COMMANDS_TOTAL.with_label_values(&[operation, outcome]).inc();
}

pub fn record_interpretation(strategy: &str, outcome: &str) {
    INTERPRETER_TOTAL.with_label_values(&[strategy, outcome]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
