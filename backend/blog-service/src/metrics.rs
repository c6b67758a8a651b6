//! Prometheus metrics for blog-service.
//!
//! Exposes comment gate counters and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Comment submissions by outcome (accepted, comments_disabled, invalid).
    pub static ref COMMENT_SUBMISSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_comment_submissions_total",
        "Comment submissions segmented by gate outcome",
        &["outcome"]
    )
    .expect("failed to register blog_comment_submissions_total");

    /// Moderation actions (approve, delete) by outcome (ok, forbidden, not_found).
    pub static ref COMMENT_MODERATION_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_comment_moderation_total",
        "Comment moderation actions segmented by action and outcome",
        &["action", "outcome"]
    )
    .expect("failed to register blog_comment_moderation_total");

    /// HTTP request duration by method and status.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "blog_http_request_duration_seconds",
        "HTTP request duration segmented by method and status",
        &["method", "status"]
    )
    .expect("failed to register blog_http_request_duration_seconds");
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
