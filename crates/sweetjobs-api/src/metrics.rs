//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder.
/// Returns a handle that renders the scrape output.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "sweetjobs_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "sweetjobs_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "sweetjobs_http_requests_in_flight";

    // Domain metrics
    pub const LOCALIZED_WRITES_TOTAL: &str = "sweetjobs_localized_writes_total";
    pub const MAILS_TOTAL: &str = "sweetjobs_mails_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "sweetjobs_rate_limit_hits_total";
}

/// Label for requests no route matched.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Record an HTTP request under its route template.
pub fn record_http_request(method: &str, route: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", route.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a committed localized create, update or delete.
pub fn record_localized_write(entity: &'static str, operation: &'static str) {
    counter!(names::LOCALIZED_WRITES_TOTAL, "entity" => entity, "operation" => operation)
        .increment(1);
}

/// Record a mail delivery attempt.
pub fn record_mail(ok: bool) {
    let outcome = if ok { "sent" } else { "failed" };
    counter!(names::MAILS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(route: &str) {
    counter!(names::RATE_LIMIT_HITS_TOTAL, "endpoint" => route.to_string()).increment(1);
}

/// The matched route template, e.g. `/api/jobs/:id`.
/// Raw paths never become labels, so label cardinality stays bounded.
pub fn route_label<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let route = route_label(&request);
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &route, status, duration);

    response
}
