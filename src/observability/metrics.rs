//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by route, status
//! - `relay_request_duration_seconds` (histogram): latency distribution
//! - `relay_workbook_downloads_total` (counter): per-workbook outcome
//! - `relay_upstream_errors_total` (counter): failed upstream calls by call
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus
//! recorder, so handlers can record unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!("relay_requests_total", "route" => route.to_string(), "status" => status.clone())
        .increment(1);
    histogram!("relay_request_duration_seconds", "route" => route.to_string(), "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_workbook_download(succeeded: bool) {
    let outcome = if succeeded { "success" } else { "failure" };
    counter!("relay_workbook_downloads_total", "outcome" => outcome).increment(1);
}

pub fn record_upstream_error(call: &'static str) {
    counter!("relay_upstream_errors_total", "call" => call).increment(1);
}

/// Middleware recording count and latency per matched route.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&route, response.status().as_u16(), start);
    response
}
