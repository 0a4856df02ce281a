//! Metric definitions for outbound Keycloak requests

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

pub const REQUESTS_TOTAL: &str = "kcutils_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "kcutils_request_duration_seconds";

/// Register metric descriptions.
pub fn describe_metrics() {
    describe_counter!(
        REQUESTS_TOTAL,
        "Total number of Keycloak requests by method and outcome"
    );
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        "Keycloak request duration in seconds"
    );
}

/// Outcome label for a finished request: "transport_error" or the status class.
pub fn outcome_label(status: Option<u16>) -> &'static str {
    match status {
        None => "transport_error",
        Some(200..=299) => "2xx",
        Some(400..=499) => "4xx",
        Some(500..=599) => "5xx",
        Some(_) => "other",
    }
}

pub fn record_request(method: &str, status: Option<u16>, elapsed: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "outcome" => outcome_label(status)
    )
    .increment(1);
    histogram!(REQUEST_DURATION_SECONDS, "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}
