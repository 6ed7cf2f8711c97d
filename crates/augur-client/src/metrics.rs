//! Counters and histograms for the augur API.
//!
//! Statuses are bucketed into classes so the label set stays small. Nothing
//! here installs a recorder; without one every call is a no-op.

use std::time::Duration;

use metrics::{counter, histogram};

pub const REQUESTS_TOTAL: &str = "augur_requests_total";
pub const REQUEST_SECONDS: &str = "augur_request_seconds";
pub const ACCOUNT_READ_RETRIES_TOTAL: &str = "augur_account_read_retries_total";
pub const POLL_PROBES_TOTAL: &str = "augur_poll_probes_total";

/// Label for an HTTP status. `None` covers failures with no usable status,
/// such as a dropped connection or an undecodable body.
pub fn status_class(status: Option<u16>) -> &'static str {
    match status {
        None => "failed",
        Some(200..=299) => "2xx",
        Some(401) => "unauthorized",
        Some(429) => "rate_limited",
        Some(400..=499) => "4xx",
        Some(500..=599) => "5xx",
        Some(_) => "other",
    }
}

/// One finished call to the API, successful or not.
pub fn record_request(operation: &'static str, status: Option<u16>, elapsed: Duration) {
    counter!(REQUESTS_TOTAL, "operation" => operation, "status" => status_class(status)).increment(1);
    histogram!(REQUEST_SECONDS, "operation" => operation).record(elapsed.as_secs_f64());
}

/// An account read about to be repeated.
pub fn record_retry(operation: &str) {
    counter!(ACCOUNT_READ_RETRIES_TOTAL, "operation" => operation.to_string()).increment(1);
}

/// A usage-history probe issued by the tracker.
pub fn record_probe(service: &str) {
    counter!(POLL_PROBES_TOTAL, "service" => service.to_string()).increment(1);
}
