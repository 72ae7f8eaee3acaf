//! Delivery metrics.
//!
//! Counters go through the `metrics` facade; they are no-ops until the host
//! process installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const DELIVERIES_TOTAL: &str = "reelhook_deliveries_total";
    pub const DELIVERY_DURATION_SECONDS: &str = "reelhook_delivery_duration_seconds";
    pub const DELIVERY_FALLBACKS_TOTAL: &str = "reelhook_delivery_fallbacks_total";
    pub const UPLOAD_RESOLUTIONS_TOTAL: &str = "reelhook_upload_resolutions_total";
    pub const TRANSCODES_TOTAL: &str = "reelhook_transcodes_total";
}

/// Record a finished delivery attempt.
pub fn record_delivery(route: &str, outcome: &str, duration_secs: f64) {
    let labels = [
        ("route", route.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::DELIVERIES_TOTAL, &labels).increment(1);
    histogram!(names::DELIVERY_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a 422-triggered fields-only retry.
pub fn record_fallback() {
    counter!(names::DELIVERY_FALLBACKS_TOTAL).increment(1);
}

/// Record whether the resolver produced a URL (`url`) or not (`data_url`).
pub fn record_upload_resolution(result: &str) {
    let labels = [("result", result.to_string())];
    counter!(names::UPLOAD_RESOLUTIONS_TOTAL, &labels).increment(1);
}

/// Record a transcode attempt (`transcoded` or `original`).
pub fn record_transcode(result: &str) {
    let labels = [("result", result.to_string())];
    counter!(names::TRANSCODES_TOTAL, &labels).increment(1);
}
