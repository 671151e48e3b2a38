// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.

use metrics::{describe_counter, describe_histogram};

pub const REQUESTS_TOTAL: &str = "unison_context_requests_total";
pub const REQUEST_LATENCY: &str = "unison_context_request_latency_seconds";
pub const BACKEND_DEGRADED_TOTAL: &str = "unison_context_backend_degraded_total";
pub const DECRYPT_FALLBACK_TOTAL: &str = "unison_context_decrypt_fallback_total";

/// Register metric descriptions. Called once after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Requests handled, by operation and outcome");
    describe_histogram!(
        REQUEST_LATENCY,
        "Request handling latency in seconds, by operation"
    );
    describe_counter!(
        BACKEND_DEGRADED_TOTAL,
        "Durable backend calls that failed and were absorbed by the cache"
    );
    describe_counter!(
        DECRYPT_FALLBACK_TOTAL,
        "Stored payloads that could not be decrypted and fell back"
    );
}

/// Count one handled request. `outcome` is `ok`, `rejected` or `error`.
pub fn record_request(operation: &str, outcome: &str) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn record_latency(operation: &str, seconds: f64) {
    metrics::histogram!(REQUEST_LATENCY, "operation" => operation.to_string()).record(seconds);
}

/// Count a durable backend failure that degraded a response.
pub fn record_backend_degraded(operation: &str) {
    metrics::counter!(BACKEND_DEGRADED_TOTAL, "operation" => operation.to_string()).increment(1);
}

/// Count a decode that did not take the configured branch.
pub fn record_decrypt_fallback(record: &str) {
    metrics::counter!(DECRYPT_FALLBACK_TOTAL, "record" => record.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn helpers_record_labelled_series() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            register_metrics();
            record_request("kv.put", "ok");
            record_request("kv.put", "ok");
            record_request("kv.put", "rejected");
            record_backend_degraded("kv.get");
            record_decrypt_fallback("profile");
            record_latency("kv.put", 0.004);
        });

        let rendered = handle.render();
        assert!(rendered.contains(
            r#"unison_context_requests_total{operation="kv.put",outcome="ok"} 2"#
        ));
        assert!(rendered.contains(
            r#"unison_context_requests_total{operation="kv.put",outcome="rejected"} 1"#
        ));
        assert!(rendered.contains(r#"unison_context_backend_degraded_total{operation="kv.get"} 1"#));
        assert!(rendered.contains(r#"unison_context_decrypt_fallback_total{record="profile"} 1"#));
        assert!(rendered.contains("unison_context_request_latency_seconds"));
    }

    #[test]
    fn helpers_without_recorder_are_noops() {
        record_request("health", "ok");
        record_backend_degraded("kv.put");
    }
}
