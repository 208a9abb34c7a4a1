//! Prometheus metrics exposition
//!
//! - `docsie_tokens_issued_total` (counter): label `route`
//! - `docsie_requests_rejected_total` (counter): label `reason`

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return a handle for `/metrics`.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record a token handed out by `route` (`login` or `token`).
pub fn record_token_issued(route: &'static str) {
    metrics::counter!("docsie_tokens_issued_total", "route" => route).increment(1);
}

/// Record a request answered with an error.
pub fn record_rejected(reason: &'static str) {
    metrics::counter!("docsie_requests_rejected_total", "reason" => reason).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusRecorder;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_token_issued("token");
        record_rejected("invalid_request");
    }

    /// Isolated recorder; only one global recorder may exist per process.
    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn token_counter_carries_route_label() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_token_issued("login");
        record_token_issued("token");
        record_token_issued("token");

        let output = handle.render();
        assert!(output.contains("docsie_tokens_issued_total"), "got: {output}");
        assert!(output.contains("route=\"login\""));
        assert!(output.contains("docsie_tokens_issued_total{route=\"token\"} 2"));
    }

    #[test]
    fn rejection_counter_carries_reason_label() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_rejected("not_configured");

        let output = handle.render();
        assert!(output.contains("docsie_requests_rejected_total{reason=\"not_configured\"} 1"));
    }
}
