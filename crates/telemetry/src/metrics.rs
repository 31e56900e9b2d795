//! The gateway's Prometheus registry and the metrics recorded against it.

use std::time::Instant;

use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGaugeVec, Registry, TextEncoder, register_histogram_vec_with_registry, register_int_counter_vec_with_registry, register_int_gauge_vec_with_registry};

/// The gateway's metric set, registered against one [`Registry`].
///
/// Cloning is cheap: every field is an `Arc`-backed Prometheus collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration_seconds: HistogramVec,
    breaker_state: IntGaugeVec,
    breaker_transitions_total: IntCounterVec,
    rate_limit_rejections_total: IntCounterVec,
    quota_rejections_total: IntCounterVec,
}

impl Metrics {
    /// Builds and registers the full metric set.
    pub fn new() -> Self {
        let registry = Registry::new();

        let requests_total = register_int_counter_vec_with_registry!(
            "gateway_requests_total",
            "HTTP requests handled, by method, route and status code",
            &["method", "route", "status"],
            registry
        )
        .expect("metric registration is infallible for a fresh registry");

        let request_duration_seconds = register_histogram_vec_with_registry!(
            "gateway_request_duration_seconds",
            "HTTP request duration in seconds, by method and route",
            &["method", "route"],
            registry
        )
        .expect("metric registration is infallible for a fresh registry");

        let breaker_state = register_int_gauge_vec_with_registry!(
            "gateway_circuit_breaker_state",
            "Circuit breaker state per lease: 0=closed, 1=open, 2=half_open",
            &["lease_id"],
            registry
        )
        .expect("metric registration is infallible for a fresh registry");

        let breaker_transitions_total = register_int_counter_vec_with_registry!(
            "gateway_circuit_breaker_transitions_total",
            "Circuit breaker state transitions per lease",
            &["lease_id"],
            registry
        )
        .expect("metric registration is infallible for a fresh registry");

        let rate_limit_rejections_total = register_int_counter_vec_with_registry!(
            "gateway_rate_limit_rejections_total",
            "Requests rejected by the per-lease rate limiter",
            &["lease_id"],
            registry
        )
        .expect("metric registration is infallible for a fresh registry");

        let quota_rejections_total = register_int_counter_vec_with_registry!(
            "gateway_quota_rejections_total",
            "Requests rejected for exceeding a quota cap",
            &["key_id"],
            registry
        )
        .expect("metric registration is infallible for a fresh registry");

        Self {
            registry,
            requests_total,
            request_duration_seconds,
            breaker_state,
            breaker_transitions_total,
            rate_limit_rejections_total,
            quota_rejections_total,
        }
    }

    /// Records one completed request.
    pub fn record_request(&self, method: &str, route: &str, status: u16, elapsed: std::time::Duration) {
        self.requests_total.with_label_values(&[method, route, &status.to_string()]).inc();
        self.request_duration_seconds.with_label_values(&[method, route]).observe(elapsed.as_secs_f64());
    }

    /// Starts a timer for the current request; drop or call
    /// [`RequestTimer::finish`] once the response is known.
    pub fn start_request(&self) -> RequestTimer {
        RequestTimer { start: Instant::now() }
    }

    /// Updates the breaker-state gauge for `lease_id`. `state` is 0/1/2 for
    /// closed/open/half_open, matching `circuit_breaker::State`'s ordinal.
    pub fn set_breaker_state(&self, lease_id: &str, state: u8) {
        self.breaker_state.with_label_values(&[lease_id]).set(state as i64);
        self.breaker_transitions_total.with_label_values(&[lease_id]).inc();
    }

    /// Records a rate-limit rejection for the given lease.
    pub fn record_rate_limit_rejection(&self, lease_id: &str) {
        self.rate_limit_rejections_total.with_label_values(&[lease_id]).inc();
    }

    /// Records a quota rejection for the given key.
    pub fn record_quota_rejection(&self, key_id: &str) {
        self.quota_rejections_total.with_label_values(&[key_id]).inc();
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let families = self.registry.gather();

        encoder
            .encode(&families, &mut buffer)
            .expect("encoding a gathered metric family to a Vec<u8> never fails");

        String::from_utf8(buffer).expect("Prometheus text encoding is always valid UTF-8")
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// An in-flight request timer. Call [`finish`](Self::finish) once the
/// response is known to record method/route/status/duration together.
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    /// Records the elapsed time against `metrics` for the given labels.
    pub fn finish(self, metrics: &Metrics, method: &str, route: &str, status: u16) {
        metrics.record_request(method, route, status, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_includes_registered_metric_names() {
        let metrics = Metrics::new();
        metrics.record_request("GET", "/peer/demo", 200, std::time::Duration::from_millis(5));

        let body = metrics.encode();
        assert!(body.contains("gateway_requests_total"));
        assert!(body.contains("gateway_request_duration_seconds"));
    }

    #[test]
    fn set_breaker_state_updates_gauge_and_counts_transition() {
        let metrics = Metrics::new();
        metrics.set_breaker_state("lease-a", 1);

        let body = metrics.encode();
        assert!(body.contains("gateway_circuit_breaker_state"));
        assert!(body.contains("gateway_circuit_breaker_transitions_total"));
    }
}
