//! Prometheus metrics for Vault request observability.
//!
//! The two metric objects are process-wide singletons created at first
//! touch. They are updated by [`HttpMetricCollector`] for every Vault
//! request that produced a response, whether or not a registry was
//! configured; registering them with a registry (done once during
//! [`TokenStorage::initialize`](crate::storage::TokenStorage::initialize))
//! only controls exposure. Registering the same metric twice against the
//! same registry fails loudly.

use crate::error::{Result, TokenStorageError};
use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use reqwest::{Method, StatusCode};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace applied to all metrics emitted by this crate.
pub const METRICS_NAMESPACE: &str = "tokenstorage";

/// Subsystem applied to all metrics emitted by this crate.
pub const METRICS_SUBSYSTEM: &str = "vault";

const REQUEST_COUNT_NAME: &str = "request_count_total";
const RESPONSE_TIME_NAME: &str = "response_time_seconds";

// The metric definitions below use literal names and label sets, which the
// prometheus crate only rejects for malformed identifiers.
#[allow(clippy::expect_used)]
static VAULT_REQUEST_COUNT: LazyLock<CounterVec> = LazyLock::new(|| {
    CounterVec::new(
        Opts::new(
            REQUEST_COUNT_NAME,
            "The request counts to Vault categorized by HTTP method and status code",
        )
        .namespace(METRICS_NAMESPACE)
        .subsystem(METRICS_SUBSYSTEM),
        &["method", "status"],
    )
    .expect("valid metric definition")
});

#[allow(clippy::expect_used)]
static VAULT_RESPONSE_TIME: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            RESPONSE_TIME_NAME,
            "The response time of Vault requests categorized by HTTP method and status code",
        )
        .namespace(METRICS_NAMESPACE)
        .subsystem(METRICS_SUBSYSTEM),
        &["method", "status"],
    )
    .expect("valid metric definition")
});

/// Register the Vault request metrics with `registry`.
///
/// # Errors
///
/// Returns [`TokenStorageError::MetricsRegistration`] if either metric
/// fails to register, including duplicate registration against the same
/// registry.
pub(crate) fn register(registry: &Registry) -> Result<()> {
    registry
        .register(Box::new(VAULT_REQUEST_COUNT.clone()))
        .map_err(|e| TokenStorageError::MetricsRegistration {
            metric: REQUEST_COUNT_NAME,
            message: e.to_string(),
        })?;

    registry
        .register(Box::new(VAULT_RESPONSE_TIME.clone()))
        .map_err(|e| TokenStorageError::MetricsRegistration {
            metric: RESPONSE_TIME_NAME,
            message: e.to_string(),
        })?;

    Ok(())
}

/// Selects which metrics to record for a completed Vault HTTP request.
///
/// A request that failed in transport has no response and therefore no
/// status code to label with; nothing is recorded for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpMetricCollector;

impl HttpMetricCollector {
    /// Record the request counter and response-time histogram for one
    /// request, labeled by HTTP method and status code.
    pub(crate) fn observe(self, method: &Method, status: Option<StatusCode>, elapsed: Duration) {
        let Some(status) = status else {
            return;
        };
        let status = status.as_u16().to_string();

        VAULT_REQUEST_COUNT
            .with_label_values(&[method.as_str(), &status])
            .inc();
        VAULT_RESPONSE_TIME
            .with_label_values(&[method.as_str(), &status])
            .observe(elapsed.as_secs_f64());
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice_fails() {
        let registry = Registry::new();
        register(&registry).expect("first registration succeeds");

        let err = register(&registry).expect_err("duplicate registration must fail");
        assert!(matches!(
            err,
            TokenStorageError::MetricsRegistration { metric, .. }
                if metric == REQUEST_COUNT_NAME
        ));
    }

    #[test]
    fn test_observe_without_response_records_nothing() {
        let before = VAULT_REQUEST_COUNT
            .with_label_values(&["GET", "200"])
            .get();

        HttpMetricCollector.observe(&Method::GET, None, Duration::from_millis(5));

        let after = VAULT_REQUEST_COUNT
            .with_label_values(&["GET", "200"])
            .get();
        assert!((after - before).abs() < f64::EPSILON);
    }

    #[test]
    fn test_observe_labels_by_method_and_status() {
        let before = VAULT_REQUEST_COUNT
            .with_label_values(&["DELETE", "204"])
            .get();

        HttpMetricCollector.observe(
            &Method::DELETE,
            Some(StatusCode::NO_CONTENT),
            Duration::from_millis(3),
        );

        let after = VAULT_REQUEST_COUNT
            .with_label_values(&["DELETE", "204"])
            .get();
        assert!((after - before - 1.0).abs() < f64::EPSILON);
    }
}
