//! Prometheus metrics for imagery-service.
//!
//! Source, fallback-tier and daily-cache counters live in a custom registry;
//! HTTP request metrics from the service-core middleware go through the
//! `metrics` facade into the Prometheus recorder. `/metrics` renders both.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Once, OnceLock};
use std::time::Duration;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static SOURCE_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static SOURCE_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static FALLBACK_TIER_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static DAILY_CACHE_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

static INIT: Once = Once::new();

/// Initialize all metrics. Safe to call more than once; later calls are no-ops.
pub fn init_metrics() {
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!(error = %e, "Prometheus recorder not installed"),
    }

    let registry = Registry::new();

    let source_requests = IntCounterVec::new(
        Opts::new(
            "imagery_source_requests_total",
            "Image source lookups by source and outcome",
        ),
        &["source", "outcome"],
    )
    .expect("Failed to create imagery_source_requests_total metric");

    let source_latency = HistogramVec::new(
        HistogramOpts::new(
            "imagery_source_latency_seconds",
            "Image source lookup latency in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["source"],
    )
    .expect("Failed to create imagery_source_latency_seconds metric");

    let fallback_tier = IntCounterVec::new(
        Opts::new(
            "imagery_fallback_tier_total",
            "Fallback tier that produced the resolved image",
        ),
        &["category", "tier"],
    )
    .expect("Failed to create imagery_fallback_tier_total metric");

    let daily_cache = IntCounterVec::new(
        Opts::new("imagery_daily_cache_total", "Daily cache lookups by result"),
        &["result"],
    )
    .expect("Failed to create imagery_daily_cache_total metric");

    let provider_errors = IntCounterVec::new(
        Opts::new(
            "imagery_provider_errors_total",
            "AI provider errors by provider and error type",
        ),
        &["provider", "error_type"],
    )
    .expect("Failed to create imagery_provider_errors_total metric");

    for collector in [
        Box::new(source_requests.clone()) as Box<dyn prometheus::core::Collector>,
        Box::new(source_latency.clone()),
        Box::new(fallback_tier.clone()),
        Box::new(daily_cache.clone()),
        Box::new(provider_errors.clone()),
    ] {
        registry
            .register(collector)
            .expect("Failed to register imagery metric");
    }

    let _ = SOURCE_REQUESTS_TOTAL.set(source_requests);
    let _ = SOURCE_LATENCY_SECONDS.set(source_latency);
    let _ = FALLBACK_TIER_TOTAL.set(fallback_tier);
    let _ = DAILY_CACHE_TOTAL.set(daily_cache);
    let _ = PROVIDER_ERRORS_TOTAL.set(provider_errors);
    let _ = REGISTRY.set(registry);
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    if let Some(registry) = REGISTRY.get() {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&registry.gather(), &mut buffer).ok();
        if let Ok(custom) = String::from_utf8(buffer) {
            output.push_str(&custom);
        }
    }

    if output.is_empty() {
        output.push_str("# Metrics recorder not initialized\n");
    }

    output
}

pub fn record_source_request(source: &str, outcome: &str, elapsed: Duration) {
    if let Some(counter) = SOURCE_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[source, outcome]).inc();
    }
    if let Some(histogram) = SOURCE_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[source])
            .observe(elapsed.as_secs_f64());
    }
}

pub fn record_fallback_tier(category: &str, tier: &str) {
    if let Some(counter) = FALLBACK_TIER_TOTAL.get() {
        counter.with_label_values(&[category, tier]).inc();
    }
}

pub fn record_daily_cache(result: &str) {
    if let Some(counter) = DAILY_CACHE_TOTAL.get() {
        counter.with_label_values(&[result]).inc();
    }
}

pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(counter) = PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_counters_show_up_in_output() {
        init_metrics();
        init_metrics();

        record_fallback_tier("space", "static_pool");
        record_daily_cache("hit");

        let output = get_metrics();
        assert!(output.contains("imagery_fallback_tier_total"));
        assert!(output.contains("imagery_daily_cache_total"));
    }
}
