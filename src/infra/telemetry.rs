use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "storefront_list_cache_hit_total",
            Unit::Count,
            "Collection requests answered from the response cache."
        );
        describe_counter!(
            "storefront_list_cache_miss_total",
            Unit::Count,
            "Collection requests that had to query storage."
        );
        describe_counter!(
            "storefront_list_cache_store_total",
            Unit::Count,
            "Collection pages written to the response cache."
        );
        describe_histogram!(
            "storefront_list_query_ms",
            Unit::Milliseconds,
            "Storage latency of collection queries on cache miss."
        );
        describe_counter!(
            "storefront_health_probe_total",
            Unit::Count,
            "Health probes issued, labelled by service and outcome."
        );
        describe_histogram!(
            "storefront_health_probe_ms",
            Unit::Milliseconds,
            "Round-trip latency of health probes."
        );
    });
}
