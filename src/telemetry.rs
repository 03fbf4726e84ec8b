use std::sync::Once;

use metrics::{Unit, describe_counter};
use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

static METRIC_DESCRIPTIONS: Once = Once::new();

#[derive(Debug, Error)]
#[error("telemetry initialization failed: {reason}")]
pub struct TelemetryError {
    reason: String,
}

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), TelemetryError> {
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
        .map_err(|err| TelemetryError {
            reason: format!("failed to install tracing subscriber: {err}"),
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "brezza_ramcache_hit_total",
            Unit::Count,
            "Total number of RAM response-cache hits."
        );
        describe_counter!(
            "brezza_ramcache_miss_total",
            Unit::Count,
            "Total number of RAM response-cache misses."
        );
        describe_counter!(
            "brezza_ramcache_evict_total",
            Unit::Count,
            "Total number of RAM response-cache evictions due to capacity."
        );
        describe_counter!(
            "brezza_not_modified_total",
            Unit::Count,
            "Total number of requests answered with 304 Not Modified."
        );
    });
}
