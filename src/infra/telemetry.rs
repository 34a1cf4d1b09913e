use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::LoggingSettings;

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = if logging.json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer().compact().with_target(true).boxed()
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
            "timberline_cache_hit_total",
            Unit::Count,
            "Collection reads served from a fresh cached snapshot."
        );
        describe_counter!(
            "timberline_cache_miss_total",
            Unit::Count,
            "Collection reads that went to the backing store."
        );
        describe_counter!(
            "timberline_ai_generation_total",
            Unit::Count,
            "Content generation calls, labelled by outcome."
        );
        describe_counter!(
            "timberline_ai_tokens_total",
            Unit::Count,
            "Tokens consumed by completed generations."
        );
        describe_counter!(
            "timberline_side_effect_failure_total",
            Unit::Count,
            "Non-critical writes that failed without failing the request."
        );
    });
}
