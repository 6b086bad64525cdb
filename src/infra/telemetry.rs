use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the process-wide tracing subscriber, then register metric
/// descriptions.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default())
        .with(format_layer(logging.format))
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })?;

    describe_metrics();
    Ok(())
}

fn format_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber
        + for<'a> tracing_subscriber::registry::LookupSpan<'a>
        + Send
        + Sync
        + 'static,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    }
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "foglio_page_cache_hit_total",
            Unit::Count,
            "Total number of page-cache hits."
        );
        describe_counter!(
            "foglio_page_cache_miss_total",
            Unit::Count,
            "Total number of page-cache misses, expired entries included."
        );
        describe_counter!(
            "foglio_page_cache_store_total",
            Unit::Count,
            "Total number of responses buffered into the page cache."
        );
        describe_counter!(
            "foglio_page_cache_flush_total",
            Unit::Count,
            "Total number of page-cache flushes, publish-triggered and administrative."
        );
        describe_counter!(
            "foglio_posts_created_total",
            Unit::Count,
            "Total number of posts published."
        );
        describe_counter!(
            "foglio_comments_created_total",
            Unit::Count,
            "Total number of comments added."
        );
        describe_counter!(
            "foglio_follows_created_total",
            Unit::Count,
            "Total number of follow edges created."
        );
    });
}
