//! Logging and metrics bootstrap.
//!
//! [`init`] installs the process-wide `tracing` subscriber once, at startup.
//! The filter honours `WORKER_COOKIES_LOG` (`EnvFilter` syntax) and falls back
//! to the configured level.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing::{Subscriber, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

/// Overrides `[logging] level` when set.
pub const LOG_ENV: &str = "WORKER_COOKIES_LOG";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Describe metrics and install the global subscriber for `logging`.
///
/// Fails if a global subscriber is already installed.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    tracing_subscriber::registry()
        .with(log_filter(logging))
        .with(ErrorLayer::default())
        .with(log_layer(logging.format))
        .try_init()
        .map_err(|err| InfraError::telemetry(format!("subscriber already installed: {err}")))?;

    info!(
        level = %logging.level,
        format = ?logging.format,
        "Worker cookie telemetry initialized"
    );
    Ok(())
}

fn log_filter(logging: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(logging.level.into()))
}

fn log_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_thread_names(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_thread_names(true)
            .with_target(false)
            .boxed(),
    }
}

/// Register units and help text for every metric the crate emits.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "worker_cookies_cache_hit_total",
            Unit::Count,
            "Worker cache lookups answered from the cache, negative entries included."
        );
        describe_counter!(
            "worker_cookies_cache_miss_total",
            Unit::Count,
            "Worker cache lookups that found no entry."
        );
        describe_counter!(
            "worker_cookies_cache_evict_total",
            Unit::Count,
            "Worker cache entries evicted due to capacity."
        );
        describe_counter!(
            "worker_cookies_cache_invalidate_total",
            Unit::Count,
            "Worker cache entries removed after a committed write."
        );
        describe_counter!(
            "worker_cookies_durable_write_total",
            Unit::Count,
            "Committed worker record writes, labelled by create or update."
        );
        describe_counter!(
            "worker_cookies_reconcile_total",
            Unit::Count,
            "Worker location drifts rewritten by reconciliation."
        );
        describe_histogram!(
            "worker_cookies_write_ms",
            Unit::Milliseconds,
            "Cookie association latency in milliseconds, lock wait included."
        );
    });
}
