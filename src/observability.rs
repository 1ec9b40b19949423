// SPDX-License-Identifier: MPL-2.0

//! Logging setup and the sink for fetch failures.

use anyhow::Result;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::FetchError;
use crate::config::ObservabilityConfig;
use crate::widgets::cascade::Level;

/// Told about fetches the controller could not apply.
///
/// Failures never reach the user beyond a reset control, so this is the only
/// place they become visible.
pub trait FetchObserver: Send + Sync {
    fn fetch_failed(&self, level: Level, parent: &str, error: &FetchError);

    /// A response arrived after a newer change at the same level.
    fn stale_discarded(&self, _level: Level, _parent: &str) {}
}

/// Reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl FetchObserver for TracingObserver {
    fn fetch_failed(&self, level: Level, parent: &str, error: &FetchError) {
        warn!(
            level,
            parent,
            kind = error.kind().as_str(),
            error = %error,
            "failed to load children"
        );
    }

    fn stale_discarded(&self, level: Level, parent: &str) {
        debug!(level, parent, "stale children response discarded");
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_format == "json" {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}
