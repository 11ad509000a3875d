//! Tracing subscriber setup.

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::TRACING_TARGET_TELEMETRY;

/// Filter applied when `RUST_LOG` is unset: one summary line per evaluation
/// plus failing checks, without per-check debug noise.
const DEFAULT_FILTER: &str = "info";

/// Installs a global `fmt` subscriber for a service hosting the health routes.
///
/// Call this once from the host's `main` before serving [`routes`]. Each
/// evaluation logs an `info` summary under `vitals_core::health`, failing
/// checks log at `error` under `vitals_core::supervisor`, and passing checks
/// only appear once that target is raised to `debug`:
///
/// ```bash
/// RUST_LOG=info,vitals_core::supervisor=debug my-service
/// ```
///
/// Hosts that already install their own subscriber should skip this and let
/// the `vitals_*` targets flow into it.
///
/// # Errors
///
/// Returns an error if `RUST_LOG` holds an invalid directive that cannot be
/// recovered from, or if a global subscriber is already set.
///
/// [`routes`]: crate::routes
pub fn initialize_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(fmt::layer().with_target(true))
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    tracing::debug!(target: TRACING_TARGET_TELEMETRY, "tracing initialized");
    Ok(())
}

/// Reads the filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
fn env_filter() -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("invalid log filter directive")
}
