//! Health check configuration.

use std::collections::BTreeMap;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Response header set returned alongside the rendered verdict.
pub type Headers = BTreeMap<String, String>;

/// Default values for configuration options.
mod defaults {
    use super::Headers;

    /// Default status code for a passing verdict.
    pub const SUCCESS_STATUS: u16 = 200;

    /// Default status code for a failing verdict.
    pub const FAILED_STATUS: u16 = 500;

    /// Default time-to-live of a passing result in seconds.
    pub const SUCCESS_TTL_SECS: f64 = 27.0;

    /// Default time-to-live of a failing result in seconds.
    pub const FAILED_TTL_SECS: f64 = 9.0;

    /// Default per-check deadline in seconds (disabled).
    pub const ERROR_TIMEOUT_SECS: f64 = 0.0;

    /// Default header set for both verdicts.
    pub fn headers() -> Headers {
        Headers::from([("Content-Type".to_owned(), "application/json".to_owned())])
    }
}

/// How due checks are dispatched within one evaluation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionMode {
    /// Checks run one after another; each still gets its own deadline.
    Sequential,
    /// All due checks run concurrently and are joined in registration order.
    #[default]
    Parallel,
}

/// Configuration for a [`HealthCheck`] instance.
///
/// [`HealthCheck`]: crate::HealthCheck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
#[serde(default)]
#[builder(
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct HealthConfig {
    /// Status code returned when every check passes.
    #[cfg_attr(
        feature = "config",
        arg(long = "health-success-status", env = "HEALTH_SUCCESS_STATUS", default_value_t = defaults::SUCCESS_STATUS)
    )]
    #[builder(default = "defaults::SUCCESS_STATUS")]
    pub success_status: u16,

    /// Status code returned when any check fails.
    #[cfg_attr(
        feature = "config",
        arg(long = "health-failed-status", env = "HEALTH_FAILED_STATUS", default_value_t = defaults::FAILED_STATUS)
    )]
    #[builder(default = "defaults::FAILED_STATUS")]
    pub failed_status: u16,

    /// Headers returned with a passing verdict.
    #[cfg_attr(feature = "config", arg(skip = defaults::headers()))]
    #[builder(default = "defaults::headers()")]
    pub success_headers: Headers,

    /// Headers returned with a failing verdict.
    #[cfg_attr(feature = "config", arg(skip = defaults::headers()))]
    #[builder(default = "defaults::headers()")]
    pub failed_headers: Headers,

    /// Seconds a passing result stays cached.
    #[cfg_attr(
        feature = "config",
        arg(long = "health-success-ttl", env = "HEALTH_SUCCESS_TTL_SECS", default_value_t = defaults::SUCCESS_TTL_SECS)
    )]
    #[builder(default = "defaults::SUCCESS_TTL_SECS")]
    pub success_ttl_secs: f64,

    /// Seconds a failing result stays cached.
    #[cfg_attr(
        feature = "config",
        arg(long = "health-failed-ttl", env = "HEALTH_FAILED_TTL_SECS", default_value_t = defaults::FAILED_TTL_SECS)
    )]
    #[builder(default = "defaults::FAILED_TTL_SECS")]
    pub failed_ttl_secs: f64,

    /// Per-check deadline in seconds; zero or less runs checks without one.
    #[cfg_attr(
        feature = "config",
        arg(long = "health-error-timeout", env = "HEALTH_ERROR_TIMEOUT_SECS", default_value_t = defaults::ERROR_TIMEOUT_SECS)
    )]
    #[builder(default = "defaults::ERROR_TIMEOUT_SECS")]
    pub error_timeout_secs: f64,

    /// Whether due checks run one at a time or all at once.
    #[cfg_attr(
        feature = "config",
        arg(long = "health-execution", env = "HEALTH_EXECUTION", value_enum, default_value_t = ExecutionMode::Parallel)
    )]
    #[builder(default)]
    pub execution: ExecutionMode,
}

impl HealthConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> HealthConfigBuilder {
        HealthConfigBuilder::default()
    }

    /// Returns how long a passing result stays cached.
    #[inline]
    pub fn success_ttl(&self) -> Duration {
        secs_to_duration(self.success_ttl_secs)
    }

    /// Returns how long a failing result stays cached.
    #[inline]
    pub fn failed_ttl(&self) -> Duration {
        secs_to_duration(self.failed_ttl_secs)
    }

    /// Returns the per-check deadline, or `None` when checks run unbounded.
    #[inline]
    pub fn error_timeout(&self) -> Option<Duration> {
        (self.error_timeout_secs > 0.0).then(|| secs_to_duration(self.error_timeout_secs))
    }

    /// Returns the status code and header set selected by the verdict.
    pub fn status_for(&self, passed: bool) -> (u16, &Headers) {
        if passed {
            (self.success_status, &self.success_headers)
        } else {
            (self.failed_status, &self.failed_headers)
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            success_status: defaults::SUCCESS_STATUS,
            failed_status: defaults::FAILED_STATUS,
            success_headers: defaults::headers(),
            failed_headers: defaults::headers(),
            success_ttl_secs: defaults::SUCCESS_TTL_SECS,
            failed_ttl_secs: defaults::FAILED_TTL_SECS,
            error_timeout_secs: defaults::ERROR_TIMEOUT_SECS,
            execution: ExecutionMode::default(),
        }
    }
}

impl HealthConfigBuilder {
    /// Wrapper for builder validation that returns String errors.
    fn validate(builder: &HealthConfigBuilder) -> Result<(), String> {
        for (field, secs) in [
            ("success_ttl_secs", builder.success_ttl_secs),
            ("failed_ttl_secs", builder.failed_ttl_secs),
            ("error_timeout_secs", builder.error_timeout_secs),
        ] {
            let Some(secs) = secs else {
                continue;
            };

            if !secs.is_finite() {
                return Err(format!("{field} must be a finite number of seconds"));
            }

            if secs > 0.0 && Duration::try_from_secs_f64(secs).is_err() {
                return Err(format!("{field} is too large to be represented as a duration"));
            }
        }

        for (field, secs) in [
            ("success_ttl_secs", builder.success_ttl_secs),
            ("failed_ttl_secs", builder.failed_ttl_secs),
        ] {
            if secs.is_some_and(|secs| secs < 0.0) {
                return Err(format!("{field} cannot be negative"));
            }
        }

        for (field, status) in [
            ("success_status", builder.success_status),
            ("failed_status", builder.failed_status),
        ] {
            if status.is_some_and(|status| !(100..=999).contains(&status)) {
                return Err(format!("{field} must be within 100..=999"));
            }
        }

        Ok(())
    }
}

/// Converts fractional seconds into a [`Duration`].
///
/// Values beyond the representable range saturate to [`Duration::MAX`];
/// negative and NaN input becomes zero.
fn secs_to_duration(secs: f64) -> Duration {
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) => duration,
        Err(_) if secs > 0.0 => Duration::MAX,
        Err(_) => Duration::ZERO,
    }
}
