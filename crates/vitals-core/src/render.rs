//! Verdict aggregation and rendering.

use std::sync::Arc;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use strum::{AsRefStr, Display, IntoStaticStr};

use crate::{CheckResult, Headers};

/// Fallback hostname when the system name cannot be read.
const UNKNOWN_HOSTNAME: &str = "unknown";

/// Reduces results to one verdict.
///
/// The verdict passes only if every result passed; no results at all is a
/// passing verdict.
pub fn aggregate(results: &[CheckResult]) -> bool {
    results.iter().all(|result| result.passed)
}

/// Overall status reported in the rendered payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HealthStatus {
    /// Every considered check passed.
    Success,
    /// At least one considered check failed.
    Failure,
}

impl From<bool> for HealthStatus {
    fn from(passed: bool) -> Self {
        if passed { Self::Success } else { Self::Failure }
    }
}

/// Everything an evaluation produced, before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    /// Logical AND over every result's `passed`.
    pub verdict: bool,
    /// When the report was assembled.
    pub timestamp: Timestamp,
    /// Results in registration order, cached or fresh.
    pub results: Vec<CheckResult>,
    /// Resolved custom sections keyed by name.
    pub sections: Map<String, Value>,
}

impl HealthReport {
    /// Assembles a report, deriving the verdict from `results`.
    pub fn new(timestamp: Timestamp, results: Vec<CheckResult>, sections: Map<String, Value>) -> Self {
        Self {
            verdict: aggregate(&results),
            timestamp,
            results,
            sections,
        }
    }

    /// Returns the status matching the verdict.
    #[inline]
    pub fn status(&self) -> HealthStatus {
        self.verdict.into()
    }
}

/// Final output handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    /// Rendered payload.
    pub body: String,
    /// Status code to respond with.
    pub status: u16,
    /// Headers to respond with.
    pub headers: Headers,
}

/// Turns a report plus the status code and headers selected by its verdict
/// into a response.
///
/// Any `Fn(&HealthReport, u16, &Headers) -> HealthResponse` is a renderer.
pub trait Renderer: Send + Sync {
    /// Renders the report.
    fn render(&self, report: &HealthReport, status: u16, headers: &Headers) -> HealthResponse;
}

impl<F> Renderer for F
where
    F: Fn(&HealthReport, u16, &Headers) -> HealthResponse + Send + Sync,
{
    fn render(&self, report: &HealthReport, status: u16, headers: &Headers) -> HealthResponse {
        self(report, status, headers)
    }
}

/// Shared, type-erased renderer.
pub type SharedRenderer = Arc<dyn Renderer>;

/// Built-in JSON envelope renderer.
///
/// Produces `{hostname, status, timestamp, results}` with every custom section
/// merged in as an extra top-level key. The same renderer serves both
/// verdicts; `status` is taken from the report.
#[derive(Debug, Clone)]
pub struct JsonRenderer {
    hostname: String,
}

impl JsonRenderer {
    /// Creates a renderer stamping payloads with this machine's hostname.
    pub fn new() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_else(|| UNKNOWN_HOSTNAME.to_owned());
        Self::with_hostname(hostname)
    }

    /// Creates a renderer stamping payloads with the given hostname.
    pub fn with_hostname(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }

    /// Returns the hostname included in payloads.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Builds the JSON envelope for a report.
    pub fn envelope(&self, report: &HealthReport) -> Value {
        let mut envelope = json!({
            "hostname": self.hostname,
            "status": report.status(),
            "timestamp": report.timestamp.as_microsecond() as f64 / 1_000_000.0,
            "results": report.results,
        });

        if let Value::Object(fields) = &mut envelope {
            fields.extend(report.sections.clone());
        }

        envelope
    }
}

impl Default for JsonRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, report: &HealthReport, status: u16, headers: &Headers) -> HealthResponse {
        HealthResponse {
            body: self.envelope(report).to_string(),
            status,
            headers: headers.clone(),
        }
    }
}

/// Renders the plain-text body used when no renderer is configured.
pub(crate) fn render_plain(report: &HealthReport, status: u16, headers: &Headers) -> HealthResponse {
    let body = if report.verdict { "OK" } else { "NOT OK" };
    HealthResponse {
        body: body.to_owned(),
        status,
        headers: headers.clone(),
    }
}
