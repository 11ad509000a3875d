//! Health check entry point.
//!
//! [`HealthCheck`] owns a registry, a result cache and a supervisor, and
//! exposes the two contracts a transport layer needs: registering checks and
//! sections, and producing the current verdict.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use jiff::Timestamp;
use tokio::sync::RwLock;

use crate::check::{Check, CheckHandle};
use crate::clock::Clock;
use crate::render::{JsonRenderer, SharedRenderer, render_plain};
use crate::section::resolve_sections;
use crate::{
    BoxedError, HealthConfig, HealthReport, HealthResponse, Registry, Renderer, Result,
    ResultCache, Section, Supervisor, TRACING_TARGET_HEALTH,
};

/// Health check aggregation service.
///
/// This type is `Clone` and all clones share the same registry and cache
/// through `Arc`, so one instance can be registered with at startup and then
/// handed to request handlers.
///
/// # Example
///
/// ```no_run
/// # use vitals_core::prelude::*;
/// # async fn example() -> vitals_core::Result<()> {
/// let health = HealthCheck::new(HealthConfig::default());
/// let db = health
///     .register_check(check_fn("database", || Ok((true, "connected".into()))))
///     .await;
///
/// // Every check
/// let response = health.evaluate(None).await;
///
/// // Only the database check
/// let response = health.evaluate(Some(db.as_str())).await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HealthCheck {
    config: Arc<HealthConfig>,
    registry: Arc<RwLock<Registry>>,
    supervisor: Supervisor,
    success_renderer: Option<SharedRenderer>,
    failure_renderer: Option<SharedRenderer>,
}

impl HealthCheck {
    /// Creates a health check with an empty registry.
    pub fn new(config: HealthConfig) -> Self {
        Self::with_registry(config, Registry::new())
    }

    /// Creates a health check over a pre-populated registry.
    pub fn with_registry(config: HealthConfig, registry: Registry) -> Self {
        tracing::info!(
            target: TRACING_TARGET_HEALTH,
            success_ttl_secs = config.success_ttl_secs,
            failed_ttl_secs = config.failed_ttl_secs,
            error_timeout_secs = config.error_timeout_secs,
            execution = %config.execution,
            "health check initialized"
        );

        let renderer: SharedRenderer = Arc::new(JsonRenderer::new());
        Self {
            supervisor: Supervisor::new(&config, ResultCache::new()),
            config: Arc::new(config),
            registry: Arc::new(RwLock::new(registry)),
            success_renderer: Some(Arc::clone(&renderer)),
            failure_renderer: Some(renderer),
        }
    }

    /// Replaces the renderer used for passing verdicts.
    pub fn with_success_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.success_renderer = Some(Arc::new(renderer));
        self
    }

    /// Replaces the renderer used for failing verdicts.
    pub fn with_failure_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.failure_renderer = Some(Arc::new(renderer));
        self
    }

    /// Responds to passing verdicts with the plain body `OK`.
    pub fn without_success_renderer(mut self) -> Self {
        self.success_renderer = None;
        self
    }

    /// Responds to failing verdicts with the plain body `NOT OK`.
    pub fn without_failure_renderer(mut self) -> Self {
        self.failure_renderer = None;
        self
    }

    /// Replaces the translation applied to check faults.
    pub fn with_fault_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &BoxedError) -> (bool, String) + Send + Sync + 'static,
    {
        self.supervisor = self.supervisor.with_fault_handler(handler);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    /// Returns the shared result cache.
    pub fn cache(&self) -> &ResultCache {
        self.supervisor.cache()
    }

    /// Registers a check and returns a handle naming it.
    ///
    /// A check registered under a name already in use replaces the earlier
    /// one, and any result cached for that name is dropped so the new check
    /// runs on the next evaluation.
    pub async fn register_check<C: Check>(&self, check: C) -> CheckHandle {
        let (handle, replaced) = {
            let mut registry = self.registry.write().await;
            let replaced = registry.contains_check(check.name());
            (registry.register_check(check), replaced)
        };

        if replaced && self.cache().invalidate(handle.as_str()).await {
            tracing::debug!(
                target: TRACING_TARGET_HEALTH,
                check = %handle,
                "cached result of replaced check dropped"
            );
        }

        handle
    }

    /// Registers a custom section.
    ///
    /// # Errors
    ///
    /// Returns a [`NameConflict`] error if the name is already taken.
    ///
    /// [`NameConflict`]: crate::ErrorKind::NameConflict
    pub async fn register_section(&self, name: impl Into<String>, section: impl Into<Section>) -> Result<()> {
        self.registry.write().await.register_section(name, section)
    }

    /// Returns the registered check names in registration order.
    pub async fn check_names(&self) -> Vec<String> {
        self.registry.read().await.check_names()
    }

    /// Returns the registered section names in registration order.
    pub async fn section_names(&self) -> Vec<String> {
        self.registry.read().await.section_names()
    }

    /// Removes every check and section and drops all cached results.
    pub async fn unregister_all(&self) {
        self.registry.write().await.clear();
        self.cache().clear().await;

        tracing::debug!(target: TRACING_TARGET_HEALTH, "all checks and sections unregistered");
    }

    /// Evaluates checks and renders the verdict.
    ///
    /// With a filter, only the check of that name is run and only its result
    /// counts toward the verdict.
    pub async fn evaluate(&self, filter: Option<&str>) -> HealthResponse {
        self.evaluate_at(filter, Timestamp::now()).await
    }

    /// Evaluates checks as of `now` and renders the verdict.
    pub async fn evaluate_at(&self, filter: Option<&str>, now: Timestamp) -> HealthResponse {
        let report = self.report_at(filter, now).await;
        self.render(&report)
    }

    /// Evaluates checks and returns the unrendered report.
    pub async fn report(&self, filter: Option<&str>) -> HealthReport {
        self.report_at(filter, Timestamp::now()).await
    }

    /// Evaluates checks as of `now` and returns the unrendered report.
    #[tracing::instrument(skip(self, now), target = TRACING_TARGET_HEALTH)]
    pub async fn report_at(&self, filter: Option<&str>, now: Timestamp) -> HealthReport {
        let started = Instant::now();
        let clock = Clock::anchored(now);

        let (checks, sections) = {
            let registry = self.registry.read().await;
            let sections: Vec<(String, Section)> = registry
                .sections()
                .map(|(name, section)| (name.to_owned(), section.clone()))
                .collect();
            (registry.list_checks(filter), sections)
        };

        let results = self.supervisor.evaluate(&checks, clock.anchor()).await;
        let sections = resolve_sections(
            sections
                .iter()
                .map(|(name, section)| (name.as_str(), section)),
        );

        let report = HealthReport::new(clock.now(), results, sections);

        tracing::info!(
            target: TRACING_TARGET_HEALTH,
            checks = report.results.len(),
            failed = report.results.iter().filter(|r| !r.passed).count(),
            status = %report.status(),
            duration_ms = started.elapsed().as_millis(),
            "health check evaluated"
        );

        report
    }

    /// Renders a report with the renderer, status code and headers selected
    /// by its verdict.
    pub fn render(&self, report: &HealthReport) -> HealthResponse {
        let (status, headers) = self.config.status_for(report.verdict);
        let renderer = if report.verdict {
            self.success_renderer.as_ref()
        } else {
            self.failure_renderer.as_ref()
        };

        match renderer {
            Some(renderer) => renderer.render(report, status, headers),
            None => render_plain(report, status, headers),
        }
    }
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}

impl fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheck")
            .field("config", &self.config)
            .field("supervisor", &self.supervisor)
            .finish_non_exhaustive()
    }
}
