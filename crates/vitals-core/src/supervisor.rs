//! Check execution with caching, deadlines and fault containment.
//!
//! The supervisor decides which checks are due (no fresh cached result),
//! runs each due check on its own task, and turns whatever happens into a
//! [`CheckResult`]:
//!
//! - a normal return is recorded as-is, with `response_time` rounded to
//!   microseconds;
//! - an error returned by the check, or a panic, is handed to the fault
//!   handler (by default `passed = false, output = <fault>`);
//! - a check still running when its deadline elapses yields
//!   `passed = false, output = "Timeout"` with `response_time` equal to the
//!   deadline. The task is detached, not killed, and may keep running.
//!
//! Every fresh result is written back to the [`ResultCache`] by the task that
//! produced it, and results are returned in the order checks were requested.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use jiff::Timestamp;

use crate::check::{SharedCheck, fault_from_join_error};
use crate::clock::{Clock, round_micros};
use crate::result::TIMEOUT_OUTPUT;
use crate::{
    BoxedError, CheckResult, Error, ExecutionMode, HealthConfig, ResultCache,
    TRACING_TARGET_SUPERVISOR,
};

/// Translates a check fault into a `(passed, output)` pair.
pub type FaultHandler = Arc<dyn Fn(&str, &BoxedError) -> (bool, String) + Send + Sync>;

/// Default fault translation: the check fails with the fault as its output.
pub fn basic_fault_handler(_check: &str, fault: &BoxedError) -> (bool, String) {
    (false, fault.to_string())
}

/// How a single check run ended.
enum Execution {
    Completed {
        passed: bool,
        output: String,
        elapsed: Duration,
    },
    Faulted {
        fault: BoxedError,
        elapsed: Duration,
    },
    TimedOut {
        deadline: Duration,
    },
}

/// A requested check, either already answered by the cache or due to run.
enum Slot {
    Cached(CheckResult),
    Due(SharedCheck),
}

/// Runs due checks and maintains the result cache.
#[derive(Clone)]
pub struct Supervisor {
    cache: ResultCache,
    success_ttl: Duration,
    failed_ttl: Duration,
    error_timeout: Option<Duration>,
    execution: ExecutionMode,
    fault_handler: FaultHandler,
}

impl Supervisor {
    /// Creates a supervisor using the TTLs, deadline and execution mode from
    /// `config`.
    pub fn new(config: &HealthConfig, cache: ResultCache) -> Self {
        Self {
            cache,
            success_ttl: config.success_ttl(),
            failed_ttl: config.failed_ttl(),
            error_timeout: config.error_timeout(),
            execution: config.execution,
            fault_handler: Arc::new(basic_fault_handler),
        }
    }

    /// Replaces the fault handler.
    pub fn with_fault_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &BoxedError) -> (bool, String) + Send + Sync + 'static,
    {
        self.fault_handler = Arc::new(handler);
        self
    }

    /// Returns the cache this supervisor reads and writes.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Returns one result per distinct check in `checks`, in request order.
    ///
    /// Checks with a result still fresh at `now` are answered from the cache
    /// without running. A name requested more than once is evaluated once, at
    /// its first position.
    pub async fn evaluate(&self, checks: &[SharedCheck], now: Timestamp) -> Vec<CheckResult> {
        let clock = Clock::anchored(now);
        let mut seen = HashSet::new();
        let mut slots = Vec::with_capacity(checks.len());

        for check in checks {
            if !seen.insert(check.name()) {
                continue;
            }

            match self.cache.get(check.name(), now).await {
                Some(result) => {
                    tracing::debug!(
                        target: TRACING_TARGET_SUPERVISOR,
                        check = %check.name(),
                        expires = %result.expires,
                        "serving cached result"
                    );
                    slots.push(Slot::Cached(result));
                }
                None => slots.push(Slot::Due(Arc::clone(check))),
            }
        }

        let due: Vec<SharedCheck> = slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Due(check) => Some(Arc::clone(check)),
                Slot::Cached(_) => None,
            })
            .collect();

        let mut fresh = self.execute_all(due, clock).await.into_iter();

        slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Cached(result) => Some(result),
                Slot::Due(_) => fresh.next(),
            })
            .collect()
    }

    /// Runs every due check according to the execution mode.
    async fn execute_all(&self, due: Vec<SharedCheck>, clock: Clock) -> Vec<CheckResult> {
        match self.execution {
            ExecutionMode::Parallel => {
                join_all(due.into_iter().map(|check| self.execute(check, clock))).await
            }
            ExecutionMode::Sequential => {
                let mut results = Vec::with_capacity(due.len());
                for check in due {
                    results.push(self.execute(check, clock).await);
                }
                results
            }
        }
    }

    /// Runs one check under its deadline, records and caches the result.
    async fn execute(&self, check: SharedCheck, clock: Clock) -> CheckResult {
        let name = check.name().to_owned();
        let execution = self.run_contained(check).await;

        let (passed, output, response_time) = match execution {
            Execution::Completed {
                passed,
                output,
                elapsed,
            } => (passed, output, round_micros(elapsed)),
            Execution::Faulted { fault, elapsed } => {
                let error = Error::check_fault().with_message(fault.to_string());
                tracing::error!(
                    target: TRACING_TARGET_SUPERVISOR,
                    check = %name,
                    error = %error,
                    error_debug = ?fault,
                    "check raised a fault"
                );
                let (passed, output) = (self.fault_handler)(&name, &fault);
                (passed, output, round_micros(elapsed))
            }
            Execution::TimedOut { deadline } => {
                let error = Error::check_timeout()
                    .with_message(format!("no result after {}s", deadline.as_secs_f64()));
                tracing::error!(
                    target: TRACING_TARGET_SUPERVISOR,
                    check = %name,
                    error = %error,
                    "check exceeded its deadline and was detached"
                );
                (false, TIMEOUT_OUTPUT.to_owned(), deadline)
            }
        };

        let ttl = if passed {
            self.success_ttl
        } else {
            self.failed_ttl
        };
        let result = CheckResult::new(&name, passed, output, clock.now(), ttl, response_time);

        if result.passed {
            tracing::debug!(
                target: TRACING_TARGET_SUPERVISOR,
                check = %name,
                response_time_ms = response_time.as_millis(),
                "{name} passed"
            );
        } else {
            tracing::error!(
                target: TRACING_TARGET_SUPERVISOR,
                check = %name,
                response_time_ms = response_time.as_millis(),
                "{name} failed with output {}",
                result.output
            );
        }

        self.cache.put(name, result.clone()).await;
        result
    }

    /// Spawns the check and waits for it, bounded by the deadline if any.
    ///
    /// Dropping the join handle on timeout detaches the task; it is never
    /// aborted, since check bodies are not assumed to be cancel-safe.
    async fn run_contained(&self, check: SharedCheck) -> Execution {
        let started = Instant::now();
        let task = tokio::spawn(async move { check.run().await });

        let joined = match self.error_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, task).await {
                Ok(joined) => joined,
                Err(_) => return Execution::TimedOut { deadline },
            },
            None => task.await,
        };

        let elapsed = started.elapsed();
        match joined {
            Ok(Ok((passed, output))) => Execution::Completed {
                passed,
                output,
                elapsed,
            },
            Ok(Err(fault)) => Execution::Faulted { fault, elapsed },
            Err(join_error) => Execution::Faulted {
                fault: fault_from_join_error(join_error),
                elapsed,
            },
        }
    }
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("success_ttl", &self.success_ttl)
            .field("failed_ttl", &self.failed_ttl)
            .field("error_timeout", &self.error_timeout)
            .field("execution", &self.execution)
            .finish_non_exhaustive()
    }
}
