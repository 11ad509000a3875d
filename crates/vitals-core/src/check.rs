//! Check abstraction and closure adapters.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use derive_more::{AsRef, Deref, Display};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinError;

use crate::BoxedError;

/// What a check body produces: `(passed, output)` or a fault.
pub type CheckOutcome = Result<(bool, String), BoxedError>;

/// A named probe whose pass/fail outcome contributes to the verdict.
///
/// Checks should be free of side effects. They may block or sleep; the
/// supervisor runs each one on its own task and stops waiting for it once its
/// deadline passes, but never forcibly terminates it.
#[async_trait]
pub trait Check: Send + Sync + 'static {
    /// Returns the unique name identifying this check.
    fn name(&self) -> &str;

    /// Runs the probe.
    async fn run(&self) -> CheckOutcome;
}

/// Shared, type-erased check as stored by the registry.
pub type SharedCheck = Arc<dyn Check>;

/// Name of a registered check, usable to evaluate it on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, AsRef, Deref, Display)]
#[as_ref(forward)]
pub struct CheckHandle(String);

impl CheckHandle {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the check name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

type BlockingFn = dyn Fn() -> CheckOutcome + Send + Sync;

/// Check backed by a blocking closure.
///
/// The closure runs on the blocking thread pool, so it may perform
/// synchronous I/O or sleep without stalling the async runtime.
#[derive(Clone)]
pub struct FnCheck {
    name: String,
    func: Arc<BlockingFn>,
}

impl FnCheck {
    /// Creates a new blocking check.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn() -> CheckOutcome + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for FnCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCheck").field("name", &self.name).finish()
    }
}

#[async_trait]
impl Check for FnCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> CheckOutcome {
        let func = Arc::clone(&self.func);
        tokio::task::spawn_blocking(move || func())
            .await
            .map_err(fault_from_join_error)?
    }
}

type AsyncFn = dyn Fn() -> BoxFuture<'static, CheckOutcome> + Send + Sync;

/// Check backed by a closure returning a future.
#[derive(Clone)]
pub struct AsyncFnCheck {
    name: String,
    func: Arc<AsyncFn>,
}

impl AsyncFnCheck {
    /// Creates a new asynchronous check.
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CheckOutcome> + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(move || func().boxed()),
        }
    }
}

impl fmt::Debug for AsyncFnCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFnCheck")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl Check for AsyncFnCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> CheckOutcome {
        (self.func)().await
    }
}

/// Creates a check from a blocking closure.
pub fn check_fn<F>(name: impl Into<String>, func: F) -> FnCheck
where
    F: Fn() -> CheckOutcome + Send + Sync + 'static,
{
    FnCheck::new(name, func)
}

/// Creates a check from a closure returning a future.
pub fn async_check_fn<F, Fut>(name: impl Into<String>, func: F) -> AsyncFnCheck
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CheckOutcome> + Send + 'static,
{
    AsyncFnCheck::new(name, func)
}

/// Converts a failed join into the fault it represents.
///
/// A panic keeps its payload message so the translated result reads like the
/// panic itself.
pub(crate) fn fault_from_join_error(error: JoinError) -> BoxedError {
    if error.is_panic() {
        panic_message(error.into_panic()).into()
    } else {
        "check task was cancelled".into()
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast_ref::<&'static str>() {
            Some(message) => (*message).to_owned(),
            None => "check panicked".to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_fn_check_runs_closure() -> anyhow::Result<()> {
        let check = check_fn("addition", || Ok((1 + 1 == 2, "addition works".into())));

        assert_eq!(check.name(), "addition");
        let (passed, output) = check.run().await.map_err(|e| anyhow::anyhow!(e))?;
        assert!(passed);
        assert_eq!(output, "addition works");
        Ok(())
    }

    #[tokio::test]
    async fn test_fn_check_error_is_fault() {
        let check = check_fn("broken", || Err("connection refused".into()));

        let fault = check.run().await.err().map(|e| e.to_string());
        assert_eq!(fault.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_fn_check_panic_is_fault() {
        let check = check_fn("explodes", || panic!("index out of range"));

        let fault = check.run().await.err().map(|e| e.to_string());
        assert_eq!(fault.as_deref(), Some("index out of range"));
    }

    #[tokio::test]
    async fn test_async_fn_check() -> anyhow::Result<()> {
        let check = async_check_fn("sleepy", || async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok((false, "woke up unhappy".to_owned()))
        });

        let (passed, output) = check.run().await.map_err(|e| anyhow::anyhow!(e))?;
        assert!(!passed);
        assert_eq!(output, "woke up unhappy");
        Ok(())
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42_u8)), "check panicked");
    }

    #[test]
    fn test_check_handle() {
        let handle = CheckHandle::new("db");
        assert_eq!(handle.as_str(), "db");
        assert_eq!(handle.to_string(), "db");
        assert_eq!(AsRef::<str>::as_ref(&handle), "db");
    }
}
