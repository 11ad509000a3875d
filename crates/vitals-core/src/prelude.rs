//! Convenient re-exports for common use.

pub use crate::check::{Check, CheckHandle, CheckOutcome, async_check_fn, check_fn};
pub use crate::config::{ExecutionMode, HealthConfig};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::health::HealthCheck;
pub use crate::render::{HealthReport, HealthResponse, HealthStatus, Renderer};
pub use crate::result::CheckResult;
pub use crate::section::Section;
