#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for registry operations.
pub const TRACING_TARGET_REGISTRY: &str = "vitals_core::registry";

/// Tracing target for check execution.
pub const TRACING_TARGET_SUPERVISOR: &str = "vitals_core::supervisor";

/// Tracing target for custom section resolution.
pub const TRACING_TARGET_SECTIONS: &str = "vitals_core::sections";

/// Tracing target for evaluation summaries.
pub const TRACING_TARGET_HEALTH: &str = "vitals_core::health";

mod cache;
mod check;
mod clock;
mod config;
mod error;
mod health;
mod registry;
mod render;
mod result;
mod section;
mod supervisor;

pub mod prelude;

pub use async_trait::async_trait;
pub use cache::ResultCache;
pub use check::{
    AsyncFnCheck, Check, CheckHandle, CheckOutcome, FnCheck, SharedCheck, async_check_fn, check_fn,
};
pub use config::{ExecutionMode, HealthConfig, HealthConfigBuilder, HealthConfigBuilderError, Headers};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use health::HealthCheck;
pub use registry::Registry;
pub use render::{
    HealthReport, HealthResponse, HealthStatus, JsonRenderer, Renderer, SharedRenderer, aggregate,
};
pub use result::{CheckResult, TIMEOUT_OUTPUT};
pub use section::{Section, resolve_sections};
pub use supervisor::{FaultHandler, Supervisor, basic_fault_handler};
