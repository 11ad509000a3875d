#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod handler;
mod telemetry;

pub use crate::handler::{HealthReply, routes};
pub use crate::telemetry::initialize_tracing;

/// Tracing target for request handling.
pub const TRACING_TARGET_HANDLER: &str = "vitals_server::handler";

/// Tracing target for subscriber setup.
pub const TRACING_TARGET_TELEMETRY: &str = "vitals_server::telemetry";
