//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing_subscriber::fmt::MakeWriter;
use vitals_core::{FnCheck, HealthResponse, check_fn};

/// Log sink collecting everything written by a `fmt` subscriber.
#[derive(Debug, Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Returns everything logged so far.
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().expect("log capture poisoned");
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Installs a debug-level subscriber writing into this capture for the
    /// current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("log capture poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Parses a rendered JSON body.
pub fn body(response: &HealthResponse) -> anyhow::Result<Value> {
    Ok(serde_json::from_str(&response.body)?)
}

/// Check that always passes.
pub fn passing(name: &str) -> FnCheck {
    check_fn(name, || Ok((true, "it works".to_owned())))
}

/// Check that always fails with the given output.
pub fn failing(name: &str, output: &'static str) -> FnCheck {
    check_fn(name, move || Ok((false, output.to_owned())))
}

/// Check whose body returns an error.
pub fn throwing(name: &str) -> FnCheck {
    check_fn(name, || Err("My exception".into()))
}
