//! Custom sections merged into the rendered verdict.
//!
//! Sections are best-effort decoration: they are produced fresh on every
//! evaluation, never cached, and never affect the verdict. A producer that
//! fails or panics is logged and its key is left out of the payload.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::check::panic_message;
use crate::{BoxedError, Error, TRACING_TARGET_SECTIONS};

type Producer = dyn Fn() -> Result<Value, BoxedError> + Send + Sync;

/// Static value or producer contributing one top-level key to the payload.
#[derive(Clone)]
pub enum Section {
    /// A constant value.
    Value(Value),
    /// A producer invoked on every evaluation.
    Producer(Arc<Producer>),
}

impl Section {
    /// Creates a section with a constant value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Creates a section computed on every evaluation.
    pub fn producer<F, V>(func: F) -> Self
    where
        F: Fn() -> Result<V, BoxedError> + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self::Producer(Arc::new(move || func().map(Into::into)))
    }

    /// Produces the section value.
    pub fn resolve(&self) -> Result<Value, BoxedError> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Producer(func) => catch_unwind(AssertUnwindSafe(|| func()))
                .map_err(|payload| BoxedError::from(panic_message(payload)))?,
        }
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Producer(_) => f.debug_tuple("Producer").finish_non_exhaustive(),
        }
    }
}

impl From<Value> for Section {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Resolves every section in order, omitting those whose producer fails.
pub fn resolve_sections<'a, I>(sections: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'a str, &'a Section)>,
{
    let mut resolved = Map::new();
    for (name, section) in sections {
        match section.resolve() {
            Ok(value) => {
                resolved.insert(name.to_owned(), value);
            }
            Err(source) => {
                let error = Error::section_fault()
                    .with_message(source.to_string())
                    .with_source(source);
                tracing::warn!(
                    target: TRACING_TARGET_SECTIONS,
                    section = %name,
                    kind = error.kind_str(),
                    error = %error,
                    "custom section producer failed, section omitted"
                );
            }
        }
    }

    resolved
}
