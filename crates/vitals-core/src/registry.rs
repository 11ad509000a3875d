//! Check and custom-section registry.

use std::fmt;
use std::sync::Arc;

use crate::check::{Check, CheckHandle, SharedCheck};
use crate::{Error, Result, Section, TRACING_TARGET_REGISTRY};

/// Ordered collection of checks plus named custom sections.
///
/// Registering a check under a name already in use replaces the earlier
/// check in place, so the name keeps the position of its first registration.
/// Section names must be unique.
#[derive(Clone, Default)]
pub struct Registry {
    checks: Vec<SharedCheck>,
    sections: Vec<(String, Section)>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a check and returns a handle naming it.
    pub fn register_check<C: Check>(&mut self, check: C) -> CheckHandle {
        self.register_shared(Arc::new(check))
    }

    /// Registers an already shared check.
    pub fn register_shared(&mut self, check: SharedCheck) -> CheckHandle {
        let handle = CheckHandle::new(check.name());
        let replaces = match self.checks.iter().position(|c| c.name() == handle.as_str()) {
            Some(index) => {
                self.checks[index] = check;
                true
            }
            None => {
                self.checks.push(check);
                false
            }
        };

        tracing::debug!(
            target: TRACING_TARGET_REGISTRY,
            check = %handle,
            replaces,
            "check registered"
        );

        handle
    }

    /// Registers a custom section.
    ///
    /// # Errors
    ///
    /// Returns a [`NameConflict`] error if a section with the same name is
    /// already registered; the existing section is left untouched.
    ///
    /// [`NameConflict`]: crate::ErrorKind::NameConflict
    pub fn register_section(&mut self, name: impl Into<String>, section: impl Into<Section>) -> Result<()> {
        let name = name.into();
        if self.sections.iter().any(|(existing, _)| *existing == name) {
            return Err(Error::name_conflict(&name));
        }

        tracing::debug!(
            target: TRACING_TARGET_REGISTRY,
            section = %name,
            "custom section registered"
        );

        self.sections.push((name, section.into()));
        Ok(())
    }

    /// Returns the checks to run, in registration order.
    ///
    /// With a filter, only the check with that exact name is returned (or
    /// nothing if there is none).
    pub fn list_checks(&self, filter: Option<&str>) -> Vec<SharedCheck> {
        self.checks
            .iter()
            .filter(|check| filter.is_none_or(|name| check.name() == name))
            .cloned()
            .collect()
    }

    /// Returns whether a check with this name is registered.
    pub fn contains_check(&self, name: &str) -> bool {
        self.checks.iter().any(|check| check.name() == name)
    }

    /// Returns the registered sections in registration order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(name, section)| (name.as_str(), section))
    }

    /// Returns the distinct check names in registration order.
    pub fn check_names(&self) -> Vec<String> {
        self.list_checks(None)
            .iter()
            .map(|check| check.name().to_owned())
            .collect()
    }

    /// Returns the section names in registration order.
    pub fn section_names(&self) -> Vec<String> {
        self.sections.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Removes every check and section.
    pub fn clear(&mut self) {
        self.checks.clear();
        self.sections.clear();
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("checks", &self.check_names())
            .field("sections", &self.section_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::check::{FnCheck, check_fn};

    fn passing(name: &str, output: &'static str) -> FnCheck {
        check_fn(name, move || Ok((true, output.to_owned())))
    }

    #[test]
    fn test_register_returns_handle() {
        let mut registry = Registry::new();
        let handle = registry.register_check(passing("db", "ok"));

        assert_eq!(handle.as_str(), "db");
        assert_eq!(registry.check_names(), ["db"]);
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let mut registry = Registry::new();
        registry.register_check(passing("a", "ok"));
        registry.register_check(passing("b", "ok"));
        registry.register_check(passing("c", "ok"));

        assert_eq!(registry.check_names(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_duplicate_keeps_first_position_latest_check() -> anyhow::Result<()> {
        let mut registry = Registry::new();
        registry.register_check(passing("a", "first"));
        registry.register_check(passing("b", "ok"));
        registry.register_check(passing("a", "second"));

        let checks = registry.list_checks(None);
        let names: Vec<_> = checks.iter().map(|c| c.name().to_owned()).collect();
        assert_eq!(names, ["a", "b"]);

        let (_, output) = checks[0].run().await.map_err(|e| anyhow::anyhow!(e))?;
        assert_eq!(output, "second");
        assert_eq!(registry.checks.len(), 2);
        Ok(())
    }

    #[test]
    fn test_reregistration_does_not_grow() {
        let mut registry = Registry::new();
        for _ in 0..5 {
            registry.register_check(passing("a", "ok"));
        }

        assert_eq!(registry.checks.len(), 1);
        assert!(registry.contains_check("a"));
        assert!(!registry.contains_check("b"));
    }

    #[test]
    fn test_filter_narrows_to_single_check() {
        let mut registry = Registry::new();
        registry.register_check(passing("a", "ok"));
        registry.register_check(passing("b", "ok"));
        registry.register_check(passing("c", "ok"));

        let filtered = registry.list_checks(Some("b"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name(), "b");

        assert!(registry.list_checks(Some("missing")).is_empty());
    }

    #[test]
    fn test_section_name_conflict() -> anyhow::Result<()> {
        let mut registry = Registry::new();
        registry.register_section("custom_section", Section::value("first"))?;

        let error = registry
            .register_section("custom_section", Section::value("second"))
            .err()
            .map(|e| e.kind());
        assert_eq!(error, Some(ErrorKind::NameConflict));

        let sections: Vec<_> = registry.sections().collect();
        assert_eq!(sections.len(), 1);
        assert!(matches!(
            sections[0].1,
            Section::Value(value) if value == "first"
        ));
        Ok(())
    }

    #[test]
    fn test_clear() -> anyhow::Result<()> {
        let mut registry = Registry::new();
        registry.register_check(passing("a", "ok"));
        registry.register_section("version", Section::value("1.0"))?;

        registry.clear();
        assert!(registry.check_names().is_empty());
        assert!(registry.section_names().is_empty());
        Ok(())
    }
}
