//! Frame exporters and their registry.
//!
//! An exporter consumes each decoded frame: printing it, persisting it,
//! forwarding it. The registry maps exporter names to factories and is built
//! explicitly at startup; looking up an unknown name is an error, not a
//! panic.

pub mod hphc;

use std::collections::HashMap;
use std::path::PathBuf;

use teleinfo_protocol::Frame;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("unknown exporter '{0}'")]
    UnknownName(String),

    #[error("database error: {0}")]
    Database(#[from] crate::database::DatabaseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExporterError>;

/// Consumes decoded frames, one at a time.
pub trait Exporter: Send {
    fn export_frame(&mut self, frame: &Frame) -> Result<()>;
}

/// Settings shared with exporter factories at construction time.
#[derive(Debug, Clone, Default)]
pub struct ExporterSettings {
    /// Database path for persisting exporters.
    pub database_path: PathBuf,
}

pub type Factory = fn(&ExporterSettings) -> Result<Box<dyn Exporter>>;

/// Name → factory mapping, built once at startup.
pub struct Registry {
    factories: HashMap<&'static str, Factory>,
}

impl Registry {
    fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in exporters.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("hphc.json", hphc::new_json_exporter);
        registry.register("hphc.sqlite", hphc::new_sqlite_exporter);
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: Factory) {
        self.factories.insert(name, factory);
    }

    /// Registered exporter names, sorted for stable help output.
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Instantiate the named exporter.
    pub fn create(&self, name: &str, settings: &ExporterSettings) -> Result<Box<dyn Exporter>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ExporterError::UnknownName(name.to_string()))?;
        factory(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_lists_exporters() {
        let registry = Registry::builtin();
        assert_eq!(registry.list(), ["hphc.json", "hphc.sqlite"]);
    }

    #[test]
    fn test_unknown_name_is_error_not_panic() {
        let registry = Registry::builtin();
        let err = match registry.create("nope", &ExporterSettings::default()) {
            Err(err) => err,
            Ok(_) => panic!("expected an error for unknown exporter name"),
        };
        assert!(matches!(err, ExporterError::UnknownName(name) if name == "nope"));
    }

    #[test]
    fn test_create_json_exporter() {
        let registry = Registry::builtin();
        assert!(registry
            .create("hphc.json", &ExporterSettings::default())
            .is_ok());
    }

    #[test]
    fn test_register_custom_factory() {
        struct Null;
        impl Exporter for Null {
            fn export_frame(&mut self, _frame: &Frame) -> Result<()> {
                Ok(())
            }
        }
        fn new_null(_settings: &ExporterSettings) -> Result<Box<dyn Exporter>> {
            Ok(Box::new(Null))
        }

        let mut registry = Registry::builtin();
        registry.register("null", new_null);
        assert!(registry.list().contains(&"null"));
        assert!(registry.create("null", &ExporterSettings::default()).is_ok());
    }
}
