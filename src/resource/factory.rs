//! Resource factories keyed by file extension.
//!
//! A `FactoryTable` maps an extension (`xmi`, `ecore`) to the factory creating
//! resources for it, with the `*` entry used for unknown or missing
//! extensions. A process-wide default table seeds every new resource set,
//! which then works on its own copy.

use super::codec::{Codec, JsonCodec};
use super::Resource;
use crate::error::ModelError;
use crate::metamodel::ECORE_NS_URI;
use crate::uri::Uri;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Key of the fallback factory.
pub const WILDCARD: &str = "*";

/// Creates empty resources for a document kind.
pub trait ResourceFactory: Send + Sync + fmt::Debug {
    /// Short name of the document kind (`xmi`, `ecore`).
    fn kind(&self) -> &str;

    fn create(&self, uri: Uri) -> Resource;
}

/// Factory producing resources backed by a fixed codec.
#[derive(Debug, Clone)]
pub struct CodecResourceFactory {
    kind: String,
    codec: Arc<dyn Codec>,
}

impl CodecResourceFactory {
    pub fn new(kind: impl Into<String>, codec: Arc<dyn Codec>) -> Self {
        Self {
            kind: kind.into(),
            codec,
        }
    }

    /// General model documents.
    pub fn xmi() -> Self {
        Self::new("xmi", Arc::new(JsonCodec::new()))
    }

    /// Metamodel documents; unprefixed types are Ecore types.
    pub fn ecore() -> Self {
        Self::new("ecore", Arc::new(JsonCodec::with_default_namespace(ECORE_NS_URI)))
    }
}

impl ResourceFactory for CodecResourceFactory {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn create(&self, uri: Uri) -> Resource {
        Resource::with_codec(uri, self.kind.clone(), Arc::clone(&self.codec))
    }
}

/// Extension to factory mapping.
#[derive(Debug, Clone, Default)]
pub struct FactoryTable {
    factories: HashMap<String, Arc<dyn ResourceFactory>>,
}

impl FactoryTable {
    /// Empty table, without even a wildcard.
    pub fn new() -> Self {
        Self::default()
    }

    /// `xmi`, `ecore` and a `*` fallback producing xmi resources.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        let xmi: Arc<dyn ResourceFactory> = Arc::new(CodecResourceFactory::xmi());
        table.register("xmi", Arc::clone(&xmi));
        table.register("ecore", Arc::new(CodecResourceFactory::ecore()));
        table.register(WILDCARD, xmi);
        table
    }

    pub fn register(&mut self, extension: impl Into<String>, factory: Arc<dyn ResourceFactory>) {
        self.factories.insert(extension.into(), factory);
    }

    pub fn get(&self, extension: &str) -> Option<Arc<dyn ResourceFactory>> {
        self.factories.get(extension).cloned()
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.factories.contains_key(extension)
    }

    pub fn remove(&mut self, extension: &str) -> Option<Arc<dyn ResourceFactory>> {
        self.factories.remove(extension)
    }

    /// Factory for `extension`, falling back to the wildcard.
    pub fn select(&self, extension: Option<&str>) -> Result<Arc<dyn ResourceFactory>, ModelError> {
        extension
            .and_then(|ext| self.get(ext))
            .or_else(|| self.get(WILDCARD))
            .ok_or_else(|| {
                ModelError::NotImplemented(format!(
                    "no resource factory for extension {:?} and no '{}' fallback",
                    extension, WILDCARD
                ))
            })
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.factories.keys().cloned().collect();
        keys.sort();
        keys
    }
}

fn default_table() -> &'static RwLock<FactoryTable> {
    static DEFAULT: OnceLock<RwLock<FactoryTable>> = OnceLock::new();
    DEFAULT.get_or_init(|| RwLock::new(FactoryTable::builtin()))
}

/// A copy of the process-wide default table.
pub fn default_factory_table() -> FactoryTable {
    default_table().read().clone()
}

/// Add a factory to the default table. Only resource sets created afterwards see it.
pub fn register_default_factory(extension: impl Into<String>, factory: Arc<dyn ResourceFactory>) {
    default_table().write().register(extension, factory);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let table = FactoryTable::builtin();
        assert_eq!(table.keys(), vec!["*", "ecore", "xmi"]);
        assert_eq!(table.select(Some("ecore")).unwrap().kind(), "ecore");
        assert_eq!(table.select(Some("unknown")).unwrap().kind(), "xmi");
        assert_eq!(table.select(None).unwrap().kind(), "xmi");
    }

    #[test]
    fn test_missing_wildcard() {
        let mut table = FactoryTable::builtin();
        assert!(table.remove(WILDCARD).is_some());
        assert!(table.select(Some("xmi")).is_ok());
        assert!(matches!(
            table.select(Some("txt")),
            Err(ModelError::NotImplemented(_))
        ));
    }

    #[test]
    fn test_factory_creates_resource_of_kind() {
        let resource = CodecResourceFactory::ecore().create(Uri::new("m.ecore"));
        assert_eq!(resource.kind(), "ecore");
        assert_eq!(resource.uri().plain(), "m.ecore");
        assert!(resource.is_empty());
    }

    #[test]
    fn test_default_table_is_copied() {
        let mut copy = default_factory_table();
        copy.register("copied-only", Arc::new(CodecResourceFactory::xmi()));
        assert!(!default_factory_table().contains("copied-only"));
    }
}
