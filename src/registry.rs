//! Global registry
//!
//! Process-wide table shared by every resource set: metamodels keyed by
//! namespace URI, plus documents or objects registered under a URI so proxies
//! can reach them without a loading scope. A default instance lives in a
//! `OnceLock`; callers wanting isolation construct their own and pass it to
//! `ResourceSet::with_registry`.
//!
//! Metamodel entries are addressable too: on first use a metamodel is
//! reflected into Ecore objects (see [`ecore::reflect`]) and the resulting
//! resource is cached next to the entry.

use crate::error::ModelError;
use crate::metamodel::{ecore, ecore_package, Metamodel, MetamodelScope, ECORE_NS_URI};
use crate::object::EObject;
use crate::resource::{fragment, Resource};
use crate::types::split_href;
use crate::uri::converter::{ConverterChain, UriConverter};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// A value stored in the global registry.
#[derive(Clone)]
pub enum RegistryEntry {
    Metamodel(Arc<dyn Metamodel>),
    Resource(Resource),
    Object(EObject),
}

impl RegistryEntry {
    pub fn as_metamodel(&self) -> Option<&Arc<dyn Metamodel>> {
        match self {
            RegistryEntry::Metamodel(metamodel) => Some(metamodel),
            _ => None,
        }
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryEntry::Metamodel(m) => write!(f, "Metamodel({})", m.ns_uri()),
            RegistryEntry::Resource(r) => write!(f, "Resource({})", r.uri()),
            RegistryEntry::Object(o) => write!(f, "Object({:?})", o),
        }
    }
}

/// Shared URI-keyed table and global converter chain.
pub struct GlobalRegistry {
    entries: RwLock<HashMap<String, RegistryEntry>>,
    reflected: RwLock<HashMap<String, Resource>>,
    converters: RwLock<ConverterChain>,
}

impl GlobalRegistry {
    /// A registry with the Ecore meta-metamodel pre-registered.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register_package(ecore_package());
        registry
    }

    /// A registry with no entries at all.
    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            reflected: RwLock::new(HashMap::new()),
            converters: RwLock::new(ConverterChain::new()),
        }
    }

    /// The process-wide default registry.
    pub fn shared() -> Arc<GlobalRegistry> {
        static SHARED: OnceLock<Arc<GlobalRegistry>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(GlobalRegistry::new())))
    }

    /// Insert or replace an entry, returning the previous one.
    pub fn insert(&self, key: impl Into<String>, entry: RegistryEntry) -> Option<RegistryEntry> {
        let key = key.into();
        debug!(key = %key, entry = ?entry, "Global registry entry set");
        self.reflected.write().remove(&key);
        self.entries.write().insert(key, entry)
    }

    /// Register a metamodel under its namespace URI.
    pub fn register_package(&self, metamodel: Arc<dyn Metamodel>) {
        let key = metamodel.ns_uri().to_string();
        self.insert(key, RegistryEntry::Metamodel(metamodel));
    }

    pub fn get(&self, key: &str) -> Option<RegistryEntry> {
        self.entries.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<RegistryEntry> {
        self.reflected.write().remove(key);
        self.entries.write().remove(key)
    }

    /// The Ecore object form of the metamodel registered under `ns_uri`.
    ///
    /// Built once per entry; attribute types point into the reflected Ecore
    /// package, whether or not Ecore itself is registered here.
    pub fn metamodel_resource(&self, ns_uri: &str) -> Result<Resource, ModelError> {
        let metamodel = self
            .get(ns_uri)
            .and_then(|entry| entry.as_metamodel().cloned())
            .ok_or_else(|| {
                ModelError::ResolutionNotFound(format!("no metamodel registered for {}", ns_uri))
            })?;
        if ns_uri == ECORE_NS_URI {
            return self.reflect_cached(ns_uri, metamodel.as_ref(), None);
        }
        let datatypes = self.ecore_resource()?;
        self.reflect_cached(ns_uri, metamodel.as_ref(), Some(&datatypes))
    }

    /// The reflected built-in Ecore package, holding the Ecore datatypes.
    pub(crate) fn ecore_resource(&self) -> Result<Resource, ModelError> {
        self.reflect_cached(ECORE_NS_URI, ecore_package().as_ref(), None)
    }

    fn reflect_cached(
        &self,
        key: &str,
        metamodel: &dyn Metamodel,
        datatypes: Option<&Resource>,
    ) -> Result<Resource, ModelError> {
        if let Some(existing) = self.reflected.read().get(key) {
            return Ok(existing.clone());
        }
        let built = ecore::reflect(metamodel, datatypes)?;
        Ok(self
            .reflected
            .write()
            .entry(key.to_string())
            .or_insert(built)
            .clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// A detached copy of the current entries.
    pub fn snapshot(&self) -> HashMap<String, RegistryEntry> {
        self.entries.read().clone()
    }

    /// Metamodel entries only, as a lookup scope.
    pub fn metamodel_scope(&self) -> MetamodelScope {
        let mut scope = MetamodelScope::new();
        for (key, entry) in self.entries.read().iter() {
            if let Some(metamodel) = entry.as_metamodel() {
                scope.insert(key.clone(), Arc::clone(metamodel));
            }
        }
        scope
    }

    /// Append a converter consulted after every resource set's own chain.
    pub fn add_uri_converter(&self, converter: Arc<dyn UriConverter>) {
        self.converters.write().push(converter);
    }

    pub fn converters(&self) -> ConverterChain {
        self.converters.read().clone()
    }
}

impl Default for GlobalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GlobalRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalRegistry")
            .field("keys", &self.keys())
            .field("converters", &self.converters.read().len())
            .finish()
    }
}

/// Last-resort href resolution against the global registry.
#[derive(Debug, Clone)]
pub struct GlobalUriDecoder {
    registry: Arc<GlobalRegistry>,
}

impl GlobalUriDecoder {
    pub fn new(registry: Arc<GlobalRegistry>) -> Self {
        Self { registry }
    }

    /// Decoder over the process-wide registry.
    pub fn shared() -> Self {
        Self::new(GlobalRegistry::shared())
    }

    /// True when the document part of `href` is a registry key.
    pub fn can_resolve(&self, href: &str) -> bool {
        let (uri_part, _) = split_href(href);
        self.registry.contains(uri_part)
    }

    pub fn resolve(&self, href: &str) -> Result<EObject, ModelError> {
        let (uri_part, fragment) = split_href(href);
        self.resolve_parts(uri_part, fragment)
    }

    pub(crate) fn resolve_parts(&self, key: &str, fragment: &str) -> Result<EObject, ModelError> {
        match self.registry.get(key) {
            Some(RegistryEntry::Resource(resource)) => resource.resolve_fragment(fragment),
            Some(RegistryEntry::Object(object)) if fragment.is_empty() || fragment == "/" => {
                Ok(object)
            }
            Some(RegistryEntry::Object(object)) => fragment::walk(&object, fragment),
            Some(RegistryEntry::Metamodel(_)) => {
                self.registry.metamodel_resource(key)?.resolve_fragment(fragment)
            }
            None => Err(ModelError::ResolutionNotFound(format!(
                "{} is not in the global registry",
                key
            ))),
        }
    }
}
