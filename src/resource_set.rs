//! Resource sets
//!
//! A `ResourceSet` is a loading scope: a cache of resources keyed by their
//! normalized URI, a private metamodel registry seeded from the global
//! registry, a resource factory table seeded from the default table, and a
//! URI converter chain. Scopes never share mutable state with each other.

use crate::config::ResourceSetConfig;
use crate::error::ModelError;
use crate::metamodel::{ecore, EPackage, Metamodel, MetamodelScope};
use crate::object::EObject;
use crate::registry::{GlobalRegistry, RegistryEntry};
use crate::resource::factory::{self, FactoryTable, ResourceFactory};
use crate::resource::{Resource, TransportOptions};
use crate::types::split_href;
use crate::uri::converter::{ConversionOrder, ConverterChain, UriConverter};
use crate::uri::Uri;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

pub(crate) struct ResourceSetInner {
    global: Arc<GlobalRegistry>,
    resources: RwLock<HashMap<String, Resource>>,
    metamodel_registry: RwLock<HashMap<String, RegistryEntry>>,
    reflected: RwLock<HashMap<String, Resource>>,
    resource_factory: RwLock<FactoryTable>,
    uri_converter: RwLock<ConverterChain>,
    config: ResourceSetConfig,
}

/// Shared handle to a loading scope.
#[derive(Clone)]
pub struct ResourceSet(Arc<ResourceSetInner>);

impl ResourceSet {
    /// A scope over the process-wide global registry.
    pub fn new() -> Self {
        Self::with_registry(GlobalRegistry::shared())
    }

    pub fn with_registry(global: Arc<GlobalRegistry>) -> Self {
        Self::with_config(global, ResourceSetConfig::default())
    }

    /// A scope seeded from `global` as it is right now.
    pub fn with_config(global: Arc<GlobalRegistry>, config: ResourceSetConfig) -> Self {
        let metamodel_registry = global.snapshot();
        debug!(
            entries = metamodel_registry.len(),
            order = ?config.conversion_order,
            "Resource set created"
        );
        Self(Arc::new(ResourceSetInner {
            global,
            resources: RwLock::new(HashMap::new()),
            metamodel_registry: RwLock::new(metamodel_registry),
            reflected: RwLock::new(HashMap::new()),
            resource_factory: RwLock::new(factory::default_factory_table()),
            uri_converter: RwLock::new(ConverterChain::new()),
            config,
        }))
    }

    pub fn global_registry(&self) -> &Arc<GlobalRegistry> {
        &self.0.global
    }

    pub fn config(&self) -> &ResourceSetConfig {
        &self.0.config
    }

    pub(crate) fn transport_options(&self) -> TransportOptions {
        TransportOptions::with_http_timeout_secs(self.0.config.http_timeout_secs)
    }

    // --- metamodels ---

    /// Register a metamodel in this scope only.
    pub fn register_metamodel(&self, metamodel: Arc<dyn Metamodel>) {
        let key = metamodel.ns_uri().to_string();
        debug!(ns_uri = %key, "Metamodel registered in resource set");
        self.0.reflected.write().remove(&key);
        self.0
            .metamodel_registry
            .write()
            .insert(key, RegistryEntry::Metamodel(metamodel));
    }

    pub fn register_package(&self, package: EPackage) {
        self.register_metamodel(Arc::new(package));
    }

    /// Register every package found in a loaded Ecore resource.
    pub fn register_packages_from(&self, resource: &Resource) -> Result<Vec<String>, ModelError> {
        let mut registered = Vec::new();
        for package in EPackage::from_resource(resource)? {
            registered.push(package.ns_uri().to_string());
            self.register_package(package);
        }
        Ok(registered)
    }

    pub fn metamodel(&self, ns_uri: &str) -> Option<Arc<dyn Metamodel>> {
        self.0
            .metamodel_registry
            .read()
            .get(ns_uri)
            .and_then(RegistryEntry::as_metamodel)
            .cloned()
    }

    /// True for any entry under `key`, metamodel or not.
    pub fn has_metamodel_entry(&self, key: &str) -> bool {
        self.0.metamodel_registry.read().contains_key(key)
    }

    pub fn unregister_metamodel(&self, ns_uri: &str) -> bool {
        self.0.reflected.write().remove(ns_uri);
        self.0.metamodel_registry.write().remove(ns_uri).is_some()
    }

    /// Ecore object form of a metamodel known to this scope, so hrefs like
    /// `<nsURI>#//Name` resolve. Entries still shared with the global
    /// registry reuse its cached form.
    pub fn metamodel_resource(&self, ns_uri: &str) -> Result<Resource, ModelError> {
        let metamodel = self.metamodel(ns_uri).ok_or_else(|| {
            ModelError::ResolutionNotFound(format!(
                "no metamodel for {} in this resource set",
                ns_uri
            ))
        })?;
        let shared = self
            .0
            .global
            .get(ns_uri)
            .and_then(|entry| entry.as_metamodel().cloned())
            .is_some_and(|global| Arc::ptr_eq(&global, &metamodel));
        if shared {
            return self.0.global.metamodel_resource(ns_uri);
        }
        if let Some(existing) = self.0.reflected.read().get(ns_uri) {
            return Ok(existing.clone());
        }
        let datatypes = self.0.global.ecore_resource()?;
        let built = ecore::reflect(metamodel.as_ref(), Some(&datatypes))?;
        Ok(self
            .0
            .reflected
            .write()
            .entry(ns_uri.to_string())
            .or_insert(built)
            .clone())
    }

    pub fn metamodel_keys(&self) -> Vec<String> {
        self.0.metamodel_registry.read().keys().cloned().collect()
    }

    /// Metamodels visible to documents loaded through this scope.
    pub fn metamodel_scope(&self) -> MetamodelScope {
        let mut scope = MetamodelScope::new();
        for (key, entry) in self.0.metamodel_registry.read().iter() {
            if let Some(metamodel) = entry.as_metamodel() {
                scope.insert(key.clone(), Arc::clone(metamodel));
            }
        }
        scope
    }

    // --- factories ---

    /// A copy of the default table new resource sets start from.
    pub fn default_resource_factory() -> FactoryTable {
        factory::default_factory_table()
    }

    pub fn register_default_factory(extension: impl Into<String>, factory: Arc<dyn ResourceFactory>) {
        factory::register_default_factory(extension, factory);
    }

    /// Register a factory for this scope only.
    pub fn register_factory(&self, extension: impl Into<String>, factory: Arc<dyn ResourceFactory>) {
        self.0.resource_factory.write().register(extension, factory);
    }

    pub fn has_factory(&self, extension: &str) -> bool {
        self.0.resource_factory.read().contains(extension)
    }

    pub fn remove_factory(&self, extension: &str) -> bool {
        self.0.resource_factory.write().remove(extension).is_some()
    }

    /// Factory for `extension`, falling back to `*`.
    pub fn factory_for(&self, extension: Option<&str>) -> Result<Arc<dyn ResourceFactory>, ModelError> {
        self.0.resource_factory.read().select(extension)
    }

    // --- URIs ---

    /// Append a converter to this scope's chain.
    pub fn add_uri_converter(&self, converter: Arc<dyn UriConverter>) {
        self.0.uri_converter.write().push(converter);
    }

    /// Apply this scope's converters, then the global ones; first match wins.
    pub fn convert_uri(&self, uri: &Uri) -> Result<Uri, ModelError> {
        if self.0.config.conversion_order == ConversionOrder::OpaqueFirst && uri.is_opaque() {
            return Ok(uri.clone());
        }
        let local = self.0.uri_converter.read().clone();
        if let Some(converted) = local.convert(uri)? {
            return Ok(converted);
        }
        Ok(self.0.global.converters().convert(uri)?.unwrap_or_else(|| uri.clone()))
    }

    /// Cache key of `uri`: converted, then normalized.
    pub fn key_for(&self, uri: &Uri) -> Result<String, ModelError> {
        Ok(self.convert_uri(uri)?.normalize())
    }

    // --- resources ---

    /// Create an empty resource for `uri` and cache it. A resource already
    /// cached under the same key is returned instead.
    pub fn create_resource(&self, uri: impl Into<Uri>) -> Result<Resource, ModelError> {
        let uri = uri.into();
        let converted = self.convert_uri(&uri)?;
        let key = converted.normalize();
        if let Some(existing) = self.cached(&key) {
            debug!(key = %key, "Resource cache hit");
            return Ok(existing);
        }

        let factory = self.factory_for(converted.extension())?;
        let created = factory.create(converted);
        let resource = {
            let mut resources = self.0.resources.write();
            resources.entry(key.clone()).or_insert(created).clone()
        };
        resource.add_decoder(self);
        debug!(key = %key, kind = resource.kind(), "Resource created");
        Ok(resource)
    }

    /// The cached resource for `uri`, loading it on first request.
    ///
    /// A failed load leaves nothing cached and returns the failure.
    pub fn get_resource(&self, uri: impl Into<Uri>) -> Result<Resource, ModelError> {
        let uri = uri.into();
        let key = self.key_for(&uri)?;
        if let Some(existing) = self.cached(&key) {
            debug!(key = %key, "Resource cache hit");
            return Ok(existing);
        }
        let resource = self.create_resource(uri)?;
        if let Err(err) = resource.load() {
            warn!(key = %key, error = %err, "Resource load failed");
            self.remove_resource(&resource);
            return Err(err);
        }
        Ok(resource)
    }

    /// Cache probe without conversion errors: `None` when absent.
    pub fn resource(&self, uri: impl Into<Uri>) -> Option<Resource> {
        let key = self.key_for(&uri.into()).ok()?;
        self.cached(&key)
    }

    /// Snapshot of the cache, key to resource.
    pub fn resources(&self) -> HashMap<String, Resource> {
        self.0.resources.read().clone()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.resources.read().contains_key(key)
    }

    /// True when the document part of `href` is already cached. Never loads.
    pub fn can_resolve(&self, href: &str) -> bool {
        let (uri_part, _) = split_href(href);
        match self.key_for(&Uri::new(uri_part)) {
            Ok(key) => self.contains_key(&key),
            Err(err) => {
                warn!(href = %href, error = %err, "URI conversion failed during cache probe");
                false
            }
        }
    }

    /// Drop a resource from the cache. Returns whether it was cached.
    pub fn remove_resource(&self, resource: &Resource) -> bool {
        let removed = {
            let mut resources = self.0.resources.write();
            let before = resources.len();
            resources.retain(|_, cached| !cached.ptr_eq(resource));
            resources.len() != before
        };
        if removed {
            resource.remove_decoder(self);
            debug!(uri = %resource.uri(), "Resource removed from set");
        }
        removed
    }

    /// Resolve an absolute href, loading its document if needed.
    pub fn resolve(&self, href: &str) -> Result<EObject, ModelError> {
        let (uri_part, fragment) = split_href(href);
        self.get_resource(uri_part)?.resolve_fragment(fragment)
    }

    pub fn ptr_eq(&self, other: &ResourceSet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn cached(&self, key: &str) -> Option<Resource> {
        self.0.resources.read().get(key).cloned()
    }

    /// Move `resource` to the key of its current URI.
    pub(crate) fn rekey(&self, resource: &Resource) -> Result<(), ModelError> {
        let key = self.key_for(&resource.uri())?;
        let mut resources = self.0.resources.write();
        resources.retain(|_, cached| !cached.ptr_eq(resource));
        resources.insert(key, resource.clone());
        Ok(())
    }

    pub(crate) fn from_inner(inner: Arc<ResourceSetInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<ResourceSetInner> {
        Arc::downgrade(&self.0)
    }
}

impl Default for ResourceSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.0.resources.read().keys().cloned().collect();
        keys.sort();
        f.debug_struct("ResourceSet")
            .field("resources", &keys)
            .field("metamodels", &self.0.metamodel_registry.read().len())
            .field("converters", &self.0.uri_converter.read().len())
            .finish()
    }
}
