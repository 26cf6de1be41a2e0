//! Cross-document proxies
//!
//! An `EProxy` stands in for an object living in another document (or later
//! in the same one). It holds an href until first use, then resolves it once
//! and keeps the located object for good. Clones share the same state, so
//! every holder observes the transition.

use crate::error::ModelError;
use crate::object::EObject;
use crate::registry::{GlobalRegistry, GlobalUriDecoder};
use crate::resource::{Resource, ResourceInner};
use crate::resource_set::ResourceSet;
use crate::types::split_href;
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

enum ProxyState {
    Unresolved,
    Resolved(EObject),
}

struct ProxyInner {
    href: String,
    origin: Option<Weak<ResourceInner>>,
    state: RwLock<ProxyState>,
}

/// Lazy placeholder for a referenced object.
#[derive(Clone)]
pub struct EProxy(Arc<ProxyInner>);

impl EProxy {
    /// A proxy with no owning document; resolved through the global registry.
    pub fn new(href: impl Into<String>) -> Self {
        Self::build(href.into(), None)
    }

    /// A proxy created while decoding `origin`. Relative hrefs resolve
    /// against it and its resource set governs the lookup.
    pub fn with_origin(href: impl Into<String>, origin: &Resource) -> Self {
        Self::build(href.into(), Some(origin.downgrade()))
    }

    fn build(href: String, origin: Option<Weak<ResourceInner>>) -> Self {
        Self(Arc::new(ProxyInner {
            href,
            origin,
            state: RwLock::new(ProxyState::Unresolved),
        }))
    }

    pub fn href(&self) -> &str {
        &self.0.href
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.0.state.read(), ProxyState::Resolved(_))
    }

    /// The resolved object, without triggering resolution.
    pub fn wrapped(&self) -> Option<EObject> {
        match &*self.0.state.read() {
            ProxyState::Resolved(object) => Some(object.clone()),
            ProxyState::Unresolved => None,
        }
    }

    pub fn origin(&self) -> Option<Resource> {
        self.0
            .origin
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Resource::from_inner)
    }

    pub fn ptr_eq(&self, other: &EProxy) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Resolve the href, once. Later calls return the same object without
    /// any lookup.
    pub fn force_resolve(&self) -> Result<EObject, ModelError> {
        if let Some(object) = self.wrapped() {
            return Ok(object);
        }
        let located = self.locate()?;
        let mut state = self.0.state.write();
        match &*state {
            ProxyState::Resolved(object) => Ok(object.clone()),
            ProxyState::Unresolved => {
                debug!(href = %self.0.href, class = located.eclass().name(), "Proxy resolved");
                *state = ProxyState::Resolved(located.clone());
                Ok(located)
            }
        }
    }

    fn locate(&self) -> Result<EObject, ModelError> {
        let href = self.0.href.as_str();
        let (uri_part, fragment) = split_href(href);
        let origin = self.origin();

        if uri_part.is_empty() {
            let origin = origin.ok_or_else(|| {
                ModelError::Addressing(format!(
                    "intra-document href '{}' has no owning resource",
                    href
                ))
            })?;
            return origin.resolve_fragment(fragment);
        }

        let location = match &origin {
            Some(resource) => resource.uri().resolve_reference(uri_part),
            None => uri_part.to_string(),
        };
        let resource_set = origin.as_ref().and_then(Resource::resource_set);

        let located = match &resource_set {
            Some(set) => locate_in_set(set, uri_part, &location, fragment)?,
            None => locate_globally(&GlobalRegistry::shared(), origin.as_ref(), uri_part, &location, fragment)?,
        };

        if let Some(set) = &resource_set {
            check_metamodel_known(set, &located)?;
        }
        Ok(located)
    }
}

/// Cache of the governing set first, then its metamodels, then the global
/// registry, then a load through the set (which caches the new resource).
fn locate_in_set(
    set: &ResourceSet,
    uri_part: &str,
    location: &str,
    fragment: &str,
) -> Result<EObject, ModelError> {
    if !set.can_resolve(location) {
        for key in [uri_part, location] {
            if set.metamodel(key).is_some() {
                return set.metamodel_resource(key)?.resolve_fragment(fragment);
            }
        }
        let registry = set.global_registry();
        for key in [uri_part, location] {
            if registry.contains(key) {
                return GlobalUriDecoder::new(Arc::clone(registry)).resolve_parts(key, fragment);
            }
        }
    }
    set.get_resource(location)?.resolve_fragment(fragment)
}

fn locate_globally(
    registry: &Arc<GlobalRegistry>,
    origin: Option<&Resource>,
    uri_part: &str,
    location: &str,
    fragment: &str,
) -> Result<EObject, ModelError> {
    for key in [uri_part, location] {
        if registry.contains(key) {
            return GlobalUriDecoder::new(Arc::clone(registry)).resolve_parts(key, fragment);
        }
    }
    if let Some(origin) = origin {
        if origin.uri().normalize() == crate::uri::Uri::new(location).normalize() {
            return origin.resolve_fragment(fragment);
        }
    }
    Err(ModelError::ResolutionNotFound(format!(
        "no resource set or registry entry can resolve {}",
        location
    )))
}

fn check_metamodel_known(set: &ResourceSet, located: &EObject) -> Result<(), ModelError> {
    let eclass = located.eclass();
    match eclass.ns_uri() {
        Some(ns_uri) if set.metamodel(ns_uri).is_none() => Err(ModelError::UnknownMetamodel(
            format!(
                "resolved a {} but no metamodel for {} is registered in this resource set",
                eclass.name(),
                ns_uri
            ),
        )),
        _ => Ok(()),
    }
}

impl fmt::Debug for EProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EProxy")
            .field("href", &self.0.href)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
