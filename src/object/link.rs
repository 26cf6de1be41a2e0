//! Reference values: an object, or a proxy standing in for one.

use super::{EObject, Value};
use crate::error::ModelError;
use crate::metamodel::EClass;
use crate::proxy::EProxy;
use std::sync::Arc;

/// The value held by a reference slot.
///
/// Inspecting which variant a link is never resolves it; every capability
/// accessor resolves a proxy transparently first.
#[derive(Debug, Clone)]
pub enum Link {
    Object(EObject),
    Proxy(EProxy),
}

impl Link {
    pub fn is_proxy(&self) -> bool {
        matches!(self, Link::Proxy(_))
    }

    pub fn as_object(&self) -> Option<&EObject> {
        match self {
            Link::Object(object) => Some(object),
            Link::Proxy(_) => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&EProxy> {
        match self {
            Link::Proxy(proxy) => Some(proxy),
            Link::Object(_) => None,
        }
    }

    /// The designated object, resolving a proxy on first use.
    pub fn resolve(&self) -> Result<EObject, ModelError> {
        match self {
            Link::Object(object) => Ok(object.clone()),
            Link::Proxy(proxy) => proxy.force_resolve(),
        }
    }

    /// Identity check that never triggers resolution.
    pub fn points_to(&self, object: &EObject) -> bool {
        match self {
            Link::Object(held) => held.ptr_eq(object),
            Link::Proxy(proxy) => proxy.wrapped().is_some_and(|w| w.ptr_eq(object)),
        }
    }

    pub(crate) fn is_object(&self, object: &EObject) -> bool {
        self.as_object().is_some_and(|held| held.ptr_eq(object))
    }

    pub fn eclass(&self) -> Result<Arc<EClass>, ModelError> {
        Ok(self.resolve()?.eclass())
    }

    pub fn is_instance_of(&self, class: &EClass) -> Result<bool, ModelError> {
        Ok(self.resolve()?.is_instance_of(class))
    }

    pub fn attribute(&self, name: &str) -> Result<Option<Value>, ModelError> {
        self.resolve()?.attribute(name)
    }

    pub fn reference(&self, name: &str) -> Result<Option<Link>, ModelError> {
        self.resolve()?.reference(name)
    }

    pub fn references(&self, name: &str) -> Result<Vec<Link>, ModelError> {
        self.resolve()?.references(name)
    }

    pub fn uri_fragment(&self) -> Result<String, ModelError> {
        self.resolve()?.uri_fragment()
    }
}

impl From<EObject> for Link {
    fn from(object: EObject) -> Self {
        Link::Object(object)
    }
}

impl From<&EObject> for Link {
    fn from(object: &EObject) -> Self {
        Link::Object(object.clone())
    }
}

impl From<EProxy> for Link {
    fn from(proxy: EProxy) -> Self {
        Link::Proxy(proxy)
    }
}
