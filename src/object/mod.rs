//! Model objects
//!
//! `EObject` is a shared handle to a reflective object typed by an `EClass`.
//! Objects form containment trees: every object has at most one container,
//! either another object (through a containment feature) or a resource (as a
//! root). Adding an object to a new container detaches it from the old one.

pub mod link;
pub mod value;

pub use link::Link;
pub use value::Value;

use crate::error::ModelError;
use crate::metamodel::{EClass, StructuralFeature};
use crate::proxy::EProxy;
use crate::resource::{Resource, ResourceInner};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

pub(crate) struct ObjectData {
    eclass: Arc<EClass>,
    values: HashMap<String, Vec<Value>>,
    links: HashMap<String, Vec<Link>>,
    container: Option<ContainerLink>,
    /// Set only while the object is a root of a resource.
    resource: Option<Weak<ResourceInner>>,
}

struct ContainerLink {
    parent: Weak<RwLock<ObjectData>>,
    feature: String,
}

/// Shared handle to a model object. Equality is identity.
#[derive(Clone)]
pub struct EObject(Arc<RwLock<ObjectData>>);

impl EObject {
    pub fn new(eclass: Arc<EClass>) -> Self {
        Self(Arc::new(RwLock::new(ObjectData {
            eclass,
            values: HashMap::new(),
            links: HashMap::new(),
            container: None,
            resource: None,
        })))
    }

    pub fn eclass(&self) -> Arc<EClass> {
        Arc::clone(&self.0.read().eclass)
    }

    pub fn is_instance_of(&self, class: &EClass) -> bool {
        self.eclass().same_type(class)
    }

    pub fn ptr_eq(&self, other: &EObject) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Value of the `name` attribute, when the class declares one.
    pub fn name(&self) -> Option<String> {
        let eclass = self.eclass();
        eclass.feature("name").and_then(|f| f.data_type())?;
        self.0
            .read()
            .values
            .get("name")
            .and_then(|v| v.first())
            .and_then(|v| v.as_str().map(str::to_string))
    }

    // --- attributes ---

    pub fn attribute(&self, name: &str) -> Result<Option<Value>, ModelError> {
        Ok(self.attribute_values(name)?.into_iter().next())
    }

    pub fn attribute_values(&self, name: &str) -> Result<Vec<Value>, ModelError> {
        self.attribute_feature(name)?;
        Ok(self.0.read().values.get(name).cloned().unwrap_or_default())
    }

    /// Replace the value(s) of an attribute with a single value.
    pub fn set_attribute(&self, name: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        let feature = self.attribute_feature(name)?;
        let value = coerce_for(&feature, value.into())?;
        self.0.write().values.insert(name.to_string(), vec![value]);
        Ok(())
    }

    /// Append a value to a multi-valued attribute.
    pub fn push_attribute(&self, name: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        let feature = self.attribute_feature(name)?;
        require_many(&feature)?;
        let value = coerce_for(&feature, value.into())?;
        self.0
            .write()
            .values
            .entry(name.to_string())
            .or_default()
            .push(value);
        Ok(())
    }

    /// Clear a feature. Contained children are released from this container.
    pub fn unset(&self, name: &str) -> Result<(), ModelError> {
        let feature = self.feature(name)?;
        let released = {
            let mut data = self.0.write();
            data.values.remove(name);
            data.links.remove(name)
        };
        if feature.is_containment() {
            for link in released.unwrap_or_default() {
                if let Link::Object(child) = link {
                    child.release_from(self);
                }
            }
        }
        Ok(())
    }

    // --- references ---

    pub fn reference(&self, name: &str) -> Result<Option<Link>, ModelError> {
        Ok(self.references(name)?.into_iter().next())
    }

    pub fn references(&self, name: &str) -> Result<Vec<Link>, ModelError> {
        self.reference_feature(name)?;
        Ok(self.0.read().links.get(name).cloned().unwrap_or_default())
    }

    /// Set (or clear with `None`) a single-valued reference.
    ///
    /// For containment features the new child is detached from its previous
    /// container, whether an object or a resource.
    pub fn set_reference(&self, name: &str, target: Option<Link>) -> Result<(), ModelError> {
        let feature = self.reference_feature(name)?;
        if feature.is_many() {
            return Err(ModelError::Feature(format!(
                "{}.{} is multi-valued; use push_reference",
                self.eclass().name(),
                name
            )));
        }
        if let Some(link) = &target {
            self.check_insertable(&feature, link)?;
        }
        let previous = self.0.write().links.remove(name);
        if feature.is_containment() {
            for link in previous.unwrap_or_default() {
                if let Link::Object(child) = link {
                    child.release_from(self);
                }
            }
        }
        if let Some(link) = target {
            self.insert_link(&feature, link);
        }
        Ok(())
    }

    /// Append to a multi-valued reference.
    pub fn push_reference(&self, name: &str, target: impl Into<Link>) -> Result<(), ModelError> {
        let feature = self.reference_feature(name)?;
        require_many(&feature)?;
        let link = target.into();
        self.check_insertable(&feature, &link)?;
        self.insert_link(&feature, link);
        Ok(())
    }

    /// Remove `target` from a reference. Returns whether it was present.
    pub fn remove_reference(&self, name: &str, target: &EObject) -> Result<bool, ModelError> {
        let feature = self.reference_feature(name)?;
        let removed = {
            let mut data = self.0.write();
            match data.links.get_mut(name) {
                Some(links) => match links.iter().position(|l| l.points_to(target)) {
                    Some(index) => {
                        links.remove(index);
                        true
                    }
                    None => false,
                },
                None => false,
            }
        };
        if removed && feature.is_containment() {
            target.release_from(self);
        }
        Ok(removed)
    }

    // --- containment ---

    pub fn e_container(&self) -> Option<EObject> {
        self.0
            .read()
            .container
            .as_ref()
            .and_then(|c| c.parent.upgrade())
            .map(EObject)
    }

    /// Name of the containment feature holding this object.
    pub fn containing_feature(&self) -> Option<String> {
        self.0.read().container.as_ref().map(|c| c.feature.clone())
    }

    /// Resource of the outermost container, if that root belongs to one.
    pub fn e_resource(&self) -> Option<Resource> {
        self.root().direct_resource()
    }

    /// The outermost container (the object itself when it has none).
    pub fn root(&self) -> EObject {
        let mut current = self.clone();
        while let Some(parent) = current.e_container() {
            current = parent;
        }
        current
    }

    /// Directly contained children, in feature declaration order.
    pub fn contents(&self) -> Vec<EObject> {
        let eclass = self.eclass();
        let data = self.0.read();
        eclass
            .features()
            .iter()
            .filter(|f| f.is_containment())
            .filter_map(|f| data.links.get(f.name()))
            .flatten()
            .filter_map(|l| l.as_object().cloned())
            .collect()
    }

    /// Every object contained below this one, depth first.
    pub fn all_contents(&self) -> Vec<EObject> {
        let mut found = Vec::new();
        let mut stack: Vec<EObject> = self.contents().into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            stack.extend(next.contents().into_iter().rev());
            found.push(next);
        }
        found
    }

    /// Fragment addressing this object inside its resource.
    pub fn uri_fragment(&self) -> Result<String, ModelError> {
        crate::resource::fragment::fragment_of(self)
    }

    // --- crate internals ---

    pub(crate) fn direct_resource(&self) -> Option<Resource> {
        self.0
            .read()
            .resource
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Resource::from_inner)
    }

    pub(crate) fn set_resource(&self, resource: &Resource) {
        self.0.write().resource = Some(resource.downgrade());
    }

    pub(crate) fn clear_resource(&self) {
        self.0.write().resource = None;
    }

    /// Remove this object from its current container or resource.
    pub(crate) fn detach(&self) {
        let (container, resource) = {
            let mut data = self.0.write();
            (data.container.take(), data.resource.take())
        };
        if let Some(parent) = container.as_ref().and_then(|c| c.parent.upgrade()) {
            let feature = container.map(|c| c.feature).unwrap_or_default();
            EObject(parent).forget_child(&feature, self);
        }
        if let Some(resource) = resource.and_then(|w| w.upgrade()) {
            Resource::from_inner(resource).forget_root(self);
        }
    }

    /// Swap a resolved intra-document proxy for the object it designates.
    pub(crate) fn replace_proxy(&self, name: &str, proxy: &EProxy, target: EObject) {
        let mut data = self.0.write();
        if let Some(links) = data.links.get_mut(name) {
            for link in links.iter_mut() {
                if link.as_proxy().is_some_and(|p| p.ptr_eq(proxy)) {
                    *link = Link::Object(target.clone());
                }
            }
        }
    }

    /// Index of `child` among the values of `feature`.
    pub(crate) fn position_in(&self, feature: &str, child: &EObject) -> Option<usize> {
        self.0
            .read()
            .links
            .get(feature)?
            .iter()
            .position(|l| l.is_object(child))
    }

    pub(crate) fn feature(&self, name: &str) -> Result<StructuralFeature, ModelError> {
        let eclass = self.eclass();
        eclass.feature(name).cloned().ok_or_else(|| {
            ModelError::Feature(format!("{} has no feature '{}'", eclass.name(), name))
        })
    }

    fn attribute_feature(&self, name: &str) -> Result<StructuralFeature, ModelError> {
        let feature = self.feature(name)?;
        if feature.is_reference() {
            return Err(ModelError::Feature(format!(
                "{}.{} is a reference, not an attribute",
                self.eclass().name(),
                name
            )));
        }
        Ok(feature)
    }

    fn reference_feature(&self, name: &str) -> Result<StructuralFeature, ModelError> {
        let feature = self.feature(name)?;
        if !feature.is_reference() {
            return Err(ModelError::Feature(format!(
                "{}.{} is an attribute, not a reference",
                self.eclass().name(),
                name
            )));
        }
        Ok(feature)
    }

    /// Containment accepts only real objects and never an ancestor of `self`.
    fn check_insertable(&self, feature: &StructuralFeature, link: &Link) -> Result<(), ModelError> {
        if !feature.is_containment() {
            return Ok(());
        }
        let child = match link {
            Link::Object(child) => child,
            Link::Proxy(proxy) => {
                return Err(ModelError::Consistency(format!(
                    "cannot contain unresolved proxy {} in {}",
                    proxy.href(),
                    feature.name()
                )))
            }
        };
        let mut current = Some(self.clone());
        while let Some(ancestor) = current {
            if ancestor.ptr_eq(child) {
                return Err(ModelError::Consistency(format!(
                    "containing a {} under {}.{} would create a cycle",
                    child.eclass().name(),
                    self.eclass().name(),
                    feature.name()
                )));
            }
            current = ancestor.e_container();
        }
        Ok(())
    }

    fn insert_link(&self, feature: &StructuralFeature, link: Link) {
        if let Link::Object(child) = &link {
            if feature.is_containment() {
                child.detach();
                child.0.write().container = Some(ContainerLink {
                    parent: Arc::downgrade(&self.0),
                    feature: feature.name().to_string(),
                });
            }
        }
        let mut data = self.0.write();
        let links = data.links.entry(feature.name().to_string()).or_default();
        if !feature.is_many() {
            links.clear();
        }
        links.push(link);
    }

    fn forget_child(&self, feature: &str, child: &EObject) {
        if let Some(links) = self.0.write().links.get_mut(feature) {
            links.retain(|l| !l.is_object(child));
        }
    }

    /// Clear the container pointer if it still designates `parent`.
    fn release_from(&self, parent: &EObject) {
        let mut data = self.0.write();
        let held_by_parent = data
            .container
            .as_ref()
            .and_then(|c| c.parent.upgrade())
            .is_some_and(|p| Arc::ptr_eq(&p, &parent.0));
        if held_by_parent {
            data.container = None;
        }
    }
}

fn require_many(feature: &StructuralFeature) -> Result<(), ModelError> {
    if feature.is_many() {
        Ok(())
    } else {
        Err(ModelError::Feature(format!(
            "{} is single-valued",
            feature.name()
        )))
    }
}

fn coerce_for(feature: &StructuralFeature, value: Value) -> Result<Value, ModelError> {
    match feature.data_type() {
        Some(data_type) => value.coerce(data_type),
        None => Err(ModelError::Feature(format!(
            "{} does not hold attribute values",
            feature.name()
        ))),
    }
}

impl PartialEq for EObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EObject {}

impl Hash for EObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for EObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EObject({}@{:p})", self.eclass().name(), Arc::as_ptr(&self.0))
    }
}
