//! Resources
//!
//! A `Resource` is one document: a URI, an ordered list of root objects, and
//! the codec used to load and save it. Resource sets that cache a resource
//! are recorded as its decoders so a URI change can re-key them and proxies
//! created while decoding can find their loading scope.

pub mod codec;
pub mod factory;
pub mod fragment;
pub mod transport;

pub use codec::{Codec, JsonCodec};
pub use factory::{CodecResourceFactory, FactoryTable, ResourceFactory, WILDCARD};
pub use transport::TransportOptions;

use crate::error::ModelError;
use crate::metamodel::MetamodelScope;
use crate::object::EObject;
use crate::registry::GlobalRegistry;
use crate::resource_set::{ResourceSet, ResourceSetInner};
use crate::types::split_href;
use crate::uri::Uri;
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

struct ResourceState {
    uri: Uri,
    contents: Vec<EObject>,
    decoders: Vec<Weak<ResourceSetInner>>,
    loaded: bool,
}

pub(crate) struct ResourceInner {
    state: RwLock<ResourceState>,
    codec: Arc<dyn Codec>,
    kind: String,
}

/// Shared handle to a document. Equality is identity.
#[derive(Clone)]
pub struct Resource(Arc<ResourceInner>);

impl Resource {
    /// A general model resource using the JSON codec.
    pub fn new(uri: impl Into<Uri>) -> Self {
        Self::with_codec(uri, "xmi", Arc::new(JsonCodec::new()))
    }

    pub fn with_codec(uri: impl Into<Uri>, kind: impl Into<String>, codec: Arc<dyn Codec>) -> Self {
        Self(Arc::new(ResourceInner {
            state: RwLock::new(ResourceState {
                uri: uri.into(),
                contents: Vec::new(),
                decoders: Vec::new(),
                loaded: false,
            }),
            codec,
            kind: kind.into(),
        }))
    }

    pub fn uri(&self) -> Uri {
        self.0.state.read().uri.clone()
    }

    /// Change the document URI. Every resource set caching this resource
    /// moves it to the key of the new URI.
    pub fn set_uri(&self, uri: impl Into<Uri>) -> Result<(), ModelError> {
        let uri = uri.into();
        debug!(from = %self.uri(), to = %uri, "Resource URI changed");
        self.0.state.write().uri = uri;
        for set in self.decoders() {
            set.rekey(self)?;
        }
        Ok(())
    }

    /// Document kind of the factory that created this resource.
    pub fn kind(&self) -> &str {
        &self.0.kind
    }

    /// Root objects, in order.
    pub fn contents(&self) -> Vec<EObject> {
        self.0.state.read().contents.clone()
    }

    pub fn len(&self) -> usize {
        self.0.state.read().contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.state.read().contents.is_empty()
    }

    /// Add `object` as the last root.
    ///
    /// An object held elsewhere (by another object or as a root of any
    /// resource, this one included) is detached from there first.
    pub fn append(&self, object: &EObject) {
        object.detach();
        self.0.state.write().contents.push(object.clone());
        object.set_resource(self);
    }

    pub fn extend<'a>(&self, objects: impl IntoIterator<Item = &'a EObject>) {
        for object in objects {
            self.append(object);
        }
    }

    /// Remove a root object. Objects that are not roots here are an error.
    pub fn remove(&self, object: &EObject) -> Result<(), ModelError> {
        let removed = {
            let mut state = self.0.state.write();
            match state.contents.iter().position(|root| root.ptr_eq(object)) {
                Some(index) => {
                    state.contents.remove(index);
                    true
                }
                None => false,
            }
        };
        if !removed {
            return Err(ModelError::Addressing(format!(
                "{:?} is not a root of {}",
                object,
                self.uri()
            )));
        }
        object.clear_resource();
        Ok(())
    }

    pub fn index_of(&self, object: &EObject) -> Option<usize> {
        self.0
            .state
            .read()
            .contents
            .iter()
            .position(|root| root.ptr_eq(object))
    }

    /// Fragment of an object contained in this resource.
    pub fn uri_fragment(&self, object: &EObject) -> Result<String, ModelError> {
        match object.e_resource() {
            Some(owner) if owner.ptr_eq(self) => fragment::fragment_of(object),
            _ => Err(ModelError::Addressing(format!(
                "{:?} does not belong to {}",
                object,
                self.uri()
            ))),
        }
    }

    /// The object a fragment designates.
    ///
    /// An empty fragment designates the first root; `//a/b` walks names from
    /// the first root; anything else is `/<root>/<path>`.
    pub fn resolve_fragment(&self, fragment: &str) -> Result<EObject, ModelError> {
        if fragment.is_empty() {
            return self.root_at(0, fragment);
        }
        if let Some(names) = fragment.strip_prefix("//") {
            return fragment::walk_named(&self.root_at(0, fragment)?, names);
        }
        let (index, rest) = fragment::extract_rootnum_and_frag(fragment)?;
        let root = self.root_at(index, fragment)?;
        if rest.is_empty() {
            Ok(root)
        } else {
            fragment::walk(&root, &rest)
        }
    }

    /// Resolve an href seen from this document. Hrefs into other documents
    /// go through the owning resource set.
    pub fn resolve(&self, href: &str) -> Result<EObject, ModelError> {
        let (uri_part, fragment) = split_href(href);
        if uri_part.is_empty() {
            return self.resolve_fragment(fragment);
        }
        let location = self.uri().resolve_reference(uri_part);
        if Uri::new(&location).normalize() == self.uri().normalize() {
            return self.resolve_fragment(fragment);
        }
        match self.resource_set() {
            Some(set) => set.get_resource(location.as_str())?.resolve_fragment(fragment),
            None => Err(ModelError::ResolutionNotFound(format!(
                "{} is outside {} and no resource set owns it",
                href,
                self.uri()
            ))),
        }
    }

    /// See [`fragment::extract_rootnum_and_frag`].
    pub fn extract_rootnum_and_frag(path: &str) -> Result<(usize, String), ModelError> {
        fragment::extract_rootnum_and_frag(path)
    }

    /// Resource sets caching this resource.
    pub fn decoders(&self) -> Vec<ResourceSet> {
        let mut state = self.0.state.write();
        let before = state.decoders.len();
        state.decoders.retain(|w| w.strong_count() > 0);
        if state.decoders.len() != before {
            warn!(uri = %state.uri, dropped = before - state.decoders.len(), "Dropped dead resource set references");
        }
        state
            .decoders
            .iter()
            .filter_map(Weak::upgrade)
            .map(ResourceSet::from_inner)
            .collect()
    }

    /// The first resource set caching this resource.
    pub fn resource_set(&self) -> Option<ResourceSet> {
        self.0
            .state
            .read()
            .decoders
            .iter()
            .find_map(Weak::upgrade)
            .map(ResourceSet::from_inner)
    }

    pub(crate) fn add_decoder(&self, set: &ResourceSet) {
        let mut state = self.0.state.write();
        let weak = set.downgrade();
        if !state.decoders.iter().any(|w| w.ptr_eq(&weak)) {
            state.decoders.push(weak);
        }
    }

    pub(crate) fn remove_decoder(&self, set: &ResourceSet) {
        let weak = set.downgrade();
        self.0.state.write().decoders.retain(|w| !w.ptr_eq(&weak));
    }

    pub fn is_loaded(&self) -> bool {
        self.0.state.read().loaded
    }

    /// Read and decode the document at this resource's URI. A loaded
    /// resource is left as is.
    pub fn load(&self) -> Result<(), ModelError> {
        if self.is_loaded() {
            debug!(uri = %self.uri(), "Resource already loaded");
            return Ok(());
        }
        let uri = self.uri();
        let options = match self.resource_set() {
            Some(set) => set.transport_options(),
            None => TransportOptions::default(),
        };
        let bytes = transport::read_document(&uri, &options)?;
        self.load_from_bytes(&bytes)?;
        info!(uri = %uri, roots = self.len(), kind = self.kind(), "Resource loaded");
        Ok(())
    }

    /// Decode `bytes` into this resource using the metamodels of its
    /// resource set, or of the global registry when it has none.
    pub fn load_from_bytes(&self, bytes: &[u8]) -> Result<(), ModelError> {
        let scope = self.metamodel_scope();
        self.0.codec.decode(bytes, self, &scope)?;
        self.0.state.write().loaded = true;
        Ok(())
    }

    /// Encode and write to this resource's URI.
    pub fn save(&self) -> Result<(), ModelError> {
        self.save_to(&self.uri())
    }

    /// Encode and write to another location. Hrefs stay relative to this
    /// resource's own URI.
    pub fn save_to(&self, uri: &Uri) -> Result<(), ModelError> {
        let bytes = self.to_bytes()?;
        transport::write_document(uri, &bytes)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        self.0.codec.encode(self)
    }

    pub fn ptr_eq(&self, other: &Resource) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn metamodel_scope(&self) -> MetamodelScope {
        match self.resource_set() {
            Some(set) => set.metamodel_scope(),
            None => GlobalRegistry::shared().metamodel_scope(),
        }
    }

    fn root_at(&self, index: usize, fragment: &str) -> Result<EObject, ModelError> {
        self.0.state.read().contents.get(index).cloned().ok_or_else(|| {
            ModelError::Addressing(format!(
                "{} has no root {} (fragment '{}')",
                self.uri(),
                index,
                fragment
            ))
        })
    }

    pub(crate) fn from_inner(inner: Arc<ResourceInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<ResourceInner> {
        Arc::downgrade(&self.0)
    }

    /// Drop `object` from the roots without touching its own pointers.
    pub(crate) fn forget_root(&self, object: &EObject) {
        self.0
            .state
            .write()
            .contents
            .retain(|root| !root.ptr_eq(object));
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Resource {}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.read();
        f.debug_struct("Resource")
            .field("uri", &state.uri.plain())
            .field("kind", &self.0.kind)
            .field("roots", &state.contents.len())
            .field("loaded", &state.loaded)
            .finish()
    }
}
