//! Modelset: typed model graphs spread over many documents
//!
//! Documents (`Resource`s) hold containment trees of reflective objects typed
//! by metamodels. A `ResourceSet` caches documents by normalized URI and
//! resolves cross-document references lazily through `EProxy` placeholders.

pub mod config;
pub mod error;
pub mod logging;
pub mod metamodel;
pub mod object;
pub mod proxy;
pub mod registry;
pub mod resource;
pub mod resource_set;
pub mod tooling;
pub mod types;
pub mod uri;

pub use error::ModelError;
pub use metamodel::{DataType, EClass, EPackage, Metamodel, MetamodelScope, StructuralFeature};
pub use object::{EObject, Link, Value};
pub use proxy::EProxy;
pub use registry::{GlobalRegistry, GlobalUriDecoder, RegistryEntry};
pub use resource::Resource;
pub use resource_set::ResourceSet;
pub use uri::{HttpUri, Uri};
