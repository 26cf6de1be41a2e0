//! Document codec
//!
//! `Codec` turns document bytes into a containment tree and back. The built-in
//! `JsonCodec` reads and writes this grammar:
//!
//! ```json
//! {
//!   "namespaces": { "shop": "http://shop/1.0" },
//!   "contents": [
//!     { "type": "shop:Shop",
//!       "features": {
//!         "name": "main",
//!         "items": [ { "type": "shop:Item", "features": { "price": 3.5 } } ],
//!         "supplier": { "href": "suppliers.xmi#/0" } } }
//!   ]
//! }
//! ```
//!
//! Containment values are nested objects, cross references are `href`s.
//! Hrefs starting with `#` are bound once the whole document is built; all
//! others become proxies resolved on first use.

use super::Resource;
use crate::error::ModelError;
use crate::metamodel::{EClass, MetamodelScope, StructuralFeature};
use crate::object::{EObject, Link, Value};
use crate::proxy::EProxy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Parse bytes into a resource's contents, and serialize them back.
pub trait Codec: Send + Sync + fmt::Debug {
    /// Build the containment tree described by `bytes` and append its roots
    /// to `resource`. Types are looked up in `scope`.
    fn decode(
        &self,
        bytes: &[u8],
        resource: &Resource,
        scope: &MetamodelScope,
    ) -> Result<(), ModelError>;

    fn encode(&self, resource: &Resource) -> Result<Vec<u8>, ModelError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DocumentRecord {
    #[serde(default)]
    namespaces: BTreeMap<String, String>,
    #[serde(default)]
    contents: Vec<ObjectRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ObjectRecord {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    features: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ReferenceRecord {
    Href { href: String },
    Object(ObjectRecord),
}

/// JSON document codec.
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    /// Namespace for type names written without a prefix.
    default_namespace: Option<String>,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_namespace(ns_uri: impl Into<String>) -> Self {
        Self {
            default_namespace: Some(ns_uri.into()),
        }
    }
}

impl Codec for JsonCodec {
    fn decode(
        &self,
        bytes: &[u8],
        resource: &Resource,
        scope: &MetamodelScope,
    ) -> Result<(), ModelError> {
        let document: DocumentRecord = serde_json::from_slice(bytes)?;
        let mut decoder = Decoder {
            namespaces: &document.namespaces,
            default_namespace: self.default_namespace.as_deref(),
            scope,
            resource,
            pending: Vec::new(),
        };

        let mut roots = Vec::with_capacity(document.contents.len());
        for record in &document.contents {
            roots.push(decoder.build(record)?);
        }
        for root in &roots {
            resource.append(root);
        }

        let pending = std::mem::take(&mut decoder.pending);
        for (owner, feature, proxy) in pending {
            match proxy.force_resolve() {
                Ok(target) => owner.replace_proxy(&feature, &proxy, target),
                Err(err) => {
                    // a half-bound document must not stay visible in the resource
                    for root in &roots {
                        root.detach();
                    }
                    return Err(err);
                }
            }
        }
        debug!(uri = %resource.uri(), roots = roots.len(), "Document decoded");
        Ok(())
    }

    fn encode(&self, resource: &Resource) -> Result<Vec<u8>, ModelError> {
        let mut encoder = Encoder {
            resource,
            default_namespace: self.default_namespace.as_deref(),
            namespaces: BTreeMap::new(),
        };
        let contents = resource
            .contents()
            .iter()
            .map(|root| encoder.record(root))
            .collect::<Result<Vec<_>, _>>()?;
        let document = DocumentRecord {
            namespaces: encoder.namespaces,
            contents,
        };
        Ok(serde_json::to_vec_pretty(&document)?)
    }
}

struct Decoder<'a> {
    namespaces: &'a BTreeMap<String, String>,
    default_namespace: Option<&'a str>,
    scope: &'a MetamodelScope,
    resource: &'a Resource,
    /// Intra-document references to bind after the tree exists.
    pending: Vec<(EObject, String, EProxy)>,
}

impl Decoder<'_> {
    fn class_of(&self, type_name: &str) -> Result<Arc<EClass>, ModelError> {
        let (prefix, name) = type_name.split_once(':').unwrap_or(("", type_name));
        let ns_uri = match self.namespaces.get(prefix) {
            Some(ns_uri) => ns_uri.as_str(),
            None if prefix.is_empty() => self.default_namespace.ok_or_else(|| {
                ModelError::Codec(format!("type '{}' has no namespace prefix", type_name))
            })?,
            None => {
                return Err(ModelError::Codec(format!(
                    "undeclared namespace prefix '{}' in type '{}'",
                    prefix, type_name
                )))
            }
        };
        let class = self.scope.class(ns_uri, name)?;
        if class.is_abstract() {
            return Err(ModelError::Codec(format!(
                "cannot instantiate abstract class {}",
                type_name
            )));
        }
        Ok(class)
    }

    fn build(&mut self, record: &ObjectRecord) -> Result<EObject, ModelError> {
        let object = EObject::new(self.class_of(&record.type_name)?);
        for (name, raw) in &record.features {
            let feature = object.feature(name)?;
            let values = expand(&feature, raw)?;
            if feature.is_reference() {
                for value in values {
                    self.add_reference(&object, &feature, value)?;
                }
            } else {
                let data_type = feature
                    .data_type()
                    .ok_or_else(|| ModelError::Codec(format!("{} holds no values", name)))?;
                for value in values {
                    let value = Value::from_json(data_type, value)?;
                    if feature.is_many() {
                        object.push_attribute(name, value)?;
                    } else {
                        object.set_attribute(name, value)?;
                    }
                }
            }
        }
        Ok(object)
    }

    fn add_reference(
        &mut self,
        owner: &EObject,
        feature: &StructuralFeature,
        raw: &serde_json::Value,
    ) -> Result<(), ModelError> {
        let record: ReferenceRecord = serde_json::from_value(raw.clone())?;
        let link = match record {
            ReferenceRecord::Object(child) => {
                if !feature.is_containment() {
                    return Err(ModelError::Codec(format!(
                        "inline object in cross reference '{}'; use an href",
                        feature.name()
                    )));
                }
                Link::Object(self.build(&child)?)
            }
            ReferenceRecord::Href { href } => {
                let proxy = EProxy::with_origin(href.as_str(), self.resource);
                if href.starts_with('#') {
                    self.pending
                        .push((owner.clone(), feature.name().to_string(), proxy.clone()));
                }
                Link::Proxy(proxy)
            }
        };
        if feature.is_many() {
            owner.push_reference(feature.name(), link)
        } else {
            owner.set_reference(feature.name(), Some(link))
        }
    }
}

/// Values of a feature as a list, checking multiplicity.
fn expand<'v>(
    feature: &StructuralFeature,
    raw: &'v serde_json::Value,
) -> Result<Vec<&'v serde_json::Value>, ModelError> {
    match raw {
        serde_json::Value::Array(items) if feature.is_many() => Ok(items.iter().collect()),
        serde_json::Value::Array(_) => Err(ModelError::Codec(format!(
            "'{}' is single-valued but holds a list",
            feature.name()
        ))),
        serde_json::Value::Null => Ok(Vec::new()),
        single => Ok(vec![single]),
    }
}

struct Encoder<'a> {
    resource: &'a Resource,
    default_namespace: Option<&'a str>,
    namespaces: BTreeMap<String, String>,
}

impl Encoder<'_> {
    fn type_name(&mut self, class: &EClass) -> Result<String, ModelError> {
        let ns_uri = class.ns_uri().ok_or_else(|| {
            ModelError::Codec(format!("class {} belongs to no package", class.name()))
        })?;
        if self.default_namespace == Some(ns_uri) {
            return Ok(class.name().to_string());
        }
        let base = class.ns_prefix().filter(|p| !p.is_empty()).unwrap_or("ns");
        let mut prefix = base.to_string();
        let mut counter = 1;
        loop {
            match self.namespaces.get(&prefix) {
                Some(bound) if bound == ns_uri => break,
                Some(_) => {
                    prefix = format!("{}{}", base, counter);
                    counter += 1;
                }
                None => {
                    self.namespaces.insert(prefix.clone(), ns_uri.to_string());
                    break;
                }
            }
        }
        Ok(format!("{}:{}", prefix, class.name()))
    }

    fn record(&mut self, object: &EObject) -> Result<ObjectRecord, ModelError> {
        let class = object.eclass();
        let type_name = self.type_name(&class)?;
        let mut features = BTreeMap::new();
        for feature in class.features() {
            let values = if feature.is_reference() {
                object
                    .references(feature.name())?
                    .iter()
                    .map(|link| self.reference(feature, link))
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                object
                    .attribute_values(feature.name())?
                    .iter()
                    .map(Value::to_json)
                    .collect()
            };
            if values.is_empty() {
                continue;
            }
            let value = if feature.is_many() {
                serde_json::Value::Array(values)
            } else {
                values.into_iter().next().unwrap_or(serde_json::Value::Null)
            };
            features.insert(feature.name().to_string(), value);
        }
        Ok(ObjectRecord {
            type_name,
            features,
        })
    }

    fn reference(
        &mut self,
        feature: &StructuralFeature,
        link: &Link,
    ) -> Result<serde_json::Value, ModelError> {
        if feature.is_containment() {
            let child = link.as_object().ok_or_else(|| {
                ModelError::Consistency(format!("proxy held by containment {}", feature.name()))
            })?;
            let record = self.record(child)?;
            return Ok(serde_json::to_value(record)?);
        }
        let href = match link {
            Link::Object(target) => self.href_to(target)?,
            Link::Proxy(proxy) => match proxy.wrapped() {
                Some(target) => self.href_to(&target)?,
                None => proxy.href().to_string(),
            },
        };
        Ok(serde_json::to_value(ReferenceRecord::Href { href })?)
    }

    fn href_to(&self, target: &EObject) -> Result<String, ModelError> {
        let fragment = target.uri_fragment()?;
        let owner = target.e_resource().ok_or_else(|| {
            ModelError::Addressing(format!("{:?} is not contained in a resource", target))
        })?;
        if owner.ptr_eq(self.resource) {
            return Ok(format!("#{}", fragment));
        }
        let location = self.resource.uri().relative_path_to(&owner.uri());
        Ok(format!("{}#{}", location, fragment))
    }
}
