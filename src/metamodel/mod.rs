//! Metamodels
//!
//! Type descriptors for model objects: packages identified by a namespace URI,
//! classes with structural features, and the `Metamodel` capability a resource
//! set consults to instantiate the types named in documents.

pub mod ecore;

pub use ecore::{ecore_package, ECORE_NS_URI};

use crate::error::ModelError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Primitive type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Int,
    Boolean,
    Float,
}

impl DataType {
    /// Map an Ecore datatype name (`EString`, `EInt`, ...) to a data type.
    pub fn from_ecore_name(name: &str) -> Option<Self> {
        match name {
            "EString" | "EChar" | "ECharacterObject" => Some(DataType::String),
            "EInt" | "EIntegerObject" | "ELong" | "ELongObject" | "EShort" | "EByte"
            | "EBigInteger" => Some(DataType::Int),
            "EBoolean" | "EBooleanObject" => Some(DataType::Boolean),
            "EFloat" | "EFloatObject" | "EDouble" | "EDoubleObject" | "EBigDecimal" => {
                Some(DataType::Float)
            }
            _ => None,
        }
    }

    pub fn ecore_name(&self) -> &'static str {
        match self {
            DataType::String => "EString",
            DataType::Int => "EInt",
            DataType::Boolean => "EBoolean",
            DataType::Float => "EDouble",
        }
    }
}

/// What a structural feature holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureKind {
    Attribute(DataType),
    Reference { target: String, containment: bool },
}

/// A named slot declared by a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralFeature {
    name: String,
    kind: FeatureKind,
    many: bool,
}

impl StructuralFeature {
    pub fn new(name: impl Into<String>, kind: FeatureKind, many: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            many,
        }
    }

    pub fn attribute(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, FeatureKind::Attribute(data_type), false)
    }

    pub fn attributes(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, FeatureKind::Attribute(data_type), true)
    }

    /// Single-valued cross reference.
    pub fn reference(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, reference_kind(target, false), false)
    }

    /// Multi-valued cross reference.
    pub fn references(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, reference_kind(target, false), true)
    }

    /// Single-valued containment.
    pub fn containment(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, reference_kind(target, true), false)
    }

    /// Multi-valued containment.
    pub fn containments(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, reference_kind(target, true), true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FeatureKind {
        &self.kind
    }

    pub fn is_many(&self) -> bool {
        self.many
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FeatureKind::Reference { .. })
    }

    pub fn is_containment(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Reference {
                containment: true,
                ..
            }
        )
    }

    /// Name of the referenced class, for references.
    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            FeatureKind::Reference { target, .. } => Some(target),
            FeatureKind::Attribute(_) => None,
        }
    }

    pub fn data_type(&self) -> Option<DataType> {
        match self.kind {
            FeatureKind::Attribute(data_type) => Some(data_type),
            FeatureKind::Reference { .. } => None,
        }
    }
}

fn reference_kind(target: impl Into<String>, containment: bool) -> FeatureKind {
    FeatureKind::Reference {
        target: target.into(),
        containment,
    }
}

/// A class: the type descriptor of model objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EClass {
    name: String,
    is_abstract: bool,
    features: Vec<StructuralFeature>,
    ns_uri: Option<String>,
    ns_prefix: Option<String>,
}

impl EClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            features: Vec::new(),
            ns_uri: None,
            ns_prefix: None,
        }
    }

    pub fn with_feature(mut self, feature: StructuralFeature) -> Self {
        self.features.retain(|f| f.name != feature.name);
        self.features.push(feature);
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn features(&self) -> &[StructuralFeature] {
        &self.features
    }

    pub fn feature(&self, name: &str) -> Option<&StructuralFeature> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Namespace URI of the owning package, if the class belongs to one.
    pub fn ns_uri(&self) -> Option<&str> {
        self.ns_uri.as_deref()
    }

    pub fn ns_prefix(&self) -> Option<&str> {
        self.ns_prefix.as_deref()
    }

    /// Two descriptors denote the same type when name and namespace agree.
    pub fn same_type(&self, other: &EClass) -> bool {
        self.name == other.name && self.ns_uri == other.ns_uri
    }

    fn bind_package(mut self, ns_uri: &str, ns_prefix: &str) -> Self {
        self.ns_uri = Some(ns_uri.to_string());
        self.ns_prefix = Some(ns_prefix.to_string());
        self
    }
}

/// Capability resolving type names within one namespace.
pub trait Metamodel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn ns_uri(&self) -> &str;

    fn ns_prefix(&self) -> &str;

    /// Look up a class by name (`getEClassifier`).
    fn classifier(&self, name: &str) -> Option<Arc<EClass>>;

    fn classifiers(&self) -> Vec<Arc<EClass>>;
}

/// A package of classes sharing one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EPackage {
    name: String,
    ns_uri: String,
    ns_prefix: String,
    classifiers: Vec<Arc<EClass>>,
}

impl EPackage {
    pub fn new(
        name: impl Into<String>,
        ns_uri: impl Into<String>,
        ns_prefix: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ns_uri: ns_uri.into(),
            ns_prefix: ns_prefix.into(),
            classifiers: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: EClass) -> Self {
        self.add_class(class);
        self
    }

    /// Add a class, binding it to this package. A class with the same name is replaced.
    pub fn add_class(&mut self, class: EClass) -> Arc<EClass> {
        let class = Arc::new(class.bind_package(&self.ns_uri, &self.ns_prefix));
        self.classifiers.retain(|c| c.name != class.name);
        self.classifiers.push(Arc::clone(&class));
        class
    }
}

impl Metamodel for EPackage {
    fn name(&self) -> &str {
        &self.name
    }

    fn ns_uri(&self) -> &str {
        &self.ns_uri
    }

    fn ns_prefix(&self) -> &str {
        &self.ns_prefix
    }

    fn classifier(&self, name: &str) -> Option<Arc<EClass>> {
        self.classifiers.iter().find(|c| c.name == name).cloned()
    }

    fn classifiers(&self) -> Vec<Arc<EClass>> {
        self.classifiers.clone()
    }
}

/// The metamodels visible to one load: namespace URI to metamodel.
#[derive(Debug, Clone, Default)]
pub struct MetamodelScope {
    metamodels: HashMap<String, Arc<dyn Metamodel>>,
}

impl MetamodelScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ns_uri: impl Into<String>, metamodel: Arc<dyn Metamodel>) {
        self.metamodels.insert(ns_uri.into(), metamodel);
    }

    pub fn get(&self, ns_uri: &str) -> Option<Arc<dyn Metamodel>> {
        self.metamodels.get(ns_uri).cloned()
    }

    /// Metamodel for `ns_uri`, or `UnknownMetamodel`.
    pub fn lookup(&self, ns_uri: &str) -> Result<Arc<dyn Metamodel>, ModelError> {
        self.get(ns_uri).ok_or_else(|| {
            ModelError::UnknownMetamodel(format!("no metamodel registered for {}", ns_uri))
        })
    }

    /// Resolve `class_name` inside the namespace `ns_uri`.
    pub fn class(&self, ns_uri: &str, class_name: &str) -> Result<Arc<EClass>, ModelError> {
        self.lookup(ns_uri)?.classifier(class_name).ok_or_else(|| {
            ModelError::UnknownMetamodel(format!(
                "metamodel {} has no classifier named {}",
                ns_uri, class_name
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.metamodels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metamodels.is_empty()
    }
}
