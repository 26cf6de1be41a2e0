//! The Ecore metamodel
//!
//! A built-in package describing metamodels themselves, so `.ecore`
//! documents load like any other model. `EPackage::from_object` turns a
//! loaded Ecore package back into a usable metamodel.

use super::{DataType, EClass, EPackage, Metamodel, StructuralFeature};
use crate::error::ModelError;
use crate::object::{EObject, Link};
use crate::resource::{CodecResourceFactory, Resource, ResourceFactory};
use crate::types::split_href;
use crate::uri::Uri;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

pub const ECORE_NS_URI: &str = "http://www.eclipse.org/emf/2002/Ecore";
pub const ECORE_NS_PREFIX: &str = "ecore";

/// The shared Ecore package.
pub fn ecore_package() -> Arc<EPackage> {
    static ECORE: OnceLock<Arc<EPackage>> = OnceLock::new();
    Arc::clone(ECORE.get_or_init(|| Arc::new(build_ecore())))
}

fn build_ecore() -> EPackage {
    let name = || StructuralFeature::attribute("name", DataType::String);
    let bounds = |class: EClass| {
        class
            .with_feature(StructuralFeature::attribute("lowerBound", DataType::Int))
            .with_feature(StructuralFeature::attribute("upperBound", DataType::Int))
            .with_feature(StructuralFeature::reference("eType", "EClassifier"))
    };

    EPackage::new("ecore", ECORE_NS_URI, ECORE_NS_PREFIX)
        .with_class(
            EClass::new("EPackage")
                .with_feature(name())
                .with_feature(StructuralFeature::attribute("nsURI", DataType::String))
                .with_feature(StructuralFeature::attribute("nsPrefix", DataType::String))
                .with_feature(StructuralFeature::containments("eClassifiers", "EClassifier"))
                .with_feature(StructuralFeature::containments("eSubpackages", "EPackage")),
        )
        .with_class(EClass::new("EClassifier").abstract_class().with_feature(name()))
        .with_class(
            EClass::new("EClass")
                .with_feature(name())
                .with_feature(StructuralFeature::attribute("abstract", DataType::Boolean))
                .with_feature(StructuralFeature::containments(
                    "eStructuralFeatures",
                    "EStructuralFeature",
                ))
                .with_feature(StructuralFeature::references("eSuperTypes", "EClass")),
        )
        .with_class(
            EClass::new("EDataType")
                .with_feature(name())
                .with_feature(StructuralFeature::attribute("instanceClassName", DataType::String)),
        )
        .with_class(EClass::new("EStructuralFeature").abstract_class().with_feature(name()))
        .with_class(bounds(EClass::new("EAttribute").with_feature(name())))
        .with_class(bounds(
            EClass::new("EReference")
                .with_feature(name())
                .with_feature(StructuralFeature::attribute("containment", DataType::Boolean)),
        ))
}

fn is_ecore(object: &EObject, class_name: &str) -> bool {
    let eclass = object.eclass();
    eclass.ns_uri() == Some(ECORE_NS_URI) && eclass.name() == class_name
}

fn string_attr(object: &EObject, name: &str) -> Result<Option<String>, ModelError> {
    Ok(object
        .attribute(name)?
        .and_then(|v| v.as_str().map(str::to_string)))
}

fn required_name(object: &EObject) -> Result<String, ModelError> {
    string_attr(object, "name")?.ok_or_else(|| {
        ModelError::Consistency(format!("{} without a name", object.eclass().name()))
    })
}

/// Name of the classifier a link designates, without resolving proxies.
fn type_name(link: &Link) -> Option<String> {
    match link {
        Link::Object(object) => object.name(),
        Link::Proxy(proxy) => match proxy.wrapped() {
            Some(object) => object.name(),
            None => {
                let (_, fragment) = split_href(proxy.href());
                fragment
                    .rsplit('/')
                    .next()
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            }
        },
    }
}

fn is_many(feature: &EObject) -> Result<bool, ModelError> {
    let upper = feature.attribute("upperBound")?.and_then(|v| v.as_int());
    Ok(matches!(upper, Some(n) if n == -1 || n > 1))
}

fn convert_feature(feature: &EObject) -> Result<Option<StructuralFeature>, ModelError> {
    let name = required_name(feature)?;
    let many = is_many(feature)?;
    let type_name = feature.reference("eType")?.as_ref().and_then(type_name);

    if is_ecore(feature, "EAttribute") {
        let data_type = match type_name.as_deref().and_then(DataType::from_ecore_name) {
            Some(data_type) => data_type,
            None => {
                warn!(
                    attribute = %name,
                    data_type = ?type_name,
                    "Unsupported attribute type, storing values as strings"
                );
                DataType::String
            }
        };
        return Ok(Some(StructuralFeature::new(
            name,
            super::FeatureKind::Attribute(data_type),
            many,
        )));
    }

    if is_ecore(feature, "EReference") {
        let containment = feature
            .attribute("containment")?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let target = type_name.ok_or_else(|| {
            ModelError::Consistency(format!("reference {} has no eType", name))
        })?;
        return Ok(Some(StructuralFeature::new(
            name,
            super::FeatureKind::Reference {
                target,
                containment,
            },
            many,
        )));
    }

    warn!(class = feature.eclass().name(), "Skipping unknown structural feature kind");
    Ok(None)
}

struct ClassDraft {
    class: EClass,
    supertypes: Vec<String>,
}

fn convert_class(classifier: &EObject) -> Result<ClassDraft, ModelError> {
    let mut class = EClass::new(required_name(classifier)?);
    if classifier
        .attribute("abstract")?
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
    {
        class = class.abstract_class();
    }
    for link in classifier.references("eStructuralFeatures")? {
        if let Some(feature) = convert_feature(&link.resolve()?)? {
            class = class.with_feature(feature);
        }
    }
    let supertypes = classifier
        .references("eSuperTypes")?
        .iter()
        .filter_map(type_name)
        .collect();
    Ok(ClassDraft { class, supertypes })
}

/// Features of `name` including those inherited from same-package supertypes.
fn flattened(
    name: &str,
    drafts: &HashMap<String, ClassDraft>,
    visiting: &mut HashSet<String>,
) -> Vec<StructuralFeature> {
    let Some(draft) = drafts.get(name) else {
        return Vec::new();
    };
    if !visiting.insert(name.to_string()) {
        return Vec::new();
    }
    let mut features = Vec::new();
    for parent in &draft.supertypes {
        features.extend(flattened(parent, drafts, visiting));
    }
    features.extend(draft.class.features().iter().cloned());
    visiting.remove(name);
    features
}

impl EPackage {
    /// Build a metamodel from a loaded Ecore `EPackage` object.
    ///
    /// Subpackages are ignored here; `from_resource` collects them.
    pub fn from_object(package: &EObject) -> Result<EPackage, ModelError> {
        if !is_ecore(package, "EPackage") {
            return Err(ModelError::Consistency(format!(
                "expected an ecore EPackage, got {}",
                package.eclass().name()
            )));
        }
        let name = required_name(package)?;
        let ns_uri = string_attr(package, "nsURI")?.ok_or_else(|| {
            ModelError::Consistency(format!("package {} has no nsURI", name))
        })?;
        let ns_prefix = string_attr(package, "nsPrefix")?.unwrap_or_else(|| name.clone());

        let mut order = Vec::new();
        let mut drafts = HashMap::new();
        for link in package.references("eClassifiers")? {
            let classifier = link.resolve()?;
            if is_ecore(&classifier, "EClass") {
                let draft = convert_class(&classifier)?;
                order.push(draft.class.name().to_string());
                drafts.insert(draft.class.name().to_string(), draft);
            }
        }

        let mut result = EPackage::new(name, ns_uri, ns_prefix);
        for class_name in order {
            let features = flattened(&class_name, &drafts, &mut HashSet::new());
            if let Some(draft) = drafts.get(&class_name) {
                let mut class = EClass::new(class_name.clone());
                if draft.class.is_abstract() {
                    class = class.abstract_class();
                }
                for feature in features {
                    class = class.with_feature(feature);
                }
                result.add_class(class);
            }
        }
        Ok(result)
    }

    /// Every package (and subpackage) rooted in an Ecore resource.
    pub fn from_resource(resource: &Resource) -> Result<Vec<EPackage>, ModelError> {
        let mut packages = Vec::new();
        let mut pending: Vec<EObject> = resource.contents();
        while let Some(object) = pending.pop() {
            if !is_ecore(&object, "EPackage") {
                continue;
            }
            for sub in object.references("eSubpackages")?.iter().rev() {
                pending.push(sub.resolve()?);
            }
            packages.push(EPackage::from_object(&object)?);
        }
        Ok(packages)
    }
}

/// Datatypes listed among the classifiers of the reflected Ecore package.
const ECORE_DATA_TYPES: &[&str] = &[
    "EString", "EChar", "EInt", "ELong", "EShort", "EByte", "EBigInteger", "EBoolean", "EFloat",
    "EDouble", "EBigDecimal",
];

fn ecore_object(class_name: &str) -> Result<EObject, ModelError> {
    let class = ecore_package().classifier(class_name).ok_or_else(|| {
        ModelError::Consistency(format!("ecore has no class {}", class_name))
    })?;
    Ok(EObject::new(class))
}

/// Express `metamodel` as Ecore objects held by a resource at its namespace URI,
/// so hrefs like `<nsURI>#//Name` can be walked.
///
/// Attribute types point into `datatypes`, the reflected Ecore resource. When
/// reflecting Ecore itself, pass `None`: its datatypes are created in place.
pub fn reflect(metamodel: &dyn Metamodel, datatypes: Option<&Resource>) -> Result<Resource, ModelError> {
    let resource = CodecResourceFactory::ecore().create(Uri::new(metamodel.ns_uri()));
    let package = ecore_object("EPackage")?;
    package.set_attribute("name", metamodel.name())?;
    package.set_attribute("nsURI", metamodel.ns_uri())?;
    package.set_attribute("nsPrefix", metamodel.ns_prefix())?;

    let mut classes = HashMap::new();
    let classifiers = metamodel.classifiers();
    for class in &classifiers {
        let object = ecore_object("EClass")?;
        object.set_attribute("name", class.name())?;
        if class.is_abstract() {
            object.set_attribute("abstract", true)?;
        }
        package.push_reference("eClassifiers", &object)?;
        classes.insert(class.name().to_string(), object);
    }

    let mut local_types = HashMap::new();
    if datatypes.is_none() {
        for name in ECORE_DATA_TYPES {
            let object = ecore_object("EDataType")?;
            object.set_attribute("name", *name)?;
            package.push_reference("eClassifiers", &object)?;
            local_types.insert(name.to_string(), object);
        }
    }
    resource.append(&package);

    for class in &classifiers {
        let Some(owner) = classes.get(class.name()) else {
            continue;
        };
        for feature in class.features() {
            let (kind, etype) = match feature.kind() {
                super::FeatureKind::Attribute(data_type) => {
                    let name = data_type.ecore_name();
                    let etype = match datatypes {
                        Some(ecore) => Some(ecore.resolve_fragment(&format!("//{}", name))?),
                        None => local_types.get(name).cloned(),
                    };
                    ("EAttribute", etype)
                }
                super::FeatureKind::Reference { target, .. } => {
                    let etype = classes.get(target).cloned();
                    if etype.is_none() {
                        debug!(feature = feature.name(), target = %target, "Reference target outside package left untyped");
                    }
                    ("EReference", etype)
                }
            };
            let object = ecore_object(kind)?;
            object.set_attribute("name", feature.name())?;
            object.set_attribute("upperBound", if feature.is_many() { -1 } else { 1 })?;
            if feature.is_containment() {
                object.set_attribute("containment", true)?;
            }
            if let Some(etype) = etype {
                object.set_reference("eType", Some(Link::from(etype)))?;
            }
            owner.push_reference("eStructuralFeatures", &object)?;
        }
    }
    debug!(ns_uri = metamodel.ns_uri(), classes = classifiers.len(), "Metamodel reflected");
    Ok(resource)
}
