use super::common::fixture;
use modelset::metamodel::ECORE_NS_URI;
use modelset::{DataType, EProxy, GlobalRegistry, Metamodel, ModelError, ResourceSet, Value};
use std::sync::Arc;

const C2_NS: &str = "http://C2/1.0";

fn set_with_c2() -> ResourceSet {
    let set = ResourceSet::with_registry(Arc::new(GlobalRegistry::new()));
    let metamodel = set.get_resource(fixture("C2.ecore")).unwrap();
    assert_eq!(set.register_packages_from(&metamodel).unwrap(), vec![C2_NS.to_string()]);
    set
}

#[test]
fn test_ecore_document_becomes_metamodel() {
    let set = set_with_c2();
    let package = set.metamodel(C2_NS).unwrap();
    assert_eq!(package.ns_prefix(), "C2");

    let stuff = package.classifier("SuperStuff").unwrap();
    assert_eq!(stuff.feature("name").unwrap().data_type(), Some(DataType::String));
    let weights = stuff.feature("weights").unwrap();
    assert!(weights.is_many());
    assert_eq!(weights.data_type(), Some(DataType::Float));
    let children = stuff.feature("children").unwrap();
    assert!(children.is_containment());
    assert_eq!(children.target(), Some("SuperStuff"));
}

#[test]
fn test_instances_of_loaded_metamodel() {
    let set = set_with_c2();
    let resource = set.get_resource(fixture("stuff.xmi")).unwrap();
    let top = resource.contents()[0].clone();
    assert_eq!(top.name().as_deref(), Some("top"));
    assert_eq!(top.eclass().ns_uri(), Some(C2_NS));
    assert_eq!(
        top.attribute_values("weights").unwrap(),
        vec![Value::Float(1.5), Value::Float(2.0)]
    );

    let children = top.contents();
    assert_eq!(children.len(), 2);
    assert_eq!(children[1].name().as_deref(), Some("second"));
    assert_eq!(children[1].uri_fragment().unwrap(), "/0/@children.1");
    assert!(resource.resolve_fragment("/0/@children.0").unwrap().ptr_eq(&children[0]));
}

#[test]
fn test_name_based_fragments_in_ecore_documents() {
    let set = ResourceSet::with_registry(Arc::new(GlobalRegistry::new()));
    let metamodel = set.get_resource(fixture("C2.ecore")).unwrap();
    let class = metamodel.resolve_fragment("//SuperStuff").unwrap();
    assert_eq!(class.eclass().name(), "EClass");
    assert_eq!(class.eclass().ns_uri(), Some(ECORE_NS_URI));

    // the self reference was bound while loading
    let children = class.references("eStructuralFeatures").unwrap()[2].resolve().unwrap();
    let etype = children.reference("eType").unwrap().unwrap();
    assert!(!etype.is_proxy());
    assert!(etype.resolve().unwrap().ptr_eq(&class));

    assert!(matches!(
        metamodel.resolve_fragment("//Missing"),
        Err(ModelError::Addressing(_))
    ));
}

#[test]
fn test_instances_need_registered_metamodel() {
    let set = ResourceSet::with_registry(Arc::new(GlobalRegistry::new()));
    assert!(matches!(
        set.get_resource(fixture("stuff.xmi")),
        Err(ModelError::UnknownMetamodel(_))
    ));
}

#[test]
fn test_datatype_references_resolve_to_ecore() {
    let set = ResourceSet::with_registry(Arc::new(GlobalRegistry::new()));
    let metamodel = set.get_resource(fixture("C2.ecore")).unwrap();
    let class = metamodel.resolve_fragment("//SuperStuff").unwrap();
    let features = class.references("eStructuralFeatures").unwrap();

    let name_type = features[0].reference("eType").unwrap().unwrap();
    assert!(name_type.is_proxy());
    let estring = name_type.resolve().unwrap();
    assert_eq!(estring.eclass().name(), "EDataType");
    assert_eq!(estring.name().as_deref(), Some("EString"));
    assert_eq!(estring.e_resource().unwrap().uri().plain(), ECORE_NS_URI);

    let weights_type = features[1].reference("eType").unwrap().unwrap();
    assert_eq!(weights_type.resolve().unwrap().name().as_deref(), Some("EDouble"));

    // both datatypes live in one reflected Ecore package, not in a loaded document
    let edouble = weights_type.resolve().unwrap();
    assert!(estring.e_container().unwrap().ptr_eq(&edouble.e_container().unwrap()));
    assert_eq!(set.resources().len(), 1);
}

#[test]
fn test_hrefs_into_set_registered_metamodel() {
    let set = set_with_c2();
    let origin = set.get_resource(fixture("stuff.xmi")).unwrap();
    let proxy = EProxy::with_origin(format!("{}#//SuperStuff", C2_NS), &origin);
    let class = proxy.force_resolve().unwrap();
    assert_eq!(class.eclass().name(), "EClass");
    let children = class.references("eStructuralFeatures").unwrap()[2].resolve().unwrap();
    assert_eq!(children.attribute("containment").unwrap(), Some(Value::Boolean(true)));
    assert!(children.reference("eType").unwrap().unwrap().points_to(&class));

    // the global registry never saw C2
    assert!(!set.global_registry().contains(C2_NS));
    let reflected = set.metamodel_resource(C2_NS).unwrap();
    assert!(reflected.contents()[0].ptr_eq(&class.e_container().unwrap()));
}
