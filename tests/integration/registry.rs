use super::common::{instance, simplemm, PACK_NS};
use modelset::{
    EObject, GlobalRegistry, GlobalUriDecoder, ModelError, RegistryEntry, Resource, ResourceSet,
    Value,
};
use std::sync::Arc;

fn named(class: &str, name: &str) -> EObject {
    let object = instance(class);
    object.set_attribute("name", name).unwrap();
    object
}

#[test]
fn test_decoder_resolves_registered_resource() {
    let registry = Arc::new(GlobalRegistry::new());
    let decoder = GlobalUriDecoder::new(Arc::clone(&registry));
    assert!(!decoder.can_resolve("http://simple.ecore#//test"));

    let resource = Resource::new("http://simple.ecore");
    let root = instance("Root");
    let a = named("A", "test");
    root.push_reference("a", &a).unwrap();
    resource.append(&root);
    registry.insert("http://simple.ecore", RegistryEntry::Resource(resource));

    assert!(decoder.can_resolve("http://simple.ecore#//test"));
    assert!(decoder.resolve("http://simple.ecore#//test").unwrap().ptr_eq(&a));
    assert!(decoder.resolve("http://simple.ecore#/0/@a.0").unwrap().ptr_eq(&a));

    // the resource set cache is a different thing
    let set = ResourceSet::with_registry(registry);
    assert!(!set.can_resolve("http://simple.ecore#//test"));
}

#[test]
fn test_decoder_object_entries() {
    let registry = Arc::new(GlobalRegistry::new());
    let root = instance("Root");
    let a = instance("A");
    root.push_reference("a", &a).unwrap();
    registry.insert("urn:root", RegistryEntry::Object(root.clone()));

    let decoder = GlobalUriDecoder::new(registry);
    assert!(decoder.resolve("urn:root").unwrap().ptr_eq(&root));
    assert!(decoder.resolve("urn:root#/").unwrap().ptr_eq(&root));
    assert!(decoder.resolve("urn:root#/@a.0").unwrap().ptr_eq(&a));
}

#[test]
fn test_decoder_addresses_registered_metamodels() {
    let registry = Arc::new(GlobalRegistry::new());
    registry.register_package(Arc::new(simplemm()));
    let decoder = GlobalUriDecoder::new(registry);

    let a = decoder.resolve(&format!("{}#//A", PACK_NS)).unwrap();
    assert_eq!(a.eclass().name(), "EClass");
    assert_eq!(a.name().as_deref(), Some("A"));
    let package = decoder.resolve(PACK_NS).unwrap();
    assert_eq!(package.attribute("nsURI").unwrap(), Some(Value::from(PACK_NS)));
    assert!(a.e_container().unwrap().ptr_eq(&package));

    assert!(matches!(
        decoder.resolve(&format!("{}#//Missing", PACK_NS)),
        Err(ModelError::Addressing(_))
    ));
    assert!(matches!(
        decoder.resolve("http://unknown#/0"),
        Err(ModelError::ResolutionNotFound(_))
    ));
}

#[test]
fn test_registry_changes_after_set_creation_are_not_seen() {
    let registry = Arc::new(GlobalRegistry::new());
    let set = ResourceSet::with_registry(Arc::clone(&registry));
    registry.register_package(Arc::new(simplemm()));
    assert!(set.metamodel(PACK_NS).is_none());
    assert!(ResourceSet::with_registry(registry).metamodel(PACK_NS).is_some());
}
