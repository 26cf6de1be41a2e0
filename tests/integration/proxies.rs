use super::common::{fixture, instance, pack_set};
use modelset::{EProxy, GlobalRegistry, Link, ModelError, RegistryEntry, ResourceSet, Uri};
use std::sync::Arc;

fn first_a(set: &ResourceSet, document: &str) -> modelset::EObject {
    let resource = set.get_resource(fixture(document)).unwrap();
    let root = resource.contents()[0].clone();
    root.reference("a").unwrap().unwrap().resolve().unwrap()
}

#[test]
fn test_cross_document_proxy_resolves_lazily() {
    let set = pack_set();
    let a = first_a(&set, "a1.xmi");
    let tob = a.references("tob").unwrap();
    assert_eq!(tob.len(), 1);
    assert!(tob[0].is_proxy());
    assert_eq!(set.resources().len(), 1);

    let b = tob[0].resolve().unwrap();
    assert_eq!(b.eclass().name(), "B");
    assert_eq!(b.uri_fragment().unwrap(), "/0/@b.0");
    let owner = b.e_resource().unwrap();
    assert_eq!(owner.uri().normalize(), Uri::new(fixture("b1.xmi")).normalize());
    assert_eq!(set.resources().len(), 2);
    // still a proxy link, now wrapping its target
    assert!(a.references("tob").unwrap()[0].is_proxy());
}

#[test]
fn test_force_resolve_is_idempotent() {
    let set = pack_set();
    let a = first_a(&set, "a1.xmi");
    let link = a.reference("tob").unwrap().unwrap();
    let proxy = link.as_proxy().unwrap();
    assert!(!proxy.is_resolved());

    let first = proxy.force_resolve().unwrap();
    let second = proxy.force_resolve().unwrap();
    assert!(proxy.is_resolved());
    assert!(first.ptr_eq(&second));
    assert!(proxy.wrapped().unwrap().ptr_eq(&first));
}

#[test]
fn test_relative_href_into_subdirectory() {
    let set = pack_set();
    let a = first_a(&set, "a2.xmi");
    let tob = a.references("tob").unwrap();
    assert_eq!(tob.len(), 2);

    let inner = tob[0].resolve().unwrap();
    assert_eq!(
        inner.e_resource().unwrap().uri().normalize(),
        Uri::new(fixture("inner/b2.xmi")).normalize()
    );

    // `#` hrefs are bound while loading
    assert!(!tob[1].is_proxy());
    let local = tob[1].resolve().unwrap();
    assert!(local.e_resource().unwrap().ptr_eq(&a.e_resource().unwrap()));
}

#[test]
fn test_unknown_metamodel_in_target_document() {
    let set = pack_set();
    let a = first_a(&set, "a1-1.xmi");
    let link = a.reference("tob").unwrap().unwrap();
    assert!(matches!(link.resolve(), Err(ModelError::UnknownMetamodel(_))));
    assert!(!link.as_proxy().unwrap().is_resolved());
    assert_eq!(set.resources().len(), 1);
}

#[test]
fn test_transparent_access_through_proxy() {
    let set = pack_set();
    let a = first_a(&set, "a1.xmi");
    let link = a.reference("tob").unwrap().unwrap();
    assert_eq!(link.eclass().unwrap().name(), "B");
    assert_eq!(link.attribute("name").unwrap(), None);
    assert!(matches!(link.attribute("missing"), Err(ModelError::Feature(_))));
}

#[test]
fn test_proxy_resolves_through_registry_entry() {
    let registry = Arc::new(GlobalRegistry::new());
    let set = ResourceSet::with_registry(Arc::clone(&registry));
    set.register_package(super::common::simplemm());

    let library = modelset::Resource::new("http://objects/library");
    let root = instance("Root");
    let b = instance("B");
    root.push_reference("b", &b).unwrap();
    library.append(&root);
    registry.insert("http://objects/library", RegistryEntry::Resource(library));

    let origin = set.create_resource("local.xmi").unwrap();
    let proxy = EProxy::with_origin("http://objects/library#/0/@b.0", &origin);
    assert!(Link::from(proxy.clone()).resolve().unwrap().ptr_eq(&b));
    assert!(set.resources().len() == 1);
}

#[test]
fn test_detached_proxy_without_registry_entry() {
    let proxy = EProxy::new("nowhere-to-be-found.xmi#/0");
    assert!(matches!(
        proxy.force_resolve(),
        Err(ModelError::ResolutionNotFound(_))
    ));

    let local = EProxy::new("#/0");
    assert!(matches!(local.force_resolve(), Err(ModelError::Addressing(_))));
}

#[test]
fn test_bad_fragment_in_href() {
    let set = pack_set();
    let origin = set.get_resource(fixture("a1.xmi")).unwrap();
    let proxy = EProxy::with_origin("b1.xmi#/0/@b.9", &origin);
    assert!(matches!(proxy.force_resolve(), Err(ModelError::Addressing(_))));
}
