use super::common::{fixture, pack_set, simplemm, PACK_NS};
use modelset::{GlobalRegistry, ModelError, ResourceSet, Uri};
use std::sync::Arc;

#[test]
fn test_double_load_returns_same_resource() {
    let set = pack_set();
    let first = set.get_resource(fixture("a1.xmi")).unwrap();
    let second = set.get_resource(fixture("a1.xmi")).unwrap();
    assert!(first.ptr_eq(&second));
    assert!(first.contents()[0].ptr_eq(&second.contents()[0]));
    assert_eq!(set.resources().len(), 1);
}

#[test]
fn test_resources_keyed_by_normalized_uri() {
    let set = pack_set();
    let resource = set
        .get_resource(format!("{}/../b1.xmi", fixture("inner")))
        .unwrap();
    let key = Uri::new(fixture("b1.xmi")).normalize();
    assert!(set.contains_key(&key));
    assert!(set.resource(fixture("b1.xmi")).unwrap().ptr_eq(&resource));
    assert!(resource.is_loaded());
}

#[test]
fn test_failed_load_leaves_nothing_cached() {
    let set = pack_set();
    let result = set.get_resource(fixture("does-not-exist.xmi"));
    assert!(matches!(result, Err(ModelError::Io(_))));
    assert!(set.resources().is_empty());
}

#[test]
fn test_create_resource_does_not_load() {
    let set = pack_set();
    let resource = set.create_resource(fixture("a1.xmi")).unwrap();
    assert!(resource.is_empty());
    assert!(!resource.is_loaded());
    assert!(set.create_resource(fixture("a1.xmi")).unwrap().ptr_eq(&resource));
    assert!(resource.resource_set().unwrap().ptr_eq(&set));
}

#[test]
fn test_update_uri_rekeys_resource() {
    let set = pack_set();
    let resource = set.create_resource("http://oldURI/model.xmi").unwrap();
    resource.set_uri("http://newURI").unwrap();
    assert_eq!(resource.uri().plain(), "http://newURI");
    assert!(set.resource("http://newURI").unwrap().ptr_eq(&resource));
    assert!(set.resource("http://oldURI/model.xmi").is_none());
    assert_eq!(set.resources().len(), 1);
}

#[test]
fn test_remove_resource_detaches_set() {
    let set = pack_set();
    let resource = set.get_resource(fixture("b1.xmi")).unwrap();
    assert!(set.remove_resource(&resource));
    assert!(!set.remove_resource(&resource));
    assert!(resource.resource_set().is_none());
    assert!(!set.can_resolve(&fixture("b1.xmi")));
}

#[test]
fn test_metamodel_registration_is_per_set() {
    let registry = Arc::new(GlobalRegistry::new());
    let first = ResourceSet::with_registry(Arc::clone(&registry));
    let second = ResourceSet::with_registry(Arc::clone(&registry));
    first.register_package(simplemm());

    assert!(first.metamodel(PACK_NS).is_some());
    assert!(second.metamodel(PACK_NS).is_none());
    assert!(!registry.contains(PACK_NS));

    let result = second.get_resource(fixture("b1.xmi"));
    assert!(matches!(result, Err(ModelError::UnknownMetamodel(_))));
    assert!(first.get_resource(fixture("b1.xmi")).is_ok());
}

#[test]
fn test_sets_see_registry_entries_present_at_creation() {
    let registry = Arc::new(GlobalRegistry::new());
    registry.register_package(Arc::new(simplemm()));
    let set = ResourceSet::with_registry(registry);
    assert!(set.metamodel(PACK_NS).is_some());
    assert!(set.unregister_metamodel(PACK_NS));
    assert!(set.global_registry().contains(PACK_NS));
}

#[test]
fn test_can_resolve_never_loads() {
    let set = pack_set();
    let href = format!("{}#/0", fixture("b1.xmi"));
    assert!(!set.can_resolve(&href));
    assert!(set.resources().is_empty());

    set.get_resource(fixture("b1.xmi")).unwrap();
    assert!(set.can_resolve(&href));
}

#[test]
fn test_resolve_absolute_href() {
    let set = pack_set();
    let b = set.resolve(&format!("{}#/0/@b.1", fixture("b1.xmi"))).unwrap();
    assert_eq!(b.eclass().name(), "B");
    assert_eq!(b.uri_fragment().unwrap(), "/0/@b.1");
}
