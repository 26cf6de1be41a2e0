use super::common::{instance, pack_set};
use modelset::{ModelError, Resource};

#[test]
fn test_root_moves_between_resources() {
    let set = pack_set();
    let first = set.create_resource("first.xmi").unwrap();
    let second = set.create_resource("second.xmi").unwrap();
    let root = instance("Root");

    first.append(&root);
    assert!(root.e_resource().unwrap().ptr_eq(&first));

    second.append(&root);
    assert!(first.is_empty());
    assert_eq!(second.len(), 1);
    assert!(root.e_resource().unwrap().ptr_eq(&second));
}

#[test]
fn test_child_changes_container() {
    let resource = Resource::new("model.xmi");
    let left = instance("Root");
    let right = instance("Root");
    let a = instance("A");
    resource.extend([&left, &right]);

    left.push_reference("a", &a).unwrap();
    assert_eq!(a.uri_fragment().unwrap(), "/0/@a.0");

    right.push_reference("a", &a).unwrap();
    assert!(left.references("a").unwrap().is_empty());
    assert!(a.e_container().unwrap().ptr_eq(&right));
    assert_eq!(a.containing_feature().as_deref(), Some("a"));
    assert_eq!(a.uri_fragment().unwrap(), "/1/@a.0");
}

#[test]
fn test_root_becomes_child() {
    let resource = Resource::new("model.xmi");
    let root = instance("Root");
    let b = instance("B");
    resource.extend([&root, &b]);
    assert_eq!(b.uri_fragment().unwrap(), "/1");

    root.push_reference("b", &b).unwrap();
    assert_eq!(resource.len(), 1);
    assert!(b.e_resource().unwrap().ptr_eq(&resource));
    assert_eq!(b.uri_fragment().unwrap(), "/0/@b.0");
}

#[test]
fn test_multiroot_fragments() {
    let resource = Resource::new("multi.xmi");
    let root = instance("Root");
    let other = instance("Root");
    let a = instance("A");
    let b = instance("B");
    other.push_reference("a", &a).unwrap();
    other.push_reference("b", &b).unwrap();
    resource.extend([&root, &other]);

    assert_eq!(root.uri_fragment().unwrap(), "/0");
    assert_eq!(other.uri_fragment().unwrap(), "/1");
    assert!(resource.resolve_fragment("/1/@a.0").unwrap().ptr_eq(&a));
    assert!(resource.resolve_fragment("/1/@b.0").unwrap().ptr_eq(&b));
    assert!(resource.resolve_fragment("").unwrap().ptr_eq(&root));
    assert!(resource.resolve("#/1").unwrap().ptr_eq(&other));
}

#[test]
fn test_remove_from_resource() {
    let resource = Resource::new("model.xmi");
    let root = instance("Root");
    let a = instance("A");
    root.push_reference("a", &a).unwrap();
    resource.append(&root);

    assert!(matches!(resource.remove(&a), Err(ModelError::Addressing(_))));
    resource.remove(&root).unwrap();
    assert!(resource.is_empty());
    assert!(root.e_resource().is_none());
    assert!(a.e_resource().is_none());
    assert!(matches!(a.uri_fragment(), Err(ModelError::Addressing(_))));
}

#[test]
fn test_extract_rootnum_and_frag() {
    assert_eq!(
        Resource::extract_rootnum_and_frag("/234/a/b/c/d").unwrap(),
        (234, "/a/b/c/d".to_string())
    );
    assert_eq!(
        Resource::extract_rootnum_and_frag("/0").unwrap(),
        (0, String::new())
    );
    assert!(matches!(
        Resource::extract_rootnum_and_frag("/x/a"),
        Err(ModelError::FragmentParse { .. })
    ));
}
