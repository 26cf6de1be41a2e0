use super::common::{instance, pack_set};
use modelset::{Link, ModelError, Resource, Uri};
use tempfile::TempDir;

#[test]
fn test_save_and_reload_cross_document_model() {
    let dir = TempDir::new().unwrap();
    let a_path = dir.path().join("a.xmi");
    let b_path = dir.path().join("sub").join("b.xmi");

    let set = pack_set();
    let a_resource = set.create_resource(a_path.to_string_lossy().into_owned()).unwrap();
    let b_resource = set.create_resource(b_path.to_string_lossy().into_owned()).unwrap();

    let a_root = instance("Root");
    let a = instance("A");
    a.set_attribute("name", "first").unwrap();
    a_root.push_reference("a", &a).unwrap();
    a_resource.append(&a_root);

    let b_root = instance("Root");
    let b = instance("B");
    b.set_attribute("name", "target").unwrap();
    b_root.push_reference("b", &b).unwrap();
    b.set_reference("toa", Some(Link::from(&a))).unwrap();
    b_resource.append(&b_root);

    a.push_reference("tob", &b).unwrap();
    a_resource.save().unwrap();
    b_resource.save().unwrap();

    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&a_path).unwrap()).unwrap();
    assert_eq!(
        written["contents"][0]["features"]["a"][0]["features"]["tob"][0]["href"],
        "sub/b.xmi#/0/@b.0"
    );

    let fresh = pack_set();
    let reloaded = fresh.get_resource(a_path.to_string_lossy().into_owned()).unwrap();
    let a = reloaded.resolve_fragment("/0/@a.0").unwrap();
    assert_eq!(a.name().as_deref(), Some("first"));

    let tob = a.reference("tob").unwrap().unwrap();
    assert!(tob.is_proxy());
    let b = tob.resolve().unwrap();
    assert_eq!(b.name().as_deref(), Some("target"));
    assert_eq!(
        b.e_resource().unwrap().uri().normalize(),
        Uri::new(b_path.to_string_lossy()).normalize()
    );

    // and back again
    let back = b.reference("toa").unwrap().unwrap().resolve().unwrap();
    assert!(back.ptr_eq(&a));
}

#[test]
fn test_save_to_keeps_local_hrefs() {
    let dir = TempDir::new().unwrap();
    let resource = Resource::new(dir.path().join("m.xmi").to_string_lossy().into_owned());
    let root = instance("Root");
    let a = instance("A");
    let b = instance("B");
    root.push_reference("a", &a).unwrap();
    root.push_reference("b", &b).unwrap();
    a.push_reference("tob", &b).unwrap();
    resource.append(&root);

    let copy = Uri::new(dir.path().join("copy.xmi").to_string_lossy());
    resource.save_to(&copy).unwrap();

    let set = pack_set();
    let loaded = set.get_resource(copy).unwrap();
    let a = loaded.resolve_fragment("/0/@a.0").unwrap();
    let tob = a.reference("tob").unwrap().unwrap();
    assert!(!tob.is_proxy());
    assert!(tob.resolve().unwrap().ptr_eq(&loaded.resolve_fragment("/0/@b.0").unwrap()));
}

#[test]
fn test_unresolved_proxies_are_written_back() {
    let dir = TempDir::new().unwrap();
    let set = pack_set();
    let resource = set.create_resource(dir.path().join("p.xmi").to_string_lossy().into_owned()).unwrap();
    let root = instance("Root");
    let a = instance("A");
    root.push_reference("a", &a).unwrap();
    a.push_reference("tob", modelset::EProxy::with_origin("elsewhere.xmi#/0/@b.3", &resource))
        .unwrap();
    resource.append(&root);

    let bytes = resource.to_bytes().unwrap();
    let written: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        written["contents"][0]["features"]["a"][0]["features"]["tob"][0]["href"],
        "elsewhere.xmi#/0/@b.3"
    );
}

#[test]
fn test_saving_over_http_is_refused() {
    let resource = Resource::new("http://example.org/model.xmi");
    assert!(matches!(resource.save(), Err(ModelError::Transport(_))));
}

#[test]
fn test_failed_load_leaves_resource_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.xmi");
    std::fs::write(
        &path,
        r##"{ "namespaces": { "pack": "http://pack/1.0" },
             "contents": [ { "type": "pack:Root", "features": { "a": [
                 { "type": "pack:A", "features": { "tob": [ { "href": "#/4" } ] } } ] } } ] }"##,
    )
    .unwrap();

    let set = pack_set();
    let resource = set.create_resource(path.to_string_lossy().into_owned()).unwrap();
    for _ in 0..2 {
        assert!(matches!(resource.load(), Err(ModelError::Addressing(_))));
        assert!(resource.is_empty());
        assert!(!resource.is_loaded());
    }
}
