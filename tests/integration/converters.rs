use super::common::{fixture, fixtures_dir, pack_set};
use modelset::config::ResourceSetConfig;
use modelset::uri::converter::{
    AbstractUriConverter, ConversionOrder, PrefixUriConverter, UriConverter,
};
use modelset::{GlobalRegistry, ModelError, ResourceSet, Uri};
use std::sync::Arc;

/// Maps `myuri://<path>` onto the crate directory.
#[derive(Debug)]
struct MyUriConverter;

impl UriConverter for MyUriConverter {
    fn can_handle(&self, uri: &Uri) -> Result<bool, ModelError> {
        Ok(uri.protocol() == Some("myuri"))
    }

    fn convert(&self, uri: &Uri) -> Result<Uri, ModelError> {
        let rest = uri.plain().trim_start_matches("myuri://");
        Ok(Uri::new(format!("{}/{}", env!("CARGO_MANIFEST_DIR"), rest)))
    }
}

#[test]
fn test_abstract_converter_is_not_implemented() {
    let uri = Uri::new("http://test.ecore");
    assert!(matches!(
        AbstractUriConverter.can_handle(&uri),
        Err(ModelError::NotImplemented(_))
    ));
    assert!(matches!(
        AbstractUriConverter.convert(&uri),
        Err(ModelError::NotImplemented(_))
    ));
}

#[test]
fn test_custom_scheme_in_metamodel_reference() {
    let set = ResourceSet::with_registry(Arc::new(GlobalRegistry::new()));
    set.add_uri_converter(Arc::new(MyUriConverter));
    let resource = set.get_resource(fixture("C.ecore")).unwrap();

    let package = resource.contents()[0].clone();
    let classifier = package.reference("eClassifiers").unwrap().unwrap();
    let feature = classifier.reference("eStructuralFeatures").unwrap().unwrap();
    let etype = feature.reference("eType").unwrap().unwrap();
    assert!(etype.is_proxy());

    let target = etype.resolve().unwrap();
    assert_eq!(target.name().as_deref(), Some("SuperStuff"));
    let loaded = target.e_resource().unwrap();
    assert_eq!(loaded.uri().normalize(), Uri::new(fixture("C2.ecore")).normalize());
    assert_eq!(loaded.kind(), "ecore");
    assert!(set.can_resolve("myuri://tests/fixtures/C2.ecore#//SuperStuff"));
}

#[test]
fn test_prefix_converter_shares_cache_key() {
    let set = pack_set();
    set.add_uri_converter(Arc::new(PrefixUriConverter::new("lib://", fixtures_dir())));
    let through_alias = set.get_resource("lib://b1.xmi").unwrap();
    let direct = set.get_resource(fixture("b1.xmi")).unwrap();
    assert!(through_alias.ptr_eq(&direct));
    assert_eq!(set.resources().len(), 1);
}

#[test]
fn test_global_converters_apply_after_local_ones() {
    let registry = Arc::new(GlobalRegistry::new());
    registry.add_uri_converter(Arc::new(PrefixUriConverter::new("lib://", "/global/")));
    let set = ResourceSet::with_registry(Arc::clone(&registry));

    assert_eq!(set.convert_uri(&Uri::new("lib://m.xmi")).unwrap().plain(), "/global/m.xmi");

    set.add_uri_converter(Arc::new(PrefixUriConverter::new("lib://", "/local/")));
    assert_eq!(set.convert_uri(&Uri::new("lib://m.xmi")).unwrap().plain(), "/local/m.xmi");
    assert_eq!(set.convert_uri(&Uri::new("other://m.xmi")).unwrap().plain(), "other://m.xmi");
}

#[test]
fn test_opaque_first_bypasses_converters() {
    let config = ResourceSetConfig {
        conversion_order: ConversionOrder::OpaqueFirst,
        ..ResourceSetConfig::default()
    };
    let set = ResourceSet::with_config(Arc::new(GlobalRegistry::new()), config);
    set.add_uri_converter(Arc::new(PrefixUriConverter::new("pathmap://", "/maps/")));
    assert_eq!(
        set.convert_uri(&Uri::new("pathmap://LIB/m.xmi")).unwrap().plain(),
        "pathmap://LIB/m.xmi"
    );

    let converting = ResourceSet::with_registry(Arc::new(GlobalRegistry::new()));
    converting.add_uri_converter(Arc::new(PrefixUriConverter::new("pathmap://", "/maps/")));
    assert_eq!(
        converting.convert_uri(&Uri::new("pathmap://LIB/m.xmi")).unwrap().plain(),
        "/maps/LIB/m.xmi"
    );
}

#[test]
fn test_failing_converter_surfaces_error() {
    let set = pack_set();
    set.add_uri_converter(Arc::new(AbstractUriConverter));
    assert!(matches!(
        set.get_resource(fixture("b1.xmi")),
        Err(ModelError::NotImplemented(_))
    ));
    assert!(!set.can_resolve(&fixture("b1.xmi")));
}
