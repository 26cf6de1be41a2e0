use modelset::{DataType, EClass, EObject, EPackage, GlobalRegistry, Metamodel, ResourceSet, StructuralFeature};
use std::sync::Arc;

pub const PACK_NS: &str = "http://pack/1.0";

/// Root holds `a: A[*]` and `b: B[*]`; `A.tob` crosses into B instances.
pub fn simplemm() -> EPackage {
    EPackage::new("pack", PACK_NS, "pack")
        .with_class(
            EClass::new("Root")
                .with_feature(StructuralFeature::containments("a", "A"))
                .with_feature(StructuralFeature::containments("b", "B")),
        )
        .with_class(
            EClass::new("A")
                .with_feature(StructuralFeature::attribute("name", DataType::String))
                .with_feature(StructuralFeature::references("tob", "B")),
        )
        .with_class(
            EClass::new("B")
                .with_feature(StructuralFeature::attribute("name", DataType::String))
                .with_feature(StructuralFeature::reference("toa", "A")),
        )
}

/// A set over a private registry, with the pack metamodel registered.
pub fn pack_set() -> ResourceSet {
    let set = ResourceSet::with_registry(Arc::new(GlobalRegistry::new()));
    set.register_package(simplemm());
    set
}

pub fn instance(class: &str) -> EObject {
    let package = simplemm();
    EObject::new(package.classifier(class).expect("class exists in pack"))
}

pub fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

pub fn fixtures_dir() -> String {
    format!("{}/tests/fixtures/", env!("CARGO_MANIFEST_DIR"))
}
