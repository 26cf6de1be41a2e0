//! Fragment paths
//!
//! A fragment addresses an object inside a document. Numeric fragments start
//! with the root index and follow containment features:
//! `/1/@classes.0/@features` where `.N` selects an element of a multi-valued
//! feature. Name-based fragments (`//Package/Class`) start at the first root
//! and descend through children by their `name` attribute.

use crate::error::ModelError;
use crate::object::EObject;

/// Fragment of `object` within the resource owning its root.
pub fn fragment_of(object: &EObject) -> Result<String, ModelError> {
    let mut segments = Vec::new();
    let mut current = object.clone();
    while let Some(parent) = current.e_container() {
        let feature_name = current.containing_feature().unwrap_or_default();
        let feature = parent.feature(&feature_name)?;
        let segment = if feature.is_many() {
            let index = parent.position_in(&feature_name, &current).ok_or_else(|| {
                ModelError::Consistency(format!(
                    "{:?} is not listed in its container's {}",
                    current, feature_name
                ))
            })?;
            format!("@{}.{}", feature_name, index)
        } else {
            format!("@{}", feature_name)
        };
        segments.push(segment);
        current = parent;
    }

    let resource = current.direct_resource().ok_or_else(|| {
        ModelError::Addressing(format!("{:?} is not contained in a resource", object))
    })?;
    let index = resource.index_of(&current).ok_or_else(|| {
        ModelError::Consistency(format!("{:?} is missing from its resource contents", current))
    })?;

    let mut fragment = format!("/{}", index);
    for segment in segments.iter().rev() {
        fragment.push('/');
        fragment.push_str(segment);
    }
    Ok(fragment)
}

/// Split `/<root>/rest` into the root index and the remaining path.
///
/// The remainder is empty or starts with `/`.
pub fn extract_rootnum_and_frag(path: &str) -> Result<(usize, String), ModelError> {
    let body = path
        .strip_prefix('/')
        .ok_or_else(|| ModelError::fragment(path, "must start with '/'"))?;
    let (root, rest) = match body.find('/') {
        Some(split) => body.split_at(split),
        None => (body, ""),
    };
    if root.is_empty() || !root.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ModelError::fragment(
            path,
            format!("root segment '{}' is not a number", root),
        ));
    }
    let index = root
        .parse::<usize>()
        .map_err(|e| ModelError::fragment(path, e.to_string()))?;
    Ok((index, rest.to_string()))
}

/// Follow `@feature[.index]` segments from `root`.
pub fn walk(root: &EObject, path: &str) -> Result<EObject, ModelError> {
    let mut current = root.clone();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let (name, index) = parse_segment(segment);
        let feature = current.feature(name).map_err(|_| {
            ModelError::Addressing(format!(
                "{} has no feature '{}' (fragment {})",
                current.eclass().name(),
                name,
                path
            ))
        })?;
        if !feature.is_reference() {
            return Err(ModelError::Addressing(format!(
                "'{}' in fragment {} is an attribute",
                name, path
            )));
        }
        let links = current.references(name)?;
        let position = index.unwrap_or(0);
        let link = links.get(position).ok_or_else(|| {
            ModelError::Addressing(format!(
                "{}.{} has no element {} (fragment {})",
                current.eclass().name(),
                name,
                position,
                path
            ))
        })?;
        current = link.resolve()?;
    }
    Ok(current)
}

/// Descend from `root` through contained children matched by name.
pub fn walk_named(root: &EObject, path: &str) -> Result<EObject, ModelError> {
    let mut current = root.clone();
    for name in path.split('/').filter(|s| !s.is_empty()) {
        current = current
            .contents()
            .into_iter()
            .find(|child| child.name().as_deref() == Some(name))
            .ok_or_else(|| {
                ModelError::Addressing(format!(
                    "no child named '{}' under {:?} (fragment //{})",
                    name, current, path
                ))
            })?;
    }
    Ok(current)
}

fn parse_segment(segment: &str) -> (&str, Option<usize>) {
    let segment = segment.strip_prefix('@').unwrap_or(segment);
    match segment.rsplit_once('.') {
        Some((name, index)) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => {
            (name, index.parse().ok())
        }
        _ => (segment, None),
    }
}
