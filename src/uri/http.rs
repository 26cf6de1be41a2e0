//! HTTP locations and reference relativization.

use super::Uri;
use std::ops::Deref;

/// A `http(s)://` location that can resolve relative references against itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HttpUri(Uri);

impl HttpUri {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(Uri::new(text))
    }

    /// HTTP locations are already canonical.
    pub fn normalize(&self) -> String {
        self.0.plain().to_string()
    }

    /// Resolve `reference` against this location.
    ///
    /// The last path segment of this URI is the leaf and is dropped; each
    /// leading `../` of the reference pops one more directory (never past the
    /// host). A reference with its own protocol is returned unchanged.
    pub fn apply_relative_from_me(&self, reference: &str) -> String {
        if Uri::new(reference).protocol().is_some() {
            return reference.to_string();
        }
        join_segments(self.0.plain(), reference)
    }

    pub fn into_uri(self) -> Uri {
        self.0
    }
}

impl Deref for HttpUri {
    type Target = Uri;

    fn deref(&self) -> &Uri {
        &self.0
    }
}

impl From<Uri> for HttpUri {
    fn from(uri: Uri) -> Self {
        Self(uri)
    }
}

/// Split `scheme://authority/path` into (`scheme://authority`, `/path`).
///
/// Bare `scheme:path` forms split right after the colon.
fn split_authority(base: &str) -> (&str, &str) {
    if let Some(scheme_end) = base.find("://") {
        let after = scheme_end + 3;
        return match base[after..].find('/') {
            Some(slash) => base.split_at(after + slash),
            None => (base, ""),
        };
    }
    match base.find(':') {
        Some(colon) => base.split_at(colon + 1),
        None => ("", base),
    }
}

/// Join a relative reference onto a `scheme://authority/path` base.
pub(crate) fn join_segments(base: &str, reference: &str) -> String {
    let (prefix, path) = split_authority(base);
    let mut segments: Vec<&str> = path.split('/').collect();
    segments.pop();
    let mut segments: Vec<&str> = segments.into_iter().filter(|s| !s.is_empty()).collect();

    let mut rest = reference;
    if let Some(stripped) = rest.strip_prefix('/') {
        segments.clear();
        rest = stripped;
    }
    loop {
        if let Some(stripped) = rest.strip_prefix("../") {
            segments.pop();
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else {
            break;
        }
    }
    if rest == ".." {
        segments.pop();
        rest = "";
    }

    let mut joined = String::from(prefix);
    for segment in segments {
        joined.push('/');
        joined.push_str(segment);
    }
    joined.push('/');
    joined.push_str(rest);
    joined
}
