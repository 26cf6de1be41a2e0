//! Document locations
//!
//! `Uri` is the immutable location value used to address documents. It derives
//! a protocol and a file extension from its text, normalizes filesystem forms
//! to absolute paths and leaves logical schemes untouched.

pub mod converter;
pub mod http;

pub use converter::{
    AbstractUriConverter, ConversionOrder, ConverterChain, PrefixUriConverter, UriConverter,
};
pub use http::HttpUri;

use crate::error::ModelError;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Logical schemes whose URIs need an external mapping to become locations.
///
/// `normalize()` returns these unchanged.
pub const OPAQUE_SCHEMES: &[&str] = &["virtual", "pathmap", "platform"];

/// Schemes recognized in the bare `scheme:` form (without `//`).
const BARE_SCHEMES: &[&str] = &["platform", "pathmap", "virtual", "urn"];

/// A document location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri {
    plain: String,
    protocol: Option<String>,
    extension: Option<String>,
}

impl Uri {
    /// Parse a location string. Surrounding whitespace is dropped.
    pub fn new(text: impl AsRef<str>) -> Self {
        let plain = text.as_ref().trim().to_string();
        let protocol = parse_protocol(&plain).map(str::to_string);
        let extension = parse_extension(&plain, protocol.as_deref()).map(str::to_string);
        Self {
            plain,
            protocol,
            extension,
        }
    }

    /// Build a URI from a loosely typed value (document attribute, config entry).
    ///
    /// Anything other than a string is rejected.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ModelError> {
        match value {
            serde_json::Value::String(text) => Ok(Self::new(text)),
            other => Err(ModelError::InvalidUri(format!(
                "expected a string, got {}",
                json_kind(other)
            ))),
        }
    }

    pub fn plain(&self) -> &str {
        &self.plain
    }

    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn is_http(&self) -> bool {
        matches!(self.protocol(), Some("http") | Some("https"))
    }

    pub fn is_file(&self) -> bool {
        matches!(self.protocol(), None | Some("file"))
    }

    /// True for schemes this crate cannot turn into a location on its own.
    pub fn is_opaque(&self) -> bool {
        !self.is_file() && !self.is_http()
    }

    /// View this URI as an HTTP location, when it is one.
    pub fn as_http(&self) -> Option<HttpUri> {
        self.is_http().then(|| HttpUri::from(self.clone()))
    }

    /// Canonical string form used as a cache key.
    ///
    /// Bare paths and `file://` URIs become absolute filesystem paths relative
    /// to the working directory. HTTP URIs are already canonical. Opaque and
    /// unknown schemes are returned as written.
    pub fn normalize(&self) -> String {
        match self.protocol() {
            None => absolute_path(&self.plain),
            Some("file") => absolute_path(strip_file_scheme(&self.plain)),
            Some(_) => self.plain.clone(),
        }
    }

    /// Express `other` as seen from this document.
    ///
    /// A protocol-less `other` is already relative to this document, and one
    /// carrying its own protocol is self-contained, so both come back as
    /// written.
    pub fn relative_from_me(&self, other: &Uri) -> String {
        other.plain.clone()
    }

    /// Shortest location of `other` that resolves back to it from this document.
    ///
    /// Filesystem targets seen from a filesystem document become relative
    /// paths with `/` separators; everything else stays absolute.
    pub fn relative_path_to(&self, other: &Uri) -> String {
        if !other.is_file() {
            return other.plain.clone();
        }
        let target = PathBuf::from(other.normalize());
        if !self.is_file() {
            return path_to_slash(&target);
        }
        let base = PathBuf::from(self.normalize());
        let base_dir = base.parent().unwrap_or(Path::new("/"));
        relative_path(base_dir, &target)
    }

    /// Turn an href's document part into a loadable location, using this
    /// document as the base for relative references.
    pub fn resolve_reference(&self, reference: &str) -> String {
        let candidate = Uri::new(reference);
        if candidate.protocol().is_some() || Path::new(candidate.plain()).is_absolute() {
            return candidate.plain;
        }
        if self.is_file() {
            let base = PathBuf::from(self.normalize());
            let base_dir = base.parent().unwrap_or(Path::new("/"));
            let joined = lexical_clean(&base_dir.join(candidate.plain()));
            return dunce::simplified(&joined).to_string_lossy().into_owned();
        }
        http::join_segments(&self.plain, candidate.plain())
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain)
    }
}

impl From<&str> for Uri {
    fn from(text: &str) -> Self {
        Uri::new(text)
    }
}

impl From<String> for Uri {
    fn from(text: String) -> Self {
        Uri::new(text)
    }
}

impl From<&String> for Uri {
    fn from(text: &String) -> Self {
        Uri::new(text)
    }
}

impl From<&Uri> for Uri {
    fn from(uri: &Uri) -> Self {
        uri.clone()
    }
}

fn parse_protocol(plain: &str) -> Option<&str> {
    if let Some((scheme, _)) = plain.split_once("://") {
        return (!scheme.is_empty()).then_some(scheme);
    }
    let (scheme, _) = plain.split_once(':')?;
    BARE_SCHEMES.contains(&scheme).then_some(scheme)
}

fn parse_extension<'a>(plain: &'a str, protocol: Option<&str>) -> Option<&'a str> {
    let without_fragment = plain.split('#').next().unwrap_or(plain);
    let path = match protocol {
        Some(_) => without_fragment
            .split_once("://")
            .or_else(|| without_fragment.split_once(':'))
            .map(|(_, rest)| rest)
            .unwrap_or(without_fragment),
        None => without_fragment,
    };
    let segment = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let (_, extension) = segment.rsplit_once('.')?;
    (!extension.is_empty()).then_some(extension)
}

fn strip_file_scheme(plain: &str) -> &str {
    plain.strip_prefix("file://").unwrap_or(plain)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Absolute, lexically cleaned form of `path` relative to the working directory.
pub(crate) fn absolute_path(path: &str) -> String {
    let candidate = Path::new(path);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(candidate),
            Err(e) => {
                tracing::warn!("Working directory unavailable, keeping {} relative: {}", path, e);
                candidate.to_path_buf()
            }
        }
    };
    let cleaned = lexical_clean(&joined);
    dunce::simplified(&cleaned).to_string_lossy().into_owned()
}

/// Fold `.` and `..` components without touching the filesystem.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => cleaned.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            Component::Normal(name) => cleaned.push(name),
        }
    }
    cleaned
}

fn relative_path(base_dir: &Path, target: &Path) -> String {
    let base: Vec<Component<'_>> = base_dir.components().collect();
    let target_components: Vec<Component<'_>> = target.components().collect();
    let common = base
        .iter()
        .zip(target_components.iter())
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return path_to_slash(target);
    }
    let mut parts: Vec<String> = Vec::new();
    for _ in common..base.len() {
        parts.push("..".to_string());
    }
    for component in &target_components[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    parts.join("/")
}

fn path_to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
