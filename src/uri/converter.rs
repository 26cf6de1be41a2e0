//! URI converter chain
//!
//! Converters rewrite raw URIs (custom scheme aliases, path maps) before they
//! reach a resource set cache. A chain is checked in order and the first
//! converter that can handle a URI wins.

use super::Uri;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Rewrites URIs before they are normalized into cache keys.
///
/// Both methods default to `NotImplemented`, so a converter must provide them.
pub trait UriConverter: Send + Sync + fmt::Debug {
    fn can_handle(&self, uri: &Uri) -> Result<bool, ModelError> {
        Err(ModelError::NotImplemented(format!(
            "can_handle is not implemented for {:?} ({})",
            self,
            uri.plain()
        )))
    }

    fn convert(&self, uri: &Uri) -> Result<Uri, ModelError> {
        Err(ModelError::NotImplemented(format!(
            "convert is not implemented for {:?} ({})",
            self,
            uri.plain()
        )))
    }
}

/// The base converter with no behavior of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbstractUriConverter;

impl UriConverter for AbstractUriConverter {}

/// Replaces a leading prefix, e.g. `pathmap://LIB/` with a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixUriConverter {
    from: String,
    to: String,
}

impl PrefixUriConverter {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl UriConverter for PrefixUriConverter {
    fn can_handle(&self, uri: &Uri) -> Result<bool, ModelError> {
        Ok(uri.plain().starts_with(&self.from))
    }

    fn convert(&self, uri: &Uri) -> Result<Uri, ModelError> {
        let rest = uri.plain().strip_prefix(&self.from).ok_or_else(|| {
            ModelError::InvalidUri(format!("{} does not start with {}", uri.plain(), self.from))
        })?;
        Ok(Uri::new(format!("{}{}", self.to, rest)))
    }
}

/// Whether opaque-scheme URIs go through the converter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionOrder {
    /// Every URI is offered to the converters, then normalized.
    #[default]
    ConvertersFirst,
    /// URIs with an opaque scheme skip the converters and stay as written.
    OpaqueFirst,
}

/// Ordered list of converters, first match wins.
#[derive(Debug, Clone, Default)]
pub struct ConverterChain {
    converters: Vec<Arc<dyn UriConverter>>,
}

impl ConverterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, converter: Arc<dyn UriConverter>) {
        self.converters.push(converter);
    }

    pub fn insert(&mut self, index: usize, converter: Arc<dyn UriConverter>) {
        let index = index.min(self.converters.len());
        self.converters.insert(index, converter);
    }

    pub fn clear(&mut self) {
        self.converters.clear();
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Apply the first converter that handles `uri`.
    ///
    /// Returns `None` when no converter matched.
    pub fn convert(&self, uri: &Uri) -> Result<Option<Uri>, ModelError> {
        for converter in &self.converters {
            if converter.can_handle(uri)? {
                let converted = converter.convert(uri)?;
                tracing::debug!(
                    from = uri.plain(),
                    to = converted.plain(),
                    "URI converted"
                );
                return Ok(Some(converted));
            }
        }
        Ok(None)
    }
}
