//! Error types for the model resource runtime.

use thiserror::Error;

/// Errors raised while building, loading, addressing or resolving models.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A URI could not be constructed from the given input.
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// An abstract capability was invoked without a concrete implementation.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// An href could not be matched to a loaded or loadable document/object.
    #[error("Resolution failed: {0}")]
    ResolutionNotFound(String),

    /// The resolving scope has no metamodel for a referenced namespace.
    #[error("Unknown metamodel: {0}")]
    UnknownMetamodel(String),

    /// A fragment does not address an existing root or containment chain.
    #[error("Addressing error: {0}")]
    Addressing(String),

    /// A fragment path is malformed.
    #[error("Malformed fragment '{fragment}': {reason}")]
    FragmentParse { fragment: String, reason: String },

    /// A structural change would break the containment invariants.
    #[error("Containment violation: {0}")]
    Consistency(String),

    /// An unknown feature or a value of the wrong kind was used on an object.
    #[error("Feature error: {0}")]
    Feature(String),

    /// The document codec rejected the bytes or the model.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Document bytes could not be fetched or stored.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ModelError {
    pub(crate) fn fragment(fragment: &str, reason: impl Into<String>) -> Self {
        ModelError::FragmentParse {
            fragment: fragment.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<config::ConfigError> for ModelError {
    fn from(err: config::ConfigError) -> Self {
        ModelError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Codec(err.to_string())
    }
}
