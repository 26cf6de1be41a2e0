//! Configuration
//!
//! `ModelsetConfig` gathers logging settings and the defaults applied to new
//! resource sets. It is assembled by [`ConfigLoader`] from built-in defaults,
//! an optional `modelset.toml` in the workspace, and `MODELSET__*`
//! environment variables.

pub mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use crate::uri::converter::ConversionOrder;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelsetConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub resource_set: ResourceSetConfig,
}

/// Settings applied to every resource set built from this configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSetConfig {
    /// Whether opaque-scheme URIs are offered to URI converters.
    #[serde(default)]
    pub conversion_order: ConversionOrder,

    /// Timeout for fetching `http(s)` documents; unset waits indefinitely.
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
}
