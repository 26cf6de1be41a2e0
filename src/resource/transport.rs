//! Document transport: where bytes come from and go to.
//!
//! Filesystem paths (bare or `file://`) use `std::fs`; `http(s)` documents are
//! fetched with a blocking `reqwest` client. Opaque schemes need a converter
//! before they can be read.

use crate::error::ModelError;
use crate::uri::Uri;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Knobs for fetching documents.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Applied to HTTP requests; `None` waits indefinitely.
    pub http_timeout: Option<Duration>,
}

impl TransportOptions {
    pub fn with_http_timeout_secs(secs: Option<u64>) -> Self {
        Self {
            http_timeout: secs.map(Duration::from_secs),
        }
    }
}

/// Read the bytes of the document at `uri`.
pub fn read_document(uri: &Uri, options: &TransportOptions) -> Result<Vec<u8>, ModelError> {
    if uri.is_http() {
        return fetch_http(uri, options);
    }
    if uri.is_file() {
        let path = uri.normalize();
        debug!(path = %path, "Reading document from file");
        return Ok(fs::read(path)?);
    }
    Err(ModelError::Transport(format!(
        "no transport for '{}'; register a URI converter for this scheme",
        uri
    )))
}

/// Write `bytes` to the document location `uri`, creating parent directories.
pub fn write_document(uri: &Uri, bytes: &[u8]) -> Result<(), ModelError> {
    if uri.is_http() {
        return Err(ModelError::Transport(format!(
            "saving over HTTP is not supported ({})",
            uri
        )));
    }
    if !uri.is_file() {
        return Err(ModelError::Transport(format!(
            "cannot write to '{}': not a filesystem location",
            uri
        )));
    }
    let path = uri.normalize();
    if let Some(parent) = Path::new(&path).parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, bytes)?;
    info!(path = %path, bytes = bytes.len(), "Document written");
    Ok(())
}

/// The blocking client carries its own 30s default; an unset timeout has to
/// clear it explicitly.
fn http_client(options: &TransportOptions) -> Result<reqwest::blocking::Client, ModelError> {
    reqwest::blocking::Client::builder()
        .timeout(options.http_timeout)
        .build()
        .map_err(|e| ModelError::Transport(format!("HTTP client setup failed: {}", e)))
}

fn fetch_http(uri: &Uri, options: &TransportOptions) -> Result<Vec<u8>, ModelError> {
    let client = http_client(options)?;
    debug!(url = %uri, timeout = ?options.http_timeout, "Fetching document");
    let response = client
        .get(uri.plain())
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelError::Transport(format!("GET {} failed: {}", uri, e)))?;
    let bytes = response
        .bytes()
        .map_err(|e| ModelError::Transport(format!("reading body of {} failed: {}", uri, e)))?;
    Ok(bytes.to_vec())
}
