//! CLI Tooling
//!
//! Command-line interface over a single resource set. Documents are loaded
//! through the set, so cross-document proxies resolve the same way they do
//! for library callers.

use crate::config::{ConfigLoader, ModelsetConfig};
use crate::error::ModelError;
use crate::logging::LoggingConfig;
use crate::object::{EObject, Link};
use crate::registry::GlobalRegistry;
use crate::resource_set::ResourceSet;
use crate::uri::converter::PrefixUriConverter;
use crate::uri::Uri;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Modelset CLI - inspect multi-document models
#[derive(Parser)]
#[command(name = "modelset")]
#[command(about = "Load model documents and resolve references between them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (relative document paths start here)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Metamodel (.ecore) to register before loading; repeatable
    #[arg(long = "metamodel", global = true)]
    pub metamodels: Vec<PathBuf>,

    /// URI prefix mapping `FROM=TO` applied before loading; repeatable
    #[arg(long = "map", global = true)]
    pub mappings: Vec<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a document and list every object with its fragment
    Inspect {
        /// Document location (path, file:// or http(s):// URI)
        uri: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Load a document and resolve an href seen from it
    Resolve {
        /// Document the href is relative to
        uri: String,
        /// Href, e.g. `#/0/@items.1` or `other.xmi#/0`
        href: String,
    },
}

impl Cli {
    /// Logging settings from config with CLI flags applied on top.
    pub fn logging_config(&self, config: &ModelsetConfig) -> LoggingConfig {
        let mut logging = config.logging.clone();
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
        logging
    }
}

/// CLI execution context
pub struct CliContext {
    resource_set: ResourceSet,
    workspace_root: PathBuf,
    config: ModelsetConfig,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ModelError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        let resource_set =
            ResourceSet::with_config(GlobalRegistry::shared(), config.resource_set.clone());
        Ok(Self {
            resource_set,
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &ModelsetConfig {
        &self.config
    }

    pub fn resource_set(&self) -> &ResourceSet {
        &self.resource_set
    }

    /// Register a `FROM=TO` prefix mapping.
    pub fn add_mapping(&self, mapping: &str) -> Result<(), ModelError> {
        let (from, to) = mapping.split_once('=').ok_or_else(|| {
            ModelError::ConfigError(format!("mapping '{}' is not FROM=TO", mapping))
        })?;
        self.resource_set
            .add_uri_converter(Arc::new(PrefixUriConverter::new(from, to)));
        Ok(())
    }

    /// Load an Ecore document and register its packages in the set.
    pub fn register_metamodel(&self, path: &Path) -> Result<Vec<String>, ModelError> {
        let resource = self.resource_set.get_resource(self.locate(&path.to_string_lossy()))?;
        let registered = self.resource_set.register_packages_from(&resource)?;
        info!(path = %path.display(), packages = ?registered, "Metamodel registered");
        Ok(registered)
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ModelError> {
        match command {
            Commands::Inspect { uri, format } => self.inspect(uri, format),
            Commands::Resolve { uri, href } => self.resolve(uri, href),
        }
    }

    fn inspect(&self, uri: &str, format: &str) -> Result<String, ModelError> {
        let resource = self.resource_set.get_resource(self.locate(uri))?;
        let mut objects = Vec::new();
        for root in resource.contents() {
            objects.push(root.clone());
            objects.extend(root.all_contents());
        }
        match format {
            "json" => {
                let listed = objects
                    .iter()
                    .map(|o| {
                        Ok(json!({
                            "fragment": o.uri_fragment()?,
                            "type": qualified_type(o),
                            "name": o.name(),
                        }))
                    })
                    .collect::<Result<Vec<_>, ModelError>>()?;
                Ok(serde_json::to_string_pretty(&json!({
                    "uri": resource.uri().plain(),
                    "objects": listed,
                }))?)
            }
            "text" => {
                let mut lines = vec![format!(
                    "{} ({} roots, {} objects)",
                    resource.uri(),
                    resource.len(),
                    objects.len()
                )];
                for object in &objects {
                    let name = object.name().map(|n| format!(" {}", n)).unwrap_or_default();
                    lines.push(format!(
                        "  {:<24} {}{}",
                        object.uri_fragment()?,
                        qualified_type(object),
                        name
                    ));
                }
                Ok(lines.join("\n"))
            }
            other => Err(ModelError::ConfigError(format!(
                "Invalid output format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }

    fn resolve(&self, uri: &str, href: &str) -> Result<String, ModelError> {
        let resource = self.resource_set.get_resource(self.locate(uri))?;
        let object = resource.resolve(href)?;
        describe(&object)
    }

    /// Relative filesystem locations are taken from the workspace root.
    fn locate(&self, uri: &str) -> Uri {
        let candidate = Uri::new(uri);
        if candidate.protocol().is_none() && Path::new(candidate.plain()).is_relative() {
            return Uri::new(self.workspace_root.join(candidate.plain()).to_string_lossy());
        }
        candidate
    }
}

fn qualified_type(object: &EObject) -> String {
    let eclass = object.eclass();
    match eclass.ns_prefix() {
        Some(prefix) => format!("{}:{}", prefix, eclass.name()),
        None => eclass.name().to_string(),
    }
}

fn describe(object: &EObject) -> Result<String, ModelError> {
    let owner = object
        .e_resource()
        .map(|r| r.uri().plain().to_string())
        .unwrap_or_else(|| "<detached>".to_string());
    let mut lines = vec![
        format!("{}#{}", owner, object.uri_fragment()?),
        format!("  type: {}", qualified_type(object)),
    ];
    for feature in object.eclass().features() {
        let name = feature.name();
        if feature.is_reference() {
            let links = object.references(name)?;
            if links.is_empty() {
                continue;
            }
            let shown: Vec<String> = links.iter().map(describe_link).collect();
            lines.push(format!("  {}: [{}]", name, shown.join(", ")));
        } else {
            let values = object.attribute_values(name)?;
            if values.is_empty() {
                continue;
            }
            let shown: Vec<String> = values.iter().map(ToString::to_string).collect();
            lines.push(format!("  {}: {}", name, shown.join(", ")));
        }
    }
    Ok(lines.join("\n"))
}

fn describe_link(link: &Link) -> String {
    match link {
        Link::Proxy(proxy) if !proxy.is_resolved() => format!("proxy {}", proxy.href()),
        _ => match link.resolve() {
            Ok(target) => target
                .uri_fragment()
                .map(|f| format!("{} {}", qualified_type(&target), f))
                .unwrap_or_else(|_| qualified_type(&target)),
            Err(e) => format!("<{}>", e),
        },
    }
}
