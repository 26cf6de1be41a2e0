//! Integration tests for resource sets, proxies and URI handling

mod common;
mod containment;
mod converters;
mod ecore_documents;
mod proxies;
mod registry;
mod resource_sets;
mod save_load;
