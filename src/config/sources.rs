//! Configuration sources layered by the merge service.

pub mod environment;
pub mod workspace_file;
