//! CLI command implementations

pub mod completions;
pub mod event;
pub mod import;
pub mod init;
pub mod schema;
pub mod validate;
pub mod wizard;
