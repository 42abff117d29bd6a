//! Stagecraft: multi-step event creation wizards
//!
//! A wizard controller that sequences form steps, gates forward moves on
//! field validation and hands the finished form to a persistence
//! collaborator, plus a CLI that stores published events as YAML files.

pub mod cli;
pub mod core;
pub mod entities;
pub mod schema;
pub mod yaml;
