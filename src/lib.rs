//! Taskfile - resolves YAML task declarations into one merged task graph
//!
//! A root Taskfile.yml (or package.json) is loaded, its includes are followed
//! recursively with cycle detection, and every included file's tasks are
//! merged into the root under their namespace.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod reader;
pub mod templater;
pub mod utils;

// Re-export commonly used types
pub use config::{Task, Taskfile};
pub use error::{Result, TaskfileError};
pub use reader::{read, resolve, ReaderNode};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
