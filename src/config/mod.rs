//! Declaration model and parsing
//!
//! This module handles locating and parsing Taskfile.yml and package.json
//! files, and merging one parsed declaration into another.

pub mod manifest;
pub mod merge;
pub mod ordered;
pub mod parse;
pub mod types;

// Re-export main types
pub use manifest::*;
pub use merge::*;
pub use ordered::*;
pub use parse::*;
pub use types::*;
