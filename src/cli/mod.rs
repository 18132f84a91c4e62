//! CLI interface and argument parsing
//!
//! This module handles command-line parsing, shell completion and printing
//! the resolved task graph.

pub mod app;

// Re-export main types
pub use app::*;
