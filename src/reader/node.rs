//! Resolution steps and include cycle detection

use crate::error::{Result, TaskfileError};
use std::path::{Path, PathBuf};

/// A resolved `(directory, entrypoint)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub dir: PathBuf,
    pub entrypoint: String,
}

impl Location {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.entrypoint)
    }
}

/// One step of include resolution
///
/// `ancestors` holds the locations currently being resolved above this node,
/// root first. It is only consulted for cycle detection.
#[derive(Debug, Clone, Default)]
pub struct ReaderNode {
    /// Directory of the declaration; the working directory when empty
    pub dir: PathBuf,

    /// File name inside `dir`; discovered from the default names when empty
    pub entrypoint: String,

    pub optional: bool,

    pub ancestors: Vec<Location>,
}

impl ReaderNode {
    /// A root node with no ancestors
    pub fn root(dir: impl Into<PathBuf>, entrypoint: impl Into<String>) -> Self {
        ReaderNode {
            dir: dir.into(),
            entrypoint: entrypoint.into(),
            optional: false,
            ancestors: Vec::new(),
        }
    }

    pub fn location(&self) -> Location {
        Location {
            dir: self.dir.clone(),
            entrypoint: self.entrypoint.clone(),
        }
    }

    /// Node for an included file at `path`, with `self` as its parent
    pub fn child(&self, path: &Path, optional: bool) -> Self {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.location());

        ReaderNode {
            optional,
            ancestors,
            ..ReaderNode::default()
        }
        .with_path(path)
    }

    /// Point the node at the file `path`
    pub fn with_path(mut self, path: &Path) -> Self {
        self.dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.entrypoint = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self
    }
}

/// Fail if `node` revisits a location already on its ancestor chain
///
/// Only the chain being resolved is checked; sibling branches are never compared.
pub fn check_circular_includes(node: &ReaderNode) -> Result<()> {
    let parent = node.ancestors.last().ok_or_else(|| {
        TaskfileError::InvariantViolation("node has no parent".to_string())
    })?;

    let target = node.location();
    if let Some(seen) = node.ancestors.iter().rev().find(|a| **a == target) {
        return Err(TaskfileError::Cycle {
            first: seen.path(),
            second: parent.path(),
        });
    }

    Ok(())
}
