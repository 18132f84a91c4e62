//! Error types for taskfile resolution

use std::io;
use std::num::ParseFloatError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for taskfile operations
pub type Result<T> = std::result::Result<T, TaskfileError>;

/// Main error type for taskfile resolution
#[derive(Error, Debug)]
pub enum TaskfileError {
    /// No declaration file exists at a location after probing every default name
    #[error("No Taskfile found in \"{}\". Use \"taskfile --init\" to create a new one", .dir.display())]
    NotFound { dir: PathBuf },

    /// Malformed declaration content
    #[error("Failed to parse {path}:\n{source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Malformed package manifest
    #[error("Failed to parse manifest {path}: {source}")]
    Manifest {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Included Taskfiles can't have dotenv declarations. Please, move the dotenv declaration to the main Taskfile")]
    DotenvInInclude,

    #[error("Include cycle detected between {} <--> {}", .first.display(), .second.display())]
    Cycle { first: PathBuf, second: PathBuf },

    /// Internal contract broken by a caller
    #[error("Failed to check for include cycle: {0}")]
    InvariantViolation(String),

    #[error("Could not parse taskfile version \"{version}\": {source}")]
    Version {
        version: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),
}

impl TaskfileError {
    /// Wrap an I/O error with the path it happened at
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TaskfileError::Io {
            path: path.into(),
            source,
        }
    }

    /// Cycles are fatal even for optional includes
    pub fn is_cycle(&self) -> bool {
        matches!(self, TaskfileError::Cycle { .. })
    }
}

/// Text substitution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unclosed action in template \"{0}\"")]
    UnclosedAction(String),

    #[error("Unsupported expression \"{expr}\" in template \"{template}\"")]
    UnsupportedExpression { expr: String, template: String },
}

/// Errors raised while splicing one declaration into another
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Taskfiles versions should match. First is \"{first}\" but second is \"{second}\"")]
    VersionMismatch { first: String, second: String },
}

/// Specialized result type for template operations
pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

/// Specialized result type for merge operations
pub type MergeResult<T> = std::result::Result<T, MergeError>;
