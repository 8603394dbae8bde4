//! Error types for the quarry library.

use std::path::PathBuf;

use thiserror::Error;

/// Structural problems detected while promoting a plan document into a
/// [`Plan`](crate::models::Plan).
///
/// These are always fatal: no plan object is produced when one of them is
/// returned, and none of them is ever retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The plan contains no steps at all
    #[error("Plan must contain at least one step")]
    EmptyPlan,
    /// A step id is empty or whitespace only
    #[error("Step at position {position} has an empty id")]
    InvalidStepId { position: usize },
    /// A step has no query text
    #[error("Step '{id}' has an empty query")]
    EmptyQuery { id: String },
    /// Two steps share an id
    #[error("Step id '{id}' is used more than once")]
    DuplicateStepId { id: String },
    /// The designated final step is not one of the plan's steps
    #[error("Final step '{id}' not found in plan")]
    UnknownFinalStep { id: String },
    /// A dependency names a step that does not exist
    #[error("Step '{step}' depends on non-existent step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },
    /// The dependency graph contains a cycle; `cycle` lists it in edge order
    /// and repeats the first id at the end
    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },
    /// The scheduler emitted fewer steps than the plan holds
    #[error("Internal scheduling error: ordered {ordered} of {total} steps")]
    Internal { ordered: usize, total: usize },
}

/// Comprehensive error type for all quarry operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Plan construction failed validation
    #[error("Invalid plan: {0}")]
    Plan(#[from] PlanError),
    /// Database connection or setup errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    /// Creates a new database error with additional context.
    pub fn database(message: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Database {
            message: message.into(),
            source,
        }
    }

    /// Creates a configuration error for an invalid setting.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| Error::database(message, e))
    }
}

/// Result type alias for quarry operations
pub type Result<T> = std::result::Result<T, Error>;
