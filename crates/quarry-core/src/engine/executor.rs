//! The query execution capability the engine drives.

use std::fmt;

use crate::models::ResultSet;

/// Structured failure codes a store may attach to an error.
///
/// Codes let the retry controller classify a failure without relying on the
/// wording of the message. `Generic` covers the store's catch-all error
/// class (SQLite's `SQLITE_ERROR`), under which unknown columns, syntax
/// errors and similar problems are reported; those are classified by
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    PermissionDenied,
    Busy,
    Io,
    OutOfMemory,
    Corrupt,
    ReadOnly,
    Interrupted,
    Generic,
}

/// An execution failure, with the store's own message kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub message: String,
    pub code: Option<StoreErrorCode>,
}

impl StoreError {
    /// An error known only by its message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: StoreErrorCode) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StoreError {}

/// Runs one self-contained query against a relational store.
///
/// Implementations must report the store's error text unchanged in
/// [`StoreError::message`].
pub trait Executor {
    fn run(&self, query: &str) -> Result<ResultSet, StoreError>;
}

impl<T: Executor + ?Sized> Executor for &T {
    fn run(&self, query: &str) -> Result<ResultSet, StoreError> {
        (**self).run(query)
    }
}

impl<T: Executor + ?Sized> Executor for Box<T> {
    fn run(&self, query: &str) -> Result<ResultSet, StoreError> {
        (**self).run(query)
    }
}
