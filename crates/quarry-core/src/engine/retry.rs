//! Failure classification and the correction budget.

use super::executor::{StoreError, StoreErrorCode};

/// How a failed execution should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The query itself is wrong; a corrected query may succeed.
    Retryable,
    /// The store cannot serve the query as written or at all.
    NonRetryable,
    /// The per-step deadline expired.
    Timeout,
    /// Not recognised; treated as non-retryable.
    Unknown,
}

impl ErrorClass {
    pub fn is_retryable(self) -> bool {
        self == ErrorClass::Retryable
    }
}

/// Phrases marking environmental failures. Checked before
/// [`RETRYABLE_PATTERNS`].
const NON_RETRYABLE_PATTERNS: &[&str] = &[
    "permission denied",
    "access denied",
    "not authorized",
    "database is locked",
    "database is busy",
    "disk i/o error",
    "database or disk is full",
    "out of memory",
    "database disk image is malformed",
    "file is not a database",
    "unable to open database file",
    "attempt to write a readonly database",
    "interrupted",
];

/// Phrases marking mistakes in the query text.
///
/// These are whole phrases rather than single words so unrelated messages
/// that merely mention e.g. "join" are not mistaken for query errors.
const RETRYABLE_PATTERNS: &[&str] = &[
    "ambiguous column",
    "no such column",
    "no such table",
    "no such function",
    "syntax error",
    "near \"",
    "unrecognized token",
    "incomplete input",
    "type mismatch",
    "datatype mismatch",
    "misuse of aggregate",
    "wrong number of arguments",
    "sub-select returns",
    "do not have the same number of result columns",
    "only execute one statement",
    "multiple statements",
];

/// Classifies a store failure.
///
/// A structured code wins when present; message patterns are the fallback,
/// with non-retryable patterns taking priority over retryable ones.
pub fn classify(error: &StoreError) -> ErrorClass {
    match error.code {
        Some(StoreErrorCode::Interrupted) => return ErrorClass::Timeout,
        Some(
            StoreErrorCode::PermissionDenied
            | StoreErrorCode::Busy
            | StoreErrorCode::Io
            | StoreErrorCode::OutOfMemory
            | StoreErrorCode::Corrupt
            | StoreErrorCode::ReadOnly,
        ) => return ErrorClass::NonRetryable,
        Some(StoreErrorCode::Generic) | None => {}
    }

    classify_message(&error.message)
}

/// Pattern-only classification, for stores that report no codes.
pub fn classify_message(message: &str) -> ErrorClass {
    let message = message.to_lowercase();

    if NON_RETRYABLE_PATTERNS.iter().any(|p| message.contains(p)) {
        ErrorClass::NonRetryable
    } else if RETRYABLE_PATTERNS.iter().any(|p| message.contains(p)) {
        ErrorClass::Retryable
    } else {
        ErrorClass::Unknown
    }
}

/// Per-step correction budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Corrections allowed per step; a step runs at most this plus one
    /// times.
    pub max_corrections: u32,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_CORRECTIONS: u32 = 2;

    pub fn new(max_corrections: u32) -> Self {
        Self { max_corrections }
    }

    /// Starts the budget for one step.
    pub(crate) fn budget(self) -> Budget {
        Budget {
            remaining: self.max_corrections,
            used: 0,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_CORRECTIONS)
    }
}

/// Corrections left for the step currently executing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    remaining: u32,
    used: u32,
}

impl Budget {
    /// Claims one correction, returning its 1-based number.
    pub(crate) fn take(&mut self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.used += 1;
        Some(self.used)
    }
}
