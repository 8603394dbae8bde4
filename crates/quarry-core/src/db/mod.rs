//! SQLite-backed [`Executor`].
//!
//! Queries run on a single `rusqlite` connection. Files are opened
//! read-only and every statement is checked to be read-only before it runs,
//! so executing a plan never modifies the database.

use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use rusqlite::{fallible_iterator::FallibleIterator, Batch, Connection, ErrorCode, OpenFlags};

use crate::{
    engine::{Executor, StoreError, StoreErrorCode},
    error::{DatabaseResultExt, Error, Result},
    models::{ResultSet, Value},
};

/// Message reported when one submission holds more than one statement.
pub const MULTIPLE_STATEMENTS: &str = "You can only execute one statement at a time.";

/// Virtual machine instructions between deadline checks.
const PROGRESS_INTERVAL: i32 = 1_000;

/// Returns the default database path following XDG Base Directory
/// specification: `$XDG_DATA_HOME/quarry/quarry.db`.
pub fn default_database_path() -> Result<PathBuf> {
    xdg::BaseDirectories::with_prefix("quarry")
        .place_data_file("quarry.db")
        .map_err(|e| Error::XdgDirectory(e.to_string()))
}

/// Executes queries against one SQLite connection.
pub struct SqliteExecutor {
    connection: Connection,
    step_timeout: Option<Duration>,
}

impl SqliteExecutor {
    /// Opens an existing database file read-only.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileSystem` if the file does not exist and
    /// `Error::Database` if SQLite cannot open it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::FileSystem {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "database file does not exist",
                ),
            });
        }

        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .db_context("Failed to open database connection")?;
        Ok(Self::from_connection(connection))
    }

    /// An empty in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().db_context("Failed to open in-memory database")?;
        Ok(Self::from_connection(connection))
    }

    /// Wraps an existing connection, e.g. one a caller has filled with
    /// fixture data.
    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection,
            step_timeout: None,
        }
    }

    /// Interrupts any single query running longer than `timeout`.
    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    fn query(&self, query: &str) -> std::result::Result<ResultSet, StoreError> {
        let mut batch = Batch::new(&self.connection, query);
        let Some(mut statement) = batch.next().map_err(store_error)? else {
            return Err(StoreError::with_code(
                "query contains no statement",
                StoreErrorCode::Generic,
            ));
        };
        if !matches!(batch.next(), Ok(None)) {
            return Err(StoreError::with_code(
                MULTIPLE_STATEMENTS,
                StoreErrorCode::Generic,
            ));
        }
        if !statement.readonly() {
            return Err(StoreError::with_code(
                "attempt to write a readonly database",
                StoreErrorCode::ReadOnly,
            ));
        }

        let columns: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = columns.len();
        let mut result = ResultSet::empty(columns);

        let mut rows = statement.query([]).map_err(store_error)?;
        while let Some(row) = rows.next().map_err(store_error)? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(Value::from(row.get_ref(i).map_err(store_error)?));
            }
            result
                .push_row(values)
                .map_err(|e| StoreError::new(e.to_string()))?;
        }

        Ok(result)
    }
}

impl Executor for SqliteExecutor {
    fn run(&self, query: &str) -> std::result::Result<ResultSet, StoreError> {
        let _deadline = self
            .step_timeout
            .map(|timeout| Deadline::arm(&self.connection, timeout));
        self.query(query)
    }
}

/// Progress handler that interrupts the running statement once its
/// deadline passes. Removed again on drop.
struct Deadline<'a> {
    connection: &'a Connection,
}

impl<'a> Deadline<'a> {
    fn arm(connection: &'a Connection, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        connection.progress_handler(PROGRESS_INTERVAL, Some(move || Instant::now() >= deadline));
        Self { connection }
    }
}

impl Drop for Deadline<'_> {
    fn drop(&mut self) {
        self.connection.progress_handler(0, None::<fn() -> bool>);
    }
}

/// Maps a `rusqlite` failure to a [`StoreError`], keeping SQLite's message.
///
/// Prepare-time failures carry the submitted SQL and an offset alongside the
/// message; only the message is kept.
fn store_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(failure, message) => StoreError::with_code(
            message.unwrap_or_else(|| failure.to_string()),
            store_code(failure.code),
        ),
        rusqlite::Error::SqlInputError { error, msg, .. } => {
            StoreError::with_code(msg, store_code(error.code))
        }
        rusqlite::Error::MultipleStatement => {
            StoreError::with_code(MULTIPLE_STATEMENTS, StoreErrorCode::Generic)
        }
        other => StoreError::new(other.to_string()),
    }
}

fn store_code(code: ErrorCode) -> StoreErrorCode {
    match code {
        ErrorCode::PermissionDenied | ErrorCode::AuthorizationForStatementDenied => {
            StoreErrorCode::PermissionDenied
        }
        ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => StoreErrorCode::Busy,
        ErrorCode::SystemIoFailure
        | ErrorCode::DiskFull
        | ErrorCode::CannotOpen
        | ErrorCode::FileLockingProtocolFailed => StoreErrorCode::Io,
        ErrorCode::OutOfMemory => StoreErrorCode::OutOfMemory,
        ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase => StoreErrorCode::Corrupt,
        ErrorCode::ReadOnly => StoreErrorCode::ReadOnly,
        ErrorCode::OperationInterrupted => StoreErrorCode::Interrupted,
        _ => StoreErrorCode::Generic,
    }
}
