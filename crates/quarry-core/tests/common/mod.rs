use std::path::PathBuf;

use quarry_core::SqliteExecutor;
use rusqlite::Connection;
use tempfile::TempDir;

/// Number of rows in the `orders` fixture table.
pub const ORDER_COUNT: i64 = 4;

/// Helper function to create a fixture database with an `orders` table.
///
/// Monthly totals: 2024-11 is 1500.0, 2024-12 is 1750.0. Per customer:
/// alice 1250.0, bob 1000.0, carol 1000.0.
pub fn create_test_database() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("fixture.db");
    let connection = Connection::open(&db_path).expect("Failed to create database");
    connection
        .execute_batch(
            "CREATE TABLE orders (
                 id INTEGER PRIMARY KEY,
                 customer TEXT NOT NULL,
                 month TEXT NOT NULL,
                 amount REAL NOT NULL
             );
             INSERT INTO orders (customer, month, amount) VALUES
                 ('alice', '2024-11', 500.0),
                 ('bob', '2024-11', 1000.0),
                 ('alice', '2024-12', 750.0),
                 ('carol', '2024-12', 1000.0);",
        )
        .expect("Failed to load fixture");
    (temp_dir, db_path)
}

/// Helper function to open the fixture read-only.
pub fn create_test_executor() -> (TempDir, SqliteExecutor) {
    let (temp_dir, db_path) = create_test_database();
    let executor = SqliteExecutor::open(&db_path).expect("Failed to open fixture");
    (temp_dir, executor)
}
