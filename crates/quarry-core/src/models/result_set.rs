//! Tabular results passed between steps.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Value;

/// A row whose width does not match the column list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Row {row} has {actual} values but the result has {expected} columns")]
pub struct ShapeError {
    pub row: usize,
    pub expected: usize,
    pub actual: usize,
}

/// A named-column relation: the unit of data flowing from one step to the
/// steps that depend on it.
///
/// Every row holds exactly one value per column; construction and
/// deserialization both enforce this.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawResultSet")]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct RawResultSet {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

impl TryFrom<RawResultSet> for ResultSet {
    type Error = ShapeError;

    fn try_from(raw: RawResultSet) -> Result<Self, Self::Error> {
        ResultSet::new(raw.columns, raw.rows)
    }
}

impl ResultSet {
    /// Builds a result set, checking that every row matches the columns.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, ShapeError> {
        let expected = columns.len();
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != expected)
        {
            return Err(ShapeError {
                row,
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// A relation with the given columns and no rows.
    pub fn empty<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), ShapeError> {
        if row.len() != self.columns.len() {
            return Err(ShapeError {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, compared case-insensitively as SQL does.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    /// Keeps at most `max_rows` rows, returning whether any were dropped.
    pub fn truncate(&mut self, max_rows: usize) -> bool {
        if self.rows.len() > max_rows {
            self.rows.truncate(max_rows);
            true
        } else {
            false
        }
    }

    /// Consumes the set, returning columns and rows.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}
