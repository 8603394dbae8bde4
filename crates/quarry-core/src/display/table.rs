//! Markdown tables for result sets.

use std::fmt;

use crate::models::{ResultSet, Value};

/// Wrapper that renders a [`ResultSet`] as a markdown table.
///
/// With a [`limit`](ResultTable::limit) only the first rows are shown,
/// followed by a line saying how many were left out.
pub struct ResultTable<'a> {
    result: &'a ResultSet,
    limit: Option<usize>,
}

impl<'a> ResultTable<'a> {
    pub fn new(result: &'a ResultSet) -> Self {
        Self {
            result,
            limit: None,
        }
    }

    /// Shows at most `rows` rows.
    pub fn limit(mut self, rows: usize) -> Self {
        self.limit = Some(rows);
        self
    }
}

/// Cell text safe inside a table row.
fn cell(value: &Value) -> String {
    value
        .to_string()
        .replace('|', "\\|")
        .replace(['\r', '\n'], " ")
}

impl fmt::Display for ResultTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self.result.columns();
        if columns.is_empty() {
            return writeln!(f, "_No columns._");
        }

        write!(f, "|")?;
        for column in columns {
            write!(f, " {} |", column.replace('|', "\\|"))?;
        }
        writeln!(f)?;
        write!(f, "|")?;
        for _ in columns {
            write!(f, "---|")?;
        }
        writeln!(f)?;

        let shown = self
            .limit
            .map_or(self.result.row_count(), |limit| limit.min(self.result.row_count()));
        for row in &self.result.rows()[..shown] {
            write!(f, "|")?;
            for value in row {
                write!(f, " {} |", cell(value))?;
            }
            writeln!(f)?;
        }

        if self.result.is_empty() {
            writeln!(f)?;
            writeln!(f, "_No rows._")?;
        } else if shown < self.result.row_count() {
            writeln!(f)?;
            writeln!(f, "_{} more rows not shown._", self.result.row_count() - shown)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> ResultSet {
        ResultSet::new(
            vec!["name".into(), "total".into()],
            vec![
                vec![Value::from("a|b"), Value::Integer(1)],
                vec![Value::Null, Value::Real(2.5)],
                vec![Value::from("line\nbreak"), Value::Blob(vec![1, 2, 3])],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_table_layout() {
        let output = ResultTable::new(&result()).to_string();
        assert_eq!(
            output,
            "| name | total |\n\
             |---|---|\n\
             | a\\|b | 1 |\n\
             | NULL | 2.5 |\n\
             | line break | <3 bytes> |\n"
        );
    }

    #[test]
    fn test_table_limit() {
        let output = ResultTable::new(&result()).limit(1).to_string();
        assert!(output.contains("| a\\|b | 1 |"));
        assert!(!output.contains("NULL"));
        assert!(output.ends_with("_2 more rows not shown._\n"));
    }

    #[test]
    fn test_empty_tables() {
        let empty = ResultSet::empty(["n"]);
        assert!(ResultTable::new(&empty).to_string().ends_with("_No rows._\n"));

        let shapeless = ResultSet::default();
        assert_eq!(ResultTable::new(&shapeless).to_string(), "_No columns._\n");
    }
}
