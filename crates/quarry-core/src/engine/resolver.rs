//! Inlining upstream results into dependent queries.
//!
//! The store only accepts self-contained query text, so each dependency's
//! result set is rendered as a named, read-only relation in a `WITH` clause
//! placed in front of the dependent step's query:
//!
//! ```text
//! WITH "q1"("total") AS (VALUES (1500.0)),
//!      "q2"("total") AS (VALUES (1750.0))
//! SELECT (SELECT total FROM q2) - (SELECT total FROM q1)
//! ```
//!
//! All SQL literal text produced by the engine comes from this module.

use std::{collections::HashSet, fmt::Write};

use crate::models::{ResultSet, Value};

/// Quotes an identifier, doubling embedded double quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn hex_literal(bytes: &[u8]) -> String {
    let mut literal = String::with_capacity(bytes.len() * 2 + 3);
    literal.push_str("X'");
    for byte in bytes {
        let _ = write!(literal, "{byte:02X}");
    }
    literal.push('\'');
    literal
}

/// Renders one value as a SQL literal.
///
/// Text is single-quoted with embedded quotes doubled, blobs become hex
/// literals and NULL stays NULL. SQLite stops reading statement text at a
/// NUL byte, so text containing one is written as a hex literal cast back to
/// text. Reals keep a decimal point or exponent so the store reads them back
/// as reals; NaN and infinities have no literal and render as NULL.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        // The positive half of i64::MIN overflows as a literal.
        Value::Integer(i64::MIN) => "(-9223372036854775807 - 1)".to_string(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) if !v.is_finite() => "NULL".to_string(),
        Value::Real(v) => format!("{v:?}"),
        Value::Text(s) if s.contains('\0') => {
            format!("CAST({} AS TEXT)", hex_literal(s.as_bytes()))
        }
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Blob(bytes) => hex_literal(bytes),
    }
}

/// Column names made unique, case-insensitively, by suffixing `_2`, `_3`, …
/// Empty names become `columnN`.
fn unique_columns(columns: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(columns.len());
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let base = if column.is_empty() {
                format!("column{}", i + 1)
            } else {
                column.clone()
            };
            let mut candidate = base.clone();
            let mut suffix = 1;
            while !seen.insert(candidate.to_lowercase()) {
                suffix += 1;
                candidate = format!("{base}_{suffix}");
            }
            candidate
        })
        .collect()
}

/// Renders a result set as a common table expression named `name`.
///
/// Rows become a multi-row `VALUES` list. An empty result keeps its arity
/// but yields no rows, so lookups and aggregates over it behave exactly as
/// over an empty table.
pub fn render_relation(name: &str, result: &ResultSet) -> String {
    let mut columns = unique_columns(result.columns());
    if columns.is_empty() {
        columns.push("column1".to_string());
    }
    let header = columns
        .iter()
        .map(|column| quote_identifier(column))
        .collect::<Vec<_>>()
        .join(", ");

    let body = if result.is_empty() || result.columns().is_empty() {
        format!("SELECT {} WHERE 0", vec!["NULL"; columns.len()].join(", "))
    } else {
        let rows = result
            .rows()
            .iter()
            .map(|row| {
                let values = row.iter().map(render_value).collect::<Vec<_>>();
                format!("({})", values.join(", "))
            })
            .collect::<Vec<_>>();
        format!("VALUES {}", rows.join(", "))
    };

    format!("{}({header}) AS ({body})", quote_identifier(name))
}

fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let head = text.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &text[keyword.len()..];
    rest.starts_with(char::is_whitespace)
        .then(|| rest.trim_start())
}

/// Skips whitespace and `--` or `/* */` comments at the start of a query.
fn skip_leading_comments(mut text: &str) -> &str {
    loop {
        text = text.trim_start();
        if let Some(rest) = text.strip_prefix("--") {
            text = rest.find('\n').map_or("", |end| &rest[end + 1..]);
        } else if let Some(rest) = text.strip_prefix("/*") {
            match rest.find("*/") {
                Some(end) => text = &rest[end + 2..],
                None => return text,
            }
        } else {
            return text;
        }
    }
}

/// Splits a leading `WITH [RECURSIVE]` off a query, returning the comments
/// before it, whether it is recursive, and the text after the keywords.
fn split_with_clause(query: &str) -> Option<(&str, bool, &str)> {
    let body = skip_leading_comments(query);
    let leading = query[..query.len() - body.len()].trim_start();
    let rest = strip_keyword(body, "WITH")?;
    Some(match strip_keyword(rest, "RECURSIVE") {
        Some(after) => (leading, true, after),
        None => (leading, false, rest),
    })
}

/// Produces the text to submit for a step: its own query preceded by one
/// relation per dependency.
///
/// A query that already opens with a `WITH` clause has the dependency
/// relations merged into it, keeping `RECURSIVE` if present.
pub fn resolve(query: &str, dependencies: &[(&str, &ResultSet)]) -> String {
    if dependencies.is_empty() {
        return query.to_string();
    }

    let relations = dependencies
        .iter()
        .map(|(name, result)| render_relation(name, result))
        .collect::<Vec<_>>()
        .join(", ");

    match split_with_clause(query) {
        Some((leading, true, rest)) => format!("{leading}WITH RECURSIVE {relations}, {rest}"),
        Some((leading, false, rest)) => format!("{leading}WITH {relations}, {rest}"),
        None => format!("WITH {relations} {}", query.trim_start()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(values: &[f64]) -> ResultSet {
        ResultSet::new(
            vec!["total".into()],
            values.iter().map(|v| vec![Value::Real(*v)]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_render_values() {
        assert_eq!(render_value(&Value::Null), "NULL");
        assert_eq!(render_value(&Value::Integer(-42)), "-42");
        assert_eq!(render_value(&Value::Real(3.0)), "3.0");
        assert_eq!(render_value(&Value::Real(0.25)), "0.25");
        assert_eq!(render_value(&Value::Real(f64::NAN)), "NULL");
        assert_eq!(render_value(&Value::Text("O'Brien".into())), "'O''Brien'");
        assert_eq!(render_value(&Value::Blob(vec![0x00, 0xAB])), "X'00AB'");
        assert_eq!(
            render_value(&Value::Integer(i64::MIN)),
            "(-9223372036854775807 - 1)"
        );
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("q1"), "\"q1\"");
        assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn test_render_relation_rows() {
        let result = ResultSet::new(
            vec!["name".into(), "total".into()],
            vec![
                vec![Value::from("Nov"), Value::Integer(10)],
                vec![Value::from("Dec"), Value::Null],
            ],
        )
        .unwrap();
        assert_eq!(
            render_relation("q1", &result),
            "\"q1\"(\"name\", \"total\") AS (VALUES ('Nov', 10), ('Dec', NULL))"
        );
    }

    #[test]
    fn test_render_empty_relation_keeps_arity() {
        let result = ResultSet::empty(["a", "b"]);
        assert_eq!(
            render_relation("q1", &result),
            "\"q1\"(\"a\", \"b\") AS (SELECT NULL, NULL WHERE 0)"
        );
    }

    #[test]
    fn test_render_relation_without_columns() {
        let result = ResultSet::empty(Vec::<String>::new());
        assert_eq!(
            render_relation("q1", &result),
            "\"q1\"(\"column1\") AS (SELECT NULL WHERE 0)"
        );
    }

    #[test]
    fn test_duplicate_columns_made_unique() {
        let columns = vec!["total".to_string(), "TOTAL".to_string(), "total".to_string(), String::new()];
        assert_eq!(
            unique_columns(&columns),
            vec!["total", "TOTAL_2", "total_3", "column4"]
        );
    }

    #[test]
    fn test_resolve_without_dependencies_is_identity() {
        assert_eq!(resolve("SELECT 1", &[]), "SELECT 1");
    }

    #[test]
    fn test_resolve_prepends_relations() {
        let q1 = totals(&[1.5]);
        let q2 = totals(&[2.0]);
        let resolved = resolve(
            "SELECT (SELECT total FROM q1) + (SELECT total FROM q2)",
            &[("q1", &q1), ("q2", &q2)],
        );
        assert_eq!(
            resolved,
            "WITH \"q1\"(\"total\") AS (VALUES (1.5)), \"q2\"(\"total\") AS (VALUES (2.0)) \
             SELECT (SELECT total FROM q1) + (SELECT total FROM q2)"
        );
    }

    #[test]
    fn test_resolve_merges_existing_with_clause() {
        let q1 = totals(&[1.0]);
        assert_eq!(
            resolve("  with x AS (SELECT 1) SELECT * FROM x, q1", &[("q1", &q1)]),
            "WITH \"q1\"(\"total\") AS (VALUES (1.0)), x AS (SELECT 1) SELECT * FROM x, q1"
        );
        assert_eq!(
            resolve(
                "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 3) SELECT * FROM n",
                &[("q1", &q1)]
            ),
            "WITH RECURSIVE \"q1\"(\"total\") AS (VALUES (1.0)), n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 3) SELECT * FROM n"
        );
    }

    #[test]
    fn test_with_prefix_requires_keyword_boundary() {
        assert_eq!(split_with_clause("WITHOUT x"), None);
        assert_eq!(split_with_clause("SELECT 1"), None);
        assert_eq!(split_with_clause("WITH a AS (SELECT 1) SELECT 1"), Some(("", false, "a AS (SELECT 1) SELECT 1")));
    }

    #[test]
    fn test_text_with_nul_renders_as_hex() {
        assert_eq!(
            render_value(&Value::Text("a\0b".into())),
            "CAST(X'610062' AS TEXT)"
        );
    }

    #[test]
    fn test_skip_leading_comments() {
        assert_eq!(skip_leading_comments("  -- a\n/* b */ SELECT 1"), "SELECT 1");
        assert_eq!(skip_leading_comments("-- only a comment"), "");
        assert_eq!(skip_leading_comments("/* open"), "/* open");
        assert_eq!(skip_leading_comments("SELECT 1 -- tail"), "SELECT 1 -- tail");
    }

    #[test]
    fn test_resolve_merges_with_clause_after_comments() {
        let q1 = totals(&[1.0]);
        assert_eq!(
            resolve("-- note\nWITH x AS (SELECT 1) SELECT * FROM x, q1", &[("q1", &q1)]),
            "-- note\nWITH \"q1\"(\"total\") AS (VALUES (1.0)), x AS (SELECT 1) SELECT * FROM x, q1"
        );
        assert_eq!(
            resolve("/* n */ with recursive n(i) AS (SELECT 1) SELECT * FROM n", &[("q1", &q1)]),
            "/* n */ WITH RECURSIVE \"q1\"(\"total\") AS (VALUES (1.0)), n(i) AS (SELECT 1) SELECT * FROM n"
        );
    }
}
