// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! SQL-specific test helpers and custom assertions

use sqlgrid_ir::{ColumnMetadata, Primary, Query, SelectItem, TypeKind, ValueExpr};

use crate::FixtureParser;

/// Custom assertion helpers for SQL testing
pub struct SqlAssertions;

impl SqlAssertions {
    /// Assert that an expression is a column reference with the given name
    pub fn assert_column_ref(expr: &ValueExpr, name: &str) {
        match expr.as_primary() {
            Some(Primary::Column(column)) => {
                assert_eq!(
                    column.name.value, name,
                    "Expected column '{}', found '{}'",
                    name, column.name.value
                );
            }
            other => panic!("Expected column reference, found {:?}", other),
        }
    }

    /// Assert that an expression is an integer literal with the given value
    pub fn assert_literal_int(expr: &ValueExpr, value: i64) {
        match expr.as_literal() {
            Some(literal) => {
                assert_eq!(
                    literal.text.parse::<i64>().ok(),
                    Some(value),
                    "Expected integer {}, found '{}'",
                    value,
                    literal.text
                );
            }
            None => panic!("Expected integer literal, found {:?}", expr),
        }
    }

    /// Assert that a column has the given name and type kind
    pub fn assert_column(column: &ColumnMetadata, name: &str, kind: TypeKind) {
        assert_eq!(column.name, name, "Column name mismatch");
        assert_eq!(column.data_type.kind, kind, "Column data type mismatch");
    }

    /// Assert that two statements parse to the same syntax tree
    pub fn assert_same_query(left: &str, right: &str) {
        let parse = |sql: &str| {
            FixtureParser::parse(sql).unwrap_or_else(|e| panic!("failed to parse '{}': {}", sql, e))
        };
        assert_eq!(parse(left), parse(right), "\n left: {}\nright: {}", left, right);
    }

    /// Assert the number of items in the top-level projection
    pub fn assert_projection_len(query: &Query, expected: usize) {
        assert_eq!(
            query.body.projection.len(),
            expected,
            "Projection length mismatch: {:?}",
            query.body.projection
        );
    }

    /// Assert that the top-level projection is a bare `*`
    pub fn assert_select_star(query: &Query) {
        assert_eq!(query.body.projection, vec![SelectItem::Wildcard]);
    }
}

/// Collapse runs of whitespace so statements can be compared textually
pub fn normalize_whitespace(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("SELECT  *\n  FROM a"),
            "SELECT * FROM a"
        );
    }

    #[test]
    fn test_assert_same_query_ignores_layout() {
        SqlAssertions::assert_same_query("select * from a", "SELECT *\nFROM a");
    }

    #[test]
    fn test_column_and_literal_assertions() {
        let query = FixtureParser::parse("SELECT x, 42 FROM a").unwrap();
        SqlAssertions::assert_projection_len(&query, 2);
        let SelectItem::Expr { expr, .. } = &query.body.projection[0] else {
            panic!("expected expression");
        };
        SqlAssertions::assert_column_ref(expr, "x");
        let SelectItem::Expr { expr, .. } = &query.body.projection[1] else {
            panic!("expected expression");
        };
        SqlAssertions::assert_literal_int(expr, 42);
    }
}
