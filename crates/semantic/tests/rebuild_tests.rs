// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Rebuilt SQL text
//!
//! Analyzing the rebuilt text of a statement must give back the same text.

use std::sync::Arc;

use sqlgrid_ir::Dialect;
use sqlgrid_semantic::{AnalyzerConfig, SemanticAnalyzer};
use sqlgrid_test_utils::{FixtureParser, MockCatalogBuilder, SqlFixtures, init_tracing};

fn analyzer() -> SemanticAnalyzer {
    init_tracing();
    let catalog = MockCatalogBuilder::new().with_standard_schema().build();
    SemanticAnalyzer::new(Arc::new(catalog)).with_parser(Arc::new(FixtureParser))
}

fn rebuild(analyzer: &SemanticAnalyzer, sql: &str) -> String {
    analyzer
        .analyze_sql(sql)
        .unwrap_or_else(|e| panic!("failed to analyze '{}': {}", sql, e))
        .sql()
}

#[test]
fn test_rebuild_is_idempotent() {
    let analyzer = analyzer();
    for sql in SqlFixtures::rebuild_corpus() {
        let first = rebuild(&analyzer, sql);
        let second = rebuild(&analyzer, &first);
        assert_eq!(first, second, "rebuild of '{}' is not stable", sql);
    }
}

#[test]
fn test_rebuild_expression_zoo() {
    let sql = rebuild(&analyzer(), SqlFixtures::expression_zoo());
    assert_eq!(
        sql,
        "SELECT CASE WHEN a.x > 1 THEN 'big' ELSE 'small' END, TRIM(LEADING 'x' FROM a.y), \
         EXTRACT(YEAR FROM o.o_orderdate), CAST(a.x AS BIGINT), (a.x + 1) * 2, -a.id \
         FROM a, orders o WHERE o.o_orderkey = a.id"
    );
}

#[test]
fn test_rebuild_group_by_ordinals() {
    let sql = rebuild(&analyzer(), SqlFixtures::group_by_ordinal());
    assert_eq!(
        sql,
        "SELECT orders.o_custkey, COUNT(*) FROM orders GROUP BY orders.o_custkey \
         ORDER BY COUNT(*) DESC"
    );
}

#[test]
fn test_rebuild_correlated_subquery_keeps_outer_alias() {
    let sql = rebuild(&analyzer(), SqlFixtures::correlated_in());
    assert_eq!(
        sql,
        "SELECT c.c_name FROM customer c WHERE c.c_custkey IN \
         (SELECT customer.c_custkey FROM customer WHERE c.c_name LIKE '%1')"
    );
}

#[test]
fn test_rebuild_cte_and_string_escapes() {
    let analyzer = analyzer();
    assert_eq!(
        rebuild(&analyzer, SqlFixtures::cte_self_join()),
        "WITH big AS (SELECT customer.c_custkey, customer.c_acctbal FROM customer \
         WHERE customer.c_acctbal > 1000) SELECT b1.c_custkey FROM big b1, big b2 \
         WHERE b1.c_acctbal = b2.c_acctbal"
    );
    assert_eq!(
        rebuild(&analyzer, "SELECT y FROM a WHERE y = 'it''s' OR y IS NULL"),
        "SELECT a.y FROM a WHERE a.y = 'it''s' OR a.y IS NULL"
    );
}

#[test]
fn test_rebuild_negations_and_lists() {
    let analyzer = analyzer();
    assert_eq!(
        rebuild(
            &analyzer,
            "SELECT x FROM a WHERE NOT (x > 1 AND id < 2) AND y NOT IN ('p', 'q')"
        ),
        "SELECT a.x FROM a WHERE NOT (a.x > 1 AND a.id < 2) AND a.y NOT IN ('p', 'q')"
    );
    assert_eq!(
        rebuild(&analyzer, "SELECT x FROM a WHERE x NOT BETWEEN 1 AND 5 OR y LIKE 'a%'"),
        "SELECT a.x FROM a WHERE a.x NOT BETWEEN 1 AND 5 OR a.y LIKE 'a%'"
    );
}

#[test]
fn test_rebuild_quotes_identifiers_that_need_it() {
    let catalog = MockCatalogBuilder::new()
        .with_standard_schema()
        .with_table(sqlgrid_ir::TableMetadata::new("Mixed").with_columns(vec![
            sqlgrid_ir::ColumnMetadata::new(
                "Value",
                sqlgrid_ir::TypeDescriptor::new(sqlgrid_ir::TypeKind::Integer),
            ),
        ]))
        .build();
    let analyzer = SemanticAnalyzer::new(Arc::new(catalog))
        .with_parser(Arc::new(FixtureParser))
        .with_config(AnalyzerConfig::new(Dialect::PostgreSQL));
    assert_eq!(
        rebuild(&analyzer, "SELECT \"Value\" FROM \"Mixed\""),
        "SELECT \"Mixed\".\"Value\" FROM \"Mixed\""
    );
}
