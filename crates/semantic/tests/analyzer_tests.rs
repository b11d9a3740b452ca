// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Analyzer-level behaviour: sharing across threads, catalog traffic,
//! configuration and serialization of the query graph

use std::sync::Arc;
use std::thread;

use sqlgrid_ir::{Dialect, IdentifierCase};
use sqlgrid_semantic::{AnalyzerConfig, SemanticAnalyzer, SemanticError};
use sqlgrid_test_utils::{FixtureParser, MockCatalogBuilder, SqlFixtures, init_tracing};

#[test]
fn test_one_analyzer_serves_many_threads() {
    init_tracing();
    let catalog = MockCatalogBuilder::new().with_standard_schema().build();
    let analyzer = Arc::new(
        SemanticAnalyzer::new(Arc::new(catalog)).with_parser(Arc::new(FixtureParser)),
    );

    let handles: Vec<_> = SqlFixtures::rebuild_corpus()
        .into_iter()
        .map(|sql| {
            let analyzer = Arc::clone(&analyzer);
            thread::spawn(move || {
                let first = analyzer.analyze_sql(sql).map(|q| q.sql());
                let second = analyzer.analyze_sql(sql).map(|q| q.sql());
                (sql, first, second)
            })
        })
        .collect();

    for handle in handles {
        let (sql, first, second) = handle.join().expect("analysis thread panicked");
        let first = first.unwrap_or_else(|e| panic!("failed to analyze '{}': {}", sql, e));
        assert_eq!(Ok(first), second, "{}", sql);
    }
}

#[test]
fn test_generated_names_restart_per_statement() {
    init_tracing();
    let catalog = MockCatalogBuilder::new().with_standard_schema().build();
    let analyzer = SemanticAnalyzer::new(Arc::new(catalog)).with_parser(Arc::new(FixtureParser));

    let alias = |sql: &str| {
        let analyzed = analyzer.analyze_sql(sql).unwrap();
        let graph = analyzed.graph();
        let relation = analyzed.root_tree().relations[0];
        graph.relation(relation).alias.clone()
    };
    let sql = "SELECT * FROM (SELECT x FROM a)";
    assert_eq!(alias(sql), alias(sql));
}

#[test]
fn test_catalog_consulted_for_every_statement() {
    init_tracing();
    let catalog = Arc::new(MockCatalogBuilder::new().with_standard_schema().build_mock());
    let analyzer =
        SemanticAnalyzer::new(catalog.clone()).with_parser(Arc::new(FixtureParser));

    analyzer.analyze_sql(SqlFixtures::comma_join()).unwrap();
    assert_eq!(catalog.lookup_count(), 2);
    analyzer.analyze_sql(SqlFixtures::comma_join()).unwrap();
    assert_eq!(catalog.lookup_count(), 4);

    // The view itself, then the two tables of its definition.
    analyzer.analyze_sql(SqlFixtures::view_reference()).unwrap();
    assert_eq!(catalog.lookup_count(), 7);
}

#[test]
fn test_config_from_json() {
    let config = AnalyzerConfig::from_json_str(
        r#"{ "dialect": "mysql", "max_nesting_depth": 8, "allow_legacy_outer_join": false }"#,
    )
    .unwrap();
    assert_eq!(config.dialect, Dialect::MySQL);
    assert_eq!(config.max_nesting_depth, 8);
    assert_eq!(config.identifier_case(), IdentifierCase::Preserve);
    assert!(!config.allow_legacy_outer_join);

    assert!(AnalyzerConfig::from_json_str(r#"{ "max_nesting_depth": 0 }"#).is_err());
    assert!(AnalyzerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_invalid_config_surfaces_as_analysis_error() {
    init_tracing();
    let catalog = MockCatalogBuilder::new().with_standard_schema().build();
    let analyzer = SemanticAnalyzer::new(Arc::new(catalog))
        .with_parser(Arc::new(FixtureParser))
        .with_config(AnalyzerConfig::default().with_max_nesting_depth(0));

    let err = analyzer.analyze_sql("SELECT x FROM a").unwrap_err();
    assert!(matches!(err, SemanticError::InvalidConfiguration(_)));
    assert_eq!(err.code(), 950);
}

#[test]
fn test_parse_errors_are_reported() {
    init_tracing();
    let catalog = MockCatalogBuilder::new().with_standard_schema().build();
    let analyzer = SemanticAnalyzer::new(Arc::new(catalog)).with_parser(Arc::new(FixtureParser));

    let err = analyzer.analyze_sql("SELECT FROM a").unwrap_err();
    assert!(matches!(err, SemanticError::Unsupported(_)));
}

#[test]
fn test_graph_serializes_to_json() {
    init_tracing();
    let catalog = MockCatalogBuilder::new().with_standard_schema().build();
    let analyzer = SemanticAnalyzer::new(Arc::new(catalog)).with_parser(Arc::new(FixtureParser));
    let analyzed = analyzer.analyze_sql(SqlFixtures::left_outer_join()).unwrap();

    let value = serde_json::to_value(analyzed.graph()).unwrap();
    let trees = value["trees"].as_array().unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0]["has_outer_join"], serde_json::json!(true));
    assert_eq!(value["relations"].as_array().unwrap().len(), 2);
}
