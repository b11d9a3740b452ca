// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Reference scenarios
//!
//! The four statements every change to binding must keep analyzing the same
//! way, followed by the table-driven scenarios of `tests/scenarios/*.yaml`.

use std::sync::Arc;

use sqlgrid_semantic::{
    AnalyzedQuery, CompositeClause, CondId, ConditionKind, ExprKind, InList, OuterParent,
    RelationKind, SemanticAnalyzer, SubqueryRole, TreeId,
};
use sqlgrid_test_utils::{
    FixtureParser, MockCatalogBuilder, Scenario, SqlFixtures, init_tracing, load_scenarios,
    normalize_whitespace,
};

fn analyzer() -> SemanticAnalyzer {
    init_tracing();
    let catalog = MockCatalogBuilder::new().with_standard_schema().build();
    SemanticAnalyzer::new(Arc::new(catalog)).with_parser(Arc::new(FixtureParser))
}

fn analyze(sql: &str) -> AnalyzedQuery {
    analyzer()
        .analyze_sql(sql)
        .unwrap_or_else(|e| panic!("failed to analyze '{}': {}", sql, e))
}

fn subtrees_with_role(analyzed: &AnalyzedQuery, role: SubqueryRole) -> Vec<TreeId> {
    let graph = analyzed.graph();
    graph
        .tree_ids()
        .filter(|id| graph.tree(*id).role == role)
        .collect()
}

fn relation_aliases(analyzed: &AnalyzedQuery) -> Vec<String> {
    let graph = analyzed.graph();
    analyzed
        .root_tree()
        .relations
        .iter()
        .map(|id| graph.relation(*id))
        .filter(|node| node.is_column_source())
        .map(|node| node.alias.clone())
        .collect()
}

#[test]
fn test_comma_join_scenario() {
    let analyzed = analyze(SqlFixtures::comma_join());
    let graph = analyzed.graph();
    let root = analyzed.root_tree();

    assert_eq!(relation_aliases(&analyzed), vec!["a", "b"]);
    assert_eq!(root.join_conditions.len(), 1);
    assert!(root.residual_conditions.is_empty());

    let a = root.relations[0];
    let b = root.relations[1];
    let join = root.join_conditions[0];
    assert_eq!(graph.condition(join).relation_nodes(), Some(&[a, b][..]));
    assert_eq!(graph.relation(a).join_list.len(), 1);
    assert_eq!(graph.relation(a).join_list[0].other, b);
    assert_eq!(graph.relation(b).join_list[0].other, a);

    // All of a, then all of b; the row-id column stays hidden.
    let columns: Vec<(String, String)> = root
        .projection
        .iter()
        .map(|id| {
            let column = graph.expression(*id).as_column().expect("column");
            (column.table_alias.clone(), column.column_name.clone())
        })
        .collect();
    let expected: Vec<(String, String)> = [
        ("a", "x"),
        ("a", "id"),
        ("a", "y"),
        ("b", "x"),
        ("b", "id"),
        ("b", "y"),
    ]
    .iter()
    .map(|(t, c)| (t.to_string(), c.to_string()))
    .collect();
    assert_eq!(columns, expected);
}

#[test]
fn test_find_conditions_by_kind() {
    let analyzed = analyze(
        "SELECT x FROM a WHERE (a.x = 1 OR a.y LIKE 'p%') AND a.id IN (1, 2) AND a.x < 9",
    );
    let graph = analyzed.graph();
    let root = analyzed.root_tree().where_condition.expect("WHERE");

    let comparisons =
        graph.find_conditions(root, |c| matches!(c.kind, ConditionKind::RelOp { .. }));
    assert_eq!(comparisons.len(), 2);
    let composites =
        graph.find_conditions(root, |c| matches!(c.kind, ConditionKind::Composite(_)));
    assert_eq!(composites.len(), 2);
    let logical =
        graph.find_conditions(root, |c| matches!(c.kind, ConditionKind::Logical { .. }));
    assert_eq!(logical.len(), 3);
    assert_eq!(logical[0], root);
}

#[test]
fn test_uncorrelated_in_scenario() {
    let analyzed = analyze(SqlFixtures::uncorrelated_in());
    let graph = analyzed.graph();
    let root = analyzed.root_tree();

    let condition = graph.condition(root.where_condition.expect("WHERE"));
    let ConditionKind::Composite(CompositeClause::In {
        list: InList::Subquery(subquery),
        ..
    }) = &condition.kind
    else {
        panic!("expected IN subquery, found {:?}", condition.kind);
    };
    let ExprKind::Subquery(subtree) = graph.expression(*subquery).kind else {
        panic!("expected subquery expression");
    };

    let inner = graph.tree(subtree);
    assert_eq!(inner.role, SubqueryRole::NonScalar);
    assert_eq!(inner.parent, Some(analyzed.root()));
    assert!(!inner.correlated);
    assert!(inner.placeholders.is_empty());
    assert!(root.correlated_subtrees.is_empty());

    let column = graph
        .expression(inner.projection[0])
        .as_column()
        .expect("column");
    assert!(!column.is_orphan());
    assert_eq!(
        graph.relation(column.relation.expect("bound")).tree,
        subtree
    );

    // The only relation of the outer tree is nation: no placeholder.
    assert_eq!(root.relations.len(), 1);
}

#[test]
fn test_correlated_in_scenario() {
    let analyzed = analyze(SqlFixtures::correlated_in());
    let graph = analyzed.graph();
    let root = analyzed.root_tree();

    let subtrees = subtrees_with_role(&analyzed, SubqueryRole::NonScalar);
    assert_eq!(subtrees.len(), 1);
    let subtree = subtrees[0];
    let inner = graph.tree(subtree);
    assert!(inner.correlated);
    assert_eq!(root.correlated_subtrees, vec![subtree]);

    // `c.c_name` escalated to the outer `customer c`.
    let orphans: Vec<_> = graph
        .expression_ids()
        .filter_map(|id| graph.expression(id).as_column())
        .filter(|column| column.tree == subtree && column.is_orphan())
        .collect();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].column_name, "c_name");
    let outer_customer = root.relations[0];
    assert_eq!(orphans[0].relation, Some(outer_customer));

    let placeholder = inner
        .placeholder_for(analyzed.root())
        .expect("placeholder in outer tree");
    let node = graph.relation(placeholder);
    assert_eq!(node.kind, RelationKind::Placeholder);
    assert_eq!(node.represents, Some(subtree));
    assert_eq!(node.correlated_with, vec![outer_customer]);
    assert!(root.relations.contains(&placeholder));
    assert_eq!(root.hidden_projection.len(), 1);

    // The inner filter reads only the outer relation.
    assert_eq!(inner.residual_conditions.len(), 1);
}

#[test]
fn test_left_outer_join_scenario() {
    let analyzed = analyze(SqlFixtures::left_outer_join());
    let graph = analyzed.graph();
    let root = analyzed.root_tree();

    assert!(root.has_outer_join);
    assert_eq!(root.outer_join_generation, 1);
    let a = root.relations[0];
    let b = root.relations[1];
    assert_eq!(
        graph.relation(b).outer_parents,
        vec![OuterParent {
            relation: a,
            generation: 1
        }]
    );
    assert!(graph.relation(a).outer_parents.is_empty());
    assert_eq!(graph.relation(b).outer_join_generation(), Some(1));

    // The ON condition is kept whole and still joins a and b.
    assert_eq!(root.from_conditions.len(), 1);
    assert_eq!(root.join_conditions, root.from_conditions);
    let on = graph.condition(root.from_conditions[0]);
    assert_eq!(on.outer_join_generation(), Some(1));
}

#[test]
fn test_frozen_relation_sets_match_classification() {
    for sql in [
        SqlFixtures::comma_join(),
        SqlFixtures::correlated_in(),
        SqlFixtures::correlated_exists(),
        SqlFixtures::left_outer_join(),
    ] {
        let analyzed = analyze(sql);
        let graph = analyzed.graph();
        for id in graph.tree_ids() {
            let tree = graph.tree(id);
            let local = |condition: CondId| -> Vec<_> {
                graph
                    .condition(condition)
                    .relation_nodes()
                    .expect("relation set computed during analysis")
                    .iter()
                    .copied()
                    .filter(|relation| graph.relation(*relation).tree == id)
                    .collect()
            };
            for condition in &tree.join_conditions {
                assert!(local(*condition).len() >= 2, "{}", sql);
            }
            for condition in &tree.residual_conditions {
                assert!(local(*condition).is_empty(), "{}", sql);
            }
            for relation in &tree.relations {
                for condition in &graph.relation(*relation).conditions {
                    assert_eq!(local(*condition), vec![*relation], "{}", sql);
                }
            }
        }

        // A second analysis of the same text classifies identically.
        let again = analyze(sql);
        for id in graph.tree_ids() {
            let (first, second) = (graph.tree(id), again.graph().tree(id));
            assert_eq!(first.join_conditions, second.join_conditions, "{}", sql);
            assert_eq!(first.residual_conditions, second.residual_conditions, "{}", sql);
        }
    }
}

fn check_scenario(scenario: &Scenario) {
    let analyzer = analyzer();
    let expect = &scenario.expect;
    let result = analyzer.analyze_sql(&scenario.sql);

    if let Some(code) = expect.error_code {
        match result {
            Err(err) => assert_eq!(
                err.code(),
                code,
                "scenario '{}': unexpected error {}",
                scenario.name,
                err
            ),
            Ok(_) => panic!("scenario '{}': expected error {}", scenario.name, code),
        }
        return;
    }

    let analyzed = result
        .unwrap_or_else(|e| panic!("scenario '{}' failed: {}", scenario.name, e));
    let root = analyzed.root_tree();

    if let Some(relations) = &expect.relations {
        assert_eq!(&relation_aliases(&analyzed), relations, "scenario '{}'", scenario.name);
    }
    if let Some(projection) = &expect.projection {
        assert_eq!(&analyzed.projection_names(), projection, "scenario '{}'", scenario.name);
    }
    if let Some(count) = expect.join_conditions {
        assert_eq!(root.join_conditions.len(), count, "scenario '{}'", scenario.name);
    }
    if let Some(count) = expect.residual_conditions {
        assert_eq!(root.residual_conditions.len(), count, "scenario '{}'", scenario.name);
    }
    if let Some(outer) = expect.has_outer_join {
        assert_eq!(root.has_outer_join, outer, "scenario '{}'", scenario.name);
    }
    if let Some(correlated) = expect.correlated_subquery {
        let graph = analyzed.graph();
        let any = graph.tree_ids().any(|id| graph.tree(id).correlated);
        assert_eq!(any, correlated, "scenario '{}'", scenario.name);
    }
    if let Some(rebuilt) = &expect.rebuilt {
        assert_eq!(
            analyzed.sql(),
            normalize_whitespace(rebuilt),
            "scenario '{}'",
            scenario.name
        );
    }
}

#[test]
fn test_yaml_scenarios() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/scenarios/basic.yaml");
    let scenarios = load_scenarios(path).expect("scenario file");
    assert!(scenarios.len() > 10);
    for scenario in &scenarios {
        check_scenario(scenario);
    }
}
