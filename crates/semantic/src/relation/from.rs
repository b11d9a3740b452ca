// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! FROM clause to relation graph
//!
//! Each named table reference resolves, in order, to a view (expanded into a
//! subquery), a visible WITH name, or a catalog table. Joins record sibling
//! edges (inner / cross) or outer-join parents tagged with a generation
//! number, and their ON / USING / NATURAL conditions are kept as
//! from-conditions for the WHERE classification pass.

use sqlgrid_ir::{
    CommonTableExpr, CompareOp, Identifier, Join, JoinConstraint, JoinKind, TablePrimary,
    TableReference,
};
use tracing::debug;

use crate::condition::{ConditionKind, ConditionOrigin, LogicalOp};
use crate::context::AnalysisContext;
use crate::error::{SemanticError, SemanticResult};
use crate::expr::{AttributeColumn, ExprKind};
use crate::graph::{CondId, RelId, TreeId};
use crate::query_tree::SubqueryRole;
use crate::relation::{JoinSpec, OuterParent, RelationKind, RelationNode};

impl AnalysisContext<'_> {
    /// Build the relation nodes of `tree` from its FROM clause
    ///
    /// An empty FROM clause yields a single fake relation.
    pub(crate) fn build_from(
        &mut self,
        tree: TreeId,
        from: &[TableReference],
    ) -> SemanticResult<()> {
        if from.is_empty() {
            let name = self.next_alias("fake");
            self.add_relation(tree, RelationNode::new(RelationKind::Fake, tree, name))?;
            return Ok(());
        }

        for reference in from {
            let first = self.add_table_primary(tree, &reference.primary)?;
            let mut chain = vec![first];
            for join in &reference.joins {
                self.apply_join(tree, &mut chain, join)?;
            }
        }
        Ok(())
    }

    /// Register the WITH clause of `tree`
    pub(crate) fn register_ctes(
        &mut self,
        tree: TreeId,
        ctes: &[CommonTableExpr],
    ) -> SemanticResult<()> {
        for cte in ctes {
            let name = self.idents.normalize(&cte.name);
            let duplicate = self
                .graph
                .tree(tree)
                .with_relations
                .iter()
                .any(|id| self.graph.relation(*id).alias == name);
            if duplicate {
                return Err(SemanticError::DuplicateCte(name));
            }

            let subtree = self.build_query(&cte.query, SubqueryRole::CommonTable, None)?;
            let declared = self.normalize_all(&cte.columns);
            let output_columns = self.remap_output_columns(subtree, &name, &declared)?;

            let mut node = RelationNode::new(RelationKind::DerivedSubquery, tree, name.clone());
            node.subtree = Some(subtree);
            node.output_columns = output_columns;
            let id = self.graph.add_relation(node);
            self.graph.tree_mut(tree).with_relations.push(id);
            debug!(tree = %tree, cte = %name, "Registered common table expression");
        }
        Ok(())
    }

    fn add_table_primary(&mut self, tree: TreeId, primary: &TablePrimary) -> SemanticResult<RelId> {
        match primary {
            TablePrimary::Named { name, alias, only } => {
                let name = self.idents.normalize(name);
                let mut node = if self.catalog.is_view_exists(&name) {
                    self.expand_view(tree, &name)?
                } else if let Some(definition) = self.find_cte(tree, &name) {
                    self.cte_reference(tree, definition)
                } else {
                    let table = self.catalog.lookup_table(&name)?;
                    RelationNode::base_table(tree, table)
                };
                node.only = *only;
                if let Some(alias) = alias {
                    node.alias = self.idents.normalize(alias);
                }
                self.add_relation(tree, node)
            }
            TablePrimary::Derived {
                query,
                alias,
                columns,
            } => {
                let alias = match alias {
                    Some(alias) => self.idents.normalize(alias),
                    None => self.next_alias("subquery"),
                };
                let subtree = self.build_query(query, SubqueryRole::Derived, Some(tree))?;
                let declared = self.normalize_all(columns);
                let output_columns = self.remap_output_columns(subtree, &alias, &declared)?;

                let mut node = RelationNode::new(RelationKind::DerivedSubquery, tree, alias);
                node.subtree = Some(subtree);
                node.output_columns = output_columns;
                self.add_relation(tree, node)
            }
        }
    }

    fn expand_view(&mut self, tree: TreeId, name: &str) -> SemanticResult<RelationNode> {
        let view = self.catalog.lookup_view(name)?;
        let parser = self
            .parser
            .ok_or_else(|| SemanticError::ParserUnavailable(name.to_string()))?;
        let query = parser
            .parse_query(&view.sql)
            .map_err(|e| SemanticError::ViewParseFailed {
                view: name.to_string(),
                message: e.to_string(),
            })?;
        debug!(tree = %tree, view = %name, "Expanding view");

        let subtree = self.build_query(&query, SubqueryRole::View, None)?;
        let output_columns = self.remap_output_columns(subtree, name, &view.columns)?;
        let mut node = RelationNode::new(RelationKind::DerivedSubquery, tree, name);
        node.subtree = Some(subtree);
        node.output_columns = output_columns;
        Ok(node)
    }

    /// Nearest CTE definition called `name`
    fn find_cte(&self, tree: TreeId, name: &str) -> Option<RelId> {
        let mut current = Some(tree);
        while let Some(id) = current {
            let query_tree = self.graph.tree(id);
            let found = query_tree
                .with_relations
                .iter()
                .find(|definition| self.graph.relation(**definition).alias == name);
            if let Some(definition) = found {
                return Some(*definition);
            }
            current = query_tree.cte_scope.or(query_tree.parent);
        }
        None
    }

    fn cte_reference(&mut self, tree: TreeId, definition: RelId) -> RelationNode {
        let source = self.graph.relation_mut(definition);
        source.reference_count += 1;
        let mut node = RelationNode::new(RelationKind::CteReference, tree, source.alias.clone());
        node.cte_source = Some(definition);
        node.subtree = source.subtree;
        node.output_columns = source.output_columns.clone();
        node
    }

    /// Apply a declared column list to a subtree's projection and return the
    /// relation's output names
    fn remap_output_columns(
        &mut self,
        subtree: TreeId,
        relation: &str,
        declared: &[String],
    ) -> SemanticResult<Vec<String>> {
        let projection = self.graph.tree(subtree).projection.clone();
        if !declared.is_empty() {
            if declared.len() != projection.len() {
                return Err(SemanticError::ColumnCountMismatch {
                    relation: relation.to_string(),
                    declared: declared.len(),
                    returned: projection.len(),
                });
            }
            for (expr, name) in projection.iter().zip(declared) {
                self.graph.expression_mut(*expr).set_outer_alias(name.clone());
            }
        }
        Ok(projection
            .iter()
            .map(|expr| {
                self.graph
                    .expression(*expr)
                    .outer_alias()
                    .unwrap_or("?column?")
                    .to_string()
            })
            .collect())
    }

    fn apply_join(
        &mut self,
        tree: TreeId,
        chain: &mut Vec<RelId>,
        join: &Join,
    ) -> SemanticResult<()> {
        match join.kind {
            JoinKind::RightOuter | JoinKind::FullOuter => {
                let natural = if join.natural { "NATURAL " } else { "" };
                let kind = if join.kind == JoinKind::RightOuter {
                    "RIGHT"
                } else {
                    "FULL"
                };
                return Err(SemanticError::NotImplemented(format!(
                    "{}{} OUTER JOIN",
                    natural, kind
                )));
            }
            JoinKind::Inner | JoinKind::Cross | JoinKind::LeftOuter => {}
        }

        let left = self.graph.tree(tree).last_relation;
        let right = self.add_table_primary(tree, &join.table)?;

        let generation = if join.kind == JoinKind::LeftOuter {
            let query_tree = self.graph.tree_mut(tree);
            query_tree.outer_join_generation += 1;
            query_tree.has_outer_join = true;
            Some(query_tree.outer_join_generation)
        } else {
            None
        };

        match generation {
            Some(generation) => {
                let node = self.graph.relation_mut(right);
                for parent in chain.iter() {
                    node.outer_parents.push(OuterParent {
                        relation: *parent,
                        generation,
                    });
                }
                debug!(tree = %tree, relation = %right, generation, "Recorded outer join");
            }
            None => {
                if let Some(left) = left {
                    self.graph.relation_mut(left).siblings.push(right);
                    self.graph.relation_mut(right).siblings.push(left);
                }
            }
        }

        let origin = ConditionOrigin::From {
            outer_join_generation: generation,
        };
        let condition = if join.natural {
            let common = self.natural_columns(chain, right);
            self.synthesize_equalities(tree, chain, right, &common, origin)?
        } else {
            match &join.constraint {
                Some(JoinConstraint::On(condition)) => {
                    let id = self.build_search_condition(tree, condition, origin)?;
                    self.reject_outer_join_marker(id)?;
                    Some(id)
                }
                Some(JoinConstraint::Using(columns)) => {
                    let columns = self.normalize_all(columns);
                    for column in &columns {
                        if self.graph.relation(right).column_matches(column) == 0 {
                            return Err(SemanticError::ColumnNotFound(format!(
                                "{}.{}",
                                self.graph.relation(right).alias,
                                column
                            )));
                        }
                    }
                    self.synthesize_equalities(tree, chain, right, &columns, origin)?
                }
                None => None,
            }
        };

        if let Some(condition) = condition {
            self.graph.tree_mut(tree).from_conditions.push(condition);
        }
        self.graph.relation_mut(right).join = Some(JoinSpec {
            kind: join.kind,
            condition,
        });
        chain.push(right);
        Ok(())
    }

    /// Column names shared by the left side of a join and `right`
    fn natural_columns(&self, chain: &[RelId], right: RelId) -> Vec<String> {
        let right_columns = self.graph.relation(right).wildcard_columns();
        let mut common: Vec<String> = Vec::new();
        for left in chain {
            for column in self.graph.relation(*left).wildcard_columns() {
                if right_columns.contains(&column) && !common.contains(&column) {
                    common.push(column);
                }
            }
        }
        common
    }

    /// `left.c = right.c AND ...` for every name in `columns`
    fn synthesize_equalities(
        &mut self,
        tree: TreeId,
        chain: &[RelId],
        right: RelId,
        columns: &[String],
        origin: ConditionOrigin,
    ) -> SemanticResult<Option<CondId>> {
        let mut accumulator: Option<CondId> = None;
        for column in columns {
            let owners: Vec<RelId> = chain
                .iter()
                .copied()
                .filter(|id| self.graph.relation(*id).column_matches(column) > 0)
                .collect();
            let left = match owners.as_slice() {
                [] => return Err(SemanticError::ColumnNotFound(column.clone())),
                [single] => *single,
                _ => {
                    let aliases = owners
                        .iter()
                        .map(|id| self.graph.relation(*id).alias.clone())
                        .collect();
                    return Err(SemanticError::AmbiguousColumn(column.clone(), aliases));
                }
            };

            let left_alias = self.graph.relation(left).alias.clone();
            let right_alias = self.graph.relation(right).alias.clone();
            let left_expr = self.add_expression(
                tree,
                ExprKind::Column(AttributeColumn::new(tree, Some(left_alias), column.clone())),
            );
            let right_expr = self.add_expression(
                tree,
                ExprKind::Column(AttributeColumn::new(tree, Some(right_alias), column.clone())),
            );
            let equality = self.new_condition(
                tree,
                ConditionKind::RelOp {
                    op: CompareOp::Eq,
                    left: left_expr,
                    right: right_expr,
                    quantifier: None,
                },
                origin,
                true,
            );
            accumulator = Some(match accumulator {
                Some(previous) => self.logical(tree, LogicalOp::And, previous, equality, origin),
                None => equality,
            });
        }
        Ok(accumulator)
    }

    /// Append a relation to `tree`, rejecting a duplicate alias
    pub(crate) fn add_relation(&mut self, tree: TreeId, node: RelationNode) -> SemanticResult<RelId> {
        if node.is_column_source() {
            let duplicate = self.graph.tree(tree).relations.iter().any(|id| {
                let existing = self.graph.relation(*id);
                existing.is_column_source() && existing.alias == node.alias
            });
            if duplicate {
                return Err(SemanticError::AmbiguousTableAlias(node.alias));
            }
        }

        let id = self.graph.add_relation(node);
        let query_tree = self.graph.tree_mut(tree);
        query_tree.relations.push(id);
        query_tree.prev_relation = query_tree.last_relation;
        query_tree.last_relation = Some(id);
        Ok(id)
    }

    fn normalize_all(&self, idents: &[Identifier]) -> Vec<String> {
        idents.iter().map(|ident| self.idents.normalize(ident)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::query_tree::QueryTree;
    use sqlgrid_catalog::StaticCatalog;
    use sqlgrid_function_registry::FunctionRegistry;
    use sqlgrid_ir::{ColumnMetadata, TableMetadata, TypeDescriptor, TypeKind};

    fn catalog() -> StaticCatalog {
        let int = || TypeDescriptor::new(TypeKind::Integer);
        StaticCatalog::new()
            .with_table(TableMetadata::new("a").with_columns(vec![
                ColumnMetadata::new("id", int()),
                ColumnMetadata::new("x", int()),
            ]))
            .with_table(TableMetadata::new("b").with_columns(vec![
                ColumnMetadata::new("id", int()),
                ColumnMetadata::new("y", int()),
            ]))
    }

    fn with_tree<R>(f: impl FnOnce(&mut AnalysisContext<'_>, TreeId) -> R) -> R {
        let catalog = catalog();
        let registry = FunctionRegistry::new();
        let config = AnalyzerConfig::default();
        let mut ctx = AnalysisContext::new(&catalog, None, &registry, &config);
        let tree = ctx
            .graph
            .add_tree(QueryTree::new(SubqueryRole::None, None, TreeId(0)));
        f(&mut ctx, tree)
    }

    fn join(kind: JoinKind, table: &str, natural: bool) -> Join {
        Join {
            kind,
            natural,
            table: TablePrimary::named(table, None::<String>),
            constraint: None,
        }
    }

    #[test]
    fn test_empty_from_gets_fake_relation() {
        with_tree(|ctx, tree| {
            ctx.build_from(tree, &[]).unwrap();
            let relations = &ctx.graph.tree(tree).relations;
            assert_eq!(relations.len(), 1);
            assert_eq!(ctx.graph.relation(relations[0]).kind, RelationKind::Fake);
        });
    }

    #[test]
    fn test_duplicate_alias_is_rejected() {
        with_tree(|ctx, tree| {
            let from = vec![
                TableReference::new(TablePrimary::named("a", Some("t"))),
                TableReference::new(TablePrimary::named("b", Some("t"))),
            ];
            assert_eq!(
                ctx.build_from(tree, &from),
                Err(SemanticError::AmbiguousTableAlias("t".to_string()))
            );
        });
    }

    #[test]
    fn test_unknown_table() {
        with_tree(|ctx, tree| {
            let from = vec![TableReference::table("missing")];
            assert_eq!(
                ctx.build_from(tree, &from),
                Err(SemanticError::TableNotFound("missing".to_string()))
            );
        });
    }

    #[test]
    fn test_right_and_full_joins_fail_fast() {
        for (kind, natural) in [
            (JoinKind::RightOuter, false),
            (JoinKind::FullOuter, false),
            (JoinKind::RightOuter, true),
        ] {
            with_tree(|ctx, tree| {
                let from = vec![TableReference::table("a").with_join(join(kind, "b", natural))];
                assert!(matches!(
                    ctx.build_from(tree, &from),
                    Err(SemanticError::NotImplemented(_))
                ));
            });
        }
    }

    #[test]
    fn test_left_join_generation_and_parents() {
        with_tree(|ctx, tree| {
            let from = vec![TableReference::table("a").with_join(join(JoinKind::LeftOuter, "b", true))];
            ctx.build_from(tree, &from).unwrap();

            let query_tree = ctx.graph.tree(tree);
            assert!(query_tree.has_outer_join);
            assert_eq!(query_tree.outer_join_generation, 1);
            assert_eq!(query_tree.from_conditions.len(), 1);

            let a = query_tree.relations[0];
            let b = query_tree.relations[1];
            assert_eq!(query_tree.prev_relation, Some(a));
            assert_eq!(query_tree.last_relation, Some(b));
            assert_eq!(
                ctx.graph.relation(b).outer_parents,
                vec![OuterParent {
                    relation: a,
                    generation: 1
                }]
            );
            let condition = ctx.graph.condition(query_tree.from_conditions[0]);
            assert_eq!(condition.outer_join_generation(), Some(1));
        });
    }

    #[test]
    fn test_inner_join_records_siblings() {
        with_tree(|ctx, tree| {
            let from = vec![TableReference::table("a").with_join(join(JoinKind::Cross, "b", false))];
            ctx.build_from(tree, &from).unwrap();
            let relations = ctx.graph.tree(tree).relations.clone();
            assert_eq!(ctx.graph.relation(relations[0]).siblings, vec![relations[1]]);
            assert_eq!(ctx.graph.relation(relations[1]).siblings, vec![relations[0]]);
            assert!(ctx.graph.tree(tree).from_conditions.is_empty());
        });
    }

    #[test]
    fn test_using_requires_column_on_both_sides() {
        with_tree(|ctx, tree| {
            let mut using = join(JoinKind::Inner, "b", false);
            using.constraint = Some(JoinConstraint::Using(vec![Identifier::new("x")]));
            let from = vec![TableReference::table("a").with_join(using)];
            assert_eq!(
                ctx.build_from(tree, &from),
                Err(SemanticError::ColumnNotFound("b.x".to_string()))
            );
        });
    }
}
