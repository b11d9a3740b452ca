// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! Driver for one query tree
//!
//! [`AnalysisContext::build_query`] walks a tree through every [`TreeState`]
//! in order. The first SELECT block of a query owns the WITH clause, the
//! ORDER BY list and LIMIT / OFFSET; UNION branches get trees of their own
//! that share the first block's parent.

use sqlgrid_ir::{OrderByItem, Query, SelectBlock, SelectItem, SetQuantifier};
use tracing::{debug, trace};

use crate::context::AnalysisContext;
use crate::error::{SemanticError, SemanticResult};
use crate::expr::ExprKind;
use crate::graph::{ExprId, TreeId};
use crate::query_tree::{IntoTable, QueryTree, SubqueryRole, TreeState};

impl AnalysisContext<'_> {
    /// Build and bind a complete query tree
    ///
    /// `parent` is the tree the query is nested in. CTE bodies and expanded
    /// views have no parent: they cannot correlate with the query that
    /// references them.
    pub(crate) fn build_query(
        &mut self,
        query: &Query,
        role: SubqueryRole,
        parent: Option<TreeId>,
    ) -> SemanticResult<TreeId> {
        self.enter_nested()?;
        let cte_scope = match role {
            SubqueryRole::CommonTable => self.tracker.current(),
            _ => None,
        };
        let tree = self.open_tree(role, parent, cte_scope)?;

        self.register_ctes(tree, &query.with)?;
        self.build_select_block(tree, &query.body, &query.order_by)?;

        let first_width = self.graph.tree(tree).projection.len();
        for union in &query.unions {
            let parent = self.graph.tree(tree).parent;
            let branch = self.open_tree(SubqueryRole::UnionBranch, parent, Some(tree))?;
            self.graph.tree_mut(branch).union_type = Some(union.union_type);
            self.build_select_block(branch, &union.body, &[])?;
            self.close_tree(branch)?;

            let width = self.graph.tree(branch).projection.len();
            if width != first_width {
                return Err(SemanticError::UnionColumnCountMismatch {
                    left: first_width,
                    right: width,
                });
            }
            self.graph.tree_mut(tree).union_branches.push(branch);
        }

        let query_tree = self.graph.tree_mut(tree);
        query_tree.limit = query.limit;
        query_tree.offset = query.offset;

        self.close_tree(tree)?;
        self.exit_nested();
        Ok(tree)
    }

    /// Create a tree, push it on the tracker and register it
    fn open_tree(
        &mut self,
        role: SubqueryRole,
        parent: Option<TreeId>,
        cte_scope: Option<TreeId>,
    ) -> SemanticResult<TreeId> {
        let statement_top = self.tracker.current().map(|id| self.graph.tree(id).top);
        let parent_top = parent.map(|id| self.graph.tree(id).top);

        let id = self.graph.add_tree(QueryTree::new(role, parent, TreeId(0)));
        let query_tree = self.graph.tree_mut(id);
        query_tree.top = parent_top.or(statement_top).unwrap_or(id);
        query_tree.cte_scope = cte_scope;

        self.tracker.push(id);
        self.transition(id, TreeState::Registered)?;
        debug!(tree = %id, role = ?role, parent = ?parent, depth = self.tracker.depth(), "Registered query tree");
        Ok(id)
    }

    fn close_tree(&mut self, tree: TreeId) -> SemanticResult<()> {
        self.tracker.pop();
        self.transition(tree, TreeState::Deregistered)
    }

    pub(crate) fn transition(&mut self, tree: TreeId, next: TreeState) -> SemanticResult<()> {
        self.graph.tree_mut(tree).advance(next)?;
        trace!(tree = %tree, state = %next, "Query tree transition");
        Ok(())
    }

    fn build_select_block(
        &mut self,
        tree: TreeId,
        block: &SelectBlock,
        order_by: &[OrderByItem],
    ) -> SemanticResult<()> {
        self.graph.tree_mut(tree).distinct = matches!(
            block.quantifier,
            Some(SetQuantifier::Distinct | SetQuantifier::Unique)
        );

        if let Some(into) = &block.into {
            if !self.graph.tree(tree).is_top() {
                return Err(SemanticError::IntoNotAllowed);
            }
            let table = self.idents.normalize(&into.table);
            self.graph.tree_mut(tree).into = Some(IntoTable {
                table,
                temporary: into.temporary,
            });
        }
        // The raw select items are taken as written; their expressions are
        // built once FROM is bound.
        self.transition(tree, TreeState::ProjectionCollected)?;

        self.build_from(tree, &block.from)?;
        self.transition(tree, TreeState::FromBound)?;

        // Select-list subqueries need the FROM relations to correlate with.
        self.build_projection(tree, &block.projection)?;
        self.expand_wildcards(tree)?;
        self.transition(tree, TreeState::WildcardsExpanded)?;

        let projection = self.graph.tree(tree).projection.clone();
        self.bind_expressions(tree, &projection)?;
        self.transition(tree, TreeState::ColumnsBound)?;

        self.bind_where(tree, block.where_clause.as_ref())?;
        self.transition(tree, TreeState::WhereBound)?;

        self.bind_group_by(tree, &block.group_by)?;
        self.bind_having(tree, block.having.as_ref())?;
        self.bind_order_by(tree, order_by)?;
        self.validate_grouping(tree)?;
        self.transition(tree, TreeState::GroupByBound)?;

        self.fill_types(tree)?;
        self.transition(tree, TreeState::TypesFilled)?;

        self.flag_aggregate(tree);
        self.transition(tree, TreeState::AggregateFlagged)?;

        self.rebuild_text(tree);
        self.manage_from_subquery(tree)
    }

    fn build_projection(&mut self, tree: TreeId, items: &[SelectItem]) -> SemanticResult<()> {
        let mut projection = Vec::with_capacity(items.len());
        for item in items {
            let id = match item {
                SelectItem::Wildcard => self.add_expression(tree, ExprKind::ColumnList(None)),
                SelectItem::QualifiedWildcard(qualifier) => {
                    let qualifier = self.idents.normalize(qualifier);
                    self.add_expression(tree, ExprKind::ColumnList(Some(qualifier)))
                }
                SelectItem::Expr { expr, alias } => {
                    let id = self.build_value_expr(tree, expr)?;
                    match alias {
                        Some(alias) => {
                            let alias = self.idents.normalize(alias);
                            self.graph.expression_mut(id).set_alias(alias);
                        }
                        None => {
                            let name = self.default_output_name(id);
                            self.graph.expression_mut(id).set_outer_alias(name);
                        }
                    }
                    id
                }
            };
            projection.push(id);
        }
        self.graph.tree_mut(tree).projection = projection;
        Ok(())
    }

    /// Output name of an unaliased select-list item
    fn default_output_name(&mut self, id: ExprId) -> String {
        match &self.graph.expression(id).kind {
            ExprKind::Column(column) => column.column_name.clone(),
            ExprKind::Function(function) => function.name.to_lowercase(),
            _ => self.next_alias("expr"),
        }
    }

    fn flag_aggregate(&mut self, tree: TreeId) {
        let query_tree = self.graph.tree(tree);
        let mut roots: Vec<ExprId> = query_tree.projection.clone();
        roots.extend(query_tree.order_by.iter().map(|entry| entry.expr));
        for condition in &query_tree.having {
            roots.extend(self.graph.condition_expressions(*condition));
        }

        let aggregate = !query_tree.group_by.is_empty()
            || roots.iter().any(|root| self.graph.contains_aggregate(*root));
        self.graph.tree_mut(tree).aggregate = aggregate;
        if aggregate {
            debug!(tree = %tree, "Aggregate query");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use sqlgrid_catalog::StaticCatalog;
    use sqlgrid_function_registry::FunctionRegistry;
    use sqlgrid_ir::{
        ColumnMetadata, IntoTarget, TableMetadata, TableReference, TypeDescriptor, TypeKind,
        UnionType, ValueExpr,
    };

    fn catalog() -> StaticCatalog {
        StaticCatalog::new().with_table(TableMetadata::new("t").with_columns(vec![
            ColumnMetadata::new("a", TypeDescriptor::new(TypeKind::Integer)),
            ColumnMetadata::new("b", TypeDescriptor::new(TypeKind::Text)),
        ]))
    }

    fn build(query: &Query) -> (SemanticResult<TreeId>, crate::graph::QueryGraph) {
        let catalog = catalog();
        let registry = FunctionRegistry::new();
        let config = AnalyzerConfig::default();
        let mut ctx = AnalysisContext::new(&catalog, None, &registry, &config);
        let result = ctx.build_query(query, SubqueryRole::None, None);
        (result, ctx.into_graph())
    }

    fn select_from_t(items: Vec<SelectItem>) -> SelectBlock {
        SelectBlock::new(items).with_from(vec![TableReference::table("t")])
    }

    #[test]
    fn test_tree_reaches_deregistered() {
        let query = Query::new(select_from_t(vec![SelectItem::Wildcard]));
        let (result, graph) = build(&query);
        let tree = graph.tree(result.unwrap());
        assert_eq!(tree.state, TreeState::Deregistered);
        assert_eq!(tree.projection.len(), 2);
        assert!(tree.is_top());
    }

    #[test]
    fn test_default_output_names() {
        let query = Query::new(select_from_t(vec![
            SelectItem::expr(ValueExpr::column("a")),
            SelectItem::aliased(ValueExpr::column("b"), "B_Alias"),
        ]));
        let (result, graph) = build(&query);
        let tree = graph.tree(result.unwrap());
        let names: Vec<_> = tree
            .projection
            .iter()
            .map(|id| graph.expression(*id).alias().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b_alias"]);
        assert!(!graph.expression(tree.projection[0]).has_explicit_alias());
    }

    #[test]
    fn test_union_branches_share_parent_and_width() {
        let query = Query::new(select_from_t(vec![SelectItem::expr(ValueExpr::column("a"))]))
            .with_union(
                UnionType::UnionAll,
                select_from_t(vec![SelectItem::expr(ValueExpr::column("a"))]),
            );
        let (result, graph) = build(&query);
        let root = result.unwrap();
        let branches = &graph.tree(root).union_branches;
        assert_eq!(branches.len(), 1);
        let branch = graph.tree(branches[0]);
        assert_eq!(branch.role, SubqueryRole::UnionBranch);
        assert_eq!(branch.union_type, Some(UnionType::UnionAll));
        assert_eq!(branch.parent, None);
        assert_eq!(branch.top, root);
    }

    #[test]
    fn test_union_width_mismatch() {
        let query = Query::new(select_from_t(vec![SelectItem::Wildcard])).with_union(
            UnionType::Union,
            select_from_t(vec![SelectItem::expr(ValueExpr::column("a"))]),
        );
        let (result, _) = build(&query);
        assert_eq!(
            result,
            Err(SemanticError::UnionColumnCountMismatch { left: 2, right: 1 })
        );
    }

    #[test]
    fn test_into_on_top_level_only() {
        let mut block = select_from_t(vec![SelectItem::Wildcard]);
        block.into = Some(IntoTarget {
            table: sqlgrid_ir::Identifier::new("copy"),
            temporary: true,
        });
        let (result, graph) = build(&Query::new(block.clone()));
        let into = graph.tree(result.unwrap()).into.clone();
        assert_eq!(
            into,
            Some(IntoTable {
                table: "copy".to_string(),
                temporary: true
            })
        );

        let catalog = catalog();
        let registry = FunctionRegistry::new();
        let config = AnalyzerConfig::default();
        let mut ctx = AnalysisContext::new(&catalog, None, &registry, &config);
        assert_eq!(
            ctx.build_query(&Query::new(block), SubqueryRole::Derived, None),
            Err(SemanticError::IntoNotAllowed)
        );
    }

    #[test]
    fn test_nesting_limit_applies_to_subqueries() {
        let catalog = catalog();
        let registry = FunctionRegistry::new();
        let config = AnalyzerConfig::default().with_max_nesting_depth(1);
        let mut ctx = AnalysisContext::new(&catalog, None, &registry, &config);

        let inner = Query::new(select_from_t(vec![SelectItem::expr(ValueExpr::column("a"))]));
        let outer = Query::new(select_from_t(vec![SelectItem::expr(ValueExpr::from_primary(
            sqlgrid_ir::Primary::Subquery(Box::new(inner)),
        ))]));
        assert_eq!(
            ctx.build_query(&outer, SubqueryRole::None, None),
            Err(SemanticError::NestingTooDeep { limit: 1 })
        );
    }
}
