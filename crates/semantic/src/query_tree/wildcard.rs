// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `*` and `t.*` expansion

use tracing::trace;

use crate::context::AnalysisContext;
use crate::error::{SemanticError, SemanticResult};
use crate::expr::{AttributeColumn, ExprKind};
use crate::graph::{ExprId, RelId, TreeId};

impl AnalysisContext<'_> {
    /// Replace every wildcard in the projection with qualified column
    /// references, in FROM order
    pub(crate) fn expand_wildcards(&mut self, tree: TreeId) -> SemanticResult<()> {
        let projection = self.graph.tree(tree).projection.clone();
        let mut expanded = Vec::with_capacity(projection.len());
        for item in projection {
            let qualifier = match &self.graph.expression(item).kind {
                ExprKind::ColumnList(qualifier) => qualifier.clone(),
                _ => {
                    expanded.push(item);
                    continue;
                }
            };
            let columns = self.expand_column_list(tree, qualifier.as_deref())?;
            expanded.extend(columns);
        }
        self.graph.tree_mut(tree).projection = expanded;
        Ok(())
    }

    fn expand_column_list(
        &mut self,
        tree: TreeId,
        qualifier: Option<&str>,
    ) -> SemanticResult<Vec<ExprId>> {
        let sources: Vec<RelId> = self
            .graph
            .tree(tree)
            .relations
            .iter()
            .copied()
            .filter(|id| self.graph.relation(*id).is_column_source())
            .collect();
        if sources.is_empty() {
            return Err(SemanticError::WildcardWithoutFrom);
        }

        let targets = match qualifier {
            None => sources,
            Some(qualifier) => {
                let mut matches: Vec<RelId> = sources
                    .iter()
                    .copied()
                    .filter(|id| self.graph.relation(*id).alias == qualifier)
                    .collect();
                if matches.is_empty() {
                    matches = sources
                        .iter()
                        .copied()
                        .filter(|id| self.graph.relation(*id).table_name == qualifier)
                        .collect();
                }
                match matches.len() {
                    0 => return Err(SemanticError::WildcardTableNotFound(qualifier.to_string())),
                    1 => matches,
                    _ => return Err(SemanticError::AmbiguousWildcard(qualifier.to_string())),
                }
            }
        };

        let mut columns = Vec::new();
        for relation in targets {
            let node = self.graph.relation(relation);
            let alias = node.alias.clone();
            for name in node.wildcard_columns() {
                let column = AttributeColumn::new(tree, Some(alias.clone()), name.clone());
                let id = self.add_expression(tree, ExprKind::Column(column));
                self.graph.expression_mut(id).set_outer_alias(name);
                columns.push(id);
            }
            trace!(tree = %tree, relation = %alias, "Expanded wildcard");
        }
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::query_tree::{QueryTree, SubqueryRole};
    use sqlgrid_catalog::StaticCatalog;
    use sqlgrid_function_registry::FunctionRegistry;
    use sqlgrid_ir::{ColumnMetadata, TableMetadata, TableReference, TypeDescriptor, TypeKind};

    fn catalog() -> StaticCatalog {
        let int = || TypeDescriptor::new(TypeKind::Integer);
        StaticCatalog::new()
            .with_table(TableMetadata::new("a").with_columns(vec![
                ColumnMetadata::new("ctid", int()).with_row_id(),
                ColumnMetadata::new("x", int()),
                ColumnMetadata::new("y", int()),
            ]))
            .with_table(
                TableMetadata::new("b").with_columns(vec![ColumnMetadata::new("z", int())]),
            )
    }

    fn expand(
        from: Vec<TableReference>,
        qualifier: Option<&str>,
    ) -> SemanticResult<Vec<(String, String)>> {
        let catalog = catalog();
        let registry = FunctionRegistry::new();
        let config = AnalyzerConfig::default();
        let mut ctx = AnalysisContext::new(&catalog, None, &registry, &config);
        let tree = ctx
            .graph
            .add_tree(QueryTree::new(SubqueryRole::None, None, TreeId(0)));
        ctx.build_from(tree, &from)?;
        let star = ctx.add_expression(tree, ExprKind::ColumnList(qualifier.map(String::from)));
        ctx.graph.tree_mut(tree).projection = vec![star];
        ctx.expand_wildcards(tree)?;

        Ok(ctx
            .graph
            .tree(tree)
            .projection
            .iter()
            .filter_map(|id| ctx.graph.expression(*id).as_column())
            .map(|c| (c.table_alias.clone(), c.column_name.clone()))
            .collect())
    }

    fn pair(table: &str, column: &str) -> (String, String) {
        (table.to_string(), column.to_string())
    }

    #[test]
    fn test_star_expands_in_from_order_without_row_id() {
        let columns = expand(
            vec![TableReference::table("a"), TableReference::table("b")],
            None,
        )
        .unwrap();
        assert_eq!(columns, vec![pair("a", "x"), pair("a", "y"), pair("b", "z")]);
    }

    #[test]
    fn test_qualified_star() {
        let columns = expand(
            vec![TableReference::table("a"), TableReference::table("b")],
            Some("b"),
        )
        .unwrap();
        assert_eq!(columns, vec![pair("b", "z")]);
    }

    #[test]
    fn test_unknown_qualifier() {
        assert_eq!(
            expand(vec![TableReference::table("a")], Some("q")),
            Err(SemanticError::WildcardTableNotFound("q".to_string()))
        );
    }

    #[test]
    fn test_star_without_from() {
        assert_eq!(expand(vec![], None), Err(SemanticError::WildcardWithoutFrom));
    }
}
