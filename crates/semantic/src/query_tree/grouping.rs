// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! GROUP BY, HAVING and ORDER BY binding
//!
//! Integer ordinals in GROUP BY and ORDER BY are replaced by the projection
//! entry they name, by identity. A bare ORDER BY name matches a projection
//! alias before any relation column; inside GROUP BY and HAVING, relation
//! columns win and projection aliases are the fallback.

use sqlgrid_ir::{LiteralKind, OrderByItem, Primary, SearchCondition, ValueExpr};

use crate::condition::ConditionOrigin;
use crate::context::AnalysisContext;
use crate::error::{SemanticError, SemanticResult};
use crate::expr::{ColumnGenre, ExprKind};
use crate::graph::{ExprId, TreeId};
use crate::query_tree::OrderByEntry;
use crate::query_tree::binding::ColumnBinding;

impl AnalysisContext<'_> {
    pub(crate) fn bind_group_by(&mut self, tree: TreeId, items: &[ValueExpr]) -> SemanticResult<()> {
        let mut group_by = Vec::with_capacity(items.len());
        for item in items {
            let id = match self.ordinal(tree, item, "GROUP BY")? {
                Some(entry) => entry,
                None => {
                    let id = self.build_value_expr(tree, item)?;
                    self.bind_grouping_columns(tree, id)?;
                    id
                }
            };
            group_by.push(id);
        }
        self.graph.tree_mut(tree).group_by = group_by;
        Ok(())
    }

    pub(crate) fn bind_having(
        &mut self,
        tree: TreeId,
        clause: Option<&SearchCondition>,
    ) -> SemanticResult<()> {
        let Some(clause) = clause else {
            return Ok(());
        };
        let root = self.build_search_condition(tree, clause, ConditionOrigin::Having)?;
        self.reject_outer_join_marker(root)?;
        for expr in self.graph.condition_expressions(root) {
            self.bind_grouping_columns(tree, expr)?;
        }
        let conjuncts = self.graph.conjuncts(root);
        self.graph.tree_mut(tree).having = conjuncts;
        Ok(())
    }

    pub(crate) fn bind_order_by(&mut self, tree: TreeId, items: &[OrderByItem]) -> SemanticResult<()> {
        let mut order_by = Vec::with_capacity(items.len());
        for item in items {
            let expr = match self.ordinal(tree, &item.expr, "ORDER BY")? {
                Some(entry) => entry,
                None => match self.projection_alias_reference(tree, &item.expr) {
                    Some(entry) => entry,
                    None => {
                        let id = self.build_value_expr(tree, &item.expr)?;
                        self.bind_expressions(tree, &[id])?;
                        id
                    }
                },
            };
            order_by.push(OrderByEntry {
                expr,
                direction: item.direction,
                nulls: item.nulls,
            });
        }
        self.graph.tree_mut(tree).order_by = order_by;
        Ok(())
    }

    /// Projection entry named by an integer ordinal, if `item` is one
    fn ordinal(
        &self,
        tree: TreeId,
        item: &ValueExpr,
        clause: &'static str,
    ) -> SemanticResult<Option<ExprId>> {
        let Some(literal) = item.as_literal() else {
            return Ok(None);
        };
        if literal.kind != LiteralKind::Integer {
            return Ok(None);
        }
        let position: i64 = literal
            .text
            .parse()
            .map_err(|_| SemanticError::MalformedLiteral(literal.text.clone()))?;

        let projection = &self.graph.tree(tree).projection;
        if position < 1 || position as usize > projection.len() {
            return Err(SemanticError::PositionOutOfRange {
                clause,
                position,
                max: projection.len(),
            });
        }
        Ok(Some(projection[position as usize - 1]))
    }

    /// First projection entry whose alias is the bare name `item`
    fn projection_alias_reference(&self, tree: TreeId, item: &ValueExpr) -> Option<ExprId> {
        let Some(Primary::Column(column)) = item.as_primary() else {
            return None;
        };
        if column.qualifier.is_some() {
            return None;
        }
        let name = self.idents.normalize(&column.name);
        self.graph
            .tree(tree)
            .projection
            .iter()
            .copied()
            .find(|id| self.graph.expression(*id).alias() == Some(name.as_str()))
    }

    /// Bind columns of a GROUP BY or HAVING expression: relation columns
    /// first, then projection aliases, then enclosing queries
    fn bind_grouping_columns(&mut self, tree: TreeId, root: ExprId) -> SemanticResult<()> {
        for column in self.graph.expression_columns(root) {
            let Some(attribute) = self.graph.expression(column).as_column() else {
                continue;
            };
            if attribute.is_bound() {
                continue;
            }
            let qualifier = attribute.qualifier().map(str::to_string);
            let name = attribute.column_name.clone();

            if let ColumnBinding::Bound(relation) =
                self.resolve_in_tree(tree, qualifier.as_deref(), &name)?
            {
                self.attach_column(column, relation);
                continue;
            }

            let alias_target = if qualifier.is_none() {
                self.graph
                    .tree(tree)
                    .projection
                    .iter()
                    .copied()
                    .find(|id| self.graph.expression(*id).alias() == Some(name.as_str()))
            } else {
                None
            };
            match alias_target {
                Some(target) => {
                    let expression = self.graph.expression_mut(column);
                    expression.mapped_from = Some(target);
                    if let Some(attribute) = expression.as_column_mut() {
                        attribute.genre.insert(ColumnGenre::MAPPED);
                    }
                }
                None => self.bind_column(tree, column)?,
            }
        }
        Ok(())
    }

    /// Every column read outside an aggregate must be grouped
    ///
    /// Without GROUP BY this only applies when an aggregate is present.
    /// Columns bound to enclosing queries are constants here.
    pub(crate) fn validate_grouping(&self, tree: TreeId) -> SemanticResult<()> {
        let query_tree = self.graph.tree(tree);
        let mut roots: Vec<ExprId> = query_tree.projection.clone();
        for condition in &query_tree.having {
            roots.extend(self.graph.condition_expressions(*condition));
        }
        roots.extend(query_tree.order_by.iter().map(|entry| entry.expr));

        if query_tree.group_by.is_empty()
            && !roots.iter().any(|root| self.graph.contains_aggregate(*root))
        {
            return Ok(());
        }

        let renderer = self.renderer();
        let grouped: Vec<String> = query_tree
            .group_by
            .iter()
            .map(|id| {
                let target = self.graph.expression(*id).mapped_from.unwrap_or(*id);
                renderer.expr(target)
            })
            .collect();

        for root in roots {
            if let Some(column) = self.ungrouped_column(root, &grouped) {
                return Err(SemanticError::GroupByRequired(column));
            }
        }
        Ok(())
    }

    fn ungrouped_column(&self, id: ExprId, grouped: &[String]) -> Option<String> {
        let expression = self.graph.expression(id);
        if expression.is_aggregate_call() {
            return None;
        }
        if grouped.contains(&self.renderer().expr(id)) {
            return None;
        }
        match &expression.kind {
            ExprKind::Column(column) => {
                if column.is_orphan() {
                    return None;
                }
                if column.genre.contains(ColumnGenre::MAPPED) && !column.is_bound() {
                    if let Some(target) = expression.mapped_from {
                        return self.ungrouped_column(target, grouped);
                    }
                }
                Some(match column.qualifier() {
                    Some(qualifier) => format!("{}.{}", qualifier, column.column_name),
                    None => column.column_name.clone(),
                })
            }
            ExprKind::Condition(condition) => self
                .graph
                .condition_expressions(*condition)
                .into_iter()
                .find_map(|expr| self.ungrouped_column(expr, grouped)),
            _ => expression
                .children()
                .into_iter()
                .find_map(|child| self.ungrouped_column(child, grouped)),
        }
    }
}
