// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! Construction of [`QueryCondition`](super::QueryCondition) trees
//!
//! A relational expression pushes its left operand on the context's operand
//! stack and the tail pops it, so a tail without a pending operand surfaces
//! as [`SemanticError::ImbalancedExpressionStack`].

use sqlgrid_ir::{
    AndSequence, CompareOp, CompareRight, InSource, LogicalPrimary, Operand, RelationalExpr,
    RelationalTail, SearchCondition, UnaryLogical, ValueExpr,
};
use tracing::debug;

use crate::condition::{
    CompositeClause, ConditionKind, ConditionOrigin, InList, LogicalOp, PatternMatch,
    QueryCondition,
};
use crate::context::AnalysisContext;
use crate::error::{SemanticError, SemanticResult};
use crate::expr::ExprKind;
use crate::graph::{CondId, ExprId, TreeId};
use crate::query_tree::SubqueryRole;

impl AnalysisContext<'_> {
    /// Build an OR-of-ANDs condition owned by `tree`
    pub(crate) fn build_search_condition(
        &mut self,
        tree: TreeId,
        condition: &SearchCondition,
        origin: ConditionOrigin,
    ) -> SemanticResult<CondId> {
        let mut disjuncts = condition.disjuncts.iter();
        let first = disjuncts
            .next()
            .ok_or(SemanticError::ImbalancedExpressionStack)?;
        let mut accumulator = self.build_and_sequence(tree, first, origin)?;
        for sequence in disjuncts {
            let right = self.build_and_sequence(tree, sequence, origin)?;
            accumulator = self.logical(tree, LogicalOp::Or, accumulator, right, origin);
        }
        Ok(accumulator)
    }

    fn build_and_sequence(
        &mut self,
        tree: TreeId,
        sequence: &AndSequence,
        origin: ConditionOrigin,
    ) -> SemanticResult<CondId> {
        let mut conjuncts = sequence.conjuncts.iter();
        let first = conjuncts
            .next()
            .ok_or(SemanticError::ImbalancedExpressionStack)?;
        let mut accumulator = self.build_unary_logical(tree, first, origin)?;
        for conjunct in conjuncts {
            let right = self.build_unary_logical(tree, conjunct, origin)?;
            accumulator = self.logical(tree, LogicalOp::And, accumulator, right, origin);
        }
        Ok(accumulator)
    }

    fn build_unary_logical(
        &mut self,
        tree: TreeId,
        unary: &UnaryLogical,
        origin: ConditionOrigin,
    ) -> SemanticResult<CondId> {
        let id = self.build_logical_primary(tree, &unary.primary, origin)?;
        if unary.negated {
            let condition = self.graph.condition_mut(id);
            condition.positive = !condition.positive;
        }
        Ok(id)
    }

    fn build_logical_primary(
        &mut self,
        tree: TreeId,
        primary: &LogicalPrimary,
        origin: ConditionOrigin,
    ) -> SemanticResult<CondId> {
        match primary {
            // TRUE => 1 = 1, FALSE => 1 <> 1
            LogicalPrimary::Boolean(value) => {
                let left = self.integer_constant(tree, 1);
                let right = self.integer_constant(tree, 1);
                let op = if *value { CompareOp::Eq } else { CompareOp::NotEq };
                let kind = ConditionKind::RelOp {
                    op,
                    left,
                    right,
                    quantifier: None,
                };
                Ok(self.new_condition(tree, kind, origin, true))
            }
            LogicalPrimary::Exists(query) => {
                let subquery = self.build_subquery_expression(tree, query, SubqueryRole::Exists)?;
                let kind = ConditionKind::Composite(CompositeClause::Exists { subquery });
                Ok(self.new_condition(tree, kind, origin, true))
            }
            LogicalPrimary::Nested(inner) => self.build_search_condition(tree, inner, origin),
            LogicalPrimary::Relational(relational) => {
                self.build_relational(tree, relational, origin)
            }
        }
    }

    fn build_relational(
        &mut self,
        tree: TreeId,
        relational: &RelationalExpr,
        origin: ConditionOrigin,
    ) -> SemanticResult<CondId> {
        let left = match &relational.left {
            Operand::Single(expr) => self.build_value_expr(tree, expr)?,
            Operand::List(items) => self.build_list(tree, items)?,
        };
        self.push_operand(left);

        let Some(tail) = &relational.tail else {
            let expr = self.pop_operand()?;
            return Ok(self.new_condition(tree, ConditionKind::SqlExpr(expr), origin, true));
        };

        let (kind, positive) = match tail {
            RelationalTail::Compare { op, right } => {
                let (right, quantifier) = match right {
                    CompareRight::Expr(expr) => (self.build_value_expr(tree, expr)?, None),
                    CompareRight::List(items) => (self.build_list(tree, items)?, None),
                    CompareRight::Subquery { quantifier, query } => {
                        let role = if quantifier.is_some() {
                            SubqueryRole::NonScalar
                        } else {
                            SubqueryRole::Scalar
                        };
                        let subquery = self.build_subquery_expression(tree, query, role)?;
                        if quantifier.is_some() {
                            self.check_subquery_width(subquery, self.row_width(left))?;
                        }
                        (subquery, *quantifier)
                    }
                };
                let left = self.pop_operand()?;
                let kind = ConditionKind::RelOp {
                    op: *op,
                    left,
                    right,
                    quantifier,
                };
                (kind, true)
            }
            RelationalTail::In { negated, source } => {
                let list = match source {
                    InSource::Subquery(query) => {
                        let subquery =
                            self.build_subquery_expression(tree, query, SubqueryRole::NonScalar)?;
                        self.check_subquery_width(subquery, self.row_width(left))?;
                        InList::Subquery(subquery)
                    }
                    InSource::List(items) => InList::Values(self.build_values(tree, items)?),
                };
                let expr = self.pop_operand()?;
                (
                    ConditionKind::Composite(CompositeClause::In { expr, list }),
                    !negated,
                )
            }
            RelationalTail::Between { negated, low, high } => {
                let low = self.build_value_expr(tree, low)?;
                let high = self.build_value_expr(tree, high)?;
                let expr = self.pop_operand()?;
                (
                    ConditionKind::Composite(CompositeClause::Between { expr, low, high }),
                    !negated,
                )
            }
            RelationalTail::Like {
                negated,
                kind,
                pattern,
                escape,
            } => {
                let pattern = self.build_value_expr(tree, pattern)?;
                let escape = match escape {
                    Some(escape) => Some(self.build_value_expr(tree, escape)?),
                    None => None,
                };
                let expr = self.pop_operand()?;
                let clause = CompositeClause::Pattern {
                    expr,
                    matcher: PatternMatch::Like(*kind),
                    pattern,
                    escape,
                };
                (ConditionKind::Composite(clause), !negated)
            }
            RelationalTail::RegexMatch { op, pattern } => {
                let pattern = self.build_value_expr(tree, pattern)?;
                let expr = self.pop_operand()?;
                let clause = CompositeClause::Pattern {
                    expr,
                    matcher: PatternMatch::Regex(*op),
                    pattern,
                    escape: None,
                };
                (ConditionKind::Composite(clause), true)
            }
            RelationalTail::IsNull { negated } => {
                let expr = self.pop_operand()?;
                (
                    ConditionKind::Composite(CompositeClause::NullCheck { expr }),
                    !negated,
                )
            }
            RelationalTail::IsBoolean { negated, value } => {
                let expr = self.pop_operand()?;
                let clause = CompositeClause::BooleanCheck {
                    expr,
                    value: *value,
                };
                (ConditionKind::Composite(clause), !negated)
            }
        };
        Ok(self.new_condition(tree, kind, origin, positive))
    }

    fn build_list(&mut self, tree: TreeId, items: &[ValueExpr]) -> SemanticResult<ExprId> {
        let values = self.build_values(tree, items)?;
        Ok(self.add_expression(tree, ExprKind::List(values)))
    }

    fn build_values(&mut self, tree: TreeId, items: &[ValueExpr]) -> SemanticResult<Vec<ExprId>> {
        items
            .iter()
            .map(|item| self.build_value_expr(tree, item))
            .collect()
    }

    fn row_width(&self, expr: ExprId) -> usize {
        match &self.graph.expression(expr).kind {
            ExprKind::List(items) => items.len(),
            _ => 1,
        }
    }

    fn check_subquery_width(&self, subquery: ExprId, expected: usize) -> SemanticResult<()> {
        let ExprKind::Subquery(subtree) = self.graph.expression(subquery).kind else {
            return Err(SemanticError::MissingSubqueryTree);
        };
        let found = self.graph.tree(subtree).projection.len();
        if found != expected {
            return Err(SemanticError::SubqueryColumnCount { expected, found });
        }
        Ok(())
    }

    pub(crate) fn logical(
        &mut self,
        tree: TreeId,
        op: LogicalOp,
        left: CondId,
        right: CondId,
        origin: ConditionOrigin,
    ) -> CondId {
        self.new_condition(tree, ConditionKind::Logical { op, left, right }, origin, true)
    }

    /// Add a condition node and link its children and columns back to it
    pub(crate) fn new_condition(
        &mut self,
        tree: TreeId,
        kind: ConditionKind,
        origin: ConditionOrigin,
        positive: bool,
    ) -> CondId {
        let mut condition = QueryCondition::new(tree, kind, origin);
        condition.positive = positive;
        let children = condition.children();
        let exprs = condition.expressions();
        condition.has_outer_join_marker = children
            .iter()
            .any(|child| self.graph.condition(*child).has_outer_join_marker)
            || exprs.iter().any(|expr| self.has_outer_join_marker(*expr));

        let id = self.graph.add_condition(condition);
        for child in children {
            self.graph.condition_mut(child).parent = Some(id);
        }
        for expr in exprs {
            for column in self.graph.expression_columns(expr) {
                if let Some(attribute) = self.graph.expression_mut(column).as_column_mut() {
                    attribute.parent_condition.get_or_insert(id);
                }
            }
        }
        id
    }

    fn has_outer_join_marker(&self, expr: ExprId) -> bool {
        self.graph.expression_columns(expr).into_iter().any(|column| {
            self.graph
                .expression(column)
                .as_column()
                .is_some_and(|attribute| attribute.outer_join_marker)
        })
    }

    /// Sort the top-level conjuncts of a WHERE condition into the legacy
    /// `(+)` side lists of the tree
    ///
    /// # Errors
    ///
    /// A marker is only accepted on a plain comparison that is a top-level
    /// conjunct of WHERE, and only when the configuration allows it.
    pub(crate) fn collect_legacy_outer_joins(
        &mut self,
        tree: TreeId,
        root: CondId,
    ) -> SemanticResult<()> {
        if !self.graph.condition(root).has_outer_join_marker {
            return Ok(());
        }
        if !self.config.allow_legacy_outer_join {
            return Err(SemanticError::Unsupported(
                "legacy (+) outer join marker".to_string(),
            ));
        }

        let mut handle_left_outer_needed = false;
        let mut outer = Vec::new();
        let mut inner = Vec::new();
        for conjunct in self.graph.conjuncts(root) {
            let condition = self.graph.condition(conjunct);
            if !condition.has_outer_join_marker {
                inner.push(conjunct);
                continue;
            }
            let plain_comparison =
                matches!(condition.kind, ConditionKind::RelOp { quantifier: None, .. });
            if !plain_comparison || !condition.positive {
                return Err(SemanticError::Unsupported(
                    "(+) marker outside a top-level comparison".to_string(),
                ));
            }
            handle_left_outer_needed = true;
            outer.push(conjunct);
        }
        let handle_inner_join_needed = handle_left_outer_needed && !inner.is_empty();
        debug!(
            tree = %tree,
            outer = outer.len(),
            inner = inner.len(),
            "Collected legacy outer join conjuncts"
        );

        let query_tree = self.graph.tree_mut(tree);
        query_tree.legacy_outer_conditions = outer;
        if handle_inner_join_needed {
            query_tree.legacy_inner_conditions = inner;
        }
        Ok(())
    }

    /// Reject `(+)` anywhere but WHERE
    pub(crate) fn reject_outer_join_marker(&self, root: CondId) -> SemanticResult<()> {
        if self.graph.condition(root).has_outer_join_marker {
            return Err(SemanticError::Unsupported(
                "(+) marker outside WHERE".to_string(),
            ));
        }
        Ok(())
    }
}
