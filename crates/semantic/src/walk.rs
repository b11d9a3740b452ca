// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! Traversals over expressions and conditions of one query tree
//!
//! None of these descend into subquery trees: a subquery binds its own
//! columns.

use crate::condition::QueryCondition;
use crate::expr::ExprKind;
use crate::graph::{CondId, ExprId, QueryGraph, TreeId};

impl QueryGraph {
    /// Column references under `root`, including searched CASE conditions
    pub fn expression_columns(&self, root: ExprId) -> Vec<ExprId> {
        let mut columns = Vec::new();
        self.walk_expression(root, &mut |graph, id| {
            if graph.expression(id).as_column().is_some() {
                columns.push(id);
            }
        });
        columns
    }

    /// Column references under a condition
    pub fn condition_columns(&self, root: CondId) -> Vec<ExprId> {
        let mut columns = Vec::new();
        for expr in self.condition_expressions(root) {
            columns.extend(self.expression_columns(expr));
        }
        columns
    }

    /// Expressions read by a condition and all its descendants
    pub fn condition_expressions(&self, root: CondId) -> Vec<ExprId> {
        let mut exprs = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let condition = self.condition(id);
            exprs.extend(condition.expressions());
            let mut children = condition.children();
            children.reverse();
            stack.extend(children);
        }
        exprs
    }

    /// Every condition node under `root` (itself included) that `matches`
    /// accepts, in pre-order
    pub fn find_conditions(
        &self,
        root: CondId,
        matches: impl Fn(&QueryCondition) -> bool,
    ) -> Vec<CondId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let condition = self.condition(id);
            if matches(condition) {
                found.push(id);
            }
            let mut children = condition.children();
            children.reverse();
            stack.extend(children);
        }
        found
    }

    /// Subquery trees referenced directly under `root`
    pub fn expression_subqueries(&self, root: ExprId) -> Vec<TreeId> {
        let mut trees = Vec::new();
        self.walk_expression(root, &mut |graph, id| {
            if let ExprKind::Subquery(tree) = graph.expression(id).kind {
                trees.push(tree);
            }
        });
        trees
    }

    /// Whether an aggregate call appears under `root`
    pub fn contains_aggregate(&self, root: ExprId) -> bool {
        let mut found = false;
        self.walk_expression(root, &mut |graph, id| {
            found |= graph.expression(id).is_aggregate_call();
        });
        found
    }

    /// Pre-order visit of `root` and every expression below it
    pub fn walk_expression(&self, root: ExprId, visit: &mut dyn FnMut(&QueryGraph, ExprId)) {
        visit(self, root);
        let expression = self.expression(root);
        if let ExprKind::Condition(condition) = expression.kind {
            for expr in self.condition_expressions(condition) {
                self.walk_expression(expr, visit);
            }
            return;
        }
        for child in expression.children() {
            self.walk_expression(child, visit);
        }
    }
}
