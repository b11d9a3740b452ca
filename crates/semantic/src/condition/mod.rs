// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Predicate tree
//!
//! [`QueryCondition`] nodes form the boolean side of a query: AND/OR trees
//! over comparisons, composite clauses (BETWEEN, IN, LIKE, EXISTS, ...) and
//! bare boolean expressions. NOT is carried by the `positive` flag.
//!
//! The set of relations a condition touches is computed once and cached on
//! the node; join classification reads it from there.

pub mod builder;

use serde::Serialize;
use sqlgrid_ir::{CompareOp, PatternKind, RegexOp, SubqueryQuantifier, TruthValue};

use crate::expr::ExprKind;
use crate::graph::{CondId, ExprId, QueryGraph, RelId, TreeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

/// Pattern operators of the LIKE family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PatternMatch {
    Like(PatternKind),
    Regex(RegexOp),
}

/// Right-hand side of IN
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InList {
    Values(Vec<ExprId>),
    /// Subquery expression
    Subquery(ExprId),
}

/// Predicates with their own syntax
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CompositeClause {
    Between {
        expr: ExprId,
        low: ExprId,
        high: ExprId,
    },
    In {
        expr: ExprId,
        list: InList,
    },
    Pattern {
        expr: ExprId,
        matcher: PatternMatch,
        pattern: ExprId,
        escape: Option<ExprId>,
    },
    Exists {
        subquery: ExprId,
    },
    NullCheck {
        expr: ExprId,
    },
    BooleanCheck {
        expr: ExprId,
        value: TruthValue,
    },
}

impl CompositeClause {
    /// Expressions the clause reads, in source order
    pub fn expressions(&self) -> Vec<ExprId> {
        match self {
            CompositeClause::Between { expr, low, high } => vec![*expr, *low, *high],
            CompositeClause::In { expr, list } => {
                let mut exprs = vec![*expr];
                match list {
                    InList::Values(values) => exprs.extend(values.iter().copied()),
                    InList::Subquery(subquery) => exprs.push(*subquery),
                }
                exprs
            }
            CompositeClause::Pattern {
                expr,
                pattern,
                escape,
                ..
            } => {
                let mut exprs = vec![*expr, *pattern];
                exprs.extend(*escape);
                exprs
            }
            CompositeClause::Exists { subquery } => vec![*subquery],
            CompositeClause::NullCheck { expr } | CompositeClause::BooleanCheck { expr, .. } => {
                vec![*expr]
            }
        }
    }

    /// Whether the clause reads two or more relations of `tree`
    ///
    /// Relations of enclosing trees are constants at this level and do not
    /// count.
    pub fn leads_to_join_condition(&self, graph: &QueryGraph, tree: TreeId) -> bool {
        let mut relations = Vec::new();
        for expr in self.expressions() {
            graph.collect_expression_relations(tree, expr, &mut relations);
        }
        relations
            .iter()
            .filter(|id| graph.relation(**id).tree == tree)
            .count()
            >= 2
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConditionKind {
    /// Boolean-valued expression
    SqlExpr(ExprId),
    /// Comparison, optionally quantified over a subquery
    RelOp {
        op: CompareOp,
        left: ExprId,
        right: ExprId,
        quantifier: Option<SubqueryQuantifier>,
    },
    Logical {
        op: LogicalOp,
        left: CondId,
        right: CondId,
    },
    Composite(CompositeClause),
}

/// Where a condition was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConditionOrigin {
    Where,
    Having,
    /// JOIN ... ON / USING / NATURAL; outer joins carry their generation
    From { outer_join_generation: Option<u32> },
    /// WHEN of a searched CASE
    Case,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryCondition {
    pub kind: ConditionKind,
    /// `false` when negated
    pub positive: bool,
    pub tree: TreeId,
    pub parent: Option<CondId>,
    pub origin: ConditionOrigin,
    /// Some operand carries the legacy `(+)` marker
    pub has_outer_join_marker: bool,
    pub text: Option<String>,
    relation_nodes: Option<Vec<RelId>>,
}

impl QueryCondition {
    pub fn new(tree: TreeId, kind: ConditionKind, origin: ConditionOrigin) -> Self {
        Self {
            kind,
            positive: true,
            tree,
            parent: None,
            origin,
            has_outer_join_marker: false,
            text: None,
            relation_nodes: None,
        }
    }

    pub fn is_from_condition(&self) -> bool {
        matches!(self.origin, ConditionOrigin::From { .. })
    }

    pub fn outer_join_generation(&self) -> Option<u32> {
        match self.origin {
            ConditionOrigin::From {
                outer_join_generation,
            } => outer_join_generation,
            _ => None,
        }
    }

    /// Cached relation set, if computed
    pub fn relation_nodes(&self) -> Option<&[RelId]> {
        self.relation_nodes.as_deref()
    }

    /// Direct child conditions
    pub fn children(&self) -> Vec<CondId> {
        match &self.kind {
            ConditionKind::Logical { left, right, .. } => vec![*left, *right],
            _ => Vec::new(),
        }
    }

    /// Expressions read directly by this node
    pub fn expressions(&self) -> Vec<ExprId> {
        match &self.kind {
            ConditionKind::SqlExpr(expr) => vec![*expr],
            ConditionKind::RelOp { left, right, .. } => vec![*left, *right],
            ConditionKind::Logical { .. } => Vec::new(),
            ConditionKind::Composite(clause) => clause.expressions(),
        }
    }
}

impl QueryGraph {
    /// Top-level AND operands of a condition; a negated or OR node is one unit
    pub fn conjuncts(&self, root: CondId) -> Vec<CondId> {
        let condition = self.condition(root);
        match &condition.kind {
            ConditionKind::Logical {
                op: LogicalOp::And,
                left,
                right,
            } if condition.positive => {
                let mut parts = self.conjuncts(*left);
                parts.extend(self.conjuncts(*right));
                parts
            }
            _ => vec![root],
        }
    }

    /// Relations touched by a condition, computed on first use and cached
    ///
    /// Column references count through their bound relation. A correlated
    /// subquery counts through the placeholder it left in the condition's
    /// tree and through every relation of that tree it reads.
    pub fn relation_nodes(&mut self, id: CondId) -> Vec<RelId> {
        if let Some(cached) = self.condition(id).relation_nodes() {
            return cached.to_vec();
        }
        let mut relations = Vec::new();
        let tree = self.condition(id).tree;
        self.collect_condition_relations(tree, id, &mut relations);
        self.condition_mut(id).relation_nodes = Some(relations.clone());
        relations
    }

    fn collect_condition_relations(&self, tree: TreeId, id: CondId, out: &mut Vec<RelId>) {
        let condition = self.condition(id);
        for child in condition.children() {
            self.collect_condition_relations(tree, child, out);
        }
        for expr in condition.expressions() {
            self.collect_expression_relations(tree, expr, out);
        }
    }

    pub(crate) fn collect_expression_relations(
        &self,
        tree: TreeId,
        id: ExprId,
        out: &mut Vec<RelId>,
    ) {
        let expression = self.expression(id);
        match &expression.kind {
            ExprKind::Column(column) => {
                if let Some(relation) = column.relation {
                    push_unique(out, relation);
                }
            }
            ExprKind::Subquery(subtree) => {
                if let Some(placeholder) = self.tree(*subtree).placeholder_for(tree) {
                    push_unique(out, placeholder);
                    for relation in &self.relation(placeholder).correlated_with {
                        push_unique(out, *relation);
                    }
                }
            }
            ExprKind::Condition(condition) => {
                self.collect_condition_relations(tree, *condition, out);
            }
            _ => {
                for child in expression.children() {
                    self.collect_expression_relations(tree, child, out);
                }
            }
        }
    }
}

pub(crate) fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}
