// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Query graph arena
//!
//! Query trees, relation nodes, expressions and conditions of one statement
//! live in a single [`QueryGraph`] and refer to each other by typed index.
//! Parent pointers and cross references are plain ids, so the graph can be
//! handed out by shared reference once analysis is finished.

use std::fmt;

use serde::Serialize;

use crate::condition::QueryCondition;
use crate::expr::SqlExpression;
use crate::query_tree::{QueryTree, SubqueryRole};
use crate::relation::RelationNode;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position in the arena
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Index of a [`QueryTree`]
    TreeId,
    "tree#"
);
arena_id!(
    /// Index of a [`RelationNode`]
    RelId,
    "rel#"
);
arena_id!(
    /// Index of a [`SqlExpression`]
    ExprId,
    "expr#"
);
arena_id!(
    /// Index of a [`QueryCondition`]
    CondId,
    "cond#"
);

/// Per-statement arena
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryGraph {
    trees: Vec<QueryTree>,
    relations: Vec<RelationNode>,
    expressions: Vec<SqlExpression>,
    conditions: Vec<QueryCondition>,
}

impl QueryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self, id: TreeId) -> &QueryTree {
        &self.trees[id.0]
    }

    pub(crate) fn tree_mut(&mut self, id: TreeId) -> &mut QueryTree {
        &mut self.trees[id.0]
    }

    /// First SELECT block of the query a UNION branch belongs to; any other
    /// tree is its own owner
    pub fn union_owner(&self, id: TreeId) -> TreeId {
        let query_tree = self.tree(id);
        match (query_tree.role, query_tree.cte_scope) {
            (SubqueryRole::UnionBranch, Some(owner)) => owner,
            _ => id,
        }
    }

    pub fn relation(&self, id: RelId) -> &RelationNode {
        &self.relations[id.0]
    }

    pub(crate) fn relation_mut(&mut self, id: RelId) -> &mut RelationNode {
        &mut self.relations[id.0]
    }

    pub fn expression(&self, id: ExprId) -> &SqlExpression {
        &self.expressions[id.0]
    }

    pub(crate) fn expression_mut(&mut self, id: ExprId) -> &mut SqlExpression {
        &mut self.expressions[id.0]
    }

    pub fn condition(&self, id: CondId) -> &QueryCondition {
        &self.conditions[id.0]
    }

    pub(crate) fn condition_mut(&mut self, id: CondId) -> &mut QueryCondition {
        &mut self.conditions[id.0]
    }

    pub(crate) fn add_tree(&mut self, tree: QueryTree) -> TreeId {
        self.trees.push(tree);
        TreeId(self.trees.len() - 1)
    }

    pub(crate) fn add_relation(&mut self, relation: RelationNode) -> RelId {
        self.relations.push(relation);
        RelId(self.relations.len() - 1)
    }

    pub(crate) fn add_expression(&mut self, expression: SqlExpression) -> ExprId {
        self.expressions.push(expression);
        ExprId(self.expressions.len() - 1)
    }

    pub(crate) fn add_condition(&mut self, condition: QueryCondition) -> CondId {
        self.conditions.push(condition);
        CondId(self.conditions.len() - 1)
    }

    pub fn tree_ids(&self) -> impl Iterator<Item = TreeId> + '_ {
        (0..self.trees.len()).map(TreeId)
    }

    pub fn relation_ids(&self) -> impl Iterator<Item = RelId> + '_ {
        (0..self.relations.len()).map(RelId)
    }

    pub fn expression_ids(&self) -> impl Iterator<Item = ExprId> + '_ {
        (0..self.expressions.len()).map(ExprId)
    }

    pub fn condition_ids(&self) -> impl Iterator<Item = CondId> + '_ {
        (0..self.conditions.len()).map(CondId)
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}
