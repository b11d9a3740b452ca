// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Query trees
//!
//! One [`QueryTree`] per SELECT block: the top-level query, every subquery,
//! derived table, CTE body, expanded view and UNION branch. Trees are built
//! by a fixed sequence of steps; [`TreeState`] records progress and rejects
//! out-of-order transitions.

pub mod binding;
pub mod build;
pub mod conditions;
pub mod grouping;
pub mod rebuild;
pub mod subquery;
pub mod types;
pub mod wildcard;

pub use rebuild::SqlRenderer;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use sqlgrid_ir::{NullsOrder, SortDirection, UnionType};

use crate::error::{SemanticError, SemanticResult};
use crate::graph::{CondId, ExprId, RelId, TreeId};

/// Lifecycle of a query tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TreeState {
    Created,
    Registered,
    ProjectionCollected,
    FromBound,
    WildcardsExpanded,
    ColumnsBound,
    WhereBound,
    GroupByBound,
    TypesFilled,
    AggregateFlagged,
    Deregistered,
}

impl TreeState {
    /// The only state a tree may move to next
    pub fn successor(self) -> Option<TreeState> {
        use TreeState::*;
        match self {
            Created => Some(Registered),
            Registered => Some(ProjectionCollected),
            ProjectionCollected => Some(FromBound),
            FromBound => Some(WildcardsExpanded),
            WildcardsExpanded => Some(ColumnsBound),
            ColumnsBound => Some(WhereBound),
            WhereBound => Some(GroupByBound),
            GroupByBound => Some(TypesFilled),
            TypesFilled => Some(AggregateFlagged),
            AggregateFlagged => Some(Deregistered),
            Deregistered => None,
        }
    }
}

impl fmt::Display for TreeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TreeState::Created => "CREATED",
            TreeState::Registered => "REGISTERED",
            TreeState::ProjectionCollected => "PROJECTION_COLLECTED",
            TreeState::FromBound => "FROM_BOUND",
            TreeState::WildcardsExpanded => "WILDCARDS_EXPANDED",
            TreeState::ColumnsBound => "COLUMNS_BOUND",
            TreeState::WhereBound => "WHERE_BOUND",
            TreeState::GroupByBound => "GROUPBY_BOUND",
            TreeState::TypesFilled => "TYPES_FILLED",
            TreeState::AggregateFlagged => "AGGREGATE_FLAGGED",
            TreeState::Deregistered => "DEREGISTERED",
        };
        f.write_str(name)
    }
}

/// Syntactic role of a query tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SubqueryRole {
    /// Top-level statement
    None,
    /// Single value, e.g. `(SELECT max(x) FROM t)`
    Scalar,
    /// Set of values: `IN (SELECT ...)`, `= ANY (SELECT ...)`
    NonScalar,
    Exists,
    /// FROM-clause subquery
    Derived,
    CommonTable,
    View,
    UnionBranch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderByEntry {
    pub expr: ExprId,
    pub direction: Option<SortDirection>,
    pub nulls: Option<NullsOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntoTable {
    pub table: String,
    pub temporary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryTree {
    pub state: TreeState,
    pub role: SubqueryRole,
    pub parent: Option<TreeId>,
    /// Top-level tree of the statement
    pub top: TreeId,
    /// Tree whose WITH names are visible before the parent's, for CTE
    /// bodies and UNION branches
    pub cte_scope: Option<TreeId>,

    pub distinct: bool,
    pub projection: Vec<ExprId>,
    /// Columns added for correlated references from subtrees
    pub hidden_projection: Vec<ExprId>,
    pub relations: Vec<RelId>,
    /// CTE definitions of this tree's WITH clause
    pub with_relations: Vec<RelId>,
    pub from_conditions: Vec<CondId>,
    pub where_condition: Option<CondId>,
    /// Conditions joining two or more relations
    pub join_conditions: Vec<CondId>,
    /// Constant and purely correlated conditions
    pub residual_conditions: Vec<CondId>,
    pub group_by: Vec<ExprId>,
    pub having: Vec<CondId>,
    pub order_by: Vec<OrderByEntry>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub into: Option<IntoTable>,

    /// Set on branches after the first
    pub union_type: Option<UnionType>,
    pub union_branches: Vec<TreeId>,

    /// Direct subtrees with correlated references into this tree
    pub correlated_subtrees: Vec<TreeId>,
    /// Placeholder this tree left in an ancestor, keyed by that ancestor
    pub placeholders: BTreeMap<TreeId, RelId>,
    pub correlated: bool,

    pub aggregate: bool,
    pub has_outer_join: bool,
    pub outer_join_generation: u32,
    /// Conjuncts carrying the legacy `(+)` marker
    pub legacy_outer_conditions: Vec<CondId>,
    /// Unmarked conjuncts of an AND chain that has marked ones
    pub legacy_inner_conditions: Vec<CondId>,

    pub last_relation: Option<RelId>,
    pub prev_relation: Option<RelId>,
}

impl QueryTree {
    pub(crate) fn new(role: SubqueryRole, parent: Option<TreeId>, top: TreeId) -> Self {
        Self {
            state: TreeState::Created,
            role,
            parent,
            top,
            cte_scope: None,
            distinct: false,
            projection: Vec::new(),
            hidden_projection: Vec::new(),
            relations: Vec::new(),
            with_relations: Vec::new(),
            from_conditions: Vec::new(),
            where_condition: None,
            join_conditions: Vec::new(),
            residual_conditions: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            into: None,
            union_type: None,
            union_branches: Vec::new(),
            correlated_subtrees: Vec::new(),
            placeholders: BTreeMap::new(),
            correlated: false,
            aggregate: false,
            has_outer_join: false,
            outer_join_generation: 0,
            legacy_outer_conditions: Vec::new(),
            legacy_inner_conditions: Vec::new(),
            last_relation: None,
            prev_relation: None,
        }
    }

    /// Move to `next`, which must directly follow the current state
    pub(crate) fn advance(&mut self, next: TreeState) -> SemanticResult<()> {
        if self.state.successor() != Some(next) {
            return Err(SemanticError::InvalidStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }

    /// Placeholder this tree created in `ancestor`, if any
    pub fn placeholder_for(&self, ancestor: TreeId) -> Option<RelId> {
        self.placeholders.get(&ancestor).copied()
    }

    pub fn is_top(&self) -> bool {
        self.parent.is_none() && self.role == SubqueryRole::None
    }

    /// Every condition owned by the tree, in binding order
    pub fn all_condition_roots(&self) -> Vec<CondId> {
        let mut roots = self.from_conditions.clone();
        roots.extend(self.where_condition);
        roots.extend(self.having.iter().copied());
        roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_cannot_be_skipped() {
        let mut tree = QueryTree::new(SubqueryRole::None, None, TreeId(0));
        tree.advance(TreeState::Registered).unwrap();

        let err = tree.advance(TreeState::FromBound).unwrap_err();
        assert_eq!(
            err,
            SemanticError::InvalidStateTransition {
                from: "REGISTERED".to_string(),
                to: "FROM_BOUND".to_string(),
            }
        );
        assert_eq!(tree.state, TreeState::Registered);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut tree = QueryTree::new(SubqueryRole::Scalar, Some(TreeId(0)), TreeId(0));
        let mut state = tree.state;
        while let Some(next) = state.successor() {
            tree.advance(next).unwrap();
            state = next;
        }
        assert_eq!(tree.state, TreeState::Deregistered);
        assert!(tree.advance(TreeState::Created).is_err());
    }
}
