// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Relation graph
//!
//! A [`RelationNode`] is one FROM item of a query tree: a catalog table, a
//! derived subquery (or expanded view), a CTE reference, a correlation
//! placeholder or the fake relation of a FROM-less SELECT. Join structure is
//! recorded as edges between nodes of the same tree.

pub mod from;

use serde::Serialize;
use sqlgrid_ir::{JoinKind, TableMetadata, TypeDescriptor};

use crate::graph::{CondId, ExprId, RelId, TreeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelationKind {
    BaseTable,
    /// `(SELECT ...) alias`, or a view expanded into a subquery
    DerivedSubquery,
    /// Use of a WITH name
    CteReference,
    /// Stands for a correlated subtree below the owning tree
    Placeholder,
    /// Single relation of a SELECT without FROM
    Fake,
}

/// Outer-join parent of a relation, tagged with the join's generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OuterParent {
    pub relation: RelId,
    pub generation: u32,
}

/// Pairwise join edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JoinEdge {
    pub other: RelId,
    pub condition: CondId,
}

/// How a relation was attached to the one before it in FROM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JoinSpec {
    pub kind: JoinKind,
    /// ON condition, or the equalities synthesized for NATURAL / USING
    pub condition: Option<CondId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationNode {
    pub kind: RelationKind,
    pub table_name: String,
    /// Never empty; defaults to the table name or a generated name
    pub alias: String,
    pub only: bool,
    pub temporary: bool,
    pub tree: TreeId,
    /// Columns the relation must produce
    pub projection: Vec<ExprId>,
    /// Columns referenced by conditions
    pub condition_columns: Vec<ExprId>,
    /// Conditions touching only this relation
    pub conditions: Vec<CondId>,
    /// Inner / cross join neighbours
    pub siblings: Vec<RelId>,
    pub outer_parents: Vec<OuterParent>,
    pub join_list: Vec<JoinEdge>,
    /// Set on the right side of an explicit JOIN
    pub join: Option<JoinSpec>,
    /// Query tree of a derived relation or CTE definition
    pub subtree: Option<TreeId>,
    /// CTE definition a reference points at
    pub cte_source: Option<RelId>,
    pub reference_count: u32,
    /// Subtree a placeholder stands for
    pub represents: Option<TreeId>,
    /// Relations of this tree the placeholder's subtree correlates with
    pub correlated_with: Vec<RelId>,
    /// Catalog metadata of a base table
    pub table: Option<TableMetadata>,
    /// Output names of derived and CTE relations
    pub output_columns: Vec<String>,
}

impl RelationNode {
    pub fn new(kind: RelationKind, tree: TreeId, name: impl Into<String>) -> Self {
        let table_name = name.into();
        Self {
            kind,
            alias: table_name.clone(),
            table_name,
            only: false,
            temporary: false,
            tree,
            projection: Vec::new(),
            condition_columns: Vec::new(),
            conditions: Vec::new(),
            siblings: Vec::new(),
            outer_parents: Vec::new(),
            join_list: Vec::new(),
            join: None,
            subtree: None,
            cte_source: None,
            reference_count: 0,
            represents: None,
            correlated_with: Vec::new(),
            table: None,
            output_columns: Vec::new(),
        }
    }

    pub fn base_table(tree: TreeId, table: TableMetadata) -> Self {
        let mut node = Self::new(RelationKind::BaseTable, tree, table.name.clone());
        node.temporary = table.temporary;
        node.table = Some(table);
        node
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Placeholders and the fake relation expose no columns
    pub fn is_column_source(&self) -> bool {
        !matches!(self.kind, RelationKind::Placeholder | RelationKind::Fake)
    }

    /// Written without an alias of its own
    pub fn is_unaliased(&self) -> bool {
        self.alias == self.table_name
    }

    /// Columns a wildcard expands to, in declaration order
    pub fn wildcard_columns(&self) -> Vec<String> {
        match (&self.kind, &self.table) {
            (RelationKind::BaseTable, Some(table)) => {
                table.visible_columns().map(|c| c.name.clone()).collect()
            }
            (RelationKind::DerivedSubquery | RelationKind::CteReference, _) => {
                self.output_columns.clone()
            }
            _ => Vec::new(),
        }
    }

    /// Number of output columns called `name`; row-id columns count
    pub fn column_matches(&self, name: &str) -> usize {
        match (&self.kind, &self.table) {
            (RelationKind::BaseTable, Some(table)) => {
                table.columns.iter().filter(|c| c.name == name).count()
            }
            (RelationKind::DerivedSubquery | RelationKind::CteReference, _) => {
                self.output_columns.iter().filter(|c| *c == name).count()
            }
            _ => 0,
        }
    }

    /// Catalog type of a base table column
    pub fn catalog_type(&self, name: &str) -> Option<TypeDescriptor> {
        self.table
            .as_ref()
            .and_then(|table| table.get_column(name))
            .map(|column| column.data_type.clone())
    }

    pub fn outer_join_generation(&self) -> Option<u32> {
        self.outer_parents.iter().map(|p| p.generation).max()
    }
}
