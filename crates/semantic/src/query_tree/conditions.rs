// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! WHERE and FROM condition classification
//!
//! Each top-level conjunct is sorted by the set of relations of its own
//! tree it reads: two or more make it a join condition, exactly one
//! attaches it to that relation, none leaves it on the tree. An outer join's ON condition is
//! classified as a single unit so its conjuncts stay together.

use sqlgrid_ir::SearchCondition;
use tracing::debug;

use crate::condition::{ConditionOrigin, push_unique};
use crate::context::AnalysisContext;
use crate::error::SemanticResult;
use crate::graph::{CondId, RelId, TreeId};
use crate::relation::{JoinEdge, OuterParent};

impl AnalysisContext<'_> {
    /// Build WHERE, bind every FROM and WHERE column and classify the
    /// resulting conditions
    pub(crate) fn bind_where(
        &mut self,
        tree: TreeId,
        clause: Option<&SearchCondition>,
    ) -> SemanticResult<()> {
        let where_condition = match clause {
            Some(clause) => {
                let id = self.build_search_condition(tree, clause, ConditionOrigin::Where)?;
                self.collect_legacy_outer_joins(tree, id)?;
                Some(id)
            }
            None => None,
        };
        self.graph.tree_mut(tree).where_condition = where_condition;

        let from_conditions = self.graph.tree(tree).from_conditions.clone();
        let mut roots = from_conditions.clone();
        roots.extend(where_condition);
        for root in &roots {
            for column in self.graph.condition_columns(*root) {
                self.bind_column(tree, column)?;
            }
        }

        for condition in from_conditions {
            if self.graph.condition(condition).outer_join_generation().is_some() {
                self.classify_condition(tree, condition);
            } else {
                for conjunct in self.graph.conjuncts(condition) {
                    self.classify_condition(tree, conjunct);
                }
            }
        }
        if let Some(condition) = where_condition {
            for conjunct in self.graph.conjuncts(condition) {
                self.classify_condition(tree, conjunct);
            }
        }

        self.apply_legacy_outer_joins(tree);
        Ok(())
    }

    /// Sort one condition into the join, relation or residual lists
    pub(crate) fn classify_condition(&mut self, tree: TreeId, condition: CondId) {
        // Relations of enclosing queries are constants here.
        let relations: Vec<RelId> = self
            .graph
            .relation_nodes(condition)
            .into_iter()
            .filter(|id| self.graph.relation(*id).tree == tree)
            .collect();
        match relations.as_slice() {
            [] => {
                self.graph.tree_mut(tree).residual_conditions.push(condition);
            }
            [relation] => {
                self.graph.relation_mut(*relation).conditions.push(condition);
            }
            _ => {
                self.graph.tree_mut(tree).join_conditions.push(condition);
                for (i, left) in relations.iter().enumerate() {
                    for right in &relations[i + 1..] {
                        self.add_join_edge(*left, *right, condition);
                        self.add_join_edge(*right, *left, condition);
                    }
                }
                debug!(tree = %tree, condition = %condition, relations = relations.len(), "Classified join condition");
            }
        }

        for column in self.graph.condition_columns(condition) {
            let relation = self
                .graph
                .expression(column)
                .as_column()
                .and_then(|attribute| attribute.relation);
            if let Some(relation) = relation {
                push_unique(
                    &mut self.graph.relation_mut(relation).condition_columns,
                    column,
                );
            }
        }
    }

    fn add_join_edge(&mut self, from: RelId, other: RelId, condition: CondId) {
        push_unique(
            &mut self.graph.relation_mut(from).join_list,
            JoinEdge { other, condition },
        );
    }

    /// Turn `(+)` conjuncts into outer-join parent edges
    ///
    /// The relation carrying the marker is the optional side; every other
    /// relation of the comparison becomes its parent. Each marked conjunct
    /// opens a new outer-join generation.
    fn apply_legacy_outer_joins(&mut self, tree: TreeId) {
        let outer = self.graph.tree(tree).legacy_outer_conditions.clone();
        for condition in outer {
            let mut optional: Vec<RelId> = Vec::new();
            let mut preserved: Vec<RelId> = Vec::new();
            for column in self.graph.condition_columns(condition) {
                let Some(attribute) = self.graph.expression(column).as_column() else {
                    continue;
                };
                let Some(relation) = attribute.relation else {
                    continue;
                };
                if attribute.outer_join_marker {
                    push_unique(&mut optional, relation);
                } else {
                    push_unique(&mut preserved, relation);
                }
            }

            let query_tree = self.graph.tree_mut(tree);
            query_tree.outer_join_generation += 1;
            query_tree.has_outer_join = true;
            let generation = query_tree.outer_join_generation;
            for child in &optional {
                for parent in &preserved {
                    if parent == child {
                        continue;
                    }
                    let node = self.graph.relation_mut(*child);
                    let edge = OuterParent {
                        relation: *parent,
                        generation,
                    };
                    if !node.outer_parents.contains(&edge) {
                        node.outer_parents.push(edge);
                    }
                }
            }
            debug!(tree = %tree, generation, "Applied legacy outer join");
        }
    }
}
