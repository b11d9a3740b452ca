// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Pass-through columns for FROM-clause subqueries and CTE references
//!
//! Every column read from a derived or CTE relation is forwarded through a
//! projection entry of that relation, which in turn points at the output
//! entry of the subtree that produces it.

use tracing::trace;

use crate::context::AnalysisContext;
use crate::error::{SemanticError, SemanticResult};
use crate::expr::{ColumnGenre, MappedState};
use crate::graph::{ExprId, RelId, TreeId};
use crate::relation::RelationKind;

impl AnalysisContext<'_> {
    pub(crate) fn manage_from_subquery(&mut self, tree: TreeId) -> SemanticResult<()> {
        let relations: Vec<RelId> = self
            .graph
            .tree(tree)
            .relations
            .iter()
            .copied()
            .filter(|id| {
                matches!(
                    self.graph.relation(*id).kind,
                    RelationKind::DerivedSubquery | RelationKind::CteReference
                )
            })
            .collect();

        for relation in relations {
            let Some(subtree) = self.graph.relation(relation).subtree else {
                return Err(SemanticError::MissingSubqueryTree);
            };
            let entries = self.graph.relation(relation).projection.clone();
            for entry in entries {
                let Some(name) = self
                    .graph
                    .expression(entry)
                    .as_column()
                    .map(|column| column.column_name.clone())
                else {
                    continue;
                };
                let source = self
                    .graph
                    .tree(subtree)
                    .projection
                    .iter()
                    .copied()
                    .find(|id| self.graph.expression(*id).outer_alias() == Some(name.as_str()))
                    .ok_or_else(|| SemanticError::SubqueryNotFound(name.clone()))?;

                let pass_through = self.graph.expression_mut(entry);
                pass_through.mapped = MappedState::External;
                pass_through.mapped_from = Some(source);
                self.graph.expression_mut(source).mapped = MappedState::Internal;
                self.forward_columns(relation, entry, &name);
                trace!(relation = %relation, column = %name, source = %source, "Forwarded subquery column");
            }
        }
        Ok(())
    }

    /// Point every reference to `relation.name` at its pass-through entry
    fn forward_columns(&mut self, relation: RelId, entry: ExprId, name: &str) {
        let readers: Vec<ExprId> = self
            .graph
            .expression_ids()
            .filter(|id| *id != entry)
            .filter(|id| {
                self.graph
                    .expression(*id)
                    .as_column()
                    .is_some_and(|c| c.relation == Some(relation) && c.column_name == name)
            })
            .collect();
        for reader in readers {
            let expression = self.graph.expression_mut(reader);
            expression.mapped_from = Some(entry);
            if let Some(column) = expression.as_column_mut() {
                column.genre.insert(ColumnGenre::MAPPED);
            }
        }
    }
}
