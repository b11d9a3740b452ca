// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Column binding
//!
//! A column is first looked up in the relations of its own tree. When that
//! yields nothing, the lookup escalates through the ancestor trees. A hit in
//! an ancestor makes the column an orphan of its own tree: the trees between
//! the two are marked correlated, the ancestor gets one placeholder relation
//! standing for the subtree, and the referenced column is exposed as a
//! hidden projection of the ancestor.
//!
//! FROM-clause subqueries never see the relations of the tree they appear
//! in, so escalation skips that tree.

use sqlgrid_ir::TypeDescriptor;
use tracing::debug;

use crate::condition::push_unique;
use crate::context::AnalysisContext;
use crate::error::{SemanticError, SemanticResult};
use crate::expr::{AttributeColumn, ColumnGenre, ExprKind};
use crate::graph::{ExprId, RelId, TreeId};
use crate::query_tree::SubqueryRole;
use crate::relation::{RelationKind, RelationNode};

/// Outcome of looking a column up in one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnBinding {
    Bound(RelId),
    Unresolved,
}

impl AnalysisContext<'_> {
    /// Bind every column reference under `roots`
    pub(crate) fn bind_expressions(&mut self, tree: TreeId, roots: &[ExprId]) -> SemanticResult<()> {
        for root in roots {
            for column in self.graph.expression_columns(*root) {
                self.bind_column(tree, column)?;
            }
        }
        Ok(())
    }

    /// Bind one column reference, escalating to ancestors when needed
    pub(crate) fn bind_column(&mut self, tree: TreeId, column: ExprId) -> SemanticResult<()> {
        let (qualifier, name) = match self.graph.expression(column).as_column() {
            Some(attribute) if attribute.is_bound() => return Ok(()),
            Some(attribute) => (
                attribute.qualifier().map(str::to_string),
                attribute.column_name.clone(),
            ),
            None => return Ok(()),
        };
        if name.is_empty() {
            return Err(SemanticError::NullColumnName);
        }

        match self.resolve_in_tree(tree, qualifier.as_deref(), &name)? {
            ColumnBinding::Bound(relation) => {
                self.attach_column(column, relation);
                Ok(())
            }
            ColumnBinding::Unresolved => self.escalate(tree, column, qualifier.as_deref(), &name),
        }
    }

    /// Look a column up among the relations of one tree
    ///
    /// # Errors
    ///
    /// A qualifier naming several relations, a matched relation without the
    /// column, or an unqualified name found in several relations.
    pub(crate) fn resolve_in_tree(
        &self,
        tree: TreeId,
        qualifier: Option<&str>,
        name: &str,
    ) -> SemanticResult<ColumnBinding> {
        let sources: Vec<RelId> = self
            .graph
            .tree(tree)
            .relations
            .iter()
            .copied()
            .filter(|id| self.graph.relation(*id).is_column_source())
            .collect();

        let Some(qualifier) = qualifier else {
            return self.resolve_unqualified(&sources, name);
        };

        let mut candidates: Vec<RelId> = sources
            .iter()
            .copied()
            .filter(|id| self.graph.relation(*id).alias == qualifier)
            .collect();
        if candidates.is_empty() {
            candidates = sources
                .iter()
                .copied()
                .filter(|id| self.graph.relation(*id).table_name == qualifier)
                .collect();
        }

        match candidates.as_slice() {
            [] => Ok(ColumnBinding::Unresolved),
            [relation] => {
                let node = self.graph.relation(*relation);
                match node.column_matches(name) {
                    0 => Err(SemanticError::ColumnNotFound(format!("{}.{}", qualifier, name))),
                    1 => Ok(ColumnBinding::Bound(*relation)),
                    _ => Err(SemanticError::AmbiguousColumn(
                        format!("{}.{}", qualifier, name),
                        vec![node.alias.clone()],
                    )),
                }
            }
            _ => Err(SemanticError::AmbiguousTableAlias(qualifier.to_string())),
        }
    }

    fn resolve_unqualified(&self, sources: &[RelId], name: &str) -> SemanticResult<ColumnBinding> {
        let owners: Vec<RelId> = sources
            .iter()
            .copied()
            .filter(|id| self.graph.relation(*id).column_matches(name) > 0)
            .collect();

        match owners.as_slice() {
            [] => Ok(ColumnBinding::Unresolved),
            [relation] => {
                let node = self.graph.relation(*relation);
                if node.column_matches(name) > 1 {
                    return Err(SemanticError::AmbiguousColumn(
                        name.to_string(),
                        vec![node.alias.clone()],
                    ));
                }
                Ok(ColumnBinding::Bound(*relation))
            }
            _ => {
                // An unaliased temporary table shadows same-named columns.
                let temporary: Vec<RelId> = owners
                    .iter()
                    .copied()
                    .filter(|id| {
                        let node = self.graph.relation(*id);
                        node.temporary && node.is_unaliased()
                    })
                    .collect();
                if let [relation] = temporary.as_slice() {
                    return Ok(ColumnBinding::Bound(*relation));
                }
                let aliases = owners
                    .iter()
                    .map(|id| self.graph.relation(*id).alias.clone())
                    .collect();
                Err(SemanticError::AmbiguousColumn(name.to_string(), aliases))
            }
        }
    }

    fn escalate(
        &mut self,
        tree: TreeId,
        column: ExprId,
        qualifier: Option<&str>,
        name: &str,
    ) -> SemanticResult<()> {
        let mut path_child = tree;
        while let Some(ancestor) = self.graph.tree(path_child).parent {
            let subquery = self.graph.union_owner(path_child);
            if self.graph.tree(subquery).role != SubqueryRole::Derived {
                if let ColumnBinding::Bound(relation) =
                    self.resolve_in_tree(ancestor, qualifier, name)?
                {
                    self.correlate(tree, column, ancestor, path_child, relation);
                    return Ok(());
                }
            }
            path_child = ancestor;
        }

        Err(match qualifier {
            Some(qualifier) => SemanticError::TableAliasNotFound(qualifier.to_string()),
            None => SemanticError::ColumnNotFound(name.to_string()),
        })
    }

    /// Record a reference from `tree` into `relation` of `ancestor`
    fn correlate(
        &mut self,
        tree: TreeId,
        column: ExprId,
        ancestor: TreeId,
        path_child: TreeId,
        relation: RelId,
    ) {
        self.attach_column(column, relation);
        if let Some(attribute) = self.graph.expression_mut(column).as_column_mut() {
            attribute.genre.insert(ColumnGenre::ORPHAN);
        }

        // A UNION branch is correlated through the subquery it belongs to.
        let mut current = tree;
        loop {
            let owner = self.graph.union_owner(current);
            self.graph.tree_mut(owner).correlated = true;
            let query_tree = self.graph.tree_mut(current);
            query_tree.correlated = true;
            match query_tree.parent {
                Some(parent) if current != path_child => current = parent,
                _ => break,
            }
        }
        let path_child = self.graph.union_owner(path_child);
        push_unique(
            &mut self.graph.tree_mut(ancestor).correlated_subtrees,
            path_child,
        );

        let placeholder = match self.graph.tree(path_child).placeholder_for(ancestor) {
            Some(placeholder) => placeholder,
            None => {
                let alias = self.next_alias("placeholder");
                let mut node = RelationNode::new(RelationKind::Placeholder, ancestor, alias);
                node.represents = Some(path_child);
                let placeholder = self.graph.add_relation(node);
                self.graph.tree_mut(ancestor).relations.push(placeholder);
                self.graph
                    .tree_mut(path_child)
                    .placeholders
                    .insert(ancestor, placeholder);
                debug!(ancestor = %ancestor, subtree = %path_child, placeholder = %placeholder, "Created placeholder relation");
                placeholder
            }
        };
        push_unique(
            &mut self.graph.relation_mut(placeholder).correlated_with,
            relation,
        );

        let hidden = self.register_column(relation, column);
        push_unique(&mut self.graph.tree_mut(ancestor).hidden_projection, hidden);
        debug!(tree = %tree, ancestor = %ancestor, column = %column, "Bound correlated column");
    }

    /// Bind `column` to `relation` and record it in the relation's projection
    pub(crate) fn attach_column(&mut self, column: ExprId, relation: RelId) {
        let node = self.graph.relation(relation);
        let table_name = node.table_name.clone();
        let table_alias = node.alias.clone();
        let name = match self.graph.expression(column).as_column() {
            Some(attribute) => attribute.column_name.clone(),
            None => return,
        };
        let column_type = self.relation_column_type(relation, &name);

        if let Some(attribute) = self.graph.expression_mut(column).as_column_mut() {
            attribute.relation = Some(relation);
            attribute.table_name = table_name;
            attribute.table_alias = table_alias;
            attribute.column_type = column_type;
        }
        self.register_column(relation, column);
    }

    /// Projection entry of `relation` for the column read by `column`,
    /// created on first use
    fn register_column(&mut self, relation: RelId, column: ExprId) -> ExprId {
        let Some(attribute) = self.graph.expression(column).as_column() else {
            return column;
        };
        let name = attribute.column_name.clone();
        let column_type = attribute.column_type.clone();

        let existing = self
            .graph
            .relation(relation)
            .projection
            .iter()
            .copied()
            .find(|id| {
                self.graph
                    .expression(*id)
                    .as_column()
                    .is_some_and(|c| c.column_name == name)
            });
        if let Some(existing) = existing {
            return existing;
        }

        let node = self.graph.relation(relation);
        let owner = node.tree;
        let mut entry = AttributeColumn::new(owner, Some(node.alias.clone()), name);
        entry.table_name = node.table_name.clone();
        entry.relation = Some(relation);
        entry.column_type = column_type.clone();
        let id = self.add_expression(owner, ExprKind::Column(entry));
        self.graph.expression_mut(id).data_type = column_type;
        self.graph.relation_mut(relation).projection.push(id);
        id
    }

    /// Type of an output column of a relation
    pub(crate) fn relation_column_type(&self, relation: RelId, name: &str) -> Option<TypeDescriptor> {
        let node = self.graph.relation(relation);
        match node.kind {
            RelationKind::BaseTable => node.catalog_type(name),
            RelationKind::DerivedSubquery | RelationKind::CteReference => {
                let subtree = node.subtree?;
                self.graph
                    .tree(subtree)
                    .projection
                    .iter()
                    .map(|id| self.graph.expression(*id))
                    .find(|expr| expr.outer_alias() == Some(name))
                    .and_then(|expr| expr.data_type.clone())
            }
            RelationKind::Placeholder | RelationKind::Fake => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::query_tree::QueryTree;
    use sqlgrid_catalog::StaticCatalog;
    use sqlgrid_function_registry::FunctionRegistry;
    use sqlgrid_ir::{ColumnMetadata, TableMetadata, TablePrimary, TableReference, TypeKind};

    fn catalog() -> StaticCatalog {
        let int = || TypeDescriptor::new(TypeKind::Integer);
        StaticCatalog::new()
            .with_table(TableMetadata::new("a").with_columns(vec![
                ColumnMetadata::new("x", int()),
                ColumnMetadata::new("id", int()),
            ]))
            .with_table(TableMetadata::new("b").with_columns(vec![
                ColumnMetadata::new("x", int()),
                ColumnMetadata::new("w", int()),
            ]))
            .with_table(
                TableMetadata::new("tmp")
                    .with_columns(vec![ColumnMetadata::new("x", int())])
                    .with_temporary(),
            )
    }

    fn with_tree<R>(
        from: Vec<TableReference>,
        f: impl FnOnce(&mut AnalysisContext<'_>, TreeId) -> R,
    ) -> R {
        let catalog = catalog();
        let registry = FunctionRegistry::new();
        let config = AnalyzerConfig::default();
        let mut ctx = AnalysisContext::new(&catalog, None, &registry, &config);
        let tree = ctx
            .graph
            .add_tree(QueryTree::new(SubqueryRole::None, None, TreeId(0)));
        ctx.build_from(tree, &from).unwrap();
        f(&mut ctx, tree)
    }

    fn column(ctx: &mut AnalysisContext<'_>, tree: TreeId, qualifier: Option<&str>, name: &str) -> ExprId {
        let column = AttributeColumn::new(tree, qualifier.map(String::from), name);
        ctx.add_expression(tree, ExprKind::Column(column))
    }

    #[test]
    fn test_unqualified_ambiguity() {
        let from = vec![TableReference::table("a"), TableReference::table("b")];
        with_tree(from, |ctx, tree| {
            let x = column(ctx, tree, None, "x");
            assert_eq!(
                ctx.bind_column(tree, x),
                Err(SemanticError::AmbiguousColumn(
                    "x".to_string(),
                    vec!["a".to_string(), "b".to_string()]
                ))
            );

            let w = column(ctx, tree, None, "w");
            ctx.bind_column(tree, w).unwrap();
            let bound = ctx.graph.expression(w).as_column().unwrap();
            assert_eq!(bound.table_alias, "b");
            assert_eq!(bound.column_type, Some(TypeDescriptor::new(TypeKind::Integer)));
        });
    }

    #[test]
    fn test_alias_disambiguates() {
        let from = vec![
            TableReference::new(TablePrimary::named("a", Some("p"))),
            TableReference::table("b"),
        ];
        with_tree(from, |ctx, tree| {
            let x = column(ctx, tree, Some("p"), "x");
            ctx.bind_column(tree, x).unwrap();
            let bound = ctx.graph.expression(x).as_column().unwrap();
            assert_eq!(bound.table_name, "a");
            assert_eq!(bound.table_alias, "p");

            let missing = column(ctx, tree, Some("p"), "w");
            assert_eq!(
                ctx.bind_column(tree, missing),
                Err(SemanticError::ColumnNotFound("p.w".to_string()))
            );
        });
    }

    #[test]
    fn test_unaliased_temporary_table_wins_tie() {
        let from = vec![TableReference::table("a"), TableReference::table("tmp")];
        with_tree(from, |ctx, tree| {
            let x = column(ctx, tree, None, "x");
            ctx.bind_column(tree, x).unwrap();
            assert_eq!(ctx.graph.expression(x).as_column().unwrap().table_name, "tmp");
        });
    }

    #[test]
    fn test_unknown_qualifier_without_parent() {
        with_tree(vec![TableReference::table("a")], |ctx, tree| {
            let x = column(ctx, tree, Some("zz"), "x");
            assert_eq!(
                ctx.bind_column(tree, x),
                Err(SemanticError::TableAliasNotFound("zz".to_string()))
            );
        });
    }

    #[test]
    fn test_escalation_creates_one_placeholder() {
        with_tree(vec![TableReference::table("a")], |ctx, outer| {
            let inner = ctx
                .graph
                .add_tree(QueryTree::new(SubqueryRole::Scalar, Some(outer), outer));
            ctx.build_from(inner, &[TableReference::table("b")]).unwrap();

            let first = column(ctx, inner, Some("a"), "id");
            let second = column(ctx, inner, None, "id");
            ctx.bind_column(inner, first).unwrap();
            ctx.bind_column(inner, second).unwrap();

            assert!(ctx.graph.expression(first).as_column().unwrap().is_orphan());
            assert!(ctx.graph.tree(inner).correlated);
            assert_eq!(ctx.graph.tree(outer).correlated_subtrees, vec![inner]);

            let placeholder = ctx.graph.tree(inner).placeholder_for(outer).unwrap();
            let placeholders: Vec<_> = ctx
                .graph
                .tree(outer)
                .relations
                .iter()
                .filter(|id| ctx.graph.relation(**id).kind == RelationKind::Placeholder)
                .collect();
            assert_eq!(placeholders, vec![&placeholder]);
            assert_eq!(ctx.graph.relation(placeholder).represents, Some(inner));
            assert_eq!(ctx.graph.tree(outer).hidden_projection.len(), 1);
        });
    }

    #[test]
    fn test_derived_table_cannot_see_its_parent() {
        with_tree(vec![TableReference::table("a")], |ctx, outer| {
            let derived = ctx
                .graph
                .add_tree(QueryTree::new(SubqueryRole::Derived, Some(outer), outer));
            ctx.build_from(derived, &[TableReference::table("b")]).unwrap();
            let id = column(ctx, derived, None, "id");
            assert_eq!(
                ctx.bind_column(derived, id),
                Err(SemanticError::ColumnNotFound("id".to_string()))
            );
        });
    }
}
