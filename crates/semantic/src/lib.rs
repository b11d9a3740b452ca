// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # sqlgrid - Semantic Analysis Layer
//!
//! Turns a parsed SELECT statement into a graph of bound query trees.
//!
//! ## Overview
//!
//! For every SELECT block the analyzer builds a [`QueryTree`] holding:
//! - **Relations**: one [`RelationNode`] per FROM entry (base table, view
//!   expansion, derived table, CTE reference) plus placeholders standing in
//!   for correlated subqueries
//! - **Expressions**: an arena of [`SqlExpression`] nodes with columns bound
//!   to relations and types filled in
//! - **Conditions**: a [`QueryCondition`] tree per clause, with each
//!   conjunct classified as a join, single-relation or residual condition
//!
//! Everything lives in one [`QueryGraph`] addressed by typed ids
//! ([`TreeId`], [`RelId`], [`ExprId`], [`CondId`]).
//!
//! ## Binding
//!
//! Column references resolve against the current tree first and escalate to
//! enclosing trees. A column resolved in an ancestor is an orphan: the
//! subtree is marked correlated and the ancestor gets a placeholder relation
//! representing it, so the correlation shows up as an ordinary join
//! condition there.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use sqlgrid_catalog::StaticCatalog;
//! use sqlgrid_ir::{
//!     ColumnMetadata, Query, SelectBlock, SelectItem, TableMetadata, TableReference,
//!     TypeDescriptor, TypeKind,
//! };
//! use sqlgrid_semantic::SemanticAnalyzer;
//!
//! let catalog = StaticCatalog::new().with_table(
//!     TableMetadata::new("users").with_columns(vec![
//!         ColumnMetadata::new("id", TypeDescriptor::new(TypeKind::Integer)),
//!         ColumnMetadata::new("name", TypeDescriptor::new(TypeKind::Text)),
//!     ]),
//! );
//! let analyzer = SemanticAnalyzer::new(Arc::new(catalog));
//!
//! let query = Query::new(
//!     SelectBlock::new(vec![SelectItem::Wildcard])
//!         .with_from(vec![TableReference::table("users")]),
//! );
//! let analyzed = analyzer.analyze(&query).unwrap();
//!
//! assert_eq!(analyzed.projection_names(), vec!["id", "name"]);
//! assert_eq!(analyzed.sql(), "SELECT users.id, users.name FROM users");
//! ```

pub mod analyzer;
pub mod condition;
pub mod config;
pub mod context;
pub mod error;
pub mod expr;
pub mod function;
pub mod graph;
pub mod ident;
pub mod query_tree;
pub mod relation;
pub mod tracker;
pub mod walk;

// Re-export commonly used types
pub use analyzer::{AnalyzedQuery, SemanticAnalyzer};
pub use condition::{
    CompositeClause, ConditionKind, ConditionOrigin, InList, LogicalOp, PatternMatch,
    QueryCondition,
};
pub use config::{AnalyzerConfig, ConfigError, DEFAULT_MAX_NESTING_DEPTH};
pub use context::AnalysisContext;
pub use error::{ErrorCategory, SemanticError, SemanticResult};
pub use expr::{
    AttributeColumn, CallForm, CaseExpression, ColumnGenre, Constant, ExprKind, FunctionExpr,
    MappedState, Operator, OperatorExpr, SqlExpression,
};
pub use graph::{CondId, ExprId, QueryGraph, RelId, TreeId};
pub use ident::IdentifierResolver;
pub use query_tree::{QueryTree, SqlRenderer, SubqueryRole, TreeState};
pub use relation::{JoinEdge, JoinSpec, OuterParent, RelationKind, RelationNode};
pub use tracker::QueryTreeTracker;
