// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlgrid - Syntax and Type Layer
//!
//! This crate provides the types shared by every layer of the analyzer:
//! - The typed syntax tree produced by the external parser
//! - The [`SqlParser`] boundary used to re-parse view definitions
//! - [`TypeDescriptor`] with promotion rules and dialect rendering
//! - Schema metadata handed out by the catalog

pub mod condition;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod metadata;
pub mod parser;
pub mod query;
pub mod types;

// Re-export commonly used types
pub use condition::{
    AndSequence, CompareOp, CompareRight, InSource, LogicalPrimary, Operand, PatternKind,
    RegexOp, RelationalExpr, RelationalTail, SearchCondition, SubqueryQuantifier, TruthValue,
    UnaryLogical,
};
pub use dialect::{Dialect, IdentifierCase};
pub use error::{IrError, IrResult};
pub use expr::{
    AdditiveOp, CaseExpr, ColumnName, CountArgument, Factor, FunctionCall, Identifier, Literal,
    LiteralKind, MultiplicativeOp, PrefixOp, Primary, SuffixOp, Term, TrimSide, ValueExpr,
    WhenClause, WhenCondition,
};
pub use metadata::{ColumnMetadata, ColumnReference, Partitioning, TableMetadata, ViewMetadata};
pub use parser::SqlParser;
pub use query::{
    CommonTableExpr, IntoTarget, Join, JoinConstraint, JoinKind, NullsOrder, OrderByItem, Query,
    SelectBlock, SelectItem, SetQuantifier, SortDirection, TableReference, TablePrimary,
    UnionBranch, UnionType,
};
pub use types::{TypeDescriptor, TypeKind, TypeName};
