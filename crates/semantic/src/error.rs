// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Error types for semantic analysis
//!
//! Every failure raised while building a query tree is a [`SemanticError`].
//! Variants carry a stable numeric [`code`](SemanticError::code) grouped by
//! hundreds:
//!
//! | range | category |
//! |-------|----------|
//! | 1xx | syntax / structural |
//! | 2xx | name resolution |
//! | 3xx | semantic rules |
//! | 9xx | internal consistency |

use sqlgrid_catalog::CatalogError;
use thiserror::Error;

/// Result type alias for semantic operations
pub type SemanticResult<T> = Result<T, SemanticError>;

/// Coarse grouping of [`SemanticError`] codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Syntax,
    Resolution,
    Semantic,
    Internal,
}

/// Errors that can occur during semantic analysis
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemanticError {
    /// Numeric or typed literal that cannot be interpreted
    #[error("Malformed literal: {0}")]
    MalformedLiteral(String),

    /// A predicate tail was reached without a pending left operand
    #[error("Imbalanced expression stack")]
    ImbalancedExpressionStack,

    /// Construct the analyzer does not handle
    #[error("Unsupported construct: {0}")]
    Unsupported(String),

    /// CAST / `::` target that is not a known type
    #[error("Unknown data type: {0}")]
    UnknownDataType(String),

    /// Subqueries or views nested beyond the configured limit
    #[error("Query nesting exceeds the limit of {limit}")]
    NestingTooDeep { limit: usize },

    /// Stored view text could not be parsed
    #[error("Failed to parse view '{view}': {message}")]
    ViewParseFailed { view: String, message: String },

    /// Column not found in any visible relation
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Column reference is ambiguous (found in multiple relations)
    #[error("Ambiguous column reference: {0} (found in {1:?})")]
    AmbiguousColumn(String, Vec<String>),

    /// Two relations in one FROM clause share an alias, or a qualifier
    /// matches more than one relation
    #[error("Ambiguous table alias: {0}")]
    AmbiguousTableAlias(String),

    /// Qualifier that names no visible relation
    #[error("Table alias not found: {0}")]
    TableAliasNotFound(String),

    /// Name is neither a view, a CTE, nor a catalog table
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Declared column list does not match the relation's output
    #[error("'{relation}' declares {declared} columns but its query returns {returned}")]
    ColumnCountMismatch {
        relation: String,
        declared: usize,
        returned: usize,
    },

    /// `t.*` where `t` names no relation in FROM
    #[error("Wildcard table '{0}' not found in FROM clause")]
    WildcardTableNotFound(String),

    /// `t.*` where `t` matches more than one relation
    #[error("Ambiguous wildcard qualifier: {0}")]
    AmbiguousWildcard(String),

    /// Column must appear in GROUP BY or be used in an aggregate
    #[error("Column '{0}' must appear in the GROUP BY clause or be used in an aggregate function")]
    GroupByRequired(String),

    /// Recognised construct whose semantics are not implemented
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// `$0`, or a parameter number above the configured count
    #[error("Illegal parameter marker: {0}")]
    IllegalParameterMarker(String),

    /// GROUP BY / ORDER BY ordinal outside the projection
    #[error("{clause} position {position} is not in select list (1..={max})")]
    PositionOutOfRange {
        clause: &'static str,
        position: i64,
        max: usize,
    },

    /// UNION branches with different projection widths
    #[error("Each UNION query must have the same number of columns: {left} vs {right}")]
    UnionColumnCountMismatch { left: usize, right: usize },

    /// Subquery returns the wrong number of columns for its context
    #[error("Subquery must return {expected} column(s), found {found}")]
    SubqueryColumnCount { expected: usize, found: usize },

    /// DISTINCT / ALL on a function that is not an aggregate
    #[error("DISTINCT or ALL specified for non-aggregate function {0}")]
    InvalidAggregateQuantifier(String),

    /// SELECT ... INTO in a nested query
    #[error("INTO is only allowed on the top-most query")]
    IntoNotAllowed,

    /// `SELECT *` with no FROM clause
    #[error("SELECT * with no tables specified is not valid")]
    WildcardWithoutFrom,

    /// Two CTEs with the same name in one WITH clause
    #[error("WITH query name '{0}' specified more than once")]
    DuplicateCte(String),

    /// Resolved column without a column name
    #[error("Internal error: column without a name")]
    NullColumnName,

    /// Subquery expression without its query tree
    #[error("Internal error: subquery expression has no query tree")]
    MissingSubqueryTree,

    /// Derived relation whose subtree lacks the referenced output column
    #[error("Internal error: subquery output '{0}' not found")]
    SubqueryNotFound(String),

    /// Query tree lifecycle violated
    #[error("Internal error: invalid query tree transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// A view was referenced but no parser was configured
    #[error("No SQL parser configured to expand view '{0}'")]
    ParserUnavailable(String),

    /// Catalog failure other than a missing table
    #[error("Catalog error: {0}")]
    CatalogFailure(String),

    /// Rejected analyzer configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SemanticError {
    /// Stable numeric error code
    pub fn code(&self) -> u16 {
        match self {
            SemanticError::MalformedLiteral(_) => 101,
            SemanticError::ImbalancedExpressionStack => 102,
            SemanticError::Unsupported(_) => 103,
            SemanticError::UnknownDataType(_) => 104,
            SemanticError::NestingTooDeep { .. } => 105,
            SemanticError::ViewParseFailed { .. } => 106,
            SemanticError::ColumnNotFound(_) => 201,
            SemanticError::AmbiguousColumn(..) => 202,
            SemanticError::AmbiguousTableAlias(_) => 203,
            SemanticError::TableAliasNotFound(_) => 204,
            SemanticError::TableNotFound(_) => 205,
            SemanticError::ColumnCountMismatch { .. } => 206,
            SemanticError::WildcardTableNotFound(_) => 207,
            SemanticError::AmbiguousWildcard(_) => 208,
            SemanticError::DuplicateCte(_) => 209,
            SemanticError::GroupByRequired(_) => 301,
            SemanticError::NotImplemented(_) => 302,
            SemanticError::IllegalParameterMarker(_) => 303,
            SemanticError::PositionOutOfRange { .. } => 304,
            SemanticError::UnionColumnCountMismatch { .. } => 305,
            SemanticError::SubqueryColumnCount { .. } => 306,
            SemanticError::InvalidAggregateQuantifier(_) => 307,
            SemanticError::IntoNotAllowed => 308,
            SemanticError::WildcardWithoutFrom => 309,
            SemanticError::NullColumnName => 901,
            SemanticError::MissingSubqueryTree => 902,
            SemanticError::SubqueryNotFound(_) => 903,
            SemanticError::InvalidStateTransition { .. } => 904,
            SemanticError::ParserUnavailable(_) => 905,
            SemanticError::CatalogFailure(_) => 906,
            SemanticError::InvalidConfiguration(_) => 950,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.code() {
            100..=199 => ErrorCategory::Syntax,
            200..=299 => ErrorCategory::Resolution,
            300..=399 => ErrorCategory::Semantic,
            _ => ErrorCategory::Internal,
        }
    }
}

impl From<CatalogError> for SemanticError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::TableNotFound(name) => SemanticError::TableNotFound(name),
            other => SemanticError::CatalogFailure(other.to_string()),
        }
    }
}
