// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Search conditions
//!
//! Boolean expressions used by WHERE, HAVING, JOIN ... ON and searched CASE.
//!
//! ```text
//! SearchCondition      OR-list of AndSequence
//!   AndSequence        AND-list of UnaryLogical
//!     UnaryLogical     [NOT] LogicalPrimary
//!       LogicalPrimary TRUE | FALSE | EXISTS (query) | (condition) | RelationalExpr
//! ```
//!
//! A [`RelationalExpr`] is a left operand (one expression or a row list)
//! followed by at most one [`RelationalTail`]. A relational expression with no
//! tail is a boolean-valued expression such as a boolean column.

use serde::{Deserialize, Serialize};

use crate::expr::ValueExpr;
use crate::query::Query;

/// OR-separated list of AND sequences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCondition {
    pub disjuncts: Vec<AndSequence>,
}

/// AND-separated list of unary logical terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AndSequence {
    pub conjuncts: Vec<UnaryLogical>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryLogical {
    pub negated: bool,
    pub primary: LogicalPrimary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalPrimary {
    /// `TRUE` / `FALSE`
    Boolean(bool),
    Exists(Box<Query>),
    Nested(Box<SearchCondition>),
    Relational(RelationalExpr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationalExpr {
    pub left: Operand,
    pub tail: Option<RelationalTail>,
}

/// Left operand of a relational expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Single(ValueExpr),
    /// Row value `(a, b)`
    List(Vec<ValueExpr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelationalTail {
    Compare {
        op: CompareOp,
        right: CompareRight,
    },
    In {
        negated: bool,
        source: InSource,
    },
    Between {
        negated: bool,
        low: ValueExpr,
        high: ValueExpr,
    },
    Like {
        negated: bool,
        kind: PatternKind,
        pattern: ValueExpr,
        escape: Option<ValueExpr>,
    },
    RegexMatch {
        op: RegexOp,
        pattern: ValueExpr,
    },
    IsNull {
        negated: bool,
    },
    IsBoolean {
        negated: bool,
        value: TruthValue,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompareRight {
    Expr(ValueExpr),
    List(Vec<ValueExpr>),
    Subquery {
        quantifier: Option<SubqueryQuantifier>,
        query: Box<Query>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubqueryQuantifier {
    Any,
    All,
    Some,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InSource {
    Subquery(Box<Query>),
    List(Vec<ValueExpr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    Like,
    ILike,
    SimilarTo,
}

/// POSIX regular expression match operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegexOp {
    /// `~`
    Match,
    /// `~*`
    MatchInsensitive,
    /// `!~`
    NotMatch,
    /// `!~*`
    NotMatchInsensitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TruthValue {
    True,
    False,
    Unknown,
}

impl SearchCondition {
    /// Condition made of a single relational expression
    pub fn relational(expr: RelationalExpr) -> Self {
        Self {
            disjuncts: vec![AndSequence {
                conjuncts: vec![UnaryLogical {
                    negated: false,
                    primary: LogicalPrimary::Relational(expr),
                }],
            }],
        }
    }

    /// `left op right`
    pub fn compare(left: ValueExpr, op: CompareOp, right: ValueExpr) -> Self {
        Self::relational(RelationalExpr {
            left: Operand::Single(left),
            tail: Some(RelationalTail::Compare {
                op,
                right: CompareRight::Expr(right),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_builds_single_conjunct() {
        let cond = SearchCondition::compare(
            ValueExpr::qualified_column("a", "x"),
            CompareOp::Eq,
            ValueExpr::qualified_column("b", "x"),
        );
        assert_eq!(cond.disjuncts.len(), 1);
        assert_eq!(cond.disjuncts[0].conjuncts.len(), 1);
        assert!(!cond.disjuncts[0].conjuncts[0].negated);
    }

    #[test]
    fn test_compare_op_text() {
        assert_eq!(CompareOp::NotEq.as_str(), "<>");
        assert_eq!(CompareOp::GtEq.as_str(), ">=");
    }
}
