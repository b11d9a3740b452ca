// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Value expressions
//!
//! Value expressions as produced by the grammar-driven parser.
//!
//! ## Design
//!
//! Operator precedence is not decided by a precedence table. It is encoded
//! structurally by the grammar levels, and this module keeps those levels:
//!
//! | level | node | operators |
//! |-------|------|-----------|
//! | 1 | [`ValueExpr`] | `+`, `-`, `\|\|` |
//! | 2 | [`Term`] | `*`, `/`, `%`, `^`, `&`, `\|`, `#`, `<<`, `>>` |
//! | 3 | [`Factor`] | prefix `+ - \|/ \|\|/ @ ~ !!`, postfix `!` and `::type` |
//! | primary | [`Primary`] | atoms |
//!
//! Each level holds its first operand and a list of `(operator, operand)`
//! pairs that the analyzer folds left-associatively:
//!
//! ```text
//! a - b + c * d
//!
//! ValueExpr {
//!   first: Term(a),
//!   rest: [(Minus, Term(b)), (Plus, Term { first: c, rest: [(Multiply, d)] })]
//! }
//! ```
//!
//! ## Literals
//!
//! [`Literal`] keeps the raw token text together with its lexical category.
//! Numeric text is validated by the analyzer, not by the parser, so a
//! malformed number surfaces as a semantic error with a stable code.
//!
//! ## Function calls
//!
//! Calls whose argument list is shaped by keywords (`TRIM(LEADING 'x' FROM s)`,
//! `EXTRACT(YEAR FROM d)`, `CAST(x AS INT)`, ...) have their own
//! [`FunctionCall`] variants. Everything else is [`FunctionCall::Generic`].

use serde::{Deserialize, Serialize};

use crate::condition::SearchCondition;
use crate::query::{Query, SetQuantifier};
use crate::types::TypeName;

/// An identifier as written in the statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    /// Identifier text without delimiters
    pub value: String,
    /// Whether the identifier was delimited (`"Name"`)
    pub quoted: bool,
}

impl Identifier {
    /// Create an unquoted identifier
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: false,
        }
    }

    /// Create a quoted identifier
    pub fn quoted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: true,
        }
    }
}

/// A column reference: `col`, `t.col`, or legacy `t.col(+)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnName {
    /// Table name or alias qualifier
    pub qualifier: Option<Identifier>,
    /// Column name
    pub name: Identifier,
    /// Legacy outer-join marker `(+)`
    pub outer_join_marker: bool,
}

impl ColumnName {
    /// Create an unqualified column reference
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: Identifier::new(name),
            outer_join_marker: false,
        }
    }

    /// Create a qualified column reference
    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(Identifier::new(qualifier)),
            name: Identifier::new(name),
            outer_join_marker: false,
        }
    }

    /// Mark the reference with the legacy `(+)` outer-join marker
    pub fn with_outer_join_marker(mut self) -> Self {
        self.outer_join_marker = true;
        self
    }
}

/// Level 1: additive expression, the root of every value expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueExpr {
    pub first: Term,
    pub rest: Vec<(AdditiveOp, Term)>,
}

/// Level 2: multiplicative and bitwise expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub first: Factor,
    pub rest: Vec<(MultiplicativeOp, Factor)>,
}

/// Level 3: primary with unary prefix and postfix operators
///
/// Prefix operators are listed outermost first: `- @ x` is
/// `prefix: [Minus, AbsoluteValue]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub prefix: Vec<PrefixOp>,
    pub primary: Primary,
    pub suffix: Vec<SuffixOp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdditiveOp {
    Plus,
    Minus,
    Concat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MultiplicativeOp {
    Multiply,
    Divide,
    Modulo,
    Exponent,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrefixOp {
    Plus,
    Minus,
    /// `|/`
    SquareRoot,
    /// `||/`
    CubeRoot,
    /// `@`
    AbsoluteValue,
    /// `~`
    BitNot,
    /// `!!`
    Factorial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SuffixOp {
    /// `!`
    Factorial,
    /// `::type`
    Cast(TypeName),
}

/// Atoms of the expression grammar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primary {
    Column(ColumnName),
    Literal(Literal),
    Function(Box<FunctionCall>),
    /// Parenthesized expression
    Nested(Box<ValueExpr>),
    /// Parenthesized scalar SELECT
    Subquery(Box<Query>),
}

/// A literal token with its lexical category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub kind: LiteralKind,
    /// Raw token text (string literals without quotes)
    pub text: String,
}

impl Literal {
    pub fn new(kind: LiteralKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn integer(value: i64) -> Self {
        Self::new(LiteralKind::Integer, value.to_string())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(LiteralKind::String, value)
    }

    pub fn null() -> Self {
        Self::new(LiteralKind::Null, "NULL")
    }
}

/// Lexical category of a literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralKind {
    Integer,
    Float,
    String,
    Date,
    Time,
    Timestamp,
    Interval,
    Binary,
    MacAddr,
    Cidr,
    Inet,
    Geometry,
    Boolean,
    Null,
    /// `$n` or `?`
    Parameter,
}

impl LiteralKind {
    /// Keyword prefix used when a typed literal is written back as text
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            LiteralKind::Date => Some("DATE"),
            LiteralKind::Time => Some("TIME"),
            LiteralKind::Timestamp => Some("TIMESTAMP"),
            LiteralKind::Interval => Some("INTERVAL"),
            LiteralKind::MacAddr => Some("MACADDR"),
            LiteralKind::Cidr => Some("CIDR"),
            LiteralKind::Inet => Some("INET"),
            LiteralKind::Geometry => Some("POINT"),
            _ => None,
        }
    }

    /// Whether the token text is written inside single quotes
    pub fn is_quoted(&self) -> bool {
        !matches!(
            self,
            LiteralKind::Integer
                | LiteralKind::Float
                | LiteralKind::Boolean
                | LiteralKind::Null
                | LiteralKind::Parameter
        )
    }
}

/// Function call shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FunctionCall {
    Case(CaseExpr),
    Count(CountArgument),
    Trim {
        side: Option<TrimSide>,
        characters: Option<ValueExpr>,
        source: ValueExpr,
    },
    Extract {
        field: String,
        source: ValueExpr,
    },
    Substring {
        source: ValueExpr,
        start: Option<ValueExpr>,
        length: Option<ValueExpr>,
    },
    Overlay {
        source: ValueExpr,
        replacement: ValueExpr,
        start: ValueExpr,
        length: Option<ValueExpr>,
    },
    Position {
        needle: ValueExpr,
        haystack: ValueExpr,
    },
    Cast {
        expr: ValueExpr,
        target: TypeName,
    },
    /// `CONVERT(expr USING encoding)`
    Convert {
        expr: ValueExpr,
        encoding: String,
    },
    /// `name([DISTINCT | ALL] args...)`
    Generic {
        name: Identifier,
        quantifier: Option<SetQuantifier>,
        args: Vec<ValueExpr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CountArgument {
    /// `COUNT(*)`
    Star,
    /// `COUNT([DISTINCT | ALL] expr)`
    Value {
        quantifier: Option<SetQuantifier>,
        expr: ValueExpr,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrimSide {
    Both,
    Leading,
    Trailing,
}

/// `CASE [operand] WHEN ... THEN ... [ELSE ...] END`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseExpr {
    /// Present for the simple form `CASE x WHEN 1 THEN ...`
    pub operand: Option<ValueExpr>,
    pub branches: Vec<WhenClause>,
    pub else_result: Option<ValueExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenClause {
    pub condition: WhenCondition,
    pub result: ValueExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WhenCondition {
    /// Compared for equality with the CASE operand
    Value(ValueExpr),
    /// Searched CASE condition
    Search(SearchCondition),
}

impl ValueExpr {
    /// Wrap a single factor
    pub fn from_factor(factor: Factor) -> Self {
        Self {
            first: Term {
                first: factor,
                rest: Vec::new(),
            },
            rest: Vec::new(),
        }
    }

    /// Wrap a primary without any operators
    pub fn from_primary(primary: Primary) -> Self {
        Self::from_factor(Factor {
            prefix: Vec::new(),
            primary,
            suffix: Vec::new(),
        })
    }

    pub fn column(name: impl Into<String>) -> Self {
        Self::from_primary(Primary::Column(ColumnName::new(name)))
    }

    pub fn qualified_column(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self::from_primary(Primary::Column(ColumnName::qualified(qualifier, name)))
    }

    pub fn literal(literal: Literal) -> Self {
        Self::from_primary(Primary::Literal(literal))
    }

    pub fn integer(value: i64) -> Self {
        Self::literal(Literal::integer(value))
    }

    /// Append a level 1 operation
    pub fn with_additive(mut self, op: AdditiveOp, term: Term) -> Self {
        self.rest.push((op, term));
        self
    }

    /// The bare primary when the expression carries no operator at all
    pub fn as_primary(&self) -> Option<&Primary> {
        if !self.rest.is_empty() || !self.first.rest.is_empty() {
            return None;
        }
        let factor = &self.first.first;
        if factor.prefix.is_empty() && factor.suffix.is_empty() {
            Some(&factor.primary)
        } else {
            None
        }
    }

    /// The literal when the expression is nothing but a literal
    pub fn as_literal(&self) -> Option<&Literal> {
        match self.as_primary() {
            Some(Primary::Literal(literal)) => Some(literal),
            _ => None,
        }
    }
}

impl Term {
    pub fn from_primary(primary: Primary) -> Self {
        Self {
            first: Factor::from(primary),
            rest: Vec::new(),
        }
    }
}

impl From<Primary> for Factor {
    fn from(primary: Primary) -> Self {
        Self {
            prefix: Vec::new(),
            primary,
            suffix: Vec::new(),
        }
    }
}
