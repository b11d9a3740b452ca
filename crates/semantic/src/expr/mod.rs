// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Scalar expression tree
//!
//! [`SqlExpression`] nodes are built from the parser's value expressions by
//! folding each precedence level left to right (see [`builder`]). Column
//! references carry an [`AttributeColumn`] that binding fills in.

pub mod builder;

use serde::Serialize;
use sqlgrid_function_registry::FunctionId;
use sqlgrid_ir::{
    AdditiveOp, LiteralKind, MultiplicativeOp, PrefixOp, SetQuantifier, TrimSide, TypeDescriptor,
};

use crate::graph::{CondId, ExprId, RelId, TreeId};

/// Whether an expression is a pass-through between a derived relation and
/// its subquery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum MappedState {
    #[default]
    None,
    /// Projection entry of a subquery that an outer relation reads
    Internal,
    /// Entry on a derived relation that forwards to an `Internal` one
    External,
}

/// Bit set describing how a column was bound
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnGenre(u8);

impl ColumnGenre {
    /// Reads its value through another expression
    pub const MAPPED: ColumnGenre = ColumnGenre(0b01);
    /// Resolved in an enclosing query tree
    pub const ORPHAN: ColumnGenre = ColumnGenre(0b10);

    pub fn contains(self, other: ColumnGenre) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn insert(&mut self, other: ColumnGenre) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A column reference and what it resolved to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeColumn {
    pub column_name: String,
    pub column_alias: String,
    /// Catalog or CTE name of the owning relation, empty until bound
    pub table_name: String,
    /// Qualifier as written before binding, relation alias afterwards
    pub table_alias: String,
    pub relation: Option<RelId>,
    pub tree: TreeId,
    pub parent_condition: Option<CondId>,
    pub genre: ColumnGenre,
    pub column_type: Option<TypeDescriptor>,
    /// Legacy `(+)` outer-join marker
    pub outer_join_marker: bool,
}

impl AttributeColumn {
    pub fn new(tree: TreeId, qualifier: Option<String>, name: impl Into<String>) -> Self {
        let column_name = name.into();
        Self {
            column_alias: column_name.clone(),
            column_name,
            table_name: String::new(),
            table_alias: qualifier.unwrap_or_default(),
            relation: None,
            tree,
            parent_condition: None,
            genre: ColumnGenre::default(),
            column_type: None,
            outer_join_marker: false,
        }
    }

    pub fn qualifier(&self) -> Option<&str> {
        if self.table_alias.is_empty() {
            None
        } else {
            Some(&self.table_alias)
        }
    }

    pub fn is_bound(&self) -> bool {
        self.relation.is_some()
    }

    pub fn is_orphan(&self) -> bool {
        self.genre.contains(ColumnGenre::ORPHAN)
    }
}

/// Arithmetic, string and bitwise operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    Add,
    Subtract,
    Concat,
    Multiply,
    Divide,
    Modulo,
    Exponent,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    /// Unary `+`
    Identity,
    /// Unary `-`
    Negate,
    SquareRoot,
    CubeRoot,
    AbsoluteValue,
    BitNot,
    /// Prefix `!!`
    PrefixFactorial,
    /// Postfix `!`
    Factorial,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add | Operator::Identity => "+",
            Operator::Subtract | Operator::Negate => "-",
            Operator::Concat => "||",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Exponent => "^",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "#",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
            Operator::SquareRoot => "|/",
            Operator::CubeRoot => "||/",
            Operator::AbsoluteValue => "@",
            Operator::BitNot => "~",
            Operator::PrefixFactorial => "!!",
            Operator::Factorial => "!",
        }
    }

    /// Takes a single operand
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            Operator::Identity
                | Operator::Negate
                | Operator::SquareRoot
                | Operator::CubeRoot
                | Operator::AbsoluteValue
                | Operator::BitNot
                | Operator::PrefixFactorial
                | Operator::Factorial
        )
    }

    pub fn is_postfix(self) -> bool {
        self == Operator::Factorial
    }
}

impl From<AdditiveOp> for Operator {
    fn from(op: AdditiveOp) -> Self {
        match op {
            AdditiveOp::Plus => Operator::Add,
            AdditiveOp::Minus => Operator::Subtract,
            AdditiveOp::Concat => Operator::Concat,
        }
    }
}

impl From<MultiplicativeOp> for Operator {
    fn from(op: MultiplicativeOp) -> Self {
        match op {
            MultiplicativeOp::Multiply => Operator::Multiply,
            MultiplicativeOp::Divide => Operator::Divide,
            MultiplicativeOp::Modulo => Operator::Modulo,
            MultiplicativeOp::Exponent => Operator::Exponent,
            MultiplicativeOp::BitAnd => Operator::BitAnd,
            MultiplicativeOp::BitOr => Operator::BitOr,
            MultiplicativeOp::BitXor => Operator::BitXor,
            MultiplicativeOp::ShiftLeft => Operator::ShiftLeft,
            MultiplicativeOp::ShiftRight => Operator::ShiftRight,
        }
    }
}

impl From<PrefixOp> for Operator {
    fn from(op: PrefixOp) -> Self {
        match op {
            PrefixOp::Plus => Operator::Identity,
            PrefixOp::Minus => Operator::Negate,
            PrefixOp::SquareRoot => Operator::SquareRoot,
            PrefixOp::CubeRoot => Operator::CubeRoot,
            PrefixOp::AbsoluteValue => Operator::AbsoluteValue,
            PrefixOp::BitNot => Operator::BitNot,
            PrefixOp::Factorial => Operator::PrefixFactorial,
        }
    }
}

/// Typed constant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constant {
    pub kind: LiteralKind,
    /// Literal text without quotes
    pub value: String,
}

/// Argument layout of a function call, for the keyword-shaped forms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CallForm {
    /// `name(args...)`
    Plain,
    /// `COUNT(*)`, no arguments
    CountStar,
    /// `TRIM([side] [chars] FROM source)`; args are `[chars, source]` or `[source]`
    Trim {
        side: Option<TrimSide>,
        has_characters: bool,
    },
    /// `EXTRACT(field FROM source)`; args are `[source]`
    Extract(String),
    /// `SUBSTRING(source [FROM start] [FOR length])`
    Substring { has_start: bool, has_length: bool },
    /// `OVERLAY(source PLACING replacement FROM start [FOR length])`
    Overlay { has_length: bool },
    /// `POSITION(needle IN haystack)`
    Position,
    /// `CAST(expr AS target)` and `expr::target`
    Cast(TypeDescriptor),
    /// `CONVERT(expr USING encoding)`
    Convert(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionExpr {
    pub id: FunctionId,
    /// Upper-case registry name, or the name as written for custom calls
    pub name: String,
    pub args: Vec<ExprId>,
    pub quantifier: Option<SetQuantifier>,
    pub form: CallForm,
    pub aggregate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseExpression {
    /// Simple CASE operand
    pub operand: Option<ExprId>,
    /// `(WHEN, THEN)` pairs; a searched WHEN is a `Condition` expression
    pub branches: Vec<(ExprId, ExprId)>,
    pub else_result: Option<ExprId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorExpr {
    pub op: Operator,
    /// `None` for unary operators
    pub left: Option<ExprId>,
    pub right: ExprId,
}

/// Expression node kinds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Column(AttributeColumn),
    Constant(Constant),
    Function(FunctionExpr),
    Case(CaseExpression),
    Operator(OperatorExpr),
    /// Boolean condition used as a value
    Condition(CondId),
    /// Parenthesised SELECT with its own query tree
    Subquery(TreeId),
    /// Unexpanded `*` or `qualifier.*`
    ColumnList(Option<String>),
    /// `(a, b, ...)` row value or IN list
    List(Vec<ExprId>),
    /// Bound parameter `$n`
    Parameter(u32),
}

/// One node of the scalar expression tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlExpression {
    pub kind: ExprKind,
    pub data_type: Option<TypeDescriptor>,
    alias: Option<String>,
    outer_alias: Option<String>,
    pub mapped: MappedState,
    /// Expression this one forwards to
    pub mapped_from: Option<ExprId>,
    pub tree: TreeId,
    /// Rebuilt SQL text
    pub text: Option<String>,
}

impl SqlExpression {
    pub fn new(tree: TreeId, kind: ExprKind) -> Self {
        Self {
            kind,
            data_type: None,
            alias: None,
            outer_alias: None,
            mapped: MappedState::None,
            mapped_from: None,
            tree,
            text: None,
        }
    }

    /// Alias inside the owning tree; falls back to the outer alias
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref().or(self.outer_alias.as_deref())
    }

    /// Name seen by enclosing queries; falls back to the alias
    pub fn outer_alias(&self) -> Option<&str> {
        self.outer_alias.as_deref().or(self.alias.as_deref())
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = Some(alias.into());
    }

    pub fn set_outer_alias(&mut self, alias: impl Into<String>) {
        self.outer_alias = Some(alias.into());
    }

    pub fn has_explicit_alias(&self) -> bool {
        self.alias.is_some()
    }

    pub fn as_column(&self) -> Option<&AttributeColumn> {
        match &self.kind {
            ExprKind::Column(column) => Some(column),
            _ => None,
        }
    }

    pub(crate) fn as_column_mut(&mut self) -> Option<&mut AttributeColumn> {
        match &mut self.kind {
            ExprKind::Column(column) => Some(column),
            _ => None,
        }
    }

    pub fn is_aggregate_call(&self) -> bool {
        matches!(&self.kind, ExprKind::Function(function) if function.aggregate)
    }

    /// Direct child expressions, excluding subquery trees and conditions
    pub fn children(&self) -> Vec<ExprId> {
        match &self.kind {
            ExprKind::Function(function) => function.args.clone(),
            ExprKind::Case(case) => {
                let mut children: Vec<ExprId> = case.operand.into_iter().collect();
                for (when, then) in &case.branches {
                    children.push(*when);
                    children.push(*then);
                }
                children.extend(case.else_result);
                children
            }
            ExprKind::Operator(op) => op.left.into_iter().chain([op.right]).collect(),
            ExprKind::List(items) => items.clone(),
            ExprKind::Column(_)
            | ExprKind::Constant(_)
            | ExprKind::Condition(_)
            | ExprKind::Subquery(_)
            | ExprKind::ColumnList(_)
            | ExprKind::Parameter(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_defaults_to_outer_alias() {
        let mut expr = SqlExpression::new(TreeId(0), ExprKind::Parameter(1));
        assert_eq!(expr.alias(), None);

        expr.set_outer_alias("k");
        assert_eq!(expr.alias(), Some("k"));
        assert_eq!(expr.outer_alias(), Some("k"));

        expr.set_alias("inner");
        assert_eq!(expr.alias(), Some("inner"));
        assert_eq!(expr.outer_alias(), Some("k"));
    }

    #[test]
    fn test_column_genre_bits() {
        let mut genre = ColumnGenre::default();
        assert!(genre.is_empty());
        genre.insert(ColumnGenre::ORPHAN);
        assert!(genre.contains(ColumnGenre::ORPHAN));
        assert!(!genre.contains(ColumnGenre::MAPPED));
        genre.insert(ColumnGenre::MAPPED);
        assert!(genre.contains(ColumnGenre::MAPPED));
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(Operator::from(AdditiveOp::Concat).symbol(), "||");
        assert_eq!(Operator::from(PrefixOp::CubeRoot).symbol(), "||/");
        assert!(Operator::Factorial.is_postfix());
        assert!(Operator::Negate.is_unary());
        assert!(!Operator::Multiply.is_unary());
    }

    #[test]
    fn test_children_of_case() {
        let case = CaseExpression {
            operand: Some(ExprId(0)),
            branches: vec![(ExprId(1), ExprId(2))],
            else_result: Some(ExprId(3)),
        };
        let expr = SqlExpression::new(TreeId(0), ExprKind::Case(case));
        assert_eq!(
            expr.children(),
            vec![ExprId(0), ExprId(1), ExprId(2), ExprId(3)]
        );
    }
}
