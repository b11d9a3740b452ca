// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query Representation
//!
//! Typed syntax of a SELECT statement as handed over by the parser.
//!
//! ## Query Structure
//!
//! A [`Query`] consists of:
//!
//! - **WITH**: Common Table Expressions visible to the whole statement
//! - **Body**: The first SELECT block
//! - **Unions**: Further SELECT blocks joined by `UNION` / `UNION ALL`
//! - **ORDER BY / LIMIT / OFFSET**: applied to the combined result
//!
//! Union branches are kept as a flat list rather than a binary tree. The
//! analyzer turns every branch into its own query tree hanging off the first.
//!
//! ## SELECT block
//!
//! [`SelectBlock`] contains the clauses of one block:
//!
//! - **Quantifier**: `ALL`, `DISTINCT` or `UNIQUE`
//! - **Projection**: select items, wildcards included
//! - **INTO**: `SELECT ... INTO [TEMP] table`
//! - **FROM**: comma-separated [`TableReference`]s, each a join chain
//! - **WHERE / GROUP BY / HAVING**
//!
//! ## Table References and Joins
//!
//! ```sql
//! FROM a, b LEFT OUTER JOIN c ON b.id = c.id, (SELECT 1) AS d (one)
//! ```
//!
//! is three table references: `a`, `b` with one LEFT OUTER join to `c`, and
//! the derived table `d` with one renamed output column.

use serde::{Deserialize, Serialize};

use crate::condition::SearchCondition;
use crate::expr::{Identifier, ValueExpr};

/// A complete SELECT statement (or a parenthesized subquery)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub with: Vec<CommonTableExpr>,
    pub body: SelectBlock,
    pub unions: Vec<UnionBranch>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Query {
    pub fn new(body: SelectBlock) -> Self {
        Self {
            with: Vec::new(),
            body,
            unions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn with_ctes(mut self, ctes: impl IntoIterator<Item = CommonTableExpr>) -> Self {
        self.with.extend(ctes);
        self
    }

    pub fn with_union(mut self, union_type: UnionType, body: SelectBlock) -> Self {
        self.unions.push(UnionBranch { union_type, body });
        self
    }

    pub fn with_order_by(mut self, order_by: Vec<OrderByItem>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionBranch {
    pub union_type: UnionType,
    pub body: SelectBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnionType {
    Union,
    UnionAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetQuantifier {
    All,
    Distinct,
    Unique,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectBlock {
    pub quantifier: Option<SetQuantifier>,
    pub projection: Vec<SelectItem>,
    pub into: Option<IntoTarget>,
    pub from: Vec<TableReference>,
    pub where_clause: Option<SearchCondition>,
    pub group_by: Vec<ValueExpr>,
    pub having: Option<SearchCondition>,
}

impl SelectBlock {
    pub fn new(projection: Vec<SelectItem>) -> Self {
        Self {
            projection,
            ..Default::default()
        }
    }

    pub fn with_from(mut self, from: Vec<TableReference>) -> Self {
        self.from = from;
        self
    }

    pub fn with_where(mut self, condition: SearchCondition) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn with_group_by(mut self, group_by: Vec<ValueExpr>) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_having(mut self, condition: SearchCondition) -> Self {
        self.having = Some(condition);
        self
    }

    pub fn with_quantifier(mut self, quantifier: SetQuantifier) -> Self {
        self.quantifier = Some(quantifier);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectItem {
    /// `*`
    Wildcard,
    /// `t.*`
    QualifiedWildcard(Identifier),
    Expr {
        expr: ValueExpr,
        alias: Option<Identifier>,
    },
}

impl SelectItem {
    pub fn expr(expr: ValueExpr) -> Self {
        SelectItem::Expr { expr, alias: None }
    }

    pub fn aliased(expr: ValueExpr, alias: impl Into<String>) -> Self {
        SelectItem::Expr {
            expr,
            alias: Some(Identifier::new(alias)),
        }
    }
}

/// `INTO [TEMP] table`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntoTarget {
    pub table: Identifier,
    pub temporary: bool,
}

/// One comma-separated FROM item with its join chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableReference {
    pub primary: TablePrimary,
    pub joins: Vec<Join>,
}

impl TableReference {
    pub fn new(primary: TablePrimary) -> Self {
        Self {
            primary,
            joins: Vec::new(),
        }
    }

    pub fn table(name: impl Into<String>) -> Self {
        Self::new(TablePrimary::named(name, None::<String>))
    }

    pub fn with_join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TablePrimary {
    /// Table, view or CTE name
    Named {
        name: Identifier,
        alias: Option<Identifier>,
        /// `ONLY name`, no inheritance children
        only: bool,
    },
    /// `(SELECT ...) [AS] alias [(columns)]`
    Derived {
        query: Box<Query>,
        alias: Option<Identifier>,
        columns: Vec<Identifier>,
    },
}

impl TablePrimary {
    pub fn named(name: impl Into<String>, alias: Option<impl Into<String>>) -> Self {
        TablePrimary::Named {
            name: Identifier::new(name),
            alias: alias.map(Identifier::new),
            only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub natural: bool,
    pub table: TablePrimary,
    pub constraint: Option<JoinConstraint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Cross,
    LeftOuter,
    RightOuter,
    FullOuter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JoinConstraint {
    On(SearchCondition),
    Using(Vec<Identifier>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByItem {
    pub expr: ValueExpr,
    pub direction: Option<SortDirection>,
    pub nulls: Option<NullsOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullsOrder {
    First,
    Last,
}

/// `name [(columns)] AS (query)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonTableExpr {
    pub name: Identifier,
    pub columns: Vec<Identifier>,
    pub query: Box<Query>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = Query::new(
            SelectBlock::new(vec![SelectItem::Wildcard])
                .with_from(vec![TableReference::table("a")]),
        )
        .with_limit(10)
        .with_offset(5);

        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(5));
        assert_eq!(query.body.from.len(), 1);
        assert!(query.unions.is_empty());
    }

    #[test]
    fn test_union_branches_are_flat() {
        let block = || SelectBlock::new(vec![SelectItem::Wildcard]);
        let query = Query::new(block())
            .with_union(UnionType::Union, block())
            .with_union(UnionType::UnionAll, block());
        assert_eq!(query.unions.len(), 2);
        assert_eq!(query.unions[1].union_type, UnionType::UnionAll);
    }

    #[test]
    fn test_query_serde_round_trip() {
        let query = Query::new(SelectBlock::new(vec![SelectItem::aliased(
            ValueExpr::column("id"),
            "key",
        )]));
        let json = serde_json::to_string(&query).unwrap();
        let back: Query = serde_json::from_str(&json).unwrap();
        assert_eq!(query, back);
    }
}
