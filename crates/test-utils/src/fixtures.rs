// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Test fixtures and sample SQL queries
//!
//! All statements are written against
//! [`MockCatalogBuilder::with_standard_schema`](crate::MockCatalogBuilder::with_standard_schema).

/// Sample SQL queries for testing
pub struct SqlFixtures;

impl SqlFixtures {
    // ===== Reference scenarios =====

    /// Two tables joined through WHERE
    pub const fn comma_join() -> &'static str {
        "SELECT * FROM a, b WHERE a.x = b.x"
    }

    /// IN subquery that resolves entirely on its own
    pub const fn uncorrelated_in() -> &'static str {
        "SELECT n_name FROM nation WHERE n_nationkey IN (SELECT c_nationkey FROM customer)"
    }

    /// IN subquery reading the outer `c` alias
    pub const fn correlated_in() -> &'static str {
        "SELECT c_name FROM customer c WHERE c.c_custkey IN \
         (SELECT c_custkey FROM customer WHERE c.c_name LIKE '%1')"
    }

    /// Explicit LEFT OUTER JOIN
    pub const fn left_outer_join() -> &'static str {
        "SELECT a.x, b.y FROM a LEFT OUTER JOIN b ON a.id = b.id"
    }

    // ===== FROM clause =====

    /// Legacy `(+)` outer join
    pub const fn legacy_outer_join() -> &'static str {
        "SELECT a.x, b.y FROM a, b WHERE a.id = b.id(+)"
    }

    /// Derived table with renamed columns
    pub const fn derived_table() -> &'static str {
        "SELECT s.k, s.total FROM (SELECT o_custkey, sum(o_totalprice) FROM orders \
         GROUP BY o_custkey) s (k, total) WHERE s.total > 100"
    }

    /// CTE referenced twice
    pub const fn cte_self_join() -> &'static str {
        "WITH big AS (SELECT c_custkey, c_acctbal FROM customer WHERE c_acctbal > 1000) \
         SELECT b1.c_custkey FROM big b1, big b2 WHERE b1.c_acctbal = b2.c_acctbal"
    }

    /// View expanded into its own query tree
    pub const fn view_reference() -> &'static str {
        "SELECT v.n_name FROM customer_nation v WHERE v.c_custkey = 1"
    }

    /// NATURAL join over the shared `x`, `id` and `y` columns
    pub const fn natural_join() -> &'static str {
        "SELECT * FROM a NATURAL JOIN b"
    }

    /// USING join
    pub const fn using_join() -> &'static str {
        "SELECT a.y FROM a INNER JOIN b USING (id)"
    }

    // ===== Correlation =====

    /// Two correlated conditions in one subquery sharing a placeholder
    pub const fn correlated_exists() -> &'static str {
        "SELECT c.c_name FROM customer c WHERE EXISTS (SELECT 1 FROM orders o \
         WHERE o.o_custkey = c.c_custkey AND o.o_totalprice > c.c_acctbal)"
    }

    /// Scalar subquery in the projection
    pub const fn scalar_subquery() -> &'static str {
        "SELECT n_name, (SELECT count(*) FROM customer WHERE c_nationkey = n_nationkey) \
         FROM nation"
    }

    // ===== Grouping =====

    /// GROUP BY and ORDER BY ordinals
    pub const fn group_by_ordinal() -> &'static str {
        "SELECT o_custkey, count(*) FROM orders GROUP BY 1 ORDER BY 2 DESC"
    }

    /// HAVING over an aggregate
    pub const fn having_aggregate() -> &'static str {
        "SELECT o_custkey, sum(o_totalprice) AS total FROM orders GROUP BY o_custkey \
         HAVING sum(o_totalprice) > 10"
    }

    // ===== Expressions =====

    /// Keyword-shaped function calls and operators
    pub const fn expression_zoo() -> &'static str {
        "SELECT CASE WHEN a.x > 1 THEN 'big' ELSE 'small' END, \
         TRIM(LEADING 'x' FROM a.y), EXTRACT(YEAR FROM o.o_orderdate), \
         CAST(a.x AS BIGINT), (a.x + 1) * 2, -a.id \
         FROM a, orders o WHERE o.o_orderkey = a.id"
    }

    /// Date column compared with a plain string
    pub const fn date_comparison() -> &'static str {
        "SELECT o_orderkey FROM orders WHERE o_orderdate BETWEEN '2024-01-01' AND '2024-12-31'"
    }

    /// UNION of two compatible blocks
    pub const fn union_all() -> &'static str {
        "SELECT x FROM a UNION ALL SELECT x FROM b ORDER BY 1 LIMIT 10"
    }

    /// Statements exercising most of the renderer
    pub fn rebuild_corpus() -> Vec<&'static str> {
        vec![
            Self::comma_join(),
            Self::uncorrelated_in(),
            Self::correlated_in(),
            Self::left_outer_join(),
            Self::legacy_outer_join(),
            Self::derived_table(),
            Self::cte_self_join(),
            Self::natural_join(),
            Self::using_join(),
            Self::correlated_exists(),
            Self::scalar_subquery(),
            Self::group_by_ordinal(),
            Self::having_aggregate(),
            Self::expression_zoo(),
            Self::date_comparison(),
            Self::union_all(),
        ]
    }
}
