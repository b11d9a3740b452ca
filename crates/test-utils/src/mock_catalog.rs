// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock catalog implementation for testing
//!
//! Wraps a [`StaticCatalog`] and counts lookups, so tests can check that the
//! analyzer asks the catalog again for every statement.

use std::sync::atomic::{AtomicUsize, Ordering};

use sqlgrid_catalog::{Catalog, CatalogResult, StaticCatalog};
use sqlgrid_ir::{ColumnMetadata, TableMetadata, TypeDescriptor, TypeKind, ViewMetadata};

/// In-memory mock catalog for testing
#[derive(Debug, Default)]
pub struct MockCatalog {
    inner: StaticCatalog,
    lookups: AtomicUsize,
}

impl MockCatalog {
    pub fn new(inner: StaticCatalog) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    /// Number of table and view lookups served so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    fn record(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }
}

impl Catalog for MockCatalog {
    fn lookup_table(&self, name: &str) -> CatalogResult<TableMetadata> {
        self.record();
        self.inner.lookup_table(name)
    }

    fn lookup_view(&self, name: &str) -> CatalogResult<ViewMetadata> {
        self.record();
        self.inner.lookup_view(name)
    }

    fn is_view_exists(&self, name: &str) -> bool {
        self.inner.is_view_exists(name)
    }
}

/// Builder for creating mock catalogs with a fluent API
#[derive(Debug, Default)]
pub struct MockCatalogBuilder {
    catalog: StaticCatalog,
}

fn int() -> TypeDescriptor {
    TypeDescriptor::new(TypeKind::Integer)
}

fn chars(length: u32) -> TypeDescriptor {
    TypeDescriptor::new(TypeKind::Char).with_length(length)
}

/// Hidden physical row identifier, excluded from `*`
fn row_id() -> ColumnMetadata {
    ColumnMetadata::new("rowid", TypeDescriptor::new(TypeKind::BigInt)).with_row_id()
}

impl MockCatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the standard test schema
    ///
    /// - `nation`, `customer`, `orders`: a TPC-H style slice
    /// - `a(x, id, y)` and `b(x, id, y)`: small tables sharing column names,
    ///   each with a hidden `rowid`
    /// - `scratch(x, z)`: a temporary table
    /// - `customer_nation`: a view joining `customer` and `nation`
    pub fn with_standard_schema(mut self) -> Self {
        let tables = [
            TableMetadata::new("nation").with_columns(vec![
                ColumnMetadata::new("n_nationkey", int()).with_primary_key(),
                ColumnMetadata::new("n_name", chars(25)),
                ColumnMetadata::new("n_regionkey", int()),
                ColumnMetadata::new("n_comment", TypeDescriptor::varchar(152)),
            ]),
            TableMetadata::new("customer").with_columns(vec![
                ColumnMetadata::new("c_custkey", int()).with_primary_key(),
                ColumnMetadata::new("c_name", TypeDescriptor::varchar(25)),
                ColumnMetadata::new("c_address", TypeDescriptor::varchar(40)),
                ColumnMetadata::new("c_nationkey", int()).with_foreign_key("nation", "n_nationkey"),
                ColumnMetadata::new("c_phone", chars(15)),
                ColumnMetadata::new("c_acctbal", TypeDescriptor::numeric(15, 2)),
                ColumnMetadata::new("c_mktsegment", chars(10)),
            ]),
            TableMetadata::new("orders").with_columns(vec![
                ColumnMetadata::new("o_orderkey", int()).with_primary_key(),
                ColumnMetadata::new("o_custkey", int()).with_foreign_key("customer", "c_custkey"),
                ColumnMetadata::new("o_orderstatus", chars(1)),
                ColumnMetadata::new("o_totalprice", TypeDescriptor::numeric(15, 2)),
                ColumnMetadata::new("o_orderdate", TypeDescriptor::new(TypeKind::Date)),
                ColumnMetadata::new("o_clerk", chars(15)),
            ]),
            TableMetadata::new("a").with_columns(vec![
                ColumnMetadata::new("x", int()),
                ColumnMetadata::new("id", int()),
                ColumnMetadata::new("y", TypeDescriptor::new(TypeKind::Text)),
                row_id(),
            ]),
            TableMetadata::new("b").with_columns(vec![
                ColumnMetadata::new("x", int()),
                ColumnMetadata::new("id", int()),
                ColumnMetadata::new("y", TypeDescriptor::new(TypeKind::Text)),
                row_id(),
            ]),
            TableMetadata::new("scratch")
                .with_columns(vec![
                    ColumnMetadata::new("x", int()),
                    ColumnMetadata::new("z", TypeDescriptor::new(TypeKind::Double)),
                ])
                .with_temporary(),
        ];
        for table in tables {
            self.catalog = self.catalog.with_table(table);
        }
        self.catalog = self.catalog.with_view(
            ViewMetadata::new(
                "customer_nation",
                "SELECT c.c_custkey, c.c_name, n.n_name FROM customer c, nation n \
                 WHERE c.c_nationkey = n.n_nationkey",
            )
            .with_columns(["c_custkey", "c_name", "n_name"]),
        );
        self
    }

    /// Add a custom table
    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.catalog = self.catalog.with_table(table);
        self
    }

    /// Add a custom view
    pub fn with_view(mut self, view: ViewMetadata) -> Self {
        self.catalog = self.catalog.with_view(view);
        self
    }

    /// Build the plain catalog
    pub fn build(self) -> StaticCatalog {
        self.catalog
    }

    /// Build a lookup-counting catalog
    pub fn build_mock(self) -> MockCatalog {
        MockCatalog::new(self.catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_schema_tables() {
        let catalog = MockCatalogBuilder::new().with_standard_schema().build();

        let mut names = catalog.table_names();
        names.sort_unstable();
        assert_eq!(names, vec!["a", "b", "customer", "nation", "orders", "scratch"]);
        assert!(catalog.is_view_exists("customer_nation"));
        assert!(catalog.lookup_table("scratch").unwrap().temporary);
    }

    #[test]
    fn test_row_id_hidden_from_visible_columns() {
        let catalog = MockCatalogBuilder::new().with_standard_schema().build();
        let a = catalog.lookup_table("a").unwrap();
        let visible: Vec<&str> = a.visible_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(visible, vec!["x", "id", "y"]);
        assert!(a.get_column("rowid").unwrap().is_row_id);
    }

    #[test]
    fn test_mock_counts_lookups() {
        let catalog = MockCatalogBuilder::new().with_standard_schema().build_mock();
        assert!(catalog.lookup_table("nation").is_ok());
        assert!(catalog.lookup_table("missing").is_err());
        assert_eq!(catalog.lookup_count(), 2);
    }
}
