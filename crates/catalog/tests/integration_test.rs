// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Integration tests for the catalog crate

use sqlgrid_catalog::{
    Catalog, CatalogError, ColumnMetadata, Partitioning, StaticCatalog, TableMetadata,
    TypeDescriptor, TypeKind, ViewMetadata,
};

// Catalog that only knows one table and relies on the default lookup_column
struct SingleTableCatalog;

impl Catalog for SingleTableCatalog {
    fn lookup_table(&self, name: &str) -> sqlgrid_catalog::CatalogResult<TableMetadata> {
        match name {
            "customer" => Ok(TableMetadata::new("customer")
                .with_columns(vec![
                    ColumnMetadata::new("c_custkey", TypeDescriptor::new(TypeKind::Integer))
                        .with_primary_key(),
                    ColumnMetadata::new("c_name", TypeDescriptor::varchar(25)),
                ])
                .with_partitioning(Partitioning::Hash {
                    column: "c_custkey".to_string(),
                })),
            _ => Err(CatalogError::TableNotFound(name.to_string())),
        }
    }

    fn lookup_view(&self, name: &str) -> sqlgrid_catalog::CatalogResult<ViewMetadata> {
        Err(CatalogError::ViewNotFound(name.to_string()))
    }

    fn is_view_exists(&self, _name: &str) -> bool {
        false
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_default_lookup_column() {
    let catalog = SingleTableCatalog;
    let column = catalog.lookup_column("customer", "c_name").unwrap();
    assert_eq!(column.data_type, TypeDescriptor::varchar(25));

    assert_eq!(
        catalog.lookup_column("customer", "c_phone"),
        Err(CatalogError::ColumnNotFound {
            table: "customer".to_string(),
            column: "c_phone".to_string(),
        })
    );
    assert!(matches!(
        catalog.lookup_column("orders", "o_orderkey"),
        Err(CatalogError::TableNotFound(_))
    ));
}

#[test]
fn test_catalog_as_trait_object() {
    let catalog: Box<dyn Catalog> = Box::new(SingleTableCatalog);
    assert!(!catalog.is_view_exists("customer"));
    assert!(catalog.lookup_table("customer").is_ok());
}

#[test]
fn test_static_catalog_from_json() {
    init_tracing();

    let catalog = StaticCatalog::from_json(
        r#"{
            "tables": [
                {
                    "name": "orders",
                    "columns": [
                        { "name": "xrowid", "data_type": { "kind": "BigInt" }, "is_row_id": true },
                        { "name": "o_orderkey", "data_type": { "kind": "Integer" }, "is_primary_key": true },
                        { "name": "o_orderdate", "data_type": { "kind": "Date" } }
                    ],
                    "partitioning": { "scheme": "hash", "column": "o_orderkey" }
                },
                { "name": "tmp_orders", "columns": [], "temporary": true }
            ],
            "views": [
                { "name": "recent_orders", "sql": "SELECT o_orderkey FROM orders", "columns": ["k"] }
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(catalog.table_names(), vec!["orders", "tmp_orders"]);

    let orders = catalog.lookup_table("orders").unwrap();
    assert_eq!(orders.visible_columns().count(), 2);
    assert!(orders.columns[0].is_row_id);
    assert!(orders.columns[1].is_primary_key);

    assert!(catalog.lookup_table("tmp_orders").unwrap().temporary);

    let view = catalog.lookup_view("recent_orders").unwrap();
    assert_eq!(view.columns, vec!["k".to_string()]);
}

#[test]
fn test_static_catalog_duplicate_in_json() {
    let result = StaticCatalog::from_json(
        r#"{ "tables": [ { "name": "t", "columns": [] }, { "name": "t", "columns": [] } ] }"#,
    );
    assert_eq!(result.err(), Some(CatalogError::DuplicateObject("t".to_string())));
}
