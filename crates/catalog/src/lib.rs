// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlgrid - Catalog Layer
//!
//! This crate defines the read-only metadata provider the analyzer resolves
//! names against:
//!
//! - **[`Catalog`]**: `lookup_table`, `lookup_column`, `lookup_view`,
//!   `is_view_exists`
//! - **[`StaticCatalog`]**: in-memory implementation, built in code or
//!   loaded from a JSON schema document
//!
//! ## Metadata Types
//!
//! - [`TableMetadata`]: columns, partitioning, temporary flag
//! - [`ColumnMetadata`]: type, nullability, keys, row-id flag
//! - [`ViewMetadata`]: stored SQL plus declared column names
//!
//! ## Usage
//!
//! ```rust
//! use sqlgrid_catalog::{Catalog, CatalogError, StaticCatalog};
//!
//! fn column_count(catalog: &impl Catalog, table: &str) -> Result<usize, CatalogError> {
//!     Ok(catalog.lookup_table(table)?.columns.len())
//! }
//!
//! assert!(column_count(&StaticCatalog::new(), "missing").is_err());
//! ```

pub mod error;
pub mod metadata;
pub mod r#static;
pub mod r#trait;

pub use error::{CatalogError, CatalogResult};
pub use metadata::{
    ColumnMetadata, ColumnReference, Partitioning, TableMetadata, TypeDescriptor, TypeKind,
    ViewMetadata,
};
pub use r#static::StaticCatalog;
pub use r#trait::Catalog;
