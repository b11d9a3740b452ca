// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog trait
//!
//! The analyzer's only window onto schema storage. Lookups are synchronous
//! and read-only. Results are not cached by the analyzer across statements,
//! so implementations decide their own caching policy.

use crate::error::{CatalogError, CatalogResult};
use crate::metadata::{ColumnMetadata, TableMetadata, ViewMetadata};

/// Read-only metadata provider
pub trait Catalog: Send + Sync {
    /// Look up a table by name
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::TableNotFound` if no such table exists.
    fn lookup_table(&self, name: &str) -> CatalogResult<TableMetadata>;

    /// Look up one column of a table
    ///
    /// The default implementation goes through [`Catalog::lookup_table`].
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::TableNotFound` or `CatalogError::ColumnNotFound`.
    fn lookup_column(&self, table: &str, column: &str) -> CatalogResult<ColumnMetadata> {
        let metadata = self.lookup_table(table)?;
        metadata
            .get_column(column)
            .cloned()
            .ok_or_else(|| CatalogError::ColumnNotFound {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    /// Look up a view definition
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ViewNotFound` if no such view exists.
    fn lookup_view(&self, name: &str) -> CatalogResult<ViewMetadata>;

    /// Whether `name` is a view
    fn is_view_exists(&self, name: &str) -> bool;
}
