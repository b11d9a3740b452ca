// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Static Catalog
//!
//! An in-memory catalog holding predefined tables and views.
//!
//! ## Usage
//!
//! ```rust
//! use sqlgrid_catalog::{Catalog, StaticCatalog};
//!
//! let catalog = StaticCatalog::from_json(r#"{
//!     "tables": [{
//!         "name": "nation",
//!         "columns": [
//!             { "name": "n_nationkey", "data_type": { "kind": "Integer", "length": null, "precision": null, "scale": null } }
//!         ]
//!     }],
//!     "views": []
//! }"#).unwrap();
//!
//! assert!(catalog.lookup_table("nation").is_ok());
//! ```

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::metadata::{TableMetadata, ViewMetadata};
use crate::{Catalog, CatalogError, CatalogResult};

/// Static catalog with predefined schema data
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tables: HashMap<String, TableMetadata>,
    views: HashMap<String, ViewMetadata>,
}

/// JSON schema document accepted by [`StaticCatalog::from_json`]
#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    tables: Vec<TableMetadata>,
    #[serde(default)]
    views: Vec<ViewMetadata>,
}

impl StaticCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a JSON schema document
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::SerializationError` for malformed JSON and
    /// `CatalogError::DuplicateObject` when a name is declared twice.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let document: SchemaDocument = serde_json::from_str(json)
            .map_err(|e| CatalogError::SerializationError(e.to_string()))?;

        let mut catalog = Self::new();
        for table in document.tables {
            catalog.add_table(table)?;
        }
        for view in document.views {
            catalog.add_view(view)?;
        }
        debug!(
            tables = catalog.tables.len(),
            views = catalog.views.len(),
            "Loaded static catalog"
        );
        Ok(catalog)
    }

    /// Register a table
    pub fn add_table(&mut self, table: TableMetadata) -> CatalogResult<()> {
        if self.tables.contains_key(&table.name) || self.views.contains_key(&table.name) {
            return Err(CatalogError::DuplicateObject(table.name));
        }
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    /// Register a view
    pub fn add_view(&mut self, view: ViewMetadata) -> CatalogResult<()> {
        if self.tables.contains_key(&view.name) || self.views.contains_key(&view.name) {
            return Err(CatalogError::DuplicateObject(view.name));
        }
        self.views.insert(view.name.clone(), view);
        Ok(())
    }

    /// Builder form of [`StaticCatalog::add_table`]; replaces an existing entry
    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.views.remove(&table.name);
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Builder form of [`StaticCatalog::add_view`]; replaces an existing entry
    pub fn with_view(mut self, view: ViewMetadata) -> Self {
        self.tables.remove(&view.name);
        self.views.insert(view.name.clone(), view);
        self
    }

    /// Names of all registered tables, sorted
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Catalog for StaticCatalog {
    fn lookup_table(&self, name: &str) -> CatalogResult<TableMetadata> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound(name.to_string()))
    }

    fn lookup_view(&self, name: &str) -> CatalogResult<ViewMetadata> {
        self.views
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::ViewNotFound(name.to_string()))
    }

    fn is_view_exists(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ColumnMetadata, TypeDescriptor, TypeKind};

    fn nation() -> TableMetadata {
        TableMetadata::new("nation").with_columns(vec![
            ColumnMetadata::new("n_nationkey", TypeDescriptor::new(TypeKind::Integer))
                .with_primary_key(),
            ColumnMetadata::new("n_name", TypeDescriptor::new(TypeKind::Char).with_length(25)),
        ])
    }

    #[test]
    fn test_lookup_table_and_column() {
        let catalog = StaticCatalog::new().with_table(nation());

        let table = catalog.lookup_table("nation").unwrap();
        assert_eq!(table.columns.len(), 2);

        let column = catalog.lookup_column("nation", "n_name").unwrap();
        assert_eq!(column.data_type.kind, TypeKind::Char);
    }

    #[test]
    fn test_lookup_errors() {
        let catalog = StaticCatalog::new().with_table(nation());

        assert_eq!(
            catalog.lookup_table("region"),
            Err(CatalogError::TableNotFound("region".to_string()))
        );
        assert!(matches!(
            catalog.lookup_column("nation", "n_comment"),
            Err(CatalogError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            catalog.lookup_view("v"),
            Err(CatalogError::ViewNotFound(_))
        ));
    }

    #[test]
    fn test_views() {
        let catalog = StaticCatalog::new()
            .with_view(ViewMetadata::new("v_nation", "SELECT n_name FROM nation"));
        assert!(catalog.is_view_exists("v_nation"));
        assert!(!catalog.is_view_exists("nation"));
        assert_eq!(
            catalog.lookup_view("v_nation").unwrap().sql,
            "SELECT n_name FROM nation"
        );
    }

    #[test]
    fn test_duplicate_objects_rejected() {
        let mut catalog = StaticCatalog::new();
        catalog.add_table(nation()).unwrap();
        assert_eq!(
            catalog.add_table(nation()),
            Err(CatalogError::DuplicateObject("nation".to_string()))
        );
        assert!(catalog
            .add_view(ViewMetadata::new("nation", "SELECT 1"))
            .is_err());
    }

    #[test]
    fn test_from_json_rejects_malformed_input() {
        assert!(matches!(
            StaticCatalog::from_json("{ not json"),
            Err(CatalogError::SerializationError(_))
        ));
    }
}
