// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata types for database schema information
//!
//! This module defines the types the metadata provider hands to the analyzer:
//! tables (with their distribution across data nodes), columns and views.

use serde::{Deserialize, Serialize};

use crate::types::TypeDescriptor;

/// How a table's rows are spread over the data nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum Partitioning {
    /// Full copy on every node
    #[default]
    Replicated,
    /// Hash distributed on one column
    Hash { column: String },
    /// Round-robin distributed
    RoundRobin,
}

/// Reference to another table's column (foreign keys)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnReference {
    pub table: String,
    pub column: String,
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name
    pub name: String,
    /// Column type
    pub data_type: TypeDescriptor,
    /// Whether the column is nullable
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    #[serde(default)]
    pub references: Option<ColumnReference>,
    /// Internal row identifier, never part of `SELECT *`
    #[serde(default)]
    pub is_row_id: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnMetadata {
    /// Create a new nullable column
    pub fn new(name: impl Into<String>, data_type: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            is_primary_key: false,
            is_foreign_key: false,
            references: None,
            is_row_id: false,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Mark as primary key (implies NOT NULL)
    pub fn with_primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    pub fn with_foreign_key(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.is_foreign_key = true;
        self.references = Some(ColumnReference {
            table: table.into(),
            column: column.into(),
        });
        self
    }

    /// Mark as the internal row identifier
    pub fn with_row_id(mut self) -> Self {
        self.is_row_id = true;
        self
    }
}

/// Table metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnMetadata>,
    #[serde(default)]
    pub partitioning: Partitioning,
    /// Session temporary table
    #[serde(default)]
    pub temporary: bool,
}

impl TableMetadata {
    /// Create a new table without columns
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            partitioning: Partitioning::Replicated,
            temporary: false,
        }
    }

    pub fn with_columns(mut self, columns: Vec<ColumnMetadata>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_partitioning(mut self, partitioning: Partitioning) -> Self {
        self.partitioning = partitioning;
        self
    }

    pub fn with_temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns a wildcard expands to: everything except the row identifier
    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns.iter().filter(|c| !c.is_row_id)
    }
}

/// View metadata: stored definition plus declared output column names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewMetadata {
    pub name: String,
    /// SELECT statement the view was created with
    pub sql: String,
    /// `CREATE VIEW v (a, b) AS ...` column list, empty when not declared
    #[serde(default)]
    pub columns: Vec<String>,
}

impl ViewMetadata {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKind;

    #[test]
    fn test_visible_columns_skip_row_id() {
        let table = TableMetadata::new("orders").with_columns(vec![
            ColumnMetadata::new("xrowid", TypeDescriptor::new(TypeKind::BigInt)).with_row_id(),
            ColumnMetadata::new("o_orderkey", TypeDescriptor::new(TypeKind::Integer))
                .with_primary_key(),
            ColumnMetadata::new("o_comment", TypeDescriptor::varchar(79)),
        ]);

        let names: Vec<_> = table.visible_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["o_orderkey", "o_comment"]);
        assert!(table.get_column("xrowid").is_some());
    }

    #[test]
    fn test_primary_key_is_not_null() {
        let column =
            ColumnMetadata::new("id", TypeDescriptor::new(TypeKind::Integer)).with_primary_key();
        assert!(!column.nullable);
    }

    #[test]
    fn test_partitioning_json() {
        let table: TableMetadata = serde_json::from_str(
            r#"{
                "name": "lineitem",
                "columns": [],
                "partitioning": { "scheme": "hash", "column": "l_orderkey" }
            }"#,
        )
        .unwrap();
        assert_eq!(
            table.partitioning,
            Partitioning::Hash {
                column: "l_orderkey".to_string()
            }
        );
        assert!(!table.temporary);
    }
}
