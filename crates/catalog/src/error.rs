// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog errors

use serde::Serialize;
use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised by metadata lookups
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum CatalogError {
    /// Requested table was not found
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    /// Requested column was not found in an existing table
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Requested view was not found
    #[error("View '{0}' not found")]
    ViewNotFound(String),

    /// A table or view with this name is already registered
    #[error("Duplicate catalog object: {0}")]
    DuplicateObject(String),

    /// Failed to serialize or deserialize schema data
    #[error("Failed to deserialize schema data: {0}")]
    SerializationError(String),
}
