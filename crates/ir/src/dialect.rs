// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dialect Support
//!
//! The analyzer renders identifiers and data types back to SQL text for the
//! downstream planner. The spelling of both depends on the target dialect:
//!
//! - **PostgreSQL**: unquoted identifiers fold to lower case, `"quoted"`
//!   identifiers keep their case, `DOUBLE PRECISION`, `BYTEA`
//! - **MySQL**: identifiers keep their case, `` `quoted` `` identifiers,
//!   `DOUBLE`, `BLOB`
//!
//! Dialect does not change the analysis rules themselves. Everything the
//! binder does is dialect-agnostic; only the text rebuild consults it.

use serde::{Deserialize, Serialize};

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Dialect {
    /// PostgreSQL-compatible spelling (default)
    #[default]
    PostgreSQL,
    /// MySQL-compatible spelling
    MySQL,
}

/// How unquoted identifiers are normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierCase {
    /// Fold to lower case
    Lower,
    /// Fold to upper case
    Upper,
    /// Keep the spelling used in the statement
    Preserve,
}

impl Dialect {
    /// Case folding applied to unquoted identifiers by default
    pub fn default_identifier_case(&self) -> IdentifierCase {
        match self {
            Dialect::PostgreSQL => IdentifierCase::Lower,
            Dialect::MySQL => IdentifierCase::Preserve,
        }
    }

    /// Character used to delimit quoted identifiers
    pub fn identifier_quote(&self) -> char {
        match self {
            Dialect::PostgreSQL => '"',
            Dialect::MySQL => '`',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dialect_is_postgres() {
        assert_eq!(Dialect::default(), Dialect::PostgreSQL);
        assert_eq!(
            Dialect::PostgreSQL.default_identifier_case(),
            IdentifierCase::Lower
        );
    }

    #[test]
    fn test_quote_characters() {
        assert_eq!(Dialect::PostgreSQL.identifier_quote(), '"');
        assert_eq!(Dialect::MySQL.identifier_quote(), '`');
    }

    #[test]
    fn test_dialect_deserializes_lowercase() {
        let dialect: Dialect = serde_json::from_str("\"mysql\"").unwrap();
        assert_eq!(dialect, Dialect::MySQL);
    }
}
