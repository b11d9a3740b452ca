// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Analyzer configuration
//!
//! Settings shared by every statement analyzed with one
//! [`SemanticAnalyzer`](crate::SemanticAnalyzer). All fields have defaults,
//! so a configuration file only needs to name what it changes.
//!
//! ```rust
//! use sqlgrid_semantic::AnalyzerConfig;
//! use sqlgrid_ir::{Dialect, IdentifierCase};
//!
//! let config = AnalyzerConfig::from_json_str(r#"{ "dialect": "mysql" }"#).unwrap();
//! assert_eq!(config.dialect, Dialect::MySQL);
//! assert_eq!(config.identifier_case(), IdentifierCase::Preserve);
//! assert_eq!(config.max_nesting_depth, 64);
//! ```

use serde::{Deserialize, Serialize};
use sqlgrid_ir::{Dialect, IdentifierCase};
use thiserror::Error;

use crate::error::SemanticError;

/// Default bound on nested query trees (subqueries, derived tables, views)
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Configuration validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to deserialize the configuration document
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Nesting depth must allow at least the top-level query
    #[error("max_nesting_depth must be > 0")]
    ZeroNestingDepth,
}

impl From<ConfigError> for SemanticError {
    fn from(err: ConfigError) -> Self {
        SemanticError::InvalidConfiguration(err.to_string())
    }
}

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Spelling used when rebuilding text
    pub dialect: Dialect,

    /// Case folding for unquoted identifiers; `None` follows the dialect
    pub identifier_case: Option<IdentifierCase>,

    /// Maximum depth of nested query trees
    pub max_nesting_depth: usize,

    /// Number of bound parameters; `$n` above this is rejected
    pub parameter_count: Option<usize>,

    /// Accept the legacy `(+)` outer-join marker in WHERE
    pub allow_legacy_outer_join: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::PostgreSQL,
            identifier_case: None,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            parameter_count: None,
            allow_legacy_outer_join: true,
        }
    }
}

impl AnalyzerConfig {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration document
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and any error from
    /// [`AnalyzerConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AnalyzerConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_identifier_case(mut self, case: IdentifierCase) -> Self {
        self.identifier_case = Some(case);
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_parameter_count(mut self, count: usize) -> Self {
        self.parameter_count = Some(count);
        self
    }

    pub fn with_legacy_outer_join(mut self, allow: bool) -> Self {
        self.allow_legacy_outer_join = allow;
        self
    }

    /// Effective case folding for unquoted identifiers
    pub fn identifier_case(&self) -> IdentifierCase {
        self.identifier_case
            .unwrap_or_else(|| self.dialect.default_identifier_case())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::ZeroNestingDepth);
        }
        Ok(())
    }
}
