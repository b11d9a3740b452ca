// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! YAML scenario files
//!
//! A scenario file is a YAML list of statements together with what the
//! analyzer should conclude about them:
//!
//! ```yaml
//! - name: comma join
//!   sql: SELECT * FROM a, b WHERE a.x = b.x
//!   expect:
//!     relations: [a, b]
//!     join_conditions: 1
//! - name: unknown table
//!   sql: SELECT * FROM nowhere
//!   expect:
//!     error_code: 205
//! ```
//!
//! Every expectation is optional; absent fields are not checked.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scenario file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Empty scenario file")]
    EmptyFile,
}

/// One statement and its expected analysis
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub sql: String,
    #[serde(default)]
    pub expect: Expectation,
}

/// Facts about the top-level query tree
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    /// Aliases of the FROM relations, in order
    pub relations: Option<Vec<String>>,
    /// Output column names
    pub projection: Option<Vec<String>>,
    pub join_conditions: Option<usize>,
    pub residual_conditions: Option<usize>,
    pub has_outer_join: Option<bool>,
    /// Whether any subquery tree ended up correlated
    pub correlated_subquery: Option<bool>,
    /// Numeric code of the expected error
    pub error_code: Option<u16>,
    /// Expected rebuilt statement
    pub rebuilt: Option<String>,
}

impl Expectation {
    pub fn expects_error(&self) -> bool {
        self.error_code.is_some()
    }
}

/// Parse scenarios from YAML text
pub fn parse_scenarios(content: &str) -> Result<Vec<Scenario>, ScenarioError> {
    let scenarios: Vec<Scenario> = serde_yaml::from_str(content)?;
    if scenarios.is_empty() {
        return Err(ScenarioError::EmptyFile);
    }
    Ok(scenarios)
}

/// Load scenarios from a YAML file
pub fn load_scenarios(path: impl AsRef<Path>) -> Result<Vec<Scenario>, ScenarioError> {
    let content = std::fs::read_to_string(path)?;
    parse_scenarios(&content)
}
