// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for sqlgrid
//!
//! This crate provides common testing components including:
//! - Mock catalog with a standard schema
//! - A fixture SQL parser producing `sqlgrid_ir` queries
//! - SQL-specific test helpers and assertions
//! - Test fixtures and YAML scenario loading

pub mod assertions;
pub mod fixtures;
pub mod mock_catalog;
pub mod parser;
pub mod scenario;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

// Re-exports for convenience
pub use assertions::{SqlAssertions, normalize_whitespace};
pub use fixtures::SqlFixtures;
pub use mock_catalog::{MockCatalog, MockCatalogBuilder};
pub use parser::FixtureParser;
pub use scenario::{Expectation, Scenario, ScenarioError, load_scenarios, parse_scenarios};

static TRACING: Once = Once::new();

/// Install a test subscriber honouring `RUST_LOG`; later calls are no-ops
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
