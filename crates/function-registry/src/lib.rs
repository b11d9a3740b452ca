// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQL Function Registry
//!
//! This crate provides a centralized registry for builtin SQL functions.
//!
//! ## Features
//!
//! - Stable numeric [`FunctionId`]s consumed by the planner
//! - Aggregate vs scalar classification
//! - Return-type rules evaluated against argument types
//! - [`CUSTOM_ID`] for unknown functions, which pass through by name
//!
//! ## Usage
//!
//! ```rust
//! use sqlgrid_function_registry::{FunctionRegistry, CUSTOM_ID, ids};
//!
//! let registry = FunctionRegistry::new();
//! assert_eq!(registry.resolve_id("count"), ids::COUNT);
//! assert_eq!(registry.resolve_id("my_udf"), CUSTOM_ID);
//! ```

pub mod builtin;
pub mod ids;
pub mod registry;

// Re-exports from ir for convenience
pub use sqlgrid_ir::{TypeDescriptor, TypeKind};

pub use ids::{CUSTOM_ID, FunctionId};
pub use registry::{FunctionClass, FunctionDef, FunctionRegistry, ReturnRule};
