// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Builtin SQL function definitions
//!
//! Grouped by family. Ids are stable across releases; never renumber an
//! existing entry.

pub mod aggregate;
pub mod datetime;
pub mod scalar;

use crate::FunctionDef;

/// Every builtin function
pub fn all_functions() -> Vec<FunctionDef> {
    let mut functions = aggregate::all_functions();
    functions.extend(scalar::all_functions());
    functions.extend(datetime::all_functions());
    functions
}
