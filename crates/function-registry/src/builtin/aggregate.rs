// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Aggregate functions

use crate::ids;
use crate::{FunctionDef, ReturnRule, TypeKind};

/// Get all builtin aggregate functions
pub fn all_functions() -> Vec<FunctionDef> {
    vec![
        FunctionDef::new(ids::COUNT, "COUNT", ReturnRule::Fixed(TypeKind::BigInt))
            .aggregate()
            .with_description("Count the number of rows"),
        FunctionDef::new(ids::SUM, "SUM", ReturnRule::Sum)
            .aggregate()
            .with_description("Sum of values"),
        FunctionDef::new(ids::AVG, "AVG", ReturnRule::Average)
            .aggregate()
            .with_description("Average of values"),
        FunctionDef::new(ids::MIN, "MIN", ReturnRule::Argument(0))
            .aggregate()
            .with_description("Minimum value"),
        FunctionDef::new(ids::MAX, "MAX", ReturnRule::Argument(0))
            .aggregate()
            .with_description("Maximum value"),
        FunctionDef::new(ids::STDDEV, "STDDEV", ReturnRule::Average)
            .aggregate()
            .with_description("Sample standard deviation"),
        FunctionDef::new(ids::STDDEV_POP, "STDDEV_POP", ReturnRule::Average)
            .aggregate()
            .with_description("Population standard deviation"),
        FunctionDef::new(ids::STDDEV_SAMP, "STDDEV_SAMP", ReturnRule::Average)
            .aggregate()
            .with_description("Sample standard deviation"),
        FunctionDef::new(ids::VARIANCE, "VARIANCE", ReturnRule::Average)
            .aggregate()
            .with_description("Sample variance"),
        FunctionDef::new(ids::VAR_POP, "VAR_POP", ReturnRule::Average)
            .aggregate()
            .with_description("Population variance"),
        FunctionDef::new(ids::VAR_SAMP, "VAR_SAMP", ReturnRule::Average)
            .aggregate()
            .with_description("Sample variance"),
        FunctionDef::new(ids::BOOL_AND, "BOOL_AND", ReturnRule::Fixed(TypeKind::Boolean))
            .aggregate()
            .with_description("True if all inputs are true"),
        FunctionDef::new(ids::BOOL_OR, "BOOL_OR", ReturnRule::Fixed(TypeKind::Boolean))
            .aggregate()
            .with_description("True if any input is true"),
        FunctionDef::new(ids::EVERY, "EVERY", ReturnRule::Fixed(TypeKind::Boolean))
            .aggregate()
            .with_description("Equivalent to BOOL_AND"),
        FunctionDef::new(ids::BIT_AND, "BIT_AND", ReturnRule::Argument(0))
            .aggregate()
            .with_description("Bitwise AND of all inputs"),
        FunctionDef::new(ids::BIT_OR, "BIT_OR", ReturnRule::Argument(0))
            .aggregate()
            .with_description("Bitwise OR of all inputs"),
    ]
}
