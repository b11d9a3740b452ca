// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Date and time functions

use crate::ids;
use crate::{FunctionDef, ReturnRule, TypeKind};

/// Get all builtin date/time functions
pub fn all_functions() -> Vec<FunctionDef> {
    vec![
        FunctionDef::new(ids::NOW, "NOW", ReturnRule::Fixed(TypeKind::Timestamp))
            .with_description("Current date and time"),
        FunctionDef::new(ids::CURRENT_DATE, "CURRENT_DATE", ReturnRule::Fixed(TypeKind::Date)),
        FunctionDef::new(
            ids::CURRENT_TIMESTAMP,
            "CURRENT_TIMESTAMP",
            ReturnRule::Fixed(TypeKind::Timestamp),
        ),
        FunctionDef::new(ids::DATE_TRUNC, "DATE_TRUNC", ReturnRule::Argument(1))
            .with_description("Truncate to specified precision"),
        FunctionDef::new(ids::DATE_PART, "DATE_PART", ReturnRule::Fixed(TypeKind::Double)),
        FunctionDef::new(ids::AGE, "AGE", ReturnRule::Fixed(TypeKind::Interval)),
        FunctionDef::new(ids::TO_CHAR, "TO_CHAR", ReturnRule::Fixed(TypeKind::Text)),
        FunctionDef::new(ids::TO_DATE, "TO_DATE", ReturnRule::Fixed(TypeKind::Date)),
        FunctionDef::new(
            ids::TO_TIMESTAMP,
            "TO_TIMESTAMP",
            ReturnRule::Fixed(TypeKind::Timestamp),
        ),
    ]
}
