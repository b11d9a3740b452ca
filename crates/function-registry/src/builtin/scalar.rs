// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Scalar functions: keyword-shaped calls, strings and math

use crate::ids;
use crate::{FunctionDef, ReturnRule, TypeKind};

/// Get all builtin scalar functions
pub fn all_functions() -> Vec<FunctionDef> {
    use ReturnRule::{Argument, CommonArguments, Fixed};

    vec![
        // Keyword-shaped calls. CASE and CAST derive their type from their
        // shape, so the rule here is only a fallback.
        FunctionDef::new(ids::CASE, "CASE", CommonArguments),
        FunctionDef::new(ids::CAST, "CAST", Fixed(TypeKind::Unknown)),
        FunctionDef::new(ids::CONVERT, "CONVERT", Fixed(TypeKind::Text)),
        FunctionDef::new(ids::TRIM, "TRIM", Fixed(TypeKind::Text))
            .with_description("Remove leading and/or trailing characters"),
        FunctionDef::new(ids::EXTRACT, "EXTRACT", Fixed(TypeKind::Double))
            .with_description("Extract a field from a date/time value"),
        FunctionDef::new(ids::SUBSTRING, "SUBSTRING", Fixed(TypeKind::Text))
            .with_description("Extract substring"),
        FunctionDef::new(ids::OVERLAY, "OVERLAY", Fixed(TypeKind::Text))
            .with_description("Replace substring"),
        FunctionDef::new(ids::POSITION, "POSITION", Fixed(TypeKind::Integer))
            .with_description("Location of substring"),
        FunctionDef::new(ids::COALESCE, "COALESCE", CommonArguments)
            .with_description("First non-null argument"),
        FunctionDef::new(ids::NULLIF, "NULLIF", Argument(0))
            .with_description("NULL if both arguments are equal"),
        FunctionDef::new(ids::GREATEST, "GREATEST", CommonArguments),
        FunctionDef::new(ids::LEAST, "LEAST", CommonArguments),
        // Strings
        FunctionDef::new(ids::UPPER, "UPPER", Fixed(TypeKind::Text))
            .with_description("Convert to uppercase"),
        FunctionDef::new(ids::LOWER, "LOWER", Fixed(TypeKind::Text))
            .with_description("Convert to lowercase"),
        FunctionDef::new(ids::LENGTH, "LENGTH", Fixed(TypeKind::Integer))
            .with_description("Number of characters"),
        FunctionDef::new(ids::CHAR_LENGTH, "CHAR_LENGTH", Fixed(TypeKind::Integer)),
        FunctionDef::new(ids::CONCAT, "CONCAT", Fixed(TypeKind::Text))
            .with_description("Concatenate strings"),
        FunctionDef::new(ids::REPLACE, "REPLACE", Fixed(TypeKind::Text)),
        FunctionDef::new(ids::LTRIM, "LTRIM", Fixed(TypeKind::Text)),
        FunctionDef::new(ids::RTRIM, "RTRIM", Fixed(TypeKind::Text)),
        FunctionDef::new(ids::LPAD, "LPAD", Fixed(TypeKind::Text)),
        FunctionDef::new(ids::RPAD, "RPAD", Fixed(TypeKind::Text)),
        FunctionDef::new(ids::SPLIT_PART, "SPLIT_PART", Fixed(TypeKind::Text)),
        FunctionDef::new(ids::INITCAP, "INITCAP", Fixed(TypeKind::Text)),
        FunctionDef::new(ids::REPEAT, "REPEAT", Fixed(TypeKind::Text)),
        FunctionDef::new(ids::REVERSE, "REVERSE", Fixed(TypeKind::Text)),
        FunctionDef::new(ids::MD5, "MD5", Fixed(TypeKind::Text)),
        FunctionDef::new(ids::ASCII, "ASCII", Fixed(TypeKind::Integer)),
        FunctionDef::new(ids::CHR, "CHR", Fixed(TypeKind::Text)),
        // Math
        FunctionDef::new(ids::ABS, "ABS", Argument(0)).with_description("Absolute value"),
        FunctionDef::new(ids::CEIL, "CEIL", Argument(0))
            .with_description("Round up to nearest integer"),
        FunctionDef::new(ids::FLOOR, "FLOOR", Argument(0))
            .with_description("Round down to nearest integer"),
        FunctionDef::new(ids::ROUND, "ROUND", Argument(0))
            .with_description("Round to nearest decimal"),
        FunctionDef::new(ids::TRUNC, "TRUNC", Argument(0)),
        FunctionDef::new(ids::MOD, "MOD", CommonArguments),
        FunctionDef::new(ids::POWER, "POWER", Fixed(TypeKind::Double)),
        FunctionDef::new(ids::SQRT, "SQRT", Fixed(TypeKind::Double)),
        FunctionDef::new(ids::CBRT, "CBRT", Fixed(TypeKind::Double)),
        FunctionDef::new(ids::EXP, "EXP", Fixed(TypeKind::Double)),
        FunctionDef::new(ids::LN, "LN", Fixed(TypeKind::Double)),
        FunctionDef::new(ids::LOG, "LOG", Fixed(TypeKind::Double)),
        FunctionDef::new(ids::SIGN, "SIGN", Argument(0)),
        FunctionDef::new(ids::PI, "PI", Fixed(TypeKind::Double)),
        FunctionDef::new(ids::RANDOM, "RANDOM", Fixed(TypeKind::Double)),
    ]
}
