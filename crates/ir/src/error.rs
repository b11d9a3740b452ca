// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Error types for the syntax layer

use thiserror::Error;

pub type IrResult<T> = Result<T, IrError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IrError {
    /// Type name not recognized by `CAST` / `::`
    #[error("Unknown data type: {0}")]
    UnknownType(String),

    /// Length/precision modifiers not valid for the type
    #[error("Invalid type modifier for {0}")]
    InvalidTypeModifier(String),

    /// The parser rejected the SQL text
    #[error("Syntax error at position {position}: {message}")]
    Syntax { message: String, position: usize },
}
