// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Parser boundary
//!
//! The grammar-driven parser lives outside this workspace. The analyzer only
//! needs it again for views, whose stored SQL text is re-parsed every time a
//! view is referenced.

use crate::error::IrResult;
use crate::query::Query;

/// Turns SQL text into a typed [`Query`]
pub trait SqlParser: Send + Sync {
    /// Parse a single SELECT statement
    fn parse_query(&self, sql: &str) -> IrResult<Query>;
}
