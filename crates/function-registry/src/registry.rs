// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use std::collections::HashMap;

use serde::Serialize;
use sqlgrid_ir::{TypeDescriptor, TypeKind};

use crate::builtin;
use crate::ids::{CUSTOM_ID, FunctionId};

/// Function classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FunctionClass {
    /// Aggregate function (COUNT, SUM, ...)
    Aggregate,
    /// Row-level function
    Scalar,
}

/// How the result type of a call is derived from its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReturnRule {
    /// Always this type
    Fixed(TypeKind),
    /// Type of the n-th argument
    Argument(usize),
    /// Promotion of all argument types
    CommonArguments,
    /// `SUM`: integers widen to BIGINT, everything else keeps its type
    Sum,
    /// `AVG` and the statistical aggregates: NUMERIC unless floating point
    Average,
}

/// One builtin function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDef {
    pub id: FunctionId,
    pub name: &'static str,
    pub class: FunctionClass,
    pub return_rule: ReturnRule,
    pub description: &'static str,
}

impl FunctionDef {
    /// Create a scalar function definition
    pub fn new(id: FunctionId, name: &'static str, return_rule: ReturnRule) -> Self {
        Self {
            id,
            name,
            class: FunctionClass::Scalar,
            return_rule,
            description: "",
        }
    }

    pub fn aggregate(mut self) -> Self {
        self.class = FunctionClass::Aggregate;
        self
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn is_aggregate(&self) -> bool {
        self.class == FunctionClass::Aggregate
    }

    /// Result type for the given argument types
    pub fn return_type(&self, args: &[TypeDescriptor]) -> TypeDescriptor {
        match &self.return_rule {
            ReturnRule::Fixed(kind) => TypeDescriptor::new(*kind),
            ReturnRule::Argument(index) => args
                .get(*index)
                .cloned()
                .unwrap_or_else(TypeDescriptor::unknown),
            ReturnRule::CommonArguments => args
                .iter()
                .fold(TypeDescriptor::unknown(), |acc, arg| acc.promote(arg)),
            ReturnRule::Sum => match args.first().map(|arg| arg.kind) {
                Some(TypeKind::SmallInt | TypeKind::Integer | TypeKind::BigInt) => {
                    TypeDescriptor::new(TypeKind::BigInt)
                }
                Some(_) => args[0].clone(),
                None => TypeDescriptor::unknown(),
            },
            ReturnRule::Average => match args.first().map(|arg| arg.kind) {
                Some(TypeKind::Real | TypeKind::Double) => TypeDescriptor::new(TypeKind::Double),
                _ => TypeDescriptor::new(TypeKind::Numeric),
            },
        }
    }
}

/// Function registry for builtin SQL functions
///
/// Lookup is case-insensitive. Names that are not registered resolve to
/// [`CUSTOM_ID`] and are passed through untouched.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    by_name: HashMap<String, FunctionDef>,
    by_id: HashMap<FunctionId, String>,
}

impl FunctionRegistry {
    /// Create a new function registry with all builtin functions loaded
    pub fn new() -> Self {
        let mut registry = Self {
            by_name: HashMap::new(),
            by_id: HashMap::new(),
        };
        for function in builtin::all_functions() {
            registry.register(function);
        }
        registry
    }

    /// Add or replace a function
    pub fn register(&mut self, function: FunctionDef) {
        let key = function.name.to_ascii_uppercase();
        self.by_id.insert(function.id, key.clone());
        self.by_name.insert(key, function);
    }

    /// Lookup a single function by name (case-insensitive)
    pub fn get_function(&self, name: &str) -> Option<&FunctionDef> {
        self.by_name.get(&name.to_ascii_uppercase())
    }

    /// Lookup a function by id
    pub fn get_by_id(&self, id: FunctionId) -> Option<&FunctionDef> {
        self.by_id.get(&id).and_then(|name| self.by_name.get(name))
    }

    /// Id for `name`, or [`CUSTOM_ID`] when unknown
    pub fn resolve_id(&self, name: &str) -> FunctionId {
        self.get_function(name).map_or(CUSTOM_ID, |f| f.id)
    }

    /// Check if a function exists
    pub fn has_function(&self, name: &str) -> bool {
        self.get_function(name).is_some()
    }

    /// Whether `name` is a registered aggregate
    pub fn is_aggregate(&self, name: &str) -> bool {
        self.get_function(name).is_some_and(FunctionDef::is_aggregate)
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
