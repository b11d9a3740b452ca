// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Analysis Context
//!
//! Mutable state for analyzing one statement.
//!
//! The context owns the query graph arena, the tree tracker, the operand
//! stack used by the predicate builder, and the per-statement counters for
//! generated aliases and parameter markers. A fresh context is created for
//! every call to [`SemanticAnalyzer::analyze`](crate::SemanticAnalyzer::analyze),
//! so nothing leaks between statements.

use sqlgrid_catalog::Catalog;
use sqlgrid_function_registry::FunctionRegistry;
use sqlgrid_ir::SqlParser;
use tracing::trace;

use crate::config::AnalyzerConfig;
use crate::error::{SemanticError, SemanticResult};
use crate::expr::{ExprKind, SqlExpression};
use crate::graph::{ExprId, QueryGraph, TreeId};
use crate::ident::IdentifierResolver;
use crate::tracker::QueryTreeTracker;

/// Per-statement analysis state
pub struct AnalysisContext<'a> {
    pub(crate) catalog: &'a dyn Catalog,
    pub(crate) parser: Option<&'a dyn SqlParser>,
    pub(crate) registry: &'a FunctionRegistry,
    pub(crate) config: &'a AnalyzerConfig,
    pub(crate) idents: IdentifierResolver,
    pub(crate) graph: QueryGraph,
    pub(crate) tracker: QueryTreeTracker,

    /// Pending left operands of relational expressions
    operands: Vec<ExprId>,

    /// Counter for generated relation and expression names
    alias_counter: usize,

    /// Last positional parameter number handed out
    parameter_counter: u32,

    /// Current query nesting depth
    nesting_depth: usize,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        parser: Option<&'a dyn SqlParser>,
        registry: &'a FunctionRegistry,
        config: &'a AnalyzerConfig,
    ) -> Self {
        Self {
            catalog,
            parser,
            registry,
            config,
            idents: IdentifierResolver::from_config(config),
            graph: QueryGraph::new(),
            tracker: QueryTreeTracker::new(),
            operands: Vec::new(),
            alias_counter: 0,
            parameter_counter: 0,
            nesting_depth: 0,
        }
    }

    /// Generate a unique name such as `subquery_3`
    pub fn next_alias(&mut self, prefix: &str) -> String {
        self.alias_counter += 1;
        let name = format!("{}_{}", prefix, self.alias_counter);
        trace!(name = %name, "Generated alias");
        name
    }

    /// Number the next `?` marker, or validate an explicit `$n`
    ///
    /// # Errors
    ///
    /// `$0`, a number that does not parse, or a number above the configured
    /// parameter count is an illegal parameter marker.
    pub fn parameter_number(&mut self, text: &str) -> SemanticResult<u32> {
        let number = if text == "?" {
            self.parameter_counter += 1;
            self.parameter_counter
        } else {
            let digits = text.strip_prefix('$').unwrap_or(text);
            let number: u32 = digits
                .parse()
                .map_err(|_| SemanticError::IllegalParameterMarker(text.to_string()))?;
            if number == 0 {
                return Err(SemanticError::IllegalParameterMarker(text.to_string()));
            }
            self.parameter_counter = self.parameter_counter.max(number);
            number
        };

        if let Some(limit) = self.config.parameter_count {
            if number as usize > limit {
                return Err(SemanticError::IllegalParameterMarker(text.to_string()));
            }
        }
        Ok(number)
    }

    /// Increment nesting depth and check for overflow
    pub fn enter_nested(&mut self) -> SemanticResult<()> {
        self.nesting_depth += 1;
        if self.nesting_depth > self.config.max_nesting_depth {
            return Err(SemanticError::NestingTooDeep {
                limit: self.config.max_nesting_depth,
            });
        }
        Ok(())
    }

    /// Decrement nesting depth when a query tree is finished
    pub fn exit_nested(&mut self) {
        self.nesting_depth = self.nesting_depth.saturating_sub(1);
    }

    pub fn nesting_depth(&self) -> usize {
        self.nesting_depth
    }

    pub(crate) fn push_operand(&mut self, expr: ExprId) {
        self.operands.push(expr);
    }

    pub(crate) fn pop_operand(&mut self) -> SemanticResult<ExprId> {
        self.operands
            .pop()
            .ok_or(SemanticError::ImbalancedExpressionStack)
    }

    pub(crate) fn add_expression(&mut self, tree: TreeId, kind: ExprKind) -> ExprId {
        self.graph.add_expression(SqlExpression::new(tree, kind))
    }

    pub fn into_graph(self) -> QueryGraph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlgrid_catalog::StaticCatalog;

    fn with_context<R>(config: AnalyzerConfig, f: impl FnOnce(&mut AnalysisContext<'_>) -> R) -> R {
        let catalog = StaticCatalog::new();
        let registry = FunctionRegistry::new();
        let mut ctx = AnalysisContext::new(&catalog, None, &registry, &config);
        f(&mut ctx)
    }

    #[test]
    fn test_generated_aliases_are_unique() {
        with_context(AnalyzerConfig::default(), |ctx| {
            assert_eq!(ctx.next_alias("subquery"), "subquery_1");
            assert_eq!(ctx.next_alias("subquery"), "subquery_2");
            assert_eq!(ctx.next_alias("expr"), "expr_3");
        });
    }

    #[test]
    fn test_parameter_markers() {
        with_context(AnalyzerConfig::default().with_parameter_count(2), |ctx| {
            assert_eq!(ctx.parameter_number("$2"), Ok(2));
            assert_eq!(
                ctx.parameter_number("$0"),
                Err(SemanticError::IllegalParameterMarker("$0".to_string()))
            );
            assert!(ctx.parameter_number("$3").is_err());
            assert!(ctx.parameter_number("$x").is_err());
        });
    }

    #[test]
    fn test_positional_markers_are_numbered() {
        with_context(AnalyzerConfig::default(), |ctx| {
            assert_eq!(ctx.parameter_number("?"), Ok(1));
            assert_eq!(ctx.parameter_number("?"), Ok(2));
        });
    }

    #[test]
    fn test_nesting_depth_limit() {
        with_context(AnalyzerConfig::default().with_max_nesting_depth(2), |ctx| {
            ctx.enter_nested().unwrap();
            ctx.enter_nested().unwrap();
            assert_eq!(
                ctx.enter_nested(),
                Err(SemanticError::NestingTooDeep { limit: 2 })
            );
            ctx.exit_nested();
            ctx.exit_nested();
            ctx.exit_nested();
            assert_eq!(ctx.nesting_depth(), 0);
        });
    }

    #[test]
    fn test_operand_stack_underflow() {
        with_context(AnalyzerConfig::default(), |ctx| {
            assert_eq!(
                ctx.pop_operand(),
                Err(SemanticError::ImbalancedExpressionStack)
            );
        });
    }
}
