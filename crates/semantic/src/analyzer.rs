// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Semantic Analyzer
//!
//! Entry point of the analysis core. A [`SemanticAnalyzer`] holds the
//! read-only collaborators shared by every statement (catalog, view parser,
//! function registry and configuration) and turns each IR [`Query`] into an
//! [`AnalyzedQuery`]: the query graph with every tree bound, typed and
//! classified.
//!
//! Per-statement state lives in a fresh [`AnalysisContext`], so one analyzer
//! can serve any number of threads at once.

use std::sync::Arc;

use sqlgrid_catalog::Catalog;
use sqlgrid_function_registry::FunctionRegistry;
use sqlgrid_ir::{Dialect, Query, SqlParser};
use tracing::{debug, instrument};

use crate::config::AnalyzerConfig;
use crate::context::AnalysisContext;
use crate::error::{SemanticError, SemanticResult};
use crate::graph::{QueryGraph, TreeId};
use crate::ident::IdentifierResolver;
use crate::query_tree::{QueryTree, SqlRenderer, SubqueryRole};

/// Semantic analyzer for SQL queries
///
/// # Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use sqlgrid_semantic::SemanticAnalyzer;
///
/// let analyzer = SemanticAnalyzer::new(catalog).with_parser(parser);
/// let analyzed = analyzer.analyze_sql("SELECT * FROM a, b WHERE a.x = b.x")?;
/// assert_eq!(analyzed.root_tree().relations.len(), 2);
/// ```
#[derive(Clone)]
pub struct SemanticAnalyzer {
    catalog: Arc<dyn Catalog>,
    parser: Option<Arc<dyn SqlParser>>,
    registry: Arc<FunctionRegistry>,
    config: AnalyzerConfig,
}

impl SemanticAnalyzer {
    /// Create an analyzer with the default registry and configuration
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            parser: None,
            registry: Arc::new(FunctionRegistry::new()),
            config: AnalyzerConfig::default(),
        }
    }

    /// Parser used to expand view definitions and for [`analyze_sql`](Self::analyze_sql)
    pub fn with_parser(mut self, parser: Arc<dyn SqlParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_registry(mut self, registry: Arc<FunctionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze one statement
    #[instrument(skip_all)]
    pub fn analyze(&self, query: &Query) -> SemanticResult<AnalyzedQuery> {
        self.config.validate()?;

        let mut ctx = AnalysisContext::new(
            self.catalog.as_ref(),
            self.parser.as_deref(),
            self.registry.as_ref(),
            &self.config,
        );
        let root = ctx.build_query(query, SubqueryRole::None, None)?;
        let idents = ctx.idents;
        let mut graph = ctx.into_graph();

        let conditions: Vec<_> = graph.condition_ids().collect();
        for condition in conditions {
            graph.relation_nodes(condition);
        }

        debug!(
            trees = graph.tree_count(),
            relations = graph.relation_ids().count(),
            expressions = graph.expression_ids().count(),
            "Analyzed statement"
        );
        Ok(AnalyzedQuery {
            graph,
            root,
            idents,
            dialect: self.config.dialect,
        })
    }

    /// Parse `sql` with the configured parser and analyze it
    pub fn analyze_sql(&self, sql: &str) -> SemanticResult<AnalyzedQuery> {
        let parser = self
            .parser
            .as_ref()
            .ok_or_else(|| SemanticError::ParserUnavailable("<statement>".to_string()))?;
        let query = parser
            .parse_query(sql)
            .map_err(|err| SemanticError::Unsupported(err.to_string()))?;
        self.analyze(&query)
    }
}

/// Result of analyzing one statement
///
/// The graph is frozen: only shared references are handed out.
#[derive(Debug, Clone)]
pub struct AnalyzedQuery {
    graph: QueryGraph,
    root: TreeId,
    idents: IdentifierResolver,
    dialect: Dialect,
}

impl AnalyzedQuery {
    pub fn graph(&self) -> &QueryGraph {
        &self.graph
    }

    pub fn root(&self) -> TreeId {
        self.root
    }

    pub fn root_tree(&self) -> &QueryTree {
        self.graph.tree(self.root)
    }

    /// Renderer bound to this statement's identifier rules
    pub fn renderer(&self) -> SqlRenderer<'_> {
        SqlRenderer::new(&self.graph, self.idents, self.dialect)
    }

    /// Rebuilt SQL text of the whole statement
    pub fn sql(&self) -> String {
        self.renderer().query(self.root)
    }

    /// Output names of the top-level projection
    pub fn projection_names(&self) -> Vec<String> {
        self.root_tree()
            .projection
            .iter()
            .map(|id| {
                self.graph
                    .expression(*id)
                    .alias()
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }
}
