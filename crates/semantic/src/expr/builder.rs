// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! Construction of [`SqlExpression`](super::SqlExpression) trees
//!
//! Additive and multiplicative levels fold left to right into `Operator`
//! nodes over the running accumulator. Within a factor, postfix operators
//! bind tighter than prefix ones.

use sqlgrid_ir::{ColumnName, Factor, Literal, LiteralKind, Primary, Query, SuffixOp, Term, ValueExpr};
use tracing::trace;

use crate::context::AnalysisContext;
use crate::error::{SemanticError, SemanticResult};
use crate::expr::{AttributeColumn, Constant, ExprKind, Operator, OperatorExpr};
use crate::graph::{ExprId, TreeId};
use crate::query_tree::SubqueryRole;

impl AnalysisContext<'_> {
    /// Build an expression tree owned by `tree`
    pub(crate) fn build_value_expr(
        &mut self,
        tree: TreeId,
        expr: &ValueExpr,
    ) -> SemanticResult<ExprId> {
        let mut accumulator = self.build_term(tree, &expr.first)?;
        for (op, term) in &expr.rest {
            let right = self.build_term(tree, term)?;
            accumulator = self.binary(tree, Operator::from(*op), accumulator, right);
        }
        Ok(accumulator)
    }

    fn build_term(&mut self, tree: TreeId, term: &Term) -> SemanticResult<ExprId> {
        let mut accumulator = self.build_factor(tree, &term.first)?;
        for (op, factor) in &term.rest {
            let right = self.build_factor(tree, factor)?;
            accumulator = self.binary(tree, Operator::from(*op), accumulator, right);
        }
        Ok(accumulator)
    }

    fn build_factor(&mut self, tree: TreeId, factor: &Factor) -> SemanticResult<ExprId> {
        let mut accumulator = self.build_primary(tree, &factor.primary)?;
        for suffix in &factor.suffix {
            accumulator = match suffix {
                SuffixOp::Factorial => self.unary(tree, Operator::Factorial, accumulator),
                SuffixOp::Cast(target) => self.build_cast(tree, accumulator, target)?,
            };
        }
        // prefix operators are listed outermost first
        for prefix in factor.prefix.iter().rev() {
            accumulator = self.unary(tree, Operator::from(*prefix), accumulator);
        }
        Ok(accumulator)
    }

    fn build_primary(&mut self, tree: TreeId, primary: &Primary) -> SemanticResult<ExprId> {
        match primary {
            Primary::Column(column) => Ok(self.build_column(tree, column)),
            Primary::Literal(literal) => self.build_literal(tree, literal),
            Primary::Function(call) => self.build_function(tree, call),
            Primary::Nested(inner) => self.build_value_expr(tree, inner),
            Primary::Subquery(query) => {
                self.build_subquery_expression(tree, query, SubqueryRole::Scalar)
            }
        }
    }

    pub(crate) fn build_column(&mut self, tree: TreeId, column: &ColumnName) -> ExprId {
        let qualifier = column.qualifier.as_ref().map(|q| self.idents.normalize(q));
        let name = self.idents.normalize(&column.name);
        let mut attribute = AttributeColumn::new(tree, qualifier, name);
        attribute.outer_join_marker = column.outer_join_marker;
        self.add_expression(tree, ExprKind::Column(attribute))
    }

    fn build_literal(&mut self, tree: TreeId, literal: &Literal) -> SemanticResult<ExprId> {
        let text = literal.text.as_str();
        let kind = match literal.kind {
            LiteralKind::Parameter => ExprKind::Parameter(self.parameter_number(text)?),
            LiteralKind::Integer => {
                if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
                    return Err(SemanticError::MalformedLiteral(text.to_string()));
                }
                constant(literal.kind, text)
            }
            LiteralKind::Float => {
                if text.parse::<f64>().is_err() {
                    return Err(SemanticError::MalformedLiteral(text.to_string()));
                }
                constant(literal.kind, text)
            }
            LiteralKind::Boolean => {
                if text.eq_ignore_ascii_case("true") {
                    constant(literal.kind, "TRUE")
                } else if text.eq_ignore_ascii_case("false") {
                    constant(literal.kind, "FALSE")
                } else {
                    return Err(SemanticError::MalformedLiteral(text.to_string()));
                }
            }
            LiteralKind::Null => constant(literal.kind, "NULL"),
            _ => constant(literal.kind, text),
        };
        Ok(self.add_expression(tree, kind))
    }

    /// Build `query` as a subtree of `tree` and wrap it in an expression
    pub(crate) fn build_subquery_expression(
        &mut self,
        tree: TreeId,
        query: &Query,
        role: SubqueryRole,
    ) -> SemanticResult<ExprId> {
        let subtree = self.build_query(query, role, Some(tree))?;
        if role == SubqueryRole::Scalar {
            let width = self.graph.tree(subtree).projection.len();
            if width != 1 {
                return Err(SemanticError::SubqueryColumnCount {
                    expected: 1,
                    found: width,
                });
            }
        }
        trace!(tree = %tree, subtree = %subtree, role = ?role, "Built subquery expression");
        Ok(self.add_expression(tree, ExprKind::Subquery(subtree)))
    }

    pub(crate) fn integer_constant(&mut self, tree: TreeId, value: i64) -> ExprId {
        self.add_expression(tree, constant(LiteralKind::Integer, &value.to_string()))
    }

    fn binary(&mut self, tree: TreeId, op: Operator, left: ExprId, right: ExprId) -> ExprId {
        self.add_expression(
            tree,
            ExprKind::Operator(OperatorExpr {
                op,
                left: Some(left),
                right,
            }),
        )
    }

    fn unary(&mut self, tree: TreeId, op: Operator, operand: ExprId) -> ExprId {
        self.add_expression(
            tree,
            ExprKind::Operator(OperatorExpr {
                op,
                left: None,
                right: operand,
            }),
        )
    }
}

fn constant(kind: LiteralKind, value: &str) -> ExprKind {
    ExprKind::Constant(Constant {
        kind,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use sqlgrid_catalog::StaticCatalog;
    use sqlgrid_function_registry::FunctionRegistry;
    use sqlgrid_ir::{AdditiveOp, MultiplicativeOp, PrefixOp};

    fn with_context<R>(f: impl FnOnce(&mut AnalysisContext<'_>) -> R) -> R {
        let catalog = StaticCatalog::new();
        let registry = FunctionRegistry::new();
        let config = AnalyzerConfig::default();
        let mut ctx = AnalysisContext::new(&catalog, None, &registry, &config);
        f(&mut ctx)
    }

    fn operator(ctx: &AnalysisContext<'_>, id: ExprId) -> OperatorExpr {
        match &ctx.graph.expression(id).kind {
            ExprKind::Operator(op) => op.clone(),
            other => panic!("expected operator, got {:?}", other),
        }
    }

    #[test]
    fn test_additive_level_folds_left() {
        // 1 + 2 - 3 => (1 + 2) - 3
        let expr = ValueExpr::integer(1)
            .with_additive(AdditiveOp::Plus, Term::from_primary(Primary::Literal(Literal::integer(2))))
            .with_additive(AdditiveOp::Minus, Term::from_primary(Primary::Literal(Literal::integer(3))));

        with_context(|ctx| {
            let root = ctx.build_value_expr(TreeId(0), &expr).unwrap();
            let outer = operator(ctx, root);
            assert_eq!(outer.op, Operator::Subtract);
            let inner = operator(ctx, outer.left.unwrap());
            assert_eq!(inner.op, Operator::Add);
        });
    }

    #[test]
    fn test_multiplicative_binds_tighter() {
        // 1 + 2 * 3
        let term = Term {
            first: Factor::from(Primary::Literal(Literal::integer(2))),
            rest: vec![(
                MultiplicativeOp::Multiply,
                Factor::from(Primary::Literal(Literal::integer(3))),
            )],
        };
        let expr = ValueExpr::integer(1).with_additive(AdditiveOp::Plus, term);

        with_context(|ctx| {
            let root = ctx.build_value_expr(TreeId(0), &expr).unwrap();
            let add = operator(ctx, root);
            assert_eq!(add.op, Operator::Add);
            assert_eq!(operator(ctx, add.right).op, Operator::Multiply);
        });
    }

    #[test]
    fn test_prefix_and_suffix_order() {
        // -|/ x!  => -(|/(x!))
        let expr = ValueExpr::from_factor(Factor {
            prefix: vec![PrefixOp::Minus, PrefixOp::SquareRoot],
            primary: Primary::Column(ColumnName::new("x")),
            suffix: vec![SuffixOp::Factorial],
        });

        with_context(|ctx| {
            let root = ctx.build_value_expr(TreeId(0), &expr).unwrap();
            let negate = operator(ctx, root);
            assert_eq!(negate.op, Operator::Negate);
            assert!(negate.left.is_none());
            let sqrt = operator(ctx, negate.right);
            assert_eq!(sqrt.op, Operator::SquareRoot);
            assert_eq!(operator(ctx, sqrt.right).op, Operator::Factorial);
        });
    }

    #[test]
    fn test_column_names_are_normalized() {
        let expr = ValueExpr::qualified_column("C", "C_Name");
        with_context(|ctx| {
            let id = ctx.build_value_expr(TreeId(0), &expr).unwrap();
            let column = ctx.graph.expression(id).as_column().unwrap().clone();
            assert_eq!(column.column_name, "c_name");
            assert_eq!(column.qualifier(), Some("c"));
            assert!(!column.is_bound());
        });
    }

    #[test]
    fn test_malformed_literals() {
        with_context(|ctx| {
            let bad_int = ValueExpr::literal(Literal::new(LiteralKind::Integer, "12a"));
            assert_eq!(
                ctx.build_value_expr(TreeId(0), &bad_int),
                Err(SemanticError::MalformedLiteral("12a".to_string()))
            );

            let bad_float = ValueExpr::literal(Literal::new(LiteralKind::Float, "1.2.3"));
            assert!(ctx.build_value_expr(TreeId(0), &bad_float).is_err());

            let good_float = ValueExpr::literal(Literal::new(LiteralKind::Float, "1.5e3"));
            assert!(ctx.build_value_expr(TreeId(0), &good_float).is_ok());
        });
    }

    #[test]
    fn test_parameter_literal() {
        with_context(|ctx| {
            let param = ValueExpr::literal(Literal::new(LiteralKind::Parameter, "$2"));
            let id = ctx.build_value_expr(TreeId(0), &param).unwrap();
            assert_eq!(ctx.graph.expression(id).kind, ExprKind::Parameter(2));

            let zero = ValueExpr::literal(Literal::new(LiteralKind::Parameter, "$0"));
            assert_eq!(
                ctx.build_value_expr(TreeId(0), &zero),
                Err(SemanticError::IllegalParameterMarker("$0".to_string()))
            );
        });
    }
}
