// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Function dispatch
//!
//! Maps parsed function calls to [`FunctionExpr`] nodes with a stable id from
//! the function registry. Keyword-shaped calls (CASE, TRIM, EXTRACT, ...)
//! keep their argument layout in [`CallForm`]; names the registry does not
//! know become pass-through calls with [`CUSTOM_ID`].

use sqlgrid_function_registry::{CUSTOM_ID, FunctionId, ids};
use sqlgrid_ir::{
    CaseExpr, CountArgument, FunctionCall, SetQuantifier, TypeDescriptor, TypeName, ValueExpr,
    WhenCondition,
};
use tracing::trace;

use crate::condition::ConditionOrigin;
use crate::context::AnalysisContext;
use crate::error::{SemanticError, SemanticResult};
use crate::expr::{CallForm, CaseExpression, ExprKind, FunctionExpr};
use crate::graph::{ExprId, TreeId};

/// Fields accepted by `EXTRACT(field FROM ...)`
const EXTRACT_FIELDS: &[&str] = &[
    "CENTURY",
    "DAY",
    "DECADE",
    "DOW",
    "DOY",
    "EPOCH",
    "HOUR",
    "ISODOW",
    "ISOYEAR",
    "MICROSECONDS",
    "MILLENNIUM",
    "MILLISECONDS",
    "MINUTE",
    "MONTH",
    "QUARTER",
    "SECOND",
    "TIMEZONE",
    "TIMEZONE_HOUR",
    "TIMEZONE_MINUTE",
    "WEEK",
    "YEAR",
];

impl AnalysisContext<'_> {
    pub(crate) fn build_function(
        &mut self,
        tree: TreeId,
        call: &FunctionCall,
    ) -> SemanticResult<ExprId> {
        let function = match call {
            FunctionCall::Case(case) => return self.build_case(tree, case),
            FunctionCall::Count(CountArgument::Star) => {
                keyword_call(ids::COUNT, "COUNT", Vec::new(), CallForm::CountStar).aggregate()
            }
            FunctionCall::Count(CountArgument::Value { quantifier, expr }) => {
                let arg = self.build_value_expr(tree, expr)?;
                FunctionExpr {
                    quantifier: *quantifier,
                    ..keyword_call(ids::COUNT, "COUNT", vec![arg], CallForm::Plain).aggregate()
                }
            }
            FunctionCall::Trim {
                side,
                characters,
                source,
            } => {
                let mut args = Vec::new();
                if let Some(characters) = characters {
                    args.push(self.build_value_expr(tree, characters)?);
                }
                args.push(self.build_value_expr(tree, source)?);
                let form = CallForm::Trim {
                    side: *side,
                    has_characters: characters.is_some(),
                };
                keyword_call(ids::TRIM, "TRIM", args, form)
            }
            FunctionCall::Extract { field, source } => {
                let field = field.to_ascii_uppercase();
                if !EXTRACT_FIELDS.contains(&field.as_str()) {
                    return Err(SemanticError::Unsupported(format!(
                        "EXTRACT field {}",
                        field
                    )));
                }
                let source = self.build_value_expr(tree, source)?;
                keyword_call(ids::EXTRACT, "EXTRACT", vec![source], CallForm::Extract(field))
            }
            FunctionCall::Substring {
                source,
                start,
                length,
            } => {
                let mut args = vec![self.build_value_expr(tree, source)?];
                args.extend(self.build_optional(tree, start.as_ref())?);
                args.extend(self.build_optional(tree, length.as_ref())?);
                let form = CallForm::Substring {
                    has_start: start.is_some(),
                    has_length: length.is_some(),
                };
                keyword_call(ids::SUBSTRING, "SUBSTRING", args, form)
            }
            FunctionCall::Overlay {
                source,
                replacement,
                start,
                length,
            } => {
                let mut args = vec![
                    self.build_value_expr(tree, source)?,
                    self.build_value_expr(tree, replacement)?,
                    self.build_value_expr(tree, start)?,
                ];
                args.extend(self.build_optional(tree, length.as_ref())?);
                let form = CallForm::Overlay {
                    has_length: length.is_some(),
                };
                keyword_call(ids::OVERLAY, "OVERLAY", args, form)
            }
            FunctionCall::Position { needle, haystack } => {
                let args = vec![
                    self.build_value_expr(tree, needle)?,
                    self.build_value_expr(tree, haystack)?,
                ];
                keyword_call(ids::POSITION, "POSITION", args, CallForm::Position)
            }
            FunctionCall::Cast { expr, target } => {
                let operand = self.build_value_expr(tree, expr)?;
                return self.build_cast(tree, operand, target);
            }
            FunctionCall::Convert { expr, encoding } => {
                let operand = self.build_value_expr(tree, expr)?;
                let form = CallForm::Convert(encoding.clone());
                keyword_call(ids::CONVERT, "CONVERT", vec![operand], form)
            }
            FunctionCall::Generic {
                name,
                quantifier,
                args,
            } => {
                let name = self.idents.normalize(name);
                self.build_generic(tree, &name, *quantifier, args)?
            }
        };

        trace!(function = %function.name, id = function.id, "Dispatched function call");
        Ok(self.add_expression(tree, ExprKind::Function(function)))
    }

    fn build_generic(
        &mut self,
        tree: TreeId,
        name: &str,
        quantifier: Option<SetQuantifier>,
        args: &[ValueExpr],
    ) -> SemanticResult<FunctionExpr> {
        let (id, name, aggregate) = match self.registry.get_function(name) {
            Some(def) => (def.id, def.name.to_string(), def.is_aggregate()),
            None => (CUSTOM_ID, name.to_string(), false),
        };
        if quantifier.is_some() && !aggregate {
            return Err(SemanticError::InvalidAggregateQuantifier(name));
        }

        let args = args
            .iter()
            .map(|arg| self.build_value_expr(tree, arg))
            .collect::<SemanticResult<Vec<_>>>()?;
        Ok(FunctionExpr {
            id,
            name,
            args,
            quantifier,
            form: CallForm::Plain,
            aggregate,
        })
    }

    fn build_case(&mut self, tree: TreeId, case: &CaseExpr) -> SemanticResult<ExprId> {
        let operand = self.build_optional(tree, case.operand.as_ref())?;
        let mut branches = Vec::with_capacity(case.branches.len());
        for branch in &case.branches {
            let when = match &branch.condition {
                WhenCondition::Value(value) => self.build_value_expr(tree, value)?,
                WhenCondition::Search(condition) => {
                    let condition =
                        self.build_search_condition(tree, condition, ConditionOrigin::Case)?;
                    self.reject_outer_join_marker(condition)?;
                    self.add_expression(tree, ExprKind::Condition(condition))
                }
            };
            let then = self.build_value_expr(tree, &branch.result)?;
            branches.push((when, then));
        }
        let else_result = self.build_optional(tree, case.else_result.as_ref())?;

        Ok(self.add_expression(
            tree,
            ExprKind::Case(CaseExpression {
                operand,
                branches,
                else_result,
            }),
        ))
    }

    /// `CAST(expr AS target)` and `expr::target`
    pub(crate) fn build_cast(
        &mut self,
        tree: TreeId,
        operand: ExprId,
        target: &TypeName,
    ) -> SemanticResult<ExprId> {
        let descriptor = TypeDescriptor::from_type_name(target)
            .map_err(|_| SemanticError::UnknownDataType(target.name.clone()))?;
        let function = keyword_call(ids::CAST, "CAST", vec![operand], CallForm::Cast(descriptor));
        Ok(self.add_expression(tree, ExprKind::Function(function)))
    }

    fn build_optional(
        &mut self,
        tree: TreeId,
        expr: Option<&ValueExpr>,
    ) -> SemanticResult<Option<ExprId>> {
        expr.map(|expr| self.build_value_expr(tree, expr))
            .transpose()
    }
}

fn keyword_call(id: FunctionId, name: &str, args: Vec<ExprId>, form: CallForm) -> FunctionExpr {
    FunctionExpr {
        id,
        name: name.to_string(),
        args,
        quantifier: None,
        form,
        aggregate: false,
    }
}

impl FunctionExpr {
    fn aggregate(mut self) -> Self {
        self.aggregate = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use sqlgrid_catalog::StaticCatalog;
    use sqlgrid_function_registry::FunctionRegistry;
    use sqlgrid_ir::{Identifier, Literal, TypeKind, WhenClause};

    fn with_context<R>(f: impl FnOnce(&mut AnalysisContext<'_>) -> R) -> R {
        let catalog = StaticCatalog::new();
        let registry = FunctionRegistry::new();
        let config = AnalyzerConfig::default();
        let mut ctx = AnalysisContext::new(&catalog, None, &registry, &config);
        f(&mut ctx)
    }

    fn function(ctx: &AnalysisContext<'_>, id: ExprId) -> FunctionExpr {
        match &ctx.graph.expression(id).kind {
            ExprKind::Function(function) => function.clone(),
            other => panic!("expected function, got {:?}", other),
        }
    }

    fn generic(name: &str, quantifier: Option<SetQuantifier>, args: Vec<ValueExpr>) -> FunctionCall {
        FunctionCall::Generic {
            name: Identifier::new(name),
            quantifier,
            args,
        }
    }

    #[test]
    fn test_registered_function_gets_stable_id() {
        with_context(|ctx| {
            let call = generic("sum", None, vec![ValueExpr::column("x")]);
            let id = ctx.build_function(TreeId(0), &call).unwrap();
            let sum = function(ctx, id);
            assert_eq!(sum.id, ids::SUM);
            assert_eq!(sum.name, "SUM");
            assert!(sum.aggregate);
        });
    }

    #[test]
    fn test_unknown_function_is_custom() {
        with_context(|ctx| {
            let call = generic("my_udf", None, vec![ValueExpr::integer(1)]);
            let id = ctx.build_function(TreeId(0), &call).unwrap();
            let custom = function(ctx, id);
            assert_eq!(custom.id, CUSTOM_ID);
            assert_eq!(custom.name, "my_udf");
            assert!(!custom.aggregate);
        });
    }

    #[test]
    fn test_distinct_on_scalar_is_rejected() {
        with_context(|ctx| {
            let call = generic("upper", Some(SetQuantifier::Distinct), vec![ValueExpr::column("x")]);
            assert_eq!(
                ctx.build_function(TreeId(0), &call),
                Err(SemanticError::InvalidAggregateQuantifier("UPPER".to_string()))
            );

            let call = generic("count", Some(SetQuantifier::Distinct), vec![ValueExpr::column("x")]);
            assert!(ctx.build_function(TreeId(0), &call).is_ok());
        });
    }

    #[test]
    fn test_count_star() {
        with_context(|ctx| {
            let id = ctx
                .build_function(TreeId(0), &FunctionCall::Count(CountArgument::Star))
                .unwrap();
            let count = function(ctx, id);
            assert_eq!(count.form, CallForm::CountStar);
            assert!(count.args.is_empty());
            assert!(count.aggregate);
        });
    }

    #[test]
    fn test_trim_layout() {
        with_context(|ctx| {
            let call = FunctionCall::Trim {
                side: Some(sqlgrid_ir::TrimSide::Leading),
                characters: Some(ValueExpr::literal(Literal::string("x"))),
                source: ValueExpr::column("name"),
            };
            let id = ctx.build_function(TreeId(0), &call).unwrap();
            let trim = function(ctx, id);
            assert_eq!(trim.args.len(), 2);
            assert_eq!(
                trim.form,
                CallForm::Trim {
                    side: Some(sqlgrid_ir::TrimSide::Leading),
                    has_characters: true
                }
            );
        });
    }

    #[test]
    fn test_extract_field_validation() {
        with_context(|ctx| {
            let ok = FunctionCall::Extract {
                field: "year".to_string(),
                source: ValueExpr::column("d"),
            };
            let id = ctx.build_function(TreeId(0), &ok).unwrap();
            assert_eq!(function(ctx, id).form, CallForm::Extract("YEAR".to_string()));

            let bad = FunctionCall::Extract {
                field: "fortnight".to_string(),
                source: ValueExpr::column("d"),
            };
            assert!(matches!(
                ctx.build_function(TreeId(0), &bad),
                Err(SemanticError::Unsupported(_))
            ));
        });
    }

    #[test]
    fn test_cast_parses_target_type() {
        with_context(|ctx| {
            let call = FunctionCall::Cast {
                expr: ValueExpr::column("x"),
                target: TypeName::new("varchar").with_modifiers(vec![10]),
            };
            let id = ctx.build_function(TreeId(0), &call).unwrap();
            match function(ctx, id).form {
                CallForm::Cast(target) => {
                    assert_eq!(target.kind, TypeKind::Varchar);
                    assert_eq!(target.length, Some(10));
                }
                other => panic!("expected cast, got {:?}", other),
            }

            let bad = FunctionCall::Cast {
                expr: ValueExpr::column("x"),
                target: TypeName::new("no_such_type"),
            };
            assert_eq!(
                ctx.build_function(TreeId(0), &bad),
                Err(SemanticError::UnknownDataType("no_such_type".to_string()))
            );
        });
    }

    #[test]
    fn test_searched_case() {
        with_context(|ctx| {
            let call = FunctionCall::Case(CaseExpr {
                operand: None,
                branches: vec![WhenClause {
                    condition: WhenCondition::Search(sqlgrid_ir::SearchCondition::compare(
                        ValueExpr::column("x"),
                        sqlgrid_ir::CompareOp::Gt,
                        ValueExpr::integer(0),
                    )),
                    result: ValueExpr::literal(Literal::string("pos")),
                }],
                else_result: Some(ValueExpr::literal(Literal::string("neg"))),
            });
            let id = ctx.build_function(TreeId(0), &call).unwrap();
            let ExprKind::Case(case) = &ctx.graph.expression(id).kind else {
                panic!("expected CASE");
            };
            assert!(case.operand.is_none());
            assert_eq!(case.branches.len(), 1);
            assert!(matches!(
                ctx.graph.expression(case.branches[0].0).kind,
                ExprKind::Condition(_)
            ));
            assert_eq!(ctx.graph.expression_columns(id).len(), 1);
        });
    }
}
