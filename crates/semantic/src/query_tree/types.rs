// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! Type inference
//!
//! Types flow bottom-up: columns carry their catalog or subquery type,
//! constants their literal type, and operators and functions derive theirs
//! from their operands. A string literal compared with a date, time or
//! timestamp value is rewritten to a literal of that temporal kind.

use sqlgrid_function_registry::CUSTOM_ID;
use sqlgrid_ir::{LiteralKind, TypeDescriptor, TypeKind};

use crate::condition::{CompositeClause, ConditionKind, InList};
use crate::context::AnalysisContext;
use crate::error::SemanticResult;
use crate::expr::{CallForm, ExprKind, Operator};
use crate::graph::{CondId, ExprId, TreeId};

impl AnalysisContext<'_> {
    /// Fill the data type of every expression read by `tree`
    pub(crate) fn fill_types(&mut self, tree: TreeId) -> SemanticResult<()> {
        let query_tree = self.graph.tree(tree);
        let mut roots: Vec<ExprId> = query_tree.projection.clone();
        roots.extend(query_tree.group_by.iter().copied());
        roots.extend(query_tree.order_by.iter().map(|entry| entry.expr));
        let conditions = query_tree.all_condition_roots();

        for root in roots {
            self.infer_type(root);
        }
        for condition in conditions {
            self.type_condition(condition);
        }
        Ok(())
    }

    fn infer_type(&mut self, id: ExprId) -> TypeDescriptor {
        if let Some(data_type) = &self.graph.expression(id).data_type {
            return data_type.clone();
        }

        let kind = self.graph.expression(id).kind.clone();
        let data_type = match kind {
            ExprKind::Column(column) => match (column.column_type, self.graph.expression(id).mapped_from) {
                (Some(column_type), _) => column_type,
                (None, Some(target)) => self.infer_type(target),
                (None, None) => TypeDescriptor::unknown(),
            },
            ExprKind::Constant(constant) => TypeDescriptor::for_literal(constant.kind, &constant.value),
            ExprKind::Function(function) => {
                let args: Vec<TypeDescriptor> =
                    function.args.iter().map(|arg| self.infer_type(*arg)).collect();
                match function.form {
                    CallForm::Cast(target) => target,
                    CallForm::CountStar => TypeDescriptor::new(TypeKind::BigInt),
                    _ if function.id == CUSTOM_ID => TypeDescriptor::unknown(),
                    _ => self
                        .registry
                        .get_by_id(function.id)
                        .map(|def| def.return_type(&args))
                        .unwrap_or_else(TypeDescriptor::unknown),
                }
            }
            ExprKind::Case(case) => {
                if let Some(operand) = case.operand {
                    self.infer_type(operand);
                }
                let mut result = TypeDescriptor::unknown();
                for (when, then) in case.branches {
                    self.infer_type(when);
                    let branch = self.infer_type(then);
                    result = result.promote(&branch);
                }
                if let Some(else_result) = case.else_result {
                    let branch = self.infer_type(else_result);
                    result = result.promote(&branch);
                }
                result
            }
            ExprKind::Operator(op) => {
                let right = self.infer_type(op.right);
                match op.left {
                    Some(left) => {
                        let left = self.infer_type(left);
                        binary_type(op.op, &left, &right)
                    }
                    None => unary_type(op.op, right),
                }
            }
            ExprKind::Condition(condition) => {
                self.type_condition(condition);
                TypeDescriptor::new(TypeKind::Boolean)
            }
            ExprKind::Subquery(subtree) => self
                .graph
                .tree(subtree)
                .projection
                .first()
                .and_then(|first| self.graph.expression(*first).data_type.clone())
                .unwrap_or_else(TypeDescriptor::unknown),
            ExprKind::List(items) => items.iter().fold(TypeDescriptor::unknown(), |acc, item| {
                let item = self.infer_type(*item);
                acc.promote(&item)
            }),
            ExprKind::ColumnList(_) | ExprKind::Parameter(_) => TypeDescriptor::unknown(),
        };

        self.graph.expression_mut(id).data_type = Some(data_type.clone());
        data_type
    }

    /// Type every expression of a condition tree and normalize temporal
    /// comparisons
    fn type_condition(&mut self, root: CondId) {
        for expr in self.graph.condition_expressions(root) {
            self.infer_type(expr);
        }

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let condition = self.graph.condition(id);
            stack.extend(condition.children());
            match condition.kind.clone() {
                ConditionKind::RelOp { left, right, .. } => {
                    self.normalize_temporal(left, right);
                    self.normalize_temporal(right, left);
                }
                ConditionKind::Composite(CompositeClause::Between { expr, low, high }) => {
                    self.normalize_temporal(expr, low);
                    self.normalize_temporal(expr, high);
                }
                ConditionKind::Composite(CompositeClause::In {
                    expr,
                    list: InList::Values(values),
                }) => {
                    for value in values {
                        self.normalize_temporal(expr, value);
                    }
                }
                _ => {}
            }
        }
    }

    /// Rewrite `literal` to the temporal kind of `reference` when it is an
    /// untyped string
    fn normalize_temporal(&mut self, reference: ExprId, literal: ExprId) {
        let target = match self.graph.expression(reference).data_type.as_ref().map(|t| t.kind) {
            Some(TypeKind::Date) => LiteralKind::Date,
            Some(TypeKind::Time) => LiteralKind::Time,
            Some(TypeKind::Timestamp) => LiteralKind::Timestamp,
            _ => return,
        };
        let expression = self.graph.expression_mut(literal);
        if let ExprKind::Constant(constant) = &mut expression.kind {
            if constant.kind == LiteralKind::String {
                constant.kind = target;
                expression.data_type = Some(TypeDescriptor::for_literal(target, &constant.value));
            }
        }
    }
}

fn binary_type(op: Operator, left: &TypeDescriptor, right: &TypeDescriptor) -> TypeDescriptor {
    match op {
        Operator::Concat => TypeDescriptor::new(TypeKind::Text),
        Operator::Subtract if left.kind == TypeKind::Date && right.kind == TypeKind::Date => {
            TypeDescriptor::new(TypeKind::Integer)
        }
        _ => left.promote(right),
    }
}

fn unary_type(op: Operator, operand: TypeDescriptor) -> TypeDescriptor {
    match op {
        Operator::SquareRoot | Operator::CubeRoot => TypeDescriptor::new(TypeKind::Double),
        Operator::Factorial | Operator::PrefixFactorial => TypeDescriptor::new(TypeKind::Numeric),
        _ => operand,
    }
}
