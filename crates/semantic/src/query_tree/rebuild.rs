// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # SQL text rebuild
//!
//! [`SqlRenderer`] writes bound expressions, conditions and whole query
//! trees back as SQL. Columns are written with the alias of the relation
//! they were bound to, wildcards appear expanded, and typed literals carry
//! their keyword. Rendering bound output and analyzing it again yields the
//! same text.

use sqlgrid_function_registry::CUSTOM_ID;
use sqlgrid_ir::{
    Dialect, JoinKind, LiteralKind, NullsOrder, PatternKind, RegexOp, SetQuantifier,
    SortDirection, SubqueryQuantifier, TrimSide, TruthValue, UnionType,
};

use crate::condition::{
    CompositeClause, ConditionKind, InList, LogicalOp, PatternMatch,
};
use crate::context::AnalysisContext;
use crate::expr::{CallForm, ColumnGenre, Constant, ExprKind, FunctionExpr, Operator};
use crate::graph::{CondId, ExprId, QueryGraph, TreeId};
use crate::ident::IdentifierResolver;
use crate::relation::{RelationKind, RelationNode};

/// Writes parts of a query graph as SQL text
pub struct SqlRenderer<'g> {
    graph: &'g QueryGraph,
    idents: IdentifierResolver,
    dialect: Dialect,
}

impl<'g> SqlRenderer<'g> {
    pub fn new(graph: &'g QueryGraph, idents: IdentifierResolver, dialect: Dialect) -> Self {
        Self {
            graph,
            idents,
            dialect,
        }
    }

    pub fn expr(&self, id: ExprId) -> String {
        let expression = self.graph.expression(id);
        match &expression.kind {
            ExprKind::Column(column) => {
                let mut text = if column.genre.contains(ColumnGenre::MAPPED) && !column.is_bound() {
                    self.idents.quote(&column.column_name)
                } else {
                    match column.qualifier() {
                        Some(qualifier) => format!(
                            "{}.{}",
                            self.idents.quote(qualifier),
                            self.idents.quote(&column.column_name)
                        ),
                        None => self.idents.quote(&column.column_name),
                    }
                };
                if column.outer_join_marker {
                    text.push_str("(+)");
                }
                text
            }
            ExprKind::Constant(constant) => render_constant(constant),
            ExprKind::Function(function) => self.function(function),
            ExprKind::Case(case) => {
                let mut text = String::from("CASE");
                if let Some(operand) = case.operand {
                    text.push(' ');
                    text.push_str(&self.expr(operand));
                }
                for (when, then) in &case.branches {
                    text.push_str(&format!(" WHEN {} THEN {}", self.expr(*when), self.expr(*then)));
                }
                if let Some(else_result) = case.else_result {
                    text.push_str(&format!(" ELSE {}", self.expr(else_result)));
                }
                text.push_str(" END");
                text
            }
            ExprKind::Operator(op) => {
                let right = self.operand(op.right);
                match op.left {
                    Some(left) => format!("{} {} {}", self.operand(left), op.op.symbol(), right),
                    None if op.op.is_postfix() => format!("{}{}", right, op.op.symbol()),
                    None => match op.op {
                        Operator::Identity | Operator::Negate | Operator::BitNot => {
                            format!("{}{}", op.op.symbol(), right)
                        }
                        _ => format!("{} {}", op.op.symbol(), right),
                    },
                }
            }
            ExprKind::Condition(condition) => self.condition(*condition),
            ExprKind::Subquery(tree) => format!("({})", self.query(*tree)),
            ExprKind::ColumnList(None) => "*".to_string(),
            ExprKind::ColumnList(Some(qualifier)) => format!("{}.*", self.idents.quote(qualifier)),
            ExprKind::List(items) => format!("({})", self.list(items)),
            ExprKind::Parameter(number) => format!("${}", number),
        }
    }

    /// Operator operands are parenthesised unless they are atoms
    fn operand(&self, id: ExprId) -> String {
        match &self.graph.expression(id).kind {
            ExprKind::Operator(_) | ExprKind::Condition(_) => format!("({})", self.expr(id)),
            _ => self.expr(id),
        }
    }

    fn list(&self, items: &[ExprId]) -> String {
        items
            .iter()
            .map(|item| self.expr(*item))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn function(&self, function: &FunctionExpr) -> String {
        let arg = |i: usize| {
            function
                .args
                .get(i)
                .map(|id| self.expr(*id))
                .unwrap_or_default()
        };
        match &function.form {
            CallForm::Plain => {
                let name = if function.id == CUSTOM_ID {
                    self.idents.quote(&function.name)
                } else {
                    function.name.clone()
                };
                let quantifier = match function.quantifier {
                    Some(SetQuantifier::Distinct) => "DISTINCT ",
                    Some(SetQuantifier::All) => "ALL ",
                    Some(SetQuantifier::Unique) => "UNIQUE ",
                    None => "",
                };
                format!("{}({}{})", name, quantifier, self.list(&function.args))
            }
            CallForm::CountStar => format!("{}(*)", function.name),
            CallForm::Trim {
                side,
                has_characters,
            } => {
                let side = match side {
                    Some(TrimSide::Both) => "BOTH ",
                    Some(TrimSide::Leading) => "LEADING ",
                    Some(TrimSide::Trailing) => "TRAILING ",
                    None => "",
                };
                if *has_characters {
                    format!("TRIM({}{} FROM {})", side, arg(0), arg(1))
                } else {
                    format!("TRIM({}FROM {})", side, arg(0))
                }
            }
            CallForm::Extract(field) => format!("EXTRACT({} FROM {})", field, arg(0)),
            CallForm::Substring {
                has_start,
                has_length,
            } => {
                let mut text = format!("SUBSTRING({}", arg(0));
                let mut next = 1;
                if *has_start {
                    text.push_str(&format!(" FROM {}", arg(next)));
                    next += 1;
                }
                if *has_length {
                    text.push_str(&format!(" FOR {}", arg(next)));
                }
                text.push(')');
                text
            }
            CallForm::Overlay { has_length } => {
                let length = if *has_length {
                    format!(" FOR {}", arg(3))
                } else {
                    String::new()
                };
                format!(
                    "OVERLAY({} PLACING {} FROM {}{})",
                    arg(0),
                    arg(1),
                    arg(2),
                    length
                )
            }
            CallForm::Position => format!("POSITION({} IN {})", arg(0), arg(1)),
            CallForm::Cast(target) => {
                format!("CAST({} AS {})", arg(0), target.render(self.dialect))
            }
            CallForm::Convert(encoding) => format!("CONVERT({} USING {})", arg(0), encoding),
        }
    }

    pub fn condition(&self, id: CondId) -> String {
        let condition = self.graph.condition(id);
        let positive = condition.positive;
        let not = if positive { "" } else { "NOT " };
        let text = match &condition.kind {
            ConditionKind::SqlExpr(expr) => self.expr(*expr),
            ConditionKind::RelOp {
                op,
                left,
                right,
                quantifier,
            } => {
                let quantifier = match quantifier {
                    Some(SubqueryQuantifier::Any) => "ANY ",
                    Some(SubqueryQuantifier::All) => "ALL ",
                    Some(SubqueryQuantifier::Some) => "SOME ",
                    None => "",
                };
                format!(
                    "{} {} {}{}",
                    self.operand(*left),
                    op.as_str(),
                    quantifier,
                    self.operand(*right)
                )
            }
            ConditionKind::Logical { op, left, right } => format!(
                "{} {} {}",
                self.logical_child(*op, *left),
                op.as_str(),
                self.logical_child(*op, *right)
            ),
            ConditionKind::Composite(clause) => return self.composite(clause, not),
        };
        if positive {
            text
        } else {
            format!("NOT ({})", text)
        }
    }

    fn logical_child(&self, parent: LogicalOp, child: CondId) -> String {
        let condition = self.graph.condition(child);
        match condition.kind {
            ConditionKind::Logical { op, .. } if op != parent && condition.positive => {
                format!("({})", self.condition(child))
            }
            _ => self.condition(child),
        }
    }

    /// Composite clauses carry their NOT inline
    fn composite(&self, clause: &CompositeClause, not: &str) -> String {
        match clause {
            CompositeClause::Between { expr, low, high } => format!(
                "{} {}BETWEEN {} AND {}",
                self.operand(*expr),
                not,
                self.operand(*low),
                self.operand(*high)
            ),
            CompositeClause::In { expr, list } => {
                let list = match list {
                    InList::Values(values) => format!("({})", self.list(values)),
                    InList::Subquery(subquery) => self.expr(*subquery),
                };
                format!("{} {}IN {}", self.operand(*expr), not, list)
            }
            CompositeClause::Pattern {
                expr,
                matcher,
                pattern,
                escape,
            } => {
                let operator = match matcher {
                    PatternMatch::Like(PatternKind::Like) => format!("{}LIKE", not),
                    PatternMatch::Like(PatternKind::ILike) => format!("{}ILIKE", not),
                    PatternMatch::Like(PatternKind::SimilarTo) => format!("{}SIMILAR TO", not),
                    PatternMatch::Regex(op) => regex_symbol(*op).to_string(),
                };
                let mut text = format!(
                    "{} {} {}",
                    self.operand(*expr),
                    operator,
                    self.operand(*pattern)
                );
                if let Some(escape) = escape {
                    text.push_str(&format!(" ESCAPE {}", self.expr(*escape)));
                }
                text
            }
            CompositeClause::Exists { subquery } => format!("{}EXISTS {}", not, self.expr(*subquery)),
            CompositeClause::NullCheck { expr } => {
                format!("{} IS {}NULL", self.operand(*expr), not)
            }
            CompositeClause::BooleanCheck { expr, value } => {
                let value = match value {
                    TruthValue::True => "TRUE",
                    TruthValue::False => "FALSE",
                    TruthValue::Unknown => "UNKNOWN",
                };
                format!("{} IS {}{}", self.operand(*expr), not, value)
            }
        }
    }

    /// Whole query tree, including its UNION branches
    pub fn query(&self, tree: TreeId) -> String {
        let query_tree = self.graph.tree(tree);
        let mut sql = String::new();

        let ctes: Vec<String> = query_tree
            .with_relations
            .iter()
            .map(|id| self.graph.relation(*id))
            .filter(|node| node.reference_count > 0)
            .filter_map(|node| {
                let subtree = node.subtree?;
                Some(format!(
                    "{}{} AS ({})",
                    self.idents.quote(&node.alias),
                    self.column_list(subtree),
                    self.query(subtree)
                ))
            })
            .collect();
        if !ctes.is_empty() {
            sql.push_str("WITH ");
            sql.push_str(&ctes.join(", "));
            sql.push(' ');
        }

        sql.push_str(&self.select_block(tree));
        for branch in &query_tree.union_branches {
            let keyword = match self.graph.tree(*branch).union_type {
                Some(UnionType::UnionAll) => "UNION ALL",
                _ => "UNION",
            };
            sql.push_str(&format!(" {} {}", keyword, self.select_block(*branch)));
        }

        if !query_tree.order_by.is_empty() {
            let items: Vec<String> = query_tree
                .order_by
                .iter()
                .map(|entry| {
                    let mut item = self.expr(entry.expr);
                    match entry.direction {
                        Some(SortDirection::Asc) => item.push_str(" ASC"),
                        Some(SortDirection::Desc) => item.push_str(" DESC"),
                        None => {}
                    }
                    match entry.nulls {
                        Some(NullsOrder::First) => item.push_str(" NULLS FIRST"),
                        Some(NullsOrder::Last) => item.push_str(" NULLS LAST"),
                        None => {}
                    }
                    item
                })
                .collect();
            sql.push_str(&format!(" ORDER BY {}", items.join(", ")));
        }
        if let Some(limit) = query_tree.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = query_tree.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
        sql
    }

    fn select_block(&self, tree: TreeId) -> String {
        let query_tree = self.graph.tree(tree);
        let mut sql = String::from("SELECT ");
        if query_tree.distinct {
            sql.push_str("DISTINCT ");
        }

        let items: Vec<String> = query_tree
            .projection
            .iter()
            .map(|id| {
                let expression = self.graph.expression(*id);
                let text = self.expr(*id);
                match expression.alias() {
                    Some(alias) if expression.has_explicit_alias() => {
                        format!("{} AS {}", text, self.idents.quote(alias))
                    }
                    _ => text,
                }
            })
            .collect();
        sql.push_str(&items.join(", "));

        if let Some(into) = &query_tree.into {
            let temporary = if into.temporary { "TEMP " } else { "" };
            sql.push_str(&format!(" INTO {}{}", temporary, self.idents.quote(&into.table)));
        }

        let from = self.from_clause(tree);
        if !from.is_empty() {
            sql.push_str(" FROM ");
            sql.push_str(&from);
        }
        if let Some(condition) = query_tree.where_condition {
            sql.push_str(" WHERE ");
            sql.push_str(&self.condition(condition));
        }
        if !query_tree.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.list(&query_tree.group_by));
        }
        if !query_tree.having.is_empty() {
            let conjuncts: Vec<String> = query_tree
                .having
                .iter()
                .map(|id| self.logical_child(LogicalOp::And, *id))
                .collect();
            sql.push_str(" HAVING ");
            sql.push_str(&conjuncts.join(" AND "));
        }
        sql
    }

    fn from_clause(&self, tree: TreeId) -> String {
        let mut from = String::new();
        for id in &self.graph.tree(tree).relations {
            let node = self.graph.relation(*id);
            if !node.is_column_source() {
                continue;
            }
            let item = self.table_item(node);
            match node.join {
                _ if from.is_empty() => from.push_str(&item),
                None => {
                    from.push_str(", ");
                    from.push_str(&item);
                }
                Some(join) => {
                    let condition = join.condition.map(|c| self.condition(c));
                    let clause = match (join.kind, condition) {
                        (JoinKind::LeftOuter, Some(on)) => format!(" LEFT OUTER JOIN {} ON {}", item, on),
                        (JoinKind::LeftOuter, None) => format!(" LEFT OUTER JOIN {} ON 1 = 1", item),
                        (_, Some(on)) => format!(" INNER JOIN {} ON {}", item, on),
                        (_, None) => format!(" CROSS JOIN {}", item),
                    };
                    from.push_str(&clause);
                }
            }
        }
        from
    }

    fn table_item(&self, node: &RelationNode) -> String {
        let alias = self.idents.quote(&node.alias);
        match (node.kind, node.subtree) {
            (RelationKind::DerivedSubquery, Some(subtree)) => format!(
                "({}) {}{}",
                self.query(subtree),
                alias,
                self.column_list(subtree)
            ),
            _ => {
                let only = if node.only { "ONLY " } else { "" };
                let name = self.idents.quote(&node.table_name);
                if node.is_unaliased() {
                    format!("{}{}", only, name)
                } else {
                    format!("{}{} {}", only, name, alias)
                }
            }
        }
    }

    /// ` (a, b)` when the output names of `subtree` differ from the names
    /// its select list produces on its own, otherwise empty
    fn column_list(&self, subtree: TreeId) -> String {
        let projection = &self.graph.tree(subtree).projection;
        let renamed = projection.iter().any(|id| {
            let expression = self.graph.expression(*id);
            self.inner_name(*id).as_deref() != expression.outer_alias()
        });
        if !renamed {
            return String::new();
        }
        let names: Vec<String> = projection
            .iter()
            .map(|id| {
                let name = self.graph.expression(*id).outer_alias().unwrap_or_default();
                self.idents.quote(name)
            })
            .collect();
        format!(" ({})", names.join(", "))
    }

    /// Name a select-list item gets from its own text; generated names
    /// do not count
    fn inner_name(&self, id: ExprId) -> Option<String> {
        let expression = self.graph.expression(id);
        if expression.has_explicit_alias() {
            return expression.alias().map(str::to_string);
        }
        match &expression.kind {
            ExprKind::Column(column) => Some(column.column_name.clone()),
            ExprKind::Function(function) => Some(function.name.to_lowercase()),
            _ => None,
        }
    }
}

fn render_constant(constant: &Constant) -> String {
    let quoted = || format!("'{}'", constant.value.replace('\'', "''"));
    match constant.kind {
        LiteralKind::Integer
        | LiteralKind::Float
        | LiteralKind::Boolean
        | LiteralKind::Null
        | LiteralKind::Parameter => constant.value.clone(),
        LiteralKind::Binary => format!("X{}", quoted()),
        kind => match kind.keyword() {
            Some(keyword) => format!("{} {}", keyword, quoted()),
            None => quoted(),
        },
    }
}

fn regex_symbol(op: RegexOp) -> &'static str {
    match op {
        RegexOp::Match => "~",
        RegexOp::MatchInsensitive => "~*",
        RegexOp::NotMatch => "!~",
        RegexOp::NotMatchInsensitive => "!~*",
    }
}

impl AnalysisContext<'_> {
    pub(crate) fn renderer(&self) -> SqlRenderer<'_> {
        SqlRenderer::new(&self.graph, self.idents, self.config.dialect)
    }

    /// Cache the text of every expression and condition owned by `tree`
    pub(crate) fn rebuild_text(&mut self, tree: TreeId) {
        let renderer = self.renderer();
        let expressions: Vec<(ExprId, String)> = self
            .graph
            .expression_ids()
            .filter(|id| self.graph.expression(*id).tree == tree)
            .map(|id| (id, renderer.expr(id)))
            .collect();
        let conditions: Vec<(CondId, String)> = self
            .graph
            .condition_ids()
            .filter(|id| self.graph.condition(*id).tree == tree)
            .map(|id| (id, renderer.condition(id)))
            .collect();

        for (id, text) in expressions {
            self.graph.expression_mut(id).text = Some(text);
        }
        for (id, text) in conditions {
            self.graph.condition_mut(id).text = Some(text);
        }
    }
}
