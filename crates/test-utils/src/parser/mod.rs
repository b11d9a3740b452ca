// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! SQL text to IR for tests
//!
//! [`FixtureParser`] is a small recursive-descent parser covering the SELECT
//! dialect the analyzer understands, including every form the SQL renderer
//! writes back. It doubles as the [`SqlParser`] used to expand views.

pub mod lexer;

use sqlgrid_ir::{
    AdditiveOp, AndSequence, CaseExpr, ColumnName, CommonTableExpr, CompareOp, CompareRight,
    CountArgument, Factor, FunctionCall, Identifier, InSource, IntoTarget, IrError, IrResult,
    Join, JoinConstraint, JoinKind, Literal, LiteralKind, LogicalPrimary, MultiplicativeOp,
    NullsOrder, Operand, OrderByItem, PatternKind, PrefixOp, Primary, Query, RegexOp,
    RelationalExpr, RelationalTail, SearchCondition, SelectBlock, SelectItem, SetQuantifier,
    SortDirection, SqlParser, SubqueryQuantifier, SuffixOp, TablePrimary, TableReference, Term,
    TrimSide, TruthValue, TypeName, UnaryLogical, UnionType, ValueExpr, WhenClause,
    WhenCondition,
};

use lexer::{Lexer, Token, TokenWithLocation};

/// Words that end an expression and therefore never start an implicit alias
const RESERVED: &[&str] = &[
    "ALL", "AND", "AS", "ASC", "BETWEEN", "BY", "CROSS", "DESC", "DISTINCT", "ELSE", "END",
    "ESCAPE", "EXCEPT", "FOR", "FROM", "FULL", "GROUP", "HAVING", "ILIKE", "IN", "INNER",
    "INTERSECT", "INTO", "IS", "JOIN", "LEFT", "LIKE", "LIMIT", "NATURAL", "NOT", "NULLS",
    "OFFSET", "ON", "OR", "ORDER", "OUTER", "PLACING", "RIGHT", "SELECT", "SIMILAR", "THEN",
    "UNION", "UNIQUE", "USING", "WHEN", "WHERE", "WITH",
];

/// Recursive-descent parser for fixture SQL
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureParser;

impl FixtureParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one SELECT statement, with an optional trailing `;`
    pub fn parse(sql: &str) -> IrResult<Query> {
        let mut parser = Parser::new(Lexer::tokenize(sql)?);
        let query = parser.parse_query()?;
        parser.parse_symbol(";");
        match parser.peek() {
            Token::Eof => Ok(query),
            other => Err(parser.error(format!("Unexpected trailing token {:?}", other))),
        }
    }
}

impl SqlParser for FixtureParser {
    fn parse_query(&self, sql: &str) -> IrResult<Query> {
        FixtureParser::parse(sql)
    }
}

struct Parser {
    toks: Vec<TokenWithLocation>,
    /// Index of the token to process next
    idx: usize,
}

impl Parser {
    fn new(toks: Vec<TokenWithLocation>) -> Self {
        Parser { toks, idx: 0 }
    }

    // ===== Token helpers =====

    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> &Token {
        self.toks
            .get(self.idx + n)
            .or_else(|| self.toks.last())
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn next_token(&mut self) -> Token {
        let token = self.peek().clone();
        if self.idx < self.toks.len() {
            self.idx += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> IrError {
        let position = self
            .toks
            .get(self.idx)
            .or_else(|| self.toks.last())
            .map(|t| t.position)
            .unwrap_or_default();
        IrError::Syntax {
            message: message.into(),
            position,
        }
    }

    fn parse_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_keyword(keyword) {
            self.idx += 1;
            true
        } else {
            false
        }
    }

    /// Parse an exact sequence of keywords, consuming nothing on mismatch
    fn parse_keyword_sequence(&mut self, keywords: &[&str]) -> bool {
        let matched = keywords
            .iter()
            .enumerate()
            .all(|(i, keyword)| self.peek_nth(i).is_keyword(keyword));
        if matched {
            self.idx += keywords.len();
        }
        matched
    }

    fn parse_one_of_keywords(&mut self, keywords: &[&'static str]) -> Option<&'static str> {
        let found = keywords.iter().find(|k| self.peek().is_keyword(k)).copied();
        if found.is_some() {
            self.idx += 1;
        }
        found
    }

    fn expect_keyword(&mut self, keyword: &str) -> IrResult<()> {
        if self.parse_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(format!("Expected {}, found {:?}", keyword, self.peek())))
        }
    }

    fn parse_symbol(&mut self, symbol: &str) -> bool {
        if self.peek().is_symbol(symbol) {
            self.idx += 1;
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, symbol: &str) -> IrResult<()> {
        if self.parse_symbol(symbol) {
            Ok(())
        } else {
            Err(self.error(format!("Expected '{}', found {:?}", symbol, self.peek())))
        }
    }

    fn is_reserved(token: &Token) -> bool {
        RESERVED.iter().any(|k| token.is_keyword(k))
    }

    fn parse_identifier(&mut self) -> IrResult<Identifier> {
        match self.next_token() {
            Token::Word { value, quoted } => Ok(if quoted {
                Identifier::quoted(value)
            } else {
                Identifier::new(value)
            }),
            other => {
                self.idx -= 1;
                Err(self.error(format!("Expected identifier, found {:?}", other)))
            }
        }
    }

    fn parse_identifier_list(&mut self) -> IrResult<Vec<Identifier>> {
        self.expect_symbol("(")?;
        let mut idents = vec![self.parse_identifier()?];
        while self.parse_symbol(",") {
            idents.push(self.parse_identifier()?);
        }
        self.expect_symbol(")")?;
        Ok(idents)
    }

    /// `[AS] alias`; without AS only a non-reserved word is taken
    fn parse_optional_alias(&mut self) -> IrResult<Option<Identifier>> {
        if self.parse_keyword("AS") {
            return self.parse_identifier().map(Some);
        }
        match self.peek() {
            Token::Word { .. } if !Self::is_reserved(self.peek()) => {
                self.parse_identifier().map(Some)
            }
            _ => Ok(None),
        }
    }

    fn parse_unsigned(&mut self) -> IrResult<u64> {
        match self.next_token() {
            Token::Number(text) => text
                .parse()
                .map_err(|_| self.error(format!("Expected an unsigned integer, found {}", text))),
            other => {
                self.idx -= 1;
                Err(self.error(format!("Expected a number, found {:?}", other)))
            }
        }
    }

    /// `(` followed by SELECT or WITH
    fn at_subquery(&self) -> bool {
        self.peek().is_symbol("(")
            && (self.peek_nth(1).is_keyword("SELECT") || self.peek_nth(1).is_keyword("WITH"))
    }

    fn parse_parenthesized_query(&mut self) -> IrResult<Query> {
        self.expect_symbol("(")?;
        let query = self.parse_query()?;
        self.expect_symbol(")")?;
        Ok(query)
    }

    // ===== Statements =====

    fn parse_query(&mut self) -> IrResult<Query> {
        let mut ctes = Vec::new();
        if self.parse_keyword("WITH") {
            loop {
                let name = self.parse_identifier()?;
                let columns = if self.peek().is_symbol("(") {
                    self.parse_identifier_list()?
                } else {
                    Vec::new()
                };
                self.expect_keyword("AS")?;
                let query = self.parse_parenthesized_query()?;
                ctes.push(CommonTableExpr {
                    name,
                    columns,
                    query: Box::new(query),
                });
                if !self.parse_symbol(",") {
                    break;
                }
            }
        }

        let mut query = Query::new(self.parse_select_block()?).with_ctes(ctes);
        while self.parse_keyword("UNION") {
            let union_type = if self.parse_keyword("ALL") {
                UnionType::UnionAll
            } else {
                self.parse_keyword("DISTINCT");
                UnionType::Union
            };
            query = query.with_union(union_type, self.parse_select_block()?);
        }

        if self.parse_keyword_sequence(&["ORDER", "BY"]) {
            let mut items = vec![self.parse_order_by_item()?];
            while self.parse_symbol(",") {
                items.push(self.parse_order_by_item()?);
            }
            query = query.with_order_by(items);
        }
        if self.parse_keyword("LIMIT") {
            query = query.with_limit(self.parse_unsigned()?);
        }
        if self.parse_keyword("OFFSET") {
            query = query.with_offset(self.parse_unsigned()?);
        }
        Ok(query)
    }

    fn parse_order_by_item(&mut self) -> IrResult<OrderByItem> {
        let expr = self.parse_value_expr()?;
        let direction = match self.parse_one_of_keywords(&["ASC", "DESC"]) {
            Some("ASC") => Some(SortDirection::Asc),
            Some(_) => Some(SortDirection::Desc),
            None => None,
        };
        let nulls = if self.parse_keyword("NULLS") {
            match self.parse_one_of_keywords(&["FIRST", "LAST"]) {
                Some("FIRST") => Some(NullsOrder::First),
                Some(_) => Some(NullsOrder::Last),
                None => return Err(self.error("Expected FIRST or LAST after NULLS")),
            }
        } else {
            None
        };
        Ok(OrderByItem {
            expr,
            direction,
            nulls,
        })
    }

    fn parse_select_block(&mut self) -> IrResult<SelectBlock> {
        self.expect_keyword("SELECT")?;
        let quantifier = match self.parse_one_of_keywords(&["ALL", "DISTINCT", "UNIQUE"]) {
            Some("ALL") => Some(SetQuantifier::All),
            Some("DISTINCT") => Some(SetQuantifier::Distinct),
            Some(_) => Some(SetQuantifier::Unique),
            None => None,
        };

        let mut projection = vec![self.parse_select_item()?];
        while self.parse_symbol(",") {
            projection.push(self.parse_select_item()?);
        }
        let mut block = SelectBlock::new(projection);
        block.quantifier = quantifier;

        if self.parse_keyword("INTO") {
            let temporary = self.parse_one_of_keywords(&["TEMP", "TEMPORARY"]).is_some();
            block.into = Some(IntoTarget {
                table: self.parse_identifier()?,
                temporary,
            });
        }
        if self.parse_keyword("FROM") {
            let mut from = vec![self.parse_table_reference()?];
            while self.parse_symbol(",") {
                from.push(self.parse_table_reference()?);
            }
            block = block.with_from(from);
        }
        if self.parse_keyword("WHERE") {
            block = block.with_where(self.parse_search_condition()?);
        }
        if self.parse_keyword_sequence(&["GROUP", "BY"]) {
            let mut group_by = vec![self.parse_value_expr()?];
            while self.parse_symbol(",") {
                group_by.push(self.parse_value_expr()?);
            }
            block = block.with_group_by(group_by);
        }
        if self.parse_keyword("HAVING") {
            block = block.with_having(self.parse_search_condition()?);
        }
        Ok(block)
    }

    fn parse_select_item(&mut self) -> IrResult<SelectItem> {
        if self.parse_symbol("*") {
            return Ok(SelectItem::Wildcard);
        }
        if matches!(self.peek(), Token::Word { .. })
            && self.peek_nth(1).is_symbol(".")
            && self.peek_nth(2).is_symbol("*")
        {
            let qualifier = self.parse_identifier()?;
            self.idx += 2;
            return Ok(SelectItem::QualifiedWildcard(qualifier));
        }
        let expr = self.parse_value_expr()?;
        let alias = self.parse_optional_alias()?;
        Ok(SelectItem::Expr { expr, alias })
    }

    // ===== FROM =====

    fn parse_table_reference(&mut self) -> IrResult<TableReference> {
        let mut reference = TableReference::new(self.parse_table_primary()?);
        while let Some(join) = self.parse_join()? {
            reference = reference.with_join(join);
        }
        Ok(reference)
    }

    fn parse_table_primary(&mut self) -> IrResult<TablePrimary> {
        if self.at_subquery() {
            let query = self.parse_parenthesized_query()?;
            let alias = self.parse_optional_alias()?;
            let columns = if alias.is_some() && self.peek().is_symbol("(") {
                self.parse_identifier_list()?
            } else {
                Vec::new()
            };
            return Ok(TablePrimary::Derived {
                query: Box::new(query),
                alias,
                columns,
            });
        }
        let only = self.parse_keyword("ONLY");
        let name = self.parse_identifier()?;
        let alias = self.parse_optional_alias()?;
        Ok(TablePrimary::Named { name, alias, only })
    }

    fn parse_join(&mut self) -> IrResult<Option<Join>> {
        let start = self.idx;
        let natural = self.parse_keyword("NATURAL");
        let kind = if self.parse_keyword("CROSS") {
            JoinKind::Cross
        } else if self.parse_keyword("INNER") {
            JoinKind::Inner
        } else if self.parse_keyword("LEFT") {
            self.parse_keyword("OUTER");
            JoinKind::LeftOuter
        } else if self.parse_keyword("RIGHT") {
            self.parse_keyword("OUTER");
            JoinKind::RightOuter
        } else if self.parse_keyword("FULL") {
            self.parse_keyword("OUTER");
            JoinKind::FullOuter
        } else {
            JoinKind::Inner
        };
        if !self.parse_keyword("JOIN") {
            self.idx = start;
            return Ok(None);
        }

        let table = self.parse_table_primary()?;
        let constraint = if self.parse_keyword("ON") {
            Some(JoinConstraint::On(self.parse_search_condition()?))
        } else if self.parse_keyword("USING") {
            Some(JoinConstraint::Using(self.parse_identifier_list()?))
        } else {
            None
        };
        Ok(Some(Join {
            kind,
            natural,
            table,
            constraint,
        }))
    }

    // ===== Conditions =====

    fn parse_search_condition(&mut self) -> IrResult<SearchCondition> {
        let mut disjuncts = vec![self.parse_and_sequence()?];
        while self.parse_keyword("OR") {
            disjuncts.push(self.parse_and_sequence()?);
        }
        Ok(SearchCondition { disjuncts })
    }

    fn parse_and_sequence(&mut self) -> IrResult<AndSequence> {
        let mut conjuncts = vec![self.parse_unary_logical()?];
        while self.parse_keyword("AND") {
            conjuncts.push(self.parse_unary_logical()?);
        }
        Ok(AndSequence { conjuncts })
    }

    fn parse_unary_logical(&mut self) -> IrResult<UnaryLogical> {
        let negated = self.parse_keyword("NOT");
        let primary = self.parse_logical_primary()?;
        Ok(UnaryLogical { negated, primary })
    }

    /// Whether the next token closes a boolean term
    fn at_condition_end(&self) -> bool {
        let token = self.peek();
        matches!(token, Token::Eof)
            || token.is_symbol(")")
            || token.is_symbol(";")
            || token.is_symbol(",")
            || (Self::is_reserved(token)
                && !["IS", "IN", "BETWEEN", "LIKE", "ILIKE", "SIMILAR", "NOT"]
                    .iter()
                    .any(|k| token.is_keyword(k)))
    }

    fn parse_logical_primary(&mut self) -> IrResult<LogicalPrimary> {
        if self.peek().is_keyword("EXISTS") && self.peek_nth(1).is_symbol("(") {
            self.idx += 1;
            let query = self.parse_parenthesized_query()?;
            return Ok(LogicalPrimary::Exists(Box::new(query)));
        }
        for (keyword, value) in [("TRUE", true), ("FALSE", false)] {
            if self.peek().is_keyword(keyword) {
                let start = self.idx;
                self.idx += 1;
                if self.at_condition_end() {
                    return Ok(LogicalPrimary::Boolean(value));
                }
                self.idx = start;
            }
        }

        // `(cond)` versus `(expr) op ...`: try the condition first and
        // keep it only if nothing relational follows
        if self.peek().is_symbol("(") && !self.at_subquery() {
            let start = self.idx;
            self.idx += 1;
            if let Ok(nested) = self.parse_search_condition() {
                if self.parse_symbol(")") && self.at_condition_end() {
                    return Ok(LogicalPrimary::Nested(Box::new(nested)));
                }
            }
            self.idx = start;
        }
        Ok(LogicalPrimary::Relational(self.parse_relational()?))
    }

    fn parse_relational(&mut self) -> IrResult<RelationalExpr> {
        let left = self.parse_operand()?;
        let tail = self.parse_relational_tail()?;
        Ok(RelationalExpr { left, tail })
    }

    /// Single expression or row value `(a, b)`
    fn parse_operand(&mut self) -> IrResult<Operand> {
        if self.peek().is_symbol("(") && !self.at_subquery() {
            let start = self.idx;
            self.idx += 1;
            if let Ok(first) = self.parse_value_expr() {
                if self.parse_symbol(",") {
                    let mut items = vec![first, self.parse_value_expr()?];
                    while self.parse_symbol(",") {
                        items.push(self.parse_value_expr()?);
                    }
                    self.expect_symbol(")")?;
                    return Ok(Operand::List(items));
                }
            }
            self.idx = start;
        }
        Ok(Operand::Single(self.parse_value_expr()?))
    }

    fn parse_compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.peek() {
            Token::Symbol("=") => CompareOp::Eq,
            Token::Symbol("<>") | Token::Symbol("!=") => CompareOp::NotEq,
            Token::Symbol("<") => CompareOp::Lt,
            Token::Symbol("<=") => CompareOp::LtEq,
            Token::Symbol(">") => CompareOp::Gt,
            Token::Symbol(">=") => CompareOp::GtEq,
            _ => return None,
        };
        self.idx += 1;
        Some(op)
    }

    fn parse_relational_tail(&mut self) -> IrResult<Option<RelationalTail>> {
        if let Some(op) = self.parse_compare_op() {
            let quantifier = match self.parse_one_of_keywords(&["ANY", "ALL", "SOME"]) {
                Some("ANY") => Some(SubqueryQuantifier::Any),
                Some("ALL") => Some(SubqueryQuantifier::All),
                Some(_) => Some(SubqueryQuantifier::Some),
                None => None,
            };
            let right = if quantifier.is_some() {
                CompareRight::Subquery {
                    quantifier,
                    query: Box::new(self.parse_parenthesized_query()?),
                }
            } else {
                match self.parse_operand()? {
                    Operand::Single(expr) => CompareRight::Expr(expr),
                    Operand::List(items) => CompareRight::List(items),
                }
            };
            return Ok(Some(RelationalTail::Compare { op, right }));
        }

        let regex = match self.peek() {
            Token::Symbol("~") => Some(RegexOp::Match),
            Token::Symbol("~*") => Some(RegexOp::MatchInsensitive),
            Token::Symbol("!~") => Some(RegexOp::NotMatch),
            Token::Symbol("!~*") => Some(RegexOp::NotMatchInsensitive),
            _ => None,
        };
        if let Some(op) = regex {
            self.idx += 1;
            let pattern = self.parse_value_expr()?;
            return Ok(Some(RelationalTail::RegexMatch { op, pattern }));
        }

        if self.parse_keyword("IS") {
            let negated = self.parse_keyword("NOT");
            let tail = match self.parse_one_of_keywords(&["NULL", "TRUE", "FALSE", "UNKNOWN"]) {
                Some("NULL") => RelationalTail::IsNull { negated },
                Some("TRUE") => RelationalTail::IsBoolean {
                    negated,
                    value: TruthValue::True,
                },
                Some("FALSE") => RelationalTail::IsBoolean {
                    negated,
                    value: TruthValue::False,
                },
                Some(_) => RelationalTail::IsBoolean {
                    negated,
                    value: TruthValue::Unknown,
                },
                None => return Err(self.error("Expected NULL, TRUE, FALSE or UNKNOWN after IS")),
            };
            return Ok(Some(tail));
        }

        let start = self.idx;
        let negated = self.parse_keyword("NOT");
        if self.parse_keyword("IN") {
            let source = if self.at_subquery() {
                InSource::Subquery(Box::new(self.parse_parenthesized_query()?))
            } else {
                self.expect_symbol("(")?;
                let mut items = vec![self.parse_value_expr()?];
                while self.parse_symbol(",") {
                    items.push(self.parse_value_expr()?);
                }
                self.expect_symbol(")")?;
                InSource::List(items)
            };
            return Ok(Some(RelationalTail::In { negated, source }));
        }
        if self.parse_keyword("BETWEEN") {
            let low = self.parse_value_expr()?;
            self.expect_keyword("AND")?;
            let high = self.parse_value_expr()?;
            return Ok(Some(RelationalTail::Between { negated, low, high }));
        }
        let pattern_kind = if self.parse_keyword("LIKE") {
            Some(PatternKind::Like)
        } else if self.parse_keyword("ILIKE") {
            Some(PatternKind::ILike)
        } else if self.parse_keyword_sequence(&["SIMILAR", "TO"]) {
            Some(PatternKind::SimilarTo)
        } else {
            None
        };
        if let Some(kind) = pattern_kind {
            let pattern = self.parse_value_expr()?;
            let escape = if self.parse_keyword("ESCAPE") {
                Some(self.parse_value_expr()?)
            } else {
                None
            };
            return Ok(Some(RelationalTail::Like {
                negated,
                kind,
                pattern,
                escape,
            }));
        }

        self.idx = start;
        Ok(None)
    }

    // ===== Value expressions =====

    fn parse_value_expr(&mut self) -> IrResult<ValueExpr> {
        let first = self.parse_term()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Token::Symbol("+") => AdditiveOp::Plus,
                Token::Symbol("-") => AdditiveOp::Minus,
                Token::Symbol("||") => AdditiveOp::Concat,
                _ => break,
            };
            self.idx += 1;
            rest.push((op, self.parse_term()?));
        }
        Ok(ValueExpr { first, rest })
    }

    fn parse_term(&mut self) -> IrResult<Term> {
        let first = self.parse_factor()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Token::Symbol("*") => MultiplicativeOp::Multiply,
                Token::Symbol("/") => MultiplicativeOp::Divide,
                Token::Symbol("%") => MultiplicativeOp::Modulo,
                Token::Symbol("^") => MultiplicativeOp::Exponent,
                Token::Symbol("&") => MultiplicativeOp::BitAnd,
                Token::Symbol("|") => MultiplicativeOp::BitOr,
                Token::Symbol("#") => MultiplicativeOp::BitXor,
                Token::Symbol("<<") => MultiplicativeOp::ShiftLeft,
                Token::Symbol(">>") => MultiplicativeOp::ShiftRight,
                _ => break,
            };
            self.idx += 1;
            rest.push((op, self.parse_factor()?));
        }
        Ok(Term { first, rest })
    }

    fn parse_factor(&mut self) -> IrResult<Factor> {
        let mut prefix = Vec::new();
        loop {
            let op = match self.peek() {
                Token::Symbol("+") => PrefixOp::Plus,
                Token::Symbol("-") => PrefixOp::Minus,
                Token::Symbol("|/") => PrefixOp::SquareRoot,
                Token::Symbol("||/") => PrefixOp::CubeRoot,
                Token::Symbol("@") => PrefixOp::AbsoluteValue,
                Token::Symbol("~") => PrefixOp::BitNot,
                Token::Symbol("!!") => PrefixOp::Factorial,
                _ => break,
            };
            self.idx += 1;
            prefix.push(op);
        }

        let primary = self.parse_primary()?;

        let mut suffix = Vec::new();
        loop {
            if self.parse_symbol("::") {
                suffix.push(SuffixOp::Cast(self.parse_type_name()?));
            } else if self.peek().is_symbol("!") {
                self.idx += 1;
                suffix.push(SuffixOp::Factorial);
            } else {
                break;
            }
        }
        Ok(Factor {
            prefix,
            primary,
            suffix,
        })
    }

    fn parse_primary(&mut self) -> IrResult<Primary> {
        if self.at_subquery() {
            return Ok(Primary::Subquery(Box::new(self.parse_parenthesized_query()?)));
        }
        if self.parse_symbol("(") {
            let expr = self.parse_value_expr()?;
            self.expect_symbol(")")?;
            return Ok(Primary::Nested(Box::new(expr)));
        }

        match self.next_token() {
            Token::Number(text) => {
                let kind = if text.contains(['.', 'e', 'E']) {
                    LiteralKind::Float
                } else {
                    LiteralKind::Integer
                };
                Ok(Primary::Literal(Literal::new(kind, text)))
            }
            Token::String(text) => Ok(Primary::Literal(Literal::string(text))),
            Token::HexString(text) => Ok(Primary::Literal(Literal::new(LiteralKind::Binary, text))),
            Token::Parameter(text) => Ok(Primary::Literal(Literal::new(LiteralKind::Parameter, text))),
            Token::Word { value, quoted } => {
                self.idx -= 1;
                if !quoted && Self::is_reserved(self.peek()) {
                    return Err(self.error(format!("Unexpected keyword {}", value)));
                }
                if quoted {
                    self.parse_name_primary()
                } else {
                    self.parse_word_primary(&value)
                }
            }
            other => {
                self.idx -= 1;
                Err(self.error(format!("Unexpected token {:?}", other)))
            }
        }
    }

    /// Primary starting with an unquoted word: keyword constructs, typed
    /// literals, function calls and column references
    fn parse_word_primary(&mut self, word: &str) -> IrResult<Primary> {
        let upper = word.to_ascii_uppercase();
        match upper.as_str() {
            "NULL" => {
                self.idx += 1;
                return Ok(Primary::Literal(Literal::null()));
            }
            "TRUE" | "FALSE" => {
                self.idx += 1;
                return Ok(Primary::Literal(Literal::new(LiteralKind::Boolean, upper)));
            }
            "CASE" => {
                self.idx += 1;
                return Ok(Primary::Function(Box::new(FunctionCall::Case(self.parse_case()?))));
            }
            _ => {}
        }

        if let Token::String(text) = self.peek_nth(1).clone() {
            let kind = match upper.as_str() {
                "DATE" => Some(LiteralKind::Date),
                "TIME" => Some(LiteralKind::Time),
                "TIMESTAMP" => Some(LiteralKind::Timestamp),
                "INTERVAL" => Some(LiteralKind::Interval),
                "MACADDR" => Some(LiteralKind::MacAddr),
                "CIDR" => Some(LiteralKind::Cidr),
                "INET" => Some(LiteralKind::Inet),
                "POINT" => Some(LiteralKind::Geometry),
                _ => None,
            };
            if let Some(kind) = kind {
                self.idx += 2;
                return Ok(Primary::Literal(Literal::new(kind, text)));
            }
        }

        if self.peek_nth(1).is_symbol("(") {
            let special = match upper.as_str() {
                "COUNT" | "TRIM" | "EXTRACT" | "SUBSTRING" | "OVERLAY" | "POSITION" | "CAST"
                | "CONVERT" => true,
                _ => false,
            };
            if special {
                self.idx += 2;
                let call = self.parse_special_call(&upper)?;
                self.expect_symbol(")")?;
                return Ok(Primary::Function(Box::new(call)));
            }
        }
        self.parse_name_primary()
    }

    /// Generic function call or column reference
    fn parse_name_primary(&mut self) -> IrResult<Primary> {
        let first = self.parse_identifier()?;

        if self.parse_symbol("(") {
            let quantifier = match self.parse_one_of_keywords(&["DISTINCT", "ALL"]) {
                Some("DISTINCT") => Some(SetQuantifier::Distinct),
                Some(_) => Some(SetQuantifier::All),
                None => None,
            };
            let mut args = Vec::new();
            if !self.peek().is_symbol(")") {
                args.push(self.parse_value_expr()?);
                while self.parse_symbol(",") {
                    args.push(self.parse_value_expr()?);
                }
            }
            self.expect_symbol(")")?;
            return Ok(Primary::Function(Box::new(FunctionCall::Generic {
                name: first,
                quantifier,
                args,
            })));
        }

        let mut column = if self.peek().is_symbol(".") && !self.peek_nth(1).is_symbol("*") {
            self.idx += 1;
            ColumnName {
                qualifier: Some(first),
                name: self.parse_identifier()?,
                outer_join_marker: false,
            }
        } else {
            ColumnName {
                qualifier: None,
                name: first,
                outer_join_marker: false,
            }
        };
        if self.peek().is_symbol("(")
            && self.peek_nth(1).is_symbol("+")
            && self.peek_nth(2).is_symbol(")")
        {
            self.idx += 3;
            column = column.with_outer_join_marker();
        }
        Ok(Primary::Column(column))
    }

    /// Keyword-shaped calls; the opening parenthesis is already consumed
    fn parse_special_call(&mut self, name: &str) -> IrResult<FunctionCall> {
        match name {
            "COUNT" => {
                if self.parse_symbol("*") {
                    return Ok(FunctionCall::Count(CountArgument::Star));
                }
                let quantifier = match self.parse_one_of_keywords(&["DISTINCT", "ALL"]) {
                    Some("DISTINCT") => Some(SetQuantifier::Distinct),
                    Some(_) => Some(SetQuantifier::All),
                    None => None,
                };
                let expr = self.parse_value_expr()?;
                Ok(FunctionCall::Count(CountArgument::Value { quantifier, expr }))
            }
            "TRIM" => {
                let side = match self.parse_one_of_keywords(&["BOTH", "LEADING", "TRAILING"]) {
                    Some("BOTH") => Some(TrimSide::Both),
                    Some("LEADING") => Some(TrimSide::Leading),
                    Some(_) => Some(TrimSide::Trailing),
                    None => None,
                };
                if self.parse_keyword("FROM") {
                    let source = self.parse_value_expr()?;
                    return Ok(FunctionCall::Trim {
                        side,
                        characters: None,
                        source,
                    });
                }
                let first = self.parse_value_expr()?;
                if self.parse_keyword("FROM") {
                    let source = self.parse_value_expr()?;
                    Ok(FunctionCall::Trim {
                        side,
                        characters: Some(first),
                        source,
                    })
                } else {
                    Ok(FunctionCall::Trim {
                        side,
                        characters: None,
                        source: first,
                    })
                }
            }
            "EXTRACT" => {
                let field = match self.next_token() {
                    Token::Word { value, .. } => value.to_ascii_uppercase(),
                    Token::String(value) => value.to_ascii_uppercase(),
                    other => {
                        return Err(self.error(format!("Expected EXTRACT field, found {:?}", other)));
                    }
                };
                self.expect_keyword("FROM")?;
                let source = self.parse_value_expr()?;
                Ok(FunctionCall::Extract { field, source })
            }
            "SUBSTRING" => {
                let source = self.parse_value_expr()?;
                let (start, length) = if self.parse_symbol(",") {
                    let start = self.parse_value_expr()?;
                    let length = if self.parse_symbol(",") {
                        Some(self.parse_value_expr()?)
                    } else {
                        None
                    };
                    (Some(start), length)
                } else {
                    let start = if self.parse_keyword("FROM") {
                        Some(self.parse_value_expr()?)
                    } else {
                        None
                    };
                    let length = if self.parse_keyword("FOR") {
                        Some(self.parse_value_expr()?)
                    } else {
                        None
                    };
                    (start, length)
                };
                Ok(FunctionCall::Substring {
                    source,
                    start,
                    length,
                })
            }
            "OVERLAY" => {
                let source = self.parse_value_expr()?;
                self.expect_keyword("PLACING")?;
                let replacement = self.parse_value_expr()?;
                self.expect_keyword("FROM")?;
                let start = self.parse_value_expr()?;
                let length = if self.parse_keyword("FOR") {
                    Some(self.parse_value_expr()?)
                } else {
                    None
                };
                Ok(FunctionCall::Overlay {
                    source,
                    replacement,
                    start,
                    length,
                })
            }
            "POSITION" => {
                let needle = self.parse_value_expr()?;
                self.expect_keyword("IN")?;
                let haystack = self.parse_value_expr()?;
                Ok(FunctionCall::Position { needle, haystack })
            }
            "CAST" => {
                let expr = self.parse_value_expr()?;
                self.expect_keyword("AS")?;
                let target = self.parse_type_name()?;
                Ok(FunctionCall::Cast { expr, target })
            }
            _ => {
                let expr = self.parse_value_expr()?;
                self.expect_keyword("USING")?;
                let encoding = self.parse_identifier()?.value;
                Ok(FunctionCall::Convert { expr, encoding })
            }
        }
    }

    fn parse_case(&mut self) -> IrResult<CaseExpr> {
        let operand = if self.peek().is_keyword("WHEN") {
            None
        } else {
            Some(self.parse_value_expr()?)
        };

        let mut branches = Vec::new();
        while self.parse_keyword("WHEN") {
            let condition = if operand.is_some() {
                WhenCondition::Value(self.parse_value_expr()?)
            } else {
                WhenCondition::Search(self.parse_search_condition()?)
            };
            self.expect_keyword("THEN")?;
            let result = self.parse_value_expr()?;
            branches.push(WhenClause { condition, result });
        }
        if branches.is_empty() {
            return Err(self.error("CASE requires at least one WHEN branch"));
        }
        let else_result = if self.parse_keyword("ELSE") {
            Some(self.parse_value_expr()?)
        } else {
            None
        };
        self.expect_keyword("END")?;
        Ok(CaseExpr {
            operand,
            branches,
            else_result,
        })
    }

    /// `name [words] [(n[, m])] [WITH[OUT] TIME ZONE]`
    fn parse_type_name(&mut self) -> IrResult<TypeName> {
        let mut name = self.parse_identifier()?.value;
        while let Some(word) = self.parse_one_of_keywords(&["PRECISION", "VARYING"]) {
            name.push(' ');
            name.push_str(&word.to_ascii_lowercase());
        }
        let mut modifiers = Vec::new();
        if self.parse_symbol("(") {
            loop {
                let value = self.parse_unsigned()?;
                modifiers.push(
                    u32::try_from(value).map_err(|_| self.error("Type modifier out of range"))?,
                );
                if !self.parse_symbol(",") {
                    break;
                }
            }
            self.expect_symbol(")")?;
        }
        let mut type_name = TypeName::new(name).with_modifiers(modifiers);
        if self.parse_keyword_sequence(&["WITH", "TIME", "ZONE"]) {
            type_name.with_time_zone = true;
        } else {
            self.parse_keyword_sequence(&["WITHOUT", "TIME", "ZONE"]);
        }
        Ok(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Query {
        FixtureParser::parse(sql).unwrap()
    }

    #[test]
    fn test_parse_select_star_with_join_condition() {
        let query = parse("SELECT * FROM a, b WHERE a.x = b.x");
        assert_eq!(query.body.projection, vec![SelectItem::Wildcard]);
        assert_eq!(query.body.from.len(), 2);
        assert_eq!(
            query.body.where_clause,
            Some(SearchCondition::compare(
                ValueExpr::qualified_column("a", "x"),
                CompareOp::Eq,
                ValueExpr::qualified_column("b", "x"),
            ))
        );
    }

    #[test]
    fn test_parse_left_outer_join() {
        let query = parse("SELECT a.id FROM a LEFT OUTER JOIN b ON a.id = b.id");
        let join = &query.body.from[0].joins[0];
        assert_eq!(join.kind, JoinKind::LeftOuter);
        assert!(matches!(join.constraint, Some(JoinConstraint::On(_))));
    }

    #[test]
    fn test_parse_in_subquery() {
        let query = parse("SELECT n FROM t WHERE n NOT IN (SELECT x FROM a)");
        let conjunct = &query.body.where_clause.unwrap().disjuncts[0].conjuncts[0];
        let LogicalPrimary::Relational(relational) = &conjunct.primary else {
            panic!("expected relational");
        };
        assert!(matches!(
            relational.tail,
            Some(RelationalTail::In {
                negated: true,
                source: InSource::Subquery(_)
            })
        ));
    }

    #[test]
    fn test_parse_nested_condition_versus_nested_expression() {
        let query = parse("SELECT 1 FROM t WHERE (a = 1 OR b = 2) AND (x + 1) > 2");
        let conjuncts = &query.body.where_clause.unwrap().disjuncts[0].conjuncts;
        assert!(matches!(conjuncts[0].primary, LogicalPrimary::Nested(_)));
        assert!(matches!(conjuncts[1].primary, LogicalPrimary::Relational(_)));
    }

    #[test]
    fn test_parse_outer_join_marker_and_cast() {
        let query = parse("SELECT CAST(a.x AS VARCHAR(10)), b.y::timestamp with time zone FROM a, b WHERE a.id = b.id(+)");
        let SelectItem::Expr { expr, .. } = &query.body.projection[0] else {
            panic!("expected expression");
        };
        assert!(matches!(expr.as_primary(), Some(Primary::Function(_))));
        let SelectItem::Expr { expr, .. } = &query.body.projection[1] else {
            panic!("expected expression");
        };
        assert!(matches!(
            &expr.first.first.suffix[0],
            SuffixOp::Cast(TypeName { with_time_zone: true, .. })
        ));
        let text = format!("{:?}", query.body.where_clause);
        assert!(text.contains("outer_join_marker: true"));
    }

    #[test]
    fn test_parse_order_limit_offset_union() {
        let query = parse("SELECT a FROM t UNION ALL SELECT b FROM u ORDER BY 1 DESC NULLS LAST LIMIT 5 OFFSET 2");
        assert_eq!(query.unions.len(), 1);
        assert_eq!(query.unions[0].union_type, UnionType::UnionAll);
        assert_eq!(query.order_by[0].direction, Some(SortDirection::Desc));
        assert_eq!(query.order_by[0].nulls, Some(NullsOrder::Last));
        assert_eq!((query.limit, query.offset), (Some(5), Some(2)));
    }

    #[test]
    fn test_parse_error_position() {
        let err = FixtureParser::parse("SELECT FROM").unwrap_err();
        assert!(matches!(err, IrError::Syntax { position: 7, .. }));
    }
}
