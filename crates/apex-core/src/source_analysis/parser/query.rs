// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The embedded query (`SELECT`) and search (`FIND`) sublanguages.
//!
//! Every clause word is an ordinary identifier matched case-insensitively,
//! so `with`, `limit` and `user_mode` stay valid names outside a query.
//! Only `for`, `update`, `else` and the literals are real keywords here.

use crate::ast::{
    BindExpression, Comparison, ComparisonOperator, Condition, DataCategoryFilter,
    FieldExpression, FieldPath, ForKind, FromEntry, FunctionArgument, FunctionCall, GroupBy,
    GroupByKind, Identifier, NullsOrder, OrderItem, Query, QueryBound, QueryMode, QueryValue,
    Search, SearchOption, SearchParameter, SearchReturning, SearchTerm, SearchWith, SelectEntry,
    SortDirection, TypeOfClause, TypeOfWhen, UpdateKind, WithClause,
};
use crate::source_analysis::{ErrorListener, Keyword, Span, TokenKind};
use ecow::EcoString;

use super::Parser;
use super::types::is_name;

/// Clause words that end a field list, so they can never be an alias.
const CLAUSE_WORDS: &[&str] = &[
    "select", "from", "where", "with", "using", "group", "by", "having", "order", "limit",
    "offset", "and", "or", "not", "in", "like", "includes", "excludes", "asc", "desc", "nulls",
    "first", "last", "all", "rows", "typeof", "when", "then", "end", "returning", "find",
    "rollup", "cube",
];

/// Relative date formulas. The `_n_` forms take a `:count` argument.
const DATE_FORMULAS: &[&str] = &[
    "yesterday",
    "today",
    "tomorrow",
    "last_week",
    "this_week",
    "next_week",
    "last_month",
    "this_month",
    "next_month",
    "last_90_days",
    "next_90_days",
    "last_n_days",
    "next_n_days",
    "n_days_ago",
    "last_n_weeks",
    "next_n_weeks",
    "n_weeks_ago",
    "last_n_months",
    "next_n_months",
    "n_months_ago",
    "this_quarter",
    "last_quarter",
    "next_quarter",
    "last_n_quarters",
    "next_n_quarters",
    "n_quarters_ago",
    "this_year",
    "last_year",
    "next_year",
    "last_n_years",
    "next_n_years",
    "n_years_ago",
    "this_fiscal_quarter",
    "last_fiscal_quarter",
    "next_fiscal_quarter",
    "last_n_fiscal_quarters",
    "next_n_fiscal_quarters",
    "n_fiscal_quarters_ago",
    "this_fiscal_year",
    "last_fiscal_year",
    "next_fiscal_year",
    "last_n_fiscal_years",
    "next_n_fiscal_years",
    "n_fiscal_years_ago",
];

fn is_clause_word(kind: &TokenKind) -> bool {
    CLAUSE_WORDS.iter().any(|word| kind.is_word(word))
}

/// Returns true for an identifier usable as an alias.
fn is_alias(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::Identifier(_)) && !is_clause_word(kind)
}

fn query_mode(kind: &TokenKind) -> Option<QueryMode> {
    if kind.is_word("user_mode") {
        Some(QueryMode::UserMode)
    } else if kind.is_word("system_mode") {
        Some(QueryMode::SystemMode)
    } else if kind.is_word("security_enforced") {
        Some(QueryMode::SecurityEnforced)
    } else {
        None
    }
}

/// Splits `USD100` into `("USD", "100")`.
fn split_currency(text: &str) -> Option<(&str, &str)> {
    let (code, amount) = text.split_at_checked(3)?;
    let valid = code.bytes().all(|b| b.is_ascii_alphabetic())
        && !amount.is_empty()
        && amount.bytes().all(|b| b.is_ascii_digit());
    valid.then_some((code, amount))
}

impl<L: ErrorListener> Parser<'_, L> {
    // ========================================================================
    // Query
    // ========================================================================

    /// Parses `SELECT ... FROM ...` and its trailing clauses, stopping
    /// before the closing `]` or `)`.
    pub(super) fn parse_query(&mut self) -> Query {
        let start = self.current_span();
        self.expect_word("select", "'SELECT'");
        let select = self.parse_select_list();
        self.expect_word("from", "'FROM'");
        let from = self.parse_from_list();

        let using_scope = if self.check_word("using") && self.peek_is_word(1, "scope") {
            self.advance();
            self.advance();
            Some(self.parse_identifier("scope name"))
        } else {
            None
        };
        let where_clause = if self.match_word("where") {
            Some(self.parse_query_condition())
        } else {
            None
        };
        let with = if self.check_word("with") {
            Some(self.parse_with_clause())
        } else {
            None
        };
        let group_by = if self.check_word("group") && self.peek_is_word(1, "by") {
            Some(self.parse_group_by())
        } else {
            None
        };
        let having = if self.match_word("having") {
            Some(self.parse_query_condition())
        } else {
            None
        };
        let order_by = self.parse_order_by();
        let limit = if self.match_word("limit") {
            self.parse_bound()
        } else {
            None
        };
        let offset = if self.match_word("offset") {
            self.parse_bound()
        } else {
            None
        };
        let all_rows = self.check_word("all") && self.peek_is_word(1, "rows");
        if all_rows {
            self.advance();
            self.advance();
        }
        let for_clauses = self.parse_for_clauses();
        let update_clauses = self.parse_update_clauses();

        Query {
            select,
            from,
            using_scope,
            where_clause,
            with,
            group_by,
            having,
            order_by,
            limit,
            offset,
            all_rows,
            for_clauses,
            update_clauses,
            span: self.span_from(start),
        }
    }

    /// Runs `parse` one nesting level deeper, or returns the span where the
    /// nesting limit was hit.
    fn guarded<T>(&mut self, parse: impl FnOnce(&mut Self) -> T) -> Result<T, Span> {
        stacker::maybe_grow(32 * 1024, 256 * 1024, || {
            if let Err(error) = self.enter_nesting(self.current_span()) {
                return Err(error.span());
            }
            let result = parse(self);
            self.leave_nesting();
            Ok(result)
        })
    }

    /// Discards a parenthesized group, including its closing `)`.
    fn skip_parenthesized(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.current_kind() {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen if depth <= 1 => {
                    self.advance();
                    return;
                }
                TokenKind::RightParen => depth -= 1,
                TokenKind::RightBracket if depth == 0 => return,
                _ => {}
            }
            self.advance();
        }
    }

    /// Parses `(SELECT ...)` at the current `(`.
    ///
    /// Returns `None` if the nesting limit was hit; the group is skipped.
    fn parse_subquery(&mut self) -> Option<Query> {
        let result = self.guarded(|parser| {
            parser.advance();
            let query = parser.parse_query();
            parser.expect(&TokenKind::RightParen, "')'");
            query
        });
        match result {
            Ok(query) => Some(query),
            Err(_) => {
                self.skip_parenthesized();
                None
            }
        }
    }

    // ========================================================================
    // Fields
    // ========================================================================

    fn parse_select_list(&mut self) -> Vec<SelectEntry> {
        let mut entries = Vec::new();
        loop {
            let at_entry = (is_name(self.current_kind()) && !is_clause_word(self.current_kind()))
                || self.check_word("typeof")
                || self.check(&TokenKind::LeftParen);
            if !at_entry {
                self.error_expected("field");
                break;
            }
            if let Some(entry) = self.parse_select_entry() {
                entries.push(entry);
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        entries
    }

    fn parse_select_entry(&mut self) -> Option<SelectEntry> {
        let start = self.current_span();
        if self.check(&TokenKind::LeftParen) {
            return self
                .parse_subquery()
                .map(|query| SelectEntry::Subquery(Box::new(query)));
        }
        if self.check_word("typeof") {
            return Some(SelectEntry::TypeOf(self.parse_typeof()));
        }
        let entry = match self.parse_field_expression() {
            FieldExpression::Path(path) => SelectEntry::Field {
                path,
                alias: self.parse_alias(),
                span: self.span_from(start),
            },
            FieldExpression::Function(call) => SelectEntry::Function {
                call,
                alias: self.parse_alias(),
                span: self.span_from(start),
            },
        };
        Some(entry)
    }

    fn parse_alias(&mut self) -> Option<Identifier> {
        if is_alias(self.current_kind()) {
            Some(self.parse_identifier("alias"))
        } else {
            None
        }
    }

    /// Parses `TYPEOF field WHEN Type THEN fields ... [ELSE fields] END`.
    fn parse_typeof(&mut self) -> TypeOfClause {
        let start = self.advance().span();
        let field = self.parse_field_path();

        let mut whens = Vec::new();
        while self.check_word("when") {
            let when_start = self.advance().span();
            let object = self.parse_identifier("object type");
            self.expect_word("then", "'THEN'");
            let fields = self.parse_field_path_list();
            whens.push(TypeOfWhen {
                object,
                fields,
                span: self.span_from(when_start),
            });
        }
        if whens.is_empty() {
            self.error_expected("'WHEN'");
        }
        let else_fields = if self.match_keyword(Keyword::Else) {
            self.parse_field_path_list()
        } else {
            Vec::new()
        };
        self.expect_word("end", "'END'");

        TypeOfClause {
            field,
            whens,
            else_fields,
            span: self.span_from(start),
        }
    }

    /// Parses `Owner.Profile.Name`.
    fn parse_field_path(&mut self) -> FieldPath {
        let start = self.current_span();
        let mut parts = vec![self.parse_identifier("field name")];
        while self.check(&TokenKind::Dot) && is_name(self.peek_at(1)) {
            self.advance();
            parts.push(self.parse_identifier("field name"));
        }
        FieldPath {
            parts,
            span: self.span_from(start),
        }
    }

    fn parse_field_path_list(&mut self) -> Vec<FieldPath> {
        let mut fields = vec![self.parse_field_path()];
        while self.match_token(&TokenKind::Comma) {
            fields.push(self.parse_field_path());
        }
        fields
    }

    fn parse_field_expression(&mut self) -> FieldExpression {
        if is_name(self.current_kind()) && matches!(self.peek_at(1), TokenKind::LeftParen) {
            FieldExpression::Function(self.parse_function_call())
        } else {
            FieldExpression::Path(self.parse_field_path())
        }
    }

    fn parse_field_expression_list(&mut self) -> Vec<FieldExpression> {
        let mut fields = vec![self.parse_field_expression()];
        while self.match_token(&TokenKind::Comma) {
            fields.push(self.parse_field_expression());
        }
        fields
    }

    /// Parses `name(arguments)`: `COUNT()`, `FIELDS(ALL)`,
    /// `DISTANCE(Location__c, GEOLOCATION(1, 2), 'mi')`.
    fn parse_function_call(&mut self) -> FunctionCall {
        let start = self.current_span();
        let name = self.parse_identifier("function name");
        let arguments = match self.guarded(Self::parse_function_arguments) {
            Ok(arguments) => arguments,
            Err(_) => {
                self.skip_parenthesized();
                Vec::new()
            }
        };
        FunctionCall {
            name,
            arguments,
            span: self.span_from(start),
        }
    }

    fn parse_function_arguments(&mut self) -> Vec<FunctionArgument> {
        self.advance();
        let mut arguments = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                let argument = if !is_name(self.current_kind()) {
                    FunctionArgument::Value(self.parse_query_value())
                } else if matches!(self.peek_at(1), TokenKind::LeftParen) {
                    FunctionArgument::Function(self.parse_function_call())
                } else {
                    FunctionArgument::Field(self.parse_field_path())
                };
                arguments.push(argument);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen, "')'");
        arguments
    }

    fn parse_from_list(&mut self) -> Vec<FromEntry> {
        let mut entries = Vec::new();
        loop {
            let start = self.current_span();
            let object = self.parse_field_path();
            let alias = self.parse_alias();
            entries.push(FromEntry {
                object,
                alias,
                span: self.span_from(start),
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        entries
    }

    // ========================================================================
    // Conditions
    // ========================================================================

    /// Parses a `WHERE` or `HAVING` condition.
    ///
    /// One level may join its operands with `AND` or with `OR`, never both.
    fn parse_query_condition(&mut self) -> Condition {
        let start = self.current_span();
        let first = self.parse_condition_operand();
        let mut rest = Vec::new();
        let mut joiner: Option<bool> = None;

        loop {
            let is_and = if self.check_word("and") {
                true
            } else if self.check_word("or") {
                false
            } else {
                break;
            };
            match joiner {
                None => joiner = Some(is_and),
                Some(previous) if previous != is_and => {
                    self.error("cannot mix AND and OR without parentheses");
                }
                Some(_) => {}
            }
            self.advance();
            rest.push(self.parse_condition_operand());
        }

        let Some(is_and) = joiner else {
            return first;
        };
        let mut operands = Vec::with_capacity(rest.len() + 1);
        operands.push(first);
        operands.extend(rest);
        let span = self.span_from(start);
        if is_and {
            Condition::And { operands, span }
        } else {
            Condition::Or { operands, span }
        }
    }

    fn parse_condition_operand(&mut self) -> Condition {
        let start = self.current_span();
        if self.check_word("not") {
            let result = self.guarded(|parser| {
                parser.advance();
                let operand = parser.parse_condition_operand();
                Condition::Not {
                    operand: Box::new(operand),
                    span: parser.span_from(start),
                }
            });
            return result.unwrap_or_else(|span| Condition::Error {
                message: "nesting too deep".into(),
                span,
            });
        }
        if self.check(&TokenKind::LeftParen) {
            let result = self.guarded(|parser| {
                parser.advance();
                let condition = parser.parse_query_condition();
                parser.expect(&TokenKind::RightParen, "')'");
                Condition::Parenthesized {
                    condition: Box::new(condition),
                    span: parser.span_from(start),
                }
            });
            return match result {
                Ok(condition) => condition,
                Err(span) => {
                    self.skip_parenthesized();
                    Condition::Error {
                        message: "nesting too deep".into(),
                        span,
                    }
                }
            };
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Condition {
        let start = self.current_span();
        if !is_name(self.current_kind()) {
            self.error_expected("field");
            return Condition::Error {
                message: "expected field".into(),
                span: Span::empty_at(start.start()),
            };
        }
        let field = self.parse_field_expression();
        let Some(operator) = self.parse_comparison_operator() else {
            return Condition::Error {
                message: "expected comparison operator".into(),
                span: self.span_from(start),
            };
        };
        let value = self.parse_query_value();
        Condition::Comparison(Comparison {
            field,
            operator,
            value,
            span: self.span_from(start),
        })
    }

    fn parse_comparison_operator(&mut self) -> Option<ComparisonOperator> {
        let kind = self.current_kind().clone();
        let (operator, tokens) = match kind {
            TokenKind::Assign => (ComparisonOperator::Equal, 1),
            TokenKind::NotEqual | TokenKind::LessGreater => (ComparisonOperator::NotEqual, 1),
            TokenKind::Less => (ComparisonOperator::Less, 1),
            TokenKind::LessEqual => (ComparisonOperator::LessEqual, 1),
            TokenKind::Greater => {
                if matches!(self.peek_at(1), TokenKind::Assign) && self.touches_next(0) {
                    (ComparisonOperator::GreaterEqual, 2)
                } else {
                    (ComparisonOperator::Greater, 1)
                }
            }
            _ if kind.is_word("like") => (ComparisonOperator::Like, 1),
            _ if kind.is_word("in") => (ComparisonOperator::In, 1),
            _ if kind.is_word("includes") => (ComparisonOperator::Includes, 1),
            _ if kind.is_word("excludes") => (ComparisonOperator::Excludes, 1),
            _ if kind.is_word("not") && self.peek_is_word(1, "in") => {
                (ComparisonOperator::NotIn, 2)
            }
            _ => {
                self.error_expected("comparison operator");
                return None;
            }
        };
        for _ in 0..tokens {
            self.advance();
        }
        Some(operator)
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Parses the value on the right of a comparison.
    fn parse_query_value(&mut self) -> QueryValue {
        let start = self.current_span();
        let kind = self.current_kind().clone();
        match kind {
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                QueryValue::Null(start)
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                QueryValue::Boolean(true, start)
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                QueryValue::Boolean(false, start)
            }
            TokenKind::IntegerLiteral(value)
            | TokenKind::LongLiteral(value)
            | TokenKind::NumberLiteral(value) => {
                self.advance();
                QueryValue::Number {
                    value,
                    negative: false,
                    span: start,
                }
            }
            TokenKind::Minus | TokenKind::Plus => {
                let negative = matches!(kind, TokenKind::Minus);
                self.advance();
                match self.current_kind().clone() {
                    TokenKind::IntegerLiteral(value)
                    | TokenKind::LongLiteral(value)
                    | TokenKind::NumberLiteral(value) => {
                        self.advance();
                        QueryValue::Number {
                            value,
                            negative,
                            span: self.span_from(start),
                        }
                    }
                    _ => {
                        self.error_expected("number");
                        QueryValue::Error {
                            message: "expected number".into(),
                            span: self.span_from(start),
                        }
                    }
                }
            }
            TokenKind::StringLiteral(value) => {
                self.advance();
                QueryValue::String(value, start)
            }
            TokenKind::DateLiteral(value) => {
                self.advance();
                QueryValue::Date(value, start)
            }
            TokenKind::DateTimeLiteral(value) => {
                self.advance();
                QueryValue::DateTime(value, start)
            }
            TokenKind::Colon => QueryValue::Bind(self.parse_bind()),
            TokenKind::LeftParen if self.peek_is_word(1, "select") => {
                match self.parse_subquery() {
                    Some(query) => QueryValue::Subquery(Box::new(query)),
                    None => QueryValue::Error {
                        message: "nesting too deep".into(),
                        span: self.span_from(start),
                    },
                }
            }
            TokenKind::LeftParen => match self.guarded(|parser| parser.parse_value_list(start)) {
                Ok(list) => list,
                Err(span) => {
                    self.skip_parenthesized();
                    QueryValue::Error {
                        message: "nesting too deep".into(),
                        span,
                    }
                }
            },
            TokenKind::Identifier(name) => self.parse_named_value(&name, start),
            _ => self.query_value_error(start),
        }
    }

    fn query_value_error(&mut self, start: Span) -> QueryValue {
        self.error_expected("query value");
        QueryValue::Error {
            message: "expected query value".into(),
            span: Span::empty_at(start.start()),
        }
    }

    /// Parses `('a', 'b')`.
    fn parse_value_list(&mut self, start: Span) -> QueryValue {
        self.advance();
        let mut values = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                values.push(self.parse_query_value());
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen, "')'");
        QueryValue::List {
            values,
            span: self.span_from(start),
        }
    }

    /// Parses a date formula (`LAST_N_DAYS:30`) or a currency value
    /// (`USD100.01`).
    fn parse_named_value(&mut self, name: &str, start: Span) -> QueryValue {
        let lower = name.to_ascii_lowercase();
        if DATE_FORMULAS.contains(&lower.as_str()) {
            let formula = self.parse_identifier("date formula");
            let argument = match self.peek_at(1).clone() {
                TokenKind::IntegerLiteral(count) if self.check(&TokenKind::Colon) => {
                    self.advance();
                    self.advance();
                    Some(count)
                }
                _ => None,
            };
            if argument.is_none() && (lower.contains("_n_") || lower.starts_with("n_")) {
                self.error_expected(&format!("':' and a count after {name}"));
            }
            return QueryValue::DateFormula {
                name: formula,
                argument,
                span: self.span_from(start),
            };
        }

        if let Some((code, amount)) = split_currency(name) {
            let mut amount = EcoString::from(amount);
            self.advance();
            if let TokenKind::NumberLiteral(fraction) = self.current_kind().clone() {
                if fraction.starts_with('.') && self.previous_end == self.current_span().start() {
                    amount.push_str(&fraction);
                    self.advance();
                }
            }
            return QueryValue::Currency {
                code: code.into(),
                amount,
                span: self.span_from(start),
            };
        }

        self.query_value_error(start)
    }

    /// Parses `:expression`.
    fn parse_bind(&mut self) -> BindExpression {
        let start = self.advance().span();
        let expression = self.nested(Self::parse_postfix);
        BindExpression {
            expression,
            span: self.span_from(start),
        }
    }

    /// Parses the argument of `LIMIT` or `OFFSET`.
    fn parse_bound(&mut self) -> Option<QueryBound> {
        match self.current_kind().clone() {
            TokenKind::IntegerLiteral(value) => {
                let span = self.advance().span();
                Some(QueryBound::Integer(value, span))
            }
            TokenKind::Colon => Some(QueryBound::Bind(self.parse_bind())),
            _ => {
                self.error_expected("integer or bind expression");
                None
            }
        }
    }

    // ========================================================================
    // Clauses
    // ========================================================================

    /// Parses `WITH mode`, `WITH DATA CATEGORY ...` or `WITH filter`.
    fn parse_with_clause(&mut self) -> WithClause {
        let start = self.advance().span();
        if let Some(mode) = query_mode(self.current_kind()) {
            self.advance();
            return WithClause::Mode(mode, self.span_from(start));
        }
        if self.check_word("data") && self.peek_is_word(1, "category") {
            self.advance();
            self.advance();
            let filters = self.parse_data_category_filters();
            return WithClause::DataCategory {
                filters,
                span: self.span_from(start),
            };
        }
        WithClause::Filter(self.parse_query_condition())
    }

    /// Parses `Group__c AT value AND Other__c ABOVE (a, b)`.
    fn parse_data_category_filters(&mut self) -> Vec<DataCategoryFilter> {
        let mut filters = Vec::new();
        loop {
            let start = self.current_span();
            let group = self.parse_identifier("data category group");
            let at_selector = ["at", "above", "below", "above_or_below"]
                .iter()
                .any(|word| self.check_word(word));
            if !at_selector {
                self.error_expected("'AT', 'ABOVE', 'BELOW' or 'ABOVE_OR_BELOW'");
                break;
            }
            let selector = self.parse_identifier("category selector");
            let categories = if self.match_token(&TokenKind::LeftParen) {
                let mut categories = vec![self.parse_identifier("data category")];
                while self.match_token(&TokenKind::Comma) {
                    categories.push(self.parse_identifier("data category"));
                }
                self.expect(&TokenKind::RightParen, "')'");
                categories
            } else {
                vec![self.parse_identifier("data category")]
            };
            filters.push(DataCategoryFilter {
                group,
                selector,
                categories,
                span: self.span_from(start),
            });
            if !self.match_word("and") {
                break;
            }
        }
        filters
    }

    /// Parses `GROUP BY [ROLLUP|CUBE] (fields)`.
    fn parse_group_by(&mut self) -> GroupBy {
        let start = self.advance().span();
        self.advance();
        let kind = if self.check_word("rollup") {
            GroupByKind::Rollup
        } else if self.check_word("cube") {
            GroupByKind::Cube
        } else {
            GroupByKind::Plain
        };
        let fields = if kind == GroupByKind::Plain {
            self.parse_field_expression_list()
        } else {
            self.advance();
            self.expect(&TokenKind::LeftParen, "'('");
            let fields = self.parse_field_expression_list();
            self.expect(&TokenKind::RightParen, "')'");
            fields
        };
        GroupBy {
            kind,
            fields,
            span: self.span_from(start),
        }
    }

    /// Parses `ORDER BY f [ASC|DESC] [NULLS FIRST|LAST], ...` if present.
    fn parse_order_by(&mut self) -> Vec<OrderItem> {
        let mut items = Vec::new();
        if !(self.check_word("order") && self.peek_is_word(1, "by")) {
            return items;
        }
        self.advance();
        self.advance();
        loop {
            let start = self.current_span();
            let field = self.parse_field_expression();
            let direction = if self.match_word("asc") {
                Some(SortDirection::Ascending)
            } else if self.match_word("desc") {
                Some(SortDirection::Descending)
            } else {
                None
            };
            let nulls = if self.match_word("nulls") {
                if self.match_word("first") {
                    Some(NullsOrder::First)
                } else if self.match_word("last") {
                    Some(NullsOrder::Last)
                } else {
                    self.error_expected("'FIRST' or 'LAST'");
                    None
                }
            } else {
                None
            };
            items.push(OrderItem {
                field,
                direction,
                nulls,
                span: self.span_from(start),
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        items
    }

    /// Parses any `FOR VIEW`, `FOR REFERENCE` and `FOR UPDATE` clauses.
    fn parse_for_clauses(&mut self) -> Vec<ForKind> {
        let mut clauses = Vec::new();
        while self.match_keyword(Keyword::For) {
            let kind = if self.match_word("view") {
                ForKind::View
            } else if self.match_word("reference") {
                ForKind::Reference
            } else if self.match_keyword(Keyword::Update) {
                ForKind::Update
            } else {
                self.error_expected("'VIEW', 'REFERENCE' or 'UPDATE'");
                break;
            };
            clauses.push(kind);
        }
        clauses
    }

    /// Parses any `UPDATE TRACKING` and `UPDATE VIEWSTAT` clauses.
    fn parse_update_clauses(&mut self) -> Vec<UpdateKind> {
        let mut clauses = Vec::new();
        while self.check_keyword(Keyword::Update) {
            let kind = if self.peek_is_word(1, "tracking") {
                UpdateKind::Tracking
            } else if self.peek_is_word(1, "viewstat") {
                UpdateKind::Viewstat
            } else {
                break;
            };
            self.advance();
            self.advance();
            clauses.push(kind);
        }
        clauses
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Parses `FIND term [IN group FIELDS] [RETURNING ...] [WITH ...]
    /// [LIMIT n] [UPDATE ...]`.
    pub(super) fn parse_search(&mut self) -> Search {
        let start = self.current_span();
        self.expect_word("find", "'FIND'");
        let term = self.parse_search_term();

        let search_group = if self.match_word("in") {
            let group = self.parse_identifier("search group");
            self.expect_word("fields", "'FIELDS'");
            Some(group)
        } else {
            None
        };

        let mut returning = Vec::new();
        if self.match_word("returning") {
            loop {
                returning.push(self.parse_search_returning());
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        let mut with = Vec::new();
        while self.check_word("with") {
            with.push(self.parse_search_with());
        }

        let limit = if self.match_word("limit") {
            self.parse_bound()
        } else {
            None
        };
        let update_clauses = self.parse_update_clauses();

        Search {
            term,
            search_group,
            returning,
            with,
            limit,
            update_clauses,
            span: self.span_from(start),
        }
    }

    /// Parses `'text'`, `{text}` or `:bind`.
    fn parse_search_term(&mut self) -> SearchTerm {
        match self.current_kind().clone() {
            TokenKind::StringLiteral(value) => {
                let span = self.advance().span();
                SearchTerm::Text(value, span)
            }
            TokenKind::Colon => SearchTerm::Bind(self.parse_bind()),
            TokenKind::LeftBrace => {
                let open = self.advance().span();
                let mut depth = 0usize;
                loop {
                    if self.is_at_end() {
                        self.error_expected("'}'");
                        return SearchTerm::Error(self.span_from(open));
                    }
                    match self.current_kind() {
                        TokenKind::RightBrace if depth == 0 => break,
                        TokenKind::RightBrace => depth -= 1,
                        TokenKind::LeftBrace => depth += 1,
                        _ => {}
                    }
                    self.advance();
                }
                let close = self.advance().span();
                let inner = Span::new(open.end(), close.start());
                let text = self.source().get(inner.as_range()).unwrap_or_default();
                SearchTerm::Braced(text.into(), open.merge(close))
            }
            _ => {
                self.error_expected("search term");
                SearchTerm::Error(Span::empty_at(self.current_span().start()))
            }
        }
    }

    /// Parses `Object[(fields [WHERE ...] [ORDER BY ...] [LIMIT n] [OFFSET n])]`.
    fn parse_search_returning(&mut self) -> SearchReturning {
        let start = self.current_span();
        let object = self.parse_identifier("object name");
        let mut fields = Vec::new();
        let mut where_clause = None;
        let mut order_by = Vec::new();
        let mut limit = None;
        let mut offset = None;

        if self.match_token(&TokenKind::LeftParen) {
            if !self.check(&TokenKind::RightParen) {
                fields = self.parse_field_expression_list();
            }
            if self.match_word("where") {
                where_clause = Some(self.parse_query_condition());
            }
            order_by = self.parse_order_by();
            if self.match_word("limit") {
                limit = self.parse_bound();
            }
            if self.match_word("offset") {
                offset = self.parse_bound();
            }
            self.expect(&TokenKind::RightParen, "')'");
        }

        SearchReturning {
            object,
            fields,
            where_clause,
            order_by,
            limit,
            offset,
            span: self.span_from(start),
        }
    }

    /// Parses one `WITH` clause of a search.
    fn parse_search_with(&mut self) -> SearchWith {
        let start = self.advance().span();
        if let Some(mode) = query_mode(self.current_kind()) {
            self.advance();
            return SearchWith::Mode(mode, self.span_from(start));
        }
        if self.check_word("data") && self.peek_is_word(1, "category") {
            self.advance();
            self.advance();
            let filters = self.parse_data_category_filters();
            return SearchWith::DataCategory {
                filters,
                span: self.span_from(start),
            };
        }

        let name = self.parse_identifier("search option");
        let value = if self.match_token(&TokenKind::Assign) || self.match_word("in") {
            Some(self.parse_query_value())
        } else {
            None
        };
        let mut parameters = Vec::new();
        if self.match_token(&TokenKind::LeftParen) {
            loop {
                let parameter_start = self.current_span();
                let parameter = self.parse_identifier("option parameter");
                self.expect(&TokenKind::Assign, "'='");
                let parameter_value = self.parse_query_value();
                parameters.push(SearchParameter {
                    name: parameter,
                    value: parameter_value,
                    span: self.span_from(parameter_start),
                });
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightParen, "')'");
        }
        SearchWith::Option(SearchOption {
            name,
            value,
            parameters,
            span: self.span_from(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression;
    use crate::source_analysis::{
        ParseOptions, parse_expression, parse_query, parse_query_with_options,
    };

    fn parse_ok(source: &str) -> Query {
        let (query, errors) = parse_query(source);
        assert!(errors.is_empty(), "unexpected errors for {source:?}: {errors:?}");
        query
    }

    fn parse_err(source: &str) -> Vec<String> {
        let (_, errors) = parse_query(source);
        assert!(!errors.is_empty(), "expected errors for {source:?}");
        errors.into_iter().map(|e| e.message.to_string()).collect()
    }

    fn search_ok(source: &str) -> Search {
        let (expression, errors) = parse_expression(source);
        assert!(errors.is_empty(), "unexpected errors for {source:?}: {errors:?}");
        match expression {
            Expression::Search(search) => *search,
            other => panic!("expected search, got {other:?}"),
        }
    }

    fn where_comparison(query: &Query) -> &Comparison {
        match &query.where_clause {
            Some(Condition::Comparison(comparison)) => comparison,
            other => panic!("expected a single comparison, got {other:?}"),
        }
    }

    #[test]
    fn basic_clauses() {
        let query = parse_ok(
            "SELECT Id, Name, Owner.Name FROM Account a WHERE Name LIKE 'A%' \
             ORDER BY Name DESC NULLS LAST, Id LIMIT 10 OFFSET 5",
        );
        assert_eq!(query.select.len(), 3);
        assert_eq!(query.from[0].alias.as_ref().map(|a| a.name.as_str()), Some("a"));
        assert_eq!(where_comparison(&query).operator, ComparisonOperator::Like);
        assert_eq!(query.order_by.len(), 2);
        assert_eq!(query.order_by[0].direction, Some(SortDirection::Descending));
        assert_eq!(query.order_by[0].nulls, Some(NullsOrder::Last));
        assert!(matches!(query.limit, Some(QueryBound::Integer(ref n, _)) if n == "10"));
        assert!(query.offset.is_some());
    }

    #[test]
    fn clause_words_are_case_insensitive() {
        let upper = parse_ok("SELECT Id FROM Account WHERE Id = null");
        let lower = parse_ok("select Id from Account where Id = null");
        assert_eq!(upper.select.len(), lower.select.len());
        assert_eq!(upper.span.len(), lower.span.len());
    }

    #[test]
    fn security_modes() {
        for (source, mode) in [
            ("SELECT Id FROM Account WITH USER_MODE", QueryMode::UserMode),
            ("SELECT Id FROM Account WITH SYSTEM_MODE", QueryMode::SystemMode),
            ("SELECT Id FROM Account with security_enforced", QueryMode::SecurityEnforced),
        ] {
            let query = parse_ok(source);
            assert!(
                matches!(query.with, Some(WithClause::Mode(m, _)) if m == mode),
                "{source}"
            );
        }
    }

    #[test]
    fn mixing_and_or_needs_parentheses() {
        let errors = parse_err("SELECT Id FROM Account WHERE a = 1 AND b = 2 OR c = 3");
        assert_eq!(errors, vec!["cannot mix AND and OR without parentheses"]);

        let query = parse_ok("SELECT Id FROM Account WHERE a = 1 AND (b = 2 OR c = 3)");
        let Some(Condition::And { operands, .. }) = &query.where_clause else {
            panic!("expected AND");
        };
        assert_eq!(operands.len(), 2);
        assert_eq!(operands[1].kind_name(), "parenthesized");
    }

    #[test]
    fn not_and_set_operators() {
        let query = parse_ok(
            "SELECT Id FROM Account WHERE NOT Name = 'x' AND Id NOT IN :ids \
             AND Tags__c INCLUDES ('a;b', 'c') AND Type != null AND Rating <> 'Hot'",
        );
        let Some(Condition::And { operands, .. }) = &query.where_clause else {
            panic!("expected AND");
        };
        assert_eq!(operands[0].kind_name(), "not");
        let operators: Vec<_> = operands[1..]
            .iter()
            .map(|c| match c {
                Condition::Comparison(comparison) => comparison.operator,
                other => panic!("expected comparison, got {other:?}"),
            })
            .collect();
        assert_eq!(
            operators,
            vec![
                ComparisonOperator::NotIn,
                ComparisonOperator::Includes,
                ComparisonOperator::NotEqual,
                ComparisonOperator::NotEqual,
            ]
        );
    }

    #[test]
    fn greater_equal_is_joined() {
        let query = parse_ok("SELECT Id FROM Opportunity WHERE Amount >= 100");
        assert_eq!(where_comparison(&query).operator, ComparisonOperator::GreaterEqual);
        let query = parse_ok("SELECT Id FROM Opportunity WHERE Amount > 100");
        assert_eq!(where_comparison(&query).operator, ComparisonOperator::Greater);
    }

    #[test]
    fn currency_values() {
        let query = parse_ok("SELECT Id FROM Opportunity WHERE Amount > USD100.01");
        assert!(matches!(
            &where_comparison(&query).value,
            QueryValue::Currency { code, amount, .. } if code == "USD" && amount == "100.01"
        ));
        let query = parse_ok("SELECT Id FROM Opportunity WHERE Amount > JPY5000");
        assert!(matches!(
            &where_comparison(&query).value,
            QueryValue::Currency { amount, .. } if amount == "5000"
        ));
    }

    #[test]
    fn dates_and_formulas() {
        let query = parse_ok(
            "SELECT Id FROM Account WHERE CreatedDate > 2020-01-01 \
             AND LastModifiedDate < 2020-01-01T10:00:00Z \
             AND CloseDate = LAST_N_DAYS:30 AND SystemModstamp = today",
        );
        let Some(Condition::And { operands, .. }) = &query.where_clause else {
            panic!("expected AND");
        };
        let kinds: Vec<_> = operands
            .iter()
            .map(|c| match c {
                Condition::Comparison(comparison) => comparison.value.kind_name(),
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["date", "datetime", "date formula", "date formula"]);
        let Condition::Comparison(comparison) = &operands[2] else {
            panic!("expected comparison");
        };
        assert!(matches!(
            &comparison.value,
            QueryValue::DateFormula { argument: Some(n), .. } if n == "30"
        ));
    }

    #[test]
    fn counted_formula_needs_count() {
        let errors = parse_err("SELECT Id FROM Account WHERE CreatedDate = LAST_N_DAYS");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("expected ':' and a count"));
    }

    #[test]
    fn negative_numbers() {
        let query = parse_ok("SELECT Id FROM Account WHERE Balance__c > -100.5");
        assert!(matches!(
            &where_comparison(&query).value,
            QueryValue::Number { value, negative: true, .. } if value == "100.5"
        ));
    }

    #[test]
    fn explicitly_positive_numbers() {
        let query = parse_ok("SELECT Id FROM Account WHERE Value = +5");
        let QueryValue::Number {
            value,
            negative,
            span,
        } = &where_comparison(&query).value
        else {
            panic!("expected number");
        };
        assert_eq!((value.as_str(), *negative), ("5", false));
        assert_eq!(span.start(), 37);

        let (_, errors) = parse_query("SELECT Id FROM Account WHERE Value = +Name");
        assert_eq!(errors[0].message, "expected number, found 'Name'");
    }

    #[test]
    fn subqueries_in_select_and_where() {
        let query = parse_ok(
            "SELECT Id, (SELECT Id FROM Contacts) FROM Account \
             WHERE Id IN (SELECT AccountId FROM Opportunity)",
        );
        assert_eq!(query.select[1].kind_name(), "subquery");
        assert_eq!(where_comparison(&query).value.kind_name(), "subquery");
    }

    #[test]
    fn aggregates_with_aliases() {
        let query = parse_ok(
            "SELECT COUNT(Id) total, MAX(Amount) FROM Opportunity \
             GROUP BY ROLLUP(StageName) HAVING COUNT(Id) > 1",
        );
        assert!(matches!(
            &query.select[0],
            SelectEntry::Function { alias: Some(alias), .. } if alias.name == "total"
        ));
        let group_by = query.group_by.as_ref().map(|g| g.kind);
        assert_eq!(group_by, Some(GroupByKind::Rollup));
        assert!(query.having.is_some());
    }

    #[test]
    fn typeof_entry() {
        let query = parse_ok(
            "SELECT TYPEOF What WHEN Account THEN Phone, Name \
             WHEN Opportunity THEN Amount ELSE Name END FROM Event",
        );
        let SelectEntry::TypeOf(clause) = &query.select[0] else {
            panic!("expected TYPEOF");
        };
        assert_eq!(clause.whens.len(), 2);
        assert_eq!(clause.whens[0].fields.len(), 2);
        assert_eq!(clause.else_fields.len(), 1);
    }

    #[test]
    fn trailing_clauses() {
        let query = parse_ok(
            "SELECT Id FROM Account USING SCOPE mine ALL ROWS FOR VIEW FOR UPDATE UPDATE TRACKING",
        );
        assert!(query.using_scope.is_some());
        assert!(query.all_rows);
        assert_eq!(query.for_clauses, vec![ForKind::View, ForKind::Update]);
        assert_eq!(query.update_clauses, vec![UpdateKind::Tracking]);
    }

    #[test]
    fn binds_are_postfix_expressions() {
        let query = parse_ok("SELECT Id FROM Account WHERE OwnerId = :acc.Owner.Id LIMIT :size");
        let QueryValue::Bind(bind) = &where_comparison(&query).value else {
            panic!("expected bind");
        };
        assert_eq!(bind.expression.kind_name(), "field access");
        assert!(matches!(query.limit, Some(QueryBound::Bind(_))));
    }

    #[test]
    fn data_category_filter() {
        let query = parse_ok(
            "SELECT Title FROM KnowledgeArticleVersion \
             WITH DATA CATEGORY Geography__c AT usa__c AND Product__c ABOVE (a__c, b__c)",
        );
        let Some(WithClause::DataCategory { filters, .. }) = &query.with else {
            panic!("expected data category");
        };
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[1].categories.len(), 2);
    }

    #[test]
    fn bracketed_fragment() {
        let query = parse_ok("[SELECT Id FROM Account]");
        assert_eq!(query.span, Span::new(1, 23));
    }

    #[test]
    fn missing_from() {
        let errors = parse_err("SELECT Id WHERE Name = 'x'");
        assert_eq!(errors[0], "expected 'FROM', found 'WHERE'");
    }

    #[test]
    fn empty_select_list() {
        let errors = parse_err("SELECT FROM Account");
        assert_eq!(errors, vec!["expected field, found 'FROM'"]);
    }

    #[test]
    fn bad_value() {
        let errors = parse_err("SELECT Id FROM Account WHERE Name = Other");
        assert_eq!(errors, vec!["expected query value, found 'Other'"]);
    }

    #[test]
    fn deep_subqueries_are_bounded() {
        let depth = 40;
        let mut source = String::new();
        for _ in 0..depth {
            source.push_str("SELECT Id FROM A WHERE Id IN (");
        }
        source.push_str("SELECT Id FROM A");
        source.push_str(&")".repeat(depth));
        let options = ParseOptions::new().with_max_nesting_depth(16);
        let (_, errors) = parse_query_with_options(&source, options);
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].message.starts_with("nesting is too deep"));
    }

    #[test]
    fn search_literal() {
        let search = search_ok(
            "[FIND 'Acme*' IN NAME FIELDS RETURNING Account(Id, Name WHERE Name != null \
             ORDER BY Name LIMIT 5), Contact WITH SNIPPET (target_length=120) LIMIT 10]",
        );
        assert!(matches!(search.term, SearchTerm::Text(ref t, _) if t == "Acme*"));
        assert_eq!(search.search_group.map(|g| g.name), Some("NAME".into()));
        assert_eq!(search.returning.len(), 2);
        assert_eq!(search.returning[0].fields.len(), 2);
        assert!(search.returning[0].where_clause.is_some());
        assert!(search.returning[1].fields.is_empty());
        let [SearchWith::Option(option)] = search.with.as_slice() else {
            panic!("expected one option");
        };
        assert_eq!(option.parameters.len(), 1);
        assert!(search.limit.is_some());
    }

    #[test]
    fn search_terms() {
        let braced = search_ok("[FIND {Acme Inc} RETURNING Account]");
        assert!(matches!(braced.term, SearchTerm::Braced(ref t, _) if t == "Acme Inc"));
        let bound = search_ok("[FIND :term RETURNING Account WITH USER_MODE]");
        assert!(matches!(bound.term, SearchTerm::Bind(_)));
        assert!(matches!(bound.with[0], SearchWith::Mode(QueryMode::UserMode, _)));
    }
}
