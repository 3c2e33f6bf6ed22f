// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression parsing for Apex.
//!
//! This module contains the expression methods of `Parser`:
//!
//! - Assignment and compound assignment (`=`, `+=`, `>>>=`)
//! - The conditional operator (`? :`)
//! - Binary operators via Pratt parsing, plus `instanceof`
//! - Prefix operators and casts
//! - Member access, calls, indexing and postfix `++`/`--`
//! - Literals, `new` creators, class literals and inline queries
//!
//! The lexer never produces `>=`, `>>` or `>>>` tokens. Those operators are
//! assembled here from adjacent `>` tokens, which keeps nested generics like
//! `List<List<Integer>>` free of special cases.

use crate::ast::{
    AssignmentOperator, BinaryOperator, Creator, Expression, Identifier, Literal, MapEntry,
    PostfixOperator, UnaryOperator,
};
use crate::source_analysis::{ErrorListener, Keyword, Span, TokenKind};

use super::types::is_name;
use super::{Parser, RecoveryContext, binary_binding_power};

/// An infix operator recognised by the Pratt loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Infix {
    Binary(BinaryOperator),
    InstanceOf,
}

impl Infix {
    fn spelling(self) -> &'static str {
        match self {
            Self::Binary(operator) => operator.as_str(),
            Self::InstanceOf => "instanceof",
        }
    }
}

/// Maps a single token to its infix operator. `>` is handled separately.
fn single_token_infix(kind: &TokenKind) -> Option<Infix> {
    let operator = match kind {
        TokenKind::Star => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Percent => BinaryOperator::Modulo,
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Subtract,
        TokenKind::ShiftLeft => BinaryOperator::ShiftLeft,
        TokenKind::Less => BinaryOperator::Less,
        TokenKind::LessEqual => BinaryOperator::LessEqual,
        TokenKind::EqualEqual => BinaryOperator::Equal,
        TokenKind::NotEqual => BinaryOperator::NotEqual,
        TokenKind::LessGreater => BinaryOperator::LessGreater,
        TokenKind::EqualEqualEqual => BinaryOperator::ExactEqual,
        TokenKind::NotEqualEqual => BinaryOperator::ExactNotEqual,
        TokenKind::Ampersand => BinaryOperator::BitwiseAnd,
        TokenKind::Caret => BinaryOperator::BitwiseXor,
        TokenKind::Pipe => BinaryOperator::BitwiseOr,
        TokenKind::AndAnd => BinaryOperator::And,
        TokenKind::OrOr => BinaryOperator::Or,
        TokenKind::QuestionQuestion => BinaryOperator::Coalesce,
        TokenKind::Keyword(Keyword::InstanceOf) => return Some(Infix::InstanceOf),
        _ => return None,
    };
    Some(Infix::Binary(operator))
}

/// Maps a single token to its assignment operator.
fn single_token_assignment(kind: &TokenKind) -> Option<AssignmentOperator> {
    match kind {
        TokenKind::Assign => Some(AssignmentOperator::Assign),
        TokenKind::PlusAssign => Some(AssignmentOperator::Add),
        TokenKind::MinusAssign => Some(AssignmentOperator::Subtract),
        TokenKind::StarAssign => Some(AssignmentOperator::Multiply),
        TokenKind::SlashAssign => Some(AssignmentOperator::Divide),
        TokenKind::PercentAssign => Some(AssignmentOperator::Modulo),
        TokenKind::AmpersandAssign => Some(AssignmentOperator::BitwiseAnd),
        TokenKind::PipeAssign => Some(AssignmentOperator::BitwiseOr),
        TokenKind::CaretAssign => Some(AssignmentOperator::BitwiseXor),
        TokenKind::ShiftLeftAssign => Some(AssignmentOperator::ShiftLeft),
        _ => None,
    }
}

/// Returns the value of a literal token.
///
/// Date and datetime tokens are only values inside queries, so they are
/// not literals here.
pub(super) fn token_literal(kind: &TokenKind) -> Option<Literal> {
    match kind {
        TokenKind::IntegerLiteral(text) => Some(Literal::Integer(text.clone())),
        TokenKind::LongLiteral(text) => Some(Literal::Long(text.clone())),
        TokenKind::NumberLiteral(text) => Some(Literal::Number(text.clone())),
        TokenKind::StringLiteral(value) => Some(Literal::String(value.clone())),
        TokenKind::Keyword(Keyword::True) => Some(Literal::Boolean(true)),
        TokenKind::Keyword(Keyword::False) => Some(Literal::Boolean(false)),
        TokenKind::Keyword(Keyword::Null) => Some(Literal::Null),
        _ => None,
    }
}

/// Returns true if `expression` may appear on the left of an assignment.
fn is_assignable(expression: &Expression) -> bool {
    matches!(
        expression.unparenthesized(),
        Expression::Identifier(_) | Expression::FieldAccess { .. } | Expression::ArrayAccess { .. }
    )
}

impl<L: ErrorListener> Parser<'_, L> {
    // ========================================================================
    // Expression Parsing
    // ========================================================================

    /// Parses any expression.
    ///
    /// Entry point for expression parsing. Handles all precedence levels,
    /// one nesting level deeper than the caller.
    pub(super) fn parse_expression(&mut self) -> Expression {
        self.nested(Self::parse_assignment)
    }

    /// Runs `parse` one nesting level deeper.
    ///
    /// Uses `stacker::maybe_grow` to extend the stack on the heap if
    /// remaining stack space falls below 32 KiB. The nesting guard caps
    /// recursion, so the 256 KiB segments stay few.
    pub(super) fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Expression) -> Expression {
        stacker::maybe_grow(32 * 1024, 256 * 1024, || {
            if let Err(error) = self.enter_nesting(self.current_span()) {
                return error;
            }
            let expression = parse(self);
            self.leave_nesting();
            expression
        })
    }

    /// Counts adjacent `>` tokens from the current one (at most three) and
    /// whether an adjacent `=` follows them.
    fn greater_run(&mut self) -> (usize, bool) {
        let mut count = 0;
        while count < 3 && matches!(self.peek_at(count), TokenKind::Greater) {
            count += 1;
            if !self.touches_next(count - 1) {
                return (count, false);
            }
        }
        let assign = count > 0 && matches!(self.peek_at(count), TokenKind::Assign);
        (count, assign)
    }

    /// Recognises the infix operator at the current position and the
    /// number of tokens it spans.
    fn scan_infix(&mut self) -> Option<(Infix, usize)> {
        if !self.check(&TokenKind::Greater) {
            return single_token_infix(self.current_kind()).map(|infix| (infix, 1));
        }
        let (operator, tokens) = match self.greater_run() {
            (1, true) => (BinaryOperator::GreaterEqual, 2),
            // `>>=` and `>>>=` are assignments
            (_, true) => return None,
            (1, false) => (BinaryOperator::Greater, 1),
            (2, false) => (BinaryOperator::ShiftRight, 2),
            (_, false) => (BinaryOperator::UnsignedShiftRight, 3),
        };
        Some((Infix::Binary(operator), tokens))
    }

    /// Recognises the assignment operator at the current position and the
    /// number of tokens it spans.
    fn scan_assignment(&mut self) -> Option<(AssignmentOperator, usize)> {
        if !self.check(&TokenKind::Greater) {
            return single_token_assignment(self.current_kind()).map(|operator| (operator, 1));
        }
        match self.greater_run() {
            (2, true) => Some((AssignmentOperator::ShiftRight, 3)),
            (3, true) => Some((AssignmentOperator::UnsignedShiftRight, 4)),
            _ => None,
        }
    }

    fn skip_tokens(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    /// Parses an assignment or a conditional expression.
    ///
    /// Assignment is right-associative: `a = b = c` assigns `c` to `b`
    /// first.
    fn parse_assignment(&mut self) -> Expression {
        let start = self.current_span();
        let target = self.parse_ternary();
        let Some((operator, tokens)) = self.scan_assignment() else {
            return target;
        };

        let valid = is_assignable(&target);
        if !valid && !target.is_error() {
            self.error_at("invalid assignment target", target.span());
        }
        self.skip_tokens(tokens);
        let value = self.parse_expression();
        let span = self.span_from(start);

        if !valid {
            return Expression::Error {
                message: "invalid assignment target".into(),
                span,
            };
        }
        Expression::Assignment {
            target: Box::new(target),
            operator,
            value: Box::new(value),
            span,
        }
    }

    /// Parses `condition ? then_value : else_value`.
    pub(super) fn parse_ternary(&mut self) -> Expression {
        let start = self.current_span();
        let condition = self.parse_binary(0);
        if !self.match_token(&TokenKind::Question) {
            return condition;
        }

        let then_value = self.parse_expression();
        self.expect(&TokenKind::Colon, "':'");
        let else_value = self.nested(Self::parse_ternary);
        Expression::Ternary {
            condition: Box::new(condition),
            then_value: Box::new(then_value),
            else_value: Box::new(else_value),
            span: self.span_from(start),
        }
    }

    /// Pratt parsing for binary expressions.
    ///
    /// The `min_bp` parameter controls the minimum binding power required
    /// to continue, so operators that bind less tightly are left for an
    /// outer invocation.
    ///
    /// Each operator folded into the left operand counts as one nesting
    /// level. Past the limit the rest of the chain is still consumed, but
    /// the whole chain becomes one error node.
    fn parse_binary(&mut self, min_bp: u8) -> Expression {
        let start = self.current_span();
        let mut left = self.parse_unary();
        let mut links = 0;
        let mut too_deep = false;

        while let Some((infix, tokens)) = self.scan_infix() {
            let Some(bp) = binary_binding_power(infix.spelling()) else {
                break;
            };
            if bp.left < min_bp {
                break;
            }
            if !too_deep {
                too_deep = !self.enter_link(&mut links, self.current_span());
            }
            self.skip_tokens(tokens);

            left = match infix {
                Infix::InstanceOf => {
                    let type_ref = self.parse_type_ref();
                    Expression::InstanceOf {
                        expression: Box::new(left),
                        type_ref,
                        span: self.span_from(start),
                    }
                }
                Infix::Binary(operator) => {
                    let right = self.parse_binary(bp.right);
                    Expression::Binary {
                        left: Box::new(left),
                        operator,
                        right: Box::new(right),
                        span: self.span_from(start),
                    }
                }
            };
            if too_deep {
                left = self.chain_too_deep(start);
            }
        }

        self.leave_links(links);
        left
    }

    /// The error node that replaces a chain longer than the nesting limit.
    fn chain_too_deep(&self, start: Span) -> Expression {
        Expression::Error {
            message: "nesting too deep".into(),
            span: self.span_from(start),
        }
    }

    /// Parses prefix operators and casts.
    fn parse_unary(&mut self) -> Expression {
        let operator = match self.current_kind() {
            TokenKind::Plus => Some(UnaryOperator::Plus),
            TokenKind::Minus => Some(UnaryOperator::Minus),
            TokenKind::Bang => Some(UnaryOperator::Not),
            TokenKind::Tilde => Some(UnaryOperator::BitwiseNot),
            TokenKind::Increment => Some(UnaryOperator::PreIncrement),
            TokenKind::Decrement => Some(UnaryOperator::PreDecrement),
            _ => None,
        };
        let start = self.current_span();

        if let Some(operator) = operator {
            self.advance();
            let operand = self.nested(Self::parse_unary);
            return Expression::Unary {
                operator,
                operand: Box::new(operand),
                span: self.span_from(start),
            };
        }

        if self.check(&TokenKind::LeftParen) && self.at_cast() {
            self.advance();
            let type_ref = self.parse_type_ref();
            self.expect(&TokenKind::RightParen, "')'");
            let expression = self.nested(Self::parse_unary);
            return Expression::Cast {
                type_ref,
                expression: Box::new(expression),
                span: self.span_from(start),
            };
        }

        self.parse_postfix()
    }

    /// Parses a primary followed by member access, calls, indexing and
    /// postfix `++`/`--`.
    ///
    /// Query binds (`:accounts[0].Id`) start here too. Links count
    /// against the nesting limit like binary operators do.
    pub(super) fn parse_postfix(&mut self) -> Expression {
        let start = self.current_span();
        let mut expression = self.parse_primary();
        let mut links = 0;
        let mut too_deep = false;

        loop {
            let is_link = matches!(
                self.current_kind(),
                TokenKind::Dot
                    | TokenKind::SafeDot
                    | TokenKind::LeftBracket
                    | TokenKind::Increment
                    | TokenKind::Decrement
            );
            if is_link && !too_deep {
                too_deep = !self.enter_link(&mut links, self.current_span());
            }
            match self.current_kind() {
                TokenKind::Dot | TokenKind::SafeDot => {
                    let safe_navigation = self.check(&TokenKind::SafeDot);
                    self.advance();
                    let name = self.parse_member_name();
                    expression = if self.check(&TokenKind::LeftParen) {
                        let arguments = self.parse_arguments();
                        Expression::MethodCall {
                            receiver: Some(Box::new(expression)),
                            name,
                            arguments,
                            safe_navigation,
                            span: self.span_from(start),
                        }
                    } else {
                        Expression::FieldAccess {
                            receiver: Box::new(expression),
                            field: name,
                            safe_navigation,
                            span: self.span_from(start),
                        }
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_expression();
                    self.expect(&TokenKind::RightBracket, "']'");
                    expression = Expression::ArrayAccess {
                        array: Box::new(expression),
                        index: Box::new(index),
                        span: self.span_from(start),
                    };
                }
                TokenKind::Increment | TokenKind::Decrement => {
                    let operator = if self.check(&TokenKind::Increment) {
                        PostfixOperator::Increment
                    } else {
                        PostfixOperator::Decrement
                    };
                    self.advance();
                    expression = Expression::Postfix {
                        operator,
                        operand: Box::new(expression),
                        span: self.span_from(start),
                    };
                }
                _ => break,
            }
            if too_deep {
                expression = self.chain_too_deep(start);
            }
        }

        self.leave_links(links);
        expression
    }

    /// Parses a primary expression.
    fn parse_primary(&mut self) -> Expression {
        if self.at_class_literal() {
            return self.parse_class_literal();
        }

        let span = self.current_span();
        if let Some(literal) = token_literal(self.current_kind()) {
            self.advance();
            return Expression::Literal(literal, span);
        }

        if self.check(&TokenKind::LeftBracket)
            && (self.peek_is_word(1, "select") || self.peek_is_word(1, "find"))
        {
            return self.parse_query_literal();
        }

        let kind = self.current_kind().clone();
        match kind {
            TokenKind::Keyword(keyword @ (Keyword::This | Keyword::Super)) => {
                let token = self.advance();
                if self.check(&TokenKind::LeftParen) {
                    // Constructor chaining: `this(...)`, `super(...)`
                    let name = Identifier::new(token.text(self.source()), span);
                    let arguments = self.parse_arguments();
                    return Expression::MethodCall {
                        receiver: None,
                        name,
                        arguments,
                        safe_navigation: false,
                        span: self.span_from(span),
                    };
                }
                if keyword == Keyword::This {
                    Expression::This(span)
                } else {
                    Expression::Super(span)
                }
            }
            TokenKind::Keyword(Keyword::New) => self.parse_new(),
            TokenKind::LeftParen => self.parse_parenthesized(),
            _ if is_name(&kind) => {
                let name = self.parse_identifier("expression");
                if self.check(&TokenKind::LeftParen) {
                    let arguments = self.parse_arguments();
                    Expression::MethodCall {
                        receiver: None,
                        name,
                        arguments,
                        safe_navigation: false,
                        span: self.span_from(span),
                    }
                } else {
                    Expression::Identifier(name)
                }
            }
            _ => {
                self.error_expected("expression");
                Expression::Error {
                    message: "expected expression".into(),
                    span: Span::empty_at(span.start()),
                }
            }
        }
    }

    /// Parses `( expression )`.
    fn parse_parenthesized(&mut self) -> Expression {
        let start = self.advance().span();
        let expression = self.parse_expression();
        self.expect(&TokenKind::RightParen, "')'");
        Expression::Parenthesized {
            expression: Box::new(expression),
            span: self.span_from(start),
        }
    }

    /// Parses `[SELECT ...]` or `[FIND ...]`.
    fn parse_query_literal(&mut self) -> Expression {
        self.advance();
        let expression = if self.check_word("find") {
            Expression::Search(Box::new(self.parse_search()))
        } else {
            Expression::Query(Box::new(self.parse_query()))
        };
        if self.expect(&TokenKind::RightBracket, "']'").is_none() {
            self.synchronize(RecoveryContext::Query);
        }
        expression
    }

    /// Returns true if a type followed by `.class` starts here.
    fn at_class_literal(&mut self) -> bool {
        let Some(end) = self.scan_type(0) else {
            return false;
        };
        matches!(self.peek_at(end), TokenKind::Dot)
            && self.peek_at(end + 1).is_keyword(Keyword::Class)
    }

    /// Parses `Type.class`.
    fn parse_class_literal(&mut self) -> Expression {
        let start = self.current_span();
        let type_ref = self.parse_type_ref();
        self.advance();
        self.advance();
        Expression::ClassLiteral {
            type_ref,
            span: self.span_from(start),
        }
    }

    // ========================================================================
    // Creators
    // ========================================================================

    /// Parses a `new` expression.
    ///
    /// The brace form is a map initializer when the type's last segment is
    /// `Map`, and a list or set initializer otherwise.
    fn parse_new(&mut self) -> Expression {
        let start = self.advance().span();
        let mut type_ref = self.parse_type_ref_with(false);

        let creator = if self.check(&TokenKind::LeftBracket) {
            if matches!(self.peek_at(1), TokenKind::RightBracket) {
                self.skip_tokens(2);
                while self.check(&TokenKind::LeftBracket)
                    && matches!(self.peek_at(1), TokenKind::RightBracket)
                {
                    self.skip_tokens(2);
                    type_ref.array_dimensions = type_ref.array_dimensions.saturating_add(1);
                }
                let elements = self.parse_braced_elements();
                Creator::ArrayInitializer { type_ref, elements }
            } else {
                self.advance();
                let size = self.parse_expression();
                self.expect(&TokenKind::RightBracket, "']'");
                Creator::Array {
                    type_ref,
                    size: Box::new(size),
                }
            }
        } else if self.check(&TokenKind::LeftBrace) {
            let is_map = type_ref
                .segments
                .last()
                .is_some_and(|segment| segment.name.eq_ignore_case("map"));
            if is_map {
                let entries = self.parse_map_entries();
                Creator::Map { type_ref, entries }
            } else {
                let elements = self.parse_braced_elements();
                Creator::Collection { type_ref, elements }
            }
        } else if self.check(&TokenKind::LeftParen) {
            let arguments = self.parse_arguments();
            Creator::Class {
                type_ref,
                arguments,
            }
        } else {
            self.error_expected("'(', '[' or '{'");
            Creator::Class {
                type_ref,
                arguments: Vec::new(),
            }
        };

        Expression::New {
            creator,
            span: self.span_from(start),
        }
    }

    /// Parses `{ expression, ... }`.
    fn parse_braced_elements(&mut self) -> Vec<Expression> {
        let mut elements = Vec::new();
        if self.expect(&TokenKind::LeftBrace, "'{'").is_none() {
            return elements;
        }
        if !self.check(&TokenKind::RightBrace) {
            loop {
                elements.push(self.parse_expression());
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightBrace, "'}'");
        elements
    }

    /// Parses `{ key => value, ... }`.
    fn parse_map_entries(&mut self) -> Vec<MapEntry> {
        let mut entries = Vec::new();
        self.advance();
        if !self.check(&TokenKind::RightBrace) {
            loop {
                let start = self.current_span();
                let key = self.parse_expression();
                self.expect(&TokenKind::MapsTo, "'=>'");
                let value = self.parse_expression();
                entries.push(MapEntry {
                    key,
                    value,
                    span: self.span_from(start),
                });
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightBrace, "'}'");
        entries
    }

    /// Parses `( expression, ... )`.
    pub(super) fn parse_arguments(&mut self) -> Vec<Expression> {
        let mut arguments = Vec::new();
        if self.expect(&TokenKind::LeftParen, "'('").is_none() {
            return arguments;
        }
        if !self.check(&TokenKind::RightParen) {
            loop {
                arguments.push(self.parse_expression());
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen, "')'");
        arguments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::{ParseOptions, parse_expression, parse_expression_with_options};

    fn parse_ok(source: &str) -> Expression {
        let (expression, errors) = parse_expression(source);
        assert!(errors.is_empty(), "unexpected errors for {source:?}: {errors:?}");
        expression
    }

    fn binary_parts(expression: &Expression) -> (&Expression, BinaryOperator, &Expression) {
        match expression {
            Expression::Binary {
                left,
                operator,
                right,
                ..
            } => (left, *operator, right),
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expression = parse_ok("1 + 2 * 3");
        let (left, operator, right) = binary_parts(&expression);
        assert_eq!(operator, BinaryOperator::Add);
        assert_eq!(left.kind_name(), "literal");
        assert_eq!(binary_parts(right).1, BinaryOperator::Multiply);
        assert_eq!(expression.span(), Span::new(0, 9));
    }

    #[test]
    fn subtraction_is_left_associative() {
        let expression = parse_ok("a - b - c");
        let (left, operator, right) = binary_parts(&expression);
        assert_eq!(operator, BinaryOperator::Subtract);
        assert_eq!(binary_parts(left).1, BinaryOperator::Subtract);
        assert!(matches!(right, Expression::Identifier(id) if id.name == "c"));
    }

    #[test]
    fn logical_operators_nest_by_precedence() {
        let expression = parse_ok("a || b && c == d");
        let (_, operator, right) = binary_parts(&expression);
        assert_eq!(operator, BinaryOperator::Or);
        let (_, operator, right) = binary_parts(right);
        assert_eq!(operator, BinaryOperator::And);
        assert_eq!(right.kind_name(), "equality");
    }

    #[test]
    fn greater_operators_are_joined_from_adjacent_tokens() {
        assert_eq!(binary_parts(&parse_ok("a >= b")).1, BinaryOperator::GreaterEqual);
        assert_eq!(binary_parts(&parse_ok("a >> b")).1, BinaryOperator::ShiftRight);
        assert_eq!(
            binary_parts(&parse_ok("a >>> b")).1,
            BinaryOperator::UnsignedShiftRight
        );
        assert_eq!(binary_parts(&parse_ok("a > b")).1, BinaryOperator::Greater);
        let (_, errors) = parse_expression("a > > b");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn shift_assignments_are_joined() {
        let Expression::Assignment { operator, .. } = parse_ok("x >>= 2") else {
            panic!("expected assignment");
        };
        assert_eq!(operator, AssignmentOperator::ShiftRight);
        let Expression::Assignment { operator, .. } = parse_ok("x >>>= 1") else {
            panic!("expected assignment");
        };
        assert_eq!(operator, AssignmentOperator::UnsignedShiftRight);
    }

    #[test]
    fn assignment_is_right_associative() {
        let Expression::Assignment { target, value, .. } = parse_ok("a = b = c") else {
            panic!("expected assignment");
        };
        assert_eq!(target.kind_name(), "identifier");
        assert_eq!(value.kind_name(), "assignment");
    }

    #[test]
    fn ternary_is_right_associative() {
        let Expression::Ternary { else_value, .. } = parse_ok("a ? b : c ? d : e") else {
            panic!("expected ternary");
        };
        assert_eq!(else_value.kind_name(), "ternary");
    }

    #[test]
    fn assignment_to_ternary_result() {
        let Expression::Assignment { value, .. } = parse_ok("x = ok ? 1 : 2") else {
            panic!("expected assignment");
        };
        assert_eq!(value.kind_name(), "ternary");
    }

    #[test]
    fn invalid_assignment_target() {
        let (expression, errors) = parse_expression("1 = 2");
        assert!(expression.is_error());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "invalid assignment target");
        assert_eq!(errors[0].span, Span::new(0, 1));
    }

    #[test]
    fn cast_and_parenthesized_subtraction() {
        assert_eq!(parse_ok("(String) value").kind_name(), "cast");
        assert_eq!(parse_ok("(List<Id>) (x)").kind_name(), "cast");
        assert_eq!(parse_ok("(a) - b").kind_name(), "additive");
        assert_eq!(parse_ok("(a)").kind_name(), "parenthesized");
    }

    #[test]
    fn instanceof_takes_a_type() {
        let Expression::InstanceOf { type_ref, .. } = parse_ok("o instanceof List<Account>") else {
            panic!("expected instanceof");
        };
        assert_eq!(type_ref.qualified_name(), "List");
        assert_eq!(parse_ok("o instanceof Account && ok").kind_name(), "logical");
    }

    #[test]
    fn prefix_and_postfix_operators() {
        let Expression::Unary { operator, .. } = parse_ok("-100.123") else {
            panic!("expected unary");
        };
        assert_eq!(operator, UnaryOperator::Minus);
        assert_eq!(parse_ok("i++").kind_name(), "postfix");
        assert_eq!(parse_ok("!done").kind_name(), "unary");
        assert_eq!(parse_ok("--i").kind_name(), "unary");
    }

    #[test]
    fn safe_navigation_chain() {
        let Expression::MethodCall {
            receiver,
            name,
            safe_navigation,
            ..
        } = parse_ok("a?.b?.c()")
        else {
            panic!("expected method call");
        };
        assert!(safe_navigation);
        assert_eq!(name.name, "c");
        assert!(matches!(
            receiver.as_deref(),
            Some(Expression::FieldAccess { safe_navigation: true, .. })
        ));
    }

    #[test]
    fn keywords_are_member_names() {
        let Expression::FieldAccess { field, .. } = parse_ok("Trigger.new") else {
            panic!("expected field access");
        };
        assert_eq!(field.name, "new");
        assert_eq!(parse_ok("Database.insert(accounts, false)").kind_name(), "method call");
    }

    #[test]
    fn class_literals() {
        let Expression::ClassLiteral { type_ref, .. } = parse_ok("Account.class") else {
            panic!("expected class literal");
        };
        assert_eq!(type_ref.qualified_name(), "Account");
        assert_eq!(parse_ok("List<String>.class").kind_name(), "class literal");
        assert_eq!(parse_ok("Account.class.getName()").kind_name(), "method call");
    }

    #[test]
    fn constructor_chaining_calls() {
        let Expression::MethodCall { name, arguments, .. } = parse_ok("this(1, 2)") else {
            panic!("expected call");
        };
        assert_eq!(name.name, "this");
        assert_eq!(arguments.len(), 2);
        assert_eq!(parse_ok("super.toString()").kind_name(), "method call");
    }

    #[test]
    fn new_creators() {
        let creator = |source: &str| match parse_ok(source) {
            Expression::New { creator, .. } => creator,
            other => panic!("expected new, got {other:?}"),
        };
        assert!(matches!(
            creator("new Account(Name = 'x')"),
            Creator::Class { arguments, .. } if arguments[0].kind_name() == "assignment"
        ));
        assert!(matches!(creator("new Integer[5]"), Creator::Array { .. }));
        assert!(matches!(
            creator("new Integer[]{1, 2}"),
            Creator::ArrayInitializer { elements, .. } if elements.len() == 2
        ));
        assert!(matches!(
            creator("new Set<String>{}"),
            Creator::Collection { elements, .. } if elements.is_empty()
        ));
        assert!(matches!(
            creator("new Map<String, Integer>{'a' => 1, 'b' => 2}"),
            Creator::Map { entries, .. } if entries.len() == 2
        ));
        let Creator::Class { type_ref, .. } = creator("new List<List<Integer>>()") else {
            panic!("expected class creator");
        };
        assert_eq!(type_ref.type_arguments()[0].qualified_name(), "List");
    }

    #[test]
    fn indexing_and_calls_chain() {
        let expression = parse_ok("accounts[0].Contacts.size()");
        assert_eq!(expression.kind_name(), "method call");
        assert_eq!(expression.span(), Span::new(0, 27));
    }

    #[test]
    fn inline_query_literal() {
        let expression = parse_ok("[Select Id from Account]");
        let Expression::Query(query) = expression else {
            panic!("expected query");
        };
        assert_eq!(query.select.len(), 1);
        assert_eq!(parse_ok("[FIND 'x' RETURNING Account]").kind_name(), "search");
    }

    #[test]
    fn missing_operand() {
        let (expression, errors) = parse_expression("a +");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "expected expression, found end of input");
        let (_, _, right) = binary_parts(&expression);
        assert!(right.is_error());
    }

    #[test]
    fn unclosed_parenthesis() {
        let (expression, errors) = parse_expression("(a + b");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "expected ')', found end of input");
        assert_eq!(expression.kind_name(), "parenthesized");
    }

    #[test]
    fn nesting_limit_reports_once() {
        let source = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        let (_, errors) = parse_expression(&source);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "nesting is too deep (maximum 64 levels)");

        let options = ParseOptions::new().with_max_nesting_depth(300);
        let (_, errors) = parse_expression_with_options(&source, options);
        assert!(errors.is_empty());
    }

    #[test]
    fn long_operator_chain_is_bounded() {
        let source = format!("{}1", "a + ".repeat(50_000));
        let (expression, errors) = parse_expression(&source);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "nesting is too deep (maximum 64 levels)");
        assert!(expression.is_error());
        assert_eq!(expression.span().end() as usize, source.len());
        drop(expression);

        let source = format!("{}1", "a + ".repeat(100));
        let options = ParseOptions::new().with_max_nesting_depth(300);
        let (expression, errors) = parse_expression_with_options(&source, options);
        assert!(errors.is_empty());
        assert_eq!(expression.kind_name(), "additive");
    }

    #[test]
    fn long_member_chain_is_bounded() {
        let source = format!("a{}", ".b()[0]".repeat(20_000));
        let (expression, errors) = parse_expression(&source);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("nesting is too deep"));
        assert!(expression.is_error());
        drop(expression);

        let (expression, errors) = parse_expression("a.b().c[0].d++");
        assert!(errors.is_empty());
        assert_eq!(expression.kind_name(), "postfix");
    }

    #[test]
    fn deep_unary_chain_is_bounded() {
        let source = format!("{}x", "-".repeat(500));
        let (_, errors) = parse_expression(&source);
        assert!(!errors.is_empty());
    }
}
