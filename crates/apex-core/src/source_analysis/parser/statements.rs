// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Statement parsing for Apex.
//!
//! Blocks, control flow, DML, `System.runAs` and local variable
//! declarations. A bare `;` is accepted only as a loop body; anywhere else
//! it is reported, except that blocks absorb stray semicolons between
//! statements.

use crate::ast::{
    AccessLevel, Block, CatchClause, DmlOperation, DmlStatement, Expression, ForControl, ForInit,
    LocalVariableDeclaration, LoopBody, Modifiers, Statement, SwitchStatement, TryStatement,
    UnaryOperator, VariableDeclarator, WhenClause, WhenLiteral, WhenPattern, WhenValue,
};
use crate::source_analysis::{ErrorListener, Keyword, Span, TokenKind};

use super::expressions::token_literal;
use super::types::is_name;
use super::{Parser, RecoveryContext};

/// An opening token in front of a `when` literal.
#[derive(Debug, Clone, Copy)]
enum WhenPrefix {
    Paren,
    Sign(UnaryOperator),
}

impl<L: ErrorListener> Parser<'_, L> {
    // ========================================================================
    // Statements
    // ========================================================================

    /// Parses one statement.
    ///
    /// Uses `stacker::maybe_grow` like expression parsing, since blocks and
    /// control flow nest arbitrarily.
    pub(super) fn parse_statement(&mut self) -> Statement {
        stacker::maybe_grow(32 * 1024, 256 * 1024, || {
            if let Err(error) = self.enter_nesting(self.current_span()) {
                self.synchronize(RecoveryContext::Block);
                return Statement::Error {
                    message: "nesting too deep".into(),
                    span: error.span(),
                };
            }
            let statement = self.parse_statement_kind();
            self.leave_nesting();
            statement
        })
    }

    fn parse_statement_kind(&mut self) -> Statement {
        if self.check(&TokenKind::LeftBrace) {
            return Statement::Block(self.parse_block());
        }
        if self.check(&TokenKind::Semicolon) {
            self.error_expected("statement");
            let span = self.advance().span();
            return Statement::Error {
                message: "empty statement".into(),
                span,
            };
        }
        if self.check(&TokenKind::At) {
            return self.parse_local_variable_statement();
        }
        if let TokenKind::Keyword(keyword) = self.current_kind() {
            let keyword = *keyword;
            match keyword {
                Keyword::If => return self.parse_if(),
                Keyword::For => return self.parse_for(),
                Keyword::While => return self.parse_while(),
                Keyword::Do => return self.parse_do_while(),
                Keyword::Try => return self.parse_try(),
                Keyword::Return => return self.parse_return(),
                Keyword::Throw => return self.parse_throw(),
                Keyword::Break | Keyword::Continue => return self.parse_jump(),
                Keyword::Final => return self.parse_local_variable_statement(),
                _ if keyword.is_dml() => return self.parse_dml(),
                _ => {}
            }
        }

        if self.check_keyword(Keyword::Switch) && self.peek_is_word(1, "on") {
            return self.parse_switch();
        }
        if self.at_run_as() {
            return self.parse_run_as();
        }
        if self.at_variable_declaration() {
            return self.parse_local_variable_statement();
        }
        self.parse_expression_statement()
    }

    /// Parses `{ statements }`.
    ///
    /// Stray semicolons between statements are skipped.
    pub(super) fn parse_block(&mut self) -> Block {
        let start = self.current_span();
        if self.expect(&TokenKind::LeftBrace, "'{'").is_none() {
            return Block {
                statements: Vec::new(),
                span: Span::empty_at(start.start()),
            };
        }

        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if self.match_token(&TokenKind::Semicolon) {
                continue;
            }
            let checkpoint = self.checkpoint();
            statements.push(self.parse_statement());
            self.ensure_progress(checkpoint);
        }
        self.expect(&TokenKind::RightBrace, "'}'");

        Block {
            statements,
            span: self.span_from(start),
        }
    }

    /// Expects the `;` ending a statement, resynchronizing if it is missing.
    fn expect_semicolon(&mut self) {
        if self.expect(&TokenKind::Semicolon, "';'").is_none() {
            self.synchronize(RecoveryContext::Block);
        }
    }

    fn parse_expression_statement(&mut self) -> Statement {
        let start = self.current_span();
        let expression = self.parse_expression();
        self.expect_semicolon();
        Statement::Expression {
            expression,
            span: self.span_from(start),
        }
    }

    // ========================================================================
    // Local Variables
    // ========================================================================

    fn parse_local_variable_statement(&mut self) -> Statement {
        let start = self.current_span();
        let modifiers = self.parse_modifiers();
        let mut declaration = self.parse_local_variable_declaration(modifiers, start);
        self.expect_semicolon();
        declaration.span = self.span_from(start);
        Statement::LocalVariable(declaration)
    }

    /// Parses `Type name = value, ...` after any modifiers.
    fn parse_local_variable_declaration(
        &mut self,
        modifiers: Modifiers,
        start: Span,
    ) -> LocalVariableDeclaration {
        let type_ref = self.parse_type_ref();
        let declarators = self.parse_variable_declarators();
        LocalVariableDeclaration {
            modifiers,
            type_ref,
            declarators,
            span: self.span_from(start),
        }
    }

    /// Parses `name = value, name, ...`.
    pub(super) fn parse_variable_declarators(&mut self) -> Vec<VariableDeclarator> {
        let mut declarators = Vec::new();
        loop {
            let start = self.current_span();
            let name = self.parse_identifier("variable name");
            let initializer = if self.match_token(&TokenKind::Assign) {
                Some(self.parse_expression())
            } else {
                None
            };
            declarators.push(VariableDeclarator {
                name,
                initializer,
                span: self.span_from(start),
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        declarators
    }

    // ========================================================================
    // Control Flow
    // ========================================================================

    /// Parses `( expression )`.
    fn parse_condition(&mut self) -> Expression {
        self.expect(&TokenKind::LeftParen, "'('");
        let condition = self.parse_expression();
        self.expect(&TokenKind::RightParen, "')'");
        condition
    }

    /// Parses a loop body, where a bare `;` is allowed.
    fn parse_loop_body(&mut self) -> LoopBody {
        if self.check(&TokenKind::Semicolon) {
            LoopBody::Empty(self.advance().span())
        } else {
            LoopBody::Statement(Box::new(self.parse_statement()))
        }
    }

    fn parse_if(&mut self) -> Statement {
        let start = self.advance().span();
        let condition = self.parse_condition();
        let then_branch = Box::new(self.parse_statement());
        let else_branch = if self.match_keyword(Keyword::Else) {
            Some(Box::new(self.parse_statement()))
        } else {
            None
        };
        Statement::If {
            condition,
            then_branch,
            else_branch,
            span: self.span_from(start),
        }
    }

    fn parse_while(&mut self) -> Statement {
        let start = self.advance().span();
        let condition = self.parse_condition();
        let body = self.parse_loop_body();
        Statement::While {
            condition,
            body,
            span: self.span_from(start),
        }
    }

    fn parse_do_while(&mut self) -> Statement {
        let start = self.advance().span();
        let missing_body = !self.check(&TokenKind::LeftBrace);
        let body = self.parse_block();
        // `do ;` has no empty-body form; drop the `;` so `while` follows
        if missing_body {
            self.match_token(&TokenKind::Semicolon);
        }
        self.expect_keyword(Keyword::While, "'while'");
        let condition = self.parse_condition();
        self.expect_semicolon();
        Statement::DoWhile {
            body,
            condition,
            span: self.span_from(start),
        }
    }

    /// Parses basic and enhanced `for` loops.
    fn parse_for(&mut self) -> Statement {
        let start = self.advance().span();
        self.expect(&TokenKind::LeftParen, "'('");
        let control = if self.at_enhanced_for() {
            self.parse_enhanced_for_control()
        } else {
            self.parse_basic_for_control()
        };
        self.expect(&TokenKind::RightParen, "')'");
        let body = self.parse_loop_body();
        Statement::For {
            control,
            body,
            span: self.span_from(start),
        }
    }

    /// Returns true if `Type name :` starts here.
    fn at_enhanced_for(&mut self) -> bool {
        self.scan_type(0).is_some_and(|end| {
            is_name(self.peek_at(end))
                && matches!(self.peek_at(end + 1), TokenKind::Colon)
        })
    }

    fn parse_enhanced_for_control(&mut self) -> ForControl {
        let start = self.current_span();
        let type_ref = self.parse_type_ref();
        let name = self.parse_identifier("loop variable");
        self.advance();
        let iterable = self.parse_expression();
        ForControl::Enhanced {
            type_ref,
            name,
            iterable,
            span: self.span_from(start),
        }
    }

    fn parse_basic_for_control(&mut self) -> ForControl {
        let start = self.current_span();
        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else if self.at_variable_declaration() {
            let declaration_start = self.current_span();
            Some(ForInit::Variables(self.parse_local_variable_declaration(
                Modifiers::default(),
                declaration_start,
            )))
        } else {
            Some(ForInit::Expressions(self.parse_expression_list()))
        };
        self.expect(&TokenKind::Semicolon, "';'");

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression())
        };
        self.expect(&TokenKind::Semicolon, "';'");

        let updates = if self.check(&TokenKind::RightParen) {
            Vec::new()
        } else {
            self.parse_expression_list()
        };

        ForControl::Basic {
            init,
            condition,
            updates,
            span: self.span_from(start),
        }
    }

    fn parse_expression_list(&mut self) -> Vec<Expression> {
        let mut expressions = vec![self.parse_expression()];
        while self.match_token(&TokenKind::Comma) {
            expressions.push(self.parse_expression());
        }
        expressions
    }

    fn parse_try(&mut self) -> Statement {
        let start = self.advance().span();
        let body = self.parse_block();

        let mut catches = Vec::new();
        while self.check_keyword(Keyword::Catch) {
            let catch_start = self.advance().span();
            self.expect(&TokenKind::LeftParen, "'('");
            let modifiers = self.parse_modifiers();
            let exception_type = self.parse_qualified_name("exception type");
            let name = self.parse_identifier("exception variable");
            self.expect(&TokenKind::RightParen, "')'");
            let body = self.parse_block();
            catches.push(CatchClause {
                modifiers,
                exception_type,
                name,
                body,
                span: self.span_from(catch_start),
            });
        }

        let finally = if self.match_keyword(Keyword::Finally) {
            Some(self.parse_block())
        } else {
            None
        };
        if catches.is_empty() && finally.is_none() {
            self.error_expected("'catch' or 'finally'");
        }

        Statement::Try(TryStatement {
            body,
            catches,
            finally,
            span: self.span_from(start),
        })
    }

    fn parse_return(&mut self) -> Statement {
        let start = self.advance().span();
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression())
        };
        self.expect_semicolon();
        Statement::Return {
            value,
            span: self.span_from(start),
        }
    }

    fn parse_throw(&mut self) -> Statement {
        let start = self.advance().span();
        let value = self.parse_expression();
        self.expect_semicolon();
        Statement::Throw {
            value,
            span: self.span_from(start),
        }
    }

    /// Parses `break;` or `continue;`.
    fn parse_jump(&mut self) -> Statement {
        let is_break = self.check_keyword(Keyword::Break);
        let start = self.advance().span();
        self.expect_semicolon();
        let span = self.span_from(start);
        if is_break {
            Statement::Break { span }
        } else {
            Statement::Continue { span }
        }
    }

    // ========================================================================
    // Switch
    // ========================================================================

    /// Parses `switch on subject { when ... }`.
    fn parse_switch(&mut self) -> Statement {
        let start = self.advance().span();
        self.advance();
        let subject = self.parse_expression();

        let mut whens = Vec::new();
        if self.expect(&TokenKind::LeftBrace, "'{'").is_some() {
            let before = self.checkpoint();
            while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
                let checkpoint = self.checkpoint();
                if self.check_word("when") {
                    whens.push(self.parse_when_clause());
                } else {
                    self.error_expected("'when'");
                    self.synchronize(RecoveryContext::SwitchBody);
                }
                self.ensure_progress(checkpoint);
            }
            if whens.is_empty() && self.reported == before.reported {
                self.error_expected("'when'");
            }
            self.expect(&TokenKind::RightBrace, "'}'");
        }

        Statement::Switch(SwitchStatement {
            subject,
            whens,
            span: self.span_from(start),
        })
    }

    fn parse_when_clause(&mut self) -> WhenClause {
        let start = self.advance().span();
        let value = if self.check_keyword(Keyword::Else) {
            WhenValue::Else(self.advance().span())
        } else if self.at_type_pattern() {
            let pattern_start = self.current_span();
            let type_ref = self.parse_type_ref();
            let name = self.parse_identifier("variable name");
            WhenValue::Type {
                type_ref,
                name,
                span: self.span_from(pattern_start),
            }
        } else {
            let mut literals = vec![self.parse_when_literal()];
            while self.match_token(&TokenKind::Comma) {
                literals.push(self.parse_when_literal());
            }
            WhenValue::Literals(literals)
        };
        let body = self.parse_block();
        WhenClause {
            value,
            body,
            span: self.span_from(start),
        }
    }

    /// Returns true if `Type name {` starts here.
    fn at_type_pattern(&mut self) -> bool {
        self.scan_type(0).is_some_and(|end| {
            is_name(self.peek_at(end))
                && matches!(self.peek_at(end + 1), TokenKind::LeftBrace)
        })
    }

    /// Parses one `when` literal: parentheses and signs around a literal or
    /// enum constant, folded into a value and a sign.
    ///
    /// The prefixes are collected iteratively and unwound afterwards, so
    /// `((-(+1)))` needs no recursion.
    fn parse_when_literal(&mut self) -> WhenLiteral {
        let start = self.current_span();
        let mut prefixes = Vec::new();
        loop {
            let prefix = match self.current_kind() {
                TokenKind::LeftParen => WhenPrefix::Paren,
                TokenKind::Plus => WhenPrefix::Sign(UnaryOperator::Plus),
                TokenKind::Minus => WhenPrefix::Sign(UnaryOperator::Minus),
                _ => break,
            };
            let span = self.current_span();
            if self.enter_nesting(span).is_err() {
                break;
            }
            self.advance();
            prefixes.push((prefix, span));
        }

        let core_span = self.current_span();
        let (mut expression, value) = if let Some(literal) = token_literal(self.current_kind()) {
            self.advance();
            (
                Expression::Literal(literal.clone(), core_span),
                WhenPattern::Literal(literal),
            )
        } else if is_name(self.current_kind()) {
            let name = self.parse_identifier("when value");
            (Expression::Identifier(name.clone()), WhenPattern::Identifier(name))
        } else {
            self.error_expected("when value");
            let span = Span::empty_at(core_span.start());
            (
                Expression::Error {
                    message: "expected when value".into(),
                    span,
                },
                WhenPattern::Error,
            )
        };

        let signed = prefixes
            .iter()
            .any(|(prefix, _)| matches!(prefix, WhenPrefix::Sign(_)));
        let numeric = matches!(&value, WhenPattern::Literal(literal) if literal.is_numeric());
        if signed && !numeric && !matches!(value, WhenPattern::Error) {
            self.error_at("sign must precede a numeric literal", core_span);
        }
        let minus_signs = prefixes
            .iter()
            .filter(|(prefix, _)| matches!(prefix, WhenPrefix::Sign(UnaryOperator::Minus)))
            .count();

        for (prefix, span) in prefixes.into_iter().rev() {
            expression = match prefix {
                WhenPrefix::Paren => {
                    self.expect(&TokenKind::RightParen, "')'");
                    Expression::Parenthesized {
                        expression: Box::new(expression),
                        span: self.span_from(span),
                    }
                }
                WhenPrefix::Sign(operator) => Expression::Unary {
                    operator,
                    operand: Box::new(expression),
                    span: self.span_from(span),
                },
            };
            self.leave_nesting();
        }

        WhenLiteral {
            expression,
            value,
            negative: minus_signs % 2 == 1,
            span: self.span_from(start),
        }
    }

    // ========================================================================
    // DML and runAs
    // ========================================================================

    /// Parses `insert as USER records;` and the other DML statements.
    fn parse_dml(&mut self) -> Statement {
        let verb = self.advance();
        let start = verb.span();

        let access_level = if self.check_word("as")
            && (self.peek_is_word(1, "user") || self.peek_is_word(1, "system"))
            && !matches!(self.peek_at(2), TokenKind::Semicolon)
        {
            self.advance();
            let level = if self.check_word("user") {
                AccessLevel::User
            } else {
                AccessLevel::System
            };
            self.advance();
            Some(level)
        } else {
            None
        };

        let target = self.parse_expression();
        let operation = match verb.kind() {
            TokenKind::Keyword(Keyword::Update) => DmlOperation::Update,
            TokenKind::Keyword(Keyword::Delete) => DmlOperation::Delete,
            TokenKind::Keyword(Keyword::Undelete) => DmlOperation::Undelete,
            TokenKind::Keyword(Keyword::Upsert) => {
                let external_id = if is_name(self.current_kind()) {
                    Some(self.parse_qualified_name("external id field"))
                } else {
                    None
                };
                DmlOperation::Upsert { external_id }
            }
            TokenKind::Keyword(Keyword::Merge) => DmlOperation::Merge {
                duplicates: self.parse_expression(),
            },
            _ => DmlOperation::Insert,
        };
        self.expect_semicolon();

        Statement::Dml(DmlStatement {
            operation,
            access_level,
            target,
            span: self.span_from(start),
        })
    }

    /// Returns true if `System.runAs(` starts here.
    fn at_run_as(&mut self) -> bool {
        self.check_word("system")
            && matches!(self.peek_at(1), TokenKind::Dot)
            && self.peek_is_word(2, "runas")
            && matches!(self.peek_at(3), TokenKind::LeftParen)
    }

    /// Parses `System.runAs(user) { ... }`.
    fn parse_run_as(&mut self) -> Statement {
        let start = self.advance().span();
        self.advance();
        self.advance();
        let arguments = self.parse_arguments();
        let body = self.parse_block();
        Statement::RunAs {
            arguments,
            body,
            span: self.span_from(start),
        }
    }
}
