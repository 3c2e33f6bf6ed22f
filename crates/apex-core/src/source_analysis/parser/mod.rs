// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for Apex source code.
//!
//! The parser pulls tokens from the [`Lexer`] on demand, buffering only the
//! lookahead it needs, and builds the AST defined in [`crate::ast`].
//!
//! # Design Philosophy
//!
//! - **Error recovery is mandatory** - every entry point returns a tree, even
//!   for garbage input
//! - **Multiple errors** - report all errors, don't stop at the first
//! - **No cascades** - after an error the parser resynchronizes at the
//!   nearest safe point for the enclosing rule (see [`RecoveryContext`]), and
//!   never records two errors at the same offset
//! - **Forward progress** - every list loop consumes at least one token per
//!   iteration, so parsing terminates on any input
//!
//! # Binary Operator Precedence (Pratt Parsing)
//!
//! Binary operators use Pratt parsing with the binding power table in
//! [`binary_binding_power`]. Assignment and the conditional operator sit
//! below the table and are parsed by dedicated functions.
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | 10 | `=` `+=` `-=` ... `>>>=` | Right |
//! | 20 | `? :` | Right |
//! | 30 | `??` | Left |
//! | 40 | `\|\|` | Left |
//! | 50 | `&&` | Left |
//! | 60 | `\|` | Left |
//! | 70 | `^` | Left |
//! | 80 | `&` | Left |
//! | 90 | `==` `!=` `<>` `===` `!==` | Left |
//! | 100 | `<` `>` `<=` `>=` `instanceof` | Left |
//! | 110 | `<<` `>>` `>>>` | Left |
//! | 120 | `+` `-` | Left |
//! | 130 | `*` `/` `%` | Left |
//!
//! Prefix operators and casts bind tighter than any binary operator, and
//! postfix operators, member access, indexing and calls bind tightest.
//!
//! # Usage
//!
//! ```
//! use apex_core::source_analysis::parse_compilation_unit;
//!
//! let (unit, errors) = parse_compilation_unit("public class Hello {}");
//!
//! assert!(errors.is_empty());
//! assert_eq!(unit.types.len(), 1);
//! ```

use std::collections::VecDeque;

use crate::ast::{CompilationUnit, Expression, Query, SourceUnit, Statement, TriggerUnit};
use crate::source_analysis::{
    ErrorCollector, ErrorKind, ErrorListener, Keyword, Lexer, Span, SyntaxError, Token, TokenKind,
};
use ecow::EcoString;
use tracing::{debug, instrument, trace};

// Submodules with additional impl blocks for Parser
mod declarations;
mod expressions;
mod query;
mod statements;
mod types;


// ============================================================================
// Pratt Parsing for Binary Operator Precedence
// ============================================================================

/// Binding power for binary operators (Pratt parsing).
///
/// Higher values bind tighter. Left and right binding powers differ
/// for associativity:
/// - Left-associative: `left_bp == right_bp - 1` (e.g., `+`, `-`)
/// - Right-associative: `left_bp == right_bp + 1`
#[derive(Debug, Clone, Copy)]
pub(super) struct BindingPower {
    /// Left binding power (how tightly this operator binds to its left operand).
    pub(super) left: u8,
    /// Right binding power (how tightly this operator binds to its right operand).
    pub(super) right: u8,
}

impl BindingPower {
    /// Creates a left-associative binding power.
    const fn left_assoc(precedence: u8) -> Self {
        Self {
            left: precedence,
            right: precedence + 1,
        }
    }
}

/// Gets the binding power for a binary operator spelling.
///
/// Returns `None` for anything that is not a binary operator, which ends
/// the binary expression.
pub(super) fn binary_binding_power(op: &str) -> Option<BindingPower> {
    match op {
        "??" => Some(BindingPower::left_assoc(30)),
        "||" => Some(BindingPower::left_assoc(40)),
        "&&" => Some(BindingPower::left_assoc(50)),
        "|" => Some(BindingPower::left_assoc(60)),
        "^" => Some(BindingPower::left_assoc(70)),
        "&" => Some(BindingPower::left_assoc(80)),
        "==" | "!=" | "<>" | "===" | "!==" => Some(BindingPower::left_assoc(90)),
        "<" | ">" | "<=" | ">=" | "instanceof" => Some(BindingPower::left_assoc(100)),
        "<<" | ">>" | ">>>" => Some(BindingPower::left_assoc(110)),
        "+" | "-" => Some(BindingPower::left_assoc(120)),
        "*" | "/" | "%" => Some(BindingPower::left_assoc(130)),
        _ => None,
    }
}

// ============================================================================
// Options
// ============================================================================

/// Default nesting depth for expressions, statements and types.
///
/// Each level uses several stack frames, and ASAN-instrumented builds
/// (fuzzing) have larger frames. `stacker::maybe_grow` at the recursive
/// entry points is the second line of defence.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Tunables for a single parse.
///
/// ```
/// use apex_core::source_analysis::{ParseOptions, parse_expression_with_options};
///
/// let options = ParseOptions::new().with_max_nesting_depth(4);
/// let (_, errors) = parse_expression_with_options("((((((1))))))", options);
/// assert_eq!(errors[0].message, "nesting is too deep (maximum 4 levels)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    max_nesting_depth: usize,
    error_limit: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            error_limit: None,
        }
    }
}

impl ParseOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how deeply expressions, statements and types may nest.
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Stops recording errors after `limit` of them. Parsing continues.
    #[must_use]
    pub fn with_error_limit(mut self, limit: Option<usize>) -> Self {
        self.error_limit = limit;
        self
    }

    /// Returns the maximum nesting depth.
    #[must_use]
    pub fn max_nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }

    /// Returns the error limit, if any.
    #[must_use]
    pub fn error_limit(&self) -> Option<usize> {
        self.error_limit
    }
}

// ============================================================================
// Entry Points
// ============================================================================

/// Parses a source file declaring classes, interfaces or enums.
///
/// Always returns a [`CompilationUnit`], even if there are syntax errors.
///
/// # Examples
///
/// ```
/// use apex_core::source_analysis::parse_compilation_unit;
///
/// let (unit, errors) = parse_compilation_unit("public class Hello {");
/// assert_eq!(errors.len(), 1);
/// assert_eq!(unit.types.len(), 1);
/// ```
#[must_use]
pub fn parse_compilation_unit(source: &str) -> (CompilationUnit, Vec<SyntaxError>) {
    parse_compilation_unit_with_options(source, ParseOptions::default())
}

/// [`parse_compilation_unit`] with explicit options.
#[must_use]
#[instrument(skip_all, fields(len = source.len()))]
pub fn parse_compilation_unit_with_options(
    source: &str,
    options: ParseOptions,
) -> (CompilationUnit, Vec<SyntaxError>) {
    let mut parser = Parser::new(source, options);
    let unit = parser.parse_compilation_unit();
    into_result(parser, unit)
}

/// Parses a trigger definition.
///
/// ```
/// use apex_core::source_analysis::parse_trigger_unit;
///
/// let (unit, errors) =
///     parse_trigger_unit("trigger test on Account (before update, after update) {}");
/// assert!(errors.is_empty());
/// assert_eq!(unit.cases.len(), 2);
/// ```
#[must_use]
pub fn parse_trigger_unit(source: &str) -> (TriggerUnit, Vec<SyntaxError>) {
    parse_trigger_unit_with_options(source, ParseOptions::default())
}

/// [`parse_trigger_unit`] with explicit options.
#[must_use]
#[instrument(skip_all, fields(len = source.len()))]
pub fn parse_trigger_unit_with_options(
    source: &str,
    options: ParseOptions,
) -> (TriggerUnit, Vec<SyntaxError>) {
    let mut parser = Parser::new(source, options);
    let unit = parser.parse_trigger_unit();
    into_result(parser, unit)
}

/// Parses either kind of source unit, choosing by the leading keyword.
#[must_use]
pub fn parse_source(source: &str) -> (SourceUnit, Vec<SyntaxError>) {
    parse_source_with_options(source, ParseOptions::default())
}

/// [`parse_source`] with explicit options.
#[must_use]
#[instrument(skip_all, fields(len = source.len()))]
pub fn parse_source_with_options(
    source: &str,
    options: ParseOptions,
) -> (SourceUnit, Vec<SyntaxError>) {
    let mut parser = Parser::new(source, options);
    let unit = parser.parse_source_unit();
    into_result(parser, unit)
}

/// Parses a single statement, such as one an editor re-parses after a change.
#[must_use]
pub fn parse_statement(source: &str) -> (Statement, Vec<SyntaxError>) {
    parse_statement_with_options(source, ParseOptions::default())
}

/// [`parse_statement`] with explicit options.
#[must_use]
#[instrument(skip_all, fields(len = source.len()))]
pub fn parse_statement_with_options(
    source: &str,
    options: ParseOptions,
) -> (Statement, Vec<SyntaxError>) {
    let mut parser = Parser::new(source, options);
    let statement = parser.parse_statement_fragment();
    into_result(parser, statement)
}

/// Parses a single expression.
#[must_use]
pub fn parse_expression(source: &str) -> (Expression, Vec<SyntaxError>) {
    parse_expression_with_options(source, ParseOptions::default())
}

/// [`parse_expression`] with explicit options.
#[must_use]
#[instrument(skip_all, fields(len = source.len()))]
pub fn parse_expression_with_options(
    source: &str,
    options: ParseOptions,
) -> (Expression, Vec<SyntaxError>) {
    let mut parser = Parser::new(source, options);
    let expression = parser.parse_expression_fragment();
    into_result(parser, expression)
}

/// Parses a query, with or without the enclosing brackets.
///
/// ```
/// use apex_core::source_analysis::parse_query;
///
/// let (query, errors) = parse_query("SELECT Id FROM Account WITH USER_MODE");
/// assert!(errors.is_empty());
/// assert!(query.with.is_some());
/// ```
#[must_use]
pub fn parse_query(source: &str) -> (Query, Vec<SyntaxError>) {
    parse_query_with_options(source, ParseOptions::default())
}

/// [`parse_query`] with explicit options.
#[must_use]
#[instrument(skip_all, fields(len = source.len()))]
pub fn parse_query_with_options(source: &str, options: ParseOptions) -> (Query, Vec<SyntaxError>) {
    let mut parser = Parser::new(source, options);
    let query = parser.parse_query_fragment();
    into_result(parser, query)
}

fn into_result<T>(parser: Parser<'_>, node: T) -> (T, Vec<SyntaxError>) {
    let errors = parser.finish().into_errors();
    debug!(errors = errors.len(), "parse finished");
    (node, errors)
}

// ============================================================================
// Recovery
// ============================================================================

/// The enclosing rule family the parser resynchronizes to after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RecoveryContext {
    /// Between top-level type declarations.
    CompilationUnit,
    /// Between members of a class, interface or enum body.
    ClassBody,
    /// Between statements of a block.
    Block,
    /// Between `when` clauses of a switch.
    SwitchBody,
    /// Inside a bracketed query or search literal.
    Query,
}

/// What synchronization does with a token at bracket depth zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    /// Discard it and keep going.
    Skip,
    /// Stop before it.
    Before,
    /// Consume it, then stop.
    After,
}

/// Returns true for the keywords that start a member or type declaration.
fn is_declaration_keyword(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Keyword(
            Keyword::Public
                | Keyword::Private
                | Keyword::Protected
                | Keyword::Global
                | Keyword::Abstract
                | Keyword::Final
                | Keyword::Static
                | Keyword::Virtual
                | Keyword::Override
                | Keyword::Transient
                | Keyword::TestMethod
                | Keyword::WebService
                | Keyword::Class
                | Keyword::Interface
                | Keyword::Enum
        ) | TokenKind::At
    )
}

/// Returns true for the keywords that always start a statement.
fn is_statement_keyword(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::Keyword(keyword) => {
            keyword.is_dml()
                || matches!(
                    keyword,
                    Keyword::If
                        | Keyword::For
                        | Keyword::While
                        | Keyword::Do
                        | Keyword::Try
                        | Keyword::Return
                        | Keyword::Throw
                        | Keyword::Break
                        | Keyword::Continue
                )
        }
        _ => false,
    }
}

/// The resume table: where each rule family may pick up after an error.
fn resume_action(context: RecoveryContext, kind: &TokenKind) -> Resume {
    match context {
        RecoveryContext::CompilationUnit => {
            if is_declaration_keyword(kind) {
                Resume::Before
            } else {
                Resume::Skip
            }
        }
        RecoveryContext::ClassBody => match kind {
            TokenKind::Semicolon => Resume::After,
            TokenKind::RightBrace => Resume::Before,
            TokenKind::Keyword(Keyword::Void) => Resume::Before,
            _ if is_declaration_keyword(kind) => Resume::Before,
            _ => Resume::Skip,
        },
        RecoveryContext::Block => match kind {
            TokenKind::Semicolon => Resume::After,
            TokenKind::RightBrace => Resume::Before,
            _ if is_statement_keyword(kind) => Resume::Before,
            _ => Resume::Skip,
        },
        RecoveryContext::SwitchBody => match kind {
            TokenKind::RightBrace => Resume::Before,
            _ if kind.is_word("when") => Resume::Before,
            _ => Resume::Skip,
        },
        RecoveryContext::Query => match kind {
            TokenKind::RightBracket => Resume::After,
            TokenKind::Semicolon | TokenKind::RightBrace => Resume::Before,
            _ => Resume::Skip,
        },
    }
}

/// A position snapshot used to guarantee forward progress in list loops.
#[derive(Debug, Clone, Copy)]
pub(super) struct Checkpoint {
    consumed: usize,
    reported: usize,
}

// ============================================================================
// Parser
// ============================================================================

/// The parser state for one parse invocation.
///
/// Most callers want the free functions such as [`parse_compilation_unit`].
/// Construct a `Parser` directly to attach a custom [`ErrorListener`]:
///
/// ```
/// use apex_core::source_analysis::{ParseOptions, Parser, SyntaxError};
///
/// let mut messages = Vec::new();
/// let mut parser = Parser::with_listener(
///     "Integer x = ;",
///     ParseOptions::default(),
///     |error: &SyntaxError| messages.push(error.message.clone()),
/// );
/// let _statement = parser.parse_statement_fragment();
/// assert_eq!(parser.error_count(), 1);
/// drop(parser);
/// assert_eq!(messages, vec!["expected expression, found ';'"]);
/// ```
pub struct Parser<'src, L: ErrorListener = ErrorCollector> {
    /// The source text, for token text and error positions.
    source: &'src str,
    /// Token source.
    lexer: Lexer<'src>,
    /// The current token.
    current: Token,
    /// Tokens after `current` that lookahead has already pulled.
    lookahead: VecDeque<Token>,
    /// End offset of the most recently consumed token.
    previous_end: u32,
    /// Number of tokens consumed so far.
    consumed: usize,
    /// Receives recorded errors.
    listener: L,
    /// Tunables.
    options: ParseOptions,
    /// Current nesting depth (guards against stack overflow).
    nesting_depth: usize,
    /// Errors passed to the listener.
    error_count: usize,
    /// Errors detected, including deduplicated and over-limit ones.
    reported: usize,
    /// Start offset of the most recently detected error.
    last_error_start: Option<u32>,
}

impl<'src> Parser<'src, ErrorCollector> {
    /// Creates a parser that collects errors into an [`ErrorCollector`].
    #[must_use]
    pub fn new(source: &'src str, options: ParseOptions) -> Self {
        Self::with_listener(source, options, ErrorCollector::new())
    }
}

impl<'src, L: ErrorListener> Parser<'src, L> {
    /// Creates a parser reporting to `listener`.
    pub fn with_listener(source: &'src str, options: ParseOptions, listener: L) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            source,
            lexer,
            current,
            lookahead: VecDeque::new(),
            previous_end: 0,
            consumed: 0,
            listener,
            options,
            nesting_depth: 0,
            error_count: 0,
            reported: 0,
            last_error_start: None,
        }
    }

    /// Returns the number of errors recorded so far.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Consumes the parser, returning its listener.
    pub fn finish(self) -> L {
        self.listener
    }

    /// Parses a compilation unit or a trigger unit, depending on whether
    /// the input starts with `trigger`.
    pub fn parse_source_unit(&mut self) -> SourceUnit {
        if self.check_keyword(Keyword::Trigger) {
            SourceUnit::Trigger(self.parse_trigger_unit())
        } else {
            SourceUnit::Compilation(self.parse_compilation_unit())
        }
    }

    /// Parses one statement that must span the whole input.
    pub fn parse_statement_fragment(&mut self) -> Statement {
        let statement = self.parse_statement();
        self.expect_end();
        statement
    }

    /// Parses one expression that must span the whole input.
    pub fn parse_expression_fragment(&mut self) -> Expression {
        let expression = self.parse_expression();
        self.expect_end();
        expression
    }

    /// Parses one query that must span the whole input. Enclosing brackets
    /// are optional.
    pub fn parse_query_fragment(&mut self) -> Query {
        let bracketed = self.match_token(&TokenKind::LeftBracket);
        let query = self.parse_query();
        if bracketed {
            self.expect(&TokenKind::RightBracket, "']'");
        }
        self.expect_end();
        query
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Returns the current token kind.
    pub(super) fn current_kind(&self) -> &TokenKind {
        self.current.kind()
    }

    /// Returns the span of the current token.
    pub(super) fn current_span(&self) -> Span {
        self.current.span()
    }

    /// Returns the source text of the current token.
    pub(super) fn current_text(&self) -> &'src str {
        self.current.text(self.source)
    }

    /// Returns the source text.
    pub(super) fn source(&self) -> &'src str {
        self.source
    }

    /// Returns the token `offset` positions ahead (0 is the current token).
    pub(super) fn peek_token(&mut self, offset: usize) -> &Token {
        if offset == 0 {
            return &self.current;
        }
        while self.lookahead.len() < offset {
            let token = self.lexer.next_token();
            self.lookahead.push_back(token);
        }
        &self.lookahead[offset - 1]
    }

    /// Returns the kind of the token `offset` positions ahead.
    pub(super) fn peek_at(&mut self, offset: usize) -> &TokenKind {
        self.peek_token(offset).kind()
    }

    /// Returns true if the token at `offset` is the contextual word `word`.
    pub(super) fn peek_is_word(&mut self, offset: usize, word: &str) -> bool {
        self.peek_at(offset).is_word(word)
    }

    /// Returns true if the token at `offset` ends exactly where the next
    /// one starts.
    pub(super) fn touches_next(&mut self, offset: usize) -> bool {
        let span = self.peek_token(offset).span();
        let next = self.peek_token(offset + 1).span();
        span.touches(next)
    }

    /// Checks if we're at the end of input.
    pub(super) fn is_at_end(&self) -> bool {
        self.current.kind().is_eof()
    }

    /// Advances to the next token and returns the previous one.
    ///
    /// Lexical error tokens are reported as they are passed over.
    pub(super) fn advance(&mut self) -> Token {
        if self.is_at_end() {
            return self.current.clone();
        }
        if let TokenKind::Error(kind) = self.current.kind() {
            let message = kind.to_string();
            self.report_at_current(ErrorKind::Lexical, message);
        }
        let next = match self.lookahead.pop_front() {
            Some(token) => token,
            None => self.lexer.next_token(),
        };
        self.previous_end = self.current.span().end();
        self.consumed += 1;
        std::mem::replace(&mut self.current, next)
    }

    /// Checks if the current token has the same kind as `kind` (payload is
    /// ignored).
    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    /// Consumes the current token if it matches the given kind.
    pub(super) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Checks if the current token is the given keyword.
    pub(super) fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current_kind().is_keyword(keyword)
    }

    /// Consumes the current token if it is the given keyword.
    pub(super) fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Checks if the current token is the contextual word `word` (lowercase).
    pub(super) fn check_word(&self, word: &str) -> bool {
        self.current_kind().is_word(word)
    }

    /// Consumes the current token if it is the contextual word `word`.
    pub(super) fn match_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the current token to match the given kind, advancing if it does.
    ///
    /// If the token doesn't match, reports `expected {what}, found ...` and
    /// returns `None`.
    pub(super) fn expect(&mut self, kind: &TokenKind, what: &str) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error_expected(what);
            None
        }
    }

    /// Expects the given keyword.
    pub(super) fn expect_keyword(&mut self, keyword: Keyword, what: &str) -> Option<Token> {
        if self.check_keyword(keyword) {
            Some(self.advance())
        } else {
            self.error_expected(what);
            None
        }
    }

    /// Expects the contextual word `word`.
    pub(super) fn expect_word(&mut self, word: &str, what: &str) -> Option<Token> {
        if self.check_word(word) {
            Some(self.advance())
        } else {
            self.error_expected(what);
            None
        }
    }

    /// Reports any tokens left over after a fragment or unit, then discards
    /// them.
    pub(super) fn expect_end(&mut self) {
        if self.is_at_end() {
            return;
        }
        self.error_expected("end of input");
        while !self.is_at_end() {
            self.advance();
        }
    }

    /// Returns a span from the start of `start` to the end of the most
    /// recently consumed token.
    pub(super) fn span_from(&self, start: Span) -> Span {
        Span::new(start.start(), self.previous_end.max(start.start()))
    }

    // ========================================================================
    // Error Handling & Recovery
    // ========================================================================

    /// Describes the current token for an error message.
    fn describe_current(&self) -> String {
        if self.is_at_end() {
            "end of input".to_string()
        } else {
            format!("'{}'", self.current_text())
        }
    }

    /// Reports `expected {what}, found <current token>`.
    pub(super) fn error_expected(&mut self, what: &str) {
        let message = format!("expected {what}, found {}", self.describe_current());
        self.error(message);
    }

    /// Reports an error at the current token.
    ///
    /// If the current token is a lexical error, the lexical problem is
    /// recorded instead of `message`.
    pub(super) fn error(&mut self, message: impl Into<EcoString>) {
        if let TokenKind::Error(kind) = self.current_kind() {
            let message = kind.to_string();
            self.report_at_current(ErrorKind::Lexical, message);
        } else {
            self.report_at_current(ErrorKind::Syntax, message);
        }
    }

    /// Reports an error covering `span`, which need not be a token.
    pub(super) fn error_at(&mut self, message: impl Into<EcoString>, span: Span) {
        let (line, column) = self.line_column(span.start());
        let offending = self.source.get(span.as_range()).unwrap_or("");
        let error = SyntaxError::new(ErrorKind::Syntax, message, offending, span, line, column);
        self.record(error);
    }

    /// Reports an internal fault at the current token.
    pub(super) fn internal_error(&mut self, message: impl Into<EcoString>) {
        self.report_at_current(ErrorKind::Internal, message);
    }

    fn report_at_current(&mut self, kind: ErrorKind, message: impl Into<EcoString>) {
        let offending: EcoString = if self.is_at_end() {
            "end of input".into()
        } else {
            self.current_text().into()
        };
        let error = SyntaxError::new(
            kind,
            message,
            offending,
            self.current.span(),
            self.current.line(),
            self.current.column(),
        );
        self.record(error);
    }

    /// Passes `error` to the listener unless it duplicates the previous
    /// error's position or the error limit has been reached.
    fn record(&mut self, error: SyntaxError) {
        self.reported += 1;
        let start = error.span.start();
        if self.last_error_start == Some(start) {
            trace!(offset = start, "suppressed duplicate error");
            return;
        }
        self.last_error_start = Some(start);
        if self
            .options
            .error_limit
            .is_some_and(|limit| self.error_count >= limit)
        {
            return;
        }
        debug!(
            kind = %error.kind,
            line = error.line,
            column = error.column,
            message = %error.message,
            "syntax error"
        );
        self.error_count += 1;
        self.listener.syntax_error(error);
    }

    /// Computes the 1-based line and 0-based character column of `offset`.
    fn line_column(&self, offset: u32) -> (u32, u32) {
        let before = self.source.get(..offset as usize).unwrap_or(self.source);
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let line = before.matches('\n').count() + 1;
        let column = before[line_start..].chars().count();
        (
            u32::try_from(line).unwrap_or(u32::MAX),
            u32::try_from(column).unwrap_or(u32::MAX),
        )
    }

    /// Increments the nesting depth and returns `Err(Expression::Error)` if
    /// it exceeds the configured maximum. Call [`Self::leave_nesting`] on
    /// every exit path when this returns `Ok(())`.
    pub(super) fn enter_nesting(&mut self, span: Span) -> Result<(), Expression> {
        self.nesting_depth += 1;
        let max = self.options.max_nesting_depth;
        if self.nesting_depth > max {
            self.error_at(format!("nesting is too deep (maximum {max} levels)"), span);
            self.nesting_depth -= 1;
            return Err(Expression::Error {
                message: "nesting too deep".into(),
                span,
            });
        }
        Ok(())
    }

    /// Counts one more link of a chain folded in a loop (`a + b + c`,
    /// `a.b().c`) as a nesting level, since each link wraps the tree built
    /// so far. Returns `false` once the maximum is reached.
    /// Release the counted links with [`Self::leave_links`].
    pub(super) fn enter_link(&mut self, links: &mut usize, span: Span) -> bool {
        if self.enter_nesting(span).is_err() {
            return false;
        }
        *links += 1;
        true
    }

    /// Releases the levels taken by [`Self::enter_link`].
    pub(super) fn leave_links(&mut self, links: usize) {
        for _ in 0..links {
            self.leave_nesting();
        }
    }

    /// Decrements the nesting depth (pair with [`Self::enter_nesting`]).
    pub(super) fn leave_nesting(&mut self) {
        debug_assert!(
            self.nesting_depth > 0,
            "leave_nesting called without matching enter_nesting"
        );
        self.nesting_depth = self.nesting_depth.saturating_sub(1);
    }

    /// Discards tokens until a resume point of `context` is reached.
    ///
    /// Brackets, braces and parentheses opened while skipping are skipped
    /// as a whole, so a resume token inside them does not count.
    pub(super) fn synchronize(&mut self, context: RecoveryContext) {
        let mut depth = 0usize;
        let mut skipped = 0usize;
        while !self.is_at_end() {
            let kind = self.current_kind();
            let action = if depth == 0 {
                resume_action(context, kind)
            } else {
                Resume::Skip
            };
            let opens = matches!(
                kind,
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace
            );
            let closes = matches!(
                kind,
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace
            );
            match action {
                Resume::Before => break,
                Resume::After => {
                    self.advance();
                    skipped += 1;
                    break;
                }
                Resume::Skip => {}
            }
            if opens {
                depth += 1;
            } else if closes {
                depth = depth.saturating_sub(1);
            }
            self.advance();
            skipped += 1;
        }
        trace!(?context, skipped, resume = %self.current_kind(), "resynchronized");
    }

    /// Captures the position for a later [`Self::ensure_progress`].
    pub(super) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            consumed: self.consumed,
            reported: self.reported,
        }
    }

    /// Forces progress in a list loop whose iteration consumed nothing.
    ///
    /// An iteration that consumed nothing must have reported an error; if it
    /// did not, that is an internal fault.
    pub(super) fn ensure_progress(&mut self, checkpoint: Checkpoint) {
        if self.consumed != checkpoint.consumed || self.is_at_end() {
            return;
        }
        if self.reported == checkpoint.reported {
            self.internal_error("parser made no progress");
        }
        self.advance();
    }
}
