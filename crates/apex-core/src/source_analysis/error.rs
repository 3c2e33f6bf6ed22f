// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Syntax error records and the listener that collects them.
//!
//! Errors carry source locations ([`Span`] plus line and column) and
//! integrate with [`miette`] so a host can render them with source context.
//! Nothing here stops a parse: the parser reports every problem to an
//! [`ErrorListener`] and keeps going.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

use super::Span;

/// Why the lexer could not classify a character sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LexErrorKind {
    /// A character that cannot start any token.
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    /// A string literal without its closing quote on the same line.
    #[error("unterminated string literal")]
    UnterminatedString,

    /// A block comment without its closing `*/`.
    #[error("unterminated block comment")]
    UnterminatedComment,

    /// A backslash escape the language does not define.
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),

    /// A numeric literal with a malformed suffix.
    #[error("invalid number literal")]
    InvalidNumber,
}

/// The category of a recorded error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An uninterpretable character sequence.
    Lexical,
    /// A token sequence no grammar alternative accepts.
    Syntax,
    /// A parser invariant failed; never expected on any input.
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Lexical => "lexical error",
            Self::Syntax => "syntax error",
            Self::Internal => "internal parser error",
        })
    }
}

/// A single problem found while parsing. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic()]
pub struct SyntaxError {
    /// The category of the error.
    pub kind: ErrorKind,
    /// Human-readable description, usually `expected X, found Y`.
    pub message: EcoString,
    /// Source text of the offending token, or `end of input`.
    pub offending: EcoString,
    /// Location of the offending token.
    #[label("here")]
    pub span: Span,
    /// 1-based line of the offending token.
    pub line: u32,
    /// 0-based column of the offending token.
    pub column: u32,
}

impl SyntaxError {
    /// Creates a new error record.
    #[must_use]
    pub fn new(
        kind: ErrorKind,
        message: impl Into<EcoString>,
        offending: impl Into<EcoString>,
        span: Span,
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            offending: offending.into(),
            span,
            line,
            column,
        }
    }

    /// Returns true for lexical errors.
    #[must_use]
    pub fn is_lexical(&self) -> bool {
        self.kind == ErrorKind::Lexical
    }

    /// Returns true for internal faults.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.kind == ErrorKind::Internal
    }
}

/// Receives syntax errors as the parser detects them.
///
/// Each parse invocation owns its listener, so no state leaks between
/// parses. Closures taking `&SyntaxError` implement this trait, which lets a
/// host stream errors somewhere else:
///
/// ```
/// use apex_core::source_analysis::{ErrorListener, ParseOptions, Parser};
///
/// let mut lines = Vec::new();
/// let mut parser = Parser::with_listener(
///     "public class A {",
///     ParseOptions::default(),
///     |error: &apex_core::source_analysis::SyntaxError| lines.push(error.line),
/// );
/// let _unit = parser.parse_source_unit();
/// drop(parser);
/// assert_eq!(lines, vec![1]);
/// ```
pub trait ErrorListener {
    /// Records one error. Must not panic.
    fn syntax_error(&mut self, error: SyntaxError);
}

impl<F> ErrorListener for F
where
    F: FnMut(&SyntaxError),
{
    fn syntax_error(&mut self, error: SyntaxError) {
        self(&error);
    }
}

/// The default listener: keeps every error in detection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCollector {
    errors: Vec<SyntaxError>,
}

impl ErrorCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of errors recorded so far.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the recorded errors in detection order.
    #[must_use]
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consumes the collector, returning the errors.
    #[must_use]
    pub fn into_errors(self) -> Vec<SyntaxError> {
        self.errors
    }
}

impl ErrorListener for ErrorCollector {
    fn syntax_error(&mut self, error: SyntaxError) {
        self.errors.push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(message: &str, start: u32) -> SyntaxError {
        SyntaxError::new(
            ErrorKind::Syntax,
            message,
            "}",
            Span::new(start, start + 1),
            1,
            start,
        )
    }

    #[test]
    fn lex_error_kind_messages() {
        assert_eq!(
            LexErrorKind::UnexpectedCharacter('#').to_string(),
            "unexpected character '#'"
        );
        assert_eq!(
            LexErrorKind::InvalidEscape('q').to_string(),
            "invalid escape sequence '\\q'"
        );
        assert_eq!(
            LexErrorKind::UnterminatedString.to_string(),
            "unterminated string literal"
        );
    }

    #[test]
    fn syntax_error_display_is_message() {
        let error = sample("expected ';', found '}'", 3);
        assert_eq!(error.to_string(), "expected ';', found '}'");
        assert!(!error.is_lexical());
        assert!(!error.is_internal());
    }

    #[test]
    fn syntax_error_label_points_at_span() {
        let error = sample("boom", 7);
        let labels: Vec<_> = error.labels().into_iter().flatten().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 7);
        assert_eq!(labels[0].len(), 1);
    }

    #[test]
    fn collector_counts_match_errors() {
        let mut collector = ErrorCollector::new();
        assert!(collector.is_empty());
        collector.syntax_error(sample("a", 0));
        collector.syntax_error(sample("b", 4));
        assert_eq!(collector.error_count(), 2);
        assert_eq!(collector.errors().len(), collector.error_count());
        let messages: Vec<_> = collector
            .into_errors()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(messages, vec!["a", "b"]);
    }

    #[test]
    fn closures_are_listeners() {
        let mut seen = 0;
        {
            let mut listener = |_: &SyntaxError| seen += 1;
            listener.syntax_error(sample("x", 0));
            listener.syntax_error(sample("y", 1));
        }
        assert_eq!(seen, 2);
    }
}
