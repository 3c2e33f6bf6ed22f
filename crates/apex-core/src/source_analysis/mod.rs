// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexing and parsing for Apex source code.
//!
//! # Lexical Analysis
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s on demand.
//! Each token carries its source location via [`Span`] plus line and column,
//! and keeps the surrounding whitespace and comments as [`Trivia`].
//!
//! ```
//! use apex_core::source_analysis::{Keyword, Lexer, TokenKind};
//!
//! let tokens: Vec<_> = Lexer::new("Public CLASS Hello").collect();
//! assert_eq!(tokens.len(), 3);
//! assert_eq!(tokens[1].kind(), &TokenKind::Keyword(Keyword::Class));
//! ```
//!
//! # Parsing
//!
//! [`parse_compilation_unit`], [`parse_trigger_unit`], [`parse_statement`],
//! [`parse_expression`] and [`parse_query`] turn source text into the AST
//! defined in [`crate::ast`], returning the tree together with every
//! [`SyntaxError`] found. [`parse_source`] picks between the two unit kinds.
//!
//! # Error Handling
//!
//! Neither the lexer nor the parser stops at the first problem. Invalid
//! characters become [`TokenKind::Error`] tokens, the parser reports them
//! alongside syntax errors to an [`ErrorListener`], and resynchronizes so
//! one mistake yields one error.

mod error;
mod lexer;
mod parser;
mod span;
mod token;


pub use error::{ErrorCollector, ErrorKind, ErrorListener, LexErrorKind, SyntaxError};
pub use lexer::{Lexer, lex, lex_with_eof, tokenize};
pub use parser::{
    DEFAULT_MAX_NESTING_DEPTH, ParseOptions, Parser, parse_compilation_unit,
    parse_compilation_unit_with_options, parse_expression, parse_expression_with_options,
    parse_query, parse_query_with_options, parse_source, parse_source_with_options,
    parse_statement, parse_statement_with_options, parse_trigger_unit,
    parse_trigger_unit_with_options,
};
pub use span::Span;
pub use token::{Keyword, Token, TokenKind, Trivia};
