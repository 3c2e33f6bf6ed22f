// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Apex language front-end.
//!
//! This crate contains:
//! - Lexical analysis (tokenization with trivia)
//! - Parsing (error-tolerant AST construction)
//! - The syntax tree and a shared expression walker
//!
//! Parsing never stops at the first problem: every entry point returns a
//! tree together with the full list of syntax errors, so editors and linters
//! can work on broken code.

#![doc = include_str!("../../../README.md")]

pub mod ast;
pub mod ast_walker;
pub mod source_analysis;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::ast::{Expression, Identifier, Literal, SourceUnit, Statement};
    pub use crate::source_analysis::{ParseOptions, Span, SyntaxError, parse_source};
}
