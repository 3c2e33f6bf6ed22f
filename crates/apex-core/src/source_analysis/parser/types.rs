// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Names, type references, and the lookahead scans that decide whether a
//! construct starts with a type.
//!
//! Apex has no syntactic marker for "a type follows", so statements like
//! `List<Account> accounts;` and casts like `(Decimal) value` are recognised
//! by scanning ahead over a plausible type without consuming anything.

use crate::ast::{Identifier, QualifiedName, TypeRef, TypeSegment};
use crate::source_analysis::{ErrorListener, Keyword, Span, TokenKind};

use super::Parser;

/// Returns true for tokens usable as a variable, type or member name.
///
/// `trigger`, `switch` and `transient` are reserved only where their
/// construct is expected, so they double as names.
pub(super) fn is_name(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::Identifier(_) => true,
        TokenKind::Keyword(keyword) => keyword.is_soft(),
        _ => false,
    }
}

/// Returns true for tokens that can start a type segment.
fn is_type_name(kind: &TokenKind) -> bool {
    is_name(kind) || kind.is_keyword(Keyword::Void)
}

impl<L: ErrorListener> Parser<'_, L> {
    // ========================================================================
    // Names
    // ========================================================================

    /// Parses a simple name.
    ///
    /// On failure reports `expected {what}` and returns an empty identifier
    /// positioned at the current token, without consuming it.
    pub(super) fn parse_identifier(&mut self, what: &str) -> Identifier {
        if is_name(self.current_kind()) {
            let token = self.advance();
            Identifier::new(token.text(self.source()), token.span())
        } else {
            self.error_expected(what);
            Identifier::new("", Span::empty_at(self.current_span().start()))
        }
    }

    /// Parses the name after `.` or `?.`, where any keyword is allowed
    /// (`Trigger.new`, `Database.insert`).
    pub(super) fn parse_member_name(&mut self) -> Identifier {
        if matches!(
            self.current_kind(),
            TokenKind::Identifier(_) | TokenKind::Keyword(_)
        ) {
            let token = self.advance();
            Identifier::new(token.text(self.source()), token.span())
        } else {
            self.parse_identifier("member name")
        }
    }

    /// Parses `Name(.Name)*`.
    pub(super) fn parse_qualified_name(&mut self, what: &str) -> QualifiedName {
        let start = self.current_span();
        let mut parts = vec![self.parse_identifier(what)];
        while self.check(&TokenKind::Dot) && is_name(self.peek_at(1)) {
            self.advance();
            parts.push(self.parse_identifier(what));
        }
        QualifiedName {
            parts,
            span: self.span_from(start),
        }
    }

    // ========================================================================
    // Type References
    // ========================================================================

    /// Parses a type reference including any `[]` suffixes.
    pub(super) fn parse_type_ref(&mut self) -> TypeRef {
        self.parse_type_ref_with(true)
    }

    /// Parses a type reference, optionally stopping before `[`.
    ///
    /// Creators need the latter: in `new Integer[5]` the brackets hold the
    /// array size, not a type suffix.
    pub(super) fn parse_type_ref_with(&mut self, array_suffix: bool) -> TypeRef {
        let start = self.current_span();
        let mut segments = Vec::new();
        loop {
            let segment_start = self.current_span();
            let name = if self.check_keyword(Keyword::Void) {
                let token = self.advance();
                Identifier::new(token.text(self.source()), token.span())
            } else {
                self.parse_identifier("type name")
            };
            let arguments = if self.check(&TokenKind::Less) {
                self.parse_type_arguments()
            } else {
                Vec::new()
            };
            segments.push(TypeSegment {
                name,
                arguments,
                span: self.span_from(segment_start),
            });
            if self.check(&TokenKind::Dot) && is_name(self.peek_at(1)) {
                self.advance();
            } else {
                break;
            }
        }

        let mut array_dimensions: u8 = 0;
        while array_suffix
            && self.check(&TokenKind::LeftBracket)
            && matches!(self.peek_at(1), TokenKind::RightBracket)
        {
            self.advance();
            self.advance();
            array_dimensions = array_dimensions.saturating_add(1);
        }

        TypeRef {
            segments,
            array_dimensions,
            span: self.span_from(start),
        }
    }

    /// Parses `<Type, Type>`.
    fn parse_type_arguments(&mut self) -> Vec<TypeRef> {
        if self.enter_nesting(self.current_span()).is_err() {
            return Vec::new();
        }
        self.advance();
        let mut arguments = vec![self.parse_type_ref()];
        while self.match_token(&TokenKind::Comma) {
            arguments.push(self.parse_type_ref());
        }
        self.expect(&TokenKind::Greater, "'>'");
        self.leave_nesting();
        arguments
    }

    /// Parses a comma-separated list of type references.
    pub(super) fn parse_type_list(&mut self) -> Vec<TypeRef> {
        let mut types = vec![self.parse_type_ref()];
        while self.match_token(&TokenKind::Comma) {
            types.push(self.parse_type_ref());
        }
        types
    }

    // ========================================================================
    // Lookahead Scans
    // ========================================================================

    /// Scans a type starting `offset` tokens ahead without consuming.
    ///
    /// Returns the offset just past the type, or `None` if the tokens there
    /// cannot form a type. Nesting of type arguments is tracked with a
    /// counter, so the scan needs no recursion.
    pub(super) fn scan_type(&mut self, offset: usize) -> Option<usize> {
        let mut pos = offset;
        let mut depth = 0usize;
        loop {
            if !is_type_name(self.peek_at(pos)) {
                return None;
            }
            pos += 1;
            while matches!(self.peek_at(pos), TokenKind::Dot) && is_name(self.peek_at(pos + 1)) {
                pos += 2;
            }
            if matches!(self.peek_at(pos), TokenKind::Less) {
                depth += 1;
                pos += 1;
                continue;
            }
            // Close argument lists until another argument or the end of the type.
            loop {
                while matches!(self.peek_at(pos), TokenKind::LeftBracket)
                    && matches!(self.peek_at(pos + 1), TokenKind::RightBracket)
                {
                    pos += 2;
                }
                if depth == 0 {
                    return Some(pos);
                }
                match self.peek_at(pos) {
                    TokenKind::Comma => {
                        pos += 1;
                        break;
                    }
                    TokenKind::Greater => {
                        depth -= 1;
                        pos += 1;
                    }
                    _ => return None,
                }
            }
        }
    }

    /// Returns true if the current tokens start `Type name`.
    pub(super) fn at_variable_declaration(&mut self) -> bool {
        self.scan_type(0).is_some_and(|end| is_name(self.peek_at(end)))
    }

    /// Returns true if the current `(` starts a cast.
    ///
    /// A cast is `(` type `)` followed by something that can only begin an
    /// operand. A following `+`, `-`, `++` or `--` makes the parenthesized
    /// form an ordinary expression: `(a) - b` subtracts.
    pub(super) fn at_cast(&mut self) -> bool {
        let Some(end) = self.scan_type(1) else {
            return false;
        };
        if !matches!(self.peek_at(end), TokenKind::RightParen) {
            return false;
        }
        match self.peek_at(end + 1) {
            TokenKind::LeftBracket => {
                self.peek_is_word(end + 2, "select") || self.peek_is_word(end + 2, "find")
            }
            TokenKind::LeftParen | TokenKind::Bang | TokenKind::Tilde => true,
            TokenKind::Keyword(
                Keyword::This
                | Keyword::Super
                | Keyword::New
                | Keyword::Null
                | Keyword::True
                | Keyword::False,
            ) => true,
            kind => is_name(kind) || kind.is_literal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::ParseOptions;

    fn parser(source: &str) -> Parser<'_> {
        Parser::new(source, ParseOptions::default())
    }

    #[test]
    fn scan_simple_and_generic_types() {
        assert_eq!(parser("Integer x").scan_type(0), Some(1));
        assert_eq!(parser("List<Account> a").scan_type(0), Some(4));
        assert_eq!(parser("Map<Id, List<Contact>> m").scan_type(0), Some(9));
        assert_eq!(parser("Account[] accs").scan_type(0), Some(3));
        assert_eq!(parser("Schema.SObjectType t").scan_type(0), Some(3));
    }

    #[test]
    fn scan_rejects_non_types() {
        assert_eq!(parser("42").scan_type(0), None);
        assert_eq!(parser("List<42>").scan_type(0), None);
        assert_eq!(parser("List<Integer").scan_type(0), None);
    }

    #[test]
    fn variable_declaration_lookahead() {
        assert!(parser("List<Account> accounts = x;").at_variable_declaration());
        assert!(parser("Integer i;").at_variable_declaration());
        assert!(parser("Integer switch = 1;").at_variable_declaration());
        assert!(parser("Account trigger;").at_variable_declaration());
        assert!(!parser("x = 5;").at_variable_declaration());
        assert!(!parser("a.b.c();").at_variable_declaration());
        assert!(!parser("i++;").at_variable_declaration());
    }

    #[test]
    fn cast_lookahead() {
        assert!(parser("(String) value").at_cast());
        assert!(parser("(List<Id>) (x)").at_cast());
        assert!(parser("(Account[]) [SELECT Id FROM Account]").at_cast());
        assert!(parser("(Integer) 5").at_cast());
        assert!(!parser("(a) + b").at_cast());
        assert!(!parser("(a) - b").at_cast());
        assert!(!parser("(a + b)").at_cast());
        assert!(!parser("(x) && y").at_cast());
    }

    #[test]
    fn parse_nested_generic_type() {
        let mut p = parser("Map<String, List<Integer>>[]");
        let type_ref = p.parse_type_ref();
        assert_eq!(p.error_count(), 0);
        assert_eq!(type_ref.qualified_name(), "Map");
        assert_eq!(type_ref.array_dimensions, 1);
        let arguments = type_ref.type_arguments();
        assert_eq!(arguments.len(), 2);
        assert_eq!(arguments[1].qualified_name(), "List");
        assert_eq!(arguments[1].type_arguments()[0].qualified_name(), "Integer");
        assert_eq!(type_ref.span, Span::new(0, 28));
    }

    #[test]
    fn parse_qualified_type() {
        let mut p = parser("Database.SaveResult");
        let type_ref = p.parse_type_ref();
        assert_eq!(type_ref.qualified_name(), "Database.SaveResult");
        assert_eq!(type_ref.segments.len(), 2);
    }

    #[test]
    fn creator_type_stops_before_brackets() {
        let mut p = parser("Integer[5]");
        let type_ref = p.parse_type_ref_with(false);
        assert_eq!(type_ref.array_dimensions, 0);
        assert_eq!(p.current_kind(), &TokenKind::LeftBracket);
    }

    #[test]
    fn soft_keywords_are_names() {
        let mut p = parser("trigger");
        let name = p.parse_identifier("name");
        assert_eq!(name.name, "trigger");
        assert_eq!(p.error_count(), 0);
    }

    #[test]
    fn missing_name_reports_once() {
        let mut p = parser("{");
        let name = p.parse_identifier("class name");
        assert!(name.name.is_empty());
        let errors = p.finish().into_errors();
        assert_eq!(errors[0].message, "expected class name, found '{'");
    }
}
