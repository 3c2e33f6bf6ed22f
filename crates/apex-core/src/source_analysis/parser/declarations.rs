// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Declaration parsing for Apex.
//!
//! Compilation units, trigger units, type declarations and their members,
//! plus the modifiers and annotations that precede them.

use crate::ast::{
    AccessorKind, Annotation, AnnotationArguments, ClassDeclaration, ClassMember, CompilationUnit,
    ConstructorDeclaration, ElementValue, ElementValuePair, EnumDeclaration, FieldDeclaration,
    Initializer, InterfaceDeclaration, MethodDeclaration, Modifier, ModifierKeyword, Modifiers,
    Parameter, PropertyAccessor, PropertyDeclaration, SharingMode, TriggerCase, TriggerOperation,
    TriggerTiming, TriggerUnit, TypeDeclaration,
};
use crate::source_analysis::{ErrorListener, Keyword, Span, TokenKind};

use super::types::is_name;
use super::{Parser, RecoveryContext};

/// Maps a keyword to the modifier it spells, if any.
fn modifier_keyword(kind: &TokenKind) -> Option<ModifierKeyword> {
    let TokenKind::Keyword(keyword) = kind else {
        return None;
    };
    let modifier = match keyword {
        Keyword::Public => ModifierKeyword::Public,
        Keyword::Private => ModifierKeyword::Private,
        Keyword::Protected => ModifierKeyword::Protected,
        Keyword::Global => ModifierKeyword::Global,
        Keyword::Abstract => ModifierKeyword::Abstract,
        Keyword::Final => ModifierKeyword::Final,
        Keyword::Static => ModifierKeyword::Static,
        Keyword::Virtual => ModifierKeyword::Virtual,
        Keyword::Override => ModifierKeyword::Override,
        Keyword::Transient => ModifierKeyword::Transient,
        Keyword::TestMethod => ModifierKeyword::TestMethod,
        Keyword::WebService => ModifierKeyword::WebService,
        _ => return None,
    };
    Some(modifier)
}

impl<L: ErrorListener> Parser<'_, L> {
    // ========================================================================
    // Source Units
    // ========================================================================

    /// Parses a compilation unit: type declarations until end of input.
    pub(super) fn parse_compilation_unit(&mut self) -> CompilationUnit {
        let start = self.current_span();
        let mut types = Vec::new();

        while !self.is_at_end() {
            let checkpoint = self.checkpoint();
            let declaration = self.parse_type_declaration();
            if matches!(declaration, TypeDeclaration::Error { .. }) {
                self.synchronize(RecoveryContext::CompilationUnit);
            }
            types.push(declaration);
            self.ensure_progress(checkpoint);
        }

        if types.is_empty() {
            self.error_expected("a type declaration");
        }

        CompilationUnit {
            types,
            span: self.span_from(start),
        }
    }

    /// Parses `trigger Name on Object (before insert, ...) { ... }`.
    pub(super) fn parse_trigger_unit(&mut self) -> TriggerUnit {
        let start = self.current_span();
        self.expect_keyword(Keyword::Trigger, "'trigger'");
        let name = self.parse_identifier("trigger name");
        self.expect_word("on", "'on'");
        let object = self.parse_identifier("object name");

        let mut cases = Vec::new();
        if self.expect(&TokenKind::LeftParen, "'('").is_some() {
            loop {
                if let Some(case) = self.parse_trigger_case() {
                    cases.push(case);
                }
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            if self.expect(&TokenKind::RightParen, "')'").is_none() {
                while !self.is_at_end()
                    && !self.check(&TokenKind::RightParen)
                    && !self.check(&TokenKind::LeftBrace)
                {
                    self.advance();
                }
                self.match_token(&TokenKind::RightParen);
            }
        }

        let body = self.parse_block();
        self.expect_end();
        TriggerUnit {
            name,
            object,
            cases,
            body,
            span: self.span_from(start),
        }
    }

    fn parse_trigger_case(&mut self) -> Option<TriggerCase> {
        let start = self.current_span();
        let timing = if self.match_word("before") {
            TriggerTiming::Before
        } else if self.match_word("after") {
            TriggerTiming::After
        } else {
            self.error_expected("'before' or 'after'");
            return None;
        };
        let operation = match self.current_kind() {
            TokenKind::Keyword(Keyword::Insert) => TriggerOperation::Insert,
            TokenKind::Keyword(Keyword::Update) => TriggerOperation::Update,
            TokenKind::Keyword(Keyword::Delete) => TriggerOperation::Delete,
            TokenKind::Keyword(Keyword::Undelete) => TriggerOperation::Undelete,
            _ => {
                self.error_expected("trigger operation");
                return None;
            }
        };
        self.advance();
        Some(TriggerCase {
            timing,
            operation,
            span: self.span_from(start),
        })
    }

    // ========================================================================
    // Modifiers and Annotations
    // ========================================================================

    /// Parses any run of annotations, keyword modifiers and sharing
    /// modifiers, in any order.
    pub(super) fn parse_modifiers(&mut self) -> Modifiers {
        let mut items = Vec::new();
        loop {
            if self.check(&TokenKind::At) {
                items.push(Modifier::Annotation(self.parse_annotation()));
                continue;
            }
            if let Some(keyword) = modifier_keyword(self.current_kind()) {
                let span = self.advance().span();
                items.push(Modifier::Keyword { keyword, span });
                continue;
            }
            if self.peek_is_word(1, "sharing") {
                let mode = if self.check_word("with") {
                    Some(SharingMode::With)
                } else if self.check_word("without") {
                    Some(SharingMode::Without)
                } else if self.check_word("inherited") {
                    Some(SharingMode::Inherited)
                } else {
                    None
                };
                if let Some(mode) = mode {
                    let start = self.advance().span();
                    self.advance();
                    items.push(Modifier::Sharing {
                        mode,
                        span: self.span_from(start),
                    });
                    continue;
                }
            }
            break;
        }
        Modifiers { items }
    }

    /// Parses `@Name`, `@Name(value)` or `@Name(key=value ...)`.
    fn parse_annotation(&mut self) -> Annotation {
        let start = self.advance().span();
        let name = self.parse_qualified_name("annotation name");
        let arguments = if self.check(&TokenKind::LeftParen) {
            self.parse_annotation_arguments()
        } else {
            AnnotationArguments::None
        };
        Annotation {
            name,
            arguments,
            span: self.span_from(start),
        }
    }

    /// Parses the parenthesized part of an annotation.
    ///
    /// Commas between `key=value` pairs are optional.
    fn parse_annotation_arguments(&mut self) -> AnnotationArguments {
        self.advance();
        let arguments = if self.check(&TokenKind::RightParen) {
            AnnotationArguments::Pairs(Vec::new())
        } else if self.at_element_value_pair() {
            let mut pairs = Vec::new();
            while self.at_element_value_pair() {
                let start = self.current_span();
                let name = self.parse_identifier("annotation element");
                self.advance();
                let value = self.parse_element_value();
                pairs.push(ElementValuePair {
                    name,
                    value,
                    span: self.span_from(start),
                });
                self.match_token(&TokenKind::Comma);
            }
            AnnotationArguments::Pairs(pairs)
        } else {
            AnnotationArguments::Value(self.parse_element_value())
        };
        self.expect(&TokenKind::RightParen, "')'");
        arguments
    }

    fn at_element_value_pair(&mut self) -> bool {
        is_name(self.current_kind()) && matches!(self.peek_at(1), TokenKind::Assign)
    }

    /// Parses an annotation value: a nested annotation, `{ ... }`, or an
    /// expression without assignment.
    fn parse_element_value(&mut self) -> ElementValue {
        if let Err(error) = self.enter_nesting(self.current_span()) {
            return ElementValue::Expression(error);
        }
        let value = if self.check(&TokenKind::At) {
            ElementValue::Annotation(Box::new(self.parse_annotation()))
        } else if self.check(&TokenKind::LeftBrace) {
            let start = self.advance().span();
            let mut values = Vec::new();
            if !self.check(&TokenKind::RightBrace) {
                loop {
                    values.push(self.parse_element_value());
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RightBrace, "'}'");
            ElementValue::Array {
                values,
                span: self.span_from(start),
            }
        } else {
            ElementValue::Expression(self.nested(Self::parse_ternary))
        };
        self.leave_nesting();
        value
    }

    // ========================================================================
    // Type Declarations
    // ========================================================================

    /// Parses modifiers followed by a class, interface or enum.
    fn parse_type_declaration(&mut self) -> TypeDeclaration {
        let start = self.current_span();
        let modifiers = self.parse_modifiers();
        self.parse_type_declaration_after(modifiers, start)
    }

    /// Parses a class, interface or enum whose modifiers are already parsed.
    fn parse_type_declaration_after(
        &mut self,
        modifiers: Modifiers,
        start: Span,
    ) -> TypeDeclaration {
        stacker::maybe_grow(32 * 1024, 256 * 1024, || {
            if let Err(error) = self.enter_nesting(self.current_span()) {
                self.skip_declaration();
                return TypeDeclaration::Error {
                    message: "nesting too deep".into(),
                    span: error.span(),
                };
            }
            let declaration = match self.current_kind() {
                TokenKind::Keyword(Keyword::Class) => {
                    TypeDeclaration::Class(self.parse_class(modifiers, start))
                }
                TokenKind::Keyword(Keyword::Interface) => {
                    TypeDeclaration::Interface(self.parse_interface(modifiers, start))
                }
                TokenKind::Keyword(Keyword::Enum) => {
                    TypeDeclaration::Enum(self.parse_enum(modifiers, start))
                }
                _ => {
                    self.error_expected("a type declaration");
                    TypeDeclaration::Error {
                        message: "expected a type declaration".into(),
                        span: self.span_from(start),
                    }
                }
            };
            self.leave_nesting();
            declaration
        })
    }

    /// Discards a declaration through the brace that closes its body.
    fn skip_declaration(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.current_kind() {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace if depth <= 1 => {
                    if depth == 1 {
                        self.advance();
                    }
                    return;
                }
                TokenKind::RightBrace => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }

    fn parse_class(&mut self, modifiers: Modifiers, start: Span) -> ClassDeclaration {
        self.advance();
        let name = self.parse_identifier("class name");
        let extends = if self.match_keyword(Keyword::Extends) {
            Some(self.parse_type_ref())
        } else {
            None
        };
        let implements = if self.match_keyword(Keyword::Implements) {
            self.parse_type_list()
        } else {
            Vec::new()
        };
        let members = self.parse_class_body();
        ClassDeclaration {
            modifiers,
            name,
            extends,
            implements,
            members,
            span: self.span_from(start),
        }
    }

    fn parse_interface(&mut self, modifiers: Modifiers, start: Span) -> InterfaceDeclaration {
        self.advance();
        let name = self.parse_identifier("interface name");
        let extends = if self.match_keyword(Keyword::Extends) {
            self.parse_type_list()
        } else {
            Vec::new()
        };

        let mut methods = Vec::new();
        if self.expect(&TokenKind::LeftBrace, "'{'").is_some() {
            while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
                if self.match_token(&TokenKind::Semicolon) {
                    continue;
                }
                let checkpoint = self.checkpoint();
                let method_start = self.current_span();
                let modifiers = self.parse_modifiers();
                if self.scan_type(0).is_some() {
                    let mut method = self.parse_method(modifiers, method_start);
                    if let Some(body) = method.body.take() {
                        self.error_at("interface methods cannot have a body", body.span);
                    }
                    methods.push(method);
                } else {
                    self.error_expected("method signature");
                    self.synchronize(RecoveryContext::ClassBody);
                }
                self.ensure_progress(checkpoint);
            }
            self.expect(&TokenKind::RightBrace, "'}'");
        }

        InterfaceDeclaration {
            modifiers,
            name,
            extends,
            methods,
            span: self.span_from(start),
        }
    }

    /// Parses `enum Name { A, B }`. A trailing comma is an error.
    fn parse_enum(&mut self, modifiers: Modifiers, start: Span) -> EnumDeclaration {
        self.advance();
        let name = self.parse_identifier("enum name");
        let mut constants = Vec::new();
        if self.expect(&TokenKind::LeftBrace, "'{'").is_some() {
            if !self.check(&TokenKind::RightBrace) {
                loop {
                    if !is_name(self.current_kind()) {
                        self.error_expected("enum constant");
                        break;
                    }
                    constants.push(self.parse_identifier("enum constant"));
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            if self.expect(&TokenKind::RightBrace, "'}'").is_none() {
                self.synchronize(RecoveryContext::ClassBody);
                self.match_token(&TokenKind::RightBrace);
            }
        }
        EnumDeclaration {
            modifiers,
            name,
            constants,
            span: self.span_from(start),
        }
    }

    // ========================================================================
    // Class Members
    // ========================================================================

    /// Parses `{ members }`, resynchronizing after each broken member.
    fn parse_class_body(&mut self) -> Vec<ClassMember> {
        let mut members = Vec::new();
        if self.expect(&TokenKind::LeftBrace, "'{'").is_none() {
            return members;
        }
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if self.match_token(&TokenKind::Semicolon) {
                continue;
            }
            let checkpoint = self.checkpoint();
            let member = self.parse_member();
            if matches!(member, ClassMember::Error { .. }) {
                self.synchronize(RecoveryContext::ClassBody);
            }
            members.push(member);
            self.ensure_progress(checkpoint);
        }
        self.expect(&TokenKind::RightBrace, "'}'");
        members
    }

    fn parse_member(&mut self) -> ClassMember {
        let start = self.current_span();

        if self.check(&TokenKind::LeftBrace)
            || (self.check_keyword(Keyword::Static)
                && matches!(self.peek_at(1), TokenKind::LeftBrace))
        {
            let is_static = self.match_keyword(Keyword::Static);
            let body = self.parse_block();
            return ClassMember::Initializer(Initializer {
                is_static,
                body,
                span: self.span_from(start),
            });
        }

        let modifiers = self.parse_modifiers();
        if matches!(
            self.current_kind(),
            TokenKind::Keyword(Keyword::Class | Keyword::Interface | Keyword::Enum)
        ) {
            return ClassMember::Type(self.parse_type_declaration_after(modifiers, start));
        }
        if self.at_constructor() {
            return ClassMember::Constructor(self.parse_constructor(modifiers, start));
        }

        let Some(end) = self.scan_type(0) else {
            self.error_expected("class member");
            return ClassMember::Error {
                message: "expected class member".into(),
                span: self.span_from(start),
            };
        };
        match self.peek_at(end + 1) {
            TokenKind::LeftParen => ClassMember::Method(self.parse_method(modifiers, start)),
            TokenKind::LeftBrace => ClassMember::Property(self.parse_property(modifiers, start)),
            _ => {
                let type_ref = self.parse_type_ref();
                let declarators = self.parse_variable_declarators();
                if self.expect(&TokenKind::Semicolon, "';'").is_none() {
                    self.synchronize(RecoveryContext::ClassBody);
                }
                ClassMember::Field(FieldDeclaration {
                    modifiers,
                    type_ref,
                    declarators,
                    span: self.span_from(start),
                })
            }
        }
    }

    /// Returns true if `Name(` or `Outer.Name(` starts here.
    fn at_constructor(&mut self) -> bool {
        if !is_name(self.current_kind()) {
            return false;
        }
        let mut pos = 1;
        while matches!(self.peek_at(pos), TokenKind::Dot) && is_name(self.peek_at(pos + 1)) {
            pos += 2;
        }
        matches!(self.peek_at(pos), TokenKind::LeftParen)
    }

    fn parse_constructor(&mut self, modifiers: Modifiers, start: Span) -> ConstructorDeclaration {
        let name = self.parse_qualified_name("constructor name");
        let parameters = self.parse_parameters();
        let body = self.parse_block();
        ConstructorDeclaration {
            modifiers,
            name,
            parameters,
            body,
            span: self.span_from(start),
        }
    }

    /// Parses `Type name(params)` followed by a block or `;`.
    fn parse_method(&mut self, modifiers: Modifiers, start: Span) -> MethodDeclaration {
        let return_type = self.parse_type_ref();
        let name = self.parse_identifier("method name");
        let parameters = self.parse_parameters();
        let body = if self.match_token(&TokenKind::Semicolon) {
            None
        } else if self.check(&TokenKind::LeftBrace) {
            Some(self.parse_block())
        } else {
            self.error_expected("'{' or ';'");
            None
        };
        MethodDeclaration {
            modifiers,
            return_type,
            name,
            parameters,
            body,
            span: self.span_from(start),
        }
    }

    /// Parses `(final Type a, Type b)`.
    fn parse_parameters(&mut self) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        if self.expect(&TokenKind::LeftParen, "'('").is_none() {
            return parameters;
        }
        if !self.check(&TokenKind::RightParen) {
            loop {
                let start = self.current_span();
                let modifiers = self.parse_modifiers();
                let type_ref = self.parse_type_ref();
                let name = self.parse_identifier("parameter name");
                parameters.push(Parameter {
                    modifiers,
                    type_ref,
                    name,
                    span: self.span_from(start),
                });
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen, "')'");
        parameters
    }

    /// Parses `Type Name { get; private set { ... } }`.
    fn parse_property(&mut self, modifiers: Modifiers, start: Span) -> PropertyDeclaration {
        let type_ref = self.parse_type_ref();
        let name = self.parse_identifier("property name");
        let mut accessors = Vec::new();
        self.advance();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let checkpoint = self.checkpoint();
            let accessor_start = self.current_span();
            let accessor_modifiers = self.parse_modifiers();
            let kind = if self.match_word("get") {
                AccessorKind::Get
            } else if self.match_word("set") {
                AccessorKind::Set
            } else {
                self.error_expected("'get' or 'set'");
                self.synchronize(RecoveryContext::ClassBody);
                self.ensure_progress(checkpoint);
                continue;
            };
            let body = if self.match_token(&TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_block())
            };
            accessors.push(PropertyAccessor {
                modifiers: accessor_modifiers,
                kind,
                body,
                span: self.span_from(accessor_start),
            });
            self.ensure_progress(checkpoint);
        }
        self.expect(&TokenKind::RightBrace, "'}'");

        PropertyDeclaration {
            modifiers,
            type_ref,
            name,
            accessors,
            span: self.span_from(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, Identifier};
    use crate::source_analysis::{parse_compilation_unit, parse_trigger_unit};

    fn names(identifiers: &[Identifier]) -> Vec<&str> {
        identifiers.iter().map(|id| id.name.as_str()).collect()
    }

    fn parse_ok(source: &str) -> CompilationUnit {
        let (unit, errors) = parse_compilation_unit(source);
        assert!(errors.is_empty(), "unexpected errors for {source:?}: {errors:?}");
        unit
    }

    fn parse_err(source: &str) -> (CompilationUnit, Vec<String>) {
        let (unit, errors) = parse_compilation_unit(source);
        assert!(!errors.is_empty(), "expected errors for {source:?}");
        (
            unit,
            errors.into_iter().map(|e| e.message.to_string()).collect(),
        )
    }

    fn only_class(unit: &CompilationUnit) -> &ClassDeclaration {
        match unit.types.as_slice() {
            [TypeDeclaration::Class(class)] => class,
            other => panic!("expected one class, got {other:?}"),
        }
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let lower = parse_ok("public class Hello {}");
        let mixed = parse_ok("Public CLASS Hello {}");
        let a = only_class(&lower);
        let b = only_class(&mixed);
        assert_eq!(a.name.name, b.name.name);
        assert!(a.modifiers.has(ModifierKeyword::Public));
        assert!(b.modifiers.has(ModifierKeyword::Public));
    }

    #[test]
    fn class_header() {
        let unit = parse_ok(
            "global with sharing class Foo extends Base implements Comparable, Database.Batchable<SObject> {}",
        );
        let class = only_class(&unit);
        assert_eq!(class.modifiers.sharing(), Some(SharingMode::With));
        assert_eq!(class.extends.as_ref().map(|t| t.qualified_name()), Some("Base".into()));
        assert_eq!(class.implements.len(), 2);
        assert_eq!(class.implements[1].qualified_name(), "Database.Batchable");
        assert_eq!(class.span, unit.span);
    }

    #[test]
    fn annotations_with_arguments() {
        let unit = parse_ok(
            "@IsTest(SeeAllData=true isParallel=false) @SuppressWarnings('PMD') private class T {}",
        );
        let class = only_class(&unit);
        let annotations: Vec<_> = class.modifiers.annotations().collect();
        assert_eq!(annotations.len(), 2);
        assert!(matches!(
            &annotations[0].arguments,
            AnnotationArguments::Pairs(pairs) if pairs.len() == 2
        ));
        assert!(matches!(&annotations[1].arguments, AnnotationArguments::Value(_)));
    }

    #[test]
    fn members_of_every_kind() {
        let unit = parse_ok(
            "public class C {
                private static final Integer MAX = 10, MIN;
                public String name { get; private set { name = value; } }
                static { MAX = 1; }
                { init(); }
                public C(Integer a) { this(); }
                public override String toString() { return name; }
                abstract void run();
                public enum Color { RED, GREEN }
                class Inner {}
                interface Shape { Decimal area(); }
            }",
        );
        let class = only_class(&unit);
        let kinds: Vec<_> = class.members.iter().map(ClassMember::kind_name).collect();
        assert_eq!(
            kinds,
            vec![
                "field",
                "property",
                "initializer",
                "initializer",
                "constructor",
                "method",
                "method",
                "inner type",
                "inner type",
                "inner type",
            ]
        );
        let ClassMember::Property(property) = &class.members[1] else {
            panic!("expected property");
        };
        assert_eq!(property.accessors.len(), 2);
        assert!(property.accessors[0].body.is_none());
        let ClassMember::Method(method) = &class.members[6] else {
            panic!("expected method");
        };
        assert!(method.body.is_none());
        assert!(method.return_type.is_void());
    }

    #[test]
    fn test_method_with_run_as() {
        let unit = parse_ok(
            "@isTest private class T { static testMethod void testRunAs() { System.runAs(u) { } } }",
        );
        let ClassMember::Method(method) = &only_class(&unit).members[0] else {
            panic!("expected method");
        };
        assert!(method.modifiers.has(ModifierKeyword::TestMethod));
        let body = method.body.as_ref().map(|b| b.statements[0].kind_name());
        assert_eq!(body, Some("run-as"));
    }

    #[test]
    fn enum_constants() {
        let unit = parse_ok("public enum Season { WINTER, SPRING, SUMMER, FALL }");
        let [TypeDeclaration::Enum(declaration)] = unit.types.as_slice() else {
            panic!("expected enum");
        };
        assert_eq!(
            names(&declaration.constants),
            vec!["WINTER", "SPRING", "SUMMER", "FALL"]
        );
    }

    #[test]
    fn enum_trailing_comma_is_an_error() {
        let (unit, errors) = parse_err("enum E { A, B, }");
        assert_eq!(errors, vec!["expected enum constant, found '}'"]);
        assert_eq!(unit.types.len(), 1);
    }

    #[test]
    fn interface_methods_have_no_body() {
        let (_, errors) = parse_err("interface I { void a() { } }");
        assert_eq!(errors, vec!["interface methods cannot have a body"]);
    }

    #[test]
    fn empty_input_is_an_error() {
        let (unit, errors) = parse_err("");
        assert!(unit.types.is_empty());
        assert_eq!(errors, vec!["expected a type declaration, found end of input"]);
    }

    #[test]
    fn broken_member_recovers_at_next_member() {
        let (unit, errors) = parse_err("class A { Integer x = ; void b() {} }");
        assert_eq!(errors, vec!["expected expression, found ';'"]);
        assert_eq!(only_class(&unit).members.len(), 2);
    }

    #[test]
    fn garbage_member_recovers() {
        let (unit, errors) = parse_err("class A { 42 42 ; public void b() {} }");
        assert_eq!(errors, vec!["expected class member, found '42'"]);
        let members = &only_class(&unit).members;
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].kind_name(), "method");
    }

    #[test]
    fn garbage_between_types_recovers() {
        let (unit, errors) = parse_err("class A {} 1 2 3 class B {}");
        assert_eq!(errors, vec!["expected a type declaration, found '1'"]);
        assert_eq!(unit.types.len(), 3);
        assert_eq!(unit.types[2].name().map(|n| n.name.as_str()), Some("B"));
    }

    #[test]
    fn unclosed_class_is_one_error() {
        let (unit, errors) = parse_err("public class Hello {");
        assert_eq!(errors, vec!["expected '}', found end of input"]);
        assert_eq!(unit.types.len(), 1);
    }

    #[test]
    fn trigger_unit() {
        let (unit, errors) = parse_trigger_unit(
            "trigger AccountTrigger on Account (before insert, after update, after undelete) {
                for (Account a : Trigger.new) { a.Name = 'x'; }
            }",
        );
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(unit.name.name, "AccountTrigger");
        assert_eq!(unit.object.name, "Account");
        assert_eq!(unit.cases.len(), 3);
        assert_eq!(unit.cases[2].operation, TriggerOperation::Undelete);
        assert_eq!(unit.body.statements.len(), 1);
    }

    #[test]
    fn trigger_with_bad_case() {
        let (unit, errors) = parse_trigger_unit("trigger t on Account (during insert) {}");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "expected 'before' or 'after', found 'during'");
        assert!(unit.cases.is_empty());
        assert!(unit.body.statements.is_empty());
    }

    #[test]
    fn parameters_with_modifiers_and_generics() {
        let unit =
            parse_ok("class A { void m(final List<Account> accs, Map<Id, Contact> byId) {} }");
        let ClassMember::Method(method) = &only_class(&unit).members[0] else {
            panic!("expected method");
        };
        assert_eq!(method.parameters.len(), 2);
        assert!(method.parameters[0].modifiers.has(ModifierKeyword::Final));
        assert_eq!(method.parameters[1].type_ref.type_arguments().len(), 2);
    }

    #[test]
    fn deeply_nested_classes_are_bounded() {
        let source = format!("{}{}", "class A {".repeat(300), "}".repeat(300));
        let (unit, errors) = parse_compilation_unit(&source);
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].message.starts_with("nesting is too deep"));
        assert_eq!(unit.types.len(), 1);
    }

    #[test]
    fn expression_error_nodes_keep_spans() {
        let (unit, _) = parse_compilation_unit("class A { Integer x = ; }");
        let ClassMember::Field(field) = &only_class(&unit).members[0] else {
            panic!("expected field");
        };
        let initializer = field.declarators[0].initializer.as_ref();
        assert!(initializer.is_some_and(Expression::is_error));
    }
}
