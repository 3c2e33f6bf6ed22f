// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! End-to-end parser tests through the public API.
//!
//! Test cases under `cases/` are realistic Apex sources; every file must
//! parse without errors. The remaining tests pin the documented parse
//! behaviour of small inputs.

use std::fs;
use std::path::{Path, PathBuf};

use apex_core::ast::{
    AccessLevel, BinaryOperator, ClassMember, ComparisonOperator, Condition, Expression,
    FieldExpression, Literal, QueryMode, QueryValue, SourceUnit, Statement, TypeDeclaration,
    UnaryOperator, WithClause,
};
use apex_core::ast_walker::walk_expressions;
use apex_core::source_analysis::{
    ErrorCollector, ParseOptions, Parser, SyntaxError, parse_compilation_unit, parse_expression,
    parse_query, parse_source, parse_statement, parse_trigger_unit,
};

// ============================================================================
// Helpers
// ============================================================================

fn cases_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("cases")
}

/// Reads every test case, sorted by file name.
fn read_cases() -> Vec<(String, String)> {
    let dir = cases_dir();
    let mut cases: Vec<_> = fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", dir.display()))
        .map(|entry| {
            let path = entry.expect("directory entry").path();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let source = fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
            (name, source)
        })
        .collect();
    cases.sort();
    cases
}

fn messages(errors: &[SyntaxError]) -> Vec<String> {
    errors.iter().map(|e| e.message.to_string()).collect()
}

fn statement_ok(source: &str) -> Statement {
    let (statement, errors) = parse_statement(source);
    assert!(
        errors.is_empty(),
        "unexpected errors for {source:?}: {:?}",
        messages(&errors)
    );
    statement
}

fn expression_ok(source: &str) -> Expression {
    let (expression, errors) = parse_expression(source);
    assert!(
        errors.is_empty(),
        "unexpected errors for {source:?}: {:?}",
        messages(&errors)
    );
    expression
}

/// Parses `WHERE field <op> value` and returns the value.
fn where_value(condition: &str) -> QueryValue {
    let source = format!("SELECT Id FROM Opportunity WHERE {condition}");
    let (query, errors) = parse_query(&source);
    assert!(
        errors.is_empty(),
        "unexpected errors for {source:?}: {:?}",
        messages(&errors)
    );
    match query.where_clause {
        Some(Condition::Comparison(comparison)) => comparison.value,
        other => panic!("expected a comparison, got {other:?}"),
    }
}

// ============================================================================
// Corpus
// ============================================================================

#[test]
fn corpus_parses_without_errors() {
    let cases = read_cases();
    assert!(cases.len() >= 4, "expected test cases in {}", cases_dir().display());
    for (name, source) in &cases {
        let (unit, errors) = parse_source(source);
        assert!(
            errors.is_empty(),
            "{name}: unexpected errors {:?}",
            messages(&errors)
        );
        let expected = if name.ends_with(".trigger") {
            "trigger unit"
        } else {
            "compilation unit"
        };
        assert_eq!(unit.kind_name(), expected, "{name}");
    }
}

#[test]
fn corpus_truncations_recover() {
    for (name, source) in read_cases() {
        let mut cut = 0;
        while cut < source.len() {
            let end = (0..=cut).rev().find(|&i| source.is_char_boundary(i)).unwrap_or(0);
            let prefix = &source[..end];
            let (unit, errors) = parse_source(prefix);
            let len = u32::try_from(prefix.len()).expect("small input");
            assert!(unit.span().end() <= len, "{name} cut at {cut}");
            for error in &errors {
                assert!(error.span.end() <= len, "{name} cut at {cut}: {error:?}");
            }
            cut += 37;
        }
    }
}

#[test]
fn corpus_parses_identically_across_threads() {
    let cases = read_cases();
    let sequential: Vec<_> = cases.iter().map(|(_, source)| parse_source(source)).collect();
    let parallel: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = cases
            .iter()
            .map(|(_, source)| scope.spawn(move || parse_source(source)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("parse thread panicked"))
            .collect()
    });
    assert_eq!(sequential, parallel);
}

#[test]
fn corpus_query_binds_are_walked() {
    let cases = read_cases();
    let (_, source) = cases
        .iter()
        .find(|(name, _)| name == "account_service.cls")
        .expect("account_service.cls");
    let (unit, _) = parse_source(source);
    let mut queries = 0;
    let mut identifiers = Vec::new();
    walk_expressions(&unit, |expression| match expression {
        Expression::Query(_) => queries += 1,
        Expression::Identifier(identifier) => identifiers.push(identifier.name.to_string()),
        _ => {}
    });
    assert_eq!(queries, 2);
    for bound in ["pattern", "MAX_RESULTS", "ids"] {
        assert!(identifiers.iter().any(|name| name == bound), "missing {bound}");
    }
}

// ============================================================================
// Documented scenarios
// ============================================================================

#[test]
fn boolean_literal() {
    let expression = expression_ok("true");
    assert!(matches!(expression, Expression::Literal(Literal::Boolean(true), _)));
}

#[test]
fn multiplication_has_two_operands() {
    let Expression::Binary {
        left,
        operator,
        right,
        ..
    } = expression_ok("a * 5")
    else {
        panic!("expected a binary expression");
    };
    assert_eq!(operator, BinaryOperator::Multiply);
    assert_eq!(left.kind_name(), "identifier");
    assert_eq!(right.kind_name(), "literal");
}

#[test]
fn keywords_are_case_insensitive() {
    let (lower, lower_errors) = parse_compilation_unit("public class Hello {}");
    let (mixed, mixed_errors) = parse_compilation_unit("Public CLASS Hello {}");
    assert!(lower_errors.is_empty() && mixed_errors.is_empty());
    assert_eq!(lower, mixed);
}

#[test]
fn unterminated_class_is_one_error() {
    let (unit, errors) = parse_compilation_unit("public class Hello {");
    assert_eq!(messages(&errors), vec!["expected '}', found end of input"]);
    assert_eq!(unit.types.len(), 1);
    assert_eq!(unit.types[0].name().map(|n| n.name.as_str()), Some("Hello"));
}

#[test]
fn query_literal_as_initializer() {
    let (unit, errors) = parse_compilation_unit(
        "public class A { void m() { List<Account> accounts = [Select Id from Accounts]; } }",
    );
    assert!(errors.is_empty(), "{:?}", messages(&errors));
    let TypeDeclaration::Class(class) = &unit.types[0] else {
        panic!("expected class");
    };
    let ClassMember::Method(method) = &class.members[0] else {
        panic!("expected method");
    };
    let body = method.body.as_ref().expect("method body");
    let Statement::LocalVariable(local) = &body.statements[0] else {
        panic!("expected local variable");
    };
    let initializer = local.declarators[0].initializer.as_ref();
    assert_eq!(initializer.map(Expression::kind_name), Some("query"));
}

#[test]
fn trigger_with_two_cases() {
    let (unit, errors) =
        parse_trigger_unit("trigger test on Account (before update, after update) {}");
    assert!(errors.is_empty(), "{:?}", messages(&errors));
    assert_eq!(unit.name.name, "test");
    assert_eq!(unit.object.name, "Account");
    assert_eq!(unit.cases.len(), 2);
}

#[test]
fn empty_loop_bodies() {
    assert_eq!(statement_ok("while (x++ < 10 && !(y-- < 0));").kind_name(), "while");
    assert_eq!(statement_ok("for(x=0; x<10; x++);").kind_name(), "for");
}

#[test]
fn bare_semicolon_in_if_arm() {
    let (statement, errors) = parse_statement("if (x == 3); else { ; }");
    assert_eq!(errors.len(), 1);
    assert_eq!(statement.kind_name(), "if");
}

#[test]
fn switch_with_grouped_patterns() {
    statement_ok("switch on (x) { when 1 { a(); } when ((2)) { b(); } when (3), (4) { c(); } }");
}

#[test]
fn switch_with_sign_chains() {
    statement_ok("switch on (x) { when -1 { a(); } when (+2l) { b(); } when -+-3 { c(); } }");
}

#[test]
fn query_modes() {
    for (source, mode) in [
        ("SELECT Id FROM Account WITH USER_MODE", QueryMode::UserMode),
        ("SELECT Id FROM Account WITH SYSTEM_MODE", QueryMode::SystemMode),
        ("select id from account with security_enforced", QueryMode::SecurityEnforced),
    ] {
        let (query, errors) = parse_query(source);
        assert!(errors.is_empty(), "{source}: {:?}", messages(&errors));
        assert!(
            matches!(query.with, Some(WithClause::Mode(m, _)) if m == mode),
            "{source}"
        );
    }
}

#[test]
fn dml_access_levels() {
    for (source, level) in [
        ("insert as USER contact;", AccessLevel::User),
        ("insert as SYSTEM contact;", AccessLevel::System),
        ("Update As user contacts;", AccessLevel::User),
    ] {
        let Statement::Dml(statement) = statement_ok(source) else {
            panic!("expected dml for {source}");
        };
        assert_eq!(statement.access_level, Some(level), "{source}");
        assert_eq!(statement.target.kind_name(), "identifier");
    }
    let Statement::Dml(statement) = statement_ok("insert contact;") else {
        panic!("expected dml");
    };
    assert_eq!(statement.access_level, None);
}

#[test]
fn mode_words_remain_identifiers() {
    assert_eq!(statement_ok("Integer user = 1;").kind_name(), "local variable");
    assert_eq!(statement_ok("Boolean system = true;").kind_name(), "local variable");
    assert_eq!(statement_ok("USER_MODE = SYSTEM_MODE;").kind_name(), "expression statement");
    assert_eq!(statement_ok("as = user + system;").kind_name(), "expression statement");
    let (unit, errors) = parse_compilation_unit("class Sharing { String with; Integer on; }");
    assert!(errors.is_empty(), "{:?}", messages(&errors));
    assert_eq!(unit.types[0].name().map(|n| n.name.as_str()), Some("Sharing"));
}

#[test]
fn reparsing_is_deterministic() {
    let source = "public class A { Integer x = ; void m() { if (a) { b( } } }";
    let first = parse_source(source);
    let second = parse_source(source);
    assert!(!first.1.is_empty());
    assert_eq!(first, second);
}

#[test]
fn long_chains_are_capped_and_dropped() {
    let source = format!("x = {}1;", "a +\n".repeat(50_000));
    let (statement, errors) = parse_statement(&source);
    assert_eq!(messages(&errors), vec!["nesting is too deep (maximum 64 levels)"]);
    assert_eq!(statement.kind_name(), "expression statement");
    assert_eq!(statement.clone(), statement);
    drop(statement);

    let source = format!("x = a{};", ".next()".repeat(50_000));
    let (statement, errors) = parse_statement(&source);
    assert_eq!(errors.len(), 1);
    drop(statement);
}

#[test]
fn soft_keywords_name_locals() {
    assert_eq!(statement_ok("Integer switch = 1;").kind_name(), "local variable");
    assert_eq!(statement_ok("Integer trigger = 1;").kind_name(), "local variable");
    assert_eq!(statement_ok("for (Account trigger : xs) {}").kind_name(), "for");
}

// ============================================================================
// Query values
// ============================================================================

#[test]
fn currency_values() {
    let QueryValue::Currency { code, amount, .. } = where_value("Amount > USD100.01") else {
        panic!("expected currency");
    };
    assert_eq!((code.as_str(), amount.as_str()), ("USD", "100.01"));
    let QueryValue::Currency { code, amount, .. } = where_value("Amount = JPY5000") else {
        panic!("expected currency");
    };
    assert_eq!((code.as_str(), amount.as_str()), ("JPY", "5000"));
}

#[test]
fn usd_prefix_outside_query_is_a_name() {
    let Statement::Expression { expression, .. } = statement_ok("USD100.name = 'name';") else {
        panic!("expected expression statement");
    };
    let Expression::Assignment { target, .. } = expression else {
        panic!("expected assignment");
    };
    assert_eq!(target.kind_name(), "field access");
}

#[test]
fn date_values_and_formulas() {
    assert!(matches!(where_value("CloseDate = 2024-01-31"), QueryValue::Date(..)));
    assert!(matches!(
        where_value("CreatedDate > 2024-01-31T10:00:00Z"),
        QueryValue::DateTime(..)
    ));
    let QueryValue::DateFormula { name, argument, .. } = where_value("CloseDate = THIS_QUARTER")
    else {
        panic!("expected date formula");
    };
    assert_eq!((name.name.as_str(), argument), ("THIS_QUARTER", None));
    let QueryValue::DateFormula { argument, .. } = where_value("CloseDate = NEXT_N_DAYS:7") else {
        panic!("expected date formula");
    };
    assert_eq!(argument.as_deref(), Some("7"));
}

#[test]
fn negative_numbers() {
    let QueryValue::Number { value, negative, .. } = where_value("Amount > -100.5") else {
        panic!("expected number");
    };
    assert!(negative);
    assert_eq!(value, "100.5");

    let Expression::Unary { operator, operand, .. } = expression_ok("-42") else {
        panic!("expected unary minus outside queries");
    };
    assert_eq!(operator, UnaryOperator::Minus);
    assert!(matches!(*operand, Expression::Literal(Literal::Integer(_), _)));
}

#[test]
fn explicitly_positive_numbers() {
    let QueryValue::Number { value, negative, .. } = where_value("Amount = +5") else {
        panic!("expected number");
    };
    assert!(!negative);
    assert_eq!(value, "5");
}

#[test]
fn subqueries_in_select_and_where() {
    let (query, errors) = parse_query(
        "SELECT Id, (SELECT Id FROM Contacts) FROM Account \
         WHERE Id IN (SELECT AccountId FROM Opportunity WHERE IsWon = true)",
    );
    assert!(errors.is_empty(), "{:?}", messages(&errors));
    assert_eq!(query.select[1].kind_name(), "subquery");
    let Some(Condition::Comparison(comparison)) = query.where_clause else {
        panic!("expected comparison");
    };
    assert_eq!(comparison.operator, ComparisonOperator::In);
    assert!(matches!(comparison.field, FieldExpression::Path(_)));
    assert!(matches!(comparison.value, QueryValue::Subquery(_)));
}

#[test]
fn query_errors_do_not_escape_brackets() {
    let (unit, errors) = parse_source(
        "class A { void m() { x = [SELECT FROM WHERE]; y = 1; } void n() {} }",
    );
    assert!(!errors.is_empty());
    let SourceUnit::Compilation(unit) = unit else {
        panic!("expected compilation unit");
    };
    let TypeDeclaration::Class(class) = &unit.types[0] else {
        panic!("expected class");
    };
    assert_eq!(class.members.len(), 2);
}

// ============================================================================
// Error listener
// ============================================================================

#[test]
fn listener_counts_match_returned_errors() {
    let source = "class A { Integer x = ; void m( { } }";
    let mut parser = Parser::with_listener(source, ParseOptions::default(), ErrorCollector::new());
    let _unit = parser.parse_source_unit();
    let count = parser.error_count();
    let collector = parser.finish();
    assert!(count > 0);
    assert_eq!(collector.error_count(), count);
    assert_eq!(collector.errors().len(), count);
    assert_eq!(collector.into_errors(), parse_source(source).1);
}

#[test]
fn listeners_are_independent_per_parse() {
    let mut first = Vec::new();
    let mut parser = Parser::with_listener(
        "Integer x = ;",
        ParseOptions::default(),
        |error: &SyntaxError| first.push(error.clone()),
    );
    let _statement = parser.parse_statement_fragment();
    drop(parser);

    let mut second = Vec::new();
    let mut parser = Parser::with_listener(
        "Integer y = 2;",
        ParseOptions::default(),
        |error: &SyntaxError| second.push(error.clone()),
    );
    let _statement = parser.parse_statement_fragment();
    drop(parser);

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
}

#[test]
fn error_limit_caps_recorded_errors() {
    let source = "class A { Integer a = ; Integer b = ; Integer c = ; Integer d = ; }";
    let (_, all) = parse_source(source);
    assert!(all.len() >= 4);
    let options = ParseOptions::new().with_error_limit(Some(2));
    let (_, limited) = apex_core::source_analysis::parse_source_with_options(source, options);
    assert_eq!(limited, all[..2]);
}
