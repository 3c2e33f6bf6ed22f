// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Shared AST expression walker.
//!
//! Provides the traversal every tree consumer would otherwise hand-roll:
//!
//! - [`for_each_child_expression`] calls a closure on each direct child
//!   expression of one node, including `:bind` expressions inside queries.
//! - [`walk_expression`] is a pre-order walk of one expression tree.
//! - [`walk_statement`], [`walk_type_declaration`] and [`walk_expressions`]
//!   reach every expression under a statement, a declaration or a whole
//!   source unit, including annotation values and field initializers.
//!
//! The expression walk keeps its own stack, so arbitrarily deep trees do not
//! grow the call stack.

use crate::ast::{
    Annotation, AnnotationArguments, Block, ClassMember, Condition, Creator, DmlOperation,
    ElementValue, Expression, FieldExpression, ForControl, ForInit, FunctionArgument,
    FunctionCall, LocalVariableDeclaration, LoopBody, Modifier, Modifiers, Query, QueryBound,
    QueryValue, Search, SearchTerm, SearchWith, SelectEntry, SourceUnit, Statement,
    TypeDeclaration, WhenValue, WithClause,
};

// ── Expression walker ─────────────────────────────────────────────────────────

/// Calls `f` on each direct child expression of `expression`, in source order.
///
/// For query and search literals the children are their `:bind` expressions,
/// including those inside subqueries.
pub fn for_each_child_expression<'a, F>(expression: &'a Expression, mut f: F)
where
    F: FnMut(&'a Expression),
{
    match expression {
        Expression::FieldAccess { receiver, .. } => f(receiver),
        Expression::MethodCall {
            receiver,
            arguments,
            ..
        } => {
            if let Some(receiver) = receiver {
                f(receiver);
            }
            arguments.iter().for_each(f);
        }
        Expression::ArrayAccess { array, index, .. } => {
            f(array);
            f(index);
        }
        Expression::New { creator, .. } => match creator {
            Creator::Class { arguments, .. } => arguments.iter().for_each(f),
            Creator::Array { size, .. } => f(size),
            Creator::ArrayInitializer { elements, .. } | Creator::Collection { elements, .. } => {
                elements.iter().for_each(f);
            }
            Creator::Map { entries, .. } => {
                for entry in entries {
                    f(&entry.key);
                    f(&entry.value);
                }
            }
        },
        Expression::Unary { operand, .. } | Expression::Postfix { operand, .. } => f(operand),
        Expression::Binary { left, right, .. } => {
            f(left);
            f(right);
        }
        Expression::Assignment { target, value, .. } => {
            f(target);
            f(value);
        }
        Expression::Ternary {
            condition,
            then_value,
            else_value,
            ..
        } => {
            f(condition);
            f(then_value);
            f(else_value);
        }
        Expression::Cast { expression, .. }
        | Expression::InstanceOf { expression, .. }
        | Expression::Parenthesized { expression, .. } => f(expression),
        Expression::Query(query) => query_binds(query, &mut f),
        Expression::Search(search) => search_binds(search, &mut f),
        Expression::Literal(..)
        | Expression::Identifier(_)
        | Expression::This(_)
        | Expression::Super(_)
        | Expression::ClassLiteral { .. }
        | Expression::Error { .. } => {}
    }
}

/// Walks an expression tree in pre-order, calling `f` on every node.
pub fn walk_expression<F>(root: &Expression, f: &mut F)
where
    F: FnMut(&Expression),
{
    let mut stack = vec![root];
    while let Some(expression) = stack.pop() {
        f(expression);
        let first_child = stack.len();
        for_each_child_expression(expression, |child| stack.push(child));
        stack[first_child..].reverse();
    }
}

// ── Query binds ───────────────────────────────────────────────────────────────

fn query_binds<'a, F>(query: &'a Query, f: &mut F)
where
    F: FnMut(&'a Expression),
{
    for entry in &query.select {
        match entry {
            SelectEntry::Function { call, .. } => function_binds(call, f),
            SelectEntry::Subquery(subquery) => query_binds(subquery, f),
            SelectEntry::Field { .. } | SelectEntry::TypeOf(_) => {}
        }
    }
    if let Some(condition) = &query.where_clause {
        condition_binds(condition, f);
    }
    if let Some(WithClause::Filter(condition)) = &query.with {
        condition_binds(condition, f);
    }
    if let Some(condition) = &query.having {
        condition_binds(condition, f);
    }
    bound_binds(query.limit.as_ref(), f);
    bound_binds(query.offset.as_ref(), f);
}

fn search_binds<'a, F>(search: &'a Search, f: &mut F)
where
    F: FnMut(&'a Expression),
{
    if let SearchTerm::Bind(bind) = &search.term {
        f(&bind.expression);
    }
    for returning in &search.returning {
        if let Some(condition) = &returning.where_clause {
            condition_binds(condition, f);
        }
        bound_binds(returning.limit.as_ref(), f);
        bound_binds(returning.offset.as_ref(), f);
    }
    for with in &search.with {
        if let SearchWith::Option(option) = with {
            if let Some(value) = &option.value {
                value_binds(value, f);
            }
            for parameter in &option.parameters {
                value_binds(&parameter.value, f);
            }
        }
    }
    bound_binds(search.limit.as_ref(), f);
}

fn condition_binds<'a, F>(condition: &'a Condition, f: &mut F)
where
    F: FnMut(&'a Expression),
{
    match condition {
        Condition::And { operands, .. } | Condition::Or { operands, .. } => {
            for operand in operands {
                condition_binds(operand, f);
            }
        }
        Condition::Not { operand, .. } => condition_binds(operand, f),
        Condition::Parenthesized { condition, .. } => condition_binds(condition, f),
        Condition::Comparison(comparison) => {
            if let FieldExpression::Function(call) = &comparison.field {
                function_binds(call, f);
            }
            value_binds(&comparison.value, f);
        }
        Condition::Error { .. } => {}
    }
}

fn function_binds<'a, F>(call: &'a FunctionCall, f: &mut F)
where
    F: FnMut(&'a Expression),
{
    for argument in &call.arguments {
        match argument {
            FunctionArgument::Function(inner) => function_binds(inner, f),
            FunctionArgument::Value(value) => value_binds(value, f),
            FunctionArgument::Field(_) => {}
        }
    }
}

fn value_binds<'a, F>(value: &'a QueryValue, f: &mut F)
where
    F: FnMut(&'a Expression),
{
    match value {
        QueryValue::Bind(bind) => f(&bind.expression),
        QueryValue::List { values, .. } => {
            for value in values {
                value_binds(value, f);
            }
        }
        QueryValue::Subquery(query) => query_binds(query, f),
        _ => {}
    }
}

fn bound_binds<'a, F>(bound: Option<&'a QueryBound>, f: &mut F)
where
    F: FnMut(&'a Expression),
{
    if let Some(QueryBound::Bind(bind)) = bound {
        f(&bind.expression);
    }
}

// ── Statements and declarations ───────────────────────────────────────────────

/// Walks every expression in a source unit in pre-order.
pub fn walk_expressions<F>(unit: &SourceUnit, mut f: F)
where
    F: FnMut(&Expression),
{
    match unit {
        SourceUnit::Compilation(compilation) => {
            for declaration in &compilation.types {
                walk_type_declaration(declaration, &mut f);
            }
        }
        SourceUnit::Trigger(trigger) => walk_block(&trigger.body, &mut f),
    }
}

/// Walks every expression in a type declaration, its members and their
/// annotations.
pub fn walk_type_declaration<F>(declaration: &TypeDeclaration, f: &mut F)
where
    F: FnMut(&Expression),
{
    match declaration {
        TypeDeclaration::Class(class) => {
            walk_modifiers(&class.modifiers, f);
            for member in &class.members {
                walk_member(member, f);
            }
        }
        TypeDeclaration::Interface(interface) => {
            walk_modifiers(&interface.modifiers, f);
            for method in &interface.methods {
                walk_modifiers(&method.modifiers, f);
            }
        }
        TypeDeclaration::Enum(declaration) => walk_modifiers(&declaration.modifiers, f),
        TypeDeclaration::Error { .. } => {}
    }
}

fn walk_member<F>(member: &ClassMember, f: &mut F)
where
    F: FnMut(&Expression),
{
    match member {
        ClassMember::Field(field) => {
            walk_modifiers(&field.modifiers, f);
            for declarator in &field.declarators {
                if let Some(initializer) = &declarator.initializer {
                    walk_expression(initializer, f);
                }
            }
        }
        ClassMember::Method(method) => {
            walk_modifiers(&method.modifiers, f);
            for parameter in &method.parameters {
                walk_modifiers(&parameter.modifiers, f);
            }
            if let Some(body) = &method.body {
                walk_block(body, f);
            }
        }
        ClassMember::Constructor(constructor) => {
            walk_modifiers(&constructor.modifiers, f);
            walk_block(&constructor.body, f);
        }
        ClassMember::Property(property) => {
            walk_modifiers(&property.modifiers, f);
            for accessor in &property.accessors {
                if let Some(body) = &accessor.body {
                    walk_block(body, f);
                }
            }
        }
        ClassMember::Initializer(initializer) => walk_block(&initializer.body, f),
        ClassMember::Type(declaration) => walk_type_declaration(declaration, f),
        ClassMember::Error { .. } => {}
    }
}

fn walk_modifiers<F>(modifiers: &Modifiers, f: &mut F)
where
    F: FnMut(&Expression),
{
    for modifier in &modifiers.items {
        if let Modifier::Annotation(annotation) = modifier {
            walk_annotation(annotation, f);
        }
    }
}

fn walk_annotation<F>(annotation: &Annotation, f: &mut F)
where
    F: FnMut(&Expression),
{
    match &annotation.arguments {
        AnnotationArguments::None => {}
        AnnotationArguments::Value(value) => walk_element_value(value, f),
        AnnotationArguments::Pairs(pairs) => {
            for pair in pairs {
                walk_element_value(&pair.value, f);
            }
        }
    }
}

fn walk_element_value<F>(value: &ElementValue, f: &mut F)
where
    F: FnMut(&Expression),
{
    match value {
        ElementValue::Expression(expression) => walk_expression(expression, f),
        ElementValue::Annotation(annotation) => walk_annotation(annotation, f),
        ElementValue::Array { values, .. } => {
            for value in values {
                walk_element_value(value, f);
            }
        }
    }
}

/// Walks every expression in a block.
pub fn walk_block<F>(block: &Block, f: &mut F)
where
    F: FnMut(&Expression),
{
    for statement in &block.statements {
        walk_statement(statement, f);
    }
}

fn walk_local_variable<F>(declaration: &LocalVariableDeclaration, f: &mut F)
where
    F: FnMut(&Expression),
{
    walk_modifiers(&declaration.modifiers, f);
    for declarator in &declaration.declarators {
        if let Some(initializer) = &declarator.initializer {
            walk_expression(initializer, f);
        }
    }
}

fn walk_loop_body<F>(body: &LoopBody, f: &mut F)
where
    F: FnMut(&Expression),
{
    if let LoopBody::Statement(statement) = body {
        walk_statement(statement, f);
    }
}

/// Walks every expression in a statement and its nested statements.
pub fn walk_statement<F>(statement: &Statement, f: &mut F)
where
    F: FnMut(&Expression),
{
    match statement {
        Statement::Block(block) => walk_block(block, f),
        Statement::LocalVariable(declaration) => walk_local_variable(declaration, f),
        Statement::Expression { expression, .. } => walk_expression(expression, f),
        Statement::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            walk_expression(condition, f);
            walk_statement(then_branch, f);
            if let Some(else_branch) = else_branch {
                walk_statement(else_branch, f);
            }
        }
        Statement::Switch(switch) => {
            walk_expression(&switch.subject, f);
            for when in &switch.whens {
                if let WhenValue::Literals(literals) = &when.value {
                    for literal in literals {
                        walk_expression(&literal.expression, f);
                    }
                }
                walk_block(&when.body, f);
            }
        }
        Statement::For { control, body, .. } => {
            match control {
                ForControl::Enhanced { iterable, .. } => walk_expression(iterable, f),
                ForControl::Basic {
                    init,
                    condition,
                    updates,
                    ..
                } => {
                    match init {
                        Some(ForInit::Variables(declaration)) => {
                            walk_local_variable(declaration, f);
                        }
                        Some(ForInit::Expressions(expressions)) => {
                            for expression in expressions {
                                walk_expression(expression, f);
                            }
                        }
                        None => {}
                    }
                    if let Some(condition) = condition {
                        walk_expression(condition, f);
                    }
                    for update in updates {
                        walk_expression(update, f);
                    }
                }
            }
            walk_loop_body(body, f);
        }
        Statement::While {
            condition, body, ..
        } => {
            walk_expression(condition, f);
            walk_loop_body(body, f);
        }
        Statement::DoWhile {
            body, condition, ..
        } => {
            walk_block(body, f);
            walk_expression(condition, f);
        }
        Statement::Try(statement) => {
            walk_block(&statement.body, f);
            for catch in &statement.catches {
                walk_block(&catch.body, f);
            }
            if let Some(finally) = &statement.finally {
                walk_block(finally, f);
            }
        }
        Statement::Return { value, .. } => {
            if let Some(value) = value {
                walk_expression(value, f);
            }
        }
        Statement::Throw { value, .. } => walk_expression(value, f),
        Statement::Dml(dml) => {
            walk_expression(&dml.target, f);
            if let DmlOperation::Merge { duplicates } = &dml.operation {
                walk_expression(duplicates, f);
            }
        }
        Statement::RunAs {
            arguments, body, ..
        } => {
            for argument in arguments {
                walk_expression(argument, f);
            }
            walk_block(body, f);
        }
        Statement::Break { .. } | Statement::Continue { .. } | Statement::Error { .. } => {}
    }
}
