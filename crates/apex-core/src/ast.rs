// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Abstract Syntax Tree (AST) definitions for Apex.
//!
//! The AST represents the structure of a source unit after parsing. Every
//! node carries a [`Span`] for error reporting and tooling.
//!
//! # Design Philosophy
//!
//! - **All nodes have spans** - a child's span always lies inside its parent's
//! - **Error recovery** - the parser produces partial trees with `Error`
//!   variants ([`Expression::Error`], [`Statement::Error`], ...) in place of
//!   constructs it could not recognise
//! - **Tagged variants** - every grammar rule with alternatives is an enum,
//!   so consumers match exhaustively
//! - **Write once** - there is no mutation API; trees are plain owned data,
//!   `Send + Sync`, and compare with `==`
//!
//! # Example
//!
//! ```
//! use apex_core::ast::{BinaryOperator, Expression};
//! use apex_core::source_analysis::parse_expression;
//!
//! let (expr, errors) = parse_expression("a * 5");
//! assert!(errors.is_empty());
//! let Expression::Binary { left, operator, right, .. } = expr else {
//!     panic!("expected a binary expression");
//! };
//! assert_eq!(operator, BinaryOperator::Multiply);
//! assert_eq!(left.kind_name(), "identifier");
//! assert_eq!(right.kind_name(), "literal");
//! ```

mod query;

pub use query::{
    BindExpression, Comparison, ComparisonOperator, Condition, DataCategoryFilter, FieldExpression,
    FieldPath, ForKind, FromEntry, FunctionArgument, FunctionCall, GroupBy, GroupByKind, NullsOrder,
    OrderItem, Query, QueryBound, QueryMode, QueryValue, Search, SearchOption, SearchParameter,
    SearchReturning, SearchTerm, SearchWith, SelectEntry, SortDirection, TypeOfClause, TypeOfWhen,
    UpdateKind, WithClause,
};

use crate::source_analysis::Span;
use ecow::EcoString;

// ============================================================================
// Names and types
// ============================================================================

/// A simple name with its location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// The name exactly as written.
    pub name: EcoString,
    /// Source location.
    pub span: Span,
}

impl Identifier {
    /// Creates a new identifier.
    #[must_use]
    pub fn new(name: impl Into<EcoString>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    /// Compares the name against `other`, ignoring ASCII case.
    #[must_use]
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }
}

/// A dotted name such as `Schema.SObjectType` or an annotation name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// The dot-separated parts, never empty.
    pub parts: Vec<Identifier>,
    /// Source location.
    pub span: Span,
}

impl QualifiedName {
    /// Returns the parts joined with `.`.
    #[must_use]
    pub fn dotted(&self) -> EcoString {
        join_names(self.parts.iter())
    }
}

/// A type reference: `Integer`, `Map<Id, List<Account>>`, `Outer.Inner[]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// The dot-separated segments, each with optional type arguments.
    pub segments: Vec<TypeSegment>,
    /// Number of trailing `[]` pairs.
    pub array_dimensions: u8,
    /// Source location.
    pub span: Span,
}

impl TypeRef {
    /// Returns the dotted name without type arguments.
    #[must_use]
    pub fn qualified_name(&self) -> EcoString {
        join_names(self.segments.iter().map(|segment| &segment.name))
    }

    /// Returns true for `void`.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.array_dimensions == 0
            && self.segments.len() == 1
            && self.segments[0].name.eq_ignore_case("void")
    }

    /// Returns true for array types.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.array_dimensions > 0
    }

    /// Returns the type arguments of the last segment.
    #[must_use]
    pub fn type_arguments(&self) -> &[TypeRef] {
        self.segments
            .last()
            .map_or(&[], |segment| segment.arguments.as_slice())
    }
}

/// One segment of a [`TypeRef`]: a name with optional type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSegment {
    /// The segment name.
    pub name: Identifier,
    /// Type arguments between `<` and `>`.
    pub arguments: Vec<TypeRef>,
    /// Source location.
    pub span: Span,
}

fn join_names<'a>(names: impl Iterator<Item = &'a Identifier>) -> EcoString {
    let mut joined = EcoString::new();
    for (i, name) in names.enumerate() {
        if i > 0 {
            joined.push('.');
        }
        joined.push_str(&name.name);
    }
    joined
}

// ============================================================================
// Modifiers and annotations
// ============================================================================

/// A keyword modifier on a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKeyword {
    Public,
    Private,
    Protected,
    Global,
    Abstract,
    Final,
    Static,
    Virtual,
    Override,
    Transient,
    TestMethod,
    WebService,
}

/// The sharing mode of a class: `with sharing` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharingMode {
    With,
    Without,
    Inherited,
}

/// A modifier preceding a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    /// `@IsTest(SeeAllData=true)`
    Annotation(Annotation),
    /// `public`, `static`, `testMethod`, ...
    Keyword {
        /// Which modifier.
        keyword: ModifierKeyword,
        /// Source location.
        span: Span,
    },
    /// `with sharing`, `without sharing`, `inherited sharing`
    Sharing {
        /// Which mode.
        mode: SharingMode,
        /// Source location covering both words.
        span: Span,
    },
}

impl Modifier {
    /// Returns the span of this modifier.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Annotation(annotation) => annotation.span,
            Self::Keyword { span, .. } | Self::Sharing { span, .. } => *span,
        }
    }
}

/// The ordered modifiers of a declaration; may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Modifiers in source order.
    pub items: Vec<Modifier>,
}

impl Modifiers {
    /// Returns true if no modifiers were written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if the keyword modifier is present.
    #[must_use]
    pub fn has(&self, keyword: ModifierKeyword) -> bool {
        self.items
            .iter()
            .any(|m| matches!(m, Modifier::Keyword { keyword: k, .. } if *k == keyword))
    }

    /// Iterates the annotations.
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.items.iter().filter_map(|m| match m {
            Modifier::Annotation(annotation) => Some(annotation),
            _ => None,
        })
    }

    /// Returns the sharing mode, if declared.
    #[must_use]
    pub fn sharing(&self) -> Option<SharingMode> {
        self.items.iter().find_map(|m| match m {
            Modifier::Sharing { mode, .. } => Some(*mode),
            _ => None,
        })
    }

    /// Returns the span covering every modifier, or `None` when empty.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        let first = self.items.first()?.span();
        let last = self.items.last()?.span();
        Some(first.merge(last))
    }
}

/// An annotation: `@Name`, `@Name(value)` or `@Name(key=value ...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// The annotation name.
    pub name: QualifiedName,
    /// What appeared between the parentheses.
    pub arguments: AnnotationArguments,
    /// Source location including `@`.
    pub span: Span,
}

/// The parenthesised part of an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationArguments {
    /// No parentheses at all.
    None,
    /// A single unnamed value.
    Value(ElementValue),
    /// Named pairs, possibly zero of them: `()`.
    Pairs(Vec<ElementValuePair>),
}

/// `key=value` inside an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementValuePair {
    /// The element name.
    pub name: Identifier,
    /// The element value.
    pub value: ElementValue,
    /// Source location.
    pub span: Span,
}

/// The value of an annotation element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    /// Any expression, usually a literal.
    Expression(Expression),
    /// A nested annotation.
    Annotation(Box<Annotation>),
    /// `{a, b}`
    Array {
        /// The element values.
        values: Vec<ElementValue>,
        /// Source location including braces.
        span: Span,
    },
}

impl ElementValue {
    /// Returns the span of this value.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Expression(expression) => expression.span(),
            Self::Annotation(annotation) => annotation.span,
            Self::Array { span, .. } => *span,
        }
    }
}

// ============================================================================
// Source units and type declarations
// ============================================================================

/// The root of any parse: a compilation unit or a trigger unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceUnit {
    /// Class, interface, or enum declarations.
    Compilation(CompilationUnit),
    /// A trigger definition.
    Trigger(TriggerUnit),
}

impl SourceUnit {
    /// Returns the span of the unit.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Compilation(unit) => unit.span,
            Self::Trigger(unit) => unit.span,
        }
    }

    /// Returns the variant tag.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Compilation(_) => "compilation unit",
            Self::Trigger(_) => "trigger unit",
        }
    }
}

/// A source file declaring classes, interfaces or enums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    /// The top-level type declarations in source order.
    pub types: Vec<TypeDeclaration>,
    /// Source location spanning the entire unit.
    pub span: Span,
}

/// `trigger Name on Object (before insert, ...) { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerUnit {
    /// The trigger name.
    pub name: Identifier,
    /// The object the trigger is bound to.
    pub object: Identifier,
    /// The DML timing events, in source order.
    pub cases: Vec<TriggerCase>,
    /// The trigger body.
    pub body: Block,
    /// Source location spanning the entire unit.
    pub span: Span,
}

/// When a trigger fires relative to the DML operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerTiming {
    Before,
    After,
}

/// The DML operation a trigger case listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerOperation {
    Insert,
    Update,
    Delete,
    Undelete,
}

/// One `before update`-style event of a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerCase {
    /// Before or after.
    pub timing: TriggerTiming,
    /// Which DML operation.
    pub operation: TriggerOperation,
    /// Source location.
    pub span: Span,
}

/// A class, interface, or enum declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDeclaration {
    Class(ClassDeclaration),
    Interface(InterfaceDeclaration),
    Enum(EnumDeclaration),
    /// Tokens that could not be recognised as a declaration.
    Error {
        /// A description of what went wrong.
        message: EcoString,
        /// Source location of the erroneous code.
        span: Span,
    },
}

impl TypeDeclaration {
    /// Returns the span of this declaration.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Class(class) => class.span,
            Self::Interface(interface) => interface.span,
            Self::Enum(declaration) => declaration.span,
            Self::Error { span, .. } => *span,
        }
    }

    /// Returns the declared name, if the declaration was recognised.
    #[must_use]
    pub fn name(&self) -> Option<&Identifier> {
        match self {
            Self::Class(class) => Some(&class.name),
            Self::Interface(interface) => Some(&interface.name),
            Self::Enum(declaration) => Some(&declaration.name),
            Self::Error { .. } => None,
        }
    }

    /// Returns the variant tag.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Class(_) => "class",
            Self::Interface(_) => "interface",
            Self::Enum(_) => "enum",
            Self::Error { .. } => "error",
        }
    }
}

/// `class Name extends Base implements I1, I2 { members }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDeclaration {
    /// Modifiers and annotations.
    pub modifiers: Modifiers,
    /// The class name.
    pub name: Identifier,
    /// The superclass.
    pub extends: Option<TypeRef>,
    /// Implemented interfaces.
    pub implements: Vec<TypeRef>,
    /// Body declarations in source order.
    pub members: Vec<ClassMember>,
    /// Source location.
    pub span: Span,
}

/// `interface Name extends I1 { method signatures }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDeclaration {
    /// Modifiers and annotations.
    pub modifiers: Modifiers,
    /// The interface name.
    pub name: Identifier,
    /// Extended interfaces.
    pub extends: Vec<TypeRef>,
    /// Method signatures (bodies are always `None`).
    pub methods: Vec<MethodDeclaration>,
    /// Source location.
    pub span: Span,
}

/// `enum Season { WINTER, SPRING }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDeclaration {
    /// Modifiers and annotations.
    pub modifiers: Modifiers,
    /// The enum name.
    pub name: Identifier,
    /// The constants in source order.
    pub constants: Vec<Identifier>,
    /// Source location.
    pub span: Span,
}

/// A declaration inside a class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassMember {
    Field(FieldDeclaration),
    Method(MethodDeclaration),
    Constructor(ConstructorDeclaration),
    Property(PropertyDeclaration),
    Initializer(Initializer),
    /// An inner class, interface, or enum.
    Type(TypeDeclaration),
    /// Tokens that could not be recognised as a member.
    Error {
        /// A description of what went wrong.
        message: EcoString,
        /// Source location of the erroneous code.
        span: Span,
    },
}

impl ClassMember {
    /// Returns the span of this member.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Field(field) => field.span,
            Self::Method(method) => method.span,
            Self::Constructor(constructor) => constructor.span,
            Self::Property(property) => property.span,
            Self::Initializer(initializer) => initializer.span,
            Self::Type(declaration) => declaration.span(),
            Self::Error { span, .. } => *span,
        }
    }

    /// Returns the variant tag.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Field(_) => "field",
            Self::Method(_) => "method",
            Self::Constructor(_) => "constructor",
            Self::Property(_) => "property",
            Self::Initializer(_) => "initializer",
            Self::Type(_) => "inner type",
            Self::Error { .. } => "error",
        }
    }
}

/// `private Integer count = 0, limit;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    /// Modifiers and annotations.
    pub modifiers: Modifiers,
    /// The declared type.
    pub type_ref: TypeRef,
    /// One or more declared names.
    pub declarators: Vec<VariableDeclarator>,
    /// Source location.
    pub span: Span,
}

/// `name` or `name = initializer` in a field or local declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclarator {
    /// The declared name.
    pub name: Identifier,
    /// The initial value.
    pub initializer: Option<Expression>,
    /// Source location.
    pub span: Span,
}

/// A method declaration; `body` is `None` for abstract and interface methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDeclaration {
    /// Modifiers and annotations.
    pub modifiers: Modifiers,
    /// The return type, `void` included.
    pub return_type: TypeRef,
    /// The method name.
    pub name: Identifier,
    /// Formal parameters.
    pub parameters: Vec<Parameter>,
    /// The body.
    pub body: Option<Block>,
    /// Source location.
    pub span: Span,
}

/// A constructor declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDeclaration {
    /// Modifiers and annotations.
    pub modifiers: Modifiers,
    /// The constructor name (matches the class).
    pub name: QualifiedName,
    /// Formal parameters.
    pub parameters: Vec<Parameter>,
    /// The body.
    pub body: Block,
    /// Source location.
    pub span: Span,
}

/// A formal parameter: `final List<Account> accounts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Modifiers and annotations.
    pub modifiers: Modifiers,
    /// The parameter type.
    pub type_ref: TypeRef,
    /// The parameter name.
    pub name: Identifier,
    /// Source location.
    pub span: Span,
}

/// `public String Name { get; private set; }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDeclaration {
    /// Modifiers and annotations.
    pub modifiers: Modifiers,
    /// The property type.
    pub type_ref: TypeRef,
    /// The property name.
    pub name: Identifier,
    /// Accessors in source order.
    pub accessors: Vec<PropertyAccessor>,
    /// Source location.
    pub span: Span,
}

/// Which property accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    Get,
    Set,
}

/// A `get` or `set` accessor, with a body or `;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyAccessor {
    /// Modifiers on the accessor.
    pub modifiers: Modifiers,
    /// Get or set.
    pub kind: AccessorKind,
    /// The body; `None` for an automatic accessor.
    pub body: Option<Block>,
    /// Source location.
    pub span: Span,
}

/// `{ ... }` or `static { ... }` in a class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initializer {
    /// True for `static { ... }`.
    pub is_static: bool,
    /// The initializer block.
    pub body: Block,
    /// Source location.
    pub span: Span,
}

// ============================================================================
// Statements
// ============================================================================

/// `{ statements }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The statements in source order.
    pub statements: Vec<Statement>,
    /// Source location including braces.
    pub span: Span,
}

/// A statement.
///
/// A bare `;` is only legal as a loop body, where it is represented by
/// [`LoopBody::Empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// A nested block.
    Block(Block),

    /// `Type a = 1, b;`
    LocalVariable(LocalVariableDeclaration),

    /// An expression followed by `;`.
    Expression {
        /// The expression.
        expression: Expression,
        /// Source location including `;`.
        span: Span,
    },

    /// `if (condition) then else otherwise`
    If {
        /// The condition.
        condition: Expression,
        /// The statement run when true.
        then_branch: Box<Statement>,
        /// The statement run when false.
        else_branch: Option<Box<Statement>>,
        /// Source location.
        span: Span,
    },

    /// `switch on subject { when ... }`
    Switch(SwitchStatement),

    /// Basic or enhanced `for`.
    For {
        /// The loop header.
        control: ForControl,
        /// The loop body.
        body: LoopBody,
        /// Source location.
        span: Span,
    },

    /// `while (condition) body`
    While {
        /// The condition.
        condition: Expression,
        /// The loop body.
        body: LoopBody,
        /// Source location.
        span: Span,
    },

    /// `do { ... } while (condition);`
    DoWhile {
        /// The loop body.
        body: Block,
        /// The condition.
        condition: Expression,
        /// Source location.
        span: Span,
    },

    /// `try { } catch (E e) { } finally { }`
    Try(TryStatement),

    /// `return;` or `return value;`
    Return {
        /// The returned value.
        value: Option<Expression>,
        /// Source location.
        span: Span,
    },

    /// `throw value;`
    Throw {
        /// The thrown value.
        value: Expression,
        /// Source location.
        span: Span,
    },

    /// `break;`
    Break {
        /// Source location.
        span: Span,
    },

    /// `continue;`
    Continue {
        /// Source location.
        span: Span,
    },

    /// `insert as USER records;` and the other DML verbs.
    Dml(DmlStatement),

    /// `System.runAs(user) { ... }`
    RunAs {
        /// The arguments to `runAs`.
        arguments: Vec<Expression>,
        /// The block run as that user.
        body: Block,
        /// Source location.
        span: Span,
    },

    /// Tokens that could not be recognised as a statement.
    Error {
        /// A description of what went wrong.
        message: EcoString,
        /// Source location of the erroneous code.
        span: Span,
    },
}

impl Statement {
    /// Returns the span of this statement.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Block(block) => block.span,
            Self::LocalVariable(declaration) => declaration.span,
            Self::Switch(switch) => switch.span,
            Self::Try(statement) => statement.span,
            Self::Dml(statement) => statement.span,
            Self::Expression { span, .. }
            | Self::If { span, .. }
            | Self::For { span, .. }
            | Self::While { span, .. }
            | Self::DoWhile { span, .. }
            | Self::Return { span, .. }
            | Self::Throw { span, .. }
            | Self::Break { span }
            | Self::Continue { span }
            | Self::RunAs { span, .. }
            | Self::Error { span, .. } => *span,
        }
    }

    /// Returns true if this statement is an error node.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Returns the variant tag.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Block(_) => "block",
            Self::LocalVariable(_) => "local variable",
            Self::Expression { .. } => "expression statement",
            Self::If { .. } => "if",
            Self::Switch(_) => "switch",
            Self::For { .. } => "for",
            Self::While { .. } => "while",
            Self::DoWhile { .. } => "do-while",
            Self::Try(_) => "try",
            Self::Return { .. } => "return",
            Self::Throw { .. } => "throw",
            Self::Break { .. } => "break",
            Self::Continue { .. } => "continue",
            Self::Dml(_) => "dml",
            Self::RunAs { .. } => "run-as",
            Self::Error { .. } => "error",
        }
    }
}

/// The body of a `while` or `for` loop.
///
/// Loops are the one place a bare `;` is a legal statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopBody {
    /// `while (x++ < 10);`
    Empty(Span),
    /// Any other statement.
    Statement(Box<Statement>),
}

impl LoopBody {
    /// Returns the span of the body.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Empty(span) => *span,
            Self::Statement(statement) => statement.span(),
        }
    }
}

/// `final Type a = 1, b;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableDeclaration {
    /// `final` and annotations.
    pub modifiers: Modifiers,
    /// The declared type.
    pub type_ref: TypeRef,
    /// One or more declared names.
    pub declarators: Vec<VariableDeclarator>,
    /// Source location.
    pub span: Span,
}

/// The parenthesised header of a `for` loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForControl {
    /// `for (Account a : accounts)`
    Enhanced {
        /// The loop variable type.
        type_ref: TypeRef,
        /// The loop variable.
        name: Identifier,
        /// The collection or query iterated.
        iterable: Expression,
        /// Source location inside the parentheses.
        span: Span,
    },
    /// `for (init; condition; updates)`
    Basic {
        /// The initializer.
        init: Option<ForInit>,
        /// The condition.
        condition: Option<Expression>,
        /// The update expressions.
        updates: Vec<Expression>,
        /// Source location inside the parentheses.
        span: Span,
    },
}

impl ForControl {
    /// Returns the span of the header.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Enhanced { span, .. } | Self::Basic { span, .. } => *span,
        }
    }
}

/// The first clause of a basic `for`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForInit {
    /// `Integer i = 0`
    Variables(LocalVariableDeclaration),
    /// `i = 0, j = 1`
    Expressions(Vec<Expression>),
}

/// `switch on subject { when ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchStatement {
    /// The value switched on.
    pub subject: Expression,
    /// The `when` clauses in source order.
    pub whens: Vec<WhenClause>,
    /// Source location.
    pub span: Span,
}

/// `when value { body }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhenClause {
    /// What this clause matches.
    pub value: WhenValue,
    /// The clause body.
    pub body: Block,
    /// Source location.
    pub span: Span,
}

/// The pattern of a `when` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhenValue {
    /// `when else`
    Else(Span),
    /// `when 1, (2), -3`: every literal shares the body.
    Literals(Vec<WhenLiteral>),
    /// `when Account a`
    Type {
        /// The matched type.
        type_ref: TypeRef,
        /// The bound variable.
        name: Identifier,
        /// Source location.
        span: Span,
    },
}

impl WhenValue {
    /// Returns the span of the pattern.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Else(span) | Self::Type { span, .. } => *span,
            Self::Literals(literals) => match (literals.first(), literals.last()) {
                (Some(first), Some(last)) => first.span.merge(last.span),
                _ => Span::default(),
            },
        }
    }
}

/// One literal pattern of a `when` clause.
///
/// `expression` keeps the written shape (parentheses and the sign chain);
/// `value` and `negative` are the folded result: `-+-3` folds to `3` with
/// `negative == false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhenLiteral {
    /// The pattern exactly as written.
    pub expression: Expression,
    /// The literal or enum constant at the core of the pattern.
    pub value: WhenPattern,
    /// True when an odd number of `-` signs precede a numeric literal.
    pub negative: bool,
    /// Source location.
    pub span: Span,
}

/// The core of a [`WhenLiteral`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhenPattern {
    /// A number, string or `null`.
    Literal(Literal),
    /// An enum constant such as `WINTER`.
    Identifier(Identifier),
    /// A pattern that could not be parsed.
    Error,
}

/// `try` with its handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryStatement {
    /// The guarded block.
    pub body: Block,
    /// The catch clauses in source order.
    pub catches: Vec<CatchClause>,
    /// The finally block.
    pub finally: Option<Block>,
    /// Source location.
    pub span: Span,
}

/// `catch (final DmlException e) { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchClause {
    /// Modifiers on the exception variable.
    pub modifiers: Modifiers,
    /// The caught exception type.
    pub exception_type: QualifiedName,
    /// The exception variable.
    pub name: Identifier,
    /// The handler body.
    pub body: Block,
    /// Source location.
    pub span: Span,
}

/// The access mode a DML statement runs in: `as USER` or `as SYSTEM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessLevel {
    User,
    System,
}

/// A DML statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmlStatement {
    /// The verb and its extra operands.
    pub operation: DmlOperation,
    /// The `as USER|SYSTEM` qualifier.
    pub access_level: Option<AccessLevel>,
    /// The records operated on.
    pub target: Expression,
    /// Source location including `;`.
    pub span: Span,
}

/// A DML verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DmlOperation {
    Insert,
    Update,
    Delete,
    Undelete,
    /// `upsert records Account.Fields.ExternalId__c;`
    Upsert {
        /// The external id field.
        external_id: Option<QualifiedName>,
    },
    /// `merge master duplicate;`
    Merge {
        /// The record or records merged into the target.
        duplicates: Expression,
    },
}

impl DmlOperation {
    /// Returns the verb as written in lowercase.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Undelete => "undelete",
            Self::Upsert { .. } => "upsert",
            Self::Merge { .. } => "merge",
        }
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// An expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// A literal value.
    Literal(Literal, Span),

    /// A variable, field, or type name.
    Identifier(Identifier),

    /// `this`
    This(Span),

    /// `super`
    Super(Span),

    /// `Account.class`
    ClassLiteral {
        /// The type named.
        type_ref: TypeRef,
        /// Source location.
        span: Span,
    },

    /// `receiver.field` or `receiver?.field`
    FieldAccess {
        /// The object accessed.
        receiver: Box<Expression>,
        /// The field name.
        field: Identifier,
        /// True for `?.`.
        safe_navigation: bool,
        /// Source location.
        span: Span,
    },

    /// `name(args)` or `receiver.name(args)`
    MethodCall {
        /// The receiver; `None` for unqualified calls.
        receiver: Option<Box<Expression>>,
        /// The method name (`this`/`super` for constructor chaining).
        name: Identifier,
        /// The arguments.
        arguments: Vec<Expression>,
        /// True for `?.`.
        safe_navigation: bool,
        /// Source location.
        span: Span,
    },

    /// `array[index]`
    ArrayAccess {
        /// The indexed expression.
        array: Box<Expression>,
        /// The index.
        index: Box<Expression>,
        /// Source location.
        span: Span,
    },

    /// `new Type(...)` and the collection creators.
    New {
        /// What is created.
        creator: Creator,
        /// Source location.
        span: Span,
    },

    /// A prefix operator: `-x`, `!done`, `++i`.
    Unary {
        /// The operator.
        operator: UnaryOperator,
        /// The operand.
        operand: Box<Expression>,
        /// Source location.
        span: Span,
    },

    /// A postfix operator: `i++`.
    Postfix {
        /// The operator.
        operator: PostfixOperator,
        /// The operand.
        operand: Box<Expression>,
        /// Source location.
        span: Span,
    },

    /// A binary operator application.
    Binary {
        /// The left operand.
        left: Box<Expression>,
        /// The operator.
        operator: BinaryOperator,
        /// The right operand.
        right: Box<Expression>,
        /// Source location.
        span: Span,
    },

    /// `target = value`, `target += value`, ...
    Assignment {
        /// The assigned location.
        target: Box<Expression>,
        /// The operator.
        operator: AssignmentOperator,
        /// The assigned value.
        value: Box<Expression>,
        /// Source location.
        span: Span,
    },

    /// `condition ? then_value : else_value`
    Ternary {
        /// The condition.
        condition: Box<Expression>,
        /// The value when true.
        then_value: Box<Expression>,
        /// The value when false.
        else_value: Box<Expression>,
        /// Source location.
        span: Span,
    },

    /// `(Type) expression`
    Cast {
        /// The target type.
        type_ref: TypeRef,
        /// The converted expression.
        expression: Box<Expression>,
        /// Source location.
        span: Span,
    },

    /// `expression instanceof Type`
    InstanceOf {
        /// The tested expression.
        expression: Box<Expression>,
        /// The type tested against.
        type_ref: TypeRef,
        /// Source location.
        span: Span,
    },

    /// A parenthesized expression.
    Parenthesized {
        /// The inner expression.
        expression: Box<Expression>,
        /// Source location including parentheses.
        span: Span,
    },

    /// `[SELECT ... FROM ...]`
    Query(Box<Query>),

    /// `[FIND ... RETURNING ...]`
    Search(Box<Search>),

    /// An error node for unparseable code.
    Error {
        /// A description of what went wrong.
        message: EcoString,
        /// Source location of the erroneous code.
        span: Span,
    },
}

impl Expression {
    /// Returns the span of this expression.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(_, span) | Self::This(span) | Self::Super(span) => *span,
            Self::Identifier(identifier) => identifier.span,
            Self::Query(query) => query.span,
            Self::Search(search) => search.span,
            Self::ClassLiteral { span, .. }
            | Self::FieldAccess { span, .. }
            | Self::MethodCall { span, .. }
            | Self::ArrayAccess { span, .. }
            | Self::New { span, .. }
            | Self::Unary { span, .. }
            | Self::Postfix { span, .. }
            | Self::Binary { span, .. }
            | Self::Assignment { span, .. }
            | Self::Ternary { span, .. }
            | Self::Cast { span, .. }
            | Self::InstanceOf { span, .. }
            | Self::Parenthesized { span, .. }
            | Self::Error { span, .. } => *span,
        }
    }

    /// Returns true if this expression is an error node.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Returns the variant tag.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Literal(..) => "literal",
            Self::Identifier(_) => "identifier",
            Self::This(_) => "this",
            Self::Super(_) => "super",
            Self::ClassLiteral { .. } => "class literal",
            Self::FieldAccess { .. } => "field access",
            Self::MethodCall { .. } => "method call",
            Self::ArrayAccess { .. } => "array access",
            Self::New { .. } => "new",
            Self::Unary { .. } => "unary",
            Self::Postfix { .. } => "postfix",
            Self::Binary { operator, .. } => operator.category().kind_name(),
            Self::Assignment { .. } => "assignment",
            Self::Ternary { .. } => "ternary",
            Self::Cast { .. } => "cast",
            Self::InstanceOf { .. } => "instanceof",
            Self::Parenthesized { .. } => "parenthesized",
            Self::Query(_) => "query",
            Self::Search(_) => "search",
            Self::Error { .. } => "error",
        }
    }

    /// Strips any number of enclosing parentheses.
    #[must_use]
    pub fn unparenthesized(&self) -> &Self {
        let mut expression = self;
        while let Self::Parenthesized { expression: inner, .. } = expression {
            expression = inner;
        }
        expression
    }
}

/// A literal value as written. Numbers keep their source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// `42`
    Integer(EcoString),
    /// `42L`
    Long(EcoString),
    /// `3.14`
    Number(EcoString),
    /// A string, unescaped.
    String(EcoString),
    /// `true` or `false`
    Boolean(bool),
    /// `null`
    Null,
}

impl Literal {
    /// Returns true for integer, long and decimal literals.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Long(_) | Self::Number(_))
    }
}

/// What a `new` expression creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Creator {
    /// `new Account(Name = 'x')`, `new List<Id>(ids)`
    Class {
        /// The instantiated type.
        type_ref: TypeRef,
        /// Constructor arguments.
        arguments: Vec<Expression>,
    },
    /// `new Integer[10]`
    Array {
        /// The element type.
        type_ref: TypeRef,
        /// The array length.
        size: Box<Expression>,
    },
    /// `new Integer[]{1, 2}`
    ArrayInitializer {
        /// The element type.
        type_ref: TypeRef,
        /// The elements.
        elements: Vec<Expression>,
    },
    /// `new List<Integer>{1, 2}`, `new Set<String>{}`
    Collection {
        /// The collection type.
        type_ref: TypeRef,
        /// The elements.
        elements: Vec<Expression>,
    },
    /// `new Map<String, Integer>{'a' => 1}`
    Map {
        /// The map type.
        type_ref: TypeRef,
        /// The entries.
        entries: Vec<MapEntry>,
    },
}

impl Creator {
    /// Returns the created type.
    #[must_use]
    pub fn type_ref(&self) -> &TypeRef {
        match self {
            Self::Class { type_ref, .. }
            | Self::Array { type_ref, .. }
            | Self::ArrayInitializer { type_ref, .. }
            | Self::Collection { type_ref, .. }
            | Self::Map { type_ref, .. } => type_ref,
        }
    }
}

/// `key => value` in a map initializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    /// The key.
    pub key: Expression,
    /// The value.
    pub value: Expression,
    /// Source location.
    pub span: Span,
}

/// A prefix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `!`
    Not,
    /// `~`
    BitwiseNot,
    /// `++`
    PreIncrement,
    /// `--`
    PreDecrement,
}

/// A postfix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostfixOperator {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Multiply,
    Divide,
    Modulo,
    Add,
    Subtract,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    /// `<>`
    LessGreater,
    /// `===`
    ExactEqual,
    /// `!==`
    ExactNotEqual,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
    And,
    Or,
    /// `??`
    Coalesce,
}

/// The grammar family a [`BinaryOperator`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryCategory {
    Multiplicative,
    Additive,
    Shift,
    Relational,
    Equality,
    Bitwise,
    Logical,
    Coalesce,
}

impl BinaryCategory {
    /// Returns the variant tag used by [`Expression::kind_name`].
    #[must_use]
    pub fn kind_name(self) -> &'static str {
        match self {
            Self::Multiplicative => "multiplicative",
            Self::Additive => "additive",
            Self::Shift => "shift",
            Self::Relational => "relational",
            Self::Equality => "equality",
            Self::Bitwise => "bitwise",
            Self::Logical => "logical",
            Self::Coalesce => "coalesce",
        }
    }
}

impl BinaryOperator {
    /// Returns the operator spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::UnsignedShiftRight => ">>>",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessGreater => "<>",
            Self::ExactEqual => "===",
            Self::ExactNotEqual => "!==",
            Self::BitwiseAnd => "&",
            Self::BitwiseXor => "^",
            Self::BitwiseOr => "|",
            Self::And => "&&",
            Self::Or => "||",
            Self::Coalesce => "??",
        }
    }

    /// Returns the operator family.
    #[must_use]
    pub fn category(self) -> BinaryCategory {
        match self {
            Self::Multiply | Self::Divide | Self::Modulo => BinaryCategory::Multiplicative,
            Self::Add | Self::Subtract => BinaryCategory::Additive,
            Self::ShiftLeft | Self::ShiftRight | Self::UnsignedShiftRight => BinaryCategory::Shift,
            Self::Less | Self::Greater | Self::LessEqual | Self::GreaterEqual => {
                BinaryCategory::Relational
            }
            Self::Equal
            | Self::NotEqual
            | Self::LessGreater
            | Self::ExactEqual
            | Self::ExactNotEqual => BinaryCategory::Equality,
            Self::BitwiseAnd | Self::BitwiseXor | Self::BitwiseOr => BinaryCategory::Bitwise,
            Self::And | Self::Or => BinaryCategory::Logical,
            Self::Coalesce => BinaryCategory::Coalesce,
        }
    }
}

/// An assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOperator {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
}

impl AssignmentOperator {
    /// Returns the operator spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Add => "+=",
            Self::Subtract => "-=",
            Self::Multiply => "*=",
            Self::Divide => "/=",
            Self::Modulo => "%=",
            Self::BitwiseAnd => "&=",
            Self::BitwiseOr => "|=",
            Self::BitwiseXor => "^=",
            Self::ShiftLeft => "<<=",
            Self::ShiftRight => ">>=",
            Self::UnsignedShiftRight => ">>>=",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, start: u32) -> Identifier {
        let end = start + u32::try_from(name.len()).unwrap();
        Identifier::new(name, Span::new(start, end))
    }

    #[test]
    fn type_ref_names() {
        let inner = TypeRef {
            segments: vec![TypeSegment {
                name: ident("Account", 5),
                arguments: vec![],
                span: Span::new(5, 12),
            }],
            array_dimensions: 0,
            span: Span::new(5, 12),
        };
        let list = TypeRef {
            segments: vec![TypeSegment {
                name: ident("List", 0),
                arguments: vec![inner],
                span: Span::new(0, 13),
            }],
            array_dimensions: 1,
            span: Span::new(0, 15),
        };
        assert_eq!(list.qualified_name(), "List");
        assert!(list.is_array());
        assert!(!list.is_void());
        assert_eq!(list.type_arguments().len(), 1);
        assert_eq!(list.type_arguments()[0].qualified_name(), "Account");
    }

    #[test]
    fn qualified_name_dotted() {
        let name = QualifiedName {
            parts: vec![ident("Schema", 0), ident("Account", 7)],
            span: Span::new(0, 14),
        };
        assert_eq!(name.dotted(), "Schema.Account");
    }

    #[test]
    fn modifiers_queries() {
        let modifiers = Modifiers {
            items: vec![
                Modifier::Keyword {
                    keyword: ModifierKeyword::Public,
                    span: Span::new(0, 6),
                },
                Modifier::Sharing {
                    mode: SharingMode::Without,
                    span: Span::new(7, 22),
                },
            ],
        };
        assert!(modifiers.has(ModifierKeyword::Public));
        assert!(!modifiers.has(ModifierKeyword::Static));
        assert_eq!(modifiers.sharing(), Some(SharingMode::Without));
        assert_eq!(modifiers.span(), Some(Span::new(0, 22)));
        assert_eq!(modifiers.annotations().count(), 0);
        assert_eq!(Modifiers::default().span(), None);
    }

    #[test]
    fn binary_categories() {
        assert_eq!(
            BinaryOperator::Multiply.category(),
            BinaryCategory::Multiplicative
        );
        assert_eq!(BinaryOperator::LessGreater.category(), BinaryCategory::Equality);
        assert_eq!(BinaryOperator::Coalesce.as_str(), "??");
        assert_eq!(AssignmentOperator::UnsignedShiftRight.as_str(), ">>>=");
    }

    #[test]
    fn expression_span_and_tag() {
        let left = Expression::Identifier(ident("a", 0));
        let right = Expression::Literal(Literal::Integer("5".into()), Span::new(4, 5));
        let product = Expression::Binary {
            left: Box::new(left),
            operator: BinaryOperator::Multiply,
            right: Box::new(right),
            span: Span::new(0, 5),
        };
        assert_eq!(product.span(), Span::new(0, 5));
        assert_eq!(product.kind_name(), "multiplicative");
        let wrapped = Expression::Parenthesized {
            expression: Box::new(Expression::Parenthesized {
                expression: Box::new(product.clone()),
                span: Span::new(0, 7),
            }),
            span: Span::new(0, 9),
        };
        assert_eq!(wrapped.unparenthesized(), &product);
    }

    #[test]
    fn ast_is_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SourceUnit>();
        assert_send_sync::<Expression>();
        assert_send_sync::<Query>();
    }
}
