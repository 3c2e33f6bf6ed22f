// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Tree nodes for the embedded query (`[SELECT ...]`) and search
//! (`[FIND ...]`) literals.
//!
//! Query words are case-insensitive and never reserved outside a query, so
//! names here keep their written spelling.

use super::{Expression, Identifier};
use crate::source_analysis::Span;
use ecow::EcoString;

// ============================================================================
// Query
// ============================================================================

/// `SELECT fields FROM objects [clauses]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The selected entries, never empty in a well-formed query.
    pub select: Vec<SelectEntry>,
    /// The queried objects.
    pub from: Vec<FromEntry>,
    /// `USING SCOPE name`
    pub using_scope: Option<Identifier>,
    /// `WHERE condition`
    pub where_clause: Option<Condition>,
    /// `WITH ...`
    pub with: Option<WithClause>,
    /// `GROUP BY ...`
    pub group_by: Option<GroupBy>,
    /// `HAVING condition`
    pub having: Option<Condition>,
    /// `ORDER BY ...`
    pub order_by: Vec<OrderItem>,
    /// `LIMIT n`
    pub limit: Option<QueryBound>,
    /// `OFFSET n`
    pub offset: Option<QueryBound>,
    /// `ALL ROWS`
    pub all_rows: bool,
    /// `FOR VIEW`, `FOR REFERENCE`, `FOR UPDATE`
    pub for_clauses: Vec<ForKind>,
    /// `UPDATE TRACKING`, `UPDATE VIEWSTAT`
    pub update_clauses: Vec<UpdateKind>,
    /// Source location, excluding any enclosing brackets.
    pub span: Span,
}

/// One entry of the `SELECT` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectEntry {
    /// `Account.Name` or `Name n`
    Field {
        /// The selected field.
        path: FieldPath,
        /// Optional alias.
        alias: Option<Identifier>,
        /// Source location.
        span: Span,
    },
    /// `COUNT(Id) total`, `FIELDS(ALL)`, `toLabel(Status)`
    Function {
        /// The function call.
        call: FunctionCall,
        /// Optional alias.
        alias: Option<Identifier>,
        /// Source location.
        span: Span,
    },
    /// `(SELECT Id FROM Contacts)`
    Subquery(Box<Query>),
    /// `TYPEOF What WHEN Account THEN Name ELSE Id END`
    TypeOf(TypeOfClause),
}

impl SelectEntry {
    /// Returns the span of this entry.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Field { span, .. } | Self::Function { span, .. } => *span,
            Self::Subquery(query) => query.span,
            Self::TypeOf(clause) => clause.span,
        }
    }

    /// Returns the variant tag.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Field { .. } => "field",
            Self::Function { .. } => "function",
            Self::Subquery(_) => "subquery",
            Self::TypeOf(_) => "typeof",
        }
    }
}

/// A dotted field reference such as `Owner.Profile.Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// The dot-separated parts.
    pub parts: Vec<Identifier>,
    /// Source location.
    pub span: Span,
}

/// A field or a function applied to fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldExpression {
    Path(FieldPath),
    Function(FunctionCall),
}

impl FieldExpression {
    /// Returns the span of this field expression.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Path(path) => path.span,
            Self::Function(call) => call.span,
        }
    }
}

/// `name(arguments)` inside a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    /// The function name as written.
    pub name: Identifier,
    /// The arguments; empty for `COUNT()`.
    pub arguments: Vec<FunctionArgument>,
    /// Source location.
    pub span: Span,
}

/// An argument of a query function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionArgument {
    /// A field or a bare word such as `ALL`.
    Field(FieldPath),
    /// A nested call: `GEOLOCATION(1, 2)`.
    Function(FunctionCall),
    /// A literal: `'mi'`.
    Value(QueryValue),
}

/// `TYPEOF field WHEN Type THEN fields ... [ELSE fields] END`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeOfClause {
    /// The polymorphic field.
    pub field: FieldPath,
    /// The `WHEN` branches.
    pub whens: Vec<TypeOfWhen>,
    /// Fields selected for any other type.
    pub else_fields: Vec<FieldPath>,
    /// Source location.
    pub span: Span,
}

/// `WHEN Account THEN Name, Phone`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeOfWhen {
    /// The object type matched.
    pub object: Identifier,
    /// The fields selected for it.
    pub fields: Vec<FieldPath>,
    /// Source location.
    pub span: Span,
}

/// `Account a` in the `FROM` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromEntry {
    /// The object or relationship path.
    pub object: FieldPath,
    /// Optional alias.
    pub alias: Option<Identifier>,
    /// Source location.
    pub span: Span,
}

// ============================================================================
// Conditions
// ============================================================================

/// A `WHERE` or `HAVING` condition.
///
/// `AND` and `OR` never appear as direct operands of each other without a
/// [`Condition::Parenthesized`] in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `a AND b AND c`
    And {
        /// Two or more operands.
        operands: Vec<Condition>,
        /// Source location.
        span: Span,
    },
    /// `a OR b OR c`
    Or {
        /// Two or more operands.
        operands: Vec<Condition>,
        /// Source location.
        span: Span,
    },
    /// `NOT condition`
    Not {
        /// The negated condition.
        operand: Box<Condition>,
        /// Source location.
        span: Span,
    },
    /// `(condition)`
    Parenthesized {
        /// The inner condition.
        condition: Box<Condition>,
        /// Source location including parentheses.
        span: Span,
    },
    /// `field operator value`
    Comparison(Comparison),
    /// An unrecognisable condition.
    Error {
        /// A description of what went wrong.
        message: EcoString,
        /// Source location of the erroneous code.
        span: Span,
    },
}

impl Condition {
    /// Returns the span of this condition.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::And { span, .. }
            | Self::Or { span, .. }
            | Self::Not { span, .. }
            | Self::Parenthesized { span, .. }
            | Self::Error { span, .. } => *span,
            Self::Comparison(comparison) => comparison.span,
        }
    }

    /// Returns the variant tag.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::And { .. } => "and",
            Self::Or { .. } => "or",
            Self::Not { .. } => "not",
            Self::Parenthesized { .. } => "parenthesized",
            Self::Comparison(_) => "comparison",
            Self::Error { .. } => "error",
        }
    }
}

/// `Amount > 100`, `Id IN :ids`, `Name LIKE 'A%'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// The compared field.
    pub field: FieldExpression,
    /// The operator.
    pub operator: ComparisonOperator,
    /// The compared value.
    pub value: QueryValue,
    /// Source location.
    pub span: Span,
}

/// A query comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Like,
    In,
    NotIn,
    Includes,
    Excludes,
}

impl ComparisonOperator {
    /// Returns the operator spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Includes => "INCLUDES",
            Self::Excludes => "EXCLUDES",
        }
    }
}

/// A value on the right of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// `null`
    Null(Span),
    /// `true` or `false`
    Boolean(bool, Span),
    /// `-100.123`
    Number {
        /// The digits as written, without sign.
        value: EcoString,
        /// True if preceded by `-`.
        negative: bool,
        /// Source location including the sign.
        span: Span,
    },
    /// A string, unescaped.
    String(EcoString, Span),
    /// `2020-01-01`
    Date(EcoString, Span),
    /// `2020-01-01T12:00:00Z`
    DateTime(EcoString, Span),
    /// `TODAY`, `LAST_N_DAYS:30`
    DateFormula {
        /// The formula name as written.
        name: Identifier,
        /// The `:n` argument.
        argument: Option<EcoString>,
        /// Source location.
        span: Span,
    },
    /// `USD100.01`
    Currency {
        /// The ISO currency code, such as `USD`.
        code: EcoString,
        /// The amount, such as `100.01`.
        amount: EcoString,
        /// Source location.
        span: Span,
    },
    /// `('a', 'b')`
    List {
        /// The values.
        values: Vec<QueryValue>,
        /// Source location including parentheses.
        span: Span,
    },
    /// `(SELECT AccountId FROM Contact)`
    Subquery(Box<Query>),
    /// `:expression`
    Bind(BindExpression),
    /// A value that could not be parsed.
    Error {
        /// A description of what went wrong.
        message: EcoString,
        /// Source location of the erroneous code.
        span: Span,
    },
}

impl QueryValue {
    /// Returns the span of this value.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Null(span)
            | Self::Boolean(_, span)
            | Self::String(_, span)
            | Self::Date(_, span)
            | Self::DateTime(_, span)
            | Self::Number { span, .. }
            | Self::DateFormula { span, .. }
            | Self::Currency { span, .. }
            | Self::List { span, .. }
            | Self::Error { span, .. } => *span,
            Self::Subquery(query) => query.span,
            Self::Bind(bind) => bind.span,
        }
    }

    /// Returns the variant tag.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null(_) => "null",
            Self::Boolean(..) => "boolean",
            Self::Number { .. } => "number",
            Self::String(..) => "string",
            Self::Date(..) => "date",
            Self::DateTime(..) => "datetime",
            Self::DateFormula { .. } => "date formula",
            Self::Currency { .. } => "currency",
            Self::List { .. } => "list",
            Self::Subquery(_) => "subquery",
            Self::Bind(_) => "bind",
            Self::Error { .. } => "error",
        }
    }
}

/// `:expression`, an Apex expression evaluated when the query runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindExpression {
    /// The bound expression.
    pub expression: Expression,
    /// Source location including `:`.
    pub span: Span,
}

// ============================================================================
// Clauses
// ============================================================================

/// The security mode of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    /// `WITH USER_MODE`
    UserMode,
    /// `WITH SYSTEM_MODE`
    SystemMode,
    /// `WITH SECURITY_ENFORCED`
    SecurityEnforced,
}

/// The `WITH` clause of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithClause {
    /// `WITH USER_MODE` and friends.
    Mode(QueryMode, Span),
    /// `WITH DATA CATEGORY Geography__c AT usa__c AND ...`
    DataCategory {
        /// The filters joined by `AND`.
        filters: Vec<DataCategoryFilter>,
        /// Source location.
        span: Span,
    },
    /// `WITH RecordVisibilityContext = 'x'`
    Filter(Condition),
}

impl WithClause {
    /// Returns the span of this clause.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Mode(_, span) | Self::DataCategory { span, .. } => *span,
            Self::Filter(condition) => condition.span(),
        }
    }
}

/// `Geography__c ABOVE (usa__c, europe__c)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCategoryFilter {
    /// The category group.
    pub group: Identifier,
    /// `AT`, `ABOVE`, `BELOW` or `ABOVE_OR_BELOW`.
    pub selector: Identifier,
    /// The categories.
    pub categories: Vec<Identifier>,
    /// Source location.
    pub span: Span,
}

/// How `GROUP BY` aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupByKind {
    Plain,
    Rollup,
    Cube,
}

/// `GROUP BY [ROLLUP|CUBE] (fields)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBy {
    /// Plain, rollup or cube.
    pub kind: GroupByKind,
    /// The grouped fields.
    pub fields: Vec<FieldExpression>,
    /// Source location.
    pub span: Span,
}

/// Sort direction in `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Null placement in `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullsOrder {
    First,
    Last,
}

/// `Name DESC NULLS LAST`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    /// The sorted field.
    pub field: FieldExpression,
    /// `ASC` or `DESC`.
    pub direction: Option<SortDirection>,
    /// `NULLS FIRST` or `NULLS LAST`.
    pub nulls: Option<NullsOrder>,
    /// Source location.
    pub span: Span,
}

/// The argument of `LIMIT` or `OFFSET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryBound {
    /// A literal count.
    Integer(EcoString, Span),
    /// `:pageSize`
    Bind(BindExpression),
}

impl QueryBound {
    /// Returns the span of the bound.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Integer(_, span) => *span,
            Self::Bind(bind) => bind.span,
        }
    }
}

/// `FOR VIEW`, `FOR REFERENCE`, `FOR UPDATE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForKind {
    View,
    Reference,
    Update,
}

/// `UPDATE TRACKING`, `UPDATE VIEWSTAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Tracking,
    Viewstat,
}

// ============================================================================
// Search
// ============================================================================

/// `FIND term [IN group FIELDS] [RETURNING ...] [WITH ...] [LIMIT n]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    /// What to search for.
    pub term: SearchTerm,
    /// `ALL`, `NAME`, `EMAIL`, `PHONE` or `SIDEBAR`.
    pub search_group: Option<Identifier>,
    /// The objects returned.
    pub returning: Vec<SearchReturning>,
    /// The `WITH` options in source order.
    pub with: Vec<SearchWith>,
    /// `LIMIT n`
    pub limit: Option<QueryBound>,
    /// `UPDATE TRACKING`, `UPDATE VIEWSTAT`
    pub update_clauses: Vec<UpdateKind>,
    /// Source location, excluding any enclosing brackets.
    pub span: Span,
}

/// The search term of `FIND`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// `'Acme*'`, unescaped.
    Text(EcoString, Span),
    /// `{Acme}`: the raw text between the braces.
    Braced(EcoString, Span),
    /// `:term`
    Bind(BindExpression),
    /// A missing or unrecognisable term.
    Error(Span),
}

impl SearchTerm {
    /// Returns the span of the term.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Text(_, span) | Self::Braced(_, span) | Self::Error(span) => *span,
            Self::Bind(bind) => bind.span,
        }
    }
}

/// `Account(Id, Name WHERE ... ORDER BY ... LIMIT 5)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReturning {
    /// The returned object.
    pub object: Identifier,
    /// The returned fields.
    pub fields: Vec<FieldExpression>,
    /// `WHERE condition`
    pub where_clause: Option<Condition>,
    /// `ORDER BY ...`
    pub order_by: Vec<OrderItem>,
    /// `LIMIT n`
    pub limit: Option<QueryBound>,
    /// `OFFSET n`
    pub offset: Option<QueryBound>,
    /// Source location.
    pub span: Span,
}

/// A `WITH` clause of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchWith {
    /// `WITH USER_MODE` and friends.
    Mode(QueryMode, Span),
    /// `WITH DATA CATEGORY ...`
    DataCategory {
        /// The filters joined by `AND`.
        filters: Vec<DataCategoryFilter>,
        /// Source location.
        span: Span,
    },
    /// `WITH SNIPPET (target_length=120)`, `WITH DIVISION = 'x'`, ...
    Option(SearchOption),
}

impl SearchWith {
    /// Returns the span of this clause.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Mode(_, span) | Self::DataCategory { span, .. } => *span,
            Self::Option(option) => option.span,
        }
    }
}

/// A named search option with an optional value or parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOption {
    /// The option name as written.
    pub name: Identifier,
    /// The value after `=` or `IN`.
    pub value: Option<QueryValue>,
    /// Parameters between parentheses.
    pub parameters: Vec<SearchParameter>,
    /// Source location.
    pub span: Span,
}

/// `target_length=120`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParameter {
    /// The parameter name.
    pub name: Identifier,
    /// The parameter value.
    pub value: QueryValue,
    /// Source location.
    pub span: Span,
}
