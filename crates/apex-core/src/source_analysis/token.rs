// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token types produced by the lexer.
//!
//! # Token Structure
//!
//! Each token consists of:
//! - A [`TokenKind`] classifying the terminal (decided once, at lex time)
//! - A [`Span`] giving its byte range in the source
//! - A 1-based line and 0-based column for diagnostics
//! - Leading and trailing [`Trivia`] so the source can be reconstructed
//!
//! # Keywords
//!
//! Reserved words are matched case-insensitively: `class`, `CLASS` and
//! `Class` all lex as [`Keyword::Class`]. Contextual words such as `on`,
//! `when`, `with`, `USER_MODE` or the query vocabulary are *not*
//! keywords; they stay [`TokenKind::Identifier`] and the parser matches them
//! by text only where the grammar asks for them.

use ecow::EcoString;

use super::{LexErrorKind, Span};

/// A reserved word of the language.
///
/// The lexer compares the ASCII-lowercased identifier text against this
/// table; the original casing survives in the token's span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Abstract,
    Break,
    Catch,
    Class,
    Continue,
    Delete,
    Do,
    Else,
    Enum,
    Extends,
    False,
    Final,
    Finally,
    For,
    Global,
    If,
    Implements,
    Insert,
    InstanceOf,
    Interface,
    Merge,
    New,
    Null,
    Override,
    Private,
    Protected,
    Public,
    Return,
    Static,
    Super,
    Switch,
    TestMethod,
    This,
    Throw,
    Transient,
    Trigger,
    True,
    Try,
    Undelete,
    Update,
    Upsert,
    Virtual,
    Void,
    WebService,
    While,
}

impl Keyword {
    /// Every keyword, in alphabetical order of its spelling.
    pub const ALL: [Self; 45] = [
        Self::Abstract,
        Self::Break,
        Self::Catch,
        Self::Class,
        Self::Continue,
        Self::Delete,
        Self::Do,
        Self::Else,
        Self::Enum,
        Self::Extends,
        Self::False,
        Self::Final,
        Self::Finally,
        Self::For,
        Self::Global,
        Self::If,
        Self::Implements,
        Self::Insert,
        Self::InstanceOf,
        Self::Interface,
        Self::Merge,
        Self::New,
        Self::Null,
        Self::Override,
        Self::Private,
        Self::Protected,
        Self::Public,
        Self::Return,
        Self::Static,
        Self::Super,
        Self::Switch,
        Self::TestMethod,
        Self::This,
        Self::Throw,
        Self::Transient,
        Self::Trigger,
        Self::True,
        Self::Try,
        Self::Undelete,
        Self::Update,
        Self::Upsert,
        Self::Virtual,
        Self::Void,
        Self::WebService,
        Self::While,
    ];

    /// Classifies identifier text, ignoring ASCII case.
    ///
    /// ```
    /// use apex_core::source_analysis::Keyword;
    ///
    /// assert_eq!(Keyword::lookup("CLASS"), Some(Keyword::Class));
    /// assert_eq!(Keyword::lookup("testMethod"), Some(Keyword::TestMethod));
    /// assert_eq!(Keyword::lookup("USER_MODE"), None);
    /// ```
    #[must_use]
    pub fn lookup(text: &str) -> Option<Self> {
        // Longest keyword is `implements`/`webservice`/`instanceof`/`testmethod`
        if text.len() > 10 {
            return None;
        }
        let lowered = text.to_ascii_lowercase();
        let keyword = match lowered.as_str() {
            "abstract" => Self::Abstract,
            "break" => Self::Break,
            "catch" => Self::Catch,
            "class" => Self::Class,
            "continue" => Self::Continue,
            "delete" => Self::Delete,
            "do" => Self::Do,
            "else" => Self::Else,
            "enum" => Self::Enum,
            "extends" => Self::Extends,
            "false" => Self::False,
            "final" => Self::Final,
            "finally" => Self::Finally,
            "for" => Self::For,
            "global" => Self::Global,
            "if" => Self::If,
            "implements" => Self::Implements,
            "insert" => Self::Insert,
            "instanceof" => Self::InstanceOf,
            "interface" => Self::Interface,
            "merge" => Self::Merge,
            "new" => Self::New,
            "null" => Self::Null,
            "override" => Self::Override,
            "private" => Self::Private,
            "protected" => Self::Protected,
            "public" => Self::Public,
            "return" => Self::Return,
            "static" => Self::Static,
            "super" => Self::Super,
            "switch" => Self::Switch,
            "testmethod" => Self::TestMethod,
            "this" => Self::This,
            "throw" => Self::Throw,
            "transient" => Self::Transient,
            "trigger" => Self::Trigger,
            "true" => Self::True,
            "try" => Self::Try,
            "undelete" => Self::Undelete,
            "update" => Self::Update,
            "upsert" => Self::Upsert,
            "virtual" => Self::Virtual,
            "void" => Self::Void,
            "webservice" => Self::WebService,
            "while" => Self::While,
            _ => return None,
        };
        Some(keyword)
    }

    /// Returns the canonical lowercase spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::Break => "break",
            Self::Catch => "catch",
            Self::Class => "class",
            Self::Continue => "continue",
            Self::Delete => "delete",
            Self::Do => "do",
            Self::Else => "else",
            Self::Enum => "enum",
            Self::Extends => "extends",
            Self::False => "false",
            Self::Final => "final",
            Self::Finally => "finally",
            Self::For => "for",
            Self::Global => "global",
            Self::If => "if",
            Self::Implements => "implements",
            Self::Insert => "insert",
            Self::InstanceOf => "instanceof",
            Self::Interface => "interface",
            Self::Merge => "merge",
            Self::New => "new",
            Self::Null => "null",
            Self::Override => "override",
            Self::Private => "private",
            Self::Protected => "protected",
            Self::Public => "public",
            Self::Return => "return",
            Self::Static => "static",
            Self::Super => "super",
            Self::Switch => "switch",
            Self::TestMethod => "testmethod",
            Self::This => "this",
            Self::Throw => "throw",
            Self::Transient => "transient",
            Self::Trigger => "trigger",
            Self::True => "true",
            Self::Try => "try",
            Self::Undelete => "undelete",
            Self::Update => "update",
            Self::Upsert => "upsert",
            Self::Virtual => "virtual",
            Self::Void => "void",
            Self::WebService => "webservice",
            Self::While => "while",
        }
    }

    /// Returns true for the DML verbs that start a DML statement.
    #[must_use]
    pub const fn is_dml(self) -> bool {
        matches!(
            self,
            Self::Insert
                | Self::Update
                | Self::Delete
                | Self::Undelete
                | Self::Upsert
                | Self::Merge
        )
    }

    /// Returns true for reserved words that may still name a variable or
    /// type in expression position (`Trigger.new`, a local named `switch`).
    #[must_use]
    pub const fn is_soft(self) -> bool {
        matches!(self, Self::Trigger | Self::Switch | Self::Transient)
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of token, not including source location or trivia.
///
/// String payloads use [`EcoString`] so tokens stay cheap to clone into the
/// parser's lookahead buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Names ===
    /// An identifier, including every contextual word: `foo`, `Account`, `USER_MODE`
    Identifier(EcoString),

    /// A reserved word, matched case-insensitively: `class`, `Public`
    Keyword(Keyword),

    // === Literals ===
    /// An integer literal: `42`
    IntegerLiteral(EcoString),

    /// A long literal with its suffix: `42L`
    LongLiteral(EcoString),

    /// A decimal literal: `3.14`, `.5`, `2.0d`
    NumberLiteral(EcoString),

    /// A single-quoted string; the payload is the unescaped value
    StringLiteral(EcoString),

    /// A query date literal: `2020-01-01`
    DateLiteral(EcoString),

    /// A query date-time literal: `2020-01-01T12:00:00Z`
    DateTimeLiteral(EcoString),

    // === Delimiters ===
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,

    // === Punctuation ===
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `?.`
    SafeDot,
    /// `?`
    Question,
    /// `??`
    QuestionQuestion,
    /// `:`
    Colon,
    /// `@`
    At,
    /// `=>`
    MapsTo,

    // === Operators ===
    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `*=`
    StarAssign,
    /// `/=`
    SlashAssign,
    /// `%=`
    PercentAssign,
    /// `&=`
    AmpersandAssign,
    /// `|=`
    PipeAssign,
    /// `^=`
    CaretAssign,
    /// `<<=`
    ShiftLeftAssign,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `++`
    Increment,
    /// `--`
    Decrement,
    /// `!`
    Bang,
    /// `~`
    Tilde,
    /// `&`
    Ampersand,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `==`
    EqualEqual,
    /// `===`
    EqualEqualEqual,
    /// `!=`
    NotEqual,
    /// `!==`
    NotEqualEqual,
    /// `<>`
    LessGreater,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `<<`
    ShiftLeft,
    /// `>`, always a single character; the parser joins `>=`, `>>` and
    /// friends from adjacent tokens so nested generics close cleanly.
    Greater,

    // === Special ===
    /// An uninterpretable character sequence
    Error(LexErrorKind),

    /// End of input
    Eof,
}

impl TokenKind {
    /// Returns true if this is a literal token.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::IntegerLiteral(_)
                | Self::LongLiteral(_)
                | Self::NumberLiteral(_)
                | Self::StringLiteral(_)
                | Self::DateLiteral(_)
                | Self::DateTimeLiteral(_)
                | Self::Keyword(Keyword::True | Keyword::False | Keyword::Null)
        )
    }

    /// Returns true if this is a numeric literal token.
    #[must_use]
    pub const fn is_numeric_literal(&self) -> bool {
        matches!(
            self,
            Self::IntegerLiteral(_) | Self::LongLiteral(_) | Self::NumberLiteral(_)
        )
    }

    /// Returns true if this is an identifier token.
    #[must_use]
    pub const fn is_identifier(&self) -> bool {
        matches!(self, Self::Identifier(_))
    }

    /// Returns true if this is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Self::Keyword(k) if *k == keyword)
    }

    /// Returns true if this is an identifier whose text equals `word`,
    /// ignoring ASCII case. `word` must be lowercase.
    #[must_use]
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Self::Identifier(name) if name.eq_ignore_ascii_case(word))
    }

    /// Returns true if this is the end-of-input token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns true if this is a lexical error token.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns the fixed spelling of punctuation and operator tokens.
    #[must_use]
    pub const fn as_str(&self) -> Option<&'static str> {
        let text = match self {
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBracket => "[",
            Self::RightBracket => "]",
            Self::LeftBrace => "{",
            Self::RightBrace => "}",
            Self::Semicolon => ";",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::SafeDot => "?.",
            Self::Question => "?",
            Self::QuestionQuestion => "??",
            Self::Colon => ":",
            Self::At => "@",
            Self::MapsTo => "=>",
            Self::Assign => "=",
            Self::PlusAssign => "+=",
            Self::MinusAssign => "-=",
            Self::StarAssign => "*=",
            Self::SlashAssign => "/=",
            Self::PercentAssign => "%=",
            Self::AmpersandAssign => "&=",
            Self::PipeAssign => "|=",
            Self::CaretAssign => "^=",
            Self::ShiftLeftAssign => "<<=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Increment => "++",
            Self::Decrement => "--",
            Self::Bang => "!",
            Self::Tilde => "~",
            Self::Ampersand => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::EqualEqual => "==",
            Self::EqualEqualEqual => "===",
            Self::NotEqual => "!=",
            Self::NotEqualEqual => "!==",
            Self::LessGreater => "<>",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::ShiftLeft => "<<",
            Self::Greater => ">",
            Self::Keyword(keyword) => keyword.as_str(),
            _ => return None,
        };
        Some(text)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier(s)
            | Self::IntegerLiteral(s)
            | Self::LongLiteral(s)
            | Self::NumberLiteral(s)
            | Self::DateLiteral(s)
            | Self::DateTimeLiteral(s) => write!(f, "{s}"),
            Self::StringLiteral(s) => write!(f, "'{s}'"),
            Self::Error(kind) => write!(f, "{kind}"),
            Self::Eof => write!(f, "end of input"),
            other => f.write_str(other.as_str().unwrap_or("?")),
        }
    }
}

/// Whitespace or a comment attached to a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Trivia {
    /// Spaces, tabs and line breaks.
    Whitespace(EcoString),
    /// A line comment including its `//` marker.
    LineComment(EcoString),
    /// A block comment including its delimiters.
    BlockComment(EcoString),
}

impl Trivia {
    /// Returns the source text of this trivia.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Whitespace(s) | Self::LineComment(s) | Self::BlockComment(s) => s,
        }
    }

    /// Returns true if the trivia spans a line break.
    #[must_use]
    pub fn contains_newline(&self) -> bool {
        self.as_str().contains('\n')
    }

    /// Returns true for comments.
    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::LineComment(_) | Self::BlockComment(_))
    }
}

/// A classified token with its location and surrounding trivia.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    kind: TokenKind,
    span: Span,
    line: u32,
    column: u32,
    leading_trivia: Vec<Trivia>,
    trailing_trivia: Vec<Trivia>,
}

impl Token {
    /// Creates a token on line 1, column 0, with no trivia.
    #[must_use]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            line: 1,
            column: 0,
            leading_trivia: Vec::new(),
            trailing_trivia: Vec::new(),
        }
    }

    /// Creates a token with trivia.
    #[must_use]
    pub fn with_trivia(
        kind: TokenKind,
        span: Span,
        leading_trivia: Vec<Trivia>,
        trailing_trivia: Vec<Trivia>,
    ) -> Self {
        Self {
            kind,
            span,
            line: 1,
            column: 0,
            leading_trivia,
            trailing_trivia,
        }
    }

    /// Sets the line and column of the token's first character.
    #[must_use]
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    /// Returns the kind of this token.
    #[must_use]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    /// Consumes the token and returns its kind.
    #[must_use]
    pub fn into_kind(self) -> TokenKind {
        self.kind
    }

    /// Returns the source span (excluding trivia).
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Returns the 1-based line of the first character.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Returns the 0-based column, counted in characters.
    #[must_use]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Returns the exact source text of this token.
    ///
    /// `source` must be the text the token was lexed from.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.span.as_range()).unwrap_or("")
    }

    /// Returns the trivia preceding this token.
    #[must_use]
    pub fn leading_trivia(&self) -> &[Trivia] {
        &self.leading_trivia
    }

    /// Returns the same-line trivia following this token.
    #[must_use]
    pub fn trailing_trivia(&self) -> &[Trivia] {
        &self.trailing_trivia
    }

    /// Returns true if the leading trivia contains a comment.
    #[must_use]
    pub fn has_leading_comment(&self) -> bool {
        self.leading_trivia.iter().any(Trivia::is_comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_ignores_case() {
        for spelling in ["class", "CLASS", "Class", "cLaSs"] {
            assert_eq!(Keyword::lookup(spelling), Some(Keyword::Class));
        }
        assert_eq!(Keyword::lookup("classy"), None);
        assert_eq!(Keyword::lookup("on"), None);
        assert_eq!(Keyword::lookup("SYSTEM_MODE"), None);
    }

    #[test]
    fn keyword_table_round_trips() {
        for keyword in Keyword::ALL {
            assert_eq!(Keyword::lookup(keyword.as_str()), Some(keyword));
            assert_eq!(
                Keyword::lookup(&keyword.as_str().to_ascii_uppercase()),
                Some(keyword)
            );
        }
    }

    #[test]
    fn contextual_words_are_not_keywords() {
        for word in [
            "on", "when", "as", "user", "system", "with", "without", "sharing", "get", "set",
            "before", "after", "select", "from", "where", "user_mode",
        ] {
            assert_eq!(Keyword::lookup(word), None, "{word} must stay an identifier");
        }
    }

    #[test]
    fn dml_keywords() {
        assert!(Keyword::Insert.is_dml());
        assert!(Keyword::Merge.is_dml());
        assert!(!Keyword::New.is_dml());
    }

    #[test]
    fn token_kind_display() {
        assert_eq!(TokenKind::Identifier("foo".into()).to_string(), "foo");
        assert_eq!(TokenKind::StringLiteral("hi".into()).to_string(), "'hi'");
        assert_eq!(TokenKind::Keyword(Keyword::Class).to_string(), "class");
        assert_eq!(TokenKind::Greater.to_string(), ">");
        assert_eq!(TokenKind::Eof.to_string(), "end of input");
    }

    #[test]
    fn token_kind_predicates() {
        assert!(TokenKind::IntegerLiteral("1".into()).is_literal());
        assert!(TokenKind::Keyword(Keyword::Null).is_literal());
        assert!(TokenKind::LongLiteral("1L".into()).is_numeric_literal());
        assert!(!TokenKind::StringLiteral("a".into()).is_numeric_literal());
        assert!(TokenKind::Identifier("USER_MODE".into()).is_word("user_mode"));
        assert!(!TokenKind::Identifier("users".into()).is_word("user"));
        assert!(TokenKind::Eof.is_eof());
        assert!(TokenKind::Error(LexErrorKind::UnterminatedString).is_error());
    }

    #[test]
    fn token_accessors() {
        let token = Token::new(TokenKind::Identifier("x".into()), Span::new(4, 5)).at(2, 3);
        assert_eq!(token.span(), Span::new(4, 5));
        assert_eq!(token.line(), 2);
        assert_eq!(token.column(), 3);
        assert_eq!(token.text("a\nb x"), "x");
        assert_eq!(token.into_kind(), TokenKind::Identifier("x".into()));
    }

    #[test]
    fn trivia_predicates() {
        assert!(Trivia::LineComment("// x".into()).is_comment());
        assert!(!Trivia::Whitespace(" ".into()).is_comment());
        assert!(Trivia::Whitespace("\n".into()).contains_newline());
    }
}
