// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for Apex source code.
//!
//! This module converts source text into a lazy stream of [`Token`]s. The
//! lexer is hand-written for control over error recovery and positions.
//!
//! # Design Principles
//!
//! - **Error recovery**: Never panic on malformed input; emit [`TokenKind::Error`]
//! - **Classify once**: keyword vs identifier and literal sub-kinds are decided
//!   here and never re-derived by the parser
//! - **No signs in literals**: `-5` is [`TokenKind::Minus`] then `5`
//! - **Precise positions**: every token carries its span, line and column
//!
//! # Example
//!
//! ```
//! use apex_core::source_analysis::{Keyword, Lexer, TokenKind};
//!
//! let kinds: Vec<_> = Lexer::new("Public CLASS Hello {}")
//!     .map(|t| t.into_kind())
//!     .collect();
//! assert_eq!(kinds[0], TokenKind::Keyword(Keyword::Public));
//! assert_eq!(kinds[1], TokenKind::Keyword(Keyword::Class));
//! assert_eq!(kinds.len(), 5); // EOF excluded from iterator
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::{Keyword, LexErrorKind, Span, Token, TokenKind, Trivia};

/// A lexer that tokenizes Apex source code on demand.
///
/// The lexer produces tokens with their source spans and attached trivia
/// (whitespace and comments). It implements [`Iterator`] for easy
/// consumption; [`Lexer::next_token`] additionally yields the end-of-input
/// token, repeatedly, once the text is exhausted.
pub struct Lexer<'src> {
    /// The source text being lexed.
    source: &'src str,
    /// Character iterator with byte positions.
    chars: Peekable<CharIndices<'src>>,
    /// Current byte position in source.
    position: usize,
    /// Current 1-based line.
    line: u32,
    /// Current 0-based character column.
    column: u32,
    /// Pending trivia to attach to the next token.
    pending_trivia: Vec<Trivia>,
    /// Start of a block comment that ran into end of input.
    unterminated_comment: Option<(u32, u32, u32)>,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("line", &self.line)
            .field("remaining", &self.source.get(self.position..).unwrap_or(""))
            .finish()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            line: 1,
            column: 0,
            pending_trivia: Vec::new(),
            unterminated_comment: None,
        }
    }

    /// Returns the source text being lexed.
    #[must_use]
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `n+1` characters ahead without consuming (n=0 is `peek_char`).
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, c)| c)
    }

    /// Returns true if the unconsumed input starts with `text`.
    fn at(&self, text: &str) -> bool {
        self.source
            .get(self.position..)
            .is_some_and(|rest| rest.starts_with(text))
    }

    /// Consumes the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column = self.column.saturating_add(1);
        }
        Some(c)
    }

    /// Consumes `count` characters.
    fn bump(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    /// Consumes characters while the predicate is true.
    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Returns the current byte position.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    fn current_position(&self) -> u32 {
        self.position as u32
    }

    /// Returns the 0-based character column of the current position.
    fn current_column(&self) -> u32 {
        self.column
    }

    /// Creates a span from start to current position.
    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.current_position())
    }

    /// Extracts source text for a span.
    fn text_for(&self, span: Span) -> &'src str {
        self.source.get(span.as_range()).unwrap_or("")
    }

    /// Skips whitespace and comments, collecting them as trivia.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if is_whitespace(c) => {
                    let start = self.current_position();
                    self.advance_while(is_whitespace);
                    let text = self.text_for(self.span_from(start));
                    self.pending_trivia
                        .push(Trivia::Whitespace(EcoString::from(text)));
                }
                Some('/') if self.peek_char_n(1) == Some('/') => {
                    self.lex_line_comment();
                }
                Some('/') if self.peek_char_n(1) == Some('*') => {
                    if !self.lex_block_comment() {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    /// Lexes a line comment: `// ...`
    fn lex_line_comment(&mut self) {
        let start = self.current_position();
        self.bump(2);
        self.advance_while(|c| c != '\n');
        let text = self.text_for(self.span_from(start));
        self.pending_trivia
            .push(Trivia::LineComment(EcoString::from(text)));
    }

    /// Lexes a block comment: `/* ... */`
    ///
    /// Returns `false` when the comment runs into end of input; the next
    /// token is then a lexical error covering the comment.
    fn lex_block_comment(&mut self) -> bool {
        let start = self.current_position();
        let line = self.line;
        let column = self.current_column();
        self.bump(2);

        loop {
            match self.peek_char() {
                None => {
                    self.unterminated_comment = Some((start, line, column));
                    return false;
                }
                Some('*') if self.peek_char_n(1) == Some('/') => {
                    self.bump(2);
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }

        let text = self.text_for(self.span_from(start));
        self.pending_trivia
            .push(Trivia::BlockComment(EcoString::from(text)));
        true
    }

    /// Lexes the next token, including the end-of-input token.
    ///
    /// Once the input is exhausted every further call returns
    /// [`TokenKind::Eof`] positioned at the end of the text.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let leading_trivia = std::mem::take(&mut self.pending_trivia);

        if let Some((start, line, column)) = self.unterminated_comment.take() {
            let kind = TokenKind::Error(LexErrorKind::UnterminatedComment);
            return Token::with_trivia(kind, self.span_from(start), leading_trivia, Vec::new())
                .at(line, column);
        }

        let start = self.current_position();
        let line = self.line;
        let column = self.current_column();

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => self.lex_token_kind(c, start),
        };
        let span = self.span_from(start);

        // Collect trailing trivia (whitespace on same line, up to newline)
        self.collect_trailing_trivia();
        let trailing_trivia = std::mem::take(&mut self.pending_trivia);

        Token::with_trivia(kind, span, leading_trivia, trailing_trivia).at(line, column)
    }

    /// Collects trailing trivia (same-line whitespace and a line comment).
    fn collect_trailing_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ' | '\t') => {
                    let start = self.current_position();
                    self.advance_while(|c| matches!(c, ' ' | '\t'));
                    let text = self.text_for(self.span_from(start));
                    self.pending_trivia
                        .push(Trivia::Whitespace(EcoString::from(text)));
                }
                Some('/') if self.peek_char_n(1) == Some('/') => {
                    self.lex_line_comment();
                    break; // Line comment ends trailing trivia
                }
                _ => break,
            }
        }
    }

    /// Lexes a token kind based on the first character.
    fn lex_token_kind(&mut self, c: char, start: u32) -> TokenKind {
        match c {
            'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier_or_keyword(),
            '0'..='9' => self.lex_number(),
            '.' if self.peek_char_n(1).is_some_and(|d| d.is_ascii_digit()) => {
                self.lex_fraction()
            }
            '\'' => self.lex_string(),

            '(' => self.single(TokenKind::LeftParen),
            ')' => self.single(TokenKind::RightParen),
            '[' => self.single(TokenKind::LeftBracket),
            ']' => self.single(TokenKind::RightBracket),
            '{' => self.single(TokenKind::LeftBrace),
            '}' => self.single(TokenKind::RightBrace),
            ';' => self.single(TokenKind::Semicolon),
            ',' => self.single(TokenKind::Comma),
            '.' => self.single(TokenKind::Dot),
            ':' => self.single(TokenKind::Colon),
            '@' => self.single(TokenKind::At),
            '~' => self.single(TokenKind::Tilde),
            // Never joined here: `>=`, `>>` and `>>>` are assembled by the
            // parser so `List<List<Integer>>` closes two type argument lists.
            '>' => self.single(TokenKind::Greater),

            '?' => self.lex_operator(&[
                ("?.", TokenKind::SafeDot),
                ("??", TokenKind::QuestionQuestion),
                ("?", TokenKind::Question),
            ]),
            '=' => self.lex_operator(&[
                ("===", TokenKind::EqualEqualEqual),
                ("==", TokenKind::EqualEqual),
                ("=>", TokenKind::MapsTo),
                ("=", TokenKind::Assign),
            ]),
            '!' => self.lex_operator(&[
                ("!==", TokenKind::NotEqualEqual),
                ("!=", TokenKind::NotEqual),
                ("!", TokenKind::Bang),
            ]),
            '<' => self.lex_operator(&[
                ("<<=", TokenKind::ShiftLeftAssign),
                ("<<", TokenKind::ShiftLeft),
                ("<=", TokenKind::LessEqual),
                ("<>", TokenKind::LessGreater),
                ("<", TokenKind::Less),
            ]),
            '+' => self.lex_operator(&[
                ("++", TokenKind::Increment),
                ("+=", TokenKind::PlusAssign),
                ("+", TokenKind::Plus),
            ]),
            '-' => self.lex_operator(&[
                ("--", TokenKind::Decrement),
                ("-=", TokenKind::MinusAssign),
                ("-", TokenKind::Minus),
            ]),
            '*' => self.lex_operator(&[("*=", TokenKind::StarAssign), ("*", TokenKind::Star)]),
            '/' => self.lex_operator(&[("/=", TokenKind::SlashAssign), ("/", TokenKind::Slash)]),
            '%' => self.lex_operator(&[
                ("%=", TokenKind::PercentAssign),
                ("%", TokenKind::Percent),
            ]),
            '&' => self.lex_operator(&[
                ("&&", TokenKind::AndAnd),
                ("&=", TokenKind::AmpersandAssign),
                ("&", TokenKind::Ampersand),
            ]),
            '|' => self.lex_operator(&[
                ("||", TokenKind::OrOr),
                ("|=", TokenKind::PipeAssign),
                ("|", TokenKind::Pipe),
            ]),
            '^' => self.lex_operator(&[("^=", TokenKind::CaretAssign), ("^", TokenKind::Caret)]),

            // Unknown character - error recovery
            _ => {
                self.advance();
                debug_assert!(self.current_position() > start);
                TokenKind::Error(LexErrorKind::UnexpectedCharacter(c))
            }
        }
    }

    /// Consumes one character and returns `kind`.
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Picks the first (longest) spelling that matches the input.
    ///
    /// `alternatives` must end with the single-character spelling.
    fn lex_operator(&mut self, alternatives: &[(&str, TokenKind)]) -> TokenKind {
        for (spelling, kind) in alternatives {
            if self.at(spelling) {
                self.bump(spelling.len());
                return kind.clone();
            }
        }
        // Unreachable while every table ends with its first character
        let c = self.advance().unwrap_or('\0');
        TokenKind::Error(LexErrorKind::UnexpectedCharacter(c))
    }

    /// Lexes an identifier or a keyword.
    fn lex_identifier_or_keyword(&mut self) -> TokenKind {
        let start = self.current_position();
        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let text = self.text_for(self.span_from(start));
        match Keyword::lookup(text) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(EcoString::from(text)),
        }
    }

    /// Lexes an integer, long, decimal, date or date-time literal.
    fn lex_number(&mut self) -> TokenKind {
        let start = self.current_position();

        let rest = self.source.as_bytes().get(self.position..).unwrap_or(&[]);
        if let Some((len, is_date_time)) = date_literal_len(rest) {
            // Date literals are ASCII, so bytes and characters coincide
            self.bump(len);
            let text = EcoString::from(self.text_for(self.span_from(start)));
            return if is_date_time {
                TokenKind::DateTimeLiteral(text)
            } else {
                TokenKind::DateLiteral(text)
            };
        }

        self.advance_while(|c| c.is_ascii_digit());

        let kind = if self.peek_char() == Some('.')
            && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance(); // consume '.'
            self.advance_while(|c| c.is_ascii_digit());
            if matches!(self.peek_char(), Some('d' | 'D')) {
                self.advance();
            }
            TokenKind::NumberLiteral(EcoString::from(self.text_for(self.span_from(start))))
        } else if matches!(self.peek_char(), Some('l' | 'L')) {
            self.advance();
            TokenKind::LongLiteral(EcoString::from(self.text_for(self.span_from(start))))
        } else {
            TokenKind::IntegerLiteral(EcoString::from(self.text_for(self.span_from(start))))
        };

        // `12abc` is one bad token rather than a number and a name
        if self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
            return TokenKind::Error(LexErrorKind::InvalidNumber);
        }
        kind
    }

    /// Lexes a decimal with no integer part: `.5`
    fn lex_fraction(&mut self) -> TokenKind {
        let start = self.current_position();
        self.advance(); // '.'
        self.advance_while(|c| c.is_ascii_digit());
        if matches!(self.peek_char(), Some('d' | 'D')) {
            self.advance();
        }
        TokenKind::NumberLiteral(EcoString::from(self.text_for(self.span_from(start))))
    }

    /// Lexes a single-quoted string, decoding escapes.
    fn lex_string(&mut self) -> TokenKind {
        self.advance(); // opening quote
        let mut value = String::new();
        let mut invalid_escape = None;

        loop {
            match self.peek_char() {
                None | Some('\n' | '\r') => {
                    return TokenKind::Error(LexErrorKind::UnterminatedString);
                }
                Some('\'') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        None | Some('\n' | '\r') => {
                            return TokenKind::Error(LexErrorKind::UnterminatedString);
                        }
                        Some('u') => {
                            self.advance();
                            match self.lex_unicode_escape() {
                                Some(decoded) => value.push(decoded),
                                None => {
                                    invalid_escape.get_or_insert('u');
                                }
                            }
                        }
                        Some(escape) => {
                            self.advance();
                            match unescape(escape) {
                                Some(decoded) => value.push(decoded),
                                None => {
                                    invalid_escape.get_or_insert(escape);
                                }
                            }
                        }
                    }
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        match invalid_escape {
            Some(escape) => TokenKind::Error(LexErrorKind::InvalidEscape(escape)),
            None => TokenKind::StringLiteral(EcoString::from(value)),
        }
    }

    /// Decodes the four hex digits after `\u`, consuming them only if valid.
    fn lex_unicode_escape(&mut self) -> Option<char> {
        let digits: String = (0..4).filter_map(|n| self.peek_char_n(n)).collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        self.bump(4);
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
    }
}

/// Whitespace the language skips between tokens.
fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{000C}' | '\u{FEFF}')
}

/// Decodes a single-character backslash escape.
fn unescape(escape: char) -> Option<char> {
    let decoded = match escape {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'b' => '\u{0008}',
        'f' => '\u{000C}',
        '\'' => '\'',
        '"' => '"',
        '\\' => '\\',
        _ => return None,
    };
    Some(decoded)
}

/// Measures a date (`2020-01-31`) or date-time (`2020-01-31T10:00:00Z`)
/// literal at the start of `input`.
///
/// Returns the byte length and whether a time part was present. A time part
/// without a zone designator is not part of the literal.
fn date_literal_len(input: &[u8]) -> Option<(usize, bool)> {
    let digits = |from: usize, count: usize| {
        input
            .get(from..from + count)
            .is_some_and(|run| run.iter().all(u8::is_ascii_digit))
    };
    let byte = |at: usize| input.get(at).copied();

    let is_date = digits(0, 4)
        && byte(4) == Some(b'-')
        && digits(5, 2)
        && byte(7) == Some(b'-')
        && digits(8, 2);
    if !is_date {
        return None;
    }

    let has_time = byte(10) == Some(b'T')
        && digits(11, 2)
        && byte(13) == Some(b':')
        && digits(14, 2)
        && byte(16) == Some(b':')
        && digits(17, 2);
    if !has_time {
        return Some((10, false));
    }

    let mut len = 19;
    if byte(len) == Some(b'.') && digits(len + 1, 1) {
        len += 1;
        while digits(len, 1) {
            len += 1;
        }
    }
    match byte(len) {
        Some(b'Z' | b'z') => Some((len + 1, true)),
        Some(b'+' | b'-') if digits(len + 1, 2) => {
            len += 3;
            if byte(len) == Some(b':') && digits(len + 1, 2) {
                len += 3;
            }
            Some((len, true))
        }
        _ => Some((10, false)),
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind().is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

/// Starts lazily tokenizing `source`.
///
/// Tokens are produced on demand; restart by calling this again.
#[must_use]
pub fn tokenize(source: &str) -> Lexer<'_> {
    Lexer::new(source)
}

/// Convenience function to lex source into a vector of tokens (EOF excluded).
#[must_use]
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

/// Convenience function to lex source into a vector of tokens including EOF.
#[must_use]
pub fn lex_with_eof(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let is_eof = token.kind().is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to lex and extract just the token kinds.
    fn lex_kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(Token::into_kind).collect()
    }

    fn ident(name: &str) -> TokenKind {
        TokenKind::Identifier(name.into())
    }

    #[test]
    fn lex_empty() {
        assert!(lex("").is_empty());
        assert!(lex("   \n\t").is_empty());
        assert!(lex("// comment").is_empty());
        assert!(lex("/* block */").is_empty());
    }

    #[test]
    fn lex_keywords_any_case() {
        assert_eq!(
            lex_kinds("class CLASS Class"),
            vec![TokenKind::Keyword(Keyword::Class); 3]
        );
        assert_eq!(
            lex_kinds("testMethod WebService"),
            vec![
                TokenKind::Keyword(Keyword::TestMethod),
                TokenKind::Keyword(Keyword::WebService),
            ]
        );
    }

    #[test]
    fn lex_contextual_words_as_identifiers() {
        assert_eq!(
            lex_kinds("on when USER_MODE system with sharing"),
            vec![
                ident("on"),
                ident("when"),
                ident("USER_MODE"),
                ident("system"),
                ident("with"),
                ident("sharing"),
            ]
        );
    }

    #[test]
    fn lex_keyword_preserves_casing_in_span() {
        let source = "Public";
        let tokens = lex(source);
        assert_eq!(tokens[0].kind(), &TokenKind::Keyword(Keyword::Public));
        assert_eq!(tokens[0].text(source), "Public");
    }

    #[test]
    fn lex_numbers() {
        assert_eq!(
            lex_kinds("42 42L 3.14 2.5d .5 0"),
            vec![
                TokenKind::IntegerLiteral("42".into()),
                TokenKind::LongLiteral("42L".into()),
                TokenKind::NumberLiteral("3.14".into()),
                TokenKind::NumberLiteral("2.5d".into()),
                TokenKind::NumberLiteral(".5".into()),
                TokenKind::IntegerLiteral("0".into()),
            ]
        );
    }

    #[test]
    fn lex_sign_is_separate_token() {
        assert_eq!(
            lex_kinds("-1 +2l"),
            vec![
                TokenKind::Minus,
                TokenKind::IntegerLiteral("1".into()),
                TokenKind::Plus,
                TokenKind::LongLiteral("2l".into()),
            ]
        );
    }

    #[test]
    fn lex_invalid_number_suffix() {
        assert_eq!(
            lex_kinds("12abc x"),
            vec![TokenKind::Error(LexErrorKind::InvalidNumber), ident("x")]
        );
    }

    #[test]
    fn lex_date_literals() {
        assert_eq!(
            lex_kinds("2020-01-01 2020-01-01T12:00:00Z 2021-06-30T08:15:00.250+05:30"),
            vec![
                TokenKind::DateLiteral("2020-01-01".into()),
                TokenKind::DateTimeLiteral("2020-01-01T12:00:00Z".into()),
                TokenKind::DateTimeLiteral("2021-06-30T08:15:00.250+05:30".into()),
            ]
        );
    }

    #[test]
    fn lex_date_time_without_zone_stops_at_date() {
        let kinds = lex_kinds("2020-01-01T12:00:00");
        assert_eq!(kinds[0], TokenKind::DateLiteral("2020-01-01".into()));
        assert_eq!(kinds[1], ident("T12"));
    }

    #[test]
    fn lex_arithmetic_is_not_a_date() {
        assert_eq!(
            lex_kinds("2020-1"),
            vec![
                TokenKind::IntegerLiteral("2020".into()),
                TokenKind::Minus,
                TokenKind::IntegerLiteral("1".into()),
            ]
        );
    }

    #[test]
    fn lex_currency_value_parts() {
        assert_eq!(
            lex_kinds("USD100.01 USD100.name"),
            vec![
                ident("USD100"),
                TokenKind::NumberLiteral(".01".into()),
                ident("USD100"),
                TokenKind::Dot,
                ident("name"),
            ]
        );
    }

    #[test]
    fn lex_strings_with_escapes() {
        assert_eq!(
            lex_kinds(r"'hello' 'it\'s' 'a\nb' '\u0041' ''"),
            vec![
                TokenKind::StringLiteral("hello".into()),
                TokenKind::StringLiteral("it's".into()),
                TokenKind::StringLiteral("a\nb".into()),
                TokenKind::StringLiteral("A".into()),
                TokenKind::StringLiteral("".into()),
            ]
        );
    }

    #[test]
    fn lex_string_errors() {
        assert_eq!(
            lex_kinds("'open"),
            vec![TokenKind::Error(LexErrorKind::UnterminatedString)]
        );
        assert_eq!(
            lex_kinds(r"'bad\q' x"),
            vec![TokenKind::Error(LexErrorKind::InvalidEscape('q')), ident("x")]
        );
        let kinds = lex_kinds("'line\nnext");
        assert_eq!(kinds[0], TokenKind::Error(LexErrorKind::UnterminatedString));
        assert_eq!(kinds[1], ident("next"));
    }

    #[test]
    fn lex_unknown_character_continues() {
        assert_eq!(
            lex_kinds("a # b"),
            vec![
                ident("a"),
                TokenKind::Error(LexErrorKind::UnexpectedCharacter('#')),
                ident("b"),
            ]
        );
    }

    #[test]
    fn lex_unterminated_block_comment() {
        let tokens = lex_with_eof("x /* never closed");
        assert_eq!(tokens.len(), 3);
        assert_eq!(
            tokens[1].kind(),
            &TokenKind::Error(LexErrorKind::UnterminatedComment)
        );
        assert_eq!(tokens[1].span(), Span::new(2, 17));
        assert!(tokens[2].kind().is_eof());
    }

    #[test]
    fn lex_operators_longest_match() {
        assert_eq!(
            lex_kinds("=== == => = !== != ! <<= << <= <> < ?. ?? ? ++ += --"),
            vec![
                TokenKind::EqualEqualEqual,
                TokenKind::EqualEqual,
                TokenKind::MapsTo,
                TokenKind::Assign,
                TokenKind::NotEqualEqual,
                TokenKind::NotEqual,
                TokenKind::Bang,
                TokenKind::ShiftLeftAssign,
                TokenKind::ShiftLeft,
                TokenKind::LessEqual,
                TokenKind::LessGreater,
                TokenKind::Less,
                TokenKind::SafeDot,
                TokenKind::QuestionQuestion,
                TokenKind::Question,
                TokenKind::Increment,
                TokenKind::PlusAssign,
                TokenKind::Decrement,
            ]
        );
    }

    #[test]
    fn lex_greater_is_always_single() {
        let tokens = lex("Map<Id, List<Account>> >= >>>");
        let greaters: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind() == &TokenKind::Greater)
            .collect();
        assert_eq!(greaters.len(), 6);
        assert!(greaters[0].span().touches(greaters[1].span()));
    }

    #[test]
    fn lex_positions() {
        let source = "a\n  bb\n\tc";
        let tokens = lex(source);
        let positions: Vec<_> = tokens.iter().map(|t| (t.line(), t.column())).collect();
        assert_eq!(positions, vec![(1, 0), (2, 2), (3, 1)]);
    }

    #[test]
    fn lex_columns_count_characters() {
        let tokens = lex("'é' x\nab  y");
        let positions: Vec<_> = tokens.iter().map(|t| (t.line(), t.column())).collect();
        assert_eq!(positions, vec![(1, 0), (1, 4), (2, 0), (2, 4)]);

        let line = "a ".repeat(20_000);
        let tokens = lex(&line);
        assert_eq!(tokens.len(), 20_000);
        assert_eq!(tokens.last().map(Token::column), Some(39_998));
    }

    #[test]
    fn lex_trivia_attachment() {
        let tokens = lex("// lead\nx // trail\ny");
        assert!(tokens[0].has_leading_comment());
        assert!(
            tokens[0]
                .trailing_trivia()
                .iter()
                .any(|t| t.as_str() == "// trail")
        );
        assert!(!tokens[1].has_leading_comment());
    }

    #[test]
    fn eof_repeats() {
        let mut lexer = tokenize("x");
        assert_eq!(lexer.next_token().kind(), &ident("x"));
        assert!(lexer.next_token().kind().is_eof());
        let eof = lexer.next_token();
        assert!(eof.kind().is_eof());
        assert_eq!(eof.span(), Span::new(1, 1));
    }

    #[test]
    fn date_literal_len_shapes() {
        assert_eq!(date_literal_len(b"2020-01-01"), Some((10, false)));
        assert_eq!(date_literal_len(b"2020-01-01T00:00:00Z"), Some((20, true)));
        assert_eq!(date_literal_len(b"2020-01-01T00:00:00-08"), Some((22, true)));
        assert_eq!(date_literal_len(b"2020-1-01"), None);
        assert_eq!(date_literal_len(b"20"), None);
    }
}
