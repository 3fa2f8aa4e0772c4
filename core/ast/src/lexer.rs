//! Lexer for PawLang source text.
//!
//! Converts UTF-8 source into a token sequence with line/column tracking.
//! Two details set this lexer apart from a generic scanner:
//!
//! - **Statement newlines**: a newline token is emitted only where it can
//!   terminate a statement. Newlines are suppressed inside unclosed `(` / `[`
//!   and after continuation tokens (binary operators, `,`, `.`, `->`, ...),
//!   so the parser treats `Newline` and `;` interchangeably.
//! - **String interpolation**: an unescaped `$name` or `${expression}` splits
//!   a string literal into literal and expression segments. The lexer emits
//!   the segment sequence (`InterpStart` ... `InterpEnd`) and the parser
//!   reassembles it, keeping the grammar context-free.

use crate::errors::LexError;
use crate::nodes::Location;
use crate::token::{Token, TokenKind};

/// Integer/float type suffixes accepted after a number literal.
const NUMBER_SUFFIXES: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "u8", "u16", "u32", "u64", "u128", "f32", "f64",
];

/// Tokenizes a complete source text.
///
/// # Errors
///
/// Returns the first [`LexError`] encountered; the token stream is not
/// usable after an error.
pub fn tokenize(text: &str, source_name: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(text, source_name, 1, 1);
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    source: String,
    tokens: Vec<Token>,
    paren_depth: u32,
    bracket_depth: u32,
}

impl Lexer {
    fn new(text: &str, source_name: &str, line: u32, column: u32) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line,
            column,
            source: source_name.to_string(),
            tokens: Vec::new(),
            paren_depth: 0,
            bracket_depth: 0,
        }
    }

    fn run(&mut self) -> Result<(), LexError> {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '\n' => {
                    self.handle_newline();
                    self.bump();
                }
                '/' if self.peek_at(1) == Some('/') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '/' if self.peek_at(1) == Some('*') => {
                    self.skip_block_comment()?;
                }
                '"' => self.lex_string()?,
                '\'' => self.lex_char()?,
                'r' if self.peek_at(1) == Some('"') => self.lex_raw_string()?,
                c if c.is_ascii_digit() => self.lex_number()?,
                c if c.is_alphabetic() || c == '_' => self.lex_identifier(),
                _ => self.lex_operator()?,
            }
        }
        let (line, column) = (self.line, self.column);
        self.push(TokenKind::Eof, String::new(), line, column);
        Ok(())
    }

    // ---- cursor helpers ----

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.column, self.source.clone())
    }

    fn push(&mut self, kind: TokenKind, lexeme: String, line: u32, column: u32) {
        match kind {
            TokenKind::LParen => self.paren_depth += 1,
            TokenKind::RParen => self.paren_depth = self.paren_depth.saturating_sub(1),
            TokenKind::LBracket => self.bracket_depth += 1,
            TokenKind::RBracket => self.bracket_depth = self.bracket_depth.saturating_sub(1),
            _ => {}
        }
        self.tokens.push(Token::new(kind, lexeme, line, column));
    }

    /// Emits a statement-terminating newline token if the position permits
    /// one: outside `(`/`[` groups and after a token that can end a
    /// statement. Consecutive newline tokens collapse into one.
    fn handle_newline(&mut self) {
        if self.paren_depth > 0 || self.bracket_depth > 0 {
            return;
        }
        let Some(last) = self.tokens.last() else {
            return;
        };
        if last.kind == TokenKind::Newline || !last.ends_statement() {
            return;
        }
        let (line, column) = (self.line, self.column);
        self.push(TokenKind::Newline, "\n".to_string(), line, column);
    }

    // ---- comments ----

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.location();
        self.bump();
        self.bump();
        let mut depth = 1u32;
        while depth > 0 {
            match (self.peek(), self.peek_at(1)) {
                (Some('/'), Some('*')) => {
                    depth += 1;
                    self.bump();
                    self.bump();
                }
                (Some('*'), Some('/')) => {
                    depth -= 1;
                    self.bump();
                    self.bump();
                }
                (Some(_), _) => {
                    self.bump();
                }
                (None, _) => return Err(LexError::UnterminatedComment { location: start }),
            }
        }
        Ok(())
    }

    // ---- literals ----

    fn lex_number(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();

        if self.peek() == Some('0')
            && matches!(self.peek_at(1), Some('x') | Some('X') | Some('b') | Some('B'))
        {
            text.push(self.bump().unwrap());
            let marker = self.bump().unwrap();
            text.push(marker);
            let is_hex = matches!(marker, 'x' | 'X');
            let mut digits = 0u32;
            while let Some(c) = self.peek() {
                let valid = if is_hex {
                    c.is_ascii_hexdigit()
                } else {
                    c == '0' || c == '1'
                };
                if !valid {
                    break;
                }
                text.push(self.bump().unwrap());
                digits += 1;
            }
            if digits == 0 {
                return Err(LexError::InvalidNumber {
                    literal: text,
                    location: Location::new(line, column, self.source.clone()),
                });
            }
            let suffix = self.lex_number_suffix(&mut text, line, column)?;
            let lexeme = match suffix {
                Some(s) => format!("{text}{s}"),
                None => text,
            };
            self.push(TokenKind::Int, lexeme, line, column);
            return Ok(());
        }

        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            text.push(self.bump().unwrap());
        }

        let mut is_float = false;
        // A dot makes a float only when followed by a digit; `1..5` stays a
        // range over integers.
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            text.push(self.bump().unwrap());
            while let Some(c) = self.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                text.push(self.bump().unwrap());
            }
        }
        if matches!(self.peek(), Some('e') | Some('E'))
            && (self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
                || (matches!(self.peek_at(1), Some('+') | Some('-'))
                    && self.peek_at(2).is_some_and(|c| c.is_ascii_digit())))
        {
            is_float = true;
            text.push(self.bump().unwrap());
            if matches!(self.peek(), Some('+') | Some('-')) {
                text.push(self.bump().unwrap());
            }
            while let Some(c) = self.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                text.push(self.bump().unwrap());
            }
        }

        let suffix = self.lex_number_suffix(&mut text, line, column)?;
        let kind = if is_float || matches!(suffix.as_deref(), Some("f32") | Some("f64")) {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        let lexeme = match suffix {
            Some(s) => format!("{text}{s}"),
            None => text,
        };
        self.push(kind, lexeme, line, column);
        Ok(())
    }

    /// Consumes an optional type suffix (`i64`, `u8`, `f32`, ...) after a
    /// number. An alphabetic tail that is not a known suffix is an error.
    fn lex_number_suffix(
        &mut self,
        text: &mut String,
        line: u32,
        column: u32,
    ) -> Result<Option<String>, LexError> {
        if !self.peek().is_some_and(|c| c.is_alphabetic()) {
            return Ok(None);
        }
        let mut suffix = String::new();
        while let Some(c) = self.peek() {
            if !c.is_alphanumeric() {
                break;
            }
            suffix.push(self.bump().unwrap());
        }
        if NUMBER_SUFFIXES.contains(&suffix.as_str()) {
            Ok(Some(suffix))
        } else {
            text.push_str(&suffix);
            Err(LexError::InvalidNumber {
                literal: text.clone(),
                location: Location::new(line, column, self.source.clone()),
            })
        }
    }

    fn lex_char(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        let c = match self.peek() {
            Some('\\') => {
                self.bump();
                self.lex_escape('\'')?
            }
            Some(c) => {
                self.bump();
                c
            }
            None => {
                return Err(LexError::UnterminatedString {
                    location: Location::new(line, column, self.source.clone()),
                });
            }
        };
        if self.peek() != Some('\'') {
            return Err(LexError::UnterminatedString {
                location: Location::new(line, column, self.source.clone()),
            });
        }
        self.bump();
        self.push(TokenKind::Char, c.to_string(), line, column);
        Ok(())
    }

    fn lex_escape(&mut self, quote: char) -> Result<char, LexError> {
        let location = self.location();
        let c = self.bump().ok_or_else(|| LexError::UnterminatedString {
            location: location.clone(),
        })?;
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            '$' => '$',
            'u' => {
                if self.peek() != Some('{') {
                    return Err(LexError::InvalidEscape {
                        escape: "u".to_string(),
                        location,
                    });
                }
                self.bump();
                let mut hex = String::new();
                while let Some(h) = self.peek() {
                    if h == '}' {
                        break;
                    }
                    hex.push(self.bump().unwrap());
                }
                self.bump();
                let code =
                    u32::from_str_radix(&hex, 16).map_err(|_| LexError::InvalidEscape {
                        escape: format!("u{{{hex}}}"),
                        location: location.clone(),
                    })?;
                char::from_u32(code).ok_or(LexError::InvalidEscape {
                    escape: format!("u{{{hex}}}"),
                    location,
                })?
            }
            other if other == quote => other,
            other => {
                return Err(LexError::InvalidEscape {
                    escape: other.to_string(),
                    location,
                });
            }
        })
    }

    fn lex_raw_string(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.bump();
                    break;
                }
                Some(_) => value.push(self.bump().unwrap()),
                None => {
                    return Err(LexError::UnterminatedString {
                        location: Location::new(line, column, self.source.clone()),
                    });
                }
            }
        }
        self.push(TokenKind::Str, value, line, column);
        Ok(())
    }

    fn lex_triple_string(&mut self, line: u32, column: u32) -> Result<(), LexError> {
        // Opening `"""` already consumed.
        let mut value = String::new();
        loop {
            if self.peek() == Some('"')
                && self.peek_at(1) == Some('"')
                && self.peek_at(2) == Some('"')
            {
                self.bump();
                self.bump();
                self.bump();
                break;
            }
            match self.bump() {
                Some(c) => value.push(c),
                None => {
                    return Err(LexError::UnterminatedString {
                        location: Location::new(line, column, self.source.clone()),
                    });
                }
            }
        }
        self.push(TokenKind::Str, value, line, column);
        Ok(())
    }

    fn lex_string(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        if self.peek() == Some('"') && self.peek_at(1) == Some('"') {
            self.bump();
            self.bump();
            return self.lex_triple_string(line, column);
        }

        // Segments are collected first; a plain string (the common case)
        // collapses back into a single Str token.
        enum Segment {
            Literal(String),
            Tokens(Vec<Token>),
        }
        let mut segments: Vec<Segment> = Vec::new();
        let mut current = String::new();

        loop {
            match self.peek() {
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    current.push(self.lex_escape('"')?);
                }
                Some('$') => {
                    if self.peek_at(1) == Some('$') {
                        self.bump();
                        self.bump();
                        current.push('$');
                        continue;
                    }
                    let embedded = self.lex_interp_expr(line, column)?;
                    if !current.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut current)));
                    }
                    segments.push(Segment::Tokens(embedded));
                }
                Some(_) => current.push(self.bump().unwrap()),
                None => {
                    return Err(LexError::UnterminatedString {
                        location: Location::new(line, column, self.source.clone()),
                    });
                }
            }
        }

        if segments.is_empty() {
            self.push(TokenKind::Str, current, line, column);
            return Ok(());
        }
        if !current.is_empty() {
            segments.push(Segment::Literal(current));
        }
        self.push(TokenKind::InterpStart, String::new(), line, column);
        for segment in segments {
            match segment {
                Segment::Literal(text) => self.push(TokenKind::StrSegment, text, line, column),
                Segment::Tokens(tokens) => {
                    self.push(TokenKind::InterpExprStart, String::new(), line, column);
                    self.tokens.extend(tokens);
                    self.push(TokenKind::InterpExprEnd, String::new(), line, column);
                }
            }
        }
        self.push(TokenKind::InterpEnd, String::new(), line, column);
        Ok(())
    }

    /// Lexes the expression embedded after a `$` inside a string literal.
    /// `$name` yields a single identifier token; `${...}` is re-lexed
    /// recursively so arbitrary expressions work.
    fn lex_interp_expr(&mut self, line: u32, column: u32) -> Result<Vec<Token>, LexError> {
        self.bump(); // `$`
        if self.peek() == Some('{') {
            self.bump();
            let (start_line, start_column) = (self.line, self.column);
            let mut inner = String::new();
            let mut depth = 1u32;
            loop {
                match self.peek() {
                    Some('{') => {
                        depth += 1;
                        inner.push(self.bump().unwrap());
                    }
                    Some('}') => {
                        depth -= 1;
                        self.bump();
                        if depth == 0 {
                            break;
                        }
                        inner.push('}');
                    }
                    Some(_) => inner.push(self.bump().unwrap()),
                    None => {
                        return Err(LexError::UnterminatedString {
                            location: Location::new(line, column, self.source.clone()),
                        });
                    }
                }
            }
            let mut sub = Lexer::new(&inner, &self.source, start_line, start_column);
            sub.run()?;
            let tokens = sub
                .tokens
                .into_iter()
                .filter(|t| !matches!(t.kind, TokenKind::Eof | TokenKind::Newline))
                .collect();
            return Ok(tokens);
        }

        let (id_line, id_column) = (self.line, self.column);
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !c.is_alphanumeric() && c != '_' {
                break;
            }
            name.push(self.bump().unwrap());
        }
        if name.is_empty() {
            return Err(LexError::UnexpectedChar {
                ch: '$',
                location: Location::new(id_line, id_column, self.source.clone()),
            });
        }
        Ok(vec![Token::new(
            TokenKind::Identifier,
            name,
            id_line,
            id_column,
        )])
    }

    fn lex_identifier(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if !c.is_alphanumeric() && c != '_' {
                break;
            }
            word.push(self.bump().unwrap());
        }
        let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Identifier);
        self.push(kind, word, line, column);
    }

    // ---- operators & punctuation ----

    fn lex_operator(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        let c = self.bump().unwrap();
        let (kind, lexeme) = match c {
            '{' => (TokenKind::LBrace, "{"),
            '}' => (TokenKind::RBrace, "}"),
            '(' => (TokenKind::LParen, "("),
            ')' => (TokenKind::RParen, ")"),
            '[' => (TokenKind::LBracket, "["),
            ']' => (TokenKind::RBracket, "]"),
            ',' => (TokenKind::Comma, ","),
            ';' => (TokenKind::Semicolon, ";"),
            '@' => (TokenKind::At, "@"),
            '?' => (TokenKind::Question, "?"),
            ':' => {
                if self.peek() == Some(':') {
                    self.bump();
                    (TokenKind::PathSep, "::")
                } else {
                    (TokenKind::Colon, ":")
                }
            }
            '.' => {
                if self.peek() == Some('.') {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        (TokenKind::DotDotEq, "..=")
                    } else {
                        (TokenKind::DotDot, "..")
                    }
                } else {
                    (TokenKind::Dot, ".")
                }
            }
            '-' => {
                if self.peek() == Some('>') {
                    self.bump();
                    (TokenKind::Arrow, "->")
                } else if self.peek() == Some('=') {
                    self.bump();
                    (TokenKind::MinusEq, "-=")
                } else {
                    (TokenKind::Minus, "-")
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.bump();
                    (TokenKind::EqEq, "==")
                } else if self.peek() == Some('>') {
                    self.bump();
                    (TokenKind::FatArrow, "=>")
                } else {
                    (TokenKind::Assign, "=")
                }
            }
            '+' => {
                if self.peek() == Some('=') {
                    self.bump();
                    (TokenKind::PlusEq, "+=")
                } else {
                    (TokenKind::Plus, "+")
                }
            }
            '*' => {
                if self.peek() == Some('=') {
                    self.bump();
                    (TokenKind::StarEq, "*=")
                } else {
                    (TokenKind::Star, "*")
                }
            }
            '/' => {
                if self.peek() == Some('=') {
                    self.bump();
                    (TokenKind::SlashEq, "/=")
                } else {
                    (TokenKind::Slash, "/")
                }
            }
            '%' => {
                if self.peek() == Some('=') {
                    self.bump();
                    (TokenKind::PercentEq, "%=")
                } else {
                    (TokenKind::Percent, "%")
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    (TokenKind::Le, "<=")
                } else {
                    (TokenKind::Lt, "<")
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    (TokenKind::Ge, ">=")
                } else {
                    (TokenKind::Gt, ">")
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    (TokenKind::NotEq, "!=")
                } else {
                    (TokenKind::Bang, "!")
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.bump();
                    (TokenKind::AndAnd, "&&")
                } else {
                    (TokenKind::Amp, "&")
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.bump();
                    (TokenKind::OrOr, "||")
                } else {
                    (TokenKind::Pipe, "|")
                }
            }
            other => {
                return Err(LexError::UnexpectedChar {
                    ch: other,
                    location: Location::new(line, column, self.source.clone()),
                });
            }
        };
        self.push(kind, lexeme.to_string(), line, column);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text, "")
            .expect("lexing should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_keywords_and_identifiers() {
        assert_eq!(
            kinds("fn main"),
            vec![TokenKind::KwFn, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn lex_multi_char_operators() {
        assert_eq!(
            kinds("a :: b -> c => d ..= e && f || g == h != i <= j >= k"),
            vec![
                TokenKind::Identifier,
                TokenKind::PathSep,
                TokenKind::Identifier,
                TokenKind::Arrow,
                TokenKind::Identifier,
                TokenKind::FatArrow,
                TokenKind::Identifier,
                TokenKind::DotDotEq,
                TokenKind::Identifier,
                TokenKind::AndAnd,
                TokenKind::Identifier,
                TokenKind::OrOr,
                TokenKind::Identifier,
                TokenKind::EqEq,
                TokenKind::Identifier,
                TokenKind::NotEq,
                TokenKind::Identifier,
                TokenKind::Le,
                TokenKind::Identifier,
                TokenKind::Ge,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lex_number_radixes() {
        let tokens = tokenize("42 0xFF 0b1010 3.25 1e9", "").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].lexeme, "42");
        assert_eq!(tokens[1].kind, TokenKind::Int);
        assert_eq!(tokens[1].lexeme, "0xFF");
        assert_eq!(tokens[2].kind, TokenKind::Int);
        assert_eq!(tokens[2].lexeme, "0b1010");
        assert_eq!(tokens[3].kind, TokenKind::Float);
        assert_eq!(tokens[4].kind, TokenKind::Float);
    }

    #[test]
    fn lex_number_suffix() {
        let tokens = tokenize("2147483648i64", "").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].lexeme, "2147483648i64");
    }

    #[test]
    fn lex_invalid_suffix_rejected() {
        let err = tokenize("1abc", "").unwrap_err();
        assert!(matches!(err, LexError::InvalidNumber { .. }));
    }

    #[test]
    fn range_is_not_a_float() {
        assert_eq!(
            kinds("1..5"),
            vec![
                TokenKind::Int,
                TokenKind::DotDot,
                TokenKind::Int,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lex_char_escapes() {
        let tokens = tokenize(r"'\n' '\u{41}'", "").unwrap();
        assert_eq!(tokens[0].lexeme, "\n");
        assert_eq!(tokens[1].lexeme, "A");
    }

    #[test]
    fn lex_plain_string() {
        let tokens = tokenize(r#""hello\nworld""#, "").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].lexeme, "hello\nworld");
    }

    #[test]
    fn lex_interpolated_string_segments() {
        let tokens = tokenize(r#""x = ${a + 1}!""#, "").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::InterpStart,
                TokenKind::StrSegment,
                TokenKind::InterpExprStart,
                TokenKind::Identifier,
                TokenKind::Plus,
                TokenKind::Int,
                TokenKind::InterpExprEnd,
                TokenKind::StrSegment,
                TokenKind::InterpEnd,
                TokenKind::Eof
            ]
        );
        assert_eq!(tokens[1].lexeme, "x = ");
        assert_eq!(tokens[7].lexeme, "!");
    }

    #[test]
    fn lex_dollar_name_shorthand() {
        let tokens = tokenize(r#""hi $name""#, "").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::InterpStart);
        assert_eq!(tokens[2].kind, TokenKind::InterpExprStart);
        assert_eq!(tokens[3].lexeme, "name");
    }

    #[test]
    fn dollar_dollar_escapes() {
        let tokens = tokenize(r#""costs $$5""#, "").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].lexeme, "costs $5");
    }

    #[test]
    fn lex_raw_and_triple_strings() {
        let tokens = tokenize(r#"r"a\nb""#, "").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].lexeme, "a\\nb");

        let tokens = tokenize("\"\"\"multi\nline\"\"\"", "").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].lexeme, "multi\nline");
    }

    #[test]
    fn nested_block_comments() {
        assert_eq!(
            kinds("a /* one /* two */ still */ b"),
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_block_comment() {
        let err = tokenize("/* nope", "").unwrap_err();
        assert!(matches!(err, LexError::UnterminatedComment { .. }));
    }

    #[test]
    fn newline_terminates_statement() {
        assert_eq!(
            kinds("let x = 1\nlet y = 2"),
            vec![
                TokenKind::KwLet,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Int,
                TokenKind::Newline,
                TokenKind::KwLet,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Int,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn newline_suppressed_after_operator() {
        assert_eq!(
            kinds("a +\nb"),
            vec![
                TokenKind::Identifier,
                TokenKind::Plus,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn newline_suppressed_inside_parens() {
        assert_eq!(
            kinds("f(\na\n)"),
            vec![
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn token_positions() {
        let tokens = tokenize("let x\n  y", "main.paw").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 5));
        // `y` is on line 2, column 3.
        let y = tokens
            .iter()
            .find(|t| t.lexeme == "y")
            .expect("y token present");
        assert_eq!((y.line, y.column), (2, 3));
    }
}
