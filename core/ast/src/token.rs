//! Token types for the PawLang lexer and parser.
//!
//! This module defines the vocabulary of the language at the token level.
//! Tokens are transient: the lexer produces them, the parser consumes them,
//! and nothing downstream retains them.

use core::fmt;
use std::fmt::{Display, Formatter};

/// A single lexical token with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The raw text of the token. For string-like tokens this is the
    /// unescaped content, not the source spelling.
    pub lexeme: String,
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    /// Returns true if this token can end a statement, meaning a following
    /// newline acts as a terminator rather than a continuation.
    #[must_use = "this is a pure check with no side effects"]
    pub fn ends_statement(&self) -> bool {
        !matches!(
            self.kind,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Le
                | TokenKind::Gt
                | TokenKind::Ge
                | TokenKind::Assign
                | TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::StarEq
                | TokenKind::SlashEq
                | TokenKind::PercentEq
                | TokenKind::AndAnd
                | TokenKind::OrOr
                | TokenKind::Amp
                | TokenKind::Pipe
                | TokenKind::Comma
                | TokenKind::Dot
                | TokenKind::DotDot
                | TokenKind::DotDotEq
                | TokenKind::Colon
                | TokenKind::PathSep
                | TokenKind::Arrow
                | TokenKind::FatArrow
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::KwElse
        )
    }
}

/// The closed set of token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    KwFn,
    KwLet,
    KwMut,
    KwType,
    KwStruct,
    KwEnum,
    KwTrait,
    KwImpl,
    KwIf,
    KwElse,
    KwLoop,
    KwBreak,
    KwContinue,
    KwReturn,
    KwIs,
    KwAs,
    KwAsync,
    KwAwait,
    KwImport,
    KwPub,
    KwIn,
    KwSelfValue,
    KwSelfType,
    KwTrue,
    KwFalse,

    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    PathSep,
    Dot,
    DotDot,
    DotDotEq,
    Arrow,
    FatArrow,
    Pipe,
    Amp,
    AndAnd,
    OrOr,
    Bang,
    Question,
    At,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    // Literals
    Int,
    Float,
    Char,
    Str,
    /// Literal text chunk inside an interpolated string.
    StrSegment,
    /// Marks the start of an interpolated string.
    InterpStart,
    /// Marks the start of an embedded `${...}` / `$name` expression.
    InterpExprStart,
    /// Marks the end of an embedded expression.
    InterpExprEnd,
    /// Marks the end of an interpolated string.
    InterpEnd,

    Identifier,

    /// Statement-terminating newline. Only emitted where a newline may end a
    /// statement; suppressed inside `(` / `[` and after continuation tokens.
    Newline,
    Eof,
}

impl TokenKind {
    /// Looks up a keyword by its source spelling.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn keyword(word: &str) -> Option<TokenKind> {
        Some(match word {
            "fn" => TokenKind::KwFn,
            "let" => TokenKind::KwLet,
            "mut" => TokenKind::KwMut,
            "type" => TokenKind::KwType,
            "struct" => TokenKind::KwStruct,
            "enum" => TokenKind::KwEnum,
            "trait" => TokenKind::KwTrait,
            "impl" => TokenKind::KwImpl,
            "if" => TokenKind::KwIf,
            "else" => TokenKind::KwElse,
            "loop" => TokenKind::KwLoop,
            "break" => TokenKind::KwBreak,
            "continue" => TokenKind::KwContinue,
            "return" => TokenKind::KwReturn,
            "is" => TokenKind::KwIs,
            "as" => TokenKind::KwAs,
            "async" => TokenKind::KwAsync,
            "await" => TokenKind::KwAwait,
            "import" => TokenKind::KwImport,
            "pub" => TokenKind::KwPub,
            "in" => TokenKind::KwIn,
            "self" => TokenKind::KwSelfValue,
            "Self" => TokenKind::KwSelfType,
            "true" => TokenKind::KwTrue,
            "false" => TokenKind::KwFalse,
            _ => return None,
        })
    }

    /// Human-readable name used in diagnostics.
    #[must_use = "returns the display name without modifying self"]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TokenKind::KwFn => "`fn`",
            TokenKind::KwLet => "`let`",
            TokenKind::KwMut => "`mut`",
            TokenKind::KwType => "`type`",
            TokenKind::KwStruct => "`struct`",
            TokenKind::KwEnum => "`enum`",
            TokenKind::KwTrait => "`trait`",
            TokenKind::KwImpl => "`impl`",
            TokenKind::KwIf => "`if`",
            TokenKind::KwElse => "`else`",
            TokenKind::KwLoop => "`loop`",
            TokenKind::KwBreak => "`break`",
            TokenKind::KwContinue => "`continue`",
            TokenKind::KwReturn => "`return`",
            TokenKind::KwIs => "`is`",
            TokenKind::KwAs => "`as`",
            TokenKind::KwAsync => "`async`",
            TokenKind::KwAwait => "`await`",
            TokenKind::KwImport => "`import`",
            TokenKind::KwPub => "`pub`",
            TokenKind::KwIn => "`in`",
            TokenKind::KwSelfValue => "`self`",
            TokenKind::KwSelfType => "`Self`",
            TokenKind::KwTrue => "`true`",
            TokenKind::KwFalse => "`false`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::PathSep => "`::`",
            TokenKind::Dot => "`.`",
            TokenKind::DotDot => "`..`",
            TokenKind::DotDotEq => "`..=`",
            TokenKind::Arrow => "`->`",
            TokenKind::FatArrow => "`=>`",
            TokenKind::Pipe => "`|`",
            TokenKind::Amp => "`&`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
            TokenKind::Bang => "`!`",
            TokenKind::Question => "`?`",
            TokenKind::At => "`@`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::Le => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::Ge => "`>=`",
            TokenKind::Assign => "`=`",
            TokenKind::PlusEq => "`+=`",
            TokenKind::MinusEq => "`-=`",
            TokenKind::StarEq => "`*=`",
            TokenKind::SlashEq => "`/=`",
            TokenKind::PercentEq => "`%=`",
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::Char => "char literal",
            TokenKind::Str => "string literal",
            TokenKind::StrSegment => "string segment",
            TokenKind::InterpStart => "interpolated string",
            TokenKind::InterpExprStart => "`${`",
            TokenKind::InterpExprEnd => "`}`",
            TokenKind::InterpEnd => "end of interpolated string",
            TokenKind::Identifier => "identifier",
            TokenKind::Newline => "newline",
            TokenKind::Eof => "end of file",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
