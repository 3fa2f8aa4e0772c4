//! Error types for the front end: source loading, lexing, parsing and
//! module linking.
//!
//! Every error that points at source text carries a [`Location`]. Formatting
//! is left to the driver; these types only provide structured data and a
//! stable `Display` form.

use std::path::PathBuf;

use thiserror::Error;

use crate::nodes::Location;
use crate::token::TokenKind;

/// Errors raised while resolving and reading the module graph.
#[derive(Debug, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum LoadError {
    /// An `import` did not resolve to a file on disk.
    #[error("module `{module}` not found: tried {} and {}", tried_file.display(), tried_dir.display())]
    FileNotFound {
        module: String,
        tried_file: PathBuf,
        tried_dir: PathBuf,
    },

    /// The import graph contains a cycle.
    #[error("cyclic import: {}", chain.join(" -> "))]
    CyclicImport { chain: Vec<String> },

    /// Reading a source file failed.
    #[error("failed to read {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the lexer. All carry the exact source location.
#[derive(Debug, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum LexError {
    #[error("{location}: unterminated string literal")]
    UnterminatedString { location: Location },

    #[error("{location}: unterminated block comment")]
    UnterminatedComment { location: Location },

    #[error("{location}: invalid escape sequence `\\{escape}`")]
    InvalidEscape { escape: String, location: Location },

    #[error("{location}: invalid number literal `{literal}`")]
    InvalidNumber { literal: String, location: Location },

    #[error("{location}: unexpected character `{ch}`")]
    UnexpectedChar { ch: char, location: Location },
}

impl LexError {
    /// Returns the source location associated with this error.
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            LexError::UnterminatedString { location }
            | LexError::UnterminatedComment { location }
            | LexError::InvalidEscape { location, .. }
            | LexError::InvalidNumber { location, .. }
            | LexError::UnexpectedChar { location, .. } => location,
        }
    }
}

/// Errors raised by the parser. The parser stops at the first error; there
/// is no recovery beyond skipping to the next statement terminator.
#[derive(Debug, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum ParseError {
    #[error("{location}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        location: Location,
    },

    #[error("{location}: unclosed delimiter {delimiter}")]
    UnclosedDelimiter {
        delimiter: TokenKind,
        location: Location,
    },

    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    /// Returns the source location associated with this error.
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            ParseError::UnexpectedToken { location, .. }
            | ParseError::UnclosedDelimiter { location, .. } => location,
            ParseError::Lex(lex) => lex.location(),
        }
    }
}

/// Errors raised while merging module ASTs into a single program.
#[derive(Debug, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum LinkError {
    /// The imported item does not exist in the target module, or exists but
    /// is not marked `pub`.
    #[error("{location}: module `{path}` does not export `{item}`")]
    UnresolvedImport {
        path: String,
        item: String,
        location: Location,
    },

    /// Two items with the same name ended up visible in one scope.
    #[error("{location}: name `{name}` is defined more than once")]
    NameConflict { name: String, location: Location },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location {
            line: 3,
            column: 7,
            source: String::new(),
        }
    }

    #[test]
    fn display_unterminated_string() {
        let err = LexError::UnterminatedString { location: loc() };
        assert_eq!(err.to_string(), "3:7: unterminated string literal");
    }

    #[test]
    fn display_invalid_escape() {
        let err = LexError::InvalidEscape {
            escape: "q".to_string(),
            location: loc(),
        };
        assert_eq!(err.to_string(), "3:7: invalid escape sequence `\\q`");
    }

    #[test]
    fn display_unexpected_char() {
        let err = LexError::UnexpectedChar {
            ch: '#',
            location: loc(),
        };
        assert_eq!(err.to_string(), "3:7: unexpected character `#`");
    }

    #[test]
    fn display_unexpected_token() {
        let err = ParseError::UnexpectedToken {
            expected: "`{`".to_string(),
            found: TokenKind::Semicolon,
            location: loc(),
        };
        assert_eq!(err.to_string(), "3:7: expected `{`, found `;`");
    }

    #[test]
    fn display_cyclic_import() {
        let err = LoadError::CyclicImport {
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "cyclic import: a -> b -> a");
    }

    #[test]
    fn display_unresolved_import() {
        let err = LinkError::UnresolvedImport {
            path: "math.vec".to_string(),
            item: "dot".to_string(),
            location: loc(),
        };
        assert_eq!(
            err.to_string(),
            "3:7: module `math.vec` does not export `dot`"
        );
    }

    #[test]
    fn display_name_conflict() {
        let err = LinkError::NameConflict {
            name: "Vec".to_string(),
            location: loc(),
        };
        assert_eq!(err.to_string(), "3:7: name `Vec` is defined more than once");
    }

    #[test]
    fn lex_error_location_accessor() {
        let err = LexError::InvalidNumber {
            literal: "0xzz".to_string(),
            location: loc(),
        };
        assert_eq!(err.location().line, 3);
        assert_eq!(err.location().column, 7);
    }
}
