//! Token types shared by the lexer and the line classifier.

use std::fmt;

/// Category of a lexical token.
///
/// Classification only distinguishes comments, string literals and
/// everything else. `Other` keeps the grammar's node kind for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Comment,
    String,
    /// Any other token, tagged with the grammar node kind.
    Other(&'static str),
}

impl TokenKind {
    /// Kind used for source text between grammar nodes.
    pub const WHITESPACE: TokenKind = TokenKind::Other("whitespace");

    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::Comment)
    }

    pub fn is_string(self) -> bool {
        matches!(self, TokenKind::String)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Comment => write!(f, "comment"),
            TokenKind::String => write!(f, "string"),
            TokenKind::Other(kind) => write!(f, "other({kind})"),
        }
    }
}

/// A typed fragment of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Comment, text)
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self::new(TokenKind::String, text)
    }

    pub fn other(kind: &'static str, text: impl Into<String>) -> Self {
        Self::new(TokenKind::Other(kind), text)
    }

    pub fn whitespace(text: impl Into<String>) -> Self {
        Self::new(TokenKind::WHITESPACE, text)
    }

    /// Whether the token text closes a physical line.
    pub fn ends_line(&self) -> bool {
        self.text.ends_with('\n')
    }
}
