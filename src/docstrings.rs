//! Reclassification of docstrings in colon-block languages.
//!
//! In languages where blocks are opened by `:` (Python), a string literal
//! directly after the colon is documentation rather than data. The start of
//! a file counts as being after a colon so that module docstrings are found
//! too.

use crate::language::WHITESPACE;
use crate::token::{Token, TokenKind};

/// Whether the next string literal is documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocstringState {
    #[default]
    Eligible,
    NotEligible,
}

impl DocstringState {
    /// Advance the state by one token, rewriting the token if it is a
    /// docstring.
    pub fn step(self, mut token: Token) -> (DocstringState, Token) {
        if self == DocstringState::Eligible && token.kind.is_string() {
            token.kind = TokenKind::Comment;
            return (self, token);
        }

        if token.text == ":" {
            return (DocstringState::Eligible, token);
        }

        let blank = token.text.trim_end_matches(WHITESPACE.as_slice()).is_empty();
        if !token.kind.is_comment() && !blank {
            return (DocstringState::NotEligible, token);
        }

        (self, token)
    }
}

/// Turn string tokens that follow a `:` into comment tokens.
pub fn reclassify_docstrings<I>(tokens: I) -> impl Iterator<Item = Token>
where
    I: IntoIterator<Item = Token>,
{
    tokens
        .into_iter()
        .scan(DocstringState::default(), |state, token| {
            let (next, token) = state.step(token);
            *state = next;
            Some(token)
        })
}
