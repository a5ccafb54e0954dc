//! Tokenizers for source files.
//!
//! A [`TokenizerProvider`] picks a [`Tokenizer`] for a file name; the
//! tokenizer splits source text into [`Token`]s. [`GrammarTokenizers`] is
//! the provider for the bundled tree-sitter grammars.

mod grammar;

use std::path::Path;

use thiserror::Error;

use crate::language::Language;
use crate::token::Token;

/// Errors raised while tokenizing.
#[derive(Debug, Error)]
pub enum LexError {
    #[error("failed to initialize {language} parser: {message}")]
    ParserInit { language: String, message: String },

    #[error("failed to parse {language} source")]
    Parse { language: String },
}

/// Splits source text of one language into tokens.
pub trait Tokenizer {
    /// Human readable language name, e.g. `Python`.
    fn language_name(&self) -> &str;

    /// Tokenize `text`. Token texts concatenate to the input.
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, LexError>;
}

/// Finds the tokenizer for a file.
pub trait TokenizerProvider: Send + Sync {
    /// Tokenizer for the file at `path`, or `None` if the file type is not
    /// supported.
    fn lookup(&self, path: &Path) -> Option<Box<dyn Tokenizer>>;
}

/// Tokenizer backed by a tree-sitter grammar.
#[derive(Debug, Clone, Copy)]
pub struct GrammarTokenizer {
    language: Language,
}

impl GrammarTokenizer {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl Tokenizer for GrammarTokenizer {
    fn language_name(&self) -> &str {
        self.language.name()
    }

    fn tokenize(&self, text: &str) -> Result<Vec<Token>, LexError> {
        let tree = grammar::parse(self.language, text)
            .map_err(|message| LexError::ParserInit {
                language: self.language.to_string(),
                message,
            })?
            .ok_or_else(|| LexError::Parse {
                language: self.language.to_string(),
            })?;

        Ok(grammar::flatten(&tree, text, self.language))
    }
}

/// Provider for the bundled grammars, selected by file extension.
#[derive(Debug, Clone, Default)]
pub struct GrammarTokenizers {
    languages: Option<Vec<Language>>,
}

impl GrammarTokenizers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only provide tokenizers for the given languages.
    pub fn only(languages: &[Language]) -> Self {
        Self {
            languages: Some(languages.to_vec()),
        }
    }
}

impl TokenizerProvider for GrammarTokenizers {
    fn lookup(&self, path: &Path) -> Option<Box<dyn Tokenizer>> {
        let language = Language::from_path(path)?;
        if let Some(allowed) = &self.languages {
            if !allowed.contains(&language) {
                return None;
            }
        }
        Some(Box::new(GrammarTokenizer::new(language)))
    }
}
