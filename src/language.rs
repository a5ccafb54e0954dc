//! Supported languages and per-language classification rules.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

/// Characters treated as whitespace when deciding whether a token is code.
pub const WHITESPACE: [char; 5] = [' ', '\x0c', '\n', '\r', '\t'];

/// Characters that do not make a line count as code when they are alone on it.
pub const DEFAULT_WHITE_CHARACTERS: &str = "()[]{};";

/// A language with a bundled grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    TypeScript,
    Tsx,
    JavaScript,
    Jsx,
    Python,
    Go,
}

impl Language {
    /// All languages with a bundled grammar.
    pub fn all() -> &'static [Language] {
        &[
            Language::Rust,
            Language::TypeScript,
            Language::Tsx,
            Language::JavaScript,
            Language::Jsx,
            Language::Python,
            Language::Go,
        ]
    }

    /// File extensions (without dot) recognized for this language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["rs"],
            Language::TypeScript => &["ts", "mts", "cts"],
            Language::Tsx => &["tsx"],
            Language::JavaScript => &["js", "mjs", "cjs"],
            Language::Jsx => &["jsx"],
            Language::Python => &["py", "pyi", "pyw"],
            Language::Go => &["go"],
        }
    }

    /// Human readable name reported in analysis results.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Rust => "Rust",
            Language::TypeScript => "TypeScript",
            Language::Tsx => "TSX",
            Language::JavaScript => "JavaScript",
            Language::Jsx => "JSX",
            Language::Python => "Python",
            Language::Go => "Go",
        }
    }

    /// Detect the language of a file from its name.
    pub fn from_path(path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        ext.parse().ok()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when an extension does not belong to a known language.
#[derive(Debug, Error)]
#[error("unknown language extension: {0}")]
pub struct UnknownExtension(String);

impl FromStr for Language {
    type Err = UnknownExtension;

    /// Parse a file extension (without dot).
    fn from_str(ext: &str) -> Result<Self, Self::Err> {
        let ext = ext.to_ascii_lowercase();
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
            .ok_or(UnknownExtension(ext))
    }
}

/// Classification rules for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRules {
    white_characters: HashSet<char>,
    white_code_words: HashSet<String>,
    colon_docstrings: bool,
}

impl Default for LanguageRules {
    fn default() -> Self {
        Self {
            white_characters: DEFAULT_WHITE_CHARACTERS.chars().collect(),
            white_code_words: HashSet::new(),
            colon_docstrings: false,
        }
    }
}

impl LanguageRules {
    pub fn with_white_characters(mut self, chars: &str) -> Self {
        self.white_characters = chars.chars().collect();
        self
    }

    pub fn with_white_code_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.white_code_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_colon_docstrings(mut self, enabled: bool) -> Self {
        self.colon_docstrings = enabled;
        self
    }

    /// Whether string literals following a `:` are documentation.
    pub fn colon_docstrings(&self) -> bool {
        self.colon_docstrings
    }

    /// Whether a non-comment, non-string token contributes nothing to a line.
    ///
    /// True for tokens that are a white code word once surrounding
    /// whitespace is removed, and for tokens made only of whitespace and
    /// white characters.
    pub fn is_white_text(&self, text: &str) -> bool {
        let trimmed = text.trim_matches(WHITESPACE.as_slice());
        if self.white_code_words.contains(trimmed) {
            return true;
        }
        text.trim_end_matches(|c: char| {
            WHITESPACE.contains(&c) || self.white_characters.contains(&c)
        })
        .is_empty()
    }
}

/// Mapping from language id to classification rules.
///
/// Language ids are lowercase language names, e.g. `python`.
#[derive(Debug, Clone)]
pub struct ClassificationConfig {
    white_characters: String,
    white_code_words: HashMap<String, Vec<String>>,
    colon_docstrings: HashSet<String>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        let mut white_code_words = HashMap::new();
        white_code_words.insert("python".to_string(), vec!["pass".to_string()]);
        white_code_words.insert(
            "sql".to_string(),
            vec!["begin".to_string(), "end".to_string()],
        );

        Self {
            white_characters: DEFAULT_WHITE_CHARACTERS.to_string(),
            white_code_words,
            colon_docstrings: HashSet::from(["python".to_string()]),
        }
    }
}

impl ClassificationConfig {
    /// A configuration without any language specific rules.
    pub fn empty() -> Self {
        Self {
            white_characters: DEFAULT_WHITE_CHARACTERS.to_string(),
            white_code_words: HashMap::new(),
            colon_docstrings: HashSet::new(),
        }
    }

    pub fn set_white_code_words<I, S>(&mut self, language_id: &str, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        debug_assert!(is_language_id(language_id), "language id must be lowercase");
        self.white_code_words.insert(
            language_id.to_string(),
            words.into_iter().map(Into::into).collect(),
        );
    }

    pub fn set_colon_docstrings(&mut self, language_id: &str, enabled: bool) {
        debug_assert!(is_language_id(language_id), "language id must be lowercase");
        if enabled {
            self.colon_docstrings.insert(language_id.to_string());
        } else {
            self.colon_docstrings.remove(language_id);
        }
    }

    /// Rules for a language id.
    pub fn rules_for(&self, language_id: &str) -> LanguageRules {
        debug_assert!(is_language_id(language_id), "language id must be lowercase");
        let words = self
            .white_code_words
            .get(language_id)
            .cloned()
            .unwrap_or_default();

        LanguageRules::default()
            .with_white_characters(&self.white_characters)
            .with_white_code_words(words)
            .with_colon_docstrings(self.colon_docstrings.contains(language_id))
    }

    /// Rules for a human readable language name such as `Python`.
    pub fn rules_for_name(&self, language_name: &str) -> LanguageRules {
        self.rules_for(&language_id(language_name))
    }
}

/// Language id for a language name.
pub fn language_id(language_name: &str) -> String {
    language_name.to_lowercase()
}

fn is_language_id(id: &str) -> bool {
    !id.is_empty() && !id.chars().any(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(Language::from_path(&PathBuf::from("src/main.rs")), Some(Language::Rust));
        assert_eq!(Language::from_path(&PathBuf::from("setup.PY")), Some(Language::Python));
        assert_eq!(Language::from_path(&PathBuf::from("App.tsx")), Some(Language::Tsx));
        assert_eq!(Language::from_path(&PathBuf::from("index.mjs")), Some(Language::JavaScript));
        assert_eq!(Language::from_path(&PathBuf::from("README.md")), None);
        assert_eq!(Language::from_path(&PathBuf::from("Makefile")), None);
    }

    #[test]
    fn test_extension_parse() {
        assert_eq!("go".parse::<Language>().unwrap(), Language::Go);
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn test_default_rules() {
        let rules = LanguageRules::default();
        assert!(rules.is_white_text("   "));
        assert!(rules.is_white_text("});\n"));
        assert!(!rules.is_white_text("x"));
        assert!(!rules.is_white_text("pass"));
        assert!(!rules.colon_docstrings());
    }

    #[test]
    fn test_config_rules_for_python() {
        let config = ClassificationConfig::default();
        let rules = config.rules_for("python");
        assert!(rules.colon_docstrings());
        assert!(rules.is_white_text("  pass  "));
        assert!(!rules.is_white_text("passed"));
    }

    #[test]
    fn test_config_rules_for_sql() {
        let rules = ClassificationConfig::default().rules_for_name("SQL");
        assert!(rules.is_white_text("begin"));
        assert!(rules.is_white_text("end"));
        assert!(!rules.colon_docstrings());
    }

    #[test]
    fn test_empty_config() {
        let rules = ClassificationConfig::empty().rules_for("python");
        assert!(!rules.colon_docstrings());
        assert!(!rules.is_white_text("pass"));
    }

    #[test]
    fn test_config_overrides() {
        let mut config = ClassificationConfig::empty();
        config.set_white_code_words("go", ["default"]);
        config.set_colon_docstrings("go", true);
        let rules = config.rules_for("go");
        assert!(rules.is_white_text("default"));
        assert!(rules.colon_docstrings());
    }
}
