//! Per-line classification of token streams.
//!
//! Tokens produced by a grammar may span several physical lines (block
//! comments, triple-quoted strings, whitespace runs). [`delineate`] splits
//! them so that a line break only ever appears as the last character of a
//! token, and [`classify_lines`] then folds the token stream into one
//! [`LineMarks`] set per physical line.

use std::fmt;

use crate::language::LanguageRules;
use crate::token::Token;

/// Split tokens so that no token text contains `\n` except as its last
/// character.
///
/// Every piece keeps the kind of the token it was cut from. Empty tokens
/// are dropped.
///
/// # Examples
///
/// ```
/// use sloctally::lines::delineate;
/// use sloctally::token::Token;
///
/// let pieces: Vec<_> = delineate(vec![Token::comment("/* a\nb */")]).collect();
/// assert_eq!(pieces[0].text, "/* a\n");
/// assert_eq!(pieces[1].text, "b */");
/// ```
pub fn delineate<I>(tokens: I) -> impl Iterator<Item = Token>
where
    I: IntoIterator<Item = Token>,
{
    tokens.into_iter().flat_map(split_at_newlines)
}

fn split_at_newlines(token: Token) -> Vec<Token> {
    if token.text.is_empty() {
        return Vec::new();
    }

    match token.text.find('\n') {
        Some(index) if index + 1 < token.text.len() => token
            .text
            .split_inclusive('\n')
            .map(|piece| Token::new(token.kind, piece))
            .collect(),
        _ => vec![token],
    }
}

/// Classification signal present on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mark {
    Code,
    Documentation,
    Empty,
    String,
}

impl Mark {
    /// Reduction order: the first mark present on a line decides its category.
    pub const PRIORITY: [Mark; 3] = [Mark::Documentation, Mark::String, Mark::Code];

    fn bit(self) -> u8 {
        match self {
            Mark::Code => 1,
            Mark::Documentation => 1 << 1,
            Mark::Empty => 1 << 2,
            Mark::String => 1 << 3,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mark::Code => "code",
            Mark::Documentation => "documentation",
            Mark::Empty => "empty",
            Mark::String => "string",
        };
        f.write_str(name)
    }
}

/// Set of marks collected for one physical line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LineMarks {
    bits: u8,
}

impl LineMarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mark: Mark) {
        self.bits |= mark.bit();
    }

    pub fn contains(&self, mark: Mark) -> bool {
        self.bits & mark.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Reduce the set to the single category the line counts as.
    ///
    /// Documentation wins over string, string over code; a line without
    /// any of them is empty.
    pub fn category(&self) -> Mark {
        Mark::PRIORITY
            .into_iter()
            .find(|mark| self.contains(*mark))
            .unwrap_or(Mark::Empty)
    }
}

impl FromIterator<Mark> for LineMarks {
    fn from_iter<T: IntoIterator<Item = Mark>>(iter: T) -> Self {
        let mut marks = LineMarks::new();
        for mark in iter {
            marks.insert(mark);
        }
        marks
    }
}

/// Lazy iterator over the line mark sets of a token stream.
///
/// Created by [`classify_lines`]. Tokens must already be delineated.
pub struct LineClassifier<'a, I> {
    tokens: I,
    rules: &'a LanguageRules,
    current: LineMarks,
}

impl<I> Iterator for LineClassifier<'_, I>
where
    I: Iterator<Item = Token>,
{
    type Item = LineMarks;

    fn next(&mut self) -> Option<LineMarks> {
        for token in self.tokens.by_ref() {
            if let Some(mark) = mark_for(&token, self.rules) {
                self.current.insert(mark);
            }
            if token.ends_line() {
                return Some(std::mem::take(&mut self.current));
            }
        }

        if self.current.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.current))
        }
    }
}

/// Classify delineated tokens into one mark set per physical line.
///
/// A trailing line without a terminator is only emitted if it carries at
/// least one mark.
pub fn classify_lines<'a, I>(tokens: I, rules: &'a LanguageRules) -> LineClassifier<'a, I::IntoIter>
where
    I: IntoIterator<Item = Token>,
{
    LineClassifier {
        tokens: tokens.into_iter(),
        rules,
        current: LineMarks::new(),
    }
}

fn mark_for(token: &Token, rules: &LanguageRules) -> Option<Mark> {
    if token.kind.is_comment() {
        Some(Mark::Documentation)
    } else if token.kind.is_string() {
        Some(Mark::String)
    } else if rules.is_white_text(&token.text) {
        None
    } else {
        Some(Mark::Code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_delineate_splits_multiline_token() {
        let tokens: Vec<_> = delineate(vec![Token::string("\"\"\"a\nb\n\nc\"\"\"")]).collect();
        assert_eq!(texts(&tokens), vec!["\"\"\"a\n", "b\n", "\n", "c\"\"\""]);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::String));
    }

    #[test]
    fn test_delineate_keeps_single_line_tokens() {
        let tokens: Vec<_> = delineate(vec![
            Token::other("identifier", "x"),
            Token::whitespace("\n"),
            Token::whitespace(""),
        ])
        .collect();
        assert_eq!(texts(&tokens), vec!["x", "\n"]);
    }

    #[test]
    fn test_delineate_preserves_text() {
        let input = vec![
            Token::whitespace("\n\n   "),
            Token::comment("/* one\n two */"),
            Token::whitespace("\n"),
        ];
        let joined: String = input.iter().map(|t| t.text.as_str()).collect();
        let pieces: Vec<_> = delineate(input).collect();

        assert_eq!(pieces.iter().map(|t| t.text.as_str()).collect::<String>(), joined);
        for piece in &pieces {
            let inner = piece.text.strip_suffix('\n').unwrap_or(&piece.text);
            assert!(!inner.contains('\n'));
        }
    }

    #[test]
    fn test_category_priority() {
        let all: LineMarks = [Mark::Code, Mark::String, Mark::Documentation].into_iter().collect();
        assert_eq!(all.category(), Mark::Documentation);

        let code_and_string: LineMarks = [Mark::Code, Mark::String].into_iter().collect();
        assert_eq!(code_and_string.category(), Mark::String);

        let code: LineMarks = [Mark::Code].into_iter().collect();
        assert_eq!(code.category(), Mark::Code);

        assert_eq!(LineMarks::new().category(), Mark::Empty);
    }

    #[test]
    fn test_classify_lines_basic() {
        let rules = LanguageRules::default();
        let tokens = vec![
            Token::other("identifier", "x"),
            Token::whitespace(" "),
            Token::other("=", "="),
            Token::whitespace(" "),
            Token::string("\"a\""),
            Token::whitespace("\n"),
            Token::whitespace("\n"),
            Token::comment("// note"),
            Token::whitespace("\n"),
            Token::other("}", "}"),
        ];

        let lines: Vec<_> = classify_lines(tokens, &rules).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(Mark::Code) && lines[0].contains(Mark::String));
        assert!(lines[1].is_empty());
        assert_eq!(lines[2].category(), Mark::Documentation);
    }

    #[test]
    fn test_trailing_unmarked_line_is_dropped() {
        let rules = LanguageRules::default();
        let tokens = vec![
            Token::other("identifier", "x"),
            Token::whitespace("\n"),
            Token::whitespace("   "),
        ];
        assert_eq!(classify_lines(tokens, &rules).count(), 1);
    }

    #[test]
    fn test_trailing_marked_line_is_emitted() {
        let rules = LanguageRules::default();
        let tokens = vec![Token::whitespace("\n"), Token::other("identifier", "x")];
        let lines: Vec<_> = classify_lines(tokens, &rules).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].category(), Mark::Code);
    }

    #[test]
    fn test_white_characters_are_not_code() {
        let rules = LanguageRules::default();
        let tokens = vec![
            Token::other("}", "}"),
            Token::other(")", ")"),
            Token::other(";", ";"),
            Token::whitespace("\n"),
        ];
        let lines: Vec<_> = classify_lines(tokens, &rules).collect();
        assert_eq!(lines[0].category(), Mark::Empty);
    }

    #[test]
    fn test_white_code_word_only_where_configured() {
        let python = LanguageRules::default().with_white_code_words(["pass"]);
        let plain = LanguageRules::default();
        let line = || {
            vec![
                Token::whitespace("    "),
                Token::other("pass", "pass"),
                Token::whitespace("\n"),
            ]
        };

        let python_lines: Vec<_> = classify_lines(line(), &python).collect();
        assert_eq!(python_lines[0].category(), Mark::Empty);

        let plain_lines: Vec<_> = classify_lines(line(), &plain).collect();
        assert_eq!(plain_lines[0].category(), Mark::Code);
    }
}
