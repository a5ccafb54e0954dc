//! Tree-sitter grammars and flattening of syntax trees into tokens.

use std::cell::RefCell;

use tree_sitter::{Node, Parser, Tree};

use crate::language::{Language, WHITESPACE};
use crate::token::{Token, TokenKind};

// Thread-local parser caching to avoid re-initialization overhead.
thread_local! {
    static RUST_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
    static TS_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
    static TSX_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
    static PYTHON_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
    static GO_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

fn init_parser(language: tree_sitter::Language) -> Result<Parser, ()> {
    let mut p = Parser::new();
    p.set_language(&language).map_err(|_| ())?;
    Ok(p)
}

fn init_rust_parser() -> Result<Parser, ()> {
    init_parser(tree_sitter_rust::LANGUAGE.into())
}

fn init_ts_parser() -> Result<Parser, ()> {
    init_parser(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
}

fn init_tsx_parser() -> Result<Parser, ()> {
    init_parser(tree_sitter_typescript::LANGUAGE_TSX.into())
}

fn init_python_parser() -> Result<Parser, ()> {
    init_parser(tree_sitter_python::LANGUAGE.into())
}

fn init_go_parser() -> Result<Parser, ()> {
    init_parser(tree_sitter_go::LANGUAGE.into())
}

fn with_cached_parser<F, R>(
    cell: &'static std::thread::LocalKey<RefCell<Option<Parser>>>,
    init: fn() -> Result<Parser, ()>,
    f: F,
) -> Result<R, String>
where
    F: FnOnce(&mut Parser) -> R,
{
    cell.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(init().map_err(|()| "failed to initialize parser".to_string())?);
        }

        let parser = slot
            .as_mut()
            .ok_or_else(|| "failed to initialize parser".to_string())?;
        Ok(f(parser))
    })
}

/// Parse `content` with the cached parser for `language`.
///
/// JavaScript is parsed with the TypeScript grammar and JSX with the TSX
/// grammar, which accept plain JavaScript.
pub(crate) fn parse(language: Language, content: &str) -> Result<Option<Tree>, String> {
    let run = |parser: &mut Parser| parser.parse(content, None);
    match language {
        Language::Rust => with_cached_parser(&RUST_PARSER, init_rust_parser, run),
        Language::TypeScript | Language::JavaScript => {
            with_cached_parser(&TS_PARSER, init_ts_parser, run)
        }
        Language::Tsx | Language::Jsx => with_cached_parser(&TSX_PARSER, init_tsx_parser, run),
        Language::Python => with_cached_parser(&PYTHON_PARSER, init_python_parser, run),
        Language::Go => with_cached_parser(&GO_PARSER, init_go_parser, run),
    }
}

/// Node kinds emitted as a single string token, children included.
fn string_kinds(language: Language) -> &'static [&'static str] {
    match language {
        Language::Rust => &["string_literal", "raw_string_literal", "char_literal"],
        Language::Python => &["concatenated_string", "string"],
        Language::Go => &["interpreted_string_literal", "raw_string_literal", "rune_literal"],
        Language::TypeScript | Language::Tsx | Language::JavaScript | Language::Jsx => {
            &["string", "template_string", "regex"]
        }
    }
}

fn token_kind(node: &Node, language: Language) -> Option<TokenKind> {
    let kind = node.kind();
    if kind.ends_with("comment") {
        Some(TokenKind::Comment)
    } else if string_kinds(language).contains(&kind) {
        Some(TokenKind::String)
    } else if node.child_count() == 0 {
        Some(TokenKind::Other(kind))
    } else {
        None
    }
}

/// Flatten a syntax tree into tokens covering all of `content`.
///
/// Comments and string literals become one token each, other leaves one
/// token per leaf. Text between nodes is emitted as whitespace tokens, so
/// the token texts concatenate to `content`.
pub(crate) fn flatten(tree: &Tree, content: &str, language: Language) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut position = 0;
    let mut cursor = tree.walk();

    'walk: loop {
        let node = cursor.node();
        let start = node.start_byte().max(position);
        let end = node.end_byte();

        let descend = match token_kind(&node, language) {
            _ if end <= start => false,
            Some(kind) => {
                push_gap(&mut tokens, content, position, start);
                if let Some(text) = content.get(start..end) {
                    tokens.push(Token::new(kind, text));
                    position = end;
                }
                false
            }
            None => true,
        };

        if descend && cursor.goto_first_child() {
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }

    push_gap(&mut tokens, content, position, content.len());
    tokens
}

fn push_gap(tokens: &mut Vec<Token>, content: &str, start: usize, end: usize) {
    if start >= end {
        return;
    }
    if let Some(text) = content.get(start..end) {
        if text.chars().all(|c| WHITESPACE.contains(&c)) {
            tokens.push(Token::whitespace(text));
        } else {
            tokens.push(Token::other("text", text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(language: Language, content: &str) -> Vec<Token> {
        let tree = parse(language, content).unwrap().unwrap();
        flatten(&tree, content, language)
    }

    fn joined(tokens: &[Token]) -> String {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_flatten_covers_input() {
        let sources = [
            (Language::Rust, "/// Doc.\nfn main() {\n    let s = \"a\\nb\";\n}\n"),
            (Language::Python, "\"\"\"Module.\"\"\"\n\ndef f():\n    pass\n"),
            (Language::Go, "package main\n\n// Comment\nvar s = `raw\nstring`\n"),
            (Language::TypeScript, "const x: string = `t${1}`; // end\n"),
            (Language::Jsx, "const App = () => <div>{'x'}</div>;\n"),
        ];

        for (language, source) in sources {
            assert_eq!(joined(&tokens(language, source)), source, "{language}");
        }
    }

    #[test]
    fn test_rust_comments_and_strings() {
        let result = tokens(Language::Rust, "// note\nlet s = \"x\";\n");
        assert!(result
            .iter()
            .any(|t| t.kind == TokenKind::Comment && t.text.starts_with("// note")));
        assert!(result.iter().any(|t| t.kind == TokenKind::String && t.text == "\"x\""));
    }

    #[test]
    fn test_python_string_is_single_token() {
        let result = tokens(Language::Python, "x = f\"a{b}c\"\n");
        let strings: Vec<_> = result.iter().filter(|t| t.kind == TokenKind::String).collect();
        assert_eq!(strings.len(), 1);
        assert_eq!(strings[0].text, "f\"a{b}c\"");
    }

    #[test]
    fn test_python_colon_is_own_token() {
        let result = tokens(Language::Python, "def f():\n    pass\n");
        assert!(result.iter().any(|t| t.text == ":"));
        assert!(result.iter().any(|t| t.text == "pass"));
    }

    #[test]
    fn test_multiline_block_comment_is_one_token() {
        let result = tokens(Language::Go, "package main\n/* a\nb */\n");
        let comments: Vec<_> = result.iter().filter(|t| t.kind == TokenKind::Comment).collect();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "/* a\nb */");
    }
}
