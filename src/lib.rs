//! sloctally - Count source lines by what they contain.
//!
//! Every physical line of a source file is classified as code,
//! documentation, string or empty. Files are tokenized with tree-sitter
//! grammars after their text encoding has been detected and decoded.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use sloctally::analysis::{AnalyzerOptions, SourceAnalyzer};
//!
//! let analyzer = SourceAnalyzer::with_options(AnalyzerOptions::default()).unwrap();
//! let analysis = analyzer.analyze(Path::new("src/main.rs"), "src");
//!
//! println!("{} code lines, {} documentation lines", analysis.code, analysis.documentation);
//! ```
//!
//! # Modules
//!
//! - [`encoding`] - Encoding detection and strict decoding
//! - [`lexer`] - Tree-sitter based tokenizers
//! - [`lines`] - Line delineation and classification
//! - [`docstrings`] - Python docstring reclassification
//! - [`analysis`] - Per-file pipeline and result records
//! - [`summary`] - Per-language totals
//! - [`walker`] - Directory traversal with gitignore support
//! - [`output`] - Report formats
//!
//! # Supported Languages
//!
//! - Rust (`.rs`)
//! - TypeScript (`.ts`, `.mts`, `.cts`, `.tsx`)
//! - JavaScript (`.js`, `.jsx`, `.mjs`, `.cjs`)
//! - Python (`.py`, `.pyi`, `.pyw`)
//! - Go (`.go`)

pub mod token;
pub mod encoding;
pub mod language;
pub mod lexer;
pub mod lines;
pub mod docstrings;
pub mod analysis;
pub mod summary;
pub mod walker;
pub mod output;
pub mod errors;

// Re-export key types at crate root for convenience
pub use analysis::{
    count_lines, AnalysisError, AnalyzerOptions, LineCounts, SourceAnalysis, SourceAnalyzer,
    SourceState,
};
pub use encoding::{resolve_encoding, EncodingError, EncodingMode, EncodingSniffer};
pub use errors::SloctallyError;
pub use language::{ClassificationConfig, Language, LanguageRules};
pub use lexer::{LexError, Tokenizer, TokenizerProvider};
pub use lines::{LineMarks, Mark};
pub use output::{format_output, OutputError, OutputFormat};
pub use summary::{LanguageSummary, ProjectSummary};
pub use token::{Token, TokenKind};
pub use walker::{SourceFile, WalkError, WalkOptions};
