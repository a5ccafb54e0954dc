//! Line counting for single source files.
//!
//! [`SourceAnalyzer::analyze`] runs the whole pipeline for one file:
//! tokenizer lookup, encoding resolution, decoding, tokenizing, line
//! delineation, docstring reclassification and line classification. Every
//! outcome is a [`SourceAnalysis`]; files that cannot be read are recorded
//! with the language `"error"` instead of failing.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::docstrings::reclassify_docstrings;
use crate::encoding::{decode, resolve_encoding, EncodingError, EncodingMode, EncodingSniffer};
use crate::language::{ClassificationConfig, LanguageRules};
use crate::lexer::{GrammarTokenizers, TokenizerProvider};
use crate::lines::{classify_lines, delineate, LineMarks, Mark};
use crate::token::Token;
use crate::walker::SourceFile;

/// Language recorded for files that could not be read or decoded.
pub const ERROR_LANGUAGE: &str = "error";

/// Default encoding used when automatic detection gives up.
pub const DEFAULT_FALLBACK_ENCODING: &str = "cp1252";

/// Errors in analyzer configuration.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("encoding detection with chardet requested, but no encoding sniffer is available")]
    SnifferUnavailable,

    #[error("fallback encoding must not be empty")]
    EmptyFallback,

    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),
}

/// Outcome of analyzing one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceState {
    Analyzed,
    Skipped,
    Error,
}

/// Line counts for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceAnalysis {
    pub path: PathBuf,
    /// Language name, `None` if the file type is not supported.
    pub language: Option<String>,
    pub group: String,
    pub code: usize,
    pub documentation: usize,
    pub empty: usize,
    pub string: usize,
}

impl SourceAnalysis {
    /// Record for a file without a matching tokenizer.
    pub fn skipped(path: impl Into<PathBuf>, group: impl Into<String>) -> Self {
        Self::with_counts(path, None, group, LineCounts::default())
    }

    /// Record for a file that could not be read or decoded.
    pub fn error(path: impl Into<PathBuf>, group: impl Into<String>) -> Self {
        Self::with_counts(path, Some(ERROR_LANGUAGE.to_string()), group, LineCounts::default())
    }

    pub fn with_counts(
        path: impl Into<PathBuf>,
        language: Option<String>,
        group: impl Into<String>,
        counts: LineCounts,
    ) -> Self {
        Self {
            path: path.into(),
            language,
            group: group.into(),
            code: counts.code,
            documentation: counts.documentation,
            empty: counts.empty,
            string: counts.string,
        }
    }

    pub fn state(&self) -> SourceState {
        match self.language.as_deref() {
            None => SourceState::Skipped,
            Some(ERROR_LANGUAGE) => SourceState::Error,
            Some(_) => SourceState::Analyzed,
        }
    }

    /// Number of classified lines.
    pub fn line_count(&self) -> usize {
        self.code + self.documentation + self.empty + self.string
    }

    pub fn counts(&self) -> LineCounts {
        LineCounts {
            code: self.code,
            documentation: self.documentation,
            empty: self.empty,
            string: self.string,
        }
    }
}

/// Per-category line counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineCounts {
    pub code: usize,
    pub documentation: usize,
    pub empty: usize,
    pub string: usize,
}

impl LineCounts {
    pub fn add(&mut self, category: Mark) {
        match category {
            Mark::Code => self.code += 1,
            Mark::Documentation => self.documentation += 1,
            Mark::Empty => self.empty += 1,
            Mark::String => self.string += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.code + self.documentation + self.empty + self.string
    }
}

impl std::ops::AddAssign for LineCounts {
    fn add_assign(&mut self, other: Self) {
        self.code += other.code;
        self.documentation += other.documentation;
        self.empty += other.empty;
        self.string += other.string;
    }
}

/// Count the lines of a token stream under the given rules.
pub fn count_lines<I>(tokens: I, rules: &LanguageRules) -> LineCounts
where
    I: IntoIterator<Item = Token>,
{
    let delined = delineate(tokens);
    if rules.colon_docstrings() {
        tally(classify_lines(reclassify_docstrings(delined), rules))
    } else {
        tally(classify_lines(delined, rules))
    }
}

fn tally(lines: impl Iterator<Item = LineMarks>) -> LineCounts {
    let mut counts = LineCounts::default();
    for marks in lines {
        counts.add(marks.category());
    }
    counts
}

/// Encoding settings of an analyzer.
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub encoding: EncodingMode,
    pub fallback_encoding: String,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            encoding: EncodingMode::Automatic,
            fallback_encoding: DEFAULT_FALLBACK_ENCODING.to_string(),
        }
    }
}

/// Analyzes source files with a tokenizer provider and classification rules.
///
/// The analyzer is `Sync`: files may be analyzed from several threads. An
/// encoding sniffer, if any, is shared behind a mutex.
pub struct SourceAnalyzer {
    provider: Box<dyn TokenizerProvider>,
    config: ClassificationConfig,
    options: AnalyzerOptions,
    sniffer: Option<Mutex<Box<dyn EncodingSniffer>>>,
}

impl SourceAnalyzer {
    /// Create an analyzer.
    ///
    /// Fails if `options` ask for sniffer based detection but `sniffer` is
    /// `None`, so that no file is analyzed with an unusable configuration.
    pub fn new(
        provider: impl TokenizerProvider + 'static,
        config: ClassificationConfig,
        options: AnalyzerOptions,
        sniffer: Option<Box<dyn EncodingSniffer>>,
    ) -> Result<Self, AnalysisError> {
        if options.fallback_encoding.is_empty() {
            return Err(AnalysisError::EmptyFallback);
        }
        if options.encoding == EncodingMode::Detector && sniffer.is_none() {
            return Err(AnalysisError::SnifferUnavailable);
        }
        check_known(&options.fallback_encoding)?;
        if let EncodingMode::Explicit(name) = &options.encoding {
            check_known(name)?;
        }

        Ok(Self {
            provider: Box::new(provider),
            config,
            options,
            sniffer: sniffer.map(Mutex::new),
        })
    }

    /// Analyzer using the bundled grammars and default rules.
    ///
    /// Uses the bundled encoding sniffer when the crate is built with it.
    pub fn with_options(options: AnalyzerOptions) -> Result<Self, AnalysisError> {
        Self::new(
            GrammarTokenizers::new(),
            ClassificationConfig::default(),
            options,
            default_sniffer(),
        )
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Analyze one file.
    pub fn analyze(&self, path: &Path, group: &str) -> SourceAnalysis {
        let Some(tokenizer) = self.provider.lookup(path) else {
            info!("{}: skip", path.display());
            return SourceAnalysis::skipped(path, group);
        };
        let language = tokenizer.language_name().to_string();

        let text = match self.read_text(path, &language) {
            Ok(text) => text,
            Err(e) => {
                warn!("cannot read {}: {}", path.display(), e);
                return SourceAnalysis::error(path, group);
            }
        };

        let tokens = match tokenizer.tokenize(text.strip_prefix('\u{feff}').unwrap_or(&text)) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("cannot tokenize {}: {}", path.display(), e);
                return SourceAnalysis::error(path, group);
            }
        };

        let rules = self.config.rules_for_name(&language);
        let counts = count_lines(tokens, &rules);
        SourceAnalysis::with_counts(path, Some(language), group, counts)
    }

    /// Analyze many files in parallel, keeping their order.
    pub fn analyze_all(&self, files: &[SourceFile]) -> Vec<SourceAnalysis> {
        files
            .par_iter()
            .map(|file| self.analyze(&file.path, &file.group))
            .collect()
    }

    fn read_text(&self, path: &Path, language: &str) -> Result<String, EncodingError> {
        let encoding = self.resolve_encoding(path)?;
        info!("{}: analyze as {} using encoding {}", path.display(), language, encoding);

        let bytes = fs::read(path).map_err(|source| EncodingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        decode(&bytes, &encoding).map(normalize_newlines)
    }

    fn resolve_encoding(&self, path: &Path) -> Result<String, EncodingError> {
        let mode = &self.options.encoding;
        let fallback = &self.options.fallback_encoding;

        match (mode, &self.sniffer) {
            (EncodingMode::Detector, Some(sniffer)) => {
                let mut guard = sniffer.lock().unwrap_or_else(PoisonError::into_inner);
                resolve_encoding(path, mode, fallback, Some(&mut **guard))
            }
            _ => resolve_encoding(path, mode, fallback, None),
        }
    }
}

/// Turn `\r\n` and lone `\r` line endings into `\n`.
fn normalize_newlines(text: String) -> String {
    if !text.contains('\r') {
        return text;
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn check_known(encoding: &str) -> Result<(), AnalysisError> {
    match decode(&[], encoding) {
        Err(EncodingError::UnknownEncoding(name)) => Err(AnalysisError::UnknownEncoding(name)),
        _ => Ok(()),
    }
}

/// The encoding sniffer bundled with this build, if any.
pub fn default_sniffer() -> Option<Box<dyn EncodingSniffer>> {
    #[cfg(feature = "chardet")]
    {
        Some(Box::new(crate::encoding::sniffer::ChardetSniffer::new()))
    }
    #[cfg(not(feature = "chardet"))]
    {
        None
    }
}
