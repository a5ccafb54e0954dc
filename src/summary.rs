//! Aggregation of per-file results into per-language totals.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analysis::{LineCounts, SourceAnalysis, SourceState};

/// Totals for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LanguageSummary {
    pub language: String,
    pub files: usize,
    #[serde(flatten)]
    pub counts: LineCounts,
}

impl LanguageSummary {
    fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            ..Default::default()
        }
    }

    /// Share of code lines among the non-empty lines, in percent.
    pub fn code_percentage(&self) -> f64 {
        let total = self.counts.total() - self.counts.empty;
        if total == 0 {
            0.0
        } else {
            100.0 * self.counts.code as f64 / total as f64
        }
    }
}

/// Totals for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    /// Per-language totals, sorted by descending code lines, then name.
    pub languages: Vec<LanguageSummary>,
    pub total_files: usize,
    #[serde(flatten)]
    pub total: LineCounts,
    pub skipped_files: usize,
    pub error_files: usize,
}

impl ProjectSummary {
    /// Aggregate analysis records.
    ///
    /// Skipped and errored files are counted separately and add no lines.
    pub fn from_analyses<'a>(analyses: impl IntoIterator<Item = &'a SourceAnalysis>) -> Self {
        let mut by_language: BTreeMap<String, LanguageSummary> = BTreeMap::new();
        let mut summary = ProjectSummary::default();

        for analysis in analyses {
            match analysis.state() {
                SourceState::Skipped => summary.skipped_files += 1,
                SourceState::Error => summary.error_files += 1,
                SourceState::Analyzed => {
                    let language = analysis.language.as_deref().unwrap_or_default();
                    let entry = by_language
                        .entry(language.to_string())
                        .or_insert_with(|| LanguageSummary::new(language));
                    entry.files += 1;
                    entry.counts += analysis.counts();

                    summary.total_files += 1;
                    summary.total += analysis.counts();
                }
            }
        }

        summary.languages = by_language.into_values().collect();
        summary.languages.sort_by(|a, b| {
            b.counts
                .code
                .cmp(&a.counts.code)
                .then_with(|| a.language.cmp(&b.language))
        });
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzed(path: &str, language: &str, code: usize, documentation: usize) -> SourceAnalysis {
        SourceAnalysis::with_counts(
            path,
            Some(language.to_string()),
            "g",
            LineCounts {
                code,
                documentation,
                empty: 1,
                string: 0,
            },
        )
    }

    #[test]
    fn test_summary_totals() {
        let analyses = vec![
            analyzed("a.py", "Python", 10, 2),
            analyzed("b.py", "Python", 5, 0),
            analyzed("c.rs", "Rust", 20, 4),
            SourceAnalysis::skipped("README.md", "g"),
            SourceAnalysis::error("broken.py", "g"),
        ];

        let summary = ProjectSummary::from_analyses(&analyses);

        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.skipped_files, 1);
        assert_eq!(summary.error_files, 1);
        assert_eq!(summary.total.code, 35);
        assert_eq!(summary.total.documentation, 6);
        assert_eq!(summary.total.empty, 3);

        assert_eq!(summary.languages.len(), 2);
        assert_eq!(summary.languages[0].language, "Rust");
        assert_eq!(summary.languages[1].language, "Python");
        assert_eq!(summary.languages[1].files, 2);
        assert_eq!(summary.languages[1].counts.code, 15);
    }

    #[test]
    fn test_totals_match_records() {
        let analyses = vec![analyzed("a.go", "Go", 3, 1), analyzed("b.go", "Go", 4, 0)];
        let summary = ProjectSummary::from_analyses(&analyses);
        let lines: usize = analyses.iter().map(SourceAnalysis::line_count).sum();
        assert_eq!(summary.total.total(), lines);
    }

    #[test]
    fn test_code_percentage() {
        let summary = ProjectSummary::from_analyses(&[analyzed("a.go", "Go", 3, 1)]);
        assert_eq!(summary.languages[0].code_percentage(), 75.0);
        assert_eq!(LanguageSummary::default().code_percentage(), 0.0);
    }
}
