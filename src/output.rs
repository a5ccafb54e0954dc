//! Report formatting.
//!
//! Formats analysis records as a summary table, sloccount style lines,
//! cloc style XML or JSON.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::analysis::{SourceAnalysis, SourceState};
use crate::summary::{LanguageSummary, ProjectSummary};

/// Errors that can occur during output formatting.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown output format: {0}")]
    UnknownFormat(String),
}

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Per-language table (default).
    #[default]
    Summary,
    /// One tab separated line per file, like sloccount's detailed report.
    Sloccount,
    /// XML in the layout cloc uses.
    ClocXml,
    /// JSON for programmatic access.
    Json,
}

impl OutputFormat {
    pub fn all() -> &'static [OutputFormat] {
        &[
            OutputFormat::Summary,
            OutputFormat::Sloccount,
            OutputFormat::ClocXml,
            OutputFormat::Json,
        ]
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Summary => "summary",
            OutputFormat::Sloccount => "sloccount",
            OutputFormat::ClocXml => "cloc-xml",
            OutputFormat::Json => "json",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "sloccount" => Ok(OutputFormat::Sloccount),
            "cloc-xml" | "cloc_xml" | "xml" => Ok(OutputFormat::ClocXml),
            "json" => Ok(OutputFormat::Json),
            _ => Err(OutputError::UnknownFormat(s.to_string())),
        }
    }
}

/// Format analysis records.
pub fn format_output(
    analyses: &[SourceAnalysis],
    format: OutputFormat,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Summary => Ok(format_summary(&ProjectSummary::from_analyses(analyses))),
        OutputFormat::Sloccount => Ok(format_sloccount(analyses)),
        OutputFormat::ClocXml => Ok(format_cloc_xml(analyses)),
        OutputFormat::Json => format_json(analyses),
    }
}

/// Format a number with thousands separators.
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

// ============================================================================
// Summary Table
// ============================================================================

fn format_summary(summary: &ProjectSummary) -> String {
    let mut output = String::with_capacity(1024);

    output.push_str(&format!(
        "{:<12} {:>7} {:>10} {:>10} {:>10} {:>10} {:>6}\n",
        "Language", "Files", "Code", "Comment", "Empty", "String", "%Code"
    ));
    output.push_str(&format!("{}\n", "-".repeat(71)));

    for language in &summary.languages {
        output.push_str(&summary_row(language));
    }

    output.push_str(&format!("{}\n", "-".repeat(71)));
    let total = LanguageSummary {
        language: "Sum".to_string(),
        files: summary.total_files,
        counts: summary.total,
    };
    output.push_str(&summary_row(&total));

    if summary.skipped_files > 0 || summary.error_files > 0 {
        output.push_str(&format!(
            "\nSkipped: {} files, errors: {} files\n",
            format_number(summary.skipped_files),
            format_number(summary.error_files)
        ));
    }

    output
}

fn summary_row(language: &LanguageSummary) -> String {
    format!(
        "{:<12} {:>7} {:>10} {:>10} {:>10} {:>10} {:>6.1}\n",
        language.language,
        format_number(language.files),
        format_number(language.counts.code),
        format_number(language.counts.documentation),
        format_number(language.counts.empty),
        format_number(language.counts.string),
        language.code_percentage()
    )
}

// ============================================================================
// Sloccount
// ============================================================================

fn format_sloccount(analyses: &[SourceAnalysis]) -> String {
    let mut output = String::new();
    for analysis in analyses {
        let Some(language) = analysis.language.as_deref() else {
            continue;
        };
        output.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            analysis.code,
            language.to_lowercase(),
            analysis.group,
            analysis.path.display()
        ));
    }
    output
}

// ============================================================================
// Cloc XML
// ============================================================================

fn format_cloc_xml(analyses: &[SourceAnalysis]) -> String {
    let counted: Vec<&SourceAnalysis> = analyses
        .iter()
        .filter(|a| a.state() != SourceState::Skipped)
        .collect();
    let summary = ProjectSummary::from_analyses(counted.iter().copied());

    let mut output = String::with_capacity(4096);
    output.push_str("<?xml version=\"1.0\" ?>\n");
    output.push_str("<results>\n");
    output.push_str("  <header>\n");
    output.push_str(&format!(
        "    <cloc_url>{}</cloc_url>\n",
        escape_xml(env!("CARGO_PKG_REPOSITORY"))
    ));
    output.push_str(&format!(
        "    <cloc_version>{} {}</cloc_version>\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));
    output.push_str(&format!("    <n_files>{}</n_files>\n", counted.len()));
    output.push_str(&format!("    <n_lines>{}</n_lines>\n", summary.total.total()));
    output.push_str("  </header>\n");
    output.push_str("  <files>\n");

    for analysis in &counted {
        output.push_str(&format!(
            "    <file blank=\"{}\" code=\"{}\" comment=\"{}\" language=\"{}\" name=\"{}\"/>\n",
            analysis.empty,
            analysis.code + analysis.string,
            analysis.documentation,
            escape_xml(analysis.language.as_deref().unwrap_or_default()),
            escape_xml(&analysis.path.display().to_string())
        ));
    }

    output.push_str(&format!(
        "    <total blank=\"{}\" code=\"{}\" comment=\"{}\"/>\n",
        summary.total.empty,
        summary.total.code + summary.total.string,
        summary.total.documentation
    ));
    output.push_str("  </files>\n");
    output.push_str("</results>\n");
    output
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ============================================================================
// JSON Formatting
// ============================================================================

#[derive(Serialize)]
struct JsonOutput<'a> {
    files: Vec<JsonFile<'a>>,
    summary: ProjectSummary,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    state: SourceState,
    #[serde(flatten)]
    analysis: &'a SourceAnalysis,
}

fn format_json(analyses: &[SourceAnalysis]) -> Result<String, OutputError> {
    let output = JsonOutput {
        files: analyses
            .iter()
            .map(|analysis| JsonFile {
                state: analysis.state(),
                analysis,
            })
            .collect(),
        summary: ProjectSummary::from_analyses(analyses),
    };

    let mut json = serde_json::to_string_pretty(&output)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LineCounts;

    fn sample() -> Vec<SourceAnalysis> {
        vec![
            SourceAnalysis::with_counts(
                "src/a&b.py",
                Some("Python".to_string()),
                "src",
                LineCounts {
                    code: 1200,
                    documentation: 30,
                    empty: 40,
                    string: 5,
                },
            ),
            SourceAnalysis::skipped("README.md", "root"),
            SourceAnalysis::error("bad.rs", "root"),
        ]
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("cloc-xml".parse::<OutputFormat>().unwrap(), OutputFormat::ClocXml);
        assert!(matches!("yaml".parse::<OutputFormat>(), Err(OutputError::UnknownFormat(_))));
        for format in OutputFormat::all() {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), *format);
        }
    }

    #[test]
    fn test_summary_output() {
        let output = format_output(&sample(), OutputFormat::Summary).unwrap();
        assert!(output.starts_with("Language"));
        assert!(output.contains("Python"));
        assert!(output.contains("1,200"));
        assert!(output.contains("Skipped: 1 files, errors: 1 files"));
    }

    #[test]
    fn test_sloccount_output() {
        let output = format_output(&sample(), OutputFormat::Sloccount).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines, vec!["1200\tpython\tsrc\tsrc/a&b.py", "0\terror\troot\tbad.rs"]);
    }

    #[test]
    fn test_cloc_xml_output() {
        let output = format_output(&sample(), OutputFormat::ClocXml).unwrap();
        assert!(output.contains("<n_files>2</n_files>"));
        assert!(output.contains("name=\"src/a&amp;b.py\""));
        assert!(output.contains("<total blank=\"40\" code=\"1205\" comment=\"30\"/>"));
        assert!(!output.contains("README.md"));
    }

    #[test]
    fn test_json_output() {
        let output = format_output(&sample(), OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&output).unwrap();

        let files = v["files"].as_array().unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0]["state"], "analyzed");
        assert_eq!(files[0]["code"], 1200);
        assert_eq!(files[1]["state"], "skipped");
        assert!(files[1]["language"].is_null());
        assert_eq!(files[2]["language"], "error");

        assert_eq!(v["summary"]["total_files"], 1);
        assert_eq!(v["summary"]["code"], 1200);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;");
    }
}
