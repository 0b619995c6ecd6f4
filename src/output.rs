//! Console lines and report rendering.
//!
//! The text report keeps the historical `report.txt` layout byte for byte.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::comparator::ComparisonSettings;
use crate::engine::{ComparisonResults, ComparisonStatus, FileComparisonResult, SkipReason};
use crate::error::Result;
use crate::filter::IgnoreSet;
use crate::normalizer::Epsilon;

const BANNER: &str = "************************************************************";
const REPORT_TITLE: &str =
    "***********************************REPORT**********************************\n\n";
const SETTINGS_RULE: &str = "######################################\n";
const DIFF_RULE: &str = "---------------------------------\n";

/// Console formatter for comparison progress and results
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Plain output regardless of the terminal
    pub fn without_colors(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: false,
        }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_start(
        &self,
        control_dir: &Path,
        ignore_set: &IgnoreSet,
        report_path: &Path,
    ) -> String {
        if self.verbosity == VerbosityLevel::Quiet {
            return String::new();
        }

        let mut output = format!("{}\nStart comparing:\n\n{}\n", BANNER, control_dir.display());
        if !ignore_set.is_empty() {
            output.push_str(&format!(
                "Ignored Nodes present, see {} for details\n\n",
                report_path.display()
            ));
        }
        output
    }

    /// One console line for a pair, or `None` when the verbosity hides it
    pub fn format_file_result(
        &self,
        result: &FileComparisonResult,
        report_path: &Path,
    ) -> Option<String> {
        let line = match &result.status {
            ComparisonStatus::Identical => {
                if self.verbosity == VerbosityLevel::Quiet {
                    return None;
                }
                format!("{}: {}", result.name, self.colorize("OK!", "32"))
            }
            ComparisonStatus::Different { report } => {
                let mut line = format!(
                    "{}: {}",
                    result.name,
                    self.colorize(
                        &format!("DIFFERENCES, see {}!", report_path.display()),
                        "31"
                    )
                );
                if self.verbosity == VerbosityLevel::Verbose {
                    line.push_str(&format!(
                        " ({} difference{}, {})",
                        report.len(),
                        if report.len() == 1 { "" } else { "s" },
                        format_duration(result.duration)
                    ));
                }
                line
            }
            ComparisonStatus::Skipped { .. } => {
                if self.verbosity == VerbosityLevel::Quiet {
                    return None;
                }
                format!("{} {}", result.name, self.colorize("NOT PRESENT!", "36"))
            }
            ComparisonStatus::Error { message } => {
                let mut line = format!("{}: {}", result.name, self.colorize("ERROR!", "33"));
                if self.verbosity == VerbosityLevel::Verbose {
                    line.push(' ');
                    line.push_str(message);
                }
                line
            }
        };
        Some(line)
    }

    pub fn format_finish(&self) -> String {
        if self.verbosity == VerbosityLevel::Quiet {
            return String::new();
        }
        format!("\nComparing finished\n{}\n", BANNER)
    }

    /// Counts and timing, printed in verbose mode only
    pub fn format_summary(&self, results: &ComparisonResults) -> String {
        if self.verbosity != VerbosityLevel::Verbose {
            return String::new();
        }

        let mut output = String::new();
        output.push_str("Comparison Summary:\n");
        output.push_str(&format!("  Total pairs: {}\n", results.total_pairs));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Identical:", "32"),
            results.identical
        ));
        if results.different > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Different:", "31"),
                results.different
            ));
        }
        if results.errors > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Errors:", "33"),
                results.errors
            ));
        }
        if results.skipped > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Skipped:", "36"),
                results.skipped
            ));
        }
        output.push_str(&format!("  Success rate: {:.1}%\n", results.success_rate()));
        output.push_str(&format!(
            "  Duration: {}\n",
            format_duration(results.total_duration)
        ));
        output
    }
}

/// Render the plain-text report.
pub fn render_text_report(results: &ComparisonResults, settings: &ComparisonSettings) -> String {
    let mut report = String::new();
    report.push_str(REPORT_TITLE);
    report.push_str(SETTINGS_RULE);
    report.push_str(&format!("Comparison precision: {}\n", settings.epsilon));
    if !settings.ignore_set.is_empty() {
        report.push_str(&format!("Ignored Nodes:\n{}\n", settings.ignore_set));
    }
    report.push_str(SETTINGS_RULE);
    report.push('\n');

    for result in &results.file_results {
        match &result.status {
            ComparisonStatus::Skipped {
                reason: SkipReason::MissingTest,
            } => {
                report.push_str(&format!("Skipped  {}. (Not present in outputs)\n", result.name));
            }
            ComparisonStatus::Skipped {
                reason: SkipReason::MissingControl,
            } => {
                report.push_str(&format!("Skipped  {}. (Not present in controls)\n", result.name));
            }
            ComparisonStatus::Identical => {
                report.push_str(&format!("{}: OK!\n", result.name));
            }
            ComparisonStatus::Different { report: diff } => {
                report.push_str(DIFF_RULE);
                report.push_str(&format!("{} has following differences: \n", result.name));
                for difference in diff {
                    report.push_str(&format!("{}  \n", difference));
                }
                report.push_str(DIFF_RULE);
            }
            ComparisonStatus::Error { message } => {
                report.push_str(&format!("{}: ERROR! {}\n", result.name, message));
            }
        }
    }

    report
}

#[derive(Serialize)]
struct JsonReport<'a> {
    epsilon: Epsilon,
    ignored_nodes: &'a IgnoreSet,
    #[serde(flatten)]
    results: &'a ComparisonResults,
}

/// Render the whole batch as pretty JSON.
pub fn render_json_report(
    results: &ComparisonResults,
    settings: &ComparisonSettings,
) -> Result<String> {
    let report = JsonReport {
        epsilon: settings.epsilon,
        ignored_nodes: &settings.ignore_set,
        results,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Render in `format` and write to `path`.
pub async fn write_report(
    path: &Path,
    format: OutputFormat,
    results: &ComparisonResults,
    settings: &ComparisonSettings,
) -> Result<()> {
    let content = match format {
        OutputFormat::Human => render_text_report(results, settings),
        OutputFormat::Json => render_json_report(results, settings)?,
    };
    tokio::fs::write(path, content).await?;
    Ok(())
}

pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::ComparisonKind;
    use crate::report::{DiffReport, Difference};
    use std::path::PathBuf;

    fn result(name: &str, status: ComparisonStatus) -> FileComparisonResult {
        FileComparisonResult {
            name: name.to_string(),
            control: None,
            test: None,
            status,
            duration: Duration::from_millis(3),
        }
    }

    fn create_test_results() -> ComparisonResults {
        let mut diff = DiffReport::new();
        diff.push(Difference::new(
            ComparisonKind::TextValue,
            "/root/v",
            Some("1.000".to_string()),
            Some("1.0004".to_string()),
        ));
        diff.push(Difference::new(
            ComparisonKind::OnlyInControl,
            "/root/b",
            Some("b".to_string()),
            None,
        ));

        ComparisonResults::aggregate(
            vec![
                result("a.xml", ComparisonStatus::Identical),
                result("b.xml", ComparisonStatus::Different { report: diff }),
                result(
                    "c.xml",
                    ComparisonStatus::Skipped {
                        reason: SkipReason::MissingTest,
                    },
                ),
                result(
                    "d.xml",
                    ComparisonStatus::Error {
                        message: "Malformed XML".to_string(),
                    },
                ),
            ],
            Duration::from_millis(40),
        )
    }

    #[test]
    fn test_text_report_layout() {
        let settings = ComparisonSettings {
            epsilon: Epsilon::new(0.0001).unwrap(),
            ignore_set: IgnoreSet::from_delimited("timestamp;debug"),
            report_child_count: false,
        };

        let report = render_text_report(&create_test_results(), &settings);

        let expected = concat!(
            "***********************************REPORT**********************************\n\n",
            "######################################\n",
            "Comparison precision: 0.0001\n",
            "Ignored Nodes:\n",
            "[debug, timestamp]\n",
            "######################################\n\n",
            "a.xml: OK!\n",
            "---------------------------------\n",
            "b.xml has following differences: \n",
            "Difference at: /root/v. Expected: 1.000. But was: 1.0004  \n",
            "Difference at: /root/b. Expected: b. But was: null  \n",
            "---------------------------------\n",
            "Skipped  c.xml. (Not present in outputs)\n",
            "d.xml: ERROR! Malformed XML\n",
        );
        assert_eq!(report, expected);
    }

    #[test]
    fn test_text_report_without_ignored_nodes() {
        let results = ComparisonResults::aggregate(vec![], Duration::ZERO);
        let report = render_text_report(&results, &ComparisonSettings::default());
        assert!(report.contains("Comparison precision: 0.0\n"));
        assert!(!report.contains("Ignored Nodes"));
    }

    #[test]
    fn test_json_report() {
        let settings = ComparisonSettings::default();
        let json = render_json_report(&create_test_results(), &settings).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total_pairs"], 4);
        assert_eq!(value["different"], 1);
        assert_eq!(value["epsilon"], 0.0);
        assert_eq!(value["file_results"][1]["status"]["status"], "different");
        assert_eq!(
            value["file_results"][1]["status"]["report"]["differences"][0]["path"],
            "/root/v"
        );
    }

    #[test]
    fn test_console_lines() {
        let output = Output::without_colors(VerbosityLevel::Normal);
        let results = create_test_results();
        let report_path = PathBuf::from("report.txt");

        let lines: Vec<_> = results
            .file_results
            .iter()
            .filter_map(|r| output.format_file_result(r, &report_path))
            .collect();

        assert_eq!(
            lines,
            vec![
                "a.xml: OK!",
                "b.xml: DIFFERENCES, see report.txt!",
                "c.xml NOT PRESENT!",
                "d.xml: ERROR!",
            ]
        );
    }

    #[test]
    fn test_quiet_mode_shows_failures_only() {
        let output = Output::without_colors(VerbosityLevel::Quiet);
        let results = create_test_results();
        let report_path = PathBuf::from("report.txt");

        let lines: Vec<_> = results
            .file_results
            .iter()
            .filter_map(|r| output.format_file_result(r, &report_path))
            .collect();

        assert_eq!(lines.len(), 2);
        let banner =
            output.format_start(Path::new("ControlXML"), &IgnoreSet::new(), Path::new("report.txt"));
        assert!(banner.is_empty());
        assert!(output.format_finish().is_empty());
    }

    #[test]
    fn test_verbose_summary() {
        let output = Output::without_colors(VerbosityLevel::Verbose);
        let summary = output.format_summary(&create_test_results());
        assert!(summary.contains("Comparison Summary:"));
        assert!(summary.contains("Total pairs: 4"));
        assert!(summary.contains("Different: 1"));
        assert!(summary.contains("Success rate: 33.3%"));

        let normal = Output::without_colors(VerbosityLevel::Normal);
        assert!(normal.format_summary(&create_test_results()).is_empty());
    }

    #[test]
    fn test_start_banner_mentions_ignored_nodes() {
        let output = Output::without_colors(VerbosityLevel::Normal);
        let banner = output.format_start(
            Path::new("ControlXML"),
            &IgnoreSet::from_delimited("x"),
            Path::new("out/report.txt"),
        );
        assert!(banner.starts_with("*****"));
        assert!(banner.contains("Start comparing:"));
        assert!(banner.contains("Ignored Nodes present, see out/report.txt for details"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30.0s");
    }
}
