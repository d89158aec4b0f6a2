#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt::Display, path::Path};

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled, settings::Style};

use crate::{analysis::Analysis, fixture::UnusableFixture, review::Judgment};

/// Verdict for one fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestOutcome {
    /// Extracted output matched the expected value.
    Passed,
    /// Extracted output differed, or nothing could be extracted.
    Failed {
        /// expected value
        expected: String,
        /// extracted actual value, or the raw output when extraction failed
        actual:   String,
    },
}

impl TestOutcome {
    /// Whether the fixture passed.
    pub fn passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

impl Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "Passed"),
            TestOutcome::Failed { .. } => write!(f, "Failed"),
        }
    }
}

/// Outcome of running one fixture against one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureResult {
    /// fixture name
    pub fixture: String,
    /// verdict
    #[serde(flatten)]
    pub outcome: TestOutcome,
}

/// Everything learned about one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReport {
    /// submission name (file name without extension)
    name:       String,
    /// whether compilation succeeded
    compiled:   bool,
    /// lexical analysis, always present
    analysis:   Analysis,
    /// fixture results in enumeration order; empty unless compiled
    tests:      Vec<FixtureResult>,
    /// review judgment; present only when compilation failed
    escalation: Option<Judgment>,
}

impl SubmissionReport {
    /// Report for a submission that compiled and ran every fixture.
    pub fn compiled(
        name: impl Into<String>,
        analysis: Analysis,
        tests: Vec<FixtureResult>,
    ) -> Self {
        Self {
            name: name.into(),
            compiled: true,
            analysis,
            tests,
            escalation: None,
        }
    }

    /// Report for a submission that failed to compile and was escalated.
    pub fn compile_failed(name: impl Into<String>, analysis: Analysis, judgment: Judgment) -> Self {
        Self {
            name: name.into(),
            compiled: false,
            analysis,
            tests: Vec::new(),
            escalation: Some(judgment),
        }
    }

    /// Returns the submission name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the submission compiled.
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Returns the analysis.
    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    /// Returns the fixture results.
    pub fn tests(&self) -> &[FixtureResult] {
        &self.tests
    }

    /// Returns the escalation judgment, if any.
    pub fn escalation(&self) -> Option<&Judgment> {
        self.escalation.as_ref()
    }

    /// Number of passing fixtures.
    pub fn passed(&self) -> usize {
        self.tests.iter().filter(|t| t.outcome.passed()).count()
    }
}

/// All submission reports of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// reports in processing order
    pub submissions:       Vec<SubmissionReport>,
    /// number of submissions processed, regardless of outcome
    pub processed:         usize,
    /// fixtures excluded because of configuration errors
    pub unusable_fixtures: Vec<UnusableFixture>,
}

impl RunReport {
    /// Appends a finished submission report.
    pub fn push(&mut self, report: SubmissionReport) {
        self.submissions.push(report);
        self.processed += 1;
    }

    /// Looks up a submission by name.
    pub fn get(&self, name: &str) -> Option<&SubmissionReport> {
        self.submissions.iter().find(|s| s.name == name)
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Could not serialize run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Could not write run report to {}", path.display()))
    }
}

/// One row of the end-of-run summary table.
#[derive(Tabled)]
struct SummaryRow {
    /// submission name
    #[tabled(rename = "Submission")]
    name:      String,
    /// yes/no
    #[tabled(rename = "Compiled")]
    compiled:  String,
    /// `passed/total` or `-`
    #[tabled(rename = "Tests")]
    tests:     String,
    /// manual review recommendation or `-`
    #[tabled(rename = "Manual review")]
    escalated: String,
}

impl From<&SubmissionReport> for SummaryRow {
    fn from(report: &SubmissionReport) -> Self {
        let (compiled, tests) = if report.compiled {
            ("yes".to_string(), format!("{}/{}", report.passed(), report.tests.len()))
        } else {
            ("no".to_string(), "-".to_string())
        };
        let escalated = match &report.escalation {
            Some(j) if j.failure.is_some() => "unavailable".to_string(),
            Some(j) if j.manual_review => "recommended".to_string(),
            Some(_) => "not needed".to_string(),
            None => "-".to_string(),
        };
        Self {
            name: report.name.clone(),
            compiled,
            tests,
            escalated,
        }
    }
}

/// Human-readable console report.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    /// whether anything is printed
    enabled: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Console {
    /// A console that prints nothing.
    pub fn quiet() -> Self {
        Self { enabled: false }
    }

    /// Prints the analysis counts of a submission.
    pub fn analysis(&self, submission: &str, analysis: &Analysis) {
        if self.enabled {
            println!("\nAnalysis for {submission}: {analysis}");
        }
    }

    /// Prints one fixture verdict.
    pub fn fixture(&self, result: &FixtureResult) {
        if !self.enabled {
            return;
        }
        match &result.outcome {
            TestOutcome::Passed => println!("{}", format!("{}: Passed", result.fixture).green()),
            TestOutcome::Failed { expected, actual } => println!(
                "{}",
                format!("{}: Failed\nExpected: {expected}\nGot: {actual}", result.fixture).red()
            ),
        }
    }

    /// Prints the compile-failure line and the judgment dump.
    pub fn escalation(&self, submission: &str, judgment: &Judgment) {
        if !self.enabled {
            return;
        }
        println!("{}", format!("{submission}: Compilation failed.").red());
        println!("{}", judgment.to_string().blue());
    }

    /// Prints the summary table and the processed count.
    pub fn finish(&self, report: &RunReport) {
        if !self.enabled {
            return;
        }
        if !report.submissions.is_empty() {
            let rows = report.submissions.iter().map(SummaryRow::from);
            println!("\n{}", Table::new(rows).with(Style::modern()));
        }
        println!("\nTotal submissions processed: {}", report.processed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_outcome_serializes_with_values() {
        let result = FixtureResult {
            fixture: "case1".into(),
            outcome: TestOutcome::Failed {
                expected: "3.14".into(),
                actual:   "3.15".into(),
            },
        };
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["fixture"], "case1");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["actual"], "3.15");
    }

    #[test]
    fn push_counts_every_submission() {
        let mut report = RunReport::default();
        report.push(SubmissionReport::compiled("a", Analysis::default(), vec![]));
        report.push(SubmissionReport::compile_failed(
            "b",
            Analysis::default(),
            Judgment::unavailable("offline"),
        ));
        assert_eq!(report.processed, 2);
        assert!(report.get("a").is_some_and(|s| s.escalation().is_none()));
        assert!(report.get("b").is_some_and(|s| s.tests().is_empty()));
    }

    #[test]
    fn summary_row_reflects_outcome() {
        let report = SubmissionReport::compiled(
            "a",
            Analysis::default(),
            vec![
                FixtureResult {
                    fixture: "1".into(),
                    outcome: TestOutcome::Passed,
                },
                FixtureResult {
                    fixture: "2".into(),
                    outcome: TestOutcome::Failed {
                        expected: "1.00".into(),
                        actual:   String::new(),
                    },
                },
            ],
        );
        let row = SummaryRow::from(&report);
        assert_eq!(row.tests, "1/2");
        assert_eq!(row.escalated, "-");
    }
}
