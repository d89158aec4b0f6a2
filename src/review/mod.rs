#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Escalation of non-compiling submissions to an external review service.

/// OpenAI-backed reviewer.
pub mod openai;

use std::fmt::Display;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use openai::OpenAiReviewer;

use crate::{config::PROMPT_TRUNCATE, error::ConfigError, util::truncate_with_notice};

/// Structured triage of a submission that failed to compile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    /// identified issues, in the order the reviewer listed them
    pub issues:        Vec<String>,
    /// whether the reviewer recommends a manual review
    pub manual_review: bool,
    /// set when no judgment could be obtained
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure:       Option<String>,
}

impl Judgment {
    /// The empty judgment used when the review could not be obtained.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            issues:        Vec::new(),
            manual_review: false,
            failure:       Some(reason.into()),
        }
    }

    /// Parses a review service response.
    ///
    /// The response must be a JSON object. Issues are read from `issues`, or
    /// failing that from the first array of strings; the recommendation from
    /// `manual_review`, or failing that from the first boolean.
    pub fn from_response(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text.trim())?;
        let Value::Object(object) = value else {
            bail!("Review response is not a JSON object");
        };

        let as_issues = |v: &Value| -> Option<Vec<String>> {
            v.as_array()?
                .iter()
                .map(|item| item.as_str().map(str::to_owned))
                .collect()
        };

        let issues = object
            .get("issues")
            .and_then(as_issues)
            .or_else(|| object.values().find_map(as_issues));
        let manual_review = object
            .get("manual_review")
            .and_then(Value::as_bool)
            .or_else(|| object.values().find_map(Value::as_bool));

        match (issues, manual_review) {
            (Some(issues), Some(manual_review)) => Ok(Self {
                issues,
                manual_review,
                failure: None,
            }),
            (None, _) => bail!("Review response has no list of issues"),
            (_, None) => bail!("Review response has no manual review flag"),
        }
    }
}

impl Display for Judgment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(reason) = &self.failure {
            return write!(f, "Review unavailable: {reason}");
        }
        for issue in &self.issues {
            writeln!(f, "- {issue}")?;
        }
        write!(
            f,
            "Manual review: {}",
            if self.manual_review { "recommended" } else { "not needed" }
        )
    }
}

/// A service that triages non-compiling submissions.
pub trait Reviewer {
    /// Reviews `source` against `problem`.
    fn review(&self, problem: &str, source: &str) -> Result<Judgment>;
}

impl<R: Reviewer + ?Sized> Reviewer for Box<R> {
    fn review(&self, problem: &str, source: &str) -> Result<Judgment> {
        (**self).review(problem, source)
    }
}

/// Stand-in used when no review service is configured; every review fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredReviewer;

impl Reviewer for UnconfiguredReviewer {
    fn review(&self, _problem: &str, _source: &str) -> Result<Judgment> {
        Err(ConfigError::MissingEnv("OPENAI_API_KEY").into())
    }
}

/// Asks `reviewer` for a judgment, degrading any failure to
/// [`Judgment::unavailable`].
pub fn escalate(reviewer: &dyn Reviewer, problem: &str, source: &str) -> Judgment {
    match reviewer.review(problem, source) {
        Ok(judgment) => judgment,
        Err(e) => {
            tracing::warn!("Escalation review failed: {e:#}");
            Judgment::unavailable(format!("{e:#}"))
        }
    }
}

/// Builds the instruction and submission texts of a review request.
pub fn review_request(problem: &str, source: &str) -> (String, String) {
    let instructions = format!(
        include_str!("prompts/escalation.md"),
        PROBLEM = problem.trim()
    );
    let code = format!(
        "CODE:\n```cpp\n{}\n```\n",
        truncate_with_notice(source.trim(), PROMPT_TRUNCATE)
    );
    (instructions, code)
}
