#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::{
    analysis::Analysis,
    compiler::Compiler,
    config::JudgeConfig,
    extract::{Extractor, PatternExtractor},
    fixture::FixtureSet,
    process::{ProcessRunner, SystemRunner},
    report::{Console, RunReport, SubmissionReport},
    review::{Judgment, OpenAiReviewer, Reviewer, UnconfiguredReviewer, escalate},
    runner::run_fixture,
    util,
    workspace::SubmissionWorkspace,
};

/// A student source file discovered in the submissions directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// file name without extension
    name: String,
    /// path to the source file
    path: PathBuf,
}

impl Submission {
    /// Creates a submission named after the file stem of `path`.
    pub fn from_path(path: PathBuf) -> Self {
        Self {
            name: util::file_stem(&path),
            path,
        }
    }

    /// Returns the submission name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the source path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lists the regular files of `dir` as submissions, sorted by file name.
pub fn discover_submissions(dir: &Path) -> Result<Vec<Submission>> {
    Ok(util::sorted_entries(dir)
        .with_context(|| format!("Error accessing submissions directory {}", dir.display()))?
        .into_iter()
        .filter(|p| p.is_file())
        .map(Submission::from_path)
        .collect())
}

/// Drives every submission through analysis, compilation, and either the
/// fixtures or an escalation review.
pub struct Judge {
    /// run configuration
    config:    JudgeConfig,
    /// launches the compiler and compiled programs
    runner:    Box<dyn ProcessRunner>,
    /// triages compile failures
    reviewer:  Box<dyn Reviewer>,
    /// reduces outputs to comparable values
    extractor: Box<dyn Extractor>,
    /// compiler invocation
    compiler:  Compiler,
    /// human-readable output
    console:   Console,
}

impl Judge {
    /// Creates a judge with explicit collaborators.
    pub fn new(
        config: JudgeConfig,
        runner: Box<dyn ProcessRunner>,
        reviewer: Box<dyn Reviewer>,
        extractor: Box<dyn Extractor>,
    ) -> Self {
        let compiler = Compiler::new(
            config.compiler().program(),
            config.compiler().flags().to_vec(),
        );
        Self {
            config,
            runner,
            reviewer,
            extractor,
            compiler,
            console: Console::default(),
        }
    }

    /// Creates a judge wired to the real toolchain, the configured extraction
    /// rule, and the OpenAI reviewer when credentials are present.
    pub fn from_config(config: JudgeConfig) -> Result<Self> {
        let extractor = PatternExtractor::new(config.extract_pattern())?;
        let reviewer: Box<dyn Reviewer> = match config.openai() {
            Some(env) => Box::new(OpenAiReviewer::new(env.clone())?),
            None => {
                tracing::warn!("OPENAI_API_KEY is not set; compile failures will not be reviewed");
                Box::new(UnconfiguredReviewer)
            }
        };
        let compiler = Compiler::from_config(config.compiler());

        Ok(Self {
            config,
            runner: Box::new(SystemRunner),
            reviewer,
            extractor: Box::new(extractor),
            compiler,
            console: Console::default(),
        })
    }

    /// Replaces the console.
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Processes every submission and returns the aggregated report.
    ///
    /// Only failing to list the submissions or fixtures directory aborts the
    /// run; everything that goes wrong inside one submission is folded into
    /// its report.
    pub fn run(&self) -> Result<RunReport> {
        let submissions = discover_submissions(self.config.submissions_dir())?;
        let fixtures = FixtureSet::load(&self.config, self.extractor.as_ref())?;

        let mut report = RunReport {
            unusable_fixtures: fixtures.unusable().to_vec(),
            ..Default::default()
        };

        for submission in &submissions {
            report.push(self.process(submission, &fixtures));
        }

        self.console.finish(&report);
        Ok(report)
    }

    /// Processes one submission against the shared fixtures.
    pub fn process(&self, submission: &Submission, fixtures: &FixtureSet) -> SubmissionReport {
        tracing::debug!("Processing {}", submission.path().display());

        let source = std::fs::read(submission.path())
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        let analysis = match &source {
            Ok(text) => self.config.patterns().analyze(text),
            Err(e) => {
                tracing::warn!("Error reading file {}: {}", submission.path().display(), e);
                self.config.patterns().zeroed()
            }
        };
        self.console.analysis(&util::file_name(submission.path()), &analysis);

        let workspace =
            match SubmissionWorkspace::create(self.config.workspace_dir(), submission.name()) {
                Ok(ws) => Some(ws),
                Err(e) => {
                    tracing::error!("{e:#}");
                    None
                }
            };

        let compiled = workspace.as_ref().is_some_and(|ws| {
            self.compiler
                .compile(self.runner.as_ref(), submission.path(), &ws.artifact())
                .success
        });

        let report = match (compiled, &workspace) {
            (true, Some(ws)) => self.test(submission, ws, fixtures, analysis),
            _ => self.triage(submission, source, analysis),
        };

        if let Some(ws) = workspace
            && let Err(e) = ws.close()
        {
            tracing::warn!("{e:#}");
        }
        report
    }

    /// Runs every fixture against the compiled artifact in `ws`.
    fn test(
        &self,
        submission: &Submission,
        ws: &SubmissionWorkspace,
        fixtures: &FixtureSet,
        analysis: Analysis,
    ) -> SubmissionReport {
        let artifact = ws.artifact();
        let tests = fixtures
            .fixtures()
            .iter()
            .map(|fixture| {
                let result = run_fixture(
                    self.runner.as_ref(),
                    self.extractor.as_ref(),
                    &artifact,
                    fixture,
                );
                self.console.fixture(&result);
                result
            })
            .collect();
        SubmissionReport::compiled(submission.name(), analysis, tests)
    }

    /// Asks the reviewer to triage a submission that did not compile.
    fn triage(
        &self,
        submission: &Submission,
        source: std::io::Result<String>,
        analysis: Analysis,
    ) -> SubmissionReport {
        let judgment = match &source {
            Ok(text) => escalate(self.reviewer.as_ref(), self.config.problem(), text),
            Err(e) => Judgment::unavailable(format!(
                "Could not read {}: {e}",
                submission.path().display()
            )),
        };
        self.console
            .escalation(&util::file_name(submission.path()), &judgment);
        SubmissionReport::compile_failed(submission.name(), analysis, judgment)
    }
}
