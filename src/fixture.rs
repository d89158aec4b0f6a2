#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{config::JudgeConfig, extract::Extractor, util};

/// A paired stdin / expected-value test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    /// directory name of the fixture
    name:       String,
    /// file fed verbatim as stdin
    input_path: PathBuf,
    /// value extracted once from the expected-output file
    expected:   String,
}

impl Fixture {
    /// Creates a fixture with an already extracted expected value.
    pub fn new(
        name: impl Into<String>,
        input_path: impl Into<PathBuf>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            name:       name.into(),
            input_path: input_path.into(),
            expected:   expected.into(),
        }
    }

    /// Returns the fixture name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path of the stdin file.
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Returns the extracted expected value.
    pub fn expected(&self) -> &str {
        &self.expected
    }
}

/// A fixture directory that could not be turned into a [`Fixture`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusableFixture {
    /// directory name of the fixture
    pub name:   String,
    /// why it was excluded
    pub reason: String,
}

/// Fixtures shared by every submission of a run.
#[derive(Debug, Clone, Default)]
pub struct FixtureSet {
    /// usable fixtures, ordered by name
    fixtures: Vec<Fixture>,
    /// excluded fixtures with their configuration errors
    unusable: Vec<UnusableFixture>,
}

impl FixtureSet {
    /// Discovers fixtures under the configured fixtures directory.
    ///
    /// Failing to list the directory is fatal. Individual fixtures with a
    /// missing input, an unreadable expected output, or an expected output the
    /// extractor finds nothing in are excluded and recorded as unusable.
    pub fn load(config: &JudgeConfig, extractor: &dyn Extractor) -> Result<Self> {
        let dir = config.fixtures_dir();
        let entries = util::sorted_entries(dir)
            .with_context(|| format!("Error accessing fixtures directory {}", dir.display()))?;

        let mut set = Self::default();
        for path in entries.into_iter().filter(|p| p.is_dir()) {
            let name = util::file_name(&path);
            match load_one(&path, config, extractor) {
                Ok((input_path, expected)) => {
                    set.fixtures.push(Fixture::new(name, input_path, expected))
                }
                Err(e) => {
                    tracing::error!("Fixture {name} is unusable: {e:#}");
                    set.unusable.push(UnusableFixture {
                        name,
                        reason: format!("{e:#}"),
                    });
                }
            }
        }

        tracing::info!(
            "Loaded {} fixture(s) from {} ({} unusable)",
            set.fixtures.len(),
            dir.display(),
            set.unusable.len()
        );
        Ok(set)
    }

    /// Returns the usable fixtures in enumeration order.
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Returns the excluded fixtures.
    pub fn unusable(&self) -> &[UnusableFixture] {
        &self.unusable
    }
}

/// Resolves the input path and expected value of one fixture directory.
fn load_one(
    dir: &Path,
    config: &JudgeConfig,
    extractor: &dyn Extractor,
) -> Result<(PathBuf, String)> {
    let input_path = dir.join(config.input_file());
    anyhow::ensure!(input_path.is_file(), "missing input file {}", input_path.display());

    let expected_path = dir.join(config.expected_file());
    let raw = std::fs::read_to_string(&expected_path).with_context(|| {
        format!("Error reading expected output file {}", expected_path.display())
    })?;

    let expected = extractor.extract(&raw).with_context(|| {
        format!("No comparable value found in {}", expected_path.display())
    })?;

    Ok((input_path, expected))
}
