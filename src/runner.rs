#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::Path;

use crate::{
    extract::Extractor,
    fixture::Fixture,
    process::{Invocation, ProcessRunner},
    report::{FixtureResult, TestOutcome},
};

/// Runs `artifact` inside its own directory with the fixture input on stdin
/// and compares the extracted output with the fixture's expected value.
///
/// Never fails: an unreadable input, a launch failure, or output with nothing
/// to extract all produce [`TestOutcome::Failed`]. When extraction finds
/// nothing, the trimmed raw stdout is reported as the actual value. The
/// program's exit status does not affect the verdict.
pub fn run_fixture(
    runner: &dyn ProcessRunner,
    extractor: &dyn Extractor,
    artifact: &Path,
    fixture: &Fixture,
) -> FixtureResult {
    let failed = |actual: String| FixtureResult {
        fixture: fixture.name().to_string(),
        outcome: TestOutcome::Failed {
            expected: fixture.expected().to_string(),
            actual,
        },
    };

    let input = match std::fs::read(fixture.input_path()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                "Error running test {} with input {}: {}",
                artifact.display(),
                fixture.input_path().display(),
                e
            );
            return failed(String::new());
        }
    };

    let mut invocation = Invocation::new(artifact).stdin_bytes(input);
    if let Some(dir) = artifact.parent() {
        invocation = invocation.current_dir(dir);
    }

    let collected = match runner.invoke(&invocation) {
        Ok(collected) => collected,
        Err(e) => {
            tracing::warn!(
                "Error running test {} with input {}: {e:#}",
                artifact.display(),
                fixture.input_path().display()
            );
            return failed(String::new());
        }
    };

    if !collected.success() {
        tracing::debug!(
            "{} exited with {:?} on fixture {}",
            artifact.display(),
            collected.code,
            fixture.name()
        );
    }

    let stdout = collected.stdout_lossy();
    match extractor.extract(&stdout) {
        Some(actual) if actual == fixture.expected() => FixtureResult {
            fixture: fixture.name().to_string(),
            outcome: TestOutcome::Passed,
        },
        Some(actual) => failed(actual),
        None => {
            tracing::debug!("No comparable value in output of fixture {}", fixture.name());
            failed(stdout.trim().to_string())
        }
    }
}
