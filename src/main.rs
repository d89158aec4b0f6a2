#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # codejudge
//!
//! Grades every submission in a directory against a set of fixtures.
//!
//! Directories, the problem statement, the extraction rule, and the compiler
//! can be given on the command line or through `CODEJUDGE_*` variables
//! (a `.env` file is honored). Set `OPENAI_API_KEY` to have compile failures
//! reviewed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::*;
use codejudge::{Judge, config::Overrides, config::JudgeConfig};
use dotenvy::dotenv;
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Parsed command line.
#[derive(Debug, Clone)]
struct Cli {
    /// configuration overrides
    overrides: Overrides,
    /// where to write a JSON copy of the run report
    json:      Option<PathBuf>,
    /// log at debug level
    verbose:   bool,
}

/// Parse the command line arguments into a `Cli`
fn options() -> Cli {
    let submissions_dir = long("submissions")
        .short('s')
        .help("Directory holding one source file per submission")
        .argument::<PathBuf>("DIR")
        .optional();
    let fixtures_dir = long("fixtures")
        .short('f')
        .help("Directory holding one subdirectory per fixture")
        .argument::<PathBuf>("DIR")
        .optional();
    let workspace_dir = long("workspace")
        .help("Directory where submissions are compiled")
        .argument::<PathBuf>("DIR")
        .optional();
    let problem = long("problem")
        .short('p')
        .help("Problem statement sent with escalation reviews")
        .argument::<String>("TEXT")
        .optional();
    let problem_file = long("problem-file")
        .help("File holding the problem statement")
        .argument::<PathBuf>("PATH")
        .optional();
    let patterns_file = long("patterns")
        .help("JSON object of analysis rule name to regular expression")
        .argument::<PathBuf>("PATH")
        .optional();
    let extract_pattern = long("extract")
        .help("Regular expression extracting the compared value from output")
        .argument::<String>("REGEX")
        .optional();
    let compiler = long("cxx")
        .help("C++ compiler to invoke")
        .argument::<String>("PROGRAM")
        .optional();

    let overrides = construct!(Overrides {
        submissions_dir,
        fixtures_dir,
        workspace_dir,
        problem,
        problem_file,
        patterns_file,
        extract_pattern,
        compiler,
    });

    let json = long("json")
        .help("Also write the run report as JSON to PATH")
        .argument::<PathBuf>("PATH")
        .optional();
    let verbose = short('v')
        .long("verbose")
        .help("Log compiler diagnostics and other debug output")
        .switch();

    construct!(Cli {
        overrides,
        json,
        verbose
    })
    .to_options()
    .descr("Analyze, compile, and test C++ submissions")
    .run()
}

fn main() -> Result<()> {
    dotenv().ok();
    let cli = options();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer =
        LevelFilter::from_level(if cli.verbose { Level::DEBUG } else { Level::INFO });
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let config = JudgeConfig::load(&cli.overrides)?;
    let judge = Judge::from_config(config)?;
    let report = judge.run()?;

    if let Some(path) = cli.json {
        report
            .write_json(&path)
            .with_context(|| format!("Failed to export report to {}", path.display()))?;
    }

    Ok(())
}
