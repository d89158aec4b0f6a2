//! # codejudge
//!
//! An autograder for short C++ course submissions. Each submission is
//! lexically analyzed, compiled, and run against a directory of fixtures;
//! submissions that do not compile are escalated to a review service that
//! triages whether they deserve a manual look.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Lexical pattern analysis of submissions
pub mod analysis;
/// Invoking the external C++ toolchain
pub mod compiler;
/// Run configuration, loaded once at startup
pub mod config;
/// Typed configuration errors
pub mod error;
/// Reducing program output to a comparable value
pub mod extract;
/// Fixture discovery and expected values
pub mod fixture;
/// The submission-processing pipeline
pub mod judge;
/// Launching external processes
pub mod process;
/// Per-submission and per-run reports
pub mod report;
/// Escalation reviews for submissions that fail to compile
pub mod review;
/// Running one compiled submission against one fixture
pub mod runner;
/// Utility functions for convenience
pub mod util;
/// Per-submission scratch directories
pub mod workspace;

pub use config::JudgeConfig;
pub use judge::{Judge, Submission};
pub use report::{RunReport, SubmissionReport, TestOutcome};
