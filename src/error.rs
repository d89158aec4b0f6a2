#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

/// Configuration problems that make a run, or part of it, unusable.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Two pattern rules share the same name.
    #[error("Pattern `{0}` is defined more than once")]
    DuplicatePattern(String),
    /// A pattern rule or extraction rule is not a valid regular expression.
    #[error("Pattern `{name}` is not a valid regular expression")]
    InvalidPattern {
        /// name of the offending rule
        name:   String,
        /// regex compilation error
        #[source]
        source: regex::Error,
    },
    /// A pattern file could not be read or did not hold a JSON object of
    /// strings.
    #[error("Could not load pattern rules from {path}: {reason}")]
    PatternFile {
        /// path to the pattern file
        path:   PathBuf,
        /// what went wrong
        reason: String,
    },
    /// A submissions or fixtures directory could not be listed.
    #[error("Could not list directory {path}")]
    DirectoryListing {
        /// directory that failed to list
        path:   PathBuf,
        /// underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// The review service is not configured.
    #[error("{0} must be set to request an escalation review")]
    MissingEnv(&'static str),
}
