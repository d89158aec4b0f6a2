#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{ffi::OsString, path::Path};

use crate::{
    config::CompilerConfig,
    process::{Invocation, ProcessRunner},
};

/// Result of one compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    /// Whether the toolchain exited with status zero.
    pub success:     bool,
    /// Combined compiler stderr/stdout, or the launch error.
    pub diagnostics: String,
}

/// Drives the external C++ toolchain.
#[derive(Debug, Clone)]
pub struct Compiler {
    /// program to launch, already resolved where possible
    program: OsString,
    /// flags placed before the source path
    flags:   Vec<String>,
}

impl Compiler {
    /// Builds a compiler from configuration, resolving the program on `PATH`.
    ///
    /// An unresolvable program is kept as-is; launching it later fails and is
    /// reported as a compilation failure.
    pub fn from_config(config: &CompilerConfig) -> Self {
        let program = match crate::util::compiler_path(config.program()) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("{e:#}");
                OsString::from(config.program())
            }
        };
        Self {
            program,
            flags: config.flags().to_vec(),
        }
    }

    /// Uses `program` verbatim.
    pub fn new(program: impl Into<OsString>, flags: Vec<String>) -> Self {
        Self {
            program: program.into(),
            flags,
        }
    }

    /// The invocation that compiles `source` into `artifact`.
    pub fn invocation(&self, source: &Path, artifact: &Path) -> Invocation {
        Invocation::new(&self.program)
            .args(&self.flags)
            .arg(source)
            .arg("-o")
            .arg(artifact)
    }

    /// Compiles `source` into `artifact`, overwriting any existing artifact.
    ///
    /// Only a zero exit status counts as success. Diagnostics are logged at
    /// debug level and otherwise left to the caller.
    pub fn compile(
        &self,
        runner: &dyn ProcessRunner,
        source: &Path,
        artifact: &Path,
    ) -> CompileOutcome {
        let invocation = self.invocation(source, artifact);
        tracing::debug!("Compiling with `{}`", invocation.display());

        let outcome = match runner.invoke(&invocation) {
            Ok(collected) => CompileOutcome {
                success:     collected.success(),
                diagnostics: [collected.stderr_lossy(), collected.stdout_lossy()].concat(),
            },
            Err(e) => CompileOutcome {
                success:     false,
                diagnostics: format!("Compilation error: {e:#}"),
            },
        };

        if !outcome.success {
            tracing::debug!("Compiler diagnostics for {}:\n{}", source.display(), outcome.diagnostics);
        }
        outcome
    }
}
