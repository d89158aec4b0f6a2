#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::{OsStr, OsString},
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::{Context, Result};

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    /// Exit code returned by the process, `None` if it was killed by a signal.
    pub code:   Option<i32>,
    /// Contents written to stdout.
    pub stdout: Vec<u8>,
    /// Contents written to stderr.
    pub stderr: Vec<u8>,
}

impl Collected {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Lossy UTF-8 view of stdout.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Lossy UTF-8 view of stderr.
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Describes how stdin should be wired for the spawned process.
#[derive(Debug, Clone)]
pub enum StdinSource {
    /// Attach nothing to stdin.
    Null,
    /// Write the provided bytes, then close stdin.
    Bytes(Vec<u8>),
}

/// A single request to launch an external program.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Program to execute.
    pub program: OsString,
    /// Arguments passed to the program.
    pub args:    Vec<OsString>,
    /// How stdin is wired.
    pub stdin:   StdinSource,
    /// Working directory, inherited when `None`.
    pub cwd:     Option<PathBuf>,
}

impl Invocation {
    /// Creates an invocation with no arguments and a closed stdin.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args:    Vec::new(),
            stdin:   StdinSource::Null,
            cwd:     None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Feeds `bytes` to the process on stdin.
    pub fn stdin_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = StdinSource::Bytes(bytes.into());
        self
    }

    /// Runs the process inside `dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Renders the command line for diagnostics.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|s| s.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Capability to launch external programs: the compiler and the compiled
/// submissions both go through this seam.
pub trait ProcessRunner {
    /// Runs `invocation` to completion and collects its output.
    ///
    /// Returns `Err` only when the process could not be launched or waited
    /// on; a non-zero exit is reported through [`Collected::code`].
    fn invoke(&self, invocation: &Invocation) -> Result<Collected>;
}

/// Launches real processes with [`std::process::Command`]. Blocking, with no
/// timeout and no resource limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn invoke(&self, invocation: &Invocation) -> Result<Collected> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        match &invocation.stdin {
            StdinSource::Null => {
                cmd.stdin(Stdio::null());
            }
            StdinSource::Bytes(_) => {
                cmd.stdin(Stdio::piped());
            }
        }

        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn `{}`", invocation.display()))?;

        if let StdinSource::Bytes(bytes) = &invocation.stdin
            && let Some(mut handle) = child.stdin.take()
        {
            let bytes = bytes.clone();
            // The child may fill its stdout pipe before it drains stdin.
            std::thread::spawn(move || {
                if !bytes.is_empty() {
                    let _ = handle.write_all(&bytes);
                }
                let _ = handle.flush();
            });
        }

        let output = child
            .wait_with_output()
            .context("Error when waiting for child process to finish")?;

        Ok(Collected {
            code:   output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn invoke(&self, invocation: &Invocation) -> Result<Collected> {
        (**self).invoke(invocation)
    }
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for Box<R> {
    fn invoke(&self, invocation: &Invocation) -> Result<Collected> {
        (**self).invoke(invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_display_joins_program_and_args() {
        let inv = Invocation::new("g++")
            .arg("main.cpp")
            .args(["-o", "program"]);
        assert_eq!(inv.display(), "g++ main.cpp -o program");
        assert!(matches!(inv.stdin, StdinSource::Null));
    }

    #[test]
    fn collected_success_requires_zero_exit() {
        let ok = Collected {
            code: Some(0),
            ..Default::default()
        };
        let failed = Collected {
            code: Some(1),
            ..Default::default()
        };
        let signalled = Collected::default();
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!signalled.success());
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_feeds_stdin_and_captures_stdout() {
        let collected = SystemRunner
            .invoke(&Invocation::new("cat").stdin_bytes("3.14\n"))
            .expect("run cat");
        assert!(collected.success());
        assert_eq!(collected.stdout_lossy(), "3.14\n");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_honors_working_directory() {
        let dir = std::env::temp_dir()
            .canonicalize()
            .expect("resolve temp dir");
        let collected = SystemRunner
            .invoke(&Invocation::new("pwd").current_dir(&dir))
            .expect("run pwd");
        assert_eq!(collected.stdout_lossy().trim(), dir.to_string_lossy());
    }

    #[test]
    fn system_runner_reports_spawn_failure_as_error() {
        let result = SystemRunner.invoke(&Invocation::new("codejudge-definitely-not-a-program"));
        assert!(result.is_err());
    }
}
