#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// File name of the compiled artifact inside a workspace.
pub const ARTIFACT_NAME: &str = "program";

/// Scratch directory owned by a single submission.
///
/// Each submission compiles into a fresh, uniquely named directory under the
/// workspace root, so one artifact can never be mistaken for another's. Only
/// that directory is removed on drop; nothing else under the root is touched.
#[derive(Debug)]
pub struct SubmissionWorkspace {
    /// owns the directory and deletes it on drop
    dir:  TempDir,
    /// absolute path of `dir`
    path: PathBuf,
}

impl SubmissionWorkspace {
    /// Creates a new workspace for `submission` under `root`.
    pub fn create(root: &Path, submission: &str) -> Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("Could not create workspace root {}", root.display()))?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{submission}-"))
            .tempdir_in(root)
            .with_context(|| format!("Could not create workspace for {submission}"))?;
        let path = dir
            .path()
            .canonicalize()
            .with_context(|| format!("Could not resolve workspace {}", dir.path().display()))?;

        tracing::debug!("Workspace for {submission}: {}", path.display());
        Ok(Self { dir, path })
    }

    /// Returns the workspace directory.
    pub fn dir(&self) -> &Path {
        &self.path
    }

    /// Absolute path of the artifact the compiler writes.
    pub fn artifact(&self) -> PathBuf {
        self.path.join(ARTIFACT_NAME)
    }

    /// Removes the directory now, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<()> {
        let shown = self.path.display().to_string();
        self.dir
            .close()
            .with_context(|| format!("Could not remove workspace {shown}"))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("codejudge-ws-{}", Uuid::new_v4()))
    }

    #[test]
    fn workspace_is_created_and_removed() {
        let root = temp_root();
        let dir = {
            let ws = SubmissionWorkspace::create(&root, "alice").expect("create workspace");
            assert!(ws.dir().is_dir());
            assert!(ws.dir().is_absolute());
            assert!(crate::util::file_name(ws.dir()).starts_with("alice-"));
            assert_eq!(ws.artifact(), ws.dir().join(ARTIFACT_NAME));
            std::fs::write(ws.artifact(), b"artifact").expect("write artifact");
            ws.dir().to_path_buf()
        };
        assert!(!dir.exists());
        assert!(root.is_dir());
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn same_submission_gets_a_fresh_directory_each_time() {
        let root = temp_root();
        let first = SubmissionWorkspace::create(&root, "bob").expect("create workspace");
        std::fs::write(first.artifact(), b"old").expect("write artifact");

        let second = SubmissionWorkspace::create(&root, "bob").expect("create again");
        assert_ne!(first.dir(), second.dir());
        assert!(!second.artifact().exists());

        first.close().expect("close first");
        second.close().expect("close second");
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn existing_directory_named_like_the_submission_is_left_alone() {
        let root = temp_root();
        let notes = root.join("notes");
        std::fs::create_dir_all(&notes).expect("create notes");
        std::fs::write(notes.join("grades.csv"), "alice,10\n").expect("write grades");

        let ws = SubmissionWorkspace::create(&root, "notes").expect("create workspace");
        assert_ne!(ws.dir(), notes.canonicalize().expect("resolve notes"));
        ws.close().expect("close workspace");

        assert_eq!(
            std::fs::read_to_string(notes.join("grades.csv")).expect("read grades"),
            "alice,10\n"
        );
        let _ = std::fs::remove_dir_all(root);
    }
}
