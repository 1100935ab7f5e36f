//! The local artifact: the file the update engine compares and replaces.
//!
//! Replacement writes the candidate to a temporary file in the artifact's
//! directory and renames it over the artifact, so a reader sees either the
//! old or the new content, never a partial write. The previous content is
//! kept as `<name>.bak` when backups are enabled.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::UpdateError;

#[derive(Debug, Clone)]
pub struct LocalArtifact {
    path: PathBuf,
    keep_backup: bool,
}

impl LocalArtifact {
    pub fn new(path: impl Into<PathBuf>, keep_backup: bool) -> Self {
        Self {
            path: path.into(),
            keep_backup,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the previous content is kept after a replacement.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("artifact"));
        name.push(".bak");
        self.path.with_file_name(name)
    }

    /// Read the current content.
    pub fn read(&self) -> Result<Vec<u8>, UpdateError> {
        fs::read(&self.path).map_err(|source| UpdateError::LocalReadFailed {
            path: self.path.clone(),
            source,
        })
    }

    /// Atomically replace the artifact with `content`.
    ///
    /// The file mode of the existing artifact is carried over so an
    /// executable stays executable.
    pub fn replace(&self, content: &[u8]) -> Result<(), UpdateError> {
        let write_failed = |reason: String| UpdateError::LocalWriteFailed {
            path: self.path.clone(),
            reason,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let permissions = fs::metadata(&self.path).ok().map(|m| m.permissions());

        if self.keep_backup && self.path.exists() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup)
                .map_err(|e| write_failed(format!("backup to {}: {}", backup.display(), e)))?;
            tracing::debug!(backup = %backup.display(), "Previous artifact retained");
        }

        let mut staged = tempfile::Builder::new()
            .prefix(".schoolhouse-update-")
            .tempfile_in(dir)
            .map_err(|e| write_failed(format!("staging file: {}", e)))?;
        staged
            .write_all(content)
            .map_err(|e| write_failed(e.to_string()))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|e| write_failed(e.to_string()))?;
        if let Some(permissions) = permissions {
            fs::set_permissions(staged.path(), permissions)
                .map_err(|e| write_failed(format!("permissions: {}", e)))?;
        }

        staged
            .persist(&self.path)
            .map_err(|e| write_failed(e.error.to_string()))?;

        tracing::info!(
            path = %self.path.display(),
            bytes = content.len(),
            "Artifact replaced"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact_in(dir: &Path, content: &str) -> LocalArtifact {
        let path = dir.join("app.py");
        fs::write(&path, content).unwrap();
        LocalArtifact::new(path, true)
    }

    #[test]
    fn test_read_existing() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_in(dir.path(), "import a");
        assert_eq!(artifact.read().unwrap(), b"import a");
    }

    #[test]
    fn test_read_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = LocalArtifact::new(dir.path().join("missing.py"), true);
        let err = artifact.read().unwrap_err();
        assert!(matches!(err, UpdateError::LocalReadFailed { .. }));
    }

    #[test]
    fn test_backup_path() {
        let artifact = LocalArtifact::new("/opt/school/app.py", true);
        assert_eq!(artifact.backup_path(), PathBuf::from("/opt/school/app.py.bak"));
    }

    #[test]
    fn test_replace_writes_content_and_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_in(dir.path(), "import a");

        artifact.replace(b"import b").unwrap();

        assert_eq!(fs::read(artifact.path()).unwrap(), b"import b");
        assert_eq!(fs::read(artifact.backup_path()).unwrap(), b"import a");
    }

    #[test]
    fn test_replace_keeps_only_one_prior_copy() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_in(dir.path(), "import a");

        artifact.replace(b"import b").unwrap();
        artifact.replace(b"import c").unwrap();

        assert_eq!(fs::read(artifact.path()).unwrap(), b"import c");
        assert_eq!(fs::read(artifact.backup_path()).unwrap(), b"import b");
    }

    #[test]
    fn test_replace_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.py");
        fs::write(&path, "import a").unwrap();
        let artifact = LocalArtifact::new(&path, false);

        artifact.replace(b"import b").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"import b");
        assert!(!artifact.backup_path().exists());
    }

    #[test]
    fn test_replace_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_in(dir.path(), "import a");
        artifact.replace(b"import b").unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["app.py".to_string(), "app.py.bak".to_string()]);
    }

    #[test]
    fn test_replace_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = LocalArtifact::new(dir.path().join("gone").join("app.py"), true);
        let err = artifact.replace(b"import b").unwrap_err();
        assert!(matches!(err, UpdateError::LocalWriteFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_replace_preserves_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_in(dir.path(), "#!/bin/sh\n");
        fs::set_permissions(artifact.path(), fs::Permissions::from_mode(0o755)).unwrap();

        artifact.replace(b"#!/bin/sh\necho new\n").unwrap();

        let mode = fs::metadata(artifact.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
