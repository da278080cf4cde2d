use crate::error::{ComposerMrError, Result};
use std::path::{Path, PathBuf};

const FORBIDDEN_ROOTS: &[&str] = &["/etc", "/sys", "/proc", "/dev", "/boot"];

/// Guards the repository directory the tool is pointed at.
pub struct PathValidator;

impl PathValidator {
    /// Canonicalise a repository path and refuse system directories.
    pub fn validate_project_path(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();

        let canonical = path.canonicalize().map_err(|e| {
            ComposerMrError::ProjectValidation(format!("Invalid path '{}': {e}", path.display()))
        })?;

        if !canonical.is_dir() {
            return Err(ComposerMrError::ProjectValidation(format!(
                "Path '{}' is not a directory",
                canonical.display()
            )));
        }

        let forbidden = FORBIDDEN_ROOTS.iter().map(Path::new).find(|root| {
            path.starts_with(root)
                || canonical.starts_with(root)
                || root
                    .canonicalize()
                    .is_ok_and(|canonical_root| canonical.starts_with(canonical_root))
        });

        if let Some(root) = forbidden {
            return Err(ComposerMrError::ProjectValidation(format!(
                "Access to system directory '{}' is not allowed",
                root.display()
            )));
        }

        Ok(canonical)
    }

    /// Resolve `file_path` and make sure it stays inside `base_dir`
    /// (a symlinked `composer.lock` must not point elsewhere).
    pub fn validate_file_path(
        file_path: impl AsRef<Path>,
        base_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let file_path = file_path.as_ref();
        let base_dir = base_dir.as_ref();

        let canonical_file = file_path.canonicalize().map_err(|e| {
            ComposerMrError::ProjectValidation(format!(
                "Invalid file path '{}': {e}",
                file_path.display()
            ))
        })?;

        let canonical_base = base_dir.canonicalize().map_err(|e| {
            ComposerMrError::ProjectValidation(format!(
                "Invalid base directory '{}': {e}",
                base_dir.display()
            ))
        })?;

        if !canonical_file.starts_with(&canonical_base) {
            return Err(ComposerMrError::ProjectValidation(format!(
                "'{}' is outside the repository",
                file_path.display()
            )));
        }

        Ok(canonical_file)
    }
}
