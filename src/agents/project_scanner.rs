use crate::error::{ComposerMrError, Result};
use crate::utils::path_validator::PathValidator;
use std::path::{Path, PathBuf};

const LOCKFILE_NAME: &str = "composer.lock";

/// ProjectScannerAgent validates the project structure
pub struct ProjectScannerAgent {
    project_path: PathBuf,
}

impl ProjectScannerAgent {
    pub fn new<P: AsRef<Path>>(project_path: P) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
        }
    }

    /// Validates the project structure
    pub fn validate(&self) -> Result<ProjectInfo> {
        let project_path = PathValidator::validate_project_path(&self.project_path)?;

        let lock_path = project_path.join(LOCKFILE_NAME);
        if !lock_path.is_file() {
            return Err(ComposerMrError::ProjectValidation(format!(
                "{} not found",
                lock_path.display()
            )));
        }
        let lock_path = PathValidator::validate_file_path(&lock_path, &project_path)?;

        let git_dir = project_path.join(".git");
        let has_git = git_dir.exists();

        Ok(ProjectInfo {
            project_path,
            lock_path,
            has_git,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProjectInfo {
    pub project_path: PathBuf,
    pub lock_path: PathBuf,
    pub has_git: bool,
}
