use crate::error::{ComposerMrError, Result};
use crate::utils::path_validator::PathValidator;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const CI_TOKEN_REMOTE: &str = r"^https://gitlab-ci-token:(.*)@(.*)$";

/// VersionControlAgent handles Git operations with hardened input validation.
pub struct VersionControlAgent {
    project_path: PathBuf,
}

impl VersionControlAgent {
    pub fn new<P: AsRef<Path>>(project_path: P) -> Result<Self> {
        let project_path = Self::validate_git_path(project_path.as_ref())?;
        Ok(Self { project_path })
    }

    /// Check if the working directory is clean
    pub fn is_working_directory_clean(&self) -> Result<bool> {
        let output = self.run_git(&["status", "--porcelain"])?;
        Self::ensure_success(&output, "git status")?;
        Ok(output.stdout.is_empty())
    }

    /// Set the author used for the update commit
    pub fn configure_identity(&self, user: &str, email: &str) -> Result<()> {
        let output = self.run_git(&["config", "user.name", user])?;
        Self::ensure_success(&output, "git config user.name")?;
        let output = self.run_git(&["config", "user.email", email])?;
        Self::ensure_success(&output, "git config user.email")?;
        Ok(())
    }

    /// Point `origin` at the CI repository URL authenticated with the API token,
    /// since the job token cannot push.
    pub fn set_push_url(&self, token: &str, repository_url: &str) -> Result<()> {
        let url = authenticated_remote_url(token, repository_url).ok_or_else(|| {
            ComposerMrError::GitOperation(
                "CI_REPOSITORY_URL is not a gitlab-ci-token HTTPS URL".to_string(),
            )
        })?;

        let output = self.run_git(&["remote", "set-url", "origin", &url])?;
        Self::ensure_success(&output, "git remote set-url")
    }

    /// Check out the target branch and rebase it onto its upstream
    pub fn switch_branch(&self, branch: &str) -> Result<()> {
        Self::validate_ref_name(branch)?;
        let output = self.run_git(&["checkout", branch])?;
        Self::ensure_success(&output, "git checkout")?;
        let output = self.run_git(&["pull", "--rebase"])?;
        Self::ensure_success(&output, "git pull --rebase")?;
        Ok(())
    }

    /// Full workflow: create branch, stage everything, commit and push
    pub fn commit_to_new_branch(&self, branch: &str, message: &str) -> Result<()> {
        Self::validate_ref_name(branch)?;

        let output = self.run_git(&["checkout", "-b", branch])?;
        Self::ensure_success(&output, "git checkout -b")?;

        let output = self.run_git(&["add", "."])?;
        Self::ensure_success(&output, "git add")?;

        let output = self.run_git(&["commit", "-m", message])?;
        Self::ensure_success(&output, "git commit")?;

        let output = self.run_git(&["push", "origin", branch])?;
        Self::ensure_success(&output, "git push")?;
        Ok(())
    }

    /// Delete a branch on `origin`; GitLab closes any merge request using it
    pub fn delete_remote_branch(&self, branch: &str) -> Result<()> {
        Self::validate_ref_name(branch)?;
        let refspec = format!(":{branch}");
        let output = self.run_git(&["push", "origin", &refspec])?;
        Self::ensure_success(&output, "git push --delete")
    }

    fn run_git(&self, args: &[&str]) -> Result<Output> {
        // only the subcommand is logged, arguments may carry credentials
        log::debug!("git {} (in {})", args[0], self.project_path.display());

        Command::new("git")
            .current_dir(&self.project_path)
            .args(args)
            .output()
            .map_err(|e| {
                ComposerMrError::GitOperation(format!(
                    "Failed to execute git command '{}': {e}",
                    args[0]
                ))
            })
    }

    fn ensure_success(output: &Output, command: &str) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }

        Err(ComposerMrError::GitOperation(format!(
            "{} failed: {}",
            command,
            String::from_utf8_lossy(&output.stderr)
        )))
    }

    fn validate_git_path(path: &Path) -> Result<PathBuf> {
        let dangerous = [';', '|', '&', '$', '`', '\n', '\r'];
        let path_str = path.to_string_lossy();
        if let Some(ch) = dangerous.iter().find(|c| path_str.contains(**c)) {
            return Err(ComposerMrError::GitOperation(format!(
                "Path contains dangerous character: '{}'",
                ch
            )));
        }

        if !path.is_absolute() {
            return Err(ComposerMrError::GitOperation(
                "Only absolute paths are allowed for Git operations".to_string(),
            ));
        }

        PathValidator::validate_project_path(path)
            .map_err(|err| ComposerMrError::GitOperation(format!("Invalid Git path: {}", err)))
    }

    fn validate_ref_name(branch: &str) -> Result<()> {
        let valid = !branch.is_empty()
            && !branch.starts_with('-')
            && !branch.contains("..")
            && !branch.chars().any(|c| {
                c.is_whitespace()
                    || c.is_control()
                    || matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\')
            });

        if valid {
            Ok(())
        } else {
            Err(ComposerMrError::GitOperation(format!(
                "Invalid branch name: '{branch}'"
            )))
        }
    }
}

/// Swap the job token in `https://gitlab-ci-token:<job token>@host/path` for `token`.
pub fn authenticated_remote_url(token: &str, repository_url: &str) -> Option<String> {
    let re = Regex::new(CI_TOKEN_REMOTE).ok()?;
    let captures = re.captures(repository_url)?;
    let location = captures.get(2)?.as_str();
    Some(format!("https://gitlab-ci-token:{token}@{location}"))
}
