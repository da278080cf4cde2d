use crate::error::{ComposerMrError, Result};
use jiff::Zoned;
use std::path::PathBuf;

const DEFAULT_COMPOSER_VERSION: u32 = 2;

/// Runtime settings taken from the CI job environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub composer_version: u32,
    pub branch_prefix: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub reviewers: Vec<String>,
    pub replace_open: bool,
    pub api_token: Option<String>,
    pub api_url: Option<String>,
    pub project_id: Option<String>,
    pub project_path: Option<String>,
    pub repository_url: Option<String>,
}

/// The subset of [`Settings`] needed to talk to GitLab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLabSettings {
    pub api_url: String,
    pub token: String,
    pub project_id: String,
    pub project_path: String,
    pub repository_url: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        Self {
            composer_version: env
                .positive_int("COMPOSER_MR_COMPOSER_VERSION", DEFAULT_COMPOSER_VERSION),
            branch_prefix: env.string("COMPOSER_MR_BRANCH_PREFIX").unwrap_or_default(),
            labels: env.csv("COMPOSER_MR_LABELS"),
            assignees: env.csv("COMPOSER_MR_ASSIGNEES"),
            reviewers: env.csv("COMPOSER_MR_REVIEWERS"),
            replace_open: env.boolean("COMPOSER_MR_REPLACE_OPEN", true),
            api_token: env
                .string("COMPOSER_MR_TOKEN")
                .or_else(|| env.string("GITLAB_API_PRIVATE_TOKEN")),
            api_url: env.string("CI_API_V4_URL"),
            project_id: env.string("CI_PROJECT_ID"),
            project_path: env.string("CI_PROJECT_PATH"),
            repository_url: env.string("CI_REPOSITORY_URL"),
        }
    }

    /// GitLab connection details, or an error naming every missing variable.
    pub fn gitlab(&self) -> Result<GitLabSettings> {
        let required = [
            ("COMPOSER_MR_TOKEN or GITLAB_API_PRIVATE_TOKEN", &self.api_token),
            ("CI_API_V4_URL", &self.api_url),
            ("CI_PROJECT_ID", &self.project_id),
            ("CI_PROJECT_PATH", &self.project_path),
            ("CI_REPOSITORY_URL", &self.repository_url),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(ComposerMrError::Config(format!(
                "GitLab environment variables not set: {}",
                missing.join(", ")
            )));
        }

        Ok(GitLabSettings {
            api_url: self.api_url.clone().unwrap_or_default(),
            token: self.api_token.clone().unwrap_or_default(),
            project_id: self.project_id.clone().unwrap_or_default(),
            project_path: self.project_path.clone().unwrap_or_default(),
            repository_url: self.repository_url.clone().unwrap_or_default(),
        })
    }

    /// Locate `composer-{version}` on `PATH`, falling back to plain `composer`.
    pub fn composer_binary(&self) -> Result<PathBuf> {
        let versioned = format!("composer-{}", self.composer_version);
        which::which(&versioned)
            .or_else(|_| which::which("composer"))
            .map_err(|_| ComposerMrError::Config(format!("\"{versioned}\" not found")))
    }

    pub fn branch_name(&self, now: &Zoned) -> String {
        format!(
            "{}composer-update-{}",
            self.branch_prefix,
            now.strftime("%Y%m%d%H%M%S")
        )
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn positive_int(&self, key: &str, default: u32) -> u32 {
        self.string(key)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(default)
    }

    fn csv(&self, key: &str) -> Vec<String> {
        self.string(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn boolean(&self, key: &str, default: bool) -> bool {
        match self.string(key).map(|v| v.to_lowercase()).as_deref() {
            Some("true" | "yes" | "y" | "1") => true,
            Some("false" | "no" | "n" | "0") => false,
            _ => default,
        }
    }
}
