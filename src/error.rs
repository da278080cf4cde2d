use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposerMrError {
    #[error("Project validation failed: {0}")]
    ProjectValidation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Composer execution failed: {0}")]
    ComposerExecution(String),

    #[error("Lockfile parsing failed: {0}")]
    LockParsing(String),

    #[error("Git operation failed: {0}")]
    GitOperation(String),

    #[error("GitLab API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ComposerMrError>;
