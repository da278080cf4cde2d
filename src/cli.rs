use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "composer-mr",
    about = "Run composer update and open a GitLab merge request describing the lockfile changes",
    version,
    author
)]
pub struct Cli {
    /// Path to the repository (defaults to current directory)
    #[arg(short, long, default_value = ".", global = true)]
    pub path: String,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Update composer dependencies and open a merge request with the changes
    Update {
        /// Name used for the update commit
        #[arg(value_name = "COMMIT_USER")]
        commit_user: String,

        /// E-mail address used for the update commit
        #[arg(value_name = "COMMIT_EMAIL")]
        commit_email: String,

        /// Branch to update and to target with the merge request
        #[arg(value_name = "TARGET_BRANCH")]
        target_branch: String,

        /// Extra flags passed to `composer update` (comma separated)
        #[arg(
            short = 'f',
            long = "composer-flags",
            value_delimiter = ',',
            allow_hyphen_values = true
        )]
        composer_flags: Vec<String>,

        /// Title line of the update commit
        #[arg(short = 't', long = "commit-title", default_value = "Update composer dependencies")]
        commit_title: String,

        /// Print the change report without committing or opening a merge request
        #[arg(long)]
        dry_run: bool,
    },

    /// Compare two composer.lock files without touching git or GitLab
    Diff {
        /// Lockfile before the update
        #[arg(value_name = "BEFORE")]
        before: String,

        /// Lockfile after the update
        #[arg(value_name = "AFTER")]
        after: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = DiffFormat::Summary)]
        format: DiffFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffFormat {
    /// Coloured list with the kind of each change
    Summary,
    /// Merge request description
    Markdown,
    /// Commit message body
    Changelog,
}
