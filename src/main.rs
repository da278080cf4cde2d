use clap::Parser;
use colored::Colorize;
use composer_mr::cli::{Cli, Commands};
use composer_mr::workflow::{self, UpdateOptions};
use std::process;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Update {
            commit_user,
            commit_email,
            target_branch,
            composer_flags,
            commit_title,
            dry_run,
        } => workflow::execute_update(
            &cli.path,
            &UpdateOptions {
                commit_user,
                commit_email,
                target_branch,
                composer_flags,
                commit_title,
                dry_run,
            },
        ),
        Commands::Diff {
            before,
            after,
            format,
        } => workflow::execute_diff(&before, &after, format),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
