use crate::agents::{ComposerExecutionAgent, ProjectScannerAgent, VersionControlAgent};
use crate::cli::DiffFormat;
use crate::composer::render::{
    commit_message, merge_request_title, render_changelog, render_markdown,
};
use crate::composer::{ChangeKind, DiffReport, LockSnapshot, diff};
use crate::config::{GitLabSettings, Settings};
use crate::error::{ComposerMrError, Result};
use crate::gitlab::{GitLabClient, MergeRequest, MergeRequestService};
use colored::Colorize;
use jiff::Zoned;
use std::path::Path;

/// Arguments of the `update` command
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub commit_user: String,
    pub commit_email: String,
    pub target_branch: String,
    pub composer_flags: Vec<String>,
    pub commit_title: String,
    pub dry_run: bool,
}

/// Execute the update workflow
pub fn execute_update<P: AsRef<Path>>(project_path: P, options: &UpdateOptions) -> Result<()> {
    let project_path = project_path.as_ref();
    println!("{}", "Starting composer update process...".cyan().bold());

    // Step 1: Validate project structure
    println!("\n{}", "1. Validating project structure...".yellow());
    let scanner = ProjectScannerAgent::new(project_path);
    let project_info = scanner.validate()?;
    println!("{}", "✓ Project structure is valid".green());

    // Step 2: Check configuration, reporting every problem at once
    println!("\n{}", "2. Checking configuration...".yellow());
    let settings = Settings::from_env();
    let mut problems = Vec::new();

    let composer_path = match settings.composer_binary() {
        Ok(path) => Some(path),
        Err(e) => {
            problems.push(e.to_string());
            None
        }
    };

    let mut gitlab: Option<(GitLabSettings, GitLabClient)> = None;
    if !options.dry_run {
        if !project_info.has_git {
            problems.push(format!(
                "{} is not a git repository",
                project_info.project_path.display()
            ));
        }
        if which::which("git").is_err() {
            problems.push("\"git\" not found".to_string());
        }
        match settings.gitlab().and_then(|s| GitLabClient::new(&s).map(|client| (s, client))) {
            Ok(pair) => gitlab = Some(pair),
            Err(e) => problems.push(e.to_string()),
        }
    }

    if problems.is_empty() {
        if let Some((gitlab_settings, client)) = &gitlab {
            let service =
                MergeRequestService::new(client, &options.target_branch, settings.labels.clone());
            if !service.is_accessible() {
                problems.push(format!(
                    "merge requests not enabled for {}, or API user doesn't have access to project",
                    gitlab_settings.project_path
                ));
            }
        }
    }

    let composer_path = match composer_path {
        Some(path) if problems.is_empty() => path,
        _ => {
            let list: Vec<String> = problems.iter().map(|p| format!("- {p}")).collect();
            return Err(ComposerMrError::Config(format!("\n{}", list.join("\n"))));
        }
    };
    println!("{}", "✓ Configuration is valid".green());

    // Step 3: Bring the target branch up to date
    let git_agent = if options.dry_run {
        println!("\n{}", "3. Dry run, leaving the checked out branch alone".yellow());
        None
    } else {
        println!(
            "\n{}",
            format!("3. Pulling latest changes from {}...", options.target_branch).yellow()
        );
        let agent = VersionControlAgent::new(&project_info.project_path)?;
        agent.switch_branch(&options.target_branch)?;
        if !agent.is_working_directory_clean()? {
            println!(
                "{}",
                "⚠ Warning: Working directory has uncommitted changes, they will be committed too"
                    .red()
            );
        }
        println!("{}", "✓ Branch is up to date".green());
        Some(agent)
    };

    // Step 4: Snapshot, update, snapshot
    println!("\n{}", "4. Running composer update...".yellow());
    let before = LockSnapshot::from_path(&project_info.lock_path)?;
    ComposerExecutionAgent::new(&composer_path, &project_info.project_path)
        .update(&options.composer_flags)?;
    let after = LockSnapshot::from_path(&project_info.lock_path)?;
    println!("{}", "✓ Update completed".green());

    if before.checksum() == after.checksum() {
        println!("\n{}", "There are no updated composer packages".yellow());
        return Ok(());
    }

    // Summarise the changes
    let report = diff(&before, &after);
    print_change_summary(&report);

    if report.is_empty() {
        println!(
            "\n{}",
            "composer.lock changed but no package versions did, nothing to do".yellow()
        );
        return Ok(());
    }

    let (Some(git_agent), Some((gitlab_settings, client))) = (git_agent, gitlab) else {
        print_dry_run(&report, &options.commit_title);
        return Ok(());
    };

    // Step 5: Skip when an identical merge request is already open
    println!("\n{}", "5. Checking open merge requests...".yellow());
    let service =
        MergeRequestService::new(&client, &options.target_branch, settings.labels.clone());
    if let Some(existing) = service.find_by_checksum(report.checksum())? {
        println!(
            "{}",
            format!(
                "An identical merge request already exists with checksum: {} ({})",
                report.checksum(),
                existing.web_url
            )
            .green()
        );
        return Ok(());
    }

    git_agent.configure_identity(&options.commit_user, &options.commit_email)?;
    git_agent.set_push_url(&gitlab_settings.token, &gitlab_settings.repository_url)?;

    if settings.replace_open {
        for branch in service.superseded_branches()? {
            println!("   Deleting older branch/merge request: {}", branch.bright_cyan());
            git_agent.delete_remote_branch(&branch)?;
        }
    }
    println!("{}", "✓ Merge requests checked".green());

    // Step 6: Commit and push the update branch
    println!("\n{}", "6. Creating Git commit...".yellow());
    let branch_name = settings.branch_name(&Zoned::now());
    git_agent.commit_to_new_branch(&branch_name, &commit_message(&options.commit_title, &report))?;
    println!(
        "{}",
        format!("✓ Changes pushed to branch: {}", branch_name).green()
    );

    // Step 7: Open the merge request
    println!("\n{}", "7. Creating merge request...".yellow());
    let assignees = service.resolve_assignees(&settings.assignees).unwrap_or_else(|e| {
        log::warn!("Could not resolve assignees: {e}");
        Vec::new()
    });
    let reviewers = service.resolve_reviewers(&settings.reviewers).unwrap_or_else(|e| {
        log::warn!("Could not resolve reviewers: {e}");
        Vec::new()
    });

    let merge_request = service.create(
        &merge_request_title(&report),
        &render_markdown(&report),
        &branch_name,
        assignees,
        reviewers,
    )?;
    print_merge_request(&merge_request);

    println!(
        "\n{}",
        "✨ Update process completed successfully!".green().bold()
    );
    Ok(())
}

/// Execute the diff workflow - compare two lockfiles on disk
pub fn execute_diff<P: AsRef<Path>>(before: P, after: P, format: DiffFormat) -> Result<()> {
    let before = LockSnapshot::from_path(before)?;
    let after = LockSnapshot::from_path(after)?;
    let report = diff(&before, &after);

    match format {
        DiffFormat::Summary => print_change_summary(&report),
        DiffFormat::Markdown => print!("{}", render_markdown(&report)),
        DiffFormat::Changelog => {
            let changelog = render_changelog(&report);
            if !changelog.is_empty() {
                println!("{changelog}");
            }
        }
    }

    Ok(())
}

fn print_change_summary(report: &DiffReport) {
    if report.is_empty() {
        println!("\n{}", "No package versions changed".yellow());
        return;
    }

    println!("\n{}", "Change Summary:".cyan().bold());
    println!(
        "{}",
        format!(
            "{} upgraded, {} downgraded, {} new, {} removed, {} changed",
            report.count(ChangeKind::Upgraded),
            report.count(ChangeKind::Downgraded),
            report.count(ChangeKind::Added),
            report.count(ChangeKind::Removed),
            report.count(ChangeKind::Changed),
        )
        .green()
    );

    for entry in report.entries() {
        let kind = entry.kind();
        let label = match kind {
            ChangeKind::Upgraded => kind.label().green(),
            ChangeKind::Downgraded => kind.label().yellow(),
            ChangeKind::Added => kind.label().cyan(),
            ChangeKind::Removed => kind.label().red(),
            ChangeKind::Changed => kind.label().magenta(),
        };
        let previous = entry.previous_version.as_deref().unwrap_or("-");
        let new = entry.new_version.as_deref().unwrap_or("-");
        println!(
            "  • {} {} → {} ({})",
            entry.name.white().bold(),
            previous.red(),
            new.green(),
            label
        );
    }
}

fn print_dry_run(report: &DiffReport, commit_title: &str) {
    println!("\n{}", "Merge request title:".cyan().bold());
    println!("{}", merge_request_title(report));
    println!("\n{}", "Merge request description:".cyan().bold());
    print!("{}", render_markdown(report));
    println!("\n{}", "Commit message:".cyan().bold());
    println!("{}", commit_message(commit_title, report));
}

fn print_merge_request(merge_request: &MergeRequest) {
    println!(
        "{}",
        format!(
            "✓ Merge request !{} created: {}",
            merge_request.iid, merge_request.web_url
        )
        .green()
    );

    if !merge_request.labels.is_empty() {
        println!("   Labels: {}", merge_request.labels.join(", "));
    }

    if !merge_request.assignees.is_empty() {
        println!("   Assigned to:");
        for user in &merge_request.assignees {
            println!("   • {}", user.username.bright_cyan());
        }
    }

    if !merge_request.reviewers.is_empty() {
        println!("   Reviewers assigned:");
        for user in &merge_request.reviewers {
            println!("   • {}", user.username.bright_cyan());
        }
    }
}
