use super::diff::{DiffEntry, DiffReport};

const CHECKSUM_LABEL: &str = "Checksum: ";
const TITLE_PREFIX: &str = "Composer update: ";

/// Markdown body for the merge request. Empty when nothing changed.
pub fn render_markdown(report: &DiffReport) -> String {
    if report.is_empty() {
        return String::new();
    }

    let mut description = String::from("## Updated Composer Packages\n\n");
    description.push_str(CHECKSUM_LABEL);
    description.push_str(report.checksum());
    description.push_str("\n\n### Changes\n\n");

    for entry in report.entries() {
        description.push_str(&format!(
            "- [{}]({}): {}\n",
            entry.name,
            entry.browse_url,
            markdown_version(entry)
        ));
    }

    description
}

/// Plain-text list of changes, one `name: range` line per package.
pub fn render_changelog(report: &DiffReport) -> String {
    report
        .entries()
        .iter()
        .map(|entry| format!("{}: {}", entry.name, entry.version_range()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Commit message: the caller's title, a blank line, then the changelog.
pub fn commit_message(title: &str, report: &DiffReport) -> String {
    if report.is_empty() {
        return title.to_string();
    }
    format!("{title}\n\n{}", render_changelog(report))
}

pub fn merge_request_title(report: &DiffReport) -> String {
    let noun = if report.len() == 1 {
        "package"
    } else {
        "packages"
    };
    format!("{TITLE_PREFIX}{} {noun}", report.len())
}

/// Whether a merge request title looks like one this tool opened.
pub fn is_update_title(title: &str) -> bool {
    title.starts_with(TITLE_PREFIX)
}

/// Recover the checksum line from a rendered description.
pub fn extract_checksum(markdown: &str) -> Option<&str> {
    markdown
        .lines()
        .find_map(|line| line.strip_prefix(CHECKSUM_LABEL))
        .filter(|checksum| !checksum.is_empty())
}

fn markdown_version(entry: &DiffEntry) -> String {
    let range = entry.version_range();
    match &entry.compare_url {
        Some(url) => format!("[`{range}`]({url})"),
        None => format!("`{range}`"),
    }
}
