use url::form_urlencoded;

const GIT_SUFFIX: &str = ".git";
const SSH_PREFIX: &str = "git@";

/// Turn a package source URL into something a browser can open.
///
/// Only the `git@` prefix is rewritten; the `host:path` separator of an SSH
/// URL is left untouched, so `git@github.com:foo/bar.git` becomes
/// `https://github.com:foo/bar`.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.strip_suffix(GIT_SUFFIX).unwrap_or(raw);

    match trimmed.strip_prefix(SSH_PREFIX) {
        Some(rest) => format!("https://{rest}"),
        None => trimmed.to_string(),
    }
}

/// Build a "compare two revisions" link for the hosting providers we know about.
///
/// Returns `None` when the host has no known comparison endpoint.
pub fn compare_url(raw: &str, previous: &str, new: &str) -> Option<String> {
    let normalized = normalize_url(raw);
    let base = normalized.trim_end_matches('/');
    let previous = encode_component(previous);
    let new = encode_component(new);

    if normalized.starts_with("https://github.com/") || normalized.starts_with("https://gitlab.") {
        Some(format!("{base}/compare/{previous}...{new}"))
    } else if normalized.starts_with("https://bitbucket.") {
        // Bitbucket separates the two revisions with an escaped carriage return
        Some(format!("{base}/branches/compare/{previous}%0D{new}"))
    } else {
        None
    }
}

/// Query-escape a revision the way Go's `url.QueryEscape` does: `~` stays
/// literal and `*` is escaped, which is the reverse of form encoding.
fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .map(|chunk| match chunk {
            "%7E" => "~",
            _ => chunk,
        })
        .collect::<String>()
        .replace('*', "%2A")
}
