use std::cmp::Ordering;

/// A Composer version string, parsed just enough to order two releases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub original: String,
    pub parsed: VersionType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionType {
    Semantic(semver::Version),
    Numeric(Vec<u64>),
    /// `dev-main`, `1.x-dev` and other branch references
    Branch(String),
    Unknown(String),
}

impl Version {
    pub fn parse(version: &str) -> Self {
        let trimmed = version.trim();
        let bare = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let parsed = if trimmed.starts_with("dev-") || trimmed.ends_with("-dev") {
            VersionType::Branch(trimmed.to_string())
        } else if let Ok(v) = semver::Version::parse(bare) {
            VersionType::Semantic(v)
        } else if let Some(numeric) = Self::parse_numeric(bare) {
            VersionType::Numeric(numeric)
        } else {
            VersionType::Unknown(trimmed.to_string())
        };

        Version {
            original: version.to_string(),
            parsed,
        }
    }

    fn parse_numeric(version: &str) -> Option<Vec<u64>> {
        let numbers = version
            .split('.')
            .map(|part| part.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;

        if numbers.is_empty() {
            None
        } else {
            Some(numbers)
        }
    }

    fn release_components(&self) -> Option<Vec<u64>> {
        match &self.parsed {
            VersionType::Semantic(v) if v.pre.is_empty() => Some(vec![v.major, v.minor, v.patch]),
            VersionType::Numeric(parts) => Some(parts.clone()),
            _ => None,
        }
    }
}

impl PartialOrd for Version {
    /// Branches and unparseable strings have no meaningful order.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (&self.parsed, &other.parsed) {
            (VersionType::Semantic(a), VersionType::Semantic(b)) => Some(a.cmp(b)),
            (VersionType::Branch(_), _) | (_, VersionType::Branch(_)) => None,
            (VersionType::Unknown(_), _) | (_, VersionType::Unknown(_)) => None,
            _ => {
                let a = self.release_components()?;
                let b = other.release_components()?;
                Some(compare_numeric(&a, &b))
            }
        }
    }
}

fn compare_numeric(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let av = a.get(i).copied().unwrap_or(0);
            let bv = b.get(i).copied().unwrap_or(0);
            av.cmp(&bv)
        })
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Classification of one package change, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Upgraded,
    Downgraded,
    /// Both versions known but not comparable, e.g. two branch references
    Changed,
}

impl ChangeKind {
    pub fn classify(previous: Option<&str>, new: Option<&str>) -> Self {
        match (previous, new) {
            (None, _) => ChangeKind::Added,
            (Some(_), None) => ChangeKind::Removed,
            (Some(old), Some(new)) => {
                match Version::parse(old).partial_cmp(&Version::parse(new)) {
                    Some(Ordering::Less) => ChangeKind::Upgraded,
                    Some(Ordering::Greater) => ChangeKind::Downgraded,
                    _ => ChangeKind::Changed,
                }
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Added => "new",
            ChangeKind::Removed => "removed",
            ChangeKind::Upgraded => "upgraded",
            ChangeKind::Downgraded => "downgraded",
            ChangeKind::Changed => "changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        let v1 = Version::parse("1.0.0");
        let v2 = Version::parse("v1.0.1");
        assert!(matches!(v2.parsed, VersionType::Semantic(_)));
        assert!(v2 > v1);
    }

    #[test]
    fn test_four_part_versions() {
        let old = Version::parse("1.2.3.4");
        let new = Version::parse("1.2.3.10");
        assert!(matches!(old.parsed, VersionType::Numeric(_)));
        assert!(new > old);
        assert!(Version::parse("1.3") > Version::parse("1.2.9"));
    }

    #[test]
    fn test_branches_are_not_ordered() {
        let main = Version::parse("dev-main");
        let alias = Version::parse("2.x-dev");
        assert!(matches!(main.parsed, VersionType::Branch(_)));
        assert!(matches!(alias.parsed, VersionType::Branch(_)));
        assert_eq!(main.partial_cmp(&Version::parse("1.0.0")), None);
    }

    #[test]
    fn test_classify() {
        assert_eq!(ChangeKind::classify(None, Some("1.0")), ChangeKind::Added);
        assert_eq!(ChangeKind::classify(Some("1.0"), None), ChangeKind::Removed);
        assert_eq!(
            ChangeKind::classify(Some("v1.0.0"), Some("v1.1.0")),
            ChangeKind::Upgraded
        );
        assert_eq!(
            ChangeKind::classify(Some("2.0.0"), Some("1.9.9")),
            ChangeKind::Downgraded
        );
        assert_eq!(
            ChangeKind::classify(Some("1.0.0-beta1"), Some("1.0.0")),
            ChangeKind::Upgraded
        );
        assert_eq!(
            ChangeKind::classify(Some("dev-main"), Some("dev-next")),
            ChangeKind::Changed
        );
    }
}
