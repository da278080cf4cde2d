use super::lockfile::{LockSnapshot, PackageEntry};
use super::url::{compare_url, normalize_url};
use super::version::ChangeKind;
use indexmap::IndexMap;

/// One package that was added, removed, or moved to a different version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub name: String,
    pub previous_version: Option<String>,
    pub new_version: Option<String>,
    pub browse_url: String,
    pub compare_url: Option<String>,
}

impl DiffEntry {
    fn changed(previous: &PackageEntry, current: &PackageEntry) -> Self {
        Self {
            name: current.name.clone(),
            previous_version: Some(previous.version.clone()),
            new_version: Some(current.version.clone()),
            browse_url: normalize_url(&current.source_url),
            compare_url: compare_url(&current.source_url, &previous.version, &current.version),
        }
    }

    fn added(current: &PackageEntry) -> Self {
        Self {
            name: current.name.clone(),
            previous_version: None,
            new_version: Some(current.version.clone()),
            browse_url: normalize_url(&current.source_url),
            compare_url: None,
        }
    }

    fn removed(previous: &PackageEntry) -> Self {
        Self {
            name: previous.name.clone(),
            previous_version: Some(previous.version.clone()),
            new_version: None,
            browse_url: normalize_url(&previous.source_url),
            compare_url: None,
        }
    }

    /// `1.0...1.1`, `NEW...2.0` or `1.0...REMOVED`
    pub fn version_range(&self) -> String {
        let previous = self.previous_version.as_deref().unwrap_or("NEW");
        let new = self.new_version.as_deref().unwrap_or("REMOVED");
        format!("{previous}...{new}")
    }

    pub fn kind(&self) -> ChangeKind {
        ChangeKind::classify(self.previous_version.as_deref(), self.new_version.as_deref())
    }
}

/// The package-level difference between two lockfile snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffReport {
    checksum: String,
    entries: Vec<DiffEntry>,
}

impl DiffReport {
    /// Checksum of the "after" snapshot.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.entries.iter().filter(|e| e.kind() == kind).count()
    }
}

/// Compare two snapshots of the same lockfile.
///
/// Added and changed packages come first, in the order of `after`; removed
/// packages follow in the order they were first seen in `before`. Only the
/// version string decides whether a package changed.
pub fn diff(before: &LockSnapshot, after: &LockSnapshot) -> DiffReport {
    let mut previous: IndexMap<&str, &PackageEntry> = IndexMap::new();
    for package in before.all_packages() {
        previous.insert(package.name.as_str(), package);
    }

    let mut entries = Vec::new();

    for package in after.all_packages() {
        match previous.shift_remove(package.name.as_str()) {
            Some(old) if old.version != package.version => {
                entries.push(DiffEntry::changed(old, package));
            }
            Some(_) => {}
            None => entries.push(DiffEntry::added(package)),
        }
    }

    entries.extend(previous.values().map(|old| DiffEntry::removed(old)));

    log::debug!(
        "Lockfile diff: {} entries ({} packages removed)",
        entries.len(),
        previous.len()
    );

    DiffReport {
        checksum: after.checksum().to_string(),
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn pkg(name: &str, version: &str, url: &str) -> PackageEntry {
        PackageEntry::new(name, version, url)
    }

    fn snapshot(packages: Vec<PackageEntry>, checksum: &str) -> LockSnapshot {
        LockSnapshot::new(packages, Vec::new(), checksum)
    }

    #[test]
    fn end_to_end_scenario() {
        let before = snapshot(vec![pkg("a", "1.0", "https://github.com/x/a")], "C1");
        let after = snapshot(
            vec![pkg("a", "1.1", "https://github.com/x/a"), pkg("b", "2.0", "")],
            "C2",
        );

        let report = diff(&before, &after);

        assert!(!report.is_empty());
        assert_eq!(report.checksum(), "C2");
        assert_eq!(
            report.entries(),
            [
                DiffEntry {
                    name: "a".into(),
                    previous_version: Some("1.0".into()),
                    new_version: Some("1.1".into()),
                    browse_url: "https://github.com/x/a".into(),
                    compare_url: Some("https://github.com/x/a/compare/1.0...1.1".into()),
                },
                DiffEntry {
                    name: "b".into(),
                    previous_version: None,
                    new_version: Some("2.0".into()),
                    browse_url: String::new(),
                    compare_url: None,
                },
            ]
        );
        assert_eq!(report.entries()[0].version_range(), "1.0...1.1");
        assert_eq!(report.entries()[1].version_range(), "NEW...2.0");
    }

    #[test]
    fn removed_packages_follow_in_before_order() {
        let before = snapshot(
            vec![
                pkg("z/first", "1.0", "git@github.com:z/first.git"),
                pkg("keep", "1.0", ""),
                pkg("a/second", "2.0", ""),
            ],
            "C1",
        );
        let after = LockSnapshot::new(
            vec![pkg("keep", "1.0", "")],
            vec![pkg("dev/new", "0.1", "")],
            "C2",
        );

        let report = diff(&before, &after);
        let names: Vec<_> = report.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["dev/new", "z/first", "a/second"]);

        let removed = &report.entries()[1];
        assert_eq!(removed.version_range(), "1.0...REMOVED");
        assert_eq!(removed.browse_url, "https://github.com:z/first");
        assert_eq!(removed.compare_url, None);
    }

    #[test]
    fn metadata_changes_without_version_change_are_ignored() {
        let mut moved = pkg("a", "1.0", "https://gitlab.com/x/a");
        moved.homepage = Some("https://a.example".into());
        let before = snapshot(vec![pkg("a", "1.0", "https://github.com/x/a")], "C1");
        let after = snapshot(vec![moved], "C2");

        let report = diff(&before, &after);
        assert!(report.is_empty());
        assert_eq!(report.checksum(), "C2");
    }

    #[test]
    fn package_moving_between_dev_and_prod_is_not_a_change() {
        let before = LockSnapshot::new(Vec::new(), vec![pkg("a", "1.0", "")], "C1");
        let after = LockSnapshot::new(vec![pkg("a", "1.0", "")], Vec::new(), "C2");
        assert!(diff(&before, &after).is_empty());
    }

    #[test]
    fn duplicate_names_in_before_use_last_version() {
        let before = LockSnapshot::new(
            vec![pkg("a", "1.0", "")],
            vec![pkg("a", "1.5", "")],
            "C1",
        );
        let after = snapshot(vec![pkg("a", "1.5", "")], "C2");
        assert!(diff(&before, &after).is_empty());
    }

    #[test]
    fn duplicate_names_in_after_follow_lookup_removal() {
        let before = snapshot(vec![pkg("a", "1.0", "")], "C1");
        let after = LockSnapshot::new(
            vec![pkg("a", "1.0", "")],
            vec![pkg("a", "1.0", "")],
            "C2",
        );

        let report = diff(&before, &after);
        assert_eq!(report.len(), 1);
        assert_eq!(report.entries()[0].name, "a");
        assert_eq!(report.entries()[0].version_range(), "NEW...1.0");
        assert_eq!(report.entries()[0].kind(), ChangeKind::Added);
    }

    #[test]
    fn compare_url_uses_after_source() {
        let before = snapshot(vec![pkg("a", "1.0", "https://example.com/a")], "C1");
        let after = snapshot(vec![pkg("a", "2.0", "https://bitbucket.org/x/a.git")], "C2");

        let report = diff(&before, &after);
        let entry = &report.entries()[0];
        assert_eq!(entry.browse_url, "https://bitbucket.org/x/a");
        assert_eq!(
            entry.compare_url.as_deref(),
            Some("https://bitbucket.org/x/a/branches/compare/1.0%0D2.0")
        );
    }

    #[test]
    fn empty_snapshots_produce_empty_report() {
        let report = diff(&snapshot(Vec::new(), ""), &snapshot(Vec::new(), ""));
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
    }

    #[test]
    fn counts_by_kind() {
        let before = snapshot(
            vec![pkg("up", "1.0.0", ""), pkg("down", "2.0.0", ""), pkg("gone", "1.0", "")],
            "C1",
        );
        let after = snapshot(
            vec![pkg("up", "1.1.0", ""), pkg("down", "1.9.0", ""), pkg("new", "0.1", "")],
            "C2",
        );

        let report = diff(&before, &after);
        assert_eq!(report.count(ChangeKind::Upgraded), 1);
        assert_eq!(report.count(ChangeKind::Downgraded), 1);
        assert_eq!(report.count(ChangeKind::Added), 1);
        assert_eq!(report.count(ChangeKind::Removed), 1);
    }

    fn packages_strategy() -> impl Strategy<Value = Vec<PackageEntry>> {
        proptest::collection::btree_map("[a-z]{1,6}/[a-z]{1,6}", "[0-9]\\.[0-9]{1,2}", 0..12)
            .prop_map(|map: BTreeMap<String, String>| {
                map.into_iter()
                    .map(|(name, version)| pkg(&name, &version, ""))
                    .collect()
            })
    }

    proptest! {
        #[test]
        fn identical_package_sets_in_any_order_are_empty(
            (packages, shuffled) in packages_strategy()
                .prop_flat_map(|p| (Just(p.clone()), Just(p).prop_shuffle()))
        ) {
            let before = snapshot(packages, "C1");
            let after = snapshot(shuffled, "C2");
            prop_assert!(diff(&before, &after).is_empty());
        }

        #[test]
        fn every_package_is_classified_once(
            before in packages_strategy(),
            after in packages_strategy(),
        ) {
            let report = diff(&snapshot(before.clone(), "C1"), &snapshot(after.clone(), "C2"));
            let old: BTreeMap<_, _> =
                before.iter().map(|p| (p.name.as_str(), p.version.as_str())).collect();
            let new: BTreeMap<_, _> =
                after.iter().map(|p| (p.name.as_str(), p.version.as_str())).collect();

            for (name, version) in &new {
                let matching: Vec<_> =
                    report.entries().iter().filter(|e| e.name == *name).collect();
                match old.get(name) {
                    None => {
                        prop_assert_eq!(matching.len(), 1);
                        prop_assert_eq!(matching[0].previous_version.as_deref(), None);
                        prop_assert_eq!(matching[0].new_version.as_deref(), Some(*version));
                    }
                    Some(previous) if previous != version => {
                        prop_assert_eq!(matching.len(), 1);
                        prop_assert_eq!(matching[0].previous_version.as_deref(), Some(*previous));
                        prop_assert_eq!(matching[0].new_version.as_deref(), Some(*version));
                    }
                    Some(_) => prop_assert!(matching.is_empty()),
                }
            }

            for (name, version) in &old {
                if new.contains_key(name) {
                    continue;
                }
                let matching: Vec<_> =
                    report.entries().iter().filter(|e| e.name == *name).collect();
                prop_assert_eq!(matching.len(), 1);
                prop_assert_eq!(matching[0].previous_version.as_deref(), Some(*version));
                prop_assert_eq!(matching[0].new_version.as_deref(), None);
            }

            prop_assert_eq!(report.checksum(), "C2");
        }
    }
}
