use crate::error::{ComposerMrError, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// One resolved dependency in a `composer.lock` snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub name: String,
    pub version: String,
    pub source_url: String,
    pub homepage: Option<String>,
}

impl PackageEntry {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            source_url: source_url.into(),
            homepage: None,
        }
    }
}

/// A parsed capture of `composer.lock` at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSnapshot {
    packages: Vec<PackageEntry>,
    dev_packages: Vec<PackageEntry>,
    checksum: String,
}

impl LockSnapshot {
    pub fn new(
        packages: Vec<PackageEntry>,
        dev_packages: Vec<PackageEntry>,
        checksum: impl Into<String>,
    ) -> Self {
        Self {
            packages,
            dev_packages,
            checksum: checksum.into(),
        }
    }

    /// Read and parse a lockfile, fingerprinting its raw bytes.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ComposerMrError::LockParsing(format!("Failed to read {}: {e}", path.display()))
        })?;

        let snapshot = Self::from_slice(&bytes)?;
        log::debug!(
            "Parsed {} ({} packages, {} dev packages, checksum {})",
            path.display(),
            snapshot.packages().len(),
            snapshot.dev_packages().len(),
            snapshot.checksum()
        );
        Ok(snapshot)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: RawLockfile = serde_json::from_slice(bytes)
            .map_err(|e| ComposerMrError::LockParsing(format!("Invalid lockfile JSON: {e}")))?;

        Ok(Self {
            packages: raw.packages.unwrap_or_default().into_iter().map(Into::into).collect(),
            dev_packages: raw
                .packages_dev
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
            checksum: checksum(bytes),
        })
    }

    pub fn packages(&self) -> &[PackageEntry] {
        &self.packages
    }

    pub fn dev_packages(&self) -> &[PackageEntry] {
        &self.dev_packages
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Production packages followed by development packages, in file order.
    pub fn all_packages(&self) -> impl Iterator<Item = &PackageEntry> {
        self.packages.iter().chain(self.dev_packages.iter())
    }
}

/// Hex-encoded SHA-256 of the raw lockfile content.
pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[derive(Debug, Deserialize)]
struct RawLockfile {
    #[serde(default)]
    packages: Option<Vec<RawPackage>>,
    #[serde(default, rename = "packages-dev")]
    packages_dev: Option<Vec<RawPackage>>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    source: Option<RawSource>,
    #[serde(default)]
    homepage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    url: String,
}

impl From<RawPackage> for PackageEntry {
    fn from(raw: RawPackage) -> Self {
        let source_url = raw.source.map(|s| s.url).unwrap_or_default();
        let mut entry = PackageEntry::new(raw.name, raw.version, source_url);
        entry.homepage = raw.homepage;
        entry
    }
}
