//! Lockfile snapshots, the diff between two of them, and its rendering.
pub mod diff;
pub mod lockfile;
pub mod render;
pub mod url;
pub mod version;

pub use diff::{DiffEntry, DiffReport, diff};
pub use lockfile::{LockSnapshot, PackageEntry};
pub use version::ChangeKind;
