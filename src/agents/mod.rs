pub mod composer_execution;
pub mod project_scanner;
pub mod version_control;

pub use composer_execution::ComposerExecutionAgent;
pub use project_scanner::{ProjectInfo, ProjectScannerAgent};
pub use version_control::VersionControlAgent;
