//! Composer update merge requests for GitLab CI.
//!
//! The [`composer`] module holds the lockfile diff and its rendering; the
//! other modules drive composer, git and the GitLab API around it.
pub mod agents;
pub mod cli;
pub mod composer;
pub mod config;
pub mod error;
pub mod gitlab;
pub mod utils;
pub mod workflow;
