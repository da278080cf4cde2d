use crate::error::Result;
use serde::{Deserialize, Serialize};

pub mod client;
pub mod merge_requests;

pub use client::GitLabClient;
pub use merge_requests::MergeRequestService;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Member {
    pub id: u64,
    pub username: String,
    /// Only visible to administrators and the member themself
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MergeRequest {
    pub id: u64,
    pub iid: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub source_branch: String,
    pub web_url: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub reviewers: Vec<User>,
}

/// Filters for listing a project's merge requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeRequestQuery {
    pub state: Option<String>,
    pub target_branch: Option<String>,
    pub labels: Vec<String>,
    pub author_id: Option<u64>,
    pub search: Option<String>,
}

impl MergeRequestQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(state) = &self.state {
            pairs.push(("state", state.clone()));
        }
        if let Some(branch) = &self.target_branch {
            pairs.push(("target_branch", branch.clone()));
        }
        if !self.labels.is_empty() {
            pairs.push(("labels", self.labels.join(",")));
        }
        if let Some(author) = self.author_id {
            pairs.push(("author_id", author.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewMergeRequest {
    pub title: String,
    pub description: String,
    pub source_branch: String,
    pub target_branch: String,
    pub remove_source_branch: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignee_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reviewer_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
}

/// The GitLab endpoints the update workflow relies on.
pub trait MergeRequestApi {
    fn current_user(&self) -> Result<User>;

    fn list_merge_requests(&self, query: &MergeRequestQuery) -> Result<Vec<MergeRequest>>;

    fn create_merge_request(&self, request: &NewMergeRequest) -> Result<MergeRequest>;

    /// Direct and inherited members of the project.
    fn list_project_members(&self) -> Result<Vec<Member>>;
}
