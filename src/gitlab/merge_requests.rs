use super::{Member, MergeRequest, MergeRequestApi, MergeRequestQuery, NewMergeRequest};
use crate::composer::render::is_update_title;
use crate::error::Result;
use std::collections::HashSet;

// Chosen so the probe listing returns next to nothing
const PROBE_SEARCH: &str = "Just a random string that won't return too many results (*^$%#";

/// Merge request operations for one target branch.
pub struct MergeRequestService<'a, A: MergeRequestApi> {
    api: &'a A,
    target_branch: String,
    labels: Vec<String>,
}

impl<'a, A: MergeRequestApi> MergeRequestService<'a, A> {
    pub fn new(api: &'a A, target_branch: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            api,
            target_branch: target_branch.into(),
            labels,
        }
    }

    /// Whether the token can see the project's merge requests at all.
    pub fn is_accessible(&self) -> bool {
        let query = MergeRequestQuery {
            search: Some(PROBE_SEARCH.to_string()),
            ..Default::default()
        };

        match self.api.list_merge_requests(&query) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Listing merge requests failed: {e}");
                false
            }
        }
    }

    /// Open update merge requests into the target branch, restricted to the
    /// current user when it can be resolved.
    fn open_merge_requests(&self) -> Result<Vec<MergeRequest>> {
        let author_id = match self.api.current_user() {
            Ok(user) => Some(user.id),
            Err(e) => {
                log::debug!("Could not resolve current user, not filtering by author: {e}");
                None
            }
        };

        let query = MergeRequestQuery {
            state: Some("opened".to_string()),
            target_branch: Some(self.target_branch.clone()),
            labels: self.labels.clone(),
            author_id,
            search: None,
        };

        self.api.list_merge_requests(&query)
    }

    /// Find an open merge request whose description carries `checksum`.
    pub fn find_by_checksum(&self, checksum: &str) -> Result<Option<MergeRequest>> {
        let found = self.open_merge_requests()?.into_iter().find(|mr| {
            mr.description
                .as_deref()
                .is_some_and(|description| description.contains(checksum))
        });
        Ok(found)
    }

    /// Source branches of earlier update merge requests that a new one replaces.
    pub fn superseded_branches(&self) -> Result<Vec<String>> {
        Ok(self
            .open_merge_requests()?
            .into_iter()
            .filter(|mr| is_update_title(&mr.title))
            .map(|mr| mr.source_branch)
            .collect())
    }

    /// Member ids for the given usernames (case-insensitive).
    pub fn resolve_assignees(&self, usernames: &[String]) -> Result<Vec<u64>> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        let wanted = normalized_set(usernames);
        let members = self.api.list_project_members()?;
        Ok(matching_ids(&members, |m| wanted.contains(&m.username.to_lowercase())))
    }

    /// Member ids for the given usernames or e-mail addresses (case-insensitive).
    pub fn resolve_reviewers(&self, handles: &[String]) -> Result<Vec<u64>> {
        if handles.is_empty() {
            return Ok(Vec::new());
        }
        let wanted = normalized_set(handles);
        let members = self.api.list_project_members()?;
        Ok(matching_ids(&members, |m| {
            wanted.contains(&m.username.to_lowercase())
                || m.email
                    .as_deref()
                    .is_some_and(|email| wanted.contains(&email.to_lowercase()))
        }))
    }

    pub fn create(
        &self,
        title: &str,
        description: &str,
        source_branch: &str,
        assignee_ids: Vec<u64>,
        reviewer_ids: Vec<u64>,
    ) -> Result<MergeRequest> {
        let request = NewMergeRequest {
            title: title.to_string(),
            description: description.to_string(),
            source_branch: source_branch.to_string(),
            target_branch: self.target_branch.clone(),
            remove_source_branch: true,
            assignee_ids,
            reviewer_ids,
            labels: (!self.labels.is_empty()).then(|| self.labels.join(",")),
        };

        self.api.create_merge_request(&request)
    }
}

fn normalized_set(values: &[String]) -> HashSet<String> {
    values.iter().map(|v| v.trim().to_lowercase()).collect()
}

fn matching_ids(members: &[Member], matches: impl Fn(&Member) -> bool) -> Vec<u64> {
    let mut seen = HashSet::new();
    members
        .iter()
        .filter(|m| matches(*m))
        .filter(|m| seen.insert(m.id))
        .map(|m| m.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComposerMrError;
    use crate::gitlab::User;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeApi {
        user: Option<User>,
        merge_requests: Vec<MergeRequest>,
        members: Vec<Member>,
        fail_listing: bool,
        queries: RefCell<Vec<MergeRequestQuery>>,
        created: RefCell<Vec<NewMergeRequest>>,
    }

    impl MergeRequestApi for FakeApi {
        fn current_user(&self) -> Result<User> {
            self.user
                .clone()
                .ok_or_else(|| ComposerMrError::Api("401 Unauthorized".into()))
        }

        fn list_merge_requests(&self, query: &MergeRequestQuery) -> Result<Vec<MergeRequest>> {
            self.queries.borrow_mut().push(query.clone());
            if self.fail_listing {
                return Err(ComposerMrError::Api("403 Forbidden".into()));
            }
            Ok(self.merge_requests.clone())
        }

        fn create_merge_request(&self, request: &NewMergeRequest) -> Result<MergeRequest> {
            self.created.borrow_mut().push(request.clone());
            Ok(mr(99, &request.title, &request.description, &request.source_branch))
        }

        fn list_project_members(&self) -> Result<Vec<Member>> {
            Ok(self.members.clone())
        }
    }

    fn mr(iid: u64, title: &str, description: &str, branch: &str) -> MergeRequest {
        MergeRequest {
            id: iid + 1000,
            iid,
            title: title.to_string(),
            description: Some(description.to_string()),
            source_branch: branch.to_string(),
            web_url: format!("https://gitlab.example.com/group/app/-/merge_requests/{iid}"),
            labels: Vec::new(),
            assignees: Vec::new(),
            reviewers: Vec::new(),
        }
    }

    fn member(id: u64, username: &str, email: Option<&str>) -> Member {
        Member {
            id,
            username: username.to_string(),
            email: email.map(str::to_string),
        }
    }

    fn user() -> User {
        User {
            id: 7,
            username: "update-bot".into(),
        }
    }

    #[test]
    fn finds_merge_request_carrying_checksum() {
        let api = FakeApi {
            user: Some(user()),
            merge_requests: vec![
                mr(1, "Composer update: 2 packages", "Checksum: aaa", "composer-update-1"),
                mr(
                    2,
                    "Composer update: 3 packages",
                    "## Updated\n\nChecksum: bbb\n",
                    "composer-update-2",
                ),
            ],
            ..Default::default()
        };
        let service = MergeRequestService::new(&api, "main", vec!["deps".into()]);

        let found = service.find_by_checksum("bbb").unwrap();
        assert_eq!(found.map(|m| m.iid), Some(2));
        assert_eq!(service.find_by_checksum("ccc").unwrap(), None);

        let query = &api.queries.borrow()[0];
        assert_eq!(query.state.as_deref(), Some("opened"));
        assert_eq!(query.target_branch.as_deref(), Some("main"));
        assert_eq!(query.labels, ["deps"]);
        assert_eq!(query.author_id, Some(7));
    }

    #[test]
    fn lists_without_author_when_user_is_unknown() {
        let api = FakeApi::default();
        let service = MergeRequestService::new(&api, "main", Vec::new());
        service.find_by_checksum("x").unwrap();
        assert_eq!(api.queries.borrow()[0].author_id, None);
    }

    #[test]
    fn only_update_merge_requests_are_superseded() {
        let api = FakeApi {
            merge_requests: vec![
                mr(1, "Composer update: 2 packages", "", "composer-update-1"),
                mr(2, "Refactor billing", "", "feature/billing"),
            ],
            ..Default::default()
        };
        let service = MergeRequestService::new(&api, "main", Vec::new());
        assert_eq!(service.superseded_branches().unwrap(), ["composer-update-1"]);
    }

    #[test]
    fn accessibility_probe_reports_failures() {
        let ok = FakeApi::default();
        assert!(MergeRequestService::new(&ok, "main", Vec::new()).is_accessible());
        assert!(ok.queries.borrow()[0].search.is_some());

        let forbidden = FakeApi {
            fail_listing: true,
            ..Default::default()
        };
        assert!(!MergeRequestService::new(&forbidden, "main", Vec::new()).is_accessible());
    }

    #[test]
    fn resolves_assignees_by_username() {
        let api = FakeApi {
            members: vec![
                member(1, "Alice", None),
                member(2, "bob", Some("bob@example.com")),
                member(3, "carol", None),
            ],
            ..Default::default()
        };
        let service = MergeRequestService::new(&api, "main", Vec::new());
        let ids = service
            .resolve_assignees(&[" alice ".into(), "bob@example.com".into()])
            .unwrap();
        assert_eq!(ids, [1]);
        assert!(service.resolve_assignees(&[]).unwrap().is_empty());
    }

    #[test]
    fn resolves_reviewers_by_username_or_email_once() {
        let api = FakeApi {
            members: vec![
                member(2, "bob", Some("Bob@Example.com")),
                member(3, "carol", None),
            ],
            ..Default::default()
        };
        let service = MergeRequestService::new(&api, "main", Vec::new());
        let ids = service
            .resolve_reviewers(&["bob".into(), "bob@example.com".into(), "CAROL".into()])
            .unwrap();
        assert_eq!(ids, [2, 3]);
    }

    #[test]
    fn creates_merge_request_with_labels() {
        let api = FakeApi::default();
        let service =
            MergeRequestService::new(&api, "main", vec!["deps".into(), "composer".into()]);

        let created = service
            .create("Composer update: 1 package", "body", "composer-update-1", vec![1], Vec::new())
            .unwrap();
        assert_eq!(created.iid, 99);

        let request = &api.created.borrow()[0];
        assert_eq!(request.target_branch, "main");
        assert_eq!(request.labels.as_deref(), Some("deps,composer"));
        assert!(request.remove_source_branch);
        assert_eq!(request.assignee_ids, [1]);
    }
}
