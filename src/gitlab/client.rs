use super::{Member, MergeRequest, MergeRequestApi, MergeRequestQuery, NewMergeRequest, User};
use crate::config::GitLabSettings;
use crate::error::{ComposerMrError, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const PER_PAGE: &str = "100";
const MAX_PAGES: usize = 50;

/// Blocking GitLab REST (v4) client scoped to one project.
pub struct GitLabClient {
    client: Client,
    api_url: Url,
    token: String,
    project_id: String,
}

impl GitLabClient {
    pub fn new(settings: &GitLabSettings) -> Result<Self> {
        let api_url = Self::validate_api_url(&settings.api_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("composer-mr/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url,
            token: settings.token.clone(),
            project_id: settings.project_id.clone(),
        })
    }

    fn validate_api_url(raw: &str) -> Result<Url> {
        let parsed = Url::parse(raw)
            .map_err(|_| ComposerMrError::Config(format!("Invalid GitLab API URL: {raw}")))?;

        match parsed.scheme() {
            "https" | "http" => Ok(parsed),
            scheme => Err(ComposerMrError::Config(format!(
                "Unsupported GitLab API scheme: {scheme}"
            ))),
        }
    }

    /// `{api}/{segments...}`, each segment percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ComposerMrError::Config(format!("Invalid GitLab API URL: {}", self.api_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn project_endpoint(&self, resource: &str) -> Result<Url> {
        self.endpoint(&["projects", self.project_id.as_str(), resource])
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.header("PRIVATE-TOKEN", &self.token).send()?;
        let status = response.status();
        log::debug!("GitLab {} {}", status.as_u16(), response.url().path());

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(ComposerMrError::Api(format!(
            "request failed with HTTP {status}: {}",
            body.trim()
        )))
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.send(self.client.get(url))?;
        Ok(response.json()?)
    }
}

impl MergeRequestApi for GitLabClient {
    fn current_user(&self) -> Result<User> {
        self.get_json(self.endpoint(&["user"])?)
    }

    fn list_merge_requests(&self, query: &MergeRequestQuery) -> Result<Vec<MergeRequest>> {
        let mut url = self.project_endpoint("merge_requests")?;
        url.query_pairs_mut()
            .extend_pairs(query.to_pairs())
            .append_pair("per_page", PER_PAGE);
        self.get_json(url)
    }

    fn create_merge_request(&self, request: &NewMergeRequest) -> Result<MergeRequest> {
        let url = self.project_endpoint("merge_requests")?;
        let response = self.send(self.client.post(url).json(request))?;
        Ok(response.json()?)
    }

    fn list_project_members(&self) -> Result<Vec<Member>> {
        let mut members = Vec::new();
        let mut page = String::from("1");

        for _ in 0..MAX_PAGES {
            let mut url = self.endpoint(&["projects", self.project_id.as_str(), "members", "all"])?;
            url.query_pairs_mut()
                .append_pair("per_page", PER_PAGE)
                .append_pair("page", &page);

            let response = self.send(self.client.get(url))?;
            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            let batch: Vec<Member> = response.json()?;
            members.extend(batch);

            match next_page {
                Some(next) => page = next,
                None => return Ok(members),
            }
        }

        log::warn!("Stopped reading project members after {MAX_PAGES} pages");
        Ok(members)
    }
}
