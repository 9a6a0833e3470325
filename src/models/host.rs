use reqwest::{
    blocking::{Client, RequestBuilder},
    header::ACCEPT,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::Result;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_PER_PAGE: u32 = 30;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    pub assets_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

/// Read-only view of a repository hosting service. Page indices are
/// zero-based; an empty page marks the end of a listing.
pub trait RepositoryHost {
    fn list_repositories(&self, organization: &str, page: u32) -> Result<Vec<Repository>>;

    fn list_releases(&self, repository: &Repository, page: u32) -> Result<Vec<Release>>;

    fn list_assets(&self, release: &Release) -> Result<Vec<ReleaseAsset>>;
}

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_base_url: String,
    pub per_page: u32,
    pub user_agent: String,
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            per_page: DEFAULT_PER_PAGE,
            user_agent: format!("physiboss-models/{}", env!("CARGO_PKG_VERSION")),
            token: None,
        }
    }
}

pub struct GithubClient {
    client: Client,
    config: GithubConfig,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    fn repositories_url(&self, organization: &str) -> String {
        format!(
            "{}/orgs/{}/repos",
            self.config.api_base_url.trim_end_matches('/'),
            organization
        )
    }

    fn releases_url(&self, repository: &Repository) -> String {
        format!(
            "{}/repos/{}/releases",
            self.config.api_base_url.trim_end_matches('/'),
            repository.full_name
        )
    }

    fn page_query(&self, page: u32) -> [(&'static str, String); 2] {
        [
            ("per_page", self.config.per_page.to_string()),
            ("page", (page + 1).to_string()),
        ]
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url).header(ACCEPT, GITHUB_MEDIA_TYPE);
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn fetch<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = request.send()?.error_for_status()?.json()?;
        Ok(body)
    }
}

impl RepositoryHost for GithubClient {
    fn list_repositories(&self, organization: &str, page: u32) -> Result<Vec<Repository>> {
        let url = self.repositories_url(organization);
        debug!(%url, page, "listing organization repositories");
        self.fetch(self.get(&url).query(&self.page_query(page)))
    }

    fn list_releases(&self, repository: &Repository, page: u32) -> Result<Vec<Release>> {
        let url = self.releases_url(repository);
        debug!(%url, page, "listing releases");
        self.fetch(self.get(&url).query(&self.page_query(page)))
    }

    fn list_assets(&self, release: &Release) -> Result<Vec<ReleaseAsset>> {
        debug!(url = %release.assets_url, tag = %release.tag_name, "listing release assets");
        self.fetch(self.get(&release.assets_url).query(&[("per_page", "100")]))
    }
}
