//! Forge API client: repository listing and license text lookup

use async_trait::async_trait;

use crate::error::{Result, WaiverError};
use crate::models::{LicenseText, RepositoryRecord};

pub const GITHUB_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "copyright-waiver";
const PER_PAGE: usize = 100;

/// Remote calls the run makes against the hosting provider
#[async_trait]
pub trait ForgeClient: Send + Sync {
    /// Every repository owned by `owner`, in listing order
    async fn list_repositories(&self, owner: &str) -> Result<Vec<RepositoryRecord>>;

    /// Body of the license identified by `key`
    async fn license_text(&self, key: &str) -> Result<LicenseText>;
}

/// GitHub REST implementation of [`ForgeClient`]
pub struct GitHubClient {
    api_base: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    /// API URL for `segments`, each percent-encoded as a single path segment
    fn endpoint(&self, segments: &[&str]) -> std::result::Result<url::Url, String> {
        let mut url = url::Url::parse(&self.api_base)
            .map_err(|e| format!("Invalid API base {}: {}", self.api_base, e))?;
        url.path_segments_mut()
            .map_err(|_| format!("Invalid API base {}", self.api_base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: url::Url) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        request
    }
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new(GITHUB_API_BASE, None)
    }
}

#[async_trait]
impl ForgeClient for GitHubClient {
    async fn list_repositories(&self, owner: &str) -> Result<Vec<RepositoryRecord>> {
        let endpoint = self
            .endpoint(&["users", owner, "repos"])
            .map_err(WaiverError::Listing)?;
        let mut records = Vec::new();
        let mut page = 1usize;

        loop {
            tracing::debug!("Fetching repositories of {} (page {})", owner, page);

            let response = self
                .get(endpoint.clone())
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())])
                .send()
                .await
                .map_err(|e| WaiverError::Listing(format!("Failed to connect to GitHub: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(WaiverError::Listing(format!(
                    "GitHub API error {}: {}",
                    status, body
                )));
            }

            let batch: Vec<RepositoryRecord> = response
                .json()
                .await
                .map_err(|e| WaiverError::Listing(format!("Failed to parse repositories: {}", e)))?;

            let last = batch.len() < PER_PAGE;
            records.extend(batch);
            if last {
                break;
            }
            page += 1;
        }

        tracing::info!("Found {} repositories owned by {}", records.len(), owner);
        Ok(records)
    }

    async fn license_text(&self, key: &str) -> Result<LicenseText> {
        let endpoint = self
            .endpoint(&["licenses", key])
            .map_err(WaiverError::Resolution)?;
        let response = self
            .get(endpoint)
            .send()
            .await
            .map_err(|e| WaiverError::Resolution(format!("Failed to connect to GitHub: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WaiverError::Resolution(format!(
                "GitHub API error {}: {}",
                status, body
            )));
        }

        let license: LicenseText = response
            .json()
            .await
            .map_err(|e| WaiverError::Resolution(format!("Failed to parse license: {}", e)))?;

        if license.body.trim().is_empty() {
            return Err(WaiverError::Resolution(format!(
                "License {} has an empty body",
                key
            )));
        }

        Ok(license)
    }
}
