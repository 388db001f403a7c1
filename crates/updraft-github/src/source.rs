use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use updraft_source::{RawAsset, ReleaseSource, Token, UpstreamError, UpstreamRelease};

use crate::api::GitHubRelease;

const API_MEDIA_TYPE: &str = "application/vnd.github+json";
const ASSET_MEDIA_TYPE: &str = "application/octet-stream";
const RELEASES_PER_PAGE: u8 = 100;

/// Build the HTTP client shared by the GitHub source and proxy.
///
/// # Errors
/// Returns an error when the TLS backend cannot be initialized.
pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent())
        .build()
}

pub(crate) fn user_agent() -> String {
    format!("updraft/{}", env!("CARGO_PKG_VERSION"))
}

pub(crate) fn authorization(token: &str) -> String {
    format!("Bearer {token}")
}

pub struct GitHubSource {
    client: reqwest::Client,
    api_base_url: String,
    token: Token,
}

impl GitHubSource {
    #[must_use]
    pub fn new(client: reqwest::Client, api_base_url: impl Into<String>, token: Token) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn releases_url(&self, owner: &str, repository: &str) -> String {
        format!(
            "{}/repos/{owner}/{repository}/releases?per_page={RELEASES_PER_PAGE}",
            self.api_base_url
        )
    }

    /// Private assets are only reachable through the API URL with a
    /// credential; public ones download directly.
    fn asset_url<'a>(&self, asset: &'a RawAsset) -> &'a str {
        if self.token.is_empty() {
            &asset.download_url
        } else {
            &asset.api_url
        }
    }

    fn get(&self, url: &str, accept: &'static str) -> reqwest::RequestBuilder {
        let request = self.client.get(url).header(ACCEPT, accept);
        match self.token.expose() {
            Some(token) => request.header(AUTHORIZATION, authorization(token)),
            None => request,
        }
    }
}

async fn ensure_success(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::status(operation, status.as_u16(), &body))
}

#[async_trait]
impl ReleaseSource for GitHubSource {
    fn name(&self) -> &'static str {
        "GitHub"
    }

    async fn list_releases(
        &self,
        owner: &str,
        repository: &str,
    ) -> Result<Vec<UpstreamRelease>, UpstreamError> {
        const OPERATION: &str = "list releases";

        let url = self.releases_url(owner, repository);
        debug!("Listing releases from {url}");

        let response = self
            .get(&url, API_MEDIA_TYPE)
            .send()
            .await
            .map_err(|error| UpstreamError::request_from(OPERATION, error))?;
        let response = ensure_success(OPERATION, response).await?;

        let releases: Vec<GitHubRelease> = response
            .json()
            .await
            .map_err(|error| UpstreamError::parse_from(OPERATION, error))?;

        Ok(releases.into_iter().map(UpstreamRelease::from).collect())
    }

    async fn download_asset(&self, asset: &RawAsset) -> Result<Vec<u8>, UpstreamError> {
        const OPERATION: &str = "download asset";

        let url = self.asset_url(asset);
        debug!("Downloading {} from {url}", asset.file_name);

        let response = self
            .get(url, ASSET_MEDIA_TYPE)
            .send()
            .await
            .map_err(|error| UpstreamError::request_from(OPERATION, error))?;
        let response = ensure_success(OPERATION, response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|error| UpstreamError::request_from(OPERATION, error))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use updraft_source::{RawAsset, Token};

    use super::{GitHubSource, authorization, user_agent};

    fn asset() -> RawAsset {
        RawAsset {
            file_name: "RELEASES".to_string(),
            download_url: "https://github.com/acme/app/releases/download/v1.0.0/RELEASES"
                .to_string(),
            api_url: "https://api.github.com/repos/acme/app/releases/assets/7".to_string(),
            content_type: None,
            size_bytes: 80,
        }
    }

    #[test]
    fn releases_url_targets_repository() {
        let source = GitHubSource::new(
            reqwest::Client::new(),
            "https://github.example.com/api/v3/",
            Token::default(),
        );
        assert_eq!(
            source.releases_url("acme", "app"),
            "https://github.example.com/api/v3/repos/acme/app/releases?per_page=100"
        );
    }

    #[test]
    fn public_assets_download_directly() {
        let source = GitHubSource::new(
            reqwest::Client::new(),
            "https://api.github.com",
            Token::default(),
        );
        let asset = asset();
        assert_eq!(source.asset_url(&asset), asset.download_url);
    }

    #[test]
    fn private_assets_download_through_api() {
        let source = GitHubSource::new(
            reqwest::Client::new(),
            "https://api.github.com",
            Token::new("ghp_secret"),
        );
        let asset = asset();
        assert_eq!(source.asset_url(&asset), asset.api_url);
    }

    #[test]
    fn request_identity_headers() {
        assert!(user_agent().starts_with("updraft/"));
        assert_eq!(authorization("abc"), "Bearer abc");
    }
}
