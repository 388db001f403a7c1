use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, LOCATION};
use updraft_source::{AssetProxy, PlatformArtifact, ProxyError, ProxyOutcome, UpstreamError};

use crate::source::{authorization, user_agent};

const OPERATION: &str = "proxy asset";

/// Resolves private release assets to the short-lived signed URL GitHub
/// redirects authorized requests to.
pub struct GitHubAssetProxy {
    client: reqwest::Client,
}

impl GitHubAssetProxy {
    /// Build a proxy with its own non-redirecting client.
    ///
    /// # Errors
    /// Returns an error when the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

fn redirect_outcome(
    status: StatusCode,
    location: Option<&str>,
) -> Result<ProxyOutcome, ProxyError> {
    match location.filter(|location| !location.is_empty()) {
        Some(location) => Ok(ProxyOutcome::Redirect(location.to_string())),
        None => Err(ProxyError::MissingLocation {
            status: status.as_u16(),
        }),
    }
}

#[async_trait]
impl AssetProxy for GitHubAssetProxy {
    async fn proxy(
        &self,
        artifact: &PlatformArtifact,
        credential: &str,
    ) -> Result<ProxyOutcome, ProxyError> {
        debug!("Proxying {} ({})", artifact.file_name, artifact.platform);

        let response = self
            .client
            .get(&artifact.api_url)
            .header(ACCEPT, "application/octet-stream")
            .header(AUTHORIZATION, authorization(credential))
            .send()
            .await
            .map_err(|error| UpstreamError::request_from(OPERATION, error))?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok());
            return redirect_outcome(status, location);
        }

        if status.is_success() {
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
                .or_else(|| artifact.content_type.clone())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let bytes = response
                .bytes()
                .await
                .map_err(|error| UpstreamError::request_from(OPERATION, error))?;
            return Ok(ProxyOutcome::Body {
                content_type,
                bytes: bytes.to_vec(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(UpstreamError::status(OPERATION, status.as_u16(), &body).into())
    }
}
