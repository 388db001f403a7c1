use async_trait::async_trait;

use crate::error::{ProxyError, UpstreamError};
use crate::types::{PlatformArtifact, RawAsset, UpstreamRelease};

/// Read access to a repository's releases on the hosting service.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// List releases newest first, in the order the hosting service reports.
    async fn list_releases(
        &self,
        owner: &str,
        repository: &str,
    ) -> Result<Vec<UpstreamRelease>, UpstreamError>;

    async fn download_asset(&self, asset: &RawAsset) -> Result<Vec<u8>, UpstreamError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyOutcome {
    /// Send the client to a pre-authorized location.
    Redirect(String),
    Body {
        content_type: String,
        bytes: Vec<u8>,
    },
}

/// Serves an artifact of a private repository on the client's behalf.
///
/// The credential authorizes the upstream request only; implementations must
/// never place it in the returned outcome.
#[async_trait]
pub trait AssetProxy: Send + Sync {
    async fn proxy(
        &self,
        artifact: &PlatformArtifact,
        credential: &str,
    ) -> Result<ProxyOutcome, ProxyError>;
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use super::*;

    struct FixedSource {
        releases: Vec<UpstreamRelease>,
    }

    #[async_trait]
    impl ReleaseSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn list_releases(
            &self,
            _owner: &str,
            _repository: &str,
        ) -> Result<Vec<UpstreamRelease>, UpstreamError> {
            Ok(self.releases.clone())
        }

        async fn download_asset(&self, asset: &RawAsset) -> Result<Vec<u8>, UpstreamError> {
            Err(UpstreamError::status("download asset", 404, &asset.file_name))
        }
    }

    fn release(tag: &str) -> UpstreamRelease {
        UpstreamRelease {
            tag: tag.to_string(),
            notes: None,
            published_at: Utc
                .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
            is_prerelease: false,
            is_draft: false,
            assets: Vec::new(),
        }
    }

    #[tokio::test]
    async fn boxed_source_preserves_upstream_order() {
        let source: Box<dyn ReleaseSource> = Box::new(FixedSource {
            releases: vec![release("v2.0.0"), release("v2.1.0")],
        });

        let releases = source
            .list_releases("owner", "repo")
            .await
            .expect("fixed source lists releases");

        assert_eq!(source.name(), "fixed");
        assert_eq!(releases[0].tag, "v2.0.0");
        assert_eq!(releases[1].tag, "v2.1.0");
    }

    #[tokio::test]
    async fn download_errors_surface_status() {
        let source = FixedSource {
            releases: Vec::new(),
        };
        let asset = RawAsset {
            file_name: "RELEASES".to_string(),
            download_url: "https://example.invalid/RELEASES".to_string(),
            api_url: "https://api.example.invalid/assets/1".to_string(),
            content_type: None,
            size_bytes: 0,
        };

        let error = source
            .download_asset(&asset)
            .await
            .expect_err("fixed source cannot download");

        assert!(matches!(error, UpstreamError::HttpStatus { status: 404, .. }));
    }
}
