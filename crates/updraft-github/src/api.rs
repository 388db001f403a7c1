use chrono::{DateTime, Utc};
use serde::Deserialize;
use updraft_source::{RawAsset, UpstreamRelease};

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAsset {
    pub name: String,
    pub url: String,
    pub browser_download_url: String,
    pub size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

impl From<GitHubAsset> for RawAsset {
    fn from(asset: GitHubAsset) -> Self {
        RawAsset {
            file_name: asset.name,
            download_url: asset.browser_download_url,
            api_url: asset.url,
            content_type: asset.content_type,
            size_bytes: asset.size,
        }
    }
}

impl From<GitHubRelease> for UpstreamRelease {
    fn from(release: GitHubRelease) -> Self {
        UpstreamRelease {
            tag: release.tag_name,
            notes: release.body,
            published_at: release.published_at.unwrap_or(release.created_at),
            is_prerelease: release.prerelease,
            is_draft: release.draft,
            assets: release.assets.into_iter().map(RawAsset::from).collect(),
        }
    }
}
