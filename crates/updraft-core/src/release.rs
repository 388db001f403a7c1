use chrono::{DateTime, Utc};
use log::{debug, warn};
use semver::Version;
use thiserror::Error;
use updraft_platform::PlatformKey;
use updraft_source::{PlatformArtifact, RawAsset, ReleaseSource, UpstreamError, UpstreamRelease};

use crate::artifact::{RELEASES_ASSET, normalize};
use crate::config::ReleaseConfig;

/// Snapshot of the release currently offered to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestRelease {
    pub version: Version,
    pub notes: String,
    pub published_at: DateTime<Utc>,
    pub platforms: Vec<PlatformArtifact>,
    pub release_bundle: Option<String>,
}

impl LatestRelease {
    #[must_use]
    pub fn artifact(&self, platform: PlatformKey) -> Option<&PlatformArtifact> {
        self.platforms
            .iter()
            .find(|artifact| artifact.platform == platform)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("release source unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),

    #[error("no release of {repository} matches: {reason}")]
    NoMatchingRelease { repository: String, reason: String },
}

impl FetchError {
    fn no_match(config: &ReleaseConfig, reason: impl Into<String>) -> Self {
        Self::NoMatchingRelease {
            repository: config.slug(),
            reason: reason.into(),
        }
    }
}

/// Parse a version the way clients and release tags spell it, with an
/// optional leading `v`.
#[must_use]
pub fn parse_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    Version::parse(trimmed.strip_prefix('v').unwrap_or(trimmed)).ok()
}

/// Pick the release to serve from an upstream list ordered newest first.
///
/// Upstream order is authoritative: the list is never re-sorted by version,
/// so publishing an older version number intentionally rolls clients back.
#[must_use]
pub fn select_release(
    releases: &[UpstreamRelease],
    include_pre_releases: bool,
) -> Option<&UpstreamRelease> {
    releases
        .iter()
        .filter(|release| !release.is_draft)
        .find(|release| include_pre_releases || !release.is_prerelease)
}

/// Fetch, select, and normalize the latest release of the configured
/// repository.
///
/// # Errors
/// Returns `UpstreamUnavailable` when the release list cannot be obtained and
/// `NoMatchingRelease` when no release satisfies the selection policy or the
/// selected tag is not a semantic version.
pub async fn fetch_latest_release(
    source: &dyn ReleaseSource,
    config: &ReleaseConfig,
) -> Result<LatestRelease, FetchError> {
    let releases = source
        .list_releases(&config.owner, &config.repository)
        .await?;

    if releases.is_empty() {
        return Err(FetchError::no_match(config, "repository has no releases"));
    }

    let release = select_release(&releases, config.include_pre_releases).ok_or_else(|| {
        FetchError::no_match(config, "every release is a draft or pre-release")
    })?;

    let version = parse_version(&release.tag).ok_or_else(|| {
        FetchError::no_match(
            config,
            format!("tag {:?} is not a semantic version", release.tag),
        )
    })?;

    let release_bundle = match release
        .assets
        .iter()
        .find(|asset| asset.file_name == RELEASES_ASSET)
    {
        Some(asset) => fetch_release_bundle(source, asset).await,
        None => None,
    };

    let platforms = normalize(&release.assets);
    debug!(
        "Selected {} {version} with {} platform artifact(s)",
        config.slug(),
        platforms.len()
    );

    Ok(LatestRelease {
        version,
        notes: release.notes.clone().unwrap_or_default(),
        published_at: release.published_at,
        platforms,
        release_bundle,
    })
}

async fn fetch_release_bundle(source: &dyn ReleaseSource, asset: &RawAsset) -> Option<String> {
    let bytes = match source.download_asset(asset).await {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!("Failed to download {RELEASES_ASSET}: {error}");
            return None;
        }
    };

    let content = String::from_utf8_lossy(&bytes);
    let rewritten = rewrite_release_bundle(&content, &asset.download_url);
    if rewritten.is_none() {
        warn!("{RELEASES_ASSET} lists no .nupkg packages, ignoring it");
    }
    rewritten
}

/// Point every package in a `RELEASES` index at its absolute download URL.
///
/// Package names are resolved against the directory of `releases_url`.
/// Entries that already carry a URL are left untouched. Returns `None` when
/// the index names no packages.
#[must_use]
pub fn rewrite_release_bundle(content: &str, releases_url: &str) -> Option<String> {
    let base = releases_url
        .rsplit_once('/')
        .map_or("", |(directory, _)| directory);
    let mut found = false;
    let mut rewritten = String::with_capacity(content.len());

    for line in content.split_inclusive('\n') {
        let body = line.trim_end_matches(['\r', '\n']);
        for (index, field) in body.split(' ').enumerate() {
            if index > 0 {
                rewritten.push(' ');
            }
            if field.to_ascii_lowercase().ends_with(".nupkg") {
                found = true;
                if !field.contains("://") {
                    rewritten.push_str(base);
                    rewritten.push('/');
                }
            }
            rewritten.push_str(field);
        }
        rewritten.push_str(&line[body.len()..]);
    }

    found.then_some(rewritten)
}
