use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use semver::Version;
use updraft_platform::{AliasMode, PlatformKey, resolve_alias};
use updraft_source::PlatformArtifact;

use crate::cache::{CacheError, ReleaseCache};
use crate::config::ReleaseConfig;
use crate::release::{LatestRelease, parse_version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    VersionInvalid,
    InvalidPlatform,
}

impl InvalidReason {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            InvalidReason::VersionInvalid => "version_invalid",
            InvalidReason::InvalidPlatform => "invalid_platform",
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            InvalidReason::VersionInvalid => "The specified version is not SemVer-compatible",
            InvalidReason::InvalidPlatform => "The specified platform is not valid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// The hosting service's public download URL.
    Direct(String),
    /// A path on this server that proxies a private asset.
    Proxy(String),
}

impl DownloadTarget {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            DownloadTarget::Direct(url) | DownloadTarget::Proxy(url) => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableUpdate {
    pub version: Version,
    pub notes: String,
    pub published_at: DateTime<Utc>,
    pub platform: PlatformKey,
    pub target: DownloadTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDecision {
    Invalid(InvalidReason),
    NoUpdate,
    UpdateAvailable(AvailableUpdate),
}

/// Where a client should fetch `artifact` from.
///
/// Private repositories never expose the asset URL; clients go through this
/// server's download route, which holds the credential.
#[must_use]
pub fn download_target(config: &ReleaseConfig, artifact: &PlatformArtifact) -> DownloadTarget {
    if config.is_private() {
        DownloadTarget::Proxy(format!(
            "{}/download/{}?update=true",
            config.public_base_url, artifact.platform
        ))
    } else {
        DownloadTarget::Direct(artifact.download_url.clone())
    }
}

/// Decide whether a client running `client_version` on `platform_token`
/// should switch to `latest`.
///
/// Any difference in version precedence offers the update, including when
/// the client is ahead of the latest release; this is how a rollback is
/// delivered.
#[must_use]
pub fn decide_update(
    latest: &LatestRelease,
    config: &ReleaseConfig,
    platform_token: &str,
    client_version: &Version,
) -> UpdateDecision {
    let Some(artifact) = resolve_alias(platform_token, AliasMode::Update)
        .and_then(|platform| latest.artifact(platform))
    else {
        return UpdateDecision::Invalid(InvalidReason::InvalidPlatform);
    };

    if latest.version.cmp_precedence(client_version) == Ordering::Equal {
        return UpdateDecision::NoUpdate;
    }

    UpdateDecision::UpdateAvailable(AvailableUpdate {
        version: latest.version.clone(),
        notes: latest.notes.clone(),
        published_at: latest.published_at,
        platform: artifact.platform,
        target: download_target(config, artifact),
    })
}

/// Resolve an update check against the cached latest release.
///
/// The client version is validated before the cache is consulted.
///
/// # Errors
/// Returns `CacheError` when the cache is cold and cannot be filled.
pub async fn resolve_update(
    cache: &ReleaseCache,
    platform_token: &str,
    client_version: &str,
) -> Result<UpdateDecision, CacheError> {
    let Some(client_version) = parse_version(client_version) else {
        return Ok(UpdateDecision::Invalid(InvalidReason::VersionInvalid));
    };

    let latest = cache.get().await?;
    Ok(decide_update(
        &latest,
        cache.config(),
        platform_token,
        &client_version,
    ))
}
