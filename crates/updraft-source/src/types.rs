use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use updraft_platform::PlatformKey;

/// A file attached to an upstream release, as reported by the hosting API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAsset {
    pub file_name: String,
    pub download_url: String,
    pub api_url: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
}

/// One entry of the upstream release list, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRelease {
    pub tag: String,
    pub notes: Option<String>,
    pub published_at: DateTime<Utc>,
    pub is_prerelease: bool,
    pub is_draft: bool,
    pub assets: Vec<RawAsset>,
}

/// A normalized, downloadable build for one canonical platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformArtifact {
    pub platform: PlatformKey,
    pub file_name: String,
    pub download_url: String,
    #[serde(skip)]
    pub api_url: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
}

/// Credential for the hosting API. Empty means the repository is public.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn expose(&self) -> Option<&str> {
        (!self.0.is_empty()).then_some(self.0.as_str())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Token(<none>)")
        } else {
            f.write_str("Token(<redacted>)")
        }
    }
}
