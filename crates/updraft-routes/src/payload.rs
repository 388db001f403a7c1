use chrono::{DateTime, Utc};
use serde::Serialize;
use updraft_core::{AvailableUpdate, InvalidReason, LatestRelease};
use updraft_source::PlatformArtifact;

/// Body of `GET /version`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VersionPayload {
    pub version: String,
    pub notes: String,
    pub pub_date: DateTime<Utc>,
}

impl From<&LatestRelease> for VersionPayload {
    fn from(latest: &LatestRelease) -> Self {
        Self {
            version: latest.version.to_string(),
            notes: latest.notes.clone(),
            pub_date: latest.published_at,
        }
    }
}

/// Body of a `200` from `GET /update/:platform/:version`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpdatePayload {
    pub name: String,
    pub notes: String,
    pub pub_date: DateTime<Utc>,
    pub url: String,
}

impl From<&AvailableUpdate> for UpdatePayload {
    fn from(update: &AvailableUpdate) -> Self {
        Self {
            name: update.version.to_string(),
            notes: update.notes.clone(),
            pub_date: update.published_at,
            url: update.target.url().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorPayload {
    pub error: String,
    pub message: String,
}

impl ErrorPayload {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

impl From<InvalidReason> for ErrorPayload {
    fn from(reason: InvalidReason) -> Self {
        Self::new(reason.code(), reason.message())
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OverviewPayload {
    pub repository: String,
    pub latest: String,
    pub pub_date: DateTime<Utc>,
    pub platforms: Vec<PlatformArtifact>,
}
