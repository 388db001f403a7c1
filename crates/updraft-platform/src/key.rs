use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Canonical identifier of a downloadable build inside a release.
///
/// The set is closed: every artifact that survives normalization carries one
/// of these keys, and every client token must resolve to one of them before a
/// lookup happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PlatformKey {
    #[serde(rename = "dmg")]
    Dmg,
    #[serde(rename = "dmg_arm64")]
    DmgArm64,
    #[serde(rename = "exe")]
    Exe,
    #[serde(rename = "deb")]
    Deb,
    #[serde(rename = "rpm")]
    Rpm,
    #[serde(rename = "AppImage")]
    AppImage,
    #[serde(rename = "darwin")]
    Darwin,
    #[serde(rename = "darwin_arm64")]
    DarwinArm64,
}

impl PlatformKey {
    pub const ALL: [PlatformKey; 8] = [
        PlatformKey::Dmg,
        PlatformKey::DmgArm64,
        PlatformKey::Exe,
        PlatformKey::Deb,
        PlatformKey::Rpm,
        PlatformKey::AppImage,
        PlatformKey::Darwin,
        PlatformKey::DarwinArm64,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PlatformKey::Dmg => "dmg",
            PlatformKey::DmgArm64 => "dmg_arm64",
            PlatformKey::Exe => "exe",
            PlatformKey::Deb => "deb",
            PlatformKey::Rpm => "rpm",
            PlatformKey::AppImage => "AppImage",
            PlatformKey::Darwin => "darwin",
            PlatformKey::DarwinArm64 => "darwin_arm64",
        }
    }

    #[must_use]
    pub fn is_arm64(self) -> bool {
        matches!(self, PlatformKey::DmgArm64 | PlatformKey::DarwinArm64)
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown platform: {token}")]
pub struct UnknownPlatform {
    pub token: String,
}

impl FromStr for PlatformKey {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownPlatform {
                token: s.to_string(),
            })
    }
}
