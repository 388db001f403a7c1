use updraft_platform::PlatformKey;
use updraft_source::{PlatformArtifact, RawAsset};

/// Squirrel.Windows release index. Cached as the release bundle, never as a
/// platform artifact.
pub const RELEASES_ASSET: &str = "RELEASES";

const ARM64_TOKENS: &[&str] = &["arm64", "aarch64"];
const MAC_TOKENS: &[&str] = &["mac", "darwin", "osx"];

/// Derive the canonical platform of a release asset from its file name.
///
/// Returns `None` for files that are not installers or update archives
/// (checksums, blockmaps, source archives, and arm64 builds of platforms
/// without an arm64 key).
#[must_use]
pub fn detect_platform(file_name: &str) -> Option<PlatformKey> {
    let (_, extension) = file_name.rsplit_once('.')?;
    let lower = file_name.to_ascii_lowercase();
    let arm64 = ARM64_TOKENS.iter().any(|token| lower.contains(token));

    let key = match (extension.to_ascii_lowercase().as_str(), arm64) {
        ("dmg", false) => PlatformKey::Dmg,
        ("dmg", true) => PlatformKey::DmgArm64,
        ("zip", arm64) if MAC_TOKENS.iter().any(|token| lower.contains(token)) => {
            if arm64 {
                PlatformKey::DarwinArm64
            } else {
                PlatformKey::Darwin
            }
        }
        ("exe", false) => PlatformKey::Exe,
        ("deb", false) => PlatformKey::Deb,
        ("rpm", false) => PlatformKey::Rpm,
        ("appimage", false) => PlatformKey::AppImage,
        _ => return None,
    };
    Some(key)
}

/// Turn a release's raw asset list into platform artifacts.
///
/// Unrecognized assets are dropped. When two assets map to the same key the
/// later one replaces the earlier one in place.
#[must_use]
pub fn normalize(assets: &[RawAsset]) -> Vec<PlatformArtifact> {
    let mut artifacts: Vec<PlatformArtifact> = Vec::with_capacity(assets.len());

    for asset in assets {
        if asset.file_name == RELEASES_ASSET {
            continue;
        }
        let Some(platform) = detect_platform(&asset.file_name) else {
            continue;
        };

        let artifact = PlatformArtifact {
            platform,
            file_name: asset.file_name.clone(),
            download_url: asset.download_url.clone(),
            api_url: asset.api_url.clone(),
            content_type: asset.content_type.clone(),
            size_bytes: asset.size_bytes,
        };

        match artifacts.iter_mut().find(|existing| existing.platform == platform) {
            Some(existing) => *existing = artifact,
            None => artifacts.push(artifact),
        }
    }

    artifacts
}
