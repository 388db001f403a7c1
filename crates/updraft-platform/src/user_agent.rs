use crate::key::PlatformKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientOs {
    MacOs,
    Windows,
    Other,
}

#[must_use]
pub fn detect_client_os(user_agent: &str) -> ClientOs {
    let lower = user_agent.to_ascii_lowercase();
    if lower.contains("macintosh") || lower.contains("mac os x") || lower.contains("darwin") {
        ClientOs::MacOs
    } else if lower.contains("windows") {
        ClientOs::Windows
    } else {
        ClientOs::Other
    }
}

/// Pick the artifact a bare `/download` request should receive.
///
/// Only macOS and Windows clients are served without an explicit platform.
#[must_use]
pub fn platform_for_user_agent(user_agent: &str, is_update: bool) -> Option<PlatformKey> {
    match detect_client_os(user_agent) {
        ClientOs::MacOs if is_update => Some(PlatformKey::Darwin),
        ClientOs::MacOs => Some(PlatformKey::Dmg),
        ClientOs::Windows => Some(PlatformKey::Exe),
        ClientOs::Other => None,
    }
}
