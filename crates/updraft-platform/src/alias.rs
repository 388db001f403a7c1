use crate::key::PlatformKey;

/// Why the client is asking for a platform.
///
/// A plain download wants the installer, while a running app checking for an
/// update wants the archive its auto-updater can apply in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasMode {
    Download,
    Update,
}

struct Alias {
    token: &'static str,
    download: PlatformKey,
    update: PlatformKey,
}

const fn alias(token: &'static str, download: PlatformKey, update: PlatformKey) -> Alias {
    Alias {
        token,
        download,
        update,
    }
}

const fn same(token: &'static str, key: PlatformKey) -> Alias {
    alias(token, key, key)
}

const ALIASES: &[Alias] = &[
    alias("mac", PlatformKey::Dmg, PlatformKey::Darwin),
    alias("macos", PlatformKey::Dmg, PlatformKey::Darwin),
    alias("osx", PlatformKey::Dmg, PlatformKey::Darwin),
    alias("mac_arm64", PlatformKey::DmgArm64, PlatformKey::DarwinArm64),
    alias("macos_arm64", PlatformKey::DmgArm64, PlatformKey::DarwinArm64),
    alias("osx_arm64", PlatformKey::DmgArm64, PlatformKey::DarwinArm64),
    same("win32", PlatformKey::Exe),
    same("windows", PlatformKey::Exe),
    same("win", PlatformKey::Exe),
    same("debian", PlatformKey::Deb),
    same("fedora", PlatformKey::Rpm),
    same("appimage", PlatformKey::AppImage),
    same("linux", PlatformKey::AppImage),
];

/// Map a client-supplied platform token to its canonical key.
///
/// Tokens without an alias are looked up as canonical keys verbatim. `None`
/// means the token names nothing in the closed key space; callers treat that
/// exactly like a release without an artifact for the platform.
#[must_use]
pub fn resolve_alias(token: &str, mode: AliasMode) -> Option<PlatformKey> {
    ALIASES
        .iter()
        .find(|alias| alias.token == token)
        .map(|alias| match mode {
            AliasMode::Download => alias.download,
            AliasMode::Update => alias.update,
        })
        .or_else(|| token.parse().ok())
}
