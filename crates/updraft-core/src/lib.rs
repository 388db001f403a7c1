//! Release metadata cache and update resolution for Updraft.
//!
//! This crate holds the logic that does not depend on the HTTP surface or on
//! a concrete hosting service:
//! - Normalizing release assets into canonical platform artifacts.
//! - Selecting and assembling the latest release from an upstream source.
//! - Keeping that release fresh behind a single-flight, serve-stale cache.
//! - Deciding whether a client should update.

mod artifact;
mod cache;
mod config;
mod release;
mod resolver;

/// Asset naming rules and the normalizer.
pub use artifact::{RELEASES_ASSET, detect_platform, normalize};
/// TTL cache over the latest release.
pub use cache::{CacheError, Clock, ReleaseCache, SystemClock};
/// Process configuration.
pub use config::{ConfigError, DEFAULT_API_URL, DEFAULT_CACHE_TTL, ReleaseConfig};
/// Latest release model and upstream fetch.
pub use release::{
    FetchError, LatestRelease, fetch_latest_release, parse_version, rewrite_release_bundle,
    select_release,
};
/// Update decisions.
pub use resolver::{
    AvailableUpdate, DownloadTarget, InvalidReason, UpdateDecision, decide_update, download_target,
    resolve_update,
};
