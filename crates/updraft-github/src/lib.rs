//! GitHub Releases implementations of the upstream release source and the
//! private asset proxy.

mod api;
mod proxy;
mod source;

pub use api::{GitHubAsset, GitHubRelease};
pub use proxy::GitHubAssetProxy;
pub use source::{GitHubSource, build_client};
