mod error;
mod traits;
mod types;

pub use error::{NetworkStage, ProxyError, UpstreamError};
pub use traits::{AssetProxy, ProxyOutcome, ReleaseSource};
pub use types::{PlatformArtifact, RawAsset, Token, UpstreamRelease};
