mod alias;
mod key;
mod user_agent;

pub use alias::{AliasMode, resolve_alias};
pub use key::{PlatformKey, UnknownPlatform};
pub use user_agent::{ClientOs, detect_client_os, platform_for_user_agent};
