use std::time::Duration;

use thiserror::Error;
use updraft_source::Token;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required setting {key}")]
    Missing { key: &'static str },

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Immutable, process-wide description of the repository being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    pub token: Token,
    pub owner: String,
    pub repository: String,
    pub public_base_url: String,
    pub include_pre_releases: bool,
    pub cache_ttl: Duration,
    pub api_base_url: String,
}

impl ReleaseConfig {
    #[must_use]
    pub fn new(owner: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            token: Token::default(),
            owner: owner.into(),
            repository: repository.into(),
            public_base_url: String::new(),
            include_pre_releases: false,
            cache_ttl: DEFAULT_CACHE_TTL,
            api_base_url: DEFAULT_API_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = trim_base_url(&url.into());
        self
    }

    #[must_use]
    pub fn with_pre_releases(mut self, include: bool) -> Self {
        self.include_pre_releases = include;
        self
    }

    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = trim_base_url(&url.into());
        self
    }

    /// Private repositories are served through the asset proxy instead of
    /// direct redirects.
    #[must_use]
    pub fn is_private(&self) -> bool {
        !self.token.is_empty()
    }

    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repository)
    }

    /// Read the configuration from process environment variables.
    ///
    /// # Errors
    /// Returns an error when a required variable is missing or a value cannot
    /// be interpreted.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Recognized keys: `ACCOUNT`, `REPOSITORY` (required), `TOKEN`, `URL`,
    /// `PRE`, `INTERVAL` (minutes), `API_URL`.
    ///
    /// # Errors
    /// Returns an error when a required key is missing or a value cannot be
    /// interpreted.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let owner = value("ACCOUNT").ok_or(ConfigError::Missing { key: "ACCOUNT" })?;
        let repository = value("REPOSITORY").ok_or(ConfigError::Missing { key: "REPOSITORY" })?;

        let mut config = Self::new(owner.trim(), repository.trim())
            .with_token(Token::new(value("TOKEN").unwrap_or_default()))
            .with_pre_releases(value("PRE").is_some_and(|pre| parse_flag(&pre)));

        if let Some(url) = value("URL") {
            config = config.with_public_base_url(url);
        } else if config.is_private() {
            return Err(ConfigError::Missing { key: "URL" });
        }

        if let Some(interval) = value("INTERVAL") {
            config = config.with_cache_ttl(parse_interval(&interval)?);
        }

        if let Some(api_url) = value("API_URL") {
            config = config.with_api_base_url(api_url);
        }

        Ok(config)
    }
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false")
}

fn parse_interval(value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason| ConfigError::Invalid {
        key: "INTERVAL",
        value: value.to_string(),
        reason,
    };
    let minutes: u64 = value
        .trim()
        .parse()
        .map_err(|_| invalid("expected a whole number of minutes"))?;
    if minutes == 0 {
        return Err(invalid("must be at least one minute"));
    }
    let seconds = minutes.checked_mul(60).ok_or_else(|| invalid("too large"))?;
    Ok(Duration::from_secs(seconds))
}
