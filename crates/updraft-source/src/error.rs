use thiserror::Error;

/// Failure talking to the release hosting API.
///
/// Values are `Clone` so one failed fetch can be handed to every caller that
/// joined it. Details never include request credentials.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Network error during {operation} ({stage}): {details}")]
    Network {
        operation: &'static str,
        stage: NetworkStage,
        details: String,
    },

    #[error("{operation} failed with HTTP {status}{body_snippet}")]
    HttpStatus {
        operation: &'static str,
        status: u16,
        body_snippet: String,
    },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStage {
    #[error("request")]
    Request,
    #[error("response parse")]
    ResponseParse,
}

impl UpstreamError {
    pub fn request(operation: &'static str, details: impl Into<String>) -> Self {
        Self::Network {
            operation,
            stage: NetworkStage::Request,
            details: details.into(),
        }
    }

    pub fn request_from<E>(operation: &'static str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::request(operation, error.to_string())
    }

    pub fn parse_from<E>(operation: &'static str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Network {
            operation,
            stage: NetworkStage::ResponseParse,
            details: error.to_string(),
        }
    }

    pub fn status(operation: &'static str, status: u16, body: &str) -> Self {
        Self::HttpStatus {
            operation,
            status,
            body_snippet: response_snippet(body, 160),
        }
    }

    /// Whether the hosting API refused the call because of quota or
    /// credentials rather than a transport problem.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 401 | 403 | 429, .. })
    }
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.trim().chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("asset redirect with HTTP {status} carried no location")]
    MissingLocation { status: u16 },
}
