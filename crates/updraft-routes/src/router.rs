use std::sync::Arc;

use log::{error, info, warn};
use updraft_core::{ReleaseCache, UpdateDecision, resolve_update};
use updraft_platform::{AliasMode, PlatformKey, platform_for_user_agent, resolve_alias};
use updraft_source::{AssetProxy, ProxyOutcome};

use crate::payload::{ErrorPayload, OverviewPayload, UpdatePayload, VersionPayload};
use crate::request::{Request, Response};

const OCTET_STREAM: &str = "application/octet-stream";

/// Dispatches requests against one release cache.
pub struct Router {
    cache: Arc<ReleaseCache>,
    proxy: Option<Arc<dyn AssetProxy>>,
}

impl Router {
    #[must_use]
    pub fn new(cache: Arc<ReleaseCache>) -> Self {
        Self { cache, proxy: None }
    }

    /// Serve private downloads through `proxy`.
    #[must_use]
    pub fn with_proxy(mut self, proxy: Arc<dyn AssetProxy>) -> Self {
        self.proxy = Some(proxy);
        self
    }

    #[must_use]
    pub fn cache(&self) -> &ReleaseCache {
        &self.cache
    }

    pub async fn handle(&self, request: &Request) -> Response {
        info!(
            "{} {} (user agent: {})",
            request.method,
            request.path,
            request.user_agent.as_deref().unwrap_or("-")
        );

        if request.method != "GET" {
            return not_found();
        }

        let Some(segments) = request.segments() else {
            return not_found();
        };
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        let response = match segments.as_slice() {
            [] => self.overview().await,
            ["version"] => self.version().await,
            ["download"] => self.download_for_user_agent(request).await,
            ["download", platform] => self.download_platform(request, platform).await,
            ["update", platform, version] => self.update(platform, version).await,
            ["releases"] => self.releases().await,
            _ => not_found(),
        };

        if response.status >= 500 {
            warn!("{} answered {}", request.path, response.status);
        }
        response
    }

    async fn overview(&self) -> Response {
        let latest = match self.cache.get().await {
            Ok(latest) => latest,
            Err(error) => return cache_unavailable(&error),
        };

        Response::json(
            200,
            &OverviewPayload {
                repository: self.cache.config().slug(),
                latest: latest.version.to_string(),
                pub_date: latest.published_at,
                platforms: latest.platforms.clone(),
            },
        )
    }

    async fn version(&self) -> Response {
        match self.cache.get().await {
            Ok(latest) => Response::json(200, &VersionPayload::from(latest.as_ref())),
            Err(error) => cache_unavailable(&error),
        }
    }

    async fn download_for_user_agent(&self, request: &Request) -> Response {
        let user_agent = request.user_agent.as_deref().unwrap_or_default();
        let platform = platform_for_user_agent(user_agent, request.query_flag("update"));
        self.download(platform).await
    }

    async fn download_platform(&self, request: &Request, token: &str) -> Response {
        let mode = if request.query_flag("update") {
            AliasMode::Update
        } else {
            AliasMode::Download
        };
        self.download(resolve_alias(token, mode)).await
    }

    // Cache first: a cold cache answers 500 even for unresolvable platforms.
    async fn download(&self, platform: Option<PlatformKey>) -> Response {
        let latest = match self.cache.get().await {
            Ok(latest) => latest,
            Err(error) => return cache_unavailable(&error),
        };

        let Some(artifact) = platform.and_then(|platform| latest.artifact(platform)) else {
            return no_download();
        };

        let config = self.cache.config();
        let Some(credential) = config.token.expose().filter(|_| config.is_private()) else {
            return Response::redirect(artifact.download_url.clone());
        };

        let Some(proxy) = &self.proxy else {
            error!(
                "Private download of {} requested but no asset proxy is configured",
                artifact.platform
            );
            return Response::json(
                500,
                &ErrorPayload::new("proxy_unavailable", "Private downloads are not configured"),
            );
        };

        match proxy.proxy(artifact, credential).await {
            Ok(ProxyOutcome::Redirect(location)) => Response::redirect(location),
            Ok(ProxyOutcome::Body {
                content_type,
                bytes,
            }) => Response::bytes(content_type, bytes),
            Err(proxy_error) => {
                error!("Proxying {} failed: {proxy_error}", artifact.file_name);
                Response::json(
                    502,
                    &ErrorPayload::new("proxy_failed", "The download could not be retrieved"),
                )
            }
        }
    }

    async fn update(&self, platform: &str, version: &str) -> Response {
        match resolve_update(&self.cache, platform, version).await {
            Ok(UpdateDecision::Invalid(reason)) => Response::json(500, &ErrorPayload::from(reason)),
            Ok(UpdateDecision::NoUpdate) => Response::empty(204),
            Ok(UpdateDecision::UpdateAvailable(update)) => {
                Response::json(200, &UpdatePayload::from(&update))
            }
            Err(error) => cache_unavailable(&error),
        }
    }

    async fn releases(&self) -> Response {
        match self.cache.get().await {
            Ok(latest) => match &latest.release_bundle {
                Some(bundle) => Response::bytes(OCTET_STREAM, bundle.clone().into_bytes()),
                None => Response::empty(204),
            },
            Err(error) => cache_unavailable(&error),
        }
    }
}

fn not_found() -> Response {
    Response::json(404, &ErrorPayload::new("not_found", "Not found"))
}

fn no_download() -> Response {
    Response::json(
        404,
        &ErrorPayload::new("not_found", "No download available for your platform"),
    )
}

fn cache_unavailable(error: &updraft_core::CacheError) -> Response {
    error!("{error}");
    Response::json(
        500,
        &ErrorPayload::new("cache_unavailable", "Release information is unavailable"),
    )
}
