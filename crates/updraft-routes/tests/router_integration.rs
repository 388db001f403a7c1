use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use updraft_core::{ReleaseCache, ReleaseConfig};
use updraft_routes::{Request, Router};
use updraft_source::{
    AssetProxy, PlatformArtifact, ProxyError, ProxyOutcome, RawAsset, ReleaseSource, Token,
    UpstreamError, UpstreamRelease,
};

const SAFARI: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";
const EDGE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0";
const FIREFOX_LINUX: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0";

const DOWNLOAD_BASE: &str = "https://github.com/acme/app/releases/download/v2.0.1";

fn asset(file_name: &str, id: u32) -> RawAsset {
    RawAsset {
        file_name: file_name.to_string(),
        download_url: format!("{DOWNLOAD_BASE}/{file_name}"),
        api_url: format!("https://api.github.com/repos/acme/app/releases/assets/{id}"),
        content_type: Some("application/octet-stream".to_string()),
        size_bytes: 1024,
    }
}

fn release_2_0_1(extra: Vec<RawAsset>) -> UpstreamRelease {
    let mut assets = vec![
        asset("App-2.0.1.dmg", 1),
        asset("App-2.0.1-arm64.dmg", 2),
        asset("App-Setup-2.0.1.exe", 3),
        asset("App-2.0.1-mac.zip", 4),
    ];
    assets.extend(extra);

    UpstreamRelease {
        tag: "v2.0.1".to_string(),
        notes: Some("Faster startup".to_string()),
        published_at: Utc
            .with_ymd_and_hms(2024, 5, 2, 9, 30, 0)
            .single()
            .expect("valid timestamp"),
        is_prerelease: false,
        is_draft: false,
        assets,
    }
}

struct StubSource {
    releases: Result<Vec<UpstreamRelease>, UpstreamError>,
    bundle: Vec<u8>,
}

impl StubSource {
    fn serving(release: UpstreamRelease) -> Self {
        Self {
            releases: Ok(vec![release]),
            bundle: Vec::new(),
        }
    }

    fn failing() -> Self {
        Self {
            releases: Err(UpstreamError::status("list releases", 503, "unavailable")),
            bundle: Vec::new(),
        }
    }
}

#[async_trait]
impl ReleaseSource for StubSource {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn list_releases(
        &self,
        _owner: &str,
        _repository: &str,
    ) -> Result<Vec<UpstreamRelease>, UpstreamError> {
        self.releases.clone()
    }

    async fn download_asset(&self, _asset: &RawAsset) -> Result<Vec<u8>, UpstreamError> {
        Ok(self.bundle.clone())
    }
}

#[derive(Default)]
struct RecordingProxy {
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl AssetProxy for RecordingProxy {
    async fn proxy(
        &self,
        artifact: &PlatformArtifact,
        credential: &str,
    ) -> Result<ProxyOutcome, ProxyError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((artifact.api_url.clone(), credential.to_string()));
        Ok(ProxyOutcome::Redirect(format!(
            "https://objects.example.com/{}?signature=abc",
            artifact.file_name
        )))
    }
}

struct FailingProxy;

#[async_trait]
impl AssetProxy for FailingProxy {
    async fn proxy(
        &self,
        _artifact: &PlatformArtifact,
        _credential: &str,
    ) -> Result<ProxyOutcome, ProxyError> {
        Err(ProxyError::MissingLocation { status: 302 })
    }
}

fn public_router(source: StubSource) -> Router {
    let config = ReleaseConfig::new("acme", "app");
    Router::new(Arc::new(ReleaseCache::new(config, Arc::new(source))))
}

fn private_config() -> ReleaseConfig {
    ReleaseConfig::new("acme", "app")
        .with_token(Token::new("ghp_secret"))
        .with_public_base_url("https://updates.example.com/")
}

#[tokio::test]
async fn update_available_for_older_client() {
    let router = public_router(StubSource::serving(release_2_0_1(Vec::new())));

    let response = router.handle(&Request::get("/update/dmg/2.0.0")).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("application/json"));

    let body = response.body_json().expect("json body");
    assert_eq!(body["name"], "2.0.1");
    assert_eq!(body["notes"], "Faster startup");
    assert_eq!(body["pub_date"], "2024-05-02T09:30:00Z");
    assert_eq!(body["url"], format!("{DOWNLOAD_BASE}/App-2.0.1.dmg"));
}

#[tokio::test]
async fn current_client_gets_no_content() {
    let router = public_router(StubSource::serving(release_2_0_1(Vec::new())));

    let response = router.handle(&Request::get("/update/dmg/2.0.1")).await;
    assert_eq!(response.status, 204);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn newer_client_is_rolled_back() {
    let router = public_router(StubSource::serving(release_2_0_1(Vec::new())));

    let response = router.handle(&Request::get("/update/exe/3.0.0")).await;
    assert_eq!(response.status, 200);
    let body = response.body_json().expect("json body");
    assert_eq!(body["name"], "2.0.1");
    assert_eq!(body["url"], format!("{DOWNLOAD_BASE}/App-Setup-2.0.1.exe"));
}

#[tokio::test]
async fn invalid_version_is_reported() {
    let router = public_router(StubSource::serving(release_2_0_1(Vec::new())));

    let response = router
        .handle(&Request::get("/update/dmg/not-a-version"))
        .await;
    assert_eq!(response.status, 500);

    let body = response.body_json().expect("json body");
    assert_eq!(body["error"], "version_invalid");
    assert_eq!(
        body["message"],
        "The specified version is not SemVer-compatible"
    );
}

#[tokio::test]
async fn invalid_platform_is_reported() {
    let router = public_router(StubSource::serving(release_2_0_1(Vec::new())));

    for path in ["/update/deb/2.0.0", "/update/solaris/2.0.0"] {
        let response = router.handle(&Request::get(path)).await;
        assert_eq!(response.status, 500, "{path}");
        assert_eq!(
            response.body_json().expect("json body")["error"],
            "invalid_platform"
        );
    }
}

#[tokio::test]
async fn mac_alias_means_zip_for_updates() {
    let router = public_router(StubSource::serving(release_2_0_1(Vec::new())));

    let response = router.handle(&Request::get("/update/mac/2.0.0")).await;
    assert_eq!(response.status, 200);
    assert_eq!(
        response.body_json().expect("json body")["url"],
        format!("{DOWNLOAD_BASE}/App-2.0.1-mac.zip")
    );
}

#[tokio::test]
async fn version_route_reports_latest() {
    let router = public_router(StubSource::serving(release_2_0_1(Vec::new())));

    let response = router.handle(&Request::get("/version")).await;
    assert_eq!(response.status, 200);

    let body = response.body_json().expect("json body");
    assert_eq!(body["version"], "2.0.1");
    assert_eq!(body["notes"], "Faster startup");
    assert_eq!(body["pub_date"], "2024-05-02T09:30:00Z");
}

#[tokio::test]
async fn public_download_redirects_to_asset() {
    let router = public_router(StubSource::serving(release_2_0_1(Vec::new())));

    let dmg = router.handle(&Request::get("/download/mac")).await;
    assert_eq!(dmg.status, 302);
    assert_eq!(
        dmg.header("location"),
        Some(format!("{DOWNLOAD_BASE}/App-2.0.1.dmg").as_str())
    );

    let arm = router.handle(&Request::get("/download/mac_arm64")).await;
    assert_eq!(
        arm.header("location"),
        Some(format!("{DOWNLOAD_BASE}/App-2.0.1-arm64.dmg").as_str())
    );

    let update = router.handle(&Request::get("/download/mac?update=true")).await;
    assert_eq!(
        update.header("location"),
        Some(format!("{DOWNLOAD_BASE}/App-2.0.1-mac.zip").as_str())
    );

    let missing = router.handle(&Request::get("/download/deb")).await;
    assert_eq!(missing.status, 404);
}

#[tokio::test]
async fn encoded_path_segments_are_decoded() {
    let router = public_router(StubSource::serving(release_2_0_1(Vec::new())));

    let build = router
        .handle(&Request::get("/update/dmg/2.0.1%2Bbuild.1"))
        .await;
    assert_eq!(build.status, 204);

    let older = router
        .handle(&Request::get("/update/dmg%5Farm64/2.0.0"))
        .await;
    assert_eq!(older.status, 200);
    assert_eq!(
        older.body_json().expect("json body")["url"],
        format!("{DOWNLOAD_BASE}/App-2.0.1-arm64.dmg")
    );

    let arm = router.handle(&Request::get("/download/mac%5Farm64")).await;
    assert_eq!(arm.status, 302);
    assert_eq!(
        arm.header("location"),
        Some(format!("{DOWNLOAD_BASE}/App-2.0.1-arm64.dmg").as_str())
    );

    let invalid = router.handle(&Request::get("/download/%FF")).await;
    assert_eq!(invalid.status, 404);
}

#[tokio::test]
async fn download_sniffs_user_agent() {
    let router = public_router(StubSource::serving(release_2_0_1(Vec::new())));

    let mac = router
        .handle(&Request::get("/download").with_user_agent(SAFARI))
        .await;
    assert_eq!(
        mac.header("location"),
        Some(format!("{DOWNLOAD_BASE}/App-2.0.1.dmg").as_str())
    );

    let mac_update = router
        .handle(&Request::get("/download?update=true").with_user_agent(SAFARI))
        .await;
    assert_eq!(
        mac_update.header("location"),
        Some(format!("{DOWNLOAD_BASE}/App-2.0.1-mac.zip").as_str())
    );

    for target in ["/download?update", "/download?update="] {
        let response = router
            .handle(&Request::get(target).with_user_agent(SAFARI))
            .await;
        assert_eq!(
            response.header("location"),
            Some(format!("{DOWNLOAD_BASE}/App-2.0.1.dmg").as_str()),
            "{target}"
        );
    }

    let windows = router
        .handle(&Request::get("/download").with_user_agent(EDGE))
        .await;
    assert_eq!(
        windows.header("location"),
        Some(format!("{DOWNLOAD_BASE}/App-Setup-2.0.1.exe").as_str())
    );

    let linux = router
        .handle(&Request::get("/download").with_user_agent(FIREFOX_LINUX))
        .await;
    assert_eq!(linux.status, 404);

    let anonymous = router.handle(&Request::get("/download")).await;
    assert_eq!(anonymous.status, 404);
}

#[tokio::test]
async fn private_update_points_at_proxy_route() {
    let cache = ReleaseCache::new(
        private_config(),
        Arc::new(StubSource::serving(release_2_0_1(Vec::new()))),
    );
    let router = Router::new(Arc::new(cache)).with_proxy(Arc::new(RecordingProxy::default()));

    let response = router.handle(&Request::get("/update/darwin/1.9.0")).await;
    assert_eq!(response.status, 200);

    let body = response.body_json().expect("json body");
    assert_eq!(
        body["url"],
        "https://updates.example.com/download/darwin?update=true"
    );
    assert!(!String::from_utf8_lossy(&response.body).contains("ghp_secret"));
}

#[tokio::test]
async fn private_download_goes_through_proxy() {
    let proxy = Arc::new(RecordingProxy::default());
    let cache = ReleaseCache::new(
        private_config(),
        Arc::new(StubSource::serving(release_2_0_1(Vec::new()))),
    );
    let router = Router::new(Arc::new(cache)).with_proxy(proxy.clone());

    let response = router
        .handle(&Request::get("/download/darwin?update=true"))
        .await;
    assert_eq!(response.status, 302);
    assert_eq!(
        response.header("location"),
        Some("https://objects.example.com/App-2.0.1-mac.zip?signature=abc")
    );
    assert!(
        response
            .headers
            .iter()
            .all(|(_, value)| !value.contains("ghp_secret"))
    );

    let calls = proxy.calls.lock().expect("calls lock");
    assert_eq!(
        calls.as_slice(),
        [(
            "https://api.github.com/repos/acme/app/releases/assets/4".to_string(),
            "ghp_secret".to_string()
        )]
    );
}

#[tokio::test]
async fn proxy_failure_is_bad_gateway() {
    let cache = ReleaseCache::new(
        private_config(),
        Arc::new(StubSource::serving(release_2_0_1(Vec::new()))),
    );
    let router = Router::new(Arc::new(cache)).with_proxy(Arc::new(FailingProxy));

    let response = router.handle(&Request::get("/download/exe")).await;
    assert_eq!(response.status, 502);
    assert_eq!(
        response.body_json().expect("json body")["error"],
        "proxy_failed"
    );
}

#[tokio::test]
async fn releases_bundle_is_served_with_absolute_urls() {
    let mut source = StubSource::serving(release_2_0_1(vec![asset("RELEASES", 5)]));
    source.bundle = b"ABC123 App-2.0.1-full.nupkg 1024".to_vec();
    let router = public_router(source);

    let response = router.handle(&Request::get("/releases")).await;
    assert_eq!(response.status, 200);
    assert_eq!(
        response.header("content-type"),
        Some("application/octet-stream")
    );

    let expected = format!("ABC123 {DOWNLOAD_BASE}/App-2.0.1-full.nupkg 1024");
    assert_eq!(response.body, expected.as_bytes());
    assert_eq!(
        response.header("content-length"),
        Some(expected.len().to_string().as_str())
    );
}

#[tokio::test]
async fn cold_start_failure_answers_server_error_everywhere() {
    let router = public_router(StubSource::failing());

    for path in [
        "/",
        "/version",
        "/download/mac",
        "/download/beos",
        "/update/dmg/2.0.0",
        "/releases",
    ] {
        let response = router.handle(&Request::get(path)).await;
        assert_eq!(response.status, 500, "{path}");
        assert_eq!(
            response.body_json().expect("json body")["error"],
            "cache_unavailable",
            "{path}"
        );
    }

    for user_agent in [SAFARI, FIREFOX_LINUX] {
        let sniffed = router
            .handle(&Request::get("/download").with_user_agent(user_agent))
            .await;
        assert_eq!(sniffed.status, 500, "{user_agent}");
    }
}

#[tokio::test]
async fn invalid_version_does_not_need_the_cache() {
    let router = public_router(StubSource::failing());

    let response = router
        .handle(&Request::get("/update/dmg/not-a-version"))
        .await;
    assert_eq!(response.status, 500);
    assert_eq!(
        response.body_json().expect("json body")["error"],
        "version_invalid"
    );
}
