use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use log::{info, warn};
use thiserror::Error;
use updraft_source::{ReleaseSource, UpstreamError};

use crate::config::ReleaseConfig;
use crate::release::{FetchError, LatestRelease, fetch_latest_release};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("release cache unavailable: {source}")]
    Unavailable {
        #[source]
        source: FetchError,
    },
}

type FetchOutcome = Result<Arc<LatestRelease>, FetchError>;
type InFlightFetch = Shared<BoxFuture<'static, FetchOutcome>>;

#[derive(Default)]
struct CacheState {
    snapshot: Option<Arc<LatestRelease>>,
    fetched_at: Option<DateTime<Utc>>,
    in_flight: Option<InFlightFetch>,
}

impl CacheState {
    fn fresh_snapshot(&self, now: DateTime<Utc>, ttl: TimeDelta) -> Option<Arc<LatestRelease>> {
        let fetched_at = self.fetched_at?;
        if now.signed_duration_since(fetched_at) < ttl {
            self.snapshot.clone()
        } else {
            None
        }
    }
}

/// Memory-resident cache of the latest release.
///
/// Reads inside the TTL never touch the network. A cold or stale read starts
/// one upstream fetch; every concurrent reader joins that fetch instead of
/// starting its own. The fetch runs as its own task, so it completes even when
/// the reader that started it goes away. A failed refresh of a stale snapshot
/// serves the stale snapshot; only a cold cache surfaces the failure.
pub struct ReleaseCache {
    config: Arc<ReleaseConfig>,
    source: Arc<dyn ReleaseSource>,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<CacheState>>,
}

impl ReleaseCache {
    #[must_use]
    pub fn new(config: ReleaseConfig, source: Arc<dyn ReleaseSource>) -> Self {
        Self::with_clock(config, source, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        config: ReleaseConfig,
        source: Arc<dyn ReleaseSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            source,
            clock,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ReleaseConfig {
        &self.config
    }

    /// Return the latest release, fetching it first when the cache is cold or
    /// stale.
    ///
    /// # Errors
    /// Returns `CacheError::Unavailable` when no snapshot exists and the
    /// upstream fetch fails.
    pub async fn get(&self) -> Result<Arc<LatestRelease>, CacheError> {
        let (fetch, stale) = {
            let mut state = lock(&self.state);
            if let Some(snapshot) = state.fresh_snapshot(self.clock.now(), self.ttl()) {
                return Ok(snapshot);
            }

            let fetch = match &state.in_flight {
                Some(fetch) => fetch.clone(),
                None => {
                    let fetch = self.start_fetch();
                    state.in_flight = Some(fetch.clone());
                    fetch
                }
            };
            (fetch, state.snapshot.clone())
        };

        match fetch.await {
            Ok(snapshot) => Ok(snapshot),
            Err(error) => match stale {
                Some(snapshot) => {
                    warn!("Serving stale release {} after failed refresh", snapshot.version);
                    Ok(snapshot)
                }
                None => Err(CacheError::Unavailable { source: error }),
            },
        }
    }

    /// The current snapshot regardless of age, without touching the network.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<LatestRelease>> {
        lock(&self.state).snapshot.clone()
    }

    #[must_use]
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        lock(&self.state).fetched_at
    }

    /// Mark the snapshot stale so the next read refreshes it.
    pub fn invalidate(&self) {
        lock(&self.state).fetched_at = None;
    }

    fn ttl(&self) -> TimeDelta {
        ttl_delta(self.config.cache_ttl)
    }

    // Callers hold the state lock, so the task cannot clear `in_flight` before
    // the handle is stored.
    fn start_fetch(&self) -> InFlightFetch {
        let config = Arc::clone(&self.config);
        let source = Arc::clone(&self.source);
        let clock = Arc::clone(&self.clock);
        let state = Arc::clone(&self.state);

        info!("Fetching latest release of {} from {}", config.slug(), source.name());

        let task = tokio::spawn(async move {
            let outcome = fetch_latest_release(source.as_ref(), &config)
                .await
                .map(Arc::new);

            let mut state = lock(&state);
            state.in_flight = None;
            match &outcome {
                Ok(snapshot) => {
                    info!("Cached release {} of {}", snapshot.version, config.slug());
                    state.snapshot = Some(Arc::clone(snapshot));
                    state.fetched_at = Some(clock.now());
                }
                Err(error) => warn!("Release refresh for {} failed: {error}", config.slug()),
            }
            outcome
        });

        task.map(|joined| {
            joined.unwrap_or_else(|error| {
                Err(FetchError::from(UpstreamError::request_from(
                    "refresh release cache",
                    error,
                )))
            })
        })
        .boxed()
        .shared()
    }
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn ttl_delta(ttl: Duration) -> TimeDelta {
    TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX)
}
