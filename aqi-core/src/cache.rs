//! In-memory reading cache.
//!
//! Keyed by `(slug, token)`. A fresh entry is served without touching the
//! network, and at most one fetch per key runs at a time: callers arriving
//! while a fetch is in flight wait for it and share its outcome.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use tracing::debug;

use crate::{
    error::FetchError, location::Location, model::AirQualityReading,
    provider::AirQualityProvider,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    slug: String,
    token: String,
}

impl CacheKey {
    fn new(location: &Location, token: &str) -> Self {
        Self {
            slug: location.slug().to_owned(),
            token: token.to_owned(),
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    reading: Option<(Arc<AirQualityReading>, Instant)>,
    error: Option<Arc<FetchError>>,
    /// Number of fetches that ran to completion, successful or not.
    completed: u64,
}

/// Marks a key as loading until dropped, so a cancelled fetch clears the flag.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct KeyState {
    /// Held for the duration of a fetch.
    gate: tokio::sync::Mutex<()>,
    in_flight: AtomicBool,
    slot: Mutex<Slot>,
}

impl KeyState {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fresh(&self, ttl: Duration) -> Option<Arc<AirQualityReading>> {
        self.slot()
            .reading
            .as_ref()
            .filter(|(_, fetched_at)| fetched_at.elapsed() < ttl)
            .map(|(reading, _)| Arc::clone(reading))
    }

    /// Outcome of a fetch that finished after `seen` was sampled, if any.
    fn settled_since(
        &self,
        seen: u64,
    ) -> Option<Result<Arc<AirQualityReading>, Arc<FetchError>>> {
        let slot = self.slot();
        if slot.completed == seen {
            return None;
        }

        match &slot.error {
            Some(err) => Some(Err(Arc::clone(err))),
            None => slot.reading.as_ref().map(|(reading, _)| Ok(Arc::clone(reading))),
        }
    }
}

/// What a presenter needs to draw: last good data, last error, and whether a
/// refresh is running. `data` may be stale while `is_loading` is set.
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    pub data: Option<Arc<AirQualityReading>>,
    pub error: Option<Arc<FetchError>>,
    pub is_loading: bool,
}

#[derive(Debug)]
pub struct ReadingCache {
    provider: Arc<dyn AirQualityProvider>,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Arc<KeyState>>>,
}

impl ReadingCache {
    pub fn new(provider: Arc<dyn AirQualityProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn key_state(&self, key: CacheKey) -> Arc<KeyState> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(key).or_default())
    }

    /// Return a fresh reading, fetching it if the cached one is missing or stale.
    #[tracing::instrument(name = "cached_fetch", level = "debug", skip(self, token))]
    pub async fn get(
        &self,
        location: &Location,
        token: &str,
    ) -> Result<Arc<AirQualityReading>, Arc<FetchError>> {
        let state = self.key_state(CacheKey::new(location, token));

        if let Some(reading) = state.fresh(self.ttl) {
            debug!("serving cached reading");
            return Ok(reading);
        }

        let seen = state.slot().completed;
        let _gate = state.gate.lock().await;

        // A fetch that finished while we queued is our answer, even a failed one.
        if let Some(outcome) = state.settled_since(seen) {
            debug!("reusing outcome of concurrent fetch");
            return outcome;
        }

        let result = {
            let _loading = InFlight::start(&state.in_flight);
            self.provider.fetch(location, token).await
        };

        let mut slot = state.slot();
        slot.completed += 1;
        match result {
            Ok(reading) => {
                let reading = Arc::new(reading);
                slot.reading = Some((Arc::clone(&reading), Instant::now()));
                slot.error = None;
                Ok(reading)
            }
            Err(err) => {
                let err = Arc::new(err);
                slot.error = Some(Arc::clone(&err));
                Err(err)
            }
        }
    }

    /// Snapshot for a key without waiting on any in-flight fetch.
    pub fn state(&self, location: &Location, token: &str) -> FetchState {
        let state = self.key_state(CacheKey::new(location, token));
        let is_loading = state.in_flight.load(Ordering::SeqCst);
        let slot = state.slot();

        FetchState {
            data: slot.reading.as_ref().map(|(reading, _)| Arc::clone(reading)),
            error: slot.error.clone(),
            is_loading,
        }
    }

    /// Drop the cached entry so the next `get` refetches.
    pub fn invalidate(&self, location: &Location, token: &str) {
        let state = self.key_state(CacheKey::new(location, token));
        state.slot().reading = None;
    }
}
