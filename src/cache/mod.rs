//! In-memory TTL cache of scan results.
//!
//! Entries are checked for staleness on read and swept periodically by a
//! background task when a tokio runtime is available. A zero TTL disables the
//! cache: reads always miss and writes are dropped.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::debug;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_CACHE_DURATION;
use crate::scanner::ScanResult;

/// A cached result and the moment it was stored.
#[derive(Debug, Clone)]
struct CacheEntry {
    result: ScanResult,
    inserted: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted.elapsed() < ttl
    }
}

#[derive(Debug)]
struct CacheState {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl CacheState {
    fn purge_expired(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(ttl));
        before - self.entries.len()
    }
}

/// TTL-keyed store mapping a domain to its most recent scan result.
///
/// Results are replaced wholesale on every `set`, so readers never see a
/// partially updated result.
#[derive(Debug)]
pub struct ResultCache {
    state: Arc<RwLock<CacheState>>,
    shutdown: CancellationToken,
}

impl ResultCache {
    /// Creates a cache whose entries live for `ttl`.
    ///
    /// When called inside a tokio runtime, a sweeper task is started that
    /// drops expired entries once per TTL period. The task ends when the
    /// cache is dropped or [`close`](Self::close) is called.
    pub fn new(ttl: Duration) -> Self {
        let state = Arc::new(RwLock::new(CacheState {
            ttl,
            entries: HashMap::new(),
        }));
        let shutdown = CancellationToken::new();

        if tokio::runtime::Handle::try_current().is_ok() {
            spawn_sweeper(Arc::downgrade(&state), shutdown.clone());
        } else {
            debug!("No tokio runtime, cache entries expire on read only");
        }

        Self { state, shutdown }
    }

    /// Returns the cached result for `domain` if it is still fresh.
    pub async fn get(&self, domain: &str) -> Option<ScanResult> {
        let state = self.state.read().await;
        if state.ttl.is_zero() {
            return None;
        }
        state
            .entries
            .get(domain)
            .filter(|entry| entry.is_fresh(state.ttl))
            .map(|entry| entry.result.clone())
    }

    /// Stores `result` under `domain`, replacing any previous entry.
    ///
    /// Does nothing once the cache is closed.
    pub async fn set(&self, domain: &str, result: ScanResult) {
        let mut state = self.state.write().await;
        if state.ttl.is_zero() || self.is_closed() {
            return;
        }
        state.entries.insert(
            domain.to_string(),
            CacheEntry {
                result,
                inserted: Instant::now(),
            },
        );
    }

    /// Removes every entry.
    pub async fn flush(&self) {
        self.state.write().await.entries.clear();
    }

    /// Changes the TTL. Setting it to zero disables the cache and drops
    /// everything stored.
    pub async fn set_ttl(&self, ttl: Duration) {
        let mut state = self.state.write().await;
        state.ttl = ttl;
        if ttl.is_zero() {
            state.entries.clear();
        }
    }

    pub async fn ttl(&self) -> Duration {
        self.state.read().await.ttl
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stops the sweeper and flushes the cache. Later writes are dropped.
    pub async fn close(&self) {
        self.shutdown.cancel();
        self.flush().await;
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for ResultCache {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn spawn_sweeper(state: Weak<RwLock<CacheState>>, shutdown: CancellationToken) {
    tokio::spawn(async move {
        loop {
            let period = match state.upgrade() {
                Some(state) => state.read().await.ttl,
                None => break,
            };
            let period = if period.is_zero() {
                DEFAULT_CACHE_DURATION
            } else {
                period
            };

            tokio::select! {
                _ = tokio::time::sleep(period) => {
                    let Some(state) = state.upgrade() else {
                        break;
                    };
                    let purged = state.write().await.purge_expired();
                    if purged > 0 {
                        debug!("Cache sweep removed {purged} expired entries");
                    }
                }
                _ = shutdown.cancelled() => {
                    break;
                }
            }
        }
    });
}
