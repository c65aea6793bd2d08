//! Constraint catalog cache.
//!
//! Holds one catalog built from the schema source, reuses it until it is
//! older than the TTL, then rebuilds it. Rebuilds are single-flight: callers
//! that find the entry stale while another caller is already rebuilding wait
//! for that rebuild and reuse its result, including its failure.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::catalog::ConstraintCatalog;
use crate::error::{Error, Result};
use crate::source::SchemaSource;

/// Default catalog time-to-live (one hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(3_600_000);

/// A built catalog and when it was built.
#[derive(Debug)]
struct CacheEntry {
    catalog: Arc<ConstraintCatalog>,
    built_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.built_at.elapsed() < ttl
    }
}

/// Cache statistics.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    refreshes: AtomicU64,
    failures: AtomicU64,
}

impl CacheStats {
    /// Get hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(AtomicOrdering::Relaxed)
    }

    /// Get miss count (stale or empty on lookup).
    pub fn misses(&self) -> u64 {
        self.misses.load(AtomicOrdering::Relaxed)
    }

    /// Get count of successful rebuilds.
    pub fn refreshes(&self) -> u64 {
        self.refreshes.load(AtomicOrdering::Relaxed)
    }

    /// Get count of failed rebuilds.
    pub fn failures(&self) -> u64 {
        self.failures.load(AtomicOrdering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

/// Outcome of the most recent rebuild. Guarded by the refresh mutex.
#[derive(Debug, Default)]
struct RefreshState {
    last_failure: Option<Error>,
}

/// TTL cache over a [`SchemaSource`].
///
/// Thread-safe. Fresh lookups only take a shared read lock; a rebuilt catalog
/// is swapped in whole, so readers never see a partial catalog.
pub struct ConstraintCache {
    source: Arc<dyn SchemaSource>,
    ttl: Duration,
    current: RwLock<Option<Arc<CacheEntry>>>,
    refresh_lock: Mutex<RefreshState>,
    /// Completed rebuild attempts, bumped under `refresh_lock`.
    attempts: AtomicU64,
    stats: CacheStats,
}

impl ConstraintCache {
    /// Create a cache with the default TTL.
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self::with_ttl(source, DEFAULT_CACHE_TTL)
    }

    /// Create a cache with a specific TTL.
    pub fn with_ttl(source: Arc<dyn SchemaSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(RefreshState::default()),
            attempts: AtomicU64::new(0),
            stats: CacheStats::default(),
        }
    }

    /// Get the current catalog, rebuilding it if missing or expired.
    ///
    /// A failed rebuild is returned as an error; the expired catalog is not
    /// used as a fallback. Callers that waited on a rebuild which failed get
    /// that failure rather than starting another one.
    pub fn get(&self) -> Result<Arc<ConstraintCatalog>> {
        let attempts_seen = self.attempts.load(AtomicOrdering::Acquire);
        let observed = self.current.read().clone();

        if let Some(entry) = &observed {
            if entry.is_fresh(self.ttl) {
                self.stats.hits.fetch_add(1, AtomicOrdering::Relaxed);
                return Ok(Arc::clone(&entry.catalog));
            }
        }

        self.stats.misses.fetch_add(1, AtomicOrdering::Relaxed);
        debug!(
            cached = observed.is_some(),
            "constraint catalog missing or expired"
        );

        let mut state = self.refresh_lock.lock();

        // Another caller may have installed a new entry while we waited.
        let current = self.current.read().clone();
        if let Some(entry) = current {
            let replaced = match &observed {
                Some(seen) => !Arc::ptr_eq(seen, &entry),
                None => true,
            };
            if replaced || entry.is_fresh(self.ttl) {
                return Ok(Arc::clone(&entry.catalog));
            }
        }

        // Or tried and failed.
        if self.attempts.load(AtomicOrdering::Acquire) != attempts_seen {
            if let Some(err) = &state.last_failure {
                return Err(err.clone());
            }
        }

        self.refresh_locked(&mut state)
    }

    /// Rebuild the catalog now, regardless of age.
    pub fn refresh(&self) -> Result<Arc<ConstraintCatalog>> {
        let mut state = self.refresh_lock.lock();
        self.refresh_locked(&mut state)
    }

    /// Drop the current entry so the next lookup rebuilds.
    pub fn invalidate(&self) {
        let _guard = self.refresh_lock.lock();
        *self.current.write() = None;
        debug!("constraint catalog invalidated");
    }

    /// Check if a catalog is cached and within its TTL.
    pub fn is_fresh(&self) -> bool {
        self.current
            .read()
            .as_ref()
            .is_some_and(|entry| entry.is_fresh(self.ttl))
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Rebuild and install. Caller must hold `refresh_lock`.
    fn refresh_locked(&self, state: &mut RefreshState) -> Result<Arc<ConstraintCatalog>> {
        let started = Instant::now();
        let loaded = self.load();
        self.attempts.fetch_add(1, AtomicOrdering::Release);

        let catalog = match loaded {
            Ok(catalog) => Arc::new(catalog),
            Err(e) => {
                self.stats.failures.fetch_add(1, AtomicOrdering::Relaxed);
                warn!(error = %e, "failed to rebuild constraint catalog");
                state.last_failure = Some(e.clone());
                return Err(e);
            }
        };
        state.last_failure = None;

        let entry = Arc::new(CacheEntry {
            catalog: Arc::clone(&catalog),
            built_at: Instant::now(),
        });
        *self.current.write() = Some(entry);
        self.stats.refreshes.fetch_add(1, AtomicOrdering::Relaxed);

        info!(
            tables = catalog.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "constraint catalog refreshed"
        );

        Ok(catalog)
    }

    fn load(&self) -> Result<ConstraintCatalog> {
        let document = self.source.fetch_document().map_err(Error::unavailable)?;
        ConstraintCatalog::build(document.columns, document.checks, document.uniques)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CheckRow, ColumnRow, UniqueRow};
    use crate::error::SourceError;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::Barrier;
    use std::thread;

    /// Source that counts rebuilds and can be slowed down or failed.
    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicUsize,
        delay: Duration,
        failing: AtomicBool,
    }

    impl CountingSource {
        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Default::default()
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(AtomicOrdering::SeqCst)
        }
    }

    impl SchemaSource for CountingSource {
        fn fetch_column_constraints(&self) -> std::result::Result<Vec<ColumnRow>, SourceError> {
            self.fetches.fetch_add(1, AtomicOrdering::SeqCst);
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            if self.failing.load(AtomicOrdering::SeqCst) {
                return Err(SourceError::backend("connection refused"));
            }
            Ok(vec![ColumnRow::new("leads", "email", "text", false)])
        }

        fn fetch_check_constraints(&self) -> std::result::Result<Vec<CheckRow>, SourceError> {
            Ok(vec![])
        }

        fn fetch_unique_constraints(&self) -> std::result::Result<Vec<UniqueRow>, SourceError> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_reads_within_ttl_hit_source_once() {
        let source = Arc::new(CountingSource::default());
        let cache = ConstraintCache::new(source.clone());

        let first = cache.get().unwrap();
        for _ in 0..10 {
            let again = cache.get().unwrap();
            assert!(Arc::ptr_eq(&first, &again));
        }

        assert_eq!(source.fetches(), 1);
        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().hits(), 10);
        assert_eq!(cache.stats().refreshes(), 1);
        assert!(cache.is_fresh());
    }

    #[test]
    fn test_expired_entry_is_rebuilt() {
        let source = Arc::new(CountingSource::default());
        let cache = ConstraintCache::with_ttl(source.clone(), Duration::from_millis(20));

        let first = cache.get().unwrap();
        thread::sleep(Duration::from_millis(40));
        assert!(!cache.is_fresh());

        let second = cache.get().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetches(), 2);
    }

    #[test]
    fn test_concurrent_expiry_single_refresh() {
        let source = Arc::new(CountingSource::with_delay(Duration::from_millis(50)));
        let cache = Arc::new(ConstraintCache::with_ttl(
            source.clone(),
            Duration::from_millis(500),
        ));

        cache.get().unwrap();
        assert_eq!(source.fetches(), 1);
        thread::sleep(Duration::from_millis(600));

        let callers = 16;
        let barrier = Arc::new(Barrier::new(callers));
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get().unwrap()
                })
            })
            .collect();

        let catalogs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(source.fetches(), 2);
        assert!(catalogs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_concurrent_failure_single_refresh() {
        let source = Arc::new(CountingSource::with_delay(Duration::from_millis(200)));
        source.failing.store(true, AtomicOrdering::SeqCst);
        let cache = Arc::new(ConstraintCache::new(source.clone()));

        let callers = 8;
        let barrier = Arc::new(Barrier::new(callers));
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get()
                })
            })
            .collect();

        let started = Instant::now();
        for handle in handles {
            assert!(handle.join().unwrap().unwrap_err().is_unavailable());
        }

        assert_eq!(source.fetches(), 1);
        assert_eq!(cache.stats().failures(), 1);
        assert!(started.elapsed() < Duration::from_millis(800));

        // A later lookup that did not wait on the failed rebuild retries.
        source.failing.store(false, AtomicOrdering::SeqCst);
        assert!(cache.get().is_ok());
        assert_eq!(source.fetches(), 2);
    }

    #[test]
    fn test_concurrent_cold_start_single_refresh() {
        let source = Arc::new(CountingSource::with_delay(Duration::from_millis(50)));
        let cache = Arc::new(ConstraintCache::new(source.clone()));

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| cache.get().unwrap());
            }
        });

        assert_eq!(source.fetches(), 1);
    }

    #[test]
    fn test_failure_propagates_without_stale_fallback() {
        let source = Arc::new(CountingSource::default());
        let cache = ConstraintCache::with_ttl(source.clone(), Duration::from_millis(20));

        cache.get().unwrap();
        thread::sleep(Duration::from_millis(40));

        source.failing.store(true, AtomicOrdering::SeqCst);
        let err = cache.get().unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(cache.stats().failures(), 1);

        // The next lookup retries rather than serving the expired catalog.
        assert!(cache.get().is_err());
        assert_eq!(source.fetches(), 3);

        source.failing.store(false, AtomicOrdering::SeqCst);
        assert!(cache.get().is_ok());
        assert_eq!(source.fetches(), 4);
    }

    #[test]
    fn test_invalidate_and_refresh() {
        let source = Arc::new(CountingSource::default());
        let cache = ConstraintCache::new(source.clone());

        cache.get().unwrap();
        cache.invalidate();
        assert!(!cache.is_fresh());
        cache.get().unwrap();
        assert_eq!(source.fetches(), 2);

        cache.refresh().unwrap();
        assert_eq!(source.fetches(), 3);
        assert_eq!(cache.stats().refreshes(), 3);
    }

    #[test]
    fn test_default_ttl_is_one_hour() {
        let cache = ConstraintCache::new(Arc::new(CountingSource::default()));
        assert_eq!(cache.ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_hit_rate() {
        let cache = ConstraintCache::new(Arc::new(CountingSource::default()));
        assert_eq!(cache.stats().hit_rate(), 0.0);

        cache.get().unwrap();
        cache.get().unwrap();
        cache.get().unwrap();

        // 2 hits / 3 lookups
        assert!((cache.stats().hit_rate() - 0.666).abs() < 0.01);
    }
}
