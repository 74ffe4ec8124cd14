//! Operation Coordinator Module
//!
//! The cache-aside protocol: the single place where the cache and the
//! backing store are reconciled.

use std::sync::Arc;

use tracing::{error, warn};

use crate::cache::{RecencyCache, StatsCounters};
use crate::error::{KvError, Result};
use crate::store::Store;

// == Operation ==
/// One decoded client request, handed over by the transport and consumed
/// exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Get { key: String },
    Put { key: String, value: String },
    Delete { key: String },
}

// == Operation Outcome ==
/// Terminal result of a successful operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// A GET found a value
    Value(String),
    /// A PUT or DELETE was acknowledged
    Done,
}

// == Operation Coordinator ==
/// Executes operations against the cache and the store, cache-aside style.
///
/// Consistency policy, in order of precedence:
/// - writes go to the store first; the cache is only updated after the store
///   acknowledged, so the cache never holds a value the store rejected;
/// - reads populate the cache lazily on a miss, and only with values the
///   store actually returned;
/// - a failed store delete leaves the cache untouched, so a stale value may
///   be served until it is evicted or overwritten.
///
/// No lock is held across a store call: two concurrent PUTs to the same key
/// may leave the cache reflecting either write. Store calls run
/// synchronously on the worker handling the request.
pub struct OperationCoordinator {
    cache: Arc<RecencyCache>,
    store: Arc<dyn Store>,
    stats: Arc<StatsCounters>,
}

impl OperationCoordinator {
    // == Constructor ==
    pub fn new(
        cache: Arc<RecencyCache>,
        store: Arc<dyn Store>,
        stats: Arc<StatsCounters>,
    ) -> Self {
        Self {
            cache,
            store,
            stats,
        }
    }

    // == Execute ==
    /// Runs one decoded operation to its terminal result.
    pub fn execute(&self, operation: Operation) -> Result<OperationOutcome> {
        match operation {
            Operation::Get { key } => self.get(&key).map(OperationOutcome::Value),
            Operation::Put { key, value } => self.put(key, value).map(|_| OperationOutcome::Done),
            Operation::Delete { key } => self.delete(&key).map(|_| OperationOutcome::Done),
        }
    }

    // == Get ==
    /// Cache first; on a miss the store is consulted and a found value is
    /// cached before returning, so the next read of this key hits.
    pub fn get(&self, key: &str) -> Result<String> {
        self.stats.record_request();

        if let Some(value) = self.cache.get(key) {
            self.stats.record_hit();
            return Ok(value);
        }
        self.stats.record_miss();

        match self.store.get(key) {
            Ok(Some(value)) => {
                self.cache.put(key.to_string(), value.clone());
                Ok(value)
            }
            Ok(None) => Err(KvError::NotFound(key.to_string())),
            Err(err) => {
                // The store's read contract is found/not-found; a failed
                // read is final for this request and must not populate the
                // cache.
                warn!("Store read failed for key '{}': {}", key, err);
                Err(KvError::NotFound(key.to_string()))
            }
        }
    }

    // == Put ==
    /// Store first, cache second. A store failure leaves the cache
    /// untouched: the cache never holds a value the store does not.
    pub fn put(&self, key: String, value: String) -> Result<()> {
        self.stats.record_request();

        if let Err(source) = self.store.put(&key, &value) {
            error!("Store write failed for key '{}': {}", key, source);
            return Err(KvError::StoreWrite { key, source });
        }

        self.cache.put(key, value);
        Ok(())
    }

    // == Delete ==
    /// Store first, cache second; deleting an absent key succeeds. On a
    /// store failure the cached value is kept — preferable to dropping the
    /// delete signal silently.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.stats.record_request();

        if let Err(source) = self.store.delete(key) {
            error!("Store delete failed for key '{}': {}", key, source);
            return Err(KvError::StoreDelete {
                key: key.to_string(),
                source,
            });
        }

        self.cache.delete(key);
        Ok(())
    }

    // == Accessors ==
    pub fn cache(&self) -> &RecencyCache {
        &self.cache
    }

    pub fn stats(&self) -> &StatsCounters {
        &self.stats
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    /// Store wrapper whose writes and deletes can be switched to fail.
    #[derive(Default)]
    struct FaultyStore {
        inner: MemoryStore,
        fail_puts: AtomicBool,
        fail_deletes: AtomicBool,
        fail_gets: AtomicBool,
    }

    impl Store for FaultyStore {
        fn put(&self, key: &str, value: &str) -> std::result::Result<(), StoreError> {
            if self.fail_puts.load(Ordering::Relaxed) {
                return Err(StoreError::Unavailable("injected put failure".to_string()));
            }
            self.inner.put(key, value)
        }

        fn get(&self, key: &str) -> std::result::Result<Option<String>, StoreError> {
            if self.fail_gets.load(Ordering::Relaxed) {
                return Err(StoreError::Unavailable("injected get failure".to_string()));
            }
            self.inner.get(key)
        }

        fn delete(&self, key: &str) -> std::result::Result<(), StoreError> {
            if self.fail_deletes.load(Ordering::Relaxed) {
                return Err(StoreError::Unavailable(
                    "injected delete failure".to_string(),
                ));
            }
            self.inner.delete(key)
        }
    }

    fn coordinator_with(store: Arc<FaultyStore>) -> OperationCoordinator {
        OperationCoordinator::new(
            Arc::new(RecencyCache::new(4)),
            store,
            Arc::new(StatsCounters::new()),
        )
    }

    fn coordinator() -> (OperationCoordinator, Arc<FaultyStore>) {
        let store = Arc::new(FaultyStore::default());
        (coordinator_with(Arc::clone(&store)), store)
    }

    #[test]
    fn test_read_your_write() {
        let (coordinator, _) = coordinator();

        coordinator
            .put("key1".to_string(), "value1".to_string())
            .unwrap();
        assert_eq!(coordinator.get("key1").unwrap(), "value1");

        // The read after a successful write is a cache hit.
        assert_eq!(coordinator.stats().cache_hits(), 1);
        assert_eq!(coordinator.stats().cache_misses(), 0);
    }

    #[test]
    fn test_miss_populates_cache() {
        let (coordinator, store) = coordinator();
        store.inner.put("warm", "from_store").unwrap();

        // First read misses and falls through to the store.
        assert_eq!(coordinator.get("warm").unwrap(), "from_store");
        assert_eq!(coordinator.stats().cache_misses(), 1);
        assert_eq!(coordinator.stats().cache_hits(), 0);

        // Second read is served from the cache.
        assert_eq!(coordinator.get("warm").unwrap(), "from_store");
        assert_eq!(coordinator.stats().cache_hits(), 1);
        assert_eq!(coordinator.stats().cache_misses(), 1);
    }

    #[test]
    fn test_not_found_does_not_touch_cache() {
        let (coordinator, _) = coordinator();

        assert!(matches!(
            coordinator.get("missing"),
            Err(KvError::NotFound(_))
        ));
        assert_eq!(coordinator.cache().len(), 0);
        assert_eq!(coordinator.stats().cache_misses(), 1);
    }

    #[test]
    fn test_failed_put_leaves_cache_untouched() {
        let (coordinator, store) = coordinator();
        store.fail_puts.store(true, Ordering::Relaxed);

        let result = coordinator.put("key1".to_string(), "phantom".to_string());
        assert!(matches!(result, Err(KvError::StoreWrite { .. })));

        // The attempted value must not be observable anywhere: not in the
        // cache, and a read falls through to a store that never took it.
        assert_eq!(coordinator.cache().len(), 0);
        assert!(matches!(
            coordinator.get("key1"),
            Err(KvError::NotFound(_))
        ));
    }

    #[test]
    fn test_failed_put_preserves_previous_value() {
        let (coordinator, store) = coordinator();
        coordinator
            .put("key1".to_string(), "old".to_string())
            .unwrap();

        store.fail_puts.store(true, Ordering::Relaxed);
        assert!(coordinator
            .put("key1".to_string(), "new".to_string())
            .is_err());

        // The cache still serves the last acknowledged write.
        assert_eq!(coordinator.get("key1").unwrap(), "old");
    }

    #[test]
    fn test_failed_delete_leaves_cache_untouched() {
        let (coordinator, store) = coordinator();
        coordinator
            .put("key1".to_string(), "value1".to_string())
            .unwrap();

        store.fail_deletes.store(true, Ordering::Relaxed);
        let result = coordinator.delete("key1");
        assert!(matches!(result, Err(KvError::StoreDelete { .. })));

        // Accepted inconsistency window: the stale value is still served.
        assert_eq!(coordinator.get("key1").unwrap(), "value1");
    }

    #[test]
    fn test_delete_removes_from_both() {
        let (coordinator, store) = coordinator();
        coordinator
            .put("key1".to_string(), "value1".to_string())
            .unwrap();

        coordinator.delete("key1").unwrap();
        assert_eq!(coordinator.cache().len(), 0);
        assert_eq!(store.inner.get("key1").unwrap(), None);
        assert!(matches!(
            coordinator.get("key1"),
            Err(KvError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_absent_is_success() {
        let (coordinator, _) = coordinator();
        coordinator.delete("never_there").unwrap();
        coordinator.delete("never_there").unwrap();
        assert_eq!(coordinator.stats().total_requests(), 2);
    }

    #[test]
    fn test_store_read_failure_is_not_found_and_not_cached() {
        let (coordinator, store) = coordinator();
        store.inner.put("key1", "value1").unwrap();
        store.fail_gets.store(true, Ordering::Relaxed);

        assert!(matches!(
            coordinator.get("key1"),
            Err(KvError::NotFound(_))
        ));
        assert_eq!(coordinator.cache().len(), 0);
    }

    #[test]
    fn test_execute_maps_operations() {
        let (coordinator, _) = coordinator();

        let outcome = coordinator
            .execute(Operation::Put {
                key: "key1".to_string(),
                value: "value1".to_string(),
            })
            .unwrap();
        assert_eq!(outcome, OperationOutcome::Done);

        let outcome = coordinator
            .execute(Operation::Get {
                key: "key1".to_string(),
            })
            .unwrap();
        assert_eq!(outcome, OperationOutcome::Value("value1".to_string()));

        let outcome = coordinator
            .execute(Operation::Delete {
                key: "key1".to_string(),
            })
            .unwrap();
        assert_eq!(outcome, OperationOutcome::Done);
    }

    #[test]
    fn test_concurrent_stress_counts_every_operation() {
        const THREADS: usize = 8;
        const OPS_PER_THREAD: usize = 300;

        let cache = Arc::new(RecencyCache::new(8));
        let coordinator = Arc::new(OperationCoordinator::new(
            Arc::clone(&cache),
            Arc::new(MemoryStore::new()),
            Arc::new(StatsCounters::new()),
        ));

        let mut handles = Vec::new();
        for t in 0..THREADS {
            let coordinator = Arc::clone(&coordinator);
            handles.push(thread::spawn(move || {
                for i in 0..OPS_PER_THREAD {
                    let key = format!("key{}", (t * 7 + i) % 32);
                    let result = match i % 3 {
                        0 => coordinator.execute(Operation::Put {
                            key,
                            value: format!("v{}", i),
                        }),
                        1 => coordinator.execute(Operation::Get { key }),
                        _ => coordinator.execute(Operation::Delete { key }),
                    };
                    // NotFound is an expected outcome under random deletes.
                    if let Err(err) = result {
                        assert!(matches!(err, KvError::NotFound(_)));
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().expect("stress thread panicked");
        }

        assert_eq!(
            coordinator.stats().total_requests(),
            (THREADS * OPS_PER_THREAD) as u64
        );
        assert!(cache.len() <= cache.capacity());
    }
}
