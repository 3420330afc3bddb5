//! Mock tracking store for testing
//!
//! Keeps entries in memory and counts operations, so predicate tests can
//! assert on side effects without a cluster.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use super::{TrackingIdentity, TrackingStore};
use crate::error::{FilterError, Result};
use crate::fingerprint::Fingerprint;

/// In-memory tracking store
#[derive(Clone, Default)]
pub struct MockTrackingStore {
    /// Storage: identity -> fingerprint -> value
    store: Arc<RwLock<HashMap<TrackingIdentity, BTreeMap<Fingerprint, String>>>>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<OperationCounts>>,
    /// Every delete call, in order
    deleted: Arc<RwLock<Vec<(Fingerprint, TrackingIdentity)>>>,
    /// Make every delete fail after recording it
    fail_deletes: bool,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub puts: usize,
    pub deletes: usize,
}

impl MockTrackingStore {
    /// Create a new empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose deletes always fail
    pub fn failing() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Delete calls received so far
    pub fn deleted(&self) -> Vec<(Fingerprint, TrackingIdentity)> {
        self.deleted.read().unwrap().clone()
    }

    /// Count entries under an identity
    pub fn entry_count(&self, identity: &TrackingIdentity) -> usize {
        self.store
            .read()
            .unwrap()
            .get(identity)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl TrackingStore for MockTrackingStore {
    async fn get_entry(&self, key: Fingerprint, identity: &TrackingIdentity) -> Result<String> {
        self.operations.write().unwrap().gets += 1;

        let store = self.store.read().unwrap();
        store
            .get(identity)
            .and_then(|entries| entries.get(&key))
            .cloned()
            .ok_or_else(|| FilterError::EntryNotFound {
                key: key.to_string(),
                namespace: identity.namespace.clone(),
                name: identity.name.clone(),
            })
    }

    async fn put_entry(
        &self,
        key: Fingerprint,
        value: &str,
        identity: &TrackingIdentity,
    ) -> Result<()> {
        self.operations.write().unwrap().puts += 1;

        let mut store = self.store.write().unwrap();
        store
            .entry(identity.clone())
            .or_default()
            .insert(key, value.to_string());
        Ok(())
    }

    async fn delete_entry(&self, key: Fingerprint, identity: &TrackingIdentity) -> Result<()> {
        self.operations.write().unwrap().deletes += 1;
        self.deleted.write().unwrap().push((key, identity.clone()));

        if self.fail_deletes {
            return Err(FilterError::Storage(format!(
                "simulated failure deleting {} from {}",
                key, identity
            )));
        }

        let mut store = self.store.write().unwrap();
        if let Some(entries) = store.get_mut(identity) {
            entries.remove(&key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> TrackingIdentity {
        TrackingIdentity::new("sro", "special-resource-lifecycle")
    }

    #[tokio::test]
    async fn test_mock_put_get_delete() {
        let store = MockTrackingStore::new();
        let key = Fingerprint::of("sro", "driver-abc");

        store.put_entry(key, "Pod", &identity()).await.unwrap();
        assert_eq!(store.get_entry(key, &identity()).await.unwrap(), "Pod");
        assert_eq!(store.entry_count(&identity()), 1);

        store.delete_entry(key, &identity()).await.unwrap();
        assert!(store.get_entry(key, &identity()).await.unwrap_err().is_not_found());

        let counts = store.operation_counts();
        assert_eq!(counts.puts, 1);
        assert_eq!(counts.gets, 2);
        assert_eq!(counts.deletes, 1);
    }

    #[tokio::test]
    async fn test_mock_delete_absent_entry() {
        let store = MockTrackingStore::new();
        let key = Fingerprint::of("sro", "never-tracked");

        store.delete_entry(key, &identity()).await.unwrap();
        assert_eq!(store.deleted(), vec![(key, identity())]);
    }

    #[tokio::test]
    async fn test_mock_failing_deletes_are_recorded() {
        let store = MockTrackingStore::failing();
        let key = Fingerprint::of("ns", "foo");

        let err = store.delete_entry(key, &identity()).await.unwrap_err();
        assert!(matches!(err, FilterError::Storage(_)));
        assert_eq!(store.operation_counts().deletes, 1);
    }

    #[tokio::test]
    async fn test_mock_clones_share_state() {
        let store = MockTrackingStore::new();
        let clone = store.clone();
        let key = Fingerprint::of("sro", "driver-abc");

        clone.put_entry(key, "Pod", &identity()).await.unwrap();
        assert_eq!(store.entry_count(&identity()), 1);
    }
}
