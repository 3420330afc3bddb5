//! Lifecycle tracking store
//!
//! The controller keeps a record of dependents it has to recreate, keyed by
//! their [`Fingerprint`]. The filter only removes entries for deleted
//! dependents; the lifecycle collaborator adds them.
//!
//! - **ConfigMap** (default): one ConfigMap in the operator namespace
//! - **Mock**: in-memory, for tests

mod configmap;
mod mock;

pub use configmap::ConfigMapStore;
pub use mock::{MockTrackingStore, OperationCounts};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::FilterConfig;
use crate::error::{FilterError, Result};
use crate::fingerprint::Fingerprint;

/// Location of a tracking record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingIdentity {
    pub namespace: String,
    pub name: String,
}

impl TrackingIdentity {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Resolve the tracking record, reading the namespace from the
    /// environment at call time
    pub fn from_env(config: &FilterConfig) -> Result<Self> {
        let namespace = std::env::var(&config.namespace_env)
            .ok()
            .filter(|ns| !ns.is_empty())
            .ok_or_else(|| FilterError::MissingEnv(config.namespace_env.clone()))?;

        Ok(Self::new(namespace, config.tracking_name.clone()))
    }
}

impl fmt::Display for TrackingIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Keyed storage for lifecycle entries
///
/// Implementations must be Send + Sync; the predicate calls them from
/// spawned tasks.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Get the value tracked under a key
    async fn get_entry(&self, key: Fingerprint, identity: &TrackingIdentity) -> Result<String>;

    /// Insert or overwrite an entry
    async fn put_entry(
        &self,
        key: Fingerprint,
        value: &str,
        identity: &TrackingIdentity,
    ) -> Result<()>;

    /// Remove an entry; removing an absent entry succeeds
    async fn delete_entry(&self, key: Fingerprint, identity: &TrackingIdentity) -> Result<()>;

    /// Check if an entry exists
    async fn contains(&self, key: Fingerprint, identity: &TrackingIdentity) -> Result<bool> {
        match self.get_entry(key, identity).await {
            Ok(_) => Ok(true),
            Err(FilterError::EntryNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Labels applied to tracking records created by the store
#[must_use = "labels should be applied to resources"]
pub fn tracking_labels() -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        "special-resource-operator".to_string(),
    );
    labels.insert(
        "app.kubernetes.io/component".to_string(),
        "lifecycle".to_string(),
    );
    labels
}
