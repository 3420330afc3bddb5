//! SRO Filter - event filtering for the SpecialResource controller
//!
//! This crate decides which cluster events make the controller reconcile a
//! `SpecialResource`:
//! - **Classification**: is an object a SpecialResource, or owned by one?
//! - **Predicate**: per-event-kind rules, including update suppression for
//!   status-only writes
//! - **Labels**: ownership markers for objects the controller creates
//! - **Tracking**: lifecycle bookkeeping for deleted and updated dependents
//! - **Watch**: adapter from `kube::runtime::watcher` streams
//!
//! ```no_run
//! use std::sync::Arc;
//! use k8s_openapi::api::core::v1::ConfigMap;
//! use sro_filter::{EventPredicate, FilterConfig, MockLifecycle, MockTrackingStore};
//!
//! # fn main() -> sro_filter::Result<()> {
//! let predicate = EventPredicate::new(
//!     FilterConfig::default(),
//!     Arc::new(MockTrackingStore::new()),
//!     Arc::new(MockLifecycle::new()),
//! )?;
//! let reconcile = predicate.create(&ConfigMap::default());
//! assert!(!reconcile);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod kinds;
pub mod labels;
pub mod lifecycle;
pub mod object;
pub mod predicate;
pub mod storage;
pub mod watch;

#[cfg(test)]
mod testing;

pub use classify::{COMPOSITE_TIERS, CompositeTier, is_composite, is_owned};
pub use config::FilterConfig;
pub use error::{FilterError, Result};
pub use fingerprint::Fingerprint;
pub use kinds::KnownKind;
pub use labels::{mark_owned, propagate_owned_label, set_ownership_marker};
pub use lifecycle::{DaemonSetPodLifecycle, MockLifecycle, WorkloadLifecycle};
pub use object::{ClusterObject, WatchedObject};
pub use predicate::{EventKind, EventPredicate, ObjectEvent};
pub use storage::{
    ConfigMapStore, MockTrackingStore, OperationCounts, TrackingIdentity, TrackingStore,
};
pub use watch::{EventTranslator, filter_events};
