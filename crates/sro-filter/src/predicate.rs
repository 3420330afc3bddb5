//! Event predicate
//!
//! Entry points called by the watch dispatch layer, one per event kind.
//! Each returns whether the managing composite resource must be reconciled.
//!
//! Update events carry the suppression rules; they fire for every status
//! write and would otherwise cause reconcile storms:
//!
//! 1. unchanged `metadata.generation` (status-only write): suppress
//! 2. unchanged `metadata.resourceVersion`: suppress. The controller resets
//!    the revision of some objects after a no-op rewrite (Deployments,
//!    SCCs) to mark them unchanged despite a generation bump.
//! 3. otherwise reconcile composite and owned objects
//!
//! Both rules run before classification, so a composite resource's own
//! status updates never trigger a reconcile through this path.
//!
//! Deletes of owned objects and updates of owned DaemonSets trigger side
//! effects on the tracking store and lifecycle collaborator. These are
//! spawned on a tokio runtime and never awaited by the caller; their
//! failures are logged and never change a decision.

use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::Instrument;

use crate::classify::{is_composite, is_owned};
use crate::config::FilterConfig;
use crate::error::{FilterError, Result};
use crate::fingerprint::Fingerprint;
use crate::kinds::KnownKind;
use crate::lifecycle::WorkloadLifecycle;
use crate::object::ClusterObject;
use crate::storage::{TrackingIdentity, TrackingStore};

/// Kind of watch event, used as log context only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Create,
    Update,
    Delete,
    Generic,
}

impl EventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Generic => "GENERIC",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An observed event with its object snapshot(s)
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectEvent<K> {
    Create(K),
    Update { old: K, new: K },
    Delete(K),
    Generic(K),
}

impl<K> ObjectEvent<K> {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Create(_) => EventKind::Create,
            Self::Update { .. } => EventKind::Update,
            Self::Delete(_) => EventKind::Delete,
            Self::Generic(_) => EventKind::Generic,
        }
    }

    /// The current object (the new one for updates)
    pub fn object(&self) -> &K {
        match self {
            Self::Create(obj) | Self::Delete(obj) | Self::Generic(obj) => obj,
            Self::Update { new, .. } => new,
        }
    }
}

/// Decides which events reconcile the composite resource
///
/// Stateless; clones share the collaborators and the runtime.
#[derive(Clone)]
pub struct EventPredicate {
    config: Arc<FilterConfig>,
    store: Arc<dyn TrackingStore>,
    lifecycle: Arc<dyn WorkloadLifecycle>,
    runtime: Handle,
}

impl EventPredicate {
    /// Create a predicate spawning side effects on the current tokio runtime.
    ///
    /// Outside a runtime, side effects go to a shared background runtime
    /// started on first use.
    pub fn new(
        config: FilterConfig,
        store: Arc<dyn TrackingStore>,
        lifecycle: Arc<dyn WorkloadLifecycle>,
    ) -> Result<Self> {
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => background_runtime()?,
        };
        Ok(Self::with_runtime(config, store, lifecycle, runtime))
    }

    /// Create a predicate spawning side effects on the given runtime
    pub fn with_runtime(
        config: FilterConfig,
        store: Arc<dyn TrackingStore>,
        lifecycle: Arc<dyn WorkloadLifecycle>,
        runtime: Handle,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            lifecycle,
            runtime,
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Route an event to its entry point
    pub fn evaluate<K: ClusterObject>(&self, event: &ObjectEvent<K>) -> bool {
        match event {
            ObjectEvent::Create(obj) => self.create(obj),
            ObjectEvent::Update { old, new } => self.update(old, new),
            ObjectEvent::Delete(obj) => self.delete(obj),
            ObjectEvent::Generic(obj) => self.generic(obj),
        }
    }

    pub fn create(&self, obj: &dyn ClusterObject) -> bool {
        let _span = event_span(EventKind::Create, obj).entered();
        self.is_relevant(obj)
    }

    pub fn generic(&self, obj: &dyn ClusterObject) -> bool {
        let _span = event_span(EventKind::Generic, obj).entered();
        self.is_relevant(obj)
    }

    /// Deleted dependents are recreated by the reconciler; their tracking
    /// entries are dropped first.
    pub fn delete(&self, obj: &dyn ClusterObject) -> bool {
        let _span = event_span(EventKind::Delete, obj).entered();

        if is_composite(obj, &self.config) {
            return true;
        }
        if !is_owned(obj, &self.config) {
            return false;
        }

        self.forget_tracking(obj);
        true
    }

    pub fn update(&self, old: &dyn ClusterObject, new: &dyn ClusterObject) -> bool {
        let _span = event_span(EventKind::Update, new).entered();

        if old.generation() == new.generation() {
            tracing::trace!(generation = ?new.generation(), "generation unchanged");
            return false;
        }
        if old.resource_version() == new.resource_version() {
            tracing::trace!(
                resource_version = ?new.resource_version(),
                "resource version unchanged"
            );
            return false;
        }

        if is_composite(new, &self.config) {
            tracing::debug!("composite resource generation changed");
            return true;
        }
        if !is_owned(new, &self.config) {
            return false;
        }

        tracing::debug!("owned object generation changed");
        if new
            .type_kind()
            .is_some_and(KnownKind::needs_pod_remediation)
        {
            self.remediate(new);
        }
        true
    }

    fn is_relevant(&self, obj: &dyn ClusterObject) -> bool {
        is_composite(obj, &self.config) || is_owned(obj, &self.config)
    }

    fn forget_tracking(&self, obj: &dyn ClusterObject) {
        let identity = match TrackingIdentity::from_env(&self.config) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "skipping tracking removal");
                return;
            }
        };
        let key = Fingerprint::of(obj.namespace(), obj.name());
        let store = Arc::clone(&self.store);

        self.dispatch("tracking removal", async move {
            store.delete_entry(key, &identity).await
        });
    }

    fn remediate(&self, obj: &dyn ClusterObject) {
        let Some(workload) = obj.snapshot() else {
            tracing::warn!("cannot snapshot workload, skipping remediation");
            return;
        };
        let lifecycle = Arc::clone(&self.lifecycle);

        self.dispatch("workload remediation", async move {
            lifecycle.on_workload_updated(workload).await
        });
    }

    /// Spawn a side effect without gating the decision on it.
    ///
    /// Errors and panics end up in the log.
    fn dispatch<F>(&self, effect: &'static str, side_effect: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let task = async move {
            match AssertUnwindSafe(side_effect).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(effect, error = %e, "side effect failed"),
                Err(_) => tracing::warn!(effect, "side effect panicked"),
            }
        }
        .instrument(tracing::Span::current());

        self.runtime.spawn(task);
    }
}

/// Shared runtime for predicates built outside of one
fn background_runtime() -> Result<Handle> {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();

    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime.handle().clone());
    }
    let runtime = Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("sro-filter-effects")
        .enable_all()
        .build()
        .map_err(|e| {
            FilterError::Runtime(format!("failed to start background runtime: {}", e))
        })?;

    // A concurrent caller may have won the race; its runtime is kept
    Ok(RUNTIME.get_or_init(|| runtime).handle().clone())
}

fn event_span(kind: EventKind, obj: &dyn ClusterObject) -> tracing::Span {
    tracing::debug_span!(
        "predicate",
        event = %kind,
        name = obj.name(),
        namespace = obj.namespace(),
        kind = obj.display_type()
    )
}
