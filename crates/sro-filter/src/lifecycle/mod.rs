//! Workload lifecycle remediation
//!
//! When an owned workload's template changes, pods it already spawned keep
//! running the old template. The lifecycle collaborator records them so the
//! reconciler can recreate them.

mod daemonset;
mod mock;

pub use daemonset::{DaemonSetPodLifecycle, pod_selector};
pub use mock::MockLifecycle;

use async_trait::async_trait;
use kube::api::DynamicObject;

use crate::error::Result;

/// Callback invoked for owned workloads whose spec changed
#[async_trait]
pub trait WorkloadLifecycle: Send + Sync {
    /// Remediate pods of an updated workload
    async fn on_workload_updated(&self, workload: DynamicObject) -> Result<()>;
}
