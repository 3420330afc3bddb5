//! DaemonSet pod remediation
//!
//! Every pod currently selected by an updated DaemonSet is written to the
//! tracking store under its fingerprint.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::Client;
use kube::api::{Api, DynamicObject, ListParams};
use std::sync::Arc;

use super::WorkloadLifecycle;
use crate::config::FilterConfig;
use crate::error::{FilterError, Result};
use crate::fingerprint::Fingerprint;
use crate::kinds::KnownKind;
use crate::object::ClusterObject;
use crate::storage::{TrackingIdentity, TrackingStore};

/// Records the pods of updated DaemonSets in the tracking store
pub struct DaemonSetPodLifecycle {
    client: Client,
    store: Arc<dyn TrackingStore>,
    config: FilterConfig,
}

impl DaemonSetPodLifecycle {
    pub fn new(client: Client, store: Arc<dyn TrackingStore>, config: FilterConfig) -> Self {
        Self {
            client,
            store,
            config,
        }
    }
}

/// Label selector matching the pods of a workload (`spec.selector.matchLabels`)
pub fn pod_selector(workload: &DynamicObject) -> Result<String> {
    let match_labels = workload
        .data
        .pointer("/spec/selector/matchLabels")
        .and_then(|labels| labels.as_object())
        .filter(|labels| !labels.is_empty())
        .ok_or_else(|| {
            FilterError::Lifecycle(format!(
                "workload '{}' has no spec.selector.matchLabels",
                workload.name()
            ))
        })?;

    let mut selector = Vec::with_capacity(match_labels.len());
    for (key, value) in match_labels {
        let value = value.as_str().ok_or_else(|| {
            FilterError::Lifecycle(format!(
                "selector label '{}' of workload '{}' is not a string",
                key,
                workload.name()
            ))
        })?;
        selector.push(format!("{}={}", key, value));
    }
    Ok(selector.join(","))
}

#[async_trait]
impl WorkloadLifecycle for DaemonSetPodLifecycle {
    async fn on_workload_updated(&self, workload: DynamicObject) -> Result<()> {
        if workload.gvk_kind() != Some(KnownKind::DaemonSet.name()) {
            return Err(FilterError::Lifecycle(format!(
                "expected a DaemonSet, got {}",
                workload.display_type()
            )));
        }

        let selector = pod_selector(&workload)?;
        let identity = TrackingIdentity::from_env(&self.config)?;

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), workload.namespace());
        let pods = pods.list(&ListParams::default().labels(&selector)).await?;

        for pod in &pods.items {
            let key = Fingerprint::of(pod.namespace(), pod.name());
            self.store
                .put_entry(key, KnownKind::Pod.name(), &identity)
                .await?;
        }

        tracing::info!(
            daemonset = workload.name(),
            namespace = workload.namespace(),
            pods = pods.items.len(),
            tracking = %identity,
            "recorded daemonset pods for recreation"
        );
        Ok(())
    }
}
