//! Mock lifecycle collaborator for testing

use async_trait::async_trait;
use kube::api::DynamicObject;
use std::sync::{Arc, RwLock};

use super::WorkloadLifecycle;
use crate::error::{FilterError, Result};

/// Records every workload it is called with
#[derive(Clone, Default)]
pub struct MockLifecycle {
    calls: Arc<RwLock<Vec<DynamicObject>>>,
    fail: bool,
}

impl MockLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collaborator that fails every call after recording it
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Workloads received so far
    pub fn calls(&self) -> Vec<DynamicObject> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl WorkloadLifecycle for MockLifecycle {
    async fn on_workload_updated(&self, workload: DynamicObject) -> Result<()> {
        let name = workload.metadata.name.clone().unwrap_or_default();
        self.calls.write().unwrap().push(workload);

        if self.fail {
            return Err(FilterError::Lifecycle(format!(
                "simulated failure remediating '{}'",
                name
            )));
        }
        Ok(())
    }
}
