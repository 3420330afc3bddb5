//! Ownership label propagation
//!
//! Used when the controller builds managed objects, not while filtering.
//! Workloads get the marker on their pod template too, so the pods they
//! spawn are recognised as owned.

use kube::api::DynamicObject;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::{FilterConfig, labels};
use crate::error::{FilterError, Result};
use crate::kinds::KnownKind;
use crate::object::ClusterObject;

/// JSON pointer to the pod template labels of a workload
const TEMPLATE_LABELS: &str = "/spec/template/metadata/labels";

/// Stamp the ownership marker on an object and its pod template.
///
/// Errors from the template path are fatal (see [`FilterError::is_fatal`]).
pub fn mark_owned(obj: &mut DynamicObject, config: &FilterConfig) -> Result<()> {
    obj.metadata
        .labels
        .get_or_insert_with(BTreeMap::new)
        .insert(config.owned_label.clone(), labels::OWNED_VALUE.to_string());

    propagate_owned_label(obj, config)
}

/// Label-marking entry point for callers constructing managed objects
pub fn set_ownership_marker(obj: &mut DynamicObject, config: &FilterConfig) -> Result<()> {
    mark_owned(obj, config)
}

/// Copy the ownership marker into nested metadata that generates sub-objects
pub fn propagate_owned_label(obj: &mut DynamicObject, config: &FilterConfig) -> Result<()> {
    match obj.gvk_kind().and_then(KnownKind::from_name) {
        Some(kind) if kind.carries_pod_template() => set_template_label(obj, kind, config),
        Some(KnownKind::BuildConfig) => {
            // TODO: label the images and pods produced by a build once the
            // BuildConfig output.imageLabels contract is settled.
            tracing::info!(
                name = obj.name(),
                "ownership labels for builds and their pods are not propagated"
            );
            Ok(())
        }
        _ => Ok(()),
    }
}

fn set_template_label(
    obj: &mut DynamicObject,
    kind: KnownKind,
    config: &FilterConfig,
) -> Result<()> {
    let name = obj.name().to_string();

    let template_labels = obj
        .data
        .pointer_mut(TEMPLATE_LABELS)
        .filter(|value| !value.is_null())
        .ok_or_else(|| FilterError::TemplateLabelsMissing {
            kind: kind.to_string(),
            name: name.clone(),
        })?
        .as_object_mut()
        .ok_or_else(|| FilterError::InvalidTemplateLabels {
            kind: kind.to_string(),
            name,
        })?;

    template_labels.insert(
        config.owned_label.clone(),
        Value::String(labels::OWNED_VALUE.to_string()),
    );
    Ok(())
}
