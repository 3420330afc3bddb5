//! Read-only accessor layer over cluster objects
//!
//! The filter never needs more than metadata, the kind an object claims
//! through its own type metadata, and the kind of the Rust value (or watch)
//! that carried it. [`ClusterObject`] exposes exactly that for typed
//! `k8s-openapi` resources, bare [`DynamicObject`]s and [`WatchedObject`]s.

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Pod, Secret, Service, ServiceAccount};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::api::DynamicObject;
use kube::discovery::ApiResource;
use std::collections::BTreeMap;

use crate::kinds::KnownKind;

/// Metadata view of an observed object
pub trait ClusterObject: Send + Sync {
    /// Object metadata
    fn metadata(&self) -> &ObjectMeta;

    /// Kind recorded in the object's own type metadata, if any
    fn gvk_kind(&self) -> Option<&str>;

    /// Kind of the type descriptor the object arrived as.
    ///
    /// Set for typed resources and watched objects even when the payload
    /// itself carries no type metadata.
    fn type_name(&self) -> Option<&str>;

    /// JSON rendering of the whole object, empty if it cannot be rendered
    fn dump(&self) -> String;

    /// Owned unstructured copy, handed to collaborators
    fn snapshot(&self) -> Option<DynamicObject>;

    /// Type descriptor resolved against the known kinds
    fn type_kind(&self) -> Option<KnownKind> {
        self.type_name().and_then(KnownKind::from_name)
    }

    fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    fn namespace(&self) -> &str {
        self.metadata().namespace.as_deref().unwrap_or_default()
    }

    fn self_link(&self) -> &str {
        self.metadata().self_link.as_deref().unwrap_or_default()
    }

    fn generation(&self) -> Option<i64> {
        self.metadata().generation
    }

    fn resource_version(&self) -> Option<&str> {
        self.metadata().resource_version.as_deref()
    }

    fn labels(&self) -> Option<&BTreeMap<String, String>> {
        self.metadata().labels.as_ref()
    }

    fn owner_references(&self) -> &[OwnerReference] {
        self.metadata().owner_references.as_deref().unwrap_or_default()
    }

    /// Human-readable type for log fields
    fn display_type(&self) -> &str {
        self.type_name()
            .or_else(|| self.gvk_kind())
            .unwrap_or("unstructured")
    }
}

macro_rules! typed_cluster_object {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ClusterObject for $ty {
                fn metadata(&self) -> &ObjectMeta {
                    &self.metadata
                }

                fn gvk_kind(&self) -> Option<&str> {
                    Some(<$ty as k8s_openapi::Resource>::KIND)
                }

                fn type_name(&self) -> Option<&str> {
                    Some(<$ty as k8s_openapi::Resource>::KIND)
                }

                fn dump(&self) -> String {
                    serde_json::to_string(self).unwrap_or_default()
                }

                fn snapshot(&self) -> Option<DynamicObject> {
                    serde_json::to_value(self)
                        .and_then(serde_json::from_value)
                        .ok()
                }
            }
        )*
    };
}

typed_cluster_object!(
    Pod,
    ConfigMap,
    Secret,
    Service,
    ServiceAccount,
    Namespace,
    DaemonSet,
    Deployment,
    StatefulSet,
    Job,
);

impl ClusterObject for DynamicObject {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn gvk_kind(&self) -> Option<&str> {
        self.types
            .as_ref()
            .map(|t| t.kind.as_str())
            .filter(|kind| !kind.is_empty())
    }

    fn type_name(&self) -> Option<&str> {
        None
    }

    fn dump(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn snapshot(&self) -> Option<DynamicObject> {
        Some(self.clone())
    }
}

/// Unstructured object paired with the API resource it was watched through
///
/// Newly submitted objects may lack type metadata; the watch still knows
/// what it is watching.
#[derive(Debug, Clone)]
pub struct WatchedObject {
    pub object: DynamicObject,
    pub resource: ApiResource,
}

impl WatchedObject {
    pub fn new(object: DynamicObject, resource: ApiResource) -> Self {
        Self { object, resource }
    }
}

impl ClusterObject for WatchedObject {
    fn metadata(&self) -> &ObjectMeta {
        &self.object.metadata
    }

    fn gvk_kind(&self) -> Option<&str> {
        self.object.gvk_kind()
    }

    fn type_name(&self) -> Option<&str> {
        Some(self.resource.kind.as_str()).filter(|kind| !kind.is_empty())
    }

    fn dump(&self) -> String {
        self.object.dump()
    }

    fn snapshot(&self) -> Option<DynamicObject> {
        Some(self.object.clone())
    }
}
