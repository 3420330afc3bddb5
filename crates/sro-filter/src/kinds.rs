//! Recognised object kinds
//!
//! A closed set of kinds the filter reasons about. Type descriptors are
//! resolved through [`KINDS`] instead of inspecting runtime type names.

use phf::phf_map;
use std::fmt;

/// Kinds with a meaning for the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownKind {
    /// The composite resource
    SpecialResource,
    DaemonSet,
    Deployment,
    StatefulSet,
    /// OpenShift build producing driver container images
    BuildConfig,
    Pod,
    ConfigMap,
    Secret,
    Service,
    ServiceAccount,
    Job,
    Namespace,
}

/// Canonical name -> kind
static KINDS: phf::Map<&'static str, KnownKind> = phf_map! {
    "SpecialResource" => KnownKind::SpecialResource,
    "DaemonSet" => KnownKind::DaemonSet,
    "Deployment" => KnownKind::Deployment,
    "StatefulSet" => KnownKind::StatefulSet,
    "BuildConfig" => KnownKind::BuildConfig,
    "Pod" => KnownKind::Pod,
    "ConfigMap" => KnownKind::ConfigMap,
    "Secret" => KnownKind::Secret,
    "Service" => KnownKind::Service,
    "ServiceAccount" => KnownKind::ServiceAccount,
    "Job" => KnownKind::Job,
    "Namespace" => KnownKind::Namespace,
};

impl KnownKind {
    /// Resolve a kind from its canonical name (case-sensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        KINDS.get(name).copied()
    }

    /// Canonical kind name
    pub const fn name(self) -> &'static str {
        match self {
            Self::SpecialResource => "SpecialResource",
            Self::DaemonSet => "DaemonSet",
            Self::Deployment => "Deployment",
            Self::StatefulSet => "StatefulSet",
            Self::BuildConfig => "BuildConfig",
            Self::Pod => "Pod",
            Self::ConfigMap => "ConfigMap",
            Self::Secret => "Secret",
            Self::Service => "Service",
            Self::ServiceAccount => "ServiceAccount",
            Self::Job => "Job",
            Self::Namespace => "Namespace",
        }
    }

    /// Workloads embedding a pod template at `spec.template`
    pub const fn carries_pod_template(self) -> bool {
        matches!(self, Self::DaemonSet | Self::Deployment | Self::StatefulSet)
    }

    /// Workloads whose pods must be recreated when the template changes
    pub const fn needs_pod_remediation(self) -> bool {
        matches!(self, Self::DaemonSet)
    }
}

impl fmt::Display for KnownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
