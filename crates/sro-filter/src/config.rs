//! Filter configuration and well-known names
//!
//! Defaults match the SpecialResource operator. Every field can be
//! overridden from YAML, so the same engine can front a renamed CRD.

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};

/// Well-known labels
pub mod labels {
    /// Ownership marker stamped on every managed object
    pub const OWNED: &str = "specialresource.openshift.io/owned";
    /// Value written for the ownership marker
    pub const OWNED_VALUE: &str = "true";
}

/// Environment variables read at call time
pub mod env {
    /// Namespace the operator (and its tracking ConfigMap) lives in
    pub const OPERATOR_NAMESPACE: &str = "OPERATOR_NAMESPACE";
}

/// Kind name of the composite resource
pub const COMPOSITE_KIND: &str = "SpecialResource";

/// Self-link path fragment of the composite API group
pub const SELF_LINK_FRAGMENT: &str = "/apis/sro.openshift.io/v";

/// API group fragment looked up in untyped payloads
pub const API_GROUP_FRAGMENT: &str = "sro.openshift.io/v";

/// Name of the ConfigMap tracking lifecycle entries
pub const TRACKING_NAME: &str = "special-resource-lifecycle";

/// Filter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterConfig {
    /// Kind of the composite resource
    pub composite_kind: String,

    /// Label key marking owned objects (only key presence is checked)
    pub owned_label: String,

    /// Fragment matched against an object's self link
    pub self_link_fragment: String,

    /// Fragment matched against the dump of an untyped object
    pub api_group_fragment: String,

    /// Name of the tracking record
    pub tracking_name: String,

    /// Environment variable holding the tracking record's namespace
    pub namespace_env: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            composite_kind: COMPOSITE_KIND.to_string(),
            owned_label: labels::OWNED.to_string(),
            self_link_fragment: SELF_LINK_FRAGMENT.to_string(),
            api_group_fragment: API_GROUP_FRAGMENT.to_string(),
            tracking_name: TRACKING_NAME.to_string(),
            namespace_env: env::OPERATOR_NAMESPACE.to_string(),
        }
    }
}

impl FilterConfig {
    /// Parse a (possibly partial) YAML document on top of the defaults
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty names; an empty fragment would match every object
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("compositeKind", &self.composite_kind),
            ("ownedLabel", &self.owned_label),
            ("selfLinkFragment", &self.self_link_fragment),
            ("apiGroupFragment", &self.api_group_fragment),
            ("trackingName", &self.tracking_name),
            ("namespaceEnv", &self.namespace_env),
        ];

        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(FilterError::InvalidConfig(format!(
                    "'{}' must not be empty",
                    field
                )));
            }
        }
        Ok(())
    }
}
