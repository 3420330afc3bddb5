//! Error types for sro-filter

use thiserror::Error;

/// Result type for sro-filter operations
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors that can occur while filtering events or talking to collaborators
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FilterError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// A pod-template workload has no `spec.template.metadata.labels`
    #[error("{kind} '{name}' has no spec.template.metadata.labels")]
    TemplateLabelsMissing { kind: String, name: String },

    /// `spec.template.metadata.labels` exists but is not a string map
    #[error("{kind} '{name}' has malformed spec.template.metadata.labels")]
    InvalidTemplateLabels { kind: String, name: String },

    /// Required environment variable is not set
    #[error("environment variable '{0}' is not set")]
    MissingEnv(String),

    /// Tracking entry not found
    #[error("tracking entry '{key}' not found in {namespace}/{name}")]
    EntryNotFound {
        key: String,
        namespace: String,
        name: String,
    },

    /// Storage error
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Workload lifecycle remediation failed
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// No runtime available to run side effects on
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl From<serde_json::Error> for FilterError {
    fn from(e: serde_json::Error) -> Self {
        FilterError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for FilterError {
    fn from(e: serde_yaml::Error) -> Self {
        FilterError::Serialization(e.to_string())
    }
}

impl FilterError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, FilterError::Api(kube::Error::Api(resp)) if resp.code == 404)
            || matches!(self, FilterError::EntryNotFound { .. })
    }

    /// Check if this error signals a broken schema assumption.
    ///
    /// Fatal errors must abort the controller; they are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FilterError::TemplateLabelsMissing { .. } | FilterError::InvalidTemplateLabels { .. }
        )
    }
}
