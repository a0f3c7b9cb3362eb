use magnetar_core::MagnetarError;
use miette::Diagnostic;
use thiserror::Error;

/// Error type for reconciliation-support operations
#[derive(Error, Debug, Diagnostic)]
pub enum ControllerError {
    /// Pod template missing or unconvertible
    #[error("Pod template for controller '{controller}' is unusable: {reason}")]
    #[diagnostic(
        code(magnetar::controller::invalid_pod_template),
        help("Populate spec.template (including its pod spec) on the controller")
    )]
    InvalidPodTemplate {
        #[allow(unused)]
        controller: String,
        #[allow(unused)]
        reason: String,
    },

    /// Neither the dashed prefix nor the bare controller name is usable as a pod name
    #[error("Controller '{controller}' cannot generate a usable pod name")]
    #[diagnostic(
        code(magnetar::controller::unusable_name),
        help("Controller names must be DNS-1123 subdomains short enough to leave room for the generated suffix")
    )]
    UnusableName {
        #[allow(unused)]
        controller: String,
    },

    /// The pod built from the template would carry no labels
    #[error("Refusing to create a pod for controller '{controller}' with no labels")]
    #[diagnostic(
        code(magnetar::controller::missing_pod_labels),
        help("A label-less pod can never match a selector and would become unmanaged. Add labels to the pod template")
    )]
    MissingPodLabels {
        #[allow(unused)]
        controller: String,
    },

    /// Serializing the provenance reference failed
    #[error("Unable to serialize controller reference for '{controller}'")]
    #[diagnostic(
        code(magnetar::controller::controller_reference),
        help("The owning controller could not be rendered into the created-by annotation")
    )]
    ControllerReference {
        #[allow(unused)]
        controller: String,
        #[source]
        source: MagnetarError,
    },

    /// The object API rejected a pod create request
    #[error("Unable to create pod replica for controller '{controller}'")]
    #[diagnostic(
        code(magnetar::controller::create_failed),
        help("The object API rejected the create request; the controller stays un-synced and will retry on the next pass")
    )]
    CreateFailed {
        #[allow(unused)]
        controller: String,
        #[source]
        source: MagnetarError,
    },

    /// The replica-count update did not land within the retry window
    #[error("Failed to update replica count for controller '{controller}'")]
    #[diagnostic(
        code(magnetar::controller::replica_count_update),
        help("The last update attempt before the retry window closed is attached as the source")
    )]
    ReplicaCountUpdate {
        #[allow(unused)]
        controller: String,
        #[source]
        source: MagnetarError,
    },

    /// The expectation store could not be read
    #[error("Expectation store read failed: {message}")]
    #[diagnostic(
        code(magnetar::controller::expectation_store),
        help("Readers fail open: the affected controller is treated as needing a sync")
    )]
    ExpectationStore {
        #[allow(unused)]
        message: String,
    },

    /// Core library error
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] MagnetarError),
}

/// Result type alias for reconciliation-support operations
pub type Result<T> = std::result::Result<T, ControllerError>;

impl ControllerError {
    /// Create an InvalidPodTemplate error
    pub fn invalid_pod_template(controller: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPodTemplate {
            controller: controller.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnusableName error
    pub fn unusable_name(controller: impl Into<String>) -> Self {
        Self::UnusableName {
            controller: controller.into(),
        }
    }

    /// Create a MissingPodLabels error
    pub fn missing_pod_labels(controller: impl Into<String>) -> Self {
        Self::MissingPodLabels {
            controller: controller.into(),
        }
    }

    /// Create a ControllerReference error
    pub fn controller_reference(controller: impl Into<String>, source: MagnetarError) -> Self {
        Self::ControllerReference {
            controller: controller.into(),
            source,
        }
    }

    /// Create a CreateFailed error
    pub fn create_failed(controller: impl Into<String>, source: MagnetarError) -> Self {
        Self::CreateFailed {
            controller: controller.into(),
            source,
        }
    }

    /// Create a ReplicaCountUpdate error
    pub fn replica_count_update(controller: impl Into<String>, source: MagnetarError) -> Self {
        Self::ReplicaCountUpdate {
            controller: controller.into(),
            source,
        }
    }

    /// Create an ExpectationStore error
    pub fn expectation_store(message: impl Into<String>) -> Self {
        Self::ExpectationStore {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ControllerError::missing_pod_labels("default/frontend");
        assert!(matches!(err, ControllerError::MissingPodLabels { .. }));

        let err = ControllerError::create_failed(
            "default/frontend",
            MagnetarError::internal_error("boom"),
        );
        assert!(matches!(err, ControllerError::CreateFailed { .. }));
    }

    #[test]
    fn test_core_error_passthrough() {
        let err: ControllerError = MagnetarError::resource_not_found("default/pod-1").into();
        assert!(matches!(
            err,
            ControllerError::Core(MagnetarError::ResourceNotFound { .. })
        ));
    }
}
