//! Magnetar Core - Fundamental types for the Magnetar controller manager
//!
//! This crate provides:
//! - Error types with miette diagnostics
//! - Controller identity keys
//! - The event-recording seam
//! - Serialization helpers

pub mod error;
pub mod events;
pub mod types;

// Re-export commonly used types
pub use error::{MagnetarError, Result};
pub use events::{EventRecorder, TracingEventRecorder, FAILED_CREATE, SUCCESSFUL_CREATE};
pub use types::{is_valid_name, ControllerKey, DEFAULT_NAMESPACE};

// Re-export k8s-openapi types for convenience
pub use k8s_openapi;
pub use k8s_openapi::api::core::v1::{Pod, ReplicationController};
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Serialize a resource to JSON
pub fn to_json<T: serde::Serialize>(resource: &T) -> Result<String> {
    serde_json::to_string(resource).map_err(|e| {
        MagnetarError::serialization_error(
            format!("Failed to serialize to JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a resource from JSON
pub fn from_json<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| {
        MagnetarError::serialization_error(
            format!("Failed to deserialize from JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}
