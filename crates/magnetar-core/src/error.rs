// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Core error type for Magnetar operations
#[derive(Error, Debug, Diagnostic)]
pub enum MagnetarError {
    /// Resource not found
    #[error("Resource not found: {resource_key}")]
    #[diagnostic(
        code(magnetar::resource_not_found),
        help("Verify the resource name and namespace are correct")
    )]
    ResourceNotFound {
        #[allow(unused)]
        resource_key: String,
    },

    /// Resource already exists
    #[error("Resource already exists: {resource_key}")]
    #[diagnostic(
        code(magnetar::resource_already_exists),
        help("Delete the existing resource first, or use a different name")
    )]
    ResourceAlreadyExists {
        #[allow(unused)]
        resource_key: String,
    },

    /// Conflict detected (stale resource version)
    #[error("Conflict detected for resource {resource_key}")]
    #[diagnostic(
        code(magnetar::conflict),
        help("This resource was modified concurrently. Re-fetch it and retry with the latest resourceVersion")
    )]
    Conflict {
        #[allow(unused)]
        resource_key: String,
        #[allow(unused)]
        submitted_version: String,
        #[allow(unused)]
        current_version: String,
    },

    /// Required field missing from an object
    #[error("Missing required field: {field}")]
    #[diagnostic(
        code(magnetar::missing_field),
        help("Populate {field} on the object before handing it to the controller manager")
    )]
    MissingField {
        #[allow(unused)]
        field: String,
    },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(magnetar::serialization_error),
        help("Ensure the resource serializes to valid JSON")
    )]
    SerializationError {
        #[allow(unused)]
        message: String,
        #[source]
        #[allow(unused)]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal error
    #[error("Internal error: {message}")]
    #[diagnostic(
        code(magnetar::internal_error),
        help("This is likely a bug. Please report it with the full error details")
    )]
    InternalError {
        #[allow(unused)]
        message: String,
    },
}

/// Result type alias for Magnetar operations
pub type Result<T> = std::result::Result<T, MagnetarError>;

impl MagnetarError {
    /// Create a ResourceNotFound error
    pub fn resource_not_found(resource_key: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource_key: resource_key.into(),
        }
    }

    /// Create a ResourceAlreadyExists error
    pub fn resource_already_exists(resource_key: impl Into<String>) -> Self {
        Self::ResourceAlreadyExists {
            resource_key: resource_key.into(),
        }
    }

    /// Create a Conflict error
    pub fn conflict(
        resource_key: impl Into<String>,
        submitted_version: impl Into<String>,
        current_version: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            resource_key: resource_key.into(),
            submitted_version: submitted_version.into(),
            current_version: current_version.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }

    /// Create an InternalError
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// True if this error is an optimistic-concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// True if this error is a not-found
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = MagnetarError::resource_not_found("default/nginx");
        assert!(matches!(err, MagnetarError::ResourceNotFound { .. }));
        assert!(err.is_not_found());

        let err = MagnetarError::conflict("default/nginx", "4", "7");
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_missing_field_message() {
        let err = MagnetarError::missing_field("metadata.name");
        assert_eq!(err.to_string(), "Missing required field: metadata.name");
    }
}
