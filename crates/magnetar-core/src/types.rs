use crate::error::{MagnetarError, Result};
use k8s_openapi::api::core::v1::ReplicationController;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace assumed when an object carries none
pub const DEFAULT_NAMESPACE: &str = "default";

/// ControllerKey uniquely identifies a replication controller instance.
///
/// The rendered form (`namespace/name`) is the key used by the expectation
/// store and carried through log and error context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerKey {
    /// Namespace the controller lives in
    pub namespace: String,
    /// Controller name
    pub name: String,
}

impl ControllerKey {
    /// Create a new ControllerKey
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Derive the key from a controller object.
    ///
    /// Fails if the object has no name. A missing namespace falls back to
    /// `default`.
    pub fn from_controller(controller: &ReplicationController) -> Result<Self> {
        let name = controller
            .metadata
            .name
            .as_ref()
            .ok_or_else(|| MagnetarError::missing_field("metadata.name"))?;
        let namespace = controller
            .metadata
            .namespace
            .as_deref()
            .unwrap_or(DEFAULT_NAMESPACE);
        Ok(Self::new(namespace, name))
    }

    /// Get the flat store key: `{namespace}/{name}`
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for ControllerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Check whether a name is a valid DNS-1123 subdomain.
///
/// Must be non-empty, at most 253 characters, contain only lowercase
/// alphanumerics, '-', or '.', and start and end with an alphanumeric.
pub fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 253 {
        return false;
    }

    let chars: Vec<char> = name.chars().collect();

    if !chars[0].is_ascii_lowercase() && !chars[0].is_ascii_digit() {
        return false;
    }

    if !chars[chars.len() - 1].is_ascii_lowercase() && !chars[chars.len() - 1].is_ascii_digit() {
        return false;
    }

    chars
        .iter()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '.')
}
