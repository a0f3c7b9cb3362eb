use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, ReplicationController};
use magnetar_core::Result;

/// Capability trait for pod operations against the external object API.
///
/// The production implementation is bound to the real object store; tests
/// substitute `MockCluster`. Only the two operations the reconciliation core
/// needs are modeled here.
#[async_trait]
pub trait PodApi: Send + Sync {
    /// Submit a pod create request. The server fills in the generated name
    /// and resource version and returns the stored object.
    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<Pod>;

    /// Delete the pod with the given name.
    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()>;
}

/// Capability trait for replication controller operations against the
/// external object API.
///
/// `update_controller` enforces optimistic concurrency: a write carrying a
/// stale `metadata.resource_version` must be rejected with a conflict error.
#[async_trait]
pub trait ControllerApi: Send + Sync {
    /// Fetch the current state of a controller.
    async fn get_controller(&self, namespace: &str, name: &str) -> Result<ReplicationController>;

    /// Submit a controller update, returning the stored object with its new
    /// resource version.
    async fn update_controller(
        &self,
        controller: &ReplicationController,
    ) -> Result<ReplicationController>;
}
