use crate::client::ControllerApi;
use crate::error::{ControllerError, Result};
use k8s_openapi::api::core::v1::ReplicationController;
use magnetar_core::ControllerKey;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Delay between replica-count update attempts
pub const STATUS_UPDATE_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Total window within which replica-count update attempts are made
pub const STATUS_UPDATE_RETRY_TIMEOUT: Duration = Duration::from_millis(100);

/// Converge the controller's `status.replicas` to `desired` under optimistic
/// concurrency.
///
/// Returns immediately without touching the API when the known observed
/// count already matches. Otherwise submits an update; a rejected write is
/// retried after re-fetching the controller for a fresh resource version,
/// until the retry window closes. On timeout the last observed API error is
/// returned. `controller` may hold a more recent version of the object when
/// this returns.
pub async fn update_replica_count(
    client: &dyn ControllerApi,
    controller: &mut ReplicationController,
    desired: i32,
) -> Result<()> {
    let key = ControllerKey::from_controller(controller)?;
    let deadline = Instant::now() + STATUS_UPDATE_RETRY_TIMEOUT;

    loop {
        let observed = controller
            .status
            .as_ref()
            .map(|status| status.replicas)
            .unwrap_or(0);
        if observed == desired {
            return Ok(());
        }

        debug!(
            "Updating replica count for controller {}: {} -> {}",
            key, observed, desired
        );
        controller
            .status
            .get_or_insert_with(Default::default)
            .replicas = desired;

        let err = match client.update_controller(controller).await {
            Ok(updated) => {
                *controller = updated;
                return Ok(());
            }
            Err(err) => err,
        };
        debug!(
            "Controller {} failed to update replica count: {}",
            key, err
        );

        // Pick up the latest resource version for the next attempt; a failed
        // refetch keeps the stale copy.
        if let Ok(fresh) = client.get_controller(&key.namespace, &key.name).await {
            *controller = fresh;
        }

        if Instant::now() + STATUS_UPDATE_RETRY_INTERVAL >= deadline {
            warn!(
                "Controller {} gave up updating replica count to {}: {}",
                key, desired, err
            );
            return Err(ControllerError::replica_count_update(key.key(), err));
        }
        sleep(STATUS_UPDATE_RETRY_INTERVAL).await;
    }
}
