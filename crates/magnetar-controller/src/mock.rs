use crate::client::{ControllerApi, PodApi};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, ReplicationController};
use magnetar_core::{ControllerKey, EventRecorder, MagnetarError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct ClusterState {
    pods: HashMap<String, Pod>,
    controllers: HashMap<String, ReplicationController>,
    next_version: u64,
    next_name: u64,
}

/// In-memory object API for testing the reconciliation core.
///
/// Maintains pods and controllers keyed by `namespace/name`, assigns
/// monotonically increasing resource versions, synthesizes names for
/// generate-name pods, and rejects stale-version controller updates with a
/// conflict. Call counters and failure injection let tests assert exactly
/// which requests were issued.
pub struct MockCluster {
    state: RwLock<ClusterState>,
    pod_create_calls: AtomicUsize,
    pod_delete_calls: AtomicUsize,
    controller_get_calls: AtomicUsize,
    controller_update_calls: AtomicUsize,
    fail_pod_creates: Mutex<Option<String>>,
    reject_updates: AtomicUsize,
}

impl MockCluster {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ClusterState::default()),
            pod_create_calls: AtomicUsize::new(0),
            pod_delete_calls: AtomicUsize::new(0),
            controller_get_calls: AtomicUsize::new(0),
            controller_update_calls: AtomicUsize::new(0),
            fail_pod_creates: Mutex::new(None),
            reject_updates: AtomicUsize::new(0),
        }
    }

    /// Seed a controller, assigning it a resource version if it has none.
    /// Returns the stored copy.
    pub async fn add_controller(
        &self,
        mut controller: ReplicationController,
    ) -> Result<ReplicationController> {
        let key = ControllerKey::from_controller(&controller)?;
        let mut state = self.state.write().await;
        if controller.metadata.resource_version.is_none() {
            state.next_version += 1;
            controller.metadata.resource_version = Some(state.next_version.to_string());
        }
        controller.metadata.namespace = Some(key.namespace.clone());
        state.controllers.insert(key.key(), controller.clone());
        Ok(controller)
    }

    /// Snapshot of all stored pods, in unspecified order.
    pub async fn pods(&self) -> Vec<Pod> {
        self.state.read().await.pods.values().cloned().collect()
    }

    /// Make every subsequent pod create request fail with the given message.
    pub fn fail_pod_creates(&self, message: impl Into<String>) {
        if let Ok(mut guard) = self.fail_pod_creates.lock() {
            *guard = Some(message.into());
        }
    }

    /// Reject the next `n` controller updates with a conflict, regardless of
    /// the submitted resource version.
    pub fn reject_updates(&self, n: usize) {
        self.reject_updates.store(n, Ordering::SeqCst);
    }

    pub fn pod_create_calls(&self) -> usize {
        self.pod_create_calls.load(Ordering::SeqCst)
    }

    pub fn pod_delete_calls(&self) -> usize {
        self.pod_delete_calls.load(Ordering::SeqCst)
    }

    pub fn controller_get_calls(&self) -> usize {
        self.controller_get_calls.load(Ordering::SeqCst)
    }

    pub fn controller_update_calls(&self) -> usize {
        self.controller_update_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCluster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PodApi for MockCluster {
    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<Pod> {
        self.pod_create_calls.fetch_add(1, Ordering::SeqCst);

        let injected = self
            .fail_pod_creates
            .lock()
            .ok()
            .and_then(|guard| guard.clone());
        if let Some(message) = injected {
            return Err(MagnetarError::internal_error(message));
        }

        let mut state = self.state.write().await;

        let name = match (&pod.metadata.name, &pod.metadata.generate_name) {
            (Some(name), _) => name.clone(),
            (None, Some(prefix)) => {
                state.next_name += 1;
                format!("{}{:05}", prefix, state.next_name)
            }
            (None, None) => return Err(MagnetarError::missing_field("metadata.name")),
        };

        let store_key = format!("{}/{}", namespace, name);
        if state.pods.contains_key(&store_key) {
            return Err(MagnetarError::resource_already_exists(store_key));
        }

        state.next_version += 1;
        let mut stored = pod.clone();
        stored.metadata.name = Some(name.clone());
        stored.metadata.namespace = Some(namespace.to_string());
        stored.metadata.resource_version = Some(state.next_version.to_string());
        state.pods.insert(store_key, stored.clone());
        debug!("Mock: pod created: {}/{}", namespace, name);
        Ok(stored)
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()> {
        self.pod_delete_calls.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.write().await;
        let store_key = format!("{}/{}", namespace, name);
        if state.pods.remove(&store_key).is_none() {
            return Err(MagnetarError::resource_not_found(store_key));
        }
        debug!("Mock: pod deleted: {}/{}", namespace, name);
        Ok(())
    }
}

#[async_trait]
impl ControllerApi for MockCluster {
    async fn get_controller(&self, namespace: &str, name: &str) -> Result<ReplicationController> {
        self.controller_get_calls.fetch_add(1, Ordering::SeqCst);

        let state = self.state.read().await;
        let store_key = format!("{}/{}", namespace, name);
        state
            .controllers
            .get(&store_key)
            .cloned()
            .ok_or_else(|| MagnetarError::resource_not_found(store_key))
    }

    async fn update_controller(
        &self,
        controller: &ReplicationController,
    ) -> Result<ReplicationController> {
        self.controller_update_calls.fetch_add(1, Ordering::SeqCst);

        let key = ControllerKey::from_controller(controller)?;
        let mut state = self.state.write().await;
        let current = state
            .controllers
            .get(&key.key())
            .ok_or_else(|| MagnetarError::resource_not_found(key.key()))?;

        let submitted_version = controller
            .metadata
            .resource_version
            .clone()
            .unwrap_or_default();
        let current_version = current.metadata.resource_version.clone().unwrap_or_default();

        let forced_conflict = self
            .reject_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced_conflict || submitted_version != current_version {
            return Err(MagnetarError::conflict(
                key.key(),
                submitted_version,
                current_version,
            ));
        }

        state.next_version += 1;
        let mut stored = controller.clone();
        stored.metadata.resource_version = Some(state.next_version.to_string());
        state.controllers.insert(key.key(), stored.clone());
        debug!("Mock: controller updated: {}", key);
        Ok(stored)
    }
}

/// Event sink that captures `(subject, reason, message)` tuples for
/// assertions.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<(String, String, String)>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in recording order.
    pub fn events(&self) -> Vec<(String, String, String)> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Just the recorded reasons, in recording order.
    pub fn reasons(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|(_, reason, _)| reason)
            .collect()
    }
}

impl EventRecorder for RecordingEvents {
    fn event(&self, subject: &ControllerKey, reason: &str, message: &str) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push((subject.to_string(), reason.to_string(), message.to_string()));
        }
    }
}
