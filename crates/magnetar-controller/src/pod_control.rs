use crate::client::PodApi;
use crate::error::{ControllerError, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ObjectReference, Pod, PodSpec, PodTemplateSpec, ReplicationController};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use magnetar_core::{
    is_valid_name, to_json, ControllerKey, EventRecorder, FAILED_CREATE, SUCCESSFUL_CREATE,
};
use std::sync::Arc;
use tracing::debug;

/// Annotation carrying the serialized reference to the owning controller
pub const CREATED_BY_ANNOTATION: &str = "kubernetes.io/created-by";

// The server appends a 5-character suffix to generate-name pods; the prefix
// must leave room for it within the 253-character name limit.
const GENERATED_NAME_SUFFIX_LEN: usize = 5;
const MAX_GENERATED_NAME_PREFIX_LEN: usize = 253 - GENERATED_NAME_SUFFIX_LEN;

/// Capability to add or delete pods on behalf of a controller.
///
/// Implementations must be substitutable for testing without touching the
/// real object store.
#[async_trait]
pub trait PodControl: Send + Sync {
    /// Create one new replicated pod according to the controller's template.
    async fn create_replica(
        &self,
        namespace: &str,
        controller: &ReplicationController,
    ) -> Result<()>;

    /// Delete the pod identified by `pod_id`.
    async fn delete_pod(&self, namespace: &str, pod_id: &str) -> Result<()>;
}

/// Production implementation of `PodControl`, bound to the object API and an
/// event sink.
pub struct ApiPodControl {
    pods: Arc<dyn PodApi>,
    recorder: Arc<dyn EventRecorder>,
}

impl ApiPodControl {
    pub fn new(pods: Arc<dyn PodApi>, recorder: Arc<dyn EventRecorder>) -> Self {
        Self { pods, recorder }
    }
}

#[async_trait]
impl PodControl for ApiPodControl {
    async fn create_replica(
        &self,
        namespace: &str,
        controller: &ReplicationController,
    ) -> Result<()> {
        let key = ControllerKey::from_controller(controller)?;
        let pod = build_replica_pod(controller)?;

        match self.pods.create_pod(namespace, &pod).await {
            Ok(created) => {
                let pod_name = created.metadata.name.as_deref().unwrap_or_default();
                debug!("Controller {} created pod {}", key, pod_name);
                self.recorder
                    .event(&key, SUCCESSFUL_CREATE, &format!("Created pod: {}", pod_name));
                Ok(())
            }
            Err(err) => {
                self.recorder
                    .event(&key, FAILED_CREATE, &format!("Error creating: {}", err));
                Err(ControllerError::create_failed(key.key(), err))
            }
        }
    }

    async fn delete_pod(&self, namespace: &str, pod_id: &str) -> Result<()> {
        Ok(self.pods.delete_pod(namespace, pod_id).await?)
    }
}

/// Build the pod a controller would create, without issuing any request.
///
/// Labels are copied verbatim from the template; annotations are copied and
/// extended with the created-by reference; the generated name uses the
/// controller's name as a dashed prefix, falling back to the bare name when
/// the prefix fails validation. Fails without side effects if the reference
/// cannot be serialized, no usable name exists, the template has no pod spec,
/// or the resulting label set is empty.
pub fn build_replica_pod(controller: &ReplicationController) -> Result<Pod> {
    let key = ControllerKey::from_controller(controller)?;
    let template = controller
        .spec
        .as_ref()
        .and_then(|spec| spec.template.as_ref())
        .ok_or_else(|| {
            ControllerError::invalid_pod_template(key.key(), "controller has no pod template")
        })?;

    let template_meta = template.metadata.clone().unwrap_or_default();
    let labels = template_meta.labels.unwrap_or_default();
    let mut annotations = template_meta.annotations.unwrap_or_default();

    let created_by = controller_reference(controller, &key);
    let created_by_json =
        to_json(&created_by).map_err(|err| ControllerError::controller_reference(key.key(), err))?;
    annotations.insert(CREATED_BY_ANNOTATION.to_string(), created_by_json);

    // Use the dash (if the name isn't too long) to make the pod name a bit prettier.
    let mut prefix = format!("{}-", key.name);
    if !is_valid_generated_name_prefix(&prefix) {
        prefix = key.name.clone();
        if !is_valid_generated_name_prefix(&prefix) {
            return Err(ControllerError::unusable_name(key.key()));
        }
    }

    let spec = pod_spec_from_template(&key, template)?;

    // A label-less pod could never be matched by any selector and would
    // become unmanaged.
    if labels.is_empty() {
        return Err(ControllerError::missing_pod_labels(key.key()));
    }

    Ok(Pod {
        metadata: ObjectMeta {
            labels: Some(labels),
            annotations: Some(annotations),
            generate_name: Some(prefix),
            ..Default::default()
        },
        spec: Some(spec),
        ..Default::default()
    })
}

/// Convert the template's pod spec into the spec of the pod to create.
pub fn pod_spec_from_template(key: &ControllerKey, template: &PodTemplateSpec) -> Result<PodSpec> {
    template.spec.clone().ok_or_else(|| {
        ControllerError::invalid_pod_template(key.key(), "pod template has no spec")
    })
}

/// Check whether a prefix is usable as a pod's generated name.
///
/// The prefix with any trailing dash trimmed must be a valid DNS-1123
/// subdomain, and the untrimmed prefix must leave room for the generated
/// suffix.
pub fn is_valid_generated_name_prefix(prefix: &str) -> bool {
    if prefix.len() > MAX_GENERATED_NAME_PREFIX_LEN {
        return false;
    }
    let trimmed = prefix.trim_end_matches('-');
    !trimmed.is_empty() && is_valid_name(trimmed)
}

fn controller_reference(
    controller: &ReplicationController,
    key: &ControllerKey,
) -> ObjectReference {
    ObjectReference {
        api_version: Some("v1".to_string()),
        kind: Some("ReplicationController".to_string()),
        namespace: Some(key.namespace.clone()),
        name: Some(key.name.clone()),
        uid: controller.metadata.uid.clone(),
        resource_version: controller.metadata.resource_version.clone(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCluster, RecordingEvents};
    use k8s_openapi::api::core::v1::{Container, ReplicationControllerSpec};
    use magnetar_core::from_json;
    use std::collections::BTreeMap;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn controller_with_template(name: &str, template_labels: BTreeMap<String, String>) -> ReplicationController {
        let mut rc = ReplicationController::default();
        rc.metadata.name = Some(name.to_string());
        rc.metadata.namespace = Some("default".to_string());
        rc.metadata.uid = Some("uid-1234".to_string());
        rc.spec = Some(ReplicationControllerSpec {
            template: Some(PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(template_labels),
                    annotations: Some(labels(&[("team", "web")])),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "web".to_string(),
                        image: Some("nginx".to_string()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            }),
            ..Default::default()
        });
        rc
    }

    #[test]
    fn test_build_replica_pod_carries_template() {
        let rc = controller_with_template("frontend", labels(&[("app", "frontend")]));
        let pod = build_replica_pod(&rc).unwrap();

        assert_eq!(pod.metadata.generate_name.as_deref(), Some("frontend-"));
        assert_eq!(
            pod.metadata.labels.as_ref().unwrap().get("app"),
            Some(&"frontend".to_string())
        );

        let annotations = pod.metadata.annotations.as_ref().unwrap();
        assert_eq!(annotations.get("team"), Some(&"web".to_string()));

        let reference: ObjectReference =
            from_json(annotations.get(CREATED_BY_ANNOTATION).unwrap()).unwrap();
        assert_eq!(reference.kind.as_deref(), Some("ReplicationController"));
        assert_eq!(reference.name.as_deref(), Some("frontend"));
        assert_eq!(reference.namespace.as_deref(), Some("default"));
        assert_eq!(reference.uid.as_deref(), Some("uid-1234"));

        assert_eq!(pod.spec.as_ref().unwrap().containers[0].name, "web");
    }

    #[test]
    fn test_build_replica_pod_requires_template() {
        let mut rc = ReplicationController::default();
        rc.metadata.name = Some("frontend".to_string());
        let err = build_replica_pod(&rc).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidPodTemplate { .. }));
    }

    #[test]
    fn test_build_replica_pod_requires_template_spec() {
        let mut rc = controller_with_template("frontend", labels(&[("app", "frontend")]));
        rc.spec.as_mut().unwrap().template.as_mut().unwrap().spec = None;
        let err = build_replica_pod(&rc).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidPodTemplate { .. }));
    }

    #[test]
    fn test_build_replica_pod_rejects_empty_labels() {
        let rc = controller_with_template("frontend", BTreeMap::new());
        let err = build_replica_pod(&rc).unwrap_err();
        assert!(matches!(err, ControllerError::MissingPodLabels { .. }));
    }

    #[test]
    fn test_long_name_falls_back_to_bare_name() {
        let name = "a".repeat(248);
        let rc = controller_with_template(&name, labels(&[("app", "big")]));
        let pod = build_replica_pod(&rc).unwrap();
        // The dashed prefix would be 249 chars; the bare name still fits.
        assert_eq!(pod.metadata.generate_name.as_deref(), Some(name.as_str()));
    }

    #[test]
    fn test_unusable_name_errors() {
        let name = "a".repeat(253);
        let rc = controller_with_template(&name, labels(&[("app", "big")]));
        let err = build_replica_pod(&rc).unwrap_err();
        assert!(matches!(err, ControllerError::UnusableName { .. }));
    }

    #[test]
    fn test_generated_name_prefix_validation() {
        assert!(is_valid_generated_name_prefix("frontend-"));
        assert!(is_valid_generated_name_prefix("frontend"));
        assert!(!is_valid_generated_name_prefix("-"));
        assert!(!is_valid_generated_name_prefix("Frontend-"));
        assert!(!is_valid_generated_name_prefix(&format!("{}-", "a".repeat(248))));
    }

    #[tokio::test]
    async fn test_create_replica_submits_pod_and_records_event() {
        let cluster = Arc::new(MockCluster::new());
        let events = Arc::new(RecordingEvents::new());
        let control = ApiPodControl::new(cluster.clone(), events.clone());

        let rc = controller_with_template("frontend", labels(&[("app", "frontend")]));
        control.create_replica("default", &rc).await.unwrap();

        assert_eq!(cluster.pod_create_calls(), 1);
        let pods = cluster.pods().await;
        assert_eq!(pods.len(), 1);
        assert!(pods[0]
            .metadata
            .name
            .as_deref()
            .unwrap()
            .starts_with("frontend-"));
        assert_eq!(events.reasons(), vec![SUCCESSFUL_CREATE]);
    }

    #[tokio::test]
    async fn test_create_replica_construction_error_issues_no_request() {
        let cluster = Arc::new(MockCluster::new());
        let events = Arc::new(RecordingEvents::new());
        let control = ApiPodControl::new(cluster.clone(), events.clone());

        let rc = controller_with_template("frontend", BTreeMap::new());
        let err = control.create_replica("default", &rc).await.unwrap_err();

        assert!(matches!(err, ControllerError::MissingPodLabels { .. }));
        assert_eq!(cluster.pod_create_calls(), 0);
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn test_create_replica_api_failure_records_event() {
        let cluster = Arc::new(MockCluster::new());
        let events = Arc::new(RecordingEvents::new());
        let control = ApiPodControl::new(cluster.clone(), events.clone());
        cluster.fail_pod_creates("the cluster is full");

        let rc = controller_with_template("frontend", labels(&[("app", "frontend")]));
        let err = control.create_replica("default", &rc).await.unwrap_err();

        assert!(matches!(err, ControllerError::CreateFailed { .. }));
        assert_eq!(events.reasons(), vec![FAILED_CREATE]);
        assert!(events.events()[0].2.contains("the cluster is full"));
    }

    #[tokio::test]
    async fn test_delete_pod_passes_through() {
        let cluster = Arc::new(MockCluster::new());
        let events = Arc::new(RecordingEvents::new());
        let control = ApiPodControl::new(cluster.clone(), events.clone());

        let mut pod = Pod::default();
        pod.metadata.name = Some("frontend-1".to_string());
        cluster.create_pod("default", &pod).await.unwrap();

        control.delete_pod("default", "frontend-1").await.unwrap();
        assert!(cluster.pods().await.is_empty());

        // The API's own error comes back uninterpreted.
        let err = control.delete_pod("default", "frontend-1").await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Core(magnetar_core::MagnetarError::ResourceNotFound { .. })
        ));
        assert!(events.events().is_empty());
    }
}
