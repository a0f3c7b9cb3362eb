use k8s_openapi::api::core::v1::Pod;
use std::cmp::Ordering;

fn pod_phase(pod: &Pod) -> &str {
    pod.status
        .as_ref()
        .and_then(|status| status.phase.as_deref())
        .unwrap_or("")
}

fn is_scheduled(pod: &Pod) -> bool {
    pod.spec
        .as_ref()
        .and_then(|spec| spec.node_name.as_deref())
        .map(|node| !node.is_empty())
        .unwrap_or(false)
}

/// True when the pod's `Ready` condition reports `True`.
pub fn is_pod_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
        .unwrap_or(false)
}

/// Pods that have not terminated, in their original order.
///
/// The result borrows from the caller; it is a view for ranking, never
/// persisted.
pub fn filter_active_pods(pods: &[Pod]) -> Vec<&Pod> {
    pods.iter()
        .filter(|pod| {
            let phase = pod_phase(pod);
            phase != "Succeeded" && phase != "Failed"
        })
        .collect()
}

// Pending < Unknown < Running; absent or unrecognized phases rank with
// Pending.
fn phase_rank(pod: &Pod) -> u8 {
    match pod_phase(pod) {
        "Unknown" => 1,
        "Running" => 2,
        _ => 0,
    }
}

/// Deletion-preference ordering for scale-down: ascending means delete
/// first.
///
/// Three-key lexicographic comparison: unscheduled before scheduled, then
/// phase rank, then not-ready before ready. Pods equal on all three keys
/// have unspecified relative order; sort with a stable sort (`sort_by`).
pub fn deletion_preference(a: &Pod, b: &Pod) -> Ordering {
    let rank = |pod: &Pod| (is_scheduled(pod), phase_rank(pod), is_pod_ready(pod));
    rank(a).cmp(&rank(b))
}
