//! Magnetar Controller - reconciliation support for the replication
//! controller manager
//!
//! This crate provides the primitives that make a reconcile loop safe to run
//! repeatedly and concurrently:
//! - Expectation bookkeeping with TTL expiry
//! - Pod lifecycle delegation to the object API
//! - Active-pod filtering and deletion-preference ranking
//! - Replica-count convergence under optimistic concurrency

pub mod active_pods;
pub mod client;
pub mod error;
pub mod expectations;
pub mod mock;
pub mod pod_control;
pub mod replica_count;

// Re-export primary types
pub use active_pods::{deletion_preference, filter_active_pods, is_pod_ready};
pub use client::{ControllerApi, PodApi};
pub use error::{ControllerError, Result};
pub use expectations::{ControllerExpectations, PodExpectations, EXPECTATIONS_TTL};
pub use mock::{MockCluster, RecordingEvents};
pub use pod_control::{
    build_replica_pod, is_valid_generated_name_prefix, ApiPodControl, PodControl,
    CREATED_BY_ANNOTATION,
};
pub use replica_count::{
    update_replica_count, STATUS_UPDATE_RETRY_INTERVAL, STATUS_UPDATE_RETRY_TIMEOUT,
};
