use crate::types::ControllerKey;
use tracing::info;

/// Event reason recorded when a pod create request fails
pub const FAILED_CREATE: &str = "failedCreate";

/// Event reason recorded when a pod create request succeeds
pub const SUCCESSFUL_CREATE: &str = "successfulCreate";

/// Sink for observability events.
///
/// Recording is fire-and-forget: implementations must not fail the calling
/// operation, and callers never learn whether delivery happened. The actual
/// transport (API server events, audit log, ...) is supplied by the embedding
/// process.
pub trait EventRecorder: Send + Sync {
    /// Record an event about the given controller.
    fn event(&self, subject: &ControllerKey, reason: &str, message: &str);
}

/// Default recorder that emits events as structured log records.
#[derive(Debug, Default)]
pub struct TracingEventRecorder;

impl EventRecorder for TracingEventRecorder {
    fn event(&self, subject: &ControllerKey, reason: &str, message: &str) {
        info!(subject = %subject, reason, message, "event");
    }
}
