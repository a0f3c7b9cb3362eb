use crate::error::{ControllerError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// How long recorded expectations are honored before the controller becomes
/// eligible for a resync regardless of its counters. Keeps a controller live
/// even when the watch stream drops the events it was waiting for.
pub const EXPECTATIONS_TTL: Duration = Duration::from_secs(2 * 60);

/// A controller's self-recorded prediction of how many pod creates and
/// deletes it has just initiated.
///
/// The counters are decremented by watch observations and never incremented
/// in place; a new reconcile decision replaces the entry wholesale. Each
/// counter is an independent atomic, so a reader may observe a transiently
/// inconsistent pair — `fulfilled` only needs both to be independently
/// non-positive, which tolerates that.
#[derive(Debug)]
pub struct PodExpectations {
    key: String,
    add: AtomicI64,
    del: AtomicI64,
    recorded_at: Instant,
}

impl PodExpectations {
    fn new(key: String, add: i64, del: i64) -> Self {
        Self {
            key,
            add: AtomicI64::new(add),
            del: AtomicI64::new(del),
            recorded_at: Instant::now(),
        }
    }

    /// The controller identity this entry belongs to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Decrement the add and del counters.
    pub fn seen(&self, add: i64, del: i64) {
        self.add.fetch_sub(add, Ordering::SeqCst);
        self.del.fetch_sub(del, Ordering::SeqCst);
    }

    /// True once all expected creates and deletes have been observed.
    pub fn fulfilled(&self) -> bool {
        self.add.load(Ordering::SeqCst) <= 0 && self.del.load(Ordering::SeqCst) <= 0
    }

    /// Current `(add, del)` counter values.
    pub fn counts(&self) -> (i64, i64) {
        (
            self.add.load(Ordering::SeqCst),
            self.del.load(Ordering::SeqCst),
        )
    }

    fn expired(&self, ttl: Duration) -> bool {
        self.recorded_at.elapsed() >= ttl
    }
}

/// TTL cache mapping controllers to what they expect to see before being
/// woken up for a sync.
///
/// One long-lived instance is shared between the reconcile workers (which
/// record fresh expectations) and the watch handlers (which lower them as
/// matching events arrive). Counter decrements take no map lock; the map
/// itself is locked only for insert/replace/lookup.
pub struct ControllerExpectations {
    ttl: Duration,
    entries: RwLock<HashMap<String, Arc<PodExpectations>>>,
}

impl ControllerExpectations {
    pub fn new() -> Self {
        Self::with_ttl(EXPECTATIONS_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up the expectations recorded for the given controller key.
    ///
    /// An entry past its TTL reads as absent. An error is returned only when
    /// the store itself cannot be read, never for a missing entry.
    pub fn get_expectations(&self, key: &str) -> Result<Option<Arc<PodExpectations>>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| ControllerError::expectation_store(e.to_string()))?;
        Ok(entries
            .get(key)
            .filter(|exp| !exp.expired(self.ttl))
            .cloned())
    }

    /// True when the controller is safe to sync: it has no live expectations
    /// (never recorded, or expired), its counters are fulfilled, or the store
    /// could not be read. An extra no-op sync is cheap; a skipped one can
    /// stall the controller forever if a watch event was lost.
    pub fn satisfied_expectations(&self, key: &str) -> bool {
        match self.get_expectations(key) {
            Ok(Some(exp)) => {
                if exp.fulfilled() {
                    true
                } else {
                    let (add, del) = exp.counts();
                    debug!(
                        "Controller {} still waiting on expectations: add {}, del {}",
                        key, add, del
                    );
                    false
                }
            }
            Ok(None) => {
                debug!(
                    "Controller {} either never recorded expectations, or the ttl expired",
                    key
                );
                true
            }
            Err(err) => {
                warn!(
                    "Error encountered while checking expectations for {}, forcing sync: {}",
                    key, err
                );
                true
            }
        }
    }

    /// Register new expectations for the given controller, forgetting
    /// whatever was there.
    fn set_expectations(&self, key: &str, add: i64, del: i64) -> Result<()> {
        let exp = Arc::new(PodExpectations::new(key.to_string(), add, del));
        let mut entries = self
            .entries
            .write()
            .map_err(|e| ControllerError::expectation_store(e.to_string()))?;
        if let Some(prev) = entries.insert(key.to_string(), exp) {
            let (prev_add, prev_del) = prev.counts();
            if prev_add > 0 && prev_del > 0 {
                warn!(
                    "Controller {} had both add and del expectations outstanding: add {}, del {}",
                    key, prev_add, prev_del
                );
            }
        }
        Ok(())
    }

    /// Expect `adds` pod creations before the controller is synced again.
    pub fn expect_creations(&self, key: &str, adds: i64) -> Result<()> {
        self.set_expectations(key, adds, 0)
    }

    /// Expect `dels` pod deletions before the controller is synced again.
    pub fn expect_deletions(&self, key: &str, dels: i64) -> Result<()> {
        self.set_expectations(key, 0, dels)
    }

    fn lower_expectations(&self, key: &str, add: i64, del: i64) {
        if let Ok(Some(exp)) = self.get_expectations(key) {
            exp.seen(add, del);
            let (remaining_add, remaining_del) = exp.counts();
            debug!(
                "Lowered expectations for controller {}: add {}, del {}",
                key, remaining_add, remaining_del
            );
        }
    }

    /// A matching pod creation was observed; lower the add count by one.
    /// No-op when the controller has no live expectations.
    pub fn creation_observed(&self, key: &str) {
        self.lower_expectations(key, 1, 0);
    }

    /// A matching pod deletion was observed; lower the del count by one.
    /// No-op when the controller has no live expectations.
    pub fn deletion_observed(&self, key: &str) {
        self.lower_expectations(key, 0, 1);
    }

    /// Drop any expectations recorded for the given controller, typically
    /// because the controller itself was deleted.
    pub fn forget(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }
}

impl Default for ControllerExpectations {
    fn default() -> Self {
        Self::new()
    }
}
