//! Cleanup registry.
//!
//! An ordered list of one-shot teardown actions owned by a single session.
//! `run_all` executes every action in registration order exactly once; a
//! failing action is logged and never blocks its siblings. The registry is
//! empty and inert afterwards — the owning session is being destroyed at
//! that point, so a second `run_all` is a documented no-op.

use tracing::{debug, error, warn};

/// One idempotent teardown action.
pub type CleanupAction = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// Ordered, run-once collection of cleanup actions.
#[derive(Default)]
pub struct CleanupRegistry {
    actions: Vec<CleanupAction>,
    ran: bool,
}

impl CleanupRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action. Actions run in registration order.
    pub fn push(&mut self, action: CleanupAction) {
        if self.ran {
            warn!("cleanup action registered after run_all; dropped");
            return;
        }
        self.actions.push(action);
    }

    /// Run every action exactly once, isolating failures.
    ///
    /// A second call does nothing.
    pub fn run_all(&mut self) {
        if self.ran {
            debug!("cleanup already ran; ignoring");
            return;
        }
        self.ran = true;
        let total = self.actions.len();
        let mut failures = 0usize;
        for action in self.actions.drain(..) {
            if let Err(e) = action() {
                failures += 1;
                error!(error = %e, "cleanup action failed");
            }
        }
        debug!(total, failures, "cleanup completed");
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether no actions are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
