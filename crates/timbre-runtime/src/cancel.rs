//! Cancellation registry.
//!
//! Each request registers one [`CancelHandle`] under its request key. The
//! handle pairs a [`CancellationToken`] with a completed flag so that a
//! late "connection closed" event on an already-finished session is a
//! no-op rather than a spurious abort. The registry also holds a context
//! provider per entry, so an external abort reporter can snapshot session
//! data without retaining the session itself.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use metrics::gauge;
use parking_lot::Mutex;
use timbre_core::ids::{ConversationId, MessageId, RequestKey};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Snapshot of session data for abort reporting.
#[derive(Clone, Debug, Default)]
pub struct AbortSnapshot {
    /// Responder display name, if known yet.
    pub sender: Option<String>,
    /// Content accumulated so far.
    pub content: String,
    /// Prompt token count, if known yet.
    pub prompt_tokens: Option<u32>,
    /// Conversation id, if assigned yet.
    pub conversation_id: Option<ConversationId>,
    /// Response message id, if assigned yet.
    pub message_id: Option<MessageId>,
    /// Parent message id, if assigned yet.
    pub parent_message_id: Option<MessageId>,
}

/// Zero-argument session-data snapshot function.
pub type ContextProvider = Box<dyn Fn() -> AbortSnapshot + Send + Sync>;

/// Hook invoked once when generation actually starts.
pub type OnStart = Box<dyn FnOnce() + Send>;

/// Cooperative cancellation signal plus completion flag.
///
/// Transitions: armed → signaled (abort) or armed → completed (normal
/// finish). Signaling after either transition is a no-op.
pub struct CancelHandle {
    token: CancellationToken,
    completed: AtomicBool,
}

impl CancelHandle {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            completed: AtomicBool::new(false),
        }
    }

    /// Fire the cancellation signal. No-op when already signaled or when
    /// the session completed first.
    pub fn signal(&self) {
        if self.completed.load(Ordering::Acquire) || self.token.is_cancelled() {
            return;
        }
        self.token.cancel();
    }

    /// Disarm the signal: the session finished normally. A later
    /// [`signal`](Self::signal) does nothing.
    pub fn mark_completed(&self) {
        self.completed.store(true, Ordering::Release);
    }

    /// Whether the signal has fired. Synchronously observable: once true,
    /// every subsequent check sees true.
    #[must_use]
    pub fn is_signaled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the session finished normally before any signal.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Future resolving when the signal fires. Usable inside
    /// `tokio::select!` against the in-flight backend call.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

struct Entry {
    handle: Arc<CancelHandle>,
    context: ContextProvider,
    started: Arc<AtomicBool>,
}

/// Registry of in-flight request cancellations, keyed by request key.
#[derive(Default)]
pub struct CancelRegistry {
    entries: Mutex<HashMap<RequestKey, Entry>>,
}

impl CancelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cancellation for `key`.
    ///
    /// Returns the handle and an on-start hook the orchestrator invokes
    /// when generation begins (abort reports distinguish "never started"
    /// from "interrupted mid-generation").
    pub fn register(
        &self,
        key: &RequestKey,
        context: ContextProvider,
    ) -> (Arc<CancelHandle>, OnStart) {
        let handle = Arc::new(CancelHandle::new());
        let started = Arc::new(AtomicBool::new(false));
        let mut entries = self.entries.lock();
        if entries
            .insert(
                key.clone(),
                Entry {
                    handle: Arc::clone(&handle),
                    context,
                    started: Arc::clone(&started),
                },
            )
            .is_some()
        {
            warn!(key = %key, "replaced existing cancellation entry");
        }
        gauge!("cancel_entries_active").set(entries.len() as f64);

        let start_key = key.clone();
        let on_start: OnStart = Box::new(move || {
            started.store(true, Ordering::Release);
            debug!(key = %start_key, "generation started");
        });
        (handle, on_start)
    }

    /// Signal the cancellation for `key`, returning an abort snapshot when
    /// the entry exists and the signal actually fired. Idempotent; a
    /// missing key or a completed session yields `None`.
    pub fn signal(&self, key: &RequestKey) -> Option<AbortSnapshot> {
        let entries = self.entries.lock();
        let entry = entries.get(key)?;
        if entry.handle.is_completed() || entry.handle.is_signaled() {
            return None;
        }
        entry.handle.signal();
        debug!(key = %key, started = entry.started.load(Ordering::Acquire), "cancellation signaled");
        Some((entry.context)())
    }

    /// Remove the entry for `key`. Called from session cleanup so the map
    /// cannot grow across requests.
    pub fn clear(&self, key: &RequestKey) {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            debug!(key = %key, "cancellation entry cleared");
        }
        gauge!("cancel_entries_active").set(entries.len() as f64);
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the registry has no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(content: &str) -> ContextProvider {
        let content = content.to_string();
        Box::new(move || AbortSnapshot {
            content: content.clone(),
            ..AbortSnapshot::default()
        })
    }

    #[test]
    fn register_arms_handle() {
        let registry = CancelRegistry::new();
        let key = RequestKey::new("k1");
        let (handle, _on_start) = registry.register(&key, provider(""));
        assert!(!handle.is_signaled());
        assert!(!handle.is_completed());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn signal_returns_snapshot_and_cancels() {
        let registry = CancelRegistry::new();
        let key = RequestKey::new("k1");
        let (handle, _on_start) = registry.register(&key, provider("partial text"));

        let snapshot = registry.signal(&key).unwrap();
        assert_eq!(snapshot.content, "partial text");
        assert!(handle.is_signaled());
    }

    #[test]
    fn signal_twice_is_noop() {
        let registry = CancelRegistry::new();
        let key = RequestKey::new("k1");
        let (handle, _on_start) = registry.register(&key, provider(""));

        assert!(registry.signal(&key).is_some());
        assert!(registry.signal(&key).is_none());
        assert!(handle.is_signaled());
    }

    #[test]
    fn signal_after_completed_is_noop() {
        let registry = CancelRegistry::new();
        let key = RequestKey::new("k1");
        let (handle, _on_start) = registry.register(&key, provider(""));

        handle.mark_completed();
        assert!(registry.signal(&key).is_none());
        assert!(!handle.is_signaled());
    }

    #[test]
    fn signal_unknown_key_is_noop() {
        let registry = CancelRegistry::new();
        assert!(registry.signal(&RequestKey::new("missing")).is_none());
    }

    #[test]
    fn clear_removes_entry() {
        let registry = CancelRegistry::new();
        let key = RequestKey::new("k1");
        let (_handle, _on_start) = registry.register(&key, provider(""));

        registry.clear(&key);
        assert!(registry.is_empty());
        assert!(registry.signal(&key).is_none());
    }

    #[test]
    fn handle_signal_direct_is_idempotent() {
        let handle = CancelHandle::new();
        handle.signal();
        handle.signal();
        assert!(handle.is_signaled());
    }

    #[test]
    fn completed_handle_ignores_direct_signal() {
        let handle = CancelHandle::new();
        handle.mark_completed();
        handle.signal();
        assert!(!handle.is_signaled());
    }

    #[tokio::test]
    async fn cancelled_future_resolves_on_signal() {
        let handle = Arc::new(CancelHandle::new());
        let waiter = Arc::clone(&handle);
        let task = tokio::spawn(async move { waiter.cancelled().await });
        handle.signal();
        task.await.unwrap();
    }

    #[test]
    fn on_start_marks_started() {
        let registry = CancelRegistry::new();
        let key = RequestKey::new("k1");
        let (_handle, on_start) = registry.register(&key, provider(""));
        on_start();
        // started flag is internal; observable via debug logs only — the
        // call itself must not panic or signal.
        assert!(registry.signal(&key).is_some());
    }
}
