//! Domain events and the event bus.
//!
//! The engine emits events for lock and unlock transitions; side effects
//! (creating the persistent lock, sending notifications) are registered as
//! handlers. Dispatch is fire-and-forget: a failing handler is logged and the
//! remaining handlers still run, so one broken reaction can never block
//! another or abort the triggering flow.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::EventError;
use crate::lock::{LockRecord, RequestContext};
use crate::subject::SubjectRef;

/// Events emitted by the lockout engine.
#[derive(Debug, Clone)]
pub enum Event {
    /// The attempt counter for an identifier just crossed the threshold.
    ///
    /// Emitted exactly once per crossing; repeated failures after the
    /// threshold do not re-emit.
    EntityLocked {
        identifier: String,
        context: RequestContext,
    },

    /// An active lock was released.
    EntityUnlocked {
        subject: SubjectRef,
        lock: LockRecord,
        /// The subject's login-field value, when it could be resolved.
        identifier: Option<String>,
        context: RequestContext,
    },
}

/// A reaction to lockout events.
///
/// Handlers run in registration order. Errors are reported back to the bus,
/// which logs them and moves on; a handler that must never fail its siblings
/// should still return its error here rather than panic.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn handle_event(&self, event: &Event) -> Result<(), EventError>;
}

/// Ordered registry of event handlers.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Handlers run in the order they were added.
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        self.handlers.write().await.push(handler);
    }

    /// Emit an event to every registered handler.
    ///
    /// Each handler is isolated in its own failure boundary: an error is
    /// logged and dispatch continues with the next handler.
    pub async fn emit(&self, event: &Event) {
        for handler in self.handlers.read().await.iter() {
            if let Err(e) = handler.handle_event(event).await {
                tracing::warn!(error = %e, "Event handler failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle_event(&self, _event: &Event) -> Result<(), EventError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl EventHandler for FailingHandler {
        async fn handle_event(&self, _event: &Event) -> Result<(), EventError> {
            Err(EventError::HandlerError("boom".to_string()))
        }
    }

    fn locked_event() -> Event {
        Event::EntityLocked {
            identifier: "test@example.com".to_string(),
            context: RequestContext::default(),
        }
    }

    #[tokio::test]
    async fn test_emit_without_handlers() {
        let bus = EventBus::new();
        bus.emit(&locked_event()).await;
    }

    #[tokio::test]
    async fn test_all_handlers_called() {
        let bus = EventBus::new();
        let calls_a = Arc::new(AtomicUsize::new(0));
        let calls_b = Arc::new(AtomicUsize::new(0));

        bus.register(Arc::new(CountingHandler {
            calls: calls_a.clone(),
        }))
        .await;
        bus.register(Arc::new(CountingHandler {
            calls: calls_b.clone(),
        }))
        .await;

        bus.emit(&locked_event()).await;

        assert_eq!(calls_a.load(Ordering::SeqCst), 1);
        assert_eq!(calls_b.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_dispatch() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        bus.register(Arc::new(FailingHandler)).await;
        bus.register(Arc::new(CountingHandler {
            calls: calls.clone(),
        }))
        .await;

        bus.emit(&locked_event()).await;

        // The handler after the failing one still ran
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
