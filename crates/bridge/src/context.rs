//! Per-invocation context.

use std::sync::Arc;

use lambda_bridge_core::InvocationEvent;
use tokio_util::sync::CancellationToken;

/// Carries cancellation and the triggering event through one invocation.
///
/// Drivers attach the source event before calling the handler, so handler
/// code (and anything it calls) can see exactly what arrived. Cloning is
/// cheap; clones share the same token and event.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancellation: CancellationToken,
    source_event: Option<Arc<InvocationEvent>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context cancelled whenever `token` is.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancellation: token,
            source_event: None,
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once the invocation is cancelled.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await
    }

    /// The event that triggered this invocation, if a driver attached one.
    pub fn source_event(&self) -> Option<&InvocationEvent> {
        self.source_event.as_deref()
    }

    pub fn with_source_event(&self, event: InvocationEvent) -> Self {
        Self {
            cancellation: self.cancellation.clone(),
            source_event: Some(Arc::new(event)),
        }
    }

    /// A context that is cancelled with this one, but can also be cancelled
    /// on its own without affecting the parent.
    pub fn child(&self) -> Self {
        Self {
            cancellation: self.cancellation.child_token(),
            source_event: self.source_event.clone(),
        }
    }
}
