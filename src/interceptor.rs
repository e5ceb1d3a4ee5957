//! Log interceptor: the console's subscription to the application log.

use std::sync::Arc;

use tracing::debug;

use crate::log_source::{LogEvent, LogSource, Subscription};

/// Owns at most one live subscription to a [`LogSource`].
pub struct LogInterceptor {
    source: Option<Arc<dyn LogSource>>,
    subscription: Option<Subscription>,
}

impl LogInterceptor {
    pub fn new(source: Option<Arc<dyn LogSource>>) -> Self {
        Self {
            source,
            subscription: None,
        }
    }

    pub fn set_source(&mut self, source: Arc<dyn LogSource>) {
        self.disable();
        self.source = Some(source);
    }

    /// Subscribe, dropping any existing subscription first so events are
    /// never delivered twice.
    pub fn enable(&mut self) {
        self.disable();
        if let Some(source) = &self.source {
            let subscription = source.subscribe();
            debug!(target: "console", id = subscription.id(), "log subscription opened");
            self.subscription = Some(subscription);
        }
    }

    pub fn disable(&mut self) {
        if let (Some(source), Some(subscription)) = (&self.source, self.subscription.take()) {
            source.unsubscribe(subscription.id());
            debug!(target: "console", id = subscription.id(), "log subscription closed");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.subscription.is_some()
    }

    /// Events received since the last call, oldest first.
    pub fn drain(&self) -> Vec<LogEvent> {
        self.subscription
            .as_ref()
            .map(Subscription::drain)
            .unwrap_or_default()
    }
}

impl Drop for LogInterceptor {
    fn drop(&mut self) {
        self.disable();
    }
}
