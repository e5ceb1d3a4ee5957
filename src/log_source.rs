//! Application log event source.
//!
//! The console never hooks a process-wide logger directly. Instead it is handed
//! a [`LogSource`] and subscribes to it while it is listening. [`LogHub`] is the
//! stock implementation: a broadcast point fed by [`crate::logging::HubLayer`]
//! (or by anything else calling [`LogHub::emit`]) that fans each event out to
//! every live subscription over an mpsc channel. Subscribers drain their
//! channel once per tick from the console's own thread.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Severity of an application log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Assert,
    Exception,
}

impl Severity {
    /// Whether the event's trace is shown alongside its message.
    pub fn carries_trace(self) -> bool {
        matches!(self, Severity::Error | Severity::Assert | Severity::Exception)
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Assert => "Assert",
            Severity::Exception => "Exception",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single log message as delivered to the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub message: String,
    pub trace: String,
    pub severity: Severity,
}

impl LogEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: String::new(),
            severity,
        }
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = trace.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

pub type SubscriptionId = u64;

/// Receiving end of a subscription. Dropping it ends delivery.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: Receiver<LogEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Take every event delivered so far, oldest first, without blocking.
    pub fn drain(&self) -> Vec<LogEvent> {
        self.receiver.try_iter().collect()
    }
}

/// Anything the console can listen to for log events.
pub trait LogSource: Send + Sync {
    fn subscribe(&self) -> Subscription;
    fn unsubscribe(&self, id: SubscriptionId);
}

// ---------------------------------------------------------------------------
// LogHub
// ---------------------------------------------------------------------------

#[derive(Default)]
struct HubInner {
    next_id: SubscriptionId,
    subscribers: Vec<(SubscriptionId, Sender<LogEvent>)>,
}

/// Cloneable broadcast source. All clones share one subscriber list.
#[derive(Clone, Default)]
pub struct LogHub {
    inner: Arc<Mutex<HubInner>>,
}

impl LogHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every live subscription.
    ///
    /// Subscriptions whose receiver was dropped without unsubscribing are
    /// pruned here.
    pub fn emit(&self, event: LogEvent) {
        let mut inner = self.lock();
        inner
            .subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for LogHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl LogSource for LogHub {
    fn subscribe(&self) -> Subscription {
        let (tx, receiver) = mpsc::channel();
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.subscribers.push((id, tx));
        Subscription { id, receiver }
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().subscribers.retain(|(sub_id, _)| *sub_id != id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_reaches_every_subscriber() {
        let hub = LogHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();
        hub.emit(LogEvent::new(Severity::Warning, "low disk"));

        assert_eq!(a.drain().len(), 1);
        assert_eq!(b.drain()[0].message, "low disk");
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hub = LogHub::new();
        let sub = hub.subscribe();
        hub.unsubscribe(sub.id());
        hub.emit(LogEvent::new(Severity::Info, "ignored"));

        assert!(sub.drain().is_empty());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let hub = LogHub::new();
        drop(hub.subscribe());
        hub.emit(LogEvent::new(Severity::Info, "x"));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn only_failures_carry_trace() {
        assert!(Severity::Error.carries_trace());
        assert!(Severity::Assert.carries_trace());
        assert!(Severity::Exception.carries_trace());
        assert!(!Severity::Warning.carries_trace());
        assert!(!Severity::Info.carries_trace());
    }
}
