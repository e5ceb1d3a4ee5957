//! Logging initialisation for script-console.
//!
//! When the `SCRIPT_CONSOLE_LOG` environment variable is set to `1`,
//! structured logs are written to the OS log directory under
//! `script-console/script-console.log`. Otherwise only stderr output
//! (filtered by `RUST_LOG`) is enabled.
//!
//! Given a [`LogHub`], every application event at info level or above is also
//! published there, which is how the console mirrors the host's log.
//!
//! Returns a guard that must be kept alive for the duration of the process
//! so that buffered log lines are flushed on exit.

use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::{EnvFilter, fmt as tfmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::log_source::{LogEvent, LogHub, Severity};

pub struct LogGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialise the global tracing subscriber.
///
/// Call once from `main`, store the returned `LogGuard` in a local variable
/// for the duration of the process.
pub fn init(hub: Option<LogHub>) -> LogGuard {
    let (file_layer, file_guard) = if std::env::var("SCRIPT_CONSOLE_LOG").as_deref() == Ok("1") {
        let dir = log_dir().unwrap_or_else(|| std::path::PathBuf::from("/tmp"));
        let _ = std::fs::create_dir_all(&dir);
        let file_appender = tracing_appender::rolling::never(dir, "script-console.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let layer = tfmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_filter(env_filter("info"));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let hub_layer = hub.map(|hub| HubLayer::new(hub).with_filter(LevelFilter::INFO));

    tracing_subscriber::registry()
        .with(
            tfmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter("warn")),
        )
        .with(file_layer)
        .with(hub_layer)
        .init();

    LogGuard { _file_guard: file_guard }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn log_dir() -> Option<std::path::PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        let mut p = std::path::PathBuf::from(xdg);
        p.push("script-console");
        return Some(p);
    }
    let home = std::env::var("HOME").ok()?;
    let mut p = std::path::PathBuf::from(home);
    #[cfg(target_os = "macos")]
    {
        p.push("Library");
        p.push("Logs");
    }
    #[cfg(not(target_os = "macos"))]
    {
        p.push(".local");
        p.push("share");
    }
    p.push("script-console");
    Some(p)
}

// ---------------------------------------------------------------------------
// Hub layer
// ---------------------------------------------------------------------------

/// Publishes tracing events to a [`LogHub`].
///
/// The console's own diagnostics are skipped, or showing the log would feed
/// on itself; events from scripts (target `script`) are kept.
pub struct HubLayer {
    hub: LogHub,
}

impl HubLayer {
    pub fn new(hub: LogHub) -> Self {
        Self { hub }
    }
}

impl<S: Subscriber> Layer<S> for HubLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !is_mirrored(meta) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let severity = match *meta.level() {
            Level::ERROR => Severity::Error,
            Level::WARN => Severity::Warning,
            _ => Severity::Info,
        };
        let trace = match (meta.file(), meta.line()) {
            (Some(file), Some(line)) => format!("{} ({file}:{line})", meta.target()),
            _ => meta.target().to_string(),
        };
        self.hub
            .emit(LogEvent::new(severity, visitor.message).with_trace(trace));
    }
}

fn is_mirrored(meta: &Metadata<'_>) -> bool {
    let own = meta
        .module_path()
        .is_some_and(|path| path.starts_with(env!("CARGO_CRATE_NAME")));
    !own || meta.target() == "script"
}

/// Renders the `message` field followed by any other fields as `key=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.insert_str(0, value);
        } else {
            self.message.push_str(&format!(" {}={value}", field.name()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message.insert_str(0, &format!("{value:?}"));
        } else {
            self.message.push_str(&format!(" {}={value:?}", field.name()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_source::LogSource;

    fn with_hub_layer(hub: &LogHub, f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(HubLayer::new(hub.clone()));
        tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn script_events_are_mirrored_with_severity() {
        let hub = LogHub::new();
        let subscription = hub.subscribe();
        with_hub_layer(&hub, || {
            tracing::warn!(target: "script", "disk nearly full");
            tracing::error!(target: "script", code = 7, "save failed");
        });

        let events = subscription.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].severity, Severity::Warning);
        assert_eq!(events[0].message, "disk nearly full");
        assert!(events[0].trace.starts_with("script ("));
        assert_eq!(events[1].severity, Severity::Error);
        assert_eq!(events[1].message, "save failed code=7");
    }

    #[test]
    fn console_diagnostics_are_not_mirrored() {
        let hub = LogHub::new();
        let subscription = hub.subscribe();
        with_hub_layer(&hub, || {
            tracing::info!(target: "console", "script scope ready");
        });
        assert!(subscription.drain().is_empty());
    }
}
