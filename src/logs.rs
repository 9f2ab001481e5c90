//! Captures tracing events emitted during a test

use std::sync::{Arc, Mutex};

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// A tracing layer that records `[LEVEL] message` lines.
#[derive(Clone, Default)]
pub struct LogCapture {
    logs: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
    /// Install the capture for the current thread until the guard drops.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let guard = tracing_subscriber::registry()
            .with(capture.clone())
            .set_default();
        (capture, guard)
    }

    pub fn lines(&self) -> Vec<String> {
        self.logs.lock().map(|logs| logs.clone()).unwrap_or_default()
    }

    /// Whether any line at `level` contains `needle`.
    pub fn contains(&self, level: tracing::Level, needle: &str) -> bool {
        let prefix = format!("[{}]", level);
        self.lines()
            .iter()
            .any(|line| line.starts_with(&prefix) && line.contains(needle))
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        struct MessageVisitor {
            message: String,
        }

        impl tracing::field::Visit for MessageVisitor {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = format!("{:?}", value);
                }
            }
        }

        let mut visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut visitor);

        if let Ok(mut logs) = self.logs.lock() {
            logs.push(format!("[{}] {}", event.metadata().level(), visitor.message));
        }
    }
}
