//! System notifications.
//!
//! Besides direct notifications, a tracing layer mirrors every warning
//! and error as a desktop notification so failures stay visible without a
//! terminal attached.

use notify_rust::Notification;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber, error};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::icon::ICON_PATH;
use crate::{APP_NAME, APP_NAME_PRETTY};

/// Send a system notification with a summary and body.
pub fn notify(summary: &str, body: &str) {
    Notification::new()
        .icon(ICON_PATH)
        .appname(APP_NAME)
        .summary(&format!("{APP_NAME_PRETTY} - {summary}"))
        .body(body)
        .show()
        .map_err(|e| error!("Failed to send notification: {}", e))
        .ok();
}

/// Extracts the `message` field from a tracing event.
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }
}

/// Tracing layer that surfaces warnings and errors as notifications.
#[derive(Debug, Default)]
pub struct NotificationLayer;

impl NotificationLayer {
    pub fn new() -> Self {
        Self
    }
}

fn summary_for(level: Level) -> Option<&'static str> {
    match level {
        Level::ERROR => Some("error"),
        Level::WARN => Some("warning"),
        _ => None,
    }
}

impl<S: Subscriber> Layer<S> for NotificationLayer {
    fn on_event(&self, event: &Event<'_>, _: Context<'_, S>) {
        let Some(summary) = summary_for(*event.metadata().level()) else {
            return;
        };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        if let Some(message) = visitor.message {
            notify(summary, &message);
        }
    }
}
