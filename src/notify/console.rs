use super::{EventDispatcher, Notification, NotificationMode};
use crate::error::NotifyError;
use std::io::Write;

/// Writes notifications to standard error, one line each
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }

    /// Render a notification as a single console line
    pub fn format_line(notification: &Notification) -> String {
        let marker = match notification.mode {
            NotificationMode::Sticky => " (sticky)",
            NotificationMode::Dismissible | NotificationMode::Pester => "",
        };
        format!(
            "[{}] {}: {}{}",
            notification.severity.as_str().to_uppercase(),
            notification.title,
            notification.message,
            marker
        )
    }
}

impl EventDispatcher for ConsoleNotifier {
    fn dispatch_event(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "{}", Self::format_line(notification))
            .map_err(|e| NotifyError::NotificationFailed(format!("stderr write failed: {}", e)))
    }
}
