use super::{EventDispatcher, Notification, NotificationMode};
use crate::error::NotifyError;
use crate::record::Severity;
use log::info;
use std::process::Command;

/// Maximum title length accepted by notification centers
const MAX_TITLE_LEN: usize = 256;

/// Maximum body length accepted by notification centers
const MAX_BODY_LEN: usize = 1024;

/// Delivers notifications through the desktop notification center
///
/// Uses `osascript` on macOS and `notify-send` elsewhere. In mock mode the
/// notification is only logged, which keeps tests from spamming the user.
#[derive(Debug, Clone, Default)]
pub struct DesktopNotifier {
    use_mock_notifications: bool,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            use_mock_notifications: false,
        }
    }

    /// Create a notifier that logs instead of invoking the notification center
    pub fn new_for_testing() -> Self {
        Self {
            use_mock_notifications: true,
        }
    }

    /// Truncate text to a maximum byte length, respecting UTF-8 boundaries
    fn truncate_text(text: &str, max_length: usize) -> String {
        if text.len() <= max_length {
            return text.to_string();
        }

        let mut truncate_at = max_length.saturating_sub(3);
        while truncate_at > 0 && !text.is_char_boundary(truncate_at) {
            truncate_at -= 1;
        }

        format!("{}...", &text[..truncate_at])
    }

    /// Escape quotes and backslashes for an AppleScript string literal
    fn escape_applescript(text: &str) -> String {
        text.replace('\\', "\\\\").replace('"', "\\\"")
    }

    fn urgency(severity: Severity) -> &'static str {
        match severity {
            Severity::Info => "low",
            Severity::Warning => "normal",
            Severity::Error => "critical",
        }
    }

    /// Build the platform command that shows the notification
    fn command(title: &str, body: &str, notification: &Notification) -> Command {
        if cfg!(target_os = "macos") {
            let script = format!(
                r#"display notification "{}" with title "{}""#,
                Self::escape_applescript(body),
                Self::escape_applescript(title)
            );
            let mut command = Command::new("osascript");
            command.arg("-e").arg(script);
            command
        } else {
            let mut command = Command::new("notify-send");
            command
                .arg("--urgency")
                .arg(Self::urgency(notification.severity));
            // Zero expiry keeps the notification until dismissed
            if notification.mode == NotificationMode::Sticky {
                command.arg("--expire-time").arg("0");
            }
            command.arg(title).arg(body);
            command
        }
    }
}

impl EventDispatcher for DesktopNotifier {
    fn dispatch_event(&self, notification: &Notification) -> Result<(), NotifyError> {
        let title = Self::truncate_text(&notification.title, MAX_TITLE_LEN);
        let body = Self::truncate_text(&notification.message, MAX_BODY_LEN);

        if self.use_mock_notifications {
            info!("MOCK NOTIFICATION - Title: {}, Body: {}", title, body);
            return Ok(());
        }

        let output = Self::command(&title, &body, notification)
            .output()
            .map_err(|e| {
                NotifyError::NotificationFailed(format!(
                    "Failed to execute notification command: {}",
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NotifyError::NotificationFailed(format!(
                "notification command failed with status {}: {}",
                output.status, stderr
            )));
        }

        Ok(())
    }
}
