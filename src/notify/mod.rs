//! Presentation sink: transient user-visible notifications
//!
//! A notification can be delivered to either a plain callable or an object that
//! exposes an event-dispatch capability. Callers that have neither pass
//! [`NotifyTarget::Detached`] and the notification is dropped with a diagnostic.

pub mod console;
pub mod desktop;

pub use console::ConsoleNotifier;
pub use desktop::DesktopNotifier;

use crate::error::NotifyError;
use crate::record::{NormalizedError, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Title used for every error notification unless configured otherwise
pub const DEFAULT_TITLE: &str = "Something went wrong";

/// How long a notification stays on screen
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMode {
    /// Stays until the user dismisses it
    #[default]
    Sticky,
    /// Disappears after a short delay or on dismissal
    Dismissible,
    /// Stays for a short delay, cannot be dismissed
    Pester,
}

/// Payload handed to the presentation sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub mode: NotificationMode,
}

impl Notification {
    /// Build the notification for a normalized record
    pub fn for_record(record: &NormalizedError, title: &str, mode: NotificationMode) -> Self {
        Self {
            title: title.to_string(),
            message: record.message.clone(),
            severity: record.severity,
            mode,
        }
    }
}

/// Something that can receive dispatched notification events
#[cfg_attr(test, mockall::automock)]
pub trait EventDispatcher: Send + Sync {
    fn dispatch_event(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Callable notification target
pub type NotifyCallback = dyn Fn(&Notification) -> Result<(), NotifyError> + Send + Sync;

/// Where a report's notification should go
#[derive(Clone, Default)]
pub enum NotifyTarget {
    /// Plain callable receiving the payload
    Callback(Arc<NotifyCallback>),
    /// Object exposing event dispatch
    Dispatcher(Arc<dyn EventDispatcher>),
    /// No usable target; notifications are dropped
    #[default]
    Detached,
}

impl NotifyTarget {
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&Notification) -> Result<(), NotifyError> + Send + Sync + 'static,
    {
        NotifyTarget::Callback(Arc::new(callback))
    }

    pub fn dispatcher<D>(dispatcher: D) -> Self
    where
        D: EventDispatcher + 'static,
    {
        NotifyTarget::Dispatcher(Arc::new(dispatcher))
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, NotifyTarget::Detached)
    }

    /// Hand a notification to whichever shape this target has
    ///
    /// Returns `Ok(false)` when the target is detached and nothing was delivered.
    pub fn deliver(&self, notification: &Notification) -> Result<bool, NotifyError> {
        match self {
            NotifyTarget::Callback(callback) => callback(notification).map(|()| true),
            NotifyTarget::Dispatcher(dispatcher) => {
                dispatcher.dispatch_event(notification).map(|()| true)
            }
            NotifyTarget::Detached => Ok(false),
        }
    }
}

impl fmt::Debug for NotifyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyTarget::Callback(_) => f.write_str("NotifyTarget::Callback"),
            NotifyTarget::Dispatcher(_) => f.write_str("NotifyTarget::Dispatcher"),
            NotifyTarget::Detached => f.write_str("NotifyTarget::Detached"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ErrorKind;
    use std::sync::Mutex;

    fn sample_notification() -> Notification {
        Notification {
            title: DEFAULT_TITLE.to_string(),
            message: "Field X required".to_string(),
            severity: Severity::Warning,
            mode: NotificationMode::Sticky,
        }
    }

    #[test]
    fn test_notification_for_record() {
        let record = NormalizedError::new(
            ErrorKind::Aggregate,
            "a, b",
            "trace",
            Severity::Warning,
            "AccountList",
        );
        let notification = Notification::for_record(&record, DEFAULT_TITLE, NotificationMode::Sticky);

        assert_eq!(notification.title, "Something went wrong");
        assert_eq!(notification.message, "a, b");
        assert_eq!(notification.severity, Severity::Warning);
        assert_eq!(notification.mode, NotificationMode::Sticky);
    }

    #[test]
    fn test_notification_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&NotificationMode::Sticky).unwrap(),
            "\"sticky\""
        );
        assert_eq!(
            serde_json::to_string(&NotificationMode::Dismissible).unwrap(),
            "\"dismissible\""
        );
        assert_eq!(NotificationMode::default(), NotificationMode::Sticky);
    }

    #[test]
    fn test_callback_target_receives_payload() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let target = NotifyTarget::callback(move |n: &Notification| {
            sink.lock().unwrap().push(n.clone());
            Ok(())
        });

        assert!(target.deliver(&sample_notification()).unwrap());
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(seen.lock().unwrap()[0].message, "Field X required");
    }

    #[test]
    fn test_dispatcher_target_receives_payload() {
        let mut dispatcher = MockEventDispatcher::new();
        dispatcher
            .expect_dispatch_event()
            .withf(|n| n.message == "Field X required" && n.severity == Severity::Warning)
            .times(1)
            .returning(|_| Ok(()));

        let target = NotifyTarget::dispatcher(dispatcher);
        assert!(target.deliver(&sample_notification()).unwrap());
    }

    #[test]
    fn test_dispatcher_failure_is_returned() {
        let mut dispatcher = MockEventDispatcher::new();
        dispatcher
            .expect_dispatch_event()
            .returning(|_| Err(NotifyError::NotificationFailed("no window".to_string())));

        let target = NotifyTarget::dispatcher(dispatcher);
        assert_eq!(
            target.deliver(&sample_notification()),
            Err(NotifyError::NotificationFailed("no window".to_string()))
        );
    }

    #[test]
    fn test_detached_target_delivers_nothing() {
        let target = NotifyTarget::default();
        assert!(target.is_detached());
        assert!(!target.deliver(&sample_notification()).unwrap());
        assert_eq!(format!("{:?}", target), "NotifyTarget::Detached");
    }
}
