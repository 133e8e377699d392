use crate::record::LogRecord;
use crate::severity::Severity;
use crate::sink::{LogSink, SinkError};

/// Application name sent with every notification.
pub const APP_NAME: &str = "Qubes";

pub const ERROR_ICON: &str = "dialog-error";
pub const WARNING_ICON: &str = "dialog-warning";
pub const INFO_ICON: &str = "dialog-information";

/// Severity thresholds and their icons, greatest threshold first.
///
/// The last entry is the lowest severity, so every lookup matches.
const ICON_TABLE: [(Severity, &str); 3] = [
    (Severity::Error, ERROR_ICON),
    (Severity::Warning, WARNING_ICON),
    (Severity::NotSet, INFO_ICON),
];

/// Icon of the greatest threshold in the table that is `<= severity`.
pub fn icon_for(severity: Severity) -> &'static str {
    ICON_TABLE
        .iter()
        .find(|(threshold, _)| *threshold <= severity)
        .map(|(_, icon)| *icon)
        .unwrap_or(INFO_ICON)
}

/// Arguments of one `org.freedesktop.Notifications.Notify` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub app_name: String,
    /// 0 never replaces an earlier notification.
    pub replaces_id: u32,
    pub icon: String,
    pub summary: String,
    pub body: String,
    /// `(action id, label)` pairs.
    pub actions: Vec<(String, String)>,
    pub hints: Vec<(String, String)>,
    /// Milliseconds; passed through to the server unchanged when `>= 0`.
    pub timeout: i32,
}

impl Notification {
    /// Popup for `record`: severity icon and the raw message as summary,
    /// everything else fixed.
    pub fn for_record(record: &LogRecord) -> Self {
        Notification {
            app_name: APP_NAME.to_string(),
            replaces_id: 0,
            icon: icon_for(record.severity).to_string(),
            summary: record.message.clone(),
            body: String::new(),
            actions: Vec::new(),
            hints: Vec::new(),
            timeout: 0,
        }
    }
}

/// Error from a single notification call.
#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[cfg(feature = "desktop")]
    #[error("desktop notification failed: {0}")]
    Desktop(#[from] notify_rust::error::Error),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// One-way handle to a notification service.
///
/// `notify` takes `&mut self`: a handle is used by one caller at a time,
/// so transports that are not thread-safe need no extra locking.
pub trait NotificationEndpoint: Send {
    fn notify(&mut self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Sink that turns log records into desktop popups.
///
/// Only records at or above [`min_severity`](LogSink::min_severity)
/// (default [`Severity::Warning`]) are offered by the context. Failed
/// calls are dropped: the bridge never retries and never logs them.
pub struct NotificationBridge<E> {
    endpoint: E,
    min_severity: Severity,
}

impl<E: NotificationEndpoint> NotificationBridge<E> {
    pub fn new(endpoint: E) -> Self {
        NotificationBridge {
            endpoint,
            min_severity: Severity::Warning,
        }
    }

    pub fn with_min_severity(mut self, min_severity: Severity) -> Self {
        self.min_severity = min_severity;
        self
    }

    /// Send one notification for `record`, ignoring any failure.
    pub fn dispatch(&mut self, record: &LogRecord) {
        let notification = Notification::for_record(record);
        // Errors stop here; reporting them through logging would recurse.
        let _ = self.endpoint.notify(&notification);
    }
}

impl<E: NotificationEndpoint> LogSink for NotificationBridge<E> {
    fn emit(&mut self, record: &LogRecord) -> Result<(), SinkError> {
        self.dispatch(record);
        Ok(())
    }

    fn min_severity(&self) -> Severity {
        self.min_severity
    }
}

#[cfg(feature = "desktop")]
pub use desktop::{BridgeError, DesktopNotifier};

#[cfg(feature = "desktop")]
mod desktop {
    use super::{Notification, NotificationBridge, NotificationEndpoint, NotifyError};
    use notify_rust::{Hint, Timeout};

    /// Construction-time failure to reach the notification service.
    #[derive(thiserror::Error, Debug)]
    pub enum BridgeError {
        #[error("notification service unavailable: {0}")]
        Unavailable(#[source] notify_rust::error::Error),
    }

    /// `org.freedesktop.Notifications` on the session bus.
    #[derive(Debug, Clone)]
    pub struct DesktopNotifier {
        server_name: String,
    }

    impl DesktopNotifier {
        /// Check once that the session bus and notification service answer.
        pub fn connect() -> Result<Self, BridgeError> {
            let info = notify_rust::get_server_information().map_err(BridgeError::Unavailable)?;
            tracing::debug!(server = %info.name, vendor = %info.vendor, "notification service found");
            Ok(DesktopNotifier { server_name: info.name })
        }

        pub fn server_name(&self) -> &str {
            &self.server_name
        }
    }

    impl NotificationEndpoint for DesktopNotifier {
        fn notify(&mut self, notification: &Notification) -> Result<(), NotifyError> {
            let mut popup = notify_rust::Notification::new();
            popup
                .appname(&notification.app_name)
                .icon(&notification.icon)
                .summary(&notification.summary)
                .body(&notification.body)
                .timeout(timeout(notification.timeout));
            if notification.replaces_id != 0 {
                popup.id(notification.replaces_id);
            }
            for (id, label) in &notification.actions {
                popup.action(id, label);
            }
            for (name, value) in &notification.hints {
                popup.hint(Hint::Custom(name.clone(), value.clone()));
            }
            popup.show()?;
            Ok(())
        }
    }

    fn timeout(ms: i32) -> Timeout {
        match ms {
            0 => Timeout::Never,
            ms if ms < 0 => Timeout::Default,
            ms => Timeout::Milliseconds(ms as u32),
        }
    }

    impl NotificationBridge<DesktopNotifier> {
        /// Bridge to the desktop notification service.
        ///
        /// **Returns**
        /// - `Err(BridgeError::Unavailable)` if the session bus or the
        ///   service cannot be reached; the caller decides whether to go on
        ///   without popups.
        pub fn connect() -> Result<Self, BridgeError> {
            Ok(NotificationBridge::new(DesktopNotifier::connect()?))
        }
    }

}
