use std::fmt;

/// User-facing notices raised by the client before it fails a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    /// An authenticated request was attempted with no stored credentials.
    AuthorizationRequired,
    /// The backend rejected the credentials and they could not be refreshed.
    SessionExpired,
}

impl Notification {
    pub fn message(self) -> &'static str {
        match self {
            Notification::AuthorizationRequired => "Authorization required. Please log in.",
            Notification::SessionExpired => "Your session has expired. Please log in again.",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Receives notices meant for the person driving the client.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Default notifier: records notices in the log only.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        tracing::warn!("{notification}");
    }
}
