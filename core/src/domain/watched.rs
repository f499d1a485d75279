//! Watched port domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User intent to be notified when a port's active/inactive status changes.
///
/// Watch specs are persisted independently of any scan's [`PortRecord`]
/// instances.
///
/// [`PortRecord`]: super::PortRecord
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedPort {
    /// Stable identifier for this watch spec.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// The port number being watched.
    pub port: u16,
    /// Notify when the port becomes active.
    #[serde(default = "default_true")]
    pub notify_on_start: bool,
    /// Notify when the port becomes inactive.
    #[serde(default = "default_true")]
    pub notify_on_stop: bool,
}

fn default_true() -> bool {
    true
}

impl WatchedPort {
    /// Create a watch spec with both notifications enabled.
    pub fn new(port: u16) -> Self {
        Self::with_notifications(port, true, true)
    }

    /// Create a watch spec with explicit notification settings.
    pub fn with_notifications(port: u16, notify_on_start: bool, notify_on_stop: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            port,
            notify_on_start,
            notify_on_stop,
        }
    }
}

impl std::fmt::Display for WatchedPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.notify_on_start, self.notify_on_stop) {
            (true, true) => write!(f, "Port {} (notify: start, stop)", self.port),
            (true, false) => write!(f, "Port {} (notify: start)", self.port),
            (false, true) => write!(f, "Port {} (notify: stop)", self.port),
            (false, false) => write!(f, "Port {} (no notifications)", self.port),
        }
    }
}
