//! Port binding domain model.

use serde::{Deserialize, Serialize};

/// One observed binding of a process to a listening port, or an inactive
/// placeholder standing in for a tracked port with no live binding.
///
/// Records are identified by their `(port, pid)` pair; see [`PortRecord::key`].
/// They are built fresh on every scan cycle and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRecord {
    /// The port number (e.g., 3000, 8080).
    pub port: u16,

    /// Process ID of the owning process. Zero for inactive placeholders.
    pub pid: u32,

    /// Short name of the owning process.
    pub process_name: String,

    /// Network address the port is bound to (e.g., "*", "127.0.0.1", "[::1]").
    pub address: String,

    /// Username of the process owner.
    pub user: String,

    /// Best-effort full command line that started the process.
    pub command: String,

    /// Raw file descriptor token from the socket enumerator, kept opaque.
    pub fd: String,

    /// Whether this record is backed by a live scan.
    pub is_active: bool,
}

impl PortRecord {
    /// Create a new active record from scan results.
    pub fn active(
        port: u16,
        pid: u32,
        process_name: impl Into<String>,
        address: impl Into<String>,
        user: impl Into<String>,
        command: impl Into<String>,
        fd: impl Into<String>,
    ) -> Self {
        Self {
            port,
            pid,
            process_name: process_name.into(),
            address: address.into(),
            user: user.into(),
            command: command.into(),
            fd: fd.into(),
            is_active: true,
        }
    }

    /// Create an inactive placeholder for a favorited or watched port.
    pub fn inactive(port: u16) -> Self {
        Self {
            port,
            pid: 0,
            process_name: "Not running".to_string(),
            address: "-".to_string(),
            user: "-".to_string(),
            command: String::new(),
            fd: String::new(),
            is_active: false,
        }
    }

    /// Identity key used for de-duplication and scan-to-scan diffing.
    ///
    /// Two records with the same key describe the same binding, even when
    /// cosmetic fields (command text, descriptor) differ between scans.
    pub fn key(&self) -> (u16, u32) {
        (self.port, self.pid)
    }
}

impl std::fmt::Display for PortRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} (PID: {}, Process: {})",
            self.address, self.port, self.pid, self.process_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_record() {
        let record = PortRecord::active(
            3000,
            1234,
            "node",
            "127.0.0.1",
            "user",
            "node server.js",
            "19u",
        );
        assert!(record.is_active);
        assert_eq!(record.port, 3000);
        assert_eq!(record.pid, 1234);
        assert_eq!(record.key(), (3000, 1234));
    }

    #[test]
    fn inactive_placeholder_sentinels() {
        let record = PortRecord::inactive(8080);
        assert!(!record.is_active);
        assert_eq!(record.pid, 0);
        assert_eq!(record.user, "-");
        assert_eq!(record.address, "-");
        assert_eq!(record.fd, "");
        assert_eq!(record.key(), (8080, 0));
    }

    #[test]
    fn key_ignores_cosmetic_fields() {
        let a = PortRecord::active(3000, 1234, "node", "*", "user", "node server.js", "19u");
        let b = PortRecord::active(3000, 1234, "node", "[::1]", "user", "node", "20u");
        assert_eq!(a.key(), b.key());
    }
}
