//! macOS enumerators: lsof for listening sockets, ps for command lines.

use std::collections::HashMap;

use tracing::warn;

use crate::domain::PortRecord;
use crate::error::Result;
use crate::parse::{build_command_map, parse_listing};

use super::{run_enumerator, Scanner};

/// macOS-specific port scanner.
pub struct DarwinScanner;

impl DarwinScanner {
    /// Create a new macOS scanner.
    pub fn new() -> Self {
        Self
    }

    /// Collect the PID → full command line map via `ps -axo pid,command`.
    ///
    /// Degrades to an empty map on failure: process names from the socket
    /// listing alone still make a useful scan.
    async fn command_map(&self) -> HashMap<u32, String> {
        match run_enumerator("/bin/ps", &["-axo", "pid,command"]).await {
            Ok(output) => build_command_map(&output),
            Err(e) => {
                warn!(error = %e, "command-line lookup unavailable");
                HashMap::new()
            }
        }
    }
}

impl Default for DarwinScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for DarwinScanner {
    /// Scan all listening TCP ports.
    ///
    /// Executes: `lsof -iTCP -sTCP:LISTEN -P -n +c 0`
    ///
    /// Flags explained:
    /// - -iTCP: show only TCP connections
    /// - -sTCP:LISTEN: show only listening sockets
    /// - -P: show port numbers (don't resolve to service names)
    /// - -n: show IP addresses (don't resolve to hostnames)
    /// - +c 0: show full command name (unlimited length)
    async fn scan(&self) -> Result<Vec<PortRecord>> {
        // The two enumerators have no ordering dependency; run them
        // concurrently and parse once both are in.
        let (listing, commands) = tokio::join!(
            run_enumerator(
                "/usr/sbin/lsof",
                &["-iTCP", "-sTCP:LISTEN", "-P", "-n", "+c", "0"],
            ),
            self.command_map(),
        );

        Ok(parse_listing(&listing?, &commands))
    }
}
