//! Linux enumerators: ss for listening sockets, ps for users and commands.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::domain::PortRecord;
use crate::error::Result;
use crate::parse::{parse_address, truncate_command};

use super::{run_enumerator, Scanner};

/// Linux-specific port scanner.
pub struct LinuxScanner;

/// Per-process fields enriched from the process table.
struct ProcessEntry {
    user: String,
    command: String,
}

/// Matches the ss process column: `users:(("name",pid=123,fd=4))`.
/// Only the first process of a shared socket is taken.
fn process_column() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"users:\(\("(.+?)",pid=(\d+),fd=(\d+)\)"#).expect("static regex")
    })
}

impl LinuxScanner {
    /// Create a new Linux scanner.
    pub fn new() -> Self {
        Self
    }

    /// Collect per-PID user and command via `ps -axo pid,user,command`.
    ///
    /// Degrades to an empty map on failure; records then carry placeholder
    /// users and fall back to the short process name as command.
    async fn process_table(&self) -> HashMap<u32, ProcessEntry> {
        match run_enumerator("/bin/ps", &["-axo", "pid,user,command"]).await {
            Ok(output) => parse_process_table(&output),
            Err(e) => {
                warn!(error = %e, "process table unavailable");
                HashMap::new()
            }
        }
    }
}

impl Default for LinuxScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for LinuxScanner {
    /// Scan all listening TCP ports.
    ///
    /// Executes: `ss -Htlnp`
    ///
    /// Flags explained:
    /// - -H: suppress the header line
    /// - -t: display only TCP sockets
    /// - -l: display listening sockets
    /// - -n: don't resolve service names
    /// - -p: show the process using each socket
    async fn scan(&self) -> Result<Vec<PortRecord>> {
        // No ordering dependency between the two enumerators.
        let (listing, table) = tokio::join!(
            run_enumerator("/usr/sbin/ss", &["-Htlnp"]),
            self.process_table(),
        );

        Ok(parse_ss_listing(&listing?, &table))
    }
}

/// Parse ss output into de-duplicated, port-sorted records.
///
/// Expected format (header already suppressed by -H):
/// ```text
/// LISTEN 0 4096 [::ffff:127.0.0.1]:63342 *:* users:(("rustrover",pid=53561,fd=54))
/// ```
fn parse_ss_listing(output: &str, table: &HashMap<u32, ProcessEntry>) -> Vec<PortRecord> {
    let mut records = Vec::new();
    let mut seen: HashSet<(u16, u32)> = HashSet::new();

    for line in output.lines() {
        if line.is_empty() {
            continue;
        }

        // Columns: State Recv-Q Send-Q Local:Port Peer:Port Process
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() < 6 {
            continue;
        }

        let Some(caps) = process_column().captures(line) else {
            continue;
        };

        let process_name = caps[1].to_string();
        let pid: u32 = match caps[2].parse() {
            Ok(p) => p,
            Err(_) => continue,
        };
        let fd = caps[3].to_string();

        let Some((address, port)) = parse_address(columns[3]) else {
            continue;
        };

        // Enrich from the process table when available; a missing entry
        // must not drop the record.
        let (user, command) = match table.get(&pid) {
            Some(entry) => (entry.user.clone(), entry.command.clone()),
            None => ("-".to_string(), process_name.clone()),
        };

        if !seen.insert((port, pid)) {
            continue;
        }

        records.push(PortRecord::active(
            port,
            pid,
            process_name,
            address,
            user,
            command,
            fd,
        ));
    }

    records.sort_by_key(|r| r.port);
    records
}

/// Parse `ps -axo pid,user,command` output (header line first).
fn parse_process_table(output: &str) -> HashMap<u32, ProcessEntry> {
    let mut entries = HashMap::new();

    for line in output.lines().skip(1) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // PID, then user, then the rest of the line as the command so
        // embedded spaces survive.
        let mut fields = trimmed.splitn(2, char::is_whitespace);
        let Some(pid_str) = fields.next() else {
            continue;
        };
        let Some(rest) = fields.next() else {
            continue;
        };

        let pid: u32 = match pid_str.parse() {
            Ok(p) => p,
            Err(_) => continue,
        };

        let mut fields = rest.trim_start().splitn(2, char::is_whitespace);
        let Some(user) = fields.next() else {
            continue;
        };
        let Some(command) = fields.next() else {
            continue;
        };

        entries.insert(
            pid,
            ProcessEntry {
                user: user.to_string(),
                command: truncate_command(command.trim_start()),
            },
        );
    }

    entries
}
