//! Parsing of listening-socket and process-table enumerator output.
//!
//! Expected socket listing format (header line, then ≥9 whitespace-delimited
//! columns per row):
//!
//! ```text
//! COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
//! node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
//! ```
//!
//! Any row that cannot be fully parsed is dropped; a garbled line must never
//! abort the whole scan.

use std::collections::{HashMap, HashSet};

use crate::domain::PortRecord;

use super::address::parse_address;

/// Longest command line kept before `...`-truncation.
pub const MAX_COMMAND_LEN: usize = 200;

/// Parse the socket listing into de-duplicated, port-sorted records.
///
/// `commands` maps PIDs to full command lines (see [`build_command_map`]);
/// rows whose PID is absent from the map fall back to the un-escaped process
/// name. Rows sharing a `(port, pid)` key collapse to the first occurrence.
pub fn parse_listing(output: &str, commands: &HashMap<u32, String>) -> Vec<PortRecord> {
    let mut records = Vec::new();
    let mut seen: HashSet<(u16, u32)> = HashSet::new();

    // First line is the column header.
    for line in output.lines().skip(1) {
        if line.is_empty() {
            continue;
        }

        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() < 9 {
            continue;
        }

        let process_name = unescape_name(columns[0]);

        let pid: u32 = match columns[1].parse() {
            Ok(p) => p,
            Err(_) => continue,
        };

        let user = columns[2];
        let fd = columns[3];

        // The NAME column is not at a fixed index once trailing state
        // annotations appear, so scan from the end for the first token with
        // a colon that is neither a device id (0x...) nor a size marker
        // (0t...). Best-effort heuristic; anything it misses is skipped.
        let Some(address_token) = columns[8..]
            .iter()
            .rev()
            .find(|c| c.contains(':') && !c.starts_with("0x") && !c.starts_with("0t"))
        else {
            continue;
        };

        let Some((address, port)) = parse_address(address_token) else {
            continue;
        };

        let command = commands
            .get(&pid)
            .cloned()
            .unwrap_or_else(|| process_name.clone());

        // First occurrence wins.
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

    // Stable, so rows on the same port keep their encounter order.
    records.sort_by_key(|r| r.port);
    records
}

/// Build the PID → full command line map from process-table output.
///
/// Input format: header line, then `<pid><whitespace><command...>` per line.
/// The command keeps its embedded spaces; lines with an unparseable PID are
/// skipped.
pub fn build_command_map(output: &str) -> HashMap<u32, String> {
    let mut commands = HashMap::new();

    for line in output.lines().skip(1) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Split once: PID, then the rest of the line as the command.
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

        commands.insert(pid, truncate_command(rest.trim()));
    }

    commands
}

/// Truncate a command line to [`MAX_COMMAND_LEN`] characters plus `...`.
/// Counts characters, not bytes, so multi-byte text never splits mid-char.
pub(crate) fn truncate_command(command: &str) -> String {
    match command.char_indices().nth(MAX_COMMAND_LEN) {
        Some((idx, _)) => format!("{}...", &command[..idx]),
        None => command.to_string(),
    }
}

/// Un-escape the two escapes the socket enumerator emits in process names.
fn unescape_name(raw: &str) -> String {
    raw.replace("\\x20", " ").replace("\\x2f", "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME\n";

    fn listing(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }

    #[test]
    fn end_to_end_row() {
        let output = listing(&[
            "node 1234 bob 19u IPv6 0x0 0t0 TCP [::1]:3000 (LISTEN)",
        ]);
        let commands = HashMap::from([(1234, "node server.js".to_string())]);

        let records = parse_listing(&output, &commands);
        assert_eq!(records.len(), 1);

        let r = &records[0];
        assert_eq!(r.port, 3000);
        assert_eq!(r.pid, 1234);
        assert_eq!(r.process_name, "node");
        assert_eq!(r.user, "bob");
        assert_eq!(r.fd, "19u");
        assert_eq!(r.address, "[::1]");
        assert_eq!(r.command, "node server.js");
        assert!(r.is_active);
    }

    #[test]
    fn parse_is_idempotent() {
        let output = listing(&[
            "node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)",
            "nginx        1  root    6u  IPv4 0x1234567890abcdef      0t0  TCP *:80 (LISTEN)",
        ]);
        let commands = HashMap::new();

        let first = parse_listing(&output, &commands);
        let second = parse_listing(&output, &commands);
        assert_eq!(first, second);
    }

    #[test]
    fn sorted_ascending_by_port() {
        let output = listing(&[
            "node 34805 code 19u IPv6 0x0 0t0 TCP [::1]:3000 (LISTEN)",
            "nginx 1 root 6u IPv4 0x0 0t0 TCP *:80 (LISTEN)",
            "postgres 99 postgres 7u IPv4 0x0 0t0 TCP 127.0.0.1:5432 (LISTEN)",
        ]);

        let records = parse_listing(&output, &HashMap::new());
        let ports: Vec<u16> = records.iter().map(|r| r.port).collect();
        assert_eq!(ports, vec![80, 3000, 5432]);
        for pair in records.windows(2) {
            assert!(pair[0].port <= pair[1].port);
        }
    }

    #[test]
    fn duplicate_key_keeps_first_occurrence() {
        // Same (port, pid), different descriptor and address.
        let output = listing(&[
            "node 1234 code 19u IPv4 0x0 0t0 TCP 127.0.0.1:3000 (LISTEN)",
            "node 1234 code 20u IPv6 0x0 0t0 TCP [::1]:3000 (LISTEN)",
        ]);

        let records = parse_listing(&output, &HashMap::new());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fd, "19u");
        assert_eq!(records[0].address, "127.0.0.1");
    }

    #[test]
    fn unescapes_process_name() {
        let output = listing(&[
            "Visual\\x20Studio\\x20Code 4321 dev 22u IPv4 0x0 0t0 TCP 127.0.0.1:9229 (LISTEN)",
        ]);

        let records = parse_listing(&output, &HashMap::new());
        assert_eq!(records[0].process_name, "Visual Studio Code");
    }

    #[test]
    fn command_falls_back_to_process_name() {
        let output = listing(&[
            "Code\\x20Helper 1234 user 10u IPv4 0x0 0t0 TCP *:3000 (LISTEN)",
        ]);

        let records = parse_listing(&output, &HashMap::new());
        assert_eq!(records[0].command, "Code Helper");
    }

    #[test]
    fn malformed_rows_are_dropped() {
        let output = listing(&[
            // Too few columns.
            "node 1234 code 19u IPv6 TCP [::1]:3000",
            // Non-numeric PID.
            "node abc code 19u IPv6 0x0 0t0 TCP [::1]:3001 (LISTEN)",
            // No address column.
            "node 1234 code 19u IPv6 0x0 0t0 TCP nothing (LISTEN)",
            // Unparseable address.
            "node 1234 code 19u IPv6 0x0 0t0 TCP bad:port (LISTEN)",
            // Healthy row.
            "nginx 1 root 6u IPv4 0x0 0t0 TCP *:80 (LISTEN)",
        ]);

        let records = parse_listing(&output, &HashMap::new());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].port, 80);
    }

    #[test]
    fn address_column_scan_skips_device_and_size_tokens() {
        // Trailing tokens with colons that are device ids (0x...) or size
        // markers (0t...) must not be mistaken for the address column.
        let output = listing(&[
            "node 1234 code 19u IPv6 0xdead 0t0 TCP *:4000 0x12:34 0t1:2",
        ]);

        let records = parse_listing(&output, &HashMap::new());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].port, 4000);
        assert_eq!(records[0].address, "*");
    }

    #[test]
    fn empty_and_header_only_input() {
        assert!(parse_listing("", &HashMap::new()).is_empty());
        assert!(parse_listing(HEADER, &HashMap::new()).is_empty());
    }

    #[test]
    fn builds_command_map_preserving_spaces() {
        let output = "  PID COMMAND\n\
                      1234 node server.js --port 3000\n\
                      5678 /usr/sbin/nginx -g daemon off;\n";

        let map = build_command_map(output);
        assert_eq!(map[&1234], "node server.js --port 3000");
        assert_eq!(map[&5678], "/usr/sbin/nginx -g daemon off;");
    }

    #[test]
    fn command_map_skips_bad_pids_and_degrades_to_empty() {
        let output = "  PID COMMAND\nnotapid some command\n";
        assert!(build_command_map(output).is_empty());
        assert!(build_command_map("").is_empty());
    }

    #[test]
    fn long_commands_are_truncated_with_ellipsis() {
        let long = "x".repeat(250);
        let output = format!("  PID COMMAND\n1234 {}\n", long);

        let map = build_command_map(&output);
        let command = &map[&1234];
        assert_eq!(command.len(), MAX_COMMAND_LEN + 3);
        assert!(command.ends_with("..."));
        assert_eq!(&command[..MAX_COMMAND_LEN], &long[..MAX_COMMAND_LEN]);
    }

    #[test]
    fn truncation_is_char_boundary_safe() {
        let long: String = "é".repeat(MAX_COMMAND_LEN + 1);
        let truncated = truncate_command(&long);
        assert_eq!(truncated.chars().count(), MAX_COMMAND_LEN + 3);
        assert!(truncated.ends_with("..."));
    }
}
