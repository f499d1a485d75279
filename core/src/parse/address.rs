//! Parsing of `address:port` tokens.

/// Parse an `address:port` token from enumerator output.
///
/// Handles multiple address formats:
/// - IPv4: "127.0.0.1:3000"
/// - Wildcard: "*:8080"
/// - IPv6: "\[::1]:3000" or "\[fe80::1]:8080" (brackets are kept on the host)
///
/// An empty host normalizes to `"*"`. Returns `None` for anything that does
/// not end in a valid port; callers skip the record rather than failing the
/// scan.
pub fn parse_address(token: &str) -> Option<(String, u16)> {
    if token.starts_with('[') {
        // IPv6 form: the port follows the colon right after the closing bracket.
        let close = token.find(']')?;
        let port_str = token[close + 1..].strip_prefix(':')?;
        let port: u16 = port_str.parse().ok()?;
        Some((token[..=close].to_string(), port))
    } else {
        // IPv4/wildcard form: the port is the last colon-delimited segment.
        let (host, port_str) = token.rsplit_once(':')?;
        let port: u16 = port_str.parse().ok()?;
        let host = if host.is_empty() { "*" } else { host };
        Some((host.to_string(), port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4() {
        assert_eq!(
            parse_address("127.0.0.1:3000"),
            Some(("127.0.0.1".to_string(), 3000))
        );
    }

    #[test]
    fn wildcard() {
        assert_eq!(parse_address("*:8080"), Some(("*".to_string(), 8080)));
    }

    #[test]
    fn empty_host_normalizes_to_wildcard() {
        assert_eq!(parse_address(":8080"), Some(("*".to_string(), 8080)));
    }

    #[test]
    fn ipv6_keeps_brackets() {
        assert_eq!(parse_address("[::1]:3000"), Some(("[::1]".to_string(), 3000)));
        assert_eq!(
            parse_address("[fe80::1]:8080"),
            Some(("[fe80::1]".to_string(), 8080))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_address("garbage"), None);
        assert_eq!(parse_address("127.0.0.1:"), None);
        assert_eq!(parse_address("127.0.0.1:notaport"), None);
        assert_eq!(parse_address("127.0.0.1:70000"), None);
    }

    #[test]
    fn rejects_malformed_ipv6() {
        // No closing bracket.
        assert_eq!(parse_address("[::1:3000"), None);
        // No colon after the bracket.
        assert_eq!(parse_address("[::1]3000"), None);
        assert_eq!(parse_address("[::1]"), None);
    }
}
