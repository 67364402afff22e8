//! # plumrs Network Utilities (`common::network`)
//!
//! File: cli/src/common/network.rs
//!
//! ## Overview
//!
//! Address handling for the host-oriented subcommands:
//!
//! - **`host_range`**: the 254 host addresses of a three-octet prefix
//!   (`P.1` .. `P.254`), the target list for `plum pping`.
//! - **`ping`**: the ping probe. One packet, three second reply timeout; any
//!   failure simply means "not reachable".
//! - **`is_ip_shorthand` / `expand_host`**: short host identifiers such as `5`
//!   or `100.5` completed from a configured prefix.
//! - **`ipmi_address`**: the out-of-band address of a host, offset from its
//!   last octet by the configured `ipmi_interval`.
//!
use crate::common::process::{quote, CommandRunner};
use crate::common::scan::ProbeOutcome;
use crate::core::constants::os::PING;
use crate::core::error::PlumError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::Ipv4Addr;
use tracing::trace;

const DOT: char = '.';
/// Number of dots in a full IPv4 address.
const FULL_DOTS: usize = 3;

/// Joins `prefix` and `suffix` with exactly one dot.
pub fn join_prefix(prefix: &str, suffix: &str) -> String {
    if prefix.ends_with(DOT) {
        format!("{}{}", prefix, suffix)
    } else {
        format!("{}{}{}", prefix, DOT, suffix)
    }
}

/// `prefix.1` through `prefix.254`.
pub fn host_range(prefix: &str) -> Vec<String> {
    (1..=254).map(|i| join_prefix(prefix, &i.to_string())).collect()
}

/// Ping probe: matched when the host answers a single echo request.
pub fn ping(runner: &dyn CommandRunner, ip: String) -> ProbeOutcome<String> {
    let command = format!("{} {}", PING, quote(&ip));
    match runner.run(&command, None, None) {
        Ok(_) => ProbeOutcome::matched(ip),
        Err(e) => {
            trace!("{} unreachable: {}", ip, e);
            ProbeOutcome::unmatched(ip)
        }
    }
}

static SHORTHAND_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+\.){0,3}\d+$").expect("static IP shorthand pattern is valid")
});

/// `true` for `5`, `100.5`, `10.100.5` and full dotted addresses; `false` for aliases.
pub fn is_ip_shorthand(host: &str) -> bool {
    SHORTHAND_PATTERN.is_match(host)
}

/// `true` when `host` already has all four octets.
pub fn is_full_address(host: &str) -> bool {
    host.matches(DOT).count() >= FULL_DOTS
}

/// Completes a short host from the leading octets of `prefix`.
///
/// `"5"` with prefix `"10.10.100"` gives `"10.10.100.5"`, `"1.5"` gives
/// `"10.10.1.5"`, and a full address is returned unchanged.
pub fn expand_host(host: &str, prefix: &str) -> String {
    if is_full_address(host) {
        return host.to_string();
    }
    let dots = host.matches(DOT).count();
    let head: Vec<&str> = prefix
        .split(DOT)
        .filter(|part| !part.is_empty())
        .take(FULL_DOTS - dots)
        .collect();
    if head.is_empty() {
        return host.to_string();
    }
    format!("{}{}{}", head.join("."), DOT, host)
}

/// Adds `interval` to the last octet of `ip`.
///
/// # Errors
///
/// `PlumError::InvalidHost` when `ip` is not a full IPv4 address or the new
/// octet would exceed 255.
pub fn ipmi_address(ip: &str, interval: u8) -> Result<String, PlumError> {
    let addr: Ipv4Addr = ip.parse().map_err(|_| PlumError::InvalidHost {
        host: ip.to_string(),
        reason: "not an IPv4 address".into(),
    })?;
    let [a, b, c, d] = addr.octets();
    let last = d.checked_add(interval).ok_or_else(|| PlumError::InvalidHost {
        host: ip.to_string(),
        reason: format!("last octet {} + ipmi_interval {} exceeds 255", d, interval),
    })?;
    Ok(Ipv4Addr::new(a, b, c, last).to_string())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::process::testing::ScriptedRunner;

    #[test]
    fn test_host_range_covers_1_to_254() {
        let hosts = host_range("1.1.1");
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts[0], "1.1.1.1");
        assert_eq!(hosts[253], "1.1.1.254");
    }

    #[test]
    fn test_trailing_dot_is_not_doubled() {
        assert_eq!(host_range("10.0.0.")[4], "10.0.0.5");
        assert_eq!(join_prefix("10.0.0.", "7"), "10.0.0.7");
        assert_eq!(join_prefix("10.0.0", "7"), "10.0.0.7");
    }

    #[test]
    fn test_ping_success_and_failure() {
        let runner = ScriptedRunner::new().ok("ping -W 3 -c 1 2.2.2.2", "64 bytes from 2.2.2.2");
        assert!(ping(&runner, "2.2.2.2".into()).matched);
        assert!(!ping(&runner, "1.1.1.999".into()).matched);
        assert_eq!(
            runner.commands(),
            vec!["ping -W 3 -c 1 2.2.2.2", "ping -W 3 -c 1 1.1.1.999"]
        );
    }

    #[test]
    fn test_ping_timeout_is_unreachable() {
        let runner = ScriptedRunner::new().timeout("ping -W 3 -c 1 3.3.3.3");
        assert!(!ping(&runner, "3.3.3.3".into()).matched);
    }

    #[test]
    fn test_is_ip_shorthand() {
        for host in ["5", "100.5", "10.100.5", "10.10.100.5"] {
            assert!(is_ip_shorthand(host), "{} should be shorthand", host);
        }
        for host in ["github", "web-1", "1.2.3.4.5", "", "1..2"] {
            assert!(!is_ip_shorthand(host), "{} should not be shorthand", host);
        }
    }

    #[test]
    fn test_expand_host() {
        assert_eq!(expand_host("5", "10.10.100"), "10.10.100.5");
        assert_eq!(expand_host("1.5", "10.10.100"), "10.10.1.5");
        assert_eq!(expand_host("20.1.5", "10.10.100"), "10.20.1.5");
        assert_eq!(expand_host("8.8.8.8", "10.10.100"), "8.8.8.8");
        assert_eq!(expand_host("5", "10.10.100."), "10.10.100.5");
        assert!(is_full_address("8.8.8.8"));
        assert!(!is_full_address("8.8"));
    }

    #[test]
    fn test_ipmi_address() {
        assert_eq!(ipmi_address("10.10.100.1", 100).unwrap(), "10.10.100.101");
        assert!(matches!(
            ipmi_address("10.10.100.200", 100),
            Err(PlumError::InvalidHost { .. })
        ));
        assert!(ipmi_address("not-an-ip", 1).is_err());
    }
}
