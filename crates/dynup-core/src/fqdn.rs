// # FQDN Decomposer
//
// Validates a hostname and splits it into its registrable zone domain and
// the subdomain in front of it. Pure string operation, no side effects.
//
// A name is only accepted when it carries a subdomain: the last two
// dot-separated labels form the zone domain, everything before them is the
// subdomain. `host.sub.example.com` decomposes into subdomain `host.sub`
// and domain `example.com`; `example.com` itself is rejected.

use crate::error::{Error, Result};
use std::net::IpAddr;

/// A validated hostname split into zone domain and subdomain
///
/// Invariants: `domain` has exactly two labels, `fqdn` has strictly more,
/// and `subdomain + "." + domain` reconstructs `fqdn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecomposedFqdn {
    /// The full hostname as requested
    pub fqdn: String,
    /// The registrable zone domain (last two labels)
    pub domain: String,
    /// Everything in front of the zone domain
    pub subdomain: String,
}

/// Maximum total hostname length per RFC 1035
const MAX_NAME_LEN: usize = 253;

/// Maximum label length per RFC 1035
const MAX_LABEL_LEN: usize = 63;

/// Validate `fqdn` and split it into zone domain and subdomain.
///
/// Returns `Error::InvalidInput` when the string is not syntactically a DNS
/// hostname (empty, invalid characters, overlong, or a bare IP literal) and
/// `Error::NotFqdn` when it is a valid hostname without a subdomain.
pub fn decompose(fqdn: &str) -> Result<DecomposedFqdn> {
    validate_hostname(fqdn)?;

    let labels: Vec<&str> = fqdn.split('.').collect();
    if labels.len() <= 2 {
        return Err(Error::not_fqdn(format!(
            "{fqdn} does not contain a subdomain"
        )));
    }

    let domain = format!("{}.{}", labels[labels.len() - 2], labels[labels.len() - 1]);
    let subdomain = fqdn
        .strip_suffix(&format!(".{domain}"))
        .unwrap_or_default()
        .to_string();

    Ok(DecomposedFqdn {
        fqdn: fqdn.to_string(),
        domain,
        subdomain,
    })
}

/// Basic DNS hostname validation per RFC 1035 label rules.
fn validate_hostname(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_input("hostname is empty"));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(Error::invalid_input(format!(
            "hostname too long: {} chars (max {MAX_NAME_LEN})",
            name.len()
        )));
    }

    // An IP literal is hostname-shaped but never a record name
    if name.parse::<IpAddr>().is_ok() {
        return Err(Error::invalid_input(format!(
            "{name} is an IP literal, not a hostname"
        )));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(Error::invalid_input(format!(
                "hostname has an empty label: {name}"
            )));
        }

        if label.len() > MAX_LABEL_LEN {
            return Err(Error::invalid_input(format!(
                "hostname label too long: {} chars (max {MAX_LABEL_LEN})",
                label.len()
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::invalid_input(format!(
                "hostname label contains invalid characters: {label}"
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::invalid_input(format!(
                "hostname label cannot start or end with a hyphen: {label}"
            )));
        }
    }

    Ok(())
}
