// # Update Status Model
//
// The closed set of outcome codes reported to clients, matching the
// vocabulary of the classic dyndns/no-ip update protocol, and the
// precedence rule used to merge the IPv4 and IPv6 results of one request
// into a single response code.

use serde::{Deserialize, Serialize};

/// Outcome of one record reconciliation
///
/// Exactly one value is produced per address family. The wire names are the
/// lowercase strings returned by [`UpdateStatus::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    /// Record was created or changed to the requested address
    Good,
    /// Record already matched the requested address
    NoChg,
    /// No record with the requested name exists in the zone
    NoHost,
    /// Hostname failed FQDN decomposition
    NotFqdn,
    /// Address or hostname failed syntactic parsing
    InvalidInput,
    /// Credential check failed
    BadAuth,
    /// Any other failure, including provider and network errors
    OtherErr,
}

impl UpdateStatus {
    /// The protocol name of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Good => "good",
            UpdateStatus::NoChg => "nochg",
            UpdateStatus::NoHost => "nohost",
            UpdateStatus::NotFqdn => "notfqdn",
            UpdateStatus::InvalidInput => "invalidinput",
            UpdateStatus::BadAuth => "badauth",
            UpdateStatus::OtherErr => "othererr",
        }
    }
}

impl std::fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merge the IPv4 and IPv6 reconciliation results into one response code.
///
/// A client sees success if either family succeeded, "no change" only when
/// both families needed no change, and otherwise the most actionable
/// failure. Precedence, highest first: `good`, `nochg` (both sides),
/// `badauth`, `invalidinput`; everything else falls through to whichever
/// side actually failed, preferring the IPv4 result on full ties.
pub fn combine(v4: UpdateStatus, v6: UpdateStatus) -> UpdateStatus {
    use UpdateStatus::*;

    if v4 == Good || v6 == Good {
        return Good;
    }
    if v4 == NoChg && v6 == NoChg {
        return NoChg;
    }
    if v4 == BadAuth || v6 == BadAuth {
        return BadAuth;
    }
    if v4 == InvalidInput || v6 == InvalidInput {
        return InvalidInput;
    }
    if v4 != NoChg { v4 } else { v6 }
}
