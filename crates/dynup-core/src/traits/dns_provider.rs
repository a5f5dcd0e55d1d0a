// # DNS Provider Trait
//
// Defines the interface for reading and replacing address record sets via
// a provider's API. The reconciler owns all decision logic; a provider is a
// thin, stateless client for three remote operations:
//
// - resolve a zone by name into an opaque handle
// - list the address record sets of one type in a zone
// - replace one record set's full address list and TTL
//
// Providers perform one API round trip per operation, without retrying or
// caching between requests; each failure is returned as-is and the
// reconciler maps it to the client-facing status. Deciding whether an
// update is needed at all belongs to the reconciler.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Address record type managed by the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// The DNS name of this record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Whether `ip` belongs to this record type's address family
    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            RecordType::A => ip.is_ipv4(),
            RecordType::Aaaa => ip.is_ipv6(),
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque handle to a provider-side zone
///
/// Returned by [`DnsProvider::resolve_zone`] and passed back into the
/// record operations so providers can carry whatever identity they need
/// (an API zone ID, a path fragment) without the reconciler knowing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneHandle {
    /// Provider-specific zone identifier
    pub id: String,
    /// The zone name the handle was resolved for
    pub name: String,
}

/// One address record set as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    /// Fully-qualified record name
    pub name: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// The published addresses
    pub addresses: Vec<IpAddr>,
}

/// Trait for DNS provider implementations
///
/// Implementations must be thread-safe and usable across async tasks. All
/// three operations are fallible remote calls; errors are opaque to the
/// reconciler, which reports them uniformly as `othererr`.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve a zone by name into a handle for record operations.
    ///
    /// `resource_group` optionally names the provider-side container the
    /// zone lives in; providers without such a concept ignore it.
    async fn resolve_zone(
        &self,
        resource_group: Option<&str>,
        zone_name: &str,
    ) -> Result<ZoneHandle>;

    /// List the zone's record sets of the given type.
    async fn list_records(
        &self,
        zone: &ZoneHandle,
        record_type: RecordType,
    ) -> Result<Vec<RecordSet>>;

    /// Replace one record set's full address list and TTL.
    ///
    /// The provider must overwrite the record's complete address list with
    /// `addresses`; stale addresses published under the same name are
    /// pruned, never merged.
    async fn replace_record(
        &self,
        zone: &ZoneHandle,
        record_type: RecordType,
        name: &str,
        ttl: u32,
        addresses: &[IpAddr],
    ) -> Result<()>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>>;
}
