//! Record reconciliation
//!
//! The Reconciler drives one address-family update against the DNS
//! provider: parse and validate the inputs, resolve the zone, locate the
//! record set with the exact requested name, and either leave it alone,
//! replace its full address list, or report absence.
//!
//! ## Flow
//!
//! ```text
//! reconcile(type, fqdn, address, ttl)
//!     │
//!     ├─ parse address + decompose fqdn     (no provider calls yet)
//!     ├─ zone context (lazy, cached)  ◄── configuration
//!     ├─ resolve_zone ──► DnsProvider
//!     ├─ list_records ──► DnsProvider
//!     └─ replace_record ► DnsProvider       (only on mismatch)
//! ```
//!
//! The public entry point is total over [`UpdateStatus`]: every failure is
//! converted to its wire status and logged, never propagated as a panic.

use crate::config::ZoneConfig;
use crate::error::{Error, Result};
use crate::fqdn;
use crate::status::UpdateStatus;
use crate::traits::{DnsProvider, RecordType};
use std::net::IpAddr;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

/// Provider-side zone identity resolved from configuration
///
/// Populated once per service instance on first use. Unset fields are not
/// an error: reconciliations fall back to the registrable domain decomposed
/// from each request's hostname.
#[derive(Debug, Clone, Default)]
pub struct ZoneContext {
    /// Provider-side container holding the zone, if configured
    pub resource_group_name: Option<String>,
    /// Fixed zone name, if configured
    pub zone_name: Option<String>,
}

impl ZoneContext {
    fn from_config(config: &ZoneConfig) -> Self {
        if config.resource_group_name.is_none() {
            warn!("\"resourceGroupName\" is not configured");
        }
        if config.zone_name.is_none() {
            warn!("\"zoneName\" is not configured, falling back to each request's registrable domain");
        }

        Self {
            resource_group_name: config.resource_group_name.clone(),
            zone_name: config.zone_name.clone(),
        }
    }
}

/// Reconciles one record set per call against the DNS provider
///
/// Holds the provider client and the lazily resolved [`ZoneContext`].
/// Methods take `&self`; a single instance is shared across concurrent
/// requests, and the zone-context initialization is idempotent, so no
/// external locking is needed.
pub struct Reconciler {
    /// DNS provider client
    provider: Box<dyn DnsProvider>,

    /// Zone section of the service configuration
    zone_config: ZoneConfig,

    /// Cached zone context, resolved on first provider access
    zone_context: OnceCell<ZoneContext>,
}

impl Reconciler {
    /// Create a new reconciler over the given provider
    pub fn new(provider: Box<dyn DnsProvider>, zone_config: ZoneConfig) -> Self {
        Self {
            provider,
            zone_config,
            zone_context: OnceCell::new(),
        }
    }

    /// Reconcile the record set named `fqdn` to publish exactly `address`.
    ///
    /// Returns the wire status for this address family:
    /// - `good`: the record existed with a different address and was
    ///   replaced (single address, requested TTL)
    /// - `nochg`: the record already publishes the requested address
    /// - `nohost`: no record with that exact name exists in the zone
    /// - `notfqdn` / `invalidinput`: the hostname or address failed
    ///   validation; no provider call was made
    /// - `othererr`: a provider call failed
    pub async fn reconcile(
        &self,
        record_type: RecordType,
        fqdn: &str,
        address: &str,
        ttl: u32,
    ) -> UpdateStatus {
        match self.try_reconcile(record_type, fqdn, address, ttl).await {
            Ok(status) => status,
            Err(e) => {
                let status = e.as_status();
                if status == UpdateStatus::OtherErr {
                    error!("Failed to update {} record {}: {}", record_type, fqdn, e);
                } else {
                    warn!(
                        "Rejected {} record update for {} ({}): {}",
                        record_type, fqdn, address, e
                    );
                }
                status
            }
        }
    }

    async fn try_reconcile(
        &self,
        record_type: RecordType,
        fqdn: &str,
        address: &str,
        ttl: u32,
    ) -> Result<UpdateStatus> {
        // Validate both inputs before touching the provider
        let ip = parse_address(record_type, address)?;
        let domain = fqdn::decompose(fqdn)?;

        let context = self.zone_context().await;
        let zone_name = context.zone_name.as_deref().unwrap_or(&domain.domain);

        let zone = self
            .provider
            .resolve_zone(context.resource_group_name.as_deref(), zone_name)
            .await
            .map_err(|e| Error::provider(self.provider.provider_name(), e.to_string()))?;

        let records = self
            .provider
            .list_records(&zone, record_type)
            .await
            .map_err(|e| Error::provider(self.provider.provider_name(), e.to_string()))?;

        let Some(record) = records.iter().find(|r| r.name == domain.fqdn) else {
            debug!("No {} record named {} in zone {}", record_type, fqdn, zone_name);
            return Ok(UpdateStatus::NoHost);
        };

        if record.addresses.contains(&ip) {
            info!("IP update not required. Domain: {}, ip: {}", domain.fqdn, ip);
            return Ok(UpdateStatus::NoChg);
        }

        info!("IP update. Domain: {}, ip: {}", domain.fqdn, ip);
        self.provider
            .replace_record(&zone, record_type, &domain.fqdn, ttl, &[ip])
            .await
            .map_err(|e| Error::provider(self.provider.provider_name(), e.to_string()))?;

        Ok(UpdateStatus::Good)
    }

    /// Resolve the zone context, reading configuration on first use only.
    ///
    /// Safe to race from concurrent first requests: the initializer is
    /// idempotent and the cell stores a single result.
    async fn zone_context(&self) -> &ZoneContext {
        self.zone_context
            .get_or_init(|| async { ZoneContext::from_config(&self.zone_config) })
            .await
    }
}

fn parse_address(record_type: RecordType, address: &str) -> Result<IpAddr> {
    let ip: IpAddr = address
        .trim()
        .parse()
        .map_err(|_| Error::invalid_input(format!("{address} is not a valid IP address")))?;

    if !record_type.matches(&ip) {
        return Err(Error::invalid_input(format!(
            "{address} is not a valid {record_type} record address"
        )));
    }

    Ok(ip)
}
