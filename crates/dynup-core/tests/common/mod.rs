//! Test doubles and common utilities for the reconciliation tests
//!
//! Provides an in-memory DnsProvider that records every call so tests can
//! assert both the returned statuses and the exact provider traffic.

use async_trait::async_trait;
use dynup_core::config::{AuthConfig, ProviderConfig, ServiceConfig, ZoneConfig};
use dynup_core::error::{Error, Result};
use dynup_core::traits::{DnsProvider, RecordSet, RecordType, ZoneHandle};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Username configured in [`test_config`]
pub const TEST_USERNAME: &str = "aladdin";

/// Password configured in [`test_config`]
pub const TEST_PASSWORD: &str = "opensesame";

/// A scripted DnsProvider backed by an in-memory record table
///
/// All state lives behind `Arc`s, so a clone shares the record table and
/// call counters with the instance handed to the reconciler; tests keep
/// one handle for assertions.
#[derive(Clone, Default)]
pub struct FakeDnsProvider {
    /// Record table keyed by type + exact record name
    records: Arc<Mutex<HashMap<(RecordType, String), RecordSet>>>,
    /// Zone names passed to resolve_zone, in call order
    resolved_zones: Arc<Mutex<Vec<String>>>,
    /// Call counters
    resolve_calls: Arc<AtomicUsize>,
    list_calls: Arc<AtomicUsize>,
    replace_calls: Arc<AtomicUsize>,
    /// When set, every operation fails with this message
    fail_message: Arc<Mutex<Option<String>>>,
}

impl FakeDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record set (builder style)
    pub fn with_record(
        self,
        record_type: RecordType,
        name: &str,
        ttl: u32,
        addresses: &[&str],
    ) -> Self {
        let record = RecordSet {
            name: name.to_string(),
            ttl,
            addresses: addresses
                .iter()
                .map(|a| a.parse::<IpAddr>().expect("test address parses"))
                .collect(),
        };
        self.records
            .lock()
            .unwrap()
            .insert((record_type, name.to_string()), record);
        self
    }

    /// Make every subsequent provider call fail
    pub fn fail_with(&self, message: &str) {
        *self.fail_message.lock().unwrap() = Some(message.to_string());
    }

    /// The record set currently stored for a name, if any
    pub fn stored(&self, record_type: RecordType, name: &str) -> Option<RecordSet> {
        self.records
            .lock()
            .unwrap()
            .get(&(record_type, name.to_string()))
            .cloned()
    }

    /// Zone names requested through resolve_zone, in call order
    pub fn resolved_zones(&self) -> Vec<String> {
        self.resolved_zones.lock().unwrap().clone()
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn replace_calls(&self) -> usize {
        self.replace_calls.load(Ordering::SeqCst)
    }

    /// Total provider calls of any kind
    pub fn total_calls(&self) -> usize {
        self.resolve_calls() + self.list_calls() + self.replace_calls()
    }

    fn check_failure(&self) -> Result<()> {
        if let Some(message) = self.fail_message.lock().unwrap().clone() {
            return Err(Error::provider("fake", message));
        }
        Ok(())
    }
}

#[async_trait]
impl DnsProvider for FakeDnsProvider {
    async fn resolve_zone(
        &self,
        _resource_group: Option<&str>,
        zone_name: &str,
    ) -> Result<ZoneHandle> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.resolved_zones
            .lock()
            .unwrap()
            .push(zone_name.to_string());
        self.check_failure()?;

        Ok(ZoneHandle {
            id: format!("zone-{zone_name}"),
            name: zone_name.to_string(),
        })
    }

    async fn list_records(
        &self,
        _zone: &ZoneHandle,
        record_type: RecordType,
    ) -> Result<Vec<RecordSet>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|((rtype, _), _)| *rtype == record_type)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn replace_record(
        &self,
        _zone: &ZoneHandle,
        record_type: RecordType,
        name: &str,
        ttl: u32,
        addresses: &[IpAddr],
    ) -> Result<()> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        self.records.lock().unwrap().insert(
            (record_type, name.to_string()),
            RecordSet {
                name: name.to_string(),
                ttl,
                addresses: addresses.to_vec(),
            },
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// Minimal valid service configuration for tests
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        provider: ProviderConfig::Cloudflare {
            api_token: "test-token".to_string(),
            zone_id: None,
            account_id: None,
        },
        zone: ZoneConfig::default(),
        auth: AuthConfig {
            client_username: Some(TEST_USERNAME.to_string()),
            client_password: Some(TEST_PASSWORD.to_string()),
        },
        ttl_secs: 3600,
    }
}
