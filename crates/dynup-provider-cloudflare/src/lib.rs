// # Cloudflare DNS Provider
//
// Implements the `DnsProvider` trait over the Cloudflare API v4:
//
// - resolve_zone: GET `/zones?name=...` (skipped when a zone ID is
//   pre-configured)
// - list_records: GET `/zones/:zone_id/dns_records?type=...`, grouping
//   same-name entries into one record set
// - replace_record: PUT `/zones/:zone_id/dns_records/:record_id` plus
//   DELETE for surplus entries, so the record's published address list is
//   fully replaced
//
// Each operation is a single-shot API interaction; there is no retry,
// backoff, or caching here. Failures propagate to the reconciler, which
// reports them uniformly to the client.
//
// ## Security
//
// The API token never appears in logs, and the Debug implementation
// redacts it.
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/

use async_trait::async_trait;
use dynup_core::config::ProviderConfig;
use dynup_core::traits::{DnsProvider, DnsProviderFactory, RecordSet, RecordType, ZoneHandle};
use dynup_core::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare DNS provider
///
/// Stateless single-shot client for the three zone/record operations the
/// reconciler drives. Safe to share across async tasks.
pub struct CloudflareProvider {
    /// Cloudflare API token; never logged
    api_token: String,

    /// Zone ID (optional, skips zone lookup by name)
    zone_id: Option<String>,

    /// Account ID (optional, narrows zone lookup)
    account_id: Option<String>,

    /// API base URL; overridden in tests
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider.
    ///
    /// `api_token` needs Zone:DNS:Edit permissions; an empty token is a
    /// configuration error.
    pub fn new(
        api_token: impl Into<String>,
        zone_id: Option<String>,
        account_id: Option<String>,
    ) -> Result<Self> {
        Self::with_api_base(api_token, zone_id, account_id, CLOUDFLARE_API_BASE)
    }

    /// Create a provider against a non-default API base URL.
    ///
    /// Mainly useful for testing against a mock server.
    fn with_api_base(
        api_token: impl Into<String>,
        zone_id: Option<String>,
        account_id: Option<String>,
        api_base: impl Into<String>,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::provider("cloudflare", format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_token,
            zone_id,
            account_id,
            api_base: api_base.into(),
            client,
        })
    }

    async fn get_json(&self, url: &str, operation: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(api_error(operation, status, &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("Failed to parse response: {e}")))
    }

    /// List the raw DNS entries matching a type and, optionally, a name.
    ///
    /// Cloudflare models one address per entry, so a multi-address record
    /// set appears as several entries sharing a name.
    async fn list_entries(
        &self,
        zone: &ZoneHandle,
        record_type: RecordType,
        name: Option<&str>,
    ) -> Result<Vec<(String, RecordSet)>> {
        let mut url = format!(
            "{}/zones/{}/dns_records?type={}&per_page=100",
            self.api_base,
            zone.id,
            record_type.as_str()
        );
        if let Some(name) = name {
            url.push_str(&format!("&name={name}"));
        }

        let json = self.get_json(&url, "Record lookup").await?;
        let entries = json["result"].as_array().ok_or_else(|| {
            Error::provider("cloudflare", "Invalid response format: result is not an array")
        })?;

        let mut parsed = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = entry["id"].as_str().ok_or_else(|| {
                Error::provider("cloudflare", "Invalid response format: record.id is not a string")
            })?;
            let entry_name = entry["name"].as_str().ok_or_else(|| {
                Error::provider("cloudflare", "Invalid response format: record.name is not a string")
            })?;
            let content = entry["content"].as_str().ok_or_else(|| {
                Error::provider("cloudflare", "Invalid response format: record.content is not a string")
            })?;
            let address: IpAddr = content
                .parse()
                .map_err(|e| Error::provider("cloudflare", format!("Invalid IP in response: {e}")))?;
            let ttl = entry["ttl"].as_u64().unwrap_or(1) as u32;

            parsed.push((
                id.to_string(),
                RecordSet {
                    name: entry_name.to_string(),
                    ttl,
                    addresses: vec![address],
                },
            ));
        }

        Ok(parsed)
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// Resolve a zone by name.
    ///
    /// A pre-configured zone ID short-circuits the API call. Otherwise the
    /// lookup is `GET /zones?name=...`, narrowed to one account when either
    /// the caller's resource group or the configured account ID names one.
    async fn resolve_zone(
        &self,
        resource_group: Option<&str>,
        zone_name: &str,
    ) -> Result<ZoneHandle> {
        if let Some(ref zone_id) = self.zone_id {
            tracing::debug!("Using pre-configured zone ID for {}", zone_name);
            return Ok(ZoneHandle {
                id: zone_id.clone(),
                name: zone_name.to_string(),
            });
        }

        let mut url = format!("{}/zones?name={}", self.api_base, zone_name);
        if let Some(account) = resource_group.or(self.account_id.as_deref()) {
            url.push_str(&format!("&account.id={account}"));
        }

        tracing::debug!("Looking up zone ID for {}", zone_name);
        let json = self.get_json(&url, "Zone lookup").await?;

        let zones = json["result"].as_array().ok_or_else(|| {
            Error::provider("cloudflare", "Invalid response format: result is not an array")
        })?;

        let zone = zones
            .first()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {zone_name}")))?;

        let zone_id = zone["id"].as_str().ok_or_else(|| {
            Error::provider("cloudflare", "Invalid response format: zone.id is not a string")
        })?;

        tracing::debug!("Found zone ID for {}", zone_name);
        Ok(ZoneHandle {
            id: zone_id.to_string(),
            name: zone_name.to_string(),
        })
    }

    async fn list_records(
        &self,
        zone: &ZoneHandle,
        record_type: RecordType,
    ) -> Result<Vec<RecordSet>> {
        let entries = self.list_entries(zone, record_type, None).await?;

        // Fold same-name entries into one record set per name
        let mut sets: HashMap<String, RecordSet> = HashMap::new();
        for (_, entry) in entries {
            match sets.get_mut(&entry.name) {
                Some(set) => set.addresses.extend(entry.addresses),
                None => {
                    sets.insert(entry.name.clone(), entry);
                }
            }
        }

        Ok(sets.into_values().collect())
    }

    /// Replace a record set's full address list.
    ///
    /// Updates the first matching entry in place and deletes the surplus
    /// ones, so whatever was published under the name before is gone after
    /// the call.
    async fn replace_record(
        &self,
        zone: &ZoneHandle,
        record_type: RecordType,
        name: &str,
        ttl: u32,
        addresses: &[IpAddr],
    ) -> Result<()> {
        let [address] = addresses else {
            return Err(Error::invalid_input(
                "cloudflare provider replaces record sets with exactly one address",
            ));
        };

        let entries = self.list_entries(zone, record_type, Some(name)).await?;
        let Some(((first_id, _), surplus)) = entries.split_first() else {
            return Err(Error::not_found(format!(
                "DNS record not found: {name} (type: {record_type})"
            )));
        };

        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.api_base, zone.id, first_id
        );
        let payload = serde_json::json!({
            "type": record_type.as_str(),
            "name": name,
            "content": address.to_string(),
            "ttl": ttl,
        });

        tracing::info!("Updating Cloudflare record {} -> {} ({})", name, address, record_type);

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(api_error("Record update", status, &error_text));
        }

        // Prune entries beyond the first so exactly one address remains
        for (surplus_id, _) in surplus {
            let url = format!(
                "{}/zones/{}/dns_records/{}",
                self.api_base, zone.id, surplus_id
            );
            let response = self
                .client
                .delete(&url)
                .bearer_auth(&self.api_token)
                .send()
                .await
                .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {e}")))?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                return Err(api_error("Record delete", status, &error_text));
            }
        }

        tracing::info!("Cloudflare record updated: {} -> {}", name, address);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Map an unsuccessful API status code to a provider error.
fn api_error(operation: &str, status: reqwest::StatusCode, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::provider(
            "cloudflare",
            format!("Authentication failed: invalid API token or insufficient permissions. Status: {status}"),
        ),
        404 => Error::not_found(format!("{operation}: no such resource. Status: {status}")),
        429 => Error::provider(
            "cloudflare",
            format!("Rate limit exceeded. Please retry later. Status: {status}"),
        ),
        500..=599 => Error::provider(
            "cloudflare",
            format!("Cloudflare server error (transient): {status} - {body}"),
        ),
        _ => Error::provider("cloudflare", format!("{operation} failed: {status} - {body}")),
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                zone_id,
                account_id,
            } => Ok(Box::new(CloudflareProvider::new(
                api_token.clone(),
                zone_id.clone(),
                account_id.clone(),
            )?)),
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// Hosts call this during startup to make the provider available by its
/// `"cloudflare"` type name.
pub fn register(registry: &dynup_core::ProviderRegistry) {
    registry.register_provider("cloudflare", Box::new(CloudflareFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> CloudflareProvider {
        CloudflareProvider::with_api_base("test_token", None, None, server.uri()).unwrap()
    }

    #[test]
    fn factory_creation() {
        let factory = CloudflareFactory;

        let config = ProviderConfig::Cloudflare {
            api_token: "test_token".to_string(),
            zone_id: Some("test_zone".to_string()),
            account_id: None,
        };

        assert!(factory.create(&config).is_ok());
    }

    #[test]
    fn factory_rejects_missing_token() {
        let factory = CloudflareFactory;

        let config = ProviderConfig::Cloudflare {
            api_token: String::new(),
            zone_id: None,
            account_id: None,
        };

        assert!(matches!(factory.create(&config), Err(Error::Config(_))));
    }

    #[test]
    fn api_token_not_exposed_in_debug() {
        let provider = CloudflareProvider::new("secret_token_12345", None, None).unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(debug_str.contains("CloudflareProvider"));
        assert!(debug_str.contains("REDACTED"));
    }

    #[test]
    fn provider_name() {
        let provider = CloudflareProvider::new("token", None, None).unwrap();
        assert_eq!(provider.provider_name(), "cloudflare");
    }

    #[tokio::test]
    async fn preconfigured_zone_id_skips_lookup() {
        // no mock server mounted; an API call would fail
        let provider =
            CloudflareProvider::with_api_base("token", Some("zone123".to_string()), None, "http://127.0.0.1:1")
                .unwrap();

        let handle = provider.resolve_zone(None, "example.com").await.unwrap();
        assert_eq!(handle.id, "zone123");
        assert_eq!(handle.name, "example.com");
    }

    #[tokio::test]
    async fn resolve_zone_by_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .and(query_param("name", "example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [{"id": "abc123", "name": "example.com"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let handle = provider.resolve_zone(None, "example.com").await.unwrap();
        assert_eq!(handle.id, "abc123");
    }

    #[tokio::test]
    async fn resolve_zone_scopes_to_account() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .and(query_param("name", "example.com"))
            .and(query_param("account.id", "rg-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [{"id": "abc123", "name": "example.com"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        provider
            .resolve_zone(Some("rg-1"), "example.com")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn resolve_zone_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": []})),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider
            .resolve_zone(None, "missing.example")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn resolve_zone_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider
            .resolve_zone(None, "example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
    }

    #[tokio::test]
    async fn list_records_groups_same_name_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones/abc123/dns_records"))
            .and(query_param("type", "A"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [
                    {"id": "r1", "name": "host.example.com", "content": "198.51.100.1", "ttl": 300},
                    {"id": "r2", "name": "host.example.com", "content": "198.51.100.2", "ttl": 300},
                    {"id": "r3", "name": "other.example.com", "content": "203.0.113.9", "ttl": 600},
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let zone = ZoneHandle {
            id: "abc123".to_string(),
            name: "example.com".to_string(),
        };

        let mut sets = provider.list_records(&zone, RecordType::A).await.unwrap();
        sets.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].name, "host.example.com");
        assert_eq!(sets[0].addresses.len(), 2);
        assert_eq!(sets[1].name, "other.example.com");
        assert_eq!(
            sets[1].addresses,
            vec!["203.0.113.9".parse::<IpAddr>().unwrap()]
        );
    }

    #[tokio::test]
    async fn replace_record_updates_first_and_prunes_surplus() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones/abc123/dns_records"))
            .and(query_param("type", "A"))
            .and(query_param("name", "host.example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [
                    {"id": "r1", "name": "host.example.com", "content": "198.51.100.1", "ttl": 300},
                    {"id": "r2", "name": "host.example.com", "content": "198.51.100.2", "ttl": 300},
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/zones/abc123/dns_records/r1"))
            .and(body_partial_json(serde_json::json!({
                "type": "A",
                "name": "host.example.com",
                "content": "203.0.113.5",
                "ttl": 3600,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"id": "r1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/zones/abc123/dns_records/r2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"id": "r2"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let zone = ZoneHandle {
            id: "abc123".to_string(),
            name: "example.com".to_string(),
        };

        provider
            .replace_record(
                &zone,
                RecordType::A,
                "host.example.com",
                3600,
                &["203.0.113.5".parse().unwrap()],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn replace_record_requires_exactly_one_address() {
        let provider =
            CloudflareProvider::with_api_base("token", None, None, "http://127.0.0.1:1").unwrap();
        let zone = ZoneHandle {
            id: "abc".to_string(),
            name: "example.com".to_string(),
        };

        let err = provider
            .replace_record(&zone, RecordType::A, "host.example.com", 300, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
