//! Configuration types for the update endpoint
//!
//! This module defines all configuration structures used throughout the
//! crate. The daemon populates them from its environment; the types also
//! deserialize from JSON for embedding.

use serde::{Deserialize, Serialize};

/// Default TTL applied to replaced records when none is configured
pub const DEFAULT_TTL_SECS: u32 = 3600;

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Zone scoping configuration
    #[serde(default)]
    pub zone: ZoneConfig,

    /// Client authorization configuration
    pub auth: AuthConfig,

    /// TTL (seconds) written on record replacement
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u32,
}

impl ServiceConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

/// Zone scoping configuration
///
/// Both fields are optional. When `zone_name` is unset, each update falls
/// back to the registrable domain decomposed from the request's hostname.
/// `resource_group_name` scopes zone lookup for providers that group zones
/// into named containers; providers without that concept ignore it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Provider-side container holding the zone
    #[serde(default)]
    pub resource_group_name: Option<String>,

    /// Fixed zone name overriding per-request domain decomposition
    #[serde(default)]
    pub zone_name: Option<String>,
}

/// Client authorization configuration
///
/// The update endpoint authorizes clients against a single shared
/// credential; both fields are required at handler construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Username half of the shared credential
    #[serde(default)]
    pub client_username: Option<String>,

    /// Password half of the shared credential
    #[serde(default)]
    pub client_password: Option<String>,
}

impl AuthConfig {
    /// Validate the authorization configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self
            .client_username
            .as_deref()
            .is_none_or(|u| u.trim().is_empty())
        {
            return Err(crate::Error::config("clientUsername is not configured"));
        }
        if self
            .client_password
            .as_deref()
            .is_none_or(|p| p.trim().is_empty())
        {
            return Err(crate::Error::config("clientPassword is not configured"));
        }
        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// Zone ID (optional, can be auto-detected by name)
        zone_id: Option<String>,
        /// Account ID (optional, narrows zone lookup)
        account_id: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare { api_token, .. } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom provider factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom provider config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

fn default_ttl_secs() -> u32 {
    DEFAULT_TTL_SECS
}
