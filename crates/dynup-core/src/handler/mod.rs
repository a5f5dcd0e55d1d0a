//! Update request handling
//!
//! The [`UpdateHandler`] walks one inbound update request through its
//! gates (parameter allow-list, required fields, credential check), then
//! reconciles each supplied address family and merges the results into a
//! single client-facing outcome.
//!
//! The handler is transport-agnostic: the host translates whatever carries
//! the request (HTTP query string and headers, typically) into an
//! [`UpdateRequest`] and maps the [`UpdateOutcome`] back onto its wire
//! format.

use crate::config::{AuthConfig, ServiceConfig};
use crate::error::Result;
use crate::reconciler::Reconciler;
use crate::status::{UpdateStatus, combine};
use crate::traits::RecordType;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// The only parameter keys an update request may carry
pub const ALLOWED_PARAMS: [&str; 4] = ["hostname", "myip", "myipv6", "system"];

/// One inbound update request, already decoded from its transport
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    /// Query/form parameters in request order
    pub params: Vec<(String, String)>,
    /// Credential header value, if present
    pub authorization: Option<String>,
    /// Client-agent header value, if present
    pub user_agent: Option<String>,
}

impl UpdateRequest {
    /// First non-blank value supplied for `key`
    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}

/// Client-facing outcome of one update request
///
/// The host maps these onto its transport; for HTTP that is 200 / 400 /
/// 401 / 422 / 409 with the status text as the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Update accepted (`good`) or already in place (`nochg`)
    Success(UpdateStatus),
    /// Request carried an unrecognized parameter
    BadRequest,
    /// A required field was missing
    Rejected,
    /// Credential did not match the authorized token set
    Unauthorized,
    /// Hostname or address failed parsing
    Unprocessable,
    /// Any other failure, carrying the raw status
    Failed(UpdateStatus),
}

impl UpdateOutcome {
    /// The response body text, if this outcome carries one
    pub fn body(&self) -> Option<&'static str> {
        match self {
            UpdateOutcome::Success(status) => Some(status.as_str()),
            UpdateOutcome::BadRequest => None,
            UpdateOutcome::Rejected => Some(UpdateStatus::OtherErr.as_str()),
            UpdateOutcome::Unauthorized => Some(UpdateStatus::BadAuth.as_str()),
            UpdateOutcome::Unprocessable => Some(UpdateStatus::InvalidInput.as_str()),
            UpdateOutcome::Failed(status) => Some(status.as_str()),
        }
    }
}

/// Build the shared-secret token for a username/password pair.
///
/// The token is the base64 encoding of `username:password`, the same
/// construction HTTP Basic authentication uses for its credential value.
pub fn credential_token(username: &str, password: &str) -> String {
    BASE64.encode(format!("{username}:{password}"))
}

/// Validates, authorizes, and dispatches update requests
pub struct UpdateHandler {
    /// Record reconciler driven once per supplied address family
    reconciler: Reconciler,

    /// Authorized credential tokens, fixed at construction
    tokens: HashSet<String>,

    /// TTL written on record replacement
    ttl_secs: u32,
}

impl UpdateHandler {
    /// Create a new handler.
    ///
    /// Fails with `Error::Config` when no client credential is configured;
    /// the host must treat that as fatal at startup.
    pub fn new(reconciler: Reconciler, config: &ServiceConfig) -> Result<Self> {
        let tokens = authorized_tokens(&config.auth)?;

        Ok(Self {
            reconciler,
            tokens,
            ttl_secs: config.ttl_secs,
        })
    }

    /// Process one update request through all gates.
    ///
    /// Never panics and never returns a raw error: every failure mode maps
    /// to an [`UpdateOutcome`] whose body is one of the protocol status
    /// strings.
    pub async fn process(&self, request: &UpdateRequest) -> UpdateOutcome {
        // Unrecognized keys reject the request before any value is looked at
        for (key, _) in &request.params {
            if !ALLOWED_PARAMS.contains(&key.as_str()) {
                warn!("Query parameter {} is invalid", key);
                return UpdateOutcome::BadRequest;
            }
        }

        let hostname = request.param("hostname");
        let ipv4 = request.param("myip");
        let ipv6 = request.param("myipv6");
        let token = request
            .authorization
            .as_deref()
            .filter(|t| !t.trim().is_empty());
        let agent = request
            .user_agent
            .as_deref()
            .filter(|a| !a.trim().is_empty());

        if hostname.is_none() || (ipv4.is_none() && ipv6.is_none()) || token.is_none() || agent.is_none()
        {
            if hostname.is_none() {
                warn!("Query parameter \"hostname\" is empty");
            }
            if ipv4.is_none() && ipv6.is_none() {
                warn!("Query parameters \"myip\" and \"myipv6\" are both empty");
            }
            if token.is_none() {
                warn!("Request credential header is empty");
            }
            if agent.is_none() {
                warn!("Request client-agent header is empty");
            }
            return UpdateOutcome::Rejected;
        }

        let (Some(hostname), Some(token)) = (hostname, token) else {
            return UpdateOutcome::Rejected;
        };

        let token = token.strip_prefix("Basic ").unwrap_or(token);
        if !self.tokens.contains(token) {
            warn!("Unauthorized request for hostname {}", hostname);
            return UpdateOutcome::Unauthorized;
        }

        debug!(
            "request details: hostname: {} ip: {:?} ipv6: {:?} agent: {:?}",
            hostname, ipv4, ipv6, agent
        );

        // A family that was not supplied counts as "no change" for merging
        let mut v4_status = UpdateStatus::NoChg;
        let mut v6_status = UpdateStatus::NoChg;

        if let Some(ip) = ipv4 {
            info!("Updating hostname: {} ip: {}", hostname, ip);
            v4_status = self
                .reconciler
                .reconcile(RecordType::A, hostname, ip, self.ttl_secs)
                .await;
        }

        if let Some(ip) = ipv6 {
            info!("Updating hostname: {} ipv6: {}", hostname, ip);
            v6_status = self
                .reconciler
                .reconcile(RecordType::Aaaa, hostname, ip, self.ttl_secs)
                .await;
        }

        match combine(v4_status, v6_status) {
            status @ (UpdateStatus::Good | UpdateStatus::NoChg) => UpdateOutcome::Success(status),
            UpdateStatus::BadAuth => UpdateOutcome::Unauthorized,
            UpdateStatus::InvalidInput => UpdateOutcome::Unprocessable,
            status => UpdateOutcome::Failed(status),
        }
    }
}

fn authorized_tokens(auth: &AuthConfig) -> Result<HashSet<String>> {
    auth.validate()?;

    let username = auth.client_username.as_deref().unwrap_or_default();
    let password = auth.client_password.as_deref().unwrap_or_default();

    Ok(HashSet::from([credential_token(username, password)]))
}
