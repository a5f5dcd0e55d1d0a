// # dynupd - Dynamic DNS Update Daemon
//
// Thin host process for the update endpoint. The daemon is responsible
// for:
//
// 1. Reading configuration from environment variables
// 2. Initializing tracing and the runtime
// 3. Registering providers and constructing the update handler
// 4. Serving the ddclient-style update surface over HTTP
//
// All update logic lives in dynup-core; this binary only translates
// between HTTP and the core's request/outcome types.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Server
// - `DYNUP_LISTEN_ADDR`: Socket address to bind (default 0.0.0.0:8080)
//
// ### DNS Provider
// - `DYNUP_PROVIDER_TYPE`: Provider type (cloudflare)
// - `DYNUP_PROVIDER_API_TOKEN`: API token
// - `DYNUP_PROVIDER_ZONE_ID`: Zone ID (optional, skips zone lookup)
// - `DYNUP_PROVIDER_ACCOUNT_ID`: Account ID (optional)
//
// ### Zone scoping
// - `DYNUP_RESOURCE_GROUP_NAME`: Provider-side zone container (optional)
// - `DYNUP_ZONE_NAME`: Fixed zone name (optional; default is each
//   request's registrable domain)
//
// ### Client authorization
// - `DYNUP_CLIENT_USERNAME`: Username half of the shared credential
// - `DYNUP_CLIENT_PASSWORD`: Password half of the shared credential
//
// ### Records
// - `DYNUP_TTL_SECS`: TTL written on record replacement (default 3600)
//
// ### Logging
// - `DYNUP_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DYNUP_PROVIDER_TYPE=cloudflare
// export DYNUP_PROVIDER_API_TOKEN=your_token
// export DYNUP_CLIENT_USERNAME=updater
// export DYNUP_CLIENT_PASSWORD=secret
//
// dynupd
// ```

use anyhow::Result;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use dynup_core::config::{
    AuthConfig, DEFAULT_TTL_SECS, ProviderConfig, ServiceConfig, ZoneConfig,
};
use dynup_core::handler::{UpdateHandler, UpdateOutcome, UpdateRequest};
use dynup_core::reconciler::Reconciler;
use std::env;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DynupExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DynupExitCode> for ExitCode {
    fn from(code: DynupExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    listen_addr: String,
    provider_type: String,
    provider_api_token: String,
    provider_zone_id: Option<String>,
    provider_account_id: Option<String>,
    resource_group_name: Option<String>,
    zone_name: Option<String>,
    client_username: Option<String>,
    client_password: Option<String>,
    ttl_secs: u32,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self {
            listen_addr: env::var("DYNUP_LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            provider_type: env::var("DYNUP_PROVIDER_TYPE")
                .unwrap_or_else(|_| "cloudflare".to_string()),
            provider_api_token: env::var("DYNUP_PROVIDER_API_TOKEN").unwrap_or_default(),
            provider_zone_id: env::var("DYNUP_PROVIDER_ZONE_ID").ok(),
            provider_account_id: env::var("DYNUP_PROVIDER_ACCOUNT_ID").ok(),
            resource_group_name: env::var("DYNUP_RESOURCE_GROUP_NAME").ok(),
            zone_name: env::var("DYNUP_ZONE_NAME").ok(),
            client_username: env::var("DYNUP_CLIENT_USERNAME").ok(),
            client_password: env::var("DYNUP_CLIENT_PASSWORD").ok(),
            ttl_secs: parse_ttl(env::var("DYNUP_TTL_SECS").ok()),
            log_level: env::var("DYNUP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Validate the host-level configuration
    ///
    /// Credential completeness is validated by the core at handler
    /// construction; this checks everything the host itself owns.
    fn validate(&self) -> Result<()> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!(
                "DYNUP_LISTEN_ADDR is not a valid socket address. Got: {}",
                self.listen_addr
            );
        }

        if self.provider_api_token.is_empty() {
            anyhow::bail!(
                "DYNUP_PROVIDER_API_TOKEN is required. \
                Set it via: export DYNUP_PROVIDER_API_TOKEN=your_token"
            );
        }

        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.provider_api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower.contains("example")
            || token_lower == "token"
        {
            anyhow::bail!(
                "DYNUP_PROVIDER_API_TOKEN appears to be a placeholder. \
                Use an actual API token from your DNS provider."
            );
        }

        match self.provider_type.as_str() {
            "cloudflare" => {}
            _ => anyhow::bail!(
                "DYNUP_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: cloudflare",
                self.provider_type
            ),
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DYNUP_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// The core service configuration carried by this host configuration
    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            provider: ProviderConfig::Cloudflare {
                api_token: self.provider_api_token.clone(),
                zone_id: self.provider_zone_id.clone(),
                account_id: self.provider_account_id.clone(),
            },
            zone: ZoneConfig {
                resource_group_name: self.resource_group_name.clone(),
                zone_name: self.zone_name.clone(),
            },
            auth: AuthConfig {
                client_username: self.client_username.clone(),
                client_password: self.client_password.clone(),
            },
            ttl_secs: self.ttl_secs,
        }
    }
}

/// Parse a TTL value, falling back to the default when unset or unparseable
fn parse_ttl(raw: Option<String>) -> u32 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_TTL_SECS)
}

fn main() -> ExitCode {
    let config = Config::from_env();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DynupExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DynupExitCode::ConfigError.into();
    }

    info!("Starting dynupd daemon");

    // Construct the service before entering the runtime: everything that
    // can fail here is a configuration problem
    let handler = match build_handler(&config) {
        Ok(handler) => handler,
        Err(e) => {
            error!("Service construction failed: {}", e);
            return DynupExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DynupExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = serve(&config.listen_addr, handler).await {
            error!("Daemon error: {}", e);
            DynupExitCode::RuntimeError
        } else {
            DynupExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Register providers and build the update handler from configuration
fn build_handler(config: &Config) -> Result<Arc<UpdateHandler>> {
    let registry = dynup_core::ProviderRegistry::new();

    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare provider");
        dynup_provider_cloudflare::register(&registry);
    }

    let service_config = config.service_config();
    service_config.validate()?;

    let provider = registry.create_provider(&service_config.provider)?;
    let reconciler = Reconciler::new(provider, service_config.zone.clone());
    let handler = UpdateHandler::new(reconciler, &service_config)?;

    Ok(Arc::new(handler))
}

/// Serve the update endpoint until a shutdown signal arrives
async fn serve(listen_addr: &str, handler: Arc<UpdateHandler>) -> Result<()> {
    let app = Router::new()
        .route("/nic/update", get(handle_update).post(handle_update))
        .route("/update", get(handle_update).post(handle_update))
        .with_state(handler);

    let addr: SocketAddr = listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Update endpoint listening on {}", addr);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result?;
        }
        signal = wait_for_shutdown() => {
            info!("Received shutdown signal: {}", signal?);
        }
    }

    info!("Shutting down daemon");
    Ok(())
}

/// Translate one HTTP request into a core update request and back
async fn handle_update(
    State(handler): State<Arc<UpdateHandler>>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let request = UpdateRequest {
        params,
        authorization: header_value(&headers, header::AUTHORIZATION),
        user_agent: header_value(&headers, header::USER_AGENT),
    };

    http_response(handler.process(&request).await)
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Map a core outcome onto an HTTP status and body
fn http_response(outcome: UpdateOutcome) -> (StatusCode, String) {
    let body = outcome.body().unwrap_or_default().to_string();
    let status = match outcome {
        UpdateOutcome::Success(_) => StatusCode::OK,
        UpdateOutcome::BadRequest | UpdateOutcome::Rejected => StatusCode::BAD_REQUEST,
        UpdateOutcome::Unauthorized => StatusCode::UNAUTHORIZED,
        UpdateOutcome::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
        UpdateOutcome::Failed(_) => StatusCode::CONFLICT,
    };

    (status, body)
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
