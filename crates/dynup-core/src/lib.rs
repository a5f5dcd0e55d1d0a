// # dynup-core
//
// Core library for the dynup dynamic DNS update endpoint.
//
// ## Architecture Overview
//
// This library implements the update reconciliation engine behind a
// ddclient-style update surface:
//
// - **fqdn**: hostname validation and zone-domain/subdomain decomposition
// - **status**: the closed status vocabulary and the per-family merge rule
// - **Reconciler**: per-family record reconciliation against a DnsProvider
// - **UpdateHandler**: request validation, authorization, and dispatch
// - **DnsProvider**: trait for zone/record-set operations, implemented by
//   provider crates
// - **ProviderRegistry**: plugin-based registry for provider factories
//
// ## Design Principles
//
// 1. **Separation of Concerns**: decision logic lives here; providers are
//    thin API clients and hosts are thin transport adapters
// 2. **Total Outcomes**: every failure becomes a protocol status string;
//    nothing below configuration errors escapes as a fault
// 3. **Validate First**: inputs are parsed before any provider round trip
// 4. **Idempotency**: reconciling an already-correct record performs no
//    provider mutation

pub mod config;
pub mod error;
pub mod fqdn;
pub mod handler;
pub mod reconciler;
pub mod registry;
pub mod status;
pub mod traits;

// Re-export core types for convenience
pub use config::{AuthConfig, ProviderConfig, ServiceConfig, ZoneConfig};
pub use error::{Error, Result};
pub use fqdn::{DecomposedFqdn, decompose};
pub use handler::{UpdateHandler, UpdateOutcome, UpdateRequest};
pub use reconciler::{Reconciler, ZoneContext};
pub use registry::ProviderRegistry;
pub use status::{UpdateStatus, combine};
pub use traits::{DnsProvider, DnsProviderFactory, RecordSet, RecordType, ZoneHandle};
