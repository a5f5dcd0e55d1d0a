//! Core traits for the update endpoint
//!
//! This module defines the abstract interface the reconciler drives:
//!
//! - [`DnsProvider`]: zone and record-set lookup/mutation against a remote
//!   DNS service
//! - [`DnsProviderFactory`]: configuration-driven provider construction

pub mod dns_provider;

pub use dns_provider::{DnsProvider, DnsProviderFactory, RecordSet, RecordType, ZoneHandle};
