//! # Error Taxonomy
//!
//! Only a failed startup probe is fatal to an engine. Everything else is
//! scoped to the tick that produced it.

use thiserror::Error;

/// The configured interface cannot produce a self-record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("network interface `{0}` was not found")]
    UnknownInterface(String),
    #[error("network interface `{0}` has no IPv4 address")]
    NoIpv4Address(String),
    #[error("network interface `{0}` has no hardware address")]
    NoMacAddress(String),
    #[error("no interface is available for LAN discovery")]
    NoLanInterface,
    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,
}

/// The discovery mechanism failed or produced records that cannot be trusted.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to launch scanner: {0}")]
    Launch(#[source] std::io::Error),
    #[error("scanner exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("scanner returned a record without a {0} field")]
    MissingField(&'static str),
    #[error("scanner returned a malformed {field}: `{value}`")]
    Malformed { field: &'static str, value: String },
    #[error("{0}")]
    Other(String),
}

/// Why a single tick produced no roster.
#[derive(Debug, Error)]
pub enum TickError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}
