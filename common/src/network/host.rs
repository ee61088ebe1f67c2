//! # Host Records
//!
//! A [`Roster`] is the complete set of devices seen during one tick. It is
//! rebuilt from scratch every tick and never merged with an earlier one.

use std::net::Ipv4Addr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Vendor label used when neither the scanner nor the OUI database knows one.
pub const UNKNOWN_VENDOR: &str = "Unknown";

/// Ordered ascending by [`ip_sort_key`], unique by `mac`.
pub type Roster = Vec<HostRecord>;

/// One device present on the network segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Uppercase, colon separated hardware address.
    pub mac: String,
    pub ip: Ipv4Addr,
    pub vendor: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// A host exactly as the discovery mechanism reported it. Nothing here has
/// been validated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHost {
    pub mac: Option<String>,
    pub ip: Option<String>,
    pub vendor: Option<String>,
    pub timestamp: Option<u64>,
}

impl RawHost {
    pub fn new(mac: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            mac: Some(mac.into()),
            ip: Some(ip.into()),
            vendor: None,
            timestamp: None,
        }
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Numeric key with every octet zero-padded to three digits, so
/// `10.0.0.9 < 10.0.0.10`.
pub fn ip_sort_key(ip: &Ipv4Addr) -> u64 {
    ip.octets()
        .iter()
        .fold(0u64, |key, octet| key * 1_000 + u64::from(*octet))
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
