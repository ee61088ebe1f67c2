use async_trait::async_trait;

use crate::error::DiscoveryError;
use crate::network::host::RawHost;

/// Options handed to the discovery mechanism on every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub interface: String,
}

impl ScanRequest {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }
}

/// A discovery mechanism. Calls may be slow and may fail; an empty result is
/// a legitimate answer.
#[async_trait]
pub trait NetworkScanner: Send + Sync {
    async fn scan(&self, request: &ScanRequest) -> Result<Vec<RawHost>, DiscoveryError>;
}
