//! # Engine Options
//!
//! Configuration consumed by the ticker engine. Options are fixed once an
//! engine is constructed.

use std::time::Duration;

use url::Url;

use crate::error::ConfigurationError;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1_000);
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Target start-to-start spacing of discovery attempts.
    pub tick_interval: Duration,
    /// Local interface used for scanning and for the self-record.
    pub interface: String,
    /// Optional HTTP sink receiving a copy of every roster.
    pub forward_endpoint: Option<Url>,
    /// Upper bound for a single forwarding request.
    pub forward_timeout: Duration,
}

impl EngineOptions {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            interface: interface.into(),
            forward_endpoint: None,
            forward_timeout: DEFAULT_FORWARD_TIMEOUT,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_forward_endpoint(mut self, endpoint: Option<Url>) -> Self {
        self.forward_endpoint = endpoint;
        self
    }

    pub fn with_forward_timeout(mut self, timeout: Duration) -> Self {
        self.forward_timeout = timeout;
        self
    }

    pub fn is_forwarding(&self) -> bool {
        self.forward_endpoint.is_some()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigurationError::ZeroTickInterval);
        }
        if self.interface.trim().is_empty() {
            return Err(ConfigurationError::UnknownInterface(self.interface.clone()));
        }
        Ok(())
    }
}
