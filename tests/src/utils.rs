use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::{IpNetwork, Ipv4Network};
use pnet::util::MacAddr;
use tokio::time::Instant;

use presence_common::config::EngineOptions;
use presence_common::error::DiscoveryError;
use presence_common::network::host::{RawHost, Roster};
use presence_common::scanning::{NetworkScanner, ScanRequest};
use presence_common::system::SystemRepository;
use presence_core::engine::TickerEngine;

pub const IFACE: &str = "eth0";
pub const TICK: Duration = Duration::from_millis(1_000);

pub fn ni(name: &str, mac: Option<MacAddr>, ips: &[IpNetwork]) -> NetworkInterface {
    NetworkInterface {
        name: name.into(),
        description: "".into(),
        index: 2,
        mac,
        ips: ips.to_vec(),
        flags: 1,
    }
}

pub fn v4(a: u8, b: u8, c: u8, d: u8, p: u8) -> IpNetwork {
    IpNetwork::V4(Ipv4Network::new(Ipv4Addr::new(a, b, c, d), p).unwrap())
}

/// A host whose `eth0` is `11:22:33:44:55:66` at `192.168.1.2`.
pub struct FixedSystem {
    interfaces: Vec<NetworkInterface>,
}

impl FixedSystem {
    pub fn lan() -> Self {
        Self {
            interfaces: vec![
                ni("lo", None, &[v4(127, 0, 0, 1, 8)]),
                ni(
                    IFACE,
                    Some(MacAddr(0x11, 0x22, 0x33, 0x44, 0x55, 0x66)),
                    &[v4(192, 168, 1, 2, 24)],
                ),
            ],
        }
    }
}

impl SystemRepository for FixedSystem {
    fn get_network_interfaces(&self) -> Vec<NetworkInterface> {
        self.interfaces.clone()
    }

    fn hostname(&self) -> Option<String> {
        Some("presence-host".to_string())
    }
}

/// Returns the same hosts on every call, after `latency`, failing on the
/// listed call indexes. Call 0 is the startup probe.
pub struct ScriptedScanner {
    hosts: Vec<RawHost>,
    latency: Duration,
    failures: HashSet<usize>,
    starts: Mutex<Vec<Instant>>,
}

impl ScriptedScanner {
    pub fn new(hosts: Vec<RawHost>) -> Self {
        Self {
            hosts,
            latency: Duration::ZERO,
            failures: HashSet::new(),
            starts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.failures.extend(calls.iter().copied());
        self
    }

    pub fn calls(&self) -> usize {
        self.starts.lock().unwrap().len()
    }

    pub fn starts(&self) -> Vec<Instant> {
        self.starts.lock().unwrap().clone()
    }
}

#[async_trait]
impl NetworkScanner for ScriptedScanner {
    async fn scan(&self, _request: &ScanRequest) -> Result<Vec<RawHost>, DiscoveryError> {
        let call = {
            let mut starts = self.starts.lock().unwrap();
            starts.push(Instant::now());
            starts.len() - 1
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failures.contains(&call) {
            return Err(DiscoveryError::Other(format!("scan {call} failed")));
        }
        Ok(self.hosts.clone())
    }
}

pub fn neighbour() -> Vec<RawHost> {
    vec![RawHost::new("aa:bb:cc:dd:ee:ff", "192.168.1.5")]
}

pub fn options() -> EngineOptions {
    EngineOptions::new(IFACE).with_tick_interval(TICK)
}

pub fn engine(options: EngineOptions, scanner: Arc<ScriptedScanner>) -> TickerEngine {
    TickerEngine::new(options, scanner, Arc::new(FixedSystem::lan())).unwrap()
}

/// Roster contents without timestamps, which differ from tick to tick.
pub fn strip(roster: &Roster) -> Vec<(String, Ipv4Addr, String)> {
    roster
        .iter()
        .map(|record| (record.mac.clone(), record.ip, record.vendor.clone()))
        .collect()
}

/// Gaps between consecutive instants.
pub fn gaps(starts: &[Instant]) -> Vec<Duration> {
    starts.windows(2).map(|pair| pair[1] - pair[0]).collect()
}
