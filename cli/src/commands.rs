use std::time::Duration;

use clap::{ArgAction, Parser};
use url::Url;

use presence_common::config::EngineOptions;

#[derive(Parser, Debug)]
#[command(name = "presence")]
#[command(about = "Streams the devices present on the local network.")]
pub struct CommandLine {
    /// Milliseconds between the starts of two discovery passes
    #[arg(long = "tick-ms", env = "PRESENCE_TICK_MS", default_value_t = 1_000,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Interface to scan from; the best LAN interface is picked when omitted
    #[arg(short, long, env = "PRESENCE_INTERFACE")]
    pub interface: Option<String>,

    /// HTTP endpoint that receives every roster as `{"json": [...]}`
    #[arg(long = "forward-url", env = "PRESENCE_FORWARD_URL")]
    pub forward_url: Option<Url>,

    /// Give up on a forwarding request after this many milliseconds
    #[arg(long = "forward-timeout-ms", env = "PRESENCE_FORWARD_TIMEOUT_MS", default_value_t = 5_000)]
    pub forward_timeout_ms: u64,

    /// Port the WebSocket server listens on
    #[arg(short, long, env = "PRESENCE_PORT", default_value_t = 3_000)]
    pub port: u16,

    /// Path to the arp-scan binary
    #[arg(long = "arp-scan", env = "PRESENCE_ARP_SCAN", default_value = "arp-scan")]
    pub arp_scan: String,

    /// Run arp-scan through `sudo -n`
    #[arg(long, env = "PRESENCE_SUDO")]
    pub sudo: bool,

    /// More log output; repeat for trace
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Less log output; repeat to silence warnings
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn engine_options(&self, interface: String) -> EngineOptions {
        EngineOptions::new(interface)
            .with_tick_interval(Duration::from_millis(self.tick_ms))
            .with_forward_endpoint(self.forward_url.clone())
            .with_forward_timeout(Duration::from_millis(self.forward_timeout_ms))
    }
}
