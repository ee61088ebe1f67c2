//! An **ARP sweep** of the local segment using the `arp-scan` tool.
//!
//! `arp-scan` needs raw socket access, so it usually runs as root or through
//! `sudo`. With `--plain` every output line is `ip<TAB>mac<TAB>vendor`.

use std::net::Ipv4Addr;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use presence_common::error::DiscoveryError;
use presence_common::network::host::{RawHost, now_millis};
use presence_common::scanning::{NetworkScanner, ScanRequest};

const DEFAULT_PROGRAM: &str = "arp-scan";

pub struct ArpScanner {
    program: String,
    sudo: bool,
}

impl Default for ArpScanner {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl ArpScanner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            sudo: false,
        }
    }

    pub fn with_sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    fn command(&self, interface: &str) -> Command {
        let mut command = if self.sudo {
            let mut sudo = Command::new("sudo");
            sudo.arg("-n").arg(&self.program);
            sudo
        } else {
            Command::new(&self.program)
        };

        command
            .args(["--plain", "--localnet", "--interface", interface])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl NetworkScanner for ArpScanner {
    async fn scan(&self, request: &ScanRequest) -> Result<Vec<RawHost>, DiscoveryError> {
        let output = self
            .command(&request.interface)
            .output()
            .await
            .map_err(DiscoveryError::Launch)?;

        if !output.status.success() {
            return Err(DiscoveryError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let hosts = parse_output(&String::from_utf8_lossy(&output.stdout));
        debug!(interface = %request.interface, hosts = hosts.len(), "arp-scan finished");
        Ok(hosts)
    }
}

/// Extracts host lines from arp-scan output. Banner and summary lines, which
/// appear when `--plain` is not honoured, are skipped.
pub fn parse_output(stdout: &str) -> Vec<RawHost> {
    let now = now_millis();

    stdout
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let ip = fields.next()?.trim();
            let mac = fields.next()?.trim();
            ip.parse::<Ipv4Addr>().ok()?;

            let vendor = fields
                .next()
                .map(str::trim)
                .filter(|vendor| !vendor.is_empty());

            Some(RawHost {
                mac: Some(mac.to_string()),
                ip: Some(ip.to_string()),
                vendor: vendor.map(str::to_string),
                timestamp: Some(now),
            })
        })
        .collect()
}
