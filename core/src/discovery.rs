//! # Discovery Service
//!
//! Wraps a raw [`NetworkScanner`] and fills in vendor labels the scanner
//! could not provide from a [`VendorRepository`].

use async_trait::async_trait;

use presence_common::error::DiscoveryError;
use presence_common::network::host::RawHost;
use presence_common::network::mac;
use presence_common::scanning::{NetworkScanner, ScanRequest};
use presence_common::vendors::VendorRepository;

/// Labels arp-scan prints when it has no vendor for an address.
const UNRESOLVED_VENDORS: &[&str] = &["(Unknown)", "(Unknown: locally administered)"];

pub struct DiscoveryService {
    vendor_repo: Box<dyn VendorRepository>,
    scanner: Box<dyn NetworkScanner>,
}

impl DiscoveryService {
    pub fn new(vendor_repo: Box<dyn VendorRepository>, scanner: Box<dyn NetworkScanner>) -> Self {
        Self {
            vendor_repo,
            scanner,
        }
    }

    fn enrich_vendors(&self, hosts: &mut [RawHost]) {
        for host in hosts.iter_mut().filter(|host| needs_vendor(host.vendor.as_deref())) {
            let Some(mac) = host.mac.as_deref().and_then(mac::parse) else {
                continue;
            };
            if let Some(vendor) = self.vendor_repo.get_vendor(mac) {
                host.vendor = Some(vendor);
            }
        }
    }
}

#[async_trait]
impl NetworkScanner for DiscoveryService {
    async fn scan(&self, request: &ScanRequest) -> Result<Vec<RawHost>, DiscoveryError> {
        let mut hosts = self.scanner.scan(request).await?;
        self.enrich_vendors(&mut hosts);
        Ok(hosts)
    }
}

fn needs_vendor(vendor: Option<&str>) -> bool {
    match vendor.map(str::trim) {
        None | Some("") => true,
        Some(label) => UNRESOLVED_VENDORS.contains(&label),
    }
}
