use std::sync::Arc;

use pnet::datalink::NetworkInterface;

use presence_common::error::ConfigurationError;
use presence_common::network::host::HostRecord;
use presence_common::network::interface;
use presence_common::system::SystemRepository;

/// Reads interfaces and the hostname from the running OS.
pub struct SystemRepo;

impl SystemRepository for SystemRepo {
    fn get_network_interfaces(&self) -> Vec<NetworkInterface> {
        pnet::datalink::interfaces()
    }

    fn hostname(&self) -> Option<String> {
        sys_info::hostname()
            .ok()
            .filter(|name| !name.trim().is_empty())
    }
}

/// Produces the self-record for the configured interface. Resolved fresh
/// every tick so address changes are picked up.
pub struct LocalIdentity {
    system: Arc<dyn SystemRepository>,
    interface: String,
}

impl LocalIdentity {
    pub fn new(system: Arc<dyn SystemRepository>, interface: String) -> Self {
        Self { system, interface }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn host_record(&self) -> Result<HostRecord, ConfigurationError> {
        let interfaces = self.system.get_network_interfaces();
        let intf = interface::find_interface(&interfaces, &self.interface)?;
        interface::local_host_record(intf, self.system.hostname())
    }
}
