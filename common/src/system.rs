use pnet::datalink::NetworkInterface;

/// Read access to the host the engine is running on.
pub trait SystemRepository: Send + Sync {
    fn get_network_interfaces(&self) -> Vec<NetworkInterface>;

    /// Best-effort name of this machine, used as the self-record's vendor label.
    fn hostname(&self) -> Option<String>;
}
