use std::net::Ipv4Addr;

use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::IpNetwork;
#[cfg(target_os = "macos")]
use macos_impl::{is_physical, is_wireless};
#[cfg(target_os = "linux")]
use linux_impl::{is_physical, is_wireless};
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
use fallback_impl::{is_physical, is_wireless};

use crate::error::ConfigurationError;
use crate::network::host::{HostRecord, now_millis};
use crate::network::mac;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ViabilityError {
    /// The interface is operationally down.
    IsDown,
    /// The interface was filtered out as "not physical" by the provided logic.
    NotPhysical,
    /// The interface does not have a MAC address.
    NoMacAddress,
    /// The interface does not support broadcast (required for ARP).
    NotBroadcast,
    /// The interface is a point-to-point link (e.g., a VPN).
    IsPointToPoint,
    /// The interface has no private IPv4 address to scan from.
    NoValidLanIp,
}

pub trait NetworkInterfaceExtension {
    /// First IPv4 address bound to the interface, in the order the OS reports them.
    fn first_ipv4(&self) -> Option<Ipv4Addr>;
}

impl NetworkInterfaceExtension for NetworkInterface {
    fn first_ipv4(&self) -> Option<Ipv4Addr> {
        self.ips.iter().find_map(|net| match net {
            IpNetwork::V4(v4) => Some(v4.ip()),
            IpNetwork::V6(_) => None,
        })
    }
}

/// Looks up an interface by its exact OS name.
pub fn find_interface<'a>(
    interfaces: &'a [NetworkInterface],
    name: &str,
) -> Result<&'a NetworkInterface, ConfigurationError> {
    interfaces
        .iter()
        .find(|interface| interface.name == name)
        .ok_or_else(|| ConfigurationError::UnknownInterface(name.to_string()))
}

/// Builds the record describing this machine on `interface`.
///
/// The vendor label falls back to the interface name when no hostname is known.
pub fn local_host_record(
    interface: &NetworkInterface,
    hostname: Option<String>,
) -> Result<HostRecord, ConfigurationError> {
    let ip: Ipv4Addr = interface
        .first_ipv4()
        .ok_or_else(|| ConfigurationError::NoIpv4Address(interface.name.clone()))?;
    let mac = interface
        .mac
        .ok_or_else(|| ConfigurationError::NoMacAddress(interface.name.clone()))?;

    Ok(HostRecord {
        mac: mac::canonical(mac),
        ip,
        vendor: hostname.unwrap_or_else(|| interface.name.clone()),
        timestamp: now_millis(),
    })
}

/// Picks the interface to scan from when none was configured.
pub fn default_lan_interface(
    interfaces: Vec<NetworkInterface>,
) -> Result<NetworkInterface, ConfigurationError> {
    let viable: Vec<NetworkInterface> = interfaces
        .into_iter()
        .filter(|interface| is_viable_lan_interface(interface, is_physical).is_ok())
        .collect();

    select_best_lan_interface(viable, is_wired).ok_or(ConfigurationError::NoLanInterface)
}

fn is_viable_lan_interface(
    interface: &NetworkInterface,
    is_physical: impl Fn(&NetworkInterface) -> bool,
) -> Result<(), ViabilityError> {
    if !interface.is_up() {
        return Err(ViabilityError::IsDown);
    }
    if !is_physical(interface) || interface.is_loopback() {
        return Err(ViabilityError::NotPhysical);
    }
    if interface.mac.is_none() {
        return Err(ViabilityError::NoMacAddress);
    }
    if !interface.is_broadcast() {
        return Err(ViabilityError::NotBroadcast);
    }
    if interface.is_point_to_point() {
        return Err(ViabilityError::IsPointToPoint);
    }
    let has_private_v4 = interface.ips.iter().any(|net| match net {
        IpNetwork::V4(v4) => v4.ip().is_private(),
        IpNetwork::V6(_) => false,
    });
    if !has_private_v4 {
        return Err(ViabilityError::NoValidLanIp);
    }

    Ok(())
}

fn select_best_lan_interface(
    interfaces: Vec<NetworkInterface>,
    is_wired: impl Fn(&NetworkInterface) -> bool,
) -> Option<NetworkInterface> {
    let wired = interfaces.iter().position(|interface| is_wired(interface));
    let mut interfaces = interfaces;
    match wired {
        Some(idx) => Some(interfaces.swap_remove(idx)),
        None => interfaces.into_iter().next(),
    }
}

fn is_wired(interface: &NetworkInterface) -> bool {
    is_physical(interface) && !is_wireless(interface)
}

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::path::Path;

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/device", interface.name)).exists()
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        Path::new(&format!("/sys/class/net/{}/wireless", interface.name)).exists()
    }
}

#[cfg(target_os = "macos")]
mod macos_impl {
    use super::*;
    use std::collections::HashSet;
    use std::process::Command;
    use std::sync::OnceLock;

    struct HardwareInfo {
        physical_devices: HashSet<String>,
        wireless_devices: HashSet<String>,
    }

    /// Runs `networksetup` once and caches which devices are hardware ports.
    fn get_hardware_info() -> &'static HardwareInfo {
        static HARDWARE_INFO: OnceLock<HardwareInfo> = OnceLock::new();

        HARDWARE_INFO.get_or_init(|| {
            let mut physical = HashSet::new();
            let mut wireless = HashSet::new();

            if let Ok(output) = Command::new("networksetup")
                .arg("-listallhardwareports")
                .output()
            {
                let stdout = String::from_utf8_lossy(&output.stdout);
                for line in stdout.lines() {
                    if let Some(device) = line.strip_prefix("Device: ") {
                        physical.insert(device.trim().to_string());
                    }
                }
            }

            for device in &physical {
                let is_wifi = Command::new("networksetup")
                    .arg("-getairportnetwork")
                    .arg(device)
                    .output()
                    .map(|out| out.status.success())
                    .unwrap_or(false);

                if is_wifi {
                    wireless.insert(device.clone());
                }
            }

            HardwareInfo {
                physical_devices: physical,
                wireless_devices: wireless,
            }
        })
    }

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        get_hardware_info().physical_devices.contains(&interface.name)
    }

    pub fn is_wireless(interface: &NetworkInterface) -> bool {
        get_hardware_info().wireless_devices.contains(&interface.name)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod fallback_impl {
    use super::*;

    pub fn is_physical(interface: &NetworkInterface) -> bool {
        !interface.is_loopback()
    }

    pub fn is_wireless(_interface: &NetworkInterface) -> bool {
        false
    }
}
