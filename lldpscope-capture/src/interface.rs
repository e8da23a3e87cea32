//! Network interface enumeration backed by pnet

use ipnetwork::IpNetwork;
use lldpscope_core::{Error, InterfaceInfo, InterfaceProvider, MacAddr, Result};
use pnet_datalink::{self, NetworkInterface};

/// Convert a pnet interface into the engine's interface record
pub fn interface_info(iface: &NetworkInterface) -> InterfaceInfo {
    let mac = iface
        .mac
        .map(|mac| MacAddr([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]));

    let mut info = InterfaceInfo::new(iface.name.clone(), iface.index, mac);
    for network in &iface.ips {
        match network {
            IpNetwork::V4(net) => info.ipv4.push(net.ip()),
            IpNetwork::V6(net) => info.ipv6.push(net.ip()),
        }
    }
    info.is_up = iface.is_up();
    info.is_loopback = iface.is_loopback();
    info
}

/// Interfaces of the running host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl InterfaceProvider for SystemInterfaces {
    fn list_interfaces(&self) -> Result<Vec<InterfaceInfo>> {
        let interfaces = pnet_datalink::interfaces();

        if interfaces.is_empty() {
            return Err(Error::Interface(
                "No network interfaces found. Are you running with sufficient privileges?"
                    .to_string(),
            ));
        }

        Ok(interfaces.iter().map(interface_info).collect())
    }
}

/// Find the pnet interface for `name`
pub(crate) fn find_network_interface(name: &str) -> Result<NetworkInterface> {
    pnet_datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
}
