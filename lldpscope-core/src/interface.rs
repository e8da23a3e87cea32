//! Network interface types and the interface provider seam

use crate::{Error, MacAddr, Result};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A local network interface as seen by the LLDP engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    /// Interface name (e.g., "eth0", "en0")
    pub name: String,
    /// OS interface index, used in the management address TLV
    pub index: u32,
    /// Hardware address, if the interface has one
    pub mac: Option<MacAddr>,
    /// Assigned IPv4 addresses
    pub ipv4: Vec<Ipv4Addr>,
    /// Assigned IPv6 addresses (without scope id)
    pub ipv6: Vec<Ipv6Addr>,
    /// Whether the interface is administratively up
    pub is_up: bool,
    /// Whether the interface is a loopback
    pub is_loopback: bool,
}

impl InterfaceInfo {
    /// Create an interface record with no addresses
    pub fn new(name: impl Into<String>, index: u32, mac: Option<MacAddr>) -> Self {
        Self {
            name: name.into(),
            index,
            mac,
            ipv4: Vec::new(),
            ipv6: Vec::new(),
            is_up: true,
            is_loopback: false,
        }
    }

    /// Whether LLDP frames can be sent or captured on this interface.
    ///
    /// An interface qualifies when it is up and carries a non-zero MAC.
    pub fn is_lldp_capable(&self) -> bool {
        self.is_up && self.mac.map(|mac| !mac.is_zero()).unwrap_or(false)
    }

    /// First IPv4 address, if any
    pub fn primary_ipv4(&self) -> Option<Ipv4Addr> {
        self.ipv4.first().copied()
    }
}

impl fmt::Display for InterfaceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mac = self
            .mac
            .map(|m| m.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        write!(
            f,
            "{} [{}] {} ({})",
            self.name,
            self.index,
            mac,
            if self.is_up { "up" } else { "down" }
        )
    }
}

/// Source of the host's network interfaces.
pub trait InterfaceProvider: Send + Sync {
    /// List every interface known to the OS
    fn list_interfaces(&self) -> Result<Vec<InterfaceInfo>>;

    /// Look up a single interface by name
    fn get_interface(&self, name: &str) -> Result<InterfaceInfo> {
        self.list_interfaces()?
            .into_iter()
            .find(|iface| iface.name == name)
            .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
    }

    /// Interfaces LLDP can operate on (up, with a MAC address)
    fn lldp_interfaces(&self) -> Result<Vec<InterfaceInfo>> {
        Ok(self
            .list_interfaces()?
            .into_iter()
            .filter(InterfaceInfo::is_lldp_capable)
            .collect())
    }
}
