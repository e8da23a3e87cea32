//! Agent configuration

use lldpscope_core::{Error, Result};
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Value of string settings that are filled in from the host at send time
pub const AUTO: &str = "auto";

/// Value of `interface` that selects every LLDP-capable interface
pub const ALL_INTERFACES: &str = "all";

pub const DEFAULT_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_TTL_SECS: u32 = 120;
pub const DEFAULT_NEIGHBORS_FILE: &str = "neighbors.json";

/// Shortest allowed announcement interval
pub const MIN_INTERVAL_SECS: u64 = 5;

/// Which interfaces announcements go out on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceSelection {
    All,
    Named(String),
}

/// Source of the management address TLV
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagementMode {
    /// First IPv4 address of the sending interface, else the host's default-route address
    Auto,
    Fixed(IpAddr),
    Disabled,
}

/// LLDP agent settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Seconds between announcements
    pub interval: u64,
    /// `all` or an interface name
    pub interface: String,
    /// `auto` uses the hostname
    pub system_name: String,
    /// Empty uses the OS description
    pub system_description: String,
    /// Empty uses the interface name
    pub port_description: String,
    /// `auto`, an IP address, or empty to omit the TLV
    pub management_address: String,
    /// TTL advertised to neighbors, in seconds
    pub ttl: u32,
    /// Shared neighbor store; relative paths live in the runtime directory
    pub neighbors_file: PathBuf,
    /// Send only the mandatory TLVs
    pub minimal_tlv: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL_SECS,
            interface: ALL_INTERFACES.to_string(),
            system_name: AUTO.to_string(),
            system_description: String::new(),
            port_description: String::new(),
            management_address: AUTO.to_string(),
            ttl: DEFAULT_TTL_SECS,
            neighbors_file: PathBuf::from(DEFAULT_NEIGHBORS_FILE),
            minimal_tlv: false,
        }
    }
}

impl AgentConfig {
    /// Check value ranges and cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.interval < MIN_INTERVAL_SECS {
            return Err(Error::invalid_config(
                "LLDP_INTERVAL",
                format!("must be at least {} seconds", MIN_INTERVAL_SECS),
            ));
        }

        if (self.ttl as u64) < self.interval {
            return Err(Error::invalid_config(
                "LLDP_TTL",
                "must be greater than or equal to LLDP_INTERVAL",
            ));
        }

        if self.ttl > u16::MAX as u32 {
            return Err(Error::invalid_config("LLDP_TTL", "must be less than 65536"));
        }

        if self.interface.trim().is_empty() {
            return Err(Error::invalid_config(
                "LLDP_INTERFACE",
                "must be 'all' or an interface name",
            ));
        }

        self.management_mode()?;
        Ok(())
    }

    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// TTL as carried on the wire
    pub fn ttl_secs(&self) -> u16 {
        u16::try_from(self.ttl).unwrap_or(u16::MAX)
    }

    pub fn interface_selection(&self) -> InterfaceSelection {
        if self.interface.eq_ignore_ascii_case(ALL_INTERFACES) {
            InterfaceSelection::All
        } else {
            InterfaceSelection::Named(self.interface.clone())
        }
    }

    pub fn management_mode(&self) -> Result<ManagementMode> {
        let value = self.management_address.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("none") {
            return Ok(ManagementMode::Disabled);
        }
        if value.eq_ignore_ascii_case(AUTO) {
            return Ok(ManagementMode::Auto);
        }
        value
            .parse::<IpAddr>()
            .map(ManagementMode::Fixed)
            .map_err(|_| {
                Error::invalid_config(
                    "LLDP_MANAGEMENT_ADDRESS",
                    format!("'{}' is not 'auto' or an IP address", value),
                )
            })
    }

    pub fn system_name_is_auto(&self) -> bool {
        self.system_name.eq_ignore_ascii_case(AUTO)
    }
}

impl fmt::Display for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_auto = |s: &str| if s.is_empty() { "(auto)".to_string() } else { s.to_string() };

        writeln!(f, "interval           = {}s", self.interval)?;
        writeln!(f, "interface          = {}", self.interface)?;
        writeln!(f, "system_name        = {}", self.system_name)?;
        writeln!(f, "system_description = {}", or_auto(&self.system_description))?;
        writeln!(f, "port_description   = {}", or_auto(&self.port_description))?;
        writeln!(f, "management_address = {}", self.management_address)?;
        writeln!(f, "ttl                = {}s", self.ttl)?;
        writeln!(f, "neighbors_file     = {}", self.neighbors_file.display())?;
        write!(f, "minimal_tlv        = {}", self.minimal_tlv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AgentConfig::default();
        config.validate().unwrap();
        assert_eq!(config.interval_duration(), Duration::from_secs(30));
        assert_eq!(config.ttl_secs(), 120);
        assert_eq!(config.interface_selection(), InterfaceSelection::All);
        assert_eq!(config.management_mode().unwrap(), ManagementMode::Auto);
        assert!(config.system_name_is_auto());
    }

    #[test]
    fn test_interval_too_small() {
        let config = AgentConfig {
            interval: 4,
            ..Default::default()
        };
        match config.validate() {
            Err(Error::InvalidConfig { name, .. }) => assert_eq!(name, "LLDP_INTERVAL"),
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_ttl_below_interval() {
        let config = AgentConfig {
            interval: 60,
            ttl: 30,
            ..Default::default()
        };
        match config.validate() {
            Err(Error::InvalidConfig { name, .. }) => assert_eq!(name, "LLDP_TTL"),
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }

        // Equal is allowed
        let config = AgentConfig {
            interval: 60,
            ttl: 60,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_ttl_upper_bound() {
        let config = AgentConfig {
            ttl: 65536,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AgentConfig {
            ttl: 65535,
            ..Default::default()
        };
        config.validate().unwrap();
        assert_eq!(config.ttl_secs(), 65535);
    }

    #[test]
    fn test_management_modes() {
        let mut config = AgentConfig {
            management_address: "10.1.2.3".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.management_mode().unwrap(),
            ManagementMode::Fixed("10.1.2.3".parse().unwrap())
        );

        config.management_address = String::new();
        assert_eq!(config.management_mode().unwrap(), ManagementMode::Disabled);

        config.management_address = "not-an-ip".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_named_interface() {
        let config = AgentConfig {
            interface: "eth1".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.interface_selection(),
            InterfaceSelection::Named("eth1".to_string())
        );
    }

    #[test]
    fn test_display_lists_every_setting() {
        let text = AgentConfig::default().to_string();
        assert!(text.contains("interval           = 30s"));
        assert!(text.contains("neighbors_file     = neighbors.json"));
        assert!(text.contains("minimal_tlv        = false"));
    }
}
