//! Named fields extracted from a received LLDPDU

use lldpscope_core::colon_hex;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::packet::{
    address_family, ChassisIdSubtype, LldpPacket, PortIdSubtype, IEEE_8021_OUI, IEEE_8023_OUI,
    LLDP_MED_OUI, LLDP_TTL_DEFAULT,
};
use crate::tlv::{Tlv, TlvType};

/// Placeholder for identity fields the LLDPDU did not carry
pub const UNKNOWN: &str = "Unknown";

/// Management address as carried in TLV type 8
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementAddress {
    /// IANA address family number (1 = IPv4)
    pub family: u8,
    pub address: Vec<u8>,
    /// Interface number, interpreted as ifIndex
    pub interface_index: u32,
    /// Object identifier, usually empty
    pub oid: Vec<u8>,
}

impl ManagementAddress {
    pub fn ipv4(addr: Ipv4Addr, interface_index: u32) -> Self {
        Self {
            family: address_family::IPV4,
            address: addr.octets().to_vec(),
            interface_index,
            oid: Vec::new(),
        }
    }

    /// Dotted decimal for IPv4, colon-separated hex for anything else
    pub fn address_string(&self) -> String {
        if self.family == address_family::IPV4 {
            self.address
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(".")
        } else {
            colon_hex(&self.address)
        }
    }

    fn parse(value: &[u8]) -> Option<Self> {
        let addr_len = *value.first()? as usize;
        // addr_len counts the family byte too
        if addr_len < 2 || value.len() < 1 + addr_len {
            return None;
        }
        let family = value[1];
        let address = value[2..1 + addr_len].to_vec();

        // Interface numbering is optional as far as decoding is concerned
        let rest = &value[1 + addr_len..];
        let interface_index = rest
            .get(1..5)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .unwrap_or(0);
        let oid = rest
            .get(5)
            .and_then(|&len| rest.get(6..6 + len as usize))
            .map(<[u8]>::to_vec)
            .unwrap_or_default();

        Some(Self {
            family,
            address,
            interface_index,
            oid,
        })
    }
}

/// Organizationally-specific TLV (type 127)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorExtension {
    #[serde(with = "hex::serde")]
    pub oui: [u8; 3],
    pub subtype: u8,
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
}

impl VendorExtension {
    fn parse(value: &[u8]) -> Option<Self> {
        if value.len() < 4 {
            return None;
        }
        Some(Self {
            oui: [value[0], value[1], value[2]],
            subtype: value[3],
            payload: value[4..].to_vec(),
        })
    }

    /// Well-known organization name, if the OUI is one we recognize
    pub fn organization(&self) -> Option<&'static str> {
        match self.oui {
            LLDP_MED_OUI => Some("TIA LLDP-MED"),
            IEEE_8021_OUI => Some("IEEE 802.1"),
            IEEE_8023_OUI => Some("IEEE 802.3"),
            _ => None,
        }
    }

    /// Payload as text when it is printable UTF-8
    pub fn payload_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload)
            .ok()
            .filter(|s| !s.is_empty() && s.chars().all(|c| !c.is_control()))
    }
}

/// Fields decoded from an LLDPDU.
///
/// This is also the `data` object of a neighbor in the shared store, so the
/// serde names are part of the on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodedFields {
    pub chassis_id: String,
    pub chassis_id_subtype: String,
    pub port_id: String,
    pub port_id_subtype: String,
    pub ttl: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_capabilities: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_capabilities: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management_address: Option<String>,
    /// Full management address, only available on freshly decoded frames
    #[serde(skip)]
    pub management: Option<ManagementAddress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vendor_extensions: Vec<VendorExtension>,
}

impl Default for DecodedFields {
    fn default() -> Self {
        Self {
            chassis_id: UNKNOWN.to_string(),
            chassis_id_subtype: UNKNOWN.to_string(),
            port_id: UNKNOWN.to_string(),
            port_id_subtype: UNKNOWN.to_string(),
            ttl: LLDP_TTL_DEFAULT,
            port_description: None,
            system_name: None,
            system_description: None,
            system_capabilities: None,
            enabled_capabilities: None,
            management_address: None,
            management: None,
            vendor_extensions: Vec::new(),
        }
    }
}

fn text(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

/// Split a subtyped ID TLV into (subtype, id string). MAC subtypes render as
/// colon hex, everything else as text.
fn subtyped_id(value: &[u8], is_mac: impl Fn(u8) -> bool) -> Option<(u8, String)> {
    let (&subtype, id) = value.split_first()?;
    let rendered = if is_mac(subtype) {
        colon_hex(id)
    } else {
        text(id)
    };
    Some((subtype, rendered))
}

impl DecodedFields {
    /// Decode every TLV of `packet`.
    ///
    /// A TLV whose value is too short for its type is skipped; the rest of
    /// the packet still decodes. For repeated singleton TLVs the last one
    /// wins, vendor extensions accumulate.
    pub fn from_packet(packet: &LldpPacket) -> Self {
        let mut fields = Self::default();
        for tlv in &packet.tlvs {
            fields.apply(tlv);
        }
        fields
    }

    /// Decode an LLDPDU straight from bytes
    pub fn decode(data: &[u8]) -> Self {
        Self::from_packet(&LldpPacket::decode(data))
    }

    fn apply(&mut self, tlv: &Tlv) {
        let value = tlv.value.as_slice();
        match tlv.tlv_type {
            TlvType::ChassisId => {
                let mac = ChassisIdSubtype::MacAddress as u8;
                if let Some((subtype, id)) = subtyped_id(value, |s| s == mac) {
                    self.chassis_id = id;
                    self.chassis_id_subtype = ChassisIdSubtype::from_u8(subtype)
                        .map(|s| s.name().to_string())
                        .unwrap_or_else(|| UNKNOWN.to_string());
                }
            }
            TlvType::PortId => {
                let mac = PortIdSubtype::MacAddress as u8;
                if let Some((subtype, id)) = subtyped_id(value, |s| s == mac) {
                    self.port_id = id;
                    self.port_id_subtype = PortIdSubtype::from_u8(subtype)
                        .map(|s| s.name().to_string())
                        .unwrap_or_else(|| UNKNOWN.to_string());
                }
            }
            TlvType::Ttl => {
                if let [hi, lo] = value {
                    self.ttl = u16::from_be_bytes([*hi, *lo]);
                }
            }
            TlvType::PortDescription => self.port_description = Some(text(value)),
            TlvType::SystemName => self.system_name = Some(text(value)),
            TlvType::SystemDescription => self.system_description = Some(text(value)),
            TlvType::SystemCapabilities => {
                if value.len() >= 4 {
                    self.system_capabilities = Some(u16::from_be_bytes([value[0], value[1]]));
                    self.enabled_capabilities = Some(u16::from_be_bytes([value[2], value[3]]));
                }
            }
            TlvType::ManagementAddress => {
                if let Some(mgmt) = ManagementAddress::parse(value) {
                    self.management_address = Some(mgmt.address_string());
                    self.management = Some(mgmt);
                }
            }
            TlvType::OrganizationallySpecific => {
                if let Some(ext) = VendorExtension::parse(value) {
                    self.vendor_extensions.push(ext);
                }
            }
            TlvType::EndOfLldpdu | TlvType::Unknown(_) => {}
        }
    }

    /// Vendor extensions from one organization
    pub fn vendor_extensions_for(&self, oui: [u8; 3]) -> impl Iterator<Item = &VendorExtension> {
        self.vendor_extensions.iter().filter(move |ext| ext.oui == oui)
    }
}
