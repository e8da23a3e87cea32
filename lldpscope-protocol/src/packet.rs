//! LLDPDU construction and TLV scanning

use bytes::{BufMut, BytesMut};
use lldpscope_core::{Error, Result};

use crate::fields::{DecodedFields, ManagementAddress};
use crate::tlv::{Tlv, TlvType};

/// Default TTL (seconds)
pub const LLDP_TTL_DEFAULT: u16 = 120;

/// TIA LLDP-MED organization identifier
pub const LLDP_MED_OUI: [u8; 3] = [0x00, 0x12, 0xBB];

/// IEEE 802.1 organization identifier
pub const IEEE_8021_OUI: [u8; 3] = [0x00, 0x80, 0xC2];

/// IEEE 802.3 organization identifier
pub const IEEE_8023_OUI: [u8; 3] = [0x00, 0x12, 0x0F];

/// Interface numbering subtype "ifIndex" in the management address TLV
pub const IF_NUMBERING_IFINDEX: u8 = 2;

/// Address family numbers used by the management address TLV
pub mod address_family {
    pub const IPV4: u8 = 1;
    pub const IPV6: u8 = 2;
    pub const IEEE_802: u8 = 6;
}

/// Chassis ID Subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChassisIdSubtype {
    ChassisComponent = 1,
    InterfaceAlias = 2,
    PortComponent = 3,
    MacAddress = 4,
    NetworkAddress = 5,
    InterfaceName = 6,
    LocallyAssigned = 7,
}

impl ChassisIdSubtype {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::ChassisComponent),
            2 => Some(Self::InterfaceAlias),
            3 => Some(Self::PortComponent),
            4 => Some(Self::MacAddress),
            5 => Some(Self::NetworkAddress),
            6 => Some(Self::InterfaceName),
            7 => Some(Self::LocallyAssigned),
            _ => None,
        }
    }

    /// Name stored in the neighbor store (`MAC_ADDRESS`, ...)
    pub fn name(self) -> &'static str {
        match self {
            Self::ChassisComponent => "CHASSIS_COMPONENT",
            Self::InterfaceAlias => "INTERFACE_ALIAS",
            Self::PortComponent => "PORT_COMPONENT",
            Self::MacAddress => "MAC_ADDRESS",
            Self::NetworkAddress => "NETWORK_ADDRESS",
            Self::InterfaceName => "INTERFACE_NAME",
            Self::LocallyAssigned => "LOCALLY_ASSIGNED",
        }
    }
}

/// Port ID Subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PortIdSubtype {
    InterfaceAlias = 1,
    PortComponent = 2,
    MacAddress = 3,
    NetworkAddress = 4,
    InterfaceName = 5,
    AgentCircuitId = 6,
    LocallyAssigned = 7,
}

impl PortIdSubtype {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::InterfaceAlias),
            2 => Some(Self::PortComponent),
            3 => Some(Self::MacAddress),
            4 => Some(Self::NetworkAddress),
            5 => Some(Self::InterfaceName),
            6 => Some(Self::AgentCircuitId),
            7 => Some(Self::LocallyAssigned),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::InterfaceAlias => "INTERFACE_ALIAS",
            Self::PortComponent => "PORT_COMPONENT",
            Self::MacAddress => "MAC_ADDRESS",
            Self::NetworkAddress => "NETWORK_ADDRESS",
            Self::InterfaceName => "INTERFACE_NAME",
            Self::AgentCircuitId => "AGENT_CIRCUIT_ID",
            Self::LocallyAssigned => "LOCALLY_ASSIGNED",
        }
    }
}

/// System Capabilities (bitmap)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LldpCapabilities(pub u16);

impl LldpCapabilities {
    pub const OTHER: u16 = 0x0001;
    pub const REPEATER: u16 = 0x0002;
    pub const BRIDGE: u16 = 0x0004;
    pub const WLAN_ACCESS_POINT: u16 = 0x0008;
    pub const ROUTER: u16 = 0x0010;
    pub const TELEPHONE: u16 = 0x0020;
    pub const DOCSIS: u16 = 0x0040;
    pub const STATION_ONLY: u16 = 0x0080;

    pub fn station_only() -> Self {
        Self(Self::STATION_ONLY)
    }

    pub fn contains(&self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    /// Human readable names of the set bits
    pub fn names(&self) -> Vec<&'static str> {
        [
            (Self::OTHER, "Other"),
            (Self::REPEATER, "Repeater"),
            (Self::BRIDGE, "Bridge"),
            (Self::WLAN_ACCESS_POINT, "WLAN AP"),
            (Self::ROUTER, "Router"),
            (Self::TELEPHONE, "Telephone"),
            (Self::DOCSIS, "DOCSIS"),
            (Self::STATION_ONLY, "Station"),
        ]
        .iter()
        .filter(|(bit, _)| self.contains(*bit))
        .map(|(_, name)| *name)
        .collect()
    }
}

fn subtyped(subtype: u8, id: &[u8]) -> Vec<u8> {
    let mut value = Vec::with_capacity(id.len() + 1);
    value.push(subtype);
    value.extend_from_slice(id);
    value
}

impl Tlv {
    pub fn chassis_id(subtype: ChassisIdSubtype, id: &[u8]) -> Self {
        Self::new(TlvType::ChassisId, subtyped(subtype as u8, id))
    }

    pub fn port_id(subtype: PortIdSubtype, id: &[u8]) -> Self {
        Self::new(TlvType::PortId, subtyped(subtype as u8, id))
    }

    pub fn ttl(seconds: u16) -> Self {
        Self::new(TlvType::Ttl, seconds.to_be_bytes().to_vec())
    }

    pub fn port_description(desc: &str) -> Self {
        Self::new(TlvType::PortDescription, desc.as_bytes().to_vec())
    }

    pub fn system_name(name: &str) -> Self {
        Self::new(TlvType::SystemName, name.as_bytes().to_vec())
    }

    pub fn system_description(desc: &str) -> Self {
        Self::new(TlvType::SystemDescription, desc.as_bytes().to_vec())
    }

    pub fn system_capabilities(capabilities: u16, enabled: u16) -> Self {
        let mut value = Vec::with_capacity(4);
        value.extend_from_slice(&capabilities.to_be_bytes());
        value.extend_from_slice(&enabled.to_be_bytes());
        Self::new(TlvType::SystemCapabilities, value)
    }

    /// Management address TLV.
    ///
    /// Layout: address string length (address + family byte), family,
    /// address, interface numbering subtype (ifIndex), interface number,
    /// OID length, OID.
    pub fn management_address(mgmt: &ManagementAddress) -> Result<Self> {
        if mgmt.address.is_empty() || mgmt.address.len() > 31 {
            return Err(Error::PacketConstruction(format!(
                "management address must be 1-31 bytes, got {}",
                mgmt.address.len()
            )));
        }
        if mgmt.oid.len() > 128 {
            return Err(Error::PacketConstruction(format!(
                "management OID must be at most 128 bytes, got {}",
                mgmt.oid.len()
            )));
        }

        let mut value = BytesMut::with_capacity(9 + mgmt.address.len() + mgmt.oid.len());
        value.put_u8(mgmt.address.len() as u8 + 1);
        value.put_u8(mgmt.family);
        value.put_slice(&mgmt.address);
        value.put_u8(IF_NUMBERING_IFINDEX);
        value.put_u32(mgmt.interface_index);
        value.put_u8(mgmt.oid.len() as u8);
        value.put_slice(&mgmt.oid);

        Ok(Self::new(TlvType::ManagementAddress, value.to_vec()))
    }

    pub fn organizationally_specific(oui: [u8; 3], subtype: u8, info: &[u8]) -> Self {
        let mut value = Vec::with_capacity(4 + info.len());
        value.extend_from_slice(&oui);
        value.push(subtype);
        value.extend_from_slice(info);
        Self::new(TlvType::OrganizationallySpecific, value)
    }

    pub fn end_of_lldpdu() -> Self {
        Self::new(TlvType::EndOfLldpdu, vec![])
    }
}

/// LLDP Packet: an ordered TLV sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LldpPacket {
    pub tlvs: Vec<Tlv>,
}

impl LldpPacket {
    pub fn new() -> Self {
        Self { tlvs: Vec::new() }
    }

    pub fn add_tlv(&mut self, tlv: Tlv) {
        self.tlvs.push(tlv);
    }

    pub fn add_chassis_id(&mut self, subtype: ChassisIdSubtype, id: &[u8]) {
        self.add_tlv(Tlv::chassis_id(subtype, id));
    }

    pub fn add_port_id(&mut self, subtype: PortIdSubtype, id: &[u8]) {
        self.add_tlv(Tlv::port_id(subtype, id));
    }

    pub fn add_ttl(&mut self, seconds: u16) {
        self.add_tlv(Tlv::ttl(seconds));
    }

    pub fn add_port_description(&mut self, desc: &str) {
        self.add_tlv(Tlv::port_description(desc));
    }

    pub fn add_system_name(&mut self, name: &str) {
        self.add_tlv(Tlv::system_name(name));
    }

    pub fn add_system_description(&mut self, desc: &str) {
        self.add_tlv(Tlv::system_description(desc));
    }

    pub fn add_system_capabilities(&mut self, capabilities: u16, enabled: u16) {
        self.add_tlv(Tlv::system_capabilities(capabilities, enabled));
    }

    pub fn add_management_address(&mut self, mgmt: &ManagementAddress) -> Result<()> {
        self.add_tlv(Tlv::management_address(mgmt)?);
        Ok(())
    }

    pub fn add_organizationally_specific(&mut self, oui: [u8; 3], subtype: u8, info: &[u8]) {
        self.add_tlv(Tlv::organizationally_specific(oui, subtype, info));
    }

    pub fn add_end_of_lldpdu(&mut self) {
        self.add_tlv(Tlv::end_of_lldpdu());
    }

    /// Encode packet to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = BytesMut::new();
        for tlv in &self.tlvs {
            bytes.put_slice(&tlv.encode()?);
        }
        Ok(bytes.to_vec())
    }

    /// Scan TLVs from the start of `data`.
    ///
    /// Stops at the End of LLDPDU TLV (kept in the result), at the end of
    /// the buffer, or at the first TLV that does not fit. None of these is
    /// an error; a truncated frame simply yields the TLVs before the damage.
    pub fn decode(data: &[u8]) -> Self {
        let mut packet = Self::new();
        let mut offset = 0;

        while offset < data.len() {
            let (tlv, next) = Tlv::decode(data, offset);
            let Some(tlv) = tlv else { break };

            let is_end = tlv.is_end();
            packet.add_tlv(tlv);
            offset = next;
            if is_end {
                break;
            }
        }

        packet
    }

    /// Extract the named fields
    pub fn fields(&self) -> DecodedFields {
        DecodedFields::from_packet(self)
    }
}

/// Builds an LLDPDU in canonical order.
///
/// Chassis ID, Port ID and TTL are emitted first regardless of the order the
/// setters were called in, optional TLVs follow in call order and End of
/// LLDPDU is appended last.
#[derive(Debug, Clone, Default)]
pub struct LldpduBuilder {
    chassis_id: Option<Tlv>,
    port_id: Option<Tlv>,
    ttl: Option<Tlv>,
    optional: Vec<Tlv>,
}

impl LldpduBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chassis_id(mut self, subtype: ChassisIdSubtype, id: &[u8]) -> Self {
        self.chassis_id = Some(Tlv::chassis_id(subtype, id));
        self
    }

    pub fn port_id(mut self, subtype: PortIdSubtype, id: &[u8]) -> Self {
        self.port_id = Some(Tlv::port_id(subtype, id));
        self
    }

    pub fn ttl(mut self, seconds: u16) -> Self {
        self.ttl = Some(Tlv::ttl(seconds));
        self
    }

    pub fn port_description(mut self, desc: &str) -> Self {
        self.optional.push(Tlv::port_description(desc));
        self
    }

    pub fn system_name(mut self, name: &str) -> Self {
        self.optional.push(Tlv::system_name(name));
        self
    }

    pub fn system_description(mut self, desc: &str) -> Self {
        self.optional.push(Tlv::system_description(desc));
        self
    }

    pub fn system_capabilities(mut self, capabilities: u16, enabled: u16) -> Self {
        self.optional
            .push(Tlv::system_capabilities(capabilities, enabled));
        self
    }

    pub fn management_address(mut self, mgmt: &ManagementAddress) -> Result<Self> {
        self.optional.push(Tlv::management_address(mgmt)?);
        Ok(self)
    }

    pub fn vendor_extension(mut self, oui: [u8; 3], subtype: u8, info: &[u8]) -> Self {
        self.optional
            .push(Tlv::organizationally_specific(oui, subtype, info));
        self
    }

    /// Assemble the packet; fails when a mandatory TLV is missing
    pub fn build(self) -> Result<LldpPacket> {
        let missing = |name: &str| Error::PacketConstruction(format!("missing {} TLV", name));

        let mut packet = LldpPacket::new();
        packet.add_tlv(self.chassis_id.ok_or_else(|| missing("Chassis ID"))?);
        packet.add_tlv(self.port_id.ok_or_else(|| missing("Port ID"))?);
        packet.add_tlv(self.ttl.ok_or_else(|| missing("TTL"))?);
        packet.tlvs.extend(self.optional);
        packet.add_end_of_lldpdu();

        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];

    fn minimal() -> LldpPacket {
        LldpduBuilder::new()
            .chassis_id(ChassisIdSubtype::MacAddress, &MAC)
            .port_id(PortIdSubtype::InterfaceName, b"eth0")
            .ttl(120)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_canonical_order() {
        let packet = LldpduBuilder::new()
            .system_name("host-a")
            .ttl(120)
            .port_id(PortIdSubtype::InterfaceName, b"eth0")
            .chassis_id(ChassisIdSubtype::MacAddress, &MAC)
            .system_capabilities(0x80, 0x80)
            .build()
            .unwrap();

        let types: Vec<TlvType> = packet.tlvs.iter().map(|t| t.tlv_type).collect();
        assert_eq!(
            types,
            vec![
                TlvType::ChassisId,
                TlvType::PortId,
                TlvType::Ttl,
                TlvType::SystemName,
                TlvType::SystemCapabilities,
                TlvType::EndOfLldpdu,
            ]
        );
    }

    #[test]
    fn test_builder_requires_mandatory() {
        let result = LldpduBuilder::new()
            .chassis_id(ChassisIdSubtype::MacAddress, &MAC)
            .ttl(120)
            .build();
        match result {
            Err(Error::PacketConstruction(msg)) => assert!(msg.contains("Port ID")),
            other => panic!("Expected PacketConstruction, got {:?}", other),
        }
    }

    #[test]
    fn test_minimal_wire_bytes() {
        let bytes = minimal().to_bytes().unwrap();
        assert_eq!(
            bytes,
            vec![
                0x02, 0x07, 0x04, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, // chassis
                0x04, 0x05, 0x05, b'e', b't', b'h', b'0', // port
                0x06, 0x02, 0x00, 0x78, // ttl
                0x00, 0x00, // end
            ]
        );
    }

    #[test]
    fn test_decode_stops_at_end() {
        let mut bytes = minimal().to_bytes().unwrap();
        // Ethernet padding and junk after End must be ignored
        bytes.extend_from_slice(&[0x0A, 0x03, b'x', b'y', b'z', 0, 0, 0]);

        let parsed = LldpPacket::decode(&bytes);
        assert_eq!(parsed, minimal());
    }

    #[test]
    fn test_decode_without_end() {
        let mut packet = LldpPacket::new();
        packet.add_chassis_id(ChassisIdSubtype::LocallyAssigned, b"sw1");
        packet.add_ttl(60);
        let bytes = packet.to_bytes().unwrap();

        assert_eq!(LldpPacket::decode(&bytes).tlvs.len(), 2);
    }

    #[test]
    fn test_decode_truncated_mid_tlv() {
        let bytes = minimal().to_bytes().unwrap();
        // Cut inside the Port ID value
        let parsed = LldpPacket::decode(&bytes[..12]);
        assert_eq!(parsed.tlvs.len(), 1);
        assert_eq!(parsed.tlvs[0].tlv_type, TlvType::ChassisId);

        assert!(LldpPacket::decode(&[]).tlvs.is_empty());
    }

    #[test]
    fn test_oversized_tlv_fails_packet_encode() {
        let mut packet = minimal();
        packet.add_system_description(&"x".repeat(600));
        assert!(matches!(
            packet.to_bytes(),
            Err(Error::TlvLengthExceeded { length: 600 })
        ));
    }

    #[test]
    fn test_management_address_layout() {
        let mgmt = ManagementAddress::ipv4([192, 168, 1, 10].into(), 7);
        let tlv = Tlv::management_address(&mgmt).unwrap();
        assert_eq!(
            tlv.value,
            vec![0x05, 0x01, 192, 168, 1, 10, 0x02, 0x00, 0x00, 0x00, 0x07, 0x00]
        );
    }

    #[test]
    fn test_management_address_bounds() {
        let empty = ManagementAddress {
            family: address_family::IPV4,
            address: vec![],
            interface_index: 1,
            oid: vec![],
        };
        assert!(Tlv::management_address(&empty).is_err());
    }

    #[test]
    fn test_vendor_extension_layout() {
        let tlv = Tlv::organizationally_specific(LLDP_MED_OUI, 1, &[0x00, 0x01, 0x03]);
        assert_eq!(tlv.tlv_type, TlvType::OrganizationallySpecific);
        assert_eq!(tlv.value, vec![0x00, 0x12, 0xBB, 0x01, 0x00, 0x01, 0x03]);
    }

    #[test]
    fn test_capability_names() {
        let caps = LldpCapabilities(LldpCapabilities::BRIDGE | LldpCapabilities::ROUTER);
        assert_eq!(caps.names(), vec!["Bridge", "Router"]);
        assert!(LldpCapabilities::station_only().contains(LldpCapabilities::STATION_ONLY));
    }

    #[test]
    fn test_subtype_names() {
        assert_eq!(ChassisIdSubtype::from_u8(4).map(|s| s.name()), Some("MAC_ADDRESS"));
        assert_eq!(PortIdSubtype::from_u8(3).map(|s| s.name()), Some("MAC_ADDRESS"));
        assert_eq!(ChassisIdSubtype::from_u8(0), None);
        assert_eq!(PortIdSubtype::from_u8(9), None);
    }
}
