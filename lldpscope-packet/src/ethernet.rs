//! Ethernet II frame construction and parsing

use bytes::{BufMut, BytesMut};
use lldpscope_core::{ethertypes, MacAddr};
use std::fmt;

/// EtherType values the LLDP engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    /// IPv4 (0x0800)
    IPv4,
    /// IPv6 (0x86DD)
    IPv6,
    /// LLDP (0x88CC)
    Lldp,
    /// Anything else
    Custom(u16),
}

impl EtherType {
    /// Convert EtherType to u16 value
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::IPv4 => ethertypes::IPV4,
            EtherType::IPv6 => ethertypes::IPV6,
            EtherType::Lldp => ethertypes::LLDP,
            EtherType::Custom(val) => val,
        }
    }

    /// Create EtherType from u16 value
    pub fn from_u16(value: u16) -> Self {
        match value {
            ethertypes::IPV4 => EtherType::IPv4,
            ethertypes::IPV6 => EtherType::IPv6,
            ethertypes::LLDP => EtherType::Lldp,
            val => EtherType::Custom(val),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::IPv4 => write!(f, "IPv4"),
            EtherType::IPv6 => write!(f, "IPv6"),
            EtherType::Lldp => write!(f, "LLDP"),
            EtherType::Custom(val) => write!(f, "0x{:04X}", val),
        }
    }
}

/// Ethernet II frame
#[derive(Debug, Clone)]
pub struct EthernetFrame {
    /// Destination MAC address
    pub destination: MacAddr,
    /// Source MAC address
    pub source: MacAddr,
    /// 802.1Q VLAN id, when the captured frame carried a tag
    pub vlan_id: Option<u16>,
    /// EtherType of the payload
    pub ethertype: EtherType,
    /// Payload data
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    /// Minimum Ethernet frame size (without FCS)
    pub const MIN_FRAME_SIZE: usize = 60;

    /// Ethernet header size (dst + src + type)
    pub const HEADER_SIZE: usize = 14;

    /// Size of an 802.1Q tag (TPID + TCI)
    pub const VLAN_TAG_SIZE: usize = 4;

    /// Create a new untagged Ethernet frame
    pub fn new(
        destination: MacAddr,
        source: MacAddr,
        ethertype: EtherType,
        payload: Vec<u8>,
    ) -> Self {
        EthernetFrame {
            destination,
            source,
            vlan_id: None,
            ethertype,
            payload,
        }
    }

    /// Frame carrying an LLDPDU to the nearest-bridge multicast group
    pub fn lldp(source: MacAddr, lldpdu: Vec<u8>) -> Self {
        Self::new(MacAddr::lldp_multicast(), source, EtherType::Lldp, lldpdu)
    }

    /// Whether the payload is an LLDPDU
    pub fn is_lldp(&self) -> bool {
        self.ethertype == EtherType::Lldp
    }

    /// Convert the frame to bytes, padded to the minimum frame size
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(
            Self::HEADER_SIZE + Self::VLAN_TAG_SIZE + self.payload.len(),
        );

        buffer.put_slice(self.destination.as_bytes());
        buffer.put_slice(self.source.as_bytes());

        if let Some(vlan_id) = self.vlan_id {
            buffer.put_u16(ethertypes::VLAN);
            buffer.put_u16(vlan_id & 0x0FFF);
        }

        buffer.put_u16(self.ethertype.to_u16());
        buffer.put_slice(&self.payload);

        let mut result = buffer.to_vec();
        if result.len() < Self::MIN_FRAME_SIZE {
            result.resize(Self::MIN_FRAME_SIZE, 0);
        }

        result
    }

    /// Parse an Ethernet II frame from bytes.
    ///
    /// Returns `None` for buffers shorter than a header. Trailing padding is
    /// kept in the payload; LLDP decoding stops at its End TLV anyway.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE {
            return None;
        }

        let destination = MacAddr::from_slice(&data[0..6])?;
        let source = MacAddr::from_slice(&data[6..12])?;

        let mut offset = 12;
        let mut ethertype = u16::from_be_bytes([data[offset], data[offset + 1]]);
        let mut vlan_id = None;

        if ethertype == ethertypes::VLAN {
            if data.len() < Self::HEADER_SIZE + Self::VLAN_TAG_SIZE {
                return None;
            }
            vlan_id = Some(u16::from_be_bytes([data[14], data[15]]) & 0x0FFF);
            offset += Self::VLAN_TAG_SIZE;
            ethertype = u16::from_be_bytes([data[offset], data[offset + 1]]);
        }

        Some(EthernetFrame {
            destination,
            source,
            vlan_id,
            ethertype: EtherType::from_u16(ethertype),
            payload: data[offset + 2..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethertype_conversion() {
        assert_eq!(EtherType::Lldp.to_u16(), 0x88CC);
        assert_eq!(EtherType::from_u16(0x88CC), EtherType::Lldp);
        assert_eq!(EtherType::from_u16(0x1234), EtherType::Custom(0x1234));
        assert_eq!(EtherType::Custom(0x1234).to_string(), "0x1234");
    }

    #[test]
    fn test_lldp_frame_header() {
        let src = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let bytes = EthernetFrame::lldp(src, vec![0x02, 0x07, 0x04]).to_bytes();

        assert_eq!(bytes.len(), EthernetFrame::MIN_FRAME_SIZE);
        assert_eq!(&bytes[0..6], &[0x01, 0x80, 0xC2, 0x00, 0x00, 0x0E]);
        assert_eq!(&bytes[6..12], src.as_bytes());
        assert_eq!(&bytes[12..14], &[0x88, 0xCC]);
        assert_eq!(&bytes[14..17], &[0x02, 0x07, 0x04]);
    }

    #[test]
    fn test_large_payload_not_padded() {
        let src = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let bytes = EthernetFrame::lldp(src, vec![0xAB; 100]).to_bytes();
        assert_eq!(bytes.len(), EthernetFrame::HEADER_SIZE + 100);
    }

    #[test]
    fn test_parse_untagged() {
        let data = vec![
            0x01, 0x80, 0xC2, 0x00, 0x00, 0x0E, // dst
            0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, // src
            0x88, 0xCC, // LLDP
            0x00, 0x00, // End TLV
        ];

        let frame = EthernetFrame::from_bytes(&data).unwrap();
        assert!(frame.is_lldp());
        assert_eq!(frame.source.to_string(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(frame.vlan_id, None);
        assert_eq!(frame.payload, vec![0x00, 0x00]);
    }

    #[test]
    fn test_parse_vlan_tagged() {
        let data = vec![
            0x01, 0x80, 0xC2, 0x00, 0x00, 0x0E, // dst
            0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, // src
            0x81, 0x00, 0x20, 0x64, // 802.1Q, PCP 1, VLAN 100
            0x88, 0xCC, // LLDP
            0x00, 0x00,
        ];

        let frame = EthernetFrame::from_bytes(&data).unwrap();
        assert_eq!(frame.vlan_id, Some(100));
        assert!(frame.is_lldp());
        assert_eq!(frame.payload, vec![0x00, 0x00]);
    }

    #[test]
    fn test_parse_short_buffers() {
        assert!(EthernetFrame::from_bytes(&[0u8; 13]).is_none());

        let mut tagged_header_only = vec![0u8; 12];
        tagged_header_only.extend_from_slice(&[0x81, 0x00, 0x00]);
        assert!(EthernetFrame::from_bytes(&tagged_header_only).is_none());
    }
}
