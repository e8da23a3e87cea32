//! Single LLDP TLV record

use lldpscope_core::{Error, Result};

/// Largest value a 9-bit TLV length can describe
pub const TLV_MAX_LENGTH: usize = 0x1FF;

/// Largest type a 7-bit TLV type can describe
pub const TLV_MAX_TYPE: u8 = 0x7F;

/// Size of the type/length header
pub const TLV_HEADER_SIZE: usize = 2;

/// LLDP TLV types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlvType {
    EndOfLldpdu,
    ChassisId,
    PortId,
    Ttl,
    PortDescription,
    SystemName,
    SystemDescription,
    SystemCapabilities,
    ManagementAddress,
    OrganizationallySpecific,
    /// Reserved or future type, carried through untouched
    Unknown(u8),
}

impl TlvType {
    pub fn code(self) -> u8 {
        match self {
            TlvType::EndOfLldpdu => 0,
            TlvType::ChassisId => 1,
            TlvType::PortId => 2,
            TlvType::Ttl => 3,
            TlvType::PortDescription => 4,
            TlvType::SystemName => 5,
            TlvType::SystemDescription => 6,
            TlvType::SystemCapabilities => 7,
            TlvType::ManagementAddress => 8,
            TlvType::OrganizationallySpecific => 127,
            TlvType::Unknown(code) => code,
        }
    }
}

impl From<u8> for TlvType {
    fn from(value: u8) -> Self {
        match value {
            0 => TlvType::EndOfLldpdu,
            1 => TlvType::ChassisId,
            2 => TlvType::PortId,
            3 => TlvType::Ttl,
            4 => TlvType::PortDescription,
            5 => TlvType::SystemName,
            6 => TlvType::SystemDescription,
            7 => TlvType::SystemCapabilities,
            8 => TlvType::ManagementAddress,
            127 => TlvType::OrganizationallySpecific,
            other => TlvType::Unknown(other),
        }
    }
}

/// LLDP TLV (Type-Length-Value)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    pub tlv_type: TlvType,
    pub value: Vec<u8>,
}

impl Tlv {
    pub fn new(tlv_type: TlvType, value: Vec<u8>) -> Self {
        Self { tlv_type, value }
    }

    /// Length as it appears in the header
    pub fn length(&self) -> usize {
        self.value.len()
    }

    pub fn is_end(&self) -> bool {
        self.tlv_type == TlvType::EndOfLldpdu
    }

    /// Encode the TLV into header + value bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        let len = self.value.len();
        if len > TLV_MAX_LENGTH {
            return Err(Error::TlvLengthExceeded { length: len });
        }

        let code = self.tlv_type.code();
        if code > TLV_MAX_TYPE {
            return Err(Error::PacketConstruction(format!(
                "TLV type {} does not fit in 7 bits",
                code
            )));
        }

        let mut bytes = Vec::with_capacity(TLV_HEADER_SIZE + len);

        // Type (7 bits) | Length (9 bits)
        let type_length = ((code as u16) << 9) | len as u16;
        bytes.extend_from_slice(&type_length.to_be_bytes());
        bytes.extend_from_slice(&self.value);

        Ok(bytes)
    }

    /// Decode the TLV starting at `offset`.
    ///
    /// Returns the TLV and the offset just past it. When fewer than two bytes
    /// remain, or the declared length runs past the end of `data`, returns
    /// `None` with `offset` unchanged.
    pub fn decode(data: &[u8], offset: usize) -> (Option<Self>, usize) {
        let header_end = match offset.checked_add(TLV_HEADER_SIZE) {
            Some(end) if end <= data.len() => end,
            _ => return (None, offset),
        };

        let type_length = u16::from_be_bytes([data[offset], data[offset + 1]]);
        let tlv_type = TlvType::from((type_length >> 9) as u8 & TLV_MAX_TYPE);
        let length = (type_length & TLV_MAX_LENGTH as u16) as usize;

        let value_end = header_end + length;
        if value_end > data.len() {
            return (None, offset);
        }

        let value = data[header_end..value_end].to_vec();
        (Some(Self::new(tlv_type, value)), value_end)
    }
}
