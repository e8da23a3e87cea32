//! Link Layer Discovery Protocol (IEEE 802.1AB) codec
//!
//! Three layers, leaf first:
//! - [`tlv`]: a single type-length-value record and its 16-bit header
//! - [`packet`]: an ordered LLDPDU, built with typed constructors
//! - [`fields`]: the named fields extracted from a received LLDPDU
//!
//! ## Wire format
//!
//! Each TLV starts with a big-endian word holding a 7-bit type and a 9-bit
//! length, followed by `length` value bytes. Chassis ID (1), Port ID (2) and
//! TTL (3) are mandatory and come first; End of LLDPDU (0) closes the
//! sequence.
//!
//! Decoding is lenient: truncated input ends the TLV scan, unknown types are
//! kept as opaque records and a malformed optional TLV leaves its field at
//! the default.

pub mod fields;
pub mod packet;
pub mod tlv;

pub use fields::{DecodedFields, ManagementAddress, VendorExtension};
pub use packet::{
    ChassisIdSubtype, LldpCapabilities, LldpPacket, LldpduBuilder, PortIdSubtype,
    LLDP_MED_OUI, LLDP_TTL_DEFAULT,
};
pub use tlv::{Tlv, TlvType};
