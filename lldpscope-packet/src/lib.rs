//! Ethernet framing for lldpscope
//!
//! LLDPDUs travel directly inside Ethernet II frames addressed to the
//! nearest-bridge multicast group `01:80:c2:00:00:0e` with EtherType
//! `0x88cc`. This crate wraps an encoded LLDPDU into such a frame and pulls
//! the payload back out of captured frames, skipping a single 802.1Q tag if
//! one is present.
//!
//! ```rust
//! use lldpscope_core::MacAddr;
//! use lldpscope_packet::{EtherType, EthernetFrame};
//!
//! let src = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
//! let frame = EthernetFrame::lldp(src, vec![0x00, 0x00]);
//! let bytes = frame.to_bytes();
//!
//! let parsed = EthernetFrame::from_bytes(&bytes).unwrap();
//! assert_eq!(parsed.ethertype, EtherType::Lldp);
//! assert_eq!(parsed.source, src);
//! ```

pub mod ethernet;

pub use ethernet::{EtherType, EthernetFrame};
