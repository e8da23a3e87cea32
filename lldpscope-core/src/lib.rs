//! lldpscope core library
//!
//! This crate provides the shared error type, address types and the two
//! collaborator traits the LLDP engine is built against:
//!
//! - [`InterfaceProvider`] enumerates local network interfaces
//! - [`LinkTransport`] sends and receives raw Ethernet frames

pub mod error;
pub mod interface;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use interface::{InterfaceInfo, InterfaceProvider};
pub use transport::{CapturedFrame, FrameHandler, LinkTransport};
pub use types::*;
