//! Host networking adapters for lldpscope
//!
//! Implements the two collaborator traits from `lldpscope-core` on top of
//! the system's packet libraries:
//!
//! - [`SystemInterfaces`]: interface enumeration through `pnet_datalink`
//! - [`DatalinkTransport`]: frame send through a `pnet_datalink` Ethernet
//!   channel, frame receive through `pcap` with one capture thread per
//!   interface
//!
//! ## Example
//!
//! ```no_run
//! use lldpscope_capture::{filters, DatalinkTransport, SystemInterfaces};
//! use lldpscope_core::{InterfaceProvider, LinkTransport};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let names: Vec<String> = SystemInterfaces
//!     .lldp_interfaces()?
//!     .into_iter()
//!     .map(|iface| iface.name)
//!     .collect();
//!
//! let transport = DatalinkTransport::new();
//! transport.receive_loop(&filters::lldp_filter(), &names, Arc::new(|frame| {
//!     println!("{}: {} bytes", frame.interface, frame.data.len());
//! }))?;
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod filters;
pub mod interface;
pub mod stats;
pub mod transport;

// Re-export main types
pub use capture::{CaptureConfig, PacketCapture};
pub use interface::{interface_info, SystemInterfaces};
pub use stats::{CaptureStats, StatsAccumulator};
pub use transport::DatalinkTransport;
