//! Raw frame transport seam

use crate::{InterfaceInfo, Result};
use std::sync::Arc;

/// A raw Ethernet frame delivered by the transport's receive loop
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Name of the interface the frame arrived on
    pub interface: String,
    /// Frame bytes, starting at the Ethernet destination address
    pub data: Vec<u8>,
}

impl CapturedFrame {
    pub fn new(interface: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            interface: interface.into(),
            data,
        }
    }
}

/// Callback invoked for every frame the receive loop delivers
pub type FrameHandler = Arc<dyn Fn(CapturedFrame) + Send + Sync>;

/// Layer-2 send/receive capability.
///
/// `receive_loop` blocks until every capture it opened has ended; it has no
/// cooperative cancellation, callers that need to stop it terminate the
/// hosting process.
pub trait LinkTransport: Send + Sync {
    /// Send one complete Ethernet frame on `interface`
    fn send(&self, frame: &[u8], interface: &InterfaceInfo) -> Result<()>;

    /// Capture frames matching the BPF `filter` on all `interfaces`
    fn receive_loop(&self, filter: &str, interfaces: &[String], on_frame: FrameHandler)
        -> Result<()>;
}
