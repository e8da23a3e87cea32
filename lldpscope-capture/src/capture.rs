//! Blocking pcap capture on a single interface

use lldpscope_core::{CapturedFrame, Error, Result};
use pcap::{Active, Capture, Device};
use tracing::{debug, error, info, warn};

/// Default snapshot length (maximum bytes per packet)
const DEFAULT_SNAPLEN: i32 = 65535;

/// Read timeout in milliseconds
const DEFAULT_TIMEOUT_MS: i32 = 1000;

/// Configuration for packet capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Maximum bytes to capture per packet
    pub snaplen: i32,
    /// Timeout in milliseconds
    pub timeout_ms: i32,
    /// Enable promiscuous mode
    pub promiscuous: bool,
    /// Enable immediate mode (deliver packets immediately)
    pub immediate_mode: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            promiscuous: true,
            immediate_mode: true,
        }
    }
}

/// Capture on one interface
pub struct PacketCapture {
    interface: String,
    config: CaptureConfig,
    filter: Option<String>,
}

impl PacketCapture {
    pub fn new(interface: &str) -> Self {
        Self::with_config(interface, CaptureConfig::default())
    }

    pub fn with_config(interface: &str, config: CaptureConfig) -> Self {
        Self {
            interface: interface.to_string(),
            config,
            filter: None,
        }
    }

    /// BPF filter applied when the capture opens
    pub fn set_filter(&mut self, bpf: &str) {
        debug!(interface = %self.interface, filter = bpf, "Setting BPF filter");
        self.filter = Some(bpf.to_string());
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    fn open(&self) -> Result<Capture<Active>> {
        debug!(interface = %self.interface, "Initializing pcap capture");

        let device = Device::from(self.interface.as_str());
        let mut capture = Capture::from_device(device)
            .map_err(|e| Error::Capture(format!("Failed to create capture: {}", e)))?
            .promisc(self.config.promiscuous)
            .snaplen(self.config.snaplen)
            .timeout(self.config.timeout_ms)
            .immediate_mode(self.config.immediate_mode)
            .open()
            .map_err(|e| {
                Error::Capture(format!("Failed to open capture on {}: {}", self.interface, e))
            })?;

        if let Some(filter) = self.filter.as_ref() {
            capture
                .filter(filter, true)
                .map_err(|e| Error::Capture(format!("Failed to apply filter: {}", e)))?;
        }

        Ok(capture)
    }

    /// Capture until pcap reports an error.
    ///
    /// Blocks the calling thread for the life of the capture; read timeouts
    /// are skipped. The worker ends it by exiting the process.
    pub fn run<F>(&self, mut callback: F) -> Result<()>
    where
        F: FnMut(CapturedFrame),
    {
        let mut capture = self.open()?;

        info!(
            interface = %self.interface,
            filter = self.filter.as_deref().unwrap_or(""),
            "Capture started"
        );

        let error = loop {
            match capture.next_packet() {
                Ok(packet) => {
                    callback(CapturedFrame::new(self.interface.as_str(), packet.data.to_vec()));
                }
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(e) => break e,
            }
        };
        error!(interface = %self.interface, error = %error, "Packet capture error");

        match capture.stats() {
            Ok(stat) => info!(
                interface = %self.interface,
                received = stat.received,
                dropped = stat.dropped,
                if_dropped = stat.if_dropped,
                "Capture finished"
            ),
            Err(e) => warn!(interface = %self.interface, error = %e, "Capture finished, no stats"),
        }

        Err(Error::Capture(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_config_default() {
        let config = CaptureConfig::default();
        assert_eq!(config.snaplen, DEFAULT_SNAPLEN);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.promiscuous);
        assert!(config.immediate_mode);
    }

    #[test]
    fn test_new_capture_holds_filter() {
        let mut capture = PacketCapture::new("eth0");
        assert!(capture.filter.is_none());
        capture.set_filter(&crate::filters::lldp_filter());
        assert_eq!(capture.interface(), "eth0");
        assert_eq!(capture.filter.as_deref(), Some("ether proto 0x88cc"));
    }

    #[test]
    fn test_run_on_missing_device_fails() {
        let capture = PacketCapture::new("nonexistent_interface_xyz");
        let result = capture.run(|_| {});
        assert!(matches!(result, Err(Error::Capture(_))));
    }
}
