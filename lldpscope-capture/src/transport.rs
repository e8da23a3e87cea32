//! [`LinkTransport`] over pnet (send) and pcap (receive)

use lldpscope_core::{Error, FrameHandler, InterfaceInfo, LinkTransport, Result};
use parking_lot::Mutex;
use pnet_datalink::{Channel, DataLinkSender};
use std::collections::HashMap;
use std::thread;
use tracing::{debug, error, info, warn};

use crate::capture::{CaptureConfig, PacketCapture};
use crate::interface::find_network_interface;

/// Raw Ethernet transport for the host's interfaces.
///
/// Senders are opened lazily per interface and reused for later frames.
#[derive(Default)]
pub struct DatalinkTransport {
    capture_config: CaptureConfig,
    senders: Mutex<HashMap<String, Box<dyn DataLinkSender>>>,
}

impl DatalinkTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn open_sender(name: &str) -> Result<Box<dyn DataLinkSender>> {
        let interface = find_network_interface(name)?;

        match pnet_datalink::channel(&interface, Default::default()) {
            Ok(Channel::Ethernet(tx, _rx)) => Ok(tx),
            Ok(_) => Err(Error::Interface("Unsupported channel type".to_string())),
            Err(e) => Err(Error::Interface(format!(
                "Failed to create channel on {}: {}",
                name, e
            ))),
        }
    }
}

impl LinkTransport for DatalinkTransport {
    fn send(&self, frame: &[u8], interface: &InterfaceInfo) -> Result<()> {
        let mut senders = self.senders.lock();

        if !senders.contains_key(&interface.name) {
            let sender = Self::open_sender(&interface.name)?;
            senders.insert(interface.name.clone(), sender);
        }

        let sender = senders
            .get_mut(&interface.name)
            .ok_or_else(|| Error::Interface(format!("No sender for {}", interface.name)))?;

        let sent = sender
            .send_to(frame, None)
            .ok_or_else(|| Error::Interface("Failed to send packet".to_string()))
            .and_then(|r| r.map_err(|e| Error::Interface(format!("Send error: {}", e))));

        if sent.is_err() {
            // Channel may be dead (interface bounced); reopen next time
            senders.remove(&interface.name);
        }
        sent?;

        debug!(interface = %interface.name, bytes = frame.len(), "Frame sent");
        Ok(())
    }

    fn receive_loop(
        &self,
        filter: &str,
        interfaces: &[String],
        on_frame: FrameHandler,
    ) -> Result<()> {
        if interfaces.is_empty() {
            return Err(Error::Capture("No interfaces to capture on".to_string()));
        }

        let handles: Vec<_> = interfaces
            .iter()
            .map(|name| {
                let mut capture = PacketCapture::with_config(name, self.capture_config.clone());
                capture.set_filter(filter);
                let on_frame = on_frame.clone();
                let name = name.clone();

                thread::Builder::new()
                    .name(format!("capture-{}", name))
                    .spawn(move || {
                        let result = capture.run(|frame| on_frame(frame));
                        if let Err(e) = &result {
                            warn!(interface = %name, error = %e, "Capture ended with error");
                        }
                        result
                    })
                    .map_err(Error::Io)
            })
            .collect::<Result<_>>()?;

        info!(count = handles.len(), filter, "Receive loop running");

        let mut failures = 0;
        let total = handles.len();
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(_)) => failures += 1,
                Err(_) => {
                    error!("Capture thread panicked");
                    failures += 1;
                }
            }
        }

        if failures == total {
            return Err(Error::Capture(format!(
                "All {} captures failed",
                total
            )));
        }

        Ok(())
    }
}
