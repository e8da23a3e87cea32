//! Periodic LLDP announcements on local interfaces

use lldpscope_core::{Error, InterfaceInfo, InterfaceProvider, LinkTransport, Result};
use lldpscope_packet::EthernetFrame;
use lldpscope_protocol::packet::address_family;
use lldpscope_protocol::{
    ChassisIdSubtype, LldpPacket, LldpduBuilder, ManagementAddress, PortIdSubtype, LLDP_MED_OUI,
};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::{InterfaceSelection, ManagementMode};
use crate::session::Session;
use crate::system::SystemInfo;

/// Granularity at which a sleeping loop notices a stop request
pub const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Pause after a tick that failed as a whole
pub const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// LLDP-MED TLV subtypes we advertise
mod med {
    pub const CAPABILITIES: u8 = 1;
    pub const HARDWARE_REVISION: u8 = 5;
    pub const FIRMWARE_REVISION: u8 = 6;
    pub const SOFTWARE_REVISION: u8 = 7;

    /// Capabilities 0x0001 (LLDP-MED), device class 3 (endpoint class III),
    /// then a reserved byte
    pub const CAPABILITIES_VALUE: [u8; 4] = [0x00, 0x01, 0x03, 0x00];
}

/// Outcome of one announcement tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnounceReport {
    /// Interfaces a frame went out on
    pub sent: Vec<String>,
    /// Interfaces that failed, with the reason
    pub failed: Vec<(String, String)>,
}

impl AnnounceReport {
    pub fn is_empty(&self) -> bool {
        self.sent.is_empty() && self.failed.is_empty()
    }
}

/// Builds and sends LLDPDUs for this host
pub struct Announcer {
    session: Session,
    system: SystemInfo,
    provider: Arc<dyn InterfaceProvider>,
    transport: Arc<dyn LinkTransport>,
}

impl Announcer {
    pub fn new(
        session: Session,
        provider: Arc<dyn InterfaceProvider>,
        transport: Arc<dyn LinkTransport>,
    ) -> Self {
        Self::with_system(session, SystemInfo::detect(), provider, transport)
    }

    pub fn with_system(
        session: Session,
        system: SystemInfo,
        provider: Arc<dyn InterfaceProvider>,
        transport: Arc<dyn LinkTransport>,
    ) -> Self {
        Self {
            session,
            system,
            provider,
            transport,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn system(&self) -> &SystemInfo {
        &self.system
    }

    fn management_address(&self, interface: &InterfaceInfo) -> Result<Option<ManagementAddress>> {
        let mgmt = match self.session.config().management_mode()? {
            ManagementMode::Disabled => None,
            ManagementMode::Auto => interface
                .primary_ipv4()
                .or(self.system.primary_ipv4)
                .map(|ip| ManagementAddress::ipv4(ip, interface.index)),
            ManagementMode::Fixed(IpAddr::V4(ip)) => Some(ManagementAddress::ipv4(ip, interface.index)),
            ManagementMode::Fixed(IpAddr::V6(ip)) => Some(ManagementAddress {
                family: address_family::IPV6,
                address: ip.octets().to_vec(),
                interface_index: interface.index,
                oid: Vec::new(),
            }),
        };
        Ok(mgmt)
    }

    /// The LLDPDU this host advertises on `interface`
    pub fn build_packet(&self, interface: &InterfaceInfo) -> Result<LldpPacket> {
        let mac = interface
            .mac
            .ok_or_else(|| Error::Interface(format!("{} has no MAC address", interface.name)))?;
        let config = self.session.config();

        let builder = LldpduBuilder::new()
            .chassis_id(ChassisIdSubtype::MacAddress, mac.as_bytes())
            .port_id(PortIdSubtype::MacAddress, mac.as_bytes())
            .ttl(config.ttl_secs());

        if config.minimal_tlv {
            return builder.build();
        }

        let port_description = if config.port_description.is_empty() {
            interface.name.clone()
        } else {
            config.port_description.clone()
        };
        let system_name = if config.system_name_is_auto() {
            self.system.hostname.clone()
        } else {
            config.system_name.clone()
        };
        let system_description = if config.system_description.is_empty() {
            self.system.description()
        } else {
            config.system_description.clone()
        };
        let (capabilities, enabled) = self.system.capabilities();

        let mut builder = builder
            .port_description(&port_description)
            .system_name(&system_name)
            .system_description(&system_description)
            .vendor_extension(LLDP_MED_OUI, med::CAPABILITIES, &med::CAPABILITIES_VALUE)
            .vendor_extension(LLDP_MED_OUI, med::HARDWARE_REVISION, self.system.machine.as_bytes())
            .vendor_extension(LLDP_MED_OUI, med::FIRMWARE_REVISION, self.system.os_release.as_bytes())
            .vendor_extension(
                LLDP_MED_OUI,
                med::SOFTWARE_REVISION,
                SystemInfo::software_revision().as_bytes(),
            )
            .system_capabilities(capabilities, enabled);

        if let Some(mgmt) = self.management_address(interface)? {
            builder = builder.management_address(&mgmt)?;
        }

        builder.build()
    }

    /// Interfaces selected by the configuration
    pub fn target_interfaces(&self) -> Result<Vec<InterfaceInfo>> {
        match self.session.config().interface_selection() {
            InterfaceSelection::All => self.provider.lldp_interfaces(),
            InterfaceSelection::Named(name) => match self.provider.get_interface(&name) {
                Ok(interface) if interface.is_lldp_capable() => Ok(vec![interface]),
                Ok(_) => {
                    warn!(interface = %name, "Interface is down or has no MAC address");
                    Ok(Vec::new())
                }
                Err(Error::InterfaceNotFound(_)) => {
                    warn!(interface = %name, "Interface not found");
                    Ok(Vec::new())
                }
                Err(e) => Err(e),
            },
        }
    }

    fn send_on(&self, interface: &InterfaceInfo) -> Result<usize> {
        let packet = self.build_packet(interface)?;
        let mac = interface
            .mac
            .ok_or_else(|| Error::Interface(format!("{} has no MAC address", interface.name)))?;
        let frame = EthernetFrame::lldp(mac, packet.to_bytes()?).to_bytes();

        self.transport.send(&frame, interface)?;
        Ok(frame.len())
    }

    /// Send one announcement on every selected interface.
    ///
    /// Per-interface failures are logged and reported; only a failure to
    /// enumerate interfaces fails the whole call.
    pub fn send_once(&self) -> Result<AnnounceReport> {
        let mut report = AnnounceReport::default();

        for interface in self.target_interfaces()? {
            match self.send_on(&interface) {
                Ok(bytes) => {
                    debug!(interface = %interface.name, bytes, "LLDPDU sent");
                    report.sent.push(interface.name);
                }
                Err(e) => {
                    warn!(interface = %interface.name, error = %e, "Failed to send LLDPDU");
                    report.failed.push((interface.name, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Run the announcement loop on the current tokio runtime
    pub fn start(self: &Arc<Self>) -> AnnouncerHandle {
        let running = Arc::new(AtomicBool::new(true));
        let announcer = Arc::clone(self);
        let flag = running.clone();

        info!(
            interval = self.session.config().interval,
            interface = %self.session.config().interface,
            "Starting announcer"
        );

        let task_handle = tokio::spawn(async move { announcer.run(flag).await });

        AnnouncerHandle {
            running,
            started_at: SystemTime::now(),
            task_handle: Some(task_handle),
        }
    }

    async fn run(self: Arc<Self>, running: Arc<AtomicBool>) {
        let interval = self.session.config().interval_duration();

        while running.load(Ordering::Relaxed) {
            let announcer = Arc::clone(&self);
            let pause = match tokio::task::spawn_blocking(move || announcer.send_once()).await {
                Ok(Ok(report)) => {
                    debug!(
                        sent = report.sent.len(),
                        failed = report.failed.len(),
                        "Announcement tick done"
                    );
                    interval
                }
                Ok(Err(e)) => {
                    error!(error = %e, "Announcement tick failed, backing off");
                    ERROR_BACKOFF
                }
                Err(e) => {
                    error!(error = %e, "Announcement tick panicked, backing off");
                    ERROR_BACKOFF
                }
            };

            sleep_while_running(&running, pause).await;
        }

        info!("Announcer stopped");
    }
}

/// Sleep for `total` in [`SLEEP_SLICE`] steps, returning early once
/// `running` is cleared
pub async fn sleep_while_running(running: &AtomicBool, total: Duration) {
    let deadline = Instant::now() + total;
    while running.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        tokio::time::sleep(SLEEP_SLICE.min(deadline - now)).await;
    }
}

/// Control handle for a running announcement loop
pub struct AnnouncerHandle {
    running: Arc<AtomicBool>,
    pub started_at: SystemTime,
    task_handle: Option<JoinHandle<()>>,
}

impl AnnouncerHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Request a stop and wait for the loop to finish its current slice
    pub async fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::Relaxed);

        let Some(task) = self.task_handle.take() else {
            warn!("Announcer task already joined");
            return Ok(());
        };

        task.await.map_err(|e| {
            if e.is_panic() {
                Error::Task("announcer task panicked".to_string())
            } else {
                Error::Task(format!("failed to join announcer task: {}", e))
            }
        })
    }
}
