//! Host identity advertised in announcements

use lldpscope_protocol::LldpCapabilities;
use nix::sys::utsname::uname;
use nix::unistd::gethostname;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use tracing::{debug, warn};

const UNKNOWN: &str = "unknown";

/// Public address used only to select the outbound route
const ROUTE_LOOKUP_TARGET: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(8, 8, 8, 8), 80);

/// Source address the kernel picks for outbound IPv4 traffic.
///
/// Connecting a UDP socket only resolves the route; nothing is sent.
pub fn primary_ipv4() -> Option<Ipv4Addr> {
    let lookup = || -> std::io::Result<Ipv4Addr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(ROUTE_LOOKUP_TARGET)?;
        match socket.local_addr()?.ip() {
            std::net::IpAddr::V4(ip) => Ok(ip),
            std::net::IpAddr::V6(_) => Ok(Ipv4Addr::UNSPECIFIED),
        }
    };

    match lookup() {
        Ok(ip) if !ip.is_unspecified() && !ip.is_loopback() => Some(ip),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "No default IPv4 route");
            None
        }
    }
}

/// Host facts gathered once per announcer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub hostname: String,
    /// Kernel name, e.g. `Linux`
    pub os_name: String,
    /// Kernel release, e.g. `6.8.0-45-generic`
    pub os_release: String,
    /// Hardware architecture, e.g. `x86_64`
    pub machine: String,
    /// Source address of the default route
    pub primary_ipv4: Option<Ipv4Addr>,
}

impl SystemInfo {
    /// Query the OS; fields that cannot be read become `unknown`
    pub fn detect() -> Self {
        let hostname = match gethostname() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(e) => {
                warn!(error = %e, "Could not read hostname");
                UNKNOWN.to_string()
            }
        };

        let primary_ipv4 = primary_ipv4();
        match uname() {
            Ok(uts) => Self {
                hostname,
                os_name: uts.sysname().to_string_lossy().into_owned(),
                os_release: uts.release().to_string_lossy().into_owned(),
                machine: uts.machine().to_string_lossy().into_owned(),
                primary_ipv4,
            },
            Err(e) => {
                warn!(error = %e, "uname failed");
                Self {
                    hostname,
                    os_name: UNKNOWN.to_string(),
                    os_release: UNKNOWN.to_string(),
                    machine: UNKNOWN.to_string(),
                    primary_ipv4,
                }
            }
        }
    }

    /// `"<os> <release> <arch>"`
    pub fn description(&self) -> String {
        format!("{} {} {}", self.os_name, self.os_release, self.machine)
    }

    /// (supported, enabled) capability bitmaps; a host is a station
    pub fn capabilities(&self) -> (u16, u16) {
        let caps = LldpCapabilities::station_only().0;
        (caps, caps)
    }

    /// Value of the LLDP-MED software revision TLV
    pub fn software_revision() -> String {
        format!("lldpscope {}", env!("CARGO_PKG_VERSION"))
    }
}
