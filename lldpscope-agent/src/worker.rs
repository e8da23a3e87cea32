//! The capture worker: receives LLDPDUs and owns the shared store
//!
//! Runs in its own process, spawned by the
//! [`CaptureOrchestrator`](crate::orchestrator::CaptureOrchestrator). It is
//! the only writer of the neighbor store.

use lldpscope_capture::{filters, StatsAccumulator};
use lldpscope_core::{CapturedFrame, Error, FrameHandler, InterfaceProvider, LinkTransport, Result};
use lldpscope_packet::EthernetFrame;
use lldpscope_protocol::DecodedFields;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::marker::{LivenessMarker, MarkerGuard};
use crate::paths::RuntimePaths;
use crate::registry::NeighborRegistry;
use crate::store::NeighborStore;

/// Period of the eviction tick
pub const EVICTION_INTERVAL: Duration = Duration::from_secs(5);

/// Period of the statistics log line
pub const STATS_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct CaptureWorker {
    paths: RuntimePaths,
    registry: NeighborRegistry,
    stats: StatsAccumulator,
    provider: Arc<dyn InterfaceProvider>,
    transport: Arc<dyn LinkTransport>,
}

impl CaptureWorker {
    pub fn new(
        paths: RuntimePaths,
        provider: Arc<dyn InterfaceProvider>,
        transport: Arc<dyn LinkTransport>,
    ) -> Self {
        let registry = NeighborRegistry::writer(NeighborStore::new(paths.neighbors_file()));
        Self {
            paths,
            registry,
            stats: StatsAccumulator::new(),
            provider,
            transport,
        }
    }

    pub fn registry(&self) -> &NeighborRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &StatsAccumulator {
        &self.stats
    }

    /// Decode one captured frame into a neighbor update.
    ///
    /// Returns whether the neighbor table changed. Malformed frames are
    /// counted and dropped.
    pub fn handle_frame(&self, frame: &CapturedFrame) -> bool {
        self.stats.record_frame(frame.data.len());

        let ethernet = match EthernetFrame::from_bytes(&frame.data) {
            Some(ethernet) if ethernet.is_lldp() => ethernet,
            _ => {
                self.stats.record_ignored();
                debug!(interface = %frame.interface, "Ignoring non-LLDP frame");
                return false;
            }
        };

        let fields = DecodedFields::decode(&ethernet.payload);
        let source_mac = ethernet.source.to_string();

        match self.registry.record(&frame.interface, &source_mac, fields) {
            Ok(_) => {
                self.stats.record_decoded();
                true
            }
            Err(e) => {
                self.stats.record_store_error();
                warn!(interface = %frame.interface, error = %e, "Failed to persist neighbor");
                false
            }
        }
    }

    /// Capture until every per-interface capture ends.
    ///
    /// Writes the liveness marker for the duration of the call. The process
    /// is normally killed while this blocks.
    pub fn run(&self) -> Result<()> {
        let _marker = MarkerGuard::acquire(LivenessMarker::new(self.paths.pid_file()))?;

        if let Err(e) = self.registry.store().sweep_temp_files() {
            warn!(error = %e, "Could not sweep temporary store files");
        }
        self.registry.reload()?;
        info!(
            store = %self.paths.neighbors_file().display(),
            known = self.registry.len(),
            "Capture worker started"
        );

        let interfaces: Vec<String> = self
            .provider
            .lldp_interfaces()?
            .into_iter()
            .map(|iface| iface.name)
            .collect();
        if interfaces.is_empty() {
            return Err(Error::Interface("no LLDP-capable interfaces".to_string()));
        }
        info!(interfaces = ?interfaces, "Capturing LLDP");

        let running = Arc::new(AtomicBool::new(true));
        let housekeeping = self.spawn_housekeeping(running.clone())?;

        let worker = self.clone();
        let handler: FrameHandler = Arc::new(move |frame| {
            worker.handle_frame(&frame);
        });
        let result = self
            .transport
            .receive_loop(&filters::lldp_filter(), &interfaces, handler);

        running.store(false, Ordering::Relaxed);
        let _ = housekeeping.join();

        match &result {
            Ok(()) => info!(stats = %self.stats.snapshot(), "Capture worker finished"),
            Err(e) => error!(error = %e, stats = %self.stats.snapshot(), "Capture worker failed"),
        }
        result
    }

    fn spawn_housekeeping(&self, running: Arc<AtomicBool>) -> Result<thread::JoinHandle<()>> {
        let registry = self.registry.clone();
        let stats = self.stats.clone();
        let slice = Duration::from_millis(100);

        let handle = thread::Builder::new()
            .name("neighbor-eviction".to_string())
            .spawn(move || {
                let mut last_evict = Instant::now();
                let mut last_stats = Instant::now();

                while running.load(Ordering::Relaxed) {
                    thread::sleep(slice);

                    if last_evict.elapsed() >= EVICTION_INTERVAL {
                        last_evict = Instant::now();
                        if let Err(e) = registry.evict_and_persist() {
                            warn!(error = %e, "Eviction failed");
                        }
                    }

                    if last_stats.elapsed() >= STATS_INTERVAL {
                        last_stats = Instant::now();
                        info!(stats = %stats.snapshot(), neighbors = registry.len(), "Capture statistics");
                    }
                }
            })?;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lldpscope_core::{InterfaceInfo, MacAddr};
    use lldpscope_packet::EtherType;
    use lldpscope_protocol::{ChassisIdSubtype, LldpduBuilder, PortIdSubtype};
    use parking_lot::Mutex;
    use std::path::Path;
    use tempfile::tempdir;

    struct OneInterface;

    impl InterfaceProvider for OneInterface {
        fn list_interfaces(&self) -> Result<Vec<InterfaceInfo>> {
            Ok(vec![InterfaceInfo::new(
                "eth0",
                2,
                Some(MacAddr([0x02, 0, 0, 0, 0, 0x01])),
            )])
        }
    }

    struct NoInterfaces;

    impl InterfaceProvider for NoInterfaces {
        fn list_interfaces(&self) -> Result<Vec<InterfaceInfo>> {
            Ok(Vec::new())
        }
    }

    /// Replays canned frames, checking the marker while "capturing"
    struct Replay {
        frames: Vec<Vec<u8>>,
        pid_file: std::path::PathBuf,
        saw_marker: Mutex<bool>,
        filter: Mutex<String>,
    }

    impl LinkTransport for Replay {
        fn send(&self, _frame: &[u8], _interface: &InterfaceInfo) -> Result<()> {
            Ok(())
        }

        fn receive_loop(&self, filter: &str, interfaces: &[String], on_frame: FrameHandler) -> Result<()> {
            *self.filter.lock() = filter.to_string();
            *self.saw_marker.lock() = self.pid_file.exists();
            for data in &self.frames {
                on_frame(CapturedFrame::new(interfaces[0].clone(), data.clone()));
            }
            Ok(())
        }
    }

    fn lldp_frame(chassis: [u8; 6]) -> Vec<u8> {
        let lldpdu = LldpduBuilder::new()
            .chassis_id(ChassisIdSubtype::MacAddress, &chassis)
            .port_id(PortIdSubtype::InterfaceName, b"Gi0/1")
            .ttl(120)
            .system_name("switch-a")
            .build()
            .unwrap()
            .to_bytes()
            .unwrap();
        EthernetFrame::lldp(MacAddr(chassis), lldpdu).to_bytes()
    }

    fn paths(dir: &Path) -> RuntimePaths {
        RuntimePaths::new(dir, Path::new("neighbors.json"))
    }

    #[test]
    fn test_handle_frame() {
        let dir = tempdir().unwrap();
        let worker = CaptureWorker::new(paths(dir.path()), Arc::new(OneInterface), Arc::new(NoopTransport));

        let frame = CapturedFrame::new("eth0", lldp_frame([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]));
        assert!(worker.handle_frame(&frame));

        let ipv4 = EthernetFrame::new(
            MacAddr::lldp_multicast(),
            MacAddr([0x02, 0, 0, 0, 0, 0x09]),
            EtherType::IPv4,
            vec![0x45; 20],
        );
        assert!(!worker.handle_frame(&CapturedFrame::new("eth0", ipv4.to_bytes())));
        assert!(!worker.handle_frame(&CapturedFrame::new("eth0", vec![0x01, 0x02])));

        let stats = worker.stats().snapshot();
        assert_eq!(stats.frames_received, 3);
        assert_eq!(stats.lldpdus_decoded, 1);
        assert_eq!(stats.frames_ignored, 2);

        let stored = NeighborStore::new(dir.path().join("neighbors.json")).load().unwrap();
        let neighbor = stored
            .get("eth0:aa:bb:cc:dd:ee:ff:aa:bb:cc:dd:ee:ff")
            .unwrap();
        assert_eq!(neighbor.data.system_name.as_deref(), Some("switch-a"));
        assert_eq!(neighbor.data.chassis_id_subtype, "MAC_ADDRESS");
    }

    struct NoopTransport;

    impl LinkTransport for NoopTransport {
        fn send(&self, _frame: &[u8], _interface: &InterfaceInfo) -> Result<()> {
            Ok(())
        }

        fn receive_loop(&self, _filter: &str, _interfaces: &[String], _on_frame: FrameHandler) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_run_records_and_cleans_marker() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());
        let transport = Arc::new(Replay {
            frames: vec![
                lldp_frame([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
                lldp_frame([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
                lldp_frame([0x00, 0x11, 0x22, 0x33, 0x44, 0x66]),
            ],
            pid_file: paths.pid_file().to_path_buf(),
            saw_marker: Mutex::new(false),
            filter: Mutex::new(String::new()),
        });

        let worker = CaptureWorker::new(paths.clone(), Arc::new(OneInterface), transport.clone());
        worker.run().unwrap();

        assert!(*transport.saw_marker.lock());
        assert_eq!(*transport.filter.lock(), "ether proto 0x88cc");
        assert!(!paths.pid_file().exists());
        assert_eq!(
            NeighborStore::new(paths.neighbors_file()).load().unwrap().len(),
            2
        );
    }

    #[test]
    fn test_run_without_interfaces() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());
        let worker = CaptureWorker::new(paths.clone(), Arc::new(NoInterfaces), Arc::new(NoopTransport));

        assert!(matches!(worker.run(), Err(Error::Interface(_))));
        assert!(!paths.pid_file().exists());
    }

    #[test]
    fn test_run_resumes_from_store() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());

        let first = CaptureWorker::new(paths.clone(), Arc::new(OneInterface), Arc::new(NoopTransport));
        first.handle_frame(&CapturedFrame::new("eth0", lldp_frame([0x00, 0x11, 0x22, 0x33, 0x44, 0x55])));

        let second = CaptureWorker::new(paths, Arc::new(OneInterface), Arc::new(NoopTransport));
        second.run().unwrap();
        assert_eq!(second.registry().len(), 1);
    }

    #[test]
    fn test_run_sweeps_leftover_temp_files() {
        let dir = tempdir().unwrap();
        let paths = paths(dir.path());
        let leftover = dir.path().join(".neighbors.json.Qw3rTy");
        std::fs::write(&leftover, "{").unwrap();

        let worker = CaptureWorker::new(paths, Arc::new(OneInterface), Arc::new(NoopTransport));
        worker.run().unwrap();
        assert!(!leftover.exists());
    }
}
