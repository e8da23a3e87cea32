//! LLDP neighbor discovery agent
//!
//! This crate ties the codec and the host adapters into the running system:
//!
//! - [`Announcer`]: periodic LLDPDU transmission on local interfaces
//! - [`CaptureOrchestrator`]: start/stop/status of the out-of-process
//!   [`CaptureWorker`]
//! - [`NeighborRegistry`]: the neighbor table and its shared JSON store
//! - [`Session`]: validated [`AgentConfig`] plus [`RuntimePaths`], handed to
//!   every component
//!
//! # Example
//!
//! ```no_run
//! use lldpscope_agent::{AgentConfig, CaptureOrchestrator, NeighborRegistry, Session};
//!
//! # fn main() -> lldpscope_core::Result<()> {
//! let session = Session::new(AgentConfig::default(), None)?;
//!
//! let capture = CaptureOrchestrator::new(&session)?;
//! if !capture.is_running()? {
//!     capture.start()?;
//! }
//!
//! for neighbor in NeighborRegistry::open_reader(&session).get_neighbors()? {
//!     println!("{} via {} ({})", neighbor.fields.chassis_id, neighbor.interface, neighbor.age);
//! }
//! # Ok(())
//! # }
//! ```

pub mod announcer;
pub mod config;
pub mod marker;
pub mod neighbor;
pub mod orchestrator;
pub mod paths;
pub mod process;
pub mod registry;
pub mod session;
pub mod store;
pub mod system;
pub mod table;
pub mod worker;

pub use announcer::{AnnounceReport, Announcer, AnnouncerHandle};
pub use config::{AgentConfig, InterfaceSelection, ManagementMode};
pub use marker::LivenessMarker;
pub use neighbor::{Neighbor, NeighborView};
pub use orchestrator::{CaptureOrchestrator, CaptureStatus, WorkerCommand, WORKER_SUBCOMMAND};
pub use paths::RuntimePaths;
pub use registry::{NeighborRegistry, StoreRole};
pub use session::Session;
pub use store::NeighborStore;
pub use system::SystemInfo;
pub use table::{NeighborTable, Upsert};
pub use worker::CaptureWorker;
