//! Error types for lldpscope

use thiserror::Error;

/// Result type alias for lldpscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for lldpscope
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem or socket I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Protocol-level error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// TLV value does not fit in the 9-bit length field
    #[error("TLV length {length} exceeds maximum of 511")]
    TlvLengthExceeded { length: usize },

    /// Packet construction error
    #[error("Packet construction error: {0}")]
    PacketConstruction(String),

    /// Invalid configuration value
    #[error("Invalid configuration '{name}': {reason}")]
    InvalidConfig { name: String, reason: String },

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Interface error
    #[error("Interface error: {0}")]
    Interface(String),

    /// Capture error
    #[error("Packet capture error: {0}")]
    Capture(String),

    /// Shared neighbor store could not be read or written
    #[error("Neighbor store error: {0}")]
    Store(String),

    /// A capture worker is already alive
    #[error("Capture is already running (PID {pid})")]
    AlreadyRunning { pid: u32 },

    /// The capture worker died during the startup grace period
    #[error("Capture worker exited immediately: {diagnostics}")]
    WorkerExitedImmediately { diagnostics: String },

    /// Signalling or inspecting an OS process failed
    #[error("Process control failed: {0}")]
    ProcessControl(String),

    /// A background task panicked or could not be joined
    #[error("Background task failed: {0}")]
    Task(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Create a protocol error with a custom message
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        Error::Protocol(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Error::InvalidConfig {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a process control error
    pub fn process_control<S: Into<String>>(msg: S) -> Self {
        Error::ProcessControl(msg.into())
    }
}
