//! CLI argument parsing
//!
//! Agent settings come from flags or their `LLDP_*` environment variables.

use clap::{Args, Parser, Subcommand};
use lldpscope_agent::config::{
    AgentConfig, ALL_INTERFACES, AUTO, DEFAULT_INTERVAL_SECS, DEFAULT_NEIGHBORS_FILE,
    DEFAULT_TTL_SECS,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lldpscope")]
#[command(version, about = "LLDP neighbor discovery and announcement", long_about = None)]
pub struct Cli {
    /// Directory holding the neighbor store, pid file and capture log
    #[arg(long, env = "LLDP_RUNTIME_DIR", value_name = "DIR", global = true)]
    pub runtime_dir: Option<PathBuf>,

    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub agent: AgentArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by every command that builds a session
#[derive(Args, Debug, Clone)]
pub struct AgentArgs {
    /// Seconds between announcements
    #[arg(long, env = "LLDP_INTERVAL", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval: u64,

    /// Interface to announce on, or "all"
    #[arg(long, env = "LLDP_INTERFACE", default_value = ALL_INTERFACES)]
    pub interface: String,

    /// Advertised system name; "auto" uses the hostname
    #[arg(long, env = "LLDP_SYSTEM_NAME", default_value = AUTO)]
    pub system_name: String,

    /// Advertised system description; empty uses the OS description
    #[arg(long, env = "LLDP_SYSTEM_DESCRIPTION", default_value = "")]
    pub system_description: String,

    /// Advertised port description; empty uses the interface name
    #[arg(long, env = "LLDP_PORT_DESCRIPTION", default_value = "")]
    pub port_description: String,

    /// Management address: "auto", an IP address, or empty to omit
    #[arg(long, env = "LLDP_MANAGEMENT_ADDRESS", default_value = AUTO)]
    pub management_address: String,

    /// TTL advertised to neighbors, in seconds
    #[arg(long, env = "LLDP_TTL", default_value_t = DEFAULT_TTL_SECS)]
    pub ttl: u32,

    /// Neighbor store; relative paths live in the runtime directory
    #[arg(long, env = "LLDP_NEIGHBORS_FILE", default_value = DEFAULT_NEIGHBORS_FILE)]
    pub neighbors_file: PathBuf,

    /// Send only the mandatory TLVs
    #[arg(long, env = "LLDP_MINIMAL_TLV")]
    pub minimal_tlv: bool,
}

impl AgentArgs {
    pub fn to_config(&self) -> AgentConfig {
        AgentConfig {
            interval: self.interval,
            interface: self.interface.clone(),
            system_name: self.system_name.clone(),
            system_description: self.system_description.clone(),
            port_description: self.port_description.clone(),
            management_address: self.management_address.clone(),
            ttl: self.ttl,
            neighbors_file: self.neighbors_file.clone(),
            minimal_tlv: self.minimal_tlv,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Control the background capture worker
    Capture {
        #[command(subcommand)]
        action: CaptureAction,
    },

    /// Show discovered neighbors
    Neighbors {
        /// Redraw continuously until Ctrl-C
        #[arg(short, long)]
        watch: bool,

        /// Seconds between redraws in watch mode
        #[arg(long, default_value = "2", value_name = "SECONDS")]
        refresh: u64,

        /// Print JSON instead of a table
        #[arg(long, conflicts_with = "watch")]
        json: bool,

        /// Forget all neighbors and delete the store
        #[arg(long, conflicts_with_all = ["watch", "json"])]
        clear: bool,
    },

    /// Send one announcement and exit
    Send {
        /// Only send on this interface
        #[arg(short, long)]
        interface: Option<String>,
    },

    /// List network interfaces
    Interfaces,

    /// Print the effective configuration
    Config,

    /// Print the runtime file locations
    Paths,

    /// Start capture if needed and announce until Ctrl-C
    Run,

    /// Capture worker entry point, spawned by `capture start`
    #[command(hide = true)]
    CaptureWorker {
        neighbors_file: PathBuf,
        pid_file: PathBuf,
        log_file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum CaptureAction {
    /// Start the capture worker in the background
    Start,

    /// Kill the capture worker
    Stop,

    /// Show whether capture is running and its resource usage
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the end of the capture log
    Log {
        /// Number of lines
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_map_to_config() {
        let cli = Cli::try_parse_from(["lldpscope", "config"]).unwrap();
        let config = cli.agent.to_config();
        // Environment may override defaults in CI; only check shape
        assert!(!config.interface.is_empty());
        assert!(matches!(cli.command, Commands::Config));
    }

    #[test]
    fn test_agent_flags() {
        let cli = Cli::try_parse_from([
            "lldpscope",
            "--interval",
            "10",
            "--interface",
            "eth0",
            "--ttl",
            "40",
            "--minimal-tlv",
            "run",
        ])
        .unwrap();
        let config = cli.agent.to_config();
        assert_eq!(config.interval, 10);
        assert_eq!(config.interface, "eth0");
        assert_eq!(config.ttl, 40);
        assert!(config.minimal_tlv);
    }

    #[test]
    fn test_capture_subcommands() {
        let cli = Cli::try_parse_from(["lldpscope", "capture", "log", "-n", "5"]).unwrap();
        match cli.command {
            Commands::Capture {
                action: CaptureAction::Log { lines },
            } => assert_eq!(lines, 5),
            other => panic!("Unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from(["lldpscope", "-vv", "capture", "status", "--json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Capture {
                action: CaptureAction::Status { json: true }
            }
        ));
    }

    #[test]
    fn test_send_interface() {
        let cli = Cli::try_parse_from(["lldpscope", "send", "-i", "eth1", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Send { interface } => assert_eq!(interface.as_deref(), Some("eth1")),
            other => panic!("Unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_worker_subcommand_name() {
        let cli = Cli::try_parse_from([
            "lldpscope",
            lldpscope_agent::WORKER_SUBCOMMAND,
            "/run/lldp/neighbors.json",
            "/run/lldp/capture.pid",
            "/run/lldp/lldpscope_capture.log",
        ])
        .unwrap();
        match cli.command {
            Commands::CaptureWorker { pid_file, .. } => {
                assert_eq!(pid_file, PathBuf::from("/run/lldp/capture.pid"))
            }
            other => panic!("Unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_watch_and_json_conflict() {
        assert!(Cli::try_parse_from(["lldpscope", "neighbors", "--watch", "--json"]).is_err());
    }
}
