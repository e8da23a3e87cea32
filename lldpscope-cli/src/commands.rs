//! Command implementations

use lldpscope_agent::{
    AgentConfig, Announcer, CaptureOrchestrator, CaptureStatus, CaptureWorker, NeighborRegistry,
    NeighborView, RuntimePaths, Session,
};
use lldpscope_capture::{DatalinkTransport, SystemInterfaces};
use lldpscope_core::{Error, InterfaceInfo, InterfaceProvider, Result};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::args::{CaptureAction, Cli, Commands};

/// Run the parsed command line
pub async fn dispatch(cli: Cli) -> Result<()> {
    let verbose = cli.verbose;
    let config = cli.agent.to_config();

    match cli.command {
        Commands::CaptureWorker {
            neighbors_file,
            pid_file,
            log_file,
        } => capture_worker(RuntimePaths::from_parts(neighbors_file, pid_file, log_file)).await,
        Commands::Interfaces => interfaces(),
        command => {
            let session = Session::new(config, cli.runtime_dir)?;
            match command {
                Commands::Capture { action } => blocking(move || capture(&session, action)).await,
                Commands::Neighbors {
                    watch,
                    refresh,
                    json,
                    clear,
                } => neighbors(&session, watch, refresh, json, clear).await,
                Commands::Send { interface } => send(session, interface, verbose).await,
                Commands::Config => {
                    println!("{}", session.config());
                    Ok(())
                }
                Commands::Paths => {
                    print!("{}", render_paths(session.paths()));
                    Ok(())
                }
                Commands::Run => run(session).await,
                Commands::CaptureWorker { .. } | Commands::Interfaces => Ok(()),
            }
        }
    }
}

/// Run `f` on the blocking pool so sleeps and process waits stay off the
/// runtime's worker threads
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Task(e.to_string()))?
}

fn capture(session: &Session, action: CaptureAction) -> Result<()> {
    let orchestrator = CaptureOrchestrator::new(session)?;

    match action {
        CaptureAction::Start => {
            let pid = orchestrator.start()?;
            println!("Capture started (PID {})", pid);
            println!("Log: {}", session.paths().log_file().display());
        }
        CaptureAction::Stop => match orchestrator.stop() {
            Ok(pid) => println!("Capture stopped (PID {})", pid),
            Err(Error::NotFound(_)) => println!("Capture is not running"),
            Err(e) => return Err(e),
        },
        CaptureAction::Status { json } => {
            let status = orchestrator.status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print!("{}", render_status(&status));
            }
        }
        CaptureAction::Log { lines } => {
            for line in orchestrator.log_tail(lines)? {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

async fn neighbors(session: &Session, watch: bool, refresh: u64, json: bool, clear: bool) -> Result<()> {
    let registry = NeighborRegistry::open_reader(session);

    if clear {
        registry.clear_neighbors()?;
        println!("Neighbors cleared");
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&registry.get_neighbors()?)?);
        return Ok(());
    }

    if !watch {
        print!("{}", render_neighbors(&registry.get_neighbors()?));
        return Ok(());
    }

    let refresh = Duration::from_secs(refresh.max(1));
    loop {
        let table = render_neighbors(&registry.get_neighbors()?);
        // Clear screen, cursor home
        print!("\x1b[2J\x1b[H{}", table);
        println!("\nRefreshing every {}s, Ctrl-C to quit", refresh.as_secs());

        tokio::select! {
            _ = tokio::time::sleep(refresh) => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

async fn send(session: Session, interface: Option<String>, verbose: u8) -> Result<()> {
    let session = match interface {
        Some(name) => {
            let config = AgentConfig {
                interface: name,
                ..session.config().clone()
            };
            Session::with_paths(config, session.paths().clone())?
        }
        None => session,
    };

    let announcer = Arc::new(Announcer::new(
        session,
        Arc::new(SystemInterfaces),
        Arc::new(DatalinkTransport::new()),
    ));

    if verbose > 0 {
        for iface in announcer.target_interfaces()? {
            let packet = announcer.build_packet(&iface)?;
            println!("{}: {}", iface.name, hex::encode(packet.to_bytes()?));
        }
    }

    let worker = Arc::clone(&announcer);
    let report = blocking(move || worker.send_once()).await?;

    for name in &report.sent {
        println!("Sent LLDPDU on {}", name);
    }
    for (name, reason) in &report.failed {
        println!("Failed on {}: {}", name, reason);
    }

    if report.sent.is_empty() {
        return Err(Error::Interface("no LLDPDU was sent".to_string()));
    }
    Ok(())
}

fn interfaces() -> Result<()> {
    print!("{}", render_interfaces(&SystemInterfaces.list_interfaces()?));
    Ok(())
}

async fn run(session: Session) -> Result<()> {
    let orchestrator = Arc::new(CaptureOrchestrator::new(&session)?);
    let starter = Arc::clone(&orchestrator);
    let started = match blocking(move || starter.start()).await {
        Ok(pid) => {
            println!("Capture started (PID {})", pid);
            true
        }
        Err(Error::AlreadyRunning { pid }) => {
            println!("Capture already running (PID {})", pid);
            false
        }
        Err(e) => return Err(e),
    };

    let announcer = Arc::new(Announcer::new(
        session,
        Arc::new(SystemInterfaces),
        Arc::new(DatalinkTransport::new()),
    ));
    let mut handle = announcer.start();
    println!("Announcing, Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Interrupted, shutting down");
    handle.stop().await?;

    // Leave a capture someone else started alone
    if started {
        if let Err(e) = blocking(move || orchestrator.stop()).await {
            warn!(error = %e, "Failed to stop capture");
        }
    }
    Ok(())
}

async fn capture_worker(paths: RuntimePaths) -> Result<()> {
    let worker = CaptureWorker::new(paths, Arc::new(SystemInterfaces), Arc::new(DatalinkTransport::new()));
    blocking(move || worker.run()).await
}

pub fn render_status(status: &CaptureStatus) -> String {
    let mut out = String::new();
    if !status.running {
        out.push_str("Capture: stopped\n");
        return out;
    }

    let pid = status
        .pid
        .map(|p| p.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let _ = writeln!(out, "Capture: running");
    let _ = writeln!(out, "PID:     {}", pid);
    let _ = writeln!(out, "Uptime:  {}", status.uptime);
    let _ = writeln!(out, "Memory:  {:.1} MB", status.memory_mb);
    let _ = writeln!(out, "CPU:     {:.1}%", status.cpu_percent);
    out
}

pub fn render_paths(paths: &RuntimePaths) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "runtime_dir    = {}", paths.runtime_dir().display());
    let _ = writeln!(out, "neighbors_file = {}", paths.neighbors_file().display());
    let _ = writeln!(out, "pid_file       = {}", paths.pid_file().display());
    let _ = writeln!(out, "log_file       = {}", paths.log_file().display());
    out
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Neighbor table as aligned text columns
pub fn render_neighbors(neighbors: &[NeighborView]) -> String {
    if neighbors.is_empty() {
        return "No neighbors discovered\n".to_string();
    }

    let header = ["INTERFACE", "SYSTEM NAME", "CHASSIS ID", "PORT ID", "MGMT ADDRESS", "AGE", "EXPIRES"];
    let rows: Vec<[String; 7]> = neighbors
        .iter()
        .map(|n| {
            [
                n.interface.clone(),
                or_dash(n.fields.system_name.as_deref()).to_string(),
                n.fields.chassis_id.clone(),
                n.fields.port_id.clone(),
                or_dash(n.fields.management_address.as_deref()).to_string(),
                n.age.clone(),
                format!("{}s", n.expires_in),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: Vec<&str>| {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    };

    push_row(header.to_vec());
    for row in &rows {
        push_row(row.iter().map(String::as_str).collect());
    }
    let _ = writeln!(out, "\n{} neighbor(s)", rows.len());
    out
}

pub fn render_interfaces(interfaces: &[InterfaceInfo]) -> String {
    let mut out = String::new();
    for iface in interfaces {
        let addresses: Vec<String> = iface.ipv4.iter().map(|ip| ip.to_string()).collect();
        let _ = writeln!(
            out,
            "{:<12} {:<17} {:<5} {:<4} {}",
            iface.name,
            iface.mac.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string()),
            if iface.is_up { "up" } else { "down" },
            if iface.is_lldp_capable() { "lldp" } else { "-" },
            addresses.join(",")
        );
    }
    out
}
