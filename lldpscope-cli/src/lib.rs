//! Command line front end for lldpscope
//!
//! Argument parsing, logging setup and the command implementations behind
//! the `lldpscope` binary.

pub mod args;
pub mod commands;
pub mod logging;

pub use args::{AgentArgs, CaptureAction, Cli, Commands};
