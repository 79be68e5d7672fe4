// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! punchrs - library behind the `punch` CLI.
//!
//! The terminal-side surface of the punchclock system:
//!
//! - `punch record <badge>` commits a scan to the local SQLite store
//! - `punch status` / `punch sync` / `punch dead` inspect and drive the queue
//! - `punch daemon ...` manages the background punchd process
//!
//! Recording never depends on the daemon or the network; everything else
//! talks to punchd over its Unix socket when it needs live state.

mod cli;
mod commands;
mod daemon;

pub mod config;
pub mod error;

pub use cli::{Cli, Command, DaemonCommand, DeadCommand, OutputFormat};
pub use error::{Error, Result};

/// Execute a parsed command.
pub fn run(command: Command) -> Result<()> {
    match command {
        Command::Record { badge_id, at } => commands::record::run(&badge_id, at.as_deref()),
        Command::Status { format } => commands::status::run(format),
        Command::Sync => commands::sync::run(),
        Command::Dead { command } => match command {
            DeadCommand::List { format } => commands::dead::list(format),
            DeadCommand::Clear => commands::dead::clear(),
        },
        Command::Export { output } => commands::export::run(output.as_deref()),
        Command::Daemon { command } => match command {
            DaemonCommand::Start => commands::daemon::start(),
            DaemonCommand::Stop => commands::daemon::stop(),
            DaemonCommand::Status => commands::daemon::status(),
            DaemonCommand::Logs { follow } => commands::daemon::logs(follow),
        },
    }
}
