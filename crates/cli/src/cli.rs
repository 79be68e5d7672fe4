// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "punch")]
#[command(about = "Offline-tolerant badge-scan recorder for the punchclock terminal")]
#[command(
    long_about = "Offline-tolerant badge-scan recorder.\n\n\
    Scans are committed to a local SQLite store before anything else happens;\n\
    the punchd daemon forwards them to the payroll endpoint when the network\n\
    allows and deletes them only after the server confirms receipt."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record a badge scan
    Record {
        /// Badge identifier
        badge_id: String,
        /// Scan time as RFC 3339 (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Show queue counts and daemon state
    Status {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Ask the daemon to flush the queue now
    Sync,
    /// Inspect or clear dead-lettered scans
    Dead {
        #[command(subcommand)]
        command: DeadCommand,
    },
    /// Export the audit history as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<String>,
    },
    /// Manage the punchd daemon
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

#[derive(Subcommand)]
pub enum DeadCommand {
    /// List dead-lettered scans
    List {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Delete all dead-lettered scans
    Clear,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background
    Start,
    /// Stop the daemon
    Stop,
    /// Show daemon status
    Status,
    /// View daemon logs
    Logs {
        /// Follow the log as it grows
        #[arg(short, long)]
        follow: bool,
    },
}
