// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `punch export` - dump the audit history as JSON.
//!
//! The audit table records every scan ever taken at this terminal,
//! including scans that were delivered and purged from the queue.

use std::io::Write;

use pc_core::EventStore;

use crate::config::{open_store, punch_state_dir};
use crate::error::Result;

/// Export the audit history to a file or stdout.
pub fn run(output: Option<&str>) -> Result<()> {
    let store = open_store(&punch_state_dir())?;
    let json = render(&store)?;

    match output {
        Some(path) => {
            let mut file = std::fs::File::create(path)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            println!("Exported audit history to {}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Render the full audit history as pretty-printed JSON.
pub fn render(store: &EventStore) -> Result<String> {
    let rows = store.audit_history()?;
    Ok(serde_json::to_string_pretty(&rows)?)
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
