// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command implementations for the punch CLI.

pub mod daemon;
pub mod dead;
pub mod export;
pub mod record;
pub mod status;
pub mod sync;
