// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # shim-observability
//!
//! Logging setup shared by every shim binary and test harness, with per-crate
//! debug flag support.
//!
//! ## Features
//! - `file-logging`: daily rotated log files next to the console output

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Shim crate names accepted by the debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "shim-codec",
    "shim-hal",
    "shim-coprocessor",
    "shim-interrupts",
    "shim-update",
    "shim-config",
    "mcu-shim",
];
