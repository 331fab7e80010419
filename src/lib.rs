// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # MCU Shim
//!
//! Host-side support for a microcontroller with a radio co-processor:
//!
//! - **codec**: binary wire messages, CRC-32, SPI buffer sizing
//! - **coprocessor**: the command channel and WiFi station management
//! - **interrupts**: kernel interrupt queue to per-pin handlers
//! - **update**: over-the-air update store and state machine
//! - **hal**: the traits a platform implements to host all of the above
//!
//! [`ShimRuntime`] loads the configuration once, resolves the co-processor
//! protocol version once and builds every service from that.
//!
//! ## Feature Flags
//! - **`http-reqwest`** (default): `reqwest`-backed HTTP client for updates
//! - **`file-logging`**: daily-rotated log file next to console output
//!
//! ```rust,no_run
//! use mcu_shim::prelude::*;
//! # fn platform() -> PlatformServices { unimplemented!() }
//!
//! let config = mcu_shim::config::load_config(None, None).unwrap();
//! let _logging = mcu_shim::observability::init_logging(
//!     &config.logging,
//!     &mcu_shim::observability::parse_debug_flags(),
//! );
//! let runtime = ShimRuntime::boot(config, platform(), None).unwrap();
//! runtime.finish_boot();
//! runtime.wifi().start_network("workshop", "secret", true).unwrap();
//! ```

mod runtime;

pub use shim_codec as codec;
pub use shim_config as config;
pub use shim_coprocessor as coprocessor;
pub use shim_hal as hal;
pub use shim_interrupts as interrupts;
pub use shim_observability as observability;
pub use shim_update as update;

pub use runtime::{PlatformServices, RuntimeError, ShimRuntime, UpdateServices};

/// Commonly used types and traits
pub mod prelude {
    pub use crate::codec::{InterfaceId, ProtocolVersion, WireMessage};
    pub use crate::config::ShimConfig;
    pub use crate::coprocessor::{ChannelError, CommandChannel, WiFiAdapter};
    pub use crate::hal::{DeviceControl, InterruptConfig, InterruptMode, PinId, Port, SystemErrorHandler};
    pub use crate::interrupts::{InputPort, InterruptError, InterruptEvent, InterruptManager};
    pub use crate::update::{UpdateEvent, UpdateService, UpdateState};
    pub use crate::{PlatformServices, RuntimeError, ShimRuntime, UpdateServices};
}
