// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Message catalogue, grouped by the co-processor interface that uses them.

mod bluetooth;
mod disconnect;
mod sockets;
mod system;
mod wifi;

pub use bluetooth::*;
pub use disconnect::{DisconnectEventData, DisconnectReason, DISCONNECT_EVENT_V1_SIZE};
pub use sockets::*;
pub use system::*;
pub use wifi::*;
