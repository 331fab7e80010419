// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Co-processor Command Channel
//!
//! Executes one request against the radio co-processor:
//! 1. the encoded payload and a pre-sized result buffer are leased from a
//!    [`BufferArena`] and stay put for the whole platform call
//! 2. a single [`shim_hal::CoprocessorCall::execute`] carries interface,
//!    function, both buffers and the blocking flag
//! 3. the platform return code and co-processor status are interpreted
//!
//! Leases are returned when they drop, so every exit path releases them.
//!
//! [`WiFiAdapter`] builds station management on top of the channel.

mod arena;
mod channel;
mod context;
mod error;
mod wifi;

pub use arena::{BufferArena, PinnedBuffer};
pub use channel::CommandChannel;
pub use context::ChannelContext;
pub use error::{ChannelError, ChannelResult};
pub use wifi::{WiFiAdapter, WiFiState};
