// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Interrupt Dispatch
//!
//! Bridges the kernel's interrupt notification queue to per-pin handlers.
//!
//! - [`InterruptManager::wire_interrupt`] claims the pin's interrupt group,
//!   registers the interrupt with the platform and records the handler
//! - the first registration starts a listener thread that reads 2-byte
//!   [`InterruptRecord`]s and hands each one to the `rayon` pool
//! - [`InputPort`] exposes a pin as both a digital input and an interrupt port
//!
//! Handlers for different pins may run concurrently and in any order. Two
//! interrupts on the same pin are dispatched in receipt order, but the second
//! handler call does not wait for the first to finish.

mod context;
mod error;
mod input;
mod manager;
mod record;

pub use context::InterruptContext;
pub use error::{InterruptError, InterruptResult};
pub use input::InputPort;
pub use manager::{InterruptHandler, InterruptManager};
pub use record::{InterruptEvent, InterruptRecord};
