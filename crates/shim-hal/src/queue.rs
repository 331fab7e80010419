// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::HalResult;

/// Size of one interrupt notification record: {port/pin byte, state byte}.
pub const NOTIFICATION_RECORD_SIZE: usize = 2;

/// Opens the kernel notification queue by name.
pub trait NotificationQueueFactory: Send + Sync {
    fn open_read_only(&self, name: &str) -> HalResult<Box<dyn NotificationQueue>>;
}

/// A read-only queue of fixed 2-byte records.
pub trait NotificationQueue: Send {
    /// Block until the next record arrives.
    fn read_record(&mut self) -> HalResult<[u8; NOTIFICATION_RECORD_SIZE]>;
}
