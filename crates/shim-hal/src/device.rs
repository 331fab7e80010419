// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::time::{Duration, Instant};

/// Whole-device operations.
pub trait DeviceControl: Send + Sync {
    /// Request a full device reset. Irreversible; on hardware this does not return.
    fn reset(&self);

    /// Unique device identifier, as used for update-server login and topics.
    fn unique_id(&self) -> String;

    /// True while the network link is up.
    fn is_network_connected(&self) -> bool;

    /// Block until the network link is up or `timeout` elapses.
    ///
    /// # Returns
    /// Whether the link came up in time
    fn wait_for_network(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_network_connected() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }
}
