// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use shim_config::InterruptsConfig;
use shim_hal::{GpioInterruptControl, NotificationQueueFactory, PinId};
use std::sync::Arc;

/// Platform collaborators and settings for an [`crate::InterruptManager`].
#[derive(Clone)]
pub struct InterruptContext {
    pub gpio: Arc<dyn GpioInterruptControl>,
    pub queues: Arc<dyn NotificationQueueFactory>,
    pub settings: InterruptsConfig,
}

impl InterruptContext {
    pub fn new(
        gpio: Arc<dyn GpioInterruptControl>,
        queues: Arc<dyn NotificationQueueFactory>,
        settings: InterruptsConfig,
    ) -> Self {
        Self { gpio, queues, settings }
    }

    /// Interrupt group a pin belongs to. Pins with the same number on
    /// different ports share a group.
    pub fn group_of(&self, pin: PinId) -> u8 {
        pin.pin % self.settings.group_width.max(1)
    }
}

impl std::fmt::Debug for InterruptContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
