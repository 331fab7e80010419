// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{InterruptError, InterruptEvent, InterruptHandler, InterruptManager};
use parking_lot::{Mutex, RwLock};
use shim_hal::{DigitalInputPort, HalError, HalResult, InterruptConfig, InterruptMode, InterruptPort, PinId, Port, ResistorMode};
use std::sync::Arc;
use tracing::warn;

/// A digital input that can also deliver state changes as interrupts.
///
/// Level reads go to the underlying input; interrupt registration goes through
/// the shared [`InterruptManager`]. The state carried by the latest interrupt
/// is remembered and available from [`InterruptPort::last_state`].
pub struct InputPort {
    input: Arc<dyn DigitalInputPort>,
    manager: Arc<InterruptManager>,
    config: RwLock<InterruptConfig>,
    last_state: Arc<Mutex<Option<bool>>>,
    callback: Arc<RwLock<Option<InterruptHandler>>>,
}

impl InputPort {
    pub fn new(input: Arc<dyn DigitalInputPort>, manager: Arc<InterruptManager>) -> Self {
        Self {
            input,
            manager,
            config: RwLock::new(InterruptConfig::default()),
            last_state: Arc::new(Mutex::new(None)),
            callback: Arc::new(RwLock::new(None)),
        }
    }

    /// Callback for state changes. May be set before or after the interrupt
    /// is configured.
    pub fn on_change(&self, callback: impl Fn(InterruptEvent) + Send + Sync + 'static) {
        *self.callback.write() = Some(Arc::new(callback));
    }

    /// Wrap in a [`Port`] exposing both capabilities.
    pub fn into_port(self: Arc<Self>) -> Port {
        Port::InterruptInput {
            input: self.clone(),
            interrupt: self,
        }
    }

    fn handler(&self) -> InterruptHandler {
        let last_state = Arc::clone(&self.last_state);
        let callback = Arc::clone(&self.callback);
        Arc::new(move |event: InterruptEvent| {
            *last_state.lock() = Some(event.state);
            let callback = callback.read().clone();
            if let Some(callback) = callback {
                callback(event);
            }
        })
    }
}

impl DigitalInputPort for InputPort {
    fn pin(&self) -> PinId {
        self.input.pin()
    }

    fn resistor(&self) -> ResistorMode {
        self.input.resistor()
    }

    fn read(&self) -> HalResult<bool> {
        self.input.read()
    }
}

impl InterruptPort for InputPort {
    fn pin(&self) -> PinId {
        self.input.pin()
    }

    fn interrupt_config(&self) -> InterruptConfig {
        *self.config.read()
    }

    fn set_interrupt_config(&self, config: InterruptConfig) -> HalResult<()> {
        let pin = self.input.pin();
        let port_error = |e: InterruptError| HalError::Port {
            pin,
            source: Box::new(e),
        };
        let mut current = self.config.write();
        if current.mode != InterruptMode::None {
            self.manager.unwire_interrupt(pin).map_err(port_error)?;
            *current = InterruptConfig::default();
        }
        if config.mode != InterruptMode::None {
            self.manager
                .wire_interrupt(pin, config, self.handler())
                .map_err(port_error)?;
        }
        *current = config;
        Ok(())
    }

    fn last_state(&self) -> Option<bool> {
        *self.last_state.lock()
    }
}

impl Drop for InputPort {
    fn drop(&mut self) {
        if self.config.read().mode != InterruptMode::None {
            let pin = self.input.pin();
            if let Err(e) = self.manager.unwire_interrupt(pin) {
                warn!(%pin, "[INTERRUPTS] Failed to remove interrupt on drop: {}", e);
            }
        }
    }
}
