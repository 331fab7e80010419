// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{InterruptContext, InterruptError, InterruptEvent, InterruptRecord, InterruptResult};
use parking_lot::Mutex;
use shim_hal::{InterruptConfig, InterruptMode, NotificationQueue, PinId, GPIO_CONTROL_OK};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Callback invoked on the `rayon` pool for every interrupt on its pin.
pub type InterruptHandler = Arc<dyn Fn(InterruptEvent) + Send + Sync>;

/// Granularity of the shutdown check while backing off after a read error.
const BACKOFF_SLICE: Duration = Duration::from_millis(50);

struct Shared {
    context: InterruptContext,
    handlers: Mutex<HashMap<PinId, InterruptHandler>>,
    /// group -> owning pin
    groups: Mutex<HashMap<u8, PinId>>,
    shutdown: AtomicBool,
}

/// Owns the interrupt registrations of one process.
///
/// The handler table and the group claim table each have their own lock;
/// neither is held across a platform call or a handler invocation.
pub struct InterruptManager {
    shared: Arc<Shared>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl InterruptManager {
    pub fn new(context: InterruptContext) -> Self {
        Self {
            shared: Arc::new(Shared {
                context,
                handlers: Mutex::new(HashMap::new()),
                groups: Mutex::new(HashMap::new()),
                shutdown: AtomicBool::new(false),
            }),
            listener: Mutex::new(None),
        }
    }

    pub fn context(&self) -> &InterruptContext {
        &self.shared.context
    }

    /// Register an interrupt on `pin`, or unregister it when `config.mode` is
    /// [`InterruptMode::None`].
    ///
    /// A group holds one registration. Changing the mode of a registered pin
    /// takes an [`InterruptManager::unwire_interrupt`] first.
    ///
    /// # Errors
    /// - [`InterruptError::GroupInUse`] if the group is claimed, including by
    ///   `pin` itself
    /// - [`InterruptError::ControlFailed`] if the platform rejects the request;
    ///   a claim taken by this call is released again
    pub fn wire_interrupt(&self, pin: PinId, config: InterruptConfig, handler: InterruptHandler) -> InterruptResult<()> {
        if config.mode == InterruptMode::None {
            return self.unwire_interrupt(pin);
        }
        if !pin.is_encodable() {
            return Err(InterruptError::PinNotEncodable(pin));
        }
        self.ensure_listener()?;

        let group = self.shared.context.group_of(pin);
        {
            let mut groups = self.shared.groups.lock();
            if let Some(owner) = groups.get(&group) {
                return Err(InterruptError::GroupInUse { group, owner: *owner });
            }
            groups.insert(group, pin);
        }

        self.shared.handlers.lock().insert(pin, handler);
        let status = self.shared.context.gpio.configure(&config.to_control_request(pin, true));
        if status != GPIO_CONTROL_OK {
            self.shared.handlers.lock().remove(&pin);
            self.shared.groups.lock().remove(&group);
            warn!(%pin, status, "[INTERRUPTS] Platform rejected interrupt registration");
            return Err(InterruptError::ControlFailed { pin, status });
        }

        info!(%pin, group, mode = ?config.mode, "[INTERRUPTS] Interrupt registered");
        Ok(())
    }

    /// Unregister the interrupt on `pin` and release its group.
    ///
    /// If the platform rejects the request the registration is kept.
    pub fn unwire_interrupt(&self, pin: PinId) -> InterruptResult<()> {
        let group = self.shared.context.group_of(pin);
        if self.shared.groups.lock().get(&group) != Some(&pin) {
            return Err(InterruptError::NotRegistered(pin));
        }

        let request = InterruptConfig::default().to_control_request(pin, false);
        let status = self.shared.context.gpio.configure(&request);
        if status != GPIO_CONTROL_OK {
            warn!(%pin, status, "[INTERRUPTS] Platform rejected interrupt removal");
            return Err(InterruptError::ControlFailed { pin, status });
        }

        self.shared.handlers.lock().remove(&pin);
        {
            let mut groups = self.shared.groups.lock();
            if groups.get(&group) == Some(&pin) {
                groups.remove(&group);
            }
        }
        info!(%pin, group, "[INTERRUPTS] Interrupt removed");
        Ok(())
    }

    pub fn is_group_claimed(&self, group: u8) -> bool {
        self.shared.groups.lock().contains_key(&group)
    }

    /// Pins with a registered handler, in ascending order.
    pub fn registered_pins(&self) -> Vec<PinId> {
        let mut pins: Vec<PinId> = self.shared.handlers.lock().keys().copied().collect();
        pins.sort();
        pins
    }

    pub fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// Stop the listener. It exits at the next record boundary or back-off
    /// slice; a read blocked in the kernel is not interrupted.
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
        debug!("[INTERRUPTS] Listener shutdown requested");
    }

    /// Hand a record to its pin's handler. Exposed for platforms that deliver
    /// records without a queue.
    pub fn dispatch(&self, record: InterruptRecord) {
        self.shared.dispatch(record);
    }

    fn ensure_listener(&self) -> InterruptResult<()> {
        let mut listener = self.listener.lock();
        if listener.is_some() {
            return Ok(());
        }

        let queue_name = self.shared.context.settings.queue_name.clone();
        let queue = self.shared.context.queues.open_read_only(&queue_name)?;
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("shim-interrupt-listener".to_string())
            .spawn(move || shared.listen(queue))?;
        info!("[INTERRUPTS] Listener started on queue {}", queue_name);
        *listener = Some(handle);
        Ok(())
    }
}

impl Drop for InterruptManager {
    /// The listener is signalled, not joined: it may be blocked in a kernel
    /// read that only the next record ends.
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Shared {
    fn listen(&self, mut queue: Box<dyn NotificationQueue>) {
        let backoff = self.context.settings.read_error_backoff();
        while !self.shutdown.load(Ordering::Acquire) {
            match queue.read_record() {
                Ok(bytes) => {
                    if self.shutdown.load(Ordering::Acquire) {
                        break;
                    }
                    self.dispatch(InterruptRecord::parse(bytes));
                }
                Err(e) => {
                    error!("[INTERRUPTS] Queue read failed, retrying in {:?}: {}", backoff, e);
                    self.sleep_unless_shutdown(backoff);
                }
            }
        }
        debug!("[INTERRUPTS] Listener stopped");
    }

    fn sleep_unless_shutdown(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.shutdown.load(Ordering::Acquire) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(BACKOFF_SLICE.min(deadline - now));
        }
    }

    fn dispatch(&self, record: InterruptRecord) {
        let handler = self.handlers.lock().get(&record.pin).cloned();
        let Some(handler) = handler else {
            trace!(pin = %record.pin, "[INTERRUPTS] No handler, record dropped");
            return;
        };
        let event = InterruptEvent::from(record);
        rayon::spawn(move || {
            let pin = event.pin;
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!(%pin, "[INTERRUPTS] Interrupt handler panicked");
            }
        });
    }
}
