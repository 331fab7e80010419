// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Routing of fatal platform errors (hardware faults, co-processor crashes).

use crate::DeviceControl;
use parking_lot::Mutex;
use shim_codec::messages::ErrorEventData;
use shim_codec::{CodecResult, WireMessage};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Logged immediately before a reset caused by a system error. Operators
/// search for this line.
pub const SYSTEM_ERROR_RESET_MESSAGE: &str = "resetting due to a system error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemError {
    pub code: u32,
    pub component: u8,
    pub message: String,
    /// The platform's recommendation; a handler may override it.
    pub recommend_reset: bool,
}

impl SystemError {
    pub fn from_event(event: ErrorEventData, recommend_reset: bool) -> Self {
        Self {
            code: event.error_code,
            component: event.component,
            message: event.message,
            recommend_reset,
        }
    }
}

/// Application hook for system errors.
pub trait SystemErrorHandler: Send + Sync {
    /// # Returns
    /// Whether the device should reset. Returning `error.recommend_reset`
    /// accepts the platform's recommendation.
    fn handle(&self, error: &SystemError) -> bool;
}

struct RouterState {
    handler: Option<Arc<dyn SystemErrorHandler>>,
    cached: Vec<SystemError>,
}

/// Delivers system errors to the attached handler.
///
/// Errors raised before a handler attaches are cached and replayed, in order,
/// to the first handler that attaches.
pub struct SystemErrorRouter {
    device: Arc<dyn DeviceControl>,
    state: Mutex<RouterState>,
}

impl SystemErrorRouter {
    pub fn new(device: Arc<dyn DeviceControl>) -> Self {
        Self {
            device,
            state: Mutex::new(RouterState {
                handler: None,
                cached: Vec::new(),
            }),
        }
    }

    /// Route one error. Returns whether a reset was requested.
    pub fn report(&self, system_error: SystemError) -> bool {
        error!(
            code = system_error.code,
            component = system_error.component,
            recommend_reset = system_error.recommend_reset,
            "[SYSTEM] {}",
            system_error.message
        );
        let handler = {
            let mut state = self.state.lock();
            match &state.handler {
                Some(handler) => Arc::clone(handler),
                None => {
                    state.cached.push(system_error);
                    return false;
                }
            }
        };
        let reset = handler.handle(&system_error);
        self.reset_if(reset)
    }

    /// Decode an [`ErrorEventData`] payload raised by the co-processor and
    /// route it like [`SystemErrorRouter::report`].
    ///
    /// # Errors
    /// The codec error when the payload is malformed; nothing is routed
    pub fn report_event(&self, payload: &[u8], recommend_reset: bool) -> CodecResult<bool> {
        let event = ErrorEventData::decode(payload, 0)?;
        Ok(self.report(SystemError::from_event(event, recommend_reset)))
    }

    /// Attach the handler and replay cached errors to it.
    ///
    /// A second call replaces the handler; nothing is replayed to it.
    pub fn attach_handler(&self, handler: Arc<dyn SystemErrorHandler>) -> bool {
        let cached = {
            let mut state = self.state.lock();
            state.handler = Some(Arc::clone(&handler));
            std::mem::take(&mut state.cached)
        };
        if !cached.is_empty() {
            info!("[SYSTEM] Replaying {} cached system error(s)", cached.len());
        }
        let mut reset = false;
        for system_error in &cached {
            reset |= handler.handle(system_error);
        }
        self.reset_if(reset)
    }

    /// Called once startup has had its chance to attach a handler. With no
    /// handler, any cached error that recommended a reset triggers one.
    pub fn resolve_unhandled(&self) -> bool {
        let reset = {
            let state = self.state.lock();
            state.handler.is_none() && state.cached.iter().any(|cached| cached.recommend_reset)
        };
        if !reset {
            let pending = self.cached_count();
            if pending > 0 {
                warn!("[SYSTEM] {} system error(s) unhandled, none recommended a reset", pending);
            }
        }
        self.reset_if(reset)
    }

    pub fn has_handler(&self) -> bool {
        self.state.lock().handler.is_some()
    }

    pub fn cached_count(&self) -> usize {
        self.state.lock().cached.len()
    }

    fn reset_if(&self, reset: bool) -> bool {
        if reset {
            error!("[SYSTEM] {}", SYSTEM_ERROR_RESET_MESSAGE);
            self.device.reset();
        }
        reset
    }
}
