// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # MCU Shim HAL
//!
//! Platform-agnostic traits for everything the shim consumes from the host
//! platform, plus the pin model shared by the interrupt and port layers.
//!
//! Each platform provides:
//! - the co-processor command call ([`CoprocessorCall`], [`CoprocessorPlatform`])
//! - the kernel interrupt notification queue ([`NotificationQueueFactory`])
//! - the GPIO interrupt control call ([`GpioInterruptControl`])
//! - device control: reset, unique id, network link ([`DeviceControl`])
//!
//! Fatal platform errors are routed through a [`SystemErrorRouter`].

mod coprocessor;
mod device;
mod error;
mod gpio;
mod ports;
mod queue;
mod system_error;

pub use coprocessor::{CommandEnvelope, CoprocessorCall, CoprocessorPlatform, PlatformCapabilities};
pub use device::DeviceControl;
pub use error::{HalError, HalResult};
pub use gpio::{
    GpioInterruptControl, InterruptConfig, InterruptControlRequest, InterruptMode, PinId, ResistorMode,
    GPIO_CONTROL_OK,
};
pub use ports::{AnalogInputPort, DigitalInputPort, DigitalOutputPort, InterruptPort, PinCapabilities, Port};
pub use queue::{NotificationQueue, NotificationQueueFactory, NOTIFICATION_RECORD_SIZE};
pub use system_error::{SystemError, SystemErrorHandler, SystemErrorRouter, SYSTEM_ERROR_RESET_MESSAGE};
