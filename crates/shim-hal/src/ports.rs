// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pin capability traits.
//!
//! A concrete pin type implements the capabilities it has; [`Port`] tags
//! which set a given pin was opened with.

use crate::{HalError, HalResult, InterruptConfig, PinId, ResistorMode};
use std::ops::BitOr;
use std::sync::Arc;

/// Capability flags of a physical pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PinCapabilities(u8);

impl PinCapabilities {
    pub const NONE: PinCapabilities = PinCapabilities(0);
    pub const DIGITAL_INPUT: PinCapabilities = PinCapabilities(1 << 0);
    pub const DIGITAL_OUTPUT: PinCapabilities = PinCapabilities(1 << 1);
    pub const ANALOG_INPUT: PinCapabilities = PinCapabilities(1 << 2);
    pub const INTERRUPT: PinCapabilities = PinCapabilities(1 << 3);

    pub fn contains(&self, other: PinCapabilities) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl BitOr for PinCapabilities {
    type Output = PinCapabilities;

    fn bitor(self, rhs: Self) -> Self::Output {
        PinCapabilities(self.0 | rhs.0)
    }
}

pub trait DigitalInputPort: Send + Sync {
    fn pin(&self) -> PinId;
    fn resistor(&self) -> ResistorMode;
    fn read(&self) -> HalResult<bool>;
}

pub trait DigitalOutputPort: Send + Sync {
    fn pin(&self) -> PinId;
    fn write(&self, state: bool) -> HalResult<()>;
    fn state(&self) -> bool;
}

pub trait AnalogInputPort: Send + Sync {
    fn pin(&self) -> PinId;

    /// Raw converter reading.
    fn read_raw(&self) -> HalResult<u32>;

    fn resolution_bits(&self) -> u8;

    fn reference_voltage(&self) -> f32;

    fn read_voltage(&self) -> HalResult<f32> {
        let full_scale = ((1u64 << self.resolution_bits()) - 1) as f32;
        Ok(self.read_raw()? as f32 / full_scale * self.reference_voltage())
    }
}

/// A pin whose state changes are delivered as interrupts.
pub trait InterruptPort: Send + Sync {
    fn pin(&self) -> PinId;
    fn interrupt_config(&self) -> InterruptConfig;

    /// Apply a new configuration; [`crate::InterruptMode::None`] unregisters.
    fn set_interrupt_config(&self, config: InterruptConfig) -> HalResult<()>;

    /// Most recent state delivered by an interrupt, if any arrived yet.
    fn last_state(&self) -> Option<bool>;
}

/// A pin opened with a specific capability set.
///
/// Interrupt-capable inputs carry both capability handles; they usually point
/// at the same object.
#[derive(Clone)]
pub enum Port {
    DigitalInput(Arc<dyn DigitalInputPort>),
    DigitalOutput(Arc<dyn DigitalOutputPort>),
    AnalogInput(Arc<dyn AnalogInputPort>),
    InterruptInput {
        input: Arc<dyn DigitalInputPort>,
        interrupt: Arc<dyn InterruptPort>,
    },
}

impl Port {
    pub fn pin(&self) -> PinId {
        match self {
            Port::DigitalInput(port) => port.pin(),
            Port::DigitalOutput(port) => port.pin(),
            Port::AnalogInput(port) => port.pin(),
            Port::InterruptInput { input, .. } => input.pin(),
        }
    }

    pub fn capabilities(&self) -> PinCapabilities {
        match self {
            Port::DigitalInput(_) => PinCapabilities::DIGITAL_INPUT,
            Port::DigitalOutput(_) => PinCapabilities::DIGITAL_OUTPUT,
            Port::AnalogInput(_) => PinCapabilities::ANALOG_INPUT,
            Port::InterruptInput { .. } => PinCapabilities::DIGITAL_INPUT | PinCapabilities::INTERRUPT,
        }
    }

    pub fn as_digital_input(&self) -> HalResult<&dyn DigitalInputPort> {
        match self {
            Port::DigitalInput(port) => Ok(port.as_ref()),
            Port::InterruptInput { input, .. } => Ok(input.as_ref()),
            _ => Err(self.missing("digital input")),
        }
    }

    pub fn as_digital_output(&self) -> HalResult<&dyn DigitalOutputPort> {
        match self {
            Port::DigitalOutput(port) => Ok(port.as_ref()),
            _ => Err(self.missing("digital output")),
        }
    }

    pub fn as_analog_input(&self) -> HalResult<&dyn AnalogInputPort> {
        match self {
            Port::AnalogInput(port) => Ok(port.as_ref()),
            _ => Err(self.missing("analog input")),
        }
    }

    pub fn as_interrupt(&self) -> HalResult<&dyn InterruptPort> {
        match self {
            Port::InterruptInput { interrupt, .. } => Ok(interrupt.as_ref()),
            _ => Err(self.missing("interrupts")),
        }
    }

    fn missing(&self, capability: &'static str) -> HalError {
        HalError::MissingCapability {
            pin: self.pin(),
            capability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Led {
        on: AtomicBool,
    }

    impl DigitalOutputPort for Led {
        fn pin(&self) -> PinId {
            PinId::new(0, 5)
        }

        fn write(&self, state: bool) -> HalResult<()> {
            self.on.store(state, Ordering::SeqCst);
            Ok(())
        }

        fn state(&self) -> bool {
            self.on.load(Ordering::SeqCst)
        }
    }

    struct Thermistor;

    impl AnalogInputPort for Thermistor {
        fn pin(&self) -> PinId {
            PinId::new(1, 0)
        }

        fn read_raw(&self) -> HalResult<u32> {
            Ok(2048)
        }

        fn resolution_bits(&self) -> u8 {
            12
        }

        fn reference_voltage(&self) -> f32 {
            3.3
        }
    }

    #[test]
    fn test_capability_access() {
        let port = Port::DigitalOutput(Arc::new(Led { on: AtomicBool::new(false) }));
        port.as_digital_output().unwrap().write(true).unwrap();
        assert!(port.as_digital_output().unwrap().state());
        assert!(matches!(
            port.as_interrupt(),
            Err(HalError::MissingCapability { capability: "interrupts", .. })
        ));
        assert!(port.capabilities().contains(PinCapabilities::DIGITAL_OUTPUT));
        assert!(!port.capabilities().contains(PinCapabilities::DIGITAL_INPUT));
    }

    #[test]
    fn test_analog_voltage() {
        let port = Port::AnalogInput(Arc::new(Thermistor));
        let volts = port.as_analog_input().unwrap().read_voltage().unwrap();
        assert!((volts - 1.650_4).abs() < 0.001);
    }
}
