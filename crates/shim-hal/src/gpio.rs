// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::HalError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

/// Status the GPIO control call returns on success.
pub const GPIO_CONTROL_OK: i32 = 0;

/// Highest port or pin number that fits the 4-bit record encoding.
const MAX_NIBBLE: u8 = 0x0F;

//region Pin identity

/// A physical pin: port index (A = 0) and pin number within the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId {
    pub port: u8,
    pub pin: u8,
}

impl PinId {
    pub const fn new(port: u8, pin: u8) -> Self {
        Self { port, pin }
    }

    /// Canonical name, e.g. `PA0` or `PB12`.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// True when both port and pin fit the 2-byte notification record.
    pub fn is_encodable(&self) -> bool {
        self.port <= MAX_NIBBLE && self.pin <= MAX_NIBBLE
    }
}

impl Display for PinId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}{}", char::from(b'A'.saturating_add(self.port)), self.pin)
    }
}

impl FromStr for PinId {
    type Err = HalError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let invalid = || HalError::InvalidPinName(name.to_string());
        let bytes = name.as_bytes();
        if bytes.len() < 3 || bytes[0] != b'P' || !bytes[1].is_ascii_uppercase() {
            return Err(invalid());
        }
        let port = bytes[1] - b'A';
        let pin: u8 = name[2..].parse().map_err(|_| invalid())?;
        Ok(Self { port, pin })
    }
}

//endregion

//region Interrupt configuration

/// Which edges raise an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterruptMode {
    #[default]
    None,
    Rising,
    Falling,
    Both,
}

impl InterruptMode {
    pub fn rising(&self) -> bool {
        matches!(self, InterruptMode::Rising | InterruptMode::Both)
    }

    pub fn falling(&self) -> bool {
        matches!(self, InterruptMode::Falling | InterruptMode::Both)
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResistorMode {
    #[default]
    Disabled = 0,
    InternalPullUp = 1,
    InternalPullDown = 2,
}

/// Interrupt settings for one pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterruptConfig {
    pub mode: InterruptMode,
    pub resistor: ResistorMode,
    pub debounce: Duration,
    pub glitch: Duration,
}

impl InterruptConfig {
    pub fn new(mode: InterruptMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_resistor(mut self, resistor: ResistorMode) -> Self {
        self.resistor = resistor;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_glitch(mut self, glitch: Duration) -> Self {
        self.glitch = glitch;
        self
    }

    /// Build the control request for `pin`. Durations are converted to tenths
    /// of a millisecond, saturating at `u32::MAX`.
    pub fn to_control_request(&self, pin: PinId, enable: bool) -> InterruptControlRequest {
        InterruptControlRequest {
            enable,
            port: pin.port,
            pin: pin.pin,
            rising: self.mode.rising(),
            falling: self.mode.falling(),
            resistor: self.resistor,
            debounce_tenths_ms: tenths_of_ms(self.debounce),
            glitch_tenths_ms: tenths_of_ms(self.glitch),
        }
    }
}

fn tenths_of_ms(duration: Duration) -> u32 {
    u32::try_from(duration.as_micros() / 100).unwrap_or(u32::MAX)
}

//endregion

//region Control call

/// Arguments of the platform's GPIO interrupt control call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptControlRequest {
    pub enable: bool,
    pub port: u8,
    pub pin: u8,
    pub rising: bool,
    pub falling: bool,
    pub resistor: ResistorMode,
    pub debounce_tenths_ms: u32,
    pub glitch_tenths_ms: u32,
}

/// Registers and unregisters pin interrupts with the kernel.
pub trait GpioInterruptControl: Send + Sync {
    /// # Returns
    /// [`GPIO_CONTROL_OK`] on success, a platform status code otherwise
    fn configure(&self, request: &InterruptControlRequest) -> i32;
}

//endregion

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names() {
        assert_eq!(PinId::new(0, 0).name(), "PA0");
        assert_eq!(PinId::new(1, 12).name(), "PB12");
        assert_eq!("PC7".parse::<PinId>().unwrap(), PinId::new(2, 7));
        assert!("A7".parse::<PinId>().is_err());
        assert!("Pa7".parse::<PinId>().is_err());
        assert!("PB".parse::<PinId>().is_err());
    }

    #[test]
    fn test_control_request_conversion() {
        let config = InterruptConfig::new(InterruptMode::Both)
            .with_resistor(ResistorMode::InternalPullUp)
            .with_debounce(Duration::from_millis(5))
            .with_glitch(Duration::from_micros(250));
        let request = config.to_control_request(PinId::new(3, 4), true);
        assert!(request.rising && request.falling);
        assert_eq!(request.debounce_tenths_ms, 50);
        assert_eq!(request.glitch_tenths_ms, 2);
        assert_eq!((request.port, request.pin), (3, 4));
    }
}
