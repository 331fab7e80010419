// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use shim_hal::{PinId, NOTIFICATION_RECORD_SIZE};

/// One notification from the kernel queue.
///
/// Byte 0 carries the port in the high nibble and the pin in the low nibble;
/// byte 1 is the debounced pin state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptRecord {
    pub pin: PinId,
    pub state: bool,
}

impl InterruptRecord {
    pub fn parse(bytes: [u8; NOTIFICATION_RECORD_SIZE]) -> Self {
        Self {
            pin: PinId::new(bytes[0] >> 4, bytes[0] & 0x0F),
            state: bytes[1] != 0,
        }
    }

    /// Record as the kernel would write it. Port and pin are truncated to a nibble.
    pub fn to_bytes(&self) -> [u8; NOTIFICATION_RECORD_SIZE] {
        [((self.pin.port & 0x0F) << 4) | (self.pin.pin & 0x0F), u8::from(self.state)]
    }
}

/// What a handler receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptEvent {
    pub pin: PinId,
    /// Canonical pin name, e.g. `PB3`.
    pub pin_name: String,
    pub state: bool,
}

impl From<InterruptRecord> for InterruptEvent {
    fn from(record: InterruptRecord) -> Self {
        Self {
            pin: record.pin,
            pin_name: record.pin.name(),
            state: record.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nibbles() {
        let record = InterruptRecord::parse([0x2C, 1]);
        assert_eq!(record.pin, PinId::new(2, 12));
        assert!(record.state);
        assert!(!InterruptRecord::parse([0x00, 0]).state);
        assert!(InterruptRecord::parse([0x00, 0x80]).state);
    }

    #[test]
    fn test_event_carries_canonical_name() {
        let event = InterruptEvent::from(InterruptRecord::parse([0x13, 0]));
        assert_eq!(event.pin_name, "PB3");
        assert_eq!(InterruptRecord::parse([0x13, 0]).to_bytes(), [0x13, 0]);
    }
}
