// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The one message whose layout depends on the platform protocol version.

use crate::wire::{WireReader, WireWriter};
use crate::{CodecResult, ProtocolVersion, SsidString, WireField, WireMessage};
use std::fmt::{Display, Formatter};

/// Size of the full (version 1+) disconnect payload.
pub const DISCONNECT_EVENT_V1_SIZE: usize = crate::SSID_SLOT_SIZE + 6 + 1 + 1;

/// Reason the radio gives for dropping a station connection.
///
/// Codes the build does not know are kept as [`DisconnectReason::Unknown`] so
/// every byte value survives a decode/encode cycle.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum DisconnectReason {
    Unspecified,
    AuthExpire,
    AuthLeave,
    AssocExpire,
    AssocTooMany,
    NotAuthed,
    NotAssoced,
    AssocLeave,
    AssocNotAuthed,
    MicFailure,
    FourWayHandshakeTimeout,
    GroupKeyUpdateTimeout,
    AuthenticationFailed8021X,
    BeaconTimeout,
    NoApFound,
    AuthFail,
    AssocFail,
    HandshakeTimeout,
    ConnectionFail,
    Unknown(u8),
}

impl DisconnectReason {
    pub fn code(&self) -> u8 {
        match self {
            DisconnectReason::Unspecified => 1,
            DisconnectReason::AuthExpire => 2,
            DisconnectReason::AuthLeave => 3,
            DisconnectReason::AssocExpire => 4,
            DisconnectReason::AssocTooMany => 5,
            DisconnectReason::NotAuthed => 6,
            DisconnectReason::NotAssoced => 7,
            DisconnectReason::AssocLeave => 8,
            DisconnectReason::AssocNotAuthed => 9,
            DisconnectReason::MicFailure => 14,
            DisconnectReason::FourWayHandshakeTimeout => 15,
            DisconnectReason::GroupKeyUpdateTimeout => 16,
            DisconnectReason::AuthenticationFailed8021X => 23,
            DisconnectReason::BeaconTimeout => 200,
            DisconnectReason::NoApFound => 201,
            DisconnectReason::AuthFail => 202,
            DisconnectReason::AssocFail => 203,
            DisconnectReason::HandshakeTimeout => 204,
            DisconnectReason::ConnectionFail => 205,
            DisconnectReason::Unknown(code) => *code,
        }
    }
}

impl From<u8> for DisconnectReason {
    fn from(value: u8) -> Self {
        match value {
            1 => DisconnectReason::Unspecified,
            2 => DisconnectReason::AuthExpire,
            3 => DisconnectReason::AuthLeave,
            4 => DisconnectReason::AssocExpire,
            5 => DisconnectReason::AssocTooMany,
            6 => DisconnectReason::NotAuthed,
            7 => DisconnectReason::NotAssoced,
            8 => DisconnectReason::AssocLeave,
            9 => DisconnectReason::AssocNotAuthed,
            14 => DisconnectReason::MicFailure,
            15 => DisconnectReason::FourWayHandshakeTimeout,
            16 => DisconnectReason::GroupKeyUpdateTimeout,
            23 => DisconnectReason::AuthenticationFailed8021X,
            200 => DisconnectReason::BeaconTimeout,
            201 => DisconnectReason::NoApFound,
            202 => DisconnectReason::AuthFail,
            203 => DisconnectReason::AssocFail,
            204 => DisconnectReason::HandshakeTimeout,
            205 => DisconnectReason::ConnectionFail,
            other => DisconnectReason::Unknown(other),
        }
    }
}

impl Display for DisconnectReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectReason::Unknown(code) => write!(f, "Unknown({code})"),
            other => write!(f, "{:?}", other),
        }
    }
}

impl WireField for DisconnectReason {
    fn wire_size(&self) -> usize {
        1
    }

    fn write_to(&self, writer: &mut WireWriter<'_>) {
        writer.write_u8(self.code());
    }

    fn read_from(reader: &mut WireReader<'_>) -> CodecResult<Self> {
        Ok(DisconnectReason::from(reader.read_u8()?))
    }
}

/// Station disconnect event.
///
/// Protocol version 0 platforms raise the event with no payload; it decodes to
/// [`DisconnectEventData::unspecified`]. Version 1 and later carry the full
/// record: SSID slot at offset 0, BSSID at 33, RSSI at 39, reason at 40.
///
/// The [`WireMessage`] implementation always uses the full layout; use
/// [`DisconnectEventData::decode_versioned`] for data straight from the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectEventData {
    pub ssid: SsidString,
    pub bssid: [u8; 6],
    pub rssi: i8,
    pub reason: DisconnectReason,
}

impl DisconnectEventData {
    /// The record a version 0 platform reports.
    pub fn unspecified() -> Self {
        Self {
            ssid: SsidString::default(),
            bssid: [0; 6],
            rssi: 0,
            reason: DisconnectReason::Unspecified,
        }
    }

    pub fn decode_versioned(bytes: &[u8], offset: usize, version: ProtocolVersion) -> CodecResult<Self> {
        if version.has_extended_disconnect_event() {
            Self::decode(bytes, offset)
        } else {
            Ok(Self::unspecified())
        }
    }

    pub fn encode_versioned(&self, version: ProtocolVersion) -> Vec<u8> {
        if version.has_extended_disconnect_event() {
            self.encode()
        } else {
            Vec::new()
        }
    }
}

impl Default for DisconnectEventData {
    fn default() -> Self {
        Self::unspecified()
    }
}

impl WireField for DisconnectEventData {
    fn wire_size(&self) -> usize {
        DISCONNECT_EVENT_V1_SIZE
    }

    fn write_to(&self, writer: &mut WireWriter<'_>) {
        self.ssid.write_to(writer);
        writer.write_bytes(&self.bssid);
        writer.write_i8(self.rssi);
        self.reason.write_to(writer);
    }

    fn read_from(reader: &mut WireReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            ssid: SsidString::read_from(reader)?,
            bssid: reader.read_array::<6>()?,
            rssi: reader.read_i8()?,
            reason: DisconnectReason::read_from(reader)?,
        })
    }
}

impl WireMessage for DisconnectEventData {
    const TYPE_NAME: &'static str = "DisconnectEventData";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_payload() -> Vec<u8> {
        let mut bytes = vec![0u8; DISCONNECT_EVENT_V1_SIZE];
        bytes[..4].copy_from_slice(b"home");
        bytes[33..39].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]);
        bytes[39] = (-67i8) as u8;
        bytes[40] = 201;
        bytes
    }

    #[test]
    fn test_version_zero_synthesises_unspecified() {
        let decoded = DisconnectEventData::decode_versioned(&full_payload(), 0, ProtocolVersion::LEGACY).unwrap();
        assert_eq!(decoded, DisconnectEventData::unspecified());
        assert_eq!(decoded.reason, DisconnectReason::Unspecified);

        // Legacy platforms send nothing at all.
        let empty = DisconnectEventData::decode_versioned(&[], 0, ProtocolVersion::LEGACY).unwrap();
        assert_eq!(empty.reason, DisconnectReason::Unspecified);
    }

    #[test]
    fn test_version_one_reads_fixed_offsets() {
        let decoded =
            DisconnectEventData::decode_versioned(&full_payload(), 0, ProtocolVersion::EXTENDED_EVENTS).unwrap();
        assert_eq!(decoded.ssid.to_string_lossy(), "home");
        assert_eq!(decoded.bssid, [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]);
        assert_eq!(decoded.rssi, -67);
        assert_eq!(decoded.reason, DisconnectReason::NoApFound);
        assert_eq!(decoded.encode(), full_payload());
    }

    #[test]
    fn test_version_one_truncated_is_malformed() {
        let payload = full_payload();
        let error = DisconnectEventData::decode_versioned(&payload[..40], 0, ProtocolVersion(2)).unwrap_err();
        assert!(error.is_malformed());
    }

    #[test]
    fn test_unknown_reason_round_trips() {
        for code in 0..=u8::MAX {
            assert_eq!(DisconnectReason::from(code).code(), code);
        }
    }
}
