// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::CodecError;
use std::fmt::{Display, Formatter};

/// Co-processor interface addressed by a command (1 byte on the wire).
#[repr(u8)]
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum InterfaceId {
    None = 0,
    System = 1,
    WiFi = 2,
    Rtc = 3,
    Bluetooth = 4,
    Sockets = 5,
}

impl TryFrom<u8> for InterfaceId {
    type Error = CodecError;
    fn try_from(value: u8) -> Result<Self, CodecError> {
        match value {
            0 => Ok(InterfaceId::None),
            1 => Ok(InterfaceId::System),
            2 => Ok(InterfaceId::WiFi),
            3 => Ok(InterfaceId::Rtc),
            4 => Ok(InterfaceId::Bluetooth),
            5 => Ok(InterfaceId::Sockets),
            _ => Err(CodecError::UnsupportedValue {
                field: "InterfaceId",
                value: value as u32,
            }),
        }
    }
}

impl Display for InterfaceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InterfaceId::None => "None",
            InterfaceId::System => "System",
            InterfaceId::WiFi => "WiFi",
            InterfaceId::Rtc => "Rtc",
            InterfaceId::Bluetooth => "Bluetooth",
            InterfaceId::Sockets => "Sockets",
        };
        write!(f, "{name}")
    }
}

/// 4-byte function code within an interface.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

impl Display for FunctionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

macro_rules! function_codes {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident = $code:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(u32)]
        #[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
        pub enum $name {
            $( $variant = $code, )*
        }

        impl From<$name> for FunctionId {
            fn from(value: $name) -> Self {
                FunctionId(value as u32)
            }
        }

        impl TryFrom<FunctionId> for $name {
            type Error = CodecError;
            fn try_from(value: FunctionId) -> Result<Self, CodecError> {
                match value.0 {
                    $( $code => Ok($name::$variant), )*
                    other => Err(CodecError::UnsupportedValue {
                        field: stringify!($name),
                        value: other,
                    }),
                }
            }
        }
    };
}

function_codes! {
    /// Functions of [`InterfaceId::System`].
    SystemFunction {
        GetConfiguration = 1,
        SetConfiguration = 2,
        GetDeviceInformation = 3,
        GetHealthInformation = 4,
        Reset = 5,
        GetProtocolVersion = 6,
        SetAntenna = 7,
        SetDebugLevel = 8,
    }
}

function_codes! {
    /// Functions of [`InterfaceId::WiFi`].
    WiFiFunction {
        ConnectToAccessPoint = 1,
        DisconnectFromAccessPoint = 2,
        StartScan = 3,
        GetScanResults = 4,
        SetNetworkConfiguration = 5,
        GetNetworkInterfaceInfo = 6,
        StartSoftAccessPoint = 7,
        StopSoftAccessPoint = 8,
        GetRssi = 9,
        GetMacAddress = 10,
        SetHostname = 11,
        GetDnsServers = 12,
        SetNtpConfiguration = 13,
    }
}

function_codes! {
    /// Functions of [`InterfaceId::Rtc`].
    RtcFunction {
        GetTime = 1,
        SetTime = 2,
    }
}

function_codes! {
    /// Functions of [`InterfaceId::Bluetooth`].
    BluetoothFunction {
        Start = 1,
        Stop = 2,
        DefineGattServer = 3,
        WriteData = 4,
        StartAdvertising = 5,
        StopAdvertising = 6,
    }
}

function_codes! {
    /// Functions of [`InterfaceId::Sockets`].
    SocketFunction {
        Create = 1,
        Bind = 2,
        Connect = 3,
        Listen = 4,
        Accept = 5,
        Send = 6,
        SendTo = 7,
        Receive = 8,
        ReceiveFrom = 9,
        Close = 10,
        Shutdown = 11,
        SetOption = 12,
        GetOption = 13,
        GetAddrInfo = 14,
        Poll = 15,
        ConfigureTls = 16,
    }
}

/// Status the co-processor reports for a command.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum StatusCode {
    CompletedOk,
    CoreNotInitialised,
    InvalidInterfaceMethodCombination,
    UnknownFunction,
    InvalidParameter,
    OutOfMemory,
    Timeout,
    NotConnected,
    Busy,
    /// Any code this build does not know; preserved verbatim.
    Unknown(u32),
}

impl StatusCode {
    pub fn code(&self) -> u32 {
        match self {
            StatusCode::CompletedOk => 0,
            StatusCode::CoreNotInitialised => 1,
            StatusCode::InvalidInterfaceMethodCombination => 2,
            StatusCode::UnknownFunction => 3,
            StatusCode::InvalidParameter => 4,
            StatusCode::OutOfMemory => 5,
            StatusCode::Timeout => 6,
            StatusCode::NotConnected => 7,
            StatusCode::Busy => 8,
            StatusCode::Unknown(code) => *code,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StatusCode::CompletedOk)
    }
}

impl From<u32> for StatusCode {
    fn from(value: u32) -> Self {
        match value {
            0 => StatusCode::CompletedOk,
            1 => StatusCode::CoreNotInitialised,
            2 => StatusCode::InvalidInterfaceMethodCombination,
            3 => StatusCode::UnknownFunction,
            4 => StatusCode::InvalidParameter,
            5 => StatusCode::OutOfMemory,
            6 => StatusCode::Timeout,
            7 => StatusCode::NotConnected,
            8 => StatusCode::Busy,
            other => StatusCode::Unknown(other),
        }
    }
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusCode::Unknown(code) => write!(f, "Unknown({code})"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Protocol version capability of the host platform.
///
/// Resolved once at startup by probing the platform and then passed to the
/// decoders whose layout depends on it.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ProtocolVersion(pub u32);

impl ProtocolVersion {
    /// Platforms without a version entry point speak version 0.
    pub const LEGACY: ProtocolVersion = ProtocolVersion(0);
    pub const EXTENDED_EVENTS: ProtocolVersion = ProtocolVersion(1);

    /// Version 1 added the full disconnect event payload.
    pub fn has_extended_disconnect_event(&self) -> bool {
        *self >= Self::EXTENDED_EVENTS
    }
}

impl Display for ProtocolVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}
