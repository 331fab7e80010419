// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Co-processor Wire Codec
//!
//! Stateless transformation between the named message types exchanged with the
//! radio co-processor and their binary wire representation.
//!
//! ## Wire Format
//!
//! Every message is a flat, ordered sequence of fields:
//! - fixed-width integers (8/16/32-bit, signed/unsigned), little-endian
//! - fixed-length raw byte arrays (MAC addresses, IPv6 addresses, UUIDs)
//! - null-terminated ASCII strings
//! - fixed-size string slots (SSIDs), truncated at the byte level
//! - variable-length blobs and lists preceded by a 4-byte unsigned count
//!
//! ## Core Components
//!
//! - **[`WireField`]** / **[`WireMessage`]** - size / encode / decode triplet per type
//! - **[`wire_message!`]** - declares a message struct and its triplet from one field list
//! - **[`Crc32`]** - progressive CRC-32 for frame validation while bytes arrive
//! - **[`spi_buffer_size`]** - SPI transfer sizing including the peer truncation workaround
//!
//! ## Basic Usage
//!
//! ```rust
//! use shim_codec::messages::WiFiCredentials;
//! use shim_codec::{FixedString, WireMessage};
//!
//! let credentials = WiFiCredentials {
//!     ssid: FixedString::from("workshop"),
//!     password: "hunter22".to_string(),
//!     reconnect: 1,
//! };
//! let bytes = credentials.encode();
//! assert_eq!(bytes.len(), credentials.encoded_size());
//! assert_eq!(WiFiCredentials::decode(&bytes, 0).unwrap(), credentials);
//! ```

mod crc;
mod error;
pub mod messages;
mod protocol;
mod spi;
mod wire;

pub use crc::{crc32, Crc32};
pub use error::{CodecError, CodecResult};
pub use protocol::{
    BluetoothFunction, FunctionId, InterfaceId, ProtocolVersion, RtcFunction, SocketFunction,
    StatusCode, SystemFunction, WiFiFunction,
};
pub use spi::{spi_buffer_size, SPI_MINIMUM_BUFFER_SIZE, SPI_TRAILING_PAD_BYTES};
pub use wire::{FixedString, SsidString, WireField, WireMessage, WireReader, WireWriter, SSID_SLOT_SIZE};
