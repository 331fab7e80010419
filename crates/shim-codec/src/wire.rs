// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{CodecError, CodecResult};
use byteorder::{ByteOrder, LittleEndian};
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};

/// Number of bytes the wire format reserves for an SSID (32 content bytes + terminator).
pub const SSID_SLOT_SIZE: usize = 33;

/// SSID stored in its fixed wire slot.
pub type SsidString = FixedString<SSID_SLOT_SIZE>;

const LENGTH_FIELD_BYTE_COUNT: usize = 4;

//region Writer

/// Sequential little-endian writer over a pre-sized, zero-initialised buffer.
///
/// The buffer is always sized with [`WireField::wire_size`] before writing, so a
/// write past the end is a bug in a size computation, not a peer-data problem.
pub struct WireWriter<'a> {
    buffer: &'a mut [u8],
    position: usize,
}

impl<'a> WireWriter<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer[self.position] = value;
        self.position += 1;
    }

    pub fn write_i8(&mut self, value: i8) {
        self.write_u8(value as u8);
    }

    pub fn write_u16(&mut self, value: u16) {
        LittleEndian::write_u16(&mut self.buffer[self.position..self.position + 2], value);
        self.position += 2;
    }

    pub fn write_i16(&mut self, value: i16) {
        LittleEndian::write_i16(&mut self.buffer[self.position..self.position + 2], value);
        self.position += 2;
    }

    pub fn write_u32(&mut self, value: u32) {
        LittleEndian::write_u32(&mut self.buffer[self.position..self.position + 4], value);
        self.position += 4;
    }

    pub fn write_i32(&mut self, value: i32) {
        LittleEndian::write_i32(&mut self.buffer[self.position..self.position + 4], value);
        self.position += 4;
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
    }

    /// Writes `count` zero bytes (padding of fixed slots).
    pub fn write_zeros(&mut self, count: usize) {
        self.buffer[self.position..self.position + count].fill(0);
        self.position += count;
    }
}

//endregion

//region Reader

/// Bounds-checked little-endian reader.
///
/// Every read that would leave the buffer is reported as
/// [`CodecError::MalformedMessage`] with the name of the message being decoded
/// and the absolute offset of the failed read.
pub struct WireReader<'a> {
    bytes: &'a [u8],
    position: usize,
    message_type: &'static str,
}

impl<'a> WireReader<'a> {
    pub fn new(bytes: &'a [u8], offset: usize, message_type: &'static str) -> Self {
        Self {
            bytes,
            position: offset,
            message_type,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn message_type(&self) -> &'static str {
        self.message_type
    }

    /// Bytes left between the current position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    pub fn malformed(&self, reason: impl Into<String>) -> CodecError {
        CodecError::malformed(self.message_type, self.position, reason)
    }

    pub fn take(&mut self, count: usize) -> CodecResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(self.malformed(format!(
                "needed {} bytes but only {} remain",
                count,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> CodecResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> CodecResult<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i16(&mut self) -> CodecResult<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> CodecResult<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> CodecResult<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    /// Reads a null-terminated string; the terminator is consumed but not returned.
    pub fn read_terminated(&mut self) -> CodecResult<&'a [u8]> {
        let rest = &self.bytes[self.position.min(self.bytes.len())..];
        match rest.iter().position(|b| *b == 0) {
            Some(terminator) => {
                let content = self.take(terminator)?;
                self.position += 1;
                Ok(content)
            }
            None => Err(self.malformed("string is missing its null terminator")),
        }
    }

    /// Reads a 4-byte count and checks it against the bytes left, so a corrupt
    /// count can never drive a large allocation.
    pub fn read_count(&mut self) -> CodecResult<usize> {
        let count = self.read_u32()? as usize;
        if count > self.remaining() {
            return Err(self.malformed(format!(
                "length field {} exceeds the {} remaining bytes",
                count,
                self.remaining()
            )));
        }
        Ok(count)
    }
}

//endregion

//region Field and Message traits

/// A value with a fixed, type-specific wire layout.
pub trait WireField: Sized {
    /// Exact number of bytes [`WireField::write_to`] will produce.
    fn wire_size(&self) -> usize;

    fn write_to(&self, writer: &mut WireWriter<'_>);

    fn read_from(reader: &mut WireReader<'_>) -> CodecResult<Self>;
}

/// A named, top-level message type.
///
/// `encoded_size`, `encode` and `decode` always agree: the buffer `encode`
/// produces is exactly `encoded_size` bytes and decodes back to an equal value.
pub trait WireMessage: WireField {
    const TYPE_NAME: &'static str;

    fn encoded_size(&self) -> usize {
        self.wire_size()
    }

    fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        self.encode_into(&mut buffer);
        buffer
    }

    /// Appends the encoded message to `output`, for framing several messages
    /// into one buffer.
    fn encode_into(&self, output: &mut Vec<u8>) {
        let start = output.len();
        let size = self.encoded_size();
        output.resize(start + size, 0);
        let mut writer = WireWriter::new(&mut output[start..]);
        self.write_to(&mut writer);
        debug_assert_eq!(writer.position(), size, "{} size mismatch", Self::TYPE_NAME);
    }

    fn decode(bytes: &[u8], offset: usize) -> CodecResult<Self> {
        Self::decode_with_len(bytes, offset).map(|(message, _)| message)
    }

    /// Decodes a message starting at `offset` and returns it with the number of
    /// bytes consumed.
    fn decode_with_len(bytes: &[u8], offset: usize) -> CodecResult<(Self, usize)> {
        let mut reader = WireReader::new(bytes, offset, Self::TYPE_NAME);
        let message = Self::read_from(&mut reader)?;
        Ok((message, reader.position() - offset))
    }

    /// Decodes a buffer that must contain exactly one message.
    fn decode_exact(bytes: &[u8]) -> CodecResult<Self> {
        let (message, consumed) = Self::decode_with_len(bytes, 0)?;
        if consumed != bytes.len() {
            return Err(CodecError::TrailingBytes {
                message_type: Self::TYPE_NAME,
                offset: consumed,
                count: bytes.len() - consumed,
            });
        }
        Ok(message)
    }
}

//endregion

//region Primitive fields

macro_rules! integer_field {
    ($ty:ty, $size:expr, $write:ident, $read:ident) => {
        impl WireField for $ty {
            fn wire_size(&self) -> usize {
                $size
            }

            fn write_to(&self, writer: &mut WireWriter<'_>) {
                writer.$write(*self);
            }

            fn read_from(reader: &mut WireReader<'_>) -> CodecResult<Self> {
                reader.$read()
            }
        }
    };
}

integer_field!(u8, 1, write_u8, read_u8);
integer_field!(i8, 1, write_i8, read_i8);
integer_field!(u16, 2, write_u16, read_u16);
integer_field!(i16, 2, write_i16, read_i16);
integer_field!(u32, 4, write_u32, read_u32);
integer_field!(i32, 4, write_i32, read_i32);

/// Single byte, non-zero is `true`.
impl WireField for bool {
    fn wire_size(&self) -> usize {
        1
    }

    fn write_to(&self, writer: &mut WireWriter<'_>) {
        writer.write_u8(u8::from(*self));
    }

    fn read_from(reader: &mut WireReader<'_>) -> CodecResult<Self> {
        Ok(reader.read_u8()? != 0)
    }
}

impl<const N: usize> WireField for [u8; N] {
    fn wire_size(&self) -> usize {
        N
    }

    fn write_to(&self, writer: &mut WireWriter<'_>) {
        writer.write_bytes(self);
    }

    fn read_from(reader: &mut WireReader<'_>) -> CodecResult<Self> {
        reader.read_array::<N>()
    }
}

/// Null-terminated string. Content is written verbatim, so a string holding an
/// interior NUL decodes shorter than it was encoded.
impl WireField for String {
    fn wire_size(&self) -> usize {
        self.len() + 1
    }

    fn write_to(&self, writer: &mut WireWriter<'_>) {
        writer.write_bytes(self.as_bytes());
        writer.write_u8(0);
    }

    fn read_from(reader: &mut WireReader<'_>) -> CodecResult<Self> {
        let content = reader.read_terminated()?;
        Ok(String::from_utf8_lossy(content).into_owned())
    }
}

/// Length-prefixed sequence: 4-byte element count, then each element.
/// `Vec<u8>` is therefore the wire's length-prefixed blob.
impl<T: WireField> WireField for Vec<T> {
    fn wire_size(&self) -> usize {
        LENGTH_FIELD_BYTE_COUNT + self.iter().map(WireField::wire_size).sum::<usize>()
    }

    fn write_to(&self, writer: &mut WireWriter<'_>) {
        writer.write_u32(self.len() as u32);
        for element in self {
            element.write_to(writer);
        }
    }

    fn read_from(reader: &mut WireReader<'_>) -> CodecResult<Self> {
        // Every element type on the wire occupies at least one byte, so the count
        // can be bounded by the bytes that are left.
        let count = reader.read_count()?;
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            elements.push(T::read_from(reader)?);
        }
        Ok(elements)
    }
}

//endregion

//region Fixed String Slot

/// String stored in a fixed `N`-byte slot: up to `N - 1` content bytes, zero padded.
///
/// Content longer than the slot is truncated silently at the *byte* level when
/// the value is constructed. Multi-byte UTF-8 sequences are not respected, so a
/// truncated string may end in a partial character; it then reads back with a
/// replacement character from [`FixedString::to_string_lossy`]. Content is
/// also cut at the first NUL byte, which the slot uses as its terminator.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct FixedString<const N: usize> {
    bytes: Vec<u8>,
}

impl<const N: usize> FixedString<N> {
    /// Maximum number of content bytes.
    pub const CAPACITY: usize = N.saturating_sub(1);

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let end = bytes
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(bytes.len())
            .min(Self::CAPACITY);
        Self {
            bytes: bytes[..end].to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl<const N: usize> From<&str> for FixedString<N> {
    fn from(value: &str) -> Self {
        Self::from_bytes(value.as_bytes())
    }
}

impl<const N: usize> From<String> for FixedString<N> {
    fn from(value: String) -> Self {
        Self::from_bytes(value.as_bytes())
    }
}

impl<const N: usize> Debug for FixedString<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl<const N: usize> Display for FixedString<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_lossy())
    }
}

impl<const N: usize> WireField for FixedString<N> {
    fn wire_size(&self) -> usize {
        N
    }

    fn write_to(&self, writer: &mut WireWriter<'_>) {
        writer.write_bytes(&self.bytes);
        writer.write_zeros(N - self.bytes.len());
    }

    fn read_from(reader: &mut WireReader<'_>) -> CodecResult<Self> {
        Ok(Self::from_bytes(reader.take(N)?))
    }
}

//endregion

//region Message declaration macro

/// Declares a wire message struct and implements its size / encode / decode
/// triplet from a single ordered field list, so the three can never disagree
/// on field order.
///
/// Every field type must implement [`WireField`].
///
/// ```rust
/// use shim_codec::{wire_message, WireMessage};
///
/// wire_message! {
///     /// Example message.
///     pub struct Ping {
///         pub sequence: u32,
///         pub note: String,
///     }
/// }
///
/// let ping = Ping { sequence: 7, note: "hi".into() };
/// assert_eq!(ping.encoded_size(), 4 + 3);
/// assert_eq!(Ping::decode(&ping.encode(), 0).unwrap(), ping);
/// ```
#[macro_export]
macro_rules! wire_message {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::WireField for $name {
            fn wire_size(&self) -> usize {
                0 $( + $crate::WireField::wire_size(&self.$field) )*
            }

            fn write_to(&self, writer: &mut $crate::WireWriter<'_>) {
                $( $crate::WireField::write_to(&self.$field, writer); )*
            }

            fn read_from(reader: &mut $crate::WireReader<'_>) -> $crate::CodecResult<Self> {
                Ok(Self {
                    $( $field: <$ty as $crate::WireField>::read_from(reader)?, )*
                })
            }
        }

        impl $crate::WireMessage for $name {
            const TYPE_NAME: &'static str = stringify!($name);
        }
    };
}

//endregion

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_are_little_endian() {
        let mut buffer = [0u8; 7];
        let mut writer = WireWriter::new(&mut buffer);
        writer.write_u16(0x0102);
        writer.write_i32(-2);
        writer.write_u8(9);
        assert_eq!(buffer, [0x02, 0x01, 0xFE, 0xFF, 0xFF, 0xFF, 9]);
    }

    #[test]
    fn test_reader_reports_offset_of_failed_read() {
        let bytes = [1u8, 2, 3];
        let mut reader = WireReader::new(&bytes, 1, "Probe");
        assert_eq!(reader.read_u8().unwrap(), 2);
        let error = reader.read_u32().unwrap_err();
        assert_eq!(
            error,
            CodecError::MalformedMessage {
                message_type: "Probe",
                offset: 2,
                reason: "needed 4 bytes but only 1 remain".into(),
            }
        );
    }

    #[test]
    fn test_offset_past_end_is_malformed() {
        let bytes = [1u8];
        let mut reader = WireReader::new(&bytes, 5, "Probe");
        assert!(reader.read_u8().unwrap_err().is_malformed());
        assert!(reader.read_terminated().unwrap_err().is_malformed());
    }

    #[test]
    fn test_unterminated_string() {
        let bytes = b"abc";
        let mut reader = WireReader::new(bytes, 0, "Probe");
        assert!(String::read_from(&mut reader).is_err());
    }

    #[test]
    fn test_empty_blob_decodes_to_empty_vec() {
        let bytes = [0u8, 0, 0, 0];
        let mut reader = WireReader::new(&bytes, 0, "Probe");
        let blob = Vec::<u8>::read_from(&mut reader).unwrap();
        assert!(blob.is_empty());
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn test_blob_length_larger_than_payload() {
        let bytes = [5u8, 0, 0, 0, 1, 2];
        let mut reader = WireReader::new(&bytes, 0, "Probe");
        let error = Vec::<u8>::read_from(&mut reader).unwrap_err();
        assert!(matches!(error, CodecError::MalformedMessage { offset: 4, .. }));
    }

    #[test]
    fn test_fixed_string_truncates_at_byte_level() {
        let ssid = SsidString::from("x".repeat(40).as_str());
        assert_eq!(ssid.len(), 32);
        assert_eq!(ssid.wire_size(), SSID_SLOT_SIZE);

        // 31 ASCII bytes followed by a two-byte character: only its first byte fits.
        let mixed = format!("{}é", "a".repeat(31));
        let truncated = SsidString::from(mixed.as_str());
        assert_eq!(truncated.len(), 32);
        assert!(truncated.to_string_lossy().ends_with('\u{FFFD}'));
    }

    #[test]
    fn test_fixed_string_zero_padded() {
        let ssid = FixedString::<6>::from("ab");
        let mut buffer = [0xAAu8; 6];
        let mut writer = WireWriter::new(&mut buffer);
        ssid.write_to(&mut writer);
        assert_eq!(buffer, [b'a', b'b', 0, 0, 0, 0]);
    }
}
