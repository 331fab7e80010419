// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Progressive CRC-32 (reflected polynomial 0xEDB88320, seed 0xFFFFFFFF).
//!
//! Transports feed bytes as they arrive so a frame can be checked the moment
//! its last byte lands. The accumulator applies no final inversion: the CRC of
//! an empty input is the seed itself. [`Crc32::standard_checksum`] gives the
//! inverted IEEE value for interoperability.

const POLYNOMIAL: u32 = 0xEDB8_8320;
const SEED: u32 = 0xFFFF_FFFF;

const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut index = 0;
    while index < 256 {
        let mut value = index as u32;
        let mut bit = 0;
        while bit < 8 {
            value = if value & 1 != 0 {
                (value >> 1) ^ POLYNOMIAL
            } else {
                value >> 1
            };
            bit += 1;
        }
        table[index] = value;
        index += 1;
    }
    table
}

/// Running CRC-32 accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    pub const SEED: u32 = SEED;

    pub const fn new() -> Self {
        Self { state: SEED }
    }

    /// Resumes from a previously saved value.
    pub const fn from_value(state: u32) -> Self {
        Self { state }
    }

    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.state = TABLE[((self.state ^ byte as u32) & 0xFF) as usize] ^ (self.state >> 8);
    }

    pub fn update_slice(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.update(*byte);
        }
    }

    pub fn value(&self) -> u32 {
        self.state
    }

    /// IEEE CRC-32 of everything fed so far (the inverted running value).
    pub fn standard_checksum(&self) -> u32 {
        !self.state
    }

    pub fn reset(&mut self) {
        self.state = SEED;
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// CRC over a whole buffer; equal to feeding the same bytes one at a time.
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update_slice(bytes);
    crc.value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_keeps_seed() {
        assert_eq!(crc32(&[]), 0xFFFF_FFFF);
    }

    #[test]
    fn test_matches_ieee_check_value() {
        let mut crc = Crc32::new();
        crc.update_slice(b"123456789");
        assert_eq!(crc.standard_checksum(), 0xCBF4_3926);
    }

    #[test]
    fn test_resume_from_saved_value() {
        let mut first = Crc32::new();
        first.update_slice(b"hello ");
        let mut resumed = Crc32::from_value(first.value());
        resumed.update_slice(b"world");
        assert_eq!(resumed.value(), crc32(b"hello world"));
    }
}
