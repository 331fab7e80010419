// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Smallest transfer the SPI transport will issue.
pub const SPI_MINIMUM_BUFFER_SIZE: usize = 8;

/// Extra bytes appended to every transfer. The co-processor's SPI slave drops
/// trailing bytes of a transfer; padding keeps the payload intact.
pub const SPI_TRAILING_PAD_BYTES: usize = 4;

/// Size of the SPI transfer buffer for a `requested` payload length.
///
/// The requested size is raised to the minimum, advanced to the next 4-byte
/// boundary (an already aligned size still advances by a full word), then
/// padded with [`SPI_TRAILING_PAD_BYTES`]: `((max(n, 8) + 4) & !3) + 4`.
///
/// # Returns
/// `None` when the buffer size does not fit in `usize`
///
/// ```rust
/// use shim_codec::spi_buffer_size;
///
/// assert_eq!(spi_buffer_size(8), Some(16));
/// assert_eq!(spi_buffer_size(20), Some(28));
/// assert_eq!(spi_buffer_size(usize::MAX), None);
/// ```
pub fn spi_buffer_size(requested: usize) -> Option<usize> {
    let size = requested.max(SPI_MINIMUM_BUFFER_SIZE);
    (size.checked_add(4)? & !3).checked_add(SPI_TRAILING_PAD_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_sizes() {
        let expected = [(0, 16), (1, 16), (7, 16), (8, 16), (9, 16), (20, 28), (100, 108)];
        for (requested, size) in expected {
            assert_eq!(spi_buffer_size(requested), Some(size), "requested {}", requested);
        }
    }

    #[test]
    fn test_sizing_invariants() {
        for requested in 0..512 {
            let size = spi_buffer_size(requested).unwrap();
            assert!(size >= SPI_MINIMUM_BUFFER_SIZE);
            assert_eq!(size % 4, 0);
            assert!(size >= requested + SPI_TRAILING_PAD_BYTES);
        }
    }

    #[test]
    fn test_sizes_near_usize_max() {
        assert_eq!(spi_buffer_size(usize::MAX), None);
        assert_eq!(spi_buffer_size(usize::MAX - 3), None);
        assert_eq!(spi_buffer_size(usize::MAX - 7), None);
        // largest request that still fits: aligned up to MAX - 7, then padded
        assert_eq!(spi_buffer_size(usize::MAX - 8), Some(usize::MAX - 3));
    }
}
