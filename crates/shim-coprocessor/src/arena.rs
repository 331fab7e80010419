// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{ChannelError, ChannelResult};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Hands out fixed-size, zeroed command buffers and tracks how many are out.
///
/// A buffer's heap storage never moves while it is leased, so its address can
/// be given to the platform for the duration of a call.
#[derive(Debug, Clone)]
pub struct BufferArena {
    max_buffer_size: usize,
    outstanding: Arc<AtomicUsize>,
}

impl BufferArena {
    pub fn new(max_buffer_size: usize) -> Self {
        Self {
            max_buffer_size,
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }

    /// Lease a zeroed buffer of exactly `size` bytes.
    pub fn lease(&self, size: usize) -> ChannelResult<PinnedBuffer> {
        if size > self.max_buffer_size {
            return Err(ChannelError::InvalidRequest(format!(
                "buffer of {} bytes exceeds the {} byte limit",
                size, self.max_buffer_size
            )));
        }
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        Ok(PinnedBuffer {
            data: vec![0u8; size].into_boxed_slice(),
            outstanding: Arc::clone(&self.outstanding),
        })
    }

    /// Lease a buffer holding a copy of `bytes`.
    pub fn lease_copy(&self, bytes: &[u8]) -> ChannelResult<PinnedBuffer> {
        let mut buffer = self.lease(bytes.len())?;
        buffer.copy_from_slice(bytes);
        Ok(buffer)
    }

    /// Leases not yet dropped.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

/// A leased buffer; returned to its arena on drop.
#[derive(Debug)]
pub struct PinnedBuffer {
    data: Box<[u8]>,
    outstanding: Arc<AtomicUsize>,
}

impl Deref for PinnedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for PinnedBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for PinnedBuffer {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}
