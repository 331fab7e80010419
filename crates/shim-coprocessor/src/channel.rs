// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{BufferArena, ChannelContext, ChannelError, ChannelResult};
use shim_codec::{FunctionId, InterfaceId, StatusCode, WireMessage};
use shim_hal::CommandEnvelope;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Issues commands to the co-processor.
///
/// Safe to share between threads; each call leases its own buffers.
#[derive(Debug)]
pub struct CommandChannel {
    context: Arc<ChannelContext>,
    arena: BufferArena,
}

impl CommandChannel {
    pub fn new(context: Arc<ChannelContext>) -> Self {
        let arena = BufferArena::new(context.max_buffer_size);
        Self { context, arena }
    }

    pub fn context(&self) -> &ChannelContext {
        &self.context
    }

    pub fn arena(&self) -> &BufferArena {
        &self.arena
    }

    /// Execute one command and return the full result buffer.
    ///
    /// # Arguments
    /// * `payload` - Encoded request, may be empty
    /// * `result_len` - Size of the result buffer handed to the co-processor
    /// * `blocking` - Wait for the co-processor to answer. With `false` the
    ///   result may be incomplete; that is the caller's concern.
    ///
    /// # Errors
    /// `CommandFailed` on a non-zero return code or a status other than
    /// `CompletedOk`; `InvalidRequest` for the `None` interface, a zero-length
    /// or oversized buffer.
    pub fn send(
        &self,
        interface: InterfaceId,
        function: impl Into<FunctionId>,
        payload: &[u8],
        result_len: usize,
        blocking: bool,
    ) -> ChannelResult<Vec<u8>> {
        let function = function.into();
        if interface == InterfaceId::None {
            return Err(ChannelError::InvalidRequest(format!(
                "function {} sent to the None interface",
                function
            )));
        }
        if result_len == 0 {
            return Err(ChannelError::InvalidRequest(format!(
                "{}/{} requested a zero-length result buffer",
                interface, function
            )));
        }

        let payload_buffer = self.arena.lease_copy(payload)?;
        let mut result_buffer = self.arena.lease(result_len)?;

        let mut envelope = CommandEnvelope {
            interface,
            function,
            status: 0,
            payload: &payload_buffer,
            result: &mut result_buffer,
            blocking,
        };
        trace!(%interface, %function, payload_len = payload.len(), result_len, blocking, "[CHANNEL] Sending command");
        let return_code = self.context.platform.execute(&mut envelope);
        let status = StatusCode::from(envelope.status);

        if return_code != 0 || !status.is_ok() {
            debug!(%interface, %function, %status, return_code, "[CHANNEL] Command failed");
            return Err(ChannelError::CommandFailed {
                interface,
                function,
                status,
                return_code,
            });
        }
        Ok(result_buffer.to_vec())
    }

    /// Compatibility form of [`CommandChannel::send`]: a failed command is
    /// logged and yields an empty result. Invalid requests still error.
    pub fn send_or_empty(
        &self,
        interface: InterfaceId,
        function: impl Into<FunctionId>,
        payload: &[u8],
        result_len: usize,
        blocking: bool,
    ) -> ChannelResult<Vec<u8>> {
        match self.send(interface, function, payload, result_len, blocking) {
            Err(error) if error.is_command_failure() => {
                warn!("[CHANNEL] {}; returning an empty result", error);
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// [`CommandChannel::send`] or [`CommandChannel::send_or_empty`],
    /// whichever the configuration selects.
    pub fn dispatch(
        &self,
        interface: InterfaceId,
        function: impl Into<FunctionId>,
        payload: &[u8],
        result_len: usize,
        blocking: bool,
    ) -> ChannelResult<Vec<u8>> {
        if self.context.empty_result_on_failure {
            self.send_or_empty(interface, function, payload, result_len, blocking)
        } else {
            self.send(interface, function, payload, result_len, blocking)
        }
    }

    /// Blocking request with a typed payload and response.
    pub fn request<Req: WireMessage, Resp: WireMessage>(
        &self,
        interface: InterfaceId,
        function: impl Into<FunctionId>,
        request: &Req,
    ) -> ChannelResult<Resp> {
        let result = self.send(
            interface,
            function,
            &request.encode(),
            self.context.default_result_buffer_size,
            true,
        )?;
        Ok(Resp::decode(&result, 0)?)
    }

    /// Blocking request without a payload.
    pub fn query<Resp: WireMessage>(&self, interface: InterfaceId, function: impl Into<FunctionId>) -> ChannelResult<Resp> {
        let result = self.send(interface, function, &[], self.context.default_result_buffer_size, true)?;
        Ok(Resp::decode(&result, 0)?)
    }

    /// Blocking command whose result carries nothing but the status.
    pub fn execute<Req: WireMessage>(
        &self,
        interface: InterfaceId,
        function: impl Into<FunctionId>,
        request: &Req,
    ) -> ChannelResult<()> {
        self.send(
            interface,
            function,
            &request.encode(),
            self.context.default_result_buffer_size,
            true,
        )?;
        Ok(())
    }
}
