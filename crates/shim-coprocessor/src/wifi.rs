// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Station-mode WiFi on top of the command channel.

use crate::{ChannelError, ChannelResult, CommandChannel};
use parking_lot::RwLock;
use shim_codec::messages::{
    AccessPoint, ConnectEventData, DisconnectEventData, ScanRequest, ScanResponse, SystemConfiguration,
    WiFiCredentials, CONNECT_RESULT_GATEWAY_OFFSET, CONNECT_RESULT_IP_OFFSET, CONNECT_RESULT_SUBNET_OFFSET,
};
use shim_codec::{CodecError, InterfaceId, SystemFunction, WiFiFunction, WireMessage};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{info, warn};

/// Connection state as last reported by the co-processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiFiState {
    pub connected: bool,
    pub ip_address: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub ssid: Option<String>,
    pub last_disconnect: Option<DisconnectEventData>,
}

impl Default for WiFiState {
    fn default() -> Self {
        Self {
            connected: false,
            ip_address: Ipv4Addr::UNSPECIFIED,
            subnet_mask: Ipv4Addr::UNSPECIFIED,
            gateway: Ipv4Addr::UNSPECIFIED,
            ssid: None,
            last_disconnect: None,
        }
    }
}

impl WiFiState {
    fn mark_disconnected(&mut self) {
        self.connected = false;
        self.ip_address = Ipv4Addr::UNSPECIFIED;
        self.subnet_mask = Ipv4Addr::UNSPECIFIED;
        self.gateway = Ipv4Addr::UNSPECIFIED;
        self.ssid = None;
    }
}

pub struct WiFiAdapter {
    channel: Arc<CommandChannel>,
    state: RwLock<WiFiState>,
}

impl WiFiAdapter {
    pub fn new(channel: Arc<CommandChannel>) -> Self {
        Self {
            channel,
            state: RwLock::new(WiFiState::default()),
        }
    }

    /// Connect to an access point.
    ///
    /// Addresses are populated all-or-nothing: on any failure all three are
    /// zeroed and the adapter is marked disconnected.
    pub fn start_network(&self, ssid: &str, password: &str, reconnect: bool) -> ChannelResult<()> {
        let credentials = WiFiCredentials {
            ssid: ssid.into(),
            password: password.to_string(),
            reconnect: u8::from(reconnect),
        };
        let result = self
            .channel
            .send(
                InterfaceId::WiFi,
                WiFiFunction::ConnectToAccessPoint,
                &credentials.encode(),
                self.channel.context().default_result_buffer_size,
                true,
            )
            .and_then(|result| parse_address_triple(&result));

        let mut state = self.state.write();
        match result {
            Ok((ip_address, subnet_mask, gateway)) => {
                state.connected = true;
                state.ip_address = ip_address;
                state.subnet_mask = subnet_mask;
                state.gateway = gateway;
                state.ssid = Some(credentials.ssid.to_string());
                info!(%ip_address, %gateway, "[WIFI] Connected to {}", credentials.ssid);
                Ok(())
            }
            Err(error) => {
                state.mark_disconnected();
                warn!("[WIFI] Failed to connect to {}: {}", credentials.ssid, error);
                Err(error)
            }
        }
    }

    pub fn stop_network(&self) -> ChannelResult<()> {
        self.channel.send(
            InterfaceId::WiFi,
            WiFiFunction::DisconnectFromAccessPoint,
            &[],
            self.channel.context().default_result_buffer_size,
            true,
        )?;
        self.state.write().mark_disconnected();
        info!("[WIFI] Disconnected");
        Ok(())
    }

    pub fn scan(&self, request: &ScanRequest) -> ChannelResult<Vec<AccessPoint>> {
        let response: ScanResponse = self
            .channel
            .request(InterfaceId::WiFi, WiFiFunction::StartScan, request)?;
        Ok(response.access_points)
    }

    /// Co-processor configuration block.
    pub fn configuration(&self) -> ChannelResult<SystemConfiguration> {
        self.channel.query(InterfaceId::System, SystemFunction::GetConfiguration)
    }

    /// Apply a connect event raised by the co-processor (e.g. after an automatic reconnect).
    pub fn handle_connect_event(&self, payload: &[u8]) -> ChannelResult<ConnectEventData> {
        let event = ConnectEventData::decode(payload, 0)?;
        let mut state = self.state.write();
        state.connected = true;
        state.ip_address = Ipv4Addr::from(event.ip_address);
        state.subnet_mask = Ipv4Addr::from(event.subnet_mask);
        state.gateway = Ipv4Addr::from(event.gateway);
        state.ssid = Some(event.ssid.to_string());
        info!(ip_address = %state.ip_address, "[WIFI] Connect event for {}", event.ssid);
        Ok(event)
    }

    /// Apply a disconnect event. The payload layout depends on the protocol
    /// version resolved at startup.
    pub fn handle_disconnect_event(&self, payload: &[u8]) -> ChannelResult<DisconnectEventData> {
        let version = self.channel.context().protocol_version;
        let event = DisconnectEventData::decode_versioned(payload, 0, version)?;
        let mut state = self.state.write();
        state.mark_disconnected();
        state.last_disconnect = Some(event.clone());
        warn!(reason = %event.reason, rssi = event.rssi, "[WIFI] Disconnected from '{}'", event.ssid);
        Ok(event)
    }

    pub fn is_connected(&self) -> bool {
        self.state.read().connected
    }

    pub fn ip_address(&self) -> Ipv4Addr {
        self.state.read().ip_address
    }

    pub fn subnet_mask(&self) -> Ipv4Addr {
        self.state.read().subnet_mask
    }

    pub fn gateway(&self) -> Ipv4Addr {
        self.state.read().gateway
    }

    pub fn state(&self) -> WiFiState {
        self.state.read().clone()
    }
}

fn parse_address_triple(result: &[u8]) -> ChannelResult<(Ipv4Addr, Ipv4Addr, Ipv4Addr)> {
    let read = |offset: usize| -> ChannelResult<Ipv4Addr> {
        let bytes: [u8; 4] = result
            .get(offset..offset + 4)
            .and_then(|slice| slice.try_into().ok())
            .ok_or_else(|| {
                ChannelError::Codec(CodecError::MalformedMessage {
                    message_type: "ConnectResult",
                    offset,
                    reason: format!("result of {} bytes has no address at this offset", result.len()),
                })
            })?;
        Ok(Ipv4Addr::from(bytes))
    };
    Ok((
        read(CONNECT_RESULT_IP_OFFSET)?,
        read(CONNECT_RESULT_SUBNET_OFFSET)?,
        read(CONNECT_RESULT_GATEWAY_OFFSET)?,
    ))
}
