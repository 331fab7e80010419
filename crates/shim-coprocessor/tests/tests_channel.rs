//! Tests for the co-processor command channel and the WiFi adapter
//!
//! A scripted fake platform stands in for the native co-processor call.

use parking_lot::Mutex;
use shim_codec::messages::{
    AccessPoint, ConnectEventData, DisconnectEventData, DisconnectReason, ScanRequest, ScanResponse, U32Payload,
    WiFiCredentials,
};
use shim_codec::{FunctionId, InterfaceId, ProtocolVersion, StatusCode, SystemFunction, WiFiFunction, WireMessage};
use shim_config::CoprocessorConfig;
use shim_coprocessor::{ChannelContext, ChannelError, CommandChannel, WiFiAdapter};
use shim_hal::{CommandEnvelope, CoprocessorCall, CoprocessorPlatform};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// One scripted reply: return code, status and bytes copied into the result.
struct Reply {
    return_code: i32,
    status: u32,
    result: Vec<u8>,
    panic: bool,
}

impl Reply {
    fn ok(result: Vec<u8>) -> Self {
        Self {
            return_code: 0,
            status: 0,
            result,
            panic: false,
        }
    }

    fn status(status: u32) -> Self {
        Self {
            return_code: 0,
            status,
            result: Vec::new(),
            panic: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Recorded {
    interface: InterfaceId,
    function: FunctionId,
    payload: Vec<u8>,
    result_len: usize,
    blocking: bool,
}

#[derive(Default)]
struct FakePlatform {
    version: Option<u32>,
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Recorded>>,
}

impl FakePlatform {
    fn with_replies(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            version: Some(1),
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }
}

impl CoprocessorCall for FakePlatform {
    fn execute(&self, envelope: &mut CommandEnvelope<'_>) -> i32 {
        self.calls.lock().push(Recorded {
            interface: envelope.interface,
            function: envelope.function,
            payload: envelope.payload.to_vec(),
            result_len: envelope.result.len(),
            blocking: envelope.blocking,
        });
        let reply = self.replies.lock().pop_front().unwrap_or_else(|| Reply::ok(Vec::new()));
        if reply.panic {
            panic!("platform fault");
        }
        let count = reply.result.len().min(envelope.result.len());
        envelope.result[..count].copy_from_slice(&reply.result[..count]);
        envelope.status = reply.status;
        reply.return_code
    }
}

impl CoprocessorPlatform for FakePlatform {
    fn protocol_version(&self) -> Option<u32> {
        self.version
    }
}

fn channel_for(platform: Arc<FakePlatform>, config: CoprocessorConfig) -> Arc<CommandChannel> {
    let context = ChannelContext::new(platform, &config);
    Arc::new(CommandChannel::new(Arc::new(context)))
}

fn small_config() -> CoprocessorConfig {
    CoprocessorConfig {
        default_result_buffer_size: 64,
        max_buffer_size: 256,
        protocol_version: None,
        empty_result_on_failure: false,
    }
}

//region Channel

#[test]
fn test_send_passes_envelope_and_returns_result() {
    let platform = FakePlatform::with_replies(vec![Reply::ok(vec![7, 0, 0, 0])]);
    let channel = channel_for(platform.clone(), small_config());

    let result = channel
        .send(InterfaceId::System, SystemFunction::GetProtocolVersion, b"hi", 16, false)
        .unwrap();

    assert_eq!(result.len(), 16);
    assert_eq!(&result[..4], &[7, 0, 0, 0]);
    let calls = platform.calls.lock();
    assert_eq!(calls[0].interface, InterfaceId::System);
    assert_eq!(calls[0].function, FunctionId(6));
    assert_eq!(calls[0].payload, b"hi");
    assert_eq!(calls[0].result_len, 16);
    assert!(!calls[0].blocking);
    assert_eq!(channel.arena().outstanding(), 0);
}

#[test]
fn test_failure_status_is_command_failed() {
    let platform = FakePlatform::with_replies(vec![Reply::status(6)]);
    let channel = channel_for(platform, small_config());

    let error = channel
        .send(InterfaceId::WiFi, WiFiFunction::GetRssi, &[], 8, true)
        .unwrap_err();

    match error {
        ChannelError::CommandFailed {
            interface,
            function,
            status,
            return_code,
        } => {
            assert_eq!(interface, InterfaceId::WiFi);
            assert_eq!(function, FunctionId::from(WiFiFunction::GetRssi));
            assert_eq!(status, StatusCode::Timeout);
            assert_eq!(return_code, 0);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(channel.arena().outstanding(), 0);
}

#[test]
fn test_nonzero_return_code_is_command_failed() {
    let platform = FakePlatform::with_replies(vec![Reply {
        return_code: -5,
        status: 0,
        result: Vec::new(),
        panic: false,
    }]);
    let channel = channel_for(platform, small_config());
    let error = channel.send(InterfaceId::Rtc, FunctionId(1), &[], 8, true).unwrap_err();
    assert!(matches!(error, ChannelError::CommandFailed { return_code: -5, .. }));
}

#[test]
fn test_compatibility_mode_returns_empty() {
    let platform = FakePlatform::with_replies(vec![Reply::status(8), Reply::status(8)]);
    let mut config = small_config();
    config.empty_result_on_failure = true;
    let channel = channel_for(platform, config);

    assert!(channel
        .send_or_empty(InterfaceId::WiFi, WiFiFunction::GetRssi, &[], 8, true)
        .unwrap()
        .is_empty());
    assert!(channel
        .dispatch(InterfaceId::WiFi, WiFiFunction::GetRssi, &[], 8, true)
        .unwrap()
        .is_empty());
}

#[test]
fn test_invalid_requests() {
    let platform = FakePlatform::with_replies(vec![]);
    let channel = channel_for(platform.clone(), small_config());

    assert!(matches!(
        channel.send(InterfaceId::None, FunctionId(1), &[], 8, true),
        Err(ChannelError::InvalidRequest(_))
    ));
    assert!(matches!(
        channel.send(InterfaceId::System, FunctionId(1), &[], 0, true),
        Err(ChannelError::InvalidRequest(_))
    ));
    assert!(matches!(
        channel.send(InterfaceId::System, FunctionId(1), &[0; 300], 8, true),
        Err(ChannelError::InvalidRequest(_))
    ));
    // Compatibility mode does not hide programming errors.
    assert!(channel.send_or_empty(InterfaceId::None, FunctionId(1), &[], 8, true).is_err());
    assert!(platform.calls.lock().is_empty());
    assert_eq!(channel.arena().outstanding(), 0);
}

#[test]
fn test_buffers_released_when_platform_panics() {
    let platform = FakePlatform::with_replies(vec![Reply {
        return_code: 0,
        status: 0,
        result: Vec::new(),
        panic: true,
    }]);
    let channel = channel_for(platform, small_config());
    let shared = Arc::clone(&channel);

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(move || {
        let _ = shared.send(InterfaceId::System, FunctionId(1), b"payload", 32, true);
    }));

    assert!(outcome.is_err());
    assert_eq!(channel.arena().outstanding(), 0);
}

#[test]
fn test_typed_request() {
    let response = ScanResponse {
        access_points: vec![AccessPoint {
            ssid: "lab".into(),
            bssid: [1; 6],
            rssi: -40,
            channel: 6,
            auth_mode: 3,
        }],
    };
    let platform = FakePlatform::with_replies(vec![Reply::ok(response.encode())]);
    let channel = channel_for(platform.clone(), small_config());
    let request = ScanRequest {
        max_results: 10,
        show_hidden: false,
        channel: 0,
    };

    let decoded: ScanResponse = channel
        .request(InterfaceId::WiFi, WiFiFunction::StartScan, &request)
        .unwrap();

    assert_eq!(decoded, response);
    assert_eq!(platform.calls.lock()[0].payload, request.encode());
    assert_eq!(platform.calls.lock()[0].result_len, 64);
}

#[test]
fn test_typed_execute_propagates_failure() {
    let platform = FakePlatform::with_replies(vec![Reply::status(4)]);
    let channel = channel_for(platform, small_config());
    let error = channel
        .execute(InterfaceId::System, SystemFunction::SetDebugLevel, &U32Payload { value: 3 })
        .unwrap_err();
    assert!(error.is_command_failure());
}

#[test]
fn test_configured_version_skips_probe() {
    let platform = FakePlatform::with_replies(vec![]);
    let mut config = small_config();
    config.protocol_version = Some(0);
    let channel = channel_for(platform, config);
    assert_eq!(channel.context().protocol_version, ProtocolVersion::LEGACY);
}

//endregion

//region WiFi adapter

fn connect_result() -> Vec<u8> {
    ConnectEventData {
        ip_address: [192, 168, 4, 20],
        subnet_mask: [255, 255, 255, 0],
        gateway: [192, 168, 4, 1],
        ssid: "lab".into(),
        bssid: [2; 6],
        channel: 1,
        auth_mode: 3,
    }
    .encode()
}

#[test]
fn test_start_network_populates_addresses() {
    let platform = FakePlatform::with_replies(vec![Reply::ok(connect_result())]);
    let adapter = WiFiAdapter::new(channel_for(platform.clone(), small_config()));

    adapter.start_network("lab", "secret", true).unwrap();

    assert!(adapter.is_connected());
    assert_eq!(adapter.ip_address(), Ipv4Addr::new(192, 168, 4, 20));
    assert_eq!(adapter.subnet_mask(), Ipv4Addr::new(255, 255, 255, 0));
    assert_eq!(adapter.gateway(), Ipv4Addr::new(192, 168, 4, 1));

    let sent = WiFiCredentials::decode(&platform.calls.lock()[0].payload, 0).unwrap();
    assert_eq!(sent.ssid.to_string(), "lab");
    assert_eq!(sent.password, "secret");
    assert_eq!(sent.reconnect, 1);
}

#[test]
fn test_start_network_failure_clears_everything() {
    let platform = FakePlatform::with_replies(vec![Reply::ok(connect_result()), Reply::status(7)]);
    let adapter = WiFiAdapter::new(channel_for(platform, small_config()));
    adapter.start_network("lab", "secret", false).unwrap();

    assert!(adapter.start_network("other", "wrong", false).is_err());

    let state = adapter.state();
    assert!(!state.connected);
    assert_eq!(state.ip_address, Ipv4Addr::UNSPECIFIED);
    assert_eq!(state.subnet_mask, Ipv4Addr::UNSPECIFIED);
    assert_eq!(state.gateway, Ipv4Addr::UNSPECIFIED);
}

#[test]
fn test_start_network_short_result_is_not_partial_success() {
    let mut config = small_config();
    config.default_result_buffer_size = 6;
    let platform = FakePlatform::with_replies(vec![Reply::ok(vec![10, 0, 0, 2, 255, 255])]);
    let adapter = WiFiAdapter::new(channel_for(platform, config));

    let error = adapter.start_network("lab", "secret", false).unwrap_err();

    assert!(matches!(error, ChannelError::Codec(_)));
    assert!(!adapter.is_connected());
    assert_eq!(adapter.ip_address(), Ipv4Addr::UNSPECIFIED);
}

#[test]
fn test_disconnect_event_uses_context_version() {
    let event = DisconnectEventData {
        ssid: "lab".into(),
        bssid: [3; 6],
        rssi: -80,
        reason: DisconnectReason::BeaconTimeout,
    };

    let modern = FakePlatform::with_replies(vec![Reply::ok(connect_result())]);
    let adapter = WiFiAdapter::new(channel_for(modern, small_config()));
    adapter.start_network("lab", "secret", false).unwrap();
    let decoded = adapter.handle_disconnect_event(&event.encode()).unwrap();
    assert_eq!(decoded, event);
    assert!(!adapter.is_connected());
    assert_eq!(adapter.state().last_disconnect, Some(event.clone()));

    let mut legacy_config = small_config();
    legacy_config.protocol_version = Some(0);
    let legacy = WiFiAdapter::new(channel_for(FakePlatform::with_replies(vec![]), legacy_config));
    let decoded = legacy.handle_disconnect_event(&[]).unwrap();
    assert_eq!(decoded.reason, DisconnectReason::Unspecified);
}

#[test]
fn test_connect_event_updates_state() {
    let adapter = WiFiAdapter::new(channel_for(FakePlatform::with_replies(vec![]), small_config()));
    let event = adapter.handle_connect_event(&connect_result()).unwrap();
    assert_eq!(event.channel, 1);
    assert!(adapter.is_connected());
    assert_eq!(adapter.gateway(), Ipv4Addr::new(192, 168, 4, 1));
}

#[test]
fn test_stop_network() {
    let platform = FakePlatform::with_replies(vec![Reply::ok(connect_result()), Reply::ok(Vec::new())]);
    let adapter = WiFiAdapter::new(channel_for(platform.clone(), small_config()));
    adapter.start_network("lab", "secret", false).unwrap();
    adapter.stop_network().unwrap();
    assert!(!adapter.is_connected());
    assert_eq!(
        platform.calls.lock()[1].function,
        FunctionId::from(WiFiFunction::DisconnectFromAccessPoint)
    );
}

//endregion
