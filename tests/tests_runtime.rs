//! Boot sequence tests: one configuration, one protocol probe, every service
//! wired to the same platform.

use async_trait::async_trait;
use mcu_shim::codec::messages::{ConnectEventData, DisconnectEventData, DisconnectReason, ErrorEventData};
use mcu_shim::codec::{ProtocolVersion, WireMessage};
use mcu_shim::config::ShimConfig;
use mcu_shim::hal::{
    CommandEnvelope, CoprocessorCall, CoprocessorPlatform, DeviceControl, GpioInterruptControl, HalError, HalResult,
    InterruptConfig, InterruptControlRequest, InterruptMode, NotificationQueue, NotificationQueueFactory, PinId,
    SystemError, SystemErrorHandler, GPIO_CONTROL_OK,
};
use mcu_shim::interrupts::InterruptError;
use mcu_shim::update::{
    ApplicationLifecycle, ConnectOptions, HttpClient, HttpResponse, PubSubClient, PubSubEvent, TransportError,
    UpdateEvent, UpdateMessage, UpdateState, UpdateStore,
};
use mcu_shim::{PlatformServices, RuntimeError, ShimRuntime, UpdateServices};
use parking_lot::Mutex;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc as async_mpsc;

//region Platform fakes

struct FakeCoprocessor {
    version: Option<u32>,
    calls: AtomicUsize,
}

impl CoprocessorCall for FakeCoprocessor {
    fn execute(&self, envelope: &mut CommandEnvelope<'_>) -> i32 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let connected = ConnectEventData {
            ip_address: [10, 0, 0, 7],
            subnet_mask: [255, 0, 0, 0],
            gateway: [10, 0, 0, 1],
            ssid: "workshop".into(),
            bssid: [0; 6],
            channel: 11,
            auth_mode: 3,
        }
        .encode();
        let count = connected.len().min(envelope.result.len());
        envelope.result[..count].copy_from_slice(&connected[..count]);
        envelope.status = 0;
        0
    }
}

impl CoprocessorPlatform for FakeCoprocessor {
    fn protocol_version(&self) -> Option<u32> {
        self.version
    }
}

struct AcceptingGpio;

impl GpioInterruptControl for AcceptingGpio {
    fn configure(&self, _request: &InterruptControlRequest) -> i32 {
        GPIO_CONTROL_OK
    }
}

struct IdleQueue {
    _keep_open: Receiver<()>,
}

impl NotificationQueue for IdleQueue {
    fn read_record(&mut self) -> HalResult<[u8; 2]> {
        std::thread::sleep(Duration::from_millis(20));
        Err(HalError::QueueRead("no records".to_string()))
    }
}

struct IdleQueues;

impl NotificationQueueFactory for IdleQueues {
    fn open_read_only(&self, _name: &str) -> HalResult<Box<dyn NotificationQueue>> {
        let (_sender, receiver) = mpsc::channel();
        Ok(Box::new(IdleQueue { _keep_open: receiver }))
    }
}

struct FakeDevice {
    resets: AtomicUsize,
}

impl DeviceControl for FakeDevice {
    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }

    fn unique_id(&self) -> String {
        "unit-7".to_string()
    }

    fn is_network_connected(&self) -> bool {
        true
    }
}

fn platform(version: Option<u32>) -> (PlatformServices, Arc<FakeDevice>, Arc<FakeCoprocessor>) {
    let device = Arc::new(FakeDevice {
        resets: AtomicUsize::new(0),
    });
    let coprocessor = Arc::new(FakeCoprocessor {
        version,
        calls: AtomicUsize::new(0),
    });
    let services = PlatformServices {
        coprocessor: coprocessor.clone(),
        gpio: Arc::new(AcceptingGpio),
        queues: Arc::new(IdleQueues),
        device: device.clone(),
    };
    (services, device, coprocessor)
}

//endregion

//region Update fakes

struct OfflineHttp;

#[async_trait]
impl HttpClient for OfflineHttp {
    async fn post_json(&self, _url: &str, _body: &serde_json::Value) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Request("offline".to_string()))
    }

    async fn download_to_file(&self, url: &str, _bearer: Option<&str>, _destination: &Path) -> Result<u64, TransportError> {
        Err(TransportError::Status {
            status: 503,
            url: url.to_string(),
        })
    }
}

struct LoopbackBroker {
    events: async_mpsc::Sender<PubSubEvent>,
    subscriptions: Mutex<Vec<String>>,
}

#[async_trait]
impl PubSubClient for LoopbackBroker {
    async fn connect(&self, _options: &ConnectOptions) -> Result<(), TransportError> {
        let _ = self.events.try_send(PubSubEvent::Connected);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.subscriptions.lock().push(topic.to_string());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

struct QuietApp;

#[async_trait]
impl ApplicationLifecycle for QuietApp {
    fn request_shutdown(&self) {}

    async fn wait_for_shutdown(&self) {}
}

fn update_services() -> (UpdateServices, Arc<LoopbackBroker>) {
    let (sender, receiver) = async_mpsc::channel(8);
    let broker = Arc::new(LoopbackBroker {
        events: sender,
        subscriptions: Mutex::new(Vec::new()),
    });
    let services = UpdateServices {
        http: Arc::new(OfflineHttp),
        pubsub: broker.clone(),
        broker_events: receiver,
        lifecycle: Arc::new(QuietApp),
        keys: None,
    };
    (services, broker)
}

fn update_config(root: &Path) -> ShimConfig {
    let mut config = ShimConfig::default();
    config.update.enabled = true;
    config.update.update_server = "broker.local".to_string();
    config.update.root_directory = root.to_path_buf();
    config.update.idle_poll_ms = 10;
    config.update.connect_retry_seconds = 0;
    config
}

//endregion

#[test]
fn test_protocol_version_probed_once_at_boot() {
    let (services, _, _) = platform(Some(1));
    let runtime = ShimRuntime::boot(ShimConfig::default(), services, None).unwrap();
    assert_eq!(runtime.channel().context().protocol_version, ProtocolVersion(1));
    assert!(runtime.update_service().is_none());

    let mut config = ShimConfig::default();
    config.coprocessor.protocol_version = Some(0);
    let (services, _, _) = platform(Some(1));
    let pinned = ShimRuntime::boot(config, services, None).unwrap();
    assert_eq!(pinned.channel().context().protocol_version, ProtocolVersion::LEGACY);

    let event = DisconnectEventData {
        ssid: "workshop".into(),
        bssid: [1; 6],
        rssi: -70,
        reason: DisconnectReason::AuthExpire,
    };
    assert_eq!(
        runtime.wifi().handle_disconnect_event(&event.encode()).unwrap().reason,
        DisconnectReason::AuthExpire
    );
    assert_eq!(
        pinned.wifi().handle_disconnect_event(&event.encode()).unwrap().reason,
        DisconnectReason::Unspecified
    );
}

#[test]
fn test_wifi_uses_platform_channel() {
    let (services, _, coprocessor) = platform(None);
    let runtime = ShimRuntime::boot(ShimConfig::default(), services, None).unwrap();

    runtime.wifi().start_network("workshop", "secret", true).unwrap();

    assert_eq!(coprocessor.calls.load(Ordering::SeqCst), 1);
    assert_eq!(runtime.wifi().ip_address(), Ipv4Addr::new(10, 0, 0, 7));
    assert_eq!(runtime.channel().arena().outstanding(), 0);
}

#[test]
fn test_interrupts_share_one_manager() {
    let (services, _, _) = platform(None);
    let runtime = ShimRuntime::boot(ShimConfig::default(), services, None).unwrap();
    let rising = InterruptConfig::new(InterruptMode::Rising);

    runtime
        .interrupts()
        .wire_interrupt(PinId::new(0, 4), rising, Arc::new(|_| {}))
        .unwrap();
    let conflict = runtime
        .interrupts()
        .wire_interrupt(PinId::new(3, 4), rising, Arc::new(|_| {}));

    assert!(matches!(conflict, Err(InterruptError::GroupInUse { group: 4, .. })));
    runtime.shutdown();
}

#[test]
fn test_system_errors_reset_through_device() {
    struct AlwaysReset;
    impl SystemErrorHandler for AlwaysReset {
        fn handle(&self, _error: &SystemError) -> bool {
            true
        }
    }

    let (services, device, _) = platform(None);
    let runtime = ShimRuntime::boot(ShimConfig::default(), services, None).unwrap();
    let fault = SystemError {
        code: 0x21,
        component: 2,
        message: "radio watchdog".to_string(),
        recommend_reset: false,
    };

    assert!(!runtime.system_errors().report(fault));
    assert!(runtime.system_errors().attach_handler(Arc::new(AlwaysReset)));
    assert_eq!(device.resets.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unhandled_error_event_resets_at_finish_boot() {
    let (services, device, _) = platform(None);
    let runtime = ShimRuntime::boot(ShimConfig::default(), services, None).unwrap();
    let event = ErrorEventData {
        error_code: 0x13,
        component: 1,
        message: "radio firmware crashed".to_string(),
    };

    assert!(!runtime.system_errors().report_event(&event.encode(), true).unwrap());
    assert_eq!(device.resets.load(Ordering::SeqCst), 0);

    assert!(runtime.finish_boot());
    assert_eq!(device.resets.load(Ordering::SeqCst), 1);
}

#[test]
fn test_finish_boot_without_recommendation_keeps_running() {
    let (services, device, _) = platform(None);
    let runtime = ShimRuntime::boot(ShimConfig::default(), services, None).unwrap();
    let event = ErrorEventData {
        error_code: 0x02,
        component: 3,
        message: "rtc drift".to_string(),
    };
    runtime.system_errors().report_event(&event.encode(), false).unwrap();

    assert!(!runtime.finish_boot());
    assert_eq!(device.resets.load(Ordering::SeqCst), 0);
}

#[test]
fn test_updates_enabled_without_transports() {
    let dir = TempDir::new().unwrap();
    let (services, _, _) = platform(None);
    let result = ShimRuntime::boot(update_config(dir.path()), services, None);
    assert!(matches!(result, Err(RuntimeError::MissingUpdateServices)));
}

#[tokio::test]
async fn test_start_updates_completes_pending_apply_first() {
    let dir = TempDir::new().unwrap();
    {
        let store = UpdateStore::open(dir.path()).unwrap();
        store
            .add(&UpdateMessage::new("u5", "files.local/u5.mpak", ""))
            .unwrap();
        std::fs::write(store.archive_path("u5"), b"archive").unwrap();
        store.set_retrieved("u5").unwrap();
        store.mark_apply_pending("u5").unwrap();
    }

    let (services, _, _) = platform(None);
    let (updates, broker) = update_services();
    let runtime = ShimRuntime::boot(update_config(dir.path()), services, Some(updates)).unwrap();
    let service = runtime.update_service().unwrap().clone();
    let mut events = service.subscribe_events();

    let handle = runtime.start_updates().unwrap().unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first, UpdateEvent::Success("u5".to_string()));
    assert!(service.store().try_get_message("u5").unwrap().applied);

    tokio::time::timeout(Duration::from_secs(5), async {
        while service.state() != UpdateState::Idle {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(*broker.subscriptions.lock(), vec!["unit-7/updates"]);

    runtime.shutdown();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
