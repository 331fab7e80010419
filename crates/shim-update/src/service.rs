// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The update state machine.
//!
//! ```text
//! Disconnected -> Authenticating -> Connecting -> Connected -> Idle
//!                 (auth only)                                 Idle <-> DownloadingFile
//!                                                             Idle <-> UpdateInProgress
//! any connect/subscribe failure -> Disconnected;  stop() -> Dead
//! ```
//! Downloads and applies are started by the application through
//! [`UpdateService::retrieve_update`] and [`UpdateService::apply_update`].
//! Applying ends in a device reset; the record is marked applied on the next
//! boot by [`UpdateService::resume_after_boot`].

use crate::archive::{extract_archive, has_payload, sha256_file};
use crate::auth::{Authenticator, DeviceKeyProvider};
use crate::transport::{normalize_url, ConnectOptions, HttpClient, PubSubClient, PubSubEvent};
use crate::{ApplicationLifecycle, AuthError, UpdateError, UpdateMessage, UpdateResult, UpdateStore};
use parking_lot::{Mutex, RwLock};
use shim_config::{HashMismatchPolicy, UpdateConfig};
use shim_hal::DeviceControl;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, trace, warn};

/// Longest wait for the broker to acknowledge a connection.
const CONNECT_ACK_TIMEOUT: Duration = Duration::from_secs(10);

const EVENT_CAPACITY: usize = 32;

/// Token in topic names replaced by the device id.
pub const DEVICE_ID_TOKEN: &str = "{ID}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateState {
    Disconnected,
    Authenticating,
    Connecting,
    Connected,
    Idle,
    DownloadingFile,
    UpdateInProgress,
    Dead,
}

impl Display for UpdateState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Notifications for the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    Available(UpdateMessage),
    Retrieved(String),
    Success(String),
    Failure { id: String, reason: String },
}

/// Platform and network collaborators of an [`UpdateService`].
#[derive(Clone)]
pub struct UpdateCollaborators {
    pub device: Arc<dyn DeviceControl>,
    pub http: Arc<dyn HttpClient>,
    pub pubsub: Arc<dyn PubSubClient>,
    pub lifecycle: Arc<dyn ApplicationLifecycle>,
    /// Required when authentication is enabled.
    pub keys: Option<Arc<dyn DeviceKeyProvider>>,
}

pub struct UpdateService {
    config: UpdateConfig,
    store: Arc<UpdateStore>,
    device: Arc<dyn DeviceControl>,
    http: Arc<dyn HttpClient>,
    pubsub: Arc<dyn PubSubClient>,
    lifecycle: Arc<dyn ApplicationLifecycle>,
    authenticator: Option<Authenticator>,
    device_id: String,
    state: RwLock<UpdateState>,
    token: RwLock<Option<String>>,
    link_lost: AtomicBool,
    broker_events: Mutex<Option<mpsc::Receiver<PubSubEvent>>>,
    notifications: broadcast::Sender<UpdateEvent>,
    stopped: AtomicBool,
}

impl UpdateService {
    /// # Arguments
    /// * `broker_events` - Receiving end of the channel the pub/sub client
    ///   reports connection changes and messages on
    ///
    /// # Errors
    /// [`UpdateError::Configuration`] if authentication is enabled without a
    /// key provider
    pub fn new(
        config: UpdateConfig,
        store: Arc<UpdateStore>,
        collaborators: UpdateCollaborators,
        broker_events: mpsc::Receiver<PubSubEvent>,
    ) -> UpdateResult<Self> {
        let authenticator = if config.use_authentication {
            let keys = collaborators.keys.clone().ok_or_else(|| {
                UpdateError::Configuration("authentication is enabled but no device key provider was given".to_string())
            })?;
            Some(Authenticator::new(
                Arc::clone(&collaborators.http),
                keys,
                &config.auth_server,
                config.auth_port,
            ))
        } else {
            None
        };
        let (notifications, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            device_id: collaborators.device.unique_id(),
            config,
            store,
            device: collaborators.device,
            http: collaborators.http,
            pubsub: collaborators.pubsub,
            lifecycle: collaborators.lifecycle,
            authenticator,
            state: RwLock::new(UpdateState::Disconnected),
            token: RwLock::new(None),
            link_lost: AtomicBool::new(false),
            broker_events: Mutex::new(Some(broker_events)),
            notifications,
            stopped: AtomicBool::new(false),
        })
    }

    pub fn state(&self) -> UpdateState {
        *self.state.read()
    }

    pub fn store(&self) -> &Arc<UpdateStore> {
        &self.store
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<UpdateEvent> {
        self.notifications.subscribe()
    }

    /// Topics with the device id substituted.
    pub fn topics(&self) -> Vec<String> {
        self.config
            .topics
            .iter()
            .map(|topic| topic.replace(DEVICE_ID_TOKEN, &self.device_id))
            .collect()
    }

    /// Ask [`UpdateService::run`] to return. Observed once per loop
    /// iteration; an attempt in flight completes first.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        debug!("[UPDATE] Stop requested");
    }

    /// Drive the state machine until [`UpdateService::stop`].
    ///
    /// # Errors
    /// [`UpdateError::Configuration`] if the loop is already running or has run
    pub async fn run(&self) -> UpdateResult<()> {
        let events = self.broker_events.lock().take();
        let Some(mut events) = events else {
            return Err(UpdateError::Configuration("update service loop already started".to_string()));
        };
        info!("[UPDATE] Service started for device {}", self.device_id);

        let mut options: Option<ConnectOptions> = None;
        while !self.stopped.load(Ordering::Acquire) {
            match self.state() {
                UpdateState::Disconnected => {
                    let next = if self.authenticator.is_some() {
                        UpdateState::Authenticating
                    } else {
                        UpdateState::Connecting
                    };
                    self.set_state(next);
                }
                UpdateState::Authenticating => self.authenticate(&mut options).await,
                UpdateState::Connecting => self.connect(&mut events, &mut options).await,
                UpdateState::Connected => self.subscribe().await,
                UpdateState::Idle | UpdateState::DownloadingFile | UpdateState::UpdateInProgress => {
                    self.wait_for_event(&mut events).await
                }
                UpdateState::Dead => break,
            }
        }

        self.set_state(UpdateState::Dead);
        if let Err(e) = self.pubsub.disconnect().await {
            debug!("[UPDATE] Disconnect on stop failed: {}", e);
        }
        info!("[UPDATE] Service stopped");
        Ok(())
    }

    /// Download an announced update into the store and verify its hash.
    ///
    /// A failed download raises [`UpdateEvent::Failure`] only when
    /// `report_download_failures` is set. A hash mismatch is logged; under
    /// [`HashMismatchPolicy::Reject`] it also discards the archive, fails the
    /// call and raises [`UpdateEvent::Failure`].
    pub async fn retrieve_update(&self, id: &str) -> UpdateResult<()> {
        let message = self
            .store
            .try_get_message(id)
            .ok_or_else(|| UpdateError::UnknownUpdate(id.to_string()))?;

        let previous = self.enter(UpdateState::DownloadingFile);
        let started = Instant::now();
        let result = self.download(&message).await;
        self.leave(UpdateState::DownloadingFile, previous);

        match &result {
            Ok(()) => {
                info!(update_id = id, elapsed = ?started.elapsed(), "[UPDATE] Update retrieved");
                self.notify(UpdateEvent::Retrieved(id.to_string()));
            }
            Err(e) => {
                error!(update_id = id, "[UPDATE] Download failed after {:?}: {}", started.elapsed(), e);
                if self.config.report_download_failures || matches!(e, UpdateError::HashMismatch { .. }) {
                    self.notify(UpdateEvent::Failure {
                        id: id.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        result
    }

    /// Extract a retrieved update, shut the application down and reset.
    ///
    /// On hardware the reset does not return. The apply marker written before
    /// the reset lets [`UpdateService::resume_after_boot`] finish the job.
    pub async fn apply_update(&self, id: &str) -> UpdateResult<()> {
        let message = self
            .store
            .try_get_message(id)
            .ok_or_else(|| UpdateError::UnknownUpdate(id.to_string()))?;
        if !message.retrieved {
            return Err(UpdateError::NotRetrieved(id.to_string()));
        }

        let previous = self.enter(UpdateState::UpdateInProgress);
        match self.stage(&message).await {
            Ok(entries) => info!(update_id = id, entries, "[UPDATE] Update staged"),
            Err(e) => {
                error!(update_id = id, "[UPDATE] Update failed: {}", e);
                self.leave(UpdateState::UpdateInProgress, previous);
                self.notify(UpdateEvent::Failure {
                    id: id.to_string(),
                    reason: e.to_string(),
                });
                return Err(e);
            }
        }

        let shutdown_timeout = self.config.shutdown_timeout();
        self.lifecycle.request_shutdown();
        if timeout(shutdown_timeout, self.lifecycle.wait_for_shutdown()).await.is_err() {
            warn!("[UPDATE] Application did not shut down within {:?}", shutdown_timeout);
        }
        warn!(update_id = id, "[UPDATE] Resetting device to apply update");
        self.device.reset();
        Ok(())
    }

    /// Finish an apply interrupted by the device reset: mark the update
    /// applied, delete its archive and raise [`UpdateEvent::Success`].
    ///
    /// Call once at boot before [`UpdateService::run`]. The apply marker is
    /// only removed once the record is updated, so a failed attempt is
    /// retried on the next call. A marker naming an unknown update is
    /// discarded.
    ///
    /// # Returns
    /// The id of the update that was completed, if any
    pub fn resume_after_boot(&self) -> UpdateResult<Option<String>> {
        let Some(id) = self.store.peek_apply_pending()? else {
            return Ok(None);
        };
        match self.store.set_applied(&id) {
            Ok(()) => {
                self.store.clear_apply_pending()?;
                info!(update_id = %id, "[UPDATE] Update applied");
                self.notify(UpdateEvent::Success(id.clone()));
                Ok(Some(id))
            }
            Err(e) => {
                if matches!(e, UpdateError::UnknownUpdate(_)) {
                    warn!(update_id = %id, "[UPDATE] Apply marker names an unknown update, discarding it");
                    self.store.clear_apply_pending()?;
                } else {
                    error!(update_id = %id, "[UPDATE] Could not record the applied update, will retry: {}", e);
                }
                self.notify(UpdateEvent::Failure {
                    id,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    //region State loop steps

    async fn authenticate(&self, options: &mut Option<ConnectOptions>) {
        let Some(authenticator) = &self.authenticator else {
            self.set_state(UpdateState::Connecting);
            return;
        };
        let delay = self.config.auth_retry_delay();
        match authenticator.login(&self.device_id).await {
            Ok(token) => {
                *self.token.write() = Some(token);
                *options = None;
                self.set_state(UpdateState::Connecting);
            }
            Err(AuthError::NeedsReprovisioning) => {
                error!("[UPDATE] Device needs re-provisioning; retrying login in {:?}", delay);
                sleep(delay).await;
            }
            Err(e) => {
                warn!("[UPDATE] Login failed, retrying in {:?}: {}", delay, e);
                sleep(delay).await;
            }
        }
    }

    async fn connect(&self, events: &mut mpsc::Receiver<PubSubEvent>, options: &mut Option<ConnectOptions>) {
        if !self.device.is_network_connected() {
            trace!("[UPDATE] Waiting for the network link");
            sleep(self.config.idle_poll_interval()).await;
            return;
        }
        let options = options.get_or_insert_with(|| self.connect_options()).clone();
        let delay = self.config.connect_retry_delay();

        if let Err(e) = self.pubsub.connect(&options).await {
            warn!("[UPDATE] Connecting to {}:{} failed: {}", options.host, options.port, e);
            self.set_state(UpdateState::Disconnected);
            sleep(delay).await;
            return;
        }
        match timeout(CONNECT_ACK_TIMEOUT, self.await_connected(events)).await {
            Ok(true) => {
                info!("[UPDATE] Connected to {}:{}", options.host, options.port);
                self.link_lost.store(false, Ordering::Release);
                self.set_state(UpdateState::Connected);
            }
            outcome => {
                warn!(timed_out = outcome.is_err(), "[UPDATE] Broker did not accept the connection");
                self.disconnect_quietly().await;
                self.set_state(UpdateState::Disconnected);
                sleep(delay).await;
            }
        }
    }

    async fn await_connected(&self, events: &mut mpsc::Receiver<PubSubEvent>) -> bool {
        while let Some(event) = events.recv().await {
            match event {
                PubSubEvent::Connected => return true,
                PubSubEvent::Disconnected => return false,
                PubSubEvent::Message { topic, payload } => self.handle_message(&topic, &payload),
            }
        }
        false
    }

    async fn subscribe(&self) {
        for topic in self.topics() {
            if let Err(e) = self.pubsub.subscribe(&topic).await {
                let delay = self.config.connect_retry_delay();
                warn!("[UPDATE] Subscription failed, reconnecting in {:?}: {}", delay, e);
                self.disconnect_quietly().await;
                self.set_state(UpdateState::Disconnected);
                sleep(delay).await;
                return;
            }
            debug!("[UPDATE] Subscribed to {}", topic);
        }
        self.set_state(UpdateState::Idle);
    }

    async fn wait_for_event(&self, events: &mut mpsc::Receiver<PubSubEvent>) {
        let poll = self.config.idle_poll_interval();
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => self.handle_event(event),
                None => {
                    warn!("[UPDATE] Broker event channel closed");
                    sleep(poll).await;
                }
            },
            _ = sleep(poll) => {}
        }
    }

    //endregion

    //region Broker events

    fn handle_event(&self, event: PubSubEvent) {
        match event {
            PubSubEvent::Connected => trace!("[UPDATE] Broker reports connected"),
            PubSubEvent::Disconnected => {
                let mut state = self.state.write();
                match *state {
                    UpdateState::Idle | UpdateState::Connected => {
                        warn!("[UPDATE] Lost connection to the update server");
                        *state = UpdateState::Disconnected;
                    }
                    UpdateState::DownloadingFile | UpdateState::UpdateInProgress => {
                        warn!("[UPDATE] Lost connection to the update server during {}", *state);
                        self.link_lost.store(true, Ordering::Release);
                    }
                    _ => {}
                }
            }
            PubSubEvent::Message { topic, payload } => self.handle_message(&topic, &payload),
        }
    }

    fn handle_message(&self, topic: &str, payload: &[u8]) {
        let message: UpdateMessage = match serde_json::from_slice(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!("[UPDATE] Ignoring malformed update message on {}: {}", topic, e);
                return;
            }
        };
        match self.store.add(&message) {
            Ok(is_new) => match self.store.try_get_message(&message.id) {
                Some(stored) if !stored.applied => {
                    info!(update_id = %stored.id, is_new, "[UPDATE] Update available");
                    self.notify(UpdateEvent::Available(stored));
                }
                _ => debug!(update_id = %message.id, "[UPDATE] Update already applied"),
            },
            Err(e) => warn!(update_id = %message.id, "[UPDATE] Could not store update message: {}", e),
        }
    }

    //endregion

    //region Download and staging

    async fn download(&self, message: &UpdateMessage) -> UpdateResult<()> {
        let url = normalize_url(&message.mpak_download_url, &self.config.default_download_scheme);
        let archive = self.store.archive_path(&message.id);
        let bearer = self.token.read().clone();

        debug!(update_id = %message.id, "[UPDATE] Downloading {}", url);
        if let Err(e) = self.http.download_to_file(&url, bearer.as_deref(), &archive).await {
            remove_partial(&archive);
            return Err(e.into());
        }

        let path = archive.clone();
        let actual = tokio::task::spawn_blocking(move || sha256_file(&path))
            .await
            .map_err(|e| UpdateError::Task(e.to_string()))??;
        let expected = message.download_hash.trim().to_ascii_lowercase();
        if expected.is_empty() {
            warn!(update_id = %message.id, "[UPDATE] Update declares no download hash");
        } else if expected != actual {
            warn!(
                update_id = %message.id,
                %expected,
                %actual,
                "[UPDATE] Download hash mismatch"
            );
            if self.config.hash_mismatch_policy == HashMismatchPolicy::Reject {
                remove_partial(&archive);
                return Err(UpdateError::HashMismatch {
                    id: message.id.clone(),
                    expected,
                    actual,
                });
            }
        }
        self.store.set_retrieved(&message.id)
    }

    async fn stage(&self, message: &UpdateMessage) -> UpdateResult<usize> {
        let archive = self.store.archive_path(&message.id);
        let destination = self.store.update_dir();
        let target = destination.clone();
        let entries = tokio::task::spawn_blocking(move || extract_archive(&archive, &target))
            .await
            .map_err(|e| UpdateError::Task(e.to_string()))??;
        if !has_payload(&destination) {
            return Err(UpdateError::MissingPayload(destination));
        }
        self.store.mark_apply_pending(&message.id)?;
        Ok(entries)
    }

    //endregion

    fn connect_options(&self) -> ConnectOptions {
        let authenticated = self.authenticator.is_some();
        ConnectOptions {
            host: self.config.update_server.clone(),
            port: self.config.update_port,
            client_id: self.device_id.clone(),
            username: authenticated.then(|| self.device_id.clone()),
            password: if authenticated { self.token.read().clone() } else { None },
        }
    }

    async fn disconnect_quietly(&self) {
        if let Err(e) = self.pubsub.disconnect().await {
            debug!("[UPDATE] Disconnect failed: {}", e);
        }
    }

    fn set_state(&self, next: UpdateState) {
        let previous = std::mem::replace(&mut *self.state.write(), next);
        if previous != next {
            debug!(from = %previous, to = %next, "[UPDATE] State change");
        }
    }

    /// Switch to a busy state and return the state to restore afterwards.
    fn enter(&self, busy: UpdateState) -> UpdateState {
        let previous = std::mem::replace(&mut *self.state.write(), busy);
        debug!(from = %previous, to = %busy, "[UPDATE] State change");
        previous
    }

    fn leave(&self, busy: UpdateState, previous: UpdateState) {
        let link_lost = self.link_lost.swap(false, Ordering::AcqRel);
        let mut state = self.state.write();
        if *state == busy {
            *state = if link_lost { UpdateState::Disconnected } else { previous };
        }
    }

    fn notify(&self, event: UpdateEvent) {
        if self.notifications.send(event).is_err() {
            trace!("[UPDATE] No event subscribers");
        }
    }
}

fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("[UPDATE] Could not remove {}: {}", path.display(), e);
        }
    }
}
