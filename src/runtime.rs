// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use shim_config::{load_config, ConfigError, ShimConfig};
use shim_coprocessor::{ChannelContext, CommandChannel, WiFiAdapter};
use shim_hal::{CoprocessorPlatform, DeviceControl, GpioInterruptControl, NotificationQueueFactory, SystemErrorRouter};
use shim_interrupts::{InterruptContext, InterruptManager};
use shim_update::{
    ApplicationLifecycle, DeviceKeyProvider, HttpClient, PubSubClient, PubSubEvent, UpdateCollaborators, UpdateError,
    UpdateResult, UpdateService, UpdateStore,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error("updates are enabled but no update transports were supplied")]
    MissingUpdateServices,
}

/// What the host platform provides.
#[derive(Clone)]
pub struct PlatformServices {
    pub coprocessor: Arc<dyn CoprocessorPlatform>,
    pub gpio: Arc<dyn GpioInterruptControl>,
    pub queues: Arc<dyn NotificationQueueFactory>,
    pub device: Arc<dyn DeviceControl>,
}

/// Transports and application hooks for the update service.
pub struct UpdateServices {
    pub http: Arc<dyn HttpClient>,
    pub pubsub: Arc<dyn PubSubClient>,
    pub broker_events: mpsc::Receiver<PubSubEvent>,
    pub lifecycle: Arc<dyn ApplicationLifecycle>,
    pub keys: Option<Arc<dyn DeviceKeyProvider>>,
}

/// Every shim service, built once from one configuration.
pub struct ShimRuntime {
    config: Arc<ShimConfig>,
    channel: Arc<CommandChannel>,
    wifi: Arc<WiFiAdapter>,
    interrupts: Arc<InterruptManager>,
    system_errors: Arc<SystemErrorRouter>,
    update: Option<Arc<UpdateService>>,
}

impl ShimRuntime {
    /// Build the services.
    ///
    /// # Arguments
    /// * `updates` - Required when `[update] enabled = true`, ignored otherwise
    pub fn boot(
        config: ShimConfig,
        platform: PlatformServices,
        updates: Option<UpdateServices>,
    ) -> Result<Self, RuntimeError> {
        let context = ChannelContext::new(platform.coprocessor, &config.coprocessor);
        info!(
            protocol_version = context.protocol_version.0,
            "[RUNTIME] Co-processor protocol version resolved"
        );
        let channel = Arc::new(CommandChannel::new(Arc::new(context)));
        let wifi = Arc::new(WiFiAdapter::new(Arc::clone(&channel)));

        let interrupts = Arc::new(InterruptManager::new(InterruptContext::new(
            platform.gpio,
            platform.queues,
            config.interrupts.clone(),
        )));
        let system_errors = Arc::new(SystemErrorRouter::new(Arc::clone(&platform.device)));

        let update = match (config.update.enabled, updates) {
            (true, Some(services)) => {
                let store = Arc::new(UpdateStore::open(&config.update.root_directory)?);
                let collaborators = UpdateCollaborators {
                    device: Arc::clone(&platform.device),
                    http: services.http,
                    pubsub: services.pubsub,
                    lifecycle: services.lifecycle,
                    keys: services.keys,
                };
                let service = UpdateService::new(config.update.clone(), store, collaborators, services.broker_events)?;
                Some(Arc::new(service))
            }
            (true, None) => return Err(RuntimeError::MissingUpdateServices),
            (false, services) => {
                if services.is_some() {
                    debug!("[RUNTIME] Updates disabled; update transports ignored");
                }
                None
            }
        };

        info!(updates = update.is_some(), "[RUNTIME] Shim services ready");
        Ok(Self {
            config: Arc::new(config),
            channel,
            wifi,
            interrupts,
            system_errors,
            update,
        })
    }

    /// Load the configuration (file, environment, `cli` overrides) and boot.
    pub fn from_config_file(
        config_path: Option<&Path>,
        cli_args: Option<&HashMap<String, String>>,
        platform: PlatformServices,
        updates: Option<UpdateServices>,
    ) -> Result<Self, RuntimeError> {
        let config = load_config(config_path, cli_args)?;
        Self::boot(config, platform, updates)
    }

    /// Close the startup window for system errors. Call after the
    /// application has had its chance to attach a
    /// [`shim_hal::SystemErrorHandler`]; with no handler, a cached error that
    /// recommended a reset resets the device now.
    ///
    /// # Returns
    /// Whether a reset was requested
    pub fn finish_boot(&self) -> bool {
        let reset = self.system_errors.resolve_unhandled();
        info!(reset, "[RUNTIME] Boot finished");
        reset
    }

    /// Complete an update applied before the last reset, then spawn the update
    /// loop on the current tokio runtime.
    ///
    /// Subscribe to update events before calling this to observe the
    /// completion.
    ///
    /// # Returns
    /// The loop's task, or `None` when updates are disabled
    pub fn start_updates(&self) -> UpdateResult<Option<JoinHandle<UpdateResult<()>>>> {
        let Some(service) = &self.update else {
            return Ok(None);
        };
        if let Some(id) = service.resume_after_boot()? {
            info!(update_id = %id, "[RUNTIME] Completed update from previous boot");
        }
        let service = Arc::clone(service);
        Ok(Some(tokio::spawn(async move { service.run().await })))
    }

    /// Stop the interrupt listener and the update loop.
    pub fn shutdown(&self) {
        self.interrupts.shutdown();
        if let Some(update) = &self.update {
            update.stop();
        }
        info!("[RUNTIME] Shutdown requested");
    }

    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    pub fn channel(&self) -> &Arc<CommandChannel> {
        &self.channel
    }

    pub fn wifi(&self) -> &Arc<WiFiAdapter> {
        &self.wifi
    }

    pub fn interrupts(&self) -> &Arc<InterruptManager> {
        &self.interrupts
    }

    pub fn system_errors(&self) -> &Arc<SystemErrorRouter> {
        &self.system_errors
    }

    pub fn update_service(&self) -> Option<&Arc<UpdateService>> {
        self.update.as_ref()
    }
}
