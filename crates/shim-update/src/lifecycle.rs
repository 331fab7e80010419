// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

/// The foreground application, as seen by the update service.
#[async_trait]
pub trait ApplicationLifecycle: Send + Sync {
    /// Ask the application to shut down before the device resets.
    fn request_shutdown(&self);

    /// Resolve once the application has finished shutting down.
    async fn wait_for_shutdown(&self);
}
