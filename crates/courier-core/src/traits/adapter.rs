// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all backend adapters must implement.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Courier backend adapters.
///
/// Every backend (entity store, counter store, search index) implements
/// this trait, which provides identity, lifecycle, and health check
/// capabilities.
#[async_trait]
pub trait BackendAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the type of backend (storage, counter, search).
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, CourierError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), CourierError>;
}
