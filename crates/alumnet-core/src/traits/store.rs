// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable device-local key/value store.

use async_trait::async_trait;

use crate::error::AlumnetError;

/// A process/device-scoped key to JSON blob store.
///
/// Holds the non-authoritative fallback cache and persisted timer state.
/// Writes are independent of any remote write; there is no transaction
/// spanning this store and the session log.
#[async_trait]
pub trait FallbackStore: Send + Sync + 'static {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, AlumnetError>;

    async fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), AlumnetError>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), AlumnetError>;
}
